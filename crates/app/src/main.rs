//! layerpaint - replays a recorded painting session and exports the result
//!
//! Usage: `layerpaint <script.json>`

use std::error::Error;
use std::path::PathBuf;

use tracing::info;

use painting::Canvas;

mod session;

use session::Script;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();

    let path: PathBuf = std::env::args_os()
        .nth(1)
        .ok_or("usage: layerpaint <script.json>")?
        .into();
    let script = Script::load(&path)?;
    info!(
        "Playing {} ({} events, {}x{})",
        path.display(),
        script.events.len(),
        script.config.width,
        script.config.height
    );

    let mut canvas = Canvas::new(script.config.clone())?;
    session::play(&mut canvas, &script.events)?;

    let bytes = canvas.export(script.format)?;
    std::fs::write(&script.output, &bytes)?;
    info!("Wrote {} ({} bytes)", script.output.display(), bytes.len());
    Ok(())
}
