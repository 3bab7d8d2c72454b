// Entrypoint for the screenshot uploader.
// - Keeps `main` small: resolve settings, build the collaborators and hand
//   them to the pipeline, which only returns on a fatal watcher error.
// - Returns `anyhow::Result` so fatal errors print and exit non-zero.

use anyhow::Context;
use clap::Parser;
use snaplink::clipboard::CommandClipboard;
use snaplink::config::{Cli, Settings};
use snaplink::pipeline::Pipeline;
use snaplink::upload::HttpTransport;
use snaplink::watcher::DirectorySource;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = Settings::resolve(Cli::parse(), dirs::home_dir())?;

    println!("Screenshot directory set as: {}", settings.directory.display());
    println!("Using Client ID: {}", settings.client_id);

    let clipboard = CommandClipboard::parse(&settings.clipboard_command)?;
    // The HTTP client lives for the whole process and is dropped on every
    // exit path, including the fatal one below.
    let transport = HttpTransport::from_env()?;
    log::debug!("Uploading to {}", transport.url());

    let mut pipeline = Pipeline::new(
        DirectorySource::new(&settings.directory),
        transport,
        clipboard,
        settings.client_id,
    );

    let err = match pipeline.run() {
        Ok(never) => match never {},
        Err(e) => e,
    };
    Err(err).with_context(|| format!("Stopped watching {}", settings.directory.display()))
}
