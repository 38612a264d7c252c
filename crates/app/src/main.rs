//! Snare console entry point.

use std::sync::Arc;

use snare::{App, Command};
use snare_infrastructure::{
    ClientConfig, DirectoryArtifactStore, FileKeyValueStore, ReqwestBackend, SystemClock,
};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = ClientConfig::from_env()?;
    tracing::info!(
        api = %config.base_url()?,
        state = %config.state_dir.display(),
        "Starting Snare v{}",
        env!("CARGO_PKG_VERSION")
    );

    let backend = Arc::new(ReqwestBackend::new(&config)?);
    let mut app = App::new(
        backend,
        Arc::new(FileKeyValueStore::new(&config.state_dir)),
        Arc::new(DirectoryArtifactStore::new(&config.export_dir)),
        Arc::new(SystemClock),
    );
    app.start();

    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let output = match line.parse::<Command>() {
            Ok(Command::Quit) => break,
            Ok(command) => app.handle(command).await,
            Err(error) => vec![error.to_string()],
        };
        for text in output {
            stdout.write_all(text.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
        }
        stdout.flush().await?;
    }

    app.shutdown();
    Ok(())
}
