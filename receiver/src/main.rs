use clap::Parser;

use receiver::config::{Cli, ReceiverOptions};
use receiver::Receiver;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pocket_rcv=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let mut opts = ReceiverOptions::default();
    if let Some(config_path) = &cli.config {
        let text = tokio::fs::read_to_string(config_path).await?;
        opts.load_toml(&text)?;
    }
    if !cli.rfch.is_empty() {
        opts.setopt("rfch", &cli.rfch.join(","))?;
    }

    tracing::info!(
        "pocket_rcv v{} starting on {}",
        env!("CARGO_PKG_VERSION"),
        cli.if_file.display()
    );

    let mut receiver = Receiver::new(opts, cli.out_dir.clone()).await?;
    receiver.run(&cli.if_file).await?;

    Ok(())
}
