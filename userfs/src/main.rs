mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Args, Commands};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing_subscriber::EnvFilter;
use userfs::client::localfs::LocalFsClient;
use userfs::vfs::fs::DIR_MODE;
use userfs::{Filesystem, OpenFlags, UserFs, UserName};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let user = UserName::new(args.user);
    let client = LocalFsClient::new(&args.root);
    client
        .add_user(&user)
        .await
        .with_context(|| format!("failed to prepare {} for {user}", args.root.display()))?;
    let fs = UserFs::new(Arc::new(client), user);

    match args.command {
        Commands::Put { path } => {
            let mut data = Vec::new();
            tokio::io::stdin()
                .read_to_end(&mut data)
                .await
                .context("failed to read stdin")?;
            let flags = OpenFlags::WRONLY | OpenFlags::CREATE | OpenFlags::TRUNC;
            let mut f = fs
                .open_file(&path, flags, 0o644)
                .await
                .with_context(|| format!("failed to open {path}"))?;
            f.write(&data).await?;
            f.close().await?;
            tracing::info!(path = %path, bytes = data.len(), "put");
        }
        Commands::Cat { path } => {
            let mut f = fs
                .open(&path)
                .await
                .with_context(|| format!("failed to open {path}"))?;
            let mut out = Vec::new();
            f.read_to_end(&mut out).await?;
            f.close().await?;
            let mut stdout = tokio::io::stdout();
            stdout.write_all(&out).await?;
            stdout.flush().await?;
        }
        Commands::Mkdir { path } => {
            fs.mkdir_all(&path, DIR_MODE)
                .await
                .with_context(|| format!("failed to create {path}"))?;
        }
    }
    Ok(())
}
