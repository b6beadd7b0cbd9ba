//! Command execution: wires the CLI and config to the server, client and
//! transfer crates.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, anyhow, bail};
use rfshare_client::RemoteClient;
use rfshare_file_service::{FileService, FileServiceConfig};
use rfshare_server::{FileServer, ServerConfig};
use rfshare_transfer::{TransferController, TransferError, TransferProgress};

use crate::cli::{Cli, Command};
use crate::config::Config;

/// Runs the selected command to completion.
pub async fn run(cli: Cli, config: Config) -> anyhow::Result<()> {
    match cli.command {
        Command::Serve {
            port,
            root,
            confine,
        } => {
            let port = port.unwrap_or(config.port);
            let root = root.unwrap_or_else(|| config.root.clone());
            serve(port, root, confine || config.confine_paths).await
        }
        command => {
            let server = cli
                .server
                .or_else(|| config.server.clone())
                .context("client: need --server <host:port> or RFSHARE_SERVER")?;
            let client = RemoteClient::connect(&server, config.client_config())
                .await
                .with_context(|| format!("client: cannot connect to server {server}"))?;
            run_client(command, client, &config).await
        }
    }
}

async fn serve(port: u16, root: PathBuf, confine_paths: bool) -> anyhow::Result<()> {
    if !root.is_dir() {
        bail!("server: root {} is not a directory", root.display());
    }

    let service = FileService::new(FileServiceConfig {
        root,
        confine_paths,
    });
    let server = FileServer::new(ServerConfig::with_port(port), service);

    let server_run = Arc::clone(&server);
    let mut handle = tokio::spawn(async move { server_run.run().await });

    // Wait for the server to bind (or fail to).
    let addr = loop {
        if let Some(addr) = server.local_addr().await {
            break addr;
        }
        if handle.is_finished() {
            handle.await??;
            bail!("server stopped before binding");
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    };
    println!("server is running at {addr}");

    tokio::select! {
        result = &mut handle => {
            result??;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("received Ctrl+C");
            server.shutdown();
            handle.await??;
        }
    }

    println!("server: shutdown");
    Ok(())
}

async fn run_client(command: Command, client: RemoteClient, config: &Config) -> anyhow::Result<()> {
    match command {
        Command::Serve { .. } => bail!("serve cannot run against a remote server"),
        Command::Shutdown => {
            client
                .shutdown()
                .await
                .context("client: error shutting down server")?;
            println!("shutdown: server has shutdown");
        }
        Command::Dir { path } => {
            let entries = client.dir(&path).await.context("client: dir error")?;
            match entries {
                None => bail!("dir: no such directory"),
                Some(entries) if entries.is_empty() => println!("<Empty Directory>"),
                Some(entries) => {
                    for entry in entries {
                        println!("{entry}");
                    }
                }
            }
        }
        Command::Mkdir { path } => {
            if !client.mkdir(&path).await.context("client: mkdir error")? {
                bail!("mkdir: {path} is an invalid path or directory already exists");
            }
            println!("mkdir: new directory created at {path}");
        }
        Command::Rmdir { path } => {
            if !client.rmdir(&path).await.context("client: rmdir error")? {
                bail!("rmdir: {path} is an invalid path, not a directory, or is not empty");
            }
            println!("rmdir: {path} is removed");
        }
        Command::Rm { path } => {
            if !client.rm(&path).await.context("client: rm error")? {
                bail!("rm: {path} is an invalid path or not a file");
            }
            println!("rm: {path} is removed");
        }
        Command::Upload { local, remote } => {
            let controller = transfer_controller(client, config);
            controller
                .upload(&local, &remote)
                .await
                .map_err(|e| describe_upload_error(e, &local, &remote))?;
        }
        Command::Download { remote, local } => {
            let controller = transfer_controller(client, config);
            controller
                .download(&remote, &local)
                .await
                .map_err(|e| describe_download_error(e, &remote, &local))?;
        }
    }
    Ok(())
}

fn transfer_controller(client: RemoteClient, config: &Config) -> TransferController<RemoteClient> {
    TransferController::new(client)
        .with_retry(config.retry.to_policy())
        .on_progress(Box::new(print_progress))
}

fn print_progress(p: &TransferProgress) {
    if p.is_resume_start() {
        println!("{}: resuming {}", p.direction, p.direction);
    }
    println!("{}: {} / {}", p.direction, p.transferred, p.total);
    tracing::debug!(
        direction = %p.direction,
        percent = p.fraction() * 100.0,
        bytes_per_second = p.bytes_per_second,
        "transfer progress"
    );
}

fn describe_upload_error(err: TransferError, local: &Path, remote: &str) -> anyhow::Error {
    match err {
        TransferError::InvalidLocalPath(_) => anyhow!(
            "upload: client path {} is invalid or not a file",
            local.display()
        ),
        TransferError::InvalidRemotePath(_) => anyhow!("upload: server path {remote} is invalid"),
        other => anyhow::Error::new(other).context("client: upload error"),
    }
}

fn describe_download_error(err: TransferError, remote: &str, local: &Path) -> anyhow::Error {
    match err {
        TransferError::InvalidLocalPath(_) => {
            anyhow!("download: client path {} is invalid", local.display())
        }
        TransferError::InvalidRemotePath(_) => {
            anyhow!("download: server path {remote} is invalid or not a file")
        }
        other => anyhow::Error::new(other).context("client: download error"),
    }
}
