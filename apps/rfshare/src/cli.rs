use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "rfshare",
    version = env!("CARGO_PKG_VERSION"),
    about = "Remote file sharing with resumable chunked transfers",
    propagate_version = true
)]
pub struct Cli {
    /// Path to the TOML config file.
    #[arg(long, global = true, env = "RFSHARE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Server address as host:port.
    #[arg(long, global = true, env = "RFSHARE_SERVER")]
    pub server: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the file server.
    Serve {
        /// TCP port to listen on.
        #[arg(long)]
        port: Option<u16>,
        /// Directory every remote path is resolved against.
        #[arg(long)]
        root: Option<PathBuf>,
        /// Reject paths that escape the root.
        #[arg(long)]
        confine: bool,
    },
    /// Ask the server to shut down.
    Shutdown,
    /// List a remote directory.
    Dir {
        #[arg(default_value = "/")]
        path: String,
    },
    /// Create a remote directory.
    Mkdir { path: String },
    /// Remove an empty remote directory.
    Rmdir { path: String },
    /// Remove a remote file.
    Rm { path: String },
    /// Upload a local file, resuming a partial remote copy.
    Upload { local: PathBuf, remote: String },
    /// Download a remote file, resuming a partial local copy.
    Download { remote: String, local: PathBuf },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn dir_defaults_to_root() {
        let cli = Cli::try_parse_from(["rfshare", "dir"]).unwrap();
        match cli.command {
            Command::Dir { path } => assert_eq!(path, "/"),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn server_flag_after_subcommand() {
        let cli =
            Cli::try_parse_from(["rfshare", "upload", "a.bin", "/a.bin", "--server", "h:9"])
                .unwrap();
        assert_eq!(cli.server.as_deref(), Some("h:9"));
        match cli.command {
            Command::Upload { local, remote } => {
                assert_eq!(local, PathBuf::from("a.bin"));
                assert_eq!(remote, "/a.bin");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn serve_flags() {
        let cli = Cli::try_parse_from([
            "rfshare", "serve", "--port", "9000", "--root", "/srv", "--confine",
        ])
        .unwrap();
        match cli.command {
            Command::Serve {
                port,
                root,
                confine,
            } => {
                assert_eq!(port, Some(9000));
                assert_eq!(root, Some(PathBuf::from("/srv")));
                assert!(confine);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn upload_requires_two_arguments() {
        assert!(Cli::try_parse_from(["rfshare", "upload", "a.bin"]).is_err());
    }
}
