use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub(crate) struct Args {
    /// Directory backing the emulated remote (one subdirectory per user)
    #[arg(long, env = "USERFS_ROOT", default_value = "/var/lib/userfs")]
    pub(crate) root: PathBuf,

    /// User whose tree is served
    #[arg(short, long, env = "USERFS_USER")]
    pub(crate) user: String,

    #[command(subcommand)]
    pub(crate) command: Commands,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    #[command(about = "Write stdin to a file, creating parent directories")]
    Put {
        #[arg(value_name = "PATH")]
        path: String,
    },
    #[command(about = "Print a file to stdout")]
    Cat {
        #[arg(value_name = "PATH")]
        path: String,
    },
    #[command(about = "Create a directory and any missing parents")]
    Mkdir {
        #[arg(value_name = "PATH")]
        path: String,
    },
}
