use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use crate::config::DEFAULT_CONFIG_FILE;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Rewrite files without copying them to the backup folder first
    #[arg(long, global = true)]
    pub no_backup: bool,

    /// Defaults to `translate`, prompting for the folder
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Translate every eligible file under a folder in place
    Translate {
        /// Modpack folder (prompted for when omitted)
        folder: Option<PathBuf>,
    },

    /// List the phrases each file would send, without translating anything
    Extract {
        /// Modpack folder (prompted for when omitted)
        folder: Option<PathBuf>,
    },

    /// Write the default configuration to a TOML file
    InitConfig {
        /// Output file
        #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
        output: PathBuf,
    },
}

/// Ask for the modpack folder on `output` and read one line from `input`
pub fn prompt_folder<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> io::Result<PathBuf> {
    write!(output, "Enter modpack folder path: ")?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;

    Ok(PathBuf::from(line.trim()))
}
