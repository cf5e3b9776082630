//! Command line interface

use std::path::PathBuf;

use clap::Parser;

use crate::config::{CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH};

/// Uploads a camera capture, prunes old uploads and notifies the chat bot
#[derive(Parser, Debug)]
#[command(name = "raspi-uploader", version, about)]
pub struct Cli {
    /// File to upload
    pub file: PathBuf,

    /// Config file
    #[arg(short, long, env = CONFIG_PATH_ENV, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,
}
