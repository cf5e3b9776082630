//! Uploads Raspberry Pi camera captures to OSS and announces them on DingTalk

#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    dead_code
)]

/// Command line interface
pub mod cli;

/// Config file loading
pub mod config;

/// DingTalk webhook notifications
pub mod notifier;

/// End-to-end run
pub mod pipeline;

/// Bucket access
pub mod storage;

/// Retention sweep
pub mod sweeper;

/// Single file upload
pub mod uploader;
