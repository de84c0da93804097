//! Error types for premail operations.

use thiserror::Error;

/// Errors that can occur while inlining or validating a document.
///
/// Malformed CSS fragments, selectors the DOM cannot evaluate, and
/// per-element failures are recovered on the spot and never surface
/// here; only failures that abort a whole invocation do.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize document: {0}")]
    Serialize(std::io::Error),

    #[error("UTF-8 decoding error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("invalid target email client: {0} (valid: outlook, gmail, apple_mail, outlook_online, generic)")]
    InvalidTarget(String),

    #[error("{0}")]
    InvalidArguments(String),

    #[error("no HTML files found in directory: {0}")]
    NoInputFiles(String),
}

pub type Result<T> = std::result::Result<T, Error>;
