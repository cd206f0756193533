use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when resolving a requested file inside the music directory.
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("File not found: {0}")]
    NotFound(String),
    #[error("Access denied: {} is outside the music directory", .0.display())]
    Forbidden(PathBuf),
    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),
}

/// Errors that can occur when interpreting a `Range` request header.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RangeError {
    #[error("Malformed range header: {0:?}")]
    Malformed(String),
    #[error("Range not satisfiable for a file of {file_size} bytes")]
    Unsatisfiable { file_size: u64 },
}
