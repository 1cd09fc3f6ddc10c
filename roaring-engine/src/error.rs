//! Error types for decoding serialized bitmaps

use thiserror::Error;

/// Error returned when a buffer does not hold a valid serialized bitmap
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("unexpected end of buffer: needed {needed} bytes, {available} available")]
    EndOfBuffer { needed: usize, available: usize },
    #[error("invalid cookie: {0:#x}")]
    InvalidCookie(u32),
    #[error("invalid format: {0}")]
    InvalidFormat(&'static str),
    #[error("too many containers: {0} > 65536")]
    TooManyContainers(usize),
}

pub type Result<T> = std::result::Result<T, Error>;
