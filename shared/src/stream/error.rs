use std::io;

/// Error raised by a stream backend or by the typed codec on top of it.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Fewer bytes were available than requested
    #[error("short read at offset {position}: requested {requested} bytes, got {transferred}")]
    ShortRead {
        position: u64,
        requested: usize,
        transferred: usize,
    },

    /// Fewer bytes were accepted than requested
    #[error("short write at offset {position}: requested {requested} bytes, wrote {transferred}")]
    ShortWrite {
        position: u64,
        requested: usize,
        transferred: usize,
    },

    #[error("string is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    /// A length does not fit the on-disk `u32` length field
    #[error("length {0} does not fit in a u32 length prefix")]
    LengthOverflow(usize),

    /// A read would run past the byte limit of a bounded stream
    #[error("read extending to {requested} bytes exceeds the {limit} byte limit")]
    LimitExceeded { requested: u64, limit: u64 },

    /// A decoded value is outside the range its type accepts
    #[error("invalid {what}: {value}")]
    InvalidValue { what: &'static str, value: u64 },
}

pub type StreamResult<T> = Result<T, StreamError>;
