// error.rs
//
// Copyright (c) 2019-2023  Douglas Lau
//
use std::fmt;
use std::io;

/// Errors encountered while encoding
#[derive(Debug)]
pub enum Error {
    /// A wrapped I/O error while writing the output stream.
    Io(io::Error),
    /// Output stream could not be created.
    StreamOpen(io::Error),
    /// Width or height is zero or larger than 65535.
    InvalidDimensions,
    /// Color table depth outside of 1 through 8 bits.
    InvalidDepth(u8),
    /// More colors supplied than the color table depth allows.
    InvalidColorTable,
    /// Transparent color index outside of the color table.
    InvalidTransparentColor(u8),
    /// Frame buffer contains an index outside of the color table.
    InvalidPixelIndex(u8),
    /// [Session](struct.Session.html) was closed, or poisoned by an earlier
    /// I/O error.
    SessionClosed,
    /// [close](struct.Session.html#method.close) called more than once.
    DoubleClose,
}

/// Animgif result type
pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io(err) => err.fmt(fmt),
            Error::StreamOpen(err) => write!(fmt, "StreamOpen: {}", err),
            _ => fmt::Debug::fmt(self, fmt),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            Error::Io(ref err) => Some(err),
            Error::StreamOpen(ref err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}
