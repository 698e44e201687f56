//! Error types for pixel data transcoding.

use std::collections::TryReserveError;

use snafu::{ResultExt, Snafu};

use crate::format::{InvalidDimensions, InvalidPixelFormat};
use crate::jpegls::backend::BackendFailure;
use crate::jpegls::header::HeaderError;

/// The broad category of a transcoding error.
///
/// Callers which need to react to a failure
/// (as opposed to just reporting it)
/// should match on the kind rather than on the error message.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// a required image attribute was not provided
    MissingAttribute,
    /// declared attributes disagree with the compressed stream
    InconsistentAttribute,
    /// the compressed stream could not be parsed
    MalformedBitstream,
    /// unsupported sample count, bit depth or compression feature
    UnsupportedFormat,
    /// a result or scratch buffer could not be obtained
    AllocationFailure,
    /// declared and actual data lengths differ
    SizeMismatch,
    /// the compression library reported a failure
    BackendError,
    /// the operation is not available for this codec family
    NotSupported,
    /// the output sink failed
    Io,
}

#[derive(Debug, Snafu)]
#[non_exhaustive]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("Missing required attribute `{}`", name))]
    MissingAttribute { name: &'static str },

    #[snafu(display("Inconsistent {}: expected {}, found {}", name, expected, found))]
    InconsistentAttribute {
        name: &'static str,
        expected: u64,
        found: u64,
    },

    #[snafu(display("No pixel data fragments to decode"))]
    NoFragments,

    #[snafu(display("Could not read JPEG-LS header of fragment #{}", fragment))]
    ReadHeader { fragment: usize, source: HeaderError },

    #[snafu(display("No end of image marker found in fragment #{}", fragment))]
    MissingEndOfImage { fragment: usize },

    #[snafu(display("Unsupported samples per pixel: {}", samples_per_pixel))]
    UnsupportedSamplesPerPixel { samples_per_pixel: u16 },

    #[snafu(display("Unsupported bit depth: {}", bits))]
    UnsupportedBitDepth { bits: u16 },

    #[snafu(display("Invalid pixel format"))]
    InvalidPixelFormat { source: InvalidPixelFormat },

    #[snafu(display("Invalid image dimensions"))]
    InvalidDimensions { source: InvalidDimensions },

    #[snafu(display("Could not allocate {} bytes", size))]
    AllocationFailure {
        size: usize,
        source: TryReserveError,
    },

    #[snafu(display("Pixel data length mismatch: expected {} bytes, got {}", expected, found))]
    SizeMismatch { expected: usize, found: usize },

    #[snafu(display("JPEG-LS backend failed on frame #{}", frame))]
    Backend {
        frame: usize,
        source: BackendFailure,
    },

    #[snafu(display("Operation `{}` is not supported by this codec", operation))]
    NotSupported { operation: &'static str },

    #[snafu(display("Could not write encoded frame"))]
    WriteFrame { source: std::io::Error },
}

impl Error {
    /// Obtain the category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::MissingAttribute { .. } => ErrorKind::MissingAttribute,
            Error::InconsistentAttribute { .. } => ErrorKind::InconsistentAttribute,
            Error::NoFragments | Error::MissingEndOfImage { .. } => ErrorKind::MalformedBitstream,
            Error::ReadHeader { source, .. } => {
                if source.is_unsupported() {
                    ErrorKind::UnsupportedFormat
                } else {
                    ErrorKind::MalformedBitstream
                }
            }
            Error::UnsupportedSamplesPerPixel { .. }
            | Error::UnsupportedBitDepth { .. }
            | Error::InvalidPixelFormat { .. } => ErrorKind::UnsupportedFormat,
            Error::InvalidDimensions { .. } => ErrorKind::InconsistentAttribute,
            Error::AllocationFailure { .. } => ErrorKind::AllocationFailure,
            Error::SizeMismatch { .. } => ErrorKind::SizeMismatch,
            Error::Backend { .. } => ErrorKind::BackendError,
            Error::NotSupported { .. } => ErrorKind::NotSupported,
            Error::WriteFrame { .. } => ErrorKind::Io,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Obtain an empty byte buffer able to hold `size` bytes
/// without reallocating.
pub(crate) fn try_buffer(size: usize) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(size)
        .context(AllocationFailureSnafu { size })?;
    Ok(buffer)
}
