//! The boundary to the JPEG-LS entropy coding library.

use std::convert::TryFrom;

use snafu::Snafu;

/// How the components of a multi-component image
/// are laid out in a JPEG-LS scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InterleaveMode {
    None = 0,
    Line = 1,
    Sample = 2,
}

impl TryFrom<u8> for InterleaveMode {
    type Error = u8;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(Self::None),
            1 => Ok(Self::Line),
            2 => Ok(Self::Sample),
            _ => Err(v),
        }
    }
}

/// The HP color transformation applied before encoding
/// (an extension signalled in an APP8 segment).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorTransformation {
    None = 0,
    Hp1 = 1,
    Hp2 = 2,
    Hp3 = 3,
}

impl TryFrom<u8> for ColorTransformation {
    type Error = u8;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(Self::None),
            1 => Ok(Self::Hp1),
            2 => Ok(Self::Hp2),
            3 => Ok(Self::Hp3),
            _ => Err(v),
        }
    }
}

/// The parameters of a single JPEG-LS frame,
/// as exchanged with the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameParameters {
    pub width: u32,
    pub height: u32,
    pub bits_per_sample: u16,
    pub components: u16,
    pub interleave_mode: InterleaveMode,
    pub color_transformation: ColorTransformation,
    /// NEAR parameter: 0 for lossless coding,
    /// otherwise the maximum absolute error per sample.
    pub allowed_lossy_error: u8,
}

impl FrameParameters {
    /// The size of the raw frame in bytes.
    pub fn frame_length(&self) -> usize {
        let bytes_per_sample = (self.bits_per_sample as usize + 7) / 8;
        self.width as usize * self.height as usize * bytes_per_sample * self.components as usize
    }
}

/// A failure reported by the JPEG-LS library.
///
/// The message is kept exactly as reported.
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(display("{}", message))]
pub struct BackendFailure {
    code: Option<i32>,
    message: String,
}

impl BackendFailure {
    pub fn new(message: impl Into<String>) -> Self {
        BackendFailure {
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(code: i32, message: impl Into<String>) -> Self {
        BackendFailure {
            code: Some(code),
            message: message.into(),
        }
    }

    /// The library's error code, if it reports one.
    pub fn code(&self) -> Option<i32> {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A JPEG-LS entropy coding library.
///
/// Each call works on exactly one frame
/// and keeps no state between calls,
/// so that frames can be processed concurrently.
pub trait JpegLsBackend: Send + Sync {
    /// Decode a complete JPEG-LS stream.
    ///
    /// `dst` is exactly [`params.frame_length()`](FrameParameters::frame_length)
    /// bytes long.
    fn decode(
        &self,
        src: &[u8],
        params: &FrameParameters,
        dst: &mut [u8],
    ) -> Result<(), BackendFailure>;

    /// Encode one raw frame,
    /// appending the JPEG-LS stream to `dst`.
    ///
    /// Returns the number of bytes written.
    fn encode(
        &self,
        params: &FrameParameters,
        src: &[u8],
        dst: &mut Vec<u8>,
    ) -> Result<usize, BackendFailure>;
}
