//! The capability contract shared by pixel data codecs.

use std::io::Write;

use crate::error::{NotSupportedSnafu, Result};
use crate::format::{Dimensions, PhotometricInterpretation, PixelFormat};
use crate::fragments::FragmentStream;

/// Image attributes recovered from a compressed stream header.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ImageInfo {
    pub dimensions: Dimensions,
    pub pixel_format: PixelFormat,
    pub photometric_interpretation: PhotometricInterpretation,
    /// whether the stream was encoded lossy
    pub lossy: bool,
}

/// A pixel data codec for one family of compressed transfer syntaxes.
///
/// A codec instance carries the attributes of the image being transcoded.
/// These are set by the caller before decoding or encoding,
/// or recovered from a compressed stream with [`header_info`](ImageCodec::header_info).
pub trait ImageCodec {
    /// Whether this codec can decode pixel data
    /// in the given transfer syntax.
    fn can_decode(&self, ts_uid: &str) -> bool;

    /// Whether this codec can encode pixel data
    /// in the given transfer syntax.
    fn can_code(&self, ts_uid: &str) -> bool;

    fn dimensions(&self) -> Option<Dimensions>;

    fn set_dimensions(&mut self, dimensions: Dimensions);

    fn pixel_format(&self) -> PixelFormat;

    fn set_pixel_format(&mut self, pixel_format: PixelFormat);

    fn photometric_interpretation(&self) -> PhotometricInterpretation;

    fn set_photometric_interpretation(&mut self, pi: PhotometricInterpretation);

    /// Whether the last decoded stream was lossy,
    /// or whether the next encoding is requested to be lossy.
    fn is_lossy(&self) -> bool;

    fn set_lossless(&mut self, lossless: bool);

    /// The maximum error per sample for lossy encoding.
    fn lossy_error(&self) -> u8;

    fn set_lossy_error(&mut self, lossy_error: u8);

    /// Decode all fragments into one contiguous raw pixel buffer.
    ///
    /// No output is produced if any frame fails.
    fn decode(&mut self, src: &FragmentStream) -> Result<Vec<u8>>;

    /// Decode all fragments into a buffer of an expected length.
    ///
    /// A difference between the decoded length and the buffer length
    /// is tolerated: the data is truncated or zero padded to fit.
    fn decode_into(&mut self, src: &FragmentStream, dst: &mut [u8]) -> Result<()>;

    /// Encode a raw pixel buffer with all frames into one fragment per frame.
    fn code(&mut self, src: &[u8]) -> Result<FragmentStream>;

    /// Read the header of a compressed stream without decoding it,
    /// updating the image attributes of this codec.
    fn header_info(&mut self, src: &[u8]) -> Result<ImageInfo>;

    fn is_row_encoder(&self) -> bool {
        false
    }

    fn is_frame_encoder(&self) -> bool {
        false
    }

    fn start_encode(&mut self, _out: &mut dyn Write) -> Result<()> {
        Ok(())
    }

    fn append_row_encode(&mut self, _out: &mut dyn Write, _row: &[u8]) -> Result<()> {
        NotSupportedSnafu {
            operation: "append_row_encode",
        }
        .fail()
    }

    fn append_frame_encode(&mut self, _out: &mut dyn Write, _frame: &[u8]) -> Result<()> {
        NotSupportedSnafu {
            operation: "append_frame_encode",
        }
        .fail()
    }

    fn stop_encode(&mut self, _out: &mut dyn Write) -> Result<()> {
        Ok(())
    }
}
