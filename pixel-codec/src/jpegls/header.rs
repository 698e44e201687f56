//! Header-only inspection of JPEG-LS streams.
//!
//! Only the markers preceding the first scan are read,
//! the entropy coded data is never touched.

use std::convert::TryFrom;
use std::io::{self, Cursor, Read};

use byteorder::{BigEndian, ReadBytesExt};
use snafu::{ensure, OptionExt, ResultExt, Snafu};

use super::backend::{ColorTransformation, FrameParameters, InterleaveMode};

pub(crate) const MARKER_PREFIX: u8 = 0xFF;
pub(crate) const SOI: u8 = 0xD8;
pub(crate) const EOI: u8 = 0xD9;
pub(crate) const SOS: u8 = 0xDA;
pub(crate) const SOF55: u8 = 0xF7;
pub(crate) const LSE: u8 = 0xF8;
pub(crate) const APP8: u8 = 0xE8;

/// LSE parameter id for oversize image dimensions
const LSE_OVERSIZE_DIMENSIONS: u8 = 4;

#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum HeaderError {
    #[snafu(display("Unexpected end of JPEG-LS stream"))]
    Truncated { source: io::Error },

    #[snafu(display("Stream does not begin with a start of image marker"))]
    MissingStartOfImage,

    #[snafu(display("Expected a marker, found byte {:#04x}", found))]
    ExpectedMarker { found: u8 },

    #[snafu(display("Unsupported JPEG process (marker FF{:02X})", marker))]
    UnsupportedProcess { marker: u8 },

    #[snafu(display("Marker FF{:02X} found before the first scan", marker))]
    MissingScan { marker: u8 },

    #[snafu(display("Invalid frame header: {}", reason))]
    InvalidFrameHeader { reason: &'static str },

    #[snafu(display("Invalid scan header: {}", reason))]
    InvalidScanHeader { reason: &'static str },

    #[snafu(display("Invalid segment length {}", length))]
    SegmentLength { length: u16 },
}

impl HeaderError {
    /// Whether the stream is well formed
    /// but uses a JPEG process other than JPEG-LS.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, HeaderError::UnsupportedProcess { .. })
    }
}

/// The frame and first scan parameters of a JPEG-LS stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JpegLsHeader {
    pub width: u32,
    pub height: u32,
    /// sample precision (P)
    pub bits_per_sample: u16,
    pub components: u16,
    /// NEAR parameter of the first scan
    pub allowed_lossy_error: u8,
    pub interleave_mode: InterleaveMode,
    pub color_transformation: ColorTransformation,
    /// Offset of the first entropy coded byte
    pub scan_offset: usize,
}

impl JpegLsHeader {
    #[inline]
    pub fn is_lossy(&self) -> bool {
        self.allowed_lossy_error != 0
    }

    /// The size of the decoded frame in bytes:
    /// `height × width × ceil(P / 8) × components`.
    pub fn frame_length(&self) -> usize {
        self.to_frame_parameters().frame_length()
    }

    pub fn to_frame_parameters(&self) -> FrameParameters {
        FrameParameters {
            width: self.width,
            height: self.height,
            bits_per_sample: self.bits_per_sample,
            components: self.components,
            interleave_mode: self.interleave_mode,
            color_transformation: self.color_transformation,
            allowed_lossy_error: self.allowed_lossy_error,
        }
    }
}

struct FrameHeader {
    precision: u8,
    height: u32,
    width: u32,
    components: u8,
}

/// Read the header of a JPEG-LS stream.
pub fn read_header(data: &[u8]) -> Result<JpegLsHeader, HeaderError> {
    let mut cursor = Cursor::new(data);

    ensure!(read_marker(&mut cursor)? == SOI, MissingStartOfImageSnafu);

    let mut frame: Option<FrameHeader> = None;
    let mut color_transformation = ColorTransformation::None;

    loop {
        let marker = read_marker(&mut cursor)?;
        match marker {
            SOF55 => frame = Some(read_frame_header(&mut cursor)?),
            LSE => read_preset_parameters(&mut cursor, frame.as_mut())?,
            APP8 => {
                if let Some(transformation) = read_color_transformation(&mut cursor)? {
                    color_transformation = transformation;
                }
            }
            SOS => {
                let frame = frame.context(MissingScanSnafu { marker })?;
                let (near, interleave_mode) = read_scan_header(&mut cursor)?;

                ensure!(
                    frame.width > 0 && frame.height > 0,
                    InvalidFrameHeaderSnafu {
                        reason: "zero image dimension"
                    }
                );

                return Ok(JpegLsHeader {
                    width: frame.width,
                    height: frame.height,
                    bits_per_sample: u16::from(frame.precision),
                    components: u16::from(frame.components),
                    allowed_lossy_error: near,
                    interleave_mode,
                    color_transformation,
                    scan_offset: cursor.position() as usize,
                });
            }
            SOI | EOI => return MissingScanSnafu { marker }.fail(),
            // restart markers carry no segment
            0xD0..=0xD7 => {}
            // DHT, DAC and the reserved JPG marker are not frame headers
            0xC4 | 0xC8 | 0xCC => skip_segment(&mut cursor)?,
            0xC0..=0xCF => return UnsupportedProcessSnafu { marker }.fail(),
            _ => skip_segment(&mut cursor)?,
        }
    }
}

/// Cut off any bytes after the last end of image marker.
///
/// Returns `None` if the data contains no end of image marker.
pub fn trim_to_end_of_image(data: &[u8]) -> Option<&[u8]> {
    data.windows(2)
        .rposition(|w| w == [MARKER_PREFIX, EOI])
        .map(|i| &data[..i + 2])
}

fn read_marker(cursor: &mut Cursor<&[u8]>) -> Result<u8, HeaderError> {
    let found = cursor.read_u8().context(TruncatedSnafu)?;
    ensure!(found == MARKER_PREFIX, ExpectedMarkerSnafu { found });
    // any number of fill bytes may precede the marker code
    loop {
        let code = cursor.read_u8().context(TruncatedSnafu)?;
        if code != MARKER_PREFIX {
            return Ok(code);
        }
    }
}

/// Read the segment length, excluding the length field itself.
fn read_segment_length(cursor: &mut Cursor<&[u8]>) -> Result<usize, HeaderError> {
    let length = cursor.read_u16::<BigEndian>().context(TruncatedSnafu)?;
    ensure!(length >= 2, SegmentLengthSnafu { length });
    Ok(length as usize - 2)
}

fn skip(cursor: &mut Cursor<&[u8]>, count: usize) -> Result<(), HeaderError> {
    let remaining = (cursor.get_ref().len() as u64).saturating_sub(cursor.position());
    if count as u64 > remaining {
        return Err(io::Error::from(io::ErrorKind::UnexpectedEof)).context(TruncatedSnafu);
    }
    cursor.set_position(cursor.position() + count as u64);
    Ok(())
}

fn skip_segment(cursor: &mut Cursor<&[u8]>) -> Result<(), HeaderError> {
    let length = read_segment_length(cursor)?;
    skip(cursor, length)
}

fn read_frame_header(cursor: &mut Cursor<&[u8]>) -> Result<FrameHeader, HeaderError> {
    let length = read_segment_length(cursor)?;
    let precision = cursor.read_u8().context(TruncatedSnafu)?;
    let height = cursor.read_u16::<BigEndian>().context(TruncatedSnafu)?;
    let width = cursor.read_u16::<BigEndian>().context(TruncatedSnafu)?;
    let components = cursor.read_u8().context(TruncatedSnafu)?;

    ensure!(
        components > 0,
        InvalidFrameHeaderSnafu {
            reason: "no components"
        }
    );
    ensure!(
        length == 6 + 3 * components as usize,
        InvalidFrameHeaderSnafu {
            reason: "segment length does not match component count"
        }
    );
    ensure!(
        precision >= 2,
        InvalidFrameHeaderSnafu {
            reason: "sample precision below 2 bits"
        }
    );

    // component identifiers, sampling factors and table selectors
    skip(cursor, 3 * components as usize)?;

    Ok(FrameHeader {
        precision,
        height: u32::from(height),
        width: u32::from(width),
        components,
    })
}

fn read_preset_parameters(
    cursor: &mut Cursor<&[u8]>,
    frame: Option<&mut FrameHeader>,
) -> Result<(), HeaderError> {
    let length = read_segment_length(cursor)?;
    ensure!(
        length >= 1,
        SegmentLengthSnafu {
            length: length as u16 + 2
        }
    );
    let id = cursor.read_u8().context(TruncatedSnafu)?;

    match (id, frame) {
        (LSE_OVERSIZE_DIMENSIONS, Some(frame)) => {
            let wxy = cursor.read_u8().context(TruncatedSnafu)?;
            ensure!(
                (2..=4).contains(&wxy) && length == 2 + 2 * wxy as usize,
                InvalidFrameHeaderSnafu {
                    reason: "bad oversize dimension segment"
                }
            );
            frame.height = cursor
                .read_uint::<BigEndian>(wxy as usize)
                .context(TruncatedSnafu)? as u32;
            frame.width = cursor
                .read_uint::<BigEndian>(wxy as usize)
                .context(TruncatedSnafu)? as u32;
            Ok(())
        }
        _ => skip(cursor, length - 1),
    }
}

fn read_color_transformation(
    cursor: &mut Cursor<&[u8]>,
) -> Result<Option<ColorTransformation>, HeaderError> {
    let length = read_segment_length(cursor)?;
    if length != 5 {
        skip(cursor, length)?;
        return Ok(None);
    }

    let mut id = [0; 4];
    cursor.read_exact(&mut id).context(TruncatedSnafu)?;
    let value = cursor.read_u8().context(TruncatedSnafu)?;
    if &id != b"mrfx" {
        return Ok(None);
    }
    ColorTransformation::try_from(value)
        .map(Some)
        .map_err(|_| HeaderError::InvalidFrameHeader {
            reason: "unknown color transformation",
        })
}

fn read_scan_header(cursor: &mut Cursor<&[u8]>) -> Result<(u8, InterleaveMode), HeaderError> {
    let length = read_segment_length(cursor)?;
    let components = cursor.read_u8().context(TruncatedSnafu)?;
    ensure!(
        components > 0 && length == 4 + 2 * components as usize,
        InvalidScanHeaderSnafu {
            reason: "segment length does not match component count"
        }
    );
    // component selectors and mapping table selectors
    skip(cursor, 2 * components as usize)?;

    let near = cursor.read_u8().context(TruncatedSnafu)?;
    let interleave_mode = InterleaveMode::try_from(cursor.read_u8().context(TruncatedSnafu)?)
        .map_err(|_| HeaderError::InvalidScanHeader {
            reason: "unknown interleave mode",
        })?;
    // point transform
    let _ = cursor.read_u8().context(TruncatedSnafu)?;

    Ok((near, interleave_mode))
}
