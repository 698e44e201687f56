//! Resolution of the pixel data layout:
//! dimensions, sample format, photometric interpretation
//! and planar configuration.

use byteorder::{ByteOrder, LittleEndian};
use dicom_core::value::{InMemFragment, PrimitiveValue, Value};
use dicom_dictionary_std::tags;
use dicom_pixel_codec::jpegls::{is_jpegls_transfer_syntax, read_header};
use dicom_pixel_codec::{
    Dimensions, FragmentStream, ImagingPolicy, PhotometricInterpretation, PixelFormat,
};
use snafu::ResultExt;
use tracing::{debug, warn};

use crate::attribute::{
    self, cols, items, number_of_frames, optional_string, primitive, rows, InvalidDimensionsSnafu,
    InvalidPixelFormatSnafu, Result,
};
use crate::media_storage::{media_storage, MediaStorage};
use crate::store::AttributeStore;

/// Resolve the dimensions of the image.
///
/// When _Number of Frames_ is absent,
/// enhanced multi-frame images count their per-frame functional groups
/// and RT Dose images count their grid frame offsets.
pub fn dimensions_value<S: AttributeStore + ?Sized>(store: &S) -> Result<Dimensions> {
    let rows = u32::from(rows(store)?);
    let columns = u32::from(cols(store)?);

    let frames = match number_of_frames(store)? {
        Some(frames) => frames,
        None => match media_storage(store) {
            ms if ms.is_enhanced_multi_frame() => {
                items(store, tags::PER_FRAME_FUNCTIONAL_GROUPS_SEQUENCE).len() as u32
            }
            MediaStorage::RtDose => primitive(store, tags::GRID_FRAME_OFFSET_VECTOR)
                .map_or(1, |v| v.multiplicity()),
            _ => 1,
        },
    };

    let dimensions = if frames > 1 {
        Dimensions::with_frames(rows, columns, frames)
    } else {
        Dimensions::new(rows, columns)
    };
    dimensions.context(InvalidDimensionsSnafu)
}

/// Resolve the pixel sample format of the image.
///
/// _Bits Allocated_ and _Pixel Representation_ are required.
/// The policy may correct the format
/// from the JPEG-LS bit stream (`fix_jpeg_bits`)
/// or from the sample values themselves (`clean_unused_bits`).
pub fn pixel_format_value<S: AttributeStore + ?Sized>(
    store: &S,
    policy: &ImagingPolicy,
) -> Result<PixelFormat> {
    let mut pixel_format = PixelFormat::from_declared(
        attribute::samples_per_pixel(store)?,
        attribute::bits_allocated(store)?,
        attribute::bits_stored(store)?,
        attribute::high_bit(store)?,
        attribute::pixel_representation(store)?,
    )
    .context(InvalidPixelFormatSnafu)?;

    let pixel_data = store.lookup(tags::PIXEL_DATA);

    if policy.fix_jpeg_bits {
        if let Some(bits) = pixel_data.and_then(|v| jpegls_precision(store, v)) {
            let bits_allocated = if bits <= 8 { 8 } else { 16 };
            if bits_allocated != pixel_format.bits_allocated() {
                warn!(
                    "Bits Allocated {} does not match JPEG-LS precision {}, using {}",
                    pixel_format.bits_allocated(),
                    bits,
                    bits_allocated
                );
                pixel_format = pixel_format
                    .with_bits_allocated(bits_allocated)
                    .context(InvalidPixelFormatSnafu)?;
            }
        }
    }

    if policy.clean_unused_bits {
        if let Some(used) = pixel_data
            .and_then(|v| v.primitive())
            .and_then(|v| used_bits(v, &pixel_format))
        {
            if used < pixel_format.bits_stored() {
                debug!(
                    "Samples use {} of {} bits stored",
                    used,
                    pixel_format.bits_stored()
                );
                pixel_format = pixel_format
                    .with_bits_stored(used)
                    .context(InvalidPixelFormatSnafu)?;
            }
        }
    }

    Ok(pixel_format)
}

/// The sample precision declared by an encapsulated JPEG-LS stream,
/// if the pixel data is one.
fn jpegls_precision<S, I>(store: &S, pixel_data: &Value<I, InMemFragment>) -> Option<u16>
where
    S: AttributeStore + ?Sized,
{
    match store.transfer_syntax_uid() {
        Some(ts) if !is_jpegls_transfer_syntax(ts) => return None,
        _ => {}
    }
    let fragments = FragmentStream::from_value(pixel_data)?;
    let header = read_header(fragments.get(0)?).ok()?;
    Some(header.bits_per_sample)
}

/// The number of low bits which the native samples actually use.
///
/// Unsigned samples are measured by the union of their bits,
/// signed samples by the two's complement width of their extremes.
fn used_bits(value: &PrimitiveValue, pixel_format: &PixelFormat) -> Option<u16> {
    let signed = pixel_format.is_signed();
    let (min, max, union) = match (pixel_format.bits_allocated(), value) {
        (8, PrimitiveValue::U8(bytes)) => fold_samples(bytes.iter().map(|b| {
            if signed {
                i32::from(*b as i8)
            } else {
                i32::from(*b)
            }
        })),
        (16, PrimitiveValue::U8(bytes)) => fold_samples(bytes.chunks_exact(2).map(|c| {
            if signed {
                i32::from(LittleEndian::read_i16(c))
            } else {
                i32::from(LittleEndian::read_u16(c))
            }
        })),
        (16, PrimitiveValue::U16(words)) => fold_samples(words.iter().map(|w| {
            if signed {
                i32::from(*w as i16)
            } else {
                i32::from(*w)
            }
        })),
        (16, PrimitiveValue::I16(words)) => fold_samples(words.iter().map(|w| i32::from(*w))),
        (bits, _) => {
            debug!("Cannot measure used bits of {}-bit samples", bits);
            return None;
        }
    }?;

    let width = if signed {
        twos_complement_width(min).max(twos_complement_width(max))
    } else {
        32 - (union as u32).leading_zeros()
    };
    Some(width.max(1) as u16)
}

fn fold_samples(samples: impl Iterator<Item = i32>) -> Option<(i32, i32, i32)> {
    samples.fold(None, |acc, v| match acc {
        None => Some((v, v, v)),
        Some((min, max, union)) => Some((min.min(v), max.max(v), union | v)),
    })
}

fn twos_complement_width(v: i32) -> u32 {
    if v < 0 {
        33 - (!v).leading_zeros()
    } else {
        33 - v.leading_zeros()
    }
}

/// Resolve the photometric interpretation of the image,
/// deriving it from the samples per pixel when absent or unknown.
pub fn photometric_interpretation_value<S: AttributeStore + ?Sized>(
    store: &S,
) -> PhotometricInterpretation {
    let declared = optional_string(store, tags::PHOTOMETRIC_INTERPRETATION);
    if let Some(pi) = declared
        .as_deref()
        .and_then(|s| s.parse::<PhotometricInterpretation>().ok())
    {
        return pi;
    }

    let samples_per_pixel = attribute::samples_per_pixel(store).unwrap_or(1);
    let pi = PhotometricInterpretation::default_for_samples(samples_per_pixel)
        .unwrap_or(PhotometricInterpretation::Monochrome2);
    match declared {
        Some(value) => warn!(
            "Unknown Photometric Interpretation `{}`, assuming {}",
            value, pi
        ),
        None => warn!("Missing Photometric Interpretation, assuming {}", pi),
    }
    pi
}

/// Resolve the planar configuration of the image, 0 by default.
pub fn planar_configuration_value<S: AttributeStore + ?Sized>(store: &S) -> u16 {
    if attribute::samples_per_pixel(store).unwrap_or(1) == 1 {
        return 0;
    }
    match attribute::optional_int(store, tags::PLANAR_CONFIGURATION) {
        None | Some(0) => 0,
        Some(1) => 1,
        Some(other) => {
            warn!("Invalid Planar Configuration {}, using 0", other);
            0
        }
    }
}
