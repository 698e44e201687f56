//! Writing resolved image attributes back into an attribute store.
//!
//! Only standard attributes are written.

use std::convert::TryFrom;

use dicom_core::value::PrimitiveValue;
use dicom_core::{Tag, VR};
use dicom_dictionary_std::tags;
use dicom_pixel_codec::{Dimensions, PhotometricInterpretation, PixelFormat};
use snafu::{Backtrace, OptionExt, Snafu};
use tracing::warn;

use crate::geometry::{are_valid_direction_cosines, spacing_tag, IDENTITY_DIRECTION_COSINES};
use crate::media_storage::media_storage;
use crate::store::AttributeStore;
use crate::transform::{Rescale, VoiLutFunction, WindowLevel};

#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum WriteError {
    #[snafu(display("Value {} does not fit in attribute `{}`", value, name))]
    ValueOutOfRange {
        name: &'static str,
        value: u32,
        backtrace: Backtrace,
    },
}

/// Maximum length of a decimal string value.
const DS_MAX_LEN: usize = 16;

/// Format a number as a decimal string of at most 16 characters,
/// losing as little precision as possible.
pub fn format_decimal(value: f64) -> String {
    if !value.is_finite() {
        warn!("Cannot represent {} as a decimal string, using 0", value);
        return "0".to_string();
    }

    let plain = value.to_string();
    if plain.len() <= DS_MAX_LEN {
        return plain;
    }

    let fixed = (0..DS_MAX_LEN)
        .rev()
        .map(|precision| trim_fraction(&format!("{:.*}", precision, value)).to_string())
        .find(|s| s.len() <= DS_MAX_LEN);
    let scientific = (0..DS_MAX_LEN)
        .rev()
        .map(|precision| {
            let s = format!("{:.*e}", precision, value);
            match s.find('e') {
                Some(e) => format!("{}{}", trim_fraction(&s[..e]), &s[e..]),
                None => s,
            }
        })
        .find(|s| s.len() <= DS_MAX_LEN);

    let error = |s: &str| {
        s.parse::<f64>()
            .map_or(f64::INFINITY, |parsed| (parsed - value).abs())
    };
    match (fixed, scientific) {
        (Some(fixed), Some(scientific)) => {
            if error(&scientific) < error(&fixed) {
                scientific
            } else {
                fixed
            }
        }
        (fixed, scientific) => fixed.or(scientific).unwrap_or_else(|| "0".to_string()),
    }
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

fn decimal_strings(values: &[f64]) -> PrimitiveValue {
    PrimitiveValue::Strs(values.iter().map(|v| format_decimal(*v)).collect())
}

fn put_u16<S: AttributeStore + ?Sized>(store: &mut S, tag: Tag, value: u16) {
    store.insert(tag, VR::US, PrimitiveValue::from(value));
}

fn put_decimals<S: AttributeStore + ?Sized>(store: &mut S, tag: Tag, values: &[f64]) {
    store.insert(tag, VR::DS, decimal_strings(values));
}

/// Write _Rows_, _Columns_ and, for multi-frame images, _Number of Frames_.
///
/// _Number of Frames_ is removed for 2-D dimensions.
/// Fails without writing anything
/// if the rows or columns do not fit in an unsigned short.
pub fn set_dimensions_value<S: AttributeStore + ?Sized>(
    store: &mut S,
    dimensions: &Dimensions,
) -> Result<(), WriteError> {
    let rows = unsigned_short("Rows", dimensions.rows())?;
    let columns = unsigned_short("Columns", dimensions.columns())?;

    put_u16(store, tags::ROWS, rows);
    put_u16(store, tags::COLUMNS, columns);
    match dimensions.frames() {
        Some(frames) => store.insert(
            tags::NUMBER_OF_FRAMES,
            VR::IS,
            PrimitiveValue::from(frames.to_string()),
        ),
        None => {
            store.remove(tags::NUMBER_OF_FRAMES);
        }
    }
    Ok(())
}

fn unsigned_short(name: &'static str, value: u32) -> Result<u16, WriteError> {
    u16::try_from(value)
        .ok()
        .context(ValueOutOfRangeSnafu { name, value })
}

/// Write the attributes of the image pixel module describing the samples.
pub fn set_pixel_format_value<S: AttributeStore + ?Sized>(
    store: &mut S,
    pixel_format: &PixelFormat,
) {
    put_u16(
        store,
        tags::SAMPLES_PER_PIXEL,
        pixel_format.samples_per_pixel(),
    );
    put_u16(store, tags::BITS_ALLOCATED, pixel_format.bits_allocated());
    put_u16(store, tags::BITS_STORED, pixel_format.bits_stored());
    put_u16(store, tags::HIGH_BIT, pixel_format.high_bit());
    put_u16(
        store,
        tags::PIXEL_REPRESENTATION,
        pixel_format.pixel_representation().value(),
    );
}

pub fn set_photometric_interpretation_value<S: AttributeStore + ?Sized>(
    store: &mut S,
    photometric_interpretation: PhotometricInterpretation,
) {
    store.insert(
        tags::PHOTOMETRIC_INTERPRETATION,
        VR::CS,
        PrimitiveValue::from(photometric_interpretation.as_str()),
    );
}

/// Write _Rescale Intercept_ and _Rescale Slope_.
pub fn set_rescale_intercept_slope_value<S: AttributeStore + ?Sized>(
    store: &mut S,
    rescale: &Rescale,
) {
    put_decimals(store, tags::RESCALE_INTERCEPT, &[rescale.intercept]);
    put_decimals(store, tags::RESCALE_SLOPE, &[rescale.slope]);
}

/// Write _Image Position (Patient)_.
pub fn set_origin_value<S: AttributeStore + ?Sized>(store: &mut S, origin: &[f64; 3]) {
    put_decimals(store, tags::IMAGE_POSITION_PATIENT, origin);
}

/// Write the in-plane spacing `[x, y]` or `[x, y, z]`
/// to the spacing attribute of the image's storage class.
///
/// Classes keeping their spacing in a sequence get _Pixel Spacing_ instead.
/// The third value, if any, is written as _Spacing Between Slices_.
pub fn set_spacing_value<S: AttributeStore + ?Sized>(store: &mut S, spacing: &[f64]) {
    let (x, y) = match spacing {
        [x, y, ..] => (*x, *y),
        _ => {
            warn!("Expected at least 2 spacing values, got {}", spacing.len());
            return;
        }
    };

    let tag = match spacing_tag(media_storage(&*store)) {
        tag if tag == tags::SEQUENCE_OF_ULTRASOUND_REGIONS
            || tag == tags::PIXEL_MEASURES_SEQUENCE =>
        {
            tags::PIXEL_SPACING
        }
        tag => tag,
    };
    // row spacing first
    put_decimals(store, tag, &[y, x]);

    if let Some(z) = spacing.get(2) {
        put_decimals(store, tags::SPACING_BETWEEN_SLICES, &[*z]);
    }
}

/// Write the VOI windows and, if given, the VOI LUT function.
pub fn set_voi_lut<S: AttributeStore + ?Sized>(
    store: &mut S,
    window_levels: &[WindowLevel],
    function: Option<VoiLutFunction>,
) {
    if window_levels.is_empty() {
        return;
    }
    let centers: Vec<f64> = window_levels.iter().map(|w| w.center).collect();
    let widths: Vec<f64> = window_levels.iter().map(|w| w.width).collect();
    put_decimals(store, tags::WINDOW_CENTER, &centers);
    put_decimals(store, tags::WINDOW_WIDTH, &widths);
    if let Some(function) = function {
        store.insert(
            tags::VOILUT_FUNCTION,
            VR::CS,
            PrimitiveValue::from(function.as_str()),
        );
    }
}

/// Write _Image Orientation (Patient)_.
///
/// Invalid direction cosines are written as the identity orientation.
pub fn set_direction_cosines_value<S: AttributeStore + ?Sized>(store: &mut S, cosines: &[f64]) {
    let identity = IDENTITY_DIRECTION_COSINES;
    let cosines = if are_valid_direction_cosines(cosines) {
        cosines
    } else {
        warn!(
            "Invalid direction cosines {:?}, writing identity orientation",
            cosines
        );
        &identity[..]
    };
    put_decimals(store, tags::IMAGE_ORIENTATION_PATIENT, cosines);
}

#[cfg(test)]
mod tests {
    use super::format_decimal;

    #[test]
    fn short_decimals_are_kept() {
        assert_eq!(format_decimal(0.), "0");
        assert_eq!(format_decimal(-1024.), "-1024");
        assert_eq!(format_decimal(0.5), "0.5");
        assert_eq!(format_decimal(2.5e-5), "0.000025");
    }

    #[test]
    fn long_decimals_fit_in_16_characters() {
        for value in [
            std::f64::consts::PI,
            -std::f64::consts::E * 1000.,
            1. / 3.,
            -0.000_000_123_456_789_012_3,
            123_456_789_012_345_678.,
            -1.234_567_890_123_456_7e-200,
            1.5e300,
        ] {
            let s = format_decimal(value);
            assert!(s.len() <= 16, "`{}` is too long", s);
            let parsed: f64 = s.parse().unwrap();
            let error = ((parsed - value) / value).abs();
            assert!(error < 1e-9, "`{}` is too far from {}", s, value);
        }
    }
}
