//! Utility module for fetching key attributes from an attribute store.

use crate::store::AttributeStore;
use dicom_core::value::{ConvertValueError, PrimitiveValue};
use dicom_core::Tag;
use dicom_dictionary_std::tags;
use snafu::{Backtrace, OptionExt, ResultExt, Snafu};

#[derive(Debug, Snafu)]
#[non_exhaustive]
#[snafu(visibility(pub(crate)))]
pub enum ResolveError {
    #[snafu(display("Missing required attribute `{}`", name))]
    MissingAttribute {
        name: &'static str,
        backtrace: Backtrace,
    },

    #[snafu(display("Could not convert attribute `{}`", name))]
    ConvertValue {
        name: &'static str,
        source: ConvertValueError,
        backtrace: Backtrace,
    },

    #[snafu(display("Semantically invalid value `{}` for attribute `{}`", value, name))]
    InvalidValue {
        name: &'static str,
        value: String,
        backtrace: Backtrace,
    },

    #[snafu(display("Inconsistent pixel format attributes"))]
    InvalidPixelFormat {
        source: dicom_pixel_codec::InvalidPixelFormat,
        backtrace: Backtrace,
    },

    #[snafu(display("Invalid image dimensions"))]
    InvalidDimensions {
        source: dicom_pixel_codec::InvalidDimensions,
        backtrace: Backtrace,
    },
}

pub type Result<T, E = ResolveError> = std::result::Result<T, E>;

/// Fetch the primitive value of an attribute,
/// treating empty and blank values as absent.
pub(crate) fn primitive<S: AttributeStore + ?Sized>(
    store: &S,
    tag: Tag,
) -> Option<&PrimitiveValue> {
    let value = store.lookup(tag)?.primitive()?;
    if value.multiplicity() == 0 {
        return None;
    }
    match value {
        PrimitiveValue::Str(_) | PrimitiveValue::Strs(_)
            if trim(&value.to_str()).is_empty() =>
        {
            None
        }
        _ => Some(value),
    }
}

pub(crate) fn trim(s: &str) -> &str {
    s.trim_matches(|c: char| c == '\0' || c.is_whitespace())
}

#[inline]
pub(crate) fn retrieve_required_u16<S: AttributeStore + ?Sized>(
    store: &S,
    tag: Tag,
    name: &'static str,
) -> Result<u16> {
    primitive(store, tag)
        .context(MissingAttributeSnafu { name })?
        .to_int::<u16>()
        .context(ConvertValueSnafu { name })
}

#[inline]
pub(crate) fn retrieve_optional_u16<S: AttributeStore + ?Sized>(
    store: &S,
    tag: Tag,
    name: &'static str,
) -> Result<Option<u16>> {
    primitive(store, tag)
        .map(|v| v.to_int::<u16>().context(ConvertValueSnafu { name }))
        .transpose()
}

/// Fetch an integer attribute, or `None` when absent or malformed.
pub(crate) fn optional_int<S: AttributeStore + ?Sized>(store: &S, tag: Tag) -> Option<i32> {
    primitive(store, tag).and_then(|v| v.to_int::<i32>().ok())
}

/// Fetch a decimal attribute, or `None` when absent or malformed.
pub(crate) fn optional_f64<S: AttributeStore + ?Sized>(store: &S, tag: Tag) -> Option<f64> {
    primitive(store, tag).and_then(|v| v.to_float64().ok())
}

/// Fetch a multi-valued decimal attribute, or `None` when absent or malformed.
pub(crate) fn optional_f64s<S: AttributeStore + ?Sized>(store: &S, tag: Tag) -> Option<Vec<f64>> {
    primitive(store, tag).and_then(|v| v.to_multi_float64().ok())
}

/// Fetch a textual attribute without padding.
pub(crate) fn optional_string<S: AttributeStore + ?Sized>(store: &S, tag: Tag) -> Option<String> {
    primitive(store, tag).map(|v| trim(&v.to_str()).to_string())
}

/// Fetch the first item of a sequence attribute.
pub(crate) fn first_item<S: AttributeStore + ?Sized>(store: &S, tag: Tag) -> Option<&S::Item> {
    store.lookup(tag)?.items()?.first()
}

/// Fetch the items of a sequence attribute,
/// empty if the attribute is absent or not a sequence.
pub(crate) fn items<S: AttributeStore + ?Sized>(store: &S, tag: Tag) -> &[S::Item] {
    store.lookup(tag).and_then(|v| v.items()).unwrap_or(&[])
}

/// Fetch the first item of a functional group macro,
/// looking in the shared functional groups
/// and then in the functional groups of the first frame.
pub(crate) fn functional_group_item<S: AttributeStore + ?Sized>(
    store: &S,
    tag: Tag,
) -> Option<&<S::Item as AttributeStore>::Item> {
    [
        tags::SHARED_FUNCTIONAL_GROUPS_SEQUENCE,
        tags::PER_FRAME_FUNCTIONAL_GROUPS_SEQUENCE,
    ]
    .iter()
    .filter_map(|group| first_item(store, *group))
    .find_map(|group| first_item(group, tag))
}

/// Get the Rows from the attribute store
pub fn rows<S: AttributeStore + ?Sized>(store: &S) -> Result<u16> {
    retrieve_required_u16(store, tags::ROWS, "Rows")
}

/// Get the Columns from the attribute store
pub fn cols<S: AttributeStore + ?Sized>(store: &S) -> Result<u16> {
    retrieve_required_u16(store, tags::COLUMNS, "Columns")
}

/// Get the BitsAllocated from the attribute store
pub fn bits_allocated<S: AttributeStore + ?Sized>(store: &S) -> Result<u16> {
    retrieve_required_u16(store, tags::BITS_ALLOCATED, "BitsAllocated")
}

/// Get the BitsStored from the attribute store, if present
pub fn bits_stored<S: AttributeStore + ?Sized>(store: &S) -> Result<Option<u16>> {
    retrieve_optional_u16(store, tags::BITS_STORED, "BitsStored")
}

/// Get the HighBit from the attribute store, if present
pub fn high_bit<S: AttributeStore + ?Sized>(store: &S) -> Result<Option<u16>> {
    retrieve_optional_u16(store, tags::HIGH_BIT, "HighBit")
}

/// Get the SamplesPerPixel from the attribute store, returning 1 by default
pub fn samples_per_pixel<S: AttributeStore + ?Sized>(store: &S) -> Result<u16> {
    retrieve_optional_u16(store, tags::SAMPLES_PER_PIXEL, "SamplesPerPixel").map(|v| v.unwrap_or(1))
}

/// Get the PixelRepresentation from the attribute store
pub fn pixel_representation<S: AttributeStore + ?Sized>(
    store: &S,
) -> Result<dicom_pixel_codec::PixelRepresentation> {
    let p = retrieve_required_u16(store, tags::PIXEL_REPRESENTATION, "PixelRepresentation")?;

    dicom_pixel_codec::PixelRepresentation::from_value(p).context(InvalidValueSnafu {
        name: "PixelRepresentation",
        value: p.to_string(),
    })
}

/// Get the NumberOfFrames from the attribute store, if present
pub fn number_of_frames<S: AttributeStore + ?Sized>(store: &S) -> Result<Option<u32>> {
    let value = match primitive(store, tags::NUMBER_OF_FRAMES) {
        Some(value) => value,
        None => return Ok(None),
    };

    let integer = value.to_int::<i32>().context(ConvertValueSnafu {
        name: "NumberOfFrames",
    })?;

    snafu::ensure!(
        integer > 0,
        InvalidValueSnafu {
            name: "NumberOfFrames",
            value: integer.to_string(),
        }
    );

    Ok(Some(integer as u32))
}

/// Get the Modality from the attribute store, if present
pub fn modality<S: AttributeStore + ?Sized>(store: &S) -> Option<String> {
    optional_string(store, tags::MODALITY)
}
