//! Resolution of the pixel value transformations:
//! modality rescale, real world value mapping and VOI windows.

use std::convert::TryFrom;

use dicom_core::Tag;
use dicom_dictionary_std::tags;
use dicom_pixel_codec::ImagingPolicy;
use tracing::{debug, warn};

use crate::attribute::{
    first_item, functional_group_item, modality, optional_f64, optional_f64s, optional_string,
};
use crate::media_storage::{media_storage, MediaStorage};
use crate::store::AttributeStore;
use crate::transform::{RealWorldValueMapping, Rescale, VoiLutFunction, WindowLevel};

/// The private creator of the Philips MR block
/// holding the scale intercept and slope.
const PMS_PRIVATE_CREATOR: &str = "Philips MR Imaging DD 005";
const PMS_GROUP: u16 = 0x2005;
const PMS_INTERCEPT_ELEMENT: u16 = 0x09;
const PMS_SLOPE_ELEMENT: u16 = 0x0A;

fn rescale_from<S: AttributeStore + ?Sized>(
    store: &S,
    intercept: Tag,
    slope: Tag,
) -> Option<Rescale> {
    let slope = optional_f64(store, slope)?;
    let intercept = optional_f64(store, intercept).unwrap_or(0.);
    Some(Rescale::new(slope, intercept))
}

fn standard_rescale<S: AttributeStore + ?Sized>(store: &S) -> Option<Rescale> {
    let intercept = optional_f64(store, tags::RESCALE_INTERCEPT);
    let slope = optional_f64(store, tags::RESCALE_SLOPE);
    if intercept.is_none() && slope.is_none() {
        return None;
    }
    Some(Rescale::new(slope.unwrap_or(1.), intercept.unwrap_or(0.)))
}

/// Locate the private block reserved by the given creator in a group.
fn private_block<S: AttributeStore + ?Sized>(store: &S, group: u16, creator: &str) -> Option<u16> {
    (0x0010..=0x00FF).find(|element| {
        optional_string(store, Tag(group, *element)).as_deref() == Some(creator)
    })
}

fn philips_rescale<S: AttributeStore + ?Sized>(store: &S) -> Option<Rescale> {
    let block = private_block(store, PMS_GROUP, PMS_PRIVATE_CREATOR)?;
    rescale_from(
        store,
        Tag(PMS_GROUP, (block << 8) | PMS_INTERCEPT_ELEMENT),
        Tag(PMS_GROUP, (block << 8) | PMS_SLOPE_ELEMENT),
    )
}

/// Resolve the modality rescale function of the image.
///
/// The first source found applies, in this order:
/// the _Pixel Value Transformation Sequence_ of enhanced multi-frame images,
/// the Philips private scale of MR images (`pms_rescale_intercept_slope`),
/// the _Dose Grid Scaling_ of RT Dose,
/// and the standard _Rescale Intercept_ and _Rescale Slope_
/// for storage classes which define them (or any class when forced).
/// Otherwise the identity is returned.
pub fn rescale_intercept_slope_value<S: AttributeStore + ?Sized>(
    store: &S,
    policy: &ImagingPolicy,
) -> Rescale {
    let ms = media_storage(store);

    let mut rescale = None;
    if ms.is_enhanced_multi_frame() {
        rescale = functional_group_item(store, tags::PIXEL_VALUE_TRANSFORMATION_SEQUENCE)
            .and_then(|item| rescale_from(item, tags::RESCALE_INTERCEPT, tags::RESCALE_SLOPE));
    }
    if rescale.is_none() && policy.pms_rescale_intercept_slope {
        let is_mr = matches!(ms, MediaStorage::MrImage | MediaStorage::EnhancedMrImage)
            || modality(store).as_deref() == Some("MR");
        if is_mr {
            rescale = philips_rescale(store);
        }
    }
    if rescale.is_none() && ms == MediaStorage::RtDose {
        rescale =
            optional_f64(store, tags::DOSE_GRID_SCALING).map(|slope| Rescale::new(slope, 0.));
    }
    if rescale.is_none() {
        if policy.force_rescale_intercept_slope || ms.has_modality_lut() {
            rescale = standard_rescale(store);
        } else {
            debug!("Ignoring rescale attributes of {} image", ms);
        }
    }

    let mut rescale = rescale.unwrap_or_else(Rescale::identity);
    if rescale.slope == 0. {
        warn!("Rescale slope is zero, using 1");
        rescale.slope = 1.;
    }
    rescale
}

/// Fetch the first real world value mapping of the image,
/// declared at the top level or in its functional groups.
pub fn real_world_value_mapping<S: AttributeStore + ?Sized>(
    store: &S,
) -> Option<RealWorldValueMapping> {
    match first_item(store, tags::REAL_WORLD_VALUE_MAPPING_SEQUENCE) {
        Some(item) => mapping_from_item(item),
        None => functional_group_item(store, tags::REAL_WORLD_VALUE_MAPPING_SEQUENCE)
            .and_then(|item| mapping_from_item(item)),
    }
}

fn mapping_from_item<S: AttributeStore + ?Sized>(item: &S) -> Option<RealWorldValueMapping> {
    let slope = optional_f64(item, tags::REAL_WORLD_VALUE_SLOPE)?;
    let intercept = optional_f64(item, tags::REAL_WORLD_VALUE_INTERCEPT).unwrap_or(0.);
    let units = first_item(item, tags::MEASUREMENT_UNITS_CODE_SEQUENCE);
    let code = |tag| {
        units
            .and_then(|units| optional_string(units, tag))
            .unwrap_or_default()
    };
    Some(RealWorldValueMapping {
        intercept,
        slope,
        code_value: code(tags::CODE_VALUE),
        code_meaning: code(tags::CODE_MEANING),
    })
}

/// Fetch the VOI windows of the image, pairing each center with its width.
pub fn window_levels<S: AttributeStore + ?Sized>(store: &S) -> Vec<WindowLevel> {
    let centers = optional_f64s(store, tags::WINDOW_CENTER).unwrap_or_default();
    let widths = optional_f64s(store, tags::WINDOW_WIDTH).unwrap_or_default();
    if centers.len() != widths.len() {
        warn!(
            "{} window centers but {} window widths",
            centers.len(),
            widths.len()
        );
    }
    centers
        .into_iter()
        .zip(widths)
        .map(|(center, width)| WindowLevel { width, center })
        .collect()
}

/// Fetch the VOI LUT function of the image, if declared and known.
pub fn voi_lut_function<S: AttributeStore + ?Sized>(store: &S) -> Option<VoiLutFunction> {
    let value = optional_string(store, tags::VOILUT_FUNCTION)?;
    match VoiLutFunction::try_from(value.as_str()) {
        Ok(function) => Some(function),
        Err(_) => {
            warn!("Unknown VOI LUT function `{}`", value);
            None
        }
    }
}
