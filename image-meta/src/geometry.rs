//! Resolution of the image geometry:
//! pixel spacing, origin and orientation in patient space.

use dicom_core::Tag;
use dicom_dictionary_std::tags;
use dicom_pixel_codec::ImagingPolicy;
use tracing::{debug, warn};

use crate::attribute::{first_item, functional_group_item, optional_f64, optional_f64s, optional_int};
use crate::media_storage::{media_storage, MediaStorage};
use crate::store::AttributeStore;

/// The orientation of an axis-aligned image.
pub const IDENTITY_DIRECTION_COSINES: [f64; 6] = [1., 0., 0., 0., 1., 0.];

const COSINES_TOLERANCE: f64 = 1e-3;

/// _Physical Units X Direction_ value for centimeters.
const UNITS_CM: i32 = 3;

/// The attribute holding the in-plane pixel spacing
/// of images in the given storage class.
///
/// Ultrasound and enhanced multi-frame classes
/// keep their spacing in a sequence,
/// whose tag is returned here.
pub fn spacing_tag(ms: MediaStorage) -> Tag {
    use MediaStorage::*;
    match ms {
        CrImage | DxImage | MgImage | XaImage | RfImage => tags::IMAGER_PIXEL_SPACING,
        UsImage | UsMultiFrameImage => tags::SEQUENCE_OF_ULTRASOUND_REGIONS,
        RtImage => tags::IMAGE_PLANE_PIXEL_SPACING,
        ms if ms.is_secondary_capture() => tags::NOMINAL_SCANNED_PIXEL_SPACING,
        ms if ms.is_enhanced_multi_frame() => tags::PIXEL_MEASURES_SEQUENCE,
        _ => tags::PIXEL_SPACING,
    }
}

/// Read a row spacing / column spacing pair as `(x, y)`.
fn spacing_pair<S: AttributeStore + ?Sized>(store: &S, tag: Tag) -> Option<(f64, f64)> {
    match optional_f64s(store, tag)?.as_slice() {
        [row_spacing, column_spacing, ..] => Some((*column_spacing, *row_spacing)),
        _ => None,
    }
}

fn ultrasound_spacing<S: AttributeStore + ?Sized>(store: &S) -> Option<(f64, f64)> {
    let region = first_item(store, tags::SEQUENCE_OF_ULTRASOUND_REGIONS)?;
    let delta = |value: Tag, units: Tag| {
        let delta = optional_f64(region, value)?;
        if optional_int(region, units) == Some(UNITS_CM) {
            Some(delta * 10.)
        } else {
            Some(delta)
        }
    };
    Some((
        delta(tags::PHYSICAL_DELTA_X, tags::PHYSICAL_UNITS_X_DIRECTION)?,
        delta(tags::PHYSICAL_DELTA_Y, tags::PHYSICAL_UNITS_Y_DIRECTION)?,
    ))
}

fn in_plane_spacing<S: AttributeStore + ?Sized>(
    store: &S,
    ms: MediaStorage,
    policy: &ImagingPolicy,
) -> Option<(f64, f64)> {
    let tag = spacing_tag(ms);
    // classes keeping their spacing in a sequence
    // may also declare it at the top level
    let spacing = if tag == tags::SEQUENCE_OF_ULTRASOUND_REGIONS {
        ultrasound_spacing(store).or_else(|| spacing_pair(store, tags::PIXEL_SPACING))
    } else if tag == tags::PIXEL_MEASURES_SEQUENCE {
        functional_group_item(store, tags::PIXEL_MEASURES_SEQUENCE)
            .and_then(|item| spacing_pair(item, tags::PIXEL_SPACING))
            .or_else(|| spacing_pair(store, tags::PIXEL_SPACING))
    } else {
        spacing_pair(store, tag)
    };

    spacing.or_else(|| {
        if policy.force_pixel_spacing {
            spacing_pair(store, tags::PIXEL_SPACING)
                .or_else(|| spacing_pair(store, tags::IMAGER_PIXEL_SPACING))
        } else {
            None
        }
    })
}

fn slice_spacing<S: AttributeStore + ?Sized>(store: &S, ms: MediaStorage) -> Option<f64> {
    if ms.is_enhanced_multi_frame() {
        functional_group_item(store, tags::PIXEL_MEASURES_SEQUENCE)
            .and_then(|item| {
                optional_f64(item, tags::SPACING_BETWEEN_SLICES)
                    .or_else(|| optional_f64(item, tags::SLICE_THICKNESS))
            })
            .or_else(|| optional_f64(store, tags::SPACING_BETWEEN_SLICES))
    } else if ms == MediaStorage::RtDose {
        match optional_f64s(store, tags::GRID_FRAME_OFFSET_VECTOR)?.as_slice() {
            [first, second, ..] => Some((second - first).abs()),
            _ => None,
        }
    } else {
        optional_f64(store, tags::SPACING_BETWEEN_SLICES)
    }
}

fn positive_or_one(value: Option<f64>, name: &str) -> f64 {
    match value {
        Some(v) if v > 0. && v.is_finite() => v,
        Some(v) => {
            warn!("Invalid {} spacing {}, using 1", name, v);
            1.
        }
        None => 1.,
    }
}

/// Resolve the pixel spacing of the image as `[x, y, z]`:
/// column spacing, row spacing and slice spacing.
///
/// Missing or non-positive values are replaced with 1.
pub fn spacing_value<S: AttributeStore + ?Sized>(store: &S, policy: &ImagingPolicy) -> [f64; 3] {
    let ms = media_storage(store);
    let in_plane = in_plane_spacing(store, ms, policy);
    if in_plane.is_none() {
        debug!("No pixel spacing for {} image", ms);
    }
    [
        positive_or_one(in_plane.map(|(x, _)| x), "column"),
        positive_or_one(in_plane.map(|(_, y)| y), "row"),
        positive_or_one(slice_spacing(store, ms), "slice"),
    ]
}

/// Resolve the position of the first transmitted pixel in patient space.
/// Zero by default.
pub fn origin_value<S: AttributeStore + ?Sized>(store: &S) -> [f64; 3] {
    let position = optional_f64s(store, tags::IMAGE_POSITION_PATIENT).or_else(|| {
        functional_group_item(store, tags::PLANE_POSITION_SEQUENCE)
            .and_then(|item| optional_f64s(item, tags::IMAGE_POSITION_PATIENT))
    });
    match position.as_deref() {
        Some([x, y, z, ..]) => [*x, *y, *z],
        _ => [0.; 3],
    }
}

/// Whether the values are a valid pair of row and column direction cosines:
/// two orthogonal unit vectors.
pub fn are_valid_direction_cosines(values: &[f64]) -> bool {
    if values.len() != 6 || values.iter().any(|v| !v.is_finite()) {
        return false;
    }
    let (row, column) = values.split_at(3);
    let dot = |a: &[f64], b: &[f64]| a.iter().zip(b).map(|(x, y)| x * y).sum::<f64>();
    (dot(row, row).sqrt() - 1.).abs() <= COSINES_TOLERANCE
        && (dot(column, column).sqrt() - 1.).abs() <= COSINES_TOLERANCE
        && dot(row, column).abs() <= COSINES_TOLERANCE
}

fn declared_direction_cosines<S: AttributeStore + ?Sized>(store: &S) -> Option<Vec<f64>> {
    optional_f64s(store, tags::IMAGE_ORIENTATION_PATIENT).or_else(|| {
        functional_group_item(store, tags::PLANE_ORIENTATION_SEQUENCE)
            .and_then(|item| optional_f64s(item, tags::IMAGE_ORIENTATION_PATIENT))
    })
}

/// Fetch the direction cosines declared in the data set,
/// only if they are valid.
pub fn direction_cosines_from_dataset<S: AttributeStore + ?Sized>(store: &S) -> Option<[f64; 6]> {
    let values = declared_direction_cosines(store)?;
    if !are_valid_direction_cosines(&values) {
        return None;
    }
    let mut out = [0.; 6];
    out.copy_from_slice(&values);
    Some(out)
}

/// Resolve the row and column direction cosines of the image.
///
/// Invalid declared values are replaced with the identity orientation.
pub fn direction_cosines_value<S: AttributeStore + ?Sized>(store: &S) -> [f64; 6] {
    if let Some(cosines) = direction_cosines_from_dataset(store) {
        return cosines;
    }
    if let Some(values) = declared_direction_cosines(store) {
        warn!(
            "Invalid direction cosines {:?}, using identity orientation",
            values
        );
    }
    IDENTITY_DIRECTION_COSINES
}
