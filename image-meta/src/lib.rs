//! This crate resolves the canonical image attributes of a DICOM object,
//! working around defects commonly found in real-world files,
//! and writes them back into a data set.
//!
//! Every resolver takes an [`AttributeStore`],
//! which is implemented for the in-memory objects of `dicom-object`,
//! plus an [`ImagingPolicy`] where workarounds apply.
//! Required attributes fail with a [`ResolveError`];
//! the others fall back to a sensible default with a warning.
//!
//! # Example
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use dicom_image_meta::{dimensions_value, pixel_format_value, spacing_value, ImagingPolicy};
//! use dicom_object::open_file;
//!
//! let obj = open_file("ct.dcm")?;
//! let policy = ImagingPolicy::default().with_clean_unused_bits(true);
//!
//! let dimensions = dimensions_value(&obj)?;
//! let pixel_format = pixel_format_value(&obj, &policy)?;
//! let [x, y, z] = spacing_value(&obj, &policy);
//! println!(
//!     "{:?} with {} bits stored, spacing {}x{}x{}",
//!     dimensions.to_vec(),
//!     pixel_format.bits_stored(),
//!     x,
//!     y,
//!     z
//! );
//! # Ok(())
//! # }
//! ```

pub mod attribute;
pub mod geometry;
pub mod lut;
pub mod media_storage;
pub mod pixel;
pub mod rescale;
pub mod store;
pub mod transform;
pub mod write;

pub use dicom_pixel_codec::{
    Dimensions, ImagingPolicy, PhotometricInterpretation, PixelFormat, PixelRepresentation,
};

pub use crate::attribute::{ResolveError, Result};
pub use crate::geometry::{
    are_valid_direction_cosines, direction_cosines_from_dataset, direction_cosines_value,
    origin_value, spacing_value,
};
pub use crate::lut::{palette_lut, PaletteLut};
pub use crate::media_storage::{compute_media_storage_from_modality, media_storage, MediaStorage};
pub use crate::pixel::{
    dimensions_value, photometric_interpretation_value, pixel_format_value,
    planar_configuration_value,
};
pub use crate::rescale::{
    real_world_value_mapping, rescale_intercept_slope_value, voi_lut_function, window_levels,
};
pub use crate::store::AttributeStore;
pub use crate::transform::{RealWorldValueMapping, Rescale, VoiLutFunction, WindowLevel};
pub use crate::write::{
    set_dimensions_value, set_direction_cosines_value, set_origin_value,
    set_photometric_interpretation_value, set_pixel_format_value,
    set_rescale_intercept_slope_value, set_spacing_value, set_voi_lut, WriteError,
};
