//! This crate converts DICOM encapsulated pixel data
//! between compressed fragments and raw sample buffers.
//!
//! - [`FragmentStream`] holds the compressed fragments of an image,
//!   and converts to and from encapsulated pixel data values.
//! - [`ImageCodec`] is the interface of a codec for one compression family,
//!   selected by transfer syntax through a [`CodecRegistry`].
//! - [`JpegLsCodec`](jpegls::JpegLsCodec) implements JPEG-LS
//!   lossless and near-lossless transcoding,
//!   with the entropy coding delegated to a [`JpegLsBackend`](jpegls::JpegLsBackend).
//!   Enable the `charls` feature for a backend based on CharLS.
//! - [`ImagingPolicy`] gathers the workaround and quality toggles
//!   which apply to an operation.
//!
//! # Example
//!
//! ```no_run
//! # #[cfg(feature = "charls")]
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use dicom_pixel_codec::{CodecRegistry, Dimensions, FragmentStream, ImagingPolicy, PixelFormat};
//!
//! let policy = ImagingPolicy::default();
//! let registry = CodecRegistry::with_default_codecs();
//! let mut codec = registry
//!     .encoder_for("1.2.840.10008.1.2.4.80", &policy)
//!     .ok_or("no JPEG-LS codec")?;
//! codec.set_dimensions(Dimensions::new(64, 64)?);
//! codec.set_pixel_format(PixelFormat::uint16());
//!
//! let raw = vec![0_u8; 64 * 64 * 2];
//! let fragments: FragmentStream = codec.code(&raw)?;
//! let decoded = codec.decode(&fragments)?;
//! assert_eq!(decoded, raw);
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "charls"))]
//! # fn main() {}
//! ```

pub mod codec;
pub mod error;
pub mod format;
pub mod fragments;
pub mod jpegls;
pub mod policy;
pub mod registry;

pub use crate::codec::{ImageCodec, ImageInfo};
pub use crate::error::{Error, ErrorKind, Result};
pub use crate::format::{
    Dimensions, InvalidDimensions, InvalidPixelFormat, PhotometricInterpretation, PixelFormat,
    PixelRepresentation,
};
pub use crate::fragments::FragmentStream;
pub use crate::policy::ImagingPolicy;
pub use crate::registry::{CodecRegistry, DynImageCodec};
