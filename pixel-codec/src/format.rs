//! Pixel sample layout and image geometry.
//!
//! These types are shared between attribute resolution
//! and the pixel data codecs,
//! and are validated on construction.

use std::convert::TryFrom;
use std::fmt;
use std::str::FromStr;

use snafu::{ensure, Snafu};
use tracing::warn;

/// An error building a [`PixelFormat`] from inconsistent values.
#[derive(Debug, Clone, PartialEq, Snafu)]
#[non_exhaustive]
pub enum InvalidPixelFormat {
    #[snafu(display("Unsupported samples per pixel: {}", samples_per_pixel))]
    SamplesPerPixel { samples_per_pixel: u16 },

    #[snafu(display("Bits allocated must be between 1 and 64, got {}", bits_allocated))]
    BitsAllocated { bits_allocated: u16 },

    #[snafu(display(
        "Bits stored ({}) must be between 1 and bits allocated ({})",
        bits_stored,
        bits_allocated
    ))]
    BitsStored { bits_stored: u16, bits_allocated: u16 },

    #[snafu(display(
        "High bit ({}) must be one less than bits stored ({})",
        high_bit,
        bits_stored
    ))]
    HighBit { high_bit: u16, bits_stored: u16 },
}

/// An error building [`Dimensions`].
#[derive(Debug, Clone, PartialEq, Snafu)]
#[non_exhaustive]
pub enum InvalidDimensions {
    #[snafu(display("Image dimension #{} is zero", index))]
    ZeroDimension { index: usize },

    #[snafu(display("Expected 2 or 3 dimensions, got {}", count))]
    DimensionCount { count: usize },
}

/// An enum representing the possible values of _Pixel Representation_.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PixelRepresentation {
    /// unsigned pixel data sample values
    Unsigned,
    /// signed pixel data sample values
    Signed,
}

impl PixelRepresentation {
    /// Interpret a _Pixel Representation_ attribute value.
    pub fn from_value(value: u16) -> Option<Self> {
        match value {
            0 => Some(PixelRepresentation::Unsigned),
            1 => Some(PixelRepresentation::Signed),
            _ => None,
        }
    }

    /// The attribute value of this representation.
    pub fn value(self) -> u16 {
        match self {
            PixelRepresentation::Unsigned => 0,
            PixelRepresentation::Signed => 1,
        }
    }
}

/// The layout of raw pixel samples.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct PixelFormat {
    samples_per_pixel: u16,
    bits_allocated: u16,
    bits_stored: u16,
    high_bit: u16,
    pixel_representation: PixelRepresentation,
}

impl PixelFormat {
    /// Create a pixel format,
    /// checking that all values are consistent with each other.
    pub fn new(
        samples_per_pixel: u16,
        bits_allocated: u16,
        bits_stored: u16,
        high_bit: u16,
        pixel_representation: PixelRepresentation,
    ) -> Result<Self, InvalidPixelFormat> {
        ensure!(
            matches!(samples_per_pixel, 1 | 3 | 4),
            SamplesPerPixelSnafu { samples_per_pixel }
        );
        ensure!(
            (1..=64).contains(&bits_allocated),
            BitsAllocatedSnafu { bits_allocated }
        );
        ensure!(
            bits_stored >= 1 && bits_stored <= bits_allocated,
            BitsStoredSnafu {
                bits_stored,
                bits_allocated
            }
        );
        ensure!(
            u32::from(high_bit) + 1 == u32::from(bits_stored),
            HighBitSnafu {
                high_bit,
                bits_stored
            }
        );

        Ok(PixelFormat {
            samples_per_pixel,
            bits_allocated,
            bits_stored,
            high_bit,
            pixel_representation,
        })
    }

    /// Create a pixel format from declared attribute values,
    /// where _Bits Stored_ and _High Bit_ may be absent.
    ///
    /// Bits stored defaults to bits allocated.
    /// A high bit which does not match bits stored
    /// is replaced with `bits_stored - 1`.
    pub fn from_declared(
        samples_per_pixel: u16,
        bits_allocated: u16,
        bits_stored: Option<u16>,
        high_bit: Option<u16>,
        pixel_representation: PixelRepresentation,
    ) -> Result<Self, InvalidPixelFormat> {
        let bits_stored = bits_stored.unwrap_or(bits_allocated);
        let expected_high_bit = bits_stored.saturating_sub(1);
        let high_bit = match high_bit {
            Some(high_bit) if high_bit != expected_high_bit => {
                warn!(
                    "High Bit {} does not match Bits Stored {}, using {}",
                    high_bit, bits_stored, expected_high_bit
                );
                expected_high_bit
            }
            _ => expected_high_bit,
        };
        Self::new(
            samples_per_pixel,
            bits_allocated,
            bits_stored,
            high_bit,
            pixel_representation,
        )
    }

    /// Single sample, 8-bit unsigned.
    pub const fn uint8() -> Self {
        PixelFormat {
            samples_per_pixel: 1,
            bits_allocated: 8,
            bits_stored: 8,
            high_bit: 7,
            pixel_representation: PixelRepresentation::Unsigned,
        }
    }

    /// Single sample, 16-bit unsigned.
    pub const fn uint16() -> Self {
        PixelFormat {
            samples_per_pixel: 1,
            bits_allocated: 16,
            bits_stored: 16,
            high_bit: 15,
            pixel_representation: PixelRepresentation::Unsigned,
        }
    }

    #[inline]
    pub fn samples_per_pixel(&self) -> u16 {
        self.samples_per_pixel
    }

    #[inline]
    pub fn bits_allocated(&self) -> u16 {
        self.bits_allocated
    }

    #[inline]
    pub fn bits_stored(&self) -> u16 {
        self.bits_stored
    }

    #[inline]
    pub fn high_bit(&self) -> u16 {
        self.high_bit
    }

    #[inline]
    pub fn pixel_representation(&self) -> PixelRepresentation {
        self.pixel_representation
    }

    #[inline]
    pub fn is_signed(&self) -> bool {
        self.pixel_representation == PixelRepresentation::Signed
    }

    /// The number of bytes occupied by a single sample.
    #[inline]
    pub fn bytes_per_sample(&self) -> usize {
        (self.bits_allocated as usize + 7) / 8
    }

    /// The number of bytes occupied by a single pixel.
    #[inline]
    pub fn pixel_size(&self) -> usize {
        self.bytes_per_sample() * self.samples_per_pixel as usize
    }

    /// Derive a pixel format with a different number of bits stored.
    /// High bit follows.
    pub fn with_bits_stored(self, bits_stored: u16) -> Result<Self, InvalidPixelFormat> {
        Self::new(
            self.samples_per_pixel,
            self.bits_allocated,
            bits_stored,
            bits_stored.saturating_sub(1),
            self.pixel_representation,
        )
    }

    /// Derive a pixel format with a different number of bits allocated.
    /// Bits stored is clamped to the new allocation.
    pub fn with_bits_allocated(self, bits_allocated: u16) -> Result<Self, InvalidPixelFormat> {
        let bits_stored = self.bits_stored.min(bits_allocated);
        Self::new(
            self.samples_per_pixel,
            bits_allocated,
            bits_stored,
            bits_stored.saturating_sub(1),
            self.pixel_representation,
        )
    }

    /// Derive a pixel format with a different number of samples per pixel.
    pub fn with_samples_per_pixel(
        self,
        samples_per_pixel: u16,
    ) -> Result<Self, InvalidPixelFormat> {
        Self::new(
            samples_per_pixel,
            self.bits_allocated,
            self.bits_stored,
            self.high_bit,
            self.pixel_representation,
        )
    }
}

/// Unrecognized photometric interpretation
#[derive(Debug, Clone, PartialEq, Snafu)]
#[snafu(display("Unknown photometric interpretation `{}`", value))]
pub struct UnknownPhotometricInterpretation {
    value: String,
}

/// The color or intensity meaning of pixel samples.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PhotometricInterpretation {
    Monochrome1,
    Monochrome2,
    PaletteColor,
    Rgb,
    Hsv,
    Argb,
    Cmyk,
    YbrFull,
    YbrFull422,
    YbrPartial422,
    YbrPartial420,
    YbrIct,
    YbrRct,
}

impl PhotometricInterpretation {
    /// The code string of this photometric interpretation.
    pub fn as_str(self) -> &'static str {
        use PhotometricInterpretation::*;
        match self {
            Monochrome1 => "MONOCHROME1",
            Monochrome2 => "MONOCHROME2",
            PaletteColor => "PALETTE COLOR",
            Rgb => "RGB",
            Hsv => "HSV",
            Argb => "ARGB",
            Cmyk => "CMYK",
            YbrFull => "YBR_FULL",
            YbrFull422 => "YBR_FULL_422",
            YbrPartial422 => "YBR_PARTIAL_422",
            YbrPartial420 => "YBR_PARTIAL_420",
            YbrIct => "YBR_ICT",
            YbrRct => "YBR_RCT",
        }
    }

    /// The number of samples per pixel
    /// that this photometric interpretation requires.
    pub fn samples_per_pixel(self) -> u16 {
        use PhotometricInterpretation::*;
        match self {
            Monochrome1 | Monochrome2 | PaletteColor => 1,
            Argb | Cmyk => 4,
            Rgb | Hsv | YbrFull | YbrFull422 | YbrPartial422 | YbrPartial420 | YbrIct
            | YbrRct => 3,
        }
    }

    #[inline]
    pub fn is_monochrome(self) -> bool {
        matches!(
            self,
            PhotometricInterpretation::Monochrome1 | PhotometricInterpretation::Monochrome2
        )
    }

    /// The usual photometric interpretation for raw samples
    /// with the given number of samples per pixel.
    pub fn default_for_samples(samples_per_pixel: u16) -> Option<Self> {
        match samples_per_pixel {
            1 => Some(PhotometricInterpretation::Monochrome2),
            3 => Some(PhotometricInterpretation::Rgb),
            4 => Some(PhotometricInterpretation::Argb),
            _ => None,
        }
    }
}

impl FromStr for PhotometricInterpretation {
    type Err = UnknownPhotometricInterpretation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use PhotometricInterpretation::*;
        // trailing padding is common in code strings
        match s.trim_end_matches(|c: char| c == ' ' || c == '\0').trim_start() {
            "MONOCHROME1" => Ok(Monochrome1),
            "MONOCHROME2" => Ok(Monochrome2),
            "PALETTE COLOR" => Ok(PaletteColor),
            "RGB" => Ok(Rgb),
            "HSV" => Ok(Hsv),
            "ARGB" => Ok(Argb),
            "CMYK" => Ok(Cmyk),
            "YBR_FULL" => Ok(YbrFull),
            "YBR_FULL_422" => Ok(YbrFull422),
            "YBR_PARTIAL_422" => Ok(YbrPartial422),
            "YBR_PARTIAL_420" => Ok(YbrPartial420),
            "YBR_ICT" => Ok(YbrIct),
            "YBR_RCT" => Ok(YbrRct),
            value => Err(UnknownPhotometricInterpretation {
                value: value.to_string(),
            }),
        }
    }
}

impl fmt::Display for PhotometricInterpretation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The extent of an image:
/// rows and columns, plus the number of frames in a multi-frame image.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Dimensions {
    rows: u32,
    columns: u32,
    frames: Option<u32>,
}

impl Dimensions {
    /// Two-dimensional image extent.
    pub fn new(rows: u32, columns: u32) -> Result<Self, InvalidDimensions> {
        ensure!(rows > 0, ZeroDimensionSnafu { index: 0_usize });
        ensure!(columns > 0, ZeroDimensionSnafu { index: 1_usize });
        Ok(Dimensions {
            rows,
            columns,
            frames: None,
        })
    }

    /// Three-dimensional (multi-frame) image extent.
    pub fn with_frames(rows: u32, columns: u32, frames: u32) -> Result<Self, InvalidDimensions> {
        ensure!(frames > 0, ZeroDimensionSnafu { index: 2_usize });
        let mut dims = Self::new(rows, columns)?;
        dims.frames = Some(frames);
        Ok(dims)
    }

    #[inline]
    pub fn rows(&self) -> u32 {
        self.rows
    }

    #[inline]
    pub fn columns(&self) -> u32 {
        self.columns
    }

    /// The number of frames, if this is a three-dimensional extent.
    #[inline]
    pub fn frames(&self) -> Option<u32> {
        self.frames
    }

    /// The number of frames, which is 1 for a two-dimensional extent.
    #[inline]
    pub fn frame_count(&self) -> u32 {
        self.frames.unwrap_or(1)
    }

    /// 2 or 3
    #[inline]
    pub fn number_of_dimensions(&self) -> usize {
        if self.frames.is_some() {
            3
        } else {
            2
        }
    }

    /// Replace the frame size, retaining the frame count.
    pub fn with_frame_size(self, rows: u32, columns: u32) -> Result<Self, InvalidDimensions> {
        let mut dims = Self::new(rows, columns)?;
        dims.frames = self.frames;
        Ok(dims)
    }

    /// The number of bytes in one raw frame of the given pixel format.
    pub fn frame_length(&self, pixel_format: &PixelFormat) -> usize {
        self.rows as usize * self.columns as usize * pixel_format.pixel_size()
    }

    /// Rows, columns and (if multi-frame) frames, in this order.
    pub fn to_vec(&self) -> Vec<u32> {
        let mut out = vec![self.rows, self.columns];
        out.extend(self.frames);
        out
    }
}

impl TryFrom<&[u32]> for Dimensions {
    type Error = InvalidDimensions;

    fn try_from(values: &[u32]) -> Result<Self, Self::Error> {
        match *values {
            [rows, columns] => Dimensions::new(rows, columns),
            [rows, columns, frames] => Dimensions::with_frames(rows, columns, frames),
            _ => DimensionCountSnafu {
                count: values.len(),
            }
            .fail(),
        }
    }
}
