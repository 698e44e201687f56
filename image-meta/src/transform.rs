//! Pixel value transformation descriptors:
//! modality rescale, VOI windows and real world value mappings.

use std::fmt;

use snafu::Snafu;

/// Description of a modality rescale function,
/// defined by a _rescale slope_ and _rescale intercept_.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Rescale {
    /// the rescale slope
    pub slope: f64,
    /// the rescale intercept
    pub intercept: f64,
}

impl Rescale {
    /// Create a new rescale function.
    #[inline]
    pub fn new(slope: f64, intercept: f64) -> Self {
        Rescale { slope, intercept }
    }

    /// The rescale function which leaves values unchanged.
    #[inline]
    pub fn identity() -> Self {
        Rescale {
            slope: 1.,
            intercept: 0.,
        }
    }

    #[inline]
    pub fn is_identity(&self) -> bool {
        self.slope == 1. && self.intercept == 0.
    }

    /// Apply the rescale function to a value.
    #[inline]
    pub fn apply(&self, value: f64) -> f64 {
        self.slope * value + self.intercept
    }

    /// The intercept followed by the slope.
    pub fn to_intercept_slope(&self) -> [f64; 2] {
        [self.intercept, self.slope]
    }
}

impl Default for Rescale {
    fn default() -> Self {
        Rescale::identity()
    }
}

/// A known DICOM Value of Interest (VOI) LUT function descriptor.
#[derive(Debug, Copy, Clone, Eq, Hash, PartialEq)]
pub enum VoiLutFunction {
    /// LINEAR
    Linear,
    /// LINEAR_EXACT
    LinearExact,
    /// SIGMOID
    Sigmoid,
}

impl VoiLutFunction {
    /// The code string of the function.
    pub fn as_str(self) -> &'static str {
        match self {
            VoiLutFunction::Linear => "LINEAR",
            VoiLutFunction::LinearExact => "LINEAR_EXACT",
            VoiLutFunction::Sigmoid => "SIGMOID",
        }
    }
}

/// Unrecognized VOI LUT function name
#[derive(Debug, Copy, Clone, PartialEq, Snafu)]
pub struct FromVoiLutFunctionError {
    _private: (),
}

impl std::convert::TryFrom<&str> for VoiLutFunction {
    type Error = FromVoiLutFunctionError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s.trim_end_matches(|c: char| c == ' ' || c == '\0') {
            "LINEAR" => Ok(Self::Linear),
            "LINEAR_EXACT" => Ok(Self::LinearExact),
            "SIGMOID" => Ok(Self::Sigmoid),
            _ => Err(FromVoiLutFunctionError { _private: () }),
        }
    }
}

impl Default for VoiLutFunction {
    fn default() -> Self {
        VoiLutFunction::Linear
    }
}

impl fmt::Display for VoiLutFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The parameters of a single window level
/// for a VOI LUT transformation,
/// comprising the window center and the window width.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct WindowLevel {
    /// The _Window Width_.
    ///
    /// Should be greater than 0
    pub width: f64,
    /// The _Window Center_.
    pub center: f64,
}

/// A mapping of stored values to real world values in some unit,
/// as declared by a _Real World Value Mapping Sequence_ item.
#[derive(Debug, Clone, PartialEq)]
pub struct RealWorldValueMapping {
    pub intercept: f64,
    pub slope: f64,
    /// the code value of the measurement unit, empty if not declared
    pub code_value: String,
    /// the code meaning of the measurement unit, empty if not declared
    pub code_meaning: String,
}

impl RealWorldValueMapping {
    /// Apply the mapping to a stored value.
    #[inline]
    pub fn apply(&self, value: f64) -> f64 {
        self.slope * value + self.intercept
    }
}
