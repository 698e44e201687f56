//! Workaround and quality policy for attribute resolution and transcoding.

/// Toggles applied when resolving image attributes
/// and when transcoding pixel data.
///
/// A policy is fixed for the duration of an operation:
/// build one and pass it by reference to every entry point.
/// The default policy trusts the declared attributes
/// and transcodes losslessly.
///
/// # Example
///
/// ```
/// use dicom_pixel_codec::ImagingPolicy;
///
/// let policy = ImagingPolicy::default()
///     .with_clean_unused_bits(true)
///     .with_lossy_error(2);
/// assert!(policy.clean_unused_bits);
/// assert_eq!(policy.lossy_error, 2);
/// ```
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ImagingPolicy {
    /// Read _Rescale Intercept_ and _Rescale Slope_
    /// even for storage classes which are not expected to define them.
    pub force_rescale_intercept_slope: bool,
    /// Prefer the Philips private rescale attributes of MR images
    /// over the standard ones.
    pub pms_rescale_intercept_slope: bool,
    /// Look for pixel spacing in alternative attributes
    /// when the one expected for the storage class is absent.
    pub force_pixel_spacing: bool,
    /// Recompute _Bits Stored_ from the bits actually used by the samples.
    pub clean_unused_bits: bool,
    /// JPEG lossless: accept 16-bit streams
    /// produced by the Cornell encoder with a wrong predictor state.
    pub workaround_cornell_bug: bool,
    /// JPEG lossless: accept streams produced with predictor 6
    /// by encoders known to implement it incorrectly.
    pub workaround_predictor_bug: bool,
    /// JPEG baseline: keep YBR_FULL samples as is
    /// instead of converting them to RGB.
    pub jpeg_preserve_ybr_full: bool,
    /// Take _Bits Allocated_ from the compressed stream header
    /// rather than from the declared attribute.
    pub fix_jpeg_bits: bool,
    /// Maximum per-sample error when encoding lossy (0 is lossless).
    pub lossy_error: u8,
}

impl ImagingPolicy {
    pub fn with_force_rescale_intercept_slope(mut self, value: bool) -> Self {
        self.force_rescale_intercept_slope = value;
        self
    }

    pub fn with_pms_rescale_intercept_slope(mut self, value: bool) -> Self {
        self.pms_rescale_intercept_slope = value;
        self
    }

    pub fn with_force_pixel_spacing(mut self, value: bool) -> Self {
        self.force_pixel_spacing = value;
        self
    }

    pub fn with_clean_unused_bits(mut self, value: bool) -> Self {
        self.clean_unused_bits = value;
        self
    }

    pub fn with_workaround_cornell_bug(mut self, value: bool) -> Self {
        self.workaround_cornell_bug = value;
        self
    }

    pub fn with_workaround_predictor_bug(mut self, value: bool) -> Self {
        self.workaround_predictor_bug = value;
        self
    }

    pub fn with_jpeg_preserve_ybr_full(mut self, value: bool) -> Self {
        self.jpeg_preserve_ybr_full = value;
        self
    }

    pub fn with_fix_jpeg_bits(mut self, value: bool) -> Self {
        self.fix_jpeg_bits = value;
        self
    }

    pub fn with_lossy_error(mut self, value: u8) -> Self {
        self.lossy_error = value;
        self
    }
}
