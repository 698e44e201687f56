//! JPEG-LS entropy coding via CharLS.

use ::charls::{CharLS, FrameInfo};

use super::backend::{
    BackendFailure, ColorTransformation, FrameParameters, InterleaveMode, JpegLsBackend,
};

fn charls_interleave_mode(mode: InterleaveMode) -> ::charls::InterleaveMode {
    match mode {
        InterleaveMode::None => ::charls::InterleaveMode::None,
        InterleaveMode::Line => ::charls::InterleaveMode::Line,
        InterleaveMode::Sample => ::charls::InterleaveMode::Sample,
    }
}

/// JPEG-LS backend built on the CharLS bindings.
///
/// A new CharLS coder is created for every frame.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub struct CharlsBackend;

impl JpegLsBackend for CharlsBackend {
    fn decode(
        &self,
        src: &[u8],
        params: &FrameParameters,
        dst: &mut [u8],
    ) -> Result<(), BackendFailure> {
        let decoded = CharLS::default()
            .decode(src)
            .map_err(|error| BackendFailure::new(error.to_string()))?;

        if decoded.len() != dst.len() {
            return Err(BackendFailure::new(format!(
                "CharLS decoded {} bytes for a {}x{} frame, expected {}",
                decoded.len(),
                params.width,
                params.height,
                dst.len()
            )));
        }
        dst.copy_from_slice(&decoded);
        Ok(())
    }

    fn encode(
        &self,
        params: &FrameParameters,
        src: &[u8],
        dst: &mut Vec<u8>,
    ) -> Result<usize, BackendFailure> {
        if params.color_transformation != ColorTransformation::None {
            return Err(BackendFailure::new(
                "color transformations are not supported by the CharLS bindings",
            ));
        }

        let frame_info = FrameInfo {
            width: params.width,
            height: params.height,
            bits_per_sample: i32::from(params.bits_per_sample),
            component_count: i32::from(params.components),
        };

        let mut charls = CharLS::default();
        // the encoder defaults to planar input
        charls
            .set_interleave_mode(charls_interleave_mode(params.interleave_mode))
            .map_err(|error| BackendFailure::new(error.to_string()))?;
        let compressed = charls
            .encode(frame_info, i32::from(params.allowed_lossy_error), src)
            .map_err(|error| BackendFailure::new(error.to_string()))?;

        dst.extend_from_slice(&compressed);
        Ok(compressed.len())
    }
}
