//! Utility module for testing pixel data codecs.
#![allow(dead_code)]

use dicom_pixel_codec::jpegls::{
    read_header, BackendFailure, FrameParameters, InterleaveMode, JpegLsBackend,
};

/// A JPEG-LS backend which stores samples verbatim.
///
/// It writes real JPEG-LS frame and scan headers around the raw samples,
/// so the codec can be tested without the entropy coding library.
#[derive(Debug, Default, Copy, Clone)]
pub struct StoredBackend;

impl JpegLsBackend for StoredBackend {
    fn decode(
        &self,
        src: &[u8],
        params: &FrameParameters,
        dst: &mut [u8],
    ) -> Result<(), BackendFailure> {
        let header = read_header(src).map_err(|e| BackendFailure::new(e.to_string()))?;
        assert_eq!(header.to_frame_parameters(), *params);
        let end = src.len() - 2;
        let payload = &src[header.scan_offset..end];
        if payload.len() != dst.len() {
            return Err(BackendFailure::with_code(
                -1,
                format!("stored {} bytes, expected {}", payload.len(), dst.len()),
            ));
        }
        dst.copy_from_slice(payload);
        Ok(())
    }

    fn encode(
        &self,
        params: &FrameParameters,
        src: &[u8],
        dst: &mut Vec<u8>,
    ) -> Result<usize, BackendFailure> {
        let start = dst.len();
        dst.extend(stored_stream(params, src));
        Ok(dst.len() - start)
    }
}

/// A JPEG-LS backend which always fails.
#[derive(Debug, Default, Copy, Clone)]
pub struct FailingBackend;

impl JpegLsBackend for FailingBackend {
    fn decode(&self, _: &[u8], _: &FrameParameters, _: &mut [u8]) -> Result<(), BackendFailure> {
        Err(BackendFailure::with_code(7, "simulated decoder failure"))
    }

    fn encode(
        &self,
        _: &FrameParameters,
        _: &[u8],
        _: &mut Vec<u8>,
    ) -> Result<usize, BackendFailure> {
        Err(BackendFailure::with_code(7, "simulated encoder failure"))
    }
}

fn segment(out: &mut Vec<u8>, marker: u8, body: &[u8]) {
    out.extend_from_slice(&[0xFF, marker]);
    out.extend_from_slice(&(body.len() as u16 + 2).to_be_bytes());
    out.extend_from_slice(body);
}

/// Build a JPEG-LS stream with the given parameters
/// holding the samples without compression.
pub fn stored_stream(params: &FrameParameters, samples: &[u8]) -> Vec<u8> {
    let components = params.components as u8;
    let mut out = vec![0xFF, 0xD8];

    let mut sof = vec![params.bits_per_sample as u8];
    sof.extend_from_slice(&(params.height as u16).to_be_bytes());
    sof.extend_from_slice(&(params.width as u16).to_be_bytes());
    sof.push(components);
    for c in 0..components {
        sof.extend_from_slice(&[c + 1, 0x11, 0]);
    }
    segment(&mut out, 0xF7, &sof);

    let mut sos = vec![components];
    for c in 0..components {
        sos.extend_from_slice(&[c + 1, 0]);
    }
    sos.extend_from_slice(&[
        params.allowed_lossy_error,
        params.interleave_mode as u8,
        0,
    ]);
    segment(&mut out, 0xDA, &sos);

    out.extend_from_slice(samples);
    out.extend_from_slice(&[0xFF, 0xD9]);
    out
}

/// Frame parameters of a typical monochrome or RGB frame.
pub fn frame_parameters(
    width: u32,
    height: u32,
    bits_per_sample: u16,
    components: u16,
    near: u8,
) -> FrameParameters {
    FrameParameters {
        width,
        height,
        bits_per_sample,
        components,
        interleave_mode: if components == 3 {
            InterleaveMode::Sample
        } else {
            InterleaveMode::None
        },
        color_transformation: dicom_pixel_codec::jpegls::ColorTransformation::None,
        allowed_lossy_error: near,
    }
}

/// Generate reproducible noise using linear congruence.
pub fn noise(len: usize, seed: u32) -> Vec<u8> {
    let mut seed = seed;
    (0..len)
        .map(|_| {
            seed = seed.wrapping_mul(4_294_967_291).wrapping_add(67291);
            // grab a portion from the seed
            (seed >> 7) as u8
        })
        .collect()
}
