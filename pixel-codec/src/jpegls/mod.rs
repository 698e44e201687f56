//! JPEG-LS lossless and near-lossless transcoding.
//!
//! The codec handles fragmentation, header inspection
//! and per-frame bookkeeping,
//! while the entropy coding itself is delegated to a [`JpegLsBackend`].
//! With the `charls` feature, [`CharlsBackend`] provides one
//! based on the CharLS library.

pub mod backend;
#[cfg(feature = "charls")]
pub mod charls;
pub mod header;

use std::borrow::Cow;
use std::io::Write;

use dicom_dictionary_std::uids;
use snafu::{ensure, OptionExt, ResultExt};
use tracing::warn;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

pub use self::backend::{
    BackendFailure, ColorTransformation, FrameParameters, InterleaveMode, JpegLsBackend,
};
#[cfg(feature = "charls")]
pub use self::charls::CharlsBackend;
pub use self::header::{read_header, trim_to_end_of_image, HeaderError, JpegLsHeader};

use crate::codec::{ImageCodec, ImageInfo};
use crate::error::{
    try_buffer, BackendSnafu, InconsistentAttributeSnafu, InvalidDimensionsSnafu,
    InvalidPixelFormatSnafu, MissingAttributeSnafu, MissingEndOfImageSnafu, NoFragmentsSnafu,
    ReadHeaderSnafu, Result, SizeMismatchSnafu, UnsupportedBitDepthSnafu,
    UnsupportedSamplesPerPixelSnafu, WriteFrameSnafu,
};
use crate::format::{
    Dimensions, PhotometricInterpretation, PixelFormat, PixelRepresentation,
};
use crate::fragments::FragmentStream;
use crate::policy::ImagingPolicy;

/// Whether the transfer syntax is one of the JPEG-LS transfer syntaxes.
pub fn is_jpegls_transfer_syntax(ts_uid: &str) -> bool {
    let ts_uid = ts_uid.trim_end_matches(|c: char| c == '\0' || c.is_whitespace());
    ts_uid == uids::JPEGLS_LOSSLESS || ts_uid == uids::JPEGLS_NEAR_LOSSLESS
}

/// The outcome of decoding a single frame.
struct DecodedFrame {
    header: JpegLsHeader,
    data: Vec<u8>,
}

/// Pixel data codec for the JPEG-LS transfer syntaxes.
#[derive(Debug)]
pub struct JpegLsCodec<B> {
    backend: B,
    dimensions: Option<Dimensions>,
    pixel_format: PixelFormat,
    photometric_interpretation: PhotometricInterpretation,
    lossy: bool,
    lossy_error: u8,
    /// frames written since the last `start_encode`
    appended_frames: usize,
}

impl<B> JpegLsCodec<B>
where
    B: JpegLsBackend,
{
    /// Create a codec for 8-bit monochrome images
    /// of yet unknown dimensions.
    ///
    /// Encoding is lossy when the policy allows a non-zero error.
    pub fn new(backend: B, policy: &ImagingPolicy) -> Self {
        JpegLsCodec {
            backend,
            dimensions: None,
            pixel_format: PixelFormat::uint8(),
            photometric_interpretation: PhotometricInterpretation::Monochrome2,
            lossy: policy.lossy_error > 0,
            lossy_error: policy.lossy_error,
            appended_frames: 0,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn required_dimensions(&self) -> Result<Dimensions> {
        self.dimensions.context(MissingAttributeSnafu {
            name: "Dimensions",
        })
    }

    /// Decode every frame of the stream independently.
    fn decode_frames(&self, src: &FragmentStream, dimensions: &Dimensions) -> Result<Vec<DecodedFrame>> {
        let streams = frame_streams(src, dimensions)?;

        #[cfg(feature = "rayon")]
        let frames = streams
            .par_iter()
            .enumerate()
            .map(|(index, stream)| decode_frame(&self.backend, index, stream))
            .collect::<Result<Vec<_>>>()?;

        #[cfg(not(feature = "rayon"))]
        let frames = streams
            .iter()
            .enumerate()
            .map(|(index, stream)| decode_frame(&self.backend, index, stream))
            .collect::<Result<Vec<_>>>()?;

        Ok(frames)
    }

    /// Build the backend parameters for encoding frames
    /// with the current image attributes.
    fn encode_parameters(&self, dimensions: &Dimensions) -> Result<FrameParameters> {
        let samples_per_pixel = self.pixel_format.samples_per_pixel();
        let interleave_mode = match samples_per_pixel {
            1 => InterleaveMode::None,
            3 => InterleaveMode::Sample,
            _ => return UnsupportedSamplesPerPixelSnafu { samples_per_pixel }.fail(),
        };

        let bits_allocated = self.pixel_format.bits_allocated();
        ensure!(
            bits_allocated == 8 || bits_allocated == 16,
            UnsupportedBitDepthSnafu {
                bits: bits_allocated
            }
        );

        Ok(FrameParameters {
            width: dimensions.columns(),
            height: dimensions.rows(),
            bits_per_sample: bits_allocated,
            components: samples_per_pixel,
            interleave_mode,
            color_transformation: ColorTransformation::None,
            allowed_lossy_error: if self.lossy { self.lossy_error } else { 0 },
        })
    }
}

/// Obtain one complete JPEG-LS stream per frame.
///
/// A single-frame image may be spread over several fragments,
/// which are joined together.
fn frame_streams<'a>(
    src: &'a FragmentStream,
    dimensions: &Dimensions,
) -> Result<Vec<Cow<'a, [u8]>>> {
    ensure!(!src.is_empty(), NoFragmentsSnafu);

    let frames = dimensions.frame_count() as usize;
    if frames == 1 {
        if src.len() == 1 {
            return Ok(src.iter().map(Cow::Borrowed).collect());
        }
        let mut stream = try_buffer(src.total_length())?;
        for fragment in src.iter() {
            stream.extend_from_slice(fragment);
        }
        return Ok(vec![Cow::Owned(stream)]);
    }

    ensure!(
        src.len() == frames,
        InconsistentAttributeSnafu {
            name: "fragment count",
            expected: frames as u64,
            found: src.len() as u64,
        }
    );
    Ok(src.iter().map(Cow::Borrowed).collect())
}

fn decode_frame<B>(backend: &B, index: usize, stream: &[u8]) -> Result<DecodedFrame>
where
    B: JpegLsBackend,
{
    let stream = trim_to_end_of_image(stream).context(MissingEndOfImageSnafu { fragment: index })?;
    let header = read_header(stream).context(ReadHeaderSnafu { fragment: index })?;
    ensure!(
        header.bits_per_sample <= 16,
        UnsupportedBitDepthSnafu {
            bits: header.bits_per_sample
        }
    );

    let length = header.frame_length();
    let mut data = try_buffer(length)?;
    data.resize(length, 0);
    backend
        .decode(stream, &header.to_frame_parameters(), &mut data)
        .context(BackendSnafu { frame: index })?;

    Ok(DecodedFrame { header, data })
}

fn encode_frame<B>(
    backend: &B,
    index: usize,
    params: &FrameParameters,
    frame: &[u8],
) -> Result<Vec<u8>>
where
    B: JpegLsBackend,
{
    // generous upper bound for the compressed size
    let capacity = (params.width as usize * params.height as usize * 4).max(frame.len()) * 2;
    let mut out = try_buffer(capacity)?;
    backend
        .encode(params, frame, &mut out)
        .context(BackendSnafu { frame: index })?;
    out.shrink_to_fit();
    Ok(out)
}

fn ensure_same(name: &'static str, expected: u32, found: u32) -> Result<()> {
    ensure!(
        expected == found,
        InconsistentAttributeSnafu {
            name,
            expected: u64::from(expected),
            found: u64::from(found),
        }
    );
    Ok(())
}

/// Check that all frames share the same geometry,
/// returning the header of the first frame
/// and whether any frame was lossy.
fn aggregate(frames: &[DecodedFrame]) -> Result<(JpegLsHeader, bool)> {
    let first = frames
        .first()
        .map(|frame| frame.header)
        .context(NoFragmentsSnafu)?;

    for frame in &frames[1..] {
        let header = &frame.header;
        ensure_same("frame width", first.width, header.width)?;
        ensure_same("frame height", first.height, header.height)?;
        ensure_same(
            "frame bits per sample",
            u32::from(first.bits_per_sample),
            u32::from(header.bits_per_sample),
        )?;
        ensure_same(
            "frame components",
            u32::from(first.components),
            u32::from(header.components),
        )?;
    }

    let lossy_frames = frames.iter().filter(|f| f.header.is_lossy()).count();
    if lossy_frames > 0 && lossy_frames < frames.len() {
        warn!(
            "{} of {} frames are lossy, reporting the image as lossy",
            lossy_frames,
            frames.len()
        );
    }
    Ok((first, lossy_frames > 0))
}

impl<B> ImageCodec for JpegLsCodec<B>
where
    B: JpegLsBackend,
{
    fn can_decode(&self, ts_uid: &str) -> bool {
        is_jpegls_transfer_syntax(ts_uid)
    }

    fn can_code(&self, ts_uid: &str) -> bool {
        is_jpegls_transfer_syntax(ts_uid)
    }

    fn dimensions(&self) -> Option<Dimensions> {
        self.dimensions
    }

    fn set_dimensions(&mut self, dimensions: Dimensions) {
        self.dimensions = Some(dimensions);
    }

    fn pixel_format(&self) -> PixelFormat {
        self.pixel_format
    }

    fn set_pixel_format(&mut self, pixel_format: PixelFormat) {
        self.pixel_format = pixel_format;
    }

    fn photometric_interpretation(&self) -> PhotometricInterpretation {
        self.photometric_interpretation
    }

    fn set_photometric_interpretation(&mut self, pi: PhotometricInterpretation) {
        self.photometric_interpretation = pi;
    }

    fn is_lossy(&self) -> bool {
        self.lossy
    }

    fn set_lossless(&mut self, lossless: bool) {
        self.lossy = !lossless;
    }

    fn lossy_error(&self) -> u8 {
        self.lossy_error
    }

    fn set_lossy_error(&mut self, lossy_error: u8) {
        self.lossy_error = lossy_error;
    }

    fn decode(&mut self, src: &FragmentStream) -> Result<Vec<u8>> {
        let dimensions = self.required_dimensions()?;
        let frames = self.decode_frames(src, &dimensions)?;
        let (header, lossy) = aggregate(&frames)?;
        ensure_same("columns", dimensions.columns(), header.width)?;
        ensure_same("rows", dimensions.rows(), header.height)?;

        let mut frames = frames.into_iter();
        let out = match (frames.len(), frames.next()) {
            (1, Some(frame)) => frame.data,
            (count, first) => {
                let mut out = try_buffer(header.frame_length() * count)?;
                for frame in first.into_iter().chain(frames) {
                    out.extend_from_slice(&frame.data);
                }
                out
            }
        };

        self.lossy = lossy;
        Ok(out)
    }

    fn decode_into(&mut self, src: &FragmentStream, dst: &mut [u8]) -> Result<()> {
        let dimensions = self.required_dimensions()?;
        let frames = self.decode_frames(src, &dimensions)?;
        let (header, lossy) = aggregate(&frames)?;
        if header.width != dimensions.columns() || header.height != dimensions.rows() {
            warn!(
                "Stream geometry {}x{} differs from declared {}x{}",
                header.width,
                header.height,
                dimensions.columns(),
                dimensions.rows()
            );
        }

        let decoded_length: usize = frames.iter().map(|f| f.data.len()).sum();
        if decoded_length != dst.len() {
            warn!(
                "Decoded {} bytes into a buffer of {} bytes, data will be {}",
                decoded_length,
                dst.len(),
                if decoded_length > dst.len() {
                    "truncated"
                } else {
                    "zero padded"
                }
            );
        }

        let mut offset = 0;
        for frame in &frames {
            let count = frame.data.len().min(dst.len() - offset);
            dst[offset..offset + count].copy_from_slice(&frame.data[..count]);
            offset += count;
        }
        dst[offset..].fill(0);

        self.lossy = lossy;
        Ok(())
    }

    fn code(&mut self, src: &[u8]) -> Result<FragmentStream> {
        let dimensions = self.required_dimensions()?;
        let params = self.encode_parameters(&dimensions)?;
        let frame_length = params.frame_length();
        let frame_count = dimensions.frame_count() as usize;

        let expected = frame_length * frame_count;
        // native pixel data is padded to an even length
        let padded = expected + expected % 2;
        ensure!(
            src.len() == expected || src.len() == padded,
            SizeMismatchSnafu {
                expected,
                found: src.len(),
            }
        );
        let src = &src[..expected];

        #[cfg(feature = "rayon")]
        let fragments = src
            .par_chunks_exact(frame_length)
            .enumerate()
            .map(|(index, frame)| encode_frame(&self.backend, index, &params, frame))
            .collect::<Result<Vec<_>>>()?;

        #[cfg(not(feature = "rayon"))]
        let fragments = src
            .chunks_exact(frame_length)
            .enumerate()
            .map(|(index, frame)| encode_frame(&self.backend, index, &params, frame))
            .collect::<Result<Vec<_>>>()?;

        Ok(FragmentStream::from(fragments))
    }

    fn header_info(&mut self, src: &[u8]) -> Result<ImageInfo> {
        let header = read_header(src).context(ReadHeaderSnafu { fragment: 0_usize })?;

        let bits_allocated = match header.bits_per_sample {
            0..=8 => 8,
            9..=16 => 16,
            bits => return UnsupportedBitDepthSnafu { bits }.fail(),
        };
        let photometric_interpretation = match header.components {
            1 => PhotometricInterpretation::Monochrome2,
            3 => PhotometricInterpretation::Rgb,
            samples_per_pixel => {
                return UnsupportedSamplesPerPixelSnafu { samples_per_pixel }.fail()
            }
        };
        let pixel_format = PixelFormat::new(
            header.components,
            bits_allocated,
            header.bits_per_sample,
            header.bits_per_sample - 1,
            PixelRepresentation::Unsigned,
        )
        .context(InvalidPixelFormatSnafu)?;
        let dimensions = match self.dimensions {
            Some(dimensions) => dimensions.with_frame_size(header.height, header.width),
            None => Dimensions::new(header.height, header.width),
        }
        .context(InvalidDimensionsSnafu)?;

        self.dimensions = Some(dimensions);
        self.pixel_format = pixel_format;
        self.photometric_interpretation = photometric_interpretation;
        self.lossy = header.is_lossy();

        Ok(ImageInfo {
            dimensions,
            pixel_format,
            photometric_interpretation,
            lossy: header.is_lossy(),
        })
    }

    fn is_row_encoder(&self) -> bool {
        false
    }

    fn is_frame_encoder(&self) -> bool {
        true
    }

    fn start_encode(&mut self, _out: &mut dyn Write) -> Result<()> {
        self.appended_frames = 0;
        Ok(())
    }

    fn append_frame_encode(&mut self, out: &mut dyn Write, frame: &[u8]) -> Result<()> {
        let dimensions = self.required_dimensions()?;
        let params = self.encode_parameters(&dimensions)?;
        ensure!(
            frame.len() == params.frame_length(),
            SizeMismatchSnafu {
                expected: params.frame_length(),
                found: frame.len(),
            }
        );

        let data = encode_frame(&self.backend, self.appended_frames, &params, frame)?;
        out.write_all(&data).context(WriteFrameSnafu)?;
        self.appended_frames += 1;
        Ok(())
    }
}
