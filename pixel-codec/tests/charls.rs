//! Test suite for JPEG-LS transcoding through CharLS
#![cfg(feature = "charls")]

mod common;

use common::noise;
use dicom_pixel_codec::jpegls::{read_header, CharlsBackend, InterleaveMode, JpegLsCodec};
use dicom_pixel_codec::{
    CodecRegistry, Dimensions, ImageCodec, ImagingPolicy, PhotometricInterpretation, PixelFormat,
    PixelRepresentation,
};

/// Build a smooth image with some noise,
/// so that it compresses without being trivial.
fn gradient_u16(rows: usize, columns: usize, max: u16) -> Vec<u8> {
    let grain = noise(rows * columns, 0xcfcf_acab);
    let mut out = Vec::with_capacity(rows * columns * 2);
    for y in 0..rows {
        for x in 0..columns {
            let value = ((x + y) * 7) as u16 + u16::from(grain[y * columns + x] & 0x0F);
            out.extend_from_slice(&(value % max).to_le_bytes());
        }
    }
    out
}

#[test]
fn lossless_monochrome_16bit_round_trip() {
    let raw = gradient_u16(64, 96, 4096);
    let mut codec = JpegLsCodec::new(CharlsBackend, &ImagingPolicy::default());
    codec.set_dimensions(Dimensions::new(64, 96).unwrap());
    codec.set_pixel_format(PixelFormat::uint16());

    let fragments = codec.code(&raw).unwrap();
    assert_eq!(fragments.len(), 1);
    assert!(fragments.total_length() < raw.len());

    let decoded = codec.decode(&fragments).unwrap();
    assert_eq!(decoded, raw);
    assert!(!codec.is_lossy());
}

#[test]
fn lossless_rgb_multiframe_round_trip() {
    let pixel_format = PixelFormat::new(3, 8, 8, 7, PixelRepresentation::Unsigned).unwrap();
    let dims = Dimensions::with_frames(32, 48, 3).unwrap();
    let raw = noise(dims.frame_length(&pixel_format) * 3, 42);

    let registry = CodecRegistry::with_default_codecs();
    let mut codec = registry
        .encoder_for("1.2.840.10008.1.2.4.80", &ImagingPolicy::default())
        .expect("JPEG-LS codec should be registered");
    codec.set_dimensions(dims);
    codec.set_pixel_format(pixel_format);
    codec.set_photometric_interpretation(PhotometricInterpretation::Rgb);

    let fragments = codec.code(&raw).unwrap();
    assert_eq!(fragments.len(), 3);

    let decoded = codec.decode(&fragments).unwrap();
    assert_eq!(decoded, raw);
}

#[test]
fn rgb_frames_are_sample_interleaved() {
    let pixel_format = PixelFormat::new(3, 8, 8, 7, PixelRepresentation::Unsigned).unwrap();
    let (rows, columns) = (16, 24);
    // distinct ramps per component
    let mut raw = Vec::with_capacity(rows * columns * 3);
    for y in 0..rows {
        for x in 0..columns {
            raw.extend_from_slice(&[(x * 10) as u8, (y * 15) as u8, 255 - (x + y) as u8]);
        }
    }

    let mut codec = JpegLsCodec::new(CharlsBackend, &ImagingPolicy::default());
    codec.set_dimensions(Dimensions::new(rows as u32, columns as u32).unwrap());
    codec.set_pixel_format(pixel_format);
    codec.set_photometric_interpretation(PhotometricInterpretation::Rgb);

    let fragments = codec.code(&raw).unwrap();
    let header = read_header(fragments.get(0).unwrap()).unwrap();
    assert_eq!(header.components, 3);
    assert_eq!(header.interleave_mode, InterleaveMode::Sample);

    let decoded = codec.decode(&fragments).unwrap();
    assert_eq!(&decoded[..6], &raw[..6]);
    assert_eq!(decoded, raw);
}

#[test]
fn near_lossless_error_is_bounded() {
    let raw = gradient_u16(48, 48, 4096);
    let policy = ImagingPolicy::default().with_lossy_error(4);
    let mut codec = JpegLsCodec::new(CharlsBackend, &policy);
    codec.set_dimensions(Dimensions::new(48, 48).unwrap());
    codec.set_pixel_format(PixelFormat::uint16());

    let fragments = codec.code(&raw).unwrap();
    let header = read_header(fragments.get(0).unwrap()).unwrap();
    assert_eq!(header.allowed_lossy_error, 4);

    let decoded = codec.decode(&fragments).unwrap();
    assert!(codec.is_lossy());
    assert_eq!(decoded.len(), raw.len());
    for (got, expected) in decoded.chunks_exact(2).zip(raw.chunks_exact(2)) {
        let got = u16::from_le_bytes([got[0], got[1]]);
        let expected = u16::from_le_bytes([expected[0], expected[1]]);
        assert!(got.abs_diff(expected) <= 4, "{} vs {}", got, expected);
    }
}
