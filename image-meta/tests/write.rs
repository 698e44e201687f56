//! Writing image attributes and reading them back
mod common;

use common::image;
use dicom_core::value::PrimitiveValue;
use dicom_dictionary_std::{tags, uids};
use dicom_image_meta::{
    dimensions_value, direction_cosines_value, origin_value, photometric_interpretation_value,
    pixel_format_value, rescale_intercept_slope_value, set_dimensions_value,
    set_direction_cosines_value, set_origin_value, set_photometric_interpretation_value,
    set_pixel_format_value, set_rescale_intercept_slope_value, set_spacing_value, set_voi_lut,
    spacing_value, voi_lut_function, window_levels, AttributeStore, Dimensions, ImagingPolicy,
    PhotometricInterpretation, PixelFormat, PixelRepresentation, Rescale, VoiLutFunction,
    WindowLevel, WriteError,
};
use dicom_object::InMemDicomObject;
use rstest::rstest;

fn string_value(obj: &InMemDicomObject, tag: dicom_core::Tag) -> String {
    obj.lookup(tag)
        .and_then(|v| v.primitive())
        .map(|v| v.to_str().to_string())
        .unwrap()
}

#[test]
fn image_pixel_module_round_trip() {
    let mut obj = InMemDicomObject::new_empty();

    let dimensions = Dimensions::with_frames(256, 128, 12).unwrap();
    let pixel_format = PixelFormat::new(1, 16, 12, 11, PixelRepresentation::Signed).unwrap();
    set_dimensions_value(&mut obj, &dimensions).unwrap();
    set_pixel_format_value(&mut obj, &pixel_format);
    set_photometric_interpretation_value(&mut obj, PhotometricInterpretation::Monochrome1);

    assert_eq!(dimensions_value(&obj).unwrap(), dimensions);
    assert_eq!(
        pixel_format_value(&obj, &ImagingPolicy::default()).unwrap(),
        pixel_format
    );
    assert_eq!(
        photometric_interpretation_value(&obj),
        PhotometricInterpretation::Monochrome1
    );
    assert_eq!(string_value(&obj, tags::NUMBER_OF_FRAMES), "12");
}

#[test]
fn single_frame_dimensions_omit_number_of_frames() {
    let mut obj = InMemDicomObject::new_empty();
    set_dimensions_value(&mut obj, &Dimensions::new(64, 32).unwrap()).unwrap();

    assert!(obj.lookup(tags::NUMBER_OF_FRAMES).is_none());
    assert_eq!(dimensions_value(&obj).unwrap().to_vec(), vec![64, 32]);
}

#[test]
fn two_dimensional_write_removes_number_of_frames() {
    let mut obj = InMemDicomObject::new_empty();
    set_dimensions_value(&mut obj, &Dimensions::with_frames(4, 4, 9).unwrap()).unwrap();
    assert_eq!(dimensions_value(&obj).unwrap().to_vec(), vec![4, 4, 9]);

    set_dimensions_value(&mut obj, &Dimensions::new(4, 4).unwrap()).unwrap();
    assert!(obj.lookup(tags::NUMBER_OF_FRAMES).is_none());
    assert_eq!(dimensions_value(&obj).unwrap().to_vec(), vec![4, 4]);
}

#[test]
fn oversized_dimensions_are_rejected() {
    let mut obj = image(uids::CT_IMAGE_STORAGE, 2, 3, 8);

    let err = set_dimensions_value(&mut obj, &Dimensions::new(70_000, 4).unwrap()).unwrap_err();
    assert!(matches!(
        err,
        WriteError::ValueOutOfRange {
            name: "Rows",
            value: 70_000,
            ..
        }
    ));
    let err = set_dimensions_value(&mut obj, &Dimensions::new(4, 65_536).unwrap()).unwrap_err();
    assert!(matches!(
        err,
        WriteError::ValueOutOfRange {
            name: "Columns",
            ..
        }
    ));

    // nothing was written
    assert_eq!(dimensions_value(&obj).unwrap().to_vec(), vec![2, 3]);

    set_dimensions_value(&mut obj, &Dimensions::new(65_535, 1).unwrap()).unwrap();
    assert_eq!(dimensions_value(&obj).unwrap().rows(), 65_535);
}

#[test]
fn geometry_round_trip() {
    let mut obj = image(uids::CT_IMAGE_STORAGE, 2, 2, 16);

    set_origin_value(&mut obj, &[-250.5, 12., 1.0e-3]);
    set_spacing_value(&mut obj, &[0.7, 0.6, 1.25]);
    set_direction_cosines_value(&mut obj, &[0., 1., 0., 0., 0., -1.]);

    assert_eq!(origin_value(&obj), [-250.5, 12., 1.0e-3]);
    assert_eq!(
        spacing_value(&obj, &ImagingPolicy::default()),
        [0.7, 0.6, 1.25]
    );
    // row spacing comes first in the data set
    assert_eq!(string_value(&obj, tags::PIXEL_SPACING), "0.6\\0.7");
    assert_eq!(direction_cosines_value(&obj), [0., 1., 0., 0., 0., -1.]);
}

#[test]
fn spacing_goes_to_storage_class_attribute() {
    let mut obj = image(uids::DIGITAL_X_RAY_IMAGE_STORAGE_FOR_PRESENTATION, 2, 2, 16);
    set_spacing_value(&mut obj, &[0.1, 0.2]);

    assert!(obj.lookup(tags::PIXEL_SPACING).is_none());
    assert!(obj.lookup(tags::SPACING_BETWEEN_SLICES).is_none());
    assert_eq!(string_value(&obj, tags::IMAGER_PIXEL_SPACING), "0.2\\0.1");
    assert_eq!(
        spacing_value(&obj, &ImagingPolicy::default()),
        [0.1, 0.2, 1.]
    );
}

#[rstest]
#[case(uids::ENHANCED_MR_IMAGE_STORAGE, &[0.5, 0.6, 2.], [0.5, 0.6, 2.])]
#[case(uids::ENHANCED_CT_IMAGE_STORAGE, &[0.7, 0.7], [0.7, 0.7, 1.])]
#[case(uids::ULTRASOUND_IMAGE_STORAGE, &[0.3, 0.2], [0.3, 0.2, 1.])]
#[case(uids::ULTRASOUND_MULTI_FRAME_IMAGE_STORAGE, &[0.3, 0.2, 4.], [0.3, 0.2, 4.])]
fn spacing_round_trip_for_sequence_classes(
    #[case] sop_class_uid: &str,
    #[case] spacing: &[f64],
    #[case] expected: [f64; 3],
) {
    let mut obj = image(sop_class_uid, 2, 2, 8);
    set_spacing_value(&mut obj, spacing);

    assert_eq!(spacing_value(&obj, &ImagingPolicy::default()), expected);
}

#[test]
fn invalid_direction_cosines_are_written_as_identity() {
    let mut obj = image(uids::CT_IMAGE_STORAGE, 2, 2, 16);
    set_direction_cosines_value(&mut obj, &[1., 1., 0., 0., 1., 0.]);

    assert_eq!(
        string_value(&obj, tags::IMAGE_ORIENTATION_PATIENT),
        "1\\0\\0\\0\\1\\0"
    );
}

#[test]
fn rescale_and_voi_round_trip() {
    let mut obj = image(uids::CT_IMAGE_STORAGE, 2, 2, 16);
    let rescale = Rescale::new(0.000_123_456_789_012_345_6, -1024.);
    set_rescale_intercept_slope_value(&mut obj, &rescale);

    let read = rescale_intercept_slope_value(&obj, &ImagingPolicy::default());
    assert_eq!(read.intercept, -1024.);
    assert!((read.slope - rescale.slope).abs() / rescale.slope < 1e-9);
    let slope = string_value(&obj, tags::RESCALE_SLOPE);
    assert!(slope.len() <= 16, "`{}` is too long", slope);

    let windows = [
        WindowLevel {
            center: 40.,
            width: 400.,
        },
        WindowLevel {
            center: -600.,
            width: 1600.,
        },
    ];
    set_voi_lut(&mut obj, &windows, Some(VoiLutFunction::LinearExact));
    assert_eq!(window_levels(&obj), windows.to_vec());
    assert_eq!(voi_lut_function(&obj), Some(VoiLutFunction::LinearExact));
}

#[test]
fn empty_windows_are_not_written() {
    let mut obj = InMemDicomObject::new_empty();
    set_voi_lut(&mut obj, &[], Some(VoiLutFunction::Sigmoid));

    assert!(obj.lookup(tags::WINDOW_CENTER).is_none());
    assert!(obj.lookup(tags::VOILUT_FUNCTION).is_none());
}

#[test]
fn inserted_values_replace_previous_ones() {
    let mut obj = image(uids::CT_IMAGE_STORAGE, 2, 2, 16);
    obj.insert(
        tags::ROWS,
        dicom_core::VR::US,
        PrimitiveValue::from(7_u16),
    );
    assert_eq!(dimensions_value(&obj).unwrap().rows(), 7);
}
