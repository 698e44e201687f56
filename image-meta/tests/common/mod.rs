//! Utility module for building test data sets.
#![allow(dead_code)]

use dicom_core::value::{DataSetSequence, PrimitiveValue, Value};
use dicom_core::{DataElement, Length, Tag, VR};
use dicom_dictionary_std::tags;
use dicom_object::InMemDicomObject;

pub fn put<T: Into<PrimitiveValue>>(obj: &mut InMemDicomObject, tag: Tag, vr: VR, value: T) {
    let value: PrimitiveValue = value.into();
    obj.put(DataElement::new(tag, vr, value));
}

pub fn put_decimals(obj: &mut InMemDicomObject, tag: Tag, values: &[f64]) {
    let strings: Vec<String> = values.iter().map(|v| v.to_string()).collect();
    put(obj, tag, VR::DS, PrimitiveValue::Strs(strings.into()));
}

pub fn put_sequence(obj: &mut InMemDicomObject, tag: Tag, items: Vec<InMemDicomObject>) {
    obj.put(DataElement::new(
        tag,
        VR::SQ,
        Value::Sequence(DataSetSequence::new(items, Length::UNDEFINED)),
    ));
}

/// A sequence item with a single nested sequence,
/// as found in functional group sequences.
pub fn group_item(tag: Tag, item: InMemDicomObject) -> InMemDicomObject {
    let mut group = InMemDicomObject::new_empty();
    put_sequence(&mut group, tag, vec![item]);
    group
}

/// A single-sample image of the given storage class,
/// with the required image pixel attributes.
pub fn image(
    sop_class_uid: &str,
    rows: u16,
    columns: u16,
    bits_allocated: u16,
) -> InMemDicomObject {
    let mut obj = InMemDicomObject::new_empty();
    put(&mut obj, tags::SOP_CLASS_UID, VR::UI, sop_class_uid);
    put(&mut obj, tags::ROWS, VR::US, rows);
    put(&mut obj, tags::COLUMNS, VR::US, columns);
    put(&mut obj, tags::BITS_ALLOCATED, VR::US, bits_allocated);
    put(&mut obj, tags::PIXEL_REPRESENTATION, VR::US, 0_u16);
    put(&mut obj, tags::SAMPLES_PER_PIXEL, VR::US, 1_u16);
    put(&mut obj, tags::PHOTOMETRIC_INTERPRETATION, VR::CS, "MONOCHROME2");
    obj
}

/// The header and trailer of a single component JPEG-LS stream
/// with the given sample precision, around arbitrary scan bytes.
pub fn jpegls_stream(width: u16, height: u16, precision: u8, scan: &[u8]) -> Vec<u8> {
    let mut out = vec![0xFF, 0xD8];
    // SOF55
    out.extend_from_slice(&[0xFF, 0xF7, 0x00, 0x0B, precision]);
    out.extend_from_slice(&height.to_be_bytes());
    out.extend_from_slice(&width.to_be_bytes());
    out.extend_from_slice(&[0x01, 0x01, 0x11, 0x00]);
    // SOS, lossless, no interleave
    out.extend_from_slice(&[0xFF, 0xDA, 0x00, 0x08, 0x01, 0x01, 0x00, 0x00, 0x00, 0x00]);
    out.extend_from_slice(scan);
    out.extend_from_slice(&[0xFF, 0xD9]);
    out
}
