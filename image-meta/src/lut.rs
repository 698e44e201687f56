//! Palette color look-up tables.
//!
//! Images with the _PALETTE COLOR_ photometric interpretation
//! carry one table per color channel,
//! each described by a descriptor of three values
//! (number of entries, first mapped value, bits per entry)
//! followed by the table data.

use crate::attribute::{
    primitive, ConvertValueSnafu, InvalidValueSnafu, MissingAttributeSnafu, Result,
};
use crate::store::AttributeStore;
use dicom_core::value::PrimitiveValue;
use dicom_core::Tag;
use dicom_dictionary_std::tags;
use snafu::{ensure, OptionExt, ResultExt};
use tracing::warn;

/// The red, green and blue look-up tables of a palette color image.
#[derive(Debug, Clone, PartialEq)]
pub struct PaletteLut {
    first_mapped: i32,
    bits: u8,
    red: Vec<u16>,
    green: Vec<u16>,
    blue: Vec<u16>,
}

impl PaletteLut {
    /// The stored pixel value mapped to the first entry of each table.
    pub fn first_mapped(&self) -> i32 {
        self.first_mapped
    }

    /// The number of bits per table entry, either 8 or 16.
    pub fn bits(&self) -> u8 {
        self.bits
    }

    /// The number of entries in each table.
    pub fn len(&self) -> usize {
        self.red.len()
    }

    pub fn is_empty(&self) -> bool {
        self.red.is_empty()
    }

    pub fn red(&self) -> &[u16] {
        &self.red
    }

    pub fn green(&self) -> &[u16] {
        &self.green
    }

    pub fn blue(&self) -> &[u16] {
        &self.blue
    }

    /// Map a stored pixel value to its red, green and blue entries.
    ///
    /// Values below the first mapped value take the first entry,
    /// values past the end of the table take the last one.
    pub fn get(&self, value: i32) -> [u16; 3] {
        let last = self.len().saturating_sub(1);
        let index = (i64::from(value) - i64::from(self.first_mapped)).clamp(0, last as i64);
        let index = index as usize;
        [self.red[index], self.green[index], self.blue[index]]
    }

    /// Map a stored pixel value to an 8-bit RGB triplet.
    pub fn get_rgb8(&self, value: i32) -> [u8; 3] {
        let shift = self.bits - 8;
        self.get(value).map(|entry| (entry >> shift) as u8)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Descriptor {
    entries: usize,
    first_mapped: i32,
    bits: u8,
}

fn descriptor<S: AttributeStore + ?Sized>(
    store: &S,
    tag: Tag,
    name: &'static str,
) -> Result<Option<Descriptor>> {
    let value = match primitive(store, tag) {
        Some(value) => value,
        None => return Ok(None),
    };
    let values = value
        .to_multi_int::<i32>()
        .context(ConvertValueSnafu { name })?;
    let (entries, first_mapped, bits) = match values[..] {
        [entries, first_mapped, bits] => (entries, first_mapped, bits),
        _ => {
            return InvalidValueSnafu {
                name,
                value: value.to_str().to_string(),
            }
            .fail()
        }
    };
    ensure!(
        bits == 8 || bits == 16,
        InvalidValueSnafu {
            name,
            value: value.to_str().to_string(),
        }
    );

    // zero entries stands for 2^16
    let entries = match entries {
        0 => 65_536,
        e if e > 0 => e as usize,
        // a descriptor read as signed shorts
        e => (e + 65_536) as usize,
    };
    // read as unsigned when the first mapped value is meant to be negative
    let first_mapped = if first_mapped > i32::from(i16::MAX) {
        first_mapped - 65_536
    } else {
        first_mapped
    };

    Ok(Some(Descriptor {
        entries,
        first_mapped,
        bits: bits as u8,
    }))
}

/// Collect the table data as little endian 16-bit words.
fn words(value: &PrimitiveValue) -> Option<Vec<u16>> {
    match value {
        PrimitiveValue::U16(words) => Some(words.to_vec()),
        PrimitiveValue::U8(bytes) => Some(
            bytes
                .chunks(2)
                .map(|pair| u16::from_le_bytes([pair[0], pair.get(1).copied().unwrap_or(0)]))
                .collect(),
        ),
        _ => None,
    }
}

fn table<S: AttributeStore + ?Sized>(
    store: &S,
    tag: Tag,
    name: &'static str,
    descriptor: Descriptor,
) -> Result<Vec<u16>> {
    let value = primitive(store, tag).context(MissingAttributeSnafu { name })?;
    let words = words(value).with_context(|| InvalidValueSnafu {
        name,
        value: value.to_str().to_string(),
    })?;
    let entries = descriptor.entries;

    let table: Vec<u16> = if descriptor.bits == 16 || words.len() >= entries {
        // one entry per word
        words.into_iter().take(entries).collect()
    } else {
        // 8-bit entries packed two per word
        words
            .iter()
            .flat_map(|word| word.to_le_bytes())
            .take(entries)
            .map(u16::from)
            .collect()
    };
    ensure!(
        table.len() == entries,
        InvalidValueSnafu {
            name,
            value: format!("{} entries, expected {}", table.len(), entries),
        }
    );

    if descriptor.bits == 8 && table.iter().any(|&entry| entry > 0xFF) {
        warn!("8-bit entries of `{}` stored in the high byte", name);
        return Ok(table.into_iter().map(|entry| entry >> 8).collect());
    }
    Ok(table)
}

/// Resolve the palette color look-up tables.
///
/// Returns `None` if the data set has no red palette descriptor.
/// The three descriptors must agree on the table layout.
pub fn palette_lut<S: AttributeStore + ?Sized>(store: &S) -> Result<Option<PaletteLut>> {
    let red = match descriptor(
        store,
        tags::RED_PALETTE_COLOR_LOOKUP_TABLE_DESCRIPTOR,
        "RedPaletteColorLookupTableDescriptor",
    )? {
        Some(red) => red,
        None => return Ok(None),
    };

    for (tag, name) in [
        (
            tags::GREEN_PALETTE_COLOR_LOOKUP_TABLE_DESCRIPTOR,
            "GreenPaletteColorLookupTableDescriptor",
        ),
        (
            tags::BLUE_PALETTE_COLOR_LOOKUP_TABLE_DESCRIPTOR,
            "BluePaletteColorLookupTableDescriptor",
        ),
    ] {
        let other = descriptor(store, tag, name)?.context(MissingAttributeSnafu { name })?;
        ensure!(
            other == red,
            InvalidValueSnafu {
                name,
                value: format!(
                    "{}\\{}\\{}",
                    other.entries, other.first_mapped, other.bits
                ),
            }
        );
    }

    Ok(Some(PaletteLut {
        first_mapped: red.first_mapped,
        bits: red.bits,
        red: table(
            store,
            tags::RED_PALETTE_COLOR_LOOKUP_TABLE_DATA,
            "RedPaletteColorLookupTableData",
            red,
        )?,
        green: table(
            store,
            tags::GREEN_PALETTE_COLOR_LOOKUP_TABLE_DATA,
            "GreenPaletteColorLookupTableData",
            red,
        )?,
        blue: table(
            store,
            tags::BLUE_PALETTE_COLOR_LOOKUP_TABLE_DATA,
            "BluePaletteColorLookupTableData",
            red,
        )?,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dicom_core::{dicom_value, DataElement, VR};
    use dicom_object::InMemDicomObject;

    fn put_descriptor(obj: &mut InMemDicomObject, tag: Tag, entries: u16, first: u16, bits: u16) {
        obj.put(DataElement::new(
            tag,
            VR::US,
            PrimitiveValue::from([entries, first, bits]),
        ));
    }

    fn put_data(obj: &mut InMemDicomObject, tag: Tag, value: PrimitiveValue) {
        obj.put(DataElement::new(tag, VR::OW, value));
    }

    fn descriptors(obj: &mut InMemDicomObject, entries: u16, first: u16, bits: u16) {
        for tag in [
            tags::RED_PALETTE_COLOR_LOOKUP_TABLE_DESCRIPTOR,
            tags::GREEN_PALETTE_COLOR_LOOKUP_TABLE_DESCRIPTOR,
            tags::BLUE_PALETTE_COLOR_LOOKUP_TABLE_DESCRIPTOR,
        ] {
            put_descriptor(obj, tag, entries, first, bits);
        }
    }

    #[test]
    fn no_descriptor_means_no_palette() {
        let obj = InMemDicomObject::new_empty();
        assert_eq!(palette_lut(&obj).unwrap(), None);
    }

    #[test]
    fn packed_eight_bit_entries() {
        let mut obj = InMemDicomObject::new_empty();
        descriptors(&mut obj, 4, 0, 8);
        let data = dicom_value!(U8, [1, 2, 3, 4]);
        put_data(&mut obj, tags::RED_PALETTE_COLOR_LOOKUP_TABLE_DATA, data.clone());
        put_data(&mut obj, tags::GREEN_PALETTE_COLOR_LOOKUP_TABLE_DATA, data.clone());
        put_data(&mut obj, tags::BLUE_PALETTE_COLOR_LOOKUP_TABLE_DATA, data);

        let lut = palette_lut(&obj).unwrap().unwrap();
        assert_eq!(lut.len(), 4);
        assert_eq!(lut.red(), &[1, 2, 3, 4]);
    }

    #[test]
    fn high_byte_eight_bit_entries() {
        let mut obj = InMemDicomObject::new_empty();
        descriptors(&mut obj, 2, 0, 8);
        let data = PrimitiveValue::from([0x1000_u16, 0xFF00]);
        put_data(&mut obj, tags::RED_PALETTE_COLOR_LOOKUP_TABLE_DATA, data.clone());
        put_data(&mut obj, tags::GREEN_PALETTE_COLOR_LOOKUP_TABLE_DATA, data.clone());
        put_data(&mut obj, tags::BLUE_PALETTE_COLOR_LOOKUP_TABLE_DATA, data);

        let lut = palette_lut(&obj).unwrap().unwrap();
        assert_eq!(lut.blue(), &[0x10, 0xFF]);
    }

    #[test]
    fn zero_entries_means_65536() {
        let mut obj = InMemDicomObject::new_empty();
        put_descriptor(&mut obj, tags::RED_PALETTE_COLOR_LOOKUP_TABLE_DESCRIPTOR, 0, 0, 16);
        let found = descriptor(
            &obj,
            tags::RED_PALETTE_COLOR_LOOKUP_TABLE_DESCRIPTOR,
            "RedPaletteColorLookupTableDescriptor",
        )
        .unwrap()
        .unwrap();
        assert_eq!(found.entries, 65_536);
    }

    #[test]
    fn unsupported_bits_are_rejected() {
        let mut obj = InMemDicomObject::new_empty();
        descriptors(&mut obj, 4, 0, 12);
        assert!(matches!(
            palette_lut(&obj),
            Err(crate::ResolveError::InvalidValue { .. })
        ));
    }
}
