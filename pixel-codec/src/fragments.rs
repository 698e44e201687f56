//! Encapsulated pixel data fragments.
//!
//! A [`FragmentStream`] is the compressed side of a transcoding operation:
//! an ordered list of opaque byte fragments,
//! usually one per frame.
use dicom_core::value::{InMemFragment, PixelFragmentSequence, Value};

/// An ordered sequence of compressed pixel data fragments.
///
/// Insertion order is frame order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FragmentStream {
    fragments: Vec<InMemFragment>,
}

impl FragmentStream {
    /// Create an empty fragment stream.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fragment at the end of the stream.
    pub fn push(&mut self, fragment: InMemFragment) {
        self.fragments.push(fragment);
    }

    /// The number of fragments.
    #[inline]
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&[u8]> {
        self.fragments.get(index).map(|f| f.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = &[u8]> {
        self.fragments.iter().map(|f| f.as_slice())
    }

    /// The combined length of all fragments in bytes.
    pub fn total_length(&self) -> usize {
        self.fragments.iter().map(|f| f.len()).sum()
    }

    pub fn as_slice(&self) -> &[InMemFragment] {
        &self.fragments
    }

    pub fn into_fragments(self) -> Vec<InMemFragment> {
        self.fragments
    }

    /// Collect the fragments of an encapsulated pixel data value.
    pub fn from_pixel_sequence(sequence: &PixelFragmentSequence<InMemFragment>) -> Self {
        FragmentStream {
            fragments: sequence.fragments().to_vec(),
        }
    }

    /// Collect the fragments of a pixel data value,
    /// or `None` if the value is not encapsulated.
    pub fn from_value<I>(value: &Value<I, InMemFragment>) -> Option<Self> {
        value.fragments().map(|fragments| FragmentStream {
            fragments: fragments.to_vec(),
        })
    }

    /// Turn the fragments into an encapsulated pixel data sequence
    /// with a basic offset table.
    ///
    /// Odd-length fragments are padded with a trailing zero byte,
    /// since every item in a pixel data sequence must have an even length.
    pub fn into_pixel_sequence(self) -> PixelFragmentSequence<InMemFragment> {
        let mut offset_table = Vec::with_capacity(self.fragments.len());
        let mut offset = 0_u32;
        let fragments: Vec<InMemFragment> = self
            .fragments
            .into_iter()
            .map(|mut fragment| {
                if fragment.len() % 2 == 1 {
                    fragment.push(0);
                }
                offset_table.push(offset);
                // item tag and item length precede each fragment
                offset = offset.wrapping_add(8 + fragment.len() as u32);
                fragment
            })
            .collect();

        PixelFragmentSequence::new(offset_table, fragments)
    }

    /// Turn the fragments into an encapsulated pixel data value.
    pub fn into_value<I>(self) -> Value<I, InMemFragment> {
        Value::PixelSequence(self.into_pixel_sequence())
    }
}

impl From<Vec<InMemFragment>> for FragmentStream {
    fn from(fragments: Vec<InMemFragment>) -> Self {
        FragmentStream { fragments }
    }
}

impl std::iter::FromIterator<InMemFragment> for FragmentStream {
    fn from_iter<T: IntoIterator<Item = InMemFragment>>(iter: T) -> Self {
        FragmentStream {
            fragments: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for FragmentStream {
    type Item = InMemFragment;
    type IntoIter = std::vec::IntoIter<InMemFragment>;

    fn into_iter(self) -> Self::IntoIter {
        self.fragments.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_sequence_offsets_and_padding() {
        let stream = FragmentStream::from(vec![vec![20, 30, 40], vec![50, 60, 70, 80]]);
        assert_eq!(stream.total_length(), 7);

        let sequence = stream.into_pixel_sequence();
        assert_eq!(sequence.offset_table(), &[0, 12]);
        assert_eq!(sequence.fragments().len(), 2);
        assert_eq!(sequence.fragments()[0], vec![20, 30, 40, 0]);
        assert_eq!(sequence.fragments()[1], vec![50, 60, 70, 80]);
    }

    #[test]
    fn from_value_requires_encapsulation() {
        let value: Value =
            FragmentStream::from(vec![vec![1, 2], vec![3, 4]]).into_value();
        let stream = FragmentStream::from_value(&value).unwrap();
        assert_eq!(stream.len(), 2);
        assert_eq!(stream.get(1), Some(&[3_u8, 4][..]));

        let native: Value =
            Value::Primitive(dicom_core::PrimitiveValue::from(vec![0_u8; 4]));
        assert!(FragmentStream::from_value(&native).is_none());
    }
}
