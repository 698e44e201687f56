//! The boundary between attribute resolution and DICOM data sets.

use dicom_core::value::{InMemFragment, PrimitiveValue, Value};
use dicom_core::{DataDictionary, DataElement, Tag, VR};
use dicom_object::{FileDicomObject, InMemDicomObject};

/// A keyed store of DICOM attributes,
/// from which image attributes are resolved and to which they are written.
///
/// Sequence items are stores of their own,
/// so that nested functional groups are traversed the same way.
pub trait AttributeStore {
    /// The type of a sequence item in this store.
    type Item: AttributeStore;

    /// Fetch the value of the attribute with the given tag, if present.
    fn lookup(&self, tag: Tag) -> Option<&Value<Self::Item, InMemFragment>>;

    /// Insert a primitive attribute,
    /// replacing any previous element with the same tag.
    fn insert(&mut self, tag: Tag, vr: VR, value: PrimitiveValue);

    /// Remove the attribute with the given tag,
    /// returning whether it was present.
    fn remove(&mut self, tag: Tag) -> bool;

    /// The transfer syntax of the encoded pixel data, when known.
    fn transfer_syntax_uid(&self) -> Option<&str> {
        None
    }
}

impl<D> AttributeStore for InMemDicomObject<D>
where
    D: DataDictionary + Clone,
{
    type Item = InMemDicomObject<D>;

    fn lookup(&self, tag: Tag) -> Option<&Value<Self::Item, InMemFragment>> {
        self.element(tag).ok().map(|e| e.value())
    }

    fn insert(&mut self, tag: Tag, vr: VR, value: PrimitiveValue) {
        self.put(DataElement::new(tag, vr, value));
    }

    fn remove(&mut self, tag: Tag) -> bool {
        self.remove_element(tag)
    }
}

impl<D> AttributeStore for FileDicomObject<InMemDicomObject<D>>
where
    D: DataDictionary + Clone,
{
    type Item = InMemDicomObject<D>;

    fn lookup(&self, tag: Tag) -> Option<&Value<Self::Item, InMemFragment>> {
        AttributeStore::lookup(&**self, tag)
    }

    fn insert(&mut self, tag: Tag, vr: VR, value: PrimitiveValue) {
        AttributeStore::insert(&mut **self, tag, vr, value)
    }

    fn remove(&mut self, tag: Tag) -> bool {
        AttributeStore::remove(&mut **self, tag)
    }

    fn transfer_syntax_uid(&self) -> Option<&str> {
        Some(self.meta().transfer_syntax())
    }
}
