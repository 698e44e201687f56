//! Codec selection by transfer syntax.

use std::fmt;

use tracing::debug;

use crate::codec::ImageCodec;
use crate::policy::ImagingPolicy;

/// A boxed codec which can be sent to other threads.
pub type DynImageCodec = Box<dyn ImageCodec + Send>;

type CodecFactory = Box<dyn Fn(&ImagingPolicy) -> DynImageCodec + Send + Sync>;

/// An ordered collection of codec factories.
///
/// A codec is selected by asking each registered codec in turn
/// whether it supports the transfer syntax,
/// so earlier registrations take precedence.
pub struct CodecRegistry {
    factories: Vec<CodecFactory>,
}

impl CodecRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        CodecRegistry {
            factories: Vec::new(),
        }
    }

    /// Create a registry with all codecs enabled by crate features.
    pub fn with_default_codecs() -> Self {
        #[allow(unused_mut)]
        let mut registry = Self::new();
        #[cfg(feature = "charls")]
        registry.register(|policy| {
            crate::jpegls::JpegLsCodec::new(crate::jpegls::CharlsBackend, policy)
        });
        #[cfg(not(feature = "charls"))]
        tracing::warn!("No JPEG-LS backend compiled in, enable the `charls` feature");
        registry
    }

    /// Add a codec factory after all others.
    pub fn register<F, C>(&mut self, factory: F)
    where
        F: Fn(&ImagingPolicy) -> C + Send + Sync + 'static,
        C: ImageCodec + Send + 'static,
    {
        self.factories
            .push(Box::new(move |policy| Box::new(factory(policy))));
    }

    /// Obtain a codec able to decode the given transfer syntax.
    pub fn decoder_for(&self, ts_uid: &str, policy: &ImagingPolicy) -> Option<DynImageCodec> {
        let codec = self
            .factories
            .iter()
            .map(|factory| factory(policy))
            .find(|codec| codec.can_decode(ts_uid));
        if codec.is_none() {
            debug!(
                "None of {} registered codecs decodes {}",
                self.factories.len(),
                ts_uid
            );
        }
        codec
    }

    /// Obtain a codec able to encode into the given transfer syntax.
    pub fn encoder_for(&self, ts_uid: &str, policy: &ImagingPolicy) -> Option<DynImageCodec> {
        let codec = self
            .factories
            .iter()
            .map(|factory| factory(policy))
            .find(|codec| codec.can_code(ts_uid));
        if codec.is_none() {
            debug!(
                "None of {} registered codecs encodes {}",
                self.factories.len(),
                ts_uid
            );
        }
        codec
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::with_default_codecs()
    }
}

impl fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecRegistry")
            .field("codecs", &self.factories.len())
            .finish()
    }
}
