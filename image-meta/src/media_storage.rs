//! Classification of images by storage SOP class.

use std::fmt;

use dicom_dictionary_std::{tags, uids};
use dicom_pixel_codec::{PhotometricInterpretation, PixelFormat};

use crate::attribute::{modality, optional_string};
use crate::store::AttributeStore;
use crate::transform::Rescale;

/// A storage SOP class of an image,
/// as far as attribute resolution needs to tell them apart.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum MediaStorage {
    CtImage,
    EnhancedCtImage,
    MrImage,
    EnhancedMrImage,
    PetImage,
    EnhancedPetImage,
    NmImage,
    UsImage,
    UsMultiFrameImage,
    CrImage,
    DxImage,
    MgImage,
    XaImage,
    RfImage,
    RtImage,
    RtDose,
    SecondaryCaptureImage,
    MultiFrameSingleBitSecondaryCaptureImage,
    MultiFrameGrayscaleByteSecondaryCaptureImage,
    MultiFrameGrayscaleWordSecondaryCaptureImage,
    MultiFrameTrueColorSecondaryCaptureImage,
    BreastTomosynthesisImage,
    VlPhotographicImage,
    Unknown,
}

use MediaStorage::*;

const KNOWN: [(MediaStorage, &str); 23] = [
    (CtImage, uids::CT_IMAGE_STORAGE),
    (EnhancedCtImage, uids::ENHANCED_CT_IMAGE_STORAGE),
    (MrImage, uids::MR_IMAGE_STORAGE),
    (EnhancedMrImage, uids::ENHANCED_MR_IMAGE_STORAGE),
    (PetImage, uids::POSITRON_EMISSION_TOMOGRAPHY_IMAGE_STORAGE),
    (EnhancedPetImage, uids::ENHANCED_PET_IMAGE_STORAGE),
    (NmImage, uids::NUCLEAR_MEDICINE_IMAGE_STORAGE),
    (UsImage, uids::ULTRASOUND_IMAGE_STORAGE),
    (UsMultiFrameImage, uids::ULTRASOUND_MULTI_FRAME_IMAGE_STORAGE),
    (CrImage, uids::COMPUTED_RADIOGRAPHY_IMAGE_STORAGE),
    (DxImage, uids::DIGITAL_X_RAY_IMAGE_STORAGE_FOR_PRESENTATION),
    (
        MgImage,
        uids::DIGITAL_MAMMOGRAPHY_X_RAY_IMAGE_STORAGE_FOR_PRESENTATION,
    ),
    (XaImage, uids::X_RAY_ANGIOGRAPHIC_IMAGE_STORAGE),
    (RfImage, uids::X_RAY_RADIOFLUOROSCOPIC_IMAGE_STORAGE),
    (RtImage, uids::RT_IMAGE_STORAGE),
    (RtDose, uids::RT_DOSE_STORAGE),
    (SecondaryCaptureImage, uids::SECONDARY_CAPTURE_IMAGE_STORAGE),
    (
        MultiFrameSingleBitSecondaryCaptureImage,
        uids::MULTI_FRAME_SINGLE_BIT_SECONDARY_CAPTURE_IMAGE_STORAGE,
    ),
    (
        MultiFrameGrayscaleByteSecondaryCaptureImage,
        uids::MULTI_FRAME_GRAYSCALE_BYTE_SECONDARY_CAPTURE_IMAGE_STORAGE,
    ),
    (
        MultiFrameGrayscaleWordSecondaryCaptureImage,
        uids::MULTI_FRAME_GRAYSCALE_WORD_SECONDARY_CAPTURE_IMAGE_STORAGE,
    ),
    (
        MultiFrameTrueColorSecondaryCaptureImage,
        uids::MULTI_FRAME_TRUE_COLOR_SECONDARY_CAPTURE_IMAGE_STORAGE,
    ),
    (
        BreastTomosynthesisImage,
        uids::BREAST_TOMOSYNTHESIS_IMAGE_STORAGE,
    ),
    (VlPhotographicImage, uids::VL_PHOTOGRAPHIC_IMAGE_STORAGE),
];

/// Modality to single-frame and multi-frame storage classes.
const BY_MODALITY: [(&str, MediaStorage, Option<MediaStorage>); 13] = [
    ("CT", CtImage, Some(EnhancedCtImage)),
    ("MR", MrImage, Some(EnhancedMrImage)),
    ("PT", PetImage, Some(EnhancedPetImage)),
    ("NM", NmImage, Some(NmImage)),
    ("US", UsImage, Some(UsMultiFrameImage)),
    ("CR", CrImage, None),
    ("DX", DxImage, None),
    ("MG", MgImage, Some(BreastTomosynthesisImage)),
    ("XA", XaImage, Some(XaImage)),
    ("RF", RfImage, Some(RfImage)),
    ("RTIMAGE", RtImage, Some(RtImage)),
    ("RTDOSE", RtDose, Some(RtDose)),
    ("XC", VlPhotographicImage, None),
];

impl MediaStorage {
    /// Classify a SOP class UID.
    /// Trailing padding is ignored.
    pub fn from_uid(uid: &str) -> Self {
        let uid = uid.trim_end_matches(|c: char| c == '\0' || c == ' ');
        KNOWN
            .iter()
            .find(|(_, known)| *known == uid)
            .map_or(Unknown, |(ms, _)| *ms)
    }

    /// The SOP class UID of this class.
    pub fn uid(self) -> Option<&'static str> {
        KNOWN
            .iter()
            .find(|(ms, _)| *ms == self)
            .map(|(_, uid)| *uid)
    }

    /// Whether images of this class describe their frames
    /// through functional group sequences.
    pub fn is_enhanced_multi_frame(self) -> bool {
        matches!(
            self,
            EnhancedCtImage | EnhancedMrImage | EnhancedPetImage | BreastTomosynthesisImage
        )
    }

    /// Whether the class is a kind of secondary capture.
    pub fn is_secondary_capture(self) -> bool {
        matches!(
            self,
            SecondaryCaptureImage
                | MultiFrameSingleBitSecondaryCaptureImage
                | MultiFrameGrayscaleByteSecondaryCaptureImage
                | MultiFrameGrayscaleWordSecondaryCaptureImage
                | MultiFrameTrueColorSecondaryCaptureImage
        )
    }

    /// Whether the standard _Rescale Intercept_ and _Rescale Slope_
    /// are meaningful for this class.
    ///
    /// Some vendors fill them in for classes without a modality LUT,
    /// in which case they are ignored unless forced.
    pub fn has_modality_lut(self) -> bool {
        !matches!(
            self,
            MrImage | UsImage | UsMultiFrameImage | VlPhotographicImage | RtDose
        )
    }
}

impl fmt::Display for MediaStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Whether the modality only ever produces grayscale images.
fn is_grayscale_modality(ms: MediaStorage) -> bool {
    matches!(
        ms,
        CtImage
            | EnhancedCtImage
            | MrImage
            | EnhancedMrImage
            | PetImage
            | EnhancedPetImage
            | NmImage
            | CrImage
            | DxImage
            | MgImage
            | BreastTomosynthesisImage
            | XaImage
            | RfImage
            | RtImage
            | RtDose
    )
}

fn multi_frame_secondary_capture(pixel_format: &PixelFormat) -> MediaStorage {
    match (
        pixel_format.samples_per_pixel(),
        pixel_format.bits_allocated(),
    ) {
        (1, 1) => MultiFrameSingleBitSecondaryCaptureImage,
        (1, 8) => MultiFrameGrayscaleByteSecondaryCaptureImage,
        (1, 16) => MultiFrameGrayscaleWordSecondaryCaptureImage,
        (3, 8) => MultiFrameTrueColorSecondaryCaptureImage,
        _ => Unknown,
    }
}

/// Choose the storage class for an image of the given modality.
///
/// Multi-frame images (`dimensionality >= 3`) prefer the multi-frame class
/// of the modality, or else a multi-frame secondary capture class
/// fitting the pixel format.
/// Grayscale modalities holding color data,
/// and ambiguous modalities with a non-identity rescale,
/// fall back to secondary capture.
pub fn compute_media_storage_from_modality(
    modality: &str,
    dimensionality: usize,
    pixel_format: &PixelFormat,
    photometric_interpretation: PhotometricInterpretation,
    rescale: Rescale,
) -> MediaStorage {
    let modality = modality.trim_matches(|c: char| c == '\0' || c.is_whitespace());
    let multi_frame = dimensionality >= 3;
    let grayscale =
        pixel_format.samples_per_pixel() == 1 && photometric_interpretation.is_monochrome();

    let known = BY_MODALITY.iter().find(|(m, _, _)| *m == modality);
    let (single, multi) = match known {
        Some((_, single, multi)) => (*single, *multi),
        None => {
            // OT, empty or unrecognized modality
            if grayscale && !rescale.is_identity() {
                return match pixel_format.bits_allocated() {
                    8 => MultiFrameGrayscaleByteSecondaryCaptureImage,
                    _ => MultiFrameGrayscaleWordSecondaryCaptureImage,
                };
            }
            if multi_frame {
                return multi_frame_secondary_capture(pixel_format);
            }
            return SecondaryCaptureImage;
        }
    };

    if is_grayscale_modality(single) && !grayscale {
        return if multi_frame {
            MultiFrameTrueColorSecondaryCaptureImage
        } else {
            SecondaryCaptureImage
        };
    }

    if multi_frame {
        multi.unwrap_or_else(|| multi_frame_secondary_capture(pixel_format))
    } else {
        single
    }
}

/// Classify the image in the store,
/// from its _SOP Class UID_ or else guessed from its _Modality_.
pub fn media_storage<S: AttributeStore + ?Sized>(store: &S) -> MediaStorage {
    if let Some(uid) = optional_string(store, tags::SOP_CLASS_UID) {
        let ms = MediaStorage::from_uid(&uid);
        if ms != Unknown {
            return ms;
        }
    }
    match modality(store) {
        Some(modality) => compute_media_storage_from_modality(
            &modality,
            2,
            &PixelFormat::uint8(),
            PhotometricInterpretation::Monochrome2,
            Rescale::identity(),
        ),
        None => Unknown,
    }
}
