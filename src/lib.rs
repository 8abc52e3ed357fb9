//! Cryptomatte decoding: manifests, layer metadata and per-object coverage masks.
//!
//! A Cryptomatte image stores, per pixel, a ranked list of (id, coverage) pairs spread over
//! groups of four channels named `<Layer>00.r/g/b/a`, `<Layer>01.r/g/b/a`, and so on. Each
//! id is a 32-bit hash of an object name, stored bit-for-bit in a float channel. The image's
//! attributes (`cryptomatte/<key>/...`) describe each layer and carry a manifest mapping names
//! to hashes, either inline or in a sidecar JSON file.
//!
//! # Pipeline overview
//!
//! 1. **Describe**: image attributes -> [`Metadata`] per layer, each with an optional [`Manifest`]
//! 2. **Collect**: channel names -> validated, rank-ordered (id, coverage) levels
//! 3. **Reconstruct**: name -> [`HashValue`] -> summed coverage per pixel ([`Mask`])
//!
//! Design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Bit-exact ids**: hashes are compared as bit patterns, never as numbers.
//! - **Speculative manifest resolution is silent**: a missing or broken manifest leaves the
//!   layer without one; explicit parsing reports the error.
//! - **One bad layer never fails a whole image**: it is reported in [`LoadReport::skipped`].
//!
//! # Getting started
//!
//! With the default `openexr` feature, [`Cryptomatte::load`] reads an OpenEXR file directly.
//! Other containers plug in through [`ImageSource`]; [`ChannelImage`] is an in-memory one.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod decode;
mod foundation;
mod layer;

/// Questions about an image that do not decode pixels.
pub mod inspect {
    pub use crate::decode::inspect::{
        cryptomatte_channel_names, has_cryptomatte, has_preview, num_cryptomattes, validate,
        validate_channel_structure, validate_metadata,
    };
}

pub use decode::cryptomatte::{Cryptomatte, LoadOptions, LoadReport, MaskThreading};
#[cfg(feature = "openexr")]
pub use decode::exr::ExrImage;
pub use decode::image::{ChannelBuffer, ChannelImage, ImageSource, SampleType};
pub use decode::mask::Mask;
pub use foundation::error::{CryptomatteError, CryptomatteResult};
pub use foundation::hash::{ConversionMethod, HashMethod, HashValue, hash_name, hash_to_float};
pub use layer::channels::{
    ChannelRepr, ChannelType, sort_and_validate_channels, sort_legacy_channels,
};
pub use layer::manifest::{MANIF_FILE_SUFFIX, MANIFEST_SUFFIX, Manifest, ManifestResolution};
pub use layer::metadata::{ATTRIB_NAMESPACE, Metadata, SkippedLayer};
