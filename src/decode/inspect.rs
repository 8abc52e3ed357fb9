//! Cheap questions about an image that do not decode any pixels.

use crate::{
    decode::image::{ImageSource, SampleType, attribute_pairs},
    foundation::error::{CryptomatteError, CryptomatteResult},
    layer::{
        channels::{ChannelRepr, sort_and_validate_channels},
        metadata::Metadata,
    },
};

fn layers(source: &(impl ImageSource + ?Sized)) -> Vec<Metadata> {
    Metadata::from_attributes_lenient(attribute_pairs(source), source.path()).0
}

/// Whether the image describes at least one well-formed Cryptomatte layer.
pub fn has_cryptomatte(source: &(impl ImageSource + ?Sized)) -> bool {
    num_cryptomattes(source) > 0
}

/// Number of well-formed Cryptomatte layers described by the image's attributes.
pub fn num_cryptomattes(source: &(impl ImageSource + ?Sized)) -> usize {
    layers(source).len()
}

/// Whether any layer carries legacy `<name>.r/g/b` preview channels.
pub fn has_preview(source: &(impl ImageSource + ?Sized)) -> bool {
    let names = source.channel_names();
    layers(source)
        .iter()
        .any(|m| !m.legacy_channel_names(&names).is_empty())
}

/// Channel names per layer: legacy preview channels first, then indexed channels.
pub fn cryptomatte_channel_names(source: &(impl ImageSource + ?Sized)) -> Vec<Vec<String>> {
    let names = source.channel_names();
    layers(source)
        .iter()
        .map(|m| {
            let mut out = m.legacy_channel_names(&names);
            out.extend(m.channel_names(&names));
            out
        })
        .collect()
}

/// Strictly parse the Cryptomatte attributes; the first malformed layer is the error.
pub fn validate_metadata(source: &(impl ImageSource + ?Sized)) -> CryptomatteResult<()> {
    let metadatas = Metadata::from_json(attribute_pairs(source), source.path())?;
    if metadatas.is_empty() {
        return Err(CryptomatteError::invalid_metadata(format!(
            "'{}' has no cryptomatte attributes",
            source.path().display()
        )));
    }
    Ok(())
}

/// Check that every layer's indexed channels form complete 32-bit float groups of one size.
pub fn validate_channel_structure(source: &(impl ImageSource + ?Sized)) -> CryptomatteResult<()> {
    let names = source.channel_names();
    for metadata in Metadata::from_json(attribute_pairs(source), source.path())? {
        let reprs = metadata
            .channel_names(&names)
            .iter()
            .map(|n| ChannelRepr::parse_with_typename(n, metadata.name()))
            .collect::<CryptomatteResult<Vec<_>>>()?;
        let reprs = sort_and_validate_channels(reprs)?;

        let mut size = None;
        for repr in &reprs {
            let Some(buffer) = source.channel(repr.channel_name()) else {
                return Err(CryptomatteError::malformed_level(format!(
                    "channel '{}' is listed but has no samples",
                    repr.channel_name()
                )));
            };
            if buffer.sample_type != SampleType::F32 {
                return Err(CryptomatteError::unsupported_sample_type(format!(
                    "channel '{}' is {:?}, expected 32-bit float",
                    repr.channel_name(),
                    buffer.sample_type
                )));
            }
            match size {
                None => size = Some(buffer.dimensions()),
                Some(s) if s != buffer.dimensions() => {
                    return Err(CryptomatteError::malformed_level(format!(
                        "channel '{}' size differs from the rest of layer '{}'",
                        repr.channel_name(),
                        metadata.name()
                    )));
                }
                Some(_) => {}
            }
        }
    }
    Ok(())
}

/// [`validate_metadata`] followed by [`validate_channel_structure`].
pub fn validate(source: &(impl ImageSource + ?Sized)) -> CryptomatteResult<()> {
    validate_metadata(source)?;
    validate_channel_structure(source)
}

#[cfg(test)]
#[path = "../../tests/unit/decode/inspect.rs"]
mod tests;
