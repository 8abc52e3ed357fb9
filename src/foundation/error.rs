/// Convenience result type used across the crate.
pub type CryptomatteResult<T> = Result<T, CryptomatteError>;

/// Top-level error taxonomy used by manifest, metadata and decoding APIs.
#[derive(thiserror::Error, Debug)]
pub enum CryptomatteError {
    /// Hash method text is not one of the supported methods.
    #[error("unsupported hash method: {0}")]
    UnsupportedHashMethod(String),

    /// Conversion method text is not one of the supported methods.
    #[error("unsupported conversion method: {0}")]
    UnsupportedConversionMethod(String),

    /// A manifest value is not an 8-digit hexadecimal hash.
    #[error("malformed hash: {0}")]
    MalformedHash(String),

    /// Manifest text is not a flat JSON object of name to hex-string pairs.
    #[error("malformed manifest: {0}")]
    MalformedManifest(String),

    /// A name was queried that the manifest does not contain.
    #[error("name not found: {0}")]
    NameNotFound(String),

    /// A channel group does not form valid (id, coverage) levels.
    #[error("malformed level: {0}")]
    MalformedLevel(String),

    /// Cryptomatte attributes are shaped incorrectly.
    #[error("invalid metadata: {0}")]
    InvalidMetadata(String),

    /// A channel is not stored with the sample type decoding requires.
    #[error("unsupported sample type: {0}")]
    UnsupportedSampleType(String),

    /// The image container could not be opened or decoded.
    #[error("image error: {0}")]
    Image(String),

    /// Caller-supplied options are out of range.
    #[error("invalid options: {0}")]
    InvalidOptions(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CryptomatteError {
    /// Build a [`CryptomatteError::UnsupportedHashMethod`] value.
    pub fn unsupported_hash_method(msg: impl Into<String>) -> Self {
        Self::UnsupportedHashMethod(msg.into())
    }

    /// Build a [`CryptomatteError::UnsupportedConversionMethod`] value.
    pub fn unsupported_conversion_method(msg: impl Into<String>) -> Self {
        Self::UnsupportedConversionMethod(msg.into())
    }

    /// Build a [`CryptomatteError::MalformedHash`] value.
    pub fn malformed_hash(msg: impl Into<String>) -> Self {
        Self::MalformedHash(msg.into())
    }

    /// Build a [`CryptomatteError::MalformedManifest`] value.
    pub fn malformed_manifest(msg: impl Into<String>) -> Self {
        Self::MalformedManifest(msg.into())
    }

    /// Build a [`CryptomatteError::NameNotFound`] value.
    pub fn name_not_found(msg: impl Into<String>) -> Self {
        Self::NameNotFound(msg.into())
    }

    /// Build a [`CryptomatteError::MalformedLevel`] value.
    pub fn malformed_level(msg: impl Into<String>) -> Self {
        Self::MalformedLevel(msg.into())
    }

    /// Build a [`CryptomatteError::InvalidMetadata`] value.
    pub fn invalid_metadata(msg: impl Into<String>) -> Self {
        Self::InvalidMetadata(msg.into())
    }

    /// Build a [`CryptomatteError::UnsupportedSampleType`] value.
    pub fn unsupported_sample_type(msg: impl Into<String>) -> Self {
        Self::UnsupportedSampleType(msg.into())
    }

    /// Build a [`CryptomatteError::Image`] value.
    pub fn image(msg: impl Into<String>) -> Self {
        Self::Image(msg.into())
    }

    /// Build a [`CryptomatteError::InvalidOptions`] value.
    pub fn invalid_options(msg: impl Into<String>) -> Self {
        Self::InvalidOptions(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
