pub(crate) mod channels;
pub(crate) mod manifest;
pub(crate) mod metadata;
