pub(crate) mod cryptomatte;
#[cfg(feature = "openexr")]
pub(crate) mod exr;
pub(crate) mod image;
pub(crate) mod inspect;
pub(crate) mod mask;
