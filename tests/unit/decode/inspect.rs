use super::*;
use crate::decode::image::{ChannelBuffer, ChannelImage};

fn f32s(n: usize) -> ChannelBuffer {
    ChannelBuffer::f32(n, 1, vec![0.0; n]).unwrap()
}

fn asset_image() -> ChannelImage {
    ChannelImage::new("/nonexistent/asset.exr")
        .with_attribute("cryptomatte/abc1234/name", "CryptoAsset")
        .with_attribute("cryptomatte/abc1234/hash", "MurmurHash3_32")
        .with_attribute("cryptomatte/abc1234/conversion", "uint32_to_float32")
        .with_channel("R", f32s(3))
        .with_channel("CryptoAsset00.r", f32s(3))
        .with_channel("CryptoAsset00.g", f32s(3))
        .with_channel("CryptoAsset.r", f32s(3))
        .with_channel("CryptoAsset.g", f32s(3))
        .with_channel("CryptoAsset.b", f32s(3))
}

#[test]
fn plain_image_has_nothing() {
    let img = ChannelImage::new("plain.exr").with_channel("R", f32s(1));
    assert!(!has_cryptomatte(&img));
    assert_eq!(num_cryptomattes(&img), 0);
    assert!(!has_preview(&img));
    assert!(cryptomatte_channel_names(&img).is_empty());
    assert!(matches!(
        validate_metadata(&img),
        Err(CryptomatteError::InvalidMetadata(_))
    ));
}

#[test]
fn counts_and_preview() {
    let img = asset_image();
    assert!(has_cryptomatte(&img));
    assert_eq!(num_cryptomattes(&img), 1);
    assert!(has_preview(&img));
    assert_eq!(
        cryptomatte_channel_names(&img),
        [vec![
            "CryptoAsset.r".to_string(),
            "CryptoAsset.g".to_string(),
            "CryptoAsset.b".to_string(),
            "CryptoAsset00.r".to_string(),
            "CryptoAsset00.g".to_string(),
        ]]
    );
    validate(&img).unwrap();
}

#[test]
fn broken_layers_are_not_counted_but_fail_validation() {
    let img = asset_image()
        .with_attribute("cryptomatte/def5678/name", "CryptoMaterial")
        .with_attribute("cryptomatte/def5678/hash", "MurmurHash3_32");
    assert_eq!(num_cryptomattes(&img), 1);
    assert!(matches!(
        validate_metadata(&img),
        Err(CryptomatteError::InvalidMetadata(_))
    ));
}

#[test]
fn channel_structure_checks_groups_types_and_sizes() {
    let incomplete = asset_image().with_channel("CryptoAsset01.r", f32s(3));
    assert!(matches!(
        validate_channel_structure(&incomplete),
        Err(CryptomatteError::MalformedLevel(_))
    ));

    let half = asset_image().with_channel(
        "CryptoAsset00.g",
        ChannelBuffer::with_sample_type(3, 1, vec![0.0; 3], SampleType::F16).unwrap(),
    );
    assert!(matches!(
        validate_channel_structure(&half),
        Err(CryptomatteError::UnsupportedSampleType(_))
    ));

    let resized = asset_image().with_channel("CryptoAsset00.g", f32s(4));
    assert!(matches!(
        validate(&resized),
        Err(CryptomatteError::MalformedLevel(_))
    ));

    let no_channels = ChannelImage::new("x.exr")
        .with_attribute("cryptomatte/abc1234/name", "CryptoAsset")
        .with_attribute("cryptomatte/abc1234/hash", "MurmurHash3_32")
        .with_attribute("cryptomatte/abc1234/conversion", "uint32_to_float32");
    assert!(validate_metadata(&no_channels).is_ok());
    assert!(validate_channel_structure(&no_channels).is_err());
}
