use super::*;

#[test]
fn channel_buffer_checks_sample_count() {
    let ok = ChannelBuffer::f32(2, 3, vec![0.0; 6]).unwrap();
    assert_eq!(ok.dimensions(), (2, 3));
    assert_eq!(ok.sample_type, SampleType::F32);

    assert!(matches!(
        ChannelBuffer::f32(2, 3, vec![0.0; 5]),
        Err(CryptomatteError::Image(_))
    ));
    assert!(ChannelBuffer::with_sample_type(usize::MAX, 2, vec![], SampleType::F16).is_err());
}

#[test]
fn builders_replace_in_place() {
    let img = ChannelImage::new("/renders/shot.exr")
        .with_attribute("a", "1")
        .with_attribute("b", "2")
        .with_attribute("a", "3")
        .with_channel("X.r", ChannelBuffer::f32(1, 1, vec![1.0]).unwrap())
        .with_channel("X.g", ChannelBuffer::f32(1, 1, vec![2.0]).unwrap())
        .with_channel("X.r", ChannelBuffer::f32(1, 1, vec![5.0]).unwrap());

    assert_eq!(img.path(), Path::new("/renders/shot.exr"));
    assert_eq!(
        img.attributes(),
        [
            ("a".to_string(), "3".to_string()),
            ("b".to_string(), "2".to_string())
        ]
    );
    assert_eq!(img.channel_names(), ["X.r", "X.g"]);
    assert_eq!(img.num_channels(), 2);
    assert_eq!(img.channel("X.r").unwrap().samples, [5.0]);
    assert!(img.channel("X.b").is_none());
}

#[test]
fn attribute_pairs_borrow_in_order() {
    let img = ChannelImage::new("x.exr")
        .with_attribute("cryptomatte/abc/name", "A")
        .with_attribute("compression", "zip");
    assert_eq!(
        attribute_pairs(&img),
        [("cryptomatte/abc/name", "A"), ("compression", "zip")]
    );
}
