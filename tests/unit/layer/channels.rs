use super::*;

fn reprs(names: &[&str]) -> Vec<ChannelRepr> {
    names.iter().map(|n| ChannelRepr::parse(n).unwrap()).collect()
}

fn names(channels: &[ChannelRepr]) -> Vec<&str> {
    channels.iter().map(ChannelRepr::channel_name).collect()
}

#[test]
fn channel_type_accepts_short_and_long_forms() {
    for (text, want) in [
        ("r", ChannelType::Red),
        ("R", ChannelType::Red),
        ("red", ChannelType::Red),
        ("G", ChannelType::Green),
        ("green", ChannelType::Green),
        ("b", ChannelType::Blue),
        ("BLUE", ChannelType::Blue),
        ("a", ChannelType::Alpha),
        ("alpha", ChannelType::Alpha),
    ] {
        assert_eq!(ChannelType::parse(text), Some(want), "{text}");
    }
    assert_eq!(ChannelType::parse("foo"), None);
    assert_eq!(ChannelType::parse("z"), None);
}

#[test]
fn parse_splits_typename_index_and_type() {
    let a = ChannelRepr::parse("MyCrypto00.R").unwrap();
    assert_eq!(a.typename, "MyCrypto");
    assert_eq!(a.index, 0);
    assert_eq!(a.channel_type, ChannelType::Red);
    assert_eq!(a.channel_name(), "MyCrypto00.R");

    let b = ChannelRepr::parse("typename99.R").unwrap();
    assert_eq!(b.typename, "typename");
    assert_eq!(b.index, 99);

    let c = ChannelRepr::parse("SomeVal00.a").unwrap();
    assert_eq!(c.channel_type, ChannelType::Alpha);
}

#[test]
fn parse_rejects_malformed_names() {
    for bad in [
        "00.R",
        "CryptoAsset.R",
        "CryptoAsset00.",
        "CryptoAsset00",
        "CryptoAsset1.R",
        "CryptoAsset123.R",
        "CryptoAsset00.z",
    ] {
        assert!(
            matches!(ChannelRepr::parse(bad), Err(CryptomatteError::MalformedLevel(_))),
            "{bad}"
        );
    }
}

#[test]
fn known_typename_may_end_in_digits() {
    let c = ChannelRepr::parse_with_typename("crypto_object2_01.g", "crypto_object2_").unwrap();
    assert_eq!(c.index, 1);
    let d = ChannelRepr::parse_with_typename("Layer300.b", "Layer3").unwrap();
    assert_eq!(d.typename, "Layer3");
    assert_eq!(d.index, 0);
    assert!(ChannelRepr::parse_with_typename("Other00.r", "Layer").is_err());
}

#[test]
fn ordering_is_index_then_type() {
    let r1 = ChannelRepr::parse("CryptoAsset01.R").unwrap();
    let r2 = ChannelRepr::parse("CryptoAsset02.R").unwrap();
    assert!(r1 < r2);

    let r = ChannelRepr::parse("CryptoAsset00.R").unwrap();
    let a = ChannelRepr::parse("CryptoAsset00.alpha").unwrap();
    assert!(r < a);

    let red = ChannelRepr::parse("CryptoAsset00.red").unwrap();
    let g = ChannelRepr::parse("CryptoAsset00.g").unwrap();
    assert!(red < g);

    // index wins over channel type
    assert!(a < r1);
}

#[test]
fn sort_keeps_already_sorted_input() {
    let input = [
        "Cryptomatte00.r",
        "Cryptomatte00.g",
        "Cryptomatte00.b",
        "Cryptomatte00.a",
        "Cryptomatte01.r",
        "Cryptomatte01.g",
        "Cryptomatte01.b",
        "Cryptomatte01.a",
    ];
    let sorted = sort_and_validate_channels(reprs(&input)).unwrap();
    assert_eq!(names(&sorted), input);
}

#[test]
fn sort_fixes_out_of_order_input() {
    let input = [
        "Cryptomatte01.a",
        "Cryptomatte00.r",
        "Cryptomatte00.b",
        "Cryptomatte00.a",
        "Cryptomatte00.g",
        "Cryptomatte01.r",
        "Cryptomatte01.g",
        "Cryptomatte01.b",
    ];
    let sorted = sort_and_validate_channels(reprs(&input)).unwrap();
    assert_eq!(
        names(&sorted),
        [
            "Cryptomatte00.r",
            "Cryptomatte00.g",
            "Cryptomatte00.b",
            "Cryptomatte00.a",
            "Cryptomatte01.r",
            "Cryptomatte01.g",
            "Cryptomatte01.b",
            "Cryptomatte01.a",
        ]
    );
}

#[test]
fn trailing_group_may_hold_one_pair() {
    let input = [
        "Cryptomatte00.r",
        "Cryptomatte00.b",
        "Cryptomatte00.a",
        "Cryptomatte00.g",
        "Cryptomatte01.r",
        "Cryptomatte01.g",
    ];
    let sorted = sort_and_validate_channels(reprs(&input)).unwrap();
    assert_eq!(sorted.len(), 6);
    assert_eq!(sorted[5].channel_name(), "Cryptomatte01.g");
}

#[test]
fn incomplete_groups_are_rejected() {
    let missing_alpha = [
        "Cryptomatte00.r",
        "Cryptomatte00.g",
        "Cryptomatte00.b",
        "Cryptomatte00.a",
        "Cryptomatte01.r",
        "Cryptomatte01.g",
        "Cryptomatte01.b",
    ];
    let missing_pair = [
        "Cryptomatte00.r",
        "Cryptomatte00.g",
        "Cryptomatte01.r",
        "Cryptomatte01.g",
        "Cryptomatte01.b",
        "Cryptomatte01.a",
    ];
    let missing_index = [
        "Cryptomatte00.r",
        "Cryptomatte00.g",
        "Cryptomatte00.b",
        "Cryptomatte00.a",
        "Cryptomatte02.r",
        "Cryptomatte02.g",
        "Cryptomatte02.b",
        "Cryptomatte02.a",
    ];
    for input in [&missing_alpha[..], &missing_pair[..], &missing_index[..]] {
        assert!(matches!(
            sort_and_validate_channels(reprs(input)),
            Err(CryptomatteError::MalformedLevel(_))
        ));
    }
}

#[test]
fn empty_duplicate_and_mixed_inputs_are_rejected() {
    assert!(sort_and_validate_channels(vec![]).is_err());
    assert!(sort_and_validate_channels(reprs(&["A00.r", "A00.g", "A00.R", "A00.g"])).is_err());
    assert!(sort_and_validate_channels(reprs(&["A00.r", "B00.g"])).is_err());
}

#[test]
fn legacy_channels_sort_by_component() {
    let sorted = sort_legacy_channels(&["CryptoAsset.b", "CryptoAsset.r", "CryptoAsset.g"]);
    let got: Vec<_> = sorted.iter().map(|(_, n)| n.as_str()).collect();
    assert_eq!(got, ["CryptoAsset.r", "CryptoAsset.g", "CryptoAsset.b"]);
    assert!(sort_legacy_channels(&["CryptoAsset.z"]).is_empty());
}
