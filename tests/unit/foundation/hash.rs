use super::*;

#[test]
fn murmur3_matches_reference_vectors() {
    assert_eq!(Murmur3x86_32::new(0).hash(b""), 0);
    assert_eq!(Murmur3x86_32::new(0).hash(b"hello"), 0x248b_fa47);
    assert_eq!(Murmur3x86_32::new(0).hash(b"a"), 0x3c25_69b2);
}

#[test]
fn cryptomatte_hash_matches_renderer_manifests() {
    let m = HashMethod::MurmurHash3_32;
    assert_eq!(m.hash("Box001").to_hex(), "6d15e631");
    assert_eq!(m.hash("Plane001").to_hex(), "ce9e0b32");
    assert_eq!(m.hash("Sphere001").to_hex(), "7ab5de01");
    assert_eq!(m.hash("Material__25").to_hex(), "ce242a4e");
}

#[test]
fn cryptomatte_hash_avoids_zero_exponent() {
    // murmur3("") == 0, whose float view is a zero-exponent value
    let h = HashMethod::MurmurHash3_32.hash("");
    assert_eq!(h, HashValue(0x0080_0000));
    assert!(h.to_f32().is_normal());
}

#[test]
fn hex_views_round_trip() {
    for hex in ["00000000", "00000001", "deadbeef", "ffffffff", "6d15e631"] {
        let v = HashValue::from_hex(hex).unwrap();
        assert_eq!(v.to_hex(), hex);
        assert_eq!(HashValue::from_f32(v.to_f32()), v);
    }
}

#[test]
fn from_hex_accepts_either_case() {
    assert_eq!(HashValue::from_hex("DEADBEEF").unwrap(), HashValue(0xdead_beef));
    assert_eq!(HashValue::from_hex("DeadBeEf").unwrap(), HashValue(0xdead_beef));
}

#[test]
fn from_hex_rejects_bad_width_and_digits() {
    for bad in ["", "123", "123456789", "zzzzzzzz", "+1234567", "0x123456"] {
        let err = HashValue::from_hex(bad).unwrap_err();
        assert!(matches!(err, CryptomatteError::MalformedHash(_)), "{bad}");
    }
}

#[test]
fn to_hex_is_zero_padded_lowercase() {
    assert_eq!(HashValue(1).to_hex(), "00000001");
    assert_eq!(HashValue(0xABCD).to_hex(), "0000abcd");
    assert_eq!(HashValue(0xABCD).to_string(), "0000abcd");
}

#[test]
fn float_view_is_a_bit_cast_not_a_numeric_cast() {
    let one = HashValue(1);
    assert_ne!(one.to_f32(), 1.0);
    assert_eq!(one.to_f32().to_bits(), 1);
    assert_eq!(HashValue(0x3f80_0000).to_f32(), 1.0);
    assert_eq!(
        ConversionMethod::Uint32ToFloat32
            .convert(HashValue(0x6d15_e631))
            .to_bits(),
        0x6d15_e631
    );
}

#[test]
fn method_names_parse_exactly() {
    assert_eq!(
        "MurmurHash3_32".parse::<HashMethod>().unwrap(),
        HashMethod::MurmurHash3_32
    );
    assert_eq!(
        "uint32_to_float32".parse::<ConversionMethod>().unwrap(),
        ConversionMethod::Uint32ToFloat32
    );
    assert!(matches!(
        "murmurhash3_32".parse::<HashMethod>(),
        Err(CryptomatteError::UnsupportedHashMethod(_))
    ));
    assert!(matches!(
        "BadConversion".parse::<ConversionMethod>(),
        Err(CryptomatteError::UnsupportedConversionMethod(_))
    ));
}

#[test]
fn named_helpers_dispatch_or_fail() {
    assert_eq!(
        hash_name("Box001", "MurmurHash3_32").unwrap(),
        HashValue(0x6d15_e631)
    );
    assert!(matches!(
        hash_name("Box001", "BadHash"),
        Err(CryptomatteError::UnsupportedHashMethod(_))
    ));
    assert_eq!(
        hash_to_float(HashValue(7), "uint32_to_float32")
            .unwrap()
            .to_bits(),
        7
    );
    assert!(matches!(
        hash_to_float(HashValue(7), "float"),
        Err(CryptomatteError::UnsupportedConversionMethod(_))
    ));
}

#[test]
fn methods_serialize_with_attribute_names() {
    assert_eq!(
        serde_json::to_string(&HashMethod::MurmurHash3_32).unwrap(),
        "\"MurmurHash3_32\""
    );
    let conv: ConversionMethod = serde_json::from_str("\"uint32_to_float32\"").unwrap();
    assert_eq!(conv, ConversionMethod::Uint32ToFloat32);
}
