//! Codec round-trip and narrowing tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use boundary_core::codec::{decode, encode, ArrayData, Dtype, Value};

fn map(pairs: Vec<(Value, Value)>) -> Value {
    Value::Map(pairs)
}

fn tuple(items: Vec<Value>) -> Value {
    Value::Tuple(items)
}

fn roundtrip(value: Value) {
    let (skeleton, buffers) = encode(&value).unwrap();
    let back = decode(&skeleton, &buffers).unwrap();
    assert_eq!(back, value, "skeleton was: {skeleton}");
}

#[test]
fn scalar_shapes_roundtrip() {
    roundtrip(map(vec![("k".into(), "v".into())]));
    roundtrip(map(vec![(
        "k".into(),
        tuple(vec![1i64.into(), 2i64.into(), 3i64.into()]),
    )]));
    roundtrip(Value::List(vec![
        Value::Null,
        true.into(),
        (-7i64).into(),
        2.5f64.into(),
    ]));
}

#[test]
fn tuple_keys_roundtrip() {
    roundtrip(map(vec![(
        tuple(vec![1i64.into(), 2i64.into(), 3i64.into()]),
        "k".into(),
    )]));
}

#[test]
fn int_keys_roundtrip() {
    roundtrip(map(vec![(
        1i64.into(),
        map(vec![("k".into(), "v".into())]),
    )]));
}

#[test]
fn nested_mixed_containers_roundtrip() {
    roundtrip(map(vec![(
        "k".into(),
        Value::List(vec![
            map(vec![(1i64.into(), 2i64.into())]),
            map(vec![(3i64.into(), 4i64.into())]),
        ]),
    )]));
    roundtrip(map(vec![(
        "k".into(),
        tuple(vec![tuple(vec![
            1i64.into(),
            2i64.into(),
            map(vec![("k1".into(), "v1".into())]),
        ])]),
    )]));
}

#[test]
fn tuple_is_not_a_list() {
    let t = tuple(vec![1i64.into(), 2i64.into()]);
    let (skeleton, buffers) = encode(&t).unwrap();
    let back = decode(&skeleton, &buffers).unwrap();
    assert_eq!(back, t);
    assert_ne!(back, Value::List(vec![1i64.into(), 2i64.into()]));
}

#[test]
fn float_array_roundtrip() {
    let values: Vec<f64> = (0..40).map(|i| i as f64 / 7.0).collect();
    let array = ArrayData::from_f64(vec![5, 8], &values).unwrap();
    roundtrip(map(vec![("k".into(), array.into())]));
}

#[test]
fn bool_array_roundtrip() {
    let values: Vec<bool> = (0..21).map(|i| i % 3 == 0).collect();
    let array = ArrayData::from_bool(vec![7, 3], &values).unwrap();
    roundtrip(map(vec![("k".into(), array.into())]));
}

#[test]
fn wide_int_arrays_narrow_to_int32() {
    let source: Vec<i64> = (0..10).collect();

    let as_i64 = ArrayData::from_i64(vec![10], &source).unwrap();
    let as_u64 = ArrayData::from_u64(vec![10], &(0u64..10).collect::<Vec<_>>()).unwrap();
    let as_u32 = ArrayData::from_u32(vec![10], &(0u32..10).collect::<Vec<_>>()).unwrap();

    let expected = ArrayData::from_i32(vec![10], &(0i32..10).collect::<Vec<_>>()).unwrap();
    for wide in [as_i64, as_u64, as_u32] {
        let (skeleton, buffers) = encode(&map(vec![("foo".into(), wide.into())])).unwrap();
        let back = decode(&skeleton, &buffers).unwrap();
        assert_eq!(back, map(vec![("foo".into(), expected.clone().into())]));
    }
}

#[test]
fn narrowing_wraps_out_of_range_values() {
    let big = ArrayData::from_i64(vec![2], &[i64::from(i32::MAX) + 1, -1]).unwrap();
    let (skeleton, buffers) = encode(&Value::Array(big)).unwrap();
    let back = decode(&skeleton, &buffers).unwrap();
    let expected = ArrayData::from_i32(vec![2], &[i32::MIN, -1]).unwrap();
    assert_eq!(back, Value::Array(expected));
}

#[test]
fn int16_passes_through_unchanged() {
    let array = ArrayData::from_i16(vec![10], &(0i16..10).collect::<Vec<_>>()).unwrap();
    let (skeleton, buffers) = encode(&map(vec![("foo".into(), array.clone().into())])).unwrap();
    let back = decode(&skeleton, &buffers).unwrap();
    match back {
        Value::Map(ref pairs) => match &pairs[0].1 {
            Value::Array(a) => assert_eq!(a.dtype, Dtype::I16),
            other => panic!("expected array, got {other:?}"),
        },
        other => panic!("expected map, got {other:?}"),
    }
    assert_eq!(back, map(vec![("foo".into(), array.into())]));
}

#[test]
fn buffer_indices_are_contiguous() {
    let a = ArrayData::from_i32(vec![3], &[1, 2, 3]).unwrap();
    let b = ArrayData::from_f64(vec![2], &[0.5, 1.5]).unwrap();
    let value = Value::List(vec![a.into(), map(vec![("x".into(), b.into())])]);
    let (skeleton, buffers) = encode(&value).unwrap();
    assert_eq!(buffers.len(), 2);
    assert!(skeleton.contains("\"index\":0"));
    assert!(skeleton.contains("\"index\":1"));
    assert_eq!(decode(&skeleton, &buffers).unwrap(), value);
}

#[test]
fn untagged_object_is_rejected() {
    let err = decode(r#"{"k": "v"}"#, &[]).unwrap_err();
    assert!(err.to_string().contains("type tag"), "{err}");
}

#[test]
fn unknown_dtype_is_rejected() {
    let skeleton = r#"{"type":"array","dtype":"complex128","shape":[1],"index":0}"#;
    let err = decode(skeleton, &[bytes::Bytes::from_static(&[0u8; 16])]).unwrap_err();
    assert!(err.to_string().contains("unknown dtype"), "{err}");
}

#[test]
fn dangling_buffer_index_is_rejected() {
    let skeleton = r#"{"type":"array","dtype":"int32","shape":[1],"index":3}"#;
    let err = decode(skeleton, &[]).unwrap_err();
    assert!(err.to_string().contains("out of range"), "{err}");
}

#[test]
fn shape_data_mismatch_is_rejected() {
    let skeleton = r#"{"type":"array","dtype":"int32","shape":[4],"index":0}"#;
    let err = decode(skeleton, &[bytes::Bytes::from_static(&[0u8; 4])]).unwrap_err();
    assert!(err.to_string().contains("requires"), "{err}");
}
