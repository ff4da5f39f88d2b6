//! Structured value codec: nested values <-> (skeleton text, buffer list).
//!
//! `encode` walks a [`Value`] tree and produces a JSON-safe skeleton plus an
//! ordered side list of raw binary buffers. Scalars, lists, strings, and
//! booleans pass through structurally; everything JSON cannot express
//! natively becomes a tagged object:
//!
//! ```text
//! tuple    {"type": "tuple",   "items": [...]}
//! mapping  {"type": "mapping", "pairs": [[key, value], ...]}
//! array    {"type": "array",   "dtype": "...", "shape": [...], "index": n}
//! ```
//!
//! Mappings always use the pair-list form, even with all-string keys, so a
//! user key named `"type"` can never collide with a tag object. Array
//! placeholders index into the buffer list; indices are assigned in
//! encounter order and are therefore a contiguous 0-based range.
//!
//! Wide integer arrays are narrowed on encode: int64, uint64, and uint32
//! data is stored as int32 (elementwise wrapping cast). This is a wire-size
//! reduction, not a numeric library; values outside the int32 range do not
//! round-trip. All other dtypes pass through unchanged.

use bytes::Bytes;
use serde_json::{json, Number, Value as Json};

use crate::error::{BoundaryError, Result};

/// Element type of a packed numeric array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dtype {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
}

impl Dtype {
    /// Wire name of this dtype.
    pub fn name(self) -> &'static str {
        match self {
            Dtype::Bool => "bool",
            Dtype::I8 => "int8",
            Dtype::I16 => "int16",
            Dtype::I32 => "int32",
            Dtype::I64 => "int64",
            Dtype::U8 => "uint8",
            Dtype::U16 => "uint16",
            Dtype::U32 => "uint32",
            Dtype::U64 => "uint64",
            Dtype::F32 => "float32",
            Dtype::F64 => "float64",
        }
    }

    /// Parse a wire dtype name.
    pub fn parse(name: &str) -> Result<Self> {
        Ok(match name {
            "bool" => Dtype::Bool,
            "int8" => Dtype::I8,
            "int16" => Dtype::I16,
            "int32" => Dtype::I32,
            "int64" => Dtype::I64,
            "uint8" => Dtype::U8,
            "uint16" => Dtype::U16,
            "uint32" => Dtype::U32,
            "uint64" => Dtype::U64,
            "float32" => Dtype::F32,
            "float64" => Dtype::F64,
            other => return Err(BoundaryError::protocol(format!("unknown dtype: {other}"))),
        })
    }

    /// Size of one element in bytes.
    pub fn element_size(self) -> usize {
        match self {
            Dtype::Bool | Dtype::I8 | Dtype::U8 => 1,
            Dtype::I16 | Dtype::U16 => 2,
            Dtype::I32 | Dtype::U32 | Dtype::F32 => 4,
            Dtype::I64 | Dtype::U64 | Dtype::F64 => 8,
        }
    }
}

/// A packed numeric array: dtype + shape + raw little-endian bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayData {
    pub dtype: Dtype,
    pub shape: Vec<u64>,
    pub data: Bytes,
}

macro_rules! array_from {
    ($name:ident, $ty:ty, $dtype:expr) => {
        /// Pack a slice into an array of the matching dtype.
        pub fn $name(shape: impl Into<Vec<u64>>, values: &[$ty]) -> Result<Self> {
            let mut data = Vec::with_capacity(values.len() * std::mem::size_of::<$ty>());
            for v in values {
                data.extend_from_slice(&v.to_le_bytes());
            }
            Self::new($dtype, shape.into(), Bytes::from(data))
        }
    };
}

impl ArrayData {
    /// Build an array, checking that the byte length matches shape x dtype.
    pub fn new(dtype: Dtype, shape: Vec<u64>, data: Bytes) -> Result<Self> {
        let elements = shape
            .iter()
            .try_fold(1u64, |acc, &d| acc.checked_mul(d))
            .ok_or_else(|| BoundaryError::protocol("array shape overflows"))?;
        let expected = (elements as usize)
            .checked_mul(dtype.element_size())
            .ok_or_else(|| BoundaryError::protocol("array byte length overflows"))?;
        if data.len() != expected {
            return Err(BoundaryError::protocol(format!(
                "array data is {} bytes, shape {:?} of {} requires {}",
                data.len(),
                shape,
                dtype.name(),
                expected
            )));
        }
        Ok(Self { dtype, shape, data })
    }

    array_from!(from_i16, i16, Dtype::I16);
    array_from!(from_i32, i32, Dtype::I32);
    array_from!(from_i64, i64, Dtype::I64);
    array_from!(from_u32, u32, Dtype::U32);
    array_from!(from_u64, u64, Dtype::U64);
    array_from!(from_f32, f32, Dtype::F32);
    array_from!(from_f64, f64, Dtype::F64);

    /// Pack a bool slice (one byte per element).
    pub fn from_bool(shape: impl Into<Vec<u64>>, values: &[bool]) -> Result<Self> {
        let data: Vec<u8> = values.iter().map(|&b| b as u8).collect();
        Self::new(Dtype::Bool, shape.into(), Bytes::from(data))
    }
}

/// An arbitrary nested structured value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    /// Distinguishable from `List`; round-trips as a tuple.
    Tuple(Vec<Value>),
    /// Keys may be any `Value`, tuples included.
    Map(Vec<(Value, Value)>),
    Array(ArrayData),
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<ArrayData> for Value {
    fn from(a: ArrayData) -> Self {
        Value::Array(a)
    }
}

/// Encode a value into (skeleton text, buffer list).
pub fn encode(value: &Value) -> Result<(String, Vec<Bytes>)> {
    let mut buffers = Vec::new();
    let skeleton = encode_node(value, &mut buffers)?;
    let text = serde_json::to_string(&skeleton)
        .map_err(|e| BoundaryError::protocol(format!("skeleton serialization: {e}")))?;
    Ok((text, buffers))
}

/// Decode (skeleton text, buffer list) back into a value.
pub fn decode(skeleton: &str, buffers: &[Bytes]) -> Result<Value> {
    let node: Json = serde_json::from_str(skeleton)
        .map_err(|e| BoundaryError::protocol(format!("undecodable skeleton: {e}")))?;
    decode_node(&node, buffers)
}

fn encode_node(value: &Value, buffers: &mut Vec<Bytes>) -> Result<Json> {
    Ok(match value {
        Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Int(i) => Json::Number(Number::from(*i)),
        Value::Float(f) => Json::Number(
            Number::from_f64(*f)
                .ok_or_else(|| BoundaryError::protocol("non-finite float in value"))?,
        ),
        Value::Str(s) => Json::String(s.clone()),
        Value::List(items) => {
            let mut enc = Vec::with_capacity(items.len());
            for item in items {
                enc.push(encode_node(item, buffers)?);
            }
            Json::Array(enc)
        }
        Value::Tuple(items) => {
            let mut enc = Vec::with_capacity(items.len());
            for item in items {
                enc.push(encode_node(item, buffers)?);
            }
            json!({ "type": "tuple", "items": enc })
        }
        Value::Map(pairs) => {
            let mut enc = Vec::with_capacity(pairs.len());
            for (key, val) in pairs {
                enc.push(Json::Array(vec![
                    encode_node(key, buffers)?,
                    encode_node(val, buffers)?,
                ]));
            }
            json!({ "type": "mapping", "pairs": enc })
        }
        Value::Array(array) => {
            let array = narrowed(array)?;
            let index = buffers.len();
            let node = json!({
                "type": "array",
                "dtype": array.dtype.name(),
                "shape": array.shape,
                "index": index,
            });
            buffers.push(array.data);
            node
        }
    })
}

fn decode_node(node: &Json, buffers: &[Bytes]) -> Result<Value> {
    Ok(match node {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(*b),
        Json::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int(i)
            } else if let Some(f) = n.as_f64() {
                Value::Float(f)
            } else {
                return Err(BoundaryError::protocol(format!("number out of range: {n}")));
            }
        }
        Json::String(s) => Value::Str(s.clone()),
        Json::Array(items) => {
            let mut dec = Vec::with_capacity(items.len());
            for item in items {
                dec.push(decode_node(item, buffers)?);
            }
            Value::List(dec)
        }
        Json::Object(obj) => {
            let tag = obj
                .get("type")
                .and_then(Json::as_str)
                .ok_or_else(|| BoundaryError::protocol("skeleton object without type tag"))?;
            match tag {
                "tuple" => {
                    let items = obj
                        .get("items")
                        .and_then(Json::as_array)
                        .ok_or_else(|| BoundaryError::protocol("tuple node without items"))?;
                    let mut dec = Vec::with_capacity(items.len());
                    for item in items {
                        dec.push(decode_node(item, buffers)?);
                    }
                    Value::Tuple(dec)
                }
                "mapping" => {
                    let pairs = obj
                        .get("pairs")
                        .and_then(Json::as_array)
                        .ok_or_else(|| BoundaryError::protocol("mapping node without pairs"))?;
                    let mut dec = Vec::with_capacity(pairs.len());
                    for pair in pairs {
                        let Some([key, val]) = pair.as_array().map(Vec::as_slice) else {
                            return Err(BoundaryError::protocol(
                                "mapping pair is not a 2-element list",
                            ));
                        };
                        dec.push((decode_node(key, buffers)?, decode_node(val, buffers)?));
                    }
                    Value::Map(dec)
                }
                "array" => Value::Array(decode_array(obj, buffers)?),
                other => {
                    return Err(BoundaryError::protocol(format!(
                        "unknown skeleton tag: {other}"
                    )))
                }
            }
        }
    })
}

fn decode_array(obj: &serde_json::Map<String, Json>, buffers: &[Bytes]) -> Result<ArrayData> {
    let dtype = obj
        .get("dtype")
        .and_then(Json::as_str)
        .ok_or_else(|| BoundaryError::protocol("array node without dtype"))
        .and_then(Dtype::parse)?;
    let shape = obj
        .get("shape")
        .and_then(Json::as_array)
        .ok_or_else(|| BoundaryError::protocol("array node without shape"))?
        .iter()
        .map(|d| {
            d.as_u64()
                .ok_or_else(|| BoundaryError::protocol("array shape dimension is not a u64"))
        })
        .collect::<Result<Vec<u64>>>()?;
    let index = obj
        .get("index")
        .and_then(Json::as_u64)
        .ok_or_else(|| BoundaryError::protocol("array node without buffer index"))?
        as usize;
    let data = buffers
        .get(index)
        .cloned()
        .ok_or_else(|| {
            BoundaryError::protocol(format!(
                "buffer index {index} out of range ({} buffers)",
                buffers.len()
            ))
        })?;
    ArrayData::new(dtype, shape, data)
}

/// Apply the wire narrowing rule: int64/uint64/uint32 arrays become int32.
fn narrowed(array: &ArrayData) -> Result<ArrayData> {
    let (dtype, data) = match array.dtype {
        Dtype::I64 => (
            Dtype::I32,
            narrow_chunks::<8>(&array.data, |b| i64::from_le_bytes(b) as i32),
        ),
        Dtype::U64 => (
            Dtype::I32,
            narrow_chunks::<8>(&array.data, |b| u64::from_le_bytes(b) as i32),
        ),
        Dtype::U32 => (
            Dtype::I32,
            narrow_chunks::<4>(&array.data, |b| u32::from_le_bytes(b) as i32),
        ),
        _ => return Ok(array.clone()),
    };
    ArrayData::new(dtype, array.shape.clone(), data)
}

fn narrow_chunks<const N: usize>(data: &[u8], cast: impl Fn([u8; N]) -> i32) -> Bytes {
    let mut out = Vec::with_capacity(data.len() / N * 4);
    for chunk in data.chunks_exact(N) {
        let mut raw = [0u8; N];
        raw.copy_from_slice(chunk);
        out.extend_from_slice(&cast(raw).to_le_bytes());
    }
    Bytes::from(out)
}
