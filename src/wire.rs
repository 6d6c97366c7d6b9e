//! Length-prefixed, type-tagged binary codec for the plan-interpreter
//! bridge. Big-endian throughout. Grounded on `PlexilWrapper.cpp`'s
//! `serialize*`/`deSerialize*` function family: scalar bool/int/real/string
//! plus their array forms, arrays carrying a "known" bitvector ahead of the
//! element payloads (an unknown array element is skipped on write and
//! decoded as `None` on read, mirroring the original's `known[]` side
//! channel).

use thiserror::Error;

const TYPE_BOOL: u8 = 1;
const TYPE_INT: u8 = 2;
const TYPE_REAL: u8 = 3;
const TYPE_STRING: u8 = 4;
const TYPE_BOOL_ARRAY: u8 = 5;
const TYPE_INT_ARRAY: u8 = 6;
const TYPE_REAL_ARRAY: u8 = 7;

#[derive(Debug, Error, PartialEq)]
pub enum WireError {
    #[error("buffer too short: need {need} bytes, have {have}")]
    Truncated { need: usize, have: usize },
    #[error("unknown type tag {0}")]
    UnknownType(u8),
    #[error("array length {0} exceeds u24 range")]
    ArrayTooLarge(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub enum WireValue {
    Bool(bool),
    Int(i32),
    Real(f64),
    Str(String),
    BoolArray(Vec<Option<bool>>),
    IntArray(Vec<Option<i32>>),
    RealArray(Vec<Option<f64>>),
}

impl WireValue {
    pub fn serialize(&self) -> Vec<u8> {
        match self {
            WireValue::Bool(v) => {
                let mut out = vec![TYPE_BOOL];
                out.push(*v as u8);
                out
            }
            WireValue::Int(v) => {
                let mut out = vec![TYPE_INT];
                out.extend_from_slice(&v.to_be_bytes());
                out
            }
            WireValue::Real(v) => {
                let mut out = vec![TYPE_REAL];
                out.extend_from_slice(&v.to_be_bytes());
                out
            }
            WireValue::Str(s) => {
                let mut out = vec![TYPE_STRING];
                out.extend_from_slice(&u24_bytes(s.len()).expect("string length fits u24"));
                out.extend_from_slice(s.as_bytes());
                out
            }
            WireValue::BoolArray(items) => serialize_array(TYPE_BOOL_ARRAY, items, |v, out| out.push(*v as u8)),
            WireValue::IntArray(items) => serialize_array(TYPE_INT_ARRAY, items, |v, out| out.extend_from_slice(&v.to_be_bytes())),
            WireValue::RealArray(items) => serialize_array(TYPE_REAL_ARRAY, items, |v, out| out.extend_from_slice(&v.to_be_bytes())),
        }
    }

    /// Parses one value from the front of `buf`, returning it and the number
    /// of bytes consumed so the caller can advance past it in a stream of
    /// concatenated values.
    pub fn deserialize(buf: &[u8]) -> Result<(WireValue, usize), WireError> {
        let tag = *buf.first().ok_or(WireError::Truncated { need: 1, have: buf.len() })?;
        match tag {
            TYPE_BOOL => {
                require(buf, 2)?;
                Ok((WireValue::Bool(buf[1] != 0), 2))
            }
            TYPE_INT => {
                require(buf, 5)?;
                Ok((WireValue::Int(i32::from_be_bytes(buf[1..5].try_into().unwrap())), 5))
            }
            TYPE_REAL => {
                require(buf, 9)?;
                Ok((WireValue::Real(f64::from_be_bytes(buf[1..9].try_into().unwrap())), 9))
            }
            TYPE_STRING => {
                require(buf, 4)?;
                let len = u24_from_bytes(&buf[1..4]);
                require(buf, 4 + len)?;
                let s = String::from_utf8_lossy(&buf[4..4 + len]).into_owned();
                Ok((WireValue::Str(s), 4 + len))
            }
            TYPE_BOOL_ARRAY => {
                let (known, mut offset, len) = read_array_header(buf)?;
                let mut items = Vec::with_capacity(len);
                for k in &known {
                    if *k {
                        require(buf, offset + 1)?;
                        items.push(Some(buf[offset] != 0));
                        offset += 1;
                    } else {
                        items.push(None);
                    }
                }
                Ok((WireValue::BoolArray(items), offset))
            }
            TYPE_INT_ARRAY => {
                let (known, mut offset, len) = read_array_header(buf)?;
                let mut items = Vec::with_capacity(len);
                for k in &known {
                    if *k {
                        require(buf, offset + 4)?;
                        items.push(Some(i32::from_be_bytes(buf[offset..offset + 4].try_into().unwrap())));
                        offset += 4;
                    } else {
                        items.push(None);
                    }
                }
                Ok((WireValue::IntArray(items), offset))
            }
            TYPE_REAL_ARRAY => {
                let (known, mut offset, len) = read_array_header(buf)?;
                let mut items = Vec::with_capacity(len);
                for k in &known {
                    if *k {
                        require(buf, offset + 8)?;
                        items.push(Some(f64::from_be_bytes(buf[offset..offset + 8].try_into().unwrap())));
                        offset += 8;
                    } else {
                        items.push(None);
                    }
                }
                Ok((WireValue::RealArray(items), offset))
            }
            other => Err(WireError::UnknownType(other)),
        }
    }
}

fn serialize_array<T>(tag: u8, items: &[Option<T>], write_elem: impl Fn(&T, &mut Vec<u8>)) -> Vec<u8> {
    let len = items.len();
    let mut out = vec![tag];
    out.extend_from_slice(&u24_bytes(len).expect("array length fits u24"));
    let bitvector_len = (len + 7) / 8;
    let mut bitvector = vec![0u8; bitvector_len];
    for (i, item) in items.iter().enumerate() {
        if item.is_some() {
            bitvector[i / 8] |= 0x80 >> (i % 8);
        }
    }
    out.extend_from_slice(&bitvector);
    for item in items.iter().flatten() {
        write_elem(item, &mut out);
    }
    out
}

fn read_array_header(buf: &[u8]) -> Result<(Vec<bool>, usize, usize), WireError> {
    require(buf, 4)?;
    let len = u24_from_bytes(&buf[1..4]);
    let bitvector_len = (len + 7) / 8;
    require(buf, 4 + bitvector_len)?;
    let bitvector = &buf[4..4 + bitvector_len];
    let known: Vec<bool> = (0..len).map(|i| (bitvector[i / 8] & (0x80 >> (i % 8))) != 0).collect();
    Ok((known, 4 + bitvector_len, len))
}

fn u24_bytes(len: usize) -> Result<[u8; 3], WireError> {
    if len > 0xFF_FFFF {
        return Err(WireError::ArrayTooLarge(len));
    }
    let b = (len as u32).to_be_bytes();
    Ok([b[1], b[2], b[3]])
}

fn u24_from_bytes(b: &[u8]) -> usize {
    ((b[0] as usize) << 16) | ((b[1] as usize) << 8) | (b[2] as usize)
}

fn require(buf: &[u8], need: usize) -> Result<(), WireError> {
    if buf.len() < need {
        Err(WireError::Truncated { need, have: buf.len() })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(v: WireValue) -> WireValue {
        let bytes = v.serialize();
        let (decoded, consumed) = WireValue::deserialize(&bytes).unwrap();
        assert_eq!(consumed, bytes.len());
        decoded
    }

    #[test]
    fn scalar_roundtrips() {
        assert_eq!(roundtrip(WireValue::Bool(true)), WireValue::Bool(true));
        assert_eq!(roundtrip(WireValue::Int(-7)), WireValue::Int(-7));
        assert_eq!(roundtrip(WireValue::Real(3.142)), WireValue::Real(3.142));
        assert_eq!(roundtrip(WireValue::Str("hi".into())), WireValue::Str("hi".into()));
    }

    #[test]
    fn arrays_roundtrip_with_unknown_elements() {
        let bools = WireValue::BoolArray(vec![Some(false), Some(true), None]);
        assert_eq!(roundtrip(bools.clone()), bools);
        let ints = WireValue::IntArray(vec![Some(5), Some(4), Some(3), Some(2), Some(1)]);
        assert_eq!(roundtrip(ints.clone()), ints);
        let reals = WireValue::RealArray(vec![Some(3.12), None, Some(1.5)]);
        assert_eq!(roundtrip(reals.clone()), reals);
    }

    #[test]
    fn concatenated_values_decode_in_sequence() {
        let mut buf = Vec::new();
        buf.extend(WireValue::Bool(true).serialize());
        buf.extend(WireValue::Int(7).serialize());
        let (first, consumed1) = WireValue::deserialize(&buf).unwrap();
        let (second, _) = WireValue::deserialize(&buf[consumed1..]).unwrap();
        assert_eq!(first, WireValue::Bool(true));
        assert_eq!(second, WireValue::Int(7));
    }

    #[test]
    fn truncated_buffer_reports_error() {
        let err = WireValue::deserialize(&[TYPE_INT, 0, 0]).unwrap_err();
        assert!(matches!(err, WireError::Truncated { .. }));
    }

    #[test]
    fn full_scenario_s5_round_trips_byte_exactly() {
        let values = vec![
            WireValue::Bool(true),
            WireValue::Int(7),
            WireValue::Real(3.142),
            WireValue::Str("hi".into()),
            WireValue::BoolArray(vec![Some(false), Some(true)]),
            WireValue::IntArray(vec![Some(5), Some(4), Some(3), Some(2), Some(1)]),
            WireValue::RealArray(vec![Some(3.12), Some(2.236), Some(1.5)]),
        ];
        let mut buf = Vec::new();
        for v in &values {
            buf.extend(v.serialize());
        }
        let mut offset = 0;
        for expected in &values {
            let (decoded, consumed) = WireValue::deserialize(&buf[offset..]).unwrap();
            assert_eq!(&decoded, expected);
            offset += consumed;
        }
        assert_eq!(offset, buf.len());
    }
}
