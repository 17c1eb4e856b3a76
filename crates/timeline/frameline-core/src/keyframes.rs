//! Decoder for per-frame property keyframe data.
//!
//! Keyframes arrive either as an already-structured frame → property-set map
//! or in a compact single-letter-coded string format. The compact format is a
//! concatenation of per-frame records: a bare frame index, then zero or more
//! `<code><value>` pairs, with a space terminating the record. For example
//! `"0x100y100 10x150"` holds x/y at frame 0 and a new x at frame 10.

use std::collections::BTreeMap;

use crate::error::TimelineError;
use crate::properties::PropertySet;
use crate::FrameIndex;

/// Code letters of the compact keyframe format, in property order: position
/// x/y, scale x/y, skew x/y, rotation, alpha, tint, color transform,
/// visibility.
///
/// Immutable; the decoder owns this table and nothing else mutates it.
/// `f` values are comma-separated float lists, `v` values are integer
/// booleans, everything else parses as a float.
pub const CODE_ALPHABET: &[char] = &['x', 'y', 'a', 'b', 'c', 'd', 'r', 'l', 't', 'f', 'v'];

/// Keyframe input accepted by registration: compact string or structured map.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyframeData {
    Compact(String),
    Frames(BTreeMap<FrameIndex, PropertySet>),
}

impl KeyframeData {
    /// Normalize into the structured form, decoding compact strings.
    pub fn into_frames(self) -> Result<BTreeMap<FrameIndex, PropertySet>, TimelineError> {
        match self {
            KeyframeData::Compact(source) => decode_compact(&source),
            KeyframeData::Frames(frames) => Ok(frames),
        }
    }

    /// Interpret a loose JSON value: a string is compact data, an object maps
    /// frame indices to property objects.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, TimelineError> {
        if let Some(source) = value.as_str() {
            return Ok(KeyframeData::Compact(source.to_string()));
        }
        let object = value
            .as_object()
            .ok_or_else(|| TimelineError::InvalidProperty {
                property: "keyframes".into(),
                reason: "expected a compact string or a frame map".into(),
            })?;
        let mut frames = BTreeMap::new();
        for (key, entry) in object {
            let frame: FrameIndex =
                key.parse().map_err(|_| TimelineError::InvalidProperty {
                    property: "keyframes".into(),
                    reason: format!("invalid frame index '{key}'"),
                })?;
            frames.insert(frame, PropertySet::from_json(entry)?);
        }
        Ok(KeyframeData::Frames(frames))
    }
}

impl From<&str> for KeyframeData {
    fn from(source: &str) -> Self {
        KeyframeData::Compact(source.to_string())
    }
}

impl From<String> for KeyframeData {
    fn from(source: String) -> Self {
        KeyframeData::Compact(source)
    }
}

impl From<BTreeMap<FrameIndex, PropertySet>> for KeyframeData {
    fn from(frames: BTreeMap<FrameIndex, PropertySet>) -> Self {
        KeyframeData::Frames(frames)
    }
}

/// Decode the compact keyframe string format.
///
/// Duplicate frame records merge field-wise. Unrecognized code letters and
/// malformed numbers are hard errors carrying the byte offset; corrupt
/// animation data must not silently produce wrong visuals.
pub fn decode_compact(source: &str) -> Result<BTreeMap<FrameIndex, PropertySet>, TimelineError> {
    // The format is ASCII; rejecting anything else up front keeps the byte
    // cursor on character boundaries.
    if let Some(offset) = source.bytes().position(|b| !b.is_ascii()) {
        return Err(TimelineError::KeyframeDecode {
            offset,
            reason: "non-ASCII byte".into(),
        });
    }

    let bytes = source.as_bytes();
    let mut frames: BTreeMap<FrameIndex, PropertySet> = BTreeMap::new();
    let mut i = 0;

    while i < bytes.len() {
        // Record separator.
        while i < bytes.len() && bytes[i] == b' ' {
            i += 1;
        }
        if i >= bytes.len() {
            break;
        }

        // Frame index token.
        let digits_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if digits_start == i {
            return Err(TimelineError::KeyframeDecode {
                offset: i,
                reason: "expected a frame index".into(),
            });
        }
        let frame: FrameIndex =
            source[digits_start..i]
                .parse()
                .map_err(|_| TimelineError::KeyframeDecode {
                    offset: digits_start,
                    reason: "frame index out of range".into(),
                })?;

        let record = frames.entry(frame).or_default();

        // Code/value pairs until the next record.
        while i < bytes.len() && bytes[i] != b' ' {
            let code = bytes[i] as char;
            let code_offset = i;
            i += 1;

            // A value runs up to the next code letter or a space.
            let value_start = i;
            while i < bytes.len() && bytes[i] != b' ' && !CODE_ALPHABET.contains(&(bytes[i] as char))
            {
                i += 1;
            }
            let literal = &source[value_start..i];
            apply_code(record, code, literal, code_offset)?;
        }
    }

    Ok(frames)
}

fn apply_code(
    record: &mut PropertySet,
    code: char,
    literal: &str,
    offset: usize,
) -> Result<(), TimelineError> {
    match code {
        'x' => record.x = Some(parse_float(literal, offset)?),
        'y' => record.y = Some(parse_float(literal, offset)?),
        'a' => record.scale_x = Some(parse_float(literal, offset)?),
        'b' => record.scale_y = Some(parse_float(literal, offset)?),
        'c' => record.skew_x = Some(parse_float(literal, offset)?),
        'd' => record.skew_y = Some(parse_float(literal, offset)?),
        'r' => record.rotation = Some(parse_float(literal, offset)?),
        'l' => record.alpha = Some(parse_float(literal, offset)?),
        't' => record.tint = Some(parse_float(literal, offset)? as u32),
        'f' => {
            let values = literal
                .split(',')
                .map(|part| parse_float(part, offset))
                .collect::<Result<Vec<f64>, _>>()?;
            record.color_transform = Some(values);
        }
        'v' => {
            let flag: i64 = literal
                .parse()
                .map_err(|_| TimelineError::KeyframeDecode {
                    offset,
                    reason: format!("expected an integer visibility flag, got '{literal}'"),
                })?;
            record.visible = Some(flag != 0);
        }
        other => {
            return Err(TimelineError::KeyframeDecode {
                offset,
                reason: format!("unrecognized code letter '{other}'"),
            });
        }
    }
    Ok(())
}

fn parse_float(literal: &str, offset: usize) -> Result<f64, TimelineError> {
    literal.parse().map_err(|_| TimelineError::KeyframeDecode {
        offset,
        reason: format!("expected a number, got '{literal}'"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_round_trip() {
        let frames = decode_compact("0x100y100 10x150").unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[&0].x, Some(100.0));
        assert_eq!(frames[&0].y, Some(100.0));
        assert_eq!(frames[&10].x, Some(150.0));
        assert_eq!(frames[&10].y, None);
    }

    #[test]
    fn test_decode_full_alphabet() {
        let frames = decode_compact("0x1y2a1.5b1.5c0.1d0.2r45l0.5t16711680f1,0,1,0,1,0v0").unwrap();
        let record = &frames[&0];
        assert_eq!(record.scale_x, Some(1.5));
        assert_eq!(record.skew_y, Some(0.2));
        assert_eq!(record.rotation, Some(45.0));
        assert_eq!(record.alpha, Some(0.5));
        assert_eq!(record.tint, Some(0xFF0000));
        assert_eq!(record.color_transform.as_ref().map(Vec::len), Some(6));
        assert_eq!(record.visible, Some(false));
    }

    #[test]
    fn test_decode_negative_and_decimal_values() {
        let frames = decode_compact("3x-12.5y0.25").unwrap();
        assert_eq!(frames[&3].x, Some(-12.5));
        assert_eq!(frames[&3].y, Some(0.25));
    }

    #[test]
    fn test_decode_merges_duplicate_frames() {
        let frames = decode_compact("0x1 0y2").unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[&0].x, Some(1.0));
        assert_eq!(frames[&0].y, Some(2.0));
    }

    #[test]
    fn test_unrecognized_code_is_hard_error() {
        let err = decode_compact("0q5").unwrap_err();
        match err {
            TimelineError::KeyframeDecode { offset, reason } => {
                assert_eq!(offset, 1);
                assert!(reason.contains('q'));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_frame_index_is_hard_error() {
        assert!(decode_compact("x100").is_err());
    }

    #[test]
    fn test_non_ascii_input_is_hard_error() {
        assert!(decode_compact("0é5").is_err());
    }

    #[test]
    fn test_malformed_value_is_hard_error() {
        assert!(decode_compact("0x").is_err());
        assert!(decode_compact("0v1.5").is_err());
    }

    #[test]
    fn test_from_json_structured() {
        let data = KeyframeData::from_json(&serde_json::json!({
            "0": { "x": 1.0 },
            "12": { "alpha": 0.0 }
        }))
        .unwrap();
        let frames = data.into_frames().unwrap();
        assert_eq!(frames[&0].x, Some(1.0));
        assert_eq!(frames[&12].alpha, Some(0.0));
    }
}
