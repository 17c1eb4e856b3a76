//! Display-node properties and the partial property sets carried by
//! keyframes and tweens.

use serde::{Deserialize, Serialize};

use crate::error::TimelineError;

/// Default tint (no tinting applied).
pub const NO_TINT: u32 = 0xFF_FF_FF;

/// Concrete property block of a display node.
///
/// This is the state tween segments mutate; the engine itself never
/// interprets the values beyond storing them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayProps {
    pub x: f64,
    pub y: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    pub skew_x: f64,
    pub skew_y: f64,
    pub rotation: f64,
    pub alpha: f64,
    pub tint: u32,
    pub color_transform: Option<Vec<f64>>,
    pub visible: bool,
}

impl Default for DisplayProps {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            skew_x: 0.0,
            skew_y: 0.0,
            rotation: 0.0,
            alpha: 1.0,
            tint: NO_TINT,
            color_transform: None,
            visible: true,
        }
    }
}

/// Partial property map: one decoded keyframe record, or the target values of
/// a tween segment. Unset fields leave the node untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropertySet {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub scale_x: Option<f64>,
    pub scale_y: Option<f64>,
    pub skew_x: Option<f64>,
    pub skew_y: Option<f64>,
    pub rotation: Option<f64>,
    pub alpha: Option<f64>,
    pub tint: Option<u32>,
    pub color_transform: Option<Vec<f64>>,
    pub visible: Option<bool>,
}

impl PropertySet {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no field is set.
    pub fn is_empty(&self) -> bool {
        self.x.is_none()
            && self.y.is_none()
            && self.scale_x.is_none()
            && self.scale_y.is_none()
            && self.skew_x.is_none()
            && self.skew_y.is_none()
            && self.rotation.is_none()
            && self.alpha.is_none()
            && self.tint.is_none()
            && self.color_transform.is_none()
            && self.visible.is_none()
    }

    /// Overlay `other` on top of this set; set fields in `other` win.
    pub fn merge(&mut self, other: &PropertySet) {
        if other.x.is_some() {
            self.x = other.x;
        }
        if other.y.is_some() {
            self.y = other.y;
        }
        if other.scale_x.is_some() {
            self.scale_x = other.scale_x;
        }
        if other.scale_y.is_some() {
            self.scale_y = other.scale_y;
        }
        if other.skew_x.is_some() {
            self.skew_x = other.skew_x;
        }
        if other.skew_y.is_some() {
            self.skew_y = other.skew_y;
        }
        if other.rotation.is_some() {
            self.rotation = other.rotation;
        }
        if other.alpha.is_some() {
            self.alpha = other.alpha;
        }
        if other.tint.is_some() {
            self.tint = other.tint;
        }
        if other.color_transform.is_some() {
            self.color_transform = other.color_transform.clone();
        }
        if other.visible.is_some() {
            self.visible = other.visible;
        }
    }

    /// Capture from `props` the fields that are set in `mask`.
    ///
    /// Used by tween segments to record their starting values on first
    /// application.
    pub fn snapshot(props: &DisplayProps, mask: &PropertySet) -> Self {
        Self {
            x: mask.x.map(|_| props.x),
            y: mask.y.map(|_| props.y),
            scale_x: mask.scale_x.map(|_| props.scale_x),
            scale_y: mask.scale_y.map(|_| props.scale_y),
            skew_x: mask.skew_x.map(|_| props.skew_x),
            skew_y: mask.skew_y.map(|_| props.skew_y),
            rotation: mask.rotation.map(|_| props.rotation),
            alpha: mask.alpha.map(|_| props.alpha),
            tint: mask.tint.map(|_| props.tint),
            color_transform: mask
                .color_transform
                .as_ref()
                .map(|_| props.color_transform.clone().unwrap_or_default()),
            visible: mask.visible.map(|_| props.visible),
        }
    }

    /// Write every set field into `props` verbatim.
    pub fn apply_to(&self, props: &mut DisplayProps) {
        if let Some(x) = self.x {
            props.x = x;
        }
        if let Some(y) = self.y {
            props.y = y;
        }
        if let Some(scale_x) = self.scale_x {
            props.scale_x = scale_x;
        }
        if let Some(scale_y) = self.scale_y {
            props.scale_y = scale_y;
        }
        if let Some(skew_x) = self.skew_x {
            props.skew_x = skew_x;
        }
        if let Some(skew_y) = self.skew_y {
            props.skew_y = skew_y;
        }
        if let Some(rotation) = self.rotation {
            props.rotation = rotation;
        }
        if let Some(alpha) = self.alpha {
            props.alpha = alpha;
        }
        if let Some(tint) = self.tint {
            props.tint = tint;
        }
        if let Some(ct) = &self.color_transform {
            props.color_transform = Some(ct.clone());
        }
        if let Some(visible) = self.visible {
            props.visible = visible;
        }
    }

    /// Build a property set from a loose JSON object, coercing the forms
    /// authoring data uses: hex-string color tints and numeric visibility
    /// flags become their typed representations.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, TimelineError> {
        let object = value
            .as_object()
            .ok_or_else(|| TimelineError::InvalidProperty {
                property: "<root>".into(),
                reason: "expected an object".into(),
            })?;

        let mut set = PropertySet::new();
        for (key, entry) in object {
            match key.as_str() {
                "x" => set.x = Some(as_number(key, entry)?),
                "y" => set.y = Some(as_number(key, entry)?),
                "scale_x" => set.scale_x = Some(as_number(key, entry)?),
                "scale_y" => set.scale_y = Some(as_number(key, entry)?),
                "skew_x" => set.skew_x = Some(as_number(key, entry)?),
                "skew_y" => set.skew_y = Some(as_number(key, entry)?),
                "rotation" => set.rotation = Some(as_number(key, entry)?),
                "alpha" => set.alpha = Some(as_number(key, entry)?),
                "tint" => set.tint = Some(as_color(entry)?),
                "color_transform" => {
                    let values = entry
                        .as_array()
                        .ok_or_else(|| TimelineError::InvalidProperty {
                            property: key.clone(),
                            reason: "expected an array of numbers".into(),
                        })?
                        .iter()
                        .map(|v| as_number(key, v))
                        .collect::<Result<Vec<f64>, _>>()?;
                    set.color_transform = Some(values);
                }
                "visible" => set.visible = Some(as_flag(key, entry)?),
                other => {
                    return Err(TimelineError::InvalidProperty {
                        property: other.to_string(),
                        reason: "unknown property".into(),
                    });
                }
            }
        }
        Ok(set)
    }
}

fn as_number(property: &str, value: &serde_json::Value) -> Result<f64, TimelineError> {
    value
        .as_f64()
        .ok_or_else(|| TimelineError::InvalidProperty {
            property: property.to_string(),
            reason: format!("expected a number, got {value}"),
        })
}

fn as_flag(property: &str, value: &serde_json::Value) -> Result<bool, TimelineError> {
    if let Some(flag) = value.as_bool() {
        return Ok(flag);
    }
    if let Some(number) = value.as_f64() {
        return Ok(number != 0.0);
    }
    Err(TimelineError::InvalidProperty {
        property: property.to_string(),
        reason: format!("expected a boolean or number, got {value}"),
    })
}

fn as_color(value: &serde_json::Value) -> Result<u32, TimelineError> {
    if let Some(number) = value.as_u64() {
        return Ok(number as u32);
    }
    if let Some(literal) = value.as_str() {
        return parse_hex_color(literal);
    }
    Err(TimelineError::InvalidColor {
        literal: value.to_string(),
    })
}

/// Parse a hex color literal (`#rrggbb`, `0xrrggbb`, or bare hex digits) into
/// its numeric representation.
pub fn parse_hex_color(literal: &str) -> Result<u32, TimelineError> {
    let digits = literal
        .strip_prefix('#')
        .or_else(|| literal.strip_prefix("0x"))
        .or_else(|| literal.strip_prefix("0X"))
        .unwrap_or(literal);

    if digits.is_empty() || digits.len() > 8 {
        return Err(TimelineError::InvalidColor {
            literal: literal.to_string(),
        });
    }
    u32::from_str_radix(digits, 16).map_err(|_| TimelineError::InvalidColor {
        literal: literal.to_string(),
    })
}
