//! Error types for the timeline engine

use serde::{Deserialize, Serialize};

use crate::ids::NodeId;

/// Comprehensive error type for timeline operations
#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum TimelineError {
    /// Display node not found in the stage
    #[error("node not found: {id}")]
    NodeNotFound { id: NodeId },

    /// The node exists but carries no animated timeline
    #[error("node {id} is not animated")]
    NotAnimated { id: NodeId },

    /// The stage root cannot be detached or removed
    #[error("operation not permitted on the stage root")]
    RootImmutable,

    /// Malformed compact keyframe data
    #[error("keyframe decode error at byte {offset}: {reason}")]
    KeyframeDecode { offset: usize, reason: String },

    /// A color literal that is neither a number nor a hex string
    #[error("invalid color literal: {literal}")]
    InvalidColor { literal: String },

    /// A loose-typed property value that cannot be coerced
    #[error("invalid value for property '{property}': {reason}")]
    InvalidProperty { property: String, reason: String },

    /// Serialization error
    #[error("serialization error: {reason}")]
    SerializationError { reason: String },
}

impl TimelineError {
    /// Get error category for logging/metrics
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::NodeNotFound { .. } | Self::NotAnimated { .. } | Self::RootImmutable => "stage",
            Self::KeyframeDecode { .. }
            | Self::InvalidColor { .. }
            | Self::InvalidProperty { .. } => "decode",
            Self::SerializationError { .. } => "serialization",
        }
    }
}

impl From<serde_json::Error> for TimelineError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError {
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        let stage_error = TimelineError::NodeNotFound { id: NodeId(3) };
        assert_eq!(stage_error.category(), "stage");

        let decode_error = TimelineError::KeyframeDecode {
            offset: 4,
            reason: "unrecognized code letter 'q'".into(),
        };
        assert_eq!(decode_error.category(), "decode");
    }

    #[test]
    fn test_display() {
        let error = TimelineError::NotAnimated { id: NodeId(7) };
        assert_eq!(error.to_string(), "node node#7 is not animated");
    }

    #[test]
    fn test_serialization() {
        let error = TimelineError::InvalidColor {
            literal: "#zzz".into(),
        };
        let serialized = serde_json::to_string(&error).unwrap();
        let deserialized: TimelineError = serde_json::from_str(&serialized).unwrap();
        assert_eq!(error, deserialized);
    }
}
