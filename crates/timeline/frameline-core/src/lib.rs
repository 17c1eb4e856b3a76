//! Frameline Core
//!
//! A frame-accurate timeline playback engine for tree-structured animated
//! display nodes. Given per-target property tweens, named frame labels,
//! time-windowed child-visibility intervals, and per-frame scripted
//! callbacks, it deterministically resolves, for any frame or elapsed time,
//! which children are present, what properties each animated target holds,
//! and which callbacks fire, across independent, single-frame, and
//! parent-synchronized playback modes.

pub mod error;
pub mod ids;
pub mod keyframes;
pub mod label;
pub mod loaders;
pub mod node;
pub mod properties;
pub mod stage;
pub mod timeline;

// Re-export common types for convenience
pub use error::TimelineError;
pub use ids::NodeId;
pub use keyframes::{decode_compact, KeyframeData};
pub use label::{Label, LabelIndex};
pub use node::{AnimatedNode, NodeConfig, PlaybackMode, FRAME_EPSILON};
pub use properties::{parse_hex_color, DisplayProps, PropertySet};
pub use stage::{SeekTarget, Stage};
pub use timeline::{
    ActionTable, ChildPresenceTimeline, EasingFn, Tween, TweenSegment, TweenTimeline,
};

/// Discrete unit of timeline position.
pub type FrameIndex = u32;

/// Timeline engine result type
pub type Result<T> = core::result::Result<T, TimelineError>;
