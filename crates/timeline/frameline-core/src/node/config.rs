//! Construction configuration for animated nodes.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::FrameIndex;

/// How a node derives its current frame each resolution pass.
///
/// Fixed at construction; there are exactly three modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackMode {
    /// Runs on its own clock, driven by external ticks.
    Independent,
    /// Pinned to `start_position`; never advances.
    SingleFrame,
    /// Slaved to the parent's resolved frame plus a fixed offset.
    Synched,
}

impl Default for PlaybackMode {
    fn default() -> Self {
        PlaybackMode::Independent
    }
}

impl PlaybackMode {
    /// Get the name of this playback mode
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Independent => "independent",
            Self::SingleFrame => "single_frame",
            Self::Synched => "synched",
        }
    }

    /// Whether nodes in this mode subscribe to the external clock.
    #[inline]
    pub fn is_independent(&self) -> bool {
        matches!(self, Self::Independent)
    }
}

/// Configuration an animated node is constructed with. Mode, loop flag, and
/// the label map are fixed afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub mode: PlaybackMode,
    /// For `SingleFrame`, the only frame ever shown; for `Synched`, the
    /// synchronization base within the parent's timeline.
    pub start_position: FrameIndex,
    /// Governs wraparound of the frame clock.
    #[serde(rename = "loop")]
    pub looping: bool,
    pub labels: HashMap<String, FrameIndex>,
    /// Initial clip length in seconds; seeds the frame count when a framerate
    /// is present. Registrations only ever extend the clip.
    pub duration: Option<f64>,
    /// Frames per second. Zero means "derive from the nearest
    /// independently-clocked ancestor" on first advance.
    pub framerate: f64,
    /// Restart from frame 0 when re-attached by a timed-child window.
    pub auto_reset: bool,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            mode: PlaybackMode::Independent,
            start_position: 0,
            looping: true,
            labels: HashMap::new(),
            duration: None,
            framerate: 0.0,
            auto_reset: true,
        }
    }
}

impl NodeConfig {
    /// Configuration for a node slaved to its parent.
    pub fn synched(start_position: FrameIndex) -> Self {
        Self {
            mode: PlaybackMode::Synched,
            start_position,
            ..Default::default()
        }
    }

    /// Configuration for a node pinned to a single frame.
    pub fn single_frame(start_position: FrameIndex) -> Self {
        Self {
            mode: PlaybackMode::SingleFrame,
            start_position,
            ..Default::default()
        }
    }
}
