//! The per-node playback state machine.

use crate::ids::NodeId;
use crate::label::LabelIndex;
use crate::node::config::{NodeConfig, PlaybackMode};
use crate::properties::PropertySet;
use crate::timeline::{
    ActionTable, ChildPresenceTimeline, EasingFn, TweenSegment, TweenTimeline,
};
use crate::FrameIndex;

/// Absorbs floating-point error when quantizing elapsed time at exact frame
/// boundaries.
pub const FRAME_EPSILON: f64 = 1e-8;

/// Timeline state owned by one animated display node.
///
/// Holds the frame clock, the label index, and the per-target tween,
/// presence, and action tables. The tree-level resolution pass lives on
/// [`crate::stage::Stage`]; this type owns everything that can be answered
/// without looking at other nodes.
#[derive(Debug)]
pub struct AnimatedNode {
    mode: PlaybackMode,
    start_position: FrameIndex,
    looping: bool,
    auto_reset: bool,
    paused: bool,
    actions_enabled: bool,
    current_frame: FrameIndex,
    /// Last resolved frame; `None` until the first resolution pass, which
    /// forces a full resolve regardless of the target frame.
    previous_frame: Option<FrameIndex>,
    /// Seconds since frame 0; meaningful only with a nonzero framerate.
    elapsed: f64,
    framerate: f64,
    total_frames: FrameIndex,
    /// Parent-relative synchronization value, rewritten by the parent's
    /// resolution pass when this node is `Synched`.
    synch_offset: i64,
    labels: LabelIndex,
    pub(crate) tweens: Vec<TweenTimeline>,
    pub(crate) presence: Vec<ChildPresenceTimeline>,
    pub(crate) actions: ActionTable,
}

impl AnimatedNode {
    pub fn new(config: NodeConfig) -> Self {
        let total_frames = match config.duration {
            Some(duration) if config.framerate > 0.0 => {
                (duration * config.framerate).round() as FrameIndex
            }
            _ => 0,
        };
        Self {
            mode: config.mode,
            start_position: config.start_position,
            looping: config.looping,
            auto_reset: config.auto_reset,
            paused: false,
            actions_enabled: true,
            current_frame: 0,
            previous_frame: None,
            elapsed: 0.0,
            framerate: config.framerate,
            total_frames,
            synch_offset: 0,
            labels: LabelIndex::from_map(&config.labels),
            tweens: Vec::new(),
            presence: Vec::new(),
            actions: ActionTable::new(),
        }
    }

    // --- read accessors -------------------------------------------------

    #[inline]
    pub fn mode(&self) -> PlaybackMode {
        self.mode
    }

    #[inline]
    pub fn current_frame(&self) -> FrameIndex {
        self.current_frame
    }

    #[inline]
    pub fn previous_frame(&self) -> Option<FrameIndex> {
        self.previous_frame
    }

    #[inline]
    pub fn total_frames(&self) -> FrameIndex {
        self.total_frames
    }

    #[inline]
    pub fn elapsed_time(&self) -> f64 {
        self.elapsed
    }

    #[inline]
    pub fn framerate(&self) -> f64 {
        self.framerate
    }

    /// Clip length in seconds; zero without a framerate.
    #[inline]
    pub fn duration(&self) -> f64 {
        if self.framerate > 0.0 {
            f64::from(self.total_frames) / self.framerate
        } else {
            0.0
        }
    }

    #[inline]
    pub fn start_position(&self) -> FrameIndex {
        self.start_position
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    #[inline]
    pub fn looping(&self) -> bool {
        self.looping
    }

    #[inline]
    pub fn auto_reset(&self) -> bool {
        self.auto_reset
    }

    #[inline]
    pub fn actions_enabled(&self) -> bool {
        self.actions_enabled
    }

    #[inline]
    pub fn labels(&self) -> &LabelIndex {
        &self.labels
    }

    /// Name of the label at or before the current frame.
    #[inline]
    pub fn current_label(&self) -> Option<&str> {
        self.labels.current_label(self.current_frame)
    }

    #[inline]
    pub fn synch_offset(&self) -> i64 {
        self.synch_offset
    }

    // --- settable knobs -------------------------------------------------

    /// Frames per second; the derived duration follows.
    #[inline]
    pub fn set_framerate(&mut self, framerate: f64) {
        self.framerate = framerate.max(0.0);
    }

    #[inline]
    pub fn set_actions_enabled(&mut self, enabled: bool) {
        self.actions_enabled = enabled;
    }

    #[inline]
    pub fn set_auto_reset(&mut self, auto_reset: bool) {
        self.auto_reset = auto_reset;
    }

    // --- clock ----------------------------------------------------------

    /// Accumulate elapsed time, wrap or clamp at the clip end, and quantize
    /// to the current frame. Returns whether the clock wrapped. The caller
    /// guarantees a nonzero framerate.
    pub(crate) fn advance_clock(&mut self, delta_seconds: f64) -> bool {
        self.elapsed = (self.elapsed + delta_seconds).max(0.0);
        let duration = self.duration();
        let mut wrapped = false;
        if duration > 0.0 && self.elapsed > duration {
            if self.looping {
                self.elapsed -= duration;
                wrapped = true;
            } else {
                self.elapsed = duration;
            }
        }

        let quantized = (self.elapsed * self.framerate + FRAME_EPSILON).floor() as i64;
        self.current_frame = self.clamp_frame(quantized.max(0) as FrameIndex);
        wrapped
    }

    /// Jump the clock to a frame, keeping elapsed time consistent.
    pub(crate) fn seek_clock(&mut self, frame: FrameIndex) {
        self.current_frame = self.clamp_frame(frame);
        self.elapsed = if self.framerate > 0.0 {
            f64::from(self.current_frame) / self.framerate
        } else {
            0.0
        };
    }

    /// Restore the initial frame/time state; the next resolution pass runs in
    /// full, as after construction.
    pub(crate) fn reset(&mut self) {
        self.current_frame = 0;
        self.elapsed = 0.0;
        self.previous_frame = None;
    }

    /// Mode-specific frame derivation performed at the top of each
    /// resolution pass.
    pub(crate) fn derive_mode_frame(&mut self) {
        match self.mode {
            PlaybackMode::Independent => {}
            PlaybackMode::SingleFrame => {
                self.current_frame = if self.total_frames > 0 {
                    self.start_position % self.total_frames
                } else {
                    0
                };
            }
            PlaybackMode::Synched => {
                let total = i64::from(self.total_frames.max(1));
                let frame = (i64::from(self.start_position) + self.synch_offset).rem_euclid(total);
                self.current_frame = frame as FrameIndex;
            }
        }
    }

    fn clamp_frame(&self, frame: FrameIndex) -> FrameIndex {
        if self.total_frames == 0 {
            0
        } else {
            frame.min(self.total_frames - 1)
        }
    }

    pub(crate) fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub(crate) fn set_previous_frame(&mut self, frame: FrameIndex) {
        self.previous_frame = Some(frame);
    }

    pub(crate) fn set_synch_offset(&mut self, offset: i64) {
        self.synch_offset = offset;
    }

    pub(crate) fn set_start_position(&mut self, start_position: FrameIndex) {
        self.start_position = start_position;
    }

    // --- table mutators (Stage owns the public registration surface) ----

    /// The tween timeline for `target`, created on first use; exactly one
    /// exists per distinct target.
    pub(crate) fn tween_timeline_mut(&mut self, target: NodeId) -> &mut TweenTimeline {
        if let Some(index) = self.tweens.iter().position(|t| t.target() == target) {
            return &mut self.tweens[index];
        }
        self.tweens.push(TweenTimeline::new(target));
        self.tweens.last_mut().unwrap()
    }

    /// The presence timeline for `target`, created on first use; at most one
    /// exists per distinct target.
    pub(crate) fn presence_timeline_mut(&mut self, target: NodeId) -> &mut ChildPresenceTimeline {
        if let Some(index) = self.presence.iter().position(|t| t.target() == target) {
            return &mut self.presence[index];
        }
        self.presence.push(ChildPresenceTimeline::new(target));
        self.presence.last_mut().unwrap()
    }

    pub(crate) fn add_tween(
        &mut self,
        target: NodeId,
        properties: PropertySet,
        start_frame: FrameIndex,
        duration: FrameIndex,
        easing: Option<EasingFn>,
    ) {
        self.tween_timeline_mut(target)
            .add_tween(properties, start_frame, duration, easing);
        self.extend_total_frames(start_frame.saturating_add(duration).saturating_add(1));
    }

    pub(crate) fn push_tween_segment(&mut self, target: NodeId, segment: Box<dyn TweenSegment>) {
        let end = segment.end_frame();
        self.tween_timeline_mut(target).push_segment(segment);
        self.extend_total_frames(end.saturating_add(1));
    }

    pub(crate) fn add_timed_child(
        &mut self,
        target: NodeId,
        start_frame: FrameIndex,
        duration: FrameIndex,
    ) {
        self.presence_timeline_mut(target)
            .add_window(start_frame, duration);
        self.extend_total_frames(start_frame.saturating_add(duration));
    }

    pub(crate) fn add_action(&mut self, frame: FrameIndex, action: Box<dyn FnMut() + 'static>) {
        self.actions.add(frame, action);
        self.extend_total_frames(frame.saturating_add(1));
    }

    /// Grow the clip; registrations never shrink it.
    fn extend_total_frames(&mut self, minimum: FrameIndex) {
        if self.total_frames < minimum {
            self.total_frames = minimum;
        }
    }
}
