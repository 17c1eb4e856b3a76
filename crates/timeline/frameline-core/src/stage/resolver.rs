//! Playback driving and the per-frame resolution pass.
//!
//! One resolution pass is an atomic, synchronous unit of work: tween
//! application, then timed-child presence, then recursive propagation into
//! synchronized children, then action firing at this node's level.

use std::mem;

use log::{debug, warn};

use crate::ids::NodeId;
use crate::node::PlaybackMode;
use crate::stage::Stage;
use crate::{FrameIndex, Result};

/// A seek destination: a literal frame or a label name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeekTarget {
    Frame(FrameIndex),
    Label(String),
}

impl From<FrameIndex> for SeekTarget {
    fn from(frame: FrameIndex) -> Self {
        SeekTarget::Frame(frame)
    }
}

impl From<&str> for SeekTarget {
    fn from(name: &str) -> Self {
        SeekTarget::Label(name.to_string())
    }
}

impl From<String> for SeekTarget {
    fn from(name: String) -> Self {
        SeekTarget::Label(name)
    }
}

impl Stage {
    /// Deliver one clock tick to every subscribed node.
    ///
    /// The subscription list is snapshotted first: nodes attached or detached
    /// by a resolution pass take effect next tick.
    pub fn tick(&mut self, delta_seconds: f64) -> Result<()> {
        let subscribed = self.ticking_snapshot();
        for id in subscribed {
            if self.is_subscribed(id) {
                self.advance(id, delta_seconds)?;
            }
        }
        Ok(())
    }

    /// Advance node `id`'s clock by `delta_seconds` and resolve.
    ///
    /// Only independent nodes self-advance; synchronized and single-frame
    /// nodes are driven by their parent's pass. A paused node re-resolves its
    /// current frame (a no-op unless something changed) and accumulates no
    /// time.
    pub fn advance(&mut self, id: NodeId, delta_seconds: f64) -> Result<()> {
        let (mode, paused, framerate) = {
            let timeline = self.timeline(id)?;
            (timeline.mode(), timeline.is_paused(), timeline.framerate())
        };
        if !mode.is_independent() {
            debug!("advance ignored: {} is {}", id, mode.name());
            return Ok(());
        }
        if paused {
            return self.update_timeline(id, false);
        }
        if framerate <= 0.0 {
            match self.inherited_framerate(id) {
                Some(adopted) => {
                    debug!("{} adopts framerate {} from its clock ancestor", id, adopted);
                    self.timeline_mut(id)?.set_framerate(adopted);
                }
                // No independently-clocked ancestor: static until seeked.
                None => return Ok(()),
            }
        }
        let wrapped = self.timeline_mut(id)?.advance_clock(delta_seconds);
        self.update_timeline(id, wrapped)
    }

    /// Resume playback without moving the playhead.
    pub fn play(&mut self, id: NodeId) -> Result<()> {
        self.timeline_mut(id)?.set_paused(false);
        Ok(())
    }

    /// Pause playback without moving the playhead.
    pub fn stop(&mut self, id: NodeId) -> Result<()> {
        self.timeline_mut(id)?.set_paused(true);
        Ok(())
    }

    /// Seek to a frame or label and resume playback.
    pub fn goto_and_play(&mut self, id: NodeId, target: impl Into<SeekTarget>) -> Result<()> {
        self.seek(id, target.into(), false)
    }

    /// Seek to a frame or label and pause.
    pub fn goto_and_stop(&mut self, id: NodeId, target: impl Into<SeekTarget>) -> Result<()> {
        self.seek(id, target.into(), true)
    }

    fn seek(&mut self, id: NodeId, target: SeekTarget, pause: bool) -> Result<()> {
        {
            let timeline = self.timeline_mut(id)?;
            timeline.set_paused(pause);
            let frame = match &target {
                SeekTarget::Frame(frame) => Some(*frame),
                SeekTarget::Label(name) => timeline.labels().frame_for(name),
            };
            let Some(frame) = frame else {
                warn!("ignoring seek on {}: unknown label {:?}", id, target);
                return Ok(());
            };
            timeline.seek_clock(frame);
        }
        self.update_timeline(id, false)
    }

    /// Framerate of the nearest independently-clocked ancestor.
    fn inherited_framerate(&self, id: NodeId) -> Option<f64> {
        let mut cursor = self.parent(id);
        while let Some(ancestor) = cursor {
            if let Some(timeline) = self.animated(ancestor) {
                if timeline.mode().is_independent() && timeline.framerate() > 0.0 {
                    return Some(timeline.framerate());
                }
            }
            cursor = self.parent(ancestor);
        }
        None
    }

    /// Derive the node's frame for its mode and run the positional pass if
    /// the playhead moved. Re-resolving a stationary playhead is free of
    /// observable effects; the never-resolved sentinel forces the first pass
    /// through.
    pub(crate) fn update_timeline(&mut self, id: NodeId, wrapped: bool) -> Result<()> {
        let (start, current, fire_actions) = {
            let timeline = self.timeline_mut(id)?;
            timeline.derive_mode_frame();
            let current = timeline.current_frame();
            if timeline.previous_frame() == Some(current) {
                return Ok(());
            }
            let start = timeline.previous_frame().unwrap_or(0);
            // Actions fire for the independent driver only; resolving to keep
            // a synchronized child's tweens in sync must not double-fire.
            let fire_actions = timeline.mode().is_independent() && timeline.actions_enabled();
            (start, current, fire_actions)
        };
        self.set_timeline_position(id, start, current, wrapped, fire_actions)?;
        self.timeline_mut(id)?.set_previous_frame(current);
        Ok(())
    }

    /// The positional pass over `(start, current)`.
    ///
    /// Tables are moved out of the node while they are walked so tween
    /// setters and attachment changes can borrow other arena entries freely.
    pub(crate) fn set_timeline_position(
        &mut self,
        id: NodeId,
        start: FrameIndex,
        current: FrameIndex,
        wrapped: bool,
        fire_actions: bool,
    ) -> Result<()> {
        // Tween application: at most one segment per timeline is active.
        let mut tweens = mem::take(&mut self.timeline_mut(id)?.tweens);
        for timeline in &mut tweens {
            let target = timeline.target();
            if let Some(segment) = timeline.segment_at_mut(current) {
                if let Some(props) = self.props_mut(target) {
                    segment.set_position(current, props);
                }
            }
        }
        self.timeline_mut(id)?.tweens = tweens;

        // Timed-child presence. Independent children restart on re-entry
        // unless they opted out of auto-reset.
        let presence = mem::take(&mut self.timeline_mut(id)?.presence);
        for track in &presence {
            let target = track.target();
            if !self.contains(target) {
                continue;
            }
            let due = track.contains(current);
            let attached = self.parent(target) == Some(id);
            if due && !attached {
                if let Some(child) = self.animated_mut(target) {
                    if child.mode().is_independent() && child.auto_reset() {
                        child.reset();
                    }
                }
                self.attach(id, target)?;
            } else if !due && attached {
                self.detach(target)?;
            }
        }
        self.timeline_mut(id)?.presence = presence;

        // Recursive propagation into parent-driven children. Synchronized
        // children get their offset rewritten from this pass's frame and
        // re-derive their own frame from it; single-frame children re-resolve
        // their pinned frame. Independent children run on their own clocks.
        let children = self.children(id).to_vec();
        for child in children {
            let Some(timeline) = self.animated_mut(child) else {
                continue;
            };
            match timeline.mode() {
                PlaybackMode::Independent => continue,
                PlaybackMode::SingleFrame => {}
                PlaybackMode::Synched => {
                    let offset = i64::from(current) - i64::from(timeline.start_position());
                    timeline.set_synch_offset(offset);
                }
            }
            self.update_timeline(child, false)?;
        }

        // Action firing across the traversed range, splicing the loop seam.
        // Each traversed frame fires at most once, in traversal order.
        if fire_actions {
            let total = self.timeline(id)?.total_frames();
            let mut actions = mem::take(&mut self.timeline_mut(id)?.actions);
            if wrapped || current < start {
                let last = total.saturating_sub(1);
                for frame in start + 1..=last {
                    actions.fire(frame);
                }
                for frame in 0..=current.min(start) {
                    actions.fire(frame);
                }
            } else {
                for frame in start + 1..=current {
                    actions.fire(frame);
                }
            }
            self.timeline_mut(id)?.actions = actions;
        }
        Ok(())
    }
}
