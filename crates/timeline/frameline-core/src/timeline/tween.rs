//! Tween segments and the per-target ordered sequences the resolver scans.

use std::fmt;

use crate::ids::NodeId;
use crate::properties::{DisplayProps, PropertySet};
use crate::FrameIndex;

/// Easing applied to a segment's normalized progress.
pub type EasingFn = fn(f64) -> f64;

/// One bounded tween segment.
///
/// The interpolation math behind `set_position` is the collaborator's
/// concern; the engine only scans bounds and invokes the setter for the
/// segment containing the current frame.
pub trait TweenSegment {
    /// First frame covered by this segment.
    fn start_frame(&self) -> FrameIndex;
    /// Last frame covered by this segment (inclusive).
    fn end_frame(&self) -> FrameIndex;
    /// Move the segment to `frame`, mutating the target's properties.
    fn set_position(&mut self, frame: FrameIndex, props: &mut DisplayProps);
}

/// Default segment implementation: linear interpolation toward a target
/// property set, with an optional easing function.
///
/// Starting values are captured from the target the first time the segment is
/// applied, so a tween continues from wherever the previous segment (or a
/// seek) left the target. Discrete fields (tint, color transform, visibility)
/// snap to the target values while the segment is active.
#[derive(Debug, Clone)]
pub struct Tween {
    start_frame: FrameIndex,
    end_frame: FrameIndex,
    to: PropertySet,
    from: Option<PropertySet>,
    easing: Option<EasingFn>,
}

impl Tween {
    pub fn new(
        properties: PropertySet,
        start_frame: FrameIndex,
        duration: FrameIndex,
        easing: Option<EasingFn>,
    ) -> Self {
        Self {
            start_frame,
            end_frame: start_frame.saturating_add(duration),
            to: properties,
            from: None,
            easing,
        }
    }

    /// A duration-0 hold: the property set applies verbatim at its frame.
    pub fn hold(properties: PropertySet, frame: FrameIndex) -> Self {
        Self::new(properties, frame, 0, None)
    }

    fn progress(&self, frame: FrameIndex) -> f64 {
        if self.end_frame == self.start_frame {
            return 1.0;
        }
        let t = f64::from(frame.saturating_sub(self.start_frame))
            / f64::from(self.end_frame - self.start_frame);
        t.clamp(0.0, 1.0)
    }
}

#[inline]
fn lerp(from: f64, to: f64, t: f64) -> f64 {
    from + (to - from) * t
}

impl TweenSegment for Tween {
    fn start_frame(&self) -> FrameIndex {
        self.start_frame
    }

    fn end_frame(&self) -> FrameIndex {
        self.end_frame
    }

    fn set_position(&mut self, frame: FrameIndex, props: &mut DisplayProps) {
        let t = self.progress(frame);
        let t = match self.easing {
            Some(ease) => ease(t),
            None => t,
        };

        let from = self
            .from
            .get_or_insert_with(|| PropertySet::snapshot(props, &self.to));

        if let (Some(a), Some(b)) = (from.x, self.to.x) {
            props.x = lerp(a, b, t);
        }
        if let (Some(a), Some(b)) = (from.y, self.to.y) {
            props.y = lerp(a, b, t);
        }
        if let (Some(a), Some(b)) = (from.scale_x, self.to.scale_x) {
            props.scale_x = lerp(a, b, t);
        }
        if let (Some(a), Some(b)) = (from.scale_y, self.to.scale_y) {
            props.scale_y = lerp(a, b, t);
        }
        if let (Some(a), Some(b)) = (from.skew_x, self.to.skew_x) {
            props.skew_x = lerp(a, b, t);
        }
        if let (Some(a), Some(b)) = (from.skew_y, self.to.skew_y) {
            props.skew_y = lerp(a, b, t);
        }
        if let (Some(a), Some(b)) = (from.rotation, self.to.rotation) {
            props.rotation = lerp(a, b, t);
        }
        if let (Some(a), Some(b)) = (from.alpha, self.to.alpha) {
            props.alpha = lerp(a, b, t);
        }
        if let Some(tint) = self.to.tint {
            props.tint = tint;
        }
        if let Some(ct) = &self.to.color_transform {
            props.color_transform = Some(ct.clone());
        }
        if let Some(visible) = self.to.visible {
            props.visible = visible;
        }
    }
}

/// Ordered sequence of tween segments for one target.
///
/// Segments are kept sorted by start frame and assumed non-overlapping; at
/// most one segment is active at any frame.
pub struct TweenTimeline {
    target: NodeId,
    segments: Vec<Box<dyn TweenSegment>>,
}

impl TweenTimeline {
    #[inline]
    pub fn new(target: NodeId) -> Self {
        Self {
            target,
            segments: Vec::new(),
        }
    }

    /// Target whose properties this timeline animates.
    #[inline]
    pub fn target(&self) -> NodeId {
        self.target
    }

    /// Create and append a default segment covering
    /// `[start_frame, start_frame + duration]`.
    pub fn add_tween(
        &mut self,
        properties: PropertySet,
        start_frame: FrameIndex,
        duration: FrameIndex,
        easing: Option<EasingFn>,
    ) {
        self.push_segment(Box::new(Tween::new(properties, start_frame, duration, easing)));
    }

    /// Insert a segment, keeping the sequence sorted by start frame.
    pub fn push_segment(&mut self, segment: Box<dyn TweenSegment>) {
        let start = segment.start_frame();
        let insert_pos = self
            .segments
            .binary_search_by(|s| {
                s.start_frame()
                    .cmp(&start)
                    .then(std::cmp::Ordering::Less)
            })
            .unwrap_or_else(|pos| pos);
        self.segments.insert(insert_pos, segment);
    }

    /// The segment whose inclusive bounds contain `frame`, if any.
    pub fn segment_at_mut(&mut self, frame: FrameIndex) -> Option<&mut (dyn TweenSegment + '_)> {
        if let Some(s) = self
            .segments
            .iter_mut()
            .find(|s| s.start_frame() <= frame && frame <= s.end_frame())
        {
            Some(s.as_mut())
        } else {
            None
        }
    }

    /// Inclusive end frame of the furthest segment.
    pub fn end_frame(&self) -> FrameIndex {
        self.segments.iter().map(|s| s.end_frame()).max().unwrap_or(0)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.segments.len()
    }
}

impl fmt::Debug for TweenTimeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TweenTimeline")
            .field("target", &self.target)
            .field("segments", &self.segments.len())
            .finish()
    }
}
