//! The stage: display-tree arena, clock subscriptions, and the public
//! playback/registration API surface.

pub mod resolver;

pub use resolver::SeekTarget;

use log::debug;

use crate::error::TimelineError;
use crate::ids::NodeId;
use crate::keyframes::KeyframeData;
use crate::node::{AnimatedNode, NodeConfig, PlaybackMode};
use crate::properties::{DisplayProps, PropertySet};
use crate::timeline::{EasingFn, TweenSegment};
use crate::{FrameIndex, Result};

/// One display node: tree links, properties, and an optional animated
/// timeline. Plain and animated nodes compose uniformly.
struct NodeEntry {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    props: DisplayProps,
    timeline: Option<AnimatedNode>,
}

impl NodeEntry {
    fn new(timeline: Option<AnimatedNode>) -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            props: DisplayProps::default(),
            timeline,
        }
    }
}

/// Owns every display node, the parent/child linkage, and the clock
/// subscription list.
///
/// Nodes are addressed by [`NodeId`]; playback and registration operations
/// take the id of the node they act on, mirroring an engine that owns its
/// players. Independent animated nodes subscribe to ticks while they are in
/// the live (root-reachable) tree and unsubscribe when they leave it.
pub struct Stage {
    entries: Vec<Option<NodeEntry>>,
    root: NodeId,
    ticking: Vec<NodeId>,
}

impl Stage {
    /// Create a stage with an empty root node.
    pub fn new() -> Self {
        Self {
            entries: vec![Some(NodeEntry::new(None))],
            root: NodeId(0),
            ticking: Vec::new(),
        }
    }

    /// The root display node; always present, never removable.
    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Allocate a plain display node, initially detached.
    pub fn create_node(&mut self) -> NodeId {
        self.alloc(None)
    }

    /// Allocate an animated display node, initially detached.
    pub fn create_animated_node(&mut self, config: NodeConfig) -> NodeId {
        self.alloc(Some(AnimatedNode::new(config)))
    }

    fn alloc(&mut self, timeline: Option<AnimatedNode>) -> NodeId {
        let id = NodeId(self.entries.len() as u32);
        self.entries.push(Some(NodeEntry::new(timeline)));
        id
    }

    // --- tree primitive -------------------------------------------------

    #[inline]
    pub fn contains(&self, id: NodeId) -> bool {
        self.entries
            .get(id.0 as usize)
            .map(Option::is_some)
            .unwrap_or(false)
    }

    #[inline]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.entries
            .get(id.0 as usize)
            .and_then(Option::as_ref)
            .and_then(|entry| entry.parent)
    }

    #[inline]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.entries
            .get(id.0 as usize)
            .and_then(Option::as_ref)
            .map(|entry| entry.children.as_slice())
            .unwrap_or(&[])
    }

    /// Attach `child` under `parent`, reparenting if necessary. Children are
    /// ordered by attachment.
    pub fn attach(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        if child == self.root {
            return Err(TimelineError::RootImmutable);
        }
        if !self.contains(parent) {
            return Err(TimelineError::NodeNotFound { id: parent });
        }
        if !self.contains(child) {
            return Err(TimelineError::NodeNotFound { id: child });
        }
        if let Some(old_parent) = self.parent(child) {
            if old_parent == parent {
                return Ok(());
            }
            self.detach(child)?;
        }
        self.entry_mut(parent)?.children.push(child);
        self.entry_mut(child)?.parent = Some(parent);
        if self.is_live(parent) {
            self.subscribe_subtree(child);
        }
        Ok(())
    }

    /// Detach `child` from its parent, leaving its state untouched. A node
    /// without a parent is left alone.
    pub fn detach(&mut self, child: NodeId) -> Result<()> {
        if child == self.root {
            return Err(TimelineError::RootImmutable);
        }
        let Some(parent) = self.parent(child) else {
            return Ok(());
        };
        self.entry_mut(parent)?.children.retain(|c| *c != child);
        self.entry_mut(child)?.parent = None;
        self.unsubscribe_subtree(child);
        Ok(())
    }

    /// Tear down a node and its whole subtree.
    pub fn remove(&mut self, id: NodeId) -> Result<()> {
        if id == self.root {
            return Err(TimelineError::RootImmutable);
        }
        if !self.contains(id) {
            return Err(TimelineError::NodeNotFound { id });
        }
        self.detach(id)?;
        let mut subtree = Vec::new();
        self.collect_subtree(id, &mut subtree);
        for node in subtree {
            self.entries[node.0 as usize] = None;
        }
        Ok(())
    }

    /// Whether `id` is reachable from the root.
    pub fn is_live(&self, id: NodeId) -> bool {
        let mut cursor = Some(id);
        while let Some(node) = cursor {
            if node == self.root {
                return true;
            }
            cursor = self.parent(node);
        }
        false
    }

    // --- node state accessors -------------------------------------------

    #[inline]
    pub fn props(&self, id: NodeId) -> Option<&DisplayProps> {
        self.entries
            .get(id.0 as usize)
            .and_then(Option::as_ref)
            .map(|entry| &entry.props)
    }

    #[inline]
    pub fn props_mut(&mut self, id: NodeId) -> Option<&mut DisplayProps> {
        self.entries
            .get_mut(id.0 as usize)
            .and_then(Option::as_mut)
            .map(|entry| &mut entry.props)
    }

    /// The animated timeline of `id`, if it has one.
    #[inline]
    pub fn animated(&self, id: NodeId) -> Option<&AnimatedNode> {
        self.entries
            .get(id.0 as usize)
            .and_then(Option::as_ref)
            .and_then(|entry| entry.timeline.as_ref())
    }

    #[inline]
    pub fn animated_mut(&mut self, id: NodeId) -> Option<&mut AnimatedNode> {
        self.entries
            .get_mut(id.0 as usize)
            .and_then(Option::as_mut)
            .and_then(|entry| entry.timeline.as_mut())
    }

    /// Whether `id` currently receives clock ticks.
    #[inline]
    pub fn is_subscribed(&self, id: NodeId) -> bool {
        self.ticking.contains(&id)
    }

    // --- registration ---------------------------------------------------

    /// Register a tween for `target` on node `id` using the default segment
    /// implementation. Extends the clip to cover the segment.
    pub fn add_tween(
        &mut self,
        id: NodeId,
        target: NodeId,
        properties: PropertySet,
        start_frame: FrameIndex,
        duration: FrameIndex,
        easing: Option<EasingFn>,
    ) -> Result<()> {
        if !self.contains(target) {
            return Err(TimelineError::NodeNotFound { id: target });
        }
        self.timeline_mut(id)?
            .add_tween(target, properties, start_frame, duration, easing);
        Ok(())
    }

    /// Register an externally-built tween segment for `target` on node `id`.
    pub fn add_tween_segment(
        &mut self,
        id: NodeId,
        target: NodeId,
        segment: Box<dyn TweenSegment>,
    ) -> Result<()> {
        if !self.contains(target) {
            return Err(TimelineError::NodeNotFound { id: target });
        }
        self.timeline_mut(id)?.push_tween_segment(target, segment);
        Ok(())
    }

    /// Decode keyframe data and register one duration-0 hold per frame for
    /// `target` on node `id`.
    pub fn add_keyframes(
        &mut self,
        id: NodeId,
        target: NodeId,
        data: impl Into<KeyframeData>,
    ) -> Result<()> {
        if !self.contains(target) {
            return Err(TimelineError::NodeNotFound { id: target });
        }
        let frames = data.into().into_frames()?;
        let timeline = self.timeline_mut(id)?;
        for (frame, properties) in frames {
            timeline.add_tween(target, properties, frame, 0, None);
        }
        Ok(())
    }

    /// Schedule `target`'s attachment under node `id` for the frame window
    /// `[start_frame, start_frame + duration)`.
    ///
    /// A synched target records `start_frame` as its synchronization base.
    /// The node's presence at its current frame is refreshed immediately, so
    /// the registration takes effect without waiting for the next tick.
    pub fn add_timed_child(
        &mut self,
        id: NodeId,
        target: NodeId,
        start_frame: FrameIndex,
        duration: FrameIndex,
    ) -> Result<()> {
        if !self.contains(target) {
            return Err(TimelineError::NodeNotFound { id: target });
        }
        self.timeline(id)?;
        if let Some(child) = self.animated_mut(target) {
            if child.mode() == PlaybackMode::Synched {
                child.set_start_position(start_frame);
            }
        }
        self.timeline_mut(id)?
            .add_timed_child(target, start_frame, duration);
        if let Some(previous) = self.timeline(id)?.previous_frame() {
            self.set_timeline_position(id, previous, previous, false, false)?;
        }
        Ok(())
    }

    /// Append a callback to node `id`'s action list at `frame`.
    pub fn add_action(
        &mut self,
        id: NodeId,
        frame: FrameIndex,
        action: impl FnMut() + 'static,
    ) -> Result<()> {
        self.timeline_mut(id)?.add_action(frame, Box::new(action));
        Ok(())
    }

    // --- internals ------------------------------------------------------

    fn entry(&self, id: NodeId) -> Result<&NodeEntry> {
        self.entries
            .get(id.0 as usize)
            .and_then(Option::as_ref)
            .ok_or(TimelineError::NodeNotFound { id })
    }

    fn entry_mut(&mut self, id: NodeId) -> Result<&mut NodeEntry> {
        self.entries
            .get_mut(id.0 as usize)
            .and_then(Option::as_mut)
            .ok_or(TimelineError::NodeNotFound { id })
    }

    pub(crate) fn timeline(&self, id: NodeId) -> Result<&AnimatedNode> {
        self.entry(id)?
            .timeline
            .as_ref()
            .ok_or(TimelineError::NotAnimated { id })
    }

    pub(crate) fn timeline_mut(&mut self, id: NodeId) -> Result<&mut AnimatedNode> {
        self.entry_mut(id)?
            .timeline
            .as_mut()
            .ok_or(TimelineError::NotAnimated { id })
    }

    fn collect_subtree(&self, id: NodeId, out: &mut Vec<NodeId>) {
        if !self.contains(id) {
            return;
        }
        out.push(id);
        for &child in self.children(id) {
            self.collect_subtree(child, out);
        }
    }

    fn subscribe_subtree(&mut self, id: NodeId) {
        let mut subtree = Vec::new();
        self.collect_subtree(id, &mut subtree);
        for node in subtree {
            let independent = self
                .animated(node)
                .map(|timeline| timeline.mode().is_independent())
                .unwrap_or(false);
            if independent && !self.ticking.contains(&node) {
                debug!("{} subscribed to the frame clock", node);
                self.ticking.push(node);
            }
        }
    }

    fn unsubscribe_subtree(&mut self, id: NodeId) {
        let mut subtree = Vec::new();
        self.collect_subtree(id, &mut subtree);
        self.ticking.retain(|node| !subtree.contains(node));
    }

    pub(crate) fn ticking_snapshot(&self) -> Vec<NodeId> {
        self.ticking.clone()
    }
}

impl Default for Stage {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tree_links() {
        let mut stage = Stage::new();
        let a = stage.create_node();
        let b = stage.create_node();

        stage.attach(stage.root(), a).unwrap();
        stage.attach(a, b).unwrap();

        assert_eq!(stage.parent(b), Some(a));
        assert_eq!(stage.children(a), &[b]);
        assert!(stage.is_live(b));

        stage.detach(a).unwrap();
        assert!(!stage.is_live(b));
    }

    #[test]
    fn test_attach_reparents() {
        let mut stage = Stage::new();
        let a = stage.create_node();
        let b = stage.create_node();
        let child = stage.create_node();

        stage.attach(a, child).unwrap();
        stage.attach(b, child).unwrap();

        assert_eq!(stage.parent(child), Some(b));
        assert!(stage.children(a).is_empty());
    }

    #[test]
    fn test_root_is_immutable() {
        let mut stage = Stage::new();
        let root = stage.root();
        assert_eq!(stage.detach(root), Err(TimelineError::RootImmutable));
        assert_eq!(stage.remove(root), Err(TimelineError::RootImmutable));
    }

    #[test]
    fn test_subscription_follows_liveness() {
        let mut stage = Stage::new();
        let clip = stage.create_animated_node(NodeConfig {
            framerate: 24.0,
            ..Default::default()
        });

        assert!(!stage.is_subscribed(clip));
        stage.attach(stage.root(), clip).unwrap();
        assert!(stage.is_subscribed(clip));
        stage.detach(clip).unwrap();
        assert!(!stage.is_subscribed(clip));
    }

    #[test]
    fn test_synched_nodes_never_subscribe() {
        let mut stage = Stage::new();
        let clip = stage.create_animated_node(NodeConfig::synched(0));
        stage.attach(stage.root(), clip).unwrap();
        assert!(!stage.is_subscribed(clip));
    }

    #[test]
    fn test_remove_drops_subtree() {
        let mut stage = Stage::new();
        let a = stage.create_node();
        let b = stage.create_node();
        stage.attach(stage.root(), a).unwrap();
        stage.attach(a, b).unwrap();

        stage.remove(a).unwrap();
        assert!(!stage.contains(a));
        assert!(!stage.contains(b));
    }

    #[test]
    fn test_registration_requires_animated_node() {
        let mut stage = Stage::new();
        let plain = stage.create_node();
        let target = stage.create_node();
        let err = stage
            .add_timed_child(plain, target, 0, 5)
            .unwrap_err();
        assert_eq!(err, TimelineError::NotAnimated { id: plain });
    }
}
