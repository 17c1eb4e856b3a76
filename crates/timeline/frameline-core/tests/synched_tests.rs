use std::cell::RefCell;
use std::rc::Rc;

use approx::assert_abs_diff_eq;
use frameline_core::{DisplayProps, FrameIndex, NodeConfig, NodeId, Stage, TweenSegment};

/// Tween segment that records every frame it is positioned at.
struct RecordingSegment {
    start: FrameIndex,
    end: FrameIndex,
    log: Rc<RefCell<Vec<FrameIndex>>>,
}

impl TweenSegment for RecordingSegment {
    fn start_frame(&self) -> FrameIndex {
        self.start
    }

    fn end_frame(&self) -> FrameIndex {
        self.end
    }

    fn set_position(&mut self, frame: FrameIndex, _props: &mut DisplayProps) {
        self.log.borrow_mut().push(frame);
    }
}

fn recording_segment(
    stage: &mut Stage,
    clip: NodeId,
    start: FrameIndex,
    end: FrameIndex,
) -> Rc<RefCell<Vec<FrameIndex>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    let target = stage.create_node();
    stage
        .add_tween_segment(
            clip,
            target,
            Box::new(RecordingSegment {
                start,
                end,
                log: Rc::clone(&log),
            }),
        )
        .unwrap();
    log
}

fn live_clip(stage: &mut Stage, framerate: f64) -> NodeId {
    let clip = stage.create_animated_node(NodeConfig {
        framerate,
        ..Default::default()
    });
    let root = stage.root();
    stage.attach(root, clip).unwrap();
    clip
}

#[test]
fn synched_child_resolves_in_the_same_advance() {
    let mut stage = Stage::new();
    let parent = live_clip(&mut stage, 10.0);
    let parent_log = recording_segment(&mut stage, parent, 0, 9);

    let child = stage.create_animated_node(NodeConfig::synched(0));
    let child_log = recording_segment(&mut stage, child, 0, 3);
    let child_actions = Rc::new(RefCell::new(Vec::new()));
    {
        let log = Rc::clone(&child_actions);
        stage
            .add_action(child, 3, move || log.borrow_mut().push(3))
            .unwrap();
    }

    // Window [2, 7): the registration also records frame 2 as the child's
    // synchronization base.
    stage.add_timed_child(parent, child, 2, 5).unwrap();
    stage.advance(parent, 0.3).unwrap();

    assert_eq!(stage.animated(parent).unwrap().current_frame(), 3);
    assert_eq!(stage.parent(child), Some(parent));

    // (2 + (3 - 2)) mod 4 == 3; both tween setters ran in one advance call.
    let child_timeline = stage.animated(child).unwrap();
    assert_eq!(child_timeline.synch_offset(), 1);
    assert_eq!(child_timeline.current_frame(), 3);
    assert_eq!(*parent_log.borrow(), vec![3]);
    assert_eq!(*child_log.borrow(), vec![3]);

    // Synchronized propagation never fires the child's actions.
    assert!(child_actions.borrow().is_empty());
}

#[test]
fn synched_child_wraps_modulo_its_clip_length() {
    let mut stage = Stage::new();
    let parent = live_clip(&mut stage, 10.0);
    recording_segment(&mut stage, parent, 0, 9);

    let child = stage.create_animated_node(NodeConfig::synched(0));
    recording_segment(&mut stage, child, 0, 3);

    stage.add_timed_child(parent, child, 0, 10).unwrap();
    stage.goto_and_stop(parent, 6).unwrap();

    // 6 mod 4
    assert_eq!(stage.animated(child).unwrap().current_frame(), 2);
}

#[test]
fn synchronization_propagates_through_depth() {
    let mut stage = Stage::new();
    let parent = live_clip(&mut stage, 10.0);
    recording_segment(&mut stage, parent, 0, 9);

    let child = stage.create_animated_node(NodeConfig::synched(0));
    recording_segment(&mut stage, child, 0, 7);
    let grandchild = stage.create_animated_node(NodeConfig::synched(0));
    let grandchild_log = recording_segment(&mut stage, grandchild, 0, 3);

    stage.add_timed_child(parent, child, 0, 10).unwrap();
    stage.attach(child, grandchild).unwrap();

    stage.goto_and_stop(parent, 5).unwrap();

    // Child: 5 mod 8; grandchild: 5 mod 4, both in the same top-level pass.
    assert_eq!(stage.animated(child).unwrap().current_frame(), 5);
    assert_eq!(stage.animated(grandchild).unwrap().current_frame(), 1);
    assert_eq!(*grandchild_log.borrow(), vec![1]);
}

#[test]
fn single_frame_child_stays_pinned() {
    let mut stage = Stage::new();
    let parent = live_clip(&mut stage, 10.0);
    recording_segment(&mut stage, parent, 0, 9);

    let child = stage.create_animated_node(NodeConfig::single_frame(7));
    let child_log = recording_segment(&mut stage, child, 0, 9);
    stage.attach(parent, child).unwrap();

    stage.goto_and_play(parent, 2).unwrap();
    assert_eq!(stage.animated(child).unwrap().current_frame(), 7);

    stage.advance(parent, 0.2).unwrap();
    assert_eq!(stage.animated(parent).unwrap().current_frame(), 4);
    assert_eq!(stage.animated(child).unwrap().current_frame(), 7);

    // Pinned frame resolved once; later parent passes are no-ops for it.
    assert_eq!(*child_log.borrow(), vec![7]);
}

#[test]
fn timed_child_auto_reset_on_reentry() {
    let mut stage = Stage::new();
    let parent = live_clip(&mut stage, 10.0);
    recording_segment(&mut stage, parent, 0, 9);

    let child = stage.create_animated_node(NodeConfig {
        framerate: 10.0,
        ..Default::default()
    });
    recording_segment(&mut stage, child, 0, 9);

    stage.add_timed_child(parent, child, 0, 3).unwrap();
    stage.add_timed_child(parent, child, 6, 3).unwrap();

    stage.goto_and_play(parent, 0).unwrap();
    assert_eq!(stage.parent(child), Some(parent));

    // The child runs its own clock while attached.
    stage.advance(child, 0.2).unwrap();
    assert_eq!(stage.animated(child).unwrap().current_frame(), 2);

    // Window [0, 3) ends at frame 3: detach, no state reset.
    stage.advance(parent, 0.3).unwrap();
    assert_eq!(stage.parent(child), None);
    assert_eq!(stage.animated(child).unwrap().current_frame(), 2);

    // Window [6, 9) re-attaches: the child restarts from frame 0.
    stage.advance(parent, 0.3).unwrap();
    assert_eq!(stage.parent(child), Some(parent));
    let timeline = stage.animated(child).unwrap();
    assert_eq!(timeline.current_frame(), 0);
    assert_abs_diff_eq!(timeline.elapsed_time(), 0.0);
}

#[test]
fn timed_child_without_auto_reset_retains_frame() {
    let mut stage = Stage::new();
    let parent = live_clip(&mut stage, 10.0);
    recording_segment(&mut stage, parent, 0, 9);

    let child = stage.create_animated_node(NodeConfig {
        framerate: 10.0,
        auto_reset: false,
        ..Default::default()
    });
    recording_segment(&mut stage, child, 0, 9);

    stage.add_timed_child(parent, child, 0, 3).unwrap();
    stage.add_timed_child(parent, child, 6, 3).unwrap();

    stage.goto_and_play(parent, 0).unwrap();
    stage.advance(child, 0.2).unwrap();
    stage.advance(parent, 0.3).unwrap();
    stage.advance(parent, 0.3).unwrap();

    assert_eq!(stage.parent(child), Some(parent));
    assert_eq!(stage.animated(child).unwrap().current_frame(), 2);
}

#[test]
fn framerate_inherited_from_clock_ancestor() {
    let mut stage = Stage::new();
    let parent = live_clip(&mut stage, 24.0);
    recording_segment(&mut stage, parent, 0, 23);

    let child = stage.create_animated_node(NodeConfig::default());
    recording_segment(&mut stage, child, 0, 23);
    stage.attach(parent, child).unwrap();
    assert!(stage.is_subscribed(child));

    stage.tick(0.5).unwrap();

    let child_timeline = stage.animated(child).unwrap();
    assert_eq!(child_timeline.framerate(), 24.0);
    assert_eq!(child_timeline.current_frame(), 12);
    assert_eq!(stage.animated(parent).unwrap().current_frame(), 12);
}

#[test]
fn node_without_framerate_stays_static_until_seeked() {
    let mut stage = Stage::new();
    let clip = stage.create_animated_node(NodeConfig::default());
    let root = stage.root();
    stage.attach(root, clip).unwrap();
    let log = recording_segment(&mut stage, clip, 0, 9);

    // No framerate and no independently-clocked ancestor: ticks cannot move
    // or even resolve it.
    stage.tick(0.5).unwrap();
    assert!(log.borrow().is_empty());

    stage.goto_and_stop(clip, 4).unwrap();
    assert_eq!(*log.borrow(), vec![4]);
}
