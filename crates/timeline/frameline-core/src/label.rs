//! Named frame positions and their ordered registry.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::FrameIndex;

/// A named alias for a frame position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
    pub frame: FrameIndex,
}

/// Registry of labels ordered ascending by frame.
///
/// Names need not be unique in storage; lookup by name returns the first
/// match in frame order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelIndex {
    labels: Vec<Label>,
}

impl LabelIndex {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from a name → frame mapping.
    pub fn from_map(map: &HashMap<String, FrameIndex>) -> Self {
        let mut labels: Vec<Label> = map
            .iter()
            .map(|(name, frame)| Label {
                name: name.clone(),
                frame: *frame,
            })
            .collect();
        // Sort ties by name so hash-map iteration order never leaks out.
        labels.sort_by(|a, b| a.frame.cmp(&b.frame).then_with(|| a.name.cmp(&b.name)));
        Self { labels }
    }

    /// Insert a label, keeping the sequence ordered by frame.
    pub fn insert(&mut self, name: impl Into<String>, frame: FrameIndex) {
        let label = Label {
            name: name.into(),
            frame,
        };
        let insert_pos = self
            .labels
            .binary_search_by(|l| l.frame.cmp(&frame).then(std::cmp::Ordering::Less))
            .unwrap_or_else(|pos| pos);
        self.labels.insert(insert_pos, label);
    }

    /// Frame position of the first label with the given name.
    #[inline]
    pub fn frame_for(&self, name: &str) -> Option<FrameIndex> {
        self.labels.iter().find(|l| l.name == name).map(|l| l.frame)
    }

    /// Name of the last label at or before `frame`, if any.
    ///
    /// Linear scan in ascending order; the sequence stays sorted through any
    /// mutation.
    pub fn current_label(&self, frame: FrameIndex) -> Option<&str> {
        let mut current = None;
        for label in &self.labels {
            if label.frame > frame {
                break;
            }
            current = Some(label.name.as_str());
        }
        current
    }

    /// The ordered label sequence.
    #[inline]
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> LabelIndex {
        let mut labels = LabelIndex::new();
        labels.insert("start", 0);
        labels.insert("mid", 10);
        labels.insert("end", 20);
        labels
    }

    #[test]
    fn test_frame_lookup() {
        let labels = index();
        assert_eq!(labels.frame_for("mid"), Some(10));
        assert_eq!(labels.frame_for("missing"), None);
    }

    #[test]
    fn test_current_label() {
        let labels = index();
        assert_eq!(labels.current_label(0), Some("start"));
        assert_eq!(labels.current_label(15), Some("mid"));
        assert_eq!(labels.current_label(25), Some("end"));
    }

    #[test]
    fn test_current_label_before_first() {
        let mut labels = LabelIndex::new();
        labels.insert("late", 5);
        assert_eq!(labels.current_label(3), None);
    }

    #[test]
    fn test_insert_keeps_order() {
        let mut labels = LabelIndex::new();
        labels.insert("c", 20);
        labels.insert("a", 0);
        labels.insert("b", 10);
        let frames: Vec<FrameIndex> = labels.labels().iter().map(|l| l.frame).collect();
        assert_eq!(frames, vec![0, 10, 20]);
    }

    #[test]
    fn test_from_map_orders_by_frame() {
        let mut map = HashMap::new();
        map.insert("outro".to_string(), 12);
        map.insert("intro".to_string(), 0);
        let labels = LabelIndex::from_map(&map);
        assert_eq!(labels.labels()[0].name, "intro");
        assert_eq!(labels.labels()[1].name, "outro");
    }
}
