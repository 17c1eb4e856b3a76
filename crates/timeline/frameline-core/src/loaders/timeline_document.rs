//! Loader for the JSON timeline-document format.
//!
//! A document describes one animated node and its descendants: construction
//! configuration, labels, timed-child windows, compact or structured
//! keyframes, and tween registrations. Loading assembles the subtree on a
//! [`Stage`]; the built root is returned detached so the caller decides where
//! it goes.

use std::collections::HashMap;

use serde::Deserialize;

use crate::error::TimelineError;
use crate::ids::NodeId;
use crate::keyframes::KeyframeData;
use crate::node::NodeConfig;
use crate::properties::PropertySet;
use crate::stage::Stage;
use crate::FrameIndex;

#[derive(Deserialize)]
struct DocumentNode {
    #[serde(default)]
    name: Option<String>,
    #[serde(flatten)]
    config: NodeConfig,
    /// Frame windows during which this node is attached to its parent.
    /// Without windows the node is attached permanently.
    #[serde(default)]
    windows: Vec<DocumentWindow>,
    /// Compact string or frame → property map, registered on the parent
    /// targeting this node.
    #[serde(default)]
    keyframes: Option<serde_json::Value>,
    /// Tween registrations on the parent targeting this node.
    #[serde(default)]
    tweens: Vec<DocumentTween>,
    #[serde(default)]
    children: Vec<DocumentNode>,
}

#[derive(Deserialize)]
struct DocumentWindow {
    start: FrameIndex,
    duration: FrameIndex,
}

#[derive(Deserialize)]
struct DocumentTween {
    properties: serde_json::Value,
    start: FrameIndex,
    duration: FrameIndex,
}

/// Result of loading a timeline document.
#[derive(Debug)]
pub struct LoadedDocument {
    /// The document's root node, left detached.
    pub root: NodeId,
    /// Ids of every named node in the document.
    pub named: HashMap<String, NodeId>,
}

/// Load a timeline document from a JSON string and build its node tree on
/// `stage`.
///
/// # Example
/// ```rust
/// use frameline_core::loaders::load_document;
/// use frameline_core::Stage;
///
/// let json = r#"
/// {
///   "framerate": 24,
///   "labels": { "intro": 0 },
///   "children": [
///     {
///       "name": "star",
///       "mode": "synched",
///       "windows": [ { "start": 0, "duration": 24 } ],
///       "keyframes": "0x0y0 12x100"
///     }
///   ]
/// }
/// "#;
///
/// let mut stage = Stage::new();
/// let loaded = load_document(&mut stage, json).unwrap();
/// let root = stage.root();
/// stage.attach(root, loaded.root).unwrap();
/// assert!(loaded.named.contains_key("star"));
/// ```
pub fn load_document(stage: &mut Stage, json: &str) -> Result<LoadedDocument, TimelineError> {
    let document: DocumentNode = serde_json::from_str(json)?;
    let mut named = HashMap::new();
    let root = build_node(stage, &document, &mut named)?;
    Ok(LoadedDocument { root, named })
}

fn build_node(
    stage: &mut Stage,
    document: &DocumentNode,
    named: &mut HashMap<String, NodeId>,
) -> Result<NodeId, TimelineError> {
    let id = stage.create_animated_node(document.config.clone());
    if let Some(name) = &document.name {
        named.insert(name.clone(), id);
    }

    for child_document in &document.children {
        let child = build_node(stage, child_document, named)?;

        if child_document.windows.is_empty() {
            stage.attach(id, child)?;
        } else {
            for window in &child_document.windows {
                stage.add_timed_child(id, child, window.start, window.duration)?;
            }
        }

        if let Some(keyframes) = &child_document.keyframes {
            stage.add_keyframes(id, child, KeyframeData::from_json(keyframes)?)?;
        }

        for tween in &child_document.tweens {
            let properties = PropertySet::from_json(&tween.properties)?;
            stage.add_tween(id, child, properties, tween.start, tween.duration, None)?;
        }
    }

    Ok(id)
}
