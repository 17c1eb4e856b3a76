//! Loaders for external timeline data formats.

pub mod timeline_document;

pub use timeline_document::{load_document, LoadedDocument};
