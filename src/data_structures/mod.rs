//! Scene data: nodes, transforms, geometries, materials and colours.
//!
//! - `color` holds sRGB colours and their linear conversion
//! - `geometry` contains vertex/index data and the box and plane generators
//! - `instance` holds node transforms and the per-instance GPU layout
//! - `material` contains the shared, live-editable surface material
//! - `scene_graph` is the node hierarchy plus the scene root and fog
//! - `texture` wraps the depth buffer texture

use std::sync::atomic::{AtomicU64, Ordering};

pub mod color;
pub mod geometry;
pub mod instance;
pub mod material;
pub mod scene_graph;
pub mod texture;

/// Identity of a GPU-backed resource (geometry or material).
///
/// Renderers key their uploaded buffers by this id, and disposal uses it to
/// release every distinct resource exactly once.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(u64);

impl ResourceId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}
