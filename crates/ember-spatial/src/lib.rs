//! Dual-layer uniform-grid spatial hash.
//!
//! The static layer persists across frames and supports removal; the dynamic
//! layer is rebuilt every physics tick. Both share one grid and one query,
//! which deduplicates results with a per-entity frame stamp.

mod spatial_hash;

pub use spatial_hash::{
    Aabb, MAX_CELL_SPAN, NULL_INDEX, SpatialHash, SpatialHashConfig, SpatialNode,
};
