//! Grid hash with index-linked node pools.
//!
//! Each layer owns a bucket head table (`hash_size` entries) and a node pool.
//! Buckets are singly linked lists threaded through `SpatialNode::next`, with
//! [`NULL_INDEX`] terminating them. Nodes remember their exact grid cell, so
//! a walk can reject hash collisions from other cells.

use tracing::warn;

/// Null link / empty bucket sentinel.
pub const NULL_INDEX: u32 = u32::MAX;

/// Most cells one box may cover along each axis.
pub const MAX_CELL_SPAN: i32 = 256;

/// Multipliers of the integer cell hash.
const HASH_PRIME_X: u32 = 73_856_093;
const HASH_PRIME_Y: u32 = 19_349_663;

/// One (entity, cell) membership.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpatialNode {
    pub entity_id: u32,
    pub next: u32,
    pub grid_x: i16,
    pub grid_y: i16,
    _pad: u32,
}

static_assertions::assert_eq_size!(SpatialNode, [u8; 16]);

impl SpatialNode {
    const EMPTY: Self = Self {
        entity_id: NULL_INDEX,
        next: NULL_INDEX,
        grid_x: 0,
        grid_y: 0,
        _pad: 0,
    };
}

/// Axis-aligned box in world units, `(x, y)` being the top-left corner.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Aabb {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Box of size `(w, h)` whose anchor point `(x, y)` sits at the
    /// normalized `pivot` inside it.
    pub fn from_pivot(x: f32, y: f32, w: f32, h: f32, pivot_x: f32, pivot_y: f32) -> Self {
        Self::new(x - w * pivot_x, y - h * pivot_y, w, h)
    }
}

/// Sizes of a [`SpatialHash`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpatialHashConfig {
    /// `log2(cell_size)`.
    pub grid_shift: u32,
    /// Bucket count; rounded up to a power of two.
    pub hash_size: u32,
    pub max_static: u32,
    pub max_dynamic: u32,
    /// Entity ids must be below this.
    pub max_entities: u32,
}

impl Default for SpatialHashConfig {
    fn default() -> Self {
        Self {
            grid_shift: 7,
            hash_size: 4096,
            max_static: 40_000,
            max_dynamic: 20_000,
            max_entities: 10_000,
        }
    }
}

// ---------------------------------------------------------------------------
// Layer
// ---------------------------------------------------------------------------

struct Layer {
    heads: Vec<u32>,
    nodes: Vec<SpatialNode>,
    /// Bump pointer into `nodes`.
    pool_idx: u32,
    /// Head of the recycled-node list (static layer only).
    free_head: u32,
    live: u32,
}

impl Layer {
    fn new(buckets: usize, pool: u32) -> Self {
        Self {
            heads: vec![NULL_INDEX; buckets],
            nodes: vec![SpatialNode::EMPTY; pool as usize],
            pool_idx: 0,
            free_head: NULL_INDEX,
            live: 0,
        }
    }

    fn clear(&mut self) {
        self.heads.fill(NULL_INDEX);
        self.pool_idx = 0;
        self.free_head = NULL_INDEX;
        self.live = 0;
    }

    fn alloc(&mut self) -> Option<u32> {
        if self.free_head != NULL_INDEX {
            let idx = self.free_head;
            self.free_head = self.nodes[idx as usize].next;
            return Some(idx);
        }
        if (self.pool_idx as usize) < self.nodes.len() {
            let idx = self.pool_idx;
            self.pool_idx += 1;
            return Some(idx);
        }
        None
    }

    fn link(&mut self, bucket: usize, idx: u32, entity_id: u32, cx: i16, cy: i16) {
        self.nodes[idx as usize] = SpatialNode {
            entity_id,
            next: self.heads[bucket],
            grid_x: cx,
            grid_y: cy,
            _pad: 0,
        };
        self.heads[bucket] = idx;
        self.live += 1;
    }

    fn release(&mut self, idx: u32) {
        self.nodes[idx as usize] = SpatialNode {
            next: self.free_head,
            ..SpatialNode::EMPTY
        };
        self.free_head = idx;
        self.live -= 1;
    }
}

// ---------------------------------------------------------------------------
// SpatialHash
// ---------------------------------------------------------------------------

/// Static + dynamic grid hash over entity slot ids.
pub struct SpatialHash {
    shift: u32,
    hash_mask: u32,
    static_layer: Layer,
    dynamic_layer: Layer,
    last_seen_frame: Vec<u32>,
    query_frame: u32,
    static_epoch: u32,
}

impl Default for SpatialHash {
    fn default() -> Self {
        Self::new(SpatialHashConfig::default())
    }
}

impl SpatialHash {
    pub fn new(config: SpatialHashConfig) -> Self {
        let buckets = config.hash_size.max(1).next_power_of_two();
        Self {
            shift: config.grid_shift,
            hash_mask: buckets - 1,
            static_layer: Layer::new(buckets as usize, config.max_static),
            dynamic_layer: Layer::new(buckets as usize, config.max_dynamic),
            last_seen_frame: vec![0; config.max_entities as usize],
            query_frame: 0,
            static_epoch: 0,
        }
    }

    /// Cell edge length in world units.
    pub fn cell_size(&self) -> u32 {
        1 << self.shift
    }

    pub fn bucket_count(&self) -> usize {
        self.static_layer.heads.len()
    }

    /// Nodes currently linked into the static layer.
    pub fn static_len(&self) -> u32 {
        self.static_layer.live
    }

    /// Bumped every time the static layer is wiped, so owners of static
    /// entries can tell their insertions are gone.
    pub fn static_epoch(&self) -> u32 {
        self.static_epoch
    }

    /// Nodes currently linked into the dynamic layer.
    pub fn dynamic_len(&self) -> u32 {
        self.dynamic_layer.live
    }

    /// Bucket index of a cell.
    #[inline]
    pub fn hash(&self, cx: i32, cy: i32) -> usize {
        (((cx as u32).wrapping_mul(HASH_PRIME_X) ^ (cy as u32).wrapping_mul(HASH_PRIME_Y))
            & self.hash_mask) as usize
    }

    /// Inclusive cell range `(min_x, min_y, max_x, max_y)` covered by a box.
    ///
    /// Cells are clamped to the `i16` grid nodes can store, and each axis
    /// covers at most [`MAX_CELL_SPAN`] cells starting from the minimum.
    pub fn cell_span(&self, aabb: Aabb) -> (i32, i32, i32, i32) {
        let x0 = aabb.x.floor() as i32;
        let y0 = aabb.y.floor() as i32;
        let x1 = (aabb.x + aabb.w).floor() as i32;
        let y1 = (aabb.y + aabb.h).floor() as i32;
        let (cx0, cx1) = clamp_axis(x0 >> self.shift, x1.max(x0) >> self.shift);
        let (cy0, cy1) = clamp_axis(y0 >> self.shift, y1.max(y0) >> self.shift);
        (cx0, cy0, cx1, cy1)
    }

    // -----------------------------------------------------------------------
    // Insertion / removal
    // -----------------------------------------------------------------------

    /// Add an entity to every cell its box overlaps in the persistent layer.
    ///
    /// Returns `false` if the id is out of range or the node pool ran out
    /// part-way (a warning is logged; remaining cells are skipped).
    pub fn add_static(&mut self, entity_id: u32, aabb: Aabb) -> bool {
        if entity_id as usize >= self.last_seen_frame.len() {
            return false;
        }
        let (x0, y0, x1, y1) = self.cell_span(aabb);
        for cy in y0..=y1 {
            for cx in x0..=x1 {
                let bucket = self.hash(cx, cy);
                let Some(idx) = self.static_layer.alloc() else {
                    warn!(
                        "Static spatial pool exhausted ({} nodes), entity {entity_id} partially inserted",
                        self.static_layer.nodes.len()
                    );
                    return false;
                };
                self.static_layer
                    .link(bucket, idx, entity_id, cx as i16, cy as i16);
            }
        }
        true
    }

    /// Unlink every static node of `entity_id` inside the box's cells and
    /// recycle them. Returns the number of nodes removed.
    pub fn remove_static(&mut self, entity_id: u32, aabb: Aabb) -> u32 {
        let (x0, y0, x1, y1) = self.cell_span(aabb);
        let mut removed = 0;
        for cy in y0..=y1 {
            for cx in x0..=x1 {
                let bucket = self.hash(cx, cy);
                let (gx, gy) = (cx as i16, cy as i16);
                let mut prev = NULL_INDEX;
                let mut cur = self.static_layer.heads[bucket];
                while cur != NULL_INDEX {
                    let node = self.static_layer.nodes[cur as usize];
                    if node.entity_id == entity_id && node.grid_x == gx && node.grid_y == gy {
                        if prev == NULL_INDEX {
                            self.static_layer.heads[bucket] = node.next;
                        } else {
                            self.static_layer.nodes[prev as usize].next = node.next;
                        }
                        self.static_layer.release(cur);
                        removed += 1;
                    } else {
                        prev = cur;
                    }
                    cur = node.next;
                }
            }
        }
        removed
    }

    /// Add an entity to the per-frame layer. Fails silently (returns `false`)
    /// when the pool is exhausted.
    pub fn add_dynamic(&mut self, entity_id: u32, aabb: Aabb) -> bool {
        if entity_id as usize >= self.last_seen_frame.len() {
            return false;
        }
        let (x0, y0, x1, y1) = self.cell_span(aabb);
        for cy in y0..=y1 {
            for cx in x0..=x1 {
                let bucket = self.hash(cx, cy);
                let Some(idx) = self.dynamic_layer.alloc() else {
                    return false;
                };
                self.dynamic_layer
                    .link(bucket, idx, entity_id, cx as i16, cy as i16);
            }
        }
        true
    }

    /// Drop the per-frame layer.
    pub fn clear_dynamic(&mut self) {
        self.dynamic_layer.clear();
    }

    /// Drop the persistent layer.
    pub fn clear_static(&mut self) {
        self.static_layer.clear();
        self.static_epoch = self.static_epoch.wrapping_add(1);
    }

    /// Drop both layers.
    pub fn clear_all(&mut self) {
        self.clear_static();
        self.clear_dynamic();
    }

    // -----------------------------------------------------------------------
    // Query
    // -----------------------------------------------------------------------

    fn next_query_frame(&mut self) -> u32 {
        self.query_frame = self.query_frame.wrapping_add(1);
        if self.query_frame == 0 {
            self.last_seen_frame.fill(0);
            self.query_frame = 1;
        }
        self.query_frame
    }

    /// Collect the unique ids of entities in the box's cells, static layer
    /// first. Writes at most `out.len()` ids and returns how many.
    pub fn query(&mut self, aabb: Aabb, out: &mut [u32]) -> usize {
        let max = out.len();
        if max == 0 {
            return 0;
        }
        let frame = self.next_query_frame();
        let (x0, y0, x1, y1) = self.cell_span(aabb);
        let mut count = 0;

        for cy in y0..=y1 {
            for cx in x0..=x1 {
                let bucket = self.hash(cx, cy);
                let (gx, gy) = (cx as i16, cy as i16);
                for layer in [&self.static_layer, &self.dynamic_layer] {
                    let mut cur = layer.heads[bucket];
                    while cur != NULL_INDEX {
                        let node = &layer.nodes[cur as usize];
                        cur = node.next;
                        if node.grid_x != gx || node.grid_y != gy {
                            continue;
                        }
                        let seen = &mut self.last_seen_frame[node.entity_id as usize];
                        if *seen == frame {
                            continue;
                        }
                        *seen = frame;
                        out[count] = node.entity_id;
                        count += 1;
                        if count >= max {
                            return count;
                        }
                    }
                }
            }
        }
        count
    }

    /// Number of nodes (both layers) sitting in one cell.
    pub fn cell_population(&self, cx: i32, cy: i32) -> u32 {
        let bucket = self.hash(cx, cy);
        let (gx, gy) = (cx as i16, cy as i16);
        let mut total = 0;
        for layer in [&self.static_layer, &self.dynamic_layer] {
            let mut cur = layer.heads[bucket];
            while cur != NULL_INDEX {
                let node = &layer.nodes[cur as usize];
                if node.grid_x == gx && node.grid_y == gy {
                    total += 1;
                }
                cur = node.next;
            }
        }
        total
    }

    #[cfg(test)]
    fn set_query_frame(&mut self, frame: u32) {
        self.query_frame = frame;
    }
}

fn clamp_axis(min: i32, max: i32) -> (i32, i32) {
    let lo = i32::from(i16::MIN);
    let hi = i32::from(i16::MAX);
    let min = min.clamp(lo, hi);
    let max = max.clamp(min, hi).min(min + MAX_CELL_SPAN - 1);
    (min, max)
}
