//! Uniform spatial hash grid for approximate neighbour queries
//!
//! The grid is rebuilt from node positions every frame. [`SpatialGrid::query`]
//! returns everything in the 3×3 block of cells around a point, which is a
//! superset of "nearby" only within one cell of the query; callers filter by
//! distance themselves.

use std::collections::HashMap;

use crate::types::Node;

/// Default cell size in pixels
pub const DEFAULT_CELL_SIZE: f32 = 80.0;

/// Grid cell coordinate
pub type Cell = (i32, i32);

#[derive(Debug, Clone)]
pub struct SpatialGrid {
    cell_size: f32,
    cells: HashMap<Cell, Vec<usize>>,
}

impl SpatialGrid {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size,
            cells: HashMap::new(),
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Cell containing the given point
    pub fn cell_of(&self, x: f32, y: f32) -> Cell {
        (
            (x / self.cell_size).floor() as i32,
            (y / self.cell_size).floor() as i32,
        )
    }

    /// Empty every bucket.
    ///
    /// Buckets that were occupied keep their allocation for the next
    /// rebuild; buckets already empty are dropped, so the key set only
    /// covers cells used in the last two frames.
    pub fn clear(&mut self) {
        self.cells.retain(|_, bucket| {
            let occupied = !bucket.is_empty();
            bucket.clear();
            occupied
        });
    }

    /// Number of allocated buckets, occupied or not
    pub fn bucket_count(&self) -> usize {
        self.cells.len()
    }

    pub fn insert(&mut self, index: usize, x: f32, y: f32) {
        let cell = self.cell_of(x, y);
        self.cells.entry(cell).or_default().push(index);
    }

    /// Discard the previous contents and index every node by position
    pub fn rebuild(&mut self, nodes: &[Node]) {
        self.clear();
        for (i, node) in nodes.iter().enumerate() {
            self.insert(i, node.x, node.y);
        }
    }

    /// Indices in the 3×3 block of cells centred on the cell holding (x, y)
    pub fn query(&self, x: f32, y: f32) -> Vec<usize> {
        let mut result = Vec::new();
        self.query_into(x, y, &mut result);
        result
    }

    /// Like [`query`](Self::query) but appends into a reusable buffer
    pub fn query_into(&self, x: f32, y: f32, out: &mut Vec<usize>) {
        let (cx, cy) = self.cell_of(x, y);
        for dx in -1..=1 {
            for dy in -1..=1 {
                if let Some(bucket) = self.cells.get(&(cx.saturating_add(dx), cy.saturating_add(dy))) {
                    out.extend_from_slice(bucket);
                }
            }
        }
    }

    /// Number of indexed entries
    pub fn len(&self) -> usize {
        self.cells.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SpatialGrid {
    fn default() -> Self {
        Self::new(DEFAULT_CELL_SIZE)
    }
}
