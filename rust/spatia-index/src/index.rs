// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.
use std::fmt::Display;

use datafusion_common::{plan_err, Result};
use spatia_geometry::extent::GeometryExtent;

use crate::builder::SpatialIndexBuilder;

/// One entry of the flat index storage
///
/// For a leaf, `index` is the row id it was added with. For an internal node it is
/// the offset of the node's first child in [PackedHilbertIndex::boxes].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexBox {
    pub index: usize,
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl IndexBox {
    /// A box that any union replaces
    pub(crate) fn inverted(index: usize) -> Self {
        Self {
            index,
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
        }
    }

    pub(crate) fn union(&mut self, other: &Self) {
        self.min_x = self.min_x.min(other.min_x);
        self.min_y = self.min_y.min(other.min_y);
        self.max_x = self.max_x.max(other.max_x);
        self.max_y = self.max_y.max(other.max_y);
    }

    /// Inclusive overlap test; boxes that share an edge or corner intersect
    #[inline]
    pub fn intersects(&self, min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> bool {
        !(self.min_x > max_x || self.max_x < min_x || self.min_y > max_y || self.max_y < min_y)
    }
}

impl Display for IndexBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "#{} [{}, {}, {}, {}]",
            self.index, self.min_x, self.min_y, self.max_x, self.max_y
        )
    }
}

/// Immutable bounding box index packed from Hilbert-sorted leaves
///
/// Leaves occupy `boxes[0..level_bounds[0]]`, each following level is appended
/// after the one below it and the root is the last box. The index never changes
/// after it is built and may be searched concurrently.
#[derive(Debug, Clone)]
pub struct PackedHilbertIndex {
    node_size: usize,
    num_items: usize,
    boxes: Vec<IndexBox>,
    level_bounds: Vec<usize>,
    total_bounds: IndexBox,
}

impl PackedHilbertIndex {
    pub(crate) fn new(
        node_size: usize,
        num_items: usize,
        boxes: Vec<IndexBox>,
        level_bounds: Vec<usize>,
        total_bounds: IndexBox,
    ) -> Self {
        Self {
            node_size,
            num_items,
            boxes,
            level_bounds,
            total_bounds,
        }
    }

    /// Row ids of every box that intersects the query box
    ///
    /// Results are unordered and contain each matching row once per time it was
    /// added.
    pub fn search(&self, min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Vec<usize> {
        let mut results = Vec::new();
        if self.num_items == 0 {
            return results;
        }

        // (offset of the first box of a node, level of that node's boxes)
        let mut stack = vec![(self.boxes.len() - 1, self.level_bounds.len() - 1)];

        while let Some((node_offset, level)) = stack.pop() {
            let end = (node_offset + self.node_size).min(self.level_bounds[level]);

            for child in &self.boxes[node_offset..end] {
                if !child.intersects(min_x, min_y, max_x, max_y) {
                    continue;
                }

                if node_offset < self.num_items {
                    results.push(child.index);
                } else {
                    stack.push((child.index, level - 1));
                }
            }
        }

        results
    }

    /// Row ids of every box that intersects the x/y bounds of `extent`
    pub fn search_extent(&self, extent: &GeometryExtent) -> Vec<usize> {
        if extent.is_empty() {
            return Vec::new();
        }

        self.search(extent.min_x, extent.min_y, extent.max_x, extent.max_y)
    }

    /// Bounds of every box in the index ([GeometryExtent::empty] if there are none)
    pub fn total_bounds(&self) -> GeometryExtent {
        if self.num_items == 0 {
            return GeometryExtent::empty();
        }

        GeometryExtent::xy(
            self.total_bounds.min_x,
            self.total_bounds.min_y,
            self.total_bounds.max_x,
            self.total_bounds.max_y,
        )
    }

    pub fn node_size(&self) -> usize {
        self.node_size
    }

    /// Number of leaves
    pub fn len(&self) -> usize {
        self.num_items
    }

    pub fn is_empty(&self) -> bool {
        self.num_items == 0
    }

    /// Number of levels including the leaves
    pub fn num_levels(&self) -> usize {
        self.level_bounds.len()
    }

    /// Cumulative box count at the end of each level
    pub fn level_bounds(&self) -> &[usize] {
        &self.level_bounds
    }

    /// Leaves followed by internal nodes, root last
    pub fn boxes(&self) -> &[IndexBox] {
        &self.boxes
    }
}

/// A spatial index whose build state is only known at runtime
///
/// Callers that cannot express the builder/index split in their types can hold
/// this instead. Adding after [SpatialIndex::build] and searching before it are
/// errors rather than silent no-ops.
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    state: IndexState,
}

#[derive(Debug, Clone)]
enum IndexState {
    Accumulating(SpatialIndexBuilder),
    Built(PackedHilbertIndex),
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new(SpatialIndexBuilder::new())
    }
}

impl SpatialIndex {
    pub fn new(builder: SpatialIndexBuilder) -> Self {
        Self {
            state: IndexState::Accumulating(builder),
        }
    }

    pub fn add(
        &mut self,
        row_id: usize,
        min_x: f64,
        min_y: f64,
        max_x: f64,
        max_y: f64,
    ) -> Result<()> {
        match &mut self.state {
            IndexState::Accumulating(builder) => builder.add(row_id, min_x, min_y, max_x, max_y),
            IndexState::Built(_) => {
                plan_err!("Can't add to a spatial index after it has been built")
            }
        }
    }

    pub fn build(&mut self) -> Result<()> {
        match &mut self.state {
            IndexState::Accumulating(builder) => {
                let builder = std::mem::take(builder);
                self.state = IndexState::Built(builder.build()?);
                Ok(())
            }
            IndexState::Built(_) => plan_err!("Spatial index has already been built"),
        }
    }

    pub fn is_built(&self) -> bool {
        matches!(self.state, IndexState::Built(_))
    }

    /// The built index, if [SpatialIndex::build] has been called
    pub fn index(&self) -> Option<&PackedHilbertIndex> {
        match &self.state {
            IndexState::Built(index) => Some(index),
            IndexState::Accumulating(_) => None,
        }
    }

    pub fn search(&self, min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Result<Vec<usize>> {
        match &self.state {
            IndexState::Built(index) => Ok(index.search(min_x, min_y, max_x, max_y)),
            IndexState::Accumulating(_) => {
                plan_err!("Can't search a spatial index before it has been built")
            }
        }
    }
}
