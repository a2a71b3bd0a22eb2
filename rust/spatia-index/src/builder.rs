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
use arrow_array::BinaryArray;
use datafusion_common::{plan_err, DataFusionError, Result};
use spatia_common::{option::IndexOptions, spatia_internal_err, DEFAULT_INDEX_NODE_SIZE};
use spatia_geometry::{bounds::get_extent, extent::GeometryExtent};

use crate::{
    hilbert::hilbert_key,
    index::{IndexBox, PackedHilbertIndex},
};

/// Collects boxes for a [PackedHilbertIndex]
///
/// The builder accepts a complete batch of `(row_id, box)` pairs and packs them
/// in a single pass when [SpatialIndexBuilder::build] is called. Building consumes
/// the builder, so nothing can be added to an index once it exists.
#[derive(Debug, Clone)]
pub struct SpatialIndexBuilder {
    node_size: usize,
    boxes: Vec<IndexBox>,
    total_bounds: IndexBox,
}

impl Default for SpatialIndexBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SpatialIndexBuilder {
    /// Create a builder with the default fan-out of 16
    pub fn new() -> Self {
        Self {
            node_size: DEFAULT_INDEX_NODE_SIZE,
            boxes: Vec::new(),
            total_bounds: IndexBox::inverted(0),
        }
    }

    /// Create a builder whose nodes hold at most `node_size` children
    pub fn try_new_with_node_size(node_size: usize) -> Result<Self> {
        if node_size < 2 {
            return plan_err!("Spatial index node size must be at least 2 but got {node_size}");
        }

        Ok(Self {
            node_size,
            ..Self::new()
        })
    }

    pub fn try_new_with_options(options: &IndexOptions) -> Result<Self> {
        Self::try_new_with_node_size(options.node_size)
    }

    /// Reserve room for `num_items` leaves and every node above them
    pub fn reserve(&mut self, num_items: usize) {
        let num_nodes = level_bounds(num_items, self.node_size)
            .last()
            .copied()
            .unwrap_or(num_items);
        self.boxes.reserve(num_nodes.saturating_sub(self.boxes.len()));
    }

    /// Add the box of one row
    ///
    /// Coordinates must be finite and each minimum must not exceed its maximum.
    pub fn add(
        &mut self,
        row_id: usize,
        min_x: f64,
        min_y: f64,
        max_x: f64,
        max_y: f64,
    ) -> Result<()> {
        let item = IndexBox {
            index: row_id,
            min_x,
            min_y,
            max_x,
            max_y,
        };

        if ![min_x, min_y, max_x, max_y].iter().all(|v| v.is_finite()) {
            return plan_err!("Spatial index boxes must have finite coordinates but got {item}");
        }

        if min_x > max_x || min_y > max_y {
            return plan_err!("Spatial index box has inverted bounds: {item}");
        }

        self.total_bounds.union(&item);
        self.boxes.push(item);
        Ok(())
    }

    /// Add the x/y bounds of a geometry extent
    ///
    /// Returns `false` without adding anything if the extent is empty.
    pub fn add_extent(&mut self, row_id: usize, extent: &GeometryExtent) -> Result<bool> {
        if extent.is_empty() {
            return Ok(false);
        }

        self.add(row_id, extent.min_x, extent.min_y, extent.max_x, extent.max_y)?;
        Ok(true)
    }

    /// Add every non-null, non-empty geometry of an array
    ///
    /// Row ids are the array positions shifted by `row_offset`. Returns the number
    /// of boxes added.
    pub fn add_geometries(&mut self, array: &BinaryArray, row_offset: usize) -> Result<usize> {
        let mut added = 0;
        for (i, blob) in array.iter().enumerate() {
            let Some(blob) = blob else {
                continue;
            };

            let (_, extent) =
                get_extent(blob).map_err(|e| DataFusionError::External(Box::new(e)))?;
            if self.add_extent(row_offset + i, &extent)? {
                added += 1;
            }
        }

        Ok(added)
    }

    pub fn node_size(&self) -> usize {
        self.node_size
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    /// Sort the leaves along the Hilbert curve and pack the tree bottom-up
    pub fn build(self) -> Result<PackedHilbertIndex> {
        let Self {
            node_size,
            mut boxes,
            total_bounds,
        } = self;

        let num_items = boxes.len();
        let level_bounds = level_bounds(num_items, node_size);

        if num_items > 0 {
            let width = total_bounds.max_x - total_bounds.min_x;
            let height = total_bounds.max_y - total_bounds.min_y;
            let mut keys: Vec<u32> = boxes
                .iter()
                .map(|item| {
                    hilbert_key(
                        item.min_x,
                        item.min_y,
                        total_bounds.min_x,
                        total_bounds.min_y,
                        width,
                        height,
                    )
                })
                .collect();

            sort_by_key(&mut keys, &mut boxes);

            let mut pos = 0;
            for &level_end in &level_bounds[..level_bounds.len() - 1] {
                while pos < level_end {
                    let run_end = (pos + node_size).min(level_end);
                    let mut node = IndexBox::inverted(pos);
                    for child in &boxes[pos..run_end] {
                        node.union(child);
                    }

                    boxes.push(node);
                    pos = run_end;
                }
            }

            if level_bounds.last() != Some(&boxes.len()) {
                return spatia_internal_err!(
                    "Packed index has {} nodes but its levels end at {:?}",
                    boxes.len(),
                    level_bounds
                );
            }
        }

        log::debug!(
            "Built packed Hilbert index with {num_items} items, {} levels and {} nodes",
            level_bounds.len(),
            boxes.len()
        );

        Ok(PackedHilbertIndex::new(
            node_size,
            num_items,
            boxes,
            level_bounds,
            total_bounds,
        ))
    }
}

/// Cumulative node counts at the end of each level, leaves first
///
/// The last level always holds exactly one node, even for a single item.
pub(crate) fn level_bounds(num_items: usize, node_size: usize) -> Vec<usize> {
    let mut n = num_items;
    let mut num_nodes = n;
    let mut bounds = vec![num_nodes];
    loop {
        n = n.div_ceil(node_size);
        num_nodes += n;
        bounds.push(num_nodes);
        if n <= 1 {
            break;
        }
    }

    bounds
}

/// Sort `keys` ascending, applying the same permutation to `boxes`
///
/// Hoare partition quicksort. Equal keys may end up in any order. Recursion
/// only descends into the smaller partition so the stack stays logarithmic.
fn sort_by_key(keys: &mut [u32], boxes: &mut [IndexBox]) {
    let mut keys = keys;
    let mut boxes = boxes;

    while keys.len() > 1 {
        let split = partition(keys, boxes);
        let (left_keys, right_keys) = keys.split_at_mut(split);
        let (left_boxes, right_boxes) = boxes.split_at_mut(split);

        if left_keys.len() < right_keys.len() {
            sort_by_key(left_keys, left_boxes);
            keys = right_keys;
            boxes = right_boxes;
        } else {
            sort_by_key(right_keys, right_boxes);
            keys = left_keys;
            boxes = left_boxes;
        }
    }
}

// Returns a split point in 1..len such that every key before it is <= every key after it
fn partition(keys: &mut [u32], boxes: &mut [IndexBox]) -> usize {
    let pivot = keys[(keys.len() - 1) / 2];
    let mut i = 0;
    let mut j = keys.len() - 1;

    loop {
        while keys[i] < pivot {
            i += 1;
        }
        while keys[j] > pivot {
            j -= 1;
        }
        if i >= j {
            return j + 1;
        }

        keys.swap(i, j);
        boxes.swap(i, j);
        i += 1;
        j -= 1;
    }
}

#[cfg(test)]
mod test {
    use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(0, vec![0, 0])]
    #[case(1, vec![1, 2])]
    #[case(15, vec![15, 16])]
    #[case(16, vec![16, 17])]
    #[case(17, vec![17, 19, 20])]
    #[case(256, vec![256, 272, 273])]
    #[case(257, vec![257, 274, 276, 277])]
    fn level_bounds_default_node_size(#[case] num_items: usize, #[case] expected: Vec<usize>) {
        assert_eq!(level_bounds(num_items, 16), expected);
    }

    #[test]
    fn level_bounds_small_nodes() {
        assert_eq!(level_bounds(5, 2), vec![5, 8, 10, 11]);
    }

    #[test]
    fn sort_keeps_pairs_together() {
        let mut rng = StdRng::seed_from_u64(0x5EED);
        for len in [0, 1, 2, 3, 10, 100, 1000] {
            // Few distinct keys so that duplicates are common
            let mut keys: Vec<u32> = (0..len).map(|_| rng.gen_range(0..50)).collect();
            let mut boxes: Vec<IndexBox> = keys
                .iter()
                .map(|&key| IndexBox {
                    index: key as usize,
                    min_x: 0.0,
                    min_y: 0.0,
                    max_x: 0.0,
                    max_y: 0.0,
                })
                .collect();

            sort_by_key(&mut keys, &mut boxes);
            assert!(keys.windows(2).all(|w| w[0] <= w[1]), "len {len}");
            assert!(keys
                .iter()
                .zip(&boxes)
                .all(|(key, item)| *key as usize == item.index));
        }

        let mut keys: Vec<u32> = (0..500).collect();
        keys.shuffle(&mut rng);
        let mut boxes = vec![IndexBox::inverted(0); keys.len()];
        sort_by_key(&mut keys, &mut boxes);
        assert_eq!(keys, (0..500).collect::<Vec<_>>());

        let mut keys = vec![7u32; 64];
        let mut boxes = vec![IndexBox::inverted(0); keys.len()];
        sort_by_key(&mut keys, &mut boxes);
        assert_eq!(keys, vec![7u32; 64]);
    }

    #[test]
    fn node_size() {
        assert_eq!(SpatialIndexBuilder::new().node_size(), 16);
        assert_eq!(
            SpatialIndexBuilder::try_new_with_node_size(4)
                .unwrap()
                .node_size(),
            4
        );

        let err = SpatialIndexBuilder::try_new_with_node_size(1).unwrap_err();
        assert!(err
            .to_string()
            .contains("node size must be at least 2 but got 1"));

        let options = IndexOptions { node_size: 8 };
        assert_eq!(
            SpatialIndexBuilder::try_new_with_options(&options)
                .unwrap()
                .node_size(),
            8
        );
    }

    #[test]
    fn add_validates_boxes() {
        let mut builder = SpatialIndexBuilder::new();
        builder.add(0, 0.0, 0.0, 1.0, 1.0).unwrap();
        builder.add(1, 2.0, 2.0, 2.0, 2.0).unwrap();
        assert!(builder.add(2, f64::NAN, 0.0, 1.0, 1.0).is_err());
        assert!(builder.add(3, 0.0, 0.0, f64::INFINITY, 1.0).is_err());
        assert!(builder.add(4, 1.0, 0.0, 0.0, 1.0).is_err());
        assert_eq!(builder.len(), 2);

        assert!(!builder.add_extent(5, &GeometryExtent::empty()).unwrap());
        assert!(builder
            .add_extent(6, &GeometryExtent::xy(-1.0, -1.0, 0.0, 0.0))
            .unwrap());
        assert_eq!(builder.len(), 3);
    }

    #[test]
    fn reserve() {
        let mut builder = SpatialIndexBuilder::new();
        builder.reserve(17);
        assert!(builder.boxes.capacity() >= 20);
        assert!(builder.is_empty());
    }

    #[test]
    fn build_packs_levels() {
        let mut builder = SpatialIndexBuilder::try_new_with_node_size(4).unwrap();
        for i in 0..10 {
            let v = i as f64;
            builder.add(i, v, v, v + 0.5, v + 0.5).unwrap();
        }

        let index = builder.build().unwrap();
        assert_eq!(index.level_bounds(), &[10, 13, 14]);
        assert_eq!(index.boxes().len(), 14);

        // Every internal node covers the boxes of its children
        let boxes = index.boxes();
        for level in 1..index.level_bounds().len() {
            let start = index.level_bounds()[level - 1];
            let end = index.level_bounds()[level];
            let child_level_end = start;
            for node in &boxes[start..end] {
                let child_end = (node.index + 4).min(child_level_end);
                for child in &boxes[node.index..child_end] {
                    assert!(node.min_x <= child.min_x && node.max_x >= child.max_x);
                    assert!(node.min_y <= child.min_y && node.max_y >= child.max_y);
                }
            }
        }

        let root = boxes[boxes.len() - 1];
        assert_eq!(
            (root.min_x, root.min_y, root.max_x, root.max_y),
            (0.0, 0.0, 9.5, 9.5)
        );
    }
}
