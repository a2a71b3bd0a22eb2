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

use serde::{Deserialize, Serialize};

/// Axis-aligned bounds of a geometry or of a set of geometries
///
/// Each axis is stored as a `[min, max]` pair. [GeometryExtent::empty] inverts the
/// bounds so that the first call to [GeometryExtent::extend] establishes them, and
/// [GeometryExtent::unknown] spans every axis so that it overlaps anything.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeometryExtent {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
    pub min_z: f64,
    pub max_z: f64,
    pub min_m: f64,
    pub max_m: f64,
}

impl Default for GeometryExtent {
    fn default() -> Self {
        Self::empty()
    }
}

impl GeometryExtent {
    /// An extent containing nothing
    pub fn empty() -> Self {
        Self {
            min_x: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            min_y: f64::INFINITY,
            max_y: f64::NEG_INFINITY,
            min_z: f64::INFINITY,
            max_z: f64::NEG_INFINITY,
            min_m: f64::INFINITY,
            max_m: f64::NEG_INFINITY,
        }
    }

    /// An extent for which nothing can be ruled out
    pub fn unknown() -> Self {
        Self {
            min_x: f64::NEG_INFINITY,
            max_x: f64::INFINITY,
            min_y: f64::NEG_INFINITY,
            max_y: f64::INFINITY,
            min_z: f64::NEG_INFINITY,
            max_z: f64::INFINITY,
            min_m: f64::NEG_INFINITY,
            max_m: f64::INFINITY,
        }
    }

    /// An XY extent
    pub fn xy(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
            ..Self::empty()
        }
    }

    /// True if no x/y coordinate has been added
    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    /// True if a finite z range has been recorded
    pub fn has_z(&self) -> bool {
        self.min_z.is_finite() && self.max_z.is_finite() && self.min_z <= self.max_z
    }

    /// True if a finite m range has been recorded
    pub fn has_m(&self) -> bool {
        self.min_m.is_finite() && self.max_m.is_finite() && self.min_m <= self.max_m
    }

    /// Extend by a single x/y coordinate
    pub fn extend_xy(&mut self, x: f64, y: f64) {
        self.min_x = self.min_x.min(x);
        self.max_x = self.max_x.max(x);
        self.min_y = self.min_y.min(y);
        self.max_y = self.max_y.max(y);
    }

    /// Extend the z range by a single value
    pub fn extend_z(&mut self, z: f64) {
        self.min_z = self.min_z.min(z);
        self.max_z = self.max_z.max(z);
    }

    /// Extend the m range by a single value
    pub fn extend_m(&mut self, m: f64) {
        self.min_m = self.min_m.min(m);
        self.max_m = self.max_m.max(m);
    }

    /// Grow this extent to the union of itself and `other` on every axis
    pub fn extend(&mut self, other: &Self) {
        self.min_x = self.min_x.min(other.min_x);
        self.max_x = self.max_x.max(other.max_x);
        self.min_y = self.min_y.min(other.min_y);
        self.max_y = self.max_y.max(other.max_y);
        self.min_z = self.min_z.min(other.min_z);
        self.max_z = self.max_z.max(other.max_z);
        self.min_m = self.min_m.min(other.min_m);
        self.max_m = self.max_m.max(other.max_m);
    }

    /// Inclusive x/y overlap test
    ///
    /// Extents that only share an edge or a corner intersect.
    pub fn intersects(&self, other: &Self) -> bool {
        !(self.min_x > other.max_x
            || self.max_x < other.min_x
            || self.min_y > other.max_y
            || self.max_y < other.min_y)
    }

    /// True if `other` lies within this extent on x and y
    pub fn contains(&self, other: &Self) -> bool {
        self.min_x <= other.min_x
            && self.max_x >= other.max_x
            && self.min_y <= other.min_y
            && self.max_y >= other.max_y
    }
}

impl Display for GeometryExtent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[XMin: {}, XMax: {}, YMin: {}, YMax: {}]",
            self.min_x, self.max_x, self.min_y, self.max_y
        )
    }
}
