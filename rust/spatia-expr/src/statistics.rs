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

use arrow_array::BinaryArray;
use datafusion_common::{stats::Precision, ColumnStatistics, DataFusionError, Result, ScalarValue};
use parking_lot::Mutex;
use spatia_geometry::{
    bounds::get_extent, error::SpatiaGeometryError, extent::GeometryExtent,
    types::GeometryTypeSet, wkb_reader::geometry_type,
};

use crate::serialize::{
    BinaryDeserializer, BinarySerializer, PropertyDeserializer, PropertySerializer,
};

/// Outcome of checking a predicate value against column statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZonemapResult {
    /// Some row may match; the column must be scanned
    NoPruningPossible,
    /// No row can match; the column (or row group) may be skipped
    AlwaysFalse,
}

/// Column-level aggregate of geometry bounds and types
///
/// Statistics start either from [GeometryStatistics::create_empty], which
/// rules everything out until values are added, or from
/// [GeometryStatistics::create_unknown], which rules nothing out. Partial
/// aggregates computed on separate threads can be combined with
/// [GeometryStatistics::merge] in any order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometryStatistics {
    bbox: GeometryExtent,
    types: GeometryTypeSet,
}

impl Default for GeometryStatistics {
    fn default() -> Self {
        Self::create_empty()
    }
}

impl GeometryStatistics {
    pub fn new(bbox: GeometryExtent, types: GeometryTypeSet) -> Self {
        Self { bbox, types }
    }

    /// Statistics that claim nothing about the column
    pub fn create_unknown() -> Self {
        Self {
            bbox: GeometryExtent::unknown(),
            types: GeometryTypeSet::unknown(),
        }
    }

    /// Statistics for a column with no values
    pub fn create_empty() -> Self {
        Self {
            bbox: GeometryExtent::empty(),
            types: GeometryTypeSet::new(),
        }
    }

    pub fn bbox(&self) -> &GeometryExtent {
        &self.bbox
    }

    pub fn types(&self) -> &GeometryTypeSet {
        &self.types
    }

    /// Account for one geometry blob
    ///
    /// The statistics are unchanged if the blob is invalid. Empty geometries
    /// contribute their type but not their bounds.
    pub fn update(&mut self, blob: &[u8]) -> Result<()> {
        let (count, extent) = get_extent(blob).map_err(geometry_err)?;
        let type_and_dims = geometry_type(blob).map_err(geometry_err)?;

        if count != 0 {
            self.bbox.extend(&extent);
        }
        self.types.insert_or_ignore(&type_and_dims);
        Ok(())
    }

    /// Account for every non-null blob in an array
    pub fn update_batch(&mut self, array: &BinaryArray) -> Result<()> {
        let mut partial = *self;
        for blob in array.iter().flatten() {
            partial.update(blob)?;
        }

        *self = partial;
        Ok(())
    }

    /// Union the bounds and types of `other` into these statistics
    pub fn merge(&mut self, other: &Self) {
        log::trace!("Merging geometry statistics {other} into {self}");
        self.bbox.extend(&other.bbox);
        self.types.merge(&other.types);
    }

    /// Check whether a filter against `value` can possibly match this column
    ///
    /// Bounding boxes can only prove that nothing matches, so this never reports
    /// that every row matches. A null value cannot be used for pruning. A value
    /// without any vertex cannot intersect anything.
    pub fn check_zonemap(&self, value: Option<&[u8]>) -> Result<ZonemapResult> {
        let Some(blob) = value else {
            return Ok(ZonemapResult::NoPruningPossible);
        };

        let (count, extent) = get_extent(blob).map_err(geometry_err)?;
        if count == 0 || !self.bbox.intersects(&extent) {
            return Ok(ZonemapResult::AlwaysFalse);
        }

        Ok(ZonemapResult::NoPruningPossible)
    }

    /// Write these statistics as keyed properties
    ///
    /// Only the x/y bounds are persisted. Type words equal to zero are omitted.
    pub fn serialize(&self, serializer: &mut impl PropertySerializer) -> Result<()> {
        serializer.write_property(200, "xmin", &self.bbox.min_x)?;
        serializer.write_property(201, "xmax", &self.bbox.max_x)?;
        serializer.write_property(202, "ymin", &self.bbox.min_y)?;
        serializer.write_property(203, "ymax", &self.bbox.max_y)?;

        let words = self.types.words();
        serializer.write_property_with_default(210, "xy_bitset", &words[0])?;
        serializer.write_property_with_default(211, "xyz_bitset", &words[1])?;
        serializer.write_property_with_default(212, "xym_bitset", &words[2])?;
        serializer.write_property_with_default(213, "xyzm_bitset", &words[3])?;
        Ok(())
    }

    /// Read statistics written by [GeometryStatistics::serialize]
    pub fn deserialize(deserializer: &mut impl PropertyDeserializer) -> Result<Self> {
        let min_x = deserializer.read_property(200, "xmin")?;
        let max_x = deserializer.read_property(201, "xmax")?;
        let min_y = deserializer.read_property(202, "ymin")?;
        let max_y = deserializer.read_property(203, "ymax")?;
        let bbox = GeometryExtent::xy(min_x, min_y, max_x, max_y);

        let words = [
            deserializer.read_property_with_default(210, "xy_bitset")?,
            deserializer.read_property_with_default(211, "xyz_bitset")?,
            deserializer.read_property_with_default(212, "xym_bitset")?,
            deserializer.read_property_with_default(213, "xyzm_bitset")?,
        ];

        Ok(Self {
            bbox,
            types: GeometryTypeSet::from_words(words),
        })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut serializer = BinarySerializer::new();
        self.serialize(&mut serializer)?;
        Ok(serializer.finish())
    }

    pub fn try_from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut deserializer = BinaryDeserializer::try_new(bytes)?;
        Self::deserialize(&mut deserializer)
    }

    /// Try to recover statistics stored by [GeometryStatistics::to_column_statistics]
    ///
    /// Returns `None` if the column statistics do not carry a serialized value.
    pub fn try_from_column_statistics(stats: &ColumnStatistics) -> Result<Option<Self>> {
        let scalar = match &stats.sum_value {
            Precision::Exact(value) => value,
            _ => {
                return Ok(None);
            }
        };

        if let ScalarValue::Binary(Some(serialized)) = scalar {
            Self::try_from_bytes(serialized).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Place these statistics into a [ColumnStatistics] for transport
    ///
    /// [ColumnStatistics] has no slot for spatial information, so the serialized
    /// bytes travel in the sum value.
    pub fn to_column_statistics(&self) -> Result<ColumnStatistics> {
        let serialized = self.to_bytes()?;
        Ok(ColumnStatistics::new_unknown()
            .with_sum_value(Precision::Exact(ScalarValue::Binary(Some(serialized)))))
    }
}

impl Display for GeometryStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[Extent: {}, Types: [{}]]",
            self.bbox,
            self.types.format(false).join(", ")
        )
    }
}

/// [GeometryStatistics] shared by concurrent scanners of one column
#[derive(Debug, Default)]
pub struct SharedGeometryStatistics {
    inner: Mutex<GeometryStatistics>,
}

impl SharedGeometryStatistics {
    pub fn new(initial: GeometryStatistics) -> Self {
        Self {
            inner: Mutex::new(initial),
        }
    }

    pub fn update(&self, blob: &[u8]) -> Result<()> {
        self.inner.lock().update(blob)
    }

    /// Merge a thread-local partial aggregate
    pub fn merge_from(&self, partial: &GeometryStatistics) {
        self.inner.lock().merge(partial);
    }

    pub fn snapshot(&self) -> GeometryStatistics {
        *self.inner.lock()
    }

    pub fn into_inner(self) -> GeometryStatistics {
        self.inner.into_inner()
    }
}

fn geometry_err(err: SpatiaGeometryError) -> DataFusionError {
    DataFusionError::External(Box::new(err))
}
