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
use std::{fmt::Display, str::FromStr};

use geo_traits::Dimensions;
use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};

use crate::error::SpatiaGeometryError;

/// Maximum nesting depth of multi-geometries and collections
///
/// A multi-geometry or collection starting at this depth (the outermost part has
/// depth 0) is rejected with [SpatiaGeometryError::DepthExceeded].
pub const MAX_GEOMETRY_DEPTH: usize = 16;

/// Geometry types
///
/// An enumerator for the set of natively supported geometry types without
/// considering [Dimensions]. See [GeometryTypeAndDimensions] for a struct to
/// track both.
///
/// This is named GeometryTypeId such that it does not conflict with
/// [geo_traits::GeometryType].
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, Hash, Clone, Copy)]
pub enum GeometryTypeId {
    /// Unknown or mixed geometry type
    Geometry,
    /// Point geometry type
    Point,
    /// LineString geometry type
    LineString,
    /// Polygon geometry type
    Polygon,
    /// MultiPoint geometry type
    MultiPoint,
    /// MultiLineString geometry type
    MultiLineString,
    /// MultiPolygon geometry type
    MultiPolygon,
    /// GeometryCollection geometry type
    GeometryCollection,
}

impl GeometryTypeId {
    /// Construct a geometry type from a WKB type integer
    ///
    /// Parses the geometry type (not dimension) component of a WKB type code (e.g.,
    /// 1 for Point...7 for GeometryCollection).
    pub fn try_from_wkb_id(wkb_id: u32) -> Result<Self, SpatiaGeometryError> {
        match wkb_id {
            0 => Ok(Self::Geometry),
            1 => Ok(Self::Point),
            2 => Ok(Self::LineString),
            3 => Ok(Self::Polygon),
            4 => Ok(Self::MultiPoint),
            5 => Ok(Self::MultiLineString),
            6 => Ok(Self::MultiPolygon),
            7 => Ok(Self::GeometryCollection),
            _ => Err(SpatiaGeometryError::Invalid(format!(
                "Unknown geometry type identifier {wkb_id}"
            ))),
        }
    }

    /// WKB integer identifier
    ///
    /// The GeometryType portion of the WKB identifier (e.g., 1 for Point...7 for GeometryCollection).
    pub fn wkb_id(&self) -> u32 {
        match self {
            Self::Geometry => 0,
            Self::Point => 1,
            Self::LineString => 2,
            Self::Polygon => 3,
            Self::MultiPoint => 4,
            Self::MultiLineString => 5,
            Self::MultiPolygon => 6,
            Self::GeometryCollection => 7,
        }
    }

    /// GeoJSON/GeoParquet string identifier
    ///
    /// The identifier used by GeoJSON and GeoParquet to refer to this geometry type.
    /// Use [FromStr] to parse such a string back into a GeometryTypeId.
    pub fn geojson_id(&self) -> &'static str {
        match self {
            Self::Geometry => "Geometry",
            Self::Point => "Point",
            Self::LineString => "LineString",
            Self::Polygon => "Polygon",
            Self::MultiPoint => "MultiPoint",
            Self::MultiLineString => "MultiLineString",
            Self::MultiPolygon => "MultiPolygon",
            Self::GeometryCollection => "GeometryCollection",
        }
    }

    /// Upper case keyword used by well-known text
    pub fn wkt_id(&self) -> &'static str {
        match self {
            Self::Geometry => "GEOMETRY",
            Self::Point => "POINT",
            Self::LineString => "LINESTRING",
            Self::Polygon => "POLYGON",
            Self::MultiPoint => "MULTIPOINT",
            Self::MultiLineString => "MULTILINESTRING",
            Self::MultiPolygon => "MULTIPOLYGON",
            Self::GeometryCollection => "GEOMETRYCOLLECTION",
        }
    }

    /// The geometry type of the children of a multi geometry
    ///
    /// Returns `None` for non-multi types. Collections may contain any type and
    /// also return `None`.
    pub fn multi_child(&self) -> Option<GeometryTypeId> {
        match self {
            Self::MultiPoint => Some(Self::Point),
            Self::MultiLineString => Some(Self::LineString),
            Self::MultiPolygon => Some(Self::Polygon),
            _ => None,
        }
    }

    /// True for multi geometries and collections
    pub fn is_collection(&self) -> bool {
        matches!(
            self,
            Self::MultiPoint | Self::MultiLineString | Self::MultiPolygon | Self::GeometryCollection
        )
    }
}

impl FromStr for GeometryTypeId {
    type Err = SpatiaGeometryError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value_lower = value.to_ascii_lowercase();
        match value_lower.as_str() {
            "geometry" => Ok(Self::Geometry),
            "point" => Ok(Self::Point),
            "linestring" => Ok(Self::LineString),
            "polygon" => Ok(Self::Polygon),
            "multipoint" => Ok(Self::MultiPoint),
            "multilinestring" => Ok(Self::MultiLineString),
            "multipolygon" => Ok(Self::MultiPolygon),
            "geometrycollection" => Ok(Self::GeometryCollection),
            _ => Err(SpatiaGeometryError::Invalid(format!(
                "Invalid geometry type string: '{value}'"
            ))),
        }
    }
}

/// Number of ordinates stored per vertex
pub fn vertex_width(dimensions: Dimensions) -> usize {
    match dimensions {
        Dimensions::Xy => 2,
        Dimensions::Xyz | Dimensions::Xym => 3,
        Dimensions::Xyzm => 4,
        Dimensions::Unknown(n) => n,
    }
}

/// Short name of a dimension (e.g., XYZ)
pub fn dimensions_name(dimensions: Dimensions) -> &'static str {
    match dimensions {
        Dimensions::Xy => "XY",
        Dimensions::Xyz => "XYZ",
        Dimensions::Xym => "XYM",
        Dimensions::Xyzm => "XYZM",
        Dimensions::Unknown(_) => "Unknown",
    }
}

/// The index of a standard dimension (0 for XY...3 for XYZM)
fn dimensions_index(dimensions: Dimensions) -> Option<u32> {
    match dimensions {
        Dimensions::Xy => Some(0),
        Dimensions::Xyz => Some(1),
        Dimensions::Xym => Some(2),
        Dimensions::Xyzm => Some(3),
        Dimensions::Unknown(_) => None,
    }
}

fn dimensions_from_index(index: u32) -> Dimensions {
    match index {
        0 => Dimensions::Xy,
        1 => Dimensions::Xyz,
        2 => Dimensions::Xym,
        _ => Dimensions::Xyzm,
    }
}

/// Geometry type and dimension
///
/// Combines a [GeometryTypeId] with [Dimensions] to handle cases where these concepts
/// are represented together (e.g., GeoParquet geometry types, blob type codes,
/// column statistics). For sanity's sake, this combined concept is also frequently
/// just called "geometry type".
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, SerializeDisplay, DeserializeFromStr)]
pub struct GeometryTypeAndDimensions {
    geometry_type: GeometryTypeId,
    dimensions: Dimensions,
}

impl GeometryTypeAndDimensions {
    /// Create from [GeometryTypeId] and [Dimensions]
    pub fn new(geometry_type: GeometryTypeId, dimensions: Dimensions) -> Self {
        Self {
            geometry_type,
            dimensions,
        }
    }

    /// The [GeometryTypeId]
    pub fn geometry_type(&self) -> GeometryTypeId {
        self.geometry_type
    }

    /// The [Dimensions]
    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// Number of ordinates per vertex
    pub fn vertex_width(&self) -> usize {
        vertex_width(self.dimensions)
    }

    /// Create from an ISO WKB integer identifier (e.g., 1001 for Point Z)
    pub fn try_from_wkb_id(wkb_id: u32) -> Result<Self, SpatiaGeometryError> {
        let dimensions = match wkb_id / 1000 {
            0 => Dimensions::Xy,
            1 => Dimensions::Xyz,
            2 => Dimensions::Xym,
            3 => Dimensions::Xyzm,
            _ => {
                return Err(SpatiaGeometryError::Invalid(format!(
                    "Unknown dimensions in ISO WKB geometry type: {wkb_id}"
                )))
            }
        };

        let geometry_type = GeometryTypeId::try_from_wkb_id(wkb_id % 1000)?;
        Ok(Self {
            geometry_type,
            dimensions,
        })
    }

    /// ISO WKB integer identifier (e.g., 1001 for Point Z)
    pub fn wkb_id(&self) -> u32 {
        let dimensions_id = match self.dimensions {
            Dimensions::Xy => 0,
            Dimensions::Xyz => 1000,
            Dimensions::Xym => 2000,
            Dimensions::Xyzm => 3000,
            Dimensions::Unknown(n) => match n {
                2 => 0,
                3 => 1000,
                4 => 3000,
                _ => {
                    // Avoid a panic unless in debug mode
                    debug_assert!(false, "Unknown dimensions in GeometryTypeAndDimensions");
                    0
                }
            },
        };

        dimensions_id + self.geometry_type.wkb_id()
    }

    /// GeoJSON/GeoParquet identifier (e.g., Point Z, LineString, Polygon ZM)
    pub fn geojson_id(&self) -> String {
        self.to_string()
    }
}

impl From<(GeometryTypeId, Dimensions)> for GeometryTypeAndDimensions {
    fn from(value: (GeometryTypeId, Dimensions)) -> Self {
        Self {
            geometry_type: value.0,
            dimensions: value.1,
        }
    }
}

impl Display for GeometryTypeAndDimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let suffix = match self.dimensions {
            Dimensions::Xy => "",
            Dimensions::Xyz => " Z",
            Dimensions::Xym => " M",
            Dimensions::Xyzm => " ZM",
            Dimensions::Unknown(_) => " Unknown",
        };

        f.write_str(self.geometry_type.geojson_id())?;
        f.write_str(suffix)
    }
}

impl FromStr for GeometryTypeAndDimensions {
    type Err = SpatiaGeometryError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let mut parts = value.split_ascii_whitespace();
        let geometry_type = match parts.next() {
            Some(maybe_geometry_type) => GeometryTypeId::from_str(maybe_geometry_type)?,
            None => {
                return Err(SpatiaGeometryError::Invalid(format!(
                    "Invalid geometry type string: '{value}'"
                )))
            }
        };

        let dimensions = match parts.next() {
            Some(maybe_dimensions) => match maybe_dimensions {
                "z" | "Z" => Dimensions::Xyz,
                "m" | "M" => Dimensions::Xym,
                "zm" | "ZM" => Dimensions::Xyzm,
                _ => {
                    return Err(SpatiaGeometryError::Invalid(format!(
                        "invalid geometry type string: '{value}'"
                    )))
                }
            },
            None => Dimensions::Xy,
        };

        if parts.next().is_some() {
            return Err(SpatiaGeometryError::Invalid(format!(
                "invalid geometry type string: '{value}'"
            )));
        }

        Ok(Self {
            geometry_type,
            dimensions,
        })
    }
}

/// The set of geometry types observed in a column
///
/// Uses a compact bitset with one bit per (type, dimension) pair. The set may
/// over-approximate what a column contains (false positives) but never
/// under-approximates it. The "unknown" state sets every bit.
///
/// This set only supports the standard dimensions: XY, XYZ, XYM, and XYZM.
/// Unknown dimensions are rejected by [`insert`](Self::insert) or silently
/// ignored by [`insert_or_ignore`](Self::insert_or_ignore).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GeometryTypeSet {
    /// Bitset encoding geometry types and dimensions.
    ///
    /// Uses bits 0-31 where each geometry type's WKB ID (0-7) is encoded
    /// at different offsets based on dimensions:
    /// - XY: bits 0-7
    /// - XYZ: bits 8-15
    /// - XYM: bits 16-23
    /// - XYZM: bits 24-31
    types: u32,
}

impl GeometryTypeSet {
    #[inline]
    pub fn new() -> Self {
        Self { types: 0 }
    }

    /// A set that claims every geometry type may be present
    #[inline]
    pub fn unknown() -> Self {
        Self { types: u32::MAX }
    }

    /// Insert a geometry type and dimensions into the set.
    ///
    /// Returns an error if the dimensions are unknown (not one of XY, XYZ, XYM, or XYZM).
    #[inline]
    pub fn insert(
        &mut self,
        type_and_dim: &GeometryTypeAndDimensions,
    ) -> Result<(), SpatiaGeometryError> {
        if let Dimensions::Unknown(n) = type_and_dim.dimensions() {
            return Err(SpatiaGeometryError::Invalid(format!(
                "Unknown dimensions {n} in GeometryTypeSet::insert"
            )));
        }
        self.insert_or_ignore(type_and_dim);
        Ok(())
    }

    /// Insert a geometry type and dimensions into the set, ignoring unknown dimensions.
    #[inline]
    pub fn insert_or_ignore(&mut self, type_and_dim: &GeometryTypeAndDimensions) {
        if let Some(bit) = Self::bit(type_and_dim) {
            self.types |= bit;
        }
    }

    /// Check if any geometry in the column may be of the given type and dimensions
    #[inline]
    pub fn contains(&self, type_and_dim: &GeometryTypeAndDimensions) -> bool {
        match Self::bit(type_and_dim) {
            Some(bit) => self.types & bit != 0,
            None => false,
        }
    }

    /// Check if every geometry in the column is of the given type and dimensions
    #[inline]
    pub fn contains_only(&self, type_and_dim: &GeometryTypeAndDimensions) -> bool {
        match Self::bit(type_and_dim) {
            Some(bit) => self.types == bit,
            None => false,
        }
    }

    /// Check if any geometry type with the given dimensions may be present
    #[inline]
    pub fn contains_dimensions(&self, dimensions: Dimensions) -> bool {
        match dimensions_index(dimensions) {
            Some(index) => (self.types >> (index * 8)) & 0xFF != 0,
            None => false,
        }
    }

    /// Reset the set so that it contains exactly one type
    #[inline]
    pub fn set(&mut self, type_and_dim: &GeometryTypeAndDimensions) {
        self.types = Self::bit(type_and_dim).unwrap_or(0);
    }

    /// Reset to unknown, i.e., every type may be present
    #[inline]
    pub fn set_unknown(&mut self) {
        self.types = u32::MAX;
    }

    /// Returns `true` if every bit is set
    #[inline]
    pub fn is_unknown(&self) -> bool {
        self.types == u32::MAX
    }

    /// Merge the given set into this set.
    #[inline]
    pub fn merge(&mut self, other: &Self) {
        self.types |= other.types;
    }

    /// Returns `true` if the set contains no geometry types.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.types == 0
    }

    /// Returns the number of geometry types in the set.
    #[inline]
    pub fn size(&self) -> usize {
        self.types.count_ones() as usize
    }

    /// Clears the set, removing all geometry types.
    #[inline]
    pub fn clear(&mut self) {
        self.types = 0;
    }

    /// One 8-bit word per dimension, in XY, XYZ, XYM, XYZM order
    pub fn words(&self) -> [u32; 4] {
        [0, 1, 2, 3].map(|i| (self.types >> (i * 8)) & 0xFF)
    }

    /// Reconstruct a set from the output of [`words`](Self::words)
    ///
    /// Bits above the low eight of each word are ignored.
    pub fn from_words(words: [u32; 4]) -> Self {
        let types = words
            .iter()
            .enumerate()
            .fold(0u32, |acc, (i, word)| acc | ((word & 0xFF) << (i * 8)));
        Self { types }
    }

    /// Human readable names of the concrete types in this set
    ///
    /// With `geoparquet_case` the names follow GeoParquet (e.g., `Point Z`); otherwise
    /// they are upper case with a dimension suffix (e.g., `POINT_XYZ`). The unspecific
    /// Geometry type is never listed.
    pub fn format(&self, geoparquet_case: bool) -> Vec<String> {
        self.iter()
            .filter(|item| item.geometry_type() != GeometryTypeId::Geometry)
            .map(|item| {
                if geoparquet_case {
                    item.to_string()
                } else {
                    format!(
                        "{}_{}",
                        item.geometry_type().wkt_id(),
                        dimensions_name(item.dimensions())
                    )
                }
            })
            .collect()
    }

    /// Returns an iterator over the geometry types in the set.
    pub fn iter(&self) -> GeometryTypeSetIter {
        GeometryTypeSetIter {
            types: self.types,
            current_bit: 0,
        }
    }

    fn bit(type_and_dim: &GeometryTypeAndDimensions) -> Option<u32> {
        let dim_index = dimensions_index(type_and_dim.dimensions())?;
        let geom_shift = type_and_dim.geometry_type().wkb_id();
        Some(1 << (geom_shift + dim_index * 8))
    }
}

/// Iterator over [`GeometryTypeAndDimensions`] values in a [`GeometryTypeSet`]
pub struct GeometryTypeSetIter {
    types: u32,
    current_bit: u32,
}

impl Iterator for GeometryTypeSetIter {
    type Item = GeometryTypeAndDimensions;

    fn next(&mut self) -> Option<Self::Item> {
        while self.current_bit < 32 {
            let bit = self.current_bit;
            self.current_bit += 1;

            if (self.types & (1 << bit)) != 0 {
                let dimensions = dimensions_from_index(bit / 8);
                let geometry_type = match GeometryTypeId::try_from_wkb_id(bit % 8) {
                    Ok(geometry_type) => geometry_type,
                    Err(_) => continue,
                };

                return Some(GeometryTypeAndDimensions::new(geometry_type, dimensions));
            }
        }

        None
    }
}

impl IntoIterator for &GeometryTypeSet {
    type Item = GeometryTypeAndDimensions;
    type IntoIter = GeometryTypeSetIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// Serialize as a list of GeoParquet type names
impl Serialize for GeometryTypeSet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeSeq; // codespell:ignore ser
        let mut seq = serializer.serialize_seq(Some(self.size()))?;
        for item in self.iter() {
            seq.serialize_element(&item)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for GeometryTypeSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error;
        let items: Vec<GeometryTypeAndDimensions> = Vec::deserialize(deserializer)?;
        let mut set = GeometryTypeSet::new();
        for item in items {
            set.insert(&item).map_err(D::Error::custom)?;
        }
        Ok(set)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use rstest::rstest;
    use Dimensions::*;
    use GeometryTypeId::*;

    #[rstest]
    fn geometry_type_wkb_id_roundtrip(
        #[values(
            (Geometry, 0),
            (Point, 1),
            (LineString, 2),
            (Polygon, 3),
            (MultiPoint, 4),
            (MultiLineString, 5),
            (MultiPolygon, 6),
            (GeometryCollection, 7)
        )]
        geometry_type_and_id: (GeometryTypeId, u32),
    ) {
        let (geometry_type, wkb_id) = geometry_type_and_id;
        assert_eq!(geometry_type.wkb_id(), wkb_id);
        assert_eq!(
            GeometryTypeId::try_from_wkb_id(wkb_id).unwrap(),
            geometry_type
        );
        assert_eq!(
            GeometryTypeId::from_str(geometry_type.wkt_id()).unwrap(),
            geometry_type
        );
    }

    #[test]
    fn geometry_type_wkb_id_err() {
        let err = GeometryTypeId::try_from_wkb_id(17).unwrap_err();
        assert_eq!(err.to_string(), "Unknown geometry type identifier 17");
    }

    #[test]
    fn geometry_type_multi_child() {
        assert_eq!(MultiPoint.multi_child(), Some(Point));
        assert_eq!(MultiLineString.multi_child(), Some(LineString));
        assert_eq!(MultiPolygon.multi_child(), Some(Polygon));
        assert_eq!(GeometryCollection.multi_child(), None);
        assert_eq!(Point.multi_child(), None);

        assert!(GeometryCollection.is_collection());
        assert!(MultiPoint.is_collection());
        assert!(!Polygon.is_collection());
    }

    #[rstest]
    fn geometry_type_dims_wkb_id_roundtrip(
        #[values(
            (Point, 1),
            (LineString, 2),
            (Polygon, 3),
            (MultiPoint, 4),
            (MultiLineString, 5),
            (MultiPolygon, 6),
            (GeometryCollection, 7)
        )]
        geometry_type_and_id: (GeometryTypeId, u32),
        #[values(
            (Xy, 0, 2),
            (Xyz, 1000, 3),
            (Xym, 2000, 3),
            (Xyzm, 3000, 4),
        )]
        dimensions_and_id: (Dimensions, u32, usize),
    ) {
        let (geometry_type, geometry_type_id) = geometry_type_and_id;
        let (dimensions, dimensions_id, width) = dimensions_and_id;

        let value = GeometryTypeAndDimensions::new(geometry_type, dimensions);
        assert_eq!(value.wkb_id(), dimensions_id + geometry_type_id);
        assert_eq!(value.vertex_width(), width);
        assert_eq!(
            GeometryTypeAndDimensions::try_from_wkb_id(dimensions_id + geometry_type_id).unwrap(),
            value
        );
    }

    #[test]
    fn geometry_type_dims_wkb_id_err() {
        let err = GeometryTypeAndDimensions::try_from_wkb_id(4000).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unknown dimensions in ISO WKB geometry type: 4000"
        );
    }

    #[rstest]
    fn geometry_type_dims_str_roundtrip(
        #[values(
            (Point, "Point"),
            (LineString, "LineString"),
            (MultiPolygon, "MultiPolygon"),
            (GeometryCollection, "GeometryCollection")
        )]
        geometry_type_and_str: (GeometryTypeId, &str),
        #[values(
            (Xy, ""),
            (Xyz, " Z"),
            (Xym, " M"),
            (Xyzm, " ZM"),
        )]
        dimensions_and_suffix: (Dimensions, &str),
    ) {
        let (geometry_type, geometry_type_id) = geometry_type_and_str;
        let (dimensions, dimensions_id) = dimensions_and_suffix;
        let string_id = geometry_type_id.to_string() + dimensions_id;

        let value = GeometryTypeAndDimensions::new(geometry_type, dimensions);
        assert_eq!(value.geojson_id(), string_id);
        assert_eq!(
            GeometryTypeAndDimensions::from_str(string_id.as_str()).unwrap(),
            value
        );
    }

    #[test]
    fn type_set_insert_contains() {
        let mut set = GeometryTypeSet::new();
        assert!(set.is_empty());

        let point_xy = GeometryTypeAndDimensions::new(Point, Xy);
        set.insert(&point_xy).unwrap();
        assert!(set.contains(&point_xy));
        assert!(set.contains_only(&point_xy));
        assert!(set.contains_dimensions(Xy));
        assert!(!set.contains_dimensions(Xyz));

        // Unrelated pairs stay absent
        for unrelated in [
            GeometryTypeAndDimensions::new(Point, Xyz),
            GeometryTypeAndDimensions::new(Point, Xym),
            GeometryTypeAndDimensions::new(LineString, Xy),
            GeometryTypeAndDimensions::new(GeometryCollection, Xyzm),
        ] {
            assert!(!set.contains(&unrelated));
        }

        set.insert(&GeometryTypeAndDimensions::new(Polygon, Xyzm))
            .unwrap();
        assert!(!set.contains_only(&point_xy));
        assert_eq!(set.size(), 2);
    }

    #[test]
    fn type_set_unknown_dimensions() {
        let mut set = GeometryTypeSet::new();
        let point_unknown = GeometryTypeAndDimensions::new(Point, Dimensions::Unknown(2));

        let result = set.insert(&point_unknown);
        assert_eq!(
            result.unwrap_err().to_string(),
            "Unknown dimensions 2 in GeometryTypeSet::insert"
        );

        set.insert_or_ignore(&point_unknown);
        assert!(set.is_empty());
        assert!(!set.contains(&point_unknown));
    }

    #[test]
    fn type_set_unknown_and_empty() {
        let mut set = GeometryTypeSet::unknown();
        assert!(set.is_unknown());
        assert!(set.contains(&GeometryTypeAndDimensions::new(MultiPolygon, Xym)));

        set.clear();
        assert!(set.is_empty());
        assert!(!set.is_unknown());

        set.set_unknown();
        assert!(set.is_unknown());

        let line_z = GeometryTypeAndDimensions::new(LineString, Xyz);
        set.set(&line_z);
        assert!(set.contains_only(&line_z));
    }

    #[test]
    fn type_set_merge_properties() {
        let mut a = GeometryTypeSet::new();
        a.insert(&GeometryTypeAndDimensions::new(Point, Xy)).unwrap();
        a.insert(&GeometryTypeAndDimensions::new(LineString, Xy))
            .unwrap();

        let mut b = GeometryTypeSet::new();
        b.insert(&GeometryTypeAndDimensions::new(LineString, Xy))
            .unwrap();
        b.insert(&GeometryTypeAndDimensions::new(Polygon, Xyz))
            .unwrap();

        // Idempotent
        let mut a_a = a;
        a_a.merge(&a);
        assert_eq!(a_a, a);

        // Commutative
        let mut a_b = a;
        a_b.merge(&b);
        let mut b_a = b;
        b_a.merge(&a);
        assert_eq!(a_b, b_a);
        assert_eq!(a_b.size(), 3);
    }

    #[test]
    fn type_set_words() {
        let mut set = GeometryTypeSet::new();
        set.insert(&GeometryTypeAndDimensions::new(Point, Xy)).unwrap();
        set.insert(&GeometryTypeAndDimensions::new(Polygon, Xyz))
            .unwrap();
        set.insert(&GeometryTypeAndDimensions::new(GeometryCollection, Xyzm))
            .unwrap();

        assert_eq!(set.words(), [0b10, 0b1000, 0, 0b1000_0000]);
        assert_eq!(GeometryTypeSet::from_words(set.words()), set);
        assert_eq!(GeometryTypeSet::unknown().words(), [0xFF; 4]);
        assert!(GeometryTypeSet::from_words([0xFFFF; 4]).is_unknown());
    }

    #[test]
    fn type_set_format() {
        let mut set = GeometryTypeSet::new();
        set.insert(&GeometryTypeAndDimensions::new(Point, Xy)).unwrap();
        set.insert(&GeometryTypeAndDimensions::new(LineString, Xyz))
            .unwrap();
        set.insert(&GeometryTypeAndDimensions::new(Geometry, Xy))
            .unwrap();

        assert_eq!(set.format(false), vec!["POINT_XY", "LINESTRING_XYZ"]);
        assert_eq!(set.format(true), vec!["Point", "LineString Z"]);
        assert!(GeometryTypeSet::new().format(true).is_empty());
    }

    #[test]
    fn type_set_serde() {
        let mut set = GeometryTypeSet::new();
        set.insert(&GeometryTypeAndDimensions::new(Point, Xy)).unwrap();
        set.insert(&GeometryTypeAndDimensions::new(LineString, Xyz))
            .unwrap();
        set.insert(&GeometryTypeAndDimensions::new(Polygon, Xyzm))
            .unwrap();

        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, "[\"Point\",\"LineString Z\",\"Polygon ZM\"]");

        let deserialized: GeometryTypeSet = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, set);

        let empty: GeometryTypeSet = serde_json::from_str("[]").unwrap();
        assert!(empty.is_empty());
    }
}
