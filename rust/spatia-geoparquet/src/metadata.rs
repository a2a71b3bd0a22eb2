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

//! Strongly-typed structs for the "geo" key/value metadata of GeoParquet files.
//!
//! Reading validates the metadata before it is deserialized so that problems are
//! reported with the column and field they concern. Writing collects per-column
//! statistics while a file is produced and renders them when the file is closed.
use std::collections::BTreeMap;
use std::fmt::Display;

use datafusion_common::{plan_err, DataFusionError, Result};
use geo_traits::Dimensions;
use parking_lot::Mutex;
use parquet::file::metadata::{KeyValue, ParquetMetaData};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use spatia_common::option::{GeoParquetOptions, GeoParquetVersion};
use spatia_expr::statistics::GeometryStatistics;
use spatia_geometry::{
    error::SpatiaGeometryError,
    extent::GeometryExtent,
    types::{GeometryTypeAndDimensions, GeometryTypeId, GeometryTypeSet},
};

/// The Parquet key/value metadata key holding GeoParquet metadata
pub const GEOPARQUET_METADATA_KEY: &str = "geo";

/// The encoding of a geometry column
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[allow(clippy::upper_case_acronyms)]
pub enum GeoParquetColumnEncoding {
    /// Serialized Well-known Binary encoding
    #[default]
    WKB,
    /// Native Point encoding
    #[serde(rename = "point")]
    Point,
    /// Native LineString encoding
    #[serde(rename = "linestring")]
    LineString,
    /// Native Polygon encoding
    #[serde(rename = "polygon")]
    Polygon,
    /// Native MultiPoint encoding
    #[serde(rename = "multipoint")]
    MultiPoint,
    /// Native MultiLineString encoding
    #[serde(rename = "multilinestring")]
    MultiLineString,
    /// Native MultiPolygon encoding
    #[serde(rename = "multipolygon")]
    MultiPolygon,
}

impl GeoParquetColumnEncoding {
    /// Look up an encoding by its exact metadata name
    pub fn try_from_name(name: &str) -> Option<Self> {
        use GeoParquetColumnEncoding::*;
        match name {
            "WKB" => Some(WKB),
            "point" => Some(Point),
            "linestring" => Some(LineString),
            "polygon" => Some(Polygon),
            "multipoint" => Some(MultiPoint),
            "multilinestring" => Some(MultiLineString),
            "multipolygon" => Some(MultiPolygon),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        use GeoParquetColumnEncoding::*;
        match self {
            WKB => "WKB",
            Point => "point",
            LineString => "linestring",
            Polygon => "polygon",
            MultiPoint => "multipoint",
            MultiLineString => "multilinestring",
            MultiPolygon => "multipolygon",
        }
    }
}

impl Display for GeoParquetColumnEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// How edges between vertices are interpreted
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GeoParquetEdges {
    #[default]
    Planar,
    Spherical,
}

impl GeoParquetEdges {
    pub fn try_from_name(name: &str) -> Option<Self> {
        match name {
            "planar" => Some(GeoParquetEdges::Planar),
            "spherical" => Some(GeoParquetEdges::Spherical),
            _ => None,
        }
    }
}

impl Display for GeoParquetEdges {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeoParquetEdges::Planar => f.write_str("planar"),
            GeoParquetEdges::Spherical => f.write_str("spherical"),
        }
    }
}

/// Top-level GeoParquet file metadata
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct GeoParquetMetadata {
    /// The version identifier for the GeoParquet specification.
    pub version: String,

    /// The name of the "primary" geometry column. In cases where a GeoParquet file contains
    /// multiple geometry columns, the primary geometry may be used by default in geospatial
    /// operations.
    pub primary_column: String,

    /// Metadata about geometry columns. Each key is the name of a geometry column in the table.
    pub columns: BTreeMap<String, GeoParquetColumnMetadata>,
}

impl Default for GeoParquetMetadata {
    fn default() -> Self {
        Self {
            version: GeoParquetVersion::V100.as_str().to_string(),
            primary_column: Default::default(),
            columns: Default::default(),
        }
    }
}

/// GeoParquet column metadata
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct GeoParquetColumnMetadata {
    /// Name of the geometry encoding format
    pub encoding: GeoParquetColumnEncoding,

    /// The geometry types of all geometries, or an empty array if they are not known
    ///
    /// Names follow GeoJSON with a `" Z"` suffix for 3D geometries (e.g. `"Point Z"`).
    pub geometry_types: Vec<GeometryTypeAndDimensions>,

    /// PROJJSON object describing the coordinate reference system. If absent the
    /// CRS is OGC:CRS84 (longitude/latitude on WGS84).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crs: Option<Value>,

    /// Winding order of exterior rings of polygons
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orientation: Option<String>,

    /// Interpretation of edges; planar if absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edges: Option<GeoParquetEdges>,

    /// Bounding box of the column as `[xmin, ymin, xmax, ymax]` or
    /// `[xmin, ymin, zmin, xmax, ymax, zmax]`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bbox: Option<Vec<f64>>,

    /// Coordinate epoch for a dynamic CRS, as a decimal year
    #[serde(skip_serializing_if = "Option::is_none")]
    pub epoch: Option<f64>,
}

/// PROJJSON for OGC:CRS84, the CRS assumed when a column does not declare one
pub fn ogc_crs84_projjson() -> Value {
    json!({
        "$schema": "https://proj.org/schemas/v0.7/projjson.schema.json",
        "type": "GeographicCRS",
        "name": "WGS 84 (CRS84)",
        "datum": {
            "type": "GeodeticReferenceFrame",
            "name": "World Geodetic System 1984",
            "ellipsoid": {
                "name": "WGS 84",
                "semi_major_axis": 6378137,
                "inverse_flattening": 298.257223563
            }
        },
        "coordinate_system": {
            "subtype": "ellipsoidal",
            "axis": [
                {
                    "name": "Geodetic longitude",
                    "abbreviation": "Lon",
                    "direction": "east",
                    "unit": "degree"
                },
                {
                    "name": "Geodetic latitude",
                    "abbreviation": "Lat",
                    "direction": "north",
                    "unit": "degree"
                }
            ]
        },
        "scope": "unknown",
        "area": "World",
        "bbox": {
            "south_latitude": -90,
            "west_longitude": -180,
            "north_latitude": 90,
            "east_longitude": 180
        },
        "id": {"authority": "OGC", "code": "CRS84"}
    })
}

impl GeoParquetMetadata {
    /// Construct a [`GeoParquetMetadata`] from a JSON string
    ///
    /// The version must be `1.x`. Every column needs a supported `encoding` and a
    /// `geometry_types` array; `edges` and `bbox` are checked when present.
    pub fn try_new(metadata: &str) -> Result<Self> {
        let root: Value = serde_json::from_str(metadata).map_err(|e| {
            DataFusionError::Plan(format!("GeoParquet metadata is not valid JSON: {e}"))
        })?;

        validate_metadata(&root)?;
        serde_json::from_value(root).map_err(|e| DataFusionError::Plan(e.to_string()))
    }

    /// Resolve the declared version string
    pub fn geoparquet_version(&self) -> Result<GeoParquetVersion> {
        GeoParquetVersion::try_from_version_str(&self.version.to_lowercase())
    }

    /// Construct a [`GeoParquetMetadata`] from Parquet key/value metadata
    ///
    /// Returns `None` if there is no "geo" key or if conversion is disabled. When
    /// conversion is disabled the metadata is not inspected at all.
    pub fn try_from_key_value_metadata(
        key_value_metadata: Option<&Vec<KeyValue>>,
        options: &GeoParquetOptions,
    ) -> Result<Option<Self>> {
        if !options.enable_conversion {
            return Ok(None);
        }

        let Some(key_value_metadata) = key_value_metadata else {
            return Ok(None);
        };

        for item in key_value_metadata {
            if let (GEOPARQUET_METADATA_KEY, Some(value)) = (item.key.as_str(), &item.value) {
                return Self::try_new(value).map(Some);
            }
        }

        Ok(None)
    }

    /// Construct a [`GeoParquetMetadata`] from a [`ParquetMetaData`]
    pub fn try_from_parquet_metadata(
        metadata: &ParquetMetaData,
        options: &GeoParquetOptions,
    ) -> Result<Option<Self>> {
        Self::try_from_key_value_metadata(metadata.file_metadata().key_value_metadata(), options)
    }

    /// Like [`GeoParquetMetadata::try_from_parquet_metadata`] but never fails
    ///
    /// Invalid metadata is logged and dropped so that the rest of the file can still
    /// be scanned.
    pub fn try_from_parquet_metadata_lenient(
        metadata: &ParquetMetaData,
        options: &GeoParquetOptions,
    ) -> Option<Self> {
        match Self::try_from_parquet_metadata(metadata, options) {
            Ok(maybe_metadata) => maybe_metadata,
            Err(err) => {
                log::warn!("Ignoring invalid GeoParquet metadata: {err}");
                None
            }
        }
    }

    /// Metadata of the primary geometry column
    pub fn primary_column_metadata(&self) -> Option<&GeoParquetColumnMetadata> {
        self.columns.get(&self.primary_column)
    }
}

impl GeoParquetColumnMetadata {
    /// The declared CRS, or OGC:CRS84 if none was declared
    pub fn crs_or_default(&self) -> Value {
        self.crs.clone().unwrap_or_else(ogc_crs84_projjson)
    }

    pub fn edges_or_default(&self) -> GeoParquetEdges {
        self.edges.unwrap_or_default()
    }

    pub fn bounding_box(&self) -> Option<GeometryExtent> {
        let bbox = self.bbox.as_ref()?;
        match bbox.len() {
            4 => Some(GeometryExtent::xy(bbox[0], bbox[1], bbox[2], bbox[3])),
            6 => {
                let mut extent = GeometryExtent::xy(bbox[0], bbox[1], bbox[3], bbox[4]);
                extent.extend_z(bbox[2]);
                extent.extend_z(bbox[5]);
                Some(extent)
            }
            _ => None,
        }
    }

    /// Column statistics implied by this metadata
    ///
    /// A missing bbox or an empty list of geometry types means nothing is known
    /// about that part of the column.
    pub fn to_statistics(&self) -> GeometryStatistics {
        let bbox = self.bounding_box().unwrap_or_else(GeometryExtent::unknown);
        let types = if self.geometry_types.is_empty() {
            GeometryTypeSet::unknown()
        } else {
            let mut types = GeometryTypeSet::new();
            for geometry_type in &self.geometry_types {
                types.insert_or_ignore(geometry_type);
            }
            types
        };

        GeometryStatistics::new(bbox, types)
    }
}

fn validate_metadata(root: &Value) -> Result<()> {
    let Some(root) = root.as_object() else {
        return plan_err!("GeoParquet metadata is not an object");
    };

    let Some(version) = root.get("version").and_then(Value::as_str) else {
        return plan_err!("GeoParquet metadata does not have a version");
    };
    GeoParquetVersion::try_from_version_str(&version.to_lowercase())?;

    if !root.get("primary_column").is_some_and(Value::is_string) {
        return plan_err!("GeoParquet metadata does not have a primary column");
    }

    let Some(columns) = root.get("columns").and_then(Value::as_object) else {
        return plan_err!("GeoParquet metadata does not have a columns object");
    };

    for (name, column) in columns {
        let Some(column) = column.as_object() else {
            return plan_err!("GeoParquet column '{name}' is not an object");
        };
        validate_column(name, column)?;
    }

    Ok(())
}

fn validate_column(name: &str, column: &Map<String, Value>) -> Result<()> {
    let Some(encoding) = column.get("encoding").and_then(Value::as_str) else {
        return plan_err!("GeoParquet column '{name}' does not have an encoding");
    };
    if GeoParquetColumnEncoding::try_from_name(encoding).is_none() {
        return plan_err!("GeoParquet column '{name}' has an unsupported encoding: {encoding}");
    }

    if !column.get("geometry_types").is_some_and(Value::is_array) {
        return plan_err!("GeoParquet column '{name}' does not have geometry types");
    }

    if let Some(crs) = column.get("crs") {
        if !(crs.is_object() || crs.is_null()) {
            return plan_err!("GeoParquet column '{name}' has a CRS that is not a PROJJSON object");
        }
    }

    if let Some(edges) = column.get("edges") {
        let known = edges
            .as_str()
            .and_then(GeoParquetEdges::try_from_name)
            .is_some();
        if !known {
            return plan_err!("GeoParquet column '{name}' has an unsupported edge type: {edges}");
        }
    }

    if let Some(bbox) = column.get("bbox") {
        let valid = bbox.as_array().is_some_and(|values| {
            matches!(values.len(), 4 | 6) && values.iter().all(Value::is_number)
        });
        if !valid {
            return plan_err!("GeoParquet column '{name}' has an invalid bbox: {bbox}");
        }
    }

    Ok(())
}

/// Collects GeoParquet metadata while a file is written
///
/// Column writers may report statistics concurrently. The first column reported
/// becomes the primary column.
#[derive(Debug)]
pub struct GeoParquetFileMetadata {
    version: GeoParquetVersion,
    state: Mutex<FileWriteState>,
}

#[derive(Debug, Default)]
struct FileWriteState {
    primary_column: Option<String>,
    columns: BTreeMap<String, ColumnWriteState>,
}

#[derive(Debug)]
struct ColumnWriteState {
    edges: GeoParquetEdges,
    crs: Option<Value>,
    stats: GeometryStatistics,
}

impl GeoParquetFileMetadata {
    pub fn new(version: GeoParquetVersion) -> Self {
        Self {
            version,
            state: Mutex::new(FileWriteState::default()),
        }
    }

    pub fn new_with_options(options: &GeoParquetOptions) -> Self {
        Self::new(options.write_version)
    }

    pub fn version(&self) -> GeoParquetVersion {
        self.version
    }

    /// Record the statistics of a geometry column
    ///
    /// `geospatial_types` are ISO WKB type codes. GeoParquet only describes XY and
    /// XYZ geometries, so only codes 1-7 and 1001-1007 are accepted. Repeated calls
    /// for the same column accumulate.
    pub fn add_column_stats(
        &self,
        column_name: &str,
        edges: GeoParquetEdges,
        crs: Option<Value>,
        geospatial_types: &[i32],
        bbox: &GeometryExtent,
    ) -> Result<()> {
        let mut types = GeometryTypeSet::new();
        for &code in geospatial_types {
            match code {
                1..=7 | 1001..=1007 => {
                    let type_and_dims = GeometryTypeAndDimensions::try_from_wkb_id(code as u32)
                        .map_err(|e| DataFusionError::External(Box::new(e)))?;
                    types.insert_or_ignore(&type_and_dims);
                }
                _ => {
                    return plan_err!(
                        "GeoParquet only supports XY and XYZ geometries of POINT, LINESTRING, \
                        POLYGON, MULTIPOINT, MULTILINESTRING, MULTIPOLYGON and \
                        GEOMETRYCOLLECTION types. Unsupported type: {code}"
                    );
                }
            }
        }

        // m values have no place in GeoParquet
        let finite = [bbox.min_x, bbox.min_y, bbox.max_x, bbox.max_y]
            .iter()
            .all(|value| value.is_finite());
        let mut extent = if finite {
            GeometryExtent::xy(
                bbox.min_x.min(bbox.max_x),
                bbox.min_y.min(bbox.max_y),
                bbox.min_x.max(bbox.max_x),
                bbox.min_y.max(bbox.max_y),
            )
        } else {
            GeometryExtent::empty()
        };
        if !extent.is_empty() && bbox.min_z.is_finite() && bbox.max_z.is_finite() {
            extent.extend_z(bbox.min_z);
            extent.extend_z(bbox.max_z);
        }

        let mut state = self.state.lock();
        if state.primary_column.is_none() {
            state.primary_column = Some(column_name.to_string());
        }

        let column = state
            .columns
            .entry(column_name.to_string())
            .or_insert_with(|| ColumnWriteState {
                edges,
                crs: None,
                stats: GeometryStatistics::create_empty(),
            });
        column.edges = edges;
        if crs.is_some() {
            column.crs = crs;
        }
        column.stats.merge(&GeometryStatistics::new(extent, types));
        Ok(())
    }

    pub fn is_geometry_column(&self, column_name: &str) -> bool {
        self.state.lock().columns.contains_key(column_name)
    }

    /// Statistics accumulated so far for a column
    pub fn column_statistics(&self, column_name: &str) -> Option<GeometryStatistics> {
        self.state
            .lock()
            .columns
            .get(column_name)
            .map(|column| column.stats)
    }

    /// The metadata that [`GeoParquetFileMetadata::write`] renders
    pub fn to_metadata(&self) -> Result<GeoParquetMetadata> {
        let state = self.state.lock();
        let Some(primary_column) = &state.primary_column else {
            return plan_err!("Can't write GeoParquet metadata without any geometry columns");
        };

        let columns = state
            .columns
            .iter()
            .map(|(name, column)| (name.clone(), column.to_column_metadata()))
            .collect();

        Ok(GeoParquetMetadata {
            version: self.version.as_str().to_string(),
            primary_column: primary_column.clone(),
            columns,
        })
    }

    /// Render the "geo" metadata JSON
    pub fn write(&self) -> Result<String> {
        let metadata = self.to_metadata()?;
        serde_json::to_string(&metadata)
            .map_err(|e| DataFusionError::External(Box::new(SpatiaGeometryError::from(e))))
    }

    /// Render the "geo" metadata as a Parquet key/value pair
    pub fn to_key_value(&self) -> Result<KeyValue> {
        Ok(KeyValue::new(
            GEOPARQUET_METADATA_KEY.to_string(),
            self.write()?,
        ))
    }
}

impl ColumnWriteState {
    fn to_column_metadata(&self) -> GeoParquetColumnMetadata {
        let types = self.stats.types();
        let geometry_types = types
            .iter()
            .filter(|item| item.geometry_type() != GeometryTypeId::Geometry)
            .collect();

        let extent = self.stats.bbox();
        let bbox = if extent.is_empty() {
            None
        } else if extent.has_z()
            && (types.contains_dimensions(Dimensions::Xyz)
                || types.contains_dimensions(Dimensions::Xyzm))
        {
            Some(vec![
                extent.min_x,
                extent.min_y,
                extent.min_z,
                extent.max_x,
                extent.max_y,
                extent.max_z,
            ])
        } else {
            Some(vec![extent.min_x, extent.min_y, extent.max_x, extent.max_y])
        };

        GeoParquetColumnMetadata {
            encoding: GeoParquetColumnEncoding::WKB,
            geometry_types,
            crs: Some(self.crs.clone().unwrap_or_else(ogc_crs84_projjson)),
            edges: Some(self.edges),
            bbox,
            ..Default::default()
        }
    }
}
