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

use datafusion::config::{ConfigEntry, ConfigExtension, ConfigField, ExtensionOptions, Visit};
use datafusion::prelude::SessionConfig;
use datafusion_common::config_namespace;
use datafusion_common::{DataFusionError, Result};
use regex::Regex;

/// Default number of children per node of the packed Hilbert index
pub const DEFAULT_INDEX_NODE_SIZE: usize = 16;

/// Helper function to register the Spatia options with a session config
pub fn add_spatia_option_extension(config: SessionConfig) -> SessionConfig {
    config.with_option_extension(SpatiaOptions::default())
}

config_namespace! {
    /// Configuration options for Spatia.
    pub struct SpatiaOptions {
        /// Options for reading and writing GeoParquet metadata
        pub geoparquet: GeoParquetOptions, default = GeoParquetOptions::default()

        /// Options for the packed Hilbert spatial index
        pub index: IndexOptions, default = IndexOptions::default()

        /// Options for text and binary geometry conversion
        pub cast: CastOptions, default = CastOptions::default()
    }
}

config_namespace! {
    /// Configuration options for GeoParquet metadata.
    ///
    /// When conversion is disabled the "geo" key of a Parquet file is never parsed,
    /// so malformed metadata cannot abort an otherwise valid scan.
    pub struct GeoParquetOptions {
        /// Interpret GeoParquet "geo" metadata when reading Parquet files
        pub enable_conversion: bool, default = true

        /// The GeoParquet metadata version to write
        pub write_version: GeoParquetVersion, default = GeoParquetVersion::V100
    }
}

config_namespace! {
    /// Configuration options for the packed Hilbert spatial index
    pub struct IndexOptions {
        /// The number of children per node. Must be at least 2.
        pub node_size: usize, default = DEFAULT_INDEX_NODE_SIZE
    }
}

config_namespace! {
    /// Configuration options for batch geometry conversion
    pub struct CastOptions {
        /// Fail the whole batch on the first unparseable value. When false, values
        /// that cannot be parsed become NULL.
        pub strict: bool, default = true
    }
}

impl ConfigExtension for SpatiaOptions {
    const PREFIX: &'static str = "spatia";
}

impl ExtensionOptions for SpatiaOptions {
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }

    fn cloned(&self) -> Box<dyn ExtensionOptions> {
        Box::new(self.clone())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        <Self as ConfigField>::set(self, key, value)
    }

    fn entries(&self) -> Vec<ConfigEntry> {
        struct Visitor(Vec<ConfigEntry>);

        impl Visit for Visitor {
            fn some<V: Display>(&mut self, key: &str, value: V, description: &'static str) {
                self.0.push(ConfigEntry {
                    key: key.to_string(),
                    value: Some(value.to_string()),
                    description,
                })
            }

            fn none(&mut self, key: &str, description: &'static str) {
                self.0.push(ConfigEntry {
                    key: key.to_string(),
                    value: None,
                    description,
                })
            }
        }

        let mut v = Visitor(vec![]);
        self.visit(&mut v, Self::PREFIX, "");
        v.0
    }
}

/// GeoParquet metadata versions
///
/// Files declaring version 1.0.x map to [GeoParquetVersion::V100]; any later 1.x
/// minor version maps to [GeoParquetVersion::V110].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeoParquetVersion {
    /// GeoParquet 1.0.0
    V100,

    /// GeoParquet 1.1.0
    V110,
}

impl GeoParquetVersion {
    /// The version string written to the "geo" metadata key
    pub fn as_str(&self) -> &'static str {
        match self {
            GeoParquetVersion::V100 => "1.0.0",
            GeoParquetVersion::V110 => "1.1.0",
        }
    }

    /// Resolve a version string beginning with `MAJOR.MINOR`
    ///
    /// Only major version 1 is supported. Minor version 0 resolves to 1.0.0 and any
    /// later minor version resolves to 1.1.0.
    pub fn try_from_version_str(version: &str) -> Result<Self> {
        let version_regex = Regex::new(r"^(\d+)\.(\d+)")
            .map_err(|e| DataFusionError::External(Box::new(e)))?;
        let captures = version_regex.captures(version.trim()).ok_or_else(|| {
            DataFusionError::Plan(format!(
                "GeoParquet metadata version '{version}' is not a valid version"
            ))
        })?;

        let parse_part = |idx: usize| -> Result<u64> {
            captures
                .get(idx)
                .map(|m| m.as_str())
                .unwrap_or_default()
                .parse::<u64>()
                .map_err(|_| {
                    DataFusionError::Plan(format!(
                        "GeoParquet metadata version '{version}' is not a valid version"
                    ))
                })
        };

        let major = parse_part(1)?;
        let minor = parse_part(2)?;
        if major != 1 {
            return Err(DataFusionError::Plan(format!(
                "GeoParquet version {version} is not supported"
            )));
        }

        if minor == 0 {
            Ok(GeoParquetVersion::V100)
        } else {
            Ok(GeoParquetVersion::V110)
        }
    }
}

impl Display for GeoParquetVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ConfigField for GeoParquetVersion {
    fn visit<V: Visit>(&self, v: &mut V, key: &str, description: &'static str) {
        v.some(key, self.as_str(), description);
    }

    fn set(&mut self, _key: &str, value: &str) -> Result<()> {
        let value = value.to_lowercase();
        let version = match value.trim_start_matches('v') {
            "1.0.0" | "1.0" | "100" => GeoParquetVersion::V100,
            "1.1.0" | "1.1" | "110" => GeoParquetVersion::V110,
            _ => {
                return Err(DataFusionError::Configuration(format!(
                    "Unknown GeoParquet version: {value}. Expected: 1.0.0, 1.1.0"
                )));
            }
        };
        *self = version;
        Ok(())
    }
}
