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
use std::sync::Arc;

use arrow_schema::DataType;
use datafusion_common::Result;
use datafusion_expr::{registry::FunctionRegistry, ScalarUDF, Signature, Volatility};
use spatia_common::option::SpatiaOptions;

/// Signature of functions taking `num_args` geometry blobs
pub(crate) fn geometry_signature(num_args: usize) -> Signature {
    Signature::uniform(
        num_args,
        vec![DataType::Binary, DataType::LargeBinary, DataType::BinaryView],
        Volatility::Immutable,
    )
}

/// Export the scalar functions defined in this crate
///
/// Functions that depend on configuration (e.g., strict text conversion) are
/// created from `options`.
pub fn spatia_scalar_udfs(options: &SpatiaOptions) -> Vec<ScalarUDF> {
    vec![
        crate::st_astext::st_astext_udf(),
        crate::st_extent::st_extent_udf(),
        crate::st_extent::st_intersect_extent_udf(),
        crate::st_geohash::st_geohash_udf(),
        crate::st_geomfromtext::st_geomfromtext_udf(&options.cast),
        crate::st_makeline::st_makeline_udf(),
        crate::st_point::st_point_udf(),
        crate::st_wkb::st_asbinary_udf(),
        crate::st_wkb::st_geomfromwkb_udf(),
    ]
}

/// Register every scalar function with a registry (e.g., a session state)
pub fn register_spatia_functions(
    registry: &mut dyn FunctionRegistry,
    options: &SpatiaOptions,
) -> Result<()> {
    for udf in spatia_scalar_udfs(options) {
        if let Some(previous) = registry.register_udf(Arc::new(udf))? {
            log::debug!("Replaced existing function {}", previous.name());
        }
    }

    Ok(())
}
