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
use std::{any::Any, sync::Arc};

use arrow_array::builder::StringBuilder;
use arrow_schema::DataType;
use datafusion_common::cast::as_int64_array;
use datafusion_common::{exec_err, DataFusionError, Result, ScalarValue};
use datafusion_expr::{
    ColumnarValue, ScalarFunctionArgs, ScalarUDF, ScalarUDFImpl, Signature, TypeSignature,
    Volatility,
};
use spatia_geometry::{
    geohash::{geohash, MAX_GEOHASH_PRECISION},
    types::GeometryTypeId,
    wkb_reader::for_each_vertex,
};

use crate::executor::{BlobValues, GeometryExecutor};

/// ST_GeoHash() scalar UDF implementation
pub fn st_geohash_udf() -> ScalarUDF {
    ScalarUDF::new_from_impl(StGeoHash::default())
}

/// Geohash of a longitude/latitude point
///
/// The precision is clamped to `1..=20` and defaults to 20 when omitted. Empty
/// points produce NULL; other geometry types are an error.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct StGeoHash {
    signature: Signature,
}

impl Default for StGeoHash {
    fn default() -> Self {
        Self {
            signature: Signature::one_of(
                vec![TypeSignature::Any(1), TypeSignature::Any(2)],
                Volatility::Immutable,
            ),
        }
    }
}

impl StGeoHash {
    pub fn invoke_batch(&self, args: &[ColumnarValue]) -> Result<ColumnarValue> {
        let executor = GeometryExecutor::new(args);
        let num_iterations = executor.num_iterations();

        let precision_array = match args.get(1) {
            Some(precision) => precision
                .cast_to(&DataType::Int64, None)?
                .to_array(num_iterations)?,
            None => ColumnarValue::Scalar(ScalarValue::Int64(Some(MAX_GEOHASH_PRECISION as i64)))
                .to_array(num_iterations)?,
        };
        let precisions = as_int64_array(&precision_array)?;
        let points = BlobValues::try_new(&args[0])?;

        let mut builder = StringBuilder::with_capacity(num_iterations, num_iterations * 12);
        for (i, precision) in precisions.iter().enumerate() {
            match (points.get(i), precision) {
                (Some(blob), Some(precision)) => match point_xy(blob)? {
                    Some((x, y)) => builder.append_value(geohash(x, y, precision)),
                    None => builder.append_null(),
                },
                _ => builder.append_null(),
            }
        }

        executor.finish(Arc::new(builder.finish()))
    }
}

impl ScalarUDFImpl for StGeoHash {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn name(&self) -> &str {
        "st_geohash"
    }

    fn signature(&self) -> &Signature {
        &self.signature
    }

    fn return_type(&self, _arg_types: &[DataType]) -> Result<DataType> {
        Ok(DataType::Utf8)
    }

    fn invoke_with_args(&self, args: ScalarFunctionArgs) -> Result<ColumnarValue> {
        self.invoke_batch(&args.args)
    }
}

/// The x and y of a point, or `None` for an empty point
fn point_xy(blob: &[u8]) -> Result<Option<(f64, f64)>> {
    let mut vertex = None;
    let geometry_type = for_each_vertex(blob, |_, coord| vertex = Some((coord[0], coord[1])))
        .map_err(|err| DataFusionError::External(Box::new(err)))?;

    if geometry_type.geometry_type() != GeometryTypeId::Point {
        return exec_err!("st_geohash expects a point but got {geometry_type}");
    }

    Ok(vertex.filter(|(x, y)| !x.is_nan() && !y.is_nan()))
}
