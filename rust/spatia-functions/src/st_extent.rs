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

use arrow_array::{builder::BooleanBuilder, builder::Float64Builder, ArrayRef, StructArray};
use arrow_buffer::NullBuffer;
use arrow_schema::{DataType, Field, Fields};
use datafusion_common::{plan_err, DataFusionError, Result, ScalarValue};
use datafusion_expr::{
    ColumnarValue, ScalarFunctionArgs, ScalarUDF, ScalarUDFImpl, Signature, TypeSignature,
    Volatility,
};
use spatia_geometry::{bounds::get_extent, extent::GeometryExtent};

use crate::executor::GeometryExecutor;
use crate::register::geometry_signature;

/// ST_Extent() scalar UDF implementation
pub fn st_extent_udf() -> ScalarUDF {
    ScalarUDF::new_from_impl(StExtent::default())
}

/// ST_Intersect_Extent() scalar UDF implementation
pub fn st_intersect_extent_udf() -> ScalarUDF {
    ScalarUDF::new_from_impl(StIntersectExtent::default())
}

/// Fields of the struct returned by ST_Extent()
pub fn extent_fields() -> Fields {
    Fields::from(vec![
        Field::new("xmin", DataType::Float64, true),
        Field::new("ymin", DataType::Float64, true),
        Field::new("xmax", DataType::Float64, true),
        Field::new("ymax", DataType::Float64, true),
    ])
}

/// The x/y bounding box of each geometry
///
/// Null input and geometries without any vertex produce NULL.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct StExtent {
    signature: Signature,
}

impl Default for StExtent {
    fn default() -> Self {
        Self {
            signature: geometry_signature(1),
        }
    }
}

impl StExtent {
    pub fn invoke_batch(&self, args: &[ColumnarValue]) -> Result<ColumnarValue> {
        let executor = GeometryExecutor::new(args);
        let num_iterations = executor.num_iterations();
        let mut builders = [
            Float64Builder::with_capacity(num_iterations),
            Float64Builder::with_capacity(num_iterations),
            Float64Builder::with_capacity(num_iterations),
            Float64Builder::with_capacity(num_iterations),
        ];
        let mut validity = Vec::with_capacity(num_iterations);

        executor.execute_blob_void(|_, maybe_blob| {
            let extent = match maybe_blob {
                Some(blob) => non_empty_extent(blob)?,
                None => None,
            };

            match extent {
                Some(extent) => {
                    let values = [extent.min_x, extent.min_y, extent.max_x, extent.max_y];
                    for (builder, value) in builders.iter_mut().zip(values) {
                        builder.append_value(value);
                    }
                    validity.push(true);
                }
                None => {
                    for builder in builders.iter_mut() {
                        builder.append_null();
                    }
                    validity.push(false);
                }
            }

            Ok(())
        })?;

        let columns = builders
            .iter_mut()
            .map(|builder| Arc::new(builder.finish()) as ArrayRef)
            .collect::<Vec<_>>();
        let out = StructArray::try_new(extent_fields(), columns, Some(NullBuffer::from(validity)))?;
        executor.finish(Arc::new(out))
    }
}

impl ScalarUDFImpl for StExtent {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn name(&self) -> &str {
        "st_extent"
    }

    fn signature(&self) -> &Signature {
        &self.signature
    }

    fn return_type(&self, _arg_types: &[DataType]) -> Result<DataType> {
        Ok(DataType::Struct(extent_fields()))
    }

    fn invoke_with_args(&self, args: ScalarFunctionArgs) -> Result<ColumnarValue> {
        self.invoke_batch(&args.args)
    }
}

/// Inclusive bounding box overlap of two geometries
///
/// Accepts two geometries and, optionally, a CRS tag for each. The tags must be
/// constant and equal (NULL meaning "no CRS"). A geometry whose extent cannot be
/// computed never intersects anything.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct StIntersectExtent {
    signature: Signature,
}

impl Default for StIntersectExtent {
    fn default() -> Self {
        Self {
            signature: Signature::one_of(
                vec![TypeSignature::Any(2), TypeSignature::Any(4)],
                Volatility::Immutable,
            ),
        }
    }
}

impl StIntersectExtent {
    pub fn invoke_batch(&self, args: &[ColumnarValue]) -> Result<ColumnarValue> {
        match args.len() {
            2 => {}
            4 => check_same_crs(&args[2], &args[3])?,
            n => return plan_err!("st_intersect_extent expects 2 or 4 arguments but got {n}"),
        }

        let executor = GeometryExecutor::new(&args[..2]);
        let mut builder = BooleanBuilder::with_capacity(executor.num_iterations());
        executor.execute_blob_blob_void(|maybe_a, maybe_b| {
            match (maybe_a, maybe_b) {
                (Some(a), Some(b)) => builder.append_value(intersects(a, b)),
                _ => builder.append_null(),
            }

            Ok(())
        })?;

        executor.finish(Arc::new(builder.finish()))
    }
}

impl ScalarUDFImpl for StIntersectExtent {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn name(&self) -> &str {
        "st_intersect_extent"
    }

    fn signature(&self) -> &Signature {
        &self.signature
    }

    fn return_type(&self, _arg_types: &[DataType]) -> Result<DataType> {
        Ok(DataType::Boolean)
    }

    fn invoke_with_args(&self, args: ScalarFunctionArgs) -> Result<ColumnarValue> {
        self.invoke_batch(&args.args)
    }
}

fn non_empty_extent(blob: &[u8]) -> Result<Option<GeometryExtent>> {
    let (vertex_count, extent) =
        get_extent(blob).map_err(|err| DataFusionError::External(Box::new(err)))?;
    if vertex_count == 0 || extent.is_empty() {
        Ok(None)
    } else {
        Ok(Some(extent))
    }
}

fn intersects(a: &[u8], b: &[u8]) -> bool {
    match (get_extent(a), get_extent(b)) {
        (Ok((count_a, extent_a)), Ok((count_b, extent_b))) => {
            count_a != 0 && count_b != 0 && extent_a.intersects(&extent_b)
        }
        _ => false,
    }
}

fn check_same_crs(crs_a: &ColumnarValue, crs_b: &ColumnarValue) -> Result<()> {
    let crs_a = constant_crs(crs_a)?;
    let crs_b = constant_crs(crs_b)?;
    if crs_a != crs_b {
        return plan_err!("st_intersect_extent requires both geometries to have the same CRS");
    }

    Ok(())
}

fn constant_crs(value: &ColumnarValue) -> Result<Option<String>> {
    let ColumnarValue::Scalar(scalar) = value else {
        return plan_err!("CRS arguments to st_intersect_extent must be constant");
    };

    match scalar.cast_to(&DataType::Utf8)? {
        ScalarValue::Utf8(crs) => Ok(crs),
        other => plan_err!("Unexpected CRS argument to st_intersect_extent: {other}"),
    }
}
