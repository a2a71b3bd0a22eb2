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
use std::{any::Any, iter::zip, sync::Arc};

use arrow_array::builder::BinaryBuilder;
use arrow_schema::DataType;
use datafusion_common::cast::as_float64_array;
use datafusion_common::{DataFusionError, Result};
use datafusion_expr::{
    ColumnarValue, ScalarFunctionArgs, ScalarUDF, ScalarUDFImpl, Signature, Volatility,
};
use spatia_geometry::wkb_factory::write_blob_point;

use crate::executor::GeometryExecutor;

/// ST_Point() scalar UDF implementation
pub fn st_point_udf() -> ScalarUDF {
    ScalarUDF::new_from_impl(StPoint::default())
}

/// Construct XY points from numeric x and y values
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct StPoint {
    signature: Signature,
}

impl Default for StPoint {
    fn default() -> Self {
        Self {
            signature: Signature::uniform(2, vec![DataType::Float64], Volatility::Immutable),
        }
    }
}

impl StPoint {
    pub fn invoke_batch(&self, args: &[ColumnarValue]) -> Result<ColumnarValue> {
        let executor = GeometryExecutor::new(args);
        let num_iterations = executor.num_iterations();

        let x_array = args[0]
            .cast_to(&DataType::Float64, None)?
            .to_array(num_iterations)?;
        let y_array = args[1]
            .cast_to(&DataType::Float64, None)?
            .to_array(num_iterations)?;

        let mut builder = BinaryBuilder::with_capacity(num_iterations, 21 * num_iterations);
        for (x, y) in zip(as_float64_array(&x_array)?, as_float64_array(&y_array)?) {
            match (x, y) {
                (Some(x), Some(y)) => {
                    write_blob_point(&mut builder, (x, y))
                        .map_err(|err| DataFusionError::External(Box::new(err)))?;
                    builder.append_value(b"");
                }
                _ => builder.append_null(),
            }
        }

        executor.finish(Arc::new(builder.finish()))
    }
}

impl ScalarUDFImpl for StPoint {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn name(&self) -> &str {
        "st_point"
    }

    fn signature(&self) -> &Signature {
        &self.signature
    }

    fn return_type(&self, _arg_types: &[DataType]) -> Result<DataType> {
        Ok(DataType::Binary)
    }

    fn invoke_with_args(&self, args: ScalarFunctionArgs) -> Result<ColumnarValue> {
        self.invoke_batch(&args.args)
    }
}

#[cfg(test)]
mod test {
    use arrow_array::{ArrayRef, BinaryArray, Float64Array, Int32Array};
    use datafusion_common::ScalarValue;
    use spatia_geometry::{wkb_factory::blob_point, wkt_writer::to_wkt};

    use super::*;

    #[test]
    fn udf_metadata() {
        assert_eq!(st_point_udf().name(), "st_point");
    }

    #[test]
    fn scalars() {
        let result = StPoint::default()
            .invoke_batch(&[
                ColumnarValue::Scalar(ScalarValue::Float64(Some(1.0))),
                ColumnarValue::Scalar(ScalarValue::Int32(Some(2))),
            ])
            .unwrap();
        let ColumnarValue::Scalar(ScalarValue::Binary(Some(blob))) = result else {
            panic!("expected a binary scalar");
        };
        assert_eq!(to_wkt(&blob).unwrap(), "POINT (1 2)");

        let result = StPoint::default()
            .invoke_batch(&[
                ColumnarValue::Scalar(ScalarValue::Float64(None)),
                ColumnarValue::Scalar(ScalarValue::Float64(Some(2.0))),
            ])
            .unwrap();
        assert!(matches!(
            result,
            ColumnarValue::Scalar(ScalarValue::Binary(None))
        ));
    }

    #[test]
    fn arrays() {
        let x: ArrayRef = Arc::new(Float64Array::from(vec![Some(1.0), None, Some(-3.5)]));
        let y: ArrayRef = Arc::new(Int32Array::from(vec![Some(2), Some(0), Some(4)]));

        let result = StPoint::default()
            .invoke_batch(&[ColumnarValue::Array(x), ColumnarValue::Array(y)])
            .unwrap()
            .to_array(3)
            .unwrap();

        let expected: ArrayRef = Arc::new(BinaryArray::from(vec![
            Some(blob_point((1.0, 2.0)).unwrap().as_slice()),
            None,
            Some(blob_point((-3.5, 4.0)).unwrap().as_slice()),
        ]));
        assert_eq!(&result, &expected);
    }

    #[test]
    fn array_and_scalar() {
        let x: ArrayRef = Arc::new(Float64Array::from(vec![0.0, 1.0]));
        let result = StPoint::default()
            .invoke_batch(&[
                ColumnarValue::Array(x),
                ColumnarValue::Scalar(ScalarValue::Float64(Some(10.0))),
            ])
            .unwrap()
            .to_array(2)
            .unwrap();

        let expected: ArrayRef = Arc::new(BinaryArray::from(vec![
            blob_point((0.0, 10.0)).unwrap().as_slice(),
            blob_point((1.0, 10.0)).unwrap().as_slice(),
        ]));
        assert_eq!(&result, &expected);
    }
}
