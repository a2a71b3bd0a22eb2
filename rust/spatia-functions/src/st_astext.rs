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
use datafusion_common::{DataFusionError, Result};
use datafusion_expr::{ColumnarValue, ScalarFunctionArgs, ScalarUDF, ScalarUDFImpl, Signature};
use spatia_geometry::wkt_writer::write_wkt;

use crate::executor::GeometryExecutor;
use crate::register::geometry_signature;

/// ST_AsText() scalar UDF implementation
pub fn st_astext_udf() -> ScalarUDF {
    ScalarUDF::new_from_impl(StAsText::default())
}

/// Render geometry blobs as well-known text
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct StAsText {
    signature: Signature,
}

impl Default for StAsText {
    fn default() -> Self {
        Self {
            signature: geometry_signature(1),
        }
    }
}

impl StAsText {
    pub fn invoke_batch(&self, args: &[ColumnarValue]) -> Result<ColumnarValue> {
        let executor = GeometryExecutor::new(args);

        // The shortest non-empty output is POINT (x y) with short numbers
        let min_probable_wkt_size = executor.num_iterations() * 12;
        let mut builder =
            StringBuilder::with_capacity(executor.num_iterations(), min_probable_wkt_size);

        executor.execute_blob_void(|_, maybe_blob| {
            match maybe_blob {
                Some(blob) => {
                    write_wkt(blob, &mut builder)
                        .map_err(|err| DataFusionError::External(Box::new(err)))?;
                    builder.append_value("");
                }
                None => builder.append_null(),
            }

            Ok(())
        })?;

        executor.finish(Arc::new(builder.finish()))
    }
}

impl ScalarUDFImpl for StAsText {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn name(&self) -> &str {
        "st_astext"
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

#[cfg(test)]
mod test {
    use arrow_array::{ArrayRef, BinaryArray, StringArray};
    use datafusion_common::ScalarValue;
    use spatia_geometry::wkt_reader::read_wkt;

    use super::*;

    fn blob(wkt: &str) -> Vec<u8> {
        read_wkt(wkt).unwrap()
    }

    #[test]
    fn udf_metadata() {
        let udf = st_astext_udf();
        assert_eq!(udf.name(), "st_astext");
        assert_eq!(
            StAsText::default()
                .return_type(&[DataType::Binary])
                .unwrap(),
            DataType::Utf8
        );
    }

    #[test]
    fn scalar() {
        let udf = StAsText::default();
        let result = udf
            .invoke_batch(&[ColumnarValue::Scalar(ScalarValue::Binary(Some(blob(
                "point z (1 2 3)",
            ))))])
            .unwrap();
        match result {
            ColumnarValue::Scalar(value) => assert_eq!(
                value,
                ScalarValue::Utf8(Some("POINT Z (1 2 3)".to_string()))
            ),
            ColumnarValue::Array(_) => panic!("expected a scalar"),
        }

        let result = udf
            .invoke_batch(&[ColumnarValue::Scalar(ScalarValue::Binary(None))])
            .unwrap();
        assert!(matches!(
            result,
            ColumnarValue::Scalar(ScalarValue::Utf8(None))
        ));
    }

    #[test]
    fn array() {
        let point = blob("POINT (1 2)");
        let empty = blob("LINESTRING EMPTY");
        let polygon = blob("POLYGON((0 0,0 1,1 1,1 0,0 0))");
        let input: ArrayRef = Arc::new(BinaryArray::from(vec![
            Some(point.as_slice()),
            None,
            Some(empty.as_slice()),
            Some(polygon.as_slice()),
        ]));

        let result = StAsText::default()
            .invoke_batch(&[ColumnarValue::Array(input)])
            .unwrap()
            .to_array(4)
            .unwrap();
        let expected: ArrayRef = Arc::new(StringArray::from(vec![
            Some("POINT (1 2)"),
            None,
            Some("LINESTRING EMPTY"),
            Some("POLYGON ((0 0, 0 1, 1 1, 1 0, 0 0))"),
        ]));
        assert_eq!(&result, &expected);
    }

    #[test]
    fn invalid_blob() {
        let err = StAsText::default()
            .invoke_batch(&[ColumnarValue::Scalar(ScalarValue::Binary(Some(vec![
                0x00, 0x01,
            ])))])
            .unwrap_err();
        assert!(matches!(err, DataFusionError::External(_)));
    }
}
