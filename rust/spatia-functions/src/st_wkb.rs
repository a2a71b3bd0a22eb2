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

use arrow_array::builder::BinaryBuilder;
use arrow_schema::DataType;
use datafusion_common::{DataFusionError, Result};
use datafusion_expr::{ColumnarValue, ScalarFunctionArgs, ScalarUDF, ScalarUDFImpl, Signature};
use spatia_geometry::{error::SpatiaGeometryError, wkb_reader};

use crate::executor::GeometryExecutor;
use crate::register::geometry_signature;

/// ST_GeomFromWKB() scalar UDF implementation
pub fn st_geomfromwkb_udf() -> ScalarUDF {
    ScalarUDF::new_from_impl(StWkb::new(WkbDirection::FromWkb))
}

/// ST_AsBinary() scalar UDF implementation
pub fn st_asbinary_udf() -> ScalarUDF {
    ScalarUDF::new_from_impl(StWkb::new(WkbDirection::ToWkb))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WkbDirection {
    FromWkb,
    ToWkb,
}

/// Validating pass-through between well-known binary and geometry blobs
///
/// Both layouts are little endian ISO WKB, so each value is checked and copied.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct StWkb {
    signature: Signature,
    direction: WkbDirection,
    aliases: Vec<String>,
}

impl StWkb {
    pub fn new(direction: WkbDirection) -> Self {
        let aliases = match direction {
            WkbDirection::FromWkb => vec![],
            WkbDirection::ToWkb => vec!["st_aswkb".to_string()],
        };

        Self {
            signature: geometry_signature(1),
            direction,
            aliases,
        }
    }

    pub fn invoke_batch(&self, args: &[ColumnarValue]) -> Result<ColumnarValue> {
        let executor = GeometryExecutor::new(args);
        let mut builder =
            BinaryBuilder::with_capacity(executor.num_iterations(), 21 * executor.num_iterations());

        executor.execute_blob_void(|_, maybe_blob| {
            match maybe_blob {
                Some(blob) => {
                    let converted = self
                        .convert(blob)
                        .map_err(|err| DataFusionError::External(Box::new(err)))?;
                    builder.append_value(converted);
                }
                None => builder.append_null(),
            }

            Ok(())
        })?;

        executor.finish(Arc::new(builder.finish()))
    }

    fn convert(&self, value: &[u8]) -> Result<Vec<u8>, SpatiaGeometryError> {
        match self.direction {
            WkbDirection::FromWkb => wkb_reader::from_wkb(value),
            WkbDirection::ToWkb => wkb_reader::to_wkb(value),
        }
    }
}

impl ScalarUDFImpl for StWkb {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn name(&self) -> &str {
        match self.direction {
            WkbDirection::FromWkb => "st_geomfromwkb",
            WkbDirection::ToWkb => "st_asbinary",
        }
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

    fn aliases(&self) -> &[String] {
        &self.aliases
    }
}

#[cfg(test)]
mod test {
    use arrow_array::{ArrayRef, BinaryArray, BinaryViewArray};
    use datafusion_common::ScalarValue;
    use rstest::rstest;
    use spatia_geometry::wkt_reader::read_wkt;

    use super::*;

    #[test]
    fn udf_metadata() {
        assert_eq!(st_geomfromwkb_udf().name(), "st_geomfromwkb");
        assert_eq!(st_asbinary_udf().name(), "st_asbinary");
        assert_eq!(st_asbinary_udf().aliases(), &["st_aswkb".to_string()]);
    }

    #[rstest]
    fn pass_through(#[values(WkbDirection::FromWkb, WkbDirection::ToWkb)] direction: WkbDirection) {
        let polygon = read_wkt("POLYGON ((0 0, 1 0, 0 1, 0 0))").unwrap();
        let point = read_wkt("POINT ZM (1 2 3 4)").unwrap();
        let input: ArrayRef = Arc::new(BinaryViewArray::from(vec![
            Some(polygon.as_slice()),
            None,
            Some(point.as_slice()),
        ]));

        let result = StWkb::new(direction)
            .invoke_batch(&[ColumnarValue::Array(input)])
            .unwrap()
            .to_array(3)
            .unwrap();
        let expected: ArrayRef = Arc::new(BinaryArray::from(vec![
            Some(polygon.as_slice()),
            None,
            Some(point.as_slice()),
        ]));
        assert_eq!(&result, &expected);
    }

    #[rstest]
    fn big_endian_rejected(
        #[values(WkbDirection::FromWkb, WkbDirection::ToWkb)] direction: WkbDirection,
    ) {
        // POINT (1 2) in big endian
        let mut big_endian = vec![0x00, 0x00, 0x00, 0x00, 0x01];
        big_endian.extend_from_slice(&1.0f64.to_be_bytes());
        big_endian.extend_from_slice(&2.0f64.to_be_bytes());

        let err = StWkb::new(direction)
            .invoke_batch(&[ColumnarValue::Scalar(ScalarValue::Binary(Some(
                big_endian,
            )))])
            .unwrap_err();
        assert!(matches!(err, DataFusionError::External(_)));
    }
}
