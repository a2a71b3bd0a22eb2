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

use arrow_array::{builder::BinaryBuilder, Array};
use arrow_schema::DataType;
use datafusion_common::cast::as_list_array;
use datafusion_common::{exec_err, plan_err, DataFusionError, Result};
use datafusion_expr::{
    ColumnarValue, ScalarFunctionArgs, ScalarUDF, ScalarUDFImpl, Signature, Volatility,
};
use geo_traits::Dimensions;
use spatia_geometry::{
    types::{GeometryTypeAndDimensions, GeometryTypeId},
    wkb_factory::write_blob_linestring,
    wkb_reader::for_each_vertex,
};

use crate::executor::{BlobValues, GeometryExecutor};

/// ST_MakeLine() scalar UDF implementation
pub fn st_makeline_udf() -> ScalarUDF {
    ScalarUDF::new_from_impl(StMakeLine::default())
}

/// Build an XY linestring from a list of XY points
///
/// Null list elements and empty points are skipped. A null list produces NULL.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct StMakeLine {
    signature: Signature,
}

impl Default for StMakeLine {
    fn default() -> Self {
        Self {
            signature: Signature::any(1, Volatility::Immutable),
        }
    }
}

impl StMakeLine {
    pub fn invoke_batch(&self, args: &[ColumnarValue]) -> Result<ColumnarValue> {
        let executor = GeometryExecutor::new(args);
        let lists = args[0].to_array(executor.num_iterations())?;
        let lists = as_list_array(&lists)?;

        let points = ColumnarValue::Array(lists.values().clone());
        let points = BlobValues::try_new(&points)?;

        let mut builder = BinaryBuilder::with_capacity(lists.len(), lists.values().len() * 16);
        let mut coords = Vec::new();
        for i in 0..lists.len() {
            if lists.is_null(i) {
                builder.append_null();
                continue;
            }

            coords.clear();
            let offsets = lists.value_offsets();
            for j in offsets[i] as usize..offsets[i + 1] as usize {
                if let Some(blob) = points.get(j) {
                    push_point(blob, &mut coords)?;
                }
            }

            write_blob_linestring(&mut builder, coords.iter().copied())
                .map_err(|err| DataFusionError::External(Box::new(err)))?;
            builder.append_value(b"");
        }

        executor.finish(Arc::new(builder.finish()))
    }
}

impl ScalarUDFImpl for StMakeLine {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn name(&self) -> &str {
        "st_makeline"
    }

    fn signature(&self) -> &Signature {
        &self.signature
    }

    fn return_type(&self, arg_types: &[DataType]) -> Result<DataType> {
        match &arg_types[0] {
            DataType::List(field)
                if matches!(
                    field.data_type(),
                    DataType::Binary | DataType::LargeBinary | DataType::BinaryView
                ) =>
            {
                Ok(DataType::Binary)
            }
            other => plan_err!("st_makeline expects a list of geometries but got {other}"),
        }
    }

    fn invoke_with_args(&self, args: ScalarFunctionArgs) -> Result<ColumnarValue> {
        self.invoke_batch(&args.args)
    }
}

fn push_point(blob: &[u8], coords: &mut Vec<(f64, f64)>) -> Result<()> {
    let mut vertex = None;
    let geometry_type = for_each_vertex(blob, |_, coord| vertex = Some((coord[0], coord[1])))
        .map_err(|err| DataFusionError::External(Box::new(err)))?;

    let xy_point = GeometryTypeAndDimensions::new(GeometryTypeId::Point, Dimensions::Xy);
    if geometry_type != xy_point {
        return exec_err!("st_makeline expects XY points but got {geometry_type}");
    }

    if let Some((x, y)) = vertex.filter(|(x, y)| !x.is_nan() && !y.is_nan()) {
        coords.push((x, y));
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use arrow_array::{builder::ListBuilder, ArrayRef, BinaryArray};
    use arrow_schema::Field;
    use datafusion_common::ScalarValue;
    use spatia_geometry::{wkt_reader::read_wkt, wkt_writer::to_wkt};

    use super::*;

    fn list_of_points(rows: Vec<Option<Vec<Option<&str>>>>) -> ArrayRef {
        let mut builder = ListBuilder::new(BinaryBuilder::new());
        for row in rows {
            match row {
                Some(items) => {
                    for item in items {
                        match item {
                            Some(wkt) => builder.values().append_value(read_wkt(wkt).unwrap()),
                            None => builder.values().append_null(),
                        }
                    }
                    builder.append(true);
                }
                None => builder.append(false),
            }
        }
        Arc::new(builder.finish())
    }

    #[test]
    fn udf_metadata() {
        let udf = StMakeLine::default();
        assert_eq!(st_makeline_udf().name(), "st_makeline");
        let list_type = DataType::List(Arc::new(Field::new("item", DataType::Binary, true)));
        assert_eq!(udf.return_type(&[list_type]).unwrap(), DataType::Binary);
        assert!(udf.return_type(&[DataType::Binary]).is_err());
    }

    #[test]
    fn make_lines() {
        let input = list_of_points(vec![
            Some(vec![Some("POINT (0 0)"), Some("POINT (1 1)"), Some("POINT (2 0)")]),
            None,
            Some(vec![Some("POINT (0 0)"), None, Some("POINT EMPTY"), Some("POINT (5 5)")]),
            Some(vec![]),
        ]);

        let result = StMakeLine::default()
            .invoke_batch(&[ColumnarValue::Array(input)])
            .unwrap()
            .to_array(4)
            .unwrap();
        let result = result.as_any().downcast_ref::<BinaryArray>().unwrap();

        assert_eq!(
            to_wkt(result.value(0)).unwrap(),
            "LINESTRING (0 0, 1 1, 2 0)"
        );
        assert!(result.is_null(1));
        assert_eq!(to_wkt(result.value(2)).unwrap(), "LINESTRING (0 0, 5 5)");
        assert_eq!(to_wkt(result.value(3)).unwrap(), "LINESTRING EMPTY");
    }

    #[test]
    fn scalar_list() {
        let input = list_of_points(vec![Some(vec![Some("POINT (0 1)"), Some("POINT (2 3)")])]);
        let scalar = ScalarValue::try_from_array(&input, 0).unwrap();

        let result = StMakeLine::default()
            .invoke_batch(&[ColumnarValue::Scalar(scalar)])
            .unwrap();
        let ColumnarValue::Scalar(ScalarValue::Binary(Some(blob))) = result else {
            panic!("expected a binary scalar");
        };
        assert_eq!(to_wkt(&blob).unwrap(), "LINESTRING (0 1, 2 3)");
    }

    #[test]
    fn non_point_rejected() {
        let input = list_of_points(vec![Some(vec![
            Some("POINT (0 1)"),
            Some("LINESTRING (0 0, 1 1)"),
        ])]);
        let err = StMakeLine::default()
            .invoke_batch(&[ColumnarValue::Array(input)])
            .unwrap_err();
        assert!(err
            .to_string()
            .contains("st_makeline expects XY points but got LineString"));

        let input = list_of_points(vec![Some(vec![Some("POINT Z (0 1 2)")])]);
        let err = StMakeLine::default()
            .invoke_batch(&[ColumnarValue::Array(input)])
            .unwrap_err();
        assert!(err.to_string().contains("but got Point Z"));
    }
}
