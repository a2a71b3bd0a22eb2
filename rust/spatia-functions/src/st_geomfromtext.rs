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
use datafusion_common::cast::as_string_view_array;
use datafusion_common::{DataFusionError, Result};
use datafusion_expr::{
    ColumnarValue, ScalarFunctionArgs, ScalarUDF, ScalarUDFImpl, Signature, Volatility,
};
use spatia_common::option::CastOptions;
use spatia_geometry::wkt_reader::{read_point_legacy, read_wkt};

use crate::executor::GeometryExecutor;

/// ST_GeomFromText() scalar UDF implementation
///
/// `options.strict` decides whether unparseable text fails the batch or
/// becomes NULL.
pub fn st_geomfromtext_udf(options: &CastOptions) -> ScalarUDF {
    ScalarUDF::new_from_impl(StGeomFromText::new(options.strict))
}

/// Parse well-known text into geometry blobs
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct StGeomFromText {
    signature: Signature,
    strict: bool,
    aliases: Vec<String>,
}

impl Default for StGeomFromText {
    fn default() -> Self {
        Self::new(CastOptions::default().strict)
    }
}

impl StGeomFromText {
    pub fn new(strict: bool) -> Self {
        Self {
            signature: Signature::uniform(
                1,
                vec![DataType::Utf8, DataType::LargeUtf8, DataType::Utf8View],
                Volatility::Immutable,
            ),
            strict,
            aliases: vec!["st_geomfromwkt".to_string()],
        }
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn invoke_batch(&self, args: &[ColumnarValue]) -> Result<ColumnarValue> {
        let executor = GeometryExecutor::new(args);
        let arg_array = args[0]
            .cast_to(&DataType::Utf8View, None)?
            .to_array(executor.num_iterations())?;

        // A 2D point is 21 bytes
        let mut builder =
            BinaryBuilder::with_capacity(executor.num_iterations(), 21 * executor.num_iterations());

        for item in as_string_view_array(&arg_array)? {
            match item {
                Some(text) => match self.parse(text)? {
                    Some(blob) => builder.append_value(blob),
                    None => builder.append_null(),
                },
                None => builder.append_null(),
            }
        }

        executor.finish(Arc::new(builder.finish()))
    }

    /// Parse one value
    ///
    /// Non-strict parsing falls back to the legacy point form and returns
    /// `None` when that fails too.
    fn parse(&self, text: &str) -> Result<Option<Vec<u8>>> {
        match read_wkt(text) {
            Ok(blob) => Ok(Some(blob)),
            Err(err) if self.strict => Err(DataFusionError::External(Box::new(err))),
            Err(_) => Ok(read_point_legacy(text)),
        }
    }
}

impl ScalarUDFImpl for StGeomFromText {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn name(&self) -> &str {
        "st_geomfromtext"
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
