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
use arrow_array::{Array, ArrayRef, BinaryArray, BinaryViewArray, LargeBinaryArray};
use arrow_schema::DataType;
use datafusion_common::cast::{as_binary_array, as_binary_view_array, as_large_binary_array};
use datafusion_common::{exec_err, Result, ScalarValue};
use datafusion_expr::ColumnarValue;

/// Helper for writing kernels whose first arguments are geometry blobs
///
/// The pattern supported by the [GeometryExecutor] is:
///
/// - Create a [GeometryExecutor] with `new()`
/// - Create an Arrow builder of the appropriate output type using
///   `with_capacity(executor.num_iterations())`
/// - Use `execute_blob_void()` with a lambda whose contents appends to the builder
/// - Use `finish()` to build the output [ColumnarValue].
///
/// When all arguments are scalars, one iteration is performed and `finish()`
/// returns a [ColumnarValue::Scalar]. Otherwise the output is an array with one
/// element per row of the first array argument.
///
/// Binary, LargeBinary and BinaryView storage are all accepted and iterated in place.
pub struct GeometryExecutor<'a> {
    args: &'a [ColumnarValue],
    num_iterations: usize,
}

impl<'a> GeometryExecutor<'a> {
    pub fn new(args: &'a [ColumnarValue]) -> Self {
        Self {
            args,
            num_iterations: Self::calc_num_iterations(args),
        }
    }

    /// Number of iterations the `execute_*()` methods will perform
    pub fn num_iterations(&self) -> usize {
        self.num_iterations
    }

    /// Iterate over the blobs of the first argument
    ///
    /// The callback receives the row number and the blob, or `None` for a null.
    pub fn execute_blob_void<F: FnMut(usize, Option<&'a [u8]>) -> Result<()>>(
        &self,
        mut func: F,
    ) -> Result<()> {
        let blobs = BlobValues::try_new(&self.args[0])?;
        for i in 0..self.num_iterations {
            func(i, blobs.get(i))?;
        }

        Ok(())
    }

    /// Iterate over pairs of blobs from the first two arguments
    ///
    /// A scalar on either side is paired with every element of the other side.
    pub fn execute_blob_blob_void<
        F: FnMut(Option<&'a [u8]>, Option<&'a [u8]>) -> Result<()>,
    >(
        &self,
        mut func: F,
    ) -> Result<()> {
        let blobs0 = BlobValues::try_new(&self.args[0])?;
        let blobs1 = BlobValues::try_new(&self.args[1])?;
        for i in 0..self.num_iterations {
            func(blobs0.get(i), blobs1.get(i))?;
        }

        Ok(())
    }

    /// Wrap the output built by the callbacks
    pub fn finish(&self, out: ArrayRef) -> Result<ColumnarValue> {
        if self.all_scalar() {
            Ok(ColumnarValue::Scalar(ScalarValue::try_from_array(&out, 0)?))
        } else {
            Ok(ColumnarValue::Array(out))
        }
    }

    fn all_scalar(&self) -> bool {
        self.args
            .iter()
            .all(|arg| matches!(arg, ColumnarValue::Scalar(_)))
    }

    fn calc_num_iterations(args: &[ColumnarValue]) -> usize {
        for arg in args {
            if let ColumnarValue::Array(array) = arg {
                return array.len();
            }
        }

        1
    }
}

/// Random access to the geometry blobs of one argument
#[derive(Debug, Clone, Copy)]
pub enum BlobValues<'a> {
    Scalar(Option<&'a [u8]>),
    Binary(&'a BinaryArray),
    LargeBinary(&'a LargeBinaryArray),
    BinaryView(&'a BinaryViewArray),
}

impl<'a> BlobValues<'a> {
    pub fn try_new(value: &'a ColumnarValue) -> Result<Self> {
        match value {
            ColumnarValue::Array(array) => match array.data_type() {
                DataType::Binary => Ok(Self::Binary(as_binary_array(array)?)),
                DataType::LargeBinary => Ok(Self::LargeBinary(as_large_binary_array(array)?)),
                DataType::BinaryView => Ok(Self::BinaryView(as_binary_view_array(array)?)),
                other => exec_err!("Expected binary geometry argument but got {other}"),
            },
            ColumnarValue::Scalar(scalar) => match scalar {
                ScalarValue::Binary(value)
                | ScalarValue::LargeBinary(value)
                | ScalarValue::BinaryView(value) => Ok(Self::Scalar(value.as_deref())),
                ScalarValue::Null => Ok(Self::Scalar(None)),
                other => exec_err!(
                    "Expected binary geometry argument but got {}",
                    other.data_type()
                ),
            },
        }
    }

    /// The blob at row `i`, or `None` if it is null
    ///
    /// A scalar returns the same value for every row.
    pub fn get(self, i: usize) -> Option<&'a [u8]> {
        match self {
            BlobValues::Scalar(value) => value,
            BlobValues::Binary(array) => array.is_valid(i).then(|| array.value(i)),
            BlobValues::LargeBinary(array) => array.is_valid(i).then(|| array.value(i)),
            BlobValues::BinaryView(array) => array.is_valid(i).then(|| array.value(i)),
        }
    }
}
