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
use geo_traits::Dimensions;

use crate::{
    error::SpatiaGeometryError,
    types::{dimensions_name, GeometryTypeAndDimensions, GeometryTypeId, MAX_GEOMETRY_DEPTH},
};

/// The only byte order marker accepted in a geometry blob (little endian)
pub const BLOB_BYTE_ORDER: u8 = 0x01;

/// Size of a part header (byte order marker and type code)
pub const HEADER_SIZE: usize = 5;

/// Validate a well-known binary value and convert it into a geometry blob
///
/// The blob layout is little endian ISO WKB, so a valid value is copied as is.
/// Big endian input, unknown type codes, nesting past [MAX_GEOMETRY_DEPTH], mixed
/// dimensions and trailing bytes are rejected.
pub fn from_wkb(wkb: &[u8]) -> Result<Vec<u8>, SpatiaGeometryError> {
    validate_blob(wkb)?;
    Ok(wkb.to_vec())
}

/// Convert a geometry blob into well-known binary
///
/// Applies the same validation as [from_wkb].
pub fn to_wkb(blob: &[u8]) -> Result<Vec<u8>, SpatiaGeometryError> {
    validate_blob(blob)?;
    Ok(blob.to_vec())
}

/// Check that `buf` holds exactly one well formed geometry blob
pub fn validate_blob(buf: &[u8]) -> Result<GeometryTypeAndDimensions, SpatiaGeometryError> {
    for_each_vertex(buf, |_, _| {})
}

/// Read the type and dimensions of the outermost part without walking the payload
pub fn geometry_type(buf: &[u8]) -> Result<GeometryTypeAndDimensions, SpatiaGeometryError> {
    BlobReader::new(buf).read_header(0, None)
}

/// Visit every vertex of a blob in storage order
///
/// The callback receives the dimensions of the geometry and one vertex's ordinates.
/// Empty points are visited with all-NaN ordinates. Returns the type of the
/// outermost part.
pub fn for_each_vertex<F>(
    buf: &[u8],
    mut visit: F,
) -> Result<GeometryTypeAndDimensions, SpatiaGeometryError>
where
    F: FnMut(Dimensions, &[f64]),
{
    let mut reader = BlobReader::new(buf);
    let header = reader.read_header(0, None)?;
    walk_part(&mut reader, header, 0, &mut visit)?;
    reader.finish()?;
    Ok(header)
}

fn walk_part<F>(
    reader: &mut BlobReader,
    header: GeometryTypeAndDimensions,
    depth: usize,
    visit: &mut F,
) -> Result<(), SpatiaGeometryError>
where
    F: FnMut(Dimensions, &[f64]),
{
    let dimensions = header.dimensions();
    let width = header.vertex_width();
    match header.geometry_type() {
        GeometryTypeId::Point => {
            let vertex = reader.read_vertex(width)?;
            visit(dimensions, &vertex[..width]);
        }
        GeometryTypeId::LineString => {
            let num_vertices = reader.read_count(width * 8)?;
            for _ in 0..num_vertices {
                let vertex = reader.read_vertex(width)?;
                visit(dimensions, &vertex[..width]);
            }
        }
        GeometryTypeId::Polygon => {
            let num_rings = reader.read_count(4)?;
            for _ in 0..num_rings {
                let num_vertices = reader.read_count(width * 8)?;
                for _ in 0..num_vertices {
                    let vertex = reader.read_vertex(width)?;
                    visit(dimensions, &vertex[..width]);
                }
            }
        }
        GeometryTypeId::MultiPoint
        | GeometryTypeId::MultiLineString
        | GeometryTypeId::MultiPolygon
        | GeometryTypeId::GeometryCollection => {
            let num_parts = reader.read_count(HEADER_SIZE)?;
            for _ in 0..num_parts {
                let child = reader.read_header(depth + 1, Some(header))?;
                walk_part(reader, child, depth + 1, visit)?;
            }
        }
        GeometryTypeId::Geometry => {
            return Err(SpatiaGeometryError::Format(
                "unexpected generic geometry part".to_string(),
            ))
        }
    }

    Ok(())
}

/// Cursor over a geometry blob
///
/// All reads are bounds checked and report the offset at which they failed.
pub(crate) struct BlobReader<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> BlobReader<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Self { buf, offset: 0 }
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.offset
    }

    /// Error unless every byte has been consumed
    pub(crate) fn finish(&self) -> Result<(), SpatiaGeometryError> {
        if self.remaining() != 0 {
            return Err(SpatiaGeometryError::Format(format!(
                "{} trailing bytes after geometry. At offset: {}.",
                self.remaining(),
                self.offset
            )));
        }

        Ok(())
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N], SpatiaGeometryError> {
        if self.remaining() < N {
            return Err(SpatiaGeometryError::Format(format!(
                "buffer too small. At offset: {}. Need {} bytes.",
                self.offset, N
            )));
        }

        let mut out = [0u8; N];
        out.copy_from_slice(&self.buf[self.offset..self.offset + N]);
        self.offset += N;
        Ok(out)
    }

    fn read_u32(&mut self) -> Result<u32, SpatiaGeometryError> {
        Ok(u32::from_le_bytes(self.take::<4>()?))
    }

    fn read_f64(&mut self) -> Result<f64, SpatiaGeometryError> {
        Ok(f64::from_le_bytes(self.take::<8>()?))
    }

    /// Read a part header and check it against its parent
    ///
    /// `depth` is the nesting depth of the part being read (0 for the outermost part).
    pub(crate) fn read_header(
        &mut self,
        depth: usize,
        parent: Option<GeometryTypeAndDimensions>,
    ) -> Result<GeometryTypeAndDimensions, SpatiaGeometryError> {
        let offset = self.offset;
        let [byte_order] = self.take::<1>()?;
        match byte_order {
            BLOB_BYTE_ORDER => {}
            0x00 => {
                return Err(SpatiaGeometryError::Format(format!(
                    "big endian byte order is not supported. At offset: {offset}."
                )))
            }
            other => {
                return Err(SpatiaGeometryError::Format(format!(
                    "invalid byte order marker {other:#04x}. At offset: {offset}."
                )))
            }
        }

        let type_code = self.read_u32()?;
        let header = GeometryTypeAndDimensions::try_from_wkb_id(type_code).map_err(|_| {
            SpatiaGeometryError::Format(format!(
                "unknown geometry type code {type_code}. At offset: {offset}."
            ))
        })?;

        if header.geometry_type() == GeometryTypeId::Geometry {
            return Err(SpatiaGeometryError::Format(format!(
                "unsupported geometry type code {type_code}. At offset: {offset}."
            )));
        }

        if let Some(parent) = parent {
            if parent.dimensions() != header.dimensions() {
                return Err(SpatiaGeometryError::DimensionMismatch {
                    expected: dimensions_name(parent.dimensions()),
                    actual: dimensions_name(header.dimensions()),
                });
            }

            if let Some(child_type) = parent.geometry_type().multi_child() {
                if child_type != header.geometry_type() {
                    return Err(SpatiaGeometryError::Format(format!(
                        "{} may not contain {}. At offset: {offset}.",
                        parent.geometry_type().wkt_id(),
                        header.geometry_type().wkt_id()
                    )));
                }
            }
        }

        if header.geometry_type().is_collection() && depth >= MAX_GEOMETRY_DEPTH {
            return Err(SpatiaGeometryError::DepthExceeded(MAX_GEOMETRY_DEPTH));
        }

        Ok(header)
    }

    /// Read an element count, checking that `count * min_item_size` bytes remain
    pub(crate) fn read_count(&mut self, min_item_size: usize) -> Result<usize, SpatiaGeometryError> {
        let offset = self.offset;
        let count = usize::try_from(self.read_u32()?)?;
        match count.checked_mul(min_item_size) {
            Some(needed) if needed <= self.remaining() => Ok(count),
            _ => Err(SpatiaGeometryError::Format(format!(
                "count {count} exceeds the remaining buffer. At offset: {offset}."
            ))),
        }
    }

    /// Read one vertex of `width` ordinates; unused trailing slots are NaN
    pub(crate) fn read_vertex(&mut self, width: usize) -> Result<[f64; 4], SpatiaGeometryError> {
        let mut vertex = [f64::NAN; 4];
        for ordinate in vertex.iter_mut().take(width) {
            *ordinate = self.read_f64()?;
        }
        Ok(vertex)
    }
}
