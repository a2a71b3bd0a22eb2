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
use std::fmt::Write;

use geo_traits::Dimensions;

use crate::{
    error::SpatiaGeometryError,
    types::{GeometryTypeAndDimensions, GeometryTypeId},
    wkb_reader::{BlobReader, HEADER_SIZE},
};

/// Render a geometry blob as well-known text
///
/// Produces upper case keywords, a ` Z`, ` M` or ` ZM` suffix for non-XY
/// geometries, `EMPTY` for zero-length lists and all-NaN points, and `, `
/// between list items (e.g., `POLYGON ((0 0, 1 0, 0 1, 0 0))`).
pub fn to_wkt(blob: &[u8]) -> Result<String, SpatiaGeometryError> {
    let mut out = String::with_capacity(blob.len());
    write_wkt(blob, &mut out)?;
    Ok(out)
}

/// Write the well-known text of a geometry blob into `out`
///
/// Nothing is guaranteed about the contents of `out` when an error is returned.
pub fn write_wkt(blob: &[u8], out: &mut impl Write) -> Result<(), SpatiaGeometryError> {
    let mut reader = BlobReader::new(blob);
    let header = reader.read_header(0, None)?;
    write_part(&mut reader, out, header, 0, true)?;
    reader.finish()
}

fn write_part(
    reader: &mut BlobReader,
    out: &mut impl Write,
    header: GeometryTypeAndDimensions,
    depth: usize,
    tagged: bool,
) -> Result<(), SpatiaGeometryError> {
    let width = header.vertex_width();

    if tagged {
        out.write_str(header.geometry_type().wkt_id())?;
        out.write_str(match header.dimensions() {
            Dimensions::Xyz => " Z ",
            Dimensions::Xym => " M ",
            Dimensions::Xyzm => " ZM ",
            _ => " ",
        })?;
    }

    match header.geometry_type() {
        GeometryTypeId::Point => {
            let vertex = reader.read_vertex(width)?;
            if is_empty_vertex(&vertex[..width]) {
                out.write_str("EMPTY")?;
            } else {
                out.write_char('(')?;
                write_vertex(out, &vertex[..width])?;
                out.write_char(')')?;
            }
        }
        GeometryTypeId::LineString => write_vertex_list(reader, out, width)?,
        GeometryTypeId::Polygon => {
            let num_rings = reader.read_count(4)?;
            write_list(out, num_rings, |out| write_vertex_list(reader, out, width))?;
        }
        GeometryTypeId::MultiPoint => {
            let num_points = reader.read_count(HEADER_SIZE)?;
            write_list(out, num_points, |out| {
                reader.read_header(depth + 1, Some(header))?;
                let vertex = reader.read_vertex(width)?;
                if is_empty_vertex(&vertex[..width]) {
                    out.write_str("EMPTY")?;
                } else {
                    write_vertex(out, &vertex[..width])?;
                }
                Ok(())
            })?;
        }
        GeometryTypeId::MultiLineString | GeometryTypeId::MultiPolygon => {
            let num_parts = reader.read_count(HEADER_SIZE)?;
            write_list(out, num_parts, |out| {
                let child = reader.read_header(depth + 1, Some(header))?;
                write_part(reader, out, child, depth + 1, false)
            })?;
        }
        GeometryTypeId::GeometryCollection => {
            let num_parts = reader.read_count(HEADER_SIZE)?;
            write_list(out, num_parts, |out| {
                let child = reader.read_header(depth + 1, Some(header))?;
                write_part(reader, out, child, depth + 1, true)
            })?;
        }
        GeometryTypeId::Geometry => {
            return Err(SpatiaGeometryError::Format(
                "unexpected generic geometry part".to_string(),
            ))
        }
    }

    Ok(())
}

/// Write `EMPTY` or `(item, item, ...)`
fn write_list<W, F>(out: &mut W, count: usize, mut item: F) -> Result<(), SpatiaGeometryError>
where
    W: Write,
    F: FnMut(&mut W) -> Result<(), SpatiaGeometryError>,
{
    if count == 0 {
        out.write_str("EMPTY")?;
        return Ok(());
    }

    out.write_char('(')?;
    for i in 0..count {
        if i > 0 {
            out.write_str(", ")?;
        }
        item(out)?;
    }
    out.write_char(')')?;
    Ok(())
}

fn write_vertex_list(
    reader: &mut BlobReader,
    out: &mut impl Write,
    width: usize,
) -> Result<(), SpatiaGeometryError> {
    let num_vertices = reader.read_count(width * 8)?;
    write_list(out, num_vertices, |out| {
        let vertex = reader.read_vertex(width)?;
        write_vertex(out, &vertex[..width])
    })
}

fn write_vertex(out: &mut impl Write, coords: &[f64]) -> Result<(), SpatiaGeometryError> {
    for (i, ordinate) in coords.iter().enumerate() {
        if i > 0 {
            out.write_char(' ')?;
        }
        write!(out, "{ordinate}")?;
    }
    Ok(())
}

fn is_empty_vertex(coords: &[f64]) -> bool {
    coords.iter().all(|ordinate| ordinate.is_nan())
}
