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
use std::io::Write;

use geo_traits::Dimensions;

use crate::{
    error::SpatiaGeometryError,
    types::{GeometryTypeAndDimensions, GeometryTypeId},
    wkb_reader::BLOB_BYTE_ORDER,
};

/// Write the byte order marker and type code of a part
pub fn write_blob_header(
    buf: &mut impl Write,
    type_and_dims: &GeometryTypeAndDimensions,
) -> Result<(), SpatiaGeometryError> {
    buf.write_all(&[BLOB_BYTE_ORDER])?;
    buf.write_all(&type_and_dims.wkb_id().to_le_bytes())?;
    Ok(())
}

/// Write the ordinates of one vertex
pub fn write_blob_coord(buf: &mut impl Write, coord: &[f64]) -> Result<(), SpatiaGeometryError> {
    for ordinate in coord {
        buf.write_all(&ordinate.to_le_bytes())?;
    }
    Ok(())
}

/// Create a blob representing an XY POINT
pub fn blob_point(pt: (f64, f64)) -> Result<Vec<u8>, SpatiaGeometryError> {
    let mut out_blob = Vec::with_capacity(5 + 16);
    write_blob_point(&mut out_blob, pt)?;
    Ok(out_blob)
}

/// Write a blob representing an XY POINT into a buffer
///
/// This can be used to build Binary arrays, as the arrow-rs BinaryBuilder
/// implements Write.
pub fn write_blob_point(buf: &mut impl Write, pt: (f64, f64)) -> Result<(), SpatiaGeometryError> {
    write_blob_header(
        buf,
        &GeometryTypeAndDimensions::new(GeometryTypeId::Point, Dimensions::Xy),
    )?;
    write_blob_coord(buf, &[pt.0, pt.1])
}

/// Write an empty POINT (all ordinates NaN) with the given dimensions
pub fn write_blob_empty_point(
    buf: &mut impl Write,
    dimensions: Dimensions,
) -> Result<(), SpatiaGeometryError> {
    let header = GeometryTypeAndDimensions::new(GeometryTypeId::Point, dimensions);
    write_blob_header(buf, &header)?;
    for _ in 0..header.vertex_width() {
        buf.write_all(&f64::NAN.to_le_bytes())?;
    }
    Ok(())
}

/// Create a blob representing an XY LINESTRING
pub fn blob_linestring<I: ExactSizeIterator<Item = (f64, f64)>>(
    pts: I,
) -> Result<Vec<u8>, SpatiaGeometryError> {
    let mut out_blob = Vec::with_capacity(5 + 4 + pts.len() * 16);
    write_blob_linestring(&mut out_blob, pts)?;
    Ok(out_blob)
}

/// Write a blob representing an XY LINESTRING into a buffer
pub fn write_blob_linestring<I: ExactSizeIterator<Item = (f64, f64)>>(
    buf: &mut impl Write,
    pts: I,
) -> Result<(), SpatiaGeometryError> {
    let size_u32 = count_to_u32(pts.len())?;

    write_blob_header(
        buf,
        &GeometryTypeAndDimensions::new(GeometryTypeId::LineString, Dimensions::Xy),
    )?;
    buf.write_all(&size_u32.to_le_bytes())?;
    for pt in pts {
        write_blob_coord(buf, &[pt.0, pt.1])?;
    }

    Ok(())
}

pub(crate) fn count_to_u32(count: usize) -> Result<u32, SpatiaGeometryError> {
    u32::try_from(count).map_err(|_| {
        SpatiaGeometryError::Invalid(format!("Count {count} does not fit in a 32-bit count field"))
    })
}

#[cfg(test)]
mod test {
    use std::str::FromStr;

    use wkb::{writer::WriteOptions, Endianness};
    use wkt::Wkt;

    use super::*;

    fn make_wkb(wkt_value: &str) -> Vec<u8> {
        let geom = Wkt::<f64>::from_str(wkt_value).unwrap();
        let mut out: Vec<u8> = vec![];
        wkb::writer::write_geometry(
            &mut out,
            &geom,
            &WriteOptions {
                endianness: Endianness::LittleEndian,
            },
        )
        .unwrap();
        out
    }

    #[test]
    fn test_blob_point() {
        assert_eq!(blob_point((1.0, 2.0)).unwrap(), make_wkb("POINT (1 2)"));
    }

    #[test]
    fn test_blob_linestring() {
        let pts = vec![(0.0, 0.0), (1.0, 1.0), (2.0, 0.5)];
        assert_eq!(
            blob_linestring(pts.into_iter()).unwrap(),
            make_wkb("LINESTRING (0 0, 1 1, 2 0.5)")
        );

        let empty: Vec<(f64, f64)> = vec![];
        assert_eq!(
            blob_linestring(empty.into_iter()).unwrap(),
            make_wkb("LINESTRING EMPTY")
        );
    }

    #[test]
    fn test_empty_point() {
        let mut out = vec![];
        write_blob_empty_point(&mut out, Dimensions::Xyz).unwrap();
        assert_eq!(out.len(), 5 + 24);
        assert_eq!(&out[..5], &[0x01, 0xe9, 0x03, 0x00, 0x00]);
        assert!(out[5..]
            .chunks(8)
            .all(|chunk| f64::from_le_bytes(chunk.try_into().unwrap()).is_nan()));
    }

    #[test]
    fn test_count_to_u32() {
        assert_eq!(count_to_u32(3).unwrap(), 3);
        #[cfg(target_pointer_width = "64")]
        assert!(count_to_u32(u32::MAX as usize + 1).is_err());
    }
}
