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
use std::str::FromStr;

use geo_traits::Dimensions;

use crate::{
    error::SpatiaGeometryError,
    types::{dimensions_name, GeometryTypeAndDimensions, GeometryTypeId, MAX_GEOMETRY_DEPTH},
    wkb_factory::{count_to_u32, write_blob_empty_point, write_blob_header},
};

/// Parse well-known text into a geometry blob
///
/// Keywords are case-insensitive and may be followed by a separate `Z`, `M` or `ZM`
/// dimension suffix. Every nested part must use the dimensions of its parent; there
/// is no inference of dimensions from the number of ordinates. The output is
/// written in a single pass: each count field is reserved when its list opens and
/// filled in when the list closes.
pub fn read_wkt(text: &str) -> Result<Vec<u8>, SpatiaGeometryError> {
    let mut parser = WktParser::new(text);
    parser.skip_whitespace();
    parser.parse_geometry(0, None)?;
    if !parser.at_end() {
        return Err(parser.error("Unexpected trailing characters"));
    }

    Ok(parser.out)
}

/// Parse the legacy `POINT (x y)` text form
///
/// Only an XY point with exactly two numbers is accepted. Text after the closing
/// parenthesis is ignored. Returns `None` when the text does not have that shape.
pub fn read_point_legacy(text: &str) -> Option<Vec<u8>> {
    let rest = text.trim_start().strip_prefix("POINT")?;
    let rest = rest.trim_start().strip_prefix('(')?;
    let (coords, _) = rest.split_once(')')?;

    let mut parts = coords.split_ascii_whitespace();
    let x = parts.next()?.parse::<f64>().ok()?;
    let y = parts.next()?.parse::<f64>().ok()?;
    if parts.next().is_some() {
        return None;
    }

    crate::wkb_factory::blob_point((x, y)).ok()
}

struct WktParser<'a> {
    text: &'a str,
    pos: usize,
    out: Vec<u8>,
}

impl<'a> WktParser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            pos: 0,
            out: Vec::with_capacity(text.len()),
        }
    }

    fn error(&self, message: impl Into<String>) -> SpatiaGeometryError {
        SpatiaGeometryError::Parse {
            message: message.into(),
            position: self.text[..self.pos].chars().count(),
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.text.len()
    }

    fn peek(&self) -> Option<u8> {
        self.text.as_bytes().get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if !c.is_ascii_whitespace() {
                break;
            }
            self.pos += 1;
        }
    }

    fn consume(&mut self, c: u8) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            self.skip_whitespace();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: u8) -> Result<(), SpatiaGeometryError> {
        if self.consume(c) {
            Ok(())
        } else {
            Err(self.error(format!("Expected '{}'", c as char)))
        }
    }

    fn peek_word(&self) -> &'a str {
        let bytes = self.text.as_bytes();
        let mut end = self.pos;
        while end < bytes.len() && bytes[end].is_ascii_alphabetic() {
            end += 1;
        }
        &self.text[self.pos..end]
    }

    fn consume_keyword(&mut self, keyword: &str) -> bool {
        let word = self.peek_word();
        if word.eq_ignore_ascii_case(keyword) {
            self.pos += word.len();
            self.skip_whitespace();
            true
        } else {
            false
        }
    }

    fn read_number(&mut self) -> Result<f64, SpatiaGeometryError> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == b'+' || c == b'-' || c == b'.' {
                self.pos += 1;
            } else {
                break;
            }
        }

        let token = &self.text[start..self.pos];
        if token.is_empty() {
            return Err(self.error("Expected number"));
        }

        match token.parse::<f64>() {
            Ok(value) => {
                self.skip_whitespace();
                Ok(value)
            }
            Err(_) => {
                self.pos = start;
                Err(self.error(format!("Invalid number '{token}'")))
            }
        }
    }

    fn reserve_count(&mut self) -> usize {
        let offset = self.out.len();
        self.out.extend_from_slice(&[0; 4]);
        offset
    }

    fn patch_count(&mut self, offset: usize, count: usize) -> Result<(), SpatiaGeometryError> {
        let count = count_to_u32(count)?;
        self.out[offset..offset + 4].copy_from_slice(&count.to_le_bytes());
        Ok(())
    }

    /// Parse `EMPTY` or a parenthesized, comma separated list, writing its length first
    fn parse_list<F>(&mut self, mut item: F) -> Result<(), SpatiaGeometryError>
    where
        F: FnMut(&mut Self) -> Result<(), SpatiaGeometryError>,
    {
        if self.consume_keyword("EMPTY") {
            self.out.extend_from_slice(&0u32.to_le_bytes());
            return Ok(());
        }

        self.expect(b'(')?;
        let count_offset = self.reserve_count();
        let mut count = 0;
        loop {
            item(self)?;
            count += 1;
            if !self.consume(b',') {
                break;
            }
        }
        self.expect(b')')?;
        self.patch_count(count_offset, count)
    }

    fn parse_vertex(&mut self, width: usize) -> Result<(), SpatiaGeometryError> {
        for _ in 0..width {
            let value = self.read_number()?;
            self.out.extend_from_slice(&value.to_le_bytes());
        }
        Ok(())
    }

    fn parse_header(&mut self) -> Result<GeometryTypeAndDimensions, SpatiaGeometryError> {
        let word = self.peek_word();
        if word.is_empty() {
            return Err(self.error("Expected geometry type"));
        }

        let geometry_type = match GeometryTypeId::from_str(word) {
            Ok(GeometryTypeId::Geometry) | Err(_) => {
                return Err(self.error(format!("Unknown geometry type '{word}'")))
            }
            Ok(geometry_type) => geometry_type,
        };
        self.pos += word.len();
        self.skip_whitespace();

        let dimensions = if self.consume_keyword("Z") {
            Dimensions::Xyz
        } else if self.consume_keyword("M") {
            Dimensions::Xym
        } else if self.consume_keyword("ZM") {
            Dimensions::Xyzm
        } else {
            Dimensions::Xy
        };

        Ok(GeometryTypeAndDimensions::new(geometry_type, dimensions))
    }

    fn parse_geometry(
        &mut self,
        depth: usize,
        parent: Option<GeometryTypeAndDimensions>,
    ) -> Result<(), SpatiaGeometryError> {
        let header = self.parse_header()?;
        if let Some(parent) = parent {
            if parent.dimensions() != header.dimensions() {
                return Err(SpatiaGeometryError::DimensionMismatch {
                    expected: dimensions_name(parent.dimensions()),
                    actual: dimensions_name(header.dimensions()),
                });
            }
        }

        if header.geometry_type().is_collection() && depth >= MAX_GEOMETRY_DEPTH {
            return Err(SpatiaGeometryError::DepthExceeded(MAX_GEOMETRY_DEPTH));
        }

        write_blob_header(&mut self.out, &header)?;
        let dimensions = header.dimensions();
        let width = header.vertex_width();

        match header.geometry_type() {
            GeometryTypeId::Point => {
                if self.consume_keyword("EMPTY") {
                    for _ in 0..width {
                        self.out.extend_from_slice(&f64::NAN.to_le_bytes());
                    }
                } else {
                    self.expect(b'(')?;
                    self.parse_vertex(width)?;
                    self.expect(b')')?;
                }
            }
            GeometryTypeId::LineString => self.parse_list(|p| p.parse_vertex(width))?,
            GeometryTypeId::Polygon => {
                self.parse_list(|p| p.parse_list(|p| p.parse_vertex(width)))?
            }
            GeometryTypeId::MultiPoint => self.parse_list(|p| {
                // Points may be bare, parenthesized or EMPTY
                if p.consume_keyword("EMPTY") {
                    return write_blob_empty_point(&mut p.out, dimensions);
                }

                let point = GeometryTypeAndDimensions::new(GeometryTypeId::Point, dimensions);
                write_blob_header(&mut p.out, &point)?;
                if p.consume(b'(') {
                    p.parse_vertex(width)?;
                    p.expect(b')')
                } else {
                    p.parse_vertex(width)
                }
            })?,
            GeometryTypeId::MultiLineString => self.parse_list(|p| {
                let line = GeometryTypeAndDimensions::new(GeometryTypeId::LineString, dimensions);
                write_blob_header(&mut p.out, &line)?;
                p.parse_list(|p| p.parse_vertex(width))
            })?,
            GeometryTypeId::MultiPolygon => self.parse_list(|p| {
                let polygon = GeometryTypeAndDimensions::new(GeometryTypeId::Polygon, dimensions);
                write_blob_header(&mut p.out, &polygon)?;
                p.parse_list(|p| p.parse_list(|p| p.parse_vertex(width)))
            })?,
            GeometryTypeId::GeometryCollection => {
                self.parse_list(|p| p.parse_geometry(depth + 1, Some(header)))?
            }
            GeometryTypeId::Geometry => {
                return Err(self.error("Unexpected generic geometry type"));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use rstest::rstest;
    use wkb::{writer::WriteOptions, Endianness};
    use wkt::Wkt;

    use super::*;
    use crate::wkb_reader::validate_blob;

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

    #[rstest]
    fn matches_wkb_layout(
        #[values(
            "POINT (1 2)",
            "POINT (-1.5 2e10)",
            "LINESTRING (1 2, 3 4, 5 6)",
            "LINESTRING EMPTY",
            "POLYGON ((0 0, 0 1, 1 1, 1 0, 0 0))",
            "POLYGON ((0 0, 10 0, 0 10, 0 0), (1 1, 2 1, 1 2, 1 1))",
            "POLYGON EMPTY",
            "MULTIPOINT ((0 0), (1 1))",
            "MULTIPOINT EMPTY",
            "MULTILINESTRING ((0 0, 1 1), (2 2, 3 3))",
            "MULTIPOLYGON (((0 0, 1 0, 0 1, 0 0)), ((5 5, 6 5, 5 6, 5 5)))",
            "GEOMETRYCOLLECTION (POINT (1 2), LINESTRING (0 0, 1 1))",
            "GEOMETRYCOLLECTION EMPTY"
        )]
        wkt_value: &str,
    ) {
        assert_eq!(read_wkt(wkt_value).unwrap(), make_wkb(wkt_value));
    }

    #[rstest]
    fn lenient_syntax(
        #[values(
            ("point(1 2)", "POINT (1 2)"),
            ("  Point   (  1    2 )  ", "POINT (1 2)"),
            ("POLYGON((0 0,0 1,1 1,1 0,0 0))", "POLYGON ((0 0, 0 1, 1 1, 1 0, 0 0))"),
            ("MULTIPOINT (0 0, 1 1)", "MULTIPOINT ((0 0), (1 1))"),
            ("multipoint ((0 0), 1 1)", "MULTIPOINT ((0 0), (1 1))"),
            ("linestring empty", "LINESTRING EMPTY"),
            ("POINT (+1.0 -2.50)", "POINT (1 -2.5)")
        )]
        equivalent: (&str, &str),
    ) {
        let (lenient, canonical) = equivalent;
        assert_eq!(read_wkt(lenient).unwrap(), make_wkb(canonical));
    }

    #[rstest]
    fn dimension_suffixes(
        #[values(
            ("POINT Z (1 2 3)", 1001, 24),
            ("POINT M (1 2 3)", 2001, 24),
            ("POINT ZM (1 2 3 4)", 3001, 32),
            ("point zm (1 2 3 4)", 3001, 32),
            ("LINESTRING Z (1 2 3, 4 5 6)", 1002, 4 + 48),
            ("MULTIPOINT ZM ((1 2 3 4))", 3004, 4 + 5 + 32)
        )]
        case: (&str, u32, usize),
    ) {
        let (wkt_value, type_code, payload_size) = case;
        let blob = read_wkt(wkt_value).unwrap();
        assert_eq!(blob[0], 0x01);
        assert_eq!(u32::from_le_bytes(blob[1..5].try_into().unwrap()), type_code);
        assert_eq!(blob.len(), 5 + payload_size);
        validate_blob(&blob).unwrap();
    }

    #[test]
    fn point_empty_is_nan() {
        let blob = read_wkt("POINT EMPTY").unwrap();
        assert_eq!(blob.len(), 21);
        assert!(f64::from_le_bytes(blob[5..13].try_into().unwrap()).is_nan());
        assert!(f64::from_le_bytes(blob[13..21].try_into().unwrap()).is_nan());

        let blob = read_wkt("MULTIPOINT (EMPTY, 1 2)").unwrap();
        validate_blob(&blob).unwrap();
        assert_eq!(u32::from_le_bytes(blob[5..9].try_into().unwrap()), 2);
    }

    #[test]
    fn backpatched_counts() {
        let blob = read_wkt("MULTILINESTRING ((0 0, 1 1, 2 2), EMPTY, (3 3, 4 4))").unwrap();
        validate_blob(&blob).unwrap();
        // Part count
        assert_eq!(u32::from_le_bytes(blob[5..9].try_into().unwrap()), 3);
        // First linestring vertex count
        assert_eq!(u32::from_le_bytes(blob[14..18].try_into().unwrap()), 3);
    }

    #[rstest]
    fn parse_errors(
        #[values(
            ("", "Expected geometry type", 0),
            ("CIRCLE (1 2)", "Unknown geometry type 'CIRCLE'", 0),
            ("GEOMETRY (1 2)", "Unknown geometry type 'GEOMETRY'", 0),
            ("POINT 1 2", "Expected '('", 6),
            ("POINT (1)", "Expected number", 8),
            ("POINT (1 2 3)", "Expected ')'", 11),
            ("POINT (1 abc)", "Invalid number 'abc'", 9),
            ("LINESTRING (0 0, 1 1", "Expected ')'", 20),
            ("LINESTRING (0 0 1 1)", "Expected ')'", 16),
            ("POINT (1 2) POINT (3 4)", "Unexpected trailing characters", 12),
            ("POINT Z (1 2)", "Expected number", 12)
        )]
        case: (&str, &str, usize),
    ) {
        let (wkt_value, message, position) = case;
        match read_wkt(wkt_value).unwrap_err() {
            SpatiaGeometryError::Parse {
                message: actual_message,
                position: actual_position,
            } => {
                assert_eq!(actual_message, message);
                assert_eq!(actual_position, position);
            }
            other => panic!("Expected parse error but got {other:?}"),
        }
    }

    #[test]
    fn parse_error_display() {
        let err = read_wkt("POINT (é 2)").unwrap_err();
        assert_eq!(err.to_string(), "Expected number at position 7");
    }

    #[test]
    fn child_dimension_mismatch() {
        let err = read_wkt("GEOMETRYCOLLECTION Z (POINT (1 2))").unwrap_err();
        assert!(matches!(
            err,
            SpatiaGeometryError::DimensionMismatch {
                expected: "XYZ",
                actual: "XY"
            }
        ));

        let blob = read_wkt("GEOMETRYCOLLECTION Z (POINT Z (1 2 3))").unwrap();
        validate_blob(&blob).unwrap();
    }

    #[test]
    fn depth_guard() {
        let nested = |levels: usize| {
            let mut text = String::new();
            for _ in 0..levels {
                text.push_str("GEOMETRYCOLLECTION (");
            }
            text.push_str("POINT (1 2)");
            for _ in 0..levels {
                text.push(')');
            }
            text
        };

        let blob = read_wkt(&nested(MAX_GEOMETRY_DEPTH)).unwrap();
        validate_blob(&blob).unwrap();

        let err = read_wkt(&nested(MAX_GEOMETRY_DEPTH + 1)).unwrap_err();
        assert!(matches!(err, SpatiaGeometryError::DepthExceeded(16)));
    }

    #[test]
    fn legacy_point() {
        assert_eq!(
            read_point_legacy("POINT (1 2)").unwrap(),
            make_wkb("POINT (1 2)")
        );
        assert_eq!(
            read_point_legacy("POINT(1.5   -2)").unwrap(),
            make_wkb("POINT (1.5 -2)")
        );
        assert!(read_point_legacy("POINT (1)").is_none());
        assert!(read_point_legacy("POINT (1 2 3)").is_none());
        assert!(read_point_legacy("LINESTRING (1 2)").is_none());
        assert!(read_point_legacy("POINT (1 2").is_none());
        assert!(read_point_legacy("point (1 2)").is_none());
    }

    #[rstest]
    #[case("POINT (1 2) x")]
    #[case("POINT (1 2))")]
    #[case("POINT (1 2)   ")]
    fn legacy_point_ignores_trailing_text(#[case] text: &str) {
        assert_eq!(read_point_legacy(text).unwrap(), make_wkb("POINT (1 2)"));
    }
}
