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

use crate::{error::SpatiaGeometryError, extent::GeometryExtent, wkb_reader::for_each_vertex};

/// Compute the extent of a geometry blob
///
/// Walks the blob once and returns the number of vertices that contributed to the
/// extent along with the extent itself. Vertices with a NaN x or y (such as empty
/// points) are skipped, so a valid but empty geometry returns a count of 0 and an
/// [GeometryExtent::empty] extent. NaN z or m values do not contribute to their axis.
pub fn get_extent(blob: &[u8]) -> Result<(usize, GeometryExtent), SpatiaGeometryError> {
    let mut extent = GeometryExtent::empty();
    let mut count = 0;

    for_each_vertex(blob, |dimensions, coords| {
        let (x, y) = (coords[0], coords[1]);
        if x.is_nan() || y.is_nan() {
            return;
        }

        count += 1;
        extent.extend_xy(x, y);
        match dimensions {
            Dimensions::Xyz => extend_finite(&mut extent, Some(coords[2]), None),
            Dimensions::Xym => extend_finite(&mut extent, None, Some(coords[2])),
            Dimensions::Xyzm => extend_finite(&mut extent, Some(coords[2]), Some(coords[3])),
            _ => {}
        }
    })?;

    Ok((count, extent))
}

fn extend_finite(extent: &mut GeometryExtent, z: Option<f64>, m: Option<f64>) {
    if let Some(z) = z.filter(|z| !z.is_nan()) {
        extent.extend_z(z);
    }
    if let Some(m) = m.filter(|m| !m.is_nan()) {
        extent.extend_m(m);
    }
}

#[cfg(test)]
mod test {
    use rand::{rngs::StdRng, Rng, SeedableRng};
    use rstest::rstest;

    use super::*;
    use crate::wkt_reader::read_wkt;

    #[test]
    fn polygon_extent() {
        let blob = read_wkt("POLYGON((0 0,0 1,1 1,1 0,0 0))").unwrap();
        let (count, extent) = get_extent(&blob).unwrap();
        assert_eq!(count, 5);
        assert_eq!(extent, GeometryExtent::xy(0.0, 0.0, 1.0, 1.0));
    }

    #[rstest]
    fn empty_geometries(
        #[values(
            "POINT EMPTY",
            "LINESTRING EMPTY",
            "POLYGON EMPTY",
            "MULTIPOINT (EMPTY, EMPTY)",
            "GEOMETRYCOLLECTION (POINT EMPTY, GEOMETRYCOLLECTION EMPTY)"
        )]
        wkt_value: &str,
    ) {
        let (count, extent) = get_extent(&read_wkt(wkt_value).unwrap()).unwrap();
        assert_eq!(count, 0);
        assert!(extent.is_empty());
    }

    #[test]
    fn nested_collection_extent() {
        let blob = read_wkt(
            "GEOMETRYCOLLECTION (POINT (10 -5), MULTILINESTRING ((0 0, 1 1)), GEOMETRYCOLLECTION (POINT (3 20)))",
        )
        .unwrap();
        let (count, extent) = get_extent(&blob).unwrap();
        assert_eq!(count, 4);
        assert_eq!(extent, GeometryExtent::xy(0.0, -5.0, 10.0, 20.0));
    }

    #[test]
    fn z_and_m_extent() {
        let blob = read_wkt("LINESTRING ZM (0 0 5 100, 1 1 -5 200, 2 2 NaN 150)").unwrap();
        let (count, extent) = get_extent(&blob).unwrap();
        assert_eq!(count, 3);
        assert_eq!((extent.min_z, extent.max_z), (-5.0, 5.0));
        assert_eq!((extent.min_m, extent.max_m), (100.0, 200.0));

        let blob = read_wkt("POINT M (1 2 3)").unwrap();
        let (_, extent) = get_extent(&blob).unwrap();
        assert!(!extent.has_z());
        assert!(extent.has_m());

        let blob = read_wkt("POINT (1 2)").unwrap();
        let (_, extent) = get_extent(&blob).unwrap();
        assert!(!extent.has_z());
        assert!(!extent.has_m());
    }

    #[test]
    fn invalid_blob() {
        assert!(get_extent(&[0x01, 0x01, 0x00]).is_err());
    }

    #[test]
    fn extent_contains_every_vertex() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let vertices = (0..rng.gen_range(1..50))
                .map(|_| (rng.gen_range(-1e6..1e6), rng.gen_range(-1e6..1e6)))
                .collect::<Vec<(f64, f64)>>();
            let text = format!(
                "LINESTRING ({})",
                vertices
                    .iter()
                    .map(|(x, y)| format!("{x} {y}"))
                    .collect::<Vec<_>>()
                    .join(", ")
            );

            let (count, extent) = get_extent(&read_wkt(&text).unwrap()).unwrap();
            assert_eq!(count, vertices.len());
            for (x, y) in vertices {
                assert!(extent.contains(&GeometryExtent::xy(x, y, x, y)));
            }
        }
    }
}
