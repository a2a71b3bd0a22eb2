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
const BASE32: &[u8; 32] = b"0123456789bcdefghjkmnpqrstuvwxyz";

/// Longest geohash that will be produced
pub const MAX_GEOHASH_PRECISION: usize = 20;

/// Encode a longitude/latitude pair as a geohash
///
/// `precision` is the number of characters and is clamped to
/// `1..=MAX_GEOHASH_PRECISION`. Bits alternate between longitude and latitude,
/// starting with longitude, and a coordinate equal to a cell midpoint falls into
/// the upper half.
pub fn geohash(x: f64, y: f64, precision: i64) -> String {
    let precision = precision.clamp(1, MAX_GEOHASH_PRECISION as i64) as usize;
    let (mut lon_min, mut lon_max) = (-180.0, 180.0);
    let (mut lat_min, mut lat_max) = (-90.0, 90.0);

    let mut out = String::with_capacity(precision);
    let mut index = 0usize;
    let mut bit = 0;
    let mut even = true;
    while out.len() < precision {
        let (value, min, max) = if even {
            (x, &mut lon_min, &mut lon_max)
        } else {
            (y, &mut lat_min, &mut lat_max)
        };

        let mid = (*min + *max) / 2.0;
        if value >= mid {
            index = (index << 1) | 1;
            *min = mid;
        } else {
            index <<= 1;
            *max = mid;
        }
        even = !even;

        bit += 1;
        if bit == 5 {
            out.push(BASE32[index] as char);
            index = 0;
            bit = 0;
        }
    }

    out
}

#[cfg(test)]
mod test {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn known_hashes(
        #[values(
            (-5.6, 42.6, 5, "ezs42"),
            (10.40744, 57.64911, 11, "u4pruydqqvj"),
            (0.0, 0.0, 1, "s"),
            (-180.0, -90.0, 4, "0000")
        )]
        case: (f64, f64, i64, &str),
    ) {
        let (x, y, precision, expected) = case;
        assert_eq!(geohash(x, y, precision), expected);
    }

    #[test]
    fn precision_is_clamped() {
        assert_eq!(geohash(-5.6, 42.6, 0), "e");
        assert_eq!(geohash(-5.6, 42.6, -3), "e");
        assert_eq!(geohash(-5.6, 42.6, 100).len(), MAX_GEOHASH_PRECISION);
        assert!(geohash(-5.6, 42.6, 100).starts_with("ezs42"));
    }
}
