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
//! Hilbert curve keys for 2D points on a 16-bit grid
//!
//! The transform follows the branch-free prefix-scan formulation from
//! <https://github.com/rawrunprotected/hilbert_curves> (public domain).

/// Largest grid coordinate accepted by [hilbert_index]
pub const HILBERT_MAX: u32 = (1 << 16) - 1;

/// Position of the grid cell `(x, y)` along the Hilbert curve
///
/// Both coordinates must be at most [HILBERT_MAX]. Cells that are close along the
/// curve are close in the plane, which is what the packed index relies on.
pub fn hilbert_index(x: u32, y: u32) -> u32 {
    let x = x & HILBERT_MAX;
    let y = y & HILBERT_MAX;

    let mut state = {
        let a = x ^ y;
        let b = HILBERT_MAX ^ a;
        let c = HILBERT_MAX ^ (x | y);
        let d = x & (y ^ HILBERT_MAX);

        [
            a | (b >> 1),
            (a >> 1) ^ a,
            ((c >> 1) ^ (b & (d >> 1))) ^ c,
            ((a & (c >> 1)) ^ (d >> 1)) ^ d,
        ]
    };

    for shift in [2, 4] {
        let [a, b, c, d] = state;
        state = [
            (a & (a >> shift)) ^ (b & (b >> shift)),
            (a & (b >> shift)) ^ (b & ((a ^ b) >> shift)),
            c ^ ((a & (c >> shift)) ^ (b & (d >> shift))),
            d ^ ((b & (c >> shift)) ^ ((a ^ b) & (d >> shift))),
        ];
    }

    let [a, b, mut c, mut d] = state;
    c ^= (a & (c >> 8)) ^ (b & (d >> 8));
    d ^= (b & (c >> 8)) ^ ((a ^ b) & (d >> 8));

    let a = c ^ (c >> 1);
    let b = d ^ (d >> 1);

    let i0 = x ^ y;
    let i1 = b | (HILBERT_MAX ^ (i0 | a));

    (interleave(i1) << 1) | interleave(i0)
}

/// Hilbert key of a point normalized against a bounding extent
///
/// The point is scaled onto the 16-bit grid spanned by `[min_x, min_x + width]` and
/// `[min_y, min_y + height]`. A zero-sized axis maps every point to 0 on that axis.
pub fn hilbert_key(x: f64, y: f64, min_x: f64, min_y: f64, width: f64, height: f64) -> u32 {
    hilbert_index(to_grid(x, min_x, width), to_grid(y, min_y, height))
}

fn to_grid(value: f64, min: f64, extent: f64) -> u32 {
    if extent > 0.0 {
        // float to int casts saturate
        ((value - min) / extent * HILBERT_MAX as f64) as u32
    } else {
        0
    }
}

// Spread the low 16 bits of x into the even bits of the result
fn interleave(x: u32) -> u32 {
    let x = (x | (x << 8)) & 0x00FF00FF;
    let x = (x | (x << 4)) & 0x0F0F0F0F;
    let x = (x | (x << 2)) & 0x33333333;
    (x | (x << 1)) & 0x55555555
}

#[cfg(test)]
mod test {
    use std::collections::HashMap;

    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(0, 0, 0)]
    #[case(1, 0, 1)]
    #[case(1, 1, 2)]
    #[case(0, 1, 3)]
    #[case(0, HILBERT_MAX, 0x55555555)]
    #[case(HILBERT_MAX, HILBERT_MAX, 0xAAAAAAAA)]
    #[case(HILBERT_MAX, 0, u32::MAX)]
    fn known_values(#[case] x: u32, #[case] y: u32, #[case] expected: u32) {
        assert_eq!(hilbert_index(x, y), expected);
    }

    #[test]
    fn curve_is_continuous() {
        // The first 256 positions fill the 16x16 block at the origin, one step at a time
        let cells: HashMap<u32, (u32, u32)> = (0..16)
            .flat_map(|x| (0..16).map(move |y| (hilbert_index(x, y), (x, y))))
            .collect();
        assert_eq!(cells.len(), 256);

        for i in 0..255 {
            let (x0, y0) = cells[&i];
            let (x1, y1) = cells[&(i + 1)];
            assert_eq!(x0.abs_diff(x1) + y0.abs_diff(y1), 1, "step {i}");
        }
    }

    #[test]
    fn normalized_keys() {
        assert_eq!(hilbert_key(0.0, 0.0, 0.0, 0.0, 10.0, 10.0), 0);
        assert_eq!(hilbert_key(10.0, 0.0, 0.0, 0.0, 10.0, 10.0), u32::MAX);
        assert_eq!(
            hilbert_key(10.0, 10.0, 0.0, 0.0, 10.0, 10.0),
            hilbert_index(HILBERT_MAX, HILBERT_MAX)
        );

        // Degenerate extents do not produce NaN grid coordinates
        assert_eq!(hilbert_key(5.0, 5.0, 5.0, 5.0, 0.0, 0.0), 0);
        assert_eq!(
            hilbert_key(5.0, 10.0, 5.0, 0.0, 0.0, 10.0),
            hilbert_index(0, HILBERT_MAX)
        );
    }
}
