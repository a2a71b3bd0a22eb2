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
use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::{rngs::StdRng, Rng, SeedableRng};
use spatia_index::{PackedHilbertIndex, SpatialIndexBuilder};

const RNG_SEED: u64 = 0x5ED0_4A7E;
const ITEM_COUNTS: [usize; 3] = [1_000, 10_000, 100_000];
const NODE_SIZES: [usize; 3] = [4, 16, 64]; // smaller node size => deeper tree
const QUERY_BATCH_SIZE: usize = 1_024;

type Rect = (f64, f64, f64, f64);

fn random_rects(rng: &mut StdRng, count: usize, max_span: f64) -> Vec<Rect> {
    (0..count)
        .map(|_| {
            let min_x = rng.gen_range(0.0..10_000.0);
            let min_y = rng.gen_range(0.0..10_000.0);
            (
                min_x,
                min_y,
                min_x + rng.gen_range(0.01..max_span),
                min_y + rng.gen_range(0.01..max_span),
            )
        })
        .collect()
}

fn build_index(rects: &[Rect], node_size: usize) -> PackedHilbertIndex {
    let mut builder = SpatialIndexBuilder::try_new_with_node_size(node_size)
        .expect("invalid node size for benchmark");
    builder.reserve(rects.len());
    for (row_id, &(min_x, min_y, max_x, max_y)) in rects.iter().enumerate() {
        builder
            .add(row_id, min_x, min_y, max_x, max_y)
            .expect("failed to add benchmark box");
    }
    builder.build().expect("failed to build benchmark index")
}

fn bench_build(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(RNG_SEED);
    let mut group = c.benchmark_group("packed_hilbert_build");

    for count in ITEM_COUNTS {
        let rects = random_rects(&mut rng, count, 10.0);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &rects, |b, rects| {
            b.iter(|| black_box(build_index(black_box(rects), 16)));
        });
    }

    group.finish();
}

fn bench_search(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(RNG_SEED);
    let rects = random_rects(&mut rng, 100_000, 10.0);
    let queries = random_rects(&mut rng, QUERY_BATCH_SIZE, 200.0);

    let mut group = c.benchmark_group("packed_hilbert_search");
    group.throughput(Throughput::Elements(QUERY_BATCH_SIZE as u64));

    for node_size in NODE_SIZES {
        let index = build_index(&rects, node_size);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!(
                "node_size-{node_size}_levels-{}",
                index.num_levels()
            )),
            &index,
            |b, index| {
                b.iter(|| {
                    for &(min_x, min_y, max_x, max_y) in &queries {
                        black_box(index.search(min_x, min_y, max_x, max_y));
                    }
                });
            },
        );
    }

    group.finish();
}

criterion_group!(packed_hilbert, bench_build, bench_search);
criterion_main!(packed_hilbert);
