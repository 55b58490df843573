//! Benchmarks for grid shift interpolation.
//!
//! ## Running the benchmarks
//!
//! ```bash
//! cargo bench -p ntv2-grid
//! ```
//!
//! ## Benchmarks included
//!
//! - `shift_forward/in_memory` - Lookup plus interpolation from decoded nodes
//! - `shift_forward/file_backed` - Lookup plus four node reads through the shared source
//! - `shift_reverse/in_memory` - Iterative inverse shift

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ntv2_grid::{ByteOrder, GridShift, GridShiftFile, LoadOptions, SharedSource};
use std::io::Cursor;

#[path = "../tests/common/mod.rs"]
mod common;

fn load(options: LoadOptions) -> GridShiftFile {
    let bytes = common::write_grid_file(ByteOrder::Little, &common::nested_grids());
    GridShiftFile::from_source(SharedSource::new(Cursor::new(bytes)), options)
        .expect("Failed to load benchmark grid")
}

fn bench_shift_forward(c: &mut Criterion) {
    let mut group = c.benchmark_group("shift_forward");

    for (label, options) in [
        ("in_memory", LoadOptions::default()),
        ("file_backed", LoadOptions::file_backed()),
    ] {
        let file = load(options);
        group.bench_function(label, |b| {
            let mut n = 0u32;
            b.iter(|| {
                n = n.wrapping_add(1);
                let t = n as f64;
                let mut gs = GridShift::new((t * 1.37) % 60.0, (t * 2.91) % 60.0);
                file.shift_forward(&mut gs).expect("Shift should succeed");
                black_box(gs)
            });
        });
    }

    group.finish();
}

fn bench_shift_reverse(c: &mut Criterion) {
    let file = load(LoadOptions::default());
    c.bench_function("shift_reverse/in_memory", |b| {
        b.iter(|| {
            let mut gs = GridShift::new(black_box(45.0), black_box(25.0));
            file.shift_reverse(&mut gs).expect("Shift should succeed");
            black_box(gs)
        });
    });
}

criterion_group!(benches, bench_shift_forward, bench_shift_reverse);
criterion_main!(benches);
