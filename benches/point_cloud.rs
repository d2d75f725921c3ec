//! Benchmarks for the host-side hot paths: the pixel scan that builds a
//! point cloud and the per-frame position blend.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use image::{Rgba, RgbaImage};

use pinchfield::orbital::{OrbitalConfig, OrbitalField};
use pinchfield::point_cloud::{self, VisibilityPolicy};
use pinchfield::sampling::Sampler;

/// Disc silhouette on a transparent background.
fn disc(width: u32) -> RgbaImage {
    let c = width as f32 / 2.0;
    RgbaImage::from_fn(width, width, |x, y| {
        let d = ((x as f32 - c).powi(2) + (y as f32 - c).powi(2)).sqrt();
        if d < c * 0.8 {
            Rgba([30, 30, 30, 255])
        } else {
            Rgba([0, 0, 0, 0])
        }
    })
}

fn bench_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("scan");
    let policy = VisibilityPolicy::default();

    for width in [100u32, 200, 250] {
        let raster = disc(width);
        group.bench_with_input(BenchmarkId::new("width", width), &raster, |b, raster| {
            b.iter(|| {
                let mut sampler = Sampler::new(Some(1));
                black_box(point_cloud::scan(raster, &policy, 800.0, &mut sampler))
            })
        });
    }

    group.finish();
}

fn bench_blend(c: &mut Criterion) {
    let mut group = c.benchmark_group("blend");

    for width in [200u32, 250] {
        let raster = disc(width);
        let mut buffer = point_cloud::scan(
            &raster,
            &VisibilityPolicy::default(),
            800.0,
            &mut Sampler::new(Some(1)),
        );
        let mut t = 0.0f32;
        group.bench_function(BenchmarkId::new("particles", buffer.len()), |b| {
            b.iter(|| {
                t = (t + 0.01) % 1.0;
                buffer.blend(black_box(t));
                black_box(buffer.current()[0])
            })
        });
    }

    group.finish();
}

fn bench_orbital_generate(c: &mut Criterion) {
    let config = OrbitalConfig {
        seed: Some(1),
        ..OrbitalConfig::default()
    };
    c.bench_function("orbital_generate_60k", |b| {
        b.iter(|| {
            let mut sampler = Sampler::new(config.seed);
            black_box(OrbitalField::generate(&config, &mut sampler).len())
        })
    });
}

criterion_group!(benches, bench_scan, bench_blend, bench_orbital_generate);
criterion_main!(benches);
