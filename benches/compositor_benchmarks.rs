//! Compositor throughput at typical camera resolutions

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use image::{GrayImage, Luma, Rgb, RgbImage};
use mask_merger::MaskCompositor;

fn test_pair(width: u32, height: u32) -> (RgbImage, GrayImage) {
    let image = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    });
    let mask = GrayImage::from_fn(width, height, |x, y| Luma([((x ^ y) % 256) as u8]));
    (image, mask)
}

fn bench_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge");
    for (width, height) in [(640, 480), (1920, 1080), (4000, 3000)] {
        let (image, mask) = test_pair(width, height);
        group.throughput(Throughput::Elements(u64::from(width) * u64::from(height)));
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{width}x{height}")),
            &(image, mask),
            |b, (image, mask)| b.iter(|| MaskCompositor::merge(black_box(image), black_box(mask))),
        );
    }
    group.finish();
}

fn bench_binarize(c: &mut Criterion) {
    let (_, mask) = test_pair(1920, 1080);
    c.bench_function("binarize_1920x1080", |b| {
        b.iter(|| MaskCompositor::binarize(black_box(&mask)));
    });
}

criterion_group!(benches, bench_merge, bench_binarize);
criterion_main!(benches);
