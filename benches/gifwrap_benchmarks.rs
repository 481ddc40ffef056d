//! Benchmarks for the hot paths of GIF assembly and disposal patching.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use gifwrap::{
    AssemblyOptions, DisposalMethod, JpegCodec, TransformOptions, assemble, patch_first_disposal,
    recompress_frames,
};
use image::{DynamicImage, Rgb, RgbImage};

fn bench_frames(count: u64) -> Vec<DynamicImage> {
    (0..count)
        .map(|index| {
            let shade = (index * 7 % 256) as u8;
            DynamicImage::ImageRgb8(RgbImage::from_pixel(64, 36, Rgb([shade, 96, 255 - shade])))
        })
        .collect()
}

fn assembly_benchmark(c: &mut Criterion) {
    let frames = bench_frames(30);
    let options = AssemblyOptions::new().with_frame_delay_cs(7);

    c.bench_function("assemble_30_frames", |bencher| {
        bencher.iter(|| assemble(black_box(&frames), &options).expect("assembly should succeed"));
    });
}

fn patch_benchmark(c: &mut Criterion) {
    let frames = bench_frames(30);
    let options = AssemblyOptions::new().with_frame_delay_cs(7);
    let encoded = assemble(&frames, &options).expect("assembly should succeed");

    c.bench_function("patch_first_disposal", |bencher| {
        bencher.iter(|| patch_first_disposal(black_box(&encoded), DisposalMethod::BACKGROUND));
    });
}

fn transform_benchmark(c: &mut Criterion) {
    let frames = bench_frames(10);
    let options = TransformOptions::new().with_dimensions(320, 180);

    c.bench_function("recompress_10_frames", |bencher| {
        bencher.iter(|| recompress_frames(black_box(&frames), &JpegCodec, &options));
    });
}

criterion_group!(
    benches,
    assembly_benchmark,
    patch_benchmark,
    transform_benchmark
);
criterion_main!(benches);
