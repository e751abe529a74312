#[path = "../util/util.rs"]
mod util;

use util::synthetic_images;

use std::time::Duration;

use criterion::{
    criterion_group, criterion_main, measurement::WallTime, Bencher, BenchmarkId, Criterion,
    SamplingMode,
};
use swatchette::{
    kmeans, sample_and_saturate, ColorSpace, Image, KmeansOptions, PaletteOptions,
    PalettePipeline, PaletteSize,
};

fn bench(
    c: &mut Criterion,
    group: &str,
    images: &[(String, Image)],
    mut f: impl FnMut(&mut Bencher<WallTime>, &(PaletteSize, &Image)),
) {
    let mut group = c.benchmark_group(group);
    group
        .sample_size(30)
        .noise_threshold(0.05)
        .sampling_mode(SamplingMode::Flat)
        .warm_up_time(Duration::from_millis(500));

    for (k, secs) in [(PaletteSize::MAX, 4), (64.into(), 3), (32.into(), 2), (8.into(), 2)] {
        group.measurement_time(Duration::from_secs(secs));
        for (name, image) in images {
            group.bench_with_input(BenchmarkId::new(k.to_string(), name), &(k, image), &mut f);
        }
    }
}

fn kmeans_oklab_single(c: &mut Criterion) {
    let options = KmeansOptions::new().colorspace(ColorSpace::Oklab);
    bench(c, "kmeans_oklab_single", synthetic_images(), |b, &(k, image)| {
        b.iter(|| kmeans::cluster(image, k, &[], &options).unwrap())
    })
}

fn kmeans_srgb_single(c: &mut Criterion) {
    let options = KmeansOptions::new().colorspace(ColorSpace::Srgb);
    bench(c, "kmeans_srgb_single", synthetic_images(), |b, &(k, image)| {
        b.iter(|| kmeans::cluster(image, k, &[], &options).unwrap())
    })
}

fn kmeans_oklab_every_pixel_single(c: &mut Criterion) {
    let options = KmeansOptions::new().dedup_pixels(false);
    bench(c, "kmeans_oklab_every_pixel_single", synthetic_images(), |b, &(k, image)| {
        b.iter(|| kmeans::cluster(image, k, &[], &options).unwrap())
    })
}

fn kmeans_oklab_par(c: &mut Criterion) {
    let options = KmeansOptions::new().colorspace(ColorSpace::Oklab);
    bench(c, "kmeans_oklab_par", synthetic_images(), |b, &(k, image)| {
        b.iter(|| kmeans::cluster_par(image, k, &[], &options).unwrap())
    })
}

fn kmeans_lab_par(c: &mut Criterion) {
    let options = KmeansOptions::new().colorspace(ColorSpace::Lab);
    bench(c, "kmeans_lab_par", synthetic_images(), |b, &(k, image)| {
        b.iter(|| kmeans::cluster_par(image, k, &[], &options).unwrap())
    })
}

fn sample_and_saturate_single(c: &mut Criterion) {
    bench(c, "sample_and_saturate_single", synthetic_images(), |b, &(k, image)| {
        let labels = kmeans::cluster(image, k, &[], &KmeansOptions::new()).unwrap();
        b.iter(|| sample_and_saturate(&labels, k, 5.0).unwrap())
    })
}

fn pipeline_par(c: &mut Criterion) {
    bench(c, "pipeline_par", synthetic_images(), |b, &(k, image)| {
        let pipeline = PalettePipeline::new(image).options(PaletteOptions::new().palette_size(k));
        b.iter(|| pipeline.palette_par().unwrap())
    })
}

criterion_group!(
    benches,
    kmeans_oklab_single,
    kmeans_srgb_single,
    kmeans_oklab_every_pixel_single,
    kmeans_oklab_par,
    kmeans_lab_par,
    sample_and_saturate_single,
    pipeline_par,
);
criterion_main!(benches);
