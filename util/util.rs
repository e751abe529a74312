#![allow(dead_code)]

use std::{
    path::{Path, PathBuf},
    sync::OnceLock,
};

use palette::Srgba;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoroshiro128PlusPlus;
use swatchette::Image;

/// Sizes of the synthetic benchmark images as `(width, height)`.
pub const SYNTHETIC_SIZES: [(u32, u32); 3] = [(64, 64), (320, 240), (1280, 720)];

/// A smooth two-axis gradient with a few flat color blocks and some noise,
/// so that it has both many unique colors and a few dominant ones.
pub fn synthetic_image(width: u32, height: u32, seed: u64) -> Image {
    let mut rng = Xoroshiro128PlusPlus::seed_from_u64(seed);
    let blocks = [
        Srgba::new(0.85, 0.20, 0.15, 1.0),
        Srgba::new(0.10, 0.45, 0.80, 1.0),
        Srgba::new(0.95, 0.85, 0.30, 1.0),
    ];

    let mut pixels = Vec::with_capacity(width as usize * height as usize);
    for y in 0..height {
        for x in 0..width {
            let u = x as f32 / width.max(1) as f32;
            let v = y as f32 / height.max(1) as f32;
            let block = (x * 4 / width.max(1)) as usize;
            let pixel = if block < blocks.len() && v < 0.25 {
                blocks[block]
            } else {
                let mut noise = || rng.gen_range(-0.03..0.03);
                Srgba::new(
                    (u + noise()).clamp(0.0, 1.0),
                    (v + noise()).clamp(0.0, 1.0),
                    ((1.0 - u) * v + noise()).clamp(0.0, 1.0),
                    1.0,
                )
            };
            pixels.push(pixel);
        }
    }

    Image::new(width, height, pixels).unwrap()
}

static SYNTHETIC_IMAGES: OnceLock<Vec<(String, Image)>> = OnceLock::new();

pub fn synthetic_images() -> &'static [(String, Image)] {
    SYNTHETIC_IMAGES.get_or_init(|| {
        SYNTHETIC_SIZES
            .iter()
            .zip(0..)
            .map(|(&(width, height), seed)| {
                (format!("{width}x{height}"), synthetic_image(width, height, seed))
            })
            .collect()
    })
}

pub fn load_images(images: &[PathBuf]) -> Vec<(String, Image)> {
    images
        .iter()
        .map(|path| {
            let image = image::open(path).expect("loaded image").into_rgba8();
            (
                path.file_name().unwrap().to_owned().into_string().unwrap(),
                Image::try_from(&image).expect("converted image"),
            )
        })
        .collect()
}

pub fn load_image_dir(dir: impl AsRef<Path>) -> Vec<(String, Image)> {
    let mut paths = std::fs::read_dir(dir)
        .expect("read img directory")
        .collect::<Result<Vec<_>, _>>()
        .expect("read each file")
        .iter()
        .map(std::fs::DirEntry::path)
        .collect::<Vec<_>>();

    paths.sort();

    load_images(&paths)
}
