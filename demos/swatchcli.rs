#![deny(unsafe_code, unsafe_op_in_unsafe_fn)]
#![warn(
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::todo,
    clippy::unimplemented,
    clippy::unneeded_field_pattern,
    clippy::rest_pat_in_fully_bound_structs,
    clippy::unnecessary_self_imports,
    clippy::str_to_string,
    clippy::string_to_string,
    clippy::string_slice
)]

use std::{fmt::Display, path::PathBuf};

use clap::{Parser, ValueEnum};
use palette::Srgba;
use swatchette::{
    to_srgba8, ColorSpace, Image, PaletteOptions, PaletteSize, SaturationSpace, SwatchController,
};

#[derive(Copy, Clone, ValueEnum)]
enum CliColorSpace {
    Oklab,
    Lab,
    Srgb,
}

impl From<CliColorSpace> for ColorSpace {
    fn from(value: CliColorSpace) -> Self {
        match value {
            CliColorSpace::Oklab => ColorSpace::Oklab,
            CliColorSpace::Lab => ColorSpace::Lab,
            CliColorSpace::Srgb => ColorSpace::Srgb,
        }
    }
}

impl Display for CliColorSpace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                CliColorSpace::Oklab => "oklab",
                CliColorSpace::Lab => "lab",
                CliColorSpace::Srgb => "srgb",
            }
        )
    }
}

#[derive(Copy, Clone, ValueEnum)]
enum CliSaturationSpace {
    Luma,
    Oklab,
}

impl From<CliSaturationSpace> for SaturationSpace {
    fn from(value: CliSaturationSpace) -> Self {
        match value {
            CliSaturationSpace::Luma => SaturationSpace::Luma,
            CliSaturationSpace::Oklab => SaturationSpace::Oklab,
        }
    }
}

impl Display for CliSaturationSpace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                CliSaturationSpace::Luma => "luma",
                CliSaturationSpace::Oklab => "oklab",
            }
        )
    }
}

/// Prints the dominant color swatches of each image as hex colors.
#[derive(Parser)]
pub struct Options {
    #[arg(short, long, default_value_t = PaletteSize::default(), value_parser = parse_palette_size)]
    k: PaletteSize,

    #[arg(long, default_value_t = CliColorSpace::Oklab)]
    colorspace: CliColorSpace,

    #[arg(long, default_value_t = 10)]
    passes: u32,

    #[arg(long, default_value_t = 0)]
    seed: u64,

    #[arg(long, default_value_t = PaletteOptions::DEFAULT_SATURATION)]
    saturation: f32,

    #[arg(long, default_value_t = CliSaturationSpace::Luma)]
    saturation_space: CliSaturationSpace,

    /// Cluster every pixel instead of each unique color.
    #[arg(long)]
    no_dedup: bool,

    /// Seed colors for the first clusters, as hex (e.g. `ff0000`).
    #[arg(long, value_delimiter = ',', value_parser = parse_hex)]
    seed_means: Vec<Srgba<f32>>,

    #[arg(long)]
    verbose: bool,

    images: Vec<PathBuf>,
}

fn parse_palette_size(s: &str) -> Result<PaletteSize, String> {
    let value: u16 = s.parse().map_err(|e| format!("{e}"))?;
    value.try_into().map_err(|e| format!("{e}"))
}

fn parse_hex(s: &str) -> Result<Srgba<f32>, String> {
    let s = s.trim_start_matches('#');
    if s.len() != 6 {
        return Err(format!("expected 6 hex digits, got `{s}`"));
    }
    let value = u32::from_str_radix(s, 16).map_err(|e| format!("{e}"))?;
    let [_, r, g, b] = value.to_be_bytes();
    Ok(Srgba::new(r, g, b, u8::MAX).into_format())
}

fn main() {
    let Options {
        k,
        colorspace,
        passes,
        seed,
        saturation,
        saturation_space,
        no_dedup,
        seed_means,
        verbose,
        images: paths,
    } = Options::parse();

    macro_rules! log {
        ($name: expr, $val: expr) => {
            if verbose {
                let time = std::time::Instant::now();
                let value = $val;
                println!("{} took {}ms", $name, time.elapsed().as_millis());
                value
            } else {
                $val
            }
        };
    }

    let images = paths
        .iter()
        .map(|path| {
            let image = log!(
                format!("reading {}", path.display()),
                image::open(path).unwrap().into_rgba8()
            );
            Image::try_from(&image).unwrap()
        })
        .collect::<Vec<_>>();

    let options = PaletteOptions::new()
        .palette_size(k)
        .seed_means(seed_means)
        .colorspace(colorspace.into())
        .passes(passes)
        .seed(seed)
        .dedup_pixels(!no_dedup)
        .saturation(saturation)
        .saturation_space(saturation_space.into());

    let controller = SwatchController::new(options);

    for (index, path) in paths.iter().enumerate() {
        log!(format!("swatches for {}", path.display()), controller.show(&images, index));

        println!("{}", path.display());
        match controller.last_error() {
            Some(error) => println!("  error: {error}"),
            None => {
                for (i, swatch) in to_srgba8(&controller.palette()).into_iter().enumerate() {
                    let (r, g, b, a) = swatch.into_components();
                    println!("  {i:>3} #{r:02x}{g:02x}{b:02x}{a:02x}");
                }
            }
        }
    }
}
