//! A library for extracting the dominant colors of an image as a row of display swatches.
//!
//! `swatchette` groups the pixels of an image into `k` clusters using k-means,
//! optionally in a perceptually uniform color space like Oklab or CIELAB,
//! and then turns each cluster into a saturated swatch color.
//!
//! The computation happens in two stages:
//! 1. [`kmeans::cluster`] produces a label image of width `k` and height `1`,
//!    where column `i` holds the centroid of cluster `i`.
//! 2. [`sample_and_saturate`] averages each column of the label image and boosts its saturation.
//!
//! # Features
//! To reduce dependencies and compile times, `swatchette` has several `cargo` features
//! that can be turned off or on:
//! - `threads`: exposes parallel versions of most functions via [`rayon`].
//! - `image`: enables integration with the `image` crate.
//!
//! # High-Level API
//! To get started with the high-level API, see [`PalettePipeline`].
//! To keep the swatches of a list of images in sync with the selected image, see [`SwatchController`].
//! Here is an example:
//! ```no_run
//! # use swatchette::{PaletteOptions, PalettePipeline};
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let img = image::open("some image")?.into_rgba8();
//!
//! let pipeline = PalettePipeline::try_from(&img)?.options(
//!     PaletteOptions::new()
//!         .palette_size(16.into()) // set the number of swatches
//!         .perceptual(true) // cluster in Oklab
//!         .saturation(3.0), // boost the saturation of each swatch
//! );
//!
//! // Run the pipeline in parallel to get one color per swatch
//! let swatches = pipeline.palette_srgba8_par()?;
//! # Ok(())
//! # }
//! ```
//!
//! Note that some of the functions above require certain features to be enabled.

#![deny(unsafe_code, unsafe_op_in_unsafe_fn)]
#![warn(
    clippy::pedantic,
    clippy::cargo,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used,
    clippy::unwrap_in_result,
    clippy::expect_used,
    clippy::unneeded_field_pattern,
    clippy::rest_pat_in_fully_bound_structs,
    clippy::unnecessary_self_imports,
    clippy::str_to_string,
    clippy::string_to_string,
    clippy::string_slice,
    missing_docs,
    clippy::missing_docs_in_private_items,
    rustdoc::all,
    clippy::float_cmp_const,
    clippy::lossy_float_literal
)]
#![allow(
    clippy::doc_markdown,
    clippy::module_name_repetitions,
    clippy::many_single_char_names,
    clippy::missing_panics_doc,
    clippy::unreadable_literal,
    clippy::wildcard_imports
)]

mod api;
mod color_counts;
mod colorspace;
mod error;
mod image;
mod sampler;
mod types;

pub mod controller;
pub mod kmeans;

pub use api::*;
pub use color_counts::*;
pub use colorspace::ColorSpace;
pub use controller::{recompute, PaletteCache, SwatchController, Ticket};
pub use error::*;
pub use sampler::*;
pub use types::*;

pub use self::image::Image;

#[cfg(feature = "threads")]
pub use controller::recompute_par;

/// The maximum supported image size in number of pixels is `u32::MAX`.
pub const MAX_PIXELS: u32 = u32::MAX;

/// The maximum supported number of palette colors is `256`.
pub const MAX_COLORS: u16 = u8::MAX as u16 + 1;
