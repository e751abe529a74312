//! Dominant color clustering using Lloyd's k-means algorithm.
//!
//! The entry point is [`cluster`], which groups the pixels of an [`Image`] into `k` clusters
//! and returns a label image of width `k` and height `1`, where column `i` is the centroid of cluster `i`.
//! The label image is meant to be passed on to [`sample_and_saturate`](crate::sample_and_saturate).
//!
//! Each pass assigns every pixel to its nearest centroid in the chosen [`ColorSpace`](crate::ColorSpace)
//! and then moves each centroid to the mean of its pixels.
//! Clustering stops once no pixel changes cluster or after the configured number of passes.
//! Clusters that end up without any pixels keep their previous centroid.

mod init;
mod lloyd;

use crate::{
    image::is_finite, ColorCounts, Error, Image, InvalidInput, KmeansOptions, PaletteSize,
    PixelColors, Result, UniqueColorCounts, MAX_PIXELS,
};

use init::initial_centroids;
use lloyd::State;

use log::debug;
use palette::{Alpha, Srgba};

/// The result of clustering an image.
///
/// The centroids are ordered by cluster index:
/// seed means first, followed by the automatically chosen centroids.
#[derive(Debug, Clone, PartialEq)]
pub struct Clustering {
    /// The centroid of each cluster, converted to sRGB and clamped to the sRGB gamut.
    pub centroids: Vec<Srgba<f32>>,
    /// The number of pixels assigned to each cluster in the last pass.
    ///
    /// Each count is not guaranteed to be non-zero.
    pub counts: Vec<u64>,
    /// The distortion (sum of squared distances between each pixel and its centroid)
    /// measured at the start of each pass.
    pub distortion: Vec<f64>,
    /// Whether the assignments stopped changing before the pass limit was reached.
    pub converged: bool,
}

impl Clustering {
    /// The number of passes that were run.
    #[must_use]
    pub fn passes(&self) -> usize {
        self.distortion.len()
    }

    /// Lays out the centroids as an image of width `k` and height `1`.
    ///
    /// # Errors
    /// This never fails for a [`Clustering`] returned by this module,
    /// since every centroid is checked to be finite.
    pub fn label_image(&self) -> Result<Image> {
        #[allow(clippy::cast_possible_truncation)]
        let width = self.centroids.len() as u32;
        Image::new(width, 1, self.centroids.clone())
    }
}

/// Checks the inputs shared by [`cluster`] and its variants.
fn validate(
    image: &Image,
    k: PaletteSize,
    seed_means: &[Srgba<f32>],
    options: &KmeansOptions,
) -> Result<()> {
    if image.is_empty() {
        return Err(InvalidInput::EmptyImage.into());
    }
    if image.pixels().len() > MAX_PIXELS as usize {
        return Err(InvalidInput::TooManyPixels(image.pixels().len() as u64).into());
    }
    if k.into_inner() == 0 {
        return Err(InvalidInput::ZeroPaletteSize.into());
    }
    if options.passes == 0 {
        return Err(InvalidInput::ZeroPasses.into());
    }
    if seed_means.len() > k.as_usize() {
        return Err(InvalidInput::TooManySeedMeans {
            given: seed_means.len(),
            k: k.into_inner(),
        }
        .into());
    }
    if !seed_means.iter().copied().all(is_finite) {
        return Err(InvalidInput::NonFiniteColor.into());
    }
    Ok(())
}

/// Converts the final centroids back into sRGB.
fn summarize(color_counts: &impl ColorCounts, summary: lloyd::Summary) -> Result<Clustering> {
    let lloyd::Summary {
        centroids, alphas, counts, distortion, converged,
    } = summary;

    if centroids.iter().flatten().chain(&alphas).any(|c| !c.is_finite()) {
        return Err(Error::ComputationFailure(
            "k-means produced a non-finite centroid".to_owned(),
        ));
    }

    let colorspace = color_counts.colorspace();
    let centroids = centroids
        .into_iter()
        .zip(alphas)
        .map(|(components, alpha)| Alpha {
            color: colorspace.from_components_clamped(components),
            alpha: alpha.clamp(0.0, 1.0),
        })
        .collect();

    Ok(Clustering { centroids, counts, distortion, converged })
}

fn run<'a, Counts: ColorCounts>(
    color_counts: &'a Counts,
    k: PaletteSize,
    seed_means: &[Srgba<f32>],
    options: &KmeansOptions,
    iterate: impl FnOnce(State<'a, Counts>, u32) -> lloyd::Summary,
) -> Result<Clustering> {
    debug!(
        "clustering {} colors ({} pixels) into {k} clusters in {:?}",
        color_counts.len(),
        color_counts.total_count(),
        options.colorspace,
    );

    let (centroids, alphas) =
        initial_centroids(color_counts, k.as_usize(), seed_means, options.seed)?;

    let state = State::new(color_counts, centroids, alphas);
    summarize(color_counts, iterate(state, options.passes))
}

/// Clusters the pixels of `image` into `k` clusters and returns the full [`Clustering`].
///
/// See [`cluster`] for more details.
///
/// # Errors
/// See [`cluster`].
pub fn cluster_with_stats(
    image: &Image,
    k: PaletteSize,
    seed_means: &[Srgba<f32>],
    options: &KmeansOptions,
) -> Result<Clustering> {
    validate(image, k, seed_means, options)?;

    if options.dedup_pixels {
        let color_counts = UniqueColorCounts::new(image, options.colorspace);
        run(&color_counts, k, seed_means, options, State::run)
    } else {
        let color_counts = PixelColors::new(image, options.colorspace);
        run(&color_counts, k, seed_means, options, State::run)
    }
}

/// Clusters the pixels of `image` into `k` clusters and returns the label image.
///
/// The label image has width `k` and height `1`, and column `i` has the color of centroid `i`.
/// The first `seed_means.len()` centroids start at the given seed means,
/// and the rest are sampled from the colors of the image using the seed in `options`.
/// The output is identical for identical inputs.
///
/// # Errors
/// Returns an [`InvalidInput`] error if:
/// - `image` is empty or has more than [`MAX_PIXELS`] pixels
/// - `k` is `0`
/// - the number of passes in `options` is `0`
/// - there are more than `k` seed means, or any of them has a non-finite component
///
/// Returns [`Error::ComputationFailure`](crate::Error::ComputationFailure)
/// if the clustering did not produce finite centroids.
///
/// # Examples
/// ```
/// # use swatchette::{kmeans, Image, KmeansOptions};
/// # use palette::Srgba;
/// # fn main() -> Result<(), swatchette::Error> {
/// let red = Srgba::new(1.0, 0.0, 0.0, 1.0);
/// let blue = Srgba::new(0.0, 0.0, 1.0, 1.0);
/// let image = Image::new(2, 2, vec![red, red, blue, blue])?;
///
/// let labels = kmeans::cluster(&image, 2.into(), &[red, blue], &KmeansOptions::new())?;
/// assert_eq!((labels.width(), labels.height()), (2, 1));
/// # Ok(())
/// # }
/// ```
pub fn cluster(
    image: &Image,
    k: PaletteSize,
    seed_means: &[Srgba<f32>],
    options: &KmeansOptions,
) -> Result<Image> {
    cluster_with_stats(image, k, seed_means, options)?.label_image()
}

/// Like [`cluster_with_stats`], but runs in parallel across multiple threads.
///
/// The result is identical to the single-threaded version.
///
/// # Errors
/// See [`cluster`].
#[cfg(feature = "threads")]
pub fn cluster_with_stats_par(
    image: &Image,
    k: PaletteSize,
    seed_means: &[Srgba<f32>],
    options: &KmeansOptions,
) -> Result<Clustering> {
    validate(image, k, seed_means, options)?;

    if options.dedup_pixels {
        let color_counts = UniqueColorCounts::new_par(image, options.colorspace);
        run(&color_counts, k, seed_means, options, State::run_par)
    } else {
        let color_counts = PixelColors::new_par(image, options.colorspace);
        run(&color_counts, k, seed_means, options, State::run_par)
    }
}

/// Like [`cluster`], but runs in parallel across multiple threads.
///
/// The result is identical to the single-threaded version.
///
/// # Errors
/// See [`cluster`].
#[cfg(feature = "threads")]
pub fn cluster_par(
    image: &Image,
    k: PaletteSize,
    seed_means: &[Srgba<f32>],
    options: &KmeansOptions,
) -> Result<Image> {
    cluster_with_stats_par(image, k, seed_means, options)?.label_image()
}
