//! Contains the configuration types and the high level pipeline builder API.

mod palette_pipeline;

pub use palette_pipeline::PalettePipeline;

use crate::{ColorSpace, PaletteSize, SaturationSpace};

use palette::Srgba;

/// A builder struct to specify the parameters for k-means.
///
/// # Examples
/// ```
/// # use swatchette::{ColorSpace, KmeansOptions};
/// let options = KmeansOptions::new()
///     .colorspace(ColorSpace::Lab)
///     .passes(20)
///     .seed(42);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KmeansOptions {
    /// The maximum number of assignment and update passes.
    pub(crate) passes: u32,
    /// The seed value for the random number generator.
    pub(crate) seed: u64,
    /// The color space to cluster in.
    pub(crate) colorspace: ColorSpace,
    /// Whether to deduplicate pixels before clustering.
    pub(crate) dedup_pixels: bool,
}

impl Default for KmeansOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl KmeansOptions {
    /// Creates a new [`KmeansOptions`] with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            passes: 10,
            seed: 0,
            colorspace: ColorSpace::Oklab,
            dedup_pixels: true,
        }
    }

    /// Sets the maximum number of passes to run.
    ///
    /// Clustering may stop earlier once the assignments stop changing.
    ///
    /// The default is `10` passes.
    #[must_use]
    pub const fn passes(mut self, passes: u32) -> Self {
        self.passes = passes;
        self
    }

    /// Sets the seed value for the random number generator
    /// used to choose centroids that were not given as seed means.
    ///
    /// The default seed is `0`.
    #[must_use]
    pub const fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the color space in which distances and means are computed.
    ///
    /// The default is [`ColorSpace::Oklab`].
    #[must_use]
    pub const fn colorspace(mut self, colorspace: ColorSpace) -> Self {
        self.colorspace = colorspace;
        self
    }

    /// Sets the color space through the perceptual flag.
    ///
    /// See [`ColorSpace::from_perceptual`].
    #[must_use]
    pub const fn perceptual(self, perceptual: bool) -> Self {
        self.colorspace(ColorSpace::from_perceptual(perceptual))
    }

    /// Sets whether or not to deduplicate pixels before clustering.
    ///
    /// Each unique color is weighted by its number of pixels,
    /// so this only changes the speed of clustering and not its result (up to float rounding).
    ///
    /// The default is `true`.
    #[must_use]
    pub const fn dedup_pixels(mut self, dedup_pixels: bool) -> Self {
        self.dedup_pixels = dedup_pixels;
        self
    }

    /// Returns the maximum number of passes.
    #[must_use]
    pub const fn get_passes(&self) -> u32 {
        self.passes
    }

    /// Returns the random number generator seed.
    #[must_use]
    pub const fn get_seed(&self) -> u64 {
        self.seed
    }

    /// Returns the clustering color space.
    #[must_use]
    pub const fn get_colorspace(&self) -> ColorSpace {
        self.colorspace
    }

    /// Returns whether pixels are deduplicated before clustering.
    #[must_use]
    pub const fn get_dedup_pixels(&self) -> bool {
        self.dedup_pixels
    }
}

/// Every setting needed to go from an image to its swatches.
///
/// The defaults are `32` swatches, no seed means, clustering in Oklab for `10` passes,
/// and a saturation boost of `5.0`.
///
/// # Examples
/// ```
/// # use swatchette::{PaletteOptions, SaturationSpace};
/// # use palette::Srgba;
/// let options = PaletteOptions::new()
///     .palette_size(8.into())
///     .seed_means(vec![Srgba::new(1.0, 0.0, 0.0, 1.0)])
///     .perceptual(false)
///     .saturation(2.5)
///     .saturation_space(SaturationSpace::Oklab);
/// assert_eq!(options.get_palette_size().into_inner(), 8);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PaletteOptions {
    /// The number of swatches.
    pub(crate) palette_size: PaletteSize,
    /// The colors to start the first clusters at.
    pub(crate) seed_means: Vec<Srgba<f32>>,
    /// The clustering parameters.
    pub(crate) kmeans: KmeansOptions,
    /// The saturation factor applied to each swatch.
    pub(crate) saturation: f32,
    /// How saturation is applied.
    pub(crate) saturation_space: SaturationSpace,
}

impl Default for PaletteOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl PaletteOptions {
    /// The default saturation factor.
    pub const DEFAULT_SATURATION: f32 = 5.0;

    /// Creates a new [`PaletteOptions`] with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            palette_size: PaletteSize::DEFAULT,
            seed_means: Vec::new(),
            kmeans: KmeansOptions::new(),
            saturation: Self::DEFAULT_SATURATION,
            saturation_space: SaturationSpace::Luma,
        }
    }

    /// Sets the number of swatches (clusters).
    ///
    /// The default is [`PaletteSize::DEFAULT`] (`32`).
    #[must_use]
    pub const fn palette_size(mut self, size: PaletteSize) -> Self {
        self.palette_size = size;
        self
    }

    /// Sets the colors of the first clusters.
    ///
    /// At most `palette_size` seed means may be given.
    /// The remaining clusters are started at colors sampled from the image.
    #[must_use]
    pub fn seed_means(mut self, seed_means: Vec<Srgba<f32>>) -> Self {
        self.seed_means = seed_means;
        self
    }

    /// Sets all of the k-means parameters at once.
    #[must_use]
    pub const fn kmeans(mut self, kmeans: KmeansOptions) -> Self {
        self.kmeans = kmeans;
        self
    }

    /// Sets the clustering color space.
    ///
    /// See [`KmeansOptions::colorspace`].
    #[must_use]
    pub const fn colorspace(mut self, colorspace: ColorSpace) -> Self {
        self.kmeans = self.kmeans.colorspace(colorspace);
        self
    }

    /// Sets the clustering color space through the perceptual flag.
    ///
    /// See [`KmeansOptions::perceptual`].
    #[must_use]
    pub const fn perceptual(mut self, perceptual: bool) -> Self {
        self.kmeans = self.kmeans.perceptual(perceptual);
        self
    }

    /// Sets the maximum number of clustering passes.
    ///
    /// See [`KmeansOptions::passes`].
    #[must_use]
    pub const fn passes(mut self, passes: u32) -> Self {
        self.kmeans = self.kmeans.passes(passes);
        self
    }

    /// Sets the random number generator seed.
    ///
    /// See [`KmeansOptions::seed`].
    #[must_use]
    pub const fn seed(mut self, seed: u64) -> Self {
        self.kmeans = self.kmeans.seed(seed);
        self
    }

    /// Sets whether or not to deduplicate pixels before clustering.
    ///
    /// See [`KmeansOptions::dedup_pixels`].
    #[must_use]
    pub const fn dedup_pixels(mut self, dedup_pixels: bool) -> Self {
        self.kmeans = self.kmeans.dedup_pixels(dedup_pixels);
        self
    }

    /// Sets the saturation factor applied to each averaged swatch.
    ///
    /// `0.0` gives grays, `1.0` leaves the colors unchanged, and the default is `5.0`.
    #[must_use]
    pub const fn saturation(mut self, saturation: f32) -> Self {
        self.saturation = saturation;
        self
    }

    /// Sets how the saturation factor is applied.
    ///
    /// The default is [`SaturationSpace::Luma`].
    #[must_use]
    pub const fn saturation_space(mut self, space: SaturationSpace) -> Self {
        self.saturation_space = space;
        self
    }

    /// Returns the number of swatches.
    #[must_use]
    pub const fn get_palette_size(&self) -> PaletteSize {
        self.palette_size
    }

    /// Returns the seed means.
    #[must_use]
    pub fn get_seed_means(&self) -> &[Srgba<f32>] {
        &self.seed_means
    }

    /// Returns the k-means parameters.
    #[must_use]
    pub const fn get_kmeans(&self) -> &KmeansOptions {
        &self.kmeans
    }

    /// Returns the saturation factor.
    #[must_use]
    pub const fn get_saturation(&self) -> f32 {
        self.saturation
    }

    /// Returns how the saturation factor is applied.
    #[must_use]
    pub const fn get_saturation_space(&self) -> SaturationSpace {
        self.saturation_space
    }
}
