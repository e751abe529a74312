use crate::{
    kmeans::{self, Clustering},
    sample_and_saturate_in,
    sampler::check_saturation,
    to_srgba8, Image, PaletteOptions, Result,
};

use std::borrow::Cow;

use log::debug;
use palette::Srgba;

#[cfg(feature = "image")]
use crate::Error;
#[cfg(feature = "image")]
use image::{RgbImage, RgbaImage};

/// A builder struct that runs the whole swatch pipeline for one image:
/// k-means clustering into a label image, followed by
/// [`sample_and_saturate`](crate::sample_and_saturate).
///
/// # Examples
/// ```
/// # use swatchette::{Image, PaletteOptions, PalettePipeline};
/// # use palette::Srgba;
/// # fn main() -> Result<(), swatchette::Error> {
/// let red = Srgba::new(0.8, 0.2, 0.2, 1.0);
/// let teal = Srgba::new(0.2, 0.6, 0.6, 1.0);
/// let image = Image::new(2, 2, vec![red, red, teal, teal])?;
///
/// let swatches = PalettePipeline::new(&image)
///     .options(PaletteOptions::new().palette_size(2.into()).seed_means(vec![red, teal]))
///     .palette()?;
///
/// assert_eq!(swatches.len(), 2);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct PalettePipeline<'a> {
    /// The image to compute swatches for.
    image: Cow<'a, Image>,
    /// The pipeline settings.
    options: PaletteOptions,
}

impl<'a> PalettePipeline<'a> {
    /// Creates a new [`PalettePipeline`] for `image` with the default [`PaletteOptions`].
    #[must_use]
    pub fn new(image: &'a Image) -> Self {
        Self {
            image: Cow::Borrowed(image),
            options: PaletteOptions::default(),
        }
    }

    /// Sets the options used by the pipeline.
    #[must_use]
    pub fn options(mut self, options: PaletteOptions) -> Self {
        self.options = options;
        self
    }

    /// Returns the image of this pipeline.
    #[must_use]
    pub fn image(&self) -> &Image {
        &self.image
    }

    /// Returns the options of this pipeline.
    #[must_use]
    pub fn get_options(&self) -> &PaletteOptions {
        &self.options
    }

    /// Runs k-means and returns the full [`Clustering`].
    ///
    /// # Errors
    /// See [`kmeans::cluster`].
    pub fn clustering(&self) -> Result<Clustering> {
        let PaletteOptions { palette_size, seed_means, kmeans: options, .. } = &self.options;
        kmeans::cluster_with_stats(&self.image, *palette_size, seed_means, options)
    }

    /// Runs k-means and returns the label image of width `k` and height `1`.
    ///
    /// # Errors
    /// See [`kmeans::cluster`].
    pub fn label_image(&self) -> Result<Image> {
        self.clustering()?.label_image()
    }

    /// Computes the swatches: one averaged and saturated color per cluster.
    ///
    /// The output always has exactly `palette_size` colors,
    /// where color `i` comes from cluster `i`.
    ///
    /// # Errors
    /// Returns an [`InvalidInput`](crate::InvalidInput) error for any invalid image or option
    /// (see [`kmeans::cluster`] and [`sample_and_saturate`](crate::sample_and_saturate)).
    /// An invalid saturation factor is reported before any clustering is done.
    pub fn palette(&self) -> Result<Vec<Srgba<f32>>> {
        check_saturation(self.options.saturation)?;
        let clustering = self.clustering()?;
        self.sample(&clustering)
    }

    /// Like [`PalettePipeline::palette`], but converts the swatches to 8-bit sRGBA.
    ///
    /// # Errors
    /// See [`PalettePipeline::palette`].
    pub fn palette_srgba8(&self) -> Result<Vec<Srgba<u8>>> {
        self.palette().map(|colors| to_srgba8(&colors))
    }

    /// Turns a finished clustering into the swatches.
    fn sample(&self, clustering: &Clustering) -> Result<Vec<Srgba<f32>>> {
        debug!(
            "clustering finished after {} passes (converged: {})",
            clustering.passes(),
            clustering.converged,
        );

        let labels = clustering.label_image()?;
        sample_and_saturate_in(
            &labels,
            self.options.palette_size,
            self.options.saturation,
            self.options.saturation_space,
        )
    }
}

#[cfg(feature = "threads")]
impl PalettePipeline<'_> {
    /// Runs k-means in parallel and returns the full [`Clustering`].
    ///
    /// # Errors
    /// See [`kmeans::cluster`].
    pub fn clustering_par(&self) -> Result<Clustering> {
        let PaletteOptions { palette_size, seed_means, kmeans: options, .. } = &self.options;
        kmeans::cluster_with_stats_par(&self.image, *palette_size, seed_means, options)
    }

    /// Computes the swatches in parallel.
    ///
    /// The result is identical to [`PalettePipeline::palette`].
    ///
    /// # Errors
    /// See [`PalettePipeline::palette`].
    pub fn palette_par(&self) -> Result<Vec<Srgba<f32>>> {
        check_saturation(self.options.saturation)?;
        let clustering = self.clustering_par()?;
        self.sample(&clustering)
    }

    /// Like [`PalettePipeline::palette_par`], but converts the swatches to 8-bit sRGBA.
    ///
    /// # Errors
    /// See [`PalettePipeline::palette`].
    pub fn palette_srgba8_par(&self) -> Result<Vec<Srgba<u8>>> {
        self.palette_par().map(|colors| to_srgba8(&colors))
    }
}

impl<'a> From<&'a Image> for PalettePipeline<'a> {
    fn from(image: &'a Image) -> Self {
        Self::new(image)
    }
}

#[cfg(feature = "image")]
impl TryFrom<&RgbaImage> for PalettePipeline<'static> {
    type Error = Error;

    fn try_from(image: &RgbaImage) -> Result<Self, Self::Error> {
        Ok(Self {
            image: Cow::Owned(Image::try_from(image)?),
            options: PaletteOptions::default(),
        })
    }
}

#[cfg(feature = "image")]
impl TryFrom<&RgbImage> for PalettePipeline<'static> {
    type Error = Error;

    fn try_from(image: &RgbImage) -> Result<Self, Self::Error> {
        Ok(Self {
            image: Cow::Owned(Image::try_from(image)?),
            options: PaletteOptions::default(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::{tests::*, Error, InvalidInput, SaturationSpace};

    fn test_image() -> Image {
        Image::new(32, 32, test_data_1024()).unwrap()
    }

    #[test]
    fn palette_length_is_k() {
        let image = test_image();
        for k in [1u8, 5, 32, 100] {
            let options = PaletteOptions::new().palette_size(k.into());
            let swatches = PalettePipeline::new(&image).options(options).palette().unwrap();
            assert_eq!(swatches.len(), usize::from(k));
            assert!(swatches.iter().copied().all(crate::image::is_finite));
        }
    }

    #[test]
    fn identical_inputs_identical_outputs() {
        let image = test_image();
        let options = PaletteOptions::new().seed(7).seed_means(test_data_256()[..4].to_vec());
        let a = PalettePipeline::new(&image).options(options.clone()).palette().unwrap();
        let b = PalettePipeline::new(&image).options(options).palette().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn saturation_one_gives_centroids() {
        let image = test_image();
        let options = PaletteOptions::new().palette_size(8.into()).saturation(1.0);
        let pipeline = PalettePipeline::new(&image).options(options);

        let centroids = pipeline.clustering().unwrap().centroids;
        let swatches = pipeline.palette().unwrap();
        for (&swatch, &centroid) in swatches.iter().zip(&centroids) {
            assert_srgba_near(swatch, centroid, 1e-4);
        }
    }

    #[test]
    fn uniform_image_gives_uniform_swatches() {
        let gray = Srgba::new(0.4, 0.4, 0.4, 1.0);
        let image = Image::filled(10, 10, gray).unwrap();
        for space in [SaturationSpace::Luma, SaturationSpace::Oklab] {
            let options = PaletteOptions::new().saturation_space(space);
            let swatches = PalettePipeline::new(&image).options(options).palette().unwrap();
            assert_eq!(swatches.len(), 32);
            for swatch in swatches {
                assert_srgba_near(swatch, gray, 1e-4);
            }
        }
    }

    #[test]
    fn srgba8_swatches() {
        let red = Srgba::new(1.0, 0.0, 0.0, 1.0);
        let image = Image::filled(3, 3, red).unwrap();
        let options = PaletteOptions::new().palette_size(2.into());
        let swatches = PalettePipeline::new(&image).options(options).palette_srgba8().unwrap();
        assert_eq!(swatches, vec![Srgba::new(255, 0, 0, 255); 2]);
    }

    #[test]
    fn invalid_saturation() {
        let image = test_image();
        let options = PaletteOptions::new().saturation(-2.0);
        assert_eq!(
            PalettePipeline::new(&image).options(options).palette(),
            Err(Error::InvalidInput(InvalidInput::InvalidSaturation(-2.0)))
        );
    }

    #[test]
    fn saturation_is_checked_before_clustering() {
        let empty = Image::new(0, 0, Vec::new()).unwrap();
        let options = PaletteOptions::new().saturation(f32::INFINITY);
        let pipeline = PalettePipeline::new(&empty).options(options);

        assert_eq!(
            pipeline.clustering().map(|_| ()),
            Err(Error::InvalidInput(InvalidInput::EmptyImage))
        );
        assert_eq!(
            pipeline.palette(),
            Err(Error::InvalidInput(InvalidInput::InvalidSaturation(f32::INFINITY)))
        );
        #[cfg(feature = "threads")]
        assert_eq!(
            pipeline.palette_par(),
            Err(Error::InvalidInput(InvalidInput::InvalidSaturation(f32::INFINITY)))
        );
    }

    #[test]
    fn red_and_blue_swatches() {
        let red = Srgba::new(1.0, 0.0, 0.0, 1.0);
        let blue = Srgba::new(0.0, 0.0, 1.0, 1.0);
        let image = Image::new(2, 2, vec![red, red, blue, blue]).unwrap();

        for space in [SaturationSpace::Luma, SaturationSpace::Oklab] {
            let options = PaletteOptions::new()
                .palette_size(2.into())
                .seed_means(vec![red, blue])
                .passes(1)
                .saturation_space(space);
            let swatches = PalettePipeline::new(&image).options(options).palette().unwrap();

            assert_eq!(swatches.len(), 2);
            let (r, g, b, a) = swatches[0].into_components();
            assert!(r > 0.9 && g < 0.05 && b < 0.05, "{space:?}: {:?}", swatches[0]);
            assert!((a - 1.0).abs() < 1e-6);
            let (r, g, b, a) = swatches[1].into_components();
            assert!(b > 0.9 && r < 0.05 && g < 0.05, "{space:?}: {:?}", swatches[1]);
            assert!((a - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    #[cfg(feature = "threads")]
    fn single_and_multi_threaded_match() {
        let image = test_image();
        let pipeline = PalettePipeline::new(&image).options(PaletteOptions::new().seed(3));
        assert_eq!(pipeline.palette().unwrap(), pipeline.palette_par().unwrap());
    }

    #[test]
    #[cfg(feature = "image")]
    fn from_rgba_image() {
        let image = RgbaImage::from_pixel(4, 4, image::Rgba([10, 200, 30, 255]));
        let pipeline = PalettePipeline::try_from(&image)
            .unwrap()
            .options(PaletteOptions::new().palette_size(1.into()).saturation(1.0));

        let swatches = pipeline.palette_srgba8().unwrap();
        assert_eq!(swatches, vec![Srgba::new(10, 200, 30, 255)]);
    }
}
