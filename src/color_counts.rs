//! Contains the clustering input: pixel colors converted into a [`ColorSpace`],
//! optionally deduplicated with a count for each unique color.

use crate::{ColorSpace, Image};
use palette::Srgba;
#[cfg(feature = "threads")]
use rayon::prelude::*;

/// A generalization trait over every pixel of an image ([`PixelColors`])
/// and deduplicated pixels ([`UniqueColorCounts`]).
///
/// Colors are stored as components of [`ColorCounts::colorspace`],
/// with the alpha of each color carried separately since it does not take part in distances.
pub trait ColorCounts {
    /// The color space that the components are in.
    fn colorspace(&self) -> ColorSpace;

    /// The components of each color.
    fn components(&self) -> &[[f32; 3]];

    /// The alpha of each color, parallel to [`ColorCounts::components`].
    fn alphas(&self) -> &[f32];

    /// The number of pixels corresponding to each color.
    ///
    /// For [`PixelColors`], this returns `None`, indicating each color has a count of `1`.
    /// Otherwise, each count is nonzero and the slice has the same length as [`ColorCounts::components`].
    fn counts(&self) -> Option<&[u32]>;

    /// The total number of pixels in the original image.
    ///
    /// This is equal to the sum of `counts` (or `len` if `counts` is `None`).
    fn total_count(&self) -> u64;

    /// The number of colors.
    fn len(&self) -> usize {
        self.components().len()
    }

    /// Whether there are no colors.
    fn is_empty(&self) -> bool {
        self.components().is_empty()
    }
}

/// Every pixel of an image converted into a [`ColorSpace`].
#[derive(Debug, Clone, PartialEq)]
pub struct PixelColors {
    /// The color space of `components`.
    colorspace: ColorSpace,
    /// The components of each pixel.
    components: Vec<[f32; 3]>,
    /// The alpha of each pixel.
    alphas: Vec<f32>,
}

impl PixelColors {
    /// Converts each pixel of `image` into `colorspace`.
    #[must_use]
    pub fn new(image: &Image, colorspace: ColorSpace) -> Self {
        let (components, alphas) = image
            .pixels()
            .iter()
            .map(|&pixel| convert(pixel, colorspace))
            .unzip();

        Self { colorspace, components, alphas }
    }

    /// Converts each pixel of `image` into `colorspace` in parallel.
    #[cfg(feature = "threads")]
    #[must_use]
    pub fn new_par(image: &Image, colorspace: ColorSpace) -> Self {
        let (components, alphas) = image
            .pixels()
            .par_iter()
            .map(|&pixel| convert(pixel, colorspace))
            .unzip();

        Self { colorspace, components, alphas }
    }
}

impl ColorCounts for PixelColors {
    fn colorspace(&self) -> ColorSpace {
        self.colorspace
    }

    fn components(&self) -> &[[f32; 3]] {
        &self.components
    }

    fn alphas(&self) -> &[f32] {
        &self.alphas
    }

    fn counts(&self) -> Option<&[u32]> {
        None
    }

    fn total_count(&self) -> u64 {
        self.components.len() as u64
    }
}

/// The unique colors of an image converted into a [`ColorSpace`],
/// alongside the number of pixels with each color.
///
/// Colors are deduplicated before conversion,
/// so only each unique color needs to be converted instead of each pixel.
/// The unique colors are ordered by the bit patterns of their sRGBA components.
#[derive(Debug, Clone, PartialEq)]
pub struct UniqueColorCounts {
    /// The color space of `components`.
    colorspace: ColorSpace,
    /// The components of each unique color.
    components: Vec<[f32; 3]>,
    /// The alpha of each unique color.
    alphas: Vec<f32>,
    /// The number of pixels with each unique color.
    counts: Vec<u32>,
    /// The number of pixels in the image.
    total_count: u64,
}

impl UniqueColorCounts {
    /// Deduplicates the pixels of `image` and converts the unique colors into `colorspace`.
    ///
    /// The image must not have more than [`MAX_PIXELS`](crate::MAX_PIXELS) pixels,
    /// otherwise the counts may overflow.
    #[must_use]
    pub fn new(image: &Image, colorspace: ColorSpace) -> Self {
        let mut keys = image.pixels().iter().map(|&p| key(p)).collect::<Vec<_>>();
        keys.sort_unstable();
        let (unique, counts) = run_lengths(&keys);

        let (components, alphas) = unique
            .into_iter()
            .map(|k| convert(from_key(k), colorspace))
            .unzip();

        Self {
            colorspace,
            components,
            alphas,
            counts,
            total_count: keys.len() as u64,
        }
    }

    /// Deduplicates the pixels of `image` and converts the unique colors into `colorspace` in parallel.
    ///
    /// The image must not have more than [`MAX_PIXELS`](crate::MAX_PIXELS) pixels,
    /// otherwise the counts may overflow.
    #[cfg(feature = "threads")]
    #[must_use]
    pub fn new_par(image: &Image, colorspace: ColorSpace) -> Self {
        let mut keys = image.pixels().par_iter().map(|&p| key(p)).collect::<Vec<_>>();
        keys.par_sort_unstable();
        let (unique, counts) = run_lengths(&keys);

        let (components, alphas) = unique
            .into_par_iter()
            .map(|k| convert(from_key(k), colorspace))
            .unzip();

        Self {
            colorspace,
            components,
            alphas,
            counts,
            total_count: keys.len() as u64,
        }
    }
}

impl ColorCounts for UniqueColorCounts {
    fn colorspace(&self) -> ColorSpace {
        self.colorspace
    }

    fn components(&self) -> &[[f32; 3]] {
        &self.components
    }

    fn alphas(&self) -> &[f32] {
        &self.alphas
    }

    fn counts(&self) -> Option<&[u32]> {
        Some(&self.counts)
    }

    fn total_count(&self) -> u64 {
        self.total_count
    }
}

/// Splits a color into its components in `colorspace` and its alpha.
fn convert(color: Srgba<f32>, colorspace: ColorSpace) -> ([f32; 3], f32) {
    (colorspace.to_components(color.color), color.alpha)
}

/// The bit patterns of a color, used to sort and compare colors exactly.
fn key(color: Srgba<f32>) -> [u32; 4] {
    let (r, g, b, a) = color.into_components();
    [r.to_bits(), g.to_bits(), b.to_bits(), a.to_bits()]
}

/// The inverse of [`key`].
fn from_key(key: [u32; 4]) -> Srgba<f32> {
    let [r, g, b, a] = key.map(f32::from_bits);
    Srgba::new(r, g, b, a)
}

/// Collapses runs of equal keys in a sorted slice into unique keys and their counts.
fn run_lengths(sorted: &[[u32; 4]]) -> (Vec<[u32; 4]>, Vec<u32>) {
    let mut unique = Vec::new();
    let mut counts = Vec::new();

    let mut start = 0;
    while start < sorted.len() {
        let current = sorted[start];
        let len = sorted[start..].iter().take_while(|&&k| k == current).count();

        unique.push(current);
        #[allow(clippy::cast_possible_truncation)]
        counts.push(len as u32);

        start += len;
    }

    (unique, counts)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::tests::*;
    use rand::{seq::SliceRandom, SeedableRng};
    use rand_xoshiro::Xoroshiro128PlusPlus;

    #[test]
    fn empty_input() {
        let image = Image::new(0, 0, Vec::new()).unwrap();

        let pixels = PixelColors::new(&image, ColorSpace::Oklab);
        assert!(pixels.is_empty() && pixels.alphas().is_empty());
        assert_eq!(pixels.total_count(), 0);

        let unique = UniqueColorCounts::new(&image, ColorSpace::Oklab);
        assert!(unique.is_empty() && unique.counts().is_some_and(<[u32]>::is_empty));
        assert_eq!(unique.total_count(), 0);
    }

    #[test]
    fn counts_sum_to_total() {
        let mut colors = [test_data_256().as_slice(); 4].concat();
        colors.extend_from_slice(&test_data_1024());
        colors.shuffle(&mut Xoroshiro128PlusPlus::seed_from_u64(0));
        let image = Image::new(colors.len() as u32, 1, colors).unwrap();

        let unique = UniqueColorCounts::new(&image, ColorSpace::Srgb);
        let counts = unique.counts().unwrap();
        assert_eq!(counts.len(), unique.len());
        assert!(counts.iter().all(|&c| c > 0));
        assert_eq!(counts.iter().map(|&c| u64::from(c)).sum::<u64>(), unique.total_count());
        assert_eq!(unique.total_count(), image.pixels().len() as u64);
    }

    #[test]
    fn duplicate_colors_are_merged() {
        let red = Srgba::new(1.0, 0.0, 0.0, 1.0);
        let blue = Srgba::new(0.0, 0.0, 1.0, 1.0);
        let image = Image::new(5, 1, vec![red, blue, red, red, blue]).unwrap();

        let unique = UniqueColorCounts::new(&image, ColorSpace::Srgb);
        assert_eq!(unique.len(), 2);

        let mut found = unique
            .components()
            .iter()
            .zip(unique.counts().unwrap())
            .map(|(&c, &n)| (c, n))
            .collect::<Vec<_>>();
        found.sort_by(|a, b| a.1.cmp(&b.1));
        assert_eq!(found, vec![([0.0, 0.0, 1.0], 2), ([1.0, 0.0, 0.0], 3)]);
    }

    #[test]
    fn alpha_distinguishes_colors() {
        let opaque = Srgba::new(0.5, 0.5, 0.5, 1.0);
        let clear = Srgba::new(0.5, 0.5, 0.5, 0.0);
        let image = Image::new(2, 1, vec![opaque, clear]).unwrap();

        let unique = UniqueColorCounts::new(&image, ColorSpace::Oklab);
        assert_eq!(unique.len(), 2);
        let mut alphas = unique.alphas().to_vec();
        alphas.sort_by(f32::total_cmp);
        assert_eq!(alphas, vec![0.0, 1.0]);
    }

    #[test]
    fn pixel_colors_keep_order() {
        let colors = test_data_256();
        let image = Image::new(16, 16, colors.clone()).unwrap();
        let pixels = PixelColors::new(&image, ColorSpace::Lab);
        for ((&components, &alpha), color) in
            pixels.components().iter().zip(pixels.alphas()).zip(colors)
        {
            assert_eq!(components, ColorSpace::Lab.to_components(color.color));
            #[allow(clippy::float_cmp)]
            {
                assert_eq!(alpha, color.alpha);
            }
        }
    }

    #[test]
    #[cfg(feature = "threads")]
    fn single_and_multi_threaded_match() {
        let colors = [test_data_1024().as_slice(); 3].concat();
        let image = Image::new(colors.len() as u32, 1, colors).unwrap();

        assert_eq!(
            UniqueColorCounts::new(&image, ColorSpace::Oklab),
            UniqueColorCounts::new_par(&image, ColorSpace::Oklab)
        );
        assert_eq!(
            PixelColors::new(&image, ColorSpace::Oklab),
            PixelColors::new_par(&image, ColorSpace::Oklab)
        );
    }
}
