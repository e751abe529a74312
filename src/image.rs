//! Contains the [`Image`] type shared by all stages.

use crate::{Extent, InvalidInput, Result, MAX_PIXELS};
use palette::{Alpha, LinSrgb, Srgb, Srgba};
#[cfg(feature = "image")]
use {
    crate::Error,
    image::{RgbImage, RgbaImage},
    palette::cast::ComponentsAs,
};

/// An immutable grid of pixels stored as (encoded) sRGB with straight alpha.
///
/// Pixels are stored row by row, starting from the origin `(0, 0)`.
/// Every [`Image`] is validated on construction:
/// the number of pixels must equal `width * height` and every component must be finite.
/// An [`Image`] is never modified after construction; transforms produce a new [`Image`].
///
/// # Examples
/// ```
/// # use swatchette::Image;
/// # use palette::Srgba;
/// # fn main() -> Result<(), swatchette::Error> {
/// let red = Srgba::new(255, 0, 0, 255);
/// let blue = Srgba::new(0, 0, 255, 255);
/// let image = Image::from_srgba8(2, 2, &[red, red, blue, blue])?;
/// assert_eq!(image.pixel(1, 1), Some(Srgba::new(0.0, 0.0, 1.0, 1.0)));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    /// The number of columns.
    width: u32,
    /// The number of rows.
    height: u32,
    /// The pixels in row major order.
    pixels: Vec<Srgba<f32>>,
}

impl Image {
    /// Creates a new [`Image`] from pixels in row major order.
    ///
    /// # Errors
    /// Returns [`InvalidInput::DimensionMismatch`] if `pixels.len() != width * height`
    /// or [`InvalidInput::NonFiniteColor`] if any component is NaN or infinite.
    pub fn new(width: u32, height: u32, pixels: Vec<Srgba<f32>>) -> Result<Self> {
        if pixels.len() as u64 != u64::from(width) * u64::from(height) {
            return Err(InvalidInput::DimensionMismatch {
                pixels: pixels.len(),
                width,
                height,
            }
            .into());
        }

        if !pixels.iter().copied().all(is_finite) {
            return Err(InvalidInput::NonFiniteColor.into());
        }

        Ok(Self { width, height, pixels })
    }

    /// Creates a new [`Image`] from 8-bit sRGBA pixels.
    ///
    /// # Errors
    /// See [`Image::new`].
    pub fn from_srgba8(width: u32, height: u32, pixels: &[Srgba<u8>]) -> Result<Self> {
        Self::new(
            width,
            height,
            pixels.iter().map(|color| color.into_format()).collect(),
        )
    }

    /// Creates a new, fully opaque [`Image`] from 8-bit sRGB pixels.
    ///
    /// # Errors
    /// See [`Image::new`].
    pub fn from_srgb8(width: u32, height: u32, pixels: &[Srgb<u8>]) -> Result<Self> {
        Self::new(
            width,
            height,
            pixels
                .iter()
                .map(|color| color.into_format::<f32>().into())
                .collect(),
        )
    }

    /// Creates an [`Image`] where every pixel has the same color.
    ///
    /// # Errors
    /// Returns [`InvalidInput::TooManyPixels`] if `width * height` is above [`MAX_PIXELS`]
    /// or [`InvalidInput::NonFiniteColor`] if `color` has a NaN or infinite component.
    pub fn filled(width: u32, height: u32, color: Srgba<f32>) -> Result<Self> {
        let area = u64::from(width) * u64::from(height);
        if area > u64::from(MAX_PIXELS) {
            return Err(InvalidInput::TooManyPixels(area).into());
        }
        let len = usize::try_from(area).map_err(|_| InvalidInput::TooManyPixels(area))?;

        Self::new(width, height, vec![color; len])
    }

    /// The number of columns.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// The number of rows.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// The extent covering the whole image.
    #[must_use]
    pub const fn extent(&self) -> Extent {
        Extent::new(0, 0, self.width, self.height)
    }

    /// Whether the image has no pixels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// The pixels in row major order.
    #[must_use]
    pub fn pixels(&self) -> &[Srgba<f32>] {
        &self.pixels
    }

    /// Consumes the image and returns its pixels in row major order.
    #[must_use]
    pub fn into_pixels(self) -> Vec<Srgba<f32>> {
        self.pixels
    }

    /// Returns the pixel at the given column and row, if it exists.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<Srgba<f32>> {
        if x < self.width && y < self.height {
            self.pixels
                .get(y as usize * self.width as usize + x as usize)
                .copied()
        } else {
            None
        }
    }

    /// Computes the mean color of all pixels within `extent`.
    ///
    /// Colors are averaged in linear sRGB, while alpha is averaged directly.
    ///
    /// # Errors
    /// Returns [`InvalidInput::EmptyExtent`] if `extent` covers no pixels
    /// or [`InvalidInput::ExtentOutOfBounds`] if it is not fully inside the image.
    pub fn area_average(&self, extent: Extent) -> Result<Srgba<f32>> {
        if extent.area() == 0 {
            return Err(InvalidInput::EmptyExtent.into());
        }

        if !extent.fits_within(self.width, self.height) {
            return Err(InvalidInput::ExtentOutOfBounds {
                extent,
                width: self.width,
                height: self.height,
            }
            .into());
        }

        let width = self.width as usize;
        let x = extent.x as usize;
        let mut sum = [0.0f64; 4];
        for row in (extent.y..extent.y + extent.height).map(|y| y as usize) {
            let start = row * width + x;
            for pixel in &self.pixels[start..(start + extent.width as usize)] {
                let linear: LinSrgb = pixel.color.into_linear();
                sum[0] += f64::from(linear.red);
                sum[1] += f64::from(linear.green);
                sum[2] += f64::from(linear.blue);
                sum[3] += f64::from(pixel.alpha);
            }
        }

        #[allow(clippy::cast_precision_loss)]
        let n = extent.area() as f64;

        #[allow(clippy::cast_possible_truncation)]
        let [red, green, blue, alpha] = sum.map(|s| (s / n) as f32);

        let color: Srgb<f32> = LinSrgb::new(red, green, blue).into_encoding();
        Ok(Alpha { color, alpha })
    }
}

/// Whether every component of `color` is finite.
pub(crate) fn is_finite(color: Srgba<f32>) -> bool {
    let (r, g, b, a) = color.into_components();
    r.is_finite() && g.is_finite() && b.is_finite() && a.is_finite()
}

#[cfg(feature = "image")]
impl TryFrom<&RgbaImage> for Image {
    type Error = Error;

    fn try_from(image: &RgbaImage) -> Result<Self, Self::Error> {
        let pixels = image.pixels().len();
        let buf: &[Srgba<u8>] = image.as_raw()[..(pixels * 4)].components_as();
        Self::from_srgba8(image.width(), image.height(), buf)
    }
}

#[cfg(feature = "image")]
impl TryFrom<&RgbImage> for Image {
    type Error = Error;

    fn try_from(image: &RgbImage) -> Result<Self, Self::Error> {
        let pixels = image.pixels().len();
        let buf: &[Srgb<u8>] = image.as_raw()[..(pixels * 3)].components_as();
        Self::from_srgb8(image.width(), image.height(), buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::{tests::*, Error};

    #[test]
    fn rejects_mismatched_dimensions() {
        let pixels = vec![Srgba::new(0.0, 0.0, 0.0, 1.0); 5];
        assert_eq!(
            Image::new(2, 2, pixels),
            Err(Error::InvalidInput(InvalidInput::DimensionMismatch {
                pixels: 5,
                width: 2,
                height: 2
            }))
        );
    }

    #[test]
    fn rejects_non_finite_pixels() {
        let pixels = vec![Srgba::new(0.0, f32::NAN, 0.0, 1.0)];
        assert_eq!(
            Image::new(1, 1, pixels),
            Err(Error::InvalidInput(InvalidInput::NonFiniteColor))
        );
    }

    #[test]
    fn filled_rejects_oversized_geometry() {
        let color = Srgba::new(0.0, 0.0, 0.0, 1.0);
        let area = u64::from(u32::MAX) * 2;
        assert_eq!(
            Image::filled(u32::MAX, 2, color),
            Err(Error::InvalidInput(InvalidInput::TooManyPixels(area)))
        );
        assert!(matches!(
            Image::filled(u32::MAX, u32::MAX, color),
            Err(Error::InvalidInput(InvalidInput::TooManyPixels(_)))
        ));
        assert_eq!(
            Image::filled(2, 1, Srgba::new(f32::INFINITY, 0.0, 0.0, 1.0)),
            Err(Error::InvalidInput(InvalidInput::NonFiniteColor))
        );
    }

    #[test]
    fn empty_image_is_constructible() {
        let image = Image::new(0, 7, Vec::new()).unwrap();
        assert!(image.is_empty());
        assert_eq!(image.extent(), Extent::new(0, 0, 0, 7));
    }

    #[test]
    fn pixel_lookup() {
        let image = Image::new(3, 2, test_data_256()[..6].to_vec()).unwrap();
        assert_eq!(image.pixel(2, 1), Some(test_data_256()[5]));
        assert_eq!(image.pixel(3, 0), None);
        assert_eq!(image.pixel(0, 2), None);
    }

    #[test]
    fn area_average_of_uniform_region() {
        let color = Srgba::new(0.25, 0.5, 0.75, 0.5);
        let image = Image::filled(4, 3, color).unwrap();
        let average = image.area_average(Extent::new(1, 0, 2, 3)).unwrap();
        assert_srgba_near(average, color, 1e-6);
    }

    #[test]
    fn area_average_uses_only_the_extent() {
        let black = Srgba::new(0.0, 0.0, 0.0, 1.0);
        let white = Srgba::new(1.0, 1.0, 1.0, 0.0);
        let image = Image::new(2, 2, vec![black, white, black, white]).unwrap();

        let left = image.area_average(Extent::new(0, 0, 1, 2)).unwrap();
        assert_srgba_near(left, black, 1e-6);

        let all = image.area_average(image.extent()).unwrap();
        // half white in linear light, encoded back to sRGB
        let expected: Srgb<f32> = LinSrgb::new(0.5, 0.5, 0.5).into_encoding();
        assert_srgba_near(all, Alpha { color: expected, alpha: 0.5 }, 1e-6);
    }

    #[test]
    fn area_average_rejects_bad_extents() {
        let image = Image::filled(2, 1, Srgba::new(0.0, 0.0, 0.0, 1.0)).unwrap();
        assert_eq!(
            image.area_average(Extent::new(0, 0, 0, 1)),
            Err(Error::InvalidInput(InvalidInput::EmptyExtent))
        );
        assert!(matches!(
            image.area_average(Extent::new(1, 0, 2, 1)),
            Err(Error::InvalidInput(InvalidInput::ExtentOutOfBounds { .. }))
        ));
    }

    #[test]
    fn from_srgb8_is_opaque() {
        let image = Image::from_srgb8(1, 1, &[Srgb::new(255, 0, 0)]).unwrap();
        assert_eq!(image.pixels(), &[Srgba::new(1.0, 0.0, 0.0, 1.0)]);
    }
}
