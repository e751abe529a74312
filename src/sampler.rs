//! Turns a label image into display colors: one averaged, saturated color per column.

use crate::{Extent, Image, InvalidInput, PaletteSize, Result};
use palette::{convert::IntoColorUnclamped, Alpha, Clamp, LinSrgb, Oklab, Srgb, Srgba, Xyz};

/// The representation used to separate chroma from luminance when boosting saturation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SaturationSpace {
    /// Splits linear sRGB into its relative luminance and the remaining chroma vector.
    ///
    /// Each channel becomes `Y + factor * (channel - Y)`.
    #[default]
    Luma,
    /// Keeps Oklab lightness and scales the `a` and `b` components.
    Oklab,
}

/// The number of bisection steps used to bring an Oklab boost back into the sRGB gamut.
const GAMUT_SEARCH_STEPS: u32 = 24;

/// How far outside of `[0, 1]` a linear component may be and still count as in gamut.
const GAMUT_TOLERANCE: f32 = 1e-4;

fn in_gamut(color: LinSrgb) -> bool {
    let (r, g, b) = color.into_components();
    [r, g, b]
        .into_iter()
        .all(|c| (-GAMUT_TOLERANCE..=1.0 + GAMUT_TOLERANCE).contains(&c))
}

/// Scales the chroma of `color` by `factor` while keeping its luminance.
///
/// A `factor` of `0.0` gives a gray with the same luminance,
/// a `factor` of `1.0` leaves the color unchanged (up to rounding),
/// and larger factors push the color towards the edge of the sRGB gamut.
/// With [`SaturationSpace::Oklab`], the boost stops at the gamut edge for the color's
/// lightness and hue. Otherwise the result is clamped to the sRGB gamut.
/// Alpha is left untouched.
/// Grays have no chroma, so they stay the same for every factor.
#[must_use]
pub fn saturate(color: Srgba<f32>, factor: f32, space: SaturationSpace) -> Srgba<f32> {
    let Alpha { color, alpha } = color;
    let linear: LinSrgb = color.into_linear();

    let boosted = match space {
        SaturationSpace::Luma => {
            let xyz: Xyz = linear.into_color_unclamped();
            let y = xyz.y;
            LinSrgb::new(
                y + factor * (linear.red - y),
                y + factor * (linear.green - y),
                y + factor * (linear.blue - y),
            )
        }
        SaturationSpace::Oklab => {
            let lab: Oklab = linear.into_color_unclamped();
            let scaled = |t: f32| -> LinSrgb {
                Oklab::new(lab.l, t * lab.a, t * lab.b).into_color_unclamped()
            };

            let boosted = scaled(factor);
            if factor <= 1.0 || in_gamut(boosted) {
                boosted
            } else {
                // largest chroma scale in `[1, factor]` that still fits in sRGB
                let (mut lo, mut hi) = (1.0, factor);
                for _ in 0..GAMUT_SEARCH_STEPS {
                    let mid = 0.5 * (lo + hi);
                    if in_gamut(scaled(mid)) {
                        lo = mid;
                    } else {
                        hi = mid;
                    }
                }
                scaled(lo)
            }
        }
    };

    let color: Srgb<f32> = boosted.clamp().into_encoding();
    Alpha { color, alpha }
}

/// Checks that `label_image` has exactly one column for each of the `k` clusters.
fn check_label_image(label_image: &Image, k: PaletteSize) -> Result<()> {
    if k.into_inner() == 0 {
        return Err(InvalidInput::ZeroPaletteSize.into());
    }
    if label_image.width() != u32::from(k.into_inner()) {
        return Err(InvalidInput::WidthMismatch {
            expected: k.into_inner(),
            actual: label_image.width(),
        }
        .into());
    }
    if label_image.is_empty() {
        return Err(InvalidInput::EmptyImage.into());
    }
    Ok(())
}

/// Averages each of the `k` columns of `label_image`.
///
/// # Errors
/// Returns an [`InvalidInput`] error if `k` is `0`, if the width of `label_image` is not `k`,
/// or if `label_image` has no rows.
pub fn sample_columns(label_image: &Image, k: PaletteSize) -> Result<Vec<Srgba<f32>>> {
    check_label_image(label_image, k)?;

    let height = label_image.height();
    (0..label_image.width())
        .map(|x| label_image.area_average(Extent::new(x, 0, 1, height)))
        .collect()
}

/// Averages each of the `k` columns of `label_image` and boosts its saturation by `saturation`
/// using [`SaturationSpace::Luma`].
///
/// Color `i` of the output corresponds to column (and cluster) `i`.
///
/// # Errors
/// Returns an [`InvalidInput`] error if `k` is `0`, if the width of `label_image` is not `k`,
/// if `label_image` has no rows, or if `saturation` is negative, NaN, or infinite.
///
/// # Examples
/// ```
/// # use swatchette::{sample_and_saturate, Image};
/// # use palette::Srgba;
/// # fn main() -> Result<(), swatchette::Error> {
/// let gray = Srgba::new(0.5, 0.5, 0.5, 1.0);
/// let labels = Image::filled(4, 1, gray)?;
/// let swatches = sample_and_saturate(&labels, 4.into(), 5.0)?;
/// assert_eq!(swatches.len(), 4);
/// # Ok(())
/// # }
/// ```
pub fn sample_and_saturate(
    label_image: &Image,
    k: PaletteSize,
    saturation: f32,
) -> Result<Vec<Srgba<f32>>> {
    sample_and_saturate_in(label_image, k, saturation, SaturationSpace::Luma)
}

/// Like [`sample_and_saturate`], but boosts saturation in the given [`SaturationSpace`].
///
/// # Errors
/// See [`sample_and_saturate`].
pub fn sample_and_saturate_in(
    label_image: &Image,
    k: PaletteSize,
    saturation: f32,
    space: SaturationSpace,
) -> Result<Vec<Srgba<f32>>> {
    check_saturation(saturation)?;

    let mut colors = sample_columns(label_image, k)?;
    for color in &mut colors {
        *color = saturate(*color, saturation, space);
    }
    Ok(colors)
}

/// Rejects saturation factors that are negative, NaN, or infinite.
pub(crate) fn check_saturation(saturation: f32) -> Result<()> {
    if saturation.is_finite() && saturation >= 0.0 {
        Ok(())
    } else {
        Err(InvalidInput::InvalidSaturation(saturation).into())
    }
}

/// Converts display colors into 8-bit sRGBA for rendering.
#[must_use]
pub fn to_srgba8(colors: &[Srgba<f32>]) -> Vec<Srgba<u8>> {
    colors.iter().map(|color| color.into_format()).collect()
}
