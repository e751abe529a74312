//! Contains the [`ColorSpace`] used to measure distances between colors while clustering.

use palette::{cast, convert::IntoColorUnclamped, Clamp, Lab, LinSrgb, Oklab, Srgb};

/// The set of color spaces that clustering can be performed in.
///
/// Colors always enter and leave the crate as (encoded) sRGB.
/// The color space only decides where centroids live and how distances between colors are measured,
/// so every conversion in and out of it happens at an explicit function boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColorSpace {
    /// The raw, gamma encoded sRGB components.
    Srgb,
    /// The CIELAB color space with a D65 white point.
    ///
    /// The lightness component ranges from `0.0` to `100.0`.
    Lab,
    /// The Oklab color space.
    ///
    /// This is the default, perceptually uniform color space.
    #[default]
    Oklab,
}

impl ColorSpace {
    /// The component ranges for each color space for colors converted from in gamut sRGB.
    pub const SRGB_F32_COMPONENT_RANGES: [(f32, f32); 3] = [(0.0, 1.0), (0.0, 1.0), (0.0, 1.0)];

    /// See [`ColorSpace::SRGB_F32_COMPONENT_RANGES`].
    pub const OKLAB_F32_COMPONENT_RANGES_FROM_SRGB: [(f32, f32); 3] = [
        (0.0, 1.0),
        (-0.2338874, 0.2762164),
        (-0.31152815, 0.19856972),
    ];

    /// See [`ColorSpace::SRGB_F32_COMPONENT_RANGES`].
    pub const LAB_F32_COMPONENT_RANGES_FROM_SRGB: [(f32, f32); 3] = [
        (0.0, 100.0),
        (-86.182686, 98.23433),
        (-107.86016, 94.477974),
    ];

    /// Maps the `perceptual` flag onto a color space:
    /// [`ColorSpace::Oklab`] if `true` and [`ColorSpace::Srgb`] otherwise.
    #[must_use]
    pub const fn from_perceptual(perceptual: bool) -> Self {
        if perceptual {
            Self::Oklab
        } else {
            Self::Srgb
        }
    }

    /// Whether distances in this color space approximate perceived color differences.
    #[must_use]
    pub const fn is_perceptual(self) -> bool {
        matches!(self, Self::Lab | Self::Oklab)
    }

    /// Returns the expected component ranges for colors converted from in gamut sRGB.
    #[must_use]
    pub const fn f32_component_ranges_from_srgb(self) -> [(f32, f32); 3] {
        match self {
            Self::Srgb => Self::SRGB_F32_COMPONENT_RANGES,
            Self::Lab => Self::LAB_F32_COMPONENT_RANGES_FROM_SRGB,
            Self::Oklab => Self::OKLAB_F32_COMPONENT_RANGES_FROM_SRGB,
        }
    }

    /// Converts an sRGB color into the components of this color space.
    #[must_use]
    pub fn to_components(self, color: Srgb<f32>) -> [f32; 3] {
        match self {
            Self::Srgb => cast::into_array(color),
            Self::Lab => cast::into_array(from_srgb::<Lab>(color)),
            Self::Oklab => cast::into_array(from_srgb::<Oklab>(color)),
        }
    }

    /// Converts components of this color space back into an sRGB color.
    ///
    /// The result is not clamped and may lie outside of the sRGB gamut.
    #[must_use]
    pub fn from_components(self, components: [f32; 3]) -> Srgb<f32> {
        match self {
            Self::Srgb => cast::from_array(components),
            Self::Lab => to_srgb(cast::from_array::<Lab>(components)),
            Self::Oklab => to_srgb(cast::from_array::<Oklab>(components)),
        }
    }

    /// Like [`ColorSpace::from_components`], but clamps the result into the sRGB gamut.
    #[must_use]
    pub fn from_components_clamped(self, components: [f32; 3]) -> Srgb<f32> {
        self.from_components(components).clamp()
    }
}

/// Converts an sRGB color into another color space through linear sRGB.
pub(crate) fn from_srgb<To>(color: Srgb<f32>) -> To
where
    LinSrgb: IntoColorUnclamped<To>,
{
    let linear: LinSrgb = color.into_linear();
    linear.into_color_unclamped()
}

/// Converts a color back into sRGB through linear sRGB.
pub(crate) fn to_srgb<From>(color: From) -> Srgb<f32>
where
    From: IntoColorUnclamped<LinSrgb>,
{
    let linear: LinSrgb = color.into_color_unclamped();
    linear.into_encoding()
}
