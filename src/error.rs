//! Contains the error types returned by the clustering and sampling stages.

use thiserror::Error;

/// The reasons an input can be rejected by one of the stages.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidInput {
    /// The image has no pixels.
    #[error("the image has no pixels")]
    EmptyImage,

    /// The image has more pixels than [`MAX_PIXELS`](crate::MAX_PIXELS).
    #[error("the image has {0} pixels, above the maximum of {max}", max = crate::MAX_PIXELS)]
    TooManyPixels(u64),

    /// A palette size of `0` was provided.
    #[error("the palette size must be greater than zero")]
    ZeroPaletteSize,

    /// `0` clustering passes were requested.
    #[error("the number of passes must be greater than zero")]
    ZeroPasses,

    /// More seed means than clusters were provided.
    #[error("{given} seed means were provided for {k} clusters")]
    TooManySeedMeans {
        /// The number of seed means provided.
        given: usize,
        /// The number of clusters.
        k: u16,
    },

    /// A pixel or seed mean has a NaN or infinite component.
    #[error("encountered a color with a non-finite component")]
    NonFiniteColor,

    /// The number of pixels does not match the image dimensions.
    #[error("{pixels} pixels do not fill a {width}x{height} image")]
    DimensionMismatch {
        /// The number of pixels provided.
        pixels: usize,
        /// The image width.
        width: u32,
        /// The image height.
        height: u32,
    },

    /// The extent is not fully contained in the image.
    #[error("the extent {extent:?} is outside the {width}x{height} image")]
    ExtentOutOfBounds {
        /// The requested extent.
        extent: crate::Extent,
        /// The image width.
        width: u32,
        /// The image height.
        height: u32,
    },

    /// The extent covers no pixels.
    #[error("the extent covers no pixels")]
    EmptyExtent,

    /// The label image does not have one column per cluster.
    #[error("expected a label image of width {expected}, got {actual}")]
    WidthMismatch {
        /// The palette size.
        expected: u16,
        /// The actual image width.
        actual: u32,
    },

    /// The saturation factor is negative or not finite.
    #[error("the saturation factor {0} must be finite and non-negative")]
    InvalidSaturation(f32),

    /// The active index is outside of the provided images.
    #[error("index {index} is out of range for {len} images")]
    IndexOutOfRange {
        /// The requested index.
        index: usize,
        /// The number of images.
        len: usize,
    },
}

/// The error type for this crate.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// The geometry, counts, or factors given to a stage were malformed.
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInput),

    /// The numeric pipeline could not produce an output.
    #[error("computation failure: {0}")]
    ComputationFailure(String),
}

/// A specialized [`Result`](std::result::Result) type for this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;
