//! Recomputes swatches when the active image changes.
//!
//! [`recompute`] is the pure computation: it runs the whole pipeline for one image of a list.
//! [`SwatchController`] owns the active index and the displayed swatches.
//! Every change of the active index hands out a [`Ticket`],
//! and a finished computation is only displayed if its ticket is still the latest one,
//! so results that arrive out of order never overwrite newer ones.

use crate::{Error, Image, InvalidInput, PaletteOptions, PalettePipeline, Result};

use std::collections::VecDeque;
#[cfg(feature = "threads")]
use std::sync::Arc;

use log::debug;
use palette::Srgba;
use parking_lot::Mutex;

/// Looks up `images[index]`.
fn get_image(images: &[Image], index: usize) -> Result<&Image> {
    images.get(index).ok_or_else(|| {
        Error::from(InvalidInput::IndexOutOfRange { index, len: images.len() })
    })
}

/// Computes the swatches for `images[index]`.
///
/// The output has exactly `options.get_palette_size()` colors and is the same for the same inputs.
///
/// # Errors
/// Returns [`InvalidInput::IndexOutOfRange`] if `index` is not a valid index into `images`,
/// or any error of [`PalettePipeline::palette`].
pub fn recompute(images: &[Image], index: usize, options: &PaletteOptions) -> Result<Vec<Srgba<f32>>> {
    let image = get_image(images, index)?;
    PalettePipeline::new(image).options(options.clone()).palette()
}

/// Like [`recompute`], but runs in parallel across multiple threads.
///
/// # Errors
/// See [`recompute`].
#[cfg(feature = "threads")]
pub fn recompute_par(
    images: &[Image],
    index: usize,
    options: &PaletteOptions,
) -> Result<Vec<Srgba<f32>>> {
    let image = get_image(images, index)?;
    PalettePipeline::new(image).options(options.clone()).palette_par()
}

/// Identifies one request to recompute the swatches.
///
/// Tickets are handed out by [`SwatchController::set_active`]
/// with strictly increasing generations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket {
    /// The generation of the request.
    generation: u64,
    /// The image index the request is for.
    index: usize,
}

impl Ticket {
    /// The generation of this ticket. Later requests have higher generations.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// The image index this ticket was issued for.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }
}

/// A bounded memo of computed swatches keyed by image index and options.
///
/// Entries only identify an image by its index, so a cache must not be shared between
/// different image lists. Call [`PaletteCache::clear`] when the list changes.
/// When full, the oldest entry is evicted first.
#[derive(Debug, Clone)]
pub struct PaletteCache {
    /// The maximum number of entries.
    capacity: usize,
    /// The entries from oldest to newest.
    entries: VecDeque<(usize, PaletteOptions, Vec<Srgba<f32>>)>,
}

impl PaletteCache {
    /// Creates an empty cache holding at most `capacity` palettes.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    /// Returns the swatches computed for `images[index]` with `options`, if present.
    #[must_use]
    pub fn get(&self, index: usize, options: &PaletteOptions) -> Option<&[Srgba<f32>]> {
        self.entries
            .iter()
            .find(|(i, o, _)| *i == index && o == options)
            .map(|(_, _, palette)| palette.as_slice())
    }

    /// Stores the swatches computed for `images[index]` with `options`.
    pub fn insert(&mut self, index: usize, options: &PaletteOptions, palette: Vec<Srgba<f32>>) {
        if self.capacity == 0 || self.get(index, options).is_some() {
            return;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back((index, options.clone(), palette));
    }

    /// The number of cached palettes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes every cached palette.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Everything guarded by the controller lock.
#[derive(Debug, Default)]
struct DisplayState {
    /// The most recently requested index.
    active: Option<usize>,
    /// The generation of the latest ticket.
    generation: u64,
    /// The index of the image whose result is on display.
    shown: Option<usize>,
    /// The swatches on display.
    palette: Vec<Srgba<f32>>,
    /// The error of the result on display.
    last_error: Option<Error>,
}

/// Owns the active image index and the swatches currently on display.
///
/// The controller can be shared between threads,
/// and computations for it may finish on any thread in any order.
///
/// # Examples
/// ```
/// # use swatchette::{Image, PaletteOptions, SwatchController};
/// # use palette::Srgba;
/// # fn main() -> Result<(), swatchette::Error> {
/// let images = [
///     Image::filled(4, 4, Srgba::new(0.9, 0.1, 0.1, 1.0))?,
///     Image::filled(4, 4, Srgba::new(0.1, 0.1, 0.9, 1.0))?,
/// ];
///
/// let controller = SwatchController::new(PaletteOptions::new().palette_size(4.into()));
/// assert!(controller.show(&images, 1));
/// assert_eq!(controller.shown_index(), Some(1));
/// assert_eq!(controller.palette().len(), 4);
///
/// // showing the same image again does nothing
/// assert!(!controller.show(&images, 1));
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct SwatchController {
    /// The options used for every computation.
    options: PaletteOptions,
    /// The active index and what is on display.
    state: Mutex<DisplayState>,
    /// Previously computed swatches, if enabled.
    cache: Option<Mutex<PaletteCache>>,
}

impl SwatchController {
    /// Creates a controller with no active image and no cache.
    #[must_use]
    pub fn new(options: PaletteOptions) -> Self {
        Self {
            options,
            state: Mutex::new(DisplayState::default()),
            cache: None,
        }
    }

    /// Enables memoization of up to `capacity` computed palettes.
    ///
    /// Cached palettes are looked up by index alone,
    /// so every call to [`SwatchController::show`] is expected to pass the same image list.
    /// Use [`SwatchController::clear_cache`] after replacing or reordering the images.
    #[must_use]
    pub fn with_cache(mut self, capacity: usize) -> Self {
        self.cache = Some(Mutex::new(PaletteCache::new(capacity)));
        self
    }

    /// The options used for every computation.
    #[must_use]
    pub fn options(&self) -> &PaletteOptions {
        &self.options
    }

    /// Makes `index` the active image index.
    ///
    /// Returns `None` if `index` already is the active index, since nothing needs to be recomputed.
    /// Otherwise, returns the [`Ticket`] that the computation for `index` must be completed with.
    /// Any ticket handed out before becomes stale.
    pub fn set_active(&self, index: usize) -> Option<Ticket> {
        let mut state = self.state.lock();
        if state.active == Some(index) {
            return None;
        }
        state.active = Some(index);
        state.generation += 1;
        Some(Ticket { generation: state.generation, index })
    }

    /// Displays the result of the computation for `ticket`.
    ///
    /// A successful result replaces the displayed swatches.
    /// An error clears them and is kept as [`SwatchController::last_error`].
    ///
    /// Returns `false` and drops the result if a newer ticket has been handed out since.
    pub fn complete(&self, ticket: Ticket, result: Result<Vec<Srgba<f32>>>) -> bool {
        let mut state = self.state.lock();
        if ticket.generation != state.generation {
            debug!(
                "dropping stale swatches for image {} (generation {} < {})",
                ticket.index, ticket.generation, state.generation,
            );
            return false;
        }

        match result {
            Ok(palette) => {
                state.palette = palette;
                state.last_error = None;
            }
            Err(error) => {
                debug!("no swatches for image {}: {error}", ticket.index);
                state.palette.clear();
                state.last_error = Some(error);
            }
        }
        state.shown = Some(ticket.index);
        true
    }

    /// Returns the cached swatches for `index`, if caching is enabled and they are present.
    fn cached(&self, index: usize) -> Option<Vec<Srgba<f32>>> {
        let cache = self.cache.as_ref()?.lock();
        let palette = cache.get(index, &self.options)?.to_vec();
        debug!("using cached swatches for image {index}");
        Some(palette)
    }

    /// Stores successful results in the cache, if enabled.
    fn remember(&self, index: usize, result: &Result<Vec<Srgba<f32>>>) {
        if let (Some(cache), Ok(palette)) = (&self.cache, result) {
            cache.lock().insert(index, &self.options, palette.clone());
        }
    }

    /// Makes `images[index]` active and displays its swatches, computing them on this thread.
    ///
    /// Returns whether the display was updated,
    /// which is `false` if `index` already was the active index.
    pub fn show(&self, images: &[Image], index: usize) -> bool {
        let Some(ticket) = self.set_active(index) else {
            return false;
        };

        let result = self.cached(index).map_or_else(
            || {
                let result = recompute(images, index, &self.options);
                self.remember(index, &result);
                result
            },
            Ok,
        );

        self.complete(ticket, result)
    }

    /// Makes `images[index]` active and computes its swatches in the background on the rayon thread pool.
    ///
    /// `on_complete` is called on the worker thread once the computation finishes,
    /// with whether the result was displayed (see [`SwatchController::complete`]).
    /// Returns the [`Ticket`] of the computation,
    /// or `None` if `index` already was the active index, in which case `on_complete` is never called.
    #[cfg(feature = "threads")]
    pub fn show_par<F>(
        self: &Arc<Self>,
        images: Arc<[Image]>,
        index: usize,
        on_complete: F,
    ) -> Option<Ticket>
    where
        F: FnOnce(bool) + Send + 'static,
    {
        let ticket = self.set_active(index)?;

        let controller = Arc::clone(self);
        rayon::spawn(move || {
            let result = controller.cached(index).map_or_else(
                || {
                    let result = recompute_par(&images, index, &controller.options);
                    controller.remember(index, &result);
                    result
                },
                Ok,
            );

            on_complete(controller.complete(ticket, result));
        });

        Some(ticket)
    }

    /// The swatches on display. This is empty if nothing is shown or the last computation failed.
    #[must_use]
    pub fn palette(&self) -> Vec<Srgba<f32>> {
        self.state.lock().palette.clone()
    }

    /// The error of the computation on display, if it failed.
    #[must_use]
    pub fn last_error(&self) -> Option<Error> {
        self.state.lock().last_error.clone()
    }

    /// The image index that the displayed swatches belong to.
    #[must_use]
    pub fn shown_index(&self) -> Option<usize> {
        self.state.lock().shown
    }

    /// The most recently requested image index.
    #[must_use]
    pub fn active_index(&self) -> Option<usize> {
        self.state.lock().active
    }

    /// Forgets every cached palette.
    ///
    /// Does nothing if caching is disabled. What is on display is left as is.
    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.lock().clear();
            debug!("cleared cached swatches");
        }
    }

    /// The number of palettes in the cache, or `None` if caching is disabled.
    #[must_use]
    pub fn cached_len(&self) -> Option<usize> {
        self.cache.as_ref().map(|cache| cache.lock().len())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::tests::*;
    use std::sync::Barrier;

    fn test_images() -> Vec<Image> {
        vec![
            Image::new(32, 32, test_data_1024()).unwrap(),
            Image::new(16, 16, test_data_256()).unwrap(),
            Image::filled(5, 5, Srgba::new(0.3, 0.5, 0.7, 1.0)).unwrap(),
        ]
    }

    fn options() -> PaletteOptions {
        PaletteOptions::new().palette_size(8.into())
    }

    #[test]
    fn recompute_matches_pipeline() {
        let images = test_images();
        let swatches = recompute(&images, 1, &options()).unwrap();
        let expected = PalettePipeline::new(&images[1]).options(options()).palette().unwrap();
        assert_eq!(swatches, expected);
        assert_eq!(swatches.len(), 8);
    }

    #[test]
    fn recompute_index_out_of_range() {
        let images = test_images();
        assert_eq!(
            recompute(&images, 3, &options()),
            Err(Error::InvalidInput(InvalidInput::IndexOutOfRange { index: 3, len: 3 }))
        );
    }

    #[test]
    fn unchanged_index_does_not_recompute() {
        let controller = SwatchController::new(options());
        let ticket = controller.set_active(2).unwrap();
        assert_eq!(ticket.index(), 2);
        assert_eq!(controller.set_active(2), None);

        let next = controller.set_active(0).unwrap();
        assert!(next.generation() > ticket.generation());
    }

    #[test]
    fn stale_results_are_dropped() {
        let images = test_images();
        let controller = SwatchController::new(options());

        let first = controller.set_active(0).unwrap();
        let second = controller.set_active(1).unwrap();
        let barrier = Barrier::new(2);

        // the newer computation finishes first
        std::thread::scope(|scope| {
            scope.spawn(|| {
                let result = recompute(&images, second.index(), controller.options());
                assert!(controller.complete(second, result));
                barrier.wait();
            });
            scope.spawn(|| {
                let result = recompute(&images, first.index(), controller.options());
                barrier.wait();
                assert!(!controller.complete(first, result));
            });
        });

        assert_eq!(controller.shown_index(), Some(1));
        assert_eq!(controller.palette(), recompute(&images, 1, &options()).unwrap());
    }

    #[test]
    fn stale_results_are_dropped_in_order_too() {
        let images = test_images();
        let controller = SwatchController::new(options());

        let first = controller.set_active(0).unwrap();
        let second = controller.set_active(2).unwrap();

        assert!(!controller.complete(first, recompute(&images, 0, controller.options())));
        assert_eq!(controller.shown_index(), None);
        assert!(controller.palette().is_empty());

        assert!(controller.complete(second, recompute(&images, 2, controller.options())));
        assert_eq!(controller.shown_index(), Some(2));
    }

    #[test]
    fn errors_clear_the_display() {
        let images = test_images();
        let controller = SwatchController::new(options());

        assert!(controller.show(&images, 0));
        assert_eq!(controller.palette().len(), 8);
        assert_eq!(controller.last_error(), None);

        assert!(controller.show(&images, 7));
        assert!(controller.palette().is_empty());
        assert_eq!(
            controller.last_error(),
            Some(Error::InvalidInput(InvalidInput::IndexOutOfRange { index: 7, len: 3 }))
        );

        assert!(controller.show(&images, 1));
        assert_eq!(controller.palette().len(), 8);
        assert_eq!(controller.last_error(), None);
    }

    #[test]
    fn cache_is_off_by_default() {
        let images = test_images();
        let controller = SwatchController::new(options());
        assert!(controller.show(&images, 0));
        assert_eq!(controller.cached_len(), None);
    }

    #[test]
    fn cache_hits_give_the_same_swatches() {
        let images = test_images();
        let controller = SwatchController::new(options()).with_cache(2);

        assert!(controller.show(&images, 0));
        let first = controller.palette();
        assert!(controller.show(&images, 1));
        assert!(controller.show(&images, 0));
        assert_eq!(controller.palette(), first);
        assert_eq!(controller.cached_len(), Some(2));

        // errors are not cached
        assert!(controller.show(&images, 9));
        assert_eq!(controller.cached_len(), Some(2));
    }

    #[test]
    fn cleared_cache_follows_a_new_image_list() {
        let first = test_images();
        let mut second = test_images();
        second.swap(0, 1);
        let controller = SwatchController::new(options()).with_cache(4);

        assert!(controller.show(&first, 0));
        assert_eq!(controller.palette(), recompute(&first, 0, &options()).unwrap());

        controller.clear_cache();
        assert_eq!(controller.cached_len(), Some(0));
        assert!(controller.show(&second, 2));
        assert!(controller.show(&second, 0));
        assert_eq!(controller.palette(), recompute(&second, 0, &options()).unwrap());
        assert_ne!(controller.palette(), recompute(&first, 0, &options()).unwrap());

        // a controller without a cache has nothing to clear
        let uncached = SwatchController::new(options());
        uncached.clear_cache();
        assert_eq!(uncached.cached_len(), None);
    }

    #[test]
    fn cache_evicts_oldest() {
        let mut cache = PaletteCache::new(2);
        let options = options();
        let swatch = vec![Srgba::new(0.0, 0.0, 0.0, 1.0)];

        cache.insert(0, &options, swatch.clone());
        cache.insert(1, &options, swatch.clone());
        cache.insert(2, &options, swatch.clone());

        assert_eq!(cache.len(), 2);
        assert!(cache.get(0, &options).is_none());
        assert!(cache.get(2, &options).is_some());
        assert!(cache.get(2, &options.clone().saturation(1.0)).is_none());

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    #[cfg(feature = "threads")]
    fn background_computation() {
        use std::sync::mpsc;

        let images: Arc<[Image]> = test_images().into();
        let controller = Arc::new(SwatchController::new(options()));
        let (sender, receiver) = mpsc::channel();

        let first = {
            let sender = sender.clone();
            controller.show_par(Arc::clone(&images), 0, move |shown| sender.send((0, shown)).unwrap())
        };
        let latest =
            controller.show_par(Arc::clone(&images), 1, move |shown| sender.send((1, shown)).unwrap());
        assert!(first.is_some() && latest.is_some());
        assert_eq!(
            controller.show_par(Arc::clone(&images), 1, |_| unreachable!()),
            None
        );

        // the first computation may or may not finish before the second ticket is handed out
        let mut results = receiver.iter().take(2).collect::<Vec<_>>();
        results.sort_unstable();
        assert_eq!(results[0].0, 0);
        assert_eq!(results[1], (1, true));
        assert_eq!(controller.shown_index(), Some(1));
        assert_eq!(controller.palette(), recompute(&images, 1, &options()).unwrap());
    }
}
