use crate::{ColorCounts, ColorSpace, Error, Result};

use bitvec::vec::BitVec;
use log::trace;
use palette::Srgba;
use rand::{prelude::Distribution, SeedableRng};
use rand_distr::{weighted_alias::WeightedAliasIndex, Uniform};
use rand_xoshiro::Xoroshiro128PlusPlus;

/// The number of random draws allowed per missing centroid before
/// falling back to picking the remaining unused colors in order.
const DRAWS_PER_CENTROID: usize = 32;

/// Computes the initial centroids and their alphas.
///
/// The seed means come first, converted into the color space of `color_counts`.
/// The remaining `k - seed_means.len()` centroids are sampled from the colors in `color_counts`,
/// weighted by their counts, using a random number generator seeded with `seed`.
/// Distinct colors are preferred; colors are only repeated once every color has been used.
pub(crate) fn initial_centroids(
    color_counts: &impl ColorCounts,
    k: usize,
    seed_means: &[Srgba<f32>],
    seed: u64,
) -> Result<(Vec<[f32; 3]>, Vec<f32>)> {
    let colorspace: ColorSpace = color_counts.colorspace();

    let mut centroids = Vec::with_capacity(k);
    let mut alphas = Vec::with_capacity(k);
    for mean in seed_means {
        centroids.push(colorspace.to_components(mean.color));
        alphas.push(mean.alpha);
    }

    let missing = k.saturating_sub(seed_means.len());
    if missing == 0 {
        return Ok((centroids, alphas));
    }

    let indices = if let Some(counts) = color_counts.counts() {
        let weights = counts.iter().copied().map(u64::from).collect();
        let distribution = WeightedAliasIndex::new(weights)
            .map_err(|e| Error::ComputationFailure(format!("cannot sample colors: {e}")))?;
        sample_indices(color_counts.len(), missing, seed, &distribution)
    } else {
        let distribution = Uniform::new(0, color_counts.len());
        sample_indices(color_counts.len(), missing, seed, &distribution)
    };

    trace!("sampled initial colors {indices:?}");

    let components = color_counts.components();
    let color_alphas = color_counts.alphas();
    for i in indices {
        centroids.push(components[i]);
        alphas.push(color_alphas[i]);
    }

    Ok((centroids, alphas))
}

/// Draws `n` indices into `0..len` from `distribution`.
///
/// Indices are unique as long as `n <= len`.
fn sample_indices(
    len: usize,
    n: usize,
    seed: u64,
    distribution: &impl Distribution<usize>,
) -> Vec<usize> {
    let rng = &mut Xoroshiro128PlusPlus::seed_from_u64(seed);

    let distinct = n.min(len);
    let mut used: BitVec = BitVec::repeat(false, len);
    let mut indices = Vec::with_capacity(n);

    let mut draws = 0;
    while indices.len() < distinct && draws < distinct * DRAWS_PER_CENTROID {
        let i = distribution.sample(rng);
        if !used[i] {
            used.set(i, true);
            indices.push(i);
        }
        draws += 1;
    }

    if indices.len() < distinct {
        let remaining = distinct - indices.len();
        indices.extend(used.iter_zeros().take(remaining));
    }

    let repeats = n - indices.len();
    indices.extend((0..repeats).map(|_| distribution.sample(rng)));

    indices
}
