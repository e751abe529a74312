use crate::ColorCounts;

use std::array;

use log::{debug, trace};
use wide::{f32x8, CmpLt};

#[cfg(feature = "threads")]
use rayon::prelude::*;

/// The number of points each assignment task works on.
///
/// Partial sums are always reduced in chunk order,
/// so the single and multi-threaded passes produce identical results.
const CHUNK: usize = 4096;

/// Marks a point that has not been assigned to any cluster yet.
const UNASSIGNED: u16 = u16::MAX;

/// Finds the nearest point to `query`, returning its chunk and lane.
///
/// Ties go to the point with the lowest index, where point `chunk * 8 + lane`
/// is stored in `points[chunk]` at `lane`.
#[inline]
#[allow(clippy::float_cmp)]
pub(crate) fn simd_argmin<const N: usize>(points: &[[f32x8; N]], query: [f32; N]) -> (u8, u8) {
    let incr = f32x8::ONE;
    let mut cur_chunk = f32x8::ZERO;
    let mut min_chunk = cur_chunk;
    let mut min_distance = f32x8::splat(f32::INFINITY);

    let query = query.map(f32x8::splat);

    for chunk in points {
        let distance = array::from_fn::<_, N, _>(|i| {
            let diff = query[i] - chunk[i];
            diff * diff
        })
        .into_iter()
        .fold(f32x8::ZERO, |a, b| a + b);

        let mask = distance.cmp_lt(min_distance);
        min_chunk = mask.blend(cur_chunk, min_chunk);
        min_distance = min_distance.fast_min(distance);
        cur_chunk += incr;
    }

    let mut min_chunk_lane = (0, 0);
    let mut min_index = usize::MAX;
    let mut min_dist = f32::INFINITY;
    for (lane, (&v, &chunk)) in min_distance
        .as_array_ref()
        .iter()
        .zip(min_chunk.as_array_ref())
        .enumerate()
    {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let chunk = chunk as usize;
        let index = chunk * 8 + lane;
        if v < min_dist || (v == min_dist && index < min_index) {
            min_dist = v;
            min_index = index;
            min_chunk_lane = (chunk, lane);
        }
    }

    let (chunk, lane) = min_chunk_lane;
    #[allow(clippy::cast_possible_truncation)]
    {
        (chunk as u8, lane as u8)
    }
}

#[inline]
pub(crate) fn squared_euclidean_distance<const N: usize>(x: [f32; N], y: [f32; N]) -> f32 {
    let mut dist = 0.0;
    for c in 0..N {
        let d = x[c] - y[c];
        dist += d * d;
    }
    dist
}

/// Transposes centroids into chunks of 8 for [`simd_argmin`],
/// padding the last chunk with infinitely distant centroids.
fn simd_components(centroids: &[[f32; 3]]) -> Vec<[f32x8; 3]> {
    let mut components = Vec::with_capacity(centroids.len().div_ceil(8));
    let chunks = centroids.chunks_exact(8);
    components.extend(
        chunks
            .clone()
            .map(|chunk| array::from_fn(|i| f32x8::new(array::from_fn(|j| chunk[j][i])))),
    );

    if !chunks.remainder().is_empty() {
        let mut arr = [[f32::INFINITY; 8]; 3];
        for (i, color) in chunks.remainder().iter().enumerate() {
            for (arr, &c) in arr.iter_mut().zip(color) {
                arr[i] = c;
            }
        }
        components.push(arr.map(f32x8::new));
    }

    components
}

/// The running totals for one cluster during an assignment pass.
#[derive(Debug, Clone, Copy, Default)]
struct Accumulator {
    /// The weighted sum of each component.
    components: [f64; 3],
    /// The weighted sum of alpha.
    alpha: f64,
    /// The number of pixels assigned.
    count: u64,
}

impl Accumulator {
    fn add(&mut self, components: [f32; 3], alpha: f32, weight: u32) {
        let w = f64::from(weight);
        for (sum, c) in self.components.iter_mut().zip(components) {
            *sum += w * f64::from(c);
        }
        self.alpha += w * f64::from(alpha);
        self.count += u64::from(weight);
    }

    fn merge(&mut self, other: &Self) {
        for (sum, c) in self.components.iter_mut().zip(other.components) {
            *sum += c;
        }
        self.alpha += other.alpha;
        self.count += other.count;
    }
}

/// The result of assigning one chunk of points.
#[derive(Debug, Clone)]
struct Partial {
    /// The number of points whose cluster changed.
    changed: usize,
    /// The weighted sum of squared distances to the assigned centroids.
    distortion: f64,
    /// The totals for each cluster.
    clusters: Vec<Accumulator>,
}

impl Partial {
    fn merge(mut self, other: &Self) -> Self {
        self.changed += other.changed;
        self.distortion += other.distortion;
        for (a, b) in self.clusters.iter_mut().zip(&other.clusters) {
            a.merge(b);
        }
        self
    }
}

/// The outcome of running [`State::run`].
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Summary {
    /// The final centroids in the clustering color space.
    pub(crate) centroids: Vec<[f32; 3]>,
    /// The mean alpha of each cluster.
    pub(crate) alphas: Vec<f32>,
    /// The number of pixels assigned to each cluster in the last pass.
    pub(crate) counts: Vec<u64>,
    /// The distortion measured by each pass.
    pub(crate) distortion: Vec<f64>,
    /// Whether the assignments stopped changing before running out of passes.
    pub(crate) converged: bool,
}

/// The private state of one k-means computation.
pub(crate) struct State<'a, Counts: ColorCounts> {
    /// The points to cluster.
    color_counts: &'a Counts,
    /// The current centroids.
    centroids: Vec<[f32; 3]>,
    /// The alpha carried by each centroid.
    alphas: Vec<f32>,
    /// `centroids` laid out for [`simd_argmin`].
    components: Vec<[f32x8; 3]>,
    /// The cluster of each point, or [`UNASSIGNED`].
    assignments: Vec<u16>,
    /// The number of pixels assigned to each cluster in the last pass.
    counts: Vec<u64>,
}

impl<'a, Counts: ColorCounts> State<'a, Counts> {
    pub(crate) fn new(color_counts: &'a Counts, centroids: Vec<[f32; 3]>, alphas: Vec<f32>) -> Self {
        Self {
            color_counts,
            components: simd_components(&centroids),
            counts: vec![0; centroids.len()],
            assignments: vec![UNASSIGNED; color_counts.len()],
            centroids,
            alphas,
        }
    }

    /// Assigns the points in `range` (a chunk starting at `offset`) to their nearest centroid.
    fn assign_chunk(&self, offset: usize, assignments: &mut [u16]) -> Partial {
        let Self { color_counts, centroids, components, .. } = self;

        let end = offset + assignments.len();
        let points = &color_counts.components()[offset..end];
        let alphas = &color_counts.alphas()[offset..end];
        let weights = color_counts.counts().map(|counts| &counts[offset..end]);

        let mut partial = Partial {
            changed: 0,
            distortion: 0.0,
            clusters: vec![Accumulator::default(); centroids.len()],
        };

        for (i, ((&point, &alpha), assignment)) in
            points.iter().zip(alphas).zip(assignments).enumerate()
        {
            let (chunk, lane) = simd_argmin(components, point);
            let nearest = usize::from(chunk) * 8 + usize::from(lane);
            let weight = weights.map_or(1, |w| w[i]);

            #[allow(clippy::cast_possible_truncation)]
            let nearest_u16 = nearest as u16;
            if *assignment != nearest_u16 {
                *assignment = nearest_u16;
                partial.changed += 1;
            }

            let distance = squared_euclidean_distance(point, centroids[nearest]);
            partial.distortion += f64::from(weight) * f64::from(distance);
            partial.clusters[nearest].add(point, alpha, weight);
        }

        partial
    }

    /// Reduces the per chunk results in chunk order.
    fn reduce(&self, partials: &[Partial]) -> Partial {
        let empty = Partial {
            changed: 0,
            distortion: 0.0,
            clusters: vec![Accumulator::default(); self.centroids.len()],
        };
        partials.iter().fold(empty, Partial::merge)
    }

    fn assign(&mut self) -> Partial {
        let mut assignments = std::mem::take(&mut self.assignments);
        let partials = assignments
            .chunks_mut(CHUNK)
            .enumerate()
            .map(|(i, chunk)| self.assign_chunk(i * CHUNK, chunk))
            .collect::<Vec<_>>();
        self.assignments = assignments;
        self.reduce(&partials)
    }

    /// Moves every centroid to the mean of its cluster.
    ///
    /// Clusters without any pixels keep their previous centroid and alpha.
    fn update(&mut self, totals: &Partial) {
        let mut empty = 0;
        for ((centroid, alpha), (total, count)) in self
            .centroids
            .iter_mut()
            .zip(&mut self.alphas)
            .zip(totals.clusters.iter().zip(&mut self.counts))
        {
            *count = total.count;
            if total.count == 0 {
                empty += 1;
                continue;
            }

            #[allow(clippy::cast_precision_loss)]
            let n = total.count as f64;

            #[allow(clippy::cast_possible_truncation)]
            {
                *centroid = total.components.map(|c| (c / n) as f32);
                *alpha = (total.alpha / n) as f32;
            }
        }

        if empty > 0 {
            debug!("{empty} empty clusters kept their previous centroid");
        }

        self.components = simd_components(&self.centroids);
    }

    fn run_with(mut self, passes: u32, assign: impl Fn(&mut Self) -> Partial) -> Summary {
        let mut distortion = Vec::with_capacity(passes as usize);
        let mut converged = false;

        for pass in 0..passes {
            let totals = assign(&mut self);
            trace!(
                "pass {pass}: {} changed assignments, distortion {}",
                totals.changed,
                totals.distortion
            );

            distortion.push(totals.distortion);

            if totals.changed == 0 {
                for (count, total) in self.counts.iter_mut().zip(&totals.clusters) {
                    *count = total.count;
                }
                converged = true;
                break;
            }

            self.update(&totals);
        }

        debug!(
            "k-means over {} colors ran {} passes (converged: {converged})",
            self.color_counts.len(),
            distortion.len()
        );

        let Self { centroids, alphas, counts, .. } = self;
        Summary {
            centroids,
            alphas,
            counts,
            distortion,
            converged,
        }
    }

    /// Runs up to `passes` Lloyd iterations, stopping early once no assignment changes.
    pub(crate) fn run(self, passes: u32) -> Summary {
        self.run_with(passes, Self::assign)
    }
}

#[cfg(feature = "threads")]
impl<'a, Counts: ColorCounts + Sync> State<'a, Counts> {
    fn assign_par(&mut self) -> Partial {
        let mut assignments = std::mem::take(&mut self.assignments);
        let partials = assignments
            .par_chunks_mut(CHUNK)
            .enumerate()
            .map(|(i, chunk)| self.assign_chunk(i * CHUNK, chunk))
            .collect::<Vec<_>>();
        self.assignments = assignments;
        self.reduce(&partials)
    }

    /// Like [`State::run`], but assigns points to clusters in parallel.
    pub(crate) fn run_par(self, passes: u32) -> Summary {
        self.run_with(passes, Self::assign_par)
    }
}
