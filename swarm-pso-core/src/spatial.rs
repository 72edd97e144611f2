//! Spatial index for neighborhood topologies
//!
//! A k-d tree over the rows of a position matrix answering k-nearest-neighbor
//! queries under a Minkowski metric.
//!
//! ## Design
//!
//! - **Built once per iteration**: positions change every step, so the tree is
//!   rebuilt from scratch and then queried for every particle
//! - **Runtime dimensionality**: the search-space dimension is only known from
//!   the swarm, so the tree is sized when it is built
//! - **Metric-generic queries**: [`Metric`] works on reduced distances (no
//!   square root for Euclidean), converted back only in the results
//! - **Deterministic ties**: equal distances are ordered by particle index

use std::fmt;

use kdtree::{ErrorKind, KdTree};
use ndarray::{Array2, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A distance function usable for k-d tree search
pub trait Metric: Send + Sync {
    /// Distance between two points in reduced (monotone) form
    fn reduced_distance(a: &[f64], b: &[f64]) -> f64;

    /// Convert a reduced distance back to the true distance
    fn from_reduced(reduced: f64) -> f64;
}

/// L1 (sum of absolute differences) distance
#[derive(Debug, Clone, Copy, Default)]
pub struct Manhattan;

impl Metric for Manhattan {
    fn reduced_distance(a: &[f64], b: &[f64]) -> f64 {
        a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum()
    }

    fn from_reduced(reduced: f64) -> f64 {
        reduced
    }
}

/// L2 distance, compared in squared form
#[derive(Debug, Clone, Copy, Default)]
pub struct Euclidean;

impl Metric for Euclidean {
    fn reduced_distance(a: &[f64], b: &[f64]) -> f64 {
        kdtree::distance::squared_euclidean(a, b)
    }

    fn from_reduced(reduced: f64) -> f64 {
        reduced.sqrt()
    }
}

/// Supported Minkowski orders
///
/// Serialized as the integer `p` (1 or 2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum MinkowskiOrder {
    /// p = 1
    Manhattan,
    /// p = 2
    #[default]
    Euclidean,
}

impl MinkowskiOrder {
    /// The `p` of the norm
    pub const fn p(self) -> u8 {
        match self {
            MinkowskiOrder::Manhattan => 1,
            MinkowskiOrder::Euclidean => 2,
        }
    }
}

impl TryFrom<u8> for MinkowskiOrder {
    type Error = Error;

    fn try_from(p: u8) -> Result<Self> {
        match p {
            1 => Ok(MinkowskiOrder::Manhattan),
            2 => Ok(MinkowskiOrder::Euclidean),
            other => Err(Error::configuration(format!(
                "unsupported Minkowski order p = {other}, expected 1 or 2"
            ))),
        }
    }
}

impl From<MinkowskiOrder> for u8 {
    fn from(order: MinkowskiOrder) -> Self {
        order.p()
    }
}

/// One query result
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Row of the point in the indexed matrix
    pub index: usize,
    /// True distance from the query point
    pub distance: f64,
}

/// k-d tree over the rows of a position matrix
pub struct SpatialIndex {
    points: Array2<f64>,
    tree: KdTree<f64, usize, Vec<f64>>,
}

impl fmt::Debug for SpatialIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpatialIndex")
            .field("points", &self.len())
            .field("dimensions", &self.dimensions())
            .finish()
    }
}

impl SpatialIndex {
    /// Build an index over `points` (one point per row).
    ///
    /// Fails if there are no points or any coordinate is not finite.
    pub fn new(points: ArrayView2<'_, f64>) -> Result<Self> {
        if points.nrows() == 0 || points.ncols() == 0 {
            return Err(Error::MalformedState("cannot index an empty position matrix"));
        }

        let mut tree = KdTree::new(points.ncols());
        for (index, row) in points.rows().into_iter().enumerate() {
            tree.add(row.to_vec(), index).map_err(tree_error)?;
        }

        tracing::debug!(
            points = points.nrows(),
            dimensions = points.ncols(),
            "spatial index built"
        );
        Ok(Self {
            points: points.to_owned(),
            tree,
        })
    }

    /// Number of indexed points
    pub fn len(&self) -> usize {
        self.points.nrows()
    }

    /// Whether the index holds no points; construction rejects that case
    pub fn is_empty(&self) -> bool {
        self.points.nrows() == 0
    }

    /// Dimensionality of the indexed points
    pub fn dimensions(&self) -> usize {
        self.points.ncols()
    }

    /// The `k` nearest indexed points to `point`, nearest first.
    ///
    /// Returns fewer than `k` results only when the index holds fewer points.
    pub fn nearest<M: Metric>(
        &self,
        point: ArrayView1<'_, f64>,
        k: usize,
    ) -> Result<Vec<Neighbor>> {
        if point.len() != self.dimensions() {
            return Err(Error::shape("query point", &[self.dimensions()], point.shape()));
        }
        let k = k.min(self.len());
        if k == 0 {
            return Ok(Vec::new());
        }

        let query = point.to_vec();
        let distance = |a: &[f64], b: &[f64]| M::reduced_distance(a, b);
        let mut found: Vec<(f64, usize)> = Vec::with_capacity(k);
        let ranked = self
            .tree
            .iter_nearest(&query, &distance)
            .map_err(tree_error)?;
        for (reduced, &index) in ranked {
            // Keep every point tied with the k-th distance so ties resolve by index.
            if found.len() >= k && found.last().map_or(true, |&(last, _)| reduced > last) {
                break;
            }
            found.push((reduced, index));
        }
        found.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        found.truncate(k);

        Ok(found
            .into_iter()
            .map(|(reduced, index)| Neighbor {
                index,
                distance: M::from_reduced(reduced),
            })
            .collect())
    }

    /// [`nearest`](Self::nearest) with the metric chosen at runtime
    pub fn nearest_with(
        &self,
        point: ArrayView1<'_, f64>,
        k: usize,
        order: MinkowskiOrder,
    ) -> Result<Vec<Neighbor>> {
        match order {
            MinkowskiOrder::Manhattan => self.nearest::<Manhattan>(point, k),
            MinkowskiOrder::Euclidean => self.nearest::<Euclidean>(point, k),
        }
    }

    /// Query every indexed point against the index.
    ///
    /// Row `i` of the result lists the indices of the `k` points nearest to
    /// point `i`, nearest first. `k` must be between 1 and [`len`](Self::len).
    pub fn neighbors_of_all(&self, k: usize, order: MinkowskiOrder) -> Result<Array2<usize>> {
        let n = self.len();
        if k == 0 || k > n {
            return Err(Error::configuration(format!(
                "neighbor count k = {k} must be between 1 and {n}"
            )));
        }

        let mut out = Array2::zeros((n, k));
        for (i, mut row) in out.rows_mut().into_iter().enumerate() {
            let found = self.nearest_with(self.points.row(i), k, order)?;
            for (slot, neighbor) in row.iter_mut().zip(&found) {
                *slot = neighbor.index;
            }
        }
        Ok(out)
    }
}

fn tree_error(err: ErrorKind) -> Error {
    match err {
        ErrorKind::NonFiniteCoordinate => {
            Error::MalformedState("positions must be finite for neighbor queries")
        }
        ErrorKind::WrongDimension => Error::MalformedState("point has the wrong dimension"),
        ErrorKind::ZeroCapacity => Error::MalformedState("spatial index has zero capacity"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn brute_force<M: Metric>(
        points: &Array2<f64>,
        point: ArrayView1<'_, f64>,
        k: usize,
    ) -> Vec<usize> {
        let query = point.to_vec();
        let mut all: Vec<(f64, usize)> = points
            .rows()
            .into_iter()
            .enumerate()
            .map(|(index, row)| (M::reduced_distance(&row.to_vec(), &query), index))
            .collect();
        all.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        all.into_iter().take(k).map(|(_, index)| index).collect()
    }

    fn random_points(seed: u64, n: usize, d: usize) -> Array2<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        Array2::from_shape_simple_fn((n, d), || rng.gen_range(-10.0..10.0))
    }

    fn indices(found: Vec<Neighbor>) -> Vec<usize> {
        found.iter().map(|n| n.index).collect()
    }

    #[test]
    fn matches_brute_force_for_both_metrics() {
        let points = random_points(7, 200, 3);
        let index = SpatialIndex::new(points.view()).unwrap();

        for k in [1, 2, 5, 17, 200] {
            for i in (0..200).step_by(13) {
                let q = points.row(i);
                let l1 = indices(index.nearest::<Manhattan>(q, k).unwrap());
                let l2 = indices(index.nearest::<Euclidean>(q, k).unwrap());
                assert_eq!(l1, brute_force::<Manhattan>(&points, q, k));
                assert_eq!(l2, brute_force::<Euclidean>(&points, q, k));
            }
        }
    }

    #[test]
    fn self_is_nearest_at_distance_zero() {
        let points = random_points(11, 40, 2);
        let index = SpatialIndex::new(points.view()).unwrap();
        let all = index.neighbors_of_all(3, MinkowskiOrder::Euclidean).unwrap();

        for i in 0..40 {
            assert_eq!(all[[i, 0]], i);
        }
        let first = index.nearest::<Euclidean>(points.row(5), 1).unwrap();
        assert_eq!(first[0].distance, 0.0);
    }

    #[test]
    fn distances_are_true_norms() {
        let points = array![[0.0, 0.0], [3.0, 4.0]];
        let index = SpatialIndex::new(points.view()).unwrap();

        let l2 = index.nearest::<Euclidean>(points.row(0), 2).unwrap();
        assert_eq!(l2[1], Neighbor { index: 1, distance: 5.0 });

        let l1 = index.nearest::<Manhattan>(points.row(0), 2).unwrap();
        assert_eq!(l1[1], Neighbor { index: 1, distance: 7.0 });
    }

    #[test]
    fn duplicate_points_order_by_index() {
        let points = Array2::from_elem((20, 2), 1.5);
        let index = SpatialIndex::new(points.view()).unwrap();
        let found = indices(index.nearest::<Manhattan>(points.row(12), 4).unwrap());
        assert_eq!(found, vec![0, 1, 2, 3]);
    }

    #[test]
    fn oversized_k_returns_every_point() {
        let points = array![[0.0, 0.0], [1.0, 0.0], [5.0, 5.0]];
        let index = SpatialIndex::new(points.view()).unwrap();

        for k in [4, 1 << 60, usize::MAX] {
            let found = indices(index.nearest::<Euclidean>(points.row(0), k).unwrap());
            assert_eq!(found, vec![0, 1, 2]);
        }
        assert!(index.nearest::<Manhattan>(points.row(0), 0).unwrap().is_empty());
    }

    #[test]
    fn rejects_invalid_queries() {
        let points = random_points(3, 10, 2);
        let index = SpatialIndex::new(points.view()).unwrap();

        assert!(matches!(
            index.neighbors_of_all(0, MinkowskiOrder::Manhattan),
            Err(Error::Configuration(_))
        ));
        assert!(matches!(
            index.neighbors_of_all(11, MinkowskiOrder::Manhattan),
            Err(Error::Configuration(_))
        ));
        assert!(matches!(
            index.nearest::<Euclidean>(array![1.0].view(), 1),
            Err(Error::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn rejects_non_finite_positions() {
        let points = array![[0.0, f64::NAN], [1.0, 1.0]];
        assert!(matches!(
            SpatialIndex::new(points.view()),
            Err(Error::MalformedState(_))
        ));
    }

    #[test]
    fn minkowski_order_from_p() {
        assert_eq!(MinkowskiOrder::try_from(1).unwrap(), MinkowskiOrder::Manhattan);
        assert_eq!(MinkowskiOrder::try_from(2).unwrap(), MinkowskiOrder::Euclidean);
        assert!(MinkowskiOrder::try_from(3).is_err());
        assert_eq!(serde_json::to_string(&MinkowskiOrder::Manhattan).unwrap(), "1");
        assert!(serde_json::from_str::<MinkowskiOrder>("0").is_err());
    }
}
