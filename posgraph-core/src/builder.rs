//! Construction of complete, fully labelled base graphs.
//!
//! Exposes the position range configuration and the builder that draws node
//! positions and labels every ordered pair of distinct nodes.

use rand::Rng;
use tracing::{debug, instrument};

use crate::{
    error::ValidationError,
    geometry::{Position, classify},
    graph::{Edge, Graph, NodeId},
};

/// Closed interval that node coordinates are drawn from.
///
/// # Examples
/// ```
/// use posgraph_core::PositionRange;
///
/// let range = PositionRange::new(-100.0, 100.0).expect("range is valid");
/// assert_eq!(range.min(), -100.0);
/// assert!(PositionRange::new(1.0, 0.0).is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PositionRange {
    min: f64,
    max: f64,
}

impl PositionRange {
    /// The unit interval `[0, 1]`.
    pub const UNIT: Self = Self { min: 0.0, max: 1.0 };

    /// Validates and constructs a range.
    ///
    /// # Errors
    /// Returns [`ValidationError::InvalidPositionRange`] when either bound is
    /// not finite, `min > max`, or the interval is too wide to sample from.
    #[expect(
        clippy::float_arithmetic,
        reason = "uniform sampling scales the interval width"
    )]
    pub fn new(min: f64, max: f64) -> Result<Self, ValidationError> {
        // Inclusive float sampling divides the width by `1 - EPSILON`.
        let scale = (max - min) / (1.0 - f64::EPSILON);
        if !min.is_finite() || !max.is_finite() || min > max || !scale.is_finite() {
            return Err(ValidationError::InvalidPositionRange { min, max });
        }
        Ok(Self { min, max })
    }

    /// Returns the lower bound.
    #[must_use]
    pub const fn min(&self) -> f64 {
        self.min
    }

    /// Returns the upper bound.
    #[must_use]
    pub const fn max(&self) -> f64 {
        self.max
    }

    fn sample<R: Rng>(&self, rng: &mut R) -> f64 {
        rng.gen_range(self.min..=self.max)
    }
}

impl Default for PositionRange {
    fn default() -> Self {
        Self::UNIT
    }
}

/// Builds complete directed graphs with random positions.
///
/// # Examples
/// ```
/// use posgraph_core::GraphBuilder;
/// use rand::{SeedableRng, rngs::SmallRng};
///
/// let mut rng = SmallRng::seed_from_u64(7);
/// let graph = GraphBuilder::new(4).build(&mut rng).expect("4 nodes is valid");
/// assert_eq!(graph.edge_count(), 12);
/// ```
#[derive(Clone, Debug)]
pub struct GraphBuilder {
    node_count: u32,
    position_range: PositionRange,
}

impl GraphBuilder {
    /// Creates a builder for `node_count` nodes positioned in `[0, 1]`.
    #[must_use]
    pub const fn new(node_count: u32) -> Self {
        Self {
            node_count,
            position_range: PositionRange::UNIT,
        }
    }

    /// Overrides the interval node coordinates are drawn from.
    #[must_use]
    pub const fn with_position_range(mut self, range: PositionRange) -> Self {
        self.position_range = range;
        self
    }

    /// Returns the configured node count.
    #[must_use]
    pub const fn node_count(&self) -> u32 {
        self.node_count
    }

    /// Returns the configured position range.
    #[must_use]
    pub const fn position_range(&self) -> PositionRange {
        self.position_range
    }

    /// Draws positions and builds the complete digraph.
    ///
    /// Each node receives `(x, y)` with both coordinates drawn independently
    /// from the position range. Every edge is labelled with [`classify`] from
    /// the freshly drawn positions.
    ///
    /// # Errors
    /// Returns [`ValidationError::EdgeCountOverflow`] when the complete digraph
    /// cannot be represented.
    #[instrument(
        name = "graph.build",
        skip(self, rng),
        fields(node_count = self.node_count),
    )]
    pub fn build<R: Rng>(&self, rng: &mut R) -> Result<Graph, ValidationError> {
        let edge_count = complete_edge_count(self.node_count)?;

        let coords: Vec<(f64, f64)> = (0..self.node_count)
            .map(|_| {
                let x = self.position_range.sample(rng);
                let y = self.position_range.sample(rng);
                (x, y)
            })
            .collect();

        let mut edges = Vec::with_capacity(edge_count);
        for (source, from) in (0_u32..).zip(&coords) {
            for (target, to) in (0_u32..).zip(&coords) {
                if source == target {
                    continue;
                }
                edges.push(Edge {
                    source: NodeId::new(source),
                    target: NodeId::new(target),
                    direction: classify(*from, *to),
                });
            }
        }

        let positions = coords
            .into_iter()
            .map(|(x, y)| Position::Present(x, y))
            .collect();
        debug!(edges = edges.len(), "built complete graph");
        Ok(Graph::from_trusted_parts(positions, edges))
    }
}

/// Returns `n * (n - 1)`, the edge count of a complete digraph without loops.
fn complete_edge_count(node_count: u32) -> Result<usize, ValidationError> {
    let overflow = ValidationError::EdgeCountOverflow { node_count };
    let nodes = usize::try_from(node_count).map_err(|_| overflow.clone())?;
    nodes
        .checked_mul(nodes.saturating_sub(1))
        .ok_or(overflow)
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::{SeedableRng, rngs::SmallRng};
    use rstest::rstest;

    fn is_complete(graph: &Graph) -> bool {
        let nodes = graph.node_count();
        graph.edge_count() == nodes * nodes.saturating_sub(1)
            && graph
                .edges()
                .iter()
                .all(|edge| edge.source != edge.target && edge.direction.is_labeled())
    }

    #[rstest]
    #[case::empty(0, 0)]
    #[case::single(1, 0)]
    #[case::pair(2, 2)]
    #[case::default_size(10, 90)]
    fn build_produces_complete_digraph(#[case] nodes: u32, #[case] edges: usize) {
        let mut rng = SmallRng::seed_from_u64(3);
        let graph = GraphBuilder::new(nodes)
            .build(&mut rng)
            .expect("build must succeed");
        assert_eq!(graph.node_count(), usize::try_from(nodes).expect("fits"));
        assert_eq!(graph.edge_count(), edges);
        assert!(is_complete(&graph));
    }

    #[rstest]
    fn positions_stay_inside_range() {
        let mut rng = SmallRng::seed_from_u64(11);
        let range = PositionRange::new(-100.0, 100.0).expect("range is valid");
        let graph = GraphBuilder::new(25)
            .with_position_range(range)
            .build(&mut rng)
            .expect("build must succeed");
        for (_, position) in graph.nodes() {
            let (x, y) = position.coords().expect("fresh graphs carry positions");
            assert!((-100.0..=100.0).contains(&x));
            assert!((-100.0..=100.0).contains(&y));
        }
    }

    #[rstest]
    fn degenerate_range_yields_constant_positions() {
        let mut rng = SmallRng::seed_from_u64(5);
        let range = PositionRange::new(0.5, 0.5).expect("range is valid");
        let graph = GraphBuilder::new(3)
            .with_position_range(range)
            .build(&mut rng)
            .expect("build must succeed");
        assert!(graph.nodes().all(|(_, p)| p == Position::Present(0.5, 0.5)));
        assert!(
            graph
                .edges()
                .iter()
                .all(|e| e.direction == crate::Direction::North)
        );
    }

    #[rstest]
    fn labels_match_endpoint_geometry() {
        let mut rng = SmallRng::seed_from_u64(17);
        let graph = GraphBuilder::new(6).build(&mut rng).expect("build must succeed");
        for edge in graph.edges() {
            let from = graph.position(edge.source).and_then(Position::coords);
            let to = graph.position(edge.target).and_then(Position::coords);
            let (Some(from), Some(to)) = (from, to) else {
                panic!("fresh graphs carry positions");
            };
            assert_eq!(edge.direction, classify(from, to));
        }
    }

    #[rstest]
    fn same_seed_builds_same_graph() {
        let first = GraphBuilder::new(8).build(&mut SmallRng::seed_from_u64(9));
        let second = GraphBuilder::new(8).build(&mut SmallRng::seed_from_u64(9));
        assert_eq!(first, second);
    }

    #[rstest]
    #[case::inverted(1.0, 0.0)]
    #[case::nan_min(f64::NAN, 1.0)]
    #[case::infinite_max(0.0, f64::INFINITY)]
    #[case::overflowing_width(-1e308, 1e308)]
    #[case::overflowing_scale(0.0, f64::MAX)]
    fn position_range_rejects_invalid_bounds(#[case] min: f64, #[case] max: f64) {
        let err = PositionRange::new(min, max).expect_err("range must be rejected");
        assert!(matches!(err, ValidationError::InvalidPositionRange { .. }));
    }

    #[rstest]
    fn wide_finite_range_builds() {
        let range = PositionRange::new(-1e307, 1e307).expect("range is valid");
        let graph = GraphBuilder::new(3)
            .with_position_range(range)
            .build(&mut SmallRng::seed_from_u64(5))
            .expect("build must succeed");
        for (_, position) in graph.nodes() {
            let (x, y) = position.coords().expect("fresh graphs carry positions");
            assert!((-1e307..=1e307).contains(&x));
            assert!((-1e307..=1e307).contains(&y));
        }
    }
}
