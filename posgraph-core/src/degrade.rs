//! Controlled removal of structure and attributes from a base graph.
//!
//! Degradation works on a private copy of the base graph and only ever removes
//! information: edges are deleted, edge labels are replaced with
//! [`Direction::Unlabeled`], and node positions are replaced with
//! [`Position::Absent`]. Labels that survive are the ones computed at build
//! time, even when an endpoint loses its position.

use rand::{Rng, seq::index};
use tracing::{debug, instrument};

use crate::{
    error::ValidationError,
    geometry::{Direction, Position},
    graph::Graph,
};

/// Ratios controlling how much information a degraded variant keeps.
///
/// # Examples
/// ```
/// use posgraph_core::DegradeParams;
///
/// let params = DegradeParams::new(0.5, 0.25, 0.1).expect("ratios are valid");
/// assert_eq!(params.density(), 0.5);
/// assert!(DegradeParams::new(1.5, 0.0, 0.0).is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DegradeParams {
    density: f64,
    unlabel_ratio: f64,
    unknown_ratio: f64,
}

impl DegradeParams {
    /// Validates and constructs degradation ratios.
    ///
    /// `density` is the fraction of edges to keep, `unlabel_ratio` the fraction
    /// of surviving edges whose label is erased, and `unknown_ratio` the
    /// fraction of all nodes whose position is erased.
    ///
    /// # Errors
    /// Returns [`ValidationError::InvalidRatio`] when any ratio is not finite or
    /// lies outside `[0, 1]`.
    pub fn new(density: f64, unlabel_ratio: f64, unknown_ratio: f64) -> Result<Self, ValidationError> {
        Ok(Self {
            density: validate_ratio("density", density)?,
            unlabel_ratio: validate_ratio("unlabel_ratio", unlabel_ratio)?,
            unknown_ratio: validate_ratio("unknown_ratio", unknown_ratio)?,
        })
    }

    /// Fraction of edges retained.
    #[must_use]
    pub const fn density(&self) -> f64 {
        self.density
    }

    /// Fraction of surviving edges that lose their label.
    #[must_use]
    pub const fn unlabel_ratio(&self) -> f64 {
        self.unlabel_ratio
    }

    /// Fraction of nodes that lose their position.
    #[must_use]
    pub const fn unknown_ratio(&self) -> f64 {
        self.unknown_ratio
    }

    /// Computes how many edges, labels, and positions a graph of the given
    /// shape loses.
    ///
    /// Label erasure counts against the edges left after removal, while
    /// position erasure counts against every node.
    ///
    /// # Errors
    /// Returns [`ValidationError::SampleExceedsPool`] if a count would exceed
    /// its candidate pool.
    pub fn plan(&self, edge_count: usize, node_count: usize) -> Result<DegradePlan, ValidationError> {
        let remove = fraction_of(edge_count, 1.0 - self.density);
        ensure_fits("edges to remove", remove, edge_count)?;
        let remaining = edge_count - remove;
        let unlabel = fraction_of(remaining, self.unlabel_ratio);
        ensure_fits("edges to unlabel", unlabel, remaining)?;
        let unknown = fraction_of(node_count, self.unknown_ratio);
        ensure_fits("nodes to unposition", unknown, node_count)?;
        Ok(DegradePlan {
            remove,
            unlabel,
            unknown,
        })
    }
}

impl Default for DegradeParams {
    fn default() -> Self {
        Self {
            density: 0.5,
            unlabel_ratio: 0.5,
            unknown_ratio: 0.5,
        }
    }
}

/// Sample sizes for one degradation pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DegradePlan {
    /// Edges deleted.
    pub remove: usize,
    /// Surviving edges whose label is erased.
    pub unlabel: usize,
    /// Nodes whose position is erased.
    pub unknown: usize,
}

/// Produces degraded copies of a base graph.
///
/// # Examples
/// ```
/// use posgraph_core::{DegradeParams, Degrader, GraphBuilder};
/// use rand::{SeedableRng, rngs::SmallRng};
///
/// let mut rng = SmallRng::seed_from_u64(1);
/// let base = GraphBuilder::new(10).build(&mut rng)?;
/// let degrader = Degrader::new(DegradeParams::new(0.5, 0.5, 0.5)?);
/// let variant = degrader.degrade(&base, &mut rng)?;
/// assert_eq!(variant.edge_count(), 45);
/// assert_eq!(variant.stats().unlabeled_edges, 22);
/// assert_eq!(variant.stats().absent_positions, 5);
/// assert_eq!(base.edge_count(), 90);
/// # Ok::<(), posgraph_core::ValidationError>(())
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Degrader {
    params: DegradeParams,
}

impl Degrader {
    /// Creates a degrader using `params`.
    #[must_use]
    pub const fn new(params: DegradeParams) -> Self {
        Self { params }
    }

    /// Returns the configured ratios.
    #[must_use]
    pub const fn params(&self) -> DegradeParams {
        self.params
    }

    /// Returns a degraded copy of `base`, leaving `base` untouched.
    ///
    /// Three independent uniform samples without replacement are drawn from
    /// `rng`, in order: edges to delete, surviving edges to unlabel, and nodes
    /// to unposition.
    ///
    /// # Errors
    /// Returns [`ValidationError::SampleExceedsPool`] before any mutation when
    /// a sample would exceed its pool.
    #[instrument(
        name = "graph.degrade",
        skip(self, base, rng),
        fields(nodes = base.node_count(), edges = base.edge_count()),
    )]
    pub fn degrade<R: Rng>(&self, base: &Graph, rng: &mut R) -> Result<Graph, ValidationError> {
        let plan = self.params.plan(base.edge_count(), base.node_count())?;
        let mut graph = base.clone();

        remove_edges(&mut graph, plan.remove, rng);
        unlabel_edges(&mut graph, plan.unlabel, rng);
        erase_positions(&mut graph, plan.unknown, rng);

        debug!(
            removed = plan.remove,
            unlabeled = plan.unlabel,
            unknown = plan.unknown,
            "degraded graph"
        );
        Ok(graph)
    }
}

fn remove_edges<R: Rng>(graph: &mut Graph, amount: usize, rng: &mut R) {
    let edges = graph.edges_mut();
    let mut doomed = vec![false; edges.len()];
    for position in index::sample(rng, edges.len(), amount) {
        if let Some(flag) = doomed.get_mut(position) {
            *flag = true;
        }
    }
    let mut flags = doomed.into_iter();
    edges.retain(|_| !flags.next().unwrap_or(false));
}

fn unlabel_edges<R: Rng>(graph: &mut Graph, amount: usize, rng: &mut R) {
    let edges = graph.edges_mut();
    for position in index::sample(rng, edges.len(), amount) {
        if let Some(edge) = edges.get_mut(position) {
            edge.direction = Direction::Unlabeled;
        }
    }
}

fn erase_positions<R: Rng>(graph: &mut Graph, amount: usize, rng: &mut R) {
    let positions = graph.positions_mut();
    for node in index::sample(rng, positions.len(), amount) {
        if let Some(position) = positions.get_mut(node) {
            *position = Position::Absent;
        }
    }
}

fn validate_ratio(parameter: &'static str, value: f64) -> Result<f64, ValidationError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(ValidationError::InvalidRatio { parameter, value })
    }
}

const fn ensure_fits(
    pool: &'static str,
    requested: usize,
    available: usize,
) -> Result<(), ValidationError> {
    if requested > available {
        return Err(ValidationError::SampleExceedsPool {
            pool,
            requested,
            available,
        });
    }
    Ok(())
}

/// Returns `floor(count * ratio)` for a ratio in `[0, 1]`.
#[expect(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "ratios are validated to [0, 1] so the product lies in [0, count]"
)]
#[expect(
    clippy::float_arithmetic,
    reason = "sample sizes are fractions of pool sizes"
)]
fn fraction_of(count: usize, ratio: f64) -> usize {
    let scaled = (count as f64 * ratio).floor();
    if scaled <= 0.0 {
        0
    } else {
        (scaled as usize).min(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;
    use rand::{SeedableRng, rngs::SmallRng};
    use rstest::{fixture, rstest};

    use crate::{builder::GraphBuilder, graph::NodeId};

    #[fixture]
    fn base() -> Graph {
        GraphBuilder::new(10)
            .build(&mut SmallRng::seed_from_u64(42))
            .expect("build must succeed")
    }

    #[rstest]
    #[case::half(0.5, 0.5, 0.5, 45, 22, 5)]
    #[case::keep_everything(1.0, 0.0, 0.0, 90, 0, 0)]
    #[case::drop_everything(0.0, 1.0, 1.0, 0, 0, 10)]
    #[case::erase_all_labels(1.0, 1.0, 0.0, 90, 90, 0)]
    #[case::sparse(0.15, 0.5, 0.3, 14, 7, 3)]
    fn degrade_hits_requested_counts(
        base: Graph,
        #[case] density: f64,
        #[case] unlabel: f64,
        #[case] unknown: f64,
        #[case] edges: usize,
        #[case] unlabeled: usize,
        #[case] absent: usize,
    ) {
        let params = DegradeParams::new(density, unlabel, unknown).expect("ratios are valid");
        let variant = Degrader::new(params)
            .degrade(&base, &mut SmallRng::seed_from_u64(7))
            .expect("degrade must succeed");
        let stats = variant.stats();
        assert_eq!(stats.edges, edges);
        assert_eq!(stats.unlabeled_edges, unlabeled);
        assert_eq!(stats.absent_positions, absent);
        assert_eq!(stats.nodes, 10);
    }

    #[rstest]
    fn degrade_leaves_base_untouched(base: Graph) {
        let snapshot = base.clone();
        let _variant = Degrader::default()
            .degrade(&base, &mut SmallRng::seed_from_u64(3))
            .expect("degrade must succeed");
        assert_eq!(base, snapshot);
    }

    #[rstest]
    fn surviving_labels_are_not_recomputed(base: Graph) {
        let params = DegradeParams::new(1.0, 0.0, 1.0).expect("ratios are valid");
        let variant = Degrader::new(params)
            .degrade(&base, &mut SmallRng::seed_from_u64(5))
            .expect("degrade must succeed");
        assert!(variant.nodes().all(|(_, p)| p == Position::Absent));
        assert_eq!(variant.edges(), base.edges());
    }

    #[rstest]
    fn surviving_edges_keep_base_labels(base: Graph) {
        let variant = Degrader::default()
            .degrade(&base, &mut SmallRng::seed_from_u64(13))
            .expect("degrade must succeed");
        for edge in variant.edges() {
            let original = base
                .direction(edge.source, edge.target)
                .expect("variants only contain base edges");
            assert!(edge.direction == original || edge.direction == Direction::Unlabeled);
        }
        for (id, position) in variant.nodes() {
            assert!(position == Position::Absent || base.position(id) == Some(position));
        }
        assert!(variant.position(NodeId::new(10)).is_none());
    }

    #[rstest]
    #[case::negative("density", -0.1)]
    #[case::above_one("unlabel_ratio", 1.01)]
    #[case::nan("unknown_ratio", f64::NAN)]
    fn params_reject_out_of_range_ratios(#[case] parameter: &str, #[case] value: f64) {
        let result = match parameter {
            "density" => DegradeParams::new(value, 0.5, 0.5),
            "unlabel_ratio" => DegradeParams::new(0.5, value, 0.5),
            _ => DegradeParams::new(0.5, 0.5, value),
        };
        let err = result.expect_err("ratio must be rejected");
        assert!(matches!(
            err,
            ValidationError::InvalidRatio { parameter: p, .. } if p == parameter
        ));
    }

    #[rstest]
    fn empty_graph_degrades_to_empty_graph() {
        let variant = Degrader::default()
            .degrade(&Graph::default(), &mut SmallRng::seed_from_u64(1))
            .expect("degrade must succeed");
        assert_eq!(variant, Graph::default());
    }

    proptest! {
        #[test]
        fn degrade_counts_match_floor_formulae(
            nodes in 0_u32..14,
            density in 0.0_f64..=1.0,
            unlabel in 0.0_f64..=1.0,
            unknown in 0.0_f64..=1.0,
            seed in any::<u64>(),
        ) {
            let mut rng = SmallRng::seed_from_u64(seed);
            let graph = GraphBuilder::new(nodes).build(&mut rng).expect("build must succeed");
            let params = DegradeParams::new(density, unlabel, unknown).expect("ratios are valid");
            let variant = Degrader::new(params).degrade(&graph, &mut rng).expect("degrade must succeed");

            let total = graph.edge_count();
            let removed = fraction_of(total, 1.0 - density);
            let remaining = total - removed;
            let stats = variant.stats();
            prop_assert_eq!(stats.edges, remaining);
            prop_assert_eq!(stats.unlabeled_edges, fraction_of(remaining, unlabel));
            prop_assert_eq!(stats.absent_positions, fraction_of(graph.node_count(), unknown));
        }
    }
}
