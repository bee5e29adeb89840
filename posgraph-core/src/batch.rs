//! Batch generation: one base graph and many degraded variants.
//!
//! A batch shares a [`BatchId`] that prefixes every file it writes, so the
//! variants can later be retrieved with [`DatasetLayout::load_variants`]. The
//! base graph is built from the caller's random generator; each variant then
//! degrades its own copy of the base with an independent generator seeded from
//! that same source, so results do not depend on how variants are scheduled.

use std::{
    fmt, fs,
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

use rand::{Rng, SeedableRng, rngs::SmallRng};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::{info, instrument};

use crate::{
    builder::{GraphBuilder, PositionRange},
    codec,
    degrade::{DegradeParams, Degrader},
    error::{BatchError, CodecError, ValidationError},
    graph::Graph,
};

const COMPLETE_DIR: &str = "complete";
const DEGRADED_DIR: &str = "degraded";
const DEFAULT_ROOT: &str = "in";
const DEFAULT_VARIANT_COUNT: u32 = 10;
const DEFAULT_NODE_COUNT: u32 = 10;

/// SplitMix64 increment used to spread variant seeds.
const VARIANT_SEED_SPACING: u64 = 0x9E37_79B9_7F4A_7C15;
const SPLITMIX_MULT_A: u64 = 0xBF58_476D_1CE4_E5B9;
const SPLITMIX_MULT_B: u64 = 0x94D0_49BB_1331_11EB;

/// Identifier shared by every file of one batch.
///
/// # Examples
/// ```
/// use posgraph_core::BatchId;
///
/// let id = BatchId::new("run-7").expect("identifier is valid");
/// assert_eq!(id.as_str(), "run-7");
/// assert!(BatchId::new("../escape").is_err());
/// assert_eq!(BatchId::now().as_str().len(), 16);
/// ```
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct BatchId(String);

impl BatchId {
    /// Validates a caller-supplied identifier.
    ///
    /// # Errors
    /// Returns [`ValidationError::InvalidBatchId`] unless the identifier is
    /// non-empty and made of ASCII alphanumerics or `-`.
    pub fn new(raw: impl Into<String>) -> Result<Self, ValidationError> {
        let provided = raw.into();
        let valid = !provided.is_empty()
            && provided
                .bytes()
                .all(|byte| byte.is_ascii_alphanumeric() || byte == b'-');
        if valid {
            Ok(Self(provided))
        } else {
            Err(ValidationError::InvalidBatchId { provided })
        }
    }

    /// Derives an identifier from the wall clock.
    ///
    /// The identifier is the number of microseconds since the Unix epoch,
    /// zero-padded to 16 digits so generated identifiers never prefix one
    /// another.
    #[must_use]
    pub fn now() -> Self {
        let micros = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_micros();
        Self(format!("{micros:016}"))
    }

    /// Returns the identifier as written in file names.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the identifier followed by the `_` separator.
    ///
    /// Identifiers never contain `_`, so this prefix matches only files of
    /// this batch even when another identifier starts with this one.
    #[must_use]
    pub fn file_prefix(&self) -> String {
        format!("{}_", self.0)
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validated parameters for one batch.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BatchConfig {
    variant_count: u32,
    node_count: u32,
    position_range: PositionRange,
    degrade: DegradeParams,
}

impl BatchConfig {
    /// Number of degraded variants.
    #[must_use]
    pub const fn variant_count(&self) -> u32 {
        self.variant_count
    }

    /// Number of nodes in the base graph.
    #[must_use]
    pub const fn node_count(&self) -> u32 {
        self.node_count
    }

    /// Interval node coordinates are drawn from.
    #[must_use]
    pub const fn position_range(&self) -> PositionRange {
        self.position_range
    }

    /// Degradation ratios applied to every variant.
    #[must_use]
    pub const fn degrade(&self) -> DegradeParams {
        self.degrade
    }
}

/// Configures and constructs [`BatchConfig`] values.
///
/// # Examples
/// ```
/// use posgraph_core::BatchConfigBuilder;
///
/// let config = BatchConfigBuilder::new()
///     .with_variant_count(3)
///     .with_node_count(6)
///     .with_density(0.8)
///     .build()
///     .expect("configuration is valid");
/// assert_eq!(config.variant_count(), 3);
/// assert_eq!(config.degrade().density(), 0.8);
/// ```
#[derive(Clone, Debug)]
pub struct BatchConfigBuilder {
    variant_count: u32,
    node_count: u32,
    position_min: f64,
    position_max: f64,
    density: f64,
    unlabel_ratio: f64,
    unknown_ratio: f64,
}

impl Default for BatchConfigBuilder {
    fn default() -> Self {
        let degrade = DegradeParams::default();
        Self {
            variant_count: DEFAULT_VARIANT_COUNT,
            node_count: DEFAULT_NODE_COUNT,
            position_min: PositionRange::UNIT.min(),
            position_max: PositionRange::UNIT.max(),
            density: degrade.density(),
            unlabel_ratio: degrade.unlabel_ratio(),
            unknown_ratio: degrade.unknown_ratio(),
        }
    }
}

impl BatchConfigBuilder {
    /// Creates a builder populated with default parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the number of degraded variants.
    #[must_use]
    pub const fn with_variant_count(mut self, count: u32) -> Self {
        self.variant_count = count;
        self
    }

    /// Overrides the number of nodes in the base graph.
    #[must_use]
    pub const fn with_node_count(mut self, count: u32) -> Self {
        self.node_count = count;
        self
    }

    /// Overrides the interval node coordinates are drawn from.
    #[must_use]
    pub const fn with_position_range(mut self, min: f64, max: f64) -> Self {
        self.position_min = min;
        self.position_max = max;
        self
    }

    /// Overrides the fraction of edges retained.
    #[must_use]
    pub const fn with_density(mut self, density: f64) -> Self {
        self.density = density;
        self
    }

    /// Overrides the fraction of surviving edges that lose their label.
    #[must_use]
    pub const fn with_unlabel_ratio(mut self, ratio: f64) -> Self {
        self.unlabel_ratio = ratio;
        self
    }

    /// Overrides the fraction of nodes that lose their position.
    #[must_use]
    pub const fn with_unknown_ratio(mut self, ratio: f64) -> Self {
        self.unknown_ratio = ratio;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    /// Returns [`ValidationError::InvalidRatio`] or
    /// [`ValidationError::InvalidPositionRange`] for out-of-range parameters.
    pub fn build(self) -> Result<BatchConfig, ValidationError> {
        Ok(BatchConfig {
            variant_count: self.variant_count,
            node_count: self.node_count,
            position_range: PositionRange::new(self.position_min, self.position_max)?,
            degrade: DegradeParams::new(self.density, self.unlabel_ratio, self.unknown_ratio)?,
        })
    }
}

/// On-disk layout of a dataset rooted at a caller-supplied directory.
///
/// Base graphs live under `complete/` and variants under `degraded/`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatasetLayout {
    root: PathBuf,
}

impl Default for DatasetLayout {
    fn default() -> Self {
        Self::new(DEFAULT_ROOT)
    }
}

impl DatasetLayout {
    /// Creates a layout rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the dataset root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding base graphs.
    #[must_use]
    pub fn complete_dir(&self) -> PathBuf {
        self.root.join(COMPLETE_DIR)
    }

    /// Directory holding degraded variants.
    #[must_use]
    pub fn degraded_dir(&self) -> PathBuf {
        self.root.join(DEGRADED_DIR)
    }

    /// Path of the base graph of batch `id` generated with `config`.
    ///
    /// # Examples
    /// ```
    /// use std::path::Path;
    /// use posgraph_core::{BatchConfigBuilder, BatchId, DatasetLayout};
    ///
    /// let layout = DatasetLayout::new("in");
    /// let config = BatchConfigBuilder::new().with_density(1.0).build()?;
    /// let id = BatchId::new("42")?;
    /// assert_eq!(
    ///     layout.base_path(&id, &config),
    ///     Path::new("in/complete/42_n10d1.0r0.5u0.5.json"),
    /// );
    /// # Ok::<(), posgraph_core::ValidationError>(())
    /// ```
    #[must_use]
    pub fn base_path(&self, id: &BatchId, config: &BatchConfig) -> PathBuf {
        let degrade = config.degrade();
        self.complete_dir().join(format!(
            "{id}_n{}d{}r{}u{}.json",
            config.node_count(),
            float_repr(degrade.density()),
            float_repr(degrade.unlabel_ratio()),
            float_repr(degrade.unknown_ratio()),
        ))
    }

    /// Path of variant `index` (1-based) of batch `id`.
    #[must_use]
    pub fn variant_path(&self, id: &BatchId, index: u32) -> PathBuf {
        self.degraded_dir().join(format!("{}{index}.json", id.file_prefix()))
    }

    /// Loads the degraded variants of batch `id` in file-name order.
    ///
    /// Only files named with [`BatchId::file_prefix`] are read, so batch
    /// `run` does not pick up the files of batch `run-1`.
    ///
    /// # Errors
    /// Returns the errors of [`crate::load`].
    pub fn load_variants(&self, id: &BatchId) -> Result<Vec<Graph>, CodecError> {
        codec::load(&id.file_prefix(), &self.degraded_dir())
    }

    /// Creates the `complete/` and `degraded/` directories if missing.
    ///
    /// # Errors
    /// Returns [`CodecError::Io`] when a directory cannot be created.
    pub fn create_dirs(&self) -> Result<(), CodecError> {
        for dir in [self.complete_dir(), self.degraded_dir()] {
            fs::create_dir_all(&dir).map_err(|source| CodecError::Io { path: dir, source })?;
        }
        Ok(())
    }
}

/// A generated batch held in memory.
#[derive(Clone, Debug)]
pub struct Batch {
    id: BatchId,
    config: BatchConfig,
    base: Graph,
    variants: Vec<Graph>,
}

impl Batch {
    /// Identifier shared by the batch files.
    #[must_use]
    pub const fn id(&self) -> &BatchId {
        &self.id
    }

    /// Configuration the batch was generated with.
    #[must_use]
    pub const fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// The complete, fully labelled base graph.
    #[must_use]
    pub const fn base(&self) -> &Graph {
        &self.base
    }

    /// Degraded variants in index order.
    #[must_use]
    pub fn variants(&self) -> &[Graph] {
        &self.variants
    }

    /// Writes the base graph and every variant under `layout`.
    ///
    /// Directories are not created. Files written before a failure are left
    /// in place.
    ///
    /// # Errors
    /// Returns [`CodecError::Io`] on the first write that fails.
    #[instrument(name = "batch.persist", skip(self, layout), fields(batch = %self.id))]
    pub fn persist(&self, layout: &DatasetLayout) -> Result<Vec<PathBuf>, CodecError> {
        let mut written = Vec::with_capacity(self.variants.len().saturating_add(1));
        let base_path = layout.base_path(&self.id, &self.config);
        codec::save(&self.base, &base_path)?;
        written.push(base_path);
        for (index, variant) in (1_u32..).zip(&self.variants) {
            let path = layout.variant_path(&self.id, index);
            codec::save(variant, &path)?;
            written.push(path);
        }
        info!(files = written.len(), root = %layout.root().display(), "persisted batch");
        Ok(written)
    }
}

/// Generates batches from a validated [`BatchConfig`].
///
/// # Examples
/// ```
/// use posgraph_core::{BatchConfigBuilder, BatchGenerator, BatchId};
/// use rand::{SeedableRng, rngs::SmallRng};
///
/// let config = BatchConfigBuilder::new().with_variant_count(3).build()?;
/// let batch = BatchGenerator::new(config)
///     .generate(BatchId::new("demo")?, &mut SmallRng::seed_from_u64(1))?;
/// assert_eq!(batch.variants().len(), 3);
/// assert_eq!(batch.base().edge_count(), 90);
/// # Ok::<(), posgraph_core::ValidationError>(())
/// ```
#[derive(Clone, Debug)]
pub struct BatchGenerator {
    config: BatchConfig,
}

impl BatchGenerator {
    /// Creates a generator for `config`.
    #[must_use]
    pub const fn new(config: BatchConfig) -> Self {
        Self { config }
    }

    /// Builds the base graph and its degraded variants without touching disk.
    ///
    /// # Errors
    /// Returns [`ValidationError`] when the base graph cannot be built or a
    /// degradation sample exceeds its pool.
    #[instrument(
        name = "batch.generate",
        skip(self, rng),
        fields(
            batch = %id,
            nodes = self.config.node_count,
            variants = self.config.variant_count,
        ),
    )]
    pub fn generate<R: Rng>(&self, id: BatchId, rng: &mut R) -> Result<Batch, ValidationError> {
        let base = GraphBuilder::new(self.config.node_count)
            .with_position_range(self.config.position_range)
            .build(rng)?;
        let variant_seed_base = rng.next_u64();
        let variants = self.degrade_variants(&base, variant_seed_base)?;
        info!(
            base_edges = base.edge_count(),
            variants = variants.len(),
            "generated batch"
        );
        Ok(Batch {
            id,
            config: self.config,
            base,
            variants,
        })
    }

    fn degrade_variants(&self, base: &Graph, seed: u64) -> Result<Vec<Graph>, ValidationError> {
        let degrader = Degrader::new(self.config.degrade);
        let run = |index: u32| {
            let mut rng = SmallRng::seed_from_u64(variant_seed(seed, index));
            degrader.degrade(base, &mut rng)
        };

        #[cfg(feature = "parallel")]
        {
            (1..=self.config.variant_count)
                .into_par_iter()
                .map(run)
                .collect()
        }
        #[cfg(not(feature = "parallel"))]
        {
            (1..=self.config.variant_count).map(run).collect()
        }
    }
}

/// Generates a batch under a fresh timestamp identifier and writes it to
/// `layout`, returning the identifier.
///
/// Writes `variant_count + 1` files. The `complete/` and `degraded/`
/// directories must already exist.
///
/// # Errors
/// Returns [`BatchError::Validation`] when generation fails and
/// [`BatchError::Codec`] when a write fails.
pub fn generate_batch<R: Rng>(
    config: &BatchConfig,
    layout: &DatasetLayout,
    rng: &mut R,
) -> Result<BatchId, BatchError> {
    let batch = BatchGenerator::new(*config).generate(BatchId::now(), rng)?;
    batch.persist(layout)?;
    Ok(batch.id)
}

/// Renders `value` with the shortest round-trip digits, a `.0` on integral
/// values, and a signed exponent of at least two digits (`1e-05`).
fn float_repr(value: f64) -> String {
    let debug = format!("{value:?}");
    let Some((mantissa, exponent)) = debug.split_once('e') else {
        return debug;
    };
    let (sign, digits) = exponent
        .strip_prefix('-')
        .map_or(("+", exponent), |magnitude| ("-", magnitude));
    format!("{mantissa}e{sign}{digits:0>2}")
}

/// Mixes the batch seed with a variant index into an independent stream seed.
#[inline]
fn variant_seed(base_seed: u64, index: u32) -> u64 {
    splitmix64(base_seed ^ u64::from(index).wrapping_mul(VARIANT_SEED_SPACING))
}

#[inline]
const fn splitmix64(mut state: u64) -> u64 {
    state = state.wrapping_add(VARIANT_SEED_SPACING);
    state = (state ^ (state >> 30)).wrapping_mul(SPLITMIX_MULT_A);
    state = (state ^ (state >> 27)).wrapping_mul(SPLITMIX_MULT_B);
    state ^ (state >> 31)
}
