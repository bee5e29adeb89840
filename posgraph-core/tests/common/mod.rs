use posgraph_core::DatasetLayout;
use tempfile::TempDir;

/// Temporary dataset root with its `complete/` and `degraded/` directories.
pub struct TempLayout {
    pub dir: TempDir,
    pub layout: DatasetLayout,
}

impl TempLayout {
    #[must_use]
    pub fn new() -> Self {
        let dir = match TempDir::new() {
            Ok(dir) => dir,
            Err(err) => panic!("failed to create temp dir: {err}"),
        };
        let layout = DatasetLayout::new(dir.path().join("in"));
        if let Err(err) = layout.create_dirs() {
            panic!("failed to create dataset directories: {err}");
        }
        Self { dir, layout }
    }
}
