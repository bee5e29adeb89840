//! Unit tests for graph file encoding and batch loading.

use super::*;

use proptest::prelude::*;
use rand::{SeedableRng, rngs::SmallRng};
use rstest::{fixture, rstest};
use tempfile::TempDir;

use crate::{
    builder::GraphBuilder,
    degrade::{DegradeParams, Degrader},
    error::MalformedGraphCode,
};

type TestResult = Result<(), Box<dyn std::error::Error>>;

#[fixture]
fn dir() -> TempDir {
    match TempDir::new() {
        Ok(dir) => dir,
        Err(err) => panic!("failed to create temp dir: {err}"),
    }
}

#[fixture]
fn degraded() -> Graph {
    let mut rng = SmallRng::seed_from_u64(31);
    let base = GraphBuilder::new(9)
        .build(&mut rng)
        .expect("build must succeed");
    Degrader::new(DegradeParams::new(0.6, 0.5, 0.4).expect("ratios are valid"))
        .degrade(&base, &mut rng)
        .expect("degrade must succeed")
}

fn write(dir: &TempDir, name: &str, contents: &str) -> io::Result<PathBuf> {
    let path = dir.path().join(name);
    fs::write(&path, contents)?;
    Ok(path)
}

#[rstest]
fn round_trip_preserves_erasures(dir: TempDir, degraded: Graph) -> TestResult {
    let path = dir.path().join("variant.json");
    save(&degraded, &path)?;
    let loaded = load_graph(&path)?;
    assert_eq!(loaded, degraded);
    assert!(loaded.stats().unlabeled_edges > 0);
    assert!(loaded.stats().absent_positions > 0);
    Ok(())
}

#[rstest]
fn saved_file_uses_node_link_shape(dir: TempDir) -> TestResult {
    let graph = Graph::from_parts(
        vec![Position::Present(0.25, 0.5), Position::Absent],
        vec![Edge {
            source: NodeId::new(0),
            target: NodeId::new(1),
            direction: Direction::Unlabeled,
        }],
    )?;
    let path = dir.path().join("g.json");
    save(&graph, &path)?;
    let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path)?)?;
    assert_eq!(
        value,
        serde_json::json!({
            "directed": true,
            "nodes": [{ "id": 0, "pos": [0.25, 0.5] }, { "id": 1, "pos": [] }],
            "links": [{ "source": 0, "target": 1, "dir": "N/A" }]
        })
    );
    Ok(())
}

#[rstest]
fn networkx_output_loads(dir: TempDir) -> TestResult {
    let path = write(
        &dir,
        "nx.json",
        r#"{"directed": true, "multigraph": false, "graph": {},
            "nodes": [{"pos": [], "id": 1}, {"pos": [0.1, 0.9], "id": 0}],
            "links": [{"dir": "South", "source": 0, "target": 1}]}"#,
    )?;
    let graph = load_graph(&path)?;
    assert_eq!(graph.position(NodeId::new(0)), Some(Position::Present(0.1, 0.9)));
    assert_eq!(graph.position(NodeId::new(1)), Some(Position::Absent));
    assert_eq!(
        graph.direction(NodeId::new(0), NodeId::new(1)),
        Some(Direction::South)
    );
    Ok(())
}

#[rstest]
#[case::missing_id(r#"{"directed": true, "nodes": [{"pos": []}], "links": []}"#)]
#[case::bad_direction(
    r#"{"directed": true, "nodes": [{"id": 0, "pos": []}, {"id": 1, "pos": []}],
        "links": [{"source": 0, "target": 1, "dir": "Up"}]}"#
)]
#[case::not_json("not json")]
fn syntax_errors_are_reported(dir: TempDir, #[case] contents: &str) -> TestResult {
    let path = write(&dir, "bad.json", contents)?;
    let err = load_graph(&path).expect_err("file must be rejected");
    assert!(matches!(err, CodecError::Syntax { .. }), "unexpected: {err:?}");
    Ok(())
}

#[rstest]
#[case::undirected(
    r#"{"directed": false, "nodes": [], "links": []}"#,
    MalformedGraphCode::Undirected
)]
#[case::bad_position(
    r#"{"directed": true, "nodes": [{"id": 0, "pos": [1.0]}], "links": []}"#,
    MalformedGraphCode::InvalidPosition
)]
#[case::duplicate_node(
    r#"{"directed": true, "nodes": [{"id": 0, "pos": []}, {"id": 0, "pos": []}], "links": []}"#,
    MalformedGraphCode::DuplicateNode
)]
#[case::gap(
    r#"{"directed": true, "nodes": [{"id": 0, "pos": []}, {"id": 2, "pos": []}], "links": []}"#,
    MalformedGraphCode::NonContiguousNodes
)]
#[case::dangling_edge(
    r#"{"directed": true, "nodes": [{"id": 0, "pos": []}],
        "links": [{"source": 0, "target": 3, "dir": "North"}]}"#,
    MalformedGraphCode::UnknownEndpoint
)]
fn malformed_graphs_are_reported(
    dir: TempDir,
    #[case] contents: &str,
    #[case] expected: MalformedGraphCode,
) -> TestResult {
    let path = write(&dir, "bad.json", contents)?;
    let err = load_graph(&path).expect_err("file must be rejected");
    assert_eq!(err.malformed_code(), Some(expected));
    Ok(())
}

#[rstest]
fn save_requires_existing_parent(dir: TempDir, degraded: Graph) {
    let path = dir.path().join("missing").join("g.json");
    let err = save(&degraded, &path).expect_err("missing parent must fail");
    assert!(matches!(err, CodecError::Io { .. }));
    assert!(!dir.path().join("missing").exists());
}

#[rstest]
fn load_returns_prefixed_files_in_name_order(dir: TempDir, degraded: Graph) -> TestResult {
    let mut expected = Vec::new();
    for (index, density) in [(2, 0.2), (1, 0.9), (3, 0.5)] {
        let params = DegradeParams::new(density, 0.0, 0.0)?;
        let graph = Degrader::new(params).degrade(&degraded, &mut SmallRng::seed_from_u64(index))?;
        save(&graph, &dir.path().join(format!("0042_{index}.json")))?;
        expected.push((index, graph));
    }
    save(&degraded, &dir.path().join("0043_1.json"))?;
    fs::create_dir(dir.path().join("0042_dir"))?;
    expected.sort_by_key(|(index, _)| *index);

    let loaded = load("0042", dir.path())?;
    let expected_graphs: Vec<Graph> = expected.into_iter().map(|(_, graph)| graph).collect();
    assert_eq!(loaded, expected_graphs);
    Ok(())
}

#[rstest]
fn unmatched_prefix_yields_empty_batch(dir: TempDir, degraded: Graph) -> TestResult {
    save(&degraded, &dir.path().join("0042_1.json"))?;
    assert!(load("9999", dir.path())?.is_empty());
    Ok(())
}

#[rstest]
fn load_stops_at_first_unparsable_file(dir: TempDir, degraded: Graph) -> TestResult {
    save(&degraded, &dir.path().join("7_1.json"))?;
    write(&dir, "7_2.json", "{")?;
    save(&degraded, &dir.path().join("7_3.json"))?;
    let err = load("7", dir.path()).expect_err("batch must fail");
    match err {
        CodecError::Syntax { path, .. } => assert!(path.ends_with("7_2.json")),
        other => panic!("unexpected error: {other:?}"),
    }
    Ok(())
}

#[rstest]
fn load_reports_missing_directory(dir: TempDir) {
    let err = load("1", &dir.path().join("absent")).expect_err("listing must fail");
    assert_eq!(err.code().as_str(), "CODEC_IO");
}

proptest! {
    #[test]
    fn round_trip_is_exact_for_generated_graphs(
        nodes in 0_u32..8,
        density in 0.0_f64..=1.0,
        unlabel in 0.0_f64..=1.0,
        unknown in 0.0_f64..=1.0,
        seed in any::<u64>(),
    ) {
        let mut rng = SmallRng::seed_from_u64(seed);
        let base = GraphBuilder::new(nodes).build(&mut rng).expect("build must succeed");
        let params = DegradeParams::new(density, unlabel, unknown).expect("ratios are valid");
        let graph = Degrader::new(params).degrade(&base, &mut rng).expect("degrade must succeed");

        let wire = serde_json::to_string(&WireGraph::from(&graph)).expect("graph must encode");
        let decoded: WireGraph = serde_json::from_str(&wire).expect("graph must decode");
        prop_assert_eq!(Graph::try_from(decoded).expect("graph must be valid"), graph);
    }
}
