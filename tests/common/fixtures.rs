use std::fs;
use std::path::{Path, PathBuf};

use sqlweave::schema::{JsonSchema, SchemaCache};

/// Get path to a fixture in tests/fixtures/
pub fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Load a test fixture from tests/fixtures/
pub fn load_fixture(name: &str) -> String {
    let path = fixture_path(name);
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("Failed to load fixture {}: {}", name, e))
}

/// The table metadata shared by the fixtures
pub fn fixture_schema() -> SchemaCache {
    let schema = JsonSchema::load(&fixture_path("schema.json"))
        .unwrap_or_else(|e| panic!("Failed to load fixture schema: {}", e));
    SchemaCache::new(schema)
}

/// Discover all .sqlt fixtures
pub fn discover_templates() -> Vec<PathBuf> {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures");
    let mut paths: Vec<PathBuf> = fs::read_dir(&dir)
        .expect("Failed to read fixtures directory")
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some("sqlt"))
        .collect();
    paths.sort();
    paths
}
