use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Path of a file shipped under `demos/`.
pub fn demo(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("demos").join(name)
}

/// Write `contents` to `name` inside a fresh temp dir.
pub fn write_temp(name: &str, contents: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join(name);
    fs::write(&path, contents).expect("write temp file");
    (dir, path)
}

pub const PROTOCOL: &str = r#"
[protocol]
owner = "0x1000000000000000000000000000000000000001"
treasury = "0x2000000000000000000000000000000000000002"
oracle_resolver = "0x3000000000000000000000000000000000000003"
reward_distributor = "0x4000000000000000000000000000000000000004"
"#;

/// A scenario whose only step is rejected by the engine.
pub fn failing_scenario() -> String {
    format!(
        r#"{PROTOCOL}
[[step]]
action = "predict"
user = "0xa11ce"
market = "missing"
outcome = "above"
stake = 1.0
"#
    )
}
