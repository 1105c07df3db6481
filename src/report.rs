use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

/// Pretty JSON written to a sibling temp file, then swapped into place.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create report dir {}", parent.display()))?;
    }
    let tmp = path.with_extension("json.tmp");
    let json = serde_json::to_string_pretty(value).context("serialize report")?;
    fs::write(&tmp, json).with_context(|| format!("write {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("swap report {}", path.display()))?;
    info!(path = %path.display(), "report written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::process;

    fn scratch(name: &str) -> std::path::PathBuf {
        env::temp_dir().join(format!("fantasy_planner_{name}_{}", process::id()))
    }

    #[test]
    fn creates_missing_dirs_and_leaves_no_temp_file() {
        let dir = scratch("nested");
        let path = dir.join("a").join("report.json");
        write_json_atomic(&path, &serde_json::json!({"ok": true})).unwrap();
        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"ok\": true"));
        assert!(!path.with_extension("json.tmp").exists());
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn unusable_parent_is_reported() {
        let blocker = scratch("blocker");
        fs::write(&blocker, "not a directory").unwrap();
        let path = blocker.join("report.json");
        let err = write_json_atomic(&path, &1u32).unwrap_err();
        assert!(format!("{err:#}").contains("create report dir"), "{err:#}");
        let _ = fs::remove_file(blocker);
    }
}
