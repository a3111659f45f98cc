use std::{fs, io, path::Path};

use serde_json::json;

/// Overwrites `path` with the batch position so other tools can poll it.
pub fn write_progress(
    path: &Path,
    current: usize,
    total: usize,
    phase: &str,
    status: &str,
) -> io::Result<()> {
    let json = json!({
        "current": current,
        "total": total,
        "phase": phase,
        "status": status,
    });
    fs::write(path, json.to_string())
}
