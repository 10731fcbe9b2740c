use std::fs;

use chrono::Local;
use snafu::prelude::*;

use crate::prep::{BackupCopySnafu, PrepResult};

/// Derives a sibling path by inserting `tag` before the `.csv` extension:
/// `roster.csv` + `_filtered` -> `roster_filtered.csv`.
pub fn derived_path(path: &str, tag: &str) -> String {
    match path.strip_suffix(".csv") {
        Some(stem) => format!("{}{}.csv", stem, tag),
        None => format!("{}{}.csv", path, tag),
    }
}

/// Copies the file to a timestamped sibling before any transform touches it,
/// and returns the backup path.
pub fn backup_file(path: &str) -> PrepResult<String> {
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    let backup_path = derived_path(path, &format!("_backup_{}", stamp));
    fs::copy(path, &backup_path).context(BackupCopySnafu {
        path,
        backup_path: backup_path.clone(),
    })?;
    Ok(backup_path)
}

#[cfg(test)]
mod tests {
    use super::derived_path;

    #[test]
    fn derived_paths_keep_the_extension() {
        assert_eq!(derived_path("roster.csv", "_filtered"), "roster_filtered.csv");
        assert_eq!(
            derived_path("/data/a.csv", "_voters_ready"),
            "/data/a_voters_ready.csv"
        );
        // No extension to split on: the tag is appended.
        assert_eq!(derived_path("roster", "_filtered"), "roster_filtered.csv");
    }
}
