use std::fs;

use crate::config::SyncPaths;

/// Removes the fingerprint store and article cache so the next run
/// re-syncs everything. Failures are logged and skipped.
pub fn reset(paths: &SyncPaths) {
    if paths.metadata_file.exists() {
        match fs::remove_file(&paths.metadata_file) {
            Ok(()) => log::info!("Removed metadata file: {}", paths.metadata_file.display()),
            Err(e) => log::warn!(
                "Failed to remove {}: {}",
                paths.metadata_file.display(),
                e
            ),
        }
    }

    if paths.articles_dir.exists() {
        match fs::remove_dir_all(&paths.articles_dir) {
            Ok(()) => log::info!("Removed articles directory: {}", paths.articles_dir.display()),
            Err(e) => log::warn!(
                "Failed to remove {}: {}",
                paths.articles_dir.display(),
                e
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_state_and_tolerates_absence() {
        let dir = tempfile::tempdir().unwrap();
        let paths = SyncPaths {
            articles_dir: dir.path().join("articles"),
            metadata_file: dir.path().join("articles_metadata.json"),
        };
        fs::create_dir_all(&paths.articles_dir).unwrap();
        fs::write(paths.articles_dir.join("1.md"), "x").unwrap();
        fs::write(&paths.metadata_file, "{}").unwrap();

        reset(&paths);
        assert!(!paths.articles_dir.exists());
        assert!(!paths.metadata_file.exists());

        reset(&paths);
    }
}
