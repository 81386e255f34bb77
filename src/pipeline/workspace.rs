use crate::error::Result;
use crate::models::{OutputCategory, PipelineName};
use std::fs;
use std::path::{Path, PathBuf};

const UNCLEANED_DIR: &str = "uncleaned";
const CLEANED_DIR: &str = "cleaned";

/// Per-pipeline scratch directories: raw payloads under `base`, extracted or
/// paginated vendor files under `uncleaned`, canonical rows under `cleaned`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingDirs {
    pub base: PathBuf,
    pub uncleaned: PathBuf,
    pub cleaned: PathBuf,
}

impl WorkingDirs {
    pub fn new(work_root: &Path, pipeline: PipelineName) -> Self {
        let base = work_root.join(pipeline.slug());
        Self {
            uncleaned: base.join(UNCLEANED_DIR),
            cleaned: base.join(CLEANED_DIR),
            base,
        }
    }

    pub fn category_dir(&self, category: OutputCategory) -> PathBuf {
        self.cleaned.join(category.dir_name())
    }

    /// Recreate the whole tree from scratch, dropping leftovers of an earlier run.
    pub fn prepare(&self) -> Result<()> {
        self.remove()?;
        fs::create_dir_all(&self.uncleaned)?;
        for category in OutputCategory::ALL {
            fs::create_dir_all(self.category_dir(category))?;
        }
        Ok(())
    }

    pub fn remove(&self) -> Result<()> {
        if self.base.exists() {
            fs::remove_dir_all(&self.base)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepare_discards_previous_contents() {
        let root = tempfile::tempdir().unwrap();
        let dirs = WorkingDirs::new(root.path(), PipelineName::WalMart);
        dirs.prepare().unwrap();
        let stale = dirs.uncleaned.join("stale.json");
        fs::write(&stale, b"{}").unwrap();

        dirs.prepare().unwrap();

        assert!(!stale.exists());
        assert!(dirs.category_dir(OutputCategory::Info).is_dir());
        assert!(dirs.category_dir(OutputCategory::Price).is_dir());
        assert_eq!(dirs.base, root.path().join("walmart"));
    }

    #[test]
    fn remove_is_a_noop_when_missing() {
        let root = tempfile::tempdir().unwrap();
        let dirs = WorkingDirs::new(root.path(), PipelineName::BestBuy);
        dirs.remove().unwrap();
        dirs.prepare().unwrap();
        dirs.remove().unwrap();
        assert!(!dirs.base.exists());
    }
}
