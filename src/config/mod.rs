//! Workspace layout and constants
//!
//! The pipeline keeps all of its state under a single working directory,
//! split into four stages: downloaded archives, extracted source trees,
//! per-compiler build directories, and per-compiler staged binaries.

pub mod defaults;

use std::path::{Path, PathBuf};

use crate::error::FilesystemError;
use crate::infra::filesystem;

/// On-disk layout of the pipeline working directory
///
/// ```text
/// <work>/cache/<archive files>
/// <work>/extracted/<name>-<version>/...
/// <work>/build/<name>-<version>_<compiler-short-id>/...
/// <work>/bin/<name>-<version>_<compiler-short-id>/bin/*.{dll,pdb,...}
/// ```
#[derive(Debug, Clone)]
pub struct Layout {
    work_dir: PathBuf,
}

impl Layout {
    /// Create a layout rooted at the given working directory
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
        }
    }

    /// The working directory root
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Directory holding downloaded source archives
    pub fn cache_dir(&self) -> PathBuf {
        self.work_dir.join("cache")
    }

    /// Directory holding extracted source trees
    pub fn extracted_dir(&self) -> PathBuf {
        self.work_dir.join("extracted")
    }

    /// Directory holding per-compiler build trees
    pub fn build_dir(&self) -> PathBuf {
        self.work_dir.join("build")
    }

    /// Directory holding per-compiler staged binaries
    pub fn bin_dir(&self) -> PathBuf {
        self.work_dir.join("bin")
    }

    /// Create all stage directories
    pub fn ensure(&self) -> Result<(), FilesystemError> {
        filesystem::create_dir_all(&self.cache_dir())?;
        filesystem::create_dir_all(&self.extracted_dir())?;
        filesystem::create_dir_all(&self.build_dir())?;
        filesystem::create_dir_all(&self.bin_dir())?;
        Ok(())
    }
}

impl Default for Layout {
    fn default() -> Self {
        Self::new(defaults::DEFAULT_WORK_DIR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_layout_stage_dirs() {
        let layout = Layout::new("work");
        assert_eq!(layout.cache_dir(), PathBuf::from("work/cache"));
        assert_eq!(layout.extracted_dir(), PathBuf::from("work/extracted"));
        assert_eq!(layout.build_dir(), PathBuf::from("work/build"));
        assert_eq!(layout.bin_dir(), PathBuf::from("work/bin"));
    }

    #[test]
    fn test_ensure_creates_all_stages() {
        let dir = TempDir::new().unwrap();
        let layout = Layout::new(dir.path().join("work"));
        layout.ensure().unwrap();

        assert!(layout.cache_dir().is_dir());
        assert!(layout.extracted_dir().is_dir());
        assert!(layout.build_dir().is_dir());
        assert!(layout.bin_dir().is_dir());
    }
}
