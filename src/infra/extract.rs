//! Archive extraction
//!
//! Unpacks downloaded source archives into the extracted-sources stage of
//! the working directory. Archives that wrap their contents in a single
//! top-level folder can have that folder stripped, so every source tree
//! ends up directly under `<extracted>/<name>-<version>/` regardless of
//! how the upstream project packages itself.

use flate2::read::GzDecoder;
use std::fs::File;
use std::io::BufReader;
use std::path::{Component, Path, PathBuf};
use tar::Archive;

use crate::error::ExtractError;
use crate::infra::filesystem;

/// How many leading path components to drop from every archive entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootHandling {
    /// Entries are unpacked as-is (archive has no wrapping folder)
    Keep,
    /// The first path component of every entry is stripped
    StripFirst,
}

/// Unpack a gzipped tarball into `dest`
pub fn unpack_tar_gz(
    archive_path: &Path,
    dest: &Path,
    root: RootHandling,
) -> Result<(), ExtractError> {
    let file = File::open(archive_path).map_err(|e| ExtractError::IoError {
        path: archive_path.to_path_buf(),
        error: e.to_string(),
    })?;
    let decoder = GzDecoder::new(BufReader::new(file));
    let mut archive = Archive::new(decoder);

    std::fs::create_dir_all(dest).map_err(|e| ExtractError::IoError {
        path: dest.to_path_buf(),
        error: e.to_string(),
    })?;

    let entries = archive.entries().map_err(|e| ExtractError::Malformed {
        path: archive_path.to_path_buf(),
        error: e.to_string(),
    })?;

    for entry in entries {
        let mut entry = entry.map_err(|e| ExtractError::Malformed {
            path: archive_path.to_path_buf(),
            error: e.to_string(),
        })?;

        let entry_path = entry
            .path()
            .map_err(|e| ExtractError::Malformed {
                path: archive_path.to_path_buf(),
                error: e.to_string(),
            })?
            .into_owned();

        let Some(target) = entry_target(&entry_path, root) else {
            continue;
        };

        let dest_path = dest.join(&target);
        if let Some(parent) = dest_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ExtractError::IoError {
                path: parent.to_path_buf(),
                error: e.to_string(),
            })?;
        }

        entry
            .unpack(&dest_path)
            .map_err(|e| ExtractError::IoError {
                path: dest_path.clone(),
                error: e.to_string(),
            })?;
    }

    Ok(())
}

/// Unpack a zip archive into `dest`
pub fn unpack_zip(archive_path: &Path, dest: &Path, root: RootHandling) -> Result<(), ExtractError> {
    let file = File::open(archive_path).map_err(|e| ExtractError::IoError {
        path: archive_path.to_path_buf(),
        error: e.to_string(),
    })?;
    let mut archive =
        zip::ZipArchive::new(BufReader::new(file)).map_err(|e| ExtractError::Malformed {
            path: archive_path.to_path_buf(),
            error: e.to_string(),
        })?;

    std::fs::create_dir_all(dest).map_err(|e| ExtractError::IoError {
        path: dest.to_path_buf(),
        error: e.to_string(),
    })?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(|e| ExtractError::Malformed {
            path: archive_path.to_path_buf(),
            error: e.to_string(),
        })?;

        let entry_path = entry.enclosed_name().ok_or_else(|| ExtractError::Malformed {
            path: archive_path.to_path_buf(),
            error: format!("entry {i} has an invalid name"),
        })?;

        let Some(target) = entry_target(&entry_path, root) else {
            continue;
        };

        let dest_path = dest.join(&target);

        if entry.is_dir() {
            std::fs::create_dir_all(&dest_path).map_err(|e| ExtractError::IoError {
                path: dest_path.clone(),
                error: e.to_string(),
            })?;
        } else {
            if let Some(parent) = dest_path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| ExtractError::IoError {
                    path: parent.to_path_buf(),
                    error: e.to_string(),
                })?;
            }

            let mut outfile = File::create(&dest_path).map_err(|e| ExtractError::IoError {
                path: dest_path.clone(),
                error: e.to_string(),
            })?;
            std::io::copy(&mut entry, &mut outfile).map_err(|e| ExtractError::IoError {
                path: dest_path.clone(),
                error: e.to_string(),
            })?;

            // Preserve the executable bit on Unix
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                if let Some(mode) = entry.unix_mode() {
                    let _ = std::fs::set_permissions(
                        &dest_path,
                        std::fs::Permissions::from_mode(mode),
                    );
                }
            }
        }
    }

    Ok(())
}

/// Copy a non-archive source file into `dest` unchanged
pub fn copy_plain(source: &Path, dest_dir: &Path) -> Result<(), ExtractError> {
    let file_name = source.file_name().ok_or_else(|| ExtractError::IoError {
        path: source.to_path_buf(),
        error: "source has no file name".to_string(),
    })?;

    filesystem::copy_file(source, &dest_dir.join(file_name)).map_err(|e| ExtractError::IoError {
        path: source.to_path_buf(),
        error: e.to_string(),
    })
}

/// Map an archive entry path to its destination-relative path
///
/// Returns `None` for entries that vanish entirely (the stripped root
/// folder itself, or unsafe non-normal components).
fn entry_target(entry_path: &Path, root: RootHandling) -> Option<PathBuf> {
    let normal: PathBuf = entry_path
        .components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .collect();

    let target: PathBuf = match root {
        RootHandling::Keep => normal,
        RootHandling::StripFirst => normal.components().skip(1).collect(),
    };

    if target.as_os_str().is_empty() {
        None
    } else {
        Some(target)
    }
}
