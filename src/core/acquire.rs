//! Source acquisition pipeline
//!
//! Turns the library document into a populated [`Catalog`]: downloads each
//! version's source archive into the cache, extracts it into the
//! extracted-sources stage, and records the build metadata the
//! orchestrator needs. A version whose download or extraction fails is
//! dropped with a warning; the rest of the run continues.

use std::path::Path;

use regex::Regex;

use crate::config::Layout;
use crate::core::catalog::{BuildStrategy, Catalog, VersionRecord};
use crate::core::manifest::{ArchiveKind, LibraryConfig, LibraryManifest};
use crate::error::{AcquireError, BinforgeError, ConfigError};
use crate::infra::download::DownloadManager;
use crate::infra::extract::{self, RootHandling};

/// Acquire every configured library version and build the catalog
///
/// Already-extracted source trees short-circuit both the download and the
/// extraction, which makes repeated runs cheap and keeps the pipeline
/// resumable after an interrupted acquisition pass.
pub async fn acquire_catalog(
    manifest: &LibraryManifest,
    layout: &Layout,
    overrides_dir: &Path,
) -> Result<Catalog, AcquireError> {
    layout.ensure()?;

    let downloader = DownloadManager::new();
    let mut catalog = Catalog::new();

    for (key, config) in &manifest.libs {
        let name = display_name(key, config);

        for (version, url) in enumerate_versions(&name, config)? {
            if catalog.contains(&name, &version) {
                tracing::debug!("{name}-{version} already present in the catalog, skipping");
                continue;
            }

            match prepare_version(&downloader, layout, &name, &version, &url, config).await {
                Ok(()) => {
                    let record = plan_record(&name, &version, config, layout, overrides_dir);
                    catalog.insert(&name, &version, record)?;
                }
                Err(e) => {
                    tracing::warn!("skipping {name}-{version}: {e}");
                }
            }
        }
    }

    Ok(catalog)
}

/// Build the catalog without touching the network or the filesystem
///
/// Used by configuration checks: the records carry the same paths and
/// metadata `acquire_catalog` would produce, so the resolver can validate
/// dependencies and command templates offline.
pub fn plan_catalog(
    manifest: &LibraryManifest,
    layout: &Layout,
    overrides_dir: &Path,
) -> Result<Catalog, ConfigError> {
    let mut catalog = Catalog::new();

    for (key, config) in &manifest.libs {
        let name = display_name(key, config);

        for (version, _url) in enumerate_versions(&name, config)? {
            if catalog.contains(&name, &version) {
                continue;
            }
            let record = plan_record(&name, &version, config, layout, overrides_dir);
            catalog.insert(&name, &version, record)?;
        }
    }

    Ok(catalog)
}

fn display_name(key: &str, config: &LibraryConfig) -> String {
    config.name.clone().unwrap_or_else(|| key.to_string())
}

/// Enumerate the (version, url) pairs one library configuration yields
///
/// With an explicit `urls` list the version is detected from each URL;
/// URLs whose version cannot be detected are dropped with a warning. With
/// a `url` pattern, the `{version}` marker is expanded per declared
/// version.
pub fn enumerate_versions(
    name: &str,
    config: &LibraryConfig,
) -> Result<Vec<(String, String)>, ConfigError> {
    let ext = regex::escape(config.archive.extension());
    let escaped_name = regex::escape(name);

    if !config.urls.is_empty() {
        let pattern_error = |e: regex::Error| ConfigError::InvalidPattern {
            library: name.to_string(),
            error: e.to_string(),
        };
        let generic = Regex::new(&format!(r"/{escaped_name}[-_.](.+)\.{ext}$"))
            .map_err(&pattern_error)?;
        let github = Regex::new(&format!(r"/{escaped_name}/archive/(.+)\.{ext}$"))
            .map_err(&pattern_error)?;

        let mut pairs = Vec::new();
        for url in &config.urls {
            let version = generic
                .captures(url)
                .or_else(|| {
                    if url.to_lowercase().contains("github") {
                        github.captures(url)
                    } else {
                        None
                    }
                })
                .map(|caps| caps[1].to_string());

            match version {
                Some(version) => pairs.push((version, url.clone())),
                None => tracing::warn!("could not detect version for url {url}"),
            }
        }
        return Ok(pairs);
    }

    if config.versions.is_empty() {
        return Ok(Vec::new());
    }

    let pattern = config
        .url
        .as_ref()
        .ok_or_else(|| ConfigError::MissingField {
            library: name.to_string(),
            field: "url".to_string(),
        })?;

    Ok(config
        .versions
        .iter()
        .map(|version| (version.clone(), pattern.replace("{version}", version)))
        .collect())
}

/// Download (or reuse from cache) and extract one library version
async fn prepare_version(
    downloader: &DownloadManager,
    layout: &Layout,
    name: &str,
    version: &str,
    url: &str,
    config: &LibraryConfig,
) -> Result<(), BinforgeError> {
    let extracted = layout.extracted_dir().join(format!("{name}-{version}"));
    if extracted.exists() {
        tracing::debug!("{name}-{version} already extracted");
        return Ok(());
    }

    let archive = layout.cache_dir().join(archive_filename(url));
    if archive.exists() {
        tracing::info!("using cached {}", archive.display());
    } else {
        tracing::info!("downloading {url}");
        let result = downloader.download(url, &archive, None).await?;
        tracing::debug!(
            "downloaded {} ({} bytes, sha256 {})",
            archive.display(),
            result.size,
            result.checksum
        );
    }

    let root = if config.strip_root {
        RootHandling::StripFirst
    } else {
        RootHandling::Keep
    };

    let unpacked = match config.archive {
        ArchiveKind::TarGz => extract::unpack_tar_gz(&archive, &extracted, root),
        ArchiveKind::Zip => extract::unpack_zip(&archive, &extracted, root),
        ArchiveKind::Plain => extract::copy_plain(&archive, &extracted),
    };
    if let Err(e) = unpacked {
        // A half-written tree would short-circuit the next run.
        let _ = std::fs::remove_dir_all(&extracted);
        return Err(e.into());
    }

    remove_configured_paths(&extracted, &config.remove_from_source);

    Ok(())
}

/// Remove configured paths from a freshly extracted source tree
///
/// Failures here are warnings: the tree is still usable and the build
/// will surface any real problem.
fn remove_configured_paths(extracted: &Path, paths: &[String]) {
    for relative in paths {
        let target = extracted.join(relative);
        let removed = if target.is_dir() {
            std::fs::remove_dir_all(&target)
        } else {
            std::fs::remove_file(&target)
        };

        if let Err(e) = removed {
            tracing::warn!("cannot remove '{}': {e}", target.display());
        }
    }
}

/// Derive the cache file name for a URL
///
/// GitHub archive URLs name the file after the ref only, so the
/// repository name is prefixed to keep cache entries distinguishable.
fn archive_filename(url: &str) -> String {
    let segments: Vec<&str> = url.split('/').filter(|s| !s.is_empty()).collect();
    let last = segments.last().copied().unwrap_or("download");

    if url.contains("github") && segments.len() >= 3 && segments[segments.len() - 2] == "archive" {
        let repo = segments[segments.len() - 3];
        return format!("{repo}-{last}");
    }

    last.to_string()
}

/// Assemble the version record for one (library, version) pair
fn plan_record(
    name: &str,
    version: &str,
    config: &LibraryConfig,
    layout: &Layout,
    overrides_dir: &Path,
) -> VersionRecord {
    let stem = format!("{name}-{version}");

    let strategy = if config.commands.is_empty() {
        BuildStrategy::Generator {
            flags: config.generator_flags.clone(),
            config_override: config
                .config_override
                .for_version(version)
                .map(|file| overrides_dir.join(file)),
        }
    } else {
        BuildStrategy::Scripted {
            commands: config.commands.clone(),
        }
    };

    VersionRecord {
        source_path: layout.extracted_dir().join(&stem),
        build_path: layout.build_dir().join(&stem),
        bin_path: layout.bin_dir().join(&stem),
        dependencies: config.dependencies.for_version(version),
        strategy,
        allow_64bit: config.allow_64bit,
        built: false,
    }
}
