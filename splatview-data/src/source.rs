//! Asset source resolution.
//!
//! Decides which file(s) a load session should attempt, in order. The
//! deployment base path is plain configuration; there is no
//! deployment-detection logic here.

use std::path::{Path, PathBuf};
use tracing::warn;

/// Where a source came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    /// Caller-supplied override.
    User,
    /// Primary source under the configured base path.
    Default,
    /// Same-directory fallback attempted after the primary fails.
    Fallback,
}

/// One candidate location for the asset. Immutable once chosen for a
/// load attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetSource {
    pub path: PathBuf,
    pub provenance: Provenance,
}

impl AssetSource {
    pub fn new(path: impl Into<PathBuf>, provenance: Provenance) -> Self {
        Self {
            path: path.into(),
            provenance,
        }
    }
}

impl std::fmt::Display for AssetSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// Static deployment configuration for source resolution.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// Canonical directory assets are deployed under.
    pub base_dir: PathBuf,
    /// Default asset filename used when no override is given.
    pub default_asset: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("assets"),
            default_asset: "scene.ply".to_string(),
        }
    }
}

/// Resolve the ordered list of sources for a load session. Always returns
/// at least one element; with no override, the primary (base-path) source
/// comes first and the same-directory fallback second.
pub fn resolve(config: &SourceConfig, override_path: Option<&str>) -> Vec<AssetSource> {
    if let Some(raw) = override_path {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            // Malformed override: recover with default resolution.
            warn!("ignoring empty --file override");
        } else {
            let path = Path::new(trimmed);
            let resolved = if path.is_absolute() {
                path.to_path_buf()
            } else {
                config.base_dir.join(path)
            };
            return vec![AssetSource::new(resolved, Provenance::User)];
        }
    }

    vec![
        AssetSource::new(
            config.base_dir.join(&config.default_asset),
            Provenance::Default,
        ),
        AssetSource::new(&config.default_asset, Provenance::Fallback),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SourceConfig {
        SourceConfig {
            base_dir: PathBuf::from("/srv/viewer/assets"),
            default_asset: "scene.ply".to_string(),
        }
    }

    #[test]
    fn no_override_yields_default_then_fallback() {
        let sources = resolve(&config(), None);
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].provenance, Provenance::Default);
        assert_eq!(sources[0].path, PathBuf::from("/srv/viewer/assets/scene.ply"));
        assert_eq!(sources[1].provenance, Provenance::Fallback);
        assert_eq!(sources[1].path, PathBuf::from("scene.ply"));
    }

    #[test]
    fn absolute_override_is_sole_source() {
        let sources = resolve(&config(), Some("/data/export.ply"));
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].provenance, Provenance::User);
        assert_eq!(sources[0].path, PathBuf::from("/data/export.ply"));
    }

    #[test]
    fn relative_override_is_rebased() {
        let sources = resolve(&config(), Some("captures/garden.ply"));
        assert_eq!(sources.len(), 1);
        assert_eq!(
            sources[0].path,
            PathBuf::from("/srv/viewer/assets/captures/garden.ply")
        );
    }

    #[test]
    fn bare_filename_override_is_rebased() {
        let sources = resolve(&config(), Some("garden.ply"));
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].path, PathBuf::from("/srv/viewer/assets/garden.ply"));
    }

    #[test]
    fn malformed_override_falls_back_to_default_resolution() {
        let sources = resolve(&config(), Some("   "));
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].provenance, Provenance::Default);
    }
}
