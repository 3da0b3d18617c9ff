//! Scan settings, loadable from YAML or TOML.

use miette::{IntoDiagnostic, Result, WrapErr};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tunables for a scan run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanSettings {
    /// Drop per-package results smaller than this many bytes.
    pub min_cache_size_bytes: u64,

    /// Whether elevated (root) access is available.
    pub is_rooted: bool,

    /// Whether the alternate elevated-access bridge is in use. That bridge
    /// can only clear whole cache directories, which changes how path
    /// exclusions inside `{pkg}/cache` are honored.
    pub use_alt_bridge: bool,

    /// OS API level of the device being scanned.
    pub api_level: u32,

    /// Filter toggles.
    pub filter: FilterConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Enable the default cache directory filter.
    pub default_caches: bool,

    /// Enable the trash/recycle-bin filter.
    pub recycle_bins: bool,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            min_cache_size_bytes: 49152,
            is_rooted: false,
            use_alt_bridge: false,
            api_level: 30,
            filter: FilterConfig::default(),
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            default_caches: true,
            recycle_bins: true,
        }
    }
}

impl ScanSettings {
    /// Load settings from a file (YAML or TOML).
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to read settings file: {}", path.display()))?;

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        match extension {
            "yml" | "yaml" => serde_yaml::from_str(&contents)
                .into_diagnostic()
                .wrap_err("Failed to parse YAML settings"),
            "toml" => toml::from_str(&contents)
                .into_diagnostic()
                .wrap_err("Failed to parse TOML settings"),
            _ => {
                // Try YAML first, then TOML
                if let Ok(settings) = serde_yaml::from_str(&contents) {
                    Ok(settings)
                } else {
                    toml::from_str(&contents)
                        .into_diagnostic()
                        .wrap_err("Failed to parse settings file")
                }
            }
        }
    }

    /// Try the default settings file names under the given directory.
    pub fn from_default_locations(dir: &Path) -> Result<Self> {
        let default_names = [
            ".junkhound.yml",
            ".junkhound.yaml",
            ".junkhound.toml",
            "junkhound.yml",
            "junkhound.yaml",
            "junkhound.toml",
        ];

        for name in &default_names {
            let path = dir.join(name);
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Ok(Self::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let settings = ScanSettings::default();
        assert_eq!(settings.min_cache_size_bytes, 49152);
        assert!(!settings.is_rooted);
        assert!(settings.filter.default_caches);
    }

    #[test]
    fn test_partial_yaml_overrides() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.yml");
        fs::write(&path, "api_level: 29\nis_rooted: true\n").unwrap();
        let settings = ScanSettings::from_file(&path).unwrap();
        assert_eq!(settings.api_level, 29);
        assert!(settings.is_rooted);
        assert_eq!(settings.min_cache_size_bytes, 49152);
    }

    #[test]
    fn test_toml_parsing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "min_cache_size_bytes = 1\n\n[filter]\nrecycle_bins = false\n").unwrap();
        let settings = ScanSettings::from_file(&path).unwrap();
        assert_eq!(settings.min_cache_size_bytes, 1);
        assert!(!settings.filter.recycle_bins);
    }

    #[test]
    fn test_default_locations_fall_back() {
        let dir = TempDir::new().unwrap();
        let settings = ScanSettings::from_default_locations(dir.path()).unwrap();
        assert_eq!(settings.api_level, 30);
    }
}
