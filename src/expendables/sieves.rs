//! Config-driven sieves shared by the concrete filters.

use super::SieveError;
use crate::areas::AreaType;
use crate::files::Segments;
use crate::pkgs::PkgId;
use regex::{Regex, RegexBuilder};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::sync::OnceLock;
use tracing::debug;

const TRASH_TABLE_VERSION: u32 = 1;

/// One matching rule. Deserialized from bundled tables or built in code;
/// at least one of `contains`/`ancestors`/`patterns` must be present.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MatchConfig {
    pub pkgs: Option<BTreeSet<PkgId>>,
    pub area_types: Option<BTreeSet<AreaType>>,
    pub contains: Option<Vec<String>>,
    pub ancestors: Option<Vec<String>>,
    pub patterns: Option<Vec<String>>,
    pub exclusions: Option<Vec<String>>,
}

/// Pre-compiled in both case flavors; the area decides at match time.
#[derive(Debug)]
struct CompiledPattern {
    exact: Regex,
    folded: Regex,
}

impl CompiledPattern {
    fn compile(raw: &str) -> Result<Self, SieveError> {
        // Full-string match against the joined relative path.
        let anchored = format!("^(?:{raw})$");
        let build = |ignore_case: bool| {
            RegexBuilder::new(&anchored)
                .case_insensitive(ignore_case)
                .build()
                .map_err(|source| SieveError::BadRegex {
                    pattern: raw.to_string(),
                    source,
                })
        };
        Ok(Self {
            exact: build(false)?,
            folded: build(true)?,
        })
    }

    fn is_match(&self, haystack: &str, ignore_case: bool) -> bool {
        if ignore_case {
            self.folded.is_match(haystack)
        } else {
            self.exact.is_match(haystack)
        }
    }
}

#[derive(Debug)]
struct CompiledConfig {
    pkgs: Option<BTreeSet<PkgId>>,
    area_types: Option<BTreeSet<AreaType>>,
    contains: Vec<String>,
    ancestors: Vec<Segments>,
    patterns: Vec<CompiledPattern>,
    exclusions: Vec<String>,
}

impl CompiledConfig {
    fn compile(config: MatchConfig) -> Result<Self, SieveError> {
        let contains = config.contains.unwrap_or_default();
        let ancestors: Vec<Segments> = config
            .ancestors
            .unwrap_or_default()
            .iter()
            .map(|raw| Segments::parse(raw))
            .collect();
        let patterns = config
            .patterns
            .unwrap_or_default()
            .iter()
            .map(|raw| CompiledPattern::compile(raw))
            .collect::<Result<Vec<_>, _>>()?;
        if contains.is_empty() && ancestors.is_empty() && patterns.is_empty() {
            return Err(SieveError::Underdefined);
        }
        Ok(Self {
            pkgs: config.pkgs,
            area_types: config.area_types,
            contains,
            ancestors,
            patterns,
            exclusions: config.exclusions.unwrap_or_default(),
        })
    }

    fn matches(&self, pkg: &PkgId, area_type: AreaType, segments: &Segments) -> bool {
        if let Some(pkgs) = &self.pkgs {
            if !pkgs.contains(pkg) {
                return false;
            }
        }
        if let Some(area_types) = &self.area_types {
            if !area_types.contains(&area_type) {
                return false;
            }
        }

        let ignore_case = area_type.is_case_insensitive();
        let joined = segments.join();
        let folded = joined.to_lowercase();

        // Exclusions veto the whole config before anything can accept.
        let excluded = self.exclusions.iter().any(|needle| {
            if ignore_case {
                folded.contains(&needle.to_lowercase())
            } else {
                joined.contains(needle)
            }
        });
        if excluded {
            return false;
        }

        let by_contains = self.contains.iter().any(|needle| {
            if ignore_case {
                folded.contains(&needle.to_lowercase())
            } else {
                joined.contains(needle)
            }
        });
        let by_ancestor = self
            .ancestors
            .iter()
            .any(|ancestor| segments.starts_with(ancestor, ignore_case));
        let by_pattern = self
            .patterns
            .iter()
            .any(|pattern| pattern.is_match(&joined, ignore_case));

        by_contains || by_ancestor || by_pattern
    }
}

/// A set of `MatchConfig`s; a path matches when any config accepts it.
#[derive(Debug)]
pub struct DynamicSieve {
    configs: Vec<CompiledConfig>,
}

impl DynamicSieve {
    pub fn new(configs: Vec<MatchConfig>) -> Result<Self, SieveError> {
        if configs.is_empty() {
            return Err(SieveError::Empty);
        }
        let configs = configs
            .into_iter()
            .map(CompiledConfig::compile)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { configs })
    }

    pub fn matches(&self, pkg: &PkgId, area_type: AreaType, segments: &Segments) -> bool {
        self.configs
            .iter()
            .any(|config| config.matches(pkg, area_type, segments))
    }
}

#[derive(Debug, Deserialize)]
struct SieveTable {
    version: u32,
    entries: Vec<MatchConfig>,
}

/// The bundled trash-pattern table, parsed once on first use.
#[derive(Debug, Default)]
pub struct JsonSieve {
    sieve: OnceLock<DynamicSieve>,
}

impl JsonSieve {
    const TABLE: &'static str = include_str!("../../assets/db_trash_files.json");

    pub fn new() -> Self {
        Self::default()
    }

    pub fn initialize(&self) -> Result<(), SieveError> {
        if self.sieve.get().is_some() {
            return Ok(());
        }
        let table: SieveTable = serde_json::from_str(Self::TABLE)?;
        if table.version != TRASH_TABLE_VERSION {
            return Err(SieveError::VersionMismatch(table.version));
        }
        let sieve = DynamicSieve::new(table.entries)?;
        debug!("Loaded trash sieve table v{}", table.version);
        let _ = self.sieve.set(sieve);
        Ok(())
    }

    pub fn matches(&self, pkg: &PkgId, area_type: AreaType, segments: &Segments) -> bool {
        match self.sieve.get() {
            Some(sieve) => sieve.matches(pkg, area_type, segments),
            None => false,
        }
    }
}
