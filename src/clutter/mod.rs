//! Clutter database: static, declarative package-ownership rules.
//!
//! A marker maps (area type, path pattern) to one or more owning package
//! ids. Matching is scoped to exactly one area type and follows that
//! type's charset policy. The bundled table is loaded once per process.

use crate::areas::AreaType;
use crate::files::Segments;
use crate::pkgs::PkgId;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ClutterError {
    #[error("Marker needs at least one of path, contains or regex")]
    Underdefined,
    #[error("Invalid marker regex '{pattern}': {source}")]
    BadRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("Failed to parse clutter database: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Unsupported clutter database version {0}")]
    VersionMismatch(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarkerFlag {
    /// Responsible for, but did not create, the matched files.
    Custodian,
    /// Files should be kept by default (e.g. user documents).
    Keeper,
    /// Shared location used by many packages.
    Common,
    /// Marker matches its path and every descendant of it.
    Prefix,
}

/// A successful marker match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerMatch {
    pub pkgs: BTreeSet<PkgId>,
    pub flags: BTreeSet<MarkerFlag>,
}

/// One declarative ownership rule.
#[derive(Debug)]
pub struct Marker {
    pkgs: BTreeSet<PkgId>,
    area_type: AreaType,
    segments: Option<Segments>,
    contains: Option<String>,
    pattern: Option<Regex>,
    flags: BTreeSet<MarkerFlag>,
}

impl Marker {
    pub fn new(
        pkgs: impl IntoIterator<Item = PkgId>,
        area_type: AreaType,
        segments: Option<Segments>,
        contains: Option<String>,
        regex: Option<&str>,
        flags: impl IntoIterator<Item = MarkerFlag>,
    ) -> Result<Self, ClutterError> {
        if segments.is_none() && contains.is_none() && regex.is_none() {
            return Err(ClutterError::Underdefined);
        }
        let ignore_case = area_type.is_case_insensitive();
        // Anchored: markers match the whole relative path, not a substring.
        let pattern = regex
            .map(|raw| {
                RegexBuilder::new(&format!("^(?:{raw})$"))
                    .case_insensitive(ignore_case)
                    .build()
                    .map_err(|source| ClutterError::BadRegex {
                        pattern: raw.to_string(),
                        source,
                    })
            })
            .transpose()?;
        Ok(Self {
            pkgs: pkgs.into_iter().collect(),
            area_type,
            segments,
            contains,
            pattern,
            flags: flags.into_iter().collect(),
        })
    }

    pub fn area_type(&self) -> AreaType {
        self.area_type
    }

    /// Direct markers have a literal path and no regex.
    pub fn is_direct_match(&self) -> bool {
        self.pattern.is_none() && self.segments.is_some()
    }

    /// Match against a prefix-free path within the given area type.
    pub fn matches(&self, area_type: AreaType, other: &Segments) -> Option<MarkerMatch> {
        if self.area_type != area_type || other.is_empty() {
            return None;
        }

        let ignore_case = self.area_type.is_case_insensitive();

        let hit = match (&self.segments, &self.pattern) {
            (Some(path), None) => {
                if self.flags.contains(&MarkerFlag::Prefix) {
                    other.starts_with(path, ignore_case)
                } else {
                    other.matches(path, ignore_case)
                }
            }
            (path, Some(pattern)) => {
                let prefix_ok = path
                    .as_ref()
                    .map(|p| other.starts_with(p, ignore_case))
                    .unwrap_or(true);
                prefix_ok && self.contains_ok(other, ignore_case) && pattern.is_match(&other.join())
            }
            (None, None) => self.contains.is_some() && self.contains_ok(other, ignore_case),
        };

        hit.then(|| MarkerMatch {
            pkgs: self.pkgs.clone(),
            flags: self.flags.clone(),
        })
    }

    fn contains_ok(&self, other: &Segments, ignore_case: bool) -> bool {
        match &self.contains {
            None => true,
            Some(needle) => {
                let joined = other.join();
                if ignore_case {
                    joined.to_lowercase().contains(&needle.to_lowercase())
                } else {
                    joined.contains(needle)
                }
            }
        }
    }
}

/// Current clutter database format version.
const CLUTTER_DB_VERSION: u32 = 1;

/// Serialized marker entry.
#[derive(Debug, Serialize, Deserialize)]
struct MarkerDef {
    pkgs: Vec<PkgId>,
    area_type: AreaType,
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    contains: Option<String>,
    #[serde(default)]
    regex: Option<String>,
    #[serde(default)]
    flags: Vec<MarkerFlag>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ClutterDb {
    version: u32,
    markers: Vec<MarkerDef>,
}

/// Read-only marker table, indexed by area type.
pub struct ClutterRepo {
    by_area: HashMap<AreaType, Vec<Marker>>,
}

impl ClutterRepo {
    pub fn new(markers: impl IntoIterator<Item = Marker>) -> Self {
        let mut by_area: HashMap<AreaType, Vec<Marker>> = HashMap::new();
        for marker in markers {
            by_area.entry(marker.area_type()).or_default().push(marker);
        }
        Self { by_area }
    }

    /// Parse a JSON clutter database.
    pub fn from_json(raw: &str) -> Result<Self, ClutterError> {
        let db: ClutterDb = serde_json::from_str(raw)?;
        if db.version != CLUTTER_DB_VERSION {
            return Err(ClutterError::VersionMismatch(db.version));
        }
        let markers = db
            .markers
            .into_iter()
            .map(|def| {
                Marker::new(
                    def.pkgs,
                    def.area_type,
                    def.path.as_deref().map(Segments::parse),
                    def.contains,
                    def.regex.as_deref(),
                    def.flags,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;
        debug!("Loaded {} clutter markers", markers.len());
        Ok(Self::new(markers))
    }

    /// The bundled table shipped with the crate.
    pub fn bundled() -> Result<Self, ClutterError> {
        Self::from_json(include_str!("../../assets/clutter_db.json"))
    }

    /// All marker matches for a prefix-free path within one area type.
    pub fn match_segments(&self, area_type: AreaType, segments: &Segments) -> Vec<MarkerMatch> {
        self.by_area
            .get(&area_type)
            .map(|markers| {
                markers
                    .iter()
                    .filter_map(|m| m.matches(area_type, segments))
                    .collect()
            })
            .unwrap_or_default()
    }
}
