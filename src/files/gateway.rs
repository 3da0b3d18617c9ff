// Capability-only file I/O. Core code never touches std::fs directly,
// it goes through a gateway so scans can run over a direct filesystem,
// a shell/root bridge, or an offline snapshot mapped into a scratch dir.

use super::{FileType, PathLookup, VirtualPath};
use std::fs;
use std::path::PathBuf;
use thiserror::Error;
use tracing::trace;
use walkdir::WalkDir;

/// Gateway errors
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Path does not exist: {0}")]
    NotFound(String),
    #[error("I/O failure on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// File I/O capability used by area discovery and scanning.
pub trait FileGateway: Send + Sync {
    /// Whether this gateway has elevated (root/shell) access.
    fn has_elevated(&self) -> bool;

    fn exists(&self, path: &VirtualPath) -> bool;

    fn can_read(&self, path: &VirtualPath) -> bool;

    fn lookup(&self, path: &VirtualPath) -> Result<PathLookup, GatewayError>;

    /// Direct children of a directory.
    fn list(&self, path: &VirtualPath) -> Result<Vec<PathLookup>, GatewayError>;

    /// Recursive listing below a directory, the directory itself excluded.
    fn walk(&self, path: &VirtualPath) -> Result<Vec<PathLookup>, GatewayError>;

    fn delete(&self, path: &VirtualPath) -> Result<(), GatewayError>;

    /// Resolve symlinks to the canonical location, if possible.
    fn canonicalize(&self, path: &VirtualPath) -> Option<VirtualPath>;
}

/// Gateway over the local filesystem.
///
/// An optional base directory remaps absolute device paths into a scratch
/// tree, which is how tests and the offline CLI replay a device snapshot.
pub struct LocalGateway {
    base: Option<PathBuf>,
    elevated: bool,
}

impl LocalGateway {
    pub fn new(elevated: bool) -> Self {
        Self { base: None, elevated }
    }

    pub fn rooted_at(base: PathBuf, elevated: bool) -> Self {
        Self {
            base: Some(base),
            elevated,
        }
    }

    fn resolve(&self, path: &VirtualPath) -> PathBuf {
        match &self.base {
            Some(base) => {
                let mut out = base.clone();
                for seg in path.segments().iter() {
                    out.push(seg);
                }
                out
            }
            None => path.as_std_path(),
        }
    }

    fn unresolve(&self, real: &std::path::Path) -> VirtualPath {
        match &self.base {
            Some(base) => {
                let rel = real.strip_prefix(base).unwrap_or(real);
                VirtualPath::local(&format!("/{}", rel.to_string_lossy()))
            }
            None => VirtualPath::from_std(real),
        }
    }

    fn lookup_real(&self, virt: VirtualPath, real: &std::path::Path) -> Result<PathLookup, GatewayError> {
        let meta = fs::symlink_metadata(real).map_err(|source| GatewayError::Io {
            path: virt.raw(),
            source,
        })?;
        let file_type = if meta.file_type().is_symlink() {
            FileType::SymbolicLink
        } else if meta.is_dir() {
            FileType::Directory
        } else {
            FileType::File
        };
        Ok(PathLookup {
            path: virt,
            file_type,
            size: if file_type == FileType::File { meta.len() } else { 0 },
            modified: meta.modified().ok(),
        })
    }
}

impl FileGateway for LocalGateway {
    fn has_elevated(&self) -> bool {
        self.elevated
    }

    fn exists(&self, path: &VirtualPath) -> bool {
        self.resolve(path).symlink_metadata().is_ok()
    }

    fn can_read(&self, path: &VirtualPath) -> bool {
        let real = self.resolve(path);
        match real.metadata() {
            Ok(meta) if meta.is_dir() => fs::read_dir(&real).is_ok(),
            Ok(_) => fs::File::open(&real).is_ok(),
            Err(_) => false,
        }
    }

    fn lookup(&self, path: &VirtualPath) -> Result<PathLookup, GatewayError> {
        let real = self.resolve(path);
        match real.symlink_metadata() {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(GatewayError::NotFound(path.raw()))
            }
            _ => self.lookup_real(path.clone(), &real),
        }
    }

    fn list(&self, path: &VirtualPath) -> Result<Vec<PathLookup>, GatewayError> {
        let real = self.resolve(path);
        let entries = fs::read_dir(&real).map_err(|source| GatewayError::Io {
            path: path.raw(),
            source,
        })?;
        let mut results = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| GatewayError::Io {
                path: path.raw(),
                source,
            })?;
            let virt = path.child(&entry.file_name().to_string_lossy());
            results.push(self.lookup_real(virt, &entry.path())?);
        }
        Ok(results)
    }

    fn walk(&self, path: &VirtualPath) -> Result<Vec<PathLookup>, GatewayError> {
        let real = self.resolve(path);
        if !real.exists() {
            return Err(GatewayError::NotFound(path.raw()));
        }
        let mut results = Vec::new();
        for entry in WalkDir::new(&real).follow_links(false).min_depth(1) {
            let entry = entry.map_err(|err| GatewayError::Io {
                path: path.raw(),
                source: err.into(),
            })?;
            let virt = self.unresolve(entry.path());
            trace!("walk: {}", virt);
            results.push(self.lookup_real(virt, entry.path())?);
        }
        Ok(results)
    }

    fn delete(&self, path: &VirtualPath) -> Result<(), GatewayError> {
        let real = self.resolve(path);
        let meta = real.symlink_metadata().map_err(|source| GatewayError::Io {
            path: path.raw(),
            source,
        })?;
        let result = if meta.is_dir() {
            fs::remove_dir_all(&real)
        } else {
            fs::remove_file(&real)
        };
        result.map_err(|source| GatewayError::Io {
            path: path.raw(),
            source,
        })
    }

    fn canonicalize(&self, path: &VirtualPath) -> Option<VirtualPath> {
        let real = self.resolve(path).canonicalize().ok()?;
        match &self.base {
            // The base itself may sit behind symlinks, resolve it too before
            // stripping, otherwise remapped paths leak the scratch location.
            Some(base) => {
                let base = base.canonicalize().ok()?;
                let rel = real.strip_prefix(&base).ok()?;
                Some(VirtualPath::local(&format!("/{}", rel.to_string_lossy())))
            }
            None => Some(VirtualPath::from_std(&real)),
        }
    }
}
