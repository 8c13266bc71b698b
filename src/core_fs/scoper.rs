use crate::core_fs::PathError;
use log::warn;
use soft_canonicalize::soft_canonicalize;
use std::path::{Path, PathBuf};

/// A client path that has been checked against a home directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    /// Location on disk, `home` joined with the normalized client path.
    pub real: PathBuf,
    /// The same location as the client sees it, rooted at `/`.
    pub virtual_path: String,
}

impl ResolvedPath {
    pub fn is_home(&self) -> bool {
        self.virtual_path == "/"
    }
}

/// Confines client-supplied paths to an account's home directory.
///
/// Resolution is lexical first (`.`/`..` against the session's working
/// directory, a `..` above `/` is an escape), then physical: the longest
/// existing prefix is canonicalized so symlinks are followed, and the result
/// must still be inside the canonical home.
#[derive(Debug, Default, Clone)]
pub struct FsScoper;

impl FsScoper {
    pub fn new() -> Self {
        Self
    }

    pub fn resolve(&self, cwd: &str, requested: &str, home: &Path) -> Result<ResolvedPath, PathError> {
        if requested.contains('\0') || (cfg!(windows) && requested.contains('\\')) {
            return Err(PathError::InvalidName);
        }

        let mut parts: Vec<&str> = Vec::new();
        let start = if requested.starts_with('/') { "" } else { cwd };
        for component in start.split('/').chain(requested.split('/')) {
            match component {
                "" | "." => {}
                ".." => {
                    if parts.pop().is_none() {
                        warn!("Rejected traversal above home: cwd={:?} path={:?}", cwd, requested);
                        return Err(PathError::Escape);
                    }
                }
                name => parts.push(name),
            }
        }

        let home = home.canonicalize()?;
        let mut real = home.clone();
        for part in &parts {
            real.push(part);
        }
        // Catches platform-specific components (drive prefixes and the like)
        // that replace the base when joined.
        if !real.starts_with(&home) {
            warn!("Rejected path that replaced the home prefix: {:?}", requested);
            return Err(PathError::Escape);
        }

        // Follows every link that exists, dangling ones included, and keeps
        // the missing tail as-is.
        let physical = soft_canonicalize(&real)?;
        if !physical.starts_with(&home) {
            warn!("Rejected path resolving outside home through a link: {:?}", requested);
            return Err(PathError::Escape);
        }

        Ok(ResolvedPath {
            real,
            virtual_path: format!("/{}", parts.join("/")),
        })
    }
}
