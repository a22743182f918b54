use std::path::{Path, PathBuf};
use thiserror::Error;

/// Containment checks so a rewrite batch can only touch files under the
/// root it was pointed at.
///
/// A rewriting engine that writes files in place is one bad path away
/// from editing a dependency checkout or a build artifact; every target
/// path is canonicalized and checked before the applicator sees it.
#[derive(Debug, Clone)]
pub struct RootGuard {
    root: PathBuf,
    forbidden: Vec<PathBuf>,
}

#[derive(Error, Debug)]
pub enum SafetyError {
    #[error("path is outside the rewrite root: {path} (root: {root})")]
    OutsideRoot { path: PathBuf, root: PathBuf },

    #[error("path is in a protected directory: {path} (protected: {protected})")]
    ProtectedPath { path: PathBuf, protected: PathBuf },

    #[error("failed to canonicalize path: {0}")]
    Canonicalize(#[from] std::io::Error),
}

impl RootGuard {
    /// Create a guard rooted at `root` (canonicalized, so symlinked roots
    /// behave).
    ///
    /// Protected directories: `.git` and `target` under the root, plus
    /// the cargo registry/git caches and rustup home when they resolve.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, SafetyError> {
        let root = root.as_ref().canonicalize()?;

        let mut forbidden = Vec::new();
        for name in [".git", "target"] {
            if let Ok(dir) = root.join(name).canonicalize() {
                forbidden.push(dir);
            }
        }
        if let Some(hd) = home::home_dir() {
            for rel in [".cargo/registry", ".cargo/git", ".rustup"] {
                if let Ok(dir) = hd.join(rel).canonicalize() {
                    forbidden.push(dir);
                }
            }
        }

        Ok(Self { root, forbidden })
    }

    /// Check that a path may be rewritten; returns its canonical form.
    ///
    /// Relative paths resolve against the root. Canonicalization happens
    /// at validation time; callers that care about the window between
    /// validation and write should call [`RootGuard::revalidate`] first.
    pub fn validate_path(&self, path: impl AsRef<Path>) -> Result<PathBuf, SafetyError> {
        let path = path.as_ref();
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        };
        let canonical = absolute.canonicalize()?;
        self.check(&canonical)?;
        Ok(canonical)
    }

    /// Re-check a previously validated path immediately before write.
    pub fn revalidate(&self, path: &Path) -> Result<PathBuf, SafetyError> {
        let canonical = path.canonicalize()?;
        self.check(&canonical)?;
        Ok(canonical)
    }

    fn check(&self, canonical: &Path) -> Result<(), SafetyError> {
        if !canonical.starts_with(&self.root) {
            return Err(SafetyError::OutsideRoot {
                path: canonical.to_path_buf(),
                root: self.root.clone(),
            });
        }

        for protected in &self.forbidden {
            if canonical.starts_with(protected) {
                return Err(SafetyError::ProtectedPath {
                    path: canonical.to_path_buf(),
                    protected: protected.clone(),
                });
            }
        }

        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn accepts_file_inside_root() {
        let dir = tempfile::tempdir().unwrap();
        let guard = RootGuard::new(dir.path()).unwrap();

        let file = dir.path().join("src/lib.rs");
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(&file, b"").unwrap();

        assert!(guard.validate_path(&file).is_ok());
    }

    #[test]
    fn rejects_file_outside_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("project");
        fs::create_dir_all(&root).unwrap();
        let guard = RootGuard::new(&root).unwrap();

        let outside = dir.path().join("outside.rs");
        fs::write(&outside, b"").unwrap();

        assert!(matches!(
            guard.validate_path(&outside),
            Err(SafetyError::OutsideRoot { .. })
        ));
    }

    #[test]
    fn rejects_target_directory() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = dir.path().join("target/debug/generated.rs");
        fs::create_dir_all(artifact.parent().unwrap()).unwrap();
        fs::write(&artifact, b"").unwrap();

        let guard = RootGuard::new(dir.path()).unwrap();
        assert!(matches!(
            guard.validate_path(&artifact),
            Err(SafetyError::ProtectedPath { .. })
        ));
    }

    #[test]
    fn resolves_relative_against_root() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("main.rs");
        fs::write(&file, b"").unwrap();

        let guard = RootGuard::new(dir.path()).unwrap();
        assert!(guard.validate_path("main.rs").is_ok());
    }

    #[test]
    #[cfg(unix)]
    fn rejects_symlink_escape() {
        use std::os::unix::fs::symlink;

        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("project");
        fs::create_dir_all(&root).unwrap();

        let outside = dir.path().join("outside.rs");
        fs::write(&outside, b"").unwrap();
        let link = root.join("escape.rs");
        symlink(&outside, &link).unwrap();

        let guard = RootGuard::new(&root).unwrap();
        assert!(matches!(
            guard.validate_path(&link),
            Err(SafetyError::OutsideRoot { .. })
        ));
    }
}
