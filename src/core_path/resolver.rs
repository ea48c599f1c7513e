use crate::core_path::error::PathSecurityError;
use log::{trace, warn};
use std::ffi::OsString;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

/// Lexically normalizes `virtual_path` against `working_dir`.
///
/// Relative paths are joined onto the working directory, `.` and empty
/// segments are dropped and `..` pops one segment, never going above `/`.
/// The filesystem is not consulted and symbolic links are not followed.
pub fn normalize(virtual_path: &str, working_dir: &str) -> String {
    let absolute = if virtual_path.starts_with('/') {
        virtual_path.to_string()
    } else {
        format!("{}/{}", working_dir, virtual_path)
    };

    let mut segments: Vec<&str> = Vec::new();
    for segment in absolute.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            name => segments.push(name),
        }
    }

    if segments.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", segments.join("/"))
    }
}

/// Resolves virtual paths to real paths inside a fixed root directory.
#[derive(Debug, Clone)]
pub struct PathResolver {
    root: PathBuf,
}

impl PathResolver {
    /// Creates a resolver for `root`, which must be an existing directory.
    /// The root is canonicalized once here.
    pub fn new(root: impl AsRef<Path>) -> io::Result<Self> {
        let root = root.as_ref().canonicalize()?;
        if !root.is_dir() {
            return Err(io::Error::new(
                ErrorKind::InvalidInput,
                format!("sandbox root is not a directory: {:?}", root),
            ));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps `virtual_path`, relative to `working_dir`, to a real path.
    ///
    /// The result is the root itself or one of its descendants, checked
    /// component by component after canonicalization. Targets that do not
    /// exist yet are allowed as long as their deepest existing ancestor lies
    /// inside the root.
    pub fn resolve(
        &self,
        virtual_path: &str,
        working_dir: &str,
    ) -> Result<PathBuf, PathSecurityError> {
        if virtual_path.contains('\0') || working_dir.contains('\0') {
            return Err(PathSecurityError::InvalidPath);
        }

        let normalized = normalize(virtual_path, working_dir);
        let joined = self.root.join(normalized.trim_start_matches('/'));
        let canonical = canonicalize_partial(&joined)?;

        if !canonical.starts_with(&self.root) {
            warn!(
                "Rejected {:?} (cwd {:?}): resolves outside of the root",
                virtual_path, working_dir
            );
            return Err(PathSecurityError::EscapesRoot);
        }

        trace!("Resolved {:?} -> {:?}", normalized, canonical);
        Ok(canonical)
    }

    /// Like [`resolve`](Self::resolve), but a symbolic link in the final
    /// component is not followed.
    ///
    /// The parent directory is canonicalized and checked; the last name is
    /// re-appended as is. Operations on the directory entry itself (DELE,
    /// RMD, RNFR, RNTO) act on the link, never on its target. The root maps
    /// to itself.
    pub fn resolve_entry(
        &self,
        virtual_path: &str,
        working_dir: &str,
    ) -> Result<PathBuf, PathSecurityError> {
        if virtual_path.contains('\0') || working_dir.contains('\0') {
            return Err(PathSecurityError::InvalidPath);
        }

        let normalized = normalize(virtual_path, working_dir);
        let (parent, name) = match normalized.rsplit_once('/') {
            Some((parent, name)) if !name.is_empty() => (parent, name),
            _ => return Ok(self.root.clone()),
        };

        let parent = canonicalize_partial(&self.root.join(parent.trim_start_matches('/')))?;
        if !parent.starts_with(&self.root) {
            warn!(
                "Rejected {:?} (cwd {:?}): parent resolves outside of the root",
                virtual_path, working_dir
            );
            return Err(PathSecurityError::EscapesRoot);
        }

        let entry = parent.join(name);
        trace!("Resolved entry {:?} -> {:?}", normalized, entry);
        Ok(entry)
    }

    /// Virtual form of a real path below the root.
    pub fn virtual_path_of(&self, real: &Path) -> Option<String> {
        let relative = real.strip_prefix(&self.root).ok()?;
        let segments: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        Some(format!("/{}", segments.join("/")))
    }
}

/// Canonicalizes the deepest existing ancestor of `path` and re-appends the
/// missing tail.
fn canonicalize_partial(path: &Path) -> Result<PathBuf, PathSecurityError> {
    let mut existing = path.to_path_buf();
    let mut tail: Vec<OsString> = Vec::new();

    loop {
        match existing.canonicalize() {
            Ok(mut canonical) => {
                for name in tail.iter().rev() {
                    canonical.push(name);
                }
                return Ok(canonical);
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                // A dangling symlink is "not found" for canonicalize but still
                // exists; following it later could leave the root.
                if existing.symlink_metadata().is_ok() {
                    return Err(PathSecurityError::Unresolvable(e));
                }
                match existing.file_name() {
                    Some(name) => tail.push(name.to_os_string()),
                    None => return Err(PathSecurityError::Unresolvable(e)),
                }
                if !existing.pop() {
                    return Err(PathSecurityError::Unresolvable(e));
                }
            }
            Err(e) => return Err(PathSecurityError::Unresolvable(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    /// `<tmp>/srv/ftp` as the root with `<tmp>/srv/ftp2/secret` next to it.
    fn sandbox() -> (TempDir, PathResolver, PathBuf) {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("srv/ftp");
        let sibling = tmp.path().join("srv/ftp2");
        fs::create_dir_all(root.join("pub/docs")).unwrap();
        fs::create_dir_all(&sibling).unwrap();
        fs::write(sibling.join("secret"), b"nope").unwrap();
        fs::write(root.join("pub/readme.txt"), b"hi").unwrap();
        let resolver = PathResolver::new(&root).unwrap();
        let sibling = sibling.canonicalize().unwrap();
        (tmp, resolver, sibling)
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("/", "/"), "/");
        assert_eq!(normalize("docs", "/pub"), "/pub/docs");
        assert_eq!(normalize("./docs/../docs/", "/pub"), "/pub/docs");
        assert_eq!(normalize("../../../etc", "/pub"), "/etc");
        assert_eq!(normalize("..", "/"), "/");
        assert_eq!(normalize("//a///b", "/x"), "/a/b");
        assert_eq!(normalize("....//", "/"), "/....");
    }

    #[test]
    fn test_resolve_inside_root() {
        let (_tmp, resolver, _) = sandbox();
        let root = resolver.root().to_path_buf();

        assert_eq!(resolver.resolve("/", "/").unwrap(), root);
        assert_eq!(resolver.resolve(".", "/").unwrap(), root);
        assert_eq!(resolver.resolve("readme.txt", "/pub").unwrap(), root.join("pub/readme.txt"));
        assert_eq!(resolver.resolve("../pub/docs", "/pub").unwrap(), root.join("pub/docs"));
    }

    #[test]
    fn test_dot_dot_is_clamped_at_root() {
        let (_tmp, resolver, sibling) = sandbox();
        let root = resolver.root().to_path_buf();

        let resolved = resolver.resolve("../../../etc", ".").unwrap();
        assert_eq!(resolved, root.join("etc"));

        let resolved = resolver.resolve("../ftp2/secret", "/").unwrap();
        assert!(resolved.starts_with(&root));
        assert_ne!(resolved, sibling.join("secret"));

        let resolved = resolver.resolve("....//", "/").unwrap();
        assert_eq!(resolved, root.join("...."));
    }

    #[test]
    fn test_missing_target_resolves_below_existing_ancestor() {
        let (_tmp, resolver, _) = sandbox();
        let root = resolver.root().to_path_buf();
        assert_eq!(
            resolver.resolve("new/dir/file.bin", "/pub").unwrap(),
            root.join("pub/new/dir/file.bin")
        );
    }

    #[test]
    fn test_nul_byte_is_rejected() {
        let (_tmp, resolver, _) = sandbox();
        assert!(matches!(
            resolver.resolve("a\0b", "/"),
            Err(PathSecurityError::InvalidPath)
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_to_sibling_is_rejected() {
        let (_tmp, resolver, sibling) = sandbox();
        let root = resolver.root().to_path_buf();
        std::os::unix::fs::symlink(&sibling, root.join("escape")).unwrap();

        assert!(matches!(
            resolver.resolve("/escape/secret", "/"),
            Err(PathSecurityError::EscapesRoot)
        ));
        assert!(matches!(
            resolver.resolve("escape", "/"),
            Err(PathSecurityError::EscapesRoot)
        ));
        assert!(matches!(
            resolver.resolve("escape/new-file", "/"),
            Err(PathSecurityError::EscapesRoot)
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_symlink_is_rejected() {
        let (tmp, resolver, _) = sandbox();
        let target = tmp.path().join("outside-not-yet");
        std::os::unix::fs::symlink(&target, resolver.root().join("dangling")).unwrap();

        assert!(resolver.resolve("/dangling", "/").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_inside_root_is_allowed() {
        let (_tmp, resolver, _) = sandbox();
        let root = resolver.root().to_path_buf();
        std::os::unix::fs::symlink(root.join("pub/docs"), root.join("docs")).unwrap();

        assert_eq!(resolver.resolve("/docs", "/").unwrap(), root.join("pub/docs"));
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_entry_does_not_follow_final_link() {
        let (_tmp, resolver, sibling) = sandbox();
        let root = resolver.root().to_path_buf();
        std::os::unix::fs::symlink(root.join("pub/readme.txt"), root.join("alias")).unwrap();
        std::os::unix::fs::symlink(&sibling, root.join("escape")).unwrap();
        std::os::unix::fs::symlink(root.join("gone"), root.join("dangling")).unwrap();

        assert_eq!(resolver.resolve_entry("alias", "/").unwrap(), root.join("alias"));
        assert_eq!(resolver.resolve_entry("/escape", "/").unwrap(), root.join("escape"));
        assert_eq!(resolver.resolve_entry("/dangling", "/pub").unwrap(), root.join("dangling"));
        assert_eq!(resolver.resolve_entry("..", "/").unwrap(), root);
        assert_eq!(
            resolver.resolve_entry("docs", "/pub").unwrap(),
            root.join("pub/docs")
        );

        // Links in the parent are still followed and checked.
        assert!(matches!(
            resolver.resolve_entry("escape/secret", "/"),
            Err(PathSecurityError::EscapesRoot)
        ));
        assert!(matches!(
            resolver.resolve_entry("a\0b", "/"),
            Err(PathSecurityError::InvalidPath)
        ));
    }

    #[test]
    fn test_virtual_path_of() {
        let (_tmp, resolver, sibling) = sandbox();
        let root = resolver.root().to_path_buf();
        assert_eq!(resolver.virtual_path_of(&root).unwrap(), "/");
        assert_eq!(resolver.virtual_path_of(&root.join("pub/docs")).unwrap(), "/pub/docs");
        assert_eq!(resolver.virtual_path_of(&sibling), None);
    }

    #[test]
    fn test_root_must_be_a_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("file");
        fs::write(&file, b"x").unwrap();
        assert!(PathResolver::new(&file).is_err());
        assert!(PathResolver::new(tmp.path().join("missing")).is_err());
    }
}
