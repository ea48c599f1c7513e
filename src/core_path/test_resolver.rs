// Property tests for sandbox containment

#[cfg(test)]
mod tests {
    use super::super::*;
    use proptest::prelude::*;
    use std::fs;
    use std::path::PathBuf;
    use std::sync::OnceLock;
    use tempfile::TempDir;

    struct Fixture {
        _tmp: TempDir,
        resolver: PathResolver,
        root: PathBuf,
    }

    /// Root `<tmp>/srv/ftp` with a lexical sibling `<tmp>/srv/ftp2` and, on
    /// unix, a symlink `link` inside the root pointing at the sibling.
    fn fixture() -> &'static Fixture {
        static FIXTURE: OnceLock<Fixture> = OnceLock::new();
        FIXTURE.get_or_init(|| {
            let tmp = tempfile::tempdir().unwrap();
            let root = tmp.path().join("srv/ftp");
            let sibling = tmp.path().join("srv/ftp2");
            fs::create_dir_all(root.join("a/b")).unwrap();
            fs::create_dir_all(&sibling).unwrap();
            fs::write(sibling.join("etc"), b"secret").unwrap();
            #[cfg(unix)]
            std::os::unix::fs::symlink(&sibling, root.join("link")).unwrap();

            let resolver = PathResolver::new(&root).unwrap();
            let root = resolver.root().to_path_buf();
            Fixture {
                _tmp: tmp,
                resolver,
                root,
            }
        })
    }

    fn segment() -> impl Strategy<Value = &'static str> {
        prop::sample::select(vec![
            "..", ".", "", "a", "b", "....", "ftp2", "etc", "link", "srv", "..a", "~",
        ])
    }

    fn virtual_path() -> impl Strategy<Value = String> {
        (any::<bool>(), prop::collection::vec(segment(), 0..8)).prop_map(|(absolute, segs)| {
            let joined = segs.join("/");
            if absolute {
                format!("/{}", joined)
            } else {
                joined
            }
        })
    }

    proptest! {
        #[test]
        fn prop_resolved_paths_stay_inside_root(path in virtual_path(), cwd in virtual_path()) {
            let fx = fixture();
            let cwd = normalize(&cwd, "/");
            if let Ok(real) = fx.resolver.resolve(&path, &cwd) {
                prop_assert!(real.starts_with(&fx.root), "{:?} escaped to {:?}", path, real);
            }
        }

        #[test]
        fn prop_normalized_paths_are_absolute_and_clean(path in virtual_path(), cwd in virtual_path()) {
            let normalized = normalize(&path, &normalize(&cwd, "/"));
            prop_assert!(normalized.starts_with('/'));
            prop_assert!(!normalized.contains("//"));
            prop_assert!(normalized.split('/').all(|s| s != "." && s != ".."));
        }
    }

    #[test]
    fn test_adversarial_inputs() {
        let fx = fixture();
        for input in ["../../../etc", "....//", "/../ftp2/etc", "a/../../..", "/a/b/../../../../ftp2"] {
            let real = fx.resolver.resolve(input, "/").unwrap();
            assert!(real.starts_with(&fx.root), "{} -> {:?}", input, real);
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_link_to_sibling_never_resolves() {
        let fx = fixture();
        for input in ["link", "/link/etc", "a/../link/etc", "link/new"] {
            assert!(fx.resolver.resolve(input, "/").is_err(), "{} resolved", input);
        }
    }
}
