//! Finding test profiles on disk

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use gtest_tsdb::{is_profile_dir, ProfileKind};
use log::{debug, warn};
use walkdir::WalkDir;

use crate::paths::{absolutize, KeyPath};

/// Recursively collect directories under `base` that have the shape of
/// `kind` and satisfy `predicate`.
///
/// Siblings are visited in file-name order, so the result is stable for an
/// unchanged tree.
pub fn find_profiles<P>(base: &Path, kind: ProfileKind, predicate: P) -> Vec<PathBuf>
where
    P: Fn(&Path) -> bool,
{
    let mut found = Vec::new();
    for entry in WalkDir::new(base).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                debug!("Skipping unreadable entry under {}: {}", base.display(), e);
                continue;
            }
        };
        if !entry.file_type().is_dir() {
            continue;
        }
        let dir = entry.path();
        if is_profile_dir(dir, kind) && predicate(dir) {
            found.push(dir.to_path_buf());
        }
    }
    found
}

/// Turn user patterns into the ordered list of test cases.
///
/// With no patterns every profile found under `base` is returned. Otherwise
/// each pattern is resolved against `base` and glob-expanded; matches that
/// do not exist, do not have the shape of `kind`, or fail `predicate` are
/// dropped. A pattern without any surviving match is reported and skipped.
/// A directory matched by several patterns is tested once, at its first
/// position.
pub fn prepare_test_list<P>(patterns: &[String], base: &Path, kind: ProfileKind, predicate: P) -> Vec<KeyPath>
where
    P: Fn(&Path) -> bool,
{
    if patterns.is_empty() {
        return find_profiles(base, kind, predicate).iter().map(|p| KeyPath::from_path(p, base)).collect();
    }

    let mut tests = Vec::new();
    let mut seen = HashSet::new();
    for spec in patterns {
        let resolved = KeyPath::resolve(spec, base);
        let pattern = resolved.path.to_string_lossy().into_owned();

        let matches = match glob::glob(&pattern) {
            Ok(paths) => paths,
            Err(e) => {
                warn!("Invalid test pattern {}: {}", spec, e);
                continue;
            }
        };

        let mut matched = 0;
        for entry in matches {
            let path = match entry {
                Ok(path) => path,
                Err(e) => {
                    warn!("Cannot read {}: {}", e.path().display(), e.error());
                    continue;
                }
            };
            if !path.exists() {
                warn!("Path does not exist: {}", path.display());
                continue;
            }
            if !is_profile_dir(&path, kind) {
                debug!("Directory is not a {} (skipping test): {}", kind_name(kind), path.display());
                continue;
            }
            if !predicate(&path) {
                debug!("Directory does not match test criteria (skipping test): {}", path.display());
                continue;
            }
            matched += 1;
            if !seen.insert(absolutize(&path)) {
                debug!("Already selected (skipping duplicate): {}", path.display());
                continue;
            }
            tests.push(KeyPath::from_path(&path, base));
        }

        if matched == 0 {
            warn!("No profiles found for test pattern: {}", spec);
        }
    }
    tests
}

fn kind_name(kind: ProfileKind) -> &'static str {
    match kind {
        ProfileKind::Skeleton => "skeleton",
        ProfileKind::Profile => "profile",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn skeleton(dir: &Path) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join("relations"), "item:\n  i-id :integer :key\n").unwrap();
        fs::write(dir.join("item"), "1\n").unwrap();
    }

    fn tree() -> TempDir {
        let tmp = TempDir::new().unwrap();
        let base = tmp.path();
        skeleton(&base.join("b"));
        skeleton(&base.join("a"));
        skeleton(&base.join("a").join("nested"));
        skeleton(&base.join("c").join("deep"));
        fs::create_dir_all(base.join("empty")).unwrap();
        // present but empty item file
        fs::create_dir_all(base.join("hollow")).unwrap();
        fs::write(base.join("hollow").join("relations"), "item:\n  i-id :integer\n").unwrap();
        fs::write(base.join("hollow").join("item"), "").unwrap();
        tmp
    }

    fn keys(list: &[KeyPath]) -> Vec<&str> {
        list.iter().map(|kp| kp.key.as_str()).collect()
    }

    #[test]
    fn test_find_profiles_order() {
        let tmp = tree();
        let base = tmp.path();
        let found = find_profiles(base, ProfileKind::Skeleton, |_| true);
        let rel: Vec<_> = found.iter().map(|p| p.strip_prefix(base).unwrap().to_path_buf()).collect();
        assert_eq!(
            rel,
            vec![PathBuf::from("a"), PathBuf::from("a/nested"), PathBuf::from("b"), PathBuf::from("c/deep")]
        );
        assert_eq!(found, find_profiles(base, ProfileKind::Skeleton, |_| true));
    }

    #[test]
    fn test_find_profiles_predicate() {
        let tmp = tree();
        let found = find_profiles(tmp.path(), ProfileKind::Skeleton, |p| !p.ends_with("b"));
        assert_eq!(found.len(), 3);
        assert!(find_profiles(tmp.path(), ProfileKind::Profile, |_| true).is_empty());
    }

    #[test]
    fn test_empty_patterns_match_discovery() {
        let tmp = tree();
        let list = prepare_test_list(&[], tmp.path(), ProfileKind::Skeleton, |_| true);
        let found = find_profiles(tmp.path(), ProfileKind::Skeleton, |_| true);
        assert_eq!(list.iter().map(|kp| kp.path.clone()).collect::<Vec<_>>(), found);
        assert_eq!(keys(&list), vec![":a", ":a/nested", ":b", ":c/deep"]);
    }

    #[test]
    fn test_patterns_keep_order_and_skip_unmatched() {
        let tmp = tree();
        let patterns = vec![":b".to_string(), ":missing".to_string(), ":hollow".to_string(), ":[ac]*".to_string()];
        let list = prepare_test_list(&patterns, tmp.path(), ProfileKind::Skeleton, |_| true);
        // `:[ac]*` matches `a` and `c`; `c` itself is not a skeleton
        assert_eq!(keys(&list), vec![":b", ":a"]);
    }

    #[test]
    fn test_overlapping_patterns_select_once() {
        let tmp = tree();
        let patterns = vec![":b".to_string(), ":[ab]".to_string(), tmp.path().join("a").display().to_string()];
        let list = prepare_test_list(&patterns, tmp.path(), ProfileKind::Skeleton, |_| true);
        assert_eq!(keys(&list), vec![":b", ":a"]);
        assert!(crate::runner::check_unique_stems(&list).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_symlink_is_skipped() {
        let tmp = tree();
        std::os::unix::fs::symlink(tmp.path().join("gone"), tmp.path().join("broken")).unwrap();
        let patterns = vec![":broken".to_string(), ":b".to_string()];
        let list = prepare_test_list(&patterns, tmp.path(), ProfileKind::Skeleton, |_| true);
        assert_eq!(keys(&list), vec![":b"]);
    }

    #[test]
    fn test_patterns_filtered_by_predicate() {
        let tmp = tree();
        let patterns = vec![":*".to_string()];
        let list = prepare_test_list(&patterns, tmp.path(), ProfileKind::Skeleton, |p| p.ends_with("b"));
        assert_eq!(keys(&list), vec![":b"]);
    }
}
