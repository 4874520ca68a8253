//! Common-ancestor rebasing between an old and a new tree location.
//!
//! Comparison is path-segment aware: the split point always falls on a
//! component boundary, so two sibling directories whose names share a
//! character prefix (`img1`/`img2`) can never produce a mid-segment cut.

use std::path::{Component, Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PathError {
    /// The destination has fewer trailing components than the old target
    /// suffix, so no project base can be derived from it.
    #[error("destination {destination} is too shallow to strip suffix {suffix}")]
    SuffixMismatch {
        destination: PathBuf,
        suffix: PathBuf,
    },
}

/// Split two absolute paths into their suffixes below the longest shared
/// leading segment prefix (the old project root).
pub fn common_suffix_split(a: &Path, b: &Path) -> (PathBuf, PathBuf) {
    let mut components_a = a.components();
    let mut components_b = b.components();

    loop {
        let rest_a = components_a.clone();
        let rest_b = components_b.clone();
        match (components_a.next(), components_b.next()) {
            (Some(ca), Some(cb)) if ca == cb => {}
            _ => {
                return (
                    rest_a.as_path().to_path_buf(),
                    rest_b.as_path().to_path_buf(),
                );
            }
        }
    }
}

/// Reconstruct the two base directories under the new shared ancestor.
///
/// The ancestor is derived by stripping `target_suffix`'s component count
/// from the tail of `new_root`; both suffixes are then rejoined to it, so
/// the relative structure below the shared ancestor is preserved exactly.
pub fn rebase(
    new_root: &Path,
    target_suffix: &Path,
    source_suffix: &Path,
) -> Result<(PathBuf, PathBuf), PathError> {
    let strip = target_suffix.components().count();
    let root_components: Vec<Component<'_>> = new_root.components().collect();
    if root_components.len() < strip {
        return Err(PathError::SuffixMismatch {
            destination: new_root.to_path_buf(),
            suffix: target_suffix.to_path_buf(),
        });
    }

    let project_base: PathBuf = root_components[..root_components.len() - strip]
        .iter()
        .copied()
        .collect();
    Ok((
        project_base.join(source_suffix),
        project_base.join(target_suffix),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_at_the_shared_ancestor() {
        let (img, tgt) =
            common_suffix_split(Path::new("/data/projects/img"), Path::new("/data/projects/out"));
        assert_eq!(img, PathBuf::from("img"));
        assert_eq!(tgt, PathBuf::from("out"));
    }

    #[test]
    fn split_never_cuts_mid_segment() {
        // Character-wise comparison would split these as "1" / "2".
        let (a, b) = common_suffix_split(Path::new("/data/img1"), Path::new("/data/img2"));
        assert_eq!(a, PathBuf::from("img1"));
        assert_eq!(b, PathBuf::from("img2"));
    }

    #[test]
    fn split_handles_nested_suffixes() {
        let (a, b) = common_suffix_split(
            Path::new("/home/user/media/raw"),
            Path::new("/home/user/work/proj/out"),
        );
        assert_eq!(a, PathBuf::from("media/raw"));
        assert_eq!(b, PathBuf::from("work/proj/out"));
    }

    #[test]
    fn split_with_one_path_inside_the_other() {
        let (a, b) = common_suffix_split(Path::new("/data/proj/img"), Path::new("/data/proj"));
        assert_eq!(a, PathBuf::from("img"));
        assert_eq!(b, PathBuf::from(""));
    }

    #[test]
    fn rebase_restores_relative_structure() {
        let (img, tgt) =
            rebase(Path::new("/X/Y/out"), Path::new("out"), Path::new("img")).unwrap();
        assert_eq!(img, PathBuf::from("/X/Y/img"));
        assert_eq!(tgt, PathBuf::from("/X/Y/out"));
    }

    #[test]
    fn rebase_round_trips_a_split() {
        let old_img = Path::new("/A/B/img");
        let old_tgt = Path::new("/A/B/out");
        let (img_suffix, tgt_suffix) = common_suffix_split(old_img, old_tgt);
        let (new_img, new_tgt) =
            rebase(Path::new("/X/Y/out"), &tgt_suffix, &img_suffix).unwrap();
        assert_eq!(new_img, PathBuf::from("/X/Y/img"));
        assert_eq!(new_tgt, PathBuf::from("/X/Y/out"));
    }

    #[test]
    fn rebase_with_empty_target_suffix() {
        // Old source base lived below the old target base.
        let (img, tgt) =
            rebase(Path::new("/X/proj"), Path::new(""), Path::new("img")).unwrap();
        assert_eq!(img, PathBuf::from("/X/proj/img"));
        assert_eq!(tgt, PathBuf::from("/X/proj"));
    }

    #[test]
    fn rebase_rejects_too_shallow_destination() {
        let result = rebase(Path::new("/out"), Path::new("deep/nested/out"), Path::new("img"));
        assert!(matches!(result, Err(PathError::SuffixMismatch { .. })));
    }
}
