//! Output path resolution: collision-free directory names, converted file
//! names and the default output root.
//!
//! Names are handled as [`OsStr`] so entries that are not valid UTF-8 keep
//! their exact bytes on the way to the output tree.

use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::spec::ConvertTreeError;

/// Suffix inserted before the extension when the source is preserved.
pub const C_SUFFIX_CONVERTED: &str = "_converted";

/// Whether any filesystem entry (file, directory or dangling symlink) sits at `path`.
pub(crate) fn is_entry_present(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// Pick a destination directory path that does not exist yet.
///
/// Returns `path_parent/name_desired` when free, otherwise the first free
/// `path_parent/{name_desired}_{collision_key}_{n}` for `n = 1, 2, ...`.
/// Nothing is created here; the caller creates the directory right away.
pub fn resolve_directory_name(
    path_parent: &Path,
    name_desired: &OsStr,
    collision_key: &str,
) -> PathBuf {
    let path_candidate = path_parent.join(name_desired);
    if !is_entry_present(&path_candidate) {
        return path_candidate;
    }

    let mut n_counter: u64 = 1;
    loop {
        let mut name_candidate = name_desired.to_os_string();
        name_candidate.push(format!("_{collision_key}_{n_counter}"));
        let path_candidate = path_parent.join(name_candidate);
        if !is_entry_present(&path_candidate) {
            return path_candidate;
        }
        n_counter += 1;
    }
}

/// Destination file name for a converted leaf.
///
/// `a.txt` stays `a.txt` when replacing; becomes `a_converted.txt` when
/// preserving. Leading dots belong to the stem, so `.bashrc` becomes
/// `.bashrc_converted`.
pub fn resolve_file_name(name_original: &OsStr, if_preserve_source: bool) -> OsString {
    if !if_preserve_source {
        return name_original.to_os_string();
    }
    let (os_stem, os_ext) = split_extension(name_original);
    let mut name_dst = os_stem.to_os_string();
    name_dst.push(C_SUFFIX_CONVERTED);
    name_dst.push(os_ext);
    name_dst
}

/// Byte index of the extension dot, ignoring leading dots.
fn find_extension_start(bytes: &[u8]) -> Option<usize> {
    let n_leading_dots = bytes.iter().take_while(|b| **b == b'.').count();
    bytes[n_leading_dots..]
        .iter()
        .rposition(|b| *b == b'.')
        .map(|n_idx| n_leading_dots + n_idx)
}

#[cfg(unix)]
fn split_extension(name: &OsStr) -> (&OsStr, &OsStr) {
    use std::os::unix::ffi::OsStrExt;

    let bytes = name.as_bytes();
    match find_extension_start(bytes) {
        Some(n_idx) => (
            OsStr::from_bytes(&bytes[..n_idx]),
            OsStr::from_bytes(&bytes[n_idx..]),
        ),
        None => (name, OsStr::new("")),
    }
}

#[cfg(not(unix))]
fn split_extension(name: &OsStr) -> (&OsStr, &OsStr) {
    // Names that are not valid Unicode keep the suffix at the end.
    let Some(c_name) = name.to_str() else {
        return (name, OsStr::new(""));
    };
    match find_extension_start(c_name.as_bytes()) {
        Some(n_idx) => {
            let (c_stem, c_ext) = c_name.split_at(n_idx);
            (OsStr::new(c_stem), OsStr::new(c_ext))
        }
        None => (name, OsStr::new("")),
    }
}

/// Default output root for `path_source`.
///
/// - explicit override: used verbatim;
/// - preserving source: `<parent>/<collision_key>`;
/// - otherwise: `<parent>/<name>_<collision_key>`.
pub fn derive_output_root(
    path_source: &Path,
    path_output_override: Option<&Path>,
    if_preserve_source: bool,
    collision_key: &str,
) -> PathBuf {
    if let Some(path_override) = path_output_override {
        return path_override.to_path_buf();
    }

    let path_parent = derive_parent_dir(path_source);
    if if_preserve_source {
        return path_parent.join(collision_key);
    }

    let mut name_root = path_source
        .file_name()
        .map(OsStr::to_os_string)
        .unwrap_or_else(|| OsString::from("output"));
    name_root.push(format!("_{collision_key}"));
    path_parent.join(name_root)
}

/// Parent directory of `path`, treating a bare relative name as living in `.`.
pub(crate) fn derive_parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Reject keys that cannot appear inside a single path component.
pub fn validate_collision_key(collision_key: &str) -> Result<(), ConvertTreeError> {
    if collision_key.is_empty() {
        return Err(ConvertTreeError::InvalidCollisionKey(
            "Collision key must not be empty.".to_string(),
        ));
    }

    let mut iter_components = Path::new(collision_key).components();
    let b_is_single_normal = matches!(iter_components.next(), Some(Component::Normal(_)))
        && iter_components.next().is_none();
    if !b_is_single_normal || collision_key.contains(['/', '\\']) {
        return Err(ConvertTreeError::InvalidCollisionKey(format!(
            "`{collision_key}` must be a plain name without path separators."
        )));
    }
    Ok(())
}
