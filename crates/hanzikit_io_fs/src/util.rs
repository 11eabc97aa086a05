use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use globset::{Glob, GlobMatcher};
use regex::Regex;
use tempfile::NamedTempFile;

use crate::spec::{ConvertTreeError, EnumConvertPatternMode, SpecConvertOptions};

////////////////////////////////////////////////////////////////////////////////
// #region PatternMatching

#[derive(Debug, Clone)]
pub(crate) enum TypeConvertPatternSeq {
    Literal(Vec<String>),
    Glob(Vec<GlobMatcher>),
    Regex(Vec<Regex>),
}

impl TypeConvertPatternSeq {
    fn is_match(&self, value: &str) -> bool {
        match self {
            Self::Literal(v) => v.iter().any(|p| value.contains(p.as_str())),
            Self::Glob(v) => v.iter().any(|p| p.is_match(value)),
            Self::Regex(v) => v.iter().any(|p| p.is_match(value)),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct SpecConvertPatterns {
    pub(crate) patterns_include_files: Option<TypeConvertPatternSeq>,
    pub(crate) patterns_exclude_files: Option<TypeConvertPatternSeq>,
    pub(crate) patterns_include_dirs: Option<TypeConvertPatternSeq>,
    pub(crate) patterns_exclude_dirs: Option<TypeConvertPatternSeq>,
}

impl SpecConvertPatterns {
    pub(crate) fn from_options(
        spec_cv_options: &SpecConvertOptions,
    ) -> Result<Self, ConvertTreeError> {
        let rule_pattern = spec_cv_options.rule_pattern;
        Ok(Self {
            patterns_include_files: _compile(
                spec_cv_options.patterns_include_files.as_deref(),
                rule_pattern,
            )?,
            patterns_exclude_files: _compile(
                spec_cv_options.patterns_exclude_files.as_deref(),
                rule_pattern,
            )?,
            patterns_include_dirs: _compile(
                spec_cv_options.patterns_include_dirs.as_deref(),
                rule_pattern,
            )?,
            patterns_exclude_dirs: _compile(
                spec_cv_options.patterns_exclude_dirs.as_deref(),
                rule_pattern,
            )?,
        })
    }

    pub(crate) fn should_exclude_file(&self, name_file: &str) -> bool {
        should_exclude_by_patterns(
            name_file,
            self.patterns_include_files.as_ref(),
            self.patterns_exclude_files.as_ref(),
        )
    }

    pub(crate) fn should_exclude_dir(&self, name_dir: &str) -> bool {
        should_exclude_by_patterns(
            name_dir,
            self.patterns_include_dirs.as_ref(),
            self.patterns_exclude_dirs.as_ref(),
        )
    }
}

fn _compile(
    patterns: Option<&[String]>,
    rule_pattern: EnumConvertPatternMode,
) -> Result<Option<TypeConvertPatternSeq>, ConvertTreeError> {
    let Some(patterns) = patterns else {
        return Ok(None);
    };
    if patterns.is_empty() {
        return Ok(None);
    }

    match rule_pattern {
        EnumConvertPatternMode::Literal => {
            Ok(Some(TypeConvertPatternSeq::Literal(patterns.to_vec())))
        }
        EnumConvertPatternMode::Glob => {
            let mut l_glob = Vec::with_capacity(patterns.len());
            for pattern in patterns {
                let matcher = Glob::new(pattern)
                    .map_err(|e| {
                        ConvertTreeError::InvalidPattern(format!(
                            "Invalid pattern in include/exclude: {e}"
                        ))
                    })?
                    .compile_matcher();
                l_glob.push(matcher);
            }
            Ok(Some(TypeConvertPatternSeq::Glob(l_glob)))
        }
        EnumConvertPatternMode::Regex => {
            let mut l_regex = Vec::with_capacity(patterns.len());
            for pattern in patterns {
                let regex = Regex::new(pattern).map_err(|e| {
                    ConvertTreeError::InvalidPattern(format!(
                        "Invalid pattern in include/exclude: {e}"
                    ))
                })?;
                l_regex.push(regex);
            }
            Ok(Some(TypeConvertPatternSeq::Regex(l_regex)))
        }
    }
}

fn should_exclude_by_patterns(
    value: &str,
    patterns_include: Option<&TypeConvertPatternSeq>,
    patterns_exclude: Option<&TypeConvertPatternSeq>,
) -> bool {
    let b_included = patterns_include.is_none_or(|p| p.is_match(value));
    let b_excluded = patterns_exclude.is_some_and(|p| p.is_match(value));
    !b_included || b_excluded
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region PathUtilities

fn _normalize_path(path: &Path) -> PathBuf {
    if let Ok(resolved) = fs::canonicalize(path) {
        return resolved;
    }
    // Output roots usually do not exist yet: canonicalize the deepest
    // existing ancestor and re-append the rest.
    if let (Some(parent), Some(name)) = (path.parent(), path.file_name())
        && !parent.as_os_str().is_empty()
    {
        return _normalize_path(parent).join(name);
    }
    _absolutize_path(path)
}

fn _absolutize_path(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(path)
}

/// `path_dst` lies at or below the directory `path_dir_src`.
pub(crate) fn is_inside(path_dst: &Path, path_dir_src: &Path) -> bool {
    _normalize_path(path_dst).starts_with(_normalize_path(path_dir_src))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region FileIo

/// Read a whole file as UTF-8 text.
pub(crate) fn read_text(path_file_src: &Path) -> Result<String, io::Error> {
    let raw_bytes = fs::read(path_file_src)?;
    String::from_utf8(raw_bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Write `text` to `path_file_dst` all-or-nothing, never replacing an existing entry.
///
/// The bytes land in a temporary sibling first; on any failure the temporary
/// file is removed and `path_file_dst` stays absent.
pub(crate) fn write_text_atomic(path_file_dst: &Path, text: &str) -> Result<(), io::Error> {
    let path_dir_dst = path_file_dst.parent().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("No parent directory: {}", path_file_dst.display()),
        )
    })?;
    let mut file_tmp = NamedTempFile::new_in(path_dir_dst)?;
    file_tmp.write_all(text.as_bytes())?;
    file_tmp.as_file().sync_all()?;
    file_tmp
        .persist_noclobber(path_file_dst)
        .map_err(|e| e.error)?;
    Ok(())
}

/// Copy access/modification times from `path_file_src` onto `path_file_dst`.
pub(crate) fn copy_file_times(path_file_src: &Path, path_file_dst: &Path) -> Result<(), io::Error> {
    use filetime::{FileTime, set_file_times};

    let stat_src = fs::metadata(path_file_src)?;
    let file_time_access = FileTime::from_last_access_time(&stat_src);
    let file_time_modify = FileTime::from_last_modification_time(&stat_src);
    set_file_times(path_file_dst, file_time_access, file_time_modify)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::{SpecConvertPatterns, is_inside, read_text, write_text_atomic};
    use crate::spec::{EnumConvertPatternMode, SpecConvertOptions};

    #[test]
    fn write_text_atomic_refuses_to_clobber() {
        let tmp = TempDir::new().expect("tempdir");
        let path_file = tmp.path().join("a.txt");
        fs::write(&path_file, "original").expect("write");

        let err = write_text_atomic(&path_file, "new").expect_err("must not overwrite");
        assert_eq!(err.kind(), std::io::ErrorKind::AlreadyExists);
        assert_eq!(fs::read_to_string(&path_file).expect("read"), "original");
        assert_eq!(fs::read_dir(tmp.path()).expect("ls").count(), 1);
    }

    #[test]
    fn read_text_rejects_invalid_utf8() {
        let tmp = TempDir::new().expect("tempdir");
        let path_file = tmp.path().join("bin.dat");
        fs::write(&path_file, [0xff, 0xfe, 0x00]).expect("write");

        let err = read_text(&path_file).expect_err("invalid utf-8");
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    }

    #[test]
    fn is_inside_handles_missing_output_root() {
        let tmp = TempDir::new().expect("tempdir");
        let path_src = tmp.path().join("docs");
        fs::create_dir(&path_src).expect("mkdir");

        assert!(is_inside(&path_src.join("out/deeper"), &path_src));
        assert!(!is_inside(&tmp.path().join("docs_converted"), &path_src));
    }

    #[test]
    fn patterns_literal_glob_regex() {
        let spec_cv_options = SpecConvertOptions {
            patterns_include_files: Some(vec!["*.txt".to_string()]),
            patterns_exclude_dirs: Some(vec![".git".to_string()]),
            ..SpecConvertOptions::default()
        };
        let spec_cv_pats = SpecConvertPatterns::from_options(&spec_cv_options).expect("compile");
        assert!(!spec_cv_pats.should_exclude_file("a.txt"));
        assert!(spec_cv_pats.should_exclude_file("a.md"));
        assert!(spec_cv_pats.should_exclude_dir(".git"));
        assert!(!spec_cv_pats.should_exclude_dir("src"));

        let spec_cv_options = SpecConvertOptions {
            patterns_exclude_files: Some(vec![r"^draft_\d+".to_string()]),
            rule_pattern: EnumConvertPatternMode::Regex,
            ..SpecConvertOptions::default()
        };
        let spec_cv_pats = SpecConvertPatterns::from_options(&spec_cv_options).expect("compile");
        assert!(spec_cv_pats.should_exclude_file("draft_01.txt"));
        assert!(!spec_cv_pats.should_exclude_file("final.txt"));

        let spec_cv_options = SpecConvertOptions {
            patterns_include_files: Some(vec!["章".to_string()]),
            rule_pattern: EnumConvertPatternMode::Literal,
            ..SpecConvertOptions::default()
        };
        let spec_cv_pats = SpecConvertPatterns::from_options(&spec_cv_options).expect("compile");
        assert!(!spec_cv_pats.should_exclude_file("第一章.txt"));
        assert!(spec_cv_pats.should_exclude_file("序.txt"));
    }

    #[test]
    fn patterns_invalid_glob_rejected() {
        let spec_cv_options = SpecConvertOptions {
            patterns_include_files: Some(vec!["[".to_string()]),
            ..SpecConvertOptions::default()
        };
        assert!(SpecConvertPatterns::from_options(&spec_cv_options).is_err());
    }
}
