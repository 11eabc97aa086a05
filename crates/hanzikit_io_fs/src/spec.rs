//! Conversion request models, options and error types.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use thiserror::Error;

////////////////////////////////////////////////////////////////////////////////
// #region EnumsInit

/// Symlink handling policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumConvertSymlinkStrategy {
    /// Follow the link and convert the target file/entries.
    Dereference,
    /// Ignore symlink entries.
    SkipSymlinks,
}

/// Pattern matching mode for include/exclude lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumConvertPatternMode {
    /// Shell-like wildcards (`*`, `?`, character classes).
    Glob,
    /// Regular expression pattern.
    Regex,
    /// Substring match.
    Literal,
}

/// Kind of source node a destination was planned for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumNodeKind {
    /// Regular file (leaf).
    File,
    /// Directory (branch).
    Directory,
}

/// Per-node failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumNodeErrorKind {
    /// Source could not be read or is not valid UTF-8 text.
    IoRead,
    /// The conversion function rejected the text.
    Conversion,
    /// Converted text could not be written.
    IoWrite,
    /// Destination directory could not be created; subtree skipped.
    DirectoryCreate,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Converter

/// External text conversion function.
///
/// `mode` is passed through untouched from [`SpecConvertRequest::mode`].
pub trait TextConverter {
    /// Convert `text` according to `mode`.
    fn convert(&self, text: &str, mode: &str) -> Result<String, String>;
}

impl<F> TextConverter for F
where
    F: Fn(&str, &str) -> Result<String, String>,
{
    fn convert(&self, text: &str, mode: &str) -> Result<String, String> {
        self(text, mode)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region StructsAndErrors

/// One conversion run: what to convert and where to put it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecConvertRequest {
    /// Input file or directory.
    pub path_source: PathBuf,
    /// Output root; its parent/name go through directory disambiguation.
    pub path_output_root: PathBuf,
    /// Opaque conversion mode token.
    pub mode: String,
    /// Keep converted files under `*_converted` names.
    pub if_preserve_source: bool,
    /// Token used in `{name}_{key}_{n}` disambiguation suffixes.
    pub collision_key: String,
}

/// Engine options for `convert_tree`.
#[derive(Debug, Clone)]
pub struct SpecConvertOptions {
    /// Include patterns applied to file basename.
    pub patterns_include_files: Option<Vec<String>>,
    /// Exclude patterns applied to file basename.
    pub patterns_exclude_files: Option<Vec<String>>,
    /// Include patterns applied to directory basename.
    pub patterns_include_dirs: Option<Vec<String>>,
    /// Exclude patterns applied to directory basename.
    pub patterns_exclude_dirs: Option<Vec<String>>,
    /// Pattern interpretation mode.
    pub rule_pattern: EnumConvertPatternMode,
    /// Symlink handling behavior.
    pub rule_symlink: EnumConvertSymlinkStrategy,
    /// Copy the source modification time onto converted files.
    pub if_preserve_mtime: bool,
    /// Do not mutate filesystem; record what would happen.
    pub if_dry_run: bool,
    /// Cooperative cancellation flag, checked between node visits.
    pub token_cancel: Option<Arc<AtomicBool>>,
}

impl Default for SpecConvertOptions {
    fn default() -> Self {
        Self {
            patterns_include_files: None,
            patterns_exclude_files: None,
            patterns_include_dirs: None,
            patterns_exclude_dirs: None,
            rule_pattern: EnumConvertPatternMode::Glob,
            rule_symlink: EnumConvertSymlinkStrategy::Dereference,
            if_preserve_mtime: false,
            if_dry_run: false,
            token_cancel: None,
        }
    }
}

/// Resolved output path for one visited source node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecDestinationPlan {
    /// Source node.
    pub path_source: PathBuf,
    /// Planned destination.
    pub path_destination: PathBuf,
    /// Leaf or branch.
    pub kind: EnumNodeKind,
}

/// One recorded node failure with path + error text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecConvertError {
    /// Failed source or destination path.
    pub path: PathBuf,
    /// Failure category.
    pub kind: EnumNodeErrorKind,
    /// User-facing error text.
    pub exception: String,
}

/// Failure of a single node visit.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("Failed to read {}: {source}", .path.display())]
    IoRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to convert {}: {message}", .path.display())]
    Conversion { path: PathBuf, message: String },
    #[error("Failed to write {}: {source}", .path.display())]
    IoWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to create directory {}: {source}", .path.display())]
    DirectoryCreate {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl NodeError {
    /// Failure category for reporting.
    pub fn kind(&self) -> EnumNodeErrorKind {
        match self {
            Self::IoRead { .. } => EnumNodeErrorKind::IoRead,
            Self::Conversion { .. } => EnumNodeErrorKind::Conversion,
            Self::IoWrite { .. } => EnumNodeErrorKind::IoWrite,
            Self::DirectoryCreate { .. } => EnumNodeErrorKind::DirectoryCreate,
        }
    }

    /// Path the failure is about.
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::IoRead { path, .. }
            | Self::Conversion { path, .. }
            | Self::IoWrite { path, .. }
            | Self::DirectoryCreate { path, .. } => path,
        }
    }
}

impl From<NodeError> for SpecConvertError {
    fn from(err: NodeError) -> Self {
        Self {
            path: err.path().to_path_buf(),
            kind: err.kind(),
            exception: err.to_string(),
        }
    }
}

/// "Top-level call failed" errors (input validation / setup stage).
///
/// Any of these aborts the run before anything is written.
#[derive(Debug, Error)]
pub enum ConvertTreeError {
    /// Input path does not exist.
    #[error("Path not found: {}", .0.display())]
    PathNotFound(PathBuf),
    /// Input path exists but cannot be inspected (permissions, not a directory, ...).
    #[error("Cannot access {}: {source}", .path.display())]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Collision key is empty or not usable inside a file name.
    #[error("Invalid collision key: {0}")]
    InvalidCollisionKey(String),
    /// Invalid include/exclude pattern.
    #[error("{0}")]
    InvalidPattern(String),
    /// Output root lies inside the source directory.
    #[error(
        "Output root is inside the source directory: {} <-> {}",
        .path_source.display(),
        .path_destination.display()
    )]
    SourceDestinationOverlap {
        /// Normalized source directory.
        path_source: PathBuf,
        /// Normalized output root.
        path_destination: PathBuf,
    },
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
