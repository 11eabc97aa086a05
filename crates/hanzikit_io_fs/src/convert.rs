//! Filesystem tree traversal and conversion orchestration.

use std::collections::HashSet;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;

use tracing::{debug, error, info, warn};

use crate::report::{ReportConvert, ReportConvertBuilder};
use crate::resolve::{
    derive_parent_dir, resolve_directory_name, resolve_file_name, validate_collision_key,
};
use crate::spec::{
    ConvertTreeError, EnumConvertSymlinkStrategy, EnumNodeKind, NodeError, SpecConvertOptions,
    SpecConvertRequest, TextConverter,
};
use crate::util::{SpecConvertPatterns, copy_file_times, is_inside, read_text, write_text_atomic};

/// One pending node visit: a source node and the directory its output goes into.
#[derive(Debug, Clone)]
struct SpecWorkItem {
    path_node_src: PathBuf,
    path_parent_dst: PathBuf,
    /// Desired output name; the source name when `None`.
    name_dst: Option<OsString>,
    kind: EnumNodeKind,
}

#[derive(Debug, Clone)]
struct SpecChildEntry {
    path_entry: PathBuf,
    name_entry: OsString,
    kind: EnumNodeKind,
}

struct SpecConvertContext<'a, C: TextConverter + ?Sized> {
    spec_cv_request: &'a SpecConvertRequest,
    spec_cv_options: &'a SpecConvertOptions,
    spec_cv_pats: SpecConvertPatterns,
    converter: &'a C,
    builder_cv_report: ReportConvertBuilder,
    set_visited_dirs: HashSet<(u64, u64)>,
    /// Destination directories created by this run.
    set_output_dirs: HashSet<(u64, u64)>,
}

/// Convert the file or directory tree at `request.path_source`.
///
/// The root goes through the same naming rules as every nested node:
/// - directory root: mirrored into `resolve_directory_name(parent(output_root), name(output_root))`;
/// - file root: written into a freshly resolved directory at the same place,
///   so output never lands in the source's own directory.
///
/// Nodes are visited depth-first, pre-order, children sorted by name. A
/// failing file is recorded and skipped; a failing destination directory
/// skips its subtree only.
///
/// Returns [`ReportConvert`] when the run completes (with possible per-node
/// errors stored in the report). Returns [`ConvertTreeError`] only for
/// validation failures, before anything is written.
pub fn convert_tree<C>(
    spec_cv_request: &SpecConvertRequest,
    spec_cv_options: &SpecConvertOptions,
    converter: &C,
) -> Result<ReportConvert, ConvertTreeError>
where
    C: TextConverter + ?Sized,
{
    validate_collision_key(&spec_cv_request.collision_key)?;

    let path_src = &spec_cv_request.path_source;
    let meta_src = inspect_source_path(path_src)?;
    let kind_root = if meta_src.is_dir() {
        EnumNodeKind::Directory
    } else {
        EnumNodeKind::File
    };

    let path_output_root = &spec_cv_request.path_output_root;
    if kind_root == EnumNodeKind::Directory && is_inside(path_output_root, path_src) {
        return Err(ConvertTreeError::SourceDestinationOverlap {
            path_source: path_src.to_path_buf(),
            path_destination: path_output_root.to_path_buf(),
        });
    }

    let spec_cv_pats = SpecConvertPatterns::from_options(spec_cv_options)?;
    let mut spec_cv_ctx = SpecConvertContext {
        spec_cv_request,
        spec_cv_options,
        spec_cv_pats,
        converter,
        builder_cv_report: ReportConvertBuilder::default(),
        set_visited_dirs: HashSet::new(),
        set_output_dirs: HashSet::new(),
    };

    let (path_parent_root, name_root) = split_output_root(path_output_root, path_src);
    info!(
        "Converting {} into {} (mode={})",
        path_src.display(),
        path_parent_root.join(&name_root).display(),
        spec_cv_request.mode
    );
    spec_cv_ctx.builder_cv_report.add_scanned();
    spec_cv_ctx.builder_cv_report.add_matched();

    let l_stack = match kind_root {
        EnumNodeKind::Directory => vec![SpecWorkItem {
            path_node_src: path_src.to_path_buf(),
            path_parent_dst: path_parent_root,
            name_dst: Some(name_root),
            kind: EnumNodeKind::Directory,
        }],
        EnumNodeKind::File => {
            let path_dir_dst = resolve_directory_name(
                &path_parent_root,
                &name_root,
                &spec_cv_request.collision_key,
            );
            spec_cv_ctx.builder_cv_report.add_plan(
                path_src.to_path_buf(),
                path_dir_dst.clone(),
                EnumNodeKind::Directory,
            );
            if !create_destination_dir(&path_dir_dst, &mut spec_cv_ctx) {
                return Ok(spec_cv_ctx.builder_cv_report.build());
            }
            vec![SpecWorkItem {
                path_node_src: path_src.to_path_buf(),
                path_parent_dst: path_dir_dst,
                name_dst: None,
                kind: EnumNodeKind::File,
            }]
        }
    };

    drain_work_list(l_stack, &mut spec_cv_ctx);
    let report = spec_cv_ctx.builder_cv_report.build();
    info!("{report}");
    Ok(report)
}

/// Metadata of the conversion input, following symlinks.
///
/// A missing path is [`ConvertTreeError::PathNotFound`]; any other failure
/// keeps its I/O cause.
pub fn inspect_source_path(path_src: &Path) -> Result<fs::Metadata, ConvertTreeError> {
    fs::metadata(path_src).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => ConvertTreeError::PathNotFound(path_src.to_path_buf()),
        _ => ConvertTreeError::SourceUnreadable {
            path: path_src.to_path_buf(),
            source,
        },
    })
}

/// Split the output root into the parent passed to the resolver and the desired name.
///
/// Roots without a final name component (`.`, `..`, `/`) are used as the
/// parent, with the source name as the desired name.
fn split_output_root(path_output_root: &Path, path_src: &Path) -> (PathBuf, OsString) {
    if let Some(name) = path_output_root.file_name() {
        return (derive_parent_dir(path_output_root), name.to_os_string());
    }
    let name_src = fs::canonicalize(path_src)
        .ok()
        .and_then(|p| p.file_name().map(OsStr::to_os_string))
        .unwrap_or_else(|| OsString::from("output"));
    (path_output_root.to_path_buf(), name_src)
}

fn is_cancel_requested<C: TextConverter + ?Sized>(spec_cv_ctx: &SpecConvertContext<'_, C>) -> bool {
    spec_cv_ctx
        .spec_cv_options
        .token_cancel
        .as_ref()
        .is_some_and(|token| token.load(Ordering::Relaxed))
}

fn drain_work_list<C: TextConverter + ?Sized>(
    mut l_stack: Vec<SpecWorkItem>,
    spec_cv_ctx: &mut SpecConvertContext<'_, C>,
) {
    while let Some(spec_item) = l_stack.pop() {
        if is_cancel_requested(spec_cv_ctx) {
            let c_msg = format!(
                "Cancelled before {}; {} pending node(s) not visited",
                spec_item.path_node_src.display(),
                l_stack.len() + 1
            );
            warn!("{c_msg}");
            spec_cv_ctx.builder_cv_report.add_warning(c_msg);
            spec_cv_ctx.builder_cv_report.mark_cancelled();
            return;
        }

        let kind = spec_item.kind;
        match kind {
            EnumNodeKind::File => handle_file_item(spec_item, spec_cv_ctx),
            EnumNodeKind::Directory => {
                let l_children = handle_dir_item(spec_item, spec_cv_ctx);
                // Reverse so the smallest name is popped first.
                l_stack.extend(l_children.into_iter().rev());
            }
        }
    }
}

fn node_name(spec_item: &SpecWorkItem) -> OsString {
    if let Some(name) = &spec_item.name_dst {
        return name.clone();
    }
    spec_item
        .path_node_src
        .file_name()
        .map(OsStr::to_os_string)
        .unwrap_or_default()
}

fn handle_file_item<C: TextConverter + ?Sized>(
    spec_item: SpecWorkItem,
    spec_cv_ctx: &mut SpecConvertContext<'_, C>,
) {
    let name_dst = resolve_file_name(
        &node_name(&spec_item),
        spec_cv_ctx.spec_cv_request.if_preserve_source,
    );
    let path_file_dst = spec_item.path_parent_dst.join(name_dst);
    spec_cv_ctx.builder_cv_report.add_plan(
        spec_item.path_node_src.clone(),
        path_file_dst.clone(),
        EnumNodeKind::File,
    );

    if spec_cv_ctx.spec_cv_options.if_dry_run {
        debug!(
            "Dry run: {} -> {}",
            spec_item.path_node_src.display(),
            path_file_dst.display()
        );
        spec_cv_ctx.builder_cv_report.add_skipped();
        return;
    }

    match convert_file(
        &spec_item.path_node_src,
        &path_file_dst,
        &spec_cv_ctx.spec_cv_request.mode,
        spec_cv_ctx.converter,
    ) {
        Ok(()) => {
            info!(
                "Converted {} -> {}",
                spec_item.path_node_src.display(),
                path_file_dst.display()
            );
            spec_cv_ctx.builder_cv_report.add_converted();
        }
        Err(e) => {
            error!("{e}");
            spec_cv_ctx.builder_cv_report.add_error(e);
            return;
        }
    }

    if spec_cv_ctx.spec_cv_options.if_preserve_mtime
        && let Err(e) = copy_file_times(&spec_item.path_node_src, &path_file_dst)
    {
        let c_msg = format!(
            "Failed to preserve timestamps on {} ({e})",
            path_file_dst.display()
        );
        warn!("{c_msg}");
        spec_cv_ctx.builder_cv_report.add_warning(c_msg);
    }
}

/// Read, convert and write one leaf. The destination parent must exist.
fn convert_file<C: TextConverter + ?Sized>(
    path_file_src: &Path,
    path_file_dst: &Path,
    mode: &str,
    converter: &C,
) -> Result<(), NodeError> {
    let text_src = read_text(path_file_src).map_err(|source| NodeError::IoRead {
        path: path_file_src.to_path_buf(),
        source,
    })?;
    let text_dst = converter
        .convert(&text_src, mode)
        .map_err(|message| NodeError::Conversion {
            path: path_file_src.to_path_buf(),
            message,
        })?;
    write_text_atomic(path_file_dst, &text_dst).map_err(|source| NodeError::IoWrite {
        path: path_file_dst.to_path_buf(),
        source,
    })
}

/// Returns `false` when the directory could not be created.
fn create_destination_dir<C: TextConverter + ?Sized>(
    path_dir_dst: &Path,
    spec_cv_ctx: &mut SpecConvertContext<'_, C>,
) -> bool {
    if spec_cv_ctx.spec_cv_options.if_dry_run {
        debug!("Dry run: mkdir {}", path_dir_dst.display());
        return true;
    }
    match create_fresh_dir(path_dir_dst) {
        Ok(()) => {
            debug!("Created {}", path_dir_dst.display());
            spec_cv_ctx.builder_cv_report.add_dir_created();
            remember_output_dir(path_dir_dst, spec_cv_ctx);
            true
        }
        Err(source) => {
            let err = NodeError::DirectoryCreate {
                path: path_dir_dst.to_path_buf(),
                source,
            };
            error!("{err}; subtree skipped");
            spec_cv_ctx.builder_cv_report.add_error(err);
            false
        }
    }
}

/// Create `path_dir_dst` itself, failing if anything already sits there.
fn create_fresh_dir(path_dir_dst: &Path) -> io::Result<()> {
    if let Some(path_parent) = path_dir_dst.parent()
        && !path_parent.as_os_str().is_empty()
    {
        fs::create_dir_all(path_parent)?;
    }
    fs::create_dir(path_dir_dst)
}

fn remember_output_dir<C: TextConverter + ?Sized>(
    path_dir_dst: &Path,
    spec_cv_ctx: &mut SpecConvertContext<'_, C>,
) {
    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;

        if let Ok(stat_dir) = fs::metadata(path_dir_dst) {
            spec_cv_ctx
                .set_output_dirs
                .insert((stat_dir.dev(), stat_dir.ino()));
        }
    }
    #[cfg(not(unix))]
    {
        let _ = (path_dir_dst, &spec_cv_ctx.set_output_dirs);
    }
}

/// Returns `false` when this directory was already entered through another
/// symlink, or resolves into a destination directory of this run.
fn should_enter_dir<C: TextConverter + ?Sized>(
    path_dir_src: &Path,
    spec_cv_ctx: &mut SpecConvertContext<'_, C>,
) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;

        let Ok(stat_dir) = fs::metadata(path_dir_src) else {
            return true;
        };
        let tup_id = (stat_dir.dev(), stat_dir.ino());
        if spec_cv_ctx.set_output_dirs.contains(&tup_id) {
            let c_msg = format!(
                "Skipped {}: it resolves into the output tree",
                path_dir_src.display()
            );
            warn!("{c_msg}");
            spec_cv_ctx.builder_cv_report.add_warning(c_msg);
            spec_cv_ctx.builder_cv_report.add_skipped();
            return false;
        }
        if !spec_cv_ctx.set_visited_dirs.insert(tup_id) {
            let c_msg = format!("Symlink loop detected: {}", path_dir_src.display());
            warn!("{c_msg}");
            spec_cv_ctx.builder_cv_report.add_warning(c_msg);
            spec_cv_ctx.builder_cv_report.add_skipped();
            return false;
        }
    }
    #[cfg(not(unix))]
    {
        let _ = (path_dir_src, &spec_cv_ctx.set_visited_dirs, &spec_cv_ctx.set_output_dirs);
    }
    true
}

fn handle_dir_item<C: TextConverter + ?Sized>(
    spec_item: SpecWorkItem,
    spec_cv_ctx: &mut SpecConvertContext<'_, C>,
) -> Vec<SpecWorkItem> {
    if !should_enter_dir(&spec_item.path_node_src, spec_cv_ctx) {
        return Vec::new();
    }

    let path_dir_dst = resolve_directory_name(
        &spec_item.path_parent_dst,
        &node_name(&spec_item),
        &spec_cv_ctx.spec_cv_request.collision_key,
    );
    spec_cv_ctx.builder_cv_report.add_plan(
        spec_item.path_node_src.clone(),
        path_dir_dst.clone(),
        EnumNodeKind::Directory,
    );
    if !create_destination_dir(&path_dir_dst, spec_cv_ctx) {
        return Vec::new();
    }

    list_children(&spec_item.path_node_src, spec_cv_ctx)
        .into_iter()
        .map(|spec_child| SpecWorkItem {
            path_node_src: spec_child.path_entry,
            path_parent_dst: path_dir_dst.clone(),
            name_dst: None,
            kind: spec_child.kind,
        })
        .collect()
}

/// Children of `path_dir_src` that should be visited, sorted by name.
fn list_children<C: TextConverter + ?Sized>(
    path_dir_src: &Path,
    spec_cv_ctx: &mut SpecConvertContext<'_, C>,
) -> Vec<SpecChildEntry> {
    let iter_entries = match fs::read_dir(path_dir_src) {
        Ok(iter) => iter,
        Err(source) => {
            let err = NodeError::IoRead {
                path: path_dir_src.to_path_buf(),
                source,
            };
            error!("{err}");
            spec_cv_ctx.builder_cv_report.add_error(err);
            return Vec::new();
        }
    };

    let enum_rule_symlink = spec_cv_ctx.spec_cv_options.rule_symlink;
    let mut l_children: Vec<SpecChildEntry> = Vec::new();

    for _entry_res in iter_entries {
        let entry = match _entry_res {
            Ok(v) => v,
            Err(e) => {
                let c_msg = format!(
                    "Failed to read directory entry under {} ({e})",
                    path_dir_src.display()
                );
                warn!("{c_msg}");
                spec_cv_ctx.builder_cv_report.add_warning(c_msg);
                continue;
            }
        };

        let path_entry = entry.path();
        let name_entry = entry.file_name();
        let c_name = name_entry.to_string_lossy().to_string();
        let cfg_file_type = match entry.file_type() {
            Ok(v) => v,
            Err(source) => {
                let err = NodeError::IoRead {
                    path: path_entry,
                    source,
                };
                error!("{err}");
                spec_cv_ctx.builder_cv_report.add_error(err);
                continue;
            }
        };
        spec_cv_ctx.builder_cv_report.add_scanned();

        let b_is_symlink = cfg_file_type.is_symlink();
        if b_is_symlink && enum_rule_symlink == EnumConvertSymlinkStrategy::SkipSymlinks {
            debug!("Symlink skipped: {}", path_entry.display());
            spec_cv_ctx.builder_cv_report.add_skipped();
            continue;
        }

        let kind = if b_is_symlink {
            match fs::metadata(&path_entry) {
                Ok(meta_target) if meta_target.is_dir() => EnumNodeKind::Directory,
                Ok(meta_target) if meta_target.is_file() => EnumNodeKind::File,
                Ok(_) => {
                    let c_msg = format!("Special file target skipped: {}", path_entry.display());
                    warn!("{c_msg}");
                    spec_cv_ctx.builder_cv_report.add_warning(c_msg);
                    spec_cv_ctx.builder_cv_report.add_skipped();
                    continue;
                }
                Err(source) => {
                    let err = NodeError::IoRead {
                        path: path_entry,
                        source,
                    };
                    error!("Broken symlink: {err}");
                    spec_cv_ctx.builder_cv_report.add_error(err);
                    continue;
                }
            }
        } else if cfg_file_type.is_dir() {
            EnumNodeKind::Directory
        } else if cfg_file_type.is_file() {
            EnumNodeKind::File
        } else {
            let c_msg = format!("Special file skipped: {}", path_entry.display());
            warn!("{c_msg}");
            spec_cv_ctx.builder_cv_report.add_warning(c_msg);
            spec_cv_ctx.builder_cv_report.add_skipped();
            continue;
        };

        let b_excluded = match kind {
            EnumNodeKind::Directory => spec_cv_ctx.spec_cv_pats.should_exclude_dir(&c_name),
            EnumNodeKind::File => spec_cv_ctx.spec_cv_pats.should_exclude_file(&c_name),
        };
        if b_excluded {
            continue;
        }
        spec_cv_ctx.builder_cv_report.add_matched();

        l_children.push(SpecChildEntry {
            path_entry,
            name_entry,
            kind,
        });
    }

    l_children.sort_by(|a, b| a.name_entry.cmp(&b.name_entry));
    l_children
}
