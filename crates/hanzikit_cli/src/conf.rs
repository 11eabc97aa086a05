//! Turns parsed arguments into an engine request and options.

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use hanzikit_io_fs::{
    ConvertTreeError, SpecConvertOptions, SpecConvertRequest, derive_output_root,
    inspect_source_path, validate_collision_key,
};

use crate::cli::Cli;

/// Input path from the positional argument, falling back to `--default-folder`.
pub fn resolve_input_path(cli: &Cli) -> Result<PathBuf> {
    match cli.path.as_ref().or(cli.default_folder.as_ref()) {
        Some(path) => Ok(path.clone()),
        None => bail!("No input path given; pass PATH, --default-folder or --interactive"),
    }
}

/// Strip whitespace and one pair of surrounding quotes, as pasted from a file manager.
pub fn clean_prompt_path(raw: &str) -> &str {
    let trimmed = raw.trim();
    for quote in ['"', '\''] {
        if let Some(inner) = trimmed
            .strip_prefix(quote)
            .and_then(|v| v.strip_suffix(quote))
        {
            return inner.trim();
        }
    }
    trimmed
}

/// Validated request for converting `path_source`.
pub fn build_request(
    cli: &Cli,
    path_source: &Path,
) -> Result<SpecConvertRequest, ConvertTreeError> {
    validate_collision_key(&cli.key)?;
    inspect_source_path(path_source)?;

    Ok(SpecConvertRequest {
        path_source: path_source.to_path_buf(),
        path_output_root: derive_output_root(
            path_source,
            cli.output.as_deref(),
            cli.preserve_source,
            &cli.key,
        ),
        mode: cli.conversion_mode().as_token().to_string(),
        if_preserve_source: cli.preserve_source,
        collision_key: cli.key.clone(),
    })
}

fn non_empty(patterns: &[String]) -> Option<Vec<String>> {
    if patterns.is_empty() {
        None
    } else {
        Some(patterns.to_vec())
    }
}

/// Engine options from the filter/policy flags.
pub fn build_options(cli: &Cli) -> SpecConvertOptions {
    SpecConvertOptions {
        patterns_include_files: non_empty(&cli.include),
        patterns_exclude_files: non_empty(&cli.exclude),
        patterns_include_dirs: non_empty(&cli.include_dir),
        patterns_exclude_dirs: non_empty(&cli.exclude_dir),
        rule_pattern: cli.pattern_mode.into(),
        rule_symlink: cli.rule_symlink(),
        if_preserve_mtime: cli.preserve_mtime,
        if_dry_run: cli.dry_run,
        token_cancel: None,
    }
}
