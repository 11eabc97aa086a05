//! Command-line surface.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use hanzikit_io_fs::{EnumConvertPatternMode, EnumConvertSymlinkStrategy};
use hanzikit_text::EnumConversionMode;

/// Pattern interpretation for `--include`/`--exclude`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ArgPatternMode {
    Glob,
    Regex,
    Literal,
}

impl From<ArgPatternMode> for EnumConvertPatternMode {
    fn from(value: ArgPatternMode) -> Self {
        match value {
            ArgPatternMode::Glob => Self::Glob,
            ArgPatternMode::Regex => Self::Regex,
            ArgPatternMode::Literal => Self::Literal,
        }
    }
}

/// Convert the text of files between Traditional and Simplified Chinese.
///
/// Output is written next to the input (or under `--output`); existing
/// directories are never reused, a `_<key>_<n>` suffix is added instead.
#[derive(Debug, Clone, Parser)]
#[command(name = "hanzikit", version)]
pub struct Cli {
    /// Input file or directory.
    pub path: Option<PathBuf>,

    /// Convert to Simplified Chinese (default).
    #[arg(short = 's', long, group = "direction")]
    pub simplified: bool,

    /// Convert to Traditional Chinese.
    #[arg(short = 't', long, group = "direction")]
    pub traditional: bool,

    /// Explicit mode token: t2s, s2t, zh-hans, zh-hant, zh-cn, zh-tw, zh-hk.
    #[arg(short = 'm', long, group = "direction")]
    pub mode: Option<EnumConversionMode>,

    /// Output root, used verbatim instead of the sibling default.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Input used when PATH is not given.
    #[arg(short = 'd', long)]
    pub default_folder: Option<PathBuf>,

    /// Write `<stem>_converted<ext>` files into `<parent>/<key>` instead of mirroring names.
    #[arg(short, long)]
    pub preserve_source: bool,

    /// Token used in output directory names and collision suffixes.
    #[arg(short, long, default_value = "converted")]
    pub key: String,

    /// Only convert files whose name matches (repeatable).
    #[arg(long)]
    pub include: Vec<String>,

    /// Skip files whose name matches (repeatable).
    #[arg(long)]
    pub exclude: Vec<String>,

    /// Only descend into directories whose name matches (repeatable).
    #[arg(long)]
    pub include_dir: Vec<String>,

    /// Never descend into directories whose name matches (repeatable).
    #[arg(long)]
    pub exclude_dir: Vec<String>,

    /// How include/exclude patterns are interpreted.
    #[arg(long, value_enum, default_value_t = ArgPatternMode::Glob)]
    pub pattern_mode: ArgPatternMode,

    /// Ignore symbolic links instead of following them.
    #[arg(long)]
    pub skip_symlinks: bool,

    /// Copy the source modification time onto converted files.
    #[arg(long)]
    pub preserve_mtime: bool,

    /// Print where everything would go without writing anything.
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Prompt for paths until `exit` is entered.
    #[arg(short, long)]
    pub interactive: bool,
}

impl Cli {
    /// Selected conversion direction.
    pub fn conversion_mode(&self) -> EnumConversionMode {
        if let Some(mode) = self.mode {
            return mode;
        }
        if self.traditional {
            return EnumConversionMode::ToTraditional;
        }
        EnumConversionMode::ToSimplified
    }

    /// Selected symlink policy.
    pub fn rule_symlink(&self) -> EnumConvertSymlinkStrategy {
        if self.skip_symlinks {
            EnumConvertSymlinkStrategy::SkipSymlinks
        } else {
            EnumConvertSymlinkStrategy::Dereference
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use clap::{CommandFactory, Parser};
    use hanzikit_text::EnumConversionMode;
    use pretty_assertions::assert_eq;

    use super::Cli;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn cli_defaults() {
        let cli = Cli::try_parse_from(["hanzikit", "docs"]).expect("parse");
        assert_eq!(cli.path, Some(PathBuf::from("docs")));
        assert_eq!(cli.conversion_mode(), EnumConversionMode::ToSimplified);
        assert_eq!(cli.key, "converted");
        assert!(!cli.preserve_source);
        assert!(cli.output.is_none());
    }

    #[test]
    fn cli_direction_flags() {
        let cli = Cli::try_parse_from(["hanzikit", "-t", "docs"]).expect("parse");
        assert_eq!(cli.conversion_mode(), EnumConversionMode::ToTraditional);

        let cli = Cli::try_parse_from(["hanzikit", "--mode", "zh-tw", "docs"]).expect("parse");
        assert_eq!(cli.conversion_mode(), EnumConversionMode::ToTaiwan);

        assert!(Cli::try_parse_from(["hanzikit", "-s", "-t", "docs"]).is_err());
        assert!(Cli::try_parse_from(["hanzikit", "--mode", "nope", "docs"]).is_err());
    }

    #[test]
    fn cli_repeatable_filters_and_flags() {
        let cli = Cli::try_parse_from([
            "hanzikit",
            "-p",
            "-k",
            "简体",
            "--include",
            "*.txt",
            "--include",
            "*.md",
            "--exclude-dir",
            ".git",
            "-n",
            "docs",
        ])
        .expect("parse");
        assert!(cli.preserve_source);
        assert!(cli.dry_run);
        assert_eq!(cli.key, "简体");
        assert_eq!(cli.include, vec!["*.txt".to_string(), "*.md".to_string()]);
        assert_eq!(cli.exclude_dir, vec![".git".to_string()]);
    }
}
