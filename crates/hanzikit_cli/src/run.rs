//! One conversion per input path, plus the interactive prompt loop.

use std::io::{BufRead, Write};
use std::path::Path;

use anyhow::{Context, Result};
use hanzikit_io_fs::{ReportConvert, TextConverter, convert_tree};
use tracing::{error, info};

use crate::cli::Cli;
use crate::conf::{build_options, build_request, clean_prompt_path};

/// Convert `path_source` with the flags in `cli`.
pub fn run_path<C>(cli: &Cli, path_source: &Path, converter: &C) -> Result<ReportConvert>
where
    C: TextConverter + ?Sized,
{
    let spec_cv_request = build_request(cli, path_source)?;
    let spec_cv_options = build_options(cli);
    let report = convert_tree(&spec_cv_request, &spec_cv_options, converter)
        .with_context(|| format!("Converting {}", path_source.display()))?;
    Ok(report)
}

/// Print the summary for one finished run.
pub fn write_summary<W: Write>(
    writer: &mut W,
    report: &ReportConvert,
    if_dry_run: bool,
) -> Result<()> {
    if if_dry_run {
        for spec_plan in &report.plans {
            writeln!(
                writer,
                "{} -> {}",
                spec_plan.path_source.display(),
                spec_plan.path_destination.display()
            )?;
        }
    }
    if let Some(path_out) = report.path_output_dir() {
        writeln!(writer, "Output: {}", path_out.display())?;
    }
    writeln!(writer, "{report}")?;
    Ok(())
}

/// Read paths from `reader` until `exit` or EOF, converting each one.
///
/// A failing path is reported and the prompt continues. Returns the number of
/// paths that failed or finished with errors.
pub fn run_interactive<R, W, C>(cli: &Cli, reader: R, writer: &mut W, converter: &C) -> Result<u64>
where
    R: BufRead,
    W: Write,
    C: TextConverter + ?Sized,
{
    let mut n_failed = 0u64;
    let mut iter_lines = reader.lines();
    loop {
        write!(writer, "Path to a file or directory ('exit' to quit): ")?;
        writer.flush()?;

        let Some(line) = iter_lines.next() else {
            writeln!(writer)?;
            break;
        };
        let line = line.context("Reading from stdin")?;
        let c_path = clean_prompt_path(&line);
        if c_path.is_empty() {
            continue;
        }
        if c_path.eq_ignore_ascii_case("exit") {
            info!("Leaving interactive mode");
            break;
        }

        match run_path(cli, Path::new(c_path), converter) {
            Ok(report) => {
                if report.error_count() > 0 {
                    n_failed += 1;
                }
                write_summary(writer, &report, cli.dry_run)?;
            }
            Err(e) => {
                error!("{e:#}");
                writeln!(writer, "{e:#}")?;
                n_failed += 1;
            }
        }
    }
    Ok(n_failed)
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::io::Cursor;

    use clap::Parser;
    use hanzikit_text::ZhConverter;
    use tempfile::TempDir;

    use super::{run_interactive, run_path, write_summary};
    use crate::cli::Cli;

    #[test]
    fn run_path_converts_and_summarizes() {
        let tmp = TempDir::new().expect("tempdir");
        let path_docs = tmp.path().join("docs");
        fs::create_dir(&path_docs).expect("mkdir");
        fs::write(path_docs.join("a.txt"), "繁體").expect("write");

        let cli = Cli::try_parse_from(["hanzikit"]).expect("parse");
        let report = run_path(&cli, &path_docs, &ZhConverter).expect("run");
        assert_eq!(
            fs::read_to_string(tmp.path().join("docs_converted/a.txt")).expect("read"),
            "繁体"
        );

        let mut buf = Vec::new();
        write_summary(&mut buf, &report, false).expect("summary");
        let txt = String::from_utf8(buf).expect("utf8");
        assert!(txt.contains("docs_converted"));
        assert!(txt.contains("converted=1"));
    }

    #[test]
    fn interactive_loop_handles_quotes_missing_paths_and_exit() {
        let tmp = TempDir::new().expect("tempdir");
        let path_file = tmp.path().join("b.txt");
        fs::write(&path_file, "测试").expect("write");

        let c_input = format!(
            "\n\"{}\"\n{}\nexit\n{}\n",
            path_file.display(),
            tmp.path().join("missing").display(),
            path_file.display()
        );
        let cli = Cli::try_parse_from(["hanzikit", "-t", "-p"]).expect("parse");
        let mut buf = Vec::new();
        let n_failed =
            run_interactive(&cli, Cursor::new(c_input), &mut buf, &ZhConverter).expect("loop");

        assert_eq!(n_failed, 1);
        assert_eq!(
            fs::read_to_string(tmp.path().join("converted/b_converted.txt")).expect("read"),
            "測試"
        );
        // the line after `exit` is never processed
        assert!(!tmp.path().join("converted_converted_1").exists());
        let txt = String::from_utf8(buf).expect("utf8");
        assert!(txt.contains("Path not found"));
    }
}
