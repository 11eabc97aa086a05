//! Conversion report models and mutable report builder.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use crate::spec::{
    EnumNodeErrorKind, EnumNodeKind, NodeError, SpecConvertError, SpecDestinationPlan,
};

/// Aggregate counters and diagnostics for one `convert_tree` run.
#[derive(Debug, Default, Clone)]
pub struct ReportConvert {
    /// Total visited file/directory nodes.
    pub cnt_scanned: u64,
    /// Number of visited nodes that passed the filters.
    pub cnt_matched: u64,
    /// Number of files converted and written.
    pub cnt_converted: u64,
    /// Number of destination directories created.
    pub cnt_dirs_created: u64,
    /// Number of nodes skipped by policy or dry-run.
    pub cnt_skipped: u64,
    /// Traversal stopped early on the cancellation flag.
    pub if_cancelled: bool,
    /// Non-fatal warnings collected during traversal.
    pub warnings: Vec<String>,
    /// Per-node failures.
    pub errors: Vec<SpecConvertError>,
    /// Destination resolved for every visited node, in visit order.
    pub plans: Vec<SpecDestinationPlan>,
}

impl ReportConvert {
    /// Number of collected hard errors.
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Number of collected warnings.
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Errors of one category.
    pub fn errors_of(&self, kind: EnumNodeErrorKind) -> impl Iterator<Item = &SpecConvertError> {
        self.errors.iter().filter(move |e| e.kind == kind)
    }

    /// Planned destination for `path_source`, if the node was visited.
    pub fn destination_of(&self, path_source: &std::path::Path) -> Option<&PathBuf> {
        self.plans
            .iter()
            .find(|p| p.path_source == path_source)
            .map(|p| &p.path_destination)
    }

    /// Destination of the root node, i.e. the resolved output directory.
    pub fn path_output_dir(&self) -> Option<&PathBuf> {
        self.plans
            .iter()
            .find(|p| p.kind == EnumNodeKind::Directory)
            .map(|p| &p.path_destination)
    }

    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_scanned".to_string(), self.cnt_scanned);
        dict_counts.insert("cnt_matched".to_string(), self.cnt_matched);
        dict_counts.insert("cnt_converted".to_string(), self.cnt_converted);
        dict_counts.insert("cnt_dirs_created".to_string(), self.cnt_dirs_created);
        dict_counts.insert("cnt_skipped".to_string(), self.cnt_skipped);
        dict_counts.insert("cnt_errors".to_string(), self.error_count() as u64);
        dict_counts.insert("cnt_warnings".to_string(), self.warning_count() as u64);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        let dict_counts = self.to_dict();
        let c_txt = format!(
            "{prefix} scanned={} matched={} converted={} dirs={} skipped={} errors={} warnings={}",
            dict_counts["cnt_scanned"],
            dict_counts["cnt_matched"],
            dict_counts["cnt_converted"],
            dict_counts["cnt_dirs_created"],
            dict_counts["cnt_skipped"],
            dict_counts["cnt_errors"],
            dict_counts["cnt_warnings"]
        );
        if self.if_cancelled {
            return format!("{c_txt} (cancelled)");
        }
        c_txt
    }
}

impl fmt::Display for ReportConvert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[CONVERT]"))
    }
}

/// Mutable accumulator for conversion statistics.
#[derive(Debug, Default, Clone)]
pub struct ReportConvertBuilder {
    report: ReportConvert,
}

impl ReportConvertBuilder {
    /// Increment scanned count by one.
    pub fn add_scanned(&mut self) {
        self.report.cnt_scanned += 1;
    }

    /// Increment matched count by one.
    pub fn add_matched(&mut self) {
        self.report.cnt_matched += 1;
    }

    /// Increment converted count by one.
    pub fn add_converted(&mut self) {
        self.report.cnt_converted += 1;
    }

    /// Increment created-directory count by one.
    pub fn add_dir_created(&mut self) {
        self.report.cnt_dirs_created += 1;
    }

    /// Increment skipped count by one.
    pub fn add_skipped(&mut self) {
        self.report.cnt_skipped += 1;
    }

    /// Add warning message.
    pub fn add_warning(&mut self, warning: String) {
        self.report.warnings.push(warning);
    }

    /// Record one node failure.
    pub fn add_error(&mut self, err: NodeError) {
        self.report.errors.push(SpecConvertError::from(err));
    }

    /// Record the resolved destination of one node.
    pub fn add_plan(&mut self, path_source: PathBuf, path_destination: PathBuf, kind: EnumNodeKind) {
        self.report.plans.push(SpecDestinationPlan {
            path_source,
            path_destination,
            kind,
        });
    }

    /// Mark the run as stopped early.
    pub fn mark_cancelled(&mut self) {
        self.report.if_cancelled = true;
    }

    /// Finalize builder into immutable report.
    pub fn build(self) -> ReportConvert {
        self.report
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::path::PathBuf;

    use pretty_assertions::assert_eq;

    use super::{ReportConvert, ReportConvertBuilder};
    use crate::spec::{EnumNodeErrorKind, EnumNodeKind, NodeError};

    #[test]
    fn report_convert_to_dict_and_format() {
        let report = ReportConvert {
            cnt_scanned: 8,
            cnt_matched: 5,
            cnt_converted: 3,
            cnt_dirs_created: 2,
            cnt_skipped: 1,
            warnings: vec!["w".to_string()],
            ..ReportConvert::default()
        };

        let dict_counts = report.to_dict();
        assert_eq!(dict_counts["cnt_converted"], 3);
        assert_eq!(dict_counts["cnt_errors"], 0);
        assert_eq!(dict_counts["cnt_warnings"], 1);

        let txt = report.format("[CONVERT]");
        assert_eq!(
            txt,
            "[CONVERT] scanned=8 matched=5 converted=3 dirs=2 skipped=1 errors=0 warnings=1"
        );
        assert_eq!(report.to_string(), txt);
    }

    #[test]
    fn builder_records_errors_with_kind_and_path() {
        let mut builder = ReportConvertBuilder::default();
        builder.add_error(NodeError::Conversion {
            path: PathBuf::from("docs/b.txt"),
            message: "boom".to_string(),
        });
        builder.add_error(NodeError::DirectoryCreate {
            path: PathBuf::from("out/sub"),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        });
        builder.add_plan(
            PathBuf::from("docs"),
            PathBuf::from("docs_converted"),
            EnumNodeKind::Directory,
        );
        builder.mark_cancelled();
        let report = builder.build();

        assert_eq!(report.error_count(), 2);
        let err = report.errors_of(EnumNodeErrorKind::Conversion).next().expect("conversion");
        assert_eq!(err.path, PathBuf::from("docs/b.txt"));
        assert!(err.exception.contains("docs/b.txt"));
        assert!(err.exception.contains("boom"));
        assert_eq!(report.path_output_dir(), Some(&PathBuf::from("docs_converted")));
        assert!(report.format("[CONVERT]").ends_with("(cancelled)"));
    }
}
