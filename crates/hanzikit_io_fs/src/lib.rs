//! `hanzikit_io_fs` v1:
//! Rust-side text conversion tree engine.
//!
//! Modules:
//! - `convert` : traversal and conversion orchestration
//! - `resolve` : output path resolution and collision avoidance
//! - `spec`    : enums/options/errors and the converter seam
//! - `report`  : run-time report model
//! - `util`    : shared helper functions

pub mod convert;
pub mod report;
pub mod resolve;
pub mod spec;
mod util;

pub use convert::{convert_tree, inspect_source_path};
pub use report::{ReportConvert, ReportConvertBuilder};
pub use resolve::{
    C_SUFFIX_CONVERTED, derive_output_root, resolve_directory_name, resolve_file_name,
    validate_collision_key,
};
pub use spec::{
    ConvertTreeError, EnumConvertPatternMode, EnumConvertSymlinkStrategy, EnumNodeErrorKind,
    EnumNodeKind, NodeError, SpecConvertError, SpecConvertOptions, SpecConvertRequest,
    SpecDestinationPlan, TextConverter,
};
