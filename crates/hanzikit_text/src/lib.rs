//! `hanzikit_text` v1:
//! Chinese script conversion behind the engine's [`TextConverter`] seam.
//!
//! Mode tokens are parsed once into [`EnumConversionMode`]; the engine itself
//! only ever sees the raw token.

use std::fmt;
use std::str::FromStr;

use hanzikit_io_fs::TextConverter;
use thiserror::Error;
use zhconv::{Variant, zhconv};

/// Accepted mode tokens, for help texts and error messages.
pub const TUP_MODE_TOKENS: [&str; 9] = [
    "t2s",
    "s2t",
    "to-simplified",
    "to-traditional",
    "zh-hans",
    "zh-hant",
    "zh-cn",
    "zh-tw",
    "zh-hk",
];

/// Conversion direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumConversionMode {
    /// Traditional -> Simplified.
    ToSimplified,
    /// Simplified -> Traditional.
    ToTraditional,
    /// Simplified, mainland China wording.
    ToMainland,
    /// Traditional, Taiwan wording.
    ToTaiwan,
    /// Traditional, Hong Kong wording.
    ToHongKong,
}

impl EnumConversionMode {
    /// Canonical token passed through the engine.
    pub fn as_token(&self) -> &'static str {
        match self {
            Self::ToSimplified => "t2s",
            Self::ToTraditional => "s2t",
            Self::ToMainland => "zh-cn",
            Self::ToTaiwan => "zh-tw",
            Self::ToHongKong => "zh-hk",
        }
    }

    fn target_variant(&self) -> Variant {
        match self {
            Self::ToSimplified => Variant::ZhHans,
            Self::ToTraditional => Variant::ZhHant,
            Self::ToMainland => Variant::ZhCN,
            Self::ToTaiwan => Variant::ZhTW,
            Self::ToHongKong => Variant::ZhHK,
        }
    }
}

impl fmt::Display for EnumConversionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_token())
    }
}

/// Unknown conversion mode token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid conversion mode: `{0}`. Expected one of: {tokens:?}", tokens = TUP_MODE_TOKENS)]
pub struct ParseModeError(pub String);

impl FromStr for EnumConversionMode {
    type Err = ParseModeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "t2s" | "to-simplified" | "simplified" | "zh-hans" => Ok(Self::ToSimplified),
            "s2t" | "to-traditional" | "traditional" | "zh-hant" => Ok(Self::ToTraditional),
            "zh-cn" => Ok(Self::ToMainland),
            "zh-tw" => Ok(Self::ToTaiwan),
            "zh-hk" => Ok(Self::ToHongKong),
            _ => Err(ParseModeError(value.to_string())),
        }
    }
}

/// Convert `text` in one direction.
pub fn convert_text(text: &str, mode: EnumConversionMode) -> String {
    zhconv(text, mode.target_variant())
}

/// [`TextConverter`] backed by the `zhconv` conversion tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZhConverter;

impl TextConverter for ZhConverter {
    fn convert(&self, text: &str, mode: &str) -> Result<String, String> {
        let mode = EnumConversionMode::from_str(mode).map_err(|e| e.to_string())?;
        Ok(convert_text(text, mode))
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use hanzikit_io_fs::{
        SpecConvertOptions, SpecConvertRequest, TextConverter, convert_tree, derive_output_root,
    };
    use tempfile::TempDir;

    use super::{EnumConversionMode, ZhConverter, convert_text};

    #[test]
    fn mode_tokens_parse_case_insensitively() {
        assert_eq!("t2s".parse::<EnumConversionMode>(), Ok(EnumConversionMode::ToSimplified));
        assert_eq!("To-Simplified".parse::<EnumConversionMode>(), Ok(EnumConversionMode::ToSimplified));
        assert_eq!("s2t".parse::<EnumConversionMode>(), Ok(EnumConversionMode::ToTraditional));
        assert_eq!("zh-TW".parse::<EnumConversionMode>(), Ok(EnumConversionMode::ToTaiwan));
        assert!("klingon".parse::<EnumConversionMode>().is_err());
        for token in super::TUP_MODE_TOKENS {
            let mode: EnumConversionMode = token.parse().expect("listed token parses");
            assert_eq!(mode.as_token().parse::<EnumConversionMode>(), Ok(mode));
        }
    }

    #[test]
    fn convert_text_both_directions() {
        assert_eq!(convert_text("繁體", EnumConversionMode::ToSimplified), "繁体");
        assert_eq!(convert_text("測試", EnumConversionMode::ToSimplified), "测试");
        assert_eq!(convert_text("测试", EnumConversionMode::ToTraditional), "測試");
        assert_eq!(convert_text("plain ascii", EnumConversionMode::ToTraditional), "plain ascii");
    }

    #[test]
    fn zh_converter_rejects_unknown_mode() {
        let err = ZhConverter.convert("測試", "nope").expect_err("unknown mode");
        assert!(err.contains("nope"));
    }

    #[test]
    fn docs_scenario_end_to_end() {
        let tmp = TempDir::new().expect("tempdir");
        let path_docs = tmp.path().join("docs");
        fs::create_dir(&path_docs).expect("mkdir");
        fs::write(path_docs.join("a.txt"), "繁體").expect("write");
        fs::write(path_docs.join("b.txt"), "測試").expect("write");

        let spec_cv_request = SpecConvertRequest {
            path_source: path_docs.clone(),
            path_output_root: derive_output_root(&path_docs, None, false, "converted"),
            mode: EnumConversionMode::ToSimplified.as_token().to_string(),
            if_preserve_source: false,
            collision_key: "converted".to_string(),
        };
        let spec_cv_options = SpecConvertOptions::default();

        let report = convert_tree(&spec_cv_request, &spec_cv_options, &ZhConverter)
            .expect("convert tree");
        assert_eq!(report.error_count(), 0);
        let path_out = tmp.path().join("docs_converted");
        assert_eq!(fs::read_to_string(path_out.join("a.txt")).expect("read"), "繁体");
        assert_eq!(fs::read_to_string(path_out.join("b.txt")).expect("read"), "测试");

        let report = convert_tree(&spec_cv_request, &spec_cv_options, &ZhConverter)
            .expect("second run");
        let path_second = tmp.path().join("docs_converted_converted_1");
        assert_eq!(report.path_output_dir(), Some(&path_second));
        assert_eq!(fs::read_to_string(path_second.join("a.txt")).expect("read"), "繁体");
    }
}
