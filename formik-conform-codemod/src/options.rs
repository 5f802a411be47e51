use serde::Deserialize;

use crate::error::ConvertError;

pub const DEFAULT_SOURCE_MODULE: &str = "formik";
pub const DEFAULT_TARGET_MODULE: &str = "@conform-to/react";
pub const DEFAULT_YUP_MODULE: &str = "@conform-to/yup";

/// Knobs for one conversion. Every field has a default, so `{}` is a valid
/// JSON configuration.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct ConvertOptions {
    pub source_module: String,
    pub target_module: String,
    pub yup_module: String,
    /// `None` detects TypeScript from the parsed tree.
    pub typescript: Option<bool>,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            source_module: DEFAULT_SOURCE_MODULE.to_string(),
            target_module: DEFAULT_TARGET_MODULE.to_string(),
            yup_module: DEFAULT_YUP_MODULE.to_string(),
            typescript: None,
        }
    }
}

impl ConvertOptions {
    pub fn from_json(json: &str) -> Result<Self, ConvertError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_uses_defaults() {
        let options = ConvertOptions::from_json("{}").unwrap();
        assert_eq!(options, ConvertOptions::default());
    }

    #[test]
    fn camel_case_keys_override_defaults() {
        let options =
            ConvertOptions::from_json(r#"{"sourceModule":"formik-lite","typescript":true}"#)
                .unwrap();
        assert_eq!(options.source_module, "formik-lite");
        assert_eq!(options.target_module, DEFAULT_TARGET_MODULE);
        assert_eq!(options.typescript, Some(true));
    }

    #[test]
    fn malformed_json_is_an_options_error() {
        let err = ConvertOptions::from_json("{sourceModule:").unwrap_err();
        assert!(matches!(err, ConvertError::Options(_)));
    }
}
