use std::string::FromUtf8Error;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("failed to parse source: {message}")]
    Parse { message: String },

    /// `<Formik>` children are not the render-prop shape the rewrite relies on.
    #[error("unsupported <Formik> children: {reason}")]
    FormikChildren { reason: String },

    #[error("failed to print module: {0}")]
    Emit(#[from] std::io::Error),

    #[error("printer produced invalid UTF-8: {0}")]
    Utf8(#[from] FromUtf8Error),

    #[error("invalid options: {0}")]
    Options(#[from] serde_json::Error),
}

impl ConvertError {
    pub(crate) fn formik_children(reason: impl Into<String>) -> Self {
        ConvertError::FormikChildren {
            reason: reason.into(),
        }
    }
}
