//! Rewrites React components written against Formik into Conform
//! (`@conform-to/react`) components.
//!
//! One call parses one file, runs the rewrite passes over the syntax tree in a
//! fixed order and prints the result:
//!
//! ```
//! let out = formik_conform_codemod::convert(
//!     r#"import { useField } from "formik";
//! function Name() {
//!     const [{ value }] = useField("name");
//!     return <p>{value}</p>;
//! }
//! "#,
//! )
//! .unwrap();
//! assert!(out.contains(r#"import { useField } from "@conform-to/react";"#));
//! assert!(out.contains("const value = field.value;"));
//! ```

use std::collections::{BTreeSet, HashMap};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

pub mod context;
pub mod error;
pub mod features;
pub mod fields;
pub mod files;
pub mod formik;
pub mod imports;
pub mod input_props;
pub mod normalize;
pub mod options;
pub mod print;
pub mod query;
pub mod scope;
pub mod synth;
pub mod use_field;

pub use error::ConvertError;
pub use options::ConvertOptions;

use crate::{
    features::{Features, SourceNames},
    imports::ImportPlan,
    print::Session,
};

/// What every pass gets to look at.
pub struct Ctx<'a> {
    pub names: &'a SourceNames,
    pub options: &'a ConvertOptions,
    /// Emit parameter annotations in synthesized functions.
    pub typescript: bool,
    /// Allocates the positions synthesized comments hang off.
    pub session: &'a Session,
}

/// Converts `source` with the default modules.
pub fn convert(source: &str) -> Result<String, ConvertError> {
    convert_with_options(source, &ConvertOptions::default())
}

/// Quick text check: files that never mention the library are returned as is,
/// without a parse.
fn mentions_source_library(source: &str, options: &ConvertOptions) -> bool {
    static CONTEXT_HOOK: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"\buseFormikContext\b").expect("valid regex"));
    let quoted = Regex::new(&format!(r#"['"]{}['"]"#, regex::escape(&options.source_module)));
    quoted.is_ok_and(|re| re.is_match(source)) || CONTEXT_HOOK.is_match(source)
}

pub fn convert_with_options(source: &str, options: &ConvertOptions) -> Result<String, ConvertError> {
    if !mentions_source_library(source, options) {
        debug!("no reference to the source library, returning input unchanged");
        return Ok(source.to_string());
    }

    let session = Session::new();
    let mut module = session.parse(source)?;

    let names = SourceNames::from_module(&module, &options.source_module);
    let detected = Features::scan(&module, &names);
    let typescript = options
        .typescript
        .unwrap_or_else(|| features::is_typescript(&module));
    debug!(?detected, typescript, "detected features");
    let ctx = Ctx {
        names: &names,
        options,
        typescript,
        session: &session,
    };

    context::convert(&mut module, &ctx)?;

    let position = imports::remove_source_imports(&mut module, &options.source_module);
    let plan = ImportPlan::from_features(&detected);
    imports::insert_target_imports(&mut module, &plan, options, &names.aliases, position);

    use_field::convert(&mut module, &ctx)?;

    let mut symbols = BTreeSet::new();
    formik::convert(&mut module, &ctx, &mut symbols)?;
    fields::convert(&mut module, &ctx, &mut symbols)?;
    normalize::normalize(&mut module);

    let symbols: Vec<&str> = symbols.into_iter().collect();
    imports::ensure_named_imports(
        &mut module,
        &options.target_module,
        &symbols,
        &HashMap::new(),
        position,
    );

    let printed = session.print(&module)?;
    Ok(print::tidy(&printed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefilter_looks_for_the_quoted_module_or_the_context_hook() {
        let options = ConvertOptions::default();
        assert!(mentions_source_library("import { Formik } from 'formik';", &options));
        assert!(mentions_source_library("const c = useFormikContext();", &options));
        assert!(!mentions_source_library("const formik = 1;", &options));
        assert!(!mentions_source_library("useFormikContextual()", &options));
    }

    #[test]
    fn prefilter_follows_the_configured_module() {
        let options = ConvertOptions {
            source_module: "@acme/forms".into(),
            ..ConvertOptions::default()
        };
        assert!(mentions_source_library(r#"import { Field } from "@acme/forms";"#, &options));
        assert!(!mentions_source_library(r#"import { Field } from "formik";"#, &options));
    }
}
