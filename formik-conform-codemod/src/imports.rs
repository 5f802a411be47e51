//! Import bookkeeping: dropping the form library's import and keeping the
//! target library's import complete.

use std::collections::HashMap;

use swc_core::ecma::ast::*;
use tracing::debug;

use crate::{features::Features, options::ConvertOptions, synth};

/// Target-library exports in the order a fresh import lists them.
pub const CANONICAL_ORDER: &[&str] = &[
    "useForm",
    "useField",
    "useFormMetadata",
    "getInputProps",
    "FormProvider",
];

/// Removes every import of `source` and returns the index the first one
/// occupied.
pub fn remove_source_imports(module: &mut Module, source: &str) -> Option<usize> {
    let position = module.body.iter().position(|item| is_import_of(item, source));
    let before = module.body.len();
    module.body.retain(|item| !is_import_of(item, source));
    debug!(removed = before - module.body.len(), source, "dropped source imports");
    position
}

fn is_import_of(item: &ModuleItem, source: &str) -> bool {
    matches!(
        item,
        ModuleItem::ModuleDecl(ModuleDecl::Import(import)) if import.src.value.as_ref() == source
    )
}

/// The target symbols a module needs before any pass runs.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImportPlan {
    pub symbols: Vec<&'static str>,
    pub yup_bridge: bool,
}

impl ImportPlan {
    pub fn from_features(features: &Features) -> Self {
        let mut symbols = Vec::new();
        if features.formik {
            symbols.push("useForm");
        }
        if features.use_field {
            symbols.push("useField");
        }
        if features.use_formik_context {
            symbols.push("useFormMetadata");
        }
        if features.field || features.field_props_spread {
            symbols.push("getInputProps");
        }
        Self {
            symbols,
            yup_bridge: features.formik && features.validation_schema,
        }
    }
}

/// Adds the plan's imports, at `position` when given, else after the last
/// import.
pub fn insert_target_imports(
    module: &mut Module,
    plan: &ImportPlan,
    options: &ConvertOptions,
    aliases: &HashMap<String, String>,
    position: Option<usize>,
) {
    if plan.yup_bridge {
        ensure_named_imports(module, &options.yup_module, &["parseWithYup"], aliases, position);
    }
    ensure_named_imports(module, &options.target_module, &plan.symbols, aliases, position);
}

fn imported_name(spec: &ImportSpecifier) -> Option<String> {
    match spec {
        ImportSpecifier::Named(named) => Some(match &named.imported {
            Some(ModuleExportName::Ident(id)) => id.sym.to_string(),
            Some(ModuleExportName::Str(s)) => s.value.to_string(),
            None => named.local.sym.to_string(),
        }),
        ImportSpecifier::Default(_) => Some("default".into()),
        ImportSpecifier::Namespace(_) => None,
    }
}

/// Makes sure `source` is imported with every name in `symbols`, merging into
/// an existing value import of `source` when there is one. Running it twice
/// changes nothing.
///
/// `aliases` maps an export name to the local name the file used for it
/// before conversion; a symbol with a different local name is imported as
/// `symbol as local`.
pub fn ensure_named_imports(
    module: &mut Module,
    source: &str,
    symbols: &[&str],
    aliases: &HashMap<String, String>,
    position: Option<usize>,
) {
    if symbols.is_empty() {
        return;
    }
    let specifier = |symbol: &str| {
        synth::import_specifier(symbol, aliases.get(symbol).map(String::as_str))
    };

    let existing = module.body.iter_mut().find_map(|item| match item {
        ModuleItem::ModuleDecl(ModuleDecl::Import(import))
            if import.src.value.as_ref() == source
                && !import.type_only
                && !import
                    .specifiers
                    .iter()
                    .any(|s| matches!(s, ImportSpecifier::Namespace(_))) =>
        {
            Some(import)
        }
        _ => None,
    });

    if let Some(import) = existing {
        for symbol in symbols {
            let present = import
                .specifiers
                .iter()
                .any(|s| imported_name(s).as_deref() == Some(*symbol));
            if !present {
                import.specifiers.push(specifier(*symbol));
            }
        }
        return;
    }

    let mut ordered: Vec<&str> = CANONICAL_ORDER
        .iter()
        .copied()
        .filter(|s| symbols.contains(s))
        .collect();
    ordered.extend(symbols.iter().copied().filter(|s| !CANONICAL_ORDER.contains(s)));
    let mut seen = Vec::new();
    ordered.retain(|s| {
        let fresh = !seen.contains(s);
        seen.push(*s);
        fresh
    });

    let decl = synth::import_decl(source, ordered.into_iter().map(specifier).collect());
    let at = position
        .unwrap_or_else(|| after_last_import(module))
        .min(module.body.len());
    debug!(source, at, "inserted import");
    module.body.insert(at, decl);
}

fn after_last_import(module: &Module) -> usize {
    module
        .body
        .iter()
        .rposition(|item| matches!(item, ModuleItem::ModuleDecl(ModuleDecl::Import(_))))
        .map_or(0, |i| i + 1)
}
