//! What a module uses from the form library, read once before any rewrite.

use std::collections::HashMap;

use swc_core::ecma::{
    ast::*,
    visit::{Visit, VisitWith},
};

use crate::{input_props, query};

/// Local names the module uses for the form library's exports.
///
/// `import { Field as FormikField } from "formik"` makes `field` be
/// `FormikField`. Names that are not imported keep their export name, so a
/// module that uses `useFormikContext` from a re-export is still handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceNames {
    pub formik: String,
    pub form: String,
    pub field: String,
    pub error_message: String,
    pub use_field: String,
    pub use_formik_context: String,
    /// Imported name → local name, for every named import of the library.
    pub aliases: HashMap<String, String>,
}

impl Default for SourceNames {
    fn default() -> Self {
        Self {
            formik: "Formik".into(),
            form: "Form".into(),
            field: "Field".into(),
            error_message: "ErrorMessage".into(),
            use_field: "useField".into(),
            use_formik_context: "useFormikContext".into(),
            aliases: HashMap::new(),
        }
    }
}

impl SourceNames {
    pub fn from_module(module: &Module, source: &str) -> Self {
        let mut names = SourceNames::default();
        for item in &module.body {
            let ModuleItem::ModuleDecl(ModuleDecl::Import(import)) = item else {
                continue;
            };
            if import.src.value.as_ref() != source {
                continue;
            }
            for spec in &import.specifiers {
                let ImportSpecifier::Named(named) = spec else {
                    continue;
                };
                let local = named.local.sym.to_string();
                let imported = match &named.imported {
                    Some(ModuleExportName::Ident(id)) => id.sym.to_string(),
                    Some(ModuleExportName::Str(s)) => s.value.to_string(),
                    None => local.clone(),
                };
                names.aliases.insert(imported, local);
            }
        }

        let aliases = names.aliases.clone();
        let pick = |export: &str, slot: &mut String| {
            if let Some(local) = aliases.get(export) {
                *slot = local.clone();
            }
        };
        pick("Formik", &mut names.formik);
        pick("Form", &mut names.form);
        pick("Field", &mut names.field);
        pick("ErrorMessage", &mut names.error_message);
        pick("useField", &mut names.use_field);
        pick("useFormikContext", &mut names.use_formik_context);
        names
    }

    /// Tags the library renders; anything else capitalized is a user component.
    pub fn is_library_tag(&self, tag: &str) -> bool {
        [&self.formik, &self.form, &self.field, &self.error_message]
            .iter()
            .any(|n| n.as_str() == tag)
            || tag == "FieldArray"
    }
}

/// Which library features appear anywhere in the module.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Features {
    /// `<Formik>`
    pub formik: bool,
    /// `<Formik validationSchema={...}>`
    pub validation_schema: bool,
    pub use_field: bool,
    pub use_formik_context: bool,
    /// `<Field>`
    pub field: bool,
    /// `{...getFieldProps("x")}`
    pub field_props_spread: bool,
}

impl Features {
    pub fn scan(module: &Module, names: &SourceNames) -> Self {
        let mut scan = FeatureScan {
            names,
            features: Features::default(),
        };
        module.visit_with(&mut scan);
        scan.features
    }
}

struct FeatureScan<'a> {
    names: &'a SourceNames,
    features: Features,
}

impl Visit for FeatureScan<'_> {
    fn visit_jsx_opening_element(&mut self, n: &JSXOpeningElement) {
        match query::tag_name(&n.name) {
            Some(tag) if tag == self.names.formik => {
                self.features.formik = true;
                if query::has_attr(&n.attrs, "validationSchema") {
                    self.features.validation_schema = true;
                }
            }
            Some(tag) if tag == self.names.field => self.features.field = true,
            _ => {}
        }
        if input_props::field_props_spread(&n.attrs).is_some() {
            self.features.field_props_spread = true;
        }
        n.visit_children_with(self);
    }

    fn visit_call_expr(&mut self, n: &CallExpr) {
        match query::callee_name(n) {
            Some(name) if name == self.names.use_field => self.features.use_field = true,
            Some(name) if name == self.names.use_formik_context => {
                self.features.use_formik_context = true
            }
            _ => {}
        }
        n.visit_children_with(self);
    }
}

/// Whether the module carries TypeScript syntax.
pub fn is_typescript(module: &Module) -> bool {
    let mut detector = TypeSyntax(false);
    module.visit_with(&mut detector);
    detector.0
}

struct TypeSyntax(bool);

impl Visit for TypeSyntax {
    fn visit_ts_type_ann(&mut self, _: &TsTypeAnn) {
        self.0 = true;
    }

    fn visit_ts_type_param_instantiation(&mut self, _: &TsTypeParamInstantiation) {
        self.0 = true;
    }

    fn visit_ts_type_param_decl(&mut self, _: &TsTypeParamDecl) {
        self.0 = true;
    }

    fn visit_ts_interface_decl(&mut self, _: &TsInterfaceDecl) {
        self.0 = true;
    }

    fn visit_ts_type_alias_decl(&mut self, _: &TsTypeAliasDecl) {
        self.0 = true;
    }

    fn visit_ts_as_expr(&mut self, _: &TsAsExpr) {
        self.0 = true;
    }

    fn visit_ts_enum_decl(&mut self, _: &TsEnumDecl) {
        self.0 = true;
    }
}
