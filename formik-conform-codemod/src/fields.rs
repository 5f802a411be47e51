//! Field and form-root markup: `<Field>`, wired native inputs, `useField`
//! spreads, `getFieldProps` spreads, `<Form>` and `<ErrorMessage>`.

use std::collections::{BTreeSet, HashSet};

use swc_core::ecma::{
    ast::*,
    visit::{Visit, VisitMut, VisitMutWith, VisitWith},
};
use tracing::debug;

use crate::{
    context::{FIELDSET, FORM},
    error::ConvertError,
    features::SourceNames,
    input_props::{self, ElementKind, FieldSource},
    query::{self, AttrValue},
    scope::{self, ScopeBody},
    synth::{self, Markup},
    Ctx,
};

pub fn convert(
    module: &mut Module,
    ctx: &Ctx<'_>,
    symbols: &mut BTreeSet<&'static str>,
) -> Result<(), ConvertError> {
    scope::for_each_scope(module, |body| {
        convert_scope(body, ctx.names, symbols);
        Ok(())
    })
}

/// First-slot names of the scope's `useField` declarations.
struct FieldBindings<'a> {
    use_field: &'a str,
    found: HashSet<String>,
}

impl Visit for FieldBindings<'_> {
    fn visit_var_declarator(&mut self, n: &VarDeclarator) {
        if scope::declares_component(n) {
            return;
        }
        let is_hook = n
            .init
            .as_deref()
            .is_some_and(|e| query::call_to(e, self.use_field).is_some());
        if let (true, Pat::Array(array)) = (is_hook, &n.name) {
            if let Some(Some(Pat::Ident(b))) = array.elems.first() {
                self.found.insert(b.id.sym.to_string());
            }
        }
        n.visit_children_with(self);
    }

    fn visit_fn_decl(&mut self, n: &FnDecl) {
        if !scope::is_component_name(n.ident.sym.as_ref()) {
            n.visit_children_with(self);
        }
    }
}

struct FieldRewriter<'a> {
    names: &'a SourceNames,
    bindings: HashSet<String>,
    used_fieldset: bool,
    used_form: bool,
    used_input_props: bool,
    rewritten: usize,
}

impl FieldRewriter<'_> {
    fn rewrite_element(&mut self, el: &mut JSXElement) {
        let tag = query::tag_name(&el.opening.name).map(str::to_string);
        match tag.as_deref() {
            Some(t) if t == self.names.field => {
                input_props::rewrite_field_element(
                    el,
                    ElementKind::FieldComponent,
                    FieldSource::Fieldset(FIELDSET),
                );
                self.used_fieldset = true;
                self.used_input_props = true;
                self.rewritten += 1;
                return;
            }
            Some(t) if t == self.names.form => {
                convert_form(el);
                self.used_form = true;
                return;
            }
            _ => {}
        }

        if let Some(binding) = input_props::take_binding_spread(&mut el.opening.attrs, &self.bindings) {
            input_props::rewrite_field_element(
                el,
                ElementKind::Native,
                FieldSource::Binding(synth::ident_expr(&binding)),
            );
            self.used_input_props = true;
            self.rewritten += 1;
        } else if input_props::is_wired_native(&el.opening) {
            input_props::rewrite_field_element(el, ElementKind::Native, FieldSource::Fieldset(FIELDSET));
            self.used_fieldset = true;
            self.used_input_props = true;
            self.rewritten += 1;
        } else if input_props::rewrite_field_props_spread(&mut el.opening, FIELDSET) {
            self.used_fieldset = true;
            self.used_input_props = true;
            self.rewritten += 1;
        }
    }

    fn take_error_message(&mut self, el: &mut JSXElement) -> Option<Markup> {
        if !query::is_tag(el, &self.names.error_message) {
            return None;
        }
        self.used_fieldset = true;
        self.rewritten += 1;
        Some(error_message(el))
    }
}

impl VisitMut for FieldRewriter<'_> {
    scope::skip_nested_scopes!();

    fn visit_mut_jsx_element(&mut self, n: &mut JSXElement) {
        n.visit_mut_children_with(self);
        self.rewrite_element(n);
    }

    fn visit_mut_expr(&mut self, n: &mut Expr) {
        n.visit_mut_children_with(self);
        if let Expr::JSXElement(el) = n {
            if let Some(markup) = self.take_error_message(el) {
                *n = markup.into_expr();
            }
        }
    }

    fn visit_mut_jsx_element_child(&mut self, n: &mut JSXElementChild) {
        n.visit_mut_children_with(self);
        if let JSXElementChild::JSXElement(el) = n {
            if let Some(markup) = self.take_error_message(el) {
                *n = markup.into_child();
            }
        }
    }
}

/// `<Form ...>` → `<form id={form.id} onSubmit={form.onSubmit} noValidate ...>`
fn convert_form(el: &mut JSXElement) {
    query::rename_tag(el, synth::jsx_name("form"));
    let rest: Vec<JSXAttrOrSpread> = std::mem::take(&mut el.opening.attrs)
        .into_iter()
        .filter(|a| match a {
            JSXAttrOrSpread::JSXAttr(attr) => {
                !matches!(query::attr_name(attr), Some("id" | "onSubmit" | "noValidate"))
            }
            JSXAttrOrSpread::SpreadElement(_) => true,
        })
        .collect();
    el.opening.attrs = vec![
        synth::jsx_expr_attr("id", synth::member(synth::ident_expr(FORM), "id")),
        synth::jsx_expr_attr("onSubmit", synth::member(synth::ident_expr(FORM), "onSubmit")),
        synth::jsx_attr("noValidate", None),
    ];
    el.opening.attrs.extend(rest);
}

/// `<ErrorMessage name="x" component="div" />` → `<div>{fields["x"].errors}</div>`
fn error_message(el: &mut JSXElement) -> Markup {
    let attrs = &mut el.opening.attrs;
    let name = query::take_attr(attrs, "name")
        .map(|a| AttrValue::from_attr(&a))
        .and_then(|v| match v {
            AttrValue::Bare => None,
            other => other.into_expr(),
        })
        .unwrap_or_else(|| synth::str_expr("field"));
    let component = query::take_attr(attrs, "component").map(|a| AttrValue::from_attr(&a));
    query::take_attr(attrs, "render");

    let errors = synth::member(
        synth::computed_member(synth::ident_expr(FIELDSET), name),
        "errors",
    );
    let tag = match component {
        Some(AttrValue::Literal(tag)) => Some(synth::jsx_name(&tag)),
        Some(AttrValue::Expr(e)) => query::ident_name(&e).map(synth::jsx_name),
        _ => None,
    };
    let children = vec![synth::jsx_expr_child(errors)];
    match tag {
        Some(tag) => Markup::Element(Box::new(synth::jsx_element(
            tag,
            std::mem::take(attrs),
            children,
        ))),
        None => Markup::Fragment(synth::jsx_fragment(children)),
    }
}

fn convert_scope(body: &mut ScopeBody<'_>, names: &SourceNames, symbols: &mut BTreeSet<&'static str>) {
    let mut bindings = FieldBindings {
        use_field: &names.use_field,
        found: HashSet::new(),
    };
    body.visit_with(&mut bindings);

    let mut rewriter = FieldRewriter {
        names,
        bindings: bindings.found,
        used_fieldset: false,
        used_form: false,
        used_input_props: false,
        rewritten: 0,
    };
    body.visit_mut_with(&mut rewriter);
    if rewriter.used_input_props {
        symbols.insert("getInputProps");
    }
    if !rewriter.used_fieldset && !rewriter.used_form {
        return;
    }

    let stmts = body.stmts();
    let needs_fieldset = rewriter.used_fieldset && !query::binds_any(stmts, FIELDSET);
    let needs_form = (rewriter.used_form || needs_fieldset) && !query::binds_any(stmts, FORM);
    if needs_form {
        stmts.insert(0, synth::const_ident(FORM, synth::call_named("useFormMetadata", vec![])));
        symbols.insert("useFormMetadata");
    }
    if needs_fieldset {
        let at = query::position_of_binding(stmts, FORM).map_or(0, |i| i + 1);
        stmts.insert(
            at,
            synth::const_ident(FIELDSET, synth::method_call(FORM, "getFieldset", vec![])),
        );
    }
    debug!(
        rewritten = rewriter.rewritten,
        needs_form, needs_fieldset, "rewrote field markup"
    );
}
