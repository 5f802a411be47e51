//! `useFormikContext()` → `useFormMetadata()`, plus the capability helpers
//! shared with the `<Formik>` render-prop rewrite.

use std::collections::{HashMap, HashSet};

use swc_core::ecma::{
    ast::*,
    visit::{Visit, VisitMut, VisitMutWith, VisitWith},
};
use tracing::{debug, trace};

use crate::{
    error::ConvertError,
    features::SourceNames,
    input_props, query,
    query::IdentUsage,
    scope::{self, ScopeBody},
    synth, Ctx,
};

/// Binding every rewrite uses for the form metadata.
pub const FORM: &str = "form";
/// Binding for `form.getFieldset()`.
pub const FIELDSET: &str = "fields";

/// Handler capabilities that map straight onto a form member.
const HANDLERS: &[(&str, &str)] = &[
    ("handleSubmit", "onSubmit"),
    ("handleReset", "reset"),
    ("resetForm", "reset"),
];

/// Keys read off a whole-context binding (`formik.values`) that become plain
/// names.
const FLATTENED: &[&str] = &[
    "values",
    "setFieldValue",
    "setFieldTouched",
    "isSubmitting",
    "getFieldProps",
    "handleChange",
    "handleBlur",
];

// -----------------------------------------------------------------------------
// Capabilities
// -----------------------------------------------------------------------------

/// Which context capabilities a scope needs, with the local name each one is
/// bound to.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Capabilities {
    pub values: Option<String>,
    pub set_field_value: Option<String>,
    pub set_field_touched: Option<String>,
    pub is_submitting: Option<String>,
    pub get_field_props: Option<String>,
    /// Emit `const fields = form.getFieldset()`.
    pub fieldset: bool,
}

impl Capabilities {
    /// A capability is needed when it was destructured or is referenced by
    /// its own name anywhere in the scope. A name the scope declares itself
    /// refers to that declaration, not to the form.
    pub fn resolve(
        destructured: &HashMap<String, String>,
        usage: &IdentUsage<'_>,
        declared: &HashSet<String>,
    ) -> Self {
        let pick = |key: &str| {
            destructured.get(key).cloned().or_else(|| {
                (usage.references(key) && !declared.contains(key)).then(|| key.to_string())
            })
        };
        let get_field_props = pick("getFieldProps");
        Self {
            values: pick("values"),
            set_field_value: pick("setFieldValue"),
            set_field_touched: pick("setFieldTouched"),
            is_submitting: pick("isSubmitting"),
            fieldset: get_field_props.is_some(),
            get_field_props,
        }
    }

    fn is_only_set_field_value(&self) -> bool {
        self.set_field_value.is_some()
            && self.values.is_none()
            && self.set_field_touched.is_none()
            && self.is_submitting.is_none()
            && self.get_field_props.is_none()
    }
}

/// Parameter `name: T` in TypeScript output, plain `name` otherwise.
pub(crate) fn typed_param(ctx: &Ctx<'_>, name: &str, kind: TsKeywordTypeKind, optional: bool) -> Pat {
    if ctx.typescript {
        synth::param(name, Some(synth::keyword_type(kind)), optional)
    } else {
        synth::binding(name)
    }
}

/// `(_: string, __?: boolean) => {}`
fn touched_stub(ctx: &Ctx<'_>) -> Box<Expr> {
    synth::arrow(
        vec![
            typed_param(ctx, "_", TsKeywordTypeKind::TsStringKeyword, false),
            typed_param(ctx, "__", TsKeywordTypeKind::TsBooleanKeyword, true),
        ],
        BlockStmtOrExpr::BlockStmt(synth::block(vec![])),
    )
}

/// Helper declarations for `caps`, in their fixed order.
pub fn synthesize_helpers(caps: &Capabilities, ctx: &Ctx<'_>, form: &str) -> Vec<Stmt> {
    let mut out = Vec::new();

    if let Some(local) = &caps.values {
        out.push(synth::const_ident(local, synth::member(synth::ident_expr(form), "value")));
    }

    if let Some(local) = &caps.set_field_value {
        let direct = caps.is_only_set_field_value();
        let update = if direct {
            synth::member(synth::ident_expr(form), "update")
        } else {
            out.push(synth::const_ident(
                "update",
                synth::member(synth::ident_expr(form), "update"),
            ));
            synth::ident_expr("update")
        };
        let body = Box::new(Expr::Call(synth::call(
            update,
            vec![synth::object(vec![
                synth::shorthand("name"),
                synth::shorthand("value"),
                synth::key_value("validated", synth::double_not(synth::ident_expr("shouldValidate"))),
            ])],
        )));
        out.push(synth::const_ident(
            local,
            synth::arrow(
                vec![
                    typed_param(ctx, "name", TsKeywordTypeKind::TsStringKeyword, false),
                    typed_param(ctx, "value", TsKeywordTypeKind::TsAnyKeyword, false),
                    typed_param(ctx, "shouldValidate", TsKeywordTypeKind::TsBooleanKeyword, true),
                ],
                BlockStmtOrExpr::Expr(body),
            ),
        ));
    }

    if caps.fieldset {
        out.push(synth::const_ident(
            FIELDSET,
            synth::method_call(form, "getFieldset", vec![]),
        ));
    }

    if let Some(local) = &caps.set_field_touched {
        let span = ctx
            .session
            .note("Conform has no touched state; setFieldTouched is a no-op.");
        out.push(synth::const_decl_at(span, synth::binding(local), touched_stub(ctx)));
    }

    if let Some(local) = &caps.is_submitting {
        let span = ctx
            .session
            .note("Conform does not expose a submitting flag; isSubmitting is always false.");
        out.push(synth::const_decl_at(span, synth::binding(local), synth::bool_expr(false)));
    }

    out
}

/// `{ values, setFieldValue: set }` → `values → values`, `setFieldValue → set`.
pub fn destructured_keys(pat: &ObjectPat) -> HashMap<String, String> {
    let mut out = HashMap::new();
    for prop in &pat.props {
        match prop {
            ObjectPatProp::Assign(a) => {
                out.insert(a.key.id.sym.to_string(), a.key.id.sym.to_string());
            }
            ObjectPatProp::KeyValue(kv) => {
                let key = match &kv.key {
                    PropName::Ident(id) => id.sym.to_string(),
                    PropName::Str(s) => s.value.to_string(),
                    _ => continue,
                };
                if let Pat::Ident(local) = &*kv.value {
                    out.insert(key, local.id.sym.to_string());
                }
            }
            ObjectPatProp::Rest(_) => {}
        }
    }
    out
}

// -----------------------------------------------------------------------------
// Scope rewrites shared with the form wrapper
// -----------------------------------------------------------------------------

struct FlattenMembers<'a> {
    binding: &'a str,
    form: &'a str,
}

impl VisitMut for FlattenMembers<'_> {
    scope::skip_nested_scopes!();

    fn visit_mut_expr(&mut self, n: &mut Expr) {
        if let Some(key) = query::member_of(n, self.binding) {
            if let Some((_, prop)) = HANDLERS.iter().find(|(h, _)| *h == key) {
                *n = *synth::member(synth::ident_expr(self.form), prop);
                return;
            }
            if let Some(flat) = FLATTENED.iter().find(|f| **f == key) {
                *n = Expr::Ident(synth::ident(flat));
                return;
            }
        }
        n.visit_mut_children_with(self);
    }
}

/// `binding.values` → `values`, `binding.handleSubmit` → `form.onSubmit`.
pub fn flatten_member_access(body: &mut ScopeBody<'_>, binding: &str, form: &str) {
    body.visit_mut_with(&mut FlattenMembers { binding, form });
}

struct SubstituteHandlers<'a> {
    locals: HashMap<String, &'static str>,
    form: &'a str,
}

impl VisitMut for SubstituteHandlers<'_> {
    scope::skip_nested_scopes!();

    fn visit_mut_expr(&mut self, n: &mut Expr) {
        if let Expr::Ident(id) = n {
            if let Some(prop) = self.locals.get(id.sym.as_ref()) {
                *n = *synth::member(synth::ident_expr(self.form), prop);
                return;
            }
        }
        n.visit_mut_children_with(self);
    }
}

/// Replaces destructured handler capabilities with their form member.
pub fn substitute_handlers(
    body: &mut ScopeBody<'_>,
    destructured: &HashMap<String, String>,
    form: &str,
) {
    let locals: HashMap<String, &'static str> = HANDLERS
        .iter()
        .filter_map(|(key, prop)| destructured.get(*key).map(|local| (local.clone(), *prop)))
        .collect();
    if !locals.is_empty() {
        body.visit_mut_with(&mut SubstituteHandlers { locals, form });
    }
}

struct RendersFields<'a> {
    names: &'a SourceNames,
    found: bool,
}

impl Visit for RendersFields<'_> {
    fn visit_jsx_opening_element(&mut self, n: &JSXOpeningElement) {
        let tag = query::tag_name(&n.name);
        if tag == Some(self.names.field.as_str())
            || tag == Some(self.names.error_message.as_str())
            || input_props::is_wired_native(n)
            || input_props::field_props_spread(&n.attrs).is_some()
        {
            self.found = true;
            return;
        }
        n.visit_children_with(self);
    }

    fn visit_fn_decl(&mut self, n: &FnDecl) {
        if !scope::is_component_name(n.ident.sym.as_ref()) {
            n.visit_children_with(self);
        }
    }

    fn visit_var_declarator(&mut self, n: &VarDeclarator) {
        if !scope::declares_component(n) {
            n.visit_children_with(self);
        }
    }
}

/// Whether the scope renders markup that reads from the fieldset.
pub fn renders_fields(body: &ScopeBody<'_>, names: &SourceNames) -> bool {
    let mut finder = RendersFields {
        names,
        found: false,
    };
    body.visit_with(&mut finder);
    finder.found
}

// -----------------------------------------------------------------------------
// Pass
// -----------------------------------------------------------------------------

pub fn convert(module: &mut Module, ctx: &Ctx<'_>) -> Result<(), ConvertError> {
    scope::for_each_scope(module, |body| {
        convert_scope(body, ctx);
        Ok(())
    })
}

/// Renames the first context hook call in the scope and returns the pattern
/// it used to bind.
fn rewrite_hook_call(stmts: &mut [Stmt], names: &SourceNames) -> Option<(usize, Pat)> {
    for (idx, stmt) in stmts.iter_mut().enumerate() {
        let Some(var) = query::var_decl_mut(stmt) else {
            continue;
        };
        for decl in &mut var.decls {
            let Some(Expr::Call(call)) = decl.init.as_deref_mut() else {
                continue;
            };
            if query::callee_name(call) != Some(names.use_formik_context.as_str()) {
                continue;
            }
            call.callee = Callee::Expr(synth::ident_expr("useFormMetadata"));
            let pattern = std::mem::replace(&mut decl.name, synth::binding(FORM));
            return Some((idx, pattern));
        }
    }
    None
}

fn convert_scope(body: &mut ScopeBody<'_>, ctx: &Ctx<'_>) {
    let Some(stmts) = body.block_stmts() else {
        return;
    };
    let Some((idx, pattern)) = rewrite_hook_call(stmts, ctx.names) else {
        return;
    };

    let mut destructured = HashMap::new();
    let mut whole_binding = None;
    match &pattern {
        Pat::Object(obj) => destructured = destructured_keys(obj),
        Pat::Ident(b) if b.id.sym.as_ref() != FORM => whole_binding = Some(b.id.sym.to_string()),
        Pat::Ident(_) => {}
        _ => trace!("unsupported context pattern, binding it to `form` as is"),
    }

    if let Some(binding) = &whole_binding {
        flatten_member_access(body, binding, FORM);
    }
    substitute_handlers(body, &destructured, FORM);

    let usage = body.usage(Some(ctx.names));
    let declared = query::declared_names(body.stmts());
    let mut caps = Capabilities::resolve(&destructured, &usage, &declared);
    caps.fieldset |= renders_fields(body, ctx.names);

    let mut helpers = Vec::new();
    if let Some(binding) = whole_binding.filter(|b| usage.references(b)) {
        helpers.push(synth::const_ident(&binding, synth::ident_expr(FORM)));
    }
    helpers.extend(synthesize_helpers(&caps, ctx, FORM));
    debug!(helpers = helpers.len(), ?caps, "rewrote context hook");

    let stmts = body.stmts();
    let at = (idx + 1).min(stmts.len());
    stmts.splice(at..at, helpers);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{options::ConvertOptions, print::Session};

    fn run(src: &str) -> String {
        let session = Session::new();
        let mut module = session.parse(src).unwrap();
        let names = SourceNames::default();
        let options = ConvertOptions::default();
        let ctx = Ctx {
            names: &names,
            options: &options,
            typescript: crate::features::is_typescript(&module),
            session: &session,
        };
        convert(&mut module, &ctx).unwrap();
        session.print(&module).unwrap()
    }

    fn squash(s: &str) -> String {
        s.chars().filter(|c| !c.is_whitespace()).collect()
    }

    #[test]
    fn lone_set_field_value_uses_form_update_directly() {
        let out = squash(&run(
            r#"function Picker() {
                 const { setFieldValue } = useFormikContext();
                 return <button onClick={() => setFieldValue("color", "red")} />;
               }"#,
        ));
        assert!(out.contains("constform=useFormMetadata();"), "{out}");
        assert!(
            out.contains(
                "constsetFieldValue=(name,value,shouldValidate)=>form.update({name,value,validated:!!shouldValidate});"
            ),
            "{out}"
        );
        assert!(!out.contains("constupdate"), "{out}");
        assert!(!out.contains("constvalues"), "{out}");
    }

    #[test]
    fn locally_declared_names_are_not_capabilities() {
        let out = squash(&run(
            r#"function Picker() {
                 const { setFieldValue } = useFormikContext();
                 const values = [1, 2];
                 return <button onClick={() => setFieldValue("a", values[0])} />;
               }"#,
        ));
        assert_eq!(out.matches("constvalues").count(), 1, "{out}");
        assert!(out.contains("constvalues=[1,2];"), "{out}");
        assert!(!out.contains("constupdate"), "{out}");
        assert!(out.contains("=>form.update({name,value,validated:!!shouldValidate});"), "{out}");
    }

    #[test]
    fn helpers_come_in_fixed_order_with_stub_comments() {
        let printed = run(
            r#"function Summary() {
                 const { isSubmitting, values, setFieldTouched, setFieldValue } = useFormikContext<Values>();
                 return <p>{values.name}</p>;
               }"#,
        );
        let out = squash(&printed);
        assert!(out.contains("constform=useFormMetadata<Values>();"), "{out}");
        let order = [
            "constvalues=form.value;",
            "constupdate=form.update;",
            "constsetFieldValue=(name:string,value:any,shouldValidate?:boolean)=>update(",
            "constsetFieldTouched=(_:string,__?:boolean)=>{};",
            "constisSubmitting=false;",
        ];
        let positions: Vec<usize> = order
            .iter()
            .map(|needle| out.find(needle).unwrap_or_else(|| panic!("missing {needle} in {out}")))
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{out}");
        assert!(printed.contains("// Conform has no touched state"), "{printed}");
        assert!(printed.contains("// Conform does not expose a submitting flag"), "{printed}");
    }

    #[test]
    fn whole_context_binding_is_flattened() {
        let out = squash(&run(
            r#"function Save() {
                 const formik = useFormikContext();
                 return <button disabled={formik.isSubmitting} onClick={formik.handleSubmit}>{formik.dirty ? "*" : ""}</button>;
               }"#,
        ));
        assert!(out.contains("constform=useFormMetadata();constformik=form;"), "{out}");
        assert!(out.contains("constisSubmitting=false;"), "{out}");
        assert!(out.contains("disabled={isSubmitting}"), "{out}");
        assert!(out.contains("onClick={form.onSubmit}"), "{out}");
        assert!(out.contains("formik.dirty"), "{out}");
    }

    #[test]
    fn destructured_handlers_are_substituted() {
        let out = squash(&run(
            r#"function Buttons() {
                 const { handleReset: reset } = useFormikContext();
                 return <button onClick={reset} />;
               }"#,
        ));
        assert!(out.contains("onClick={form.reset}"), "{out}");
        assert!(!out.contains("constreset"), "{out}");
    }

    #[test]
    fn fieldset_is_emitted_for_rendered_fields() {
        let out = squash(&run(
            r#"function Inner() {
                 const { values } = useFormikContext();
                 return <Field name="email" />;
               }"#,
        ));
        assert!(out.contains("constvalues=form.value;constfields=form.getFieldset();"), "{out}");
    }

    #[test]
    fn scopes_without_the_hook_are_untouched() {
        let src = "function A() {\n    return <div />;\n}\n";
        assert_eq!(squash(&run(src)), squash(src));
    }
}
