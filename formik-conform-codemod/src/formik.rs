//! `<Formik initialValues onSubmit validationSchema>{(props) => <form/>}</Formik>`
//! → `const [form, fields] = useForm({...})` at the top of the component, and
//! the render prop's markup in place of the element.

use std::collections::{BTreeSet, HashMap};

use swc_core::ecma::{
    ast::*,
    visit::{Visit, VisitMut, VisitMutWith, VisitWith},
};
use tracing::{debug, trace};

use crate::{
    context::{self, Capabilities, FIELDSET, FORM},
    error::ConvertError,
    features::SourceNames,
    query::{self, AttrValue, IdentUsage},
    scope::{self, ScopeBody},
    synth::{self, Markup},
    Ctx,
};

/// Converts every `<Formik>` element, recording in `symbols` the extra target
/// exports the rewritten markup needs.
pub fn convert(
    module: &mut Module,
    ctx: &Ctx<'_>,
    symbols: &mut BTreeSet<&'static str>,
) -> Result<(), ConvertError> {
    scope::for_each_scope(module, |body| convert_scope(body, ctx, symbols))
}

/// What the element contributed besides its markup.
struct FormikSite {
    hook: Stmt,
    param: Option<Pat>,
    prelude: Vec<Stmt>,
    /// Names the `useForm` options read.
    config_refs: IdentUsage<'static>,
}

// -----------------------------------------------------------------------------
// Element → parts
// -----------------------------------------------------------------------------

fn markup_of(expr: Expr) -> Result<Markup, ConvertError> {
    match expr {
        Expr::Paren(p) => markup_of(*p.expr),
        Expr::JSXElement(el) => Ok(Markup::Element(el)),
        Expr::JSXFragment(frag) => Ok(Markup::Fragment(frag)),
        _ => Err(ConvertError::formik_children(
            "the render function must return JSX",
        )),
    }
}

/// Splits a render function's block body into the statements before the
/// final `return` and the returned markup.
fn split_return(mut stmts: Vec<Stmt>) -> Result<(Vec<Stmt>, Markup), ConvertError> {
    match stmts.pop() {
        Some(Stmt::Return(ReturnStmt { arg: Some(arg), .. })) => Ok((stmts, markup_of(*arg)?)),
        _ => Err(ConvertError::formik_children(
            "the render function must end by returning JSX",
        )),
    }
}

type RenderParts = (Option<Pat>, Vec<Stmt>, Markup);

fn render_function(expr: Expr) -> Result<RenderParts, ConvertError> {
    match expr {
        Expr::Paren(p) => render_function(*p.expr),
        Expr::Arrow(arrow) => {
            let param = arrow.params.into_iter().next();
            match *arrow.body {
                BlockStmtOrExpr::Expr(e) => Ok((param, Vec::new(), markup_of(*e)?)),
                BlockStmtOrExpr::BlockStmt(block) => {
                    let (prelude, markup) = split_return(block.stmts)?;
                    Ok((param, prelude, markup))
                }
            }
        }
        Expr::Fn(f) => {
            let param = f.function.params.into_iter().next().map(|p| p.pat);
            let body = f.function.body.ok_or_else(|| {
                ConvertError::formik_children("the render function has no body")
            })?;
            let (prelude, markup) = split_return(body.stmts)?;
            Ok((param, prelude, markup))
        }
        _ => Err(ConvertError::formik_children(
            "children must be a render function or a single element",
        )),
    }
}

fn render_parts(el: &mut JSXElement) -> Result<RenderParts, ConvertError> {
    let mut children: Vec<JSXElementChild> = std::mem::take(&mut el.children)
        .into_iter()
        .filter(|c| !query::is_layout_child(c))
        .collect();
    if children.len() != 1 {
        return Err(ConvertError::formik_children(format!(
            "expected exactly one child, found {}",
            children.len()
        )));
    }
    match children.pop() {
        Some(JSXElementChild::JSXElement(child)) => Ok((None, Vec::new(), Markup::Element(child))),
        Some(JSXElementChild::JSXFragment(frag)) => Ok((None, Vec::new(), Markup::Fragment(frag))),
        Some(JSXElementChild::JSXExprContainer(JSXExprContainer {
            expr: JSXExpr::Expr(expr),
            ..
        })) => render_function(*expr),
        _ => Err(ConvertError::formik_children(
            "children must be a render function or a single element",
        )),
    }
}

/// `(event, { formData }) => { event.preventDefault(); submit(Object.fromEntries(formData)); }`
fn submit_handler(submit: Box<Expr>) -> Box<Expr> {
    let plain = matches!(query::unparen(&submit), Expr::Ident(_) | Expr::Member(_));
    let callee = if plain { submit } else { synth::paren(submit) };
    let values = synth::method_call(
        "Object",
        "fromEntries",
        vec![synth::ident_expr("formData")],
    );
    synth::arrow(
        vec![synth::binding("event"), synth::object_pat(&["formData"])],
        BlockStmtOrExpr::BlockStmt(synth::block(vec![
            synth::expr_stmt(synth::method_call("event", "preventDefault", vec![])),
            synth::expr_stmt(Box::new(Expr::Call(synth::call(callee, vec![values])))),
        ])),
    )
}

/// `({ formData }) => parseWithYup(formData, { schema })`
fn validate_handler(schema: Box<Expr>) -> Box<Expr> {
    let schema_prop = if query::ident_name(&schema) == Some("schema") {
        synth::shorthand("schema")
    } else {
        synth::key_value("schema", schema)
    };
    synth::arrow(
        vec![synth::object_pat(&["formData"])],
        BlockStmtOrExpr::Expr(synth::call_named(
            "parseWithYup",
            vec![synth::ident_expr("formData"), synth::object(vec![schema_prop])],
        )),
    )
}

fn hook_options(opening: &JSXOpeningElement) -> Box<Expr> {
    let mut props = Vec::new();
    if let Some(initial) = AttrValue::of(&opening.attrs, "initialValues").into_expr() {
        props.push(synth::key_value("defaultValue", initial));
    }
    if let Some(schema) = AttrValue::of(&opening.attrs, "validationSchema").into_expr() {
        props.push(synth::key_value("onValidate", validate_handler(schema)));
        props.push(synth::key_value("shouldValidate", synth::str_expr("onBlur")));
        props.push(synth::key_value("shouldRevalidate", synth::str_expr("onInput")));
    }
    if let Some(submit) = AttrValue::of(&opening.attrs, "onSubmit").into_expr() {
        props.push(synth::key_value("onSubmit", submit_handler(submit)));
    }
    for attr in &opening.attrs {
        if let JSXAttrOrSpread::JSXAttr(attr) = attr {
            let name = query::attr_name(attr);
            if !matches!(name, Some("initialValues" | "validationSchema" | "onSubmit")) {
                trace!(prop = ?name, "dropped <Formik> prop");
            }
        }
    }
    synth::object(props)
}

/// Takes a `<Formik>` element apart: the hook declaration and the markup
/// that replaces the element.
fn take_apart(el: &mut JSXElement, names: &SourceNames) -> Result<(FormikSite, Markup), ConvertError> {
    let (param, prelude, markup) = render_parts(el)?;

    let options = hook_options(&el.opening);
    let mut config_refs = IdentUsage::new(None);
    options.visit_with(&mut config_refs);

    let mut call = synth::call(synth::ident_expr("useForm"), vec![options]);
    call.type_args = el.opening.type_args.clone();
    let hook = synth::const_decl(
        synth::array_pat(&[Some(FORM), Some(FIELDSET)]),
        Box::new(Expr::Call(call)),
    );

    let markup = if renders_custom_components(&markup, names) {
        Markup::Element(Box::new(synth::jsx_element(
            synth::jsx_name("FormProvider"),
            vec![synth::jsx_expr_attr(
                "context",
                synth::member(synth::ident_expr(FORM), "context"),
            )],
            vec![markup.into_child()],
        )))
    } else {
        markup
    };

    Ok((
        FormikSite {
            hook,
            param,
            prelude,
            config_refs,
        },
        markup,
    ))
}

fn renders_custom_components(markup: &Markup, names: &SourceNames) -> bool {
    let accept = |tag: &str| scope::is_component_name(tag) && !names.is_library_tag(tag);
    match markup {
        Markup::Element(el) => query::contains_tag(&**el, &accept),
        Markup::Fragment(frag) => query::contains_tag(frag, &accept),
    }
}

// -----------------------------------------------------------------------------
// Finder
// -----------------------------------------------------------------------------

/// Replaces `<Formik>` elements in place and keeps what they contributed.
struct FormikFinder<'a> {
    names: &'a SourceNames,
    sites: Vec<FormikSite>,
    error: Option<ConvertError>,
}

impl FormikFinder<'_> {
    fn take(&mut self, el: &mut JSXElement) -> Option<Markup> {
        if self.error.is_some() || !query::is_tag(el, &self.names.formik) {
            return None;
        }
        match take_apart(el, self.names) {
            Ok((site, markup)) => {
                self.sites.push(site);
                Some(markup)
            }
            Err(err) => {
                self.error = Some(err);
                None
            }
        }
    }
}

impl VisitMut for FormikFinder<'_> {
    scope::skip_nested_scopes!();

    fn visit_mut_expr(&mut self, n: &mut Expr) {
        if let Expr::JSXElement(el) = n {
            if let Some(markup) = self.take(el) {
                *n = markup.into_expr();
                return;
            }
        }
        n.visit_mut_children_with(self);
    }

    fn visit_mut_jsx_element_child(&mut self, n: &mut JSXElementChild) {
        if let JSXElementChild::JSXElement(el) = n {
            if let Some(markup) = self.take(el) {
                *n = markup.into_child();
                return;
            }
        }
        n.visit_mut_children_with(self);
    }
}

// -----------------------------------------------------------------------------
// Scope
// -----------------------------------------------------------------------------

fn convert_scope(
    body: &mut ScopeBody<'_>,
    ctx: &Ctx<'_>,
    symbols: &mut BTreeSet<&'static str>,
) -> Result<(), ConvertError> {
    let mut finder = FormikFinder {
        names: ctx.names,
        sites: Vec::new(),
        error: None,
    };
    // index of the top-level statement that held the element
    let mut holder = 0;
    match body.block_stmts() {
        Some(stmts) => {
            for (idx, stmt) in stmts.iter_mut().enumerate() {
                let before = finder.sites.len();
                stmt.visit_mut_with(&mut finder);
                if finder.sites.len() > before && before == 0 {
                    holder = idx;
                }
            }
        }
        None => body.visit_mut_with(&mut finder),
    }
    if let Some(err) = finder.error {
        return Err(err);
    }
    let mut sites = finder.sites;
    if sites.len() > 1 {
        return Err(ConvertError::formik_children(format!(
            "found {} <Formik> elements in one component",
            sites.len()
        )));
    }
    let Some(site) = sites.pop() else {
        return Ok(());
    };

    // The hook goes as high as possible: above early returns, but below any
    // declaration its options read.
    let stmts = body.stmts();
    let at = stmts[..holder.min(stmts.len())]
        .iter()
        .rposition(|s| {
            query::declared_names(std::slice::from_ref(s))
                .iter()
                .any(|n| site.config_refs.references(n))
        })
        .map_or(0, |i| i + 1);
    stmts.insert(at, site.hook);
    // The render prop's own statements stay where the element was, below
    // every declaration they might read.
    let prelude_len = site.prelude.len();
    let holder = (holder + 1).min(stmts.len());
    stmts.splice(holder..holder, site.prelude);

    let mut destructured = HashMap::new();
    let mut whole_binding = None;
    match &site.param {
        Some(Pat::Object(obj)) => destructured = context::destructured_keys(obj),
        Some(Pat::Ident(b)) if b.id.sym.as_ref() != FORM => {
            whole_binding = Some(b.id.sym.to_string())
        }
        Some(Pat::Ident(_)) | None => {}
        Some(_) => trace!("unsupported render-prop parameter, dropped"),
    }
    if let Some(binding) = &whole_binding {
        context::flatten_member_access(body, binding, FORM);
    }
    context::substitute_handlers(body, &destructured, FORM);

    let usage = body.usage(Some(ctx.names));
    let declared = query::declared_names(body.stmts());
    let caps = Capabilities {
        // the hook already binds the fieldset
        fieldset: false,
        ..Capabilities::resolve(&destructured, &usage, &declared)
    };
    let mut helpers = Vec::new();
    if let Some(binding) = whole_binding.filter(|b| usage.references(b)) {
        helpers.push(synth::const_ident(&binding, synth::ident_expr(FORM)));
    }
    helpers.extend(context::synthesize_helpers(&caps, ctx, FORM));

    if contains_provider(body) {
        symbols.insert("FormProvider");
    }
    debug!(
        prelude = prelude_len,
        helpers = helpers.len(),
        "rewrote <Formik> element"
    );
    let stmts = body.stmts();
    let after_hook = (at + 1).min(stmts.len());
    stmts.splice(after_hook..after_hook, helpers);
    Ok(())
}

fn contains_provider(body: &ScopeBody<'_>) -> bool {
    let mut finder = ProviderFinder(false);
    body.visit_with(&mut finder);
    finder.0
}

struct ProviderFinder(bool);

impl Visit for ProviderFinder {
    fn visit_jsx_opening_element(&mut self, n: &JSXOpeningElement) {
        if query::tag_name(&n.name) == Some("FormProvider") {
            self.0 = true;
        }
        n.visit_children_with(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{options::ConvertOptions, print::Session};

    fn run(src: &str) -> Result<(String, BTreeSet<&'static str>), ConvertError> {
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
        let mut symbols = BTreeSet::new();
        convert(&mut module, &ctx, &mut symbols)?;
        let printed = session.print(&module).unwrap();
        Ok((printed.chars().filter(|c| !c.is_whitespace()).collect(), symbols))
    }

    #[test]
    fn render_prop_becomes_use_form() {
        let (out, symbols) = run(
            r#"function Signup() {
                 return (
                   <Formik initialValues={{ email: "" }} validationSchema={schema} onSubmit={save}>
                     {({ values }) => <form><p>{values.email}</p></form>}
                   </Formik>
                 );
               }"#,
        )
        .unwrap();
        assert!(
            out.contains(
                r#"const[form,fields]=useForm({defaultValue:{email:""},onValidate:({formData})=>parseWithYup(formData,{schema}),shouldValidate:"onBlur",shouldRevalidate:"onInput",onSubmit:(event,{formData})=>{event.preventDefault();save(Object.fromEntries(formData));}});"#
            ),
            "{out}"
        );
        assert!(out.contains("constvalues=form.value;return(<form><p>{values.email}</p></form>);"), "{out}");
        assert!(!out.contains("Formik"), "{out}");
        assert!(symbols.is_empty());
    }

    #[test]
    fn expression_bodied_components_get_a_block() {
        let (out, _) = run(
            r#"const Login = () => <Formik initialValues={init} onSubmit={(v) => login(v)}><Form /></Formik>;"#,
        )
        .unwrap();
        assert!(out.contains("constLogin=()=>{const[form,fields]=useForm({defaultValue:init,onSubmit:"), "{out}");
        assert!(out.contains("(v)=>login(v))(Object.fromEntries(formData))"), "{out}");
        assert!(out.contains("return<Form/>;}"), "{out}");
    }

    #[test]
    fn hook_is_placed_below_the_declarations_it_reads() {
        let (out, _) = run(
            r#"function Edit({ user }) {
                 const initial = { name: user.name };
                 if (!user) return null;
                 return <Formik initialValues={initial} onSubmit={save}>{() => <form />}</Formik>;
               }"#,
        )
        .unwrap();
        let initial = out.find("constinitial=").unwrap();
        let hook = out.find("const[form,fields]").unwrap();
        let early = out.find("if(!user)").unwrap();
        assert!(initial < hook && hook < early, "{out}");
    }

    #[test]
    fn block_render_prop_statements_are_hoisted() {
        let (out, _) = run(
            r#"function A() {
                 return <Formik initialValues={{}} onSubmit={save}>
                   {(props) => {
                     const label = props.isSubmitting ? "Saving" : "Save";
                     return <form onSubmit={props.handleSubmit}>{label}</form>;
                   }}
                 </Formik>;
               }"#,
        )
        .unwrap();
        assert!(out.contains("constisSubmitting=false;constlabel=isSubmitting?"), "{out}");
        assert!(out.contains("<formonSubmit={form.onSubmit}>{label}</form>"), "{out}");
        assert!(!out.contains("constprops"), "{out}");
    }

    #[test]
    fn render_prop_statements_stay_below_the_locals_they_read() {
        let (out, _) = run(
            r#"function A() {
                 const base = 1;
                 return <Formik initialValues={{}} onSubmit={save}>
                   {() => {
                     const label = base + 1;
                     return <form>{label}</form>;
                   }}
                 </Formik>;
               }"#,
        )
        .unwrap();
        let hook = out.find("const[form,fields]").unwrap();
        let base = out.find("constbase=1;").unwrap();
        let label = out.find("constlabel=base+1;").unwrap();
        let ret = out.find("return<form>").unwrap();
        assert!(hook < base && base < label && label < ret, "{out}");
    }

    #[test]
    fn render_prop_does_not_shadow_scope_declarations() {
        let (out, _) = run(
            r#"function A() {
                 const isSubmitting = useBusy();
                 return <Formik initialValues={{}} onSubmit={save}>
                   {() => <form><button disabled={isSubmitting} /></form>}
                 </Formik>;
               }"#,
        )
        .unwrap();
        assert_eq!(out.matches("constisSubmitting").count(), 1, "{out}");
        assert!(out.contains("constisSubmitting=useBusy();"), "{out}");
    }

    #[test]
    fn destructured_values_survive_even_when_only_wired() {
        let (out, _) = run(
            r#"function A() {
                 return <Formik initialValues={{ name: "" }} onSubmit={save}>
                   {({ values, handleChange }) => <form><input value={values.name} onChange={handleChange} /></form>}
                 </Formik>;
               }"#,
        )
        .unwrap();
        assert!(out.contains("constvalues=form.value;"), "{out}");
    }

    #[test]
    fn custom_components_get_a_provider() {
        let (out, symbols) = run(
            r#"function A() {
                 return <Formik initialValues={{}} onSubmit={save}>{() => <Form><EmailInput /></Form>}</Formik>;
               }"#,
        )
        .unwrap();
        assert!(out.contains("<FormProvidercontext={form.context}><Form><EmailInput/></Form></FormProvider>"), "{out}");
        assert!(symbols.contains("FormProvider"));
    }

    #[test]
    fn malformed_children_are_rejected() {
        let err = run(
            r#"function A() { return <Formik initialValues={{}} onSubmit={save}>text</Formik>; }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConvertError::FormikChildren { .. }));

        let err = run(
            r#"function A() {
                 return <div>
                   <Formik initialValues={{}} onSubmit={a}>{() => <form />}</Formik>
                   <Formik initialValues={{}} onSubmit={b}>{() => <form />}</Formik>
                 </div>;
               }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConvertError::FormikChildren { .. }));
    }
}
