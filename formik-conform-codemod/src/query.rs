//! Shape lookups over the swc tree: JSX tags and attributes, callees,
//! declarations, identifier usage.

use std::collections::HashSet;

use swc_core::ecma::{
    ast::*,
    visit::{Visit, VisitWith},
};

use crate::{features::SourceNames, input_props, scope, synth};

// -----------------------------------------------------------------------------
// JSX attributes
// -----------------------------------------------------------------------------

/// The value of a JSX attribute, normalized across the ways it can be spelled.
#[derive(Debug, Clone)]
pub enum AttrValue {
    /// `name="x"` or `name={"x"}`
    Literal(String),
    /// `name={expr}`
    Expr(Box<Expr>),
    /// `disabled`
    Bare,
    Absent,
}

impl AttrValue {
    pub fn of(attrs: &[JSXAttrOrSpread], name: &str) -> Self {
        find_attr(attrs, name)
            .map(AttrValue::from_attr)
            .unwrap_or(AttrValue::Absent)
    }

    pub fn from_attr(attr: &JSXAttr) -> Self {
        match &attr.value {
            None => AttrValue::Bare,
            Some(JSXAttrValue::Lit(Lit::Str(s))) => AttrValue::Literal(s.value.to_string()),
            Some(JSXAttrValue::Lit(lit)) => AttrValue::Expr(Box::new(Expr::Lit(lit.clone()))),
            Some(JSXAttrValue::JSXExprContainer(container)) => match &container.expr {
                JSXExpr::JSXEmptyExpr(_) => AttrValue::Absent,
                JSXExpr::Expr(expr) => match string_literal(expr) {
                    Some(s) => AttrValue::Literal(s.to_string()),
                    None => AttrValue::Expr(expr.clone()),
                },
            },
            Some(JSXAttrValue::JSXElement(el)) => AttrValue::Expr(Box::new(Expr::JSXElement(el.clone()))),
            Some(JSXAttrValue::JSXFragment(frag)) => {
                AttrValue::Expr(Box::new(Expr::JSXFragment(frag.clone())))
            }
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, AttrValue::Absent)
    }

    pub fn as_literal(&self) -> Option<&str> {
        match self {
            AttrValue::Literal(s) => Some(s),
            _ => None,
        }
    }

    /// Literal → string expression, expression → itself, bare → `true`.
    pub fn into_expr(self) -> Option<Box<Expr>> {
        match self {
            AttrValue::Literal(s) => Some(synth::str_expr(&s)),
            AttrValue::Expr(e) => Some(e),
            AttrValue::Bare => Some(synth::bool_expr(true)),
            AttrValue::Absent => None,
        }
    }
}

pub fn attr_name(attr: &JSXAttr) -> Option<&str> {
    match &attr.name {
        JSXAttrName::Ident(id) => Some(id.sym.as_ref()),
        JSXAttrName::JSXNamespacedName(_) => None,
    }
}

pub fn find_attr<'a>(attrs: &'a [JSXAttrOrSpread], name: &str) -> Option<&'a JSXAttr> {
    attrs.iter().find_map(|a| match a {
        JSXAttrOrSpread::JSXAttr(attr) if attr_name(attr) == Some(name) => Some(attr),
        _ => None,
    })
}

pub fn has_attr(attrs: &[JSXAttrOrSpread], name: &str) -> bool {
    find_attr(attrs, name).is_some()
}

/// Removes the first attribute called `name` and returns it.
pub fn take_attr(attrs: &mut Vec<JSXAttrOrSpread>, name: &str) -> Option<JSXAttr> {
    let idx = attrs.iter().position(|a| {
        matches!(a, JSXAttrOrSpread::JSXAttr(attr) if attr_name(attr) == Some(name))
    })?;
    match attrs.remove(idx) {
        JSXAttrOrSpread::JSXAttr(attr) => Some(attr),
        JSXAttrOrSpread::SpreadElement(_) => None,
    }
}

/// Expression carried by an attribute, if it has one.
pub fn attr_expr(attr: &JSXAttr) -> Option<&Expr> {
    match &attr.value {
        Some(JSXAttrValue::JSXExprContainer(JSXExprContainer {
            expr: JSXExpr::Expr(expr),
            ..
        })) => Some(expr),
        _ => None,
    }
}

// -----------------------------------------------------------------------------
// JSX elements
// -----------------------------------------------------------------------------

pub fn tag_name(name: &JSXElementName) -> Option<&str> {
    match name {
        JSXElementName::Ident(id) => Some(id.sym.as_ref()),
        _ => None,
    }
}

pub fn is_tag(el: &JSXElement, name: &str) -> bool {
    tag_name(&el.opening.name) == Some(name)
}

/// Renames an element, keeping the closing tag in sync.
pub fn rename_tag(el: &mut JSXElement, name: JSXElementName) {
    if let Some(closing) = &mut el.closing {
        closing.name = name.clone();
    }
    el.opening.name = name;
}

/// Whitespace text or an empty `{}` between tags.
pub fn is_layout_child(child: &JSXElementChild) -> bool {
    match child {
        JSXElementChild::JSXText(t) => t.value.trim().is_empty(),
        JSXElementChild::JSXExprContainer(JSXExprContainer {
            expr: JSXExpr::JSXEmptyExpr(_),
            ..
        }) => true,
        _ => false,
    }
}

/// Children that are not layout whitespace.
pub fn meaningful_children(children: &[JSXElementChild]) -> Vec<&JSXElementChild> {
    children.iter().filter(|c| !is_layout_child(c)).collect()
}

pub struct TagFinder<'a> {
    accept: &'a dyn Fn(&str) -> bool,
    found: bool,
}

impl Visit for TagFinder<'_> {
    fn visit_jsx_opening_element(&mut self, n: &JSXOpeningElement) {
        if tag_name(&n.name).is_some_and(|t| (self.accept)(t)) {
            self.found = true;
            return;
        }
        n.visit_children_with(self);
    }
}

/// Whether any JSX element below `node` has a tag accepted by `accept`.
pub fn contains_tag<N>(node: &N, accept: &dyn Fn(&str) -> bool) -> bool
where
    N: for<'a> VisitWith<TagFinder<'a>>,
{
    let mut finder = TagFinder {
        accept,
        found: false,
    };
    node.visit_with(&mut finder);
    finder.found
}

// -----------------------------------------------------------------------------
// Expressions
// -----------------------------------------------------------------------------

pub fn unparen(expr: &Expr) -> &Expr {
    match expr {
        Expr::Paren(p) => unparen(&p.expr),
        other => other,
    }
}

pub fn string_literal(expr: &Expr) -> Option<&str> {
    match unparen(expr) {
        Expr::Lit(Lit::Str(s)) => Some(s.value.as_ref()),
        _ => None,
    }
}

pub fn ident_name(expr: &Expr) -> Option<&str> {
    match unparen(expr) {
        Expr::Ident(id) => Some(id.sym.as_ref()),
        _ => None,
    }
}

pub fn callee_name(call: &CallExpr) -> Option<&str> {
    match &call.callee {
        Callee::Expr(callee) => ident_name(callee),
        _ => None,
    }
}

/// `expr` is (a parenthesized) call to the identifier `name`.
pub fn call_to<'a>(expr: &'a Expr, name: &str) -> Option<&'a CallExpr> {
    match unparen(expr) {
        Expr::Call(call) if callee_name(call) == Some(name) => Some(call),
        _ => None,
    }
}

/// Static key of `obj.key` / `obj["key"]`.
pub fn member_key(member: &MemberExpr) -> Option<&str> {
    match &member.prop {
        MemberProp::Ident(id) => Some(id.sym.as_ref()),
        MemberProp::Computed(c) => string_literal(&c.expr),
        MemberProp::PrivateName(_) => None,
    }
}

/// `root.key` (or `root["key"]`) where `root` is the identifier `root`.
pub fn member_of<'a>(expr: &'a Expr, root: &str) -> Option<&'a str> {
    match unparen(expr) {
        Expr::Member(m) if ident_name(&m.obj) == Some(root) => member_key(m),
        _ => None,
    }
}

// -----------------------------------------------------------------------------
// Declarations
// -----------------------------------------------------------------------------

pub fn pat_binds(pat: &Pat, name: &str) -> bool {
    match pat {
        Pat::Ident(b) => b.id.sym.as_ref() == name,
        Pat::Array(a) => a.elems.iter().flatten().any(|p| pat_binds(p, name)),
        Pat::Object(o) => o.props.iter().any(|p| match p {
            ObjectPatProp::KeyValue(kv) => pat_binds(&kv.value, name),
            ObjectPatProp::Assign(a) => a.key.id.sym.as_ref() == name,
            ObjectPatProp::Rest(r) => pat_binds(&r.arg, name),
        }),
        Pat::Rest(r) => pat_binds(&r.arg, name),
        Pat::Assign(a) => pat_binds(&a.left, name),
        Pat::Invalid(_) | Pat::Expr(_) => false,
    }
}

pub fn var_decl(stmt: &Stmt) -> Option<&VarDecl> {
    match stmt {
        Stmt::Decl(Decl::Var(v)) => Some(v),
        _ => None,
    }
}

pub fn var_decl_mut(stmt: &mut Stmt) -> Option<&mut VarDecl> {
    match stmt {
        Stmt::Decl(Decl::Var(v)) => Some(v),
        _ => None,
    }
}

/// Whether the statement declares `name` (variable, function or class).
pub fn stmt_binds(stmt: &Stmt, name: &str) -> bool {
    match stmt {
        Stmt::Decl(Decl::Var(v)) => v.decls.iter().any(|d| pat_binds(&d.name, name)),
        Stmt::Decl(Decl::Fn(f)) => f.ident.sym.as_ref() == name,
        Stmt::Decl(Decl::Class(c)) => c.ident.sym.as_ref() == name,
        _ => false,
    }
}

/// Index of the statement that declares `name`.
pub fn position_of_binding(stmts: &[Stmt], name: &str) -> Option<usize> {
    stmts.iter().position(|s| stmt_binds(s, name))
}

pub fn binds_any(stmts: &[Stmt], name: &str) -> bool {
    position_of_binding(stmts, name).is_some()
}

/// `base`, then `base1`, `base2`, ... until the name is not taken.
pub fn fresh_name(base: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(base) {
        return base.to_string();
    }
    (1..)
        .map(|n| format!("{base}{n}"))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| base.to_string())
}

/// Top-level names declared by a statement list.
pub fn declared_names(stmts: &[Stmt]) -> HashSet<String> {
    let mut out = HashSet::new();
    for stmt in stmts {
        match stmt {
            Stmt::Decl(Decl::Var(v)) => {
                for d in &v.decls {
                    collect_pat_names(&d.name, &mut out);
                }
            }
            Stmt::Decl(Decl::Fn(f)) => {
                out.insert(f.ident.sym.to_string());
            }
            Stmt::Decl(Decl::Class(c)) => {
                out.insert(c.ident.sym.to_string());
            }
            _ => {}
        }
    }
    out
}

fn collect_pat_names(pat: &Pat, out: &mut HashSet<String>) {
    match pat {
        Pat::Ident(b) => {
            out.insert(b.id.sym.to_string());
        }
        Pat::Array(a) => a.elems.iter().flatten().for_each(|p| collect_pat_names(p, out)),
        Pat::Object(o) => {
            for p in &o.props {
                match p {
                    ObjectPatProp::KeyValue(kv) => collect_pat_names(&kv.value, out),
                    ObjectPatProp::Assign(a) => {
                        out.insert(a.key.id.sym.to_string());
                    }
                    ObjectPatProp::Rest(r) => collect_pat_names(&r.arg, out),
                }
            }
        }
        Pat::Rest(r) => collect_pat_names(&r.arg, out),
        Pat::Assign(a) => collect_pat_names(&a.left, out),
        Pat::Invalid(_) | Pat::Expr(_) => {}
    }
}

// -----------------------------------------------------------------------------
// Usage
// -----------------------------------------------------------------------------

/// Identifier references and called names of one scope.
///
/// Binding positions are not references. With `skip_wiring`, the
/// controlled-input attributes that the input rewrite strips are ignored, so
/// `value={values.name}` alone does not keep `values` alive.
#[derive(Default)]
pub struct IdentUsage<'a> {
    pub refs: HashSet<String>,
    pub calls: HashSet<String>,
    skip_wiring: Option<&'a SourceNames>,
}

impl<'a> IdentUsage<'a> {
    pub fn new(skip_wiring: Option<&'a SourceNames>) -> Self {
        Self {
            refs: HashSet::new(),
            calls: HashSet::new(),
            skip_wiring,
        }
    }

    pub fn references(&self, name: &str) -> bool {
        self.refs.contains(name)
    }

    pub fn calls(&self, name: &str) -> bool {
        self.calls.contains(name)
    }
}

impl Visit for IdentUsage<'_> {
    fn visit_ident(&mut self, n: &Ident) {
        self.refs.insert(n.sym.to_string());
    }

    fn visit_binding_ident(&mut self, n: &BindingIdent) {
        // declaration, not a reference; annotations may still mention types
        n.type_ann.visit_with(self);
    }

    fn visit_call_expr(&mut self, n: &CallExpr) {
        if let Some(name) = callee_name(n) {
            self.calls.insert(name.to_string());
        }
        n.visit_children_with(self);
    }

    fn visit_jsx_opening_element(&mut self, n: &JSXOpeningElement) {
        let Some(names) = self.skip_wiring else {
            n.visit_children_with(self);
            return;
        };
        if !input_props::is_rewritten_input(n, names) {
            n.visit_children_with(self);
            return;
        }
        n.name.visit_with(self);
        for attr in &n.attrs {
            match attr {
                JSXAttrOrSpread::JSXAttr(a) if input_props::is_stripped_attr(a) => {}
                other => other.visit_with(self),
            }
        }
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
