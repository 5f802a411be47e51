//! Component scopes: the function bodies the per-component passes run over.
//!
//! A function is a scope when it is bound to a capitalized name (directly,
//! or through a wrapper call such as `memo(...)`), when it is a default
//! export, or when it is not nested inside any other function. Passes
//! working inside one scope never descend into a nested scope; the driver
//! hands those out separately.

use swc_core::{
    common::DUMMY_SP,
    ecma::{
        ast::*,
        visit::{Visit, VisitMut, VisitMutWith, VisitWith},
    },
};

use crate::{error::ConvertError, features::SourceNames, query, query::IdentUsage, synth};

pub fn is_component_name(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_ascii_uppercase())
}

fn is_function_like(expr: &Expr) -> bool {
    match query::unparen(expr) {
        Expr::Arrow(_) | Expr::Fn(_) => true,
        // memo(() => ...), forwardRef(function (props, ref) { ... })
        Expr::Call(call) => call
            .args
            .iter()
            .any(|a| a.spread.is_none() && is_function_like(&a.expr)),
        _ => false,
    }
}

/// `const Name = <function>` with a capitalized binding.
pub fn declares_component(decl: &VarDeclarator) -> bool {
    let Pat::Ident(binding) = &decl.name else {
        return false;
    };
    is_component_name(binding.id.sym.as_ref())
        && decl.init.as_deref().is_some_and(is_function_like)
}

// -----------------------------------------------------------------------------
// Scope body
// -----------------------------------------------------------------------------

pub enum ScopeBody<'a> {
    Block(&'a mut BlockStmt),
    Arrow(&'a mut BlockStmtOrExpr),
}

impl ScopeBody<'_> {
    /// Statement list, if the body already is a block.
    pub fn block_stmts(&mut self) -> Option<&mut Vec<Stmt>> {
        match self {
            ScopeBody::Block(b) => Some(&mut b.stmts),
            ScopeBody::Arrow(BlockStmtOrExpr::BlockStmt(b)) => Some(&mut b.stmts),
            ScopeBody::Arrow(BlockStmtOrExpr::Expr(_)) => None,
        }
    }

    /// Statement list, turning an expression body `=> x` into `{ return x; }`
    /// first.
    pub fn stmts(&mut self) -> &mut Vec<Stmt> {
        match self {
            ScopeBody::Block(b) => &mut b.stmts,
            ScopeBody::Arrow(body) => {
                if let BlockStmtOrExpr::Expr(expr) = body {
                    let expr = std::mem::replace(
                        expr,
                        Box::new(Expr::Invalid(Invalid { span: DUMMY_SP })),
                    );
                    **body = BlockStmtOrExpr::BlockStmt(synth::block(vec![synth::return_stmt(
                        expr,
                    )]));
                }
                match &mut **body {
                    BlockStmtOrExpr::BlockStmt(b) => &mut b.stmts,
                    BlockStmtOrExpr::Expr(_) => unreachable!("arrow body was converted to a block"),
                }
            }
        }
    }

    pub fn visit_mut_with<V: VisitMut>(&mut self, v: &mut V) {
        match self {
            ScopeBody::Block(b) => b.visit_mut_children_with(v),
            ScopeBody::Arrow(body) => body.visit_mut_with(v),
        }
    }

    pub fn visit_with<V: Visit>(&self, v: &mut V) {
        match self {
            ScopeBody::Block(b) => b.visit_children_with(v),
            ScopeBody::Arrow(body) => body.visit_with(v),
        }
    }

    /// References in this scope, nested scopes excluded.
    pub fn usage<'n>(&self, skip_wiring: Option<&'n SourceNames>) -> IdentUsage<'n> {
        let mut usage = IdentUsage::new(skip_wiring);
        self.visit_with(&mut usage);
        usage
    }
}

// -----------------------------------------------------------------------------
// Driver
// -----------------------------------------------------------------------------

/// Calls `f` once per component scope, outer scopes before the scopes nested
/// in them. Stops at the first error.
pub fn for_each_scope<F>(module: &mut Module, f: F) -> Result<(), ConvertError>
where
    F: FnMut(&mut ScopeBody<'_>) -> Result<(), ConvertError>,
{
    let mut driver = ScopeDriver {
        f,
        depth: 0,
        pending: false,
        error: None,
    };
    module.visit_mut_with(&mut driver);
    match driver.error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

struct ScopeDriver<F> {
    f: F,
    depth: usize,
    /// The next function reached is bound to a component name.
    pending: bool,
    error: Option<ConvertError>,
}

impl<F> ScopeDriver<F>
where
    F: FnMut(&mut ScopeBody<'_>) -> Result<(), ConvertError>,
{
    fn enter(&mut self) -> bool {
        let is_scope = std::mem::take(&mut self.pending) || self.depth == 0;
        is_scope && self.error.is_none()
    }

    fn run(&mut self, mut body: ScopeBody<'_>) {
        if let Err(err) = (self.f)(&mut body) {
            self.error = Some(err);
        }
    }
}

impl<F> VisitMut for ScopeDriver<F>
where
    F: FnMut(&mut ScopeBody<'_>) -> Result<(), ConvertError>,
{
    fn visit_mut_fn_decl(&mut self, n: &mut FnDecl) {
        if is_component_name(n.ident.sym.as_ref()) {
            self.pending = true;
        }
        n.visit_mut_children_with(self);
    }

    fn visit_mut_var_declarator(&mut self, n: &mut VarDeclarator) {
        if declares_component(n) {
            self.pending = true;
        }
        n.visit_mut_children_with(self);
        self.pending = false;
    }

    fn visit_mut_export_default_decl(&mut self, n: &mut ExportDefaultDecl) {
        if matches!(n.decl, DefaultDecl::Fn(_)) {
            self.pending = true;
        }
        n.visit_mut_children_with(self);
    }

    fn visit_mut_export_default_expr(&mut self, n: &mut ExportDefaultExpr) {
        if is_function_like(&n.expr) {
            self.pending = true;
        }
        n.visit_mut_children_with(self);
        self.pending = false;
    }

    fn visit_mut_function(&mut self, n: &mut Function) {
        if self.enter() {
            if let Some(body) = &mut n.body {
                self.run(ScopeBody::Block(body));
            }
        }
        self.depth += 1;
        n.visit_mut_children_with(self);
        self.depth -= 1;
    }

    fn visit_mut_arrow_expr(&mut self, n: &mut ArrowExpr) {
        if self.enter() {
            self.run(ScopeBody::Arrow(&mut *n.body));
        }
        self.depth += 1;
        n.visit_mut_children_with(self);
        self.depth -= 1;
    }

    fn visit_mut_class(&mut self, n: &mut Class) {
        // methods are never component scopes of their own
        self.depth += 1;
        n.visit_mut_children_with(self);
        self.depth -= 1;
    }
}

/// Passes that work on one scope skip the scopes nested in it.
macro_rules! skip_nested_scopes {
    () => {
        fn visit_mut_fn_decl(&mut self, n: &mut swc_core::ecma::ast::FnDecl) {
            if !$crate::scope::is_component_name(n.ident.sym.as_ref()) {
                swc_core::ecma::visit::VisitMutWith::visit_mut_children_with(n, self);
            }
        }

        fn visit_mut_var_declarator(&mut self, n: &mut swc_core::ecma::ast::VarDeclarator) {
            if !$crate::scope::declares_component(n) {
                swc_core::ecma::visit::VisitMutWith::visit_mut_children_with(n, self);
            }
        }
    };
}

pub(crate) use skip_nested_scopes;
