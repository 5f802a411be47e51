//! Pure constructors for the tree fragments the passes emit.
//!
//! Everything here is built on `DUMMY_SP` / `SyntaxContext::empty()`; the
//! printer does not need real positions for synthesized code.

use swc_core::{
    common::{Span, SyntaxContext, DUMMY_SP},
    ecma::{
        ast::*,
        utils::ExprFactory,
    },
};

// -----------------------------------------------------------------------------
// Identifiers & literals
// -----------------------------------------------------------------------------

pub fn ident(name: &str) -> Ident {
    Ident::new(name.into(), DUMMY_SP, SyntaxContext::empty())
}

pub fn ident_expr(name: &str) -> Box<Expr> {
    Box::new(Expr::Ident(ident(name)))
}

pub fn str_lit(value: &str) -> Str {
    Str {
        span: DUMMY_SP,
        value: value.into(),
        raw: None,
    }
}

pub fn str_expr(value: &str) -> Box<Expr> {
    Box::new(Expr::Lit(Lit::Str(str_lit(value))))
}

pub fn bool_expr(value: bool) -> Box<Expr> {
    Box::new(Expr::Lit(Lit::Bool(Bool {
        span: DUMMY_SP,
        value,
    })))
}

// -----------------------------------------------------------------------------
// Expressions
// -----------------------------------------------------------------------------

pub fn call(callee: Box<Expr>, args: Vec<Box<Expr>>) -> CallExpr {
    CallExpr {
        span: DUMMY_SP,
        ctxt: SyntaxContext::empty(),
        callee: callee.as_callee(),
        args: args.into_iter().map(|a| a.as_arg()).collect(),
        type_args: None,
    }
}

/// `name(args...)`
pub fn call_named(name: &str, args: Vec<Box<Expr>>) -> Box<Expr> {
    Box::new(Expr::Call(call(ident_expr(name), args)))
}

/// `obj.prop(args...)`
pub fn method_call(obj: &str, prop: &str, args: Vec<Box<Expr>>) -> Box<Expr> {
    Box::new(Expr::Call(call(member(ident_expr(obj), prop), args)))
}

/// `obj.prop`
pub fn member(obj: Box<Expr>, prop: &str) -> Box<Expr> {
    Box::new(Expr::Member(MemberExpr {
        span: DUMMY_SP,
        obj,
        prop: MemberProp::Ident(IdentName::new(prop.into(), DUMMY_SP)),
    }))
}

/// `obj[key]`
pub fn computed_member(obj: Box<Expr>, key: Box<Expr>) -> Box<Expr> {
    Box::new(Expr::Member(MemberExpr {
        span: DUMMY_SP,
        obj,
        prop: MemberProp::Computed(ComputedPropName {
            span: DUMMY_SP,
            expr: key,
        }),
    }))
}

/// `!!expr`
pub fn double_not(expr: Box<Expr>) -> Box<Expr> {
    let inner = Box::new(Expr::Unary(UnaryExpr {
        span: DUMMY_SP,
        op: UnaryOp::Bang,
        arg: expr,
    }));
    Box::new(Expr::Unary(UnaryExpr {
        span: DUMMY_SP,
        op: UnaryOp::Bang,
        arg: inner,
    }))
}

pub fn paren(expr: Box<Expr>) -> Box<Expr> {
    Box::new(Expr::Paren(ParenExpr {
        span: DUMMY_SP,
        expr,
    }))
}

pub fn key_value(key: &str, value: Box<Expr>) -> PropOrSpread {
    PropOrSpread::Prop(Box::new(Prop::KeyValue(KeyValueProp {
        key: PropName::Ident(IdentName::new(key.into(), DUMMY_SP)),
        value,
    })))
}

pub fn shorthand(name: &str) -> PropOrSpread {
    PropOrSpread::Prop(Box::new(Prop::Shorthand(ident(name))))
}

pub fn object(props: Vec<PropOrSpread>) -> Box<Expr> {
    Box::new(Expr::Object(ObjectLit {
        span: DUMMY_SP,
        props,
    }))
}

pub fn arrow(params: Vec<Pat>, body: BlockStmtOrExpr) -> Box<Expr> {
    Box::new(Expr::Arrow(ArrowExpr {
        span: DUMMY_SP,
        ctxt: SyntaxContext::empty(),
        params,
        body: Box::new(body),
        is_async: false,
        is_generator: false,
        type_params: None,
        return_type: None,
    }))
}

// -----------------------------------------------------------------------------
// Patterns & types
// -----------------------------------------------------------------------------

pub fn binding(name: &str) -> Pat {
    Pat::Ident(BindingIdent {
        id: ident(name),
        type_ann: None,
    })
}

/// A function parameter, optionally annotated (`name?: T`).
pub fn param(name: &str, type_ann: Option<Box<TsType>>, optional: bool) -> Pat {
    Pat::Ident(BindingIdent {
        id: Ident {
            optional,
            ..ident(name)
        },
        type_ann: type_ann.map(|type_ann| {
            Box::new(TsTypeAnn {
                span: DUMMY_SP,
                type_ann,
            })
        }),
    })
}

pub fn keyword_type(kind: TsKeywordTypeKind) -> Box<TsType> {
    Box::new(TsType::TsKeywordType(TsKeywordType {
        span: DUMMY_SP,
        kind,
    }))
}

/// `[a, , c]`; `None` leaves a hole.
pub fn array_pat(names: &[Option<&str>]) -> Pat {
    Pat::Array(ArrayPat {
        span: DUMMY_SP,
        elems: names.iter().map(|n| n.map(binding)).collect(),
        optional: false,
        type_ann: None,
    })
}

/// `{ a, b }`
pub fn object_pat(names: &[&str]) -> Pat {
    Pat::Object(ObjectPat {
        span: DUMMY_SP,
        props: names
            .iter()
            .map(|n| {
                ObjectPatProp::Assign(AssignPatProp {
                    span: DUMMY_SP,
                    key: ident(n).into(),
                    value: None,
                })
            })
            .collect(),
        optional: false,
        type_ann: None,
    })
}

// -----------------------------------------------------------------------------
// Statements
// -----------------------------------------------------------------------------

pub fn block(stmts: Vec<Stmt>) -> BlockStmt {
    BlockStmt {
        span: DUMMY_SP,
        ctxt: SyntaxContext::empty(),
        stmts,
    }
}

pub fn const_decl(name: Pat, init: Box<Expr>) -> Stmt {
    const_decl_at(DUMMY_SP, name, init)
}

/// Same as [`const_decl`] but anchored at `span`, which is where leading
/// comments get attached.
pub fn const_decl_at(span: Span, name: Pat, init: Box<Expr>) -> Stmt {
    Stmt::Decl(Decl::Var(Box::new(VarDecl {
        span,
        ctxt: SyntaxContext::empty(),
        kind: VarDeclKind::Const,
        declare: false,
        decls: vec![VarDeclarator {
            span: DUMMY_SP,
            name,
            init: Some(init),
            definite: false,
        }],
    })))
}

pub fn const_ident(name: &str, init: Box<Expr>) -> Stmt {
    const_decl(binding(name), init)
}

pub fn expr_stmt(expr: Box<Expr>) -> Stmt {
    Stmt::Expr(ExprStmt {
        span: DUMMY_SP,
        expr,
    })
}

pub fn return_stmt(expr: Box<Expr>) -> Stmt {
    Stmt::Return(ReturnStmt {
        span: DUMMY_SP,
        arg: Some(expr),
    })
}

// -----------------------------------------------------------------------------
// JSX
// -----------------------------------------------------------------------------

pub fn jsx_name(name: &str) -> JSXElementName {
    JSXElementName::Ident(ident(name))
}

pub fn jsx_attr(name: &str, value: Option<JSXAttrValue>) -> JSXAttrOrSpread {
    JSXAttrOrSpread::JSXAttr(JSXAttr {
        span: DUMMY_SP,
        name: JSXAttrName::Ident(IdentName::new(name.into(), DUMMY_SP)),
        value,
    })
}

pub fn jsx_str_attr(name: &str, value: &str) -> JSXAttrOrSpread {
    jsx_attr(name, Some(JSXAttrValue::Lit(Lit::Str(str_lit(value)))))
}

pub fn jsx_expr_attr(name: &str, expr: Box<Expr>) -> JSXAttrOrSpread {
    jsx_attr(
        name,
        Some(JSXAttrValue::JSXExprContainer(JSXExprContainer {
            span: DUMMY_SP,
            expr: JSXExpr::Expr(expr),
        })),
    )
}

pub fn jsx_spread(expr: Box<Expr>) -> JSXAttrOrSpread {
    JSXAttrOrSpread::SpreadElement(SpreadElement {
        dot3_token: DUMMY_SP,
        expr,
    })
}

pub fn jsx_expr_child(expr: Box<Expr>) -> JSXElementChild {
    JSXElementChild::JSXExprContainer(JSXExprContainer {
        span: DUMMY_SP,
        expr: JSXExpr::Expr(expr),
    })
}

pub fn jsx_element(
    name: JSXElementName,
    attrs: Vec<JSXAttrOrSpread>,
    children: Vec<JSXElementChild>,
) -> JSXElement {
    let self_closing = children.is_empty();
    JSXElement {
        span: DUMMY_SP,
        opening: JSXOpeningElement {
            span: DUMMY_SP,
            name: name.clone(),
            attrs,
            self_closing,
            type_args: None,
        },
        closing: (!self_closing).then(|| JSXClosingElement {
            span: DUMMY_SP,
            name,
        }),
        children,
    }
}

pub fn jsx_fragment(children: Vec<JSXElementChild>) -> JSXFragment {
    JSXFragment {
        span: DUMMY_SP,
        opening: JSXOpeningFragment { span: DUMMY_SP },
        children,
        closing: JSXClosingFragment { span: DUMMY_SP },
    }
}

/// Markup that replaces an element: either another element or a fragment.
pub enum Markup {
    Element(Box<JSXElement>),
    Fragment(JSXFragment),
}

impl Markup {
    pub fn into_expr(self) -> Expr {
        match self {
            Markup::Element(el) => Expr::JSXElement(el),
            Markup::Fragment(frag) => Expr::JSXFragment(frag),
        }
    }

    pub fn into_child(self) -> JSXElementChild {
        match self {
            Markup::Element(el) => JSXElementChild::JSXElement(el),
            Markup::Fragment(frag) => JSXElementChild::JSXFragment(frag),
        }
    }
}

// -----------------------------------------------------------------------------
// Imports
// -----------------------------------------------------------------------------

/// `imported` or `imported as local`.
pub fn import_specifier(imported: &str, local: Option<&str>) -> ImportSpecifier {
    match local {
        Some(local) if local != imported => ImportSpecifier::Named(ImportNamedSpecifier {
            span: DUMMY_SP,
            local: ident(local),
            imported: Some(ModuleExportName::Ident(ident(imported))),
            is_type_only: false,
        }),
        _ => ImportSpecifier::Named(ImportNamedSpecifier {
            span: DUMMY_SP,
            local: ident(imported),
            imported: None,
            is_type_only: false,
        }),
    }
}

pub fn import_decl(source: &str, specifiers: Vec<ImportSpecifier>) -> ModuleItem {
    ModuleItem::ModuleDecl(ModuleDecl::Import(ImportDecl {
        span: DUMMY_SP,
        specifiers,
        src: Box::new(str_lit(source)),
        type_only: false,
        with: None,
        phase: ImportPhase::Evaluation,
    }))
}
