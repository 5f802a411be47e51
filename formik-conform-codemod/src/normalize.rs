//! Fieldset access in one spelling: `fields["x"]`.

use swc_core::ecma::{
    ast::*,
    visit::{VisitMut, VisitMutWith},
};

use crate::{context::FIELDSET, query, synth};

/// Rewrites, module-wide and idempotently:
/// `getFieldProps(x)` → `fields[x]`, `getInputProps(fields.x, ...)` →
/// `getInputProps(fields["x"], ...)` and any other `fields.x` → `fields["x"]`.
pub fn normalize(module: &mut Module) {
    module.visit_mut_with(&mut FieldProps);
    module.visit_mut_with(&mut InputPropsArgs);
    module.visit_mut_with(&mut ComputedFieldset);
}

fn is_field_props_callee(callee: &Callee) -> bool {
    let Callee::Expr(callee) = callee else {
        return false;
    };
    match query::unparen(callee) {
        Expr::Ident(id) => id.sym.as_ref() == "getFieldProps",
        Expr::Member(m) => query::member_key(m) == Some("getFieldProps"),
        _ => false,
    }
}

/// `fields.x` → `fields["x"]`; anything else is left alone.
fn compute_member(expr: &mut Expr) {
    let Expr::Member(member) = expr else {
        return;
    };
    if query::ident_name(&member.obj) != Some(FIELDSET) {
        return;
    }
    if let MemberProp::Ident(key) = &member.prop {
        member.prop = MemberProp::Computed(ComputedPropName {
            span: key.span,
            expr: synth::str_expr(key.sym.as_ref()),
        });
    }
}

struct FieldProps;

impl VisitMut for FieldProps {
    fn visit_mut_expr(&mut self, n: &mut Expr) {
        n.visit_mut_children_with(self);
        let Expr::Call(call) = n else {
            return;
        };
        if !is_field_props_callee(&call.callee) || call.args.len() != 1 || call.args[0].spread.is_some() {
            return;
        }
        let arg = call.args.remove(0).expr;
        *n = *synth::computed_member(synth::ident_expr(FIELDSET), arg);
    }
}

struct InputPropsArgs;

impl VisitMut for InputPropsArgs {
    fn visit_mut_call_expr(&mut self, n: &mut CallExpr) {
        n.visit_mut_children_with(self);
        if query::callee_name(n) != Some("getInputProps") {
            return;
        }
        if let Some(first) = n.args.first_mut() {
            compute_member(&mut first.expr);
        }
    }
}

struct ComputedFieldset;

impl VisitMut for ComputedFieldset {
    fn visit_mut_expr(&mut self, n: &mut Expr) {
        n.visit_mut_children_with(self);
        compute_member(n);
    }
}
