//! Rewriting controlled inputs into `{...getInputProps(field, options)}`.
//!
//! Two kinds of element go through here: the library's `<Field>` component
//! and native `input`/`select`/`textarea` elements whose handlers or value
//! are wired to the form state. Both lose the wiring attributes and gain one
//! spread plus an `id`; everything else on the element is carried over.

use std::collections::HashSet;

use swc_core::ecma::{
    ast::*,
    visit::{Visit, VisitWith},
};

use crate::{
    features::SourceNames,
    query::{self, AttrValue},
    synth,
};

pub const NATIVE_INPUTS: &[&str] = &["input", "select", "textarea"];

/// Names whose presence in an `onClick` marks it as touch bookkeeping.
const TOUCH_HANDLERS: &[&str] = &["handleBlur", "onBlur", "setTouched", "setFieldTouched"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    /// The library's `<Field>`; its tag is replaced.
    FieldComponent,
    /// A native element; its tag is kept.
    Native,
}

/// Where the field descriptor handed to `getInputProps` comes from.
pub enum FieldSource<'a> {
    /// `fields[<name>]` on the given fieldset binding.
    Fieldset(&'a str),
    /// A descriptor already in scope, e.g. the first slot of a field hook.
    Binding(Box<Expr>),
}

// -----------------------------------------------------------------------------
// Detection
// -----------------------------------------------------------------------------

struct WiringRefs(bool);

impl Visit for WiringRefs {
    fn visit_ident(&mut self, n: &Ident) {
        if matches!(n.sym.as_ref(), "handleChange" | "handleBlur") {
            self.0 = true;
        }
    }

    fn visit_member_expr(&mut self, n: &MemberExpr) {
        if query::ident_name(&n.obj) == Some("values")
            || matches!(query::member_key(n), Some("handleChange" | "handleBlur" | "values"))
        {
            self.0 = true;
            return;
        }
        n.visit_children_with(self);
    }
}

fn is_wired_attr(attr: &JSXAttr) -> bool {
    if !matches!(query::attr_name(attr), Some("onChange" | "onBlur" | "value")) {
        return false;
    }
    let mut refs = WiringRefs(false);
    attr.value.visit_with(&mut refs);
    refs.0
}

/// A native input whose handlers or value point at the form state.
pub fn is_wired_native(opening: &JSXOpeningElement) -> bool {
    query::tag_name(&opening.name).is_some_and(|t| NATIVE_INPUTS.contains(&t))
        && opening.attrs.iter().any(|a| match a {
            JSXAttrOrSpread::JSXAttr(attr) => is_wired_attr(attr),
            JSXAttrOrSpread::SpreadElement(_) => false,
        })
}

/// Elements the field rewrite will turn into a `getInputProps` spread.
pub fn is_rewritten_input(opening: &JSXOpeningElement, names: &SourceNames) -> bool {
    query::tag_name(&opening.name) == Some(names.field.as_str()) || is_wired_native(opening)
}

fn mentions_touch(attr: &JSXAttr) -> bool {
    let mut usage = query::IdentUsage::new(None);
    attr.value.visit_with(&mut usage);
    TOUCH_HANDLERS.iter().any(|h| usage.references(h))
        || attr_mentions_member(attr, TOUCH_HANDLERS)
}

fn attr_mentions_member(attr: &JSXAttr, keys: &[&str]) -> bool {
    struct Keys<'a>(&'a [&'a str], bool);
    impl Visit for Keys<'_> {
        fn visit_member_prop(&mut self, n: &MemberProp) {
            if let MemberProp::Ident(id) = n {
                if self.0.contains(&id.sym.as_ref()) {
                    self.1 = true;
                }
            }
        }
    }
    let mut keys = Keys(keys, false);
    attr.value.visit_with(&mut keys);
    keys.1
}

/// Attributes dropped from a rewritten input.
pub fn is_stripped_attr(attr: &JSXAttr) -> bool {
    match query::attr_name(attr) {
        Some("onChange" | "onBlur" | "value") => true,
        Some("onClick") => mentions_touch(attr),
        _ => false,
    }
}

// -----------------------------------------------------------------------------
// Rewrites
// -----------------------------------------------------------------------------

/// Field components are named by `name`; every element then falls back to
/// `id`, the `values.key` it was bound to, and finally `"field"`.
fn resolve_name(
    kind: ElementKind,
    name: AttrValue,
    id: &AttrValue,
    value: Option<&JSXAttr>,
) -> (Box<Expr>, Option<String>) {
    if kind == ElementKind::FieldComponent {
        match name {
            AttrValue::Literal(s) => return (synth::str_expr(&s), Some(s)),
            AttrValue::Expr(e) => return (e, None),
            AttrValue::Bare | AttrValue::Absent => {}
        }
    }
    match id {
        AttrValue::Literal(s) => return (synth::str_expr(s), Some(s.clone())),
        AttrValue::Expr(e) => return (e.clone(), None),
        AttrValue::Bare | AttrValue::Absent => {}
    }
    if let Some(key) = value
        .and_then(query::attr_expr)
        .and_then(|e| query::member_of(e, "values"))
    {
        return (synth::str_expr(key), Some(key.to_string()));
    }
    (synth::str_expr("field"), Some("field".to_string()))
}

fn disabled_expr(value: AttrValue) -> Option<Box<Expr>> {
    match value {
        AttrValue::Absent => None,
        AttrValue::Bare => Some(synth::bool_expr(true)),
        AttrValue::Literal(s) => Some(synth::bool_expr(s != "false")),
        AttrValue::Expr(e) => Some(e),
    }
}

fn field_tag(attrs: &mut Vec<JSXAttrOrSpread>) -> JSXElementName {
    let as_attr = query::take_attr(attrs, "as");
    let component = query::take_attr(attrs, "component");
    let chosen = as_attr.or(component).map(|a| AttrValue::from_attr(&a));
    match chosen {
        Some(AttrValue::Literal(tag)) => synth::jsx_name(&tag),
        Some(AttrValue::Expr(e)) => match query::ident_name(&e) {
            Some(name) => synth::jsx_name(name),
            None => synth::jsx_name("input"),
        },
        _ => synth::jsx_name("input"),
    }
}

/// Replaces the wiring of one field element with a `getInputProps` spread.
pub fn rewrite_field_element(el: &mut JSXElement, kind: ElementKind, source: FieldSource<'_>) {
    let attrs = &mut el.opening.attrs;

    let value = query::take_attr(attrs, "value");
    attrs.retain(|a| match a {
        JSXAttrOrSpread::JSXAttr(attr) => !is_stripped_attr(attr),
        JSXAttrOrSpread::SpreadElement(_) => true,
    });

    let name = query::take_attr(attrs, "name")
        .map(|a| AttrValue::from_attr(&a))
        .unwrap_or(AttrValue::Absent);
    let id = AttrValue::of(attrs, "id");
    let (name_expr, literal_name) = resolve_name(kind, name, &id, value.as_ref());

    let field_type = query::take_attr(attrs, "type")
        .map(|a| AttrValue::from_attr(&a))
        .and_then(|v| match v {
            AttrValue::Bare | AttrValue::Absent => None,
            other => other.into_expr(),
        })
        .unwrap_or_else(|| synth::str_expr("text"));
    let mut options = vec![synth::key_value("type", field_type)];
    if let Some(placeholder) = query::take_attr(attrs, "placeholder")
        .map(|a| AttrValue::from_attr(&a))
        .and_then(|v| match v {
            AttrValue::Bare => None,
            other => other.into_expr(),
        })
    {
        options.push(synth::key_value("placeholder", placeholder));
    }
    if let Some(disabled) = query::take_attr(attrs, "disabled")
        .map(|a| AttrValue::from_attr(&a))
        .and_then(disabled_expr)
    {
        options.push(synth::key_value("disabled", disabled));
    }

    let id_attr = query::take_attr(attrs, "id").map(JSXAttrOrSpread::JSXAttr).unwrap_or_else(|| {
        synth::jsx_str_attr("id", literal_name.as_deref().unwrap_or("field-id"))
    });

    if kind == ElementKind::FieldComponent {
        let tag = field_tag(attrs);
        query::take_attr(attrs, "validate");
        if let Some(mut inner_ref) = query::take_attr(attrs, "innerRef") {
            inner_ref.name = JSXAttrName::Ident(IdentName::new("ref".into(), inner_ref.span));
            attrs.push(JSXAttrOrSpread::JSXAttr(inner_ref));
        }
        query::rename_tag(el, tag);
    }

    let descriptor = match source {
        FieldSource::Fieldset(fieldset) => {
            synth::computed_member(synth::ident_expr(fieldset), name_expr)
        }
        FieldSource::Binding(expr) => expr,
    };
    let spread = synth::jsx_spread(synth::call_named(
        "getInputProps",
        vec![descriptor, synth::object(options)],
    ));

    let rest = std::mem::take(&mut el.opening.attrs);
    el.opening.attrs = std::iter::once(spread)
        .chain(std::iter::once(id_attr))
        .chain(rest)
        .collect();

    let self_closing = query::meaningful_children(&el.children).is_empty();
    if self_closing {
        el.children.clear();
        el.closing = None;
    } else if el.closing.is_none() {
        el.closing = Some(JSXClosingElement {
            span: el.span,
            name: el.opening.name.clone(),
        });
    }
    el.opening.self_closing = self_closing;
}

/// Index of a `{...getFieldProps(x)}` (or `{...formik.getFieldProps(x)}`)
/// spread.
pub fn field_props_spread(attrs: &[JSXAttrOrSpread]) -> Option<usize> {
    attrs.iter().position(|a| match a {
        JSXAttrOrSpread::SpreadElement(spread) => field_props_call(&spread.expr).is_some(),
        JSXAttrOrSpread::JSXAttr(_) => false,
    })
}

fn field_props_call(expr: &Expr) -> Option<&CallExpr> {
    let Expr::Call(call) = query::unparen(expr) else {
        return None;
    };
    let Callee::Expr(callee) = &call.callee else {
        return None;
    };
    let is_getter = match query::unparen(callee) {
        Expr::Ident(id) => id.sym.as_ref() == "getFieldProps",
        Expr::Member(m) => query::member_key(m) == Some("getFieldProps"),
        _ => false,
    };
    is_getter.then_some(call)
}

/// `getFieldProps("x")` / `getFieldProps({ name: "x" })` → the name.
fn field_props_name(call: &CallExpr) -> Box<Expr> {
    let Some(arg) = call.args.first() else {
        return synth::str_expr("field");
    };
    if let Expr::Object(obj) = query::unparen(&arg.expr) {
        let name = obj.props.iter().find_map(|p| match p {
            PropOrSpread::Prop(prop) => match &**prop {
                Prop::KeyValue(kv)
                    if matches!(&kv.key, PropName::Ident(k) if k.sym.as_ref() == "name") =>
                {
                    Some(kv.value.clone())
                }
                Prop::Shorthand(id) if id.sym.as_ref() == "name" => {
                    Some(Box::new(Expr::Ident(id.clone())))
                }
                _ => None,
            },
            PropOrSpread::Spread(_) => None,
        });
        if let Some(name) = name {
            return name;
        }
    }
    arg.expr.clone()
}

/// Replaces a `getFieldProps` spread with `getInputProps(fields[x], { type })`,
/// folding a sibling `type` attribute into the options. Returns whether the
/// element had such a spread.
pub fn rewrite_field_props_spread(opening: &mut JSXOpeningElement, fieldset: &str) -> bool {
    let Some(idx) = field_props_spread(&opening.attrs) else {
        return false;
    };
    let name = match &opening.attrs[idx] {
        JSXAttrOrSpread::SpreadElement(spread) => match field_props_call(&spread.expr) {
            Some(call) => field_props_name(call),
            None => return false,
        },
        JSXAttrOrSpread::JSXAttr(_) => return false,
    };
    let field_type = query::find_attr(&opening.attrs, "type")
        .map(AttrValue::from_attr)
        .and_then(AttrValue::into_expr)
        .unwrap_or_else(|| synth::str_expr("text"));

    opening.attrs[idx] = synth::jsx_spread(synth::call_named(
        "getInputProps",
        vec![
            synth::computed_member(synth::ident_expr(fieldset), name),
            synth::object(vec![synth::key_value("type", field_type)]),
        ],
    ));
    query::take_attr(&mut opening.attrs, "type");
    true
}

/// Removes a `{...binding}` spread where `binding` is one of `bindings`, and
/// returns the binding's name.
pub fn take_binding_spread(
    attrs: &mut Vec<JSXAttrOrSpread>,
    bindings: &HashSet<String>,
) -> Option<String> {
    let idx = attrs.iter().position(|a| match a {
        JSXAttrOrSpread::SpreadElement(spread) => {
            query::ident_name(&spread.expr).is_some_and(|n| bindings.contains(n))
        }
        JSXAttrOrSpread::JSXAttr(_) => false,
    })?;
    match attrs.remove(idx) {
        JSXAttrOrSpread::SpreadElement(spread) => query::ident_name(&spread.expr).map(str::to_string),
        JSXAttrOrSpread::JSXAttr(_) => None,
    }
}
