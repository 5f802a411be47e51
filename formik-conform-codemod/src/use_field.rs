//! `const [{ value }, meta, { setValue }] = useField<T>(name)` →
//! `const [field, form] = useField<T>(name)` plus the bindings the old
//! pattern introduced.

use std::collections::HashSet;

use swc_core::{
    common::DUMMY_SP,
    ecma::{
        ast::*,
        visit::{VisitMut, VisitMutWith},
    },
};
use tracing::debug;

use crate::{
    context::typed_param,
    error::ConvertError,
    query,
    query::IdentUsage,
    scope::{self, ScopeBody},
    synth, Ctx,
};

pub fn convert(module: &mut Module, ctx: &Ctx<'_>) -> Result<(), ConvertError> {
    scope::for_each_scope(module, |body| {
        convert_scope(body, ctx);
        Ok(())
    })
}

/// One `useField` declaration, taken apart.
struct HookSite {
    slots: Vec<Option<Pat>>,
    name: Box<Expr>,
    value_type: Option<Box<TsType>>,
}

/// Finds the next hook declaration at or after `from`, rewrites its pattern
/// to `[field, form]` and returns what the old pattern held.
fn take_site(
    stmts: &mut [Stmt],
    from: usize,
    use_field: &str,
    field: &str,
    form: &str,
) -> Option<(usize, HookSite)> {
    for (idx, stmt) in stmts.iter_mut().enumerate().skip(from) {
        let Some(var) = query::var_decl_mut(stmt) else {
            continue;
        };
        for decl in &mut var.decls {
            let Some(call) = decl.init.as_deref().and_then(|e| query::call_to(e, use_field)) else {
                continue;
            };
            let Pat::Array(array) = &decl.name else {
                continue;
            };
            let name = call
                .args
                .first()
                .map(|a| field_name(&a.expr))
                .unwrap_or_else(|| synth::str_expr("field"));
            let value_type = call
                .type_args
                .as_ref()
                .and_then(|t| t.params.first().cloned());
            let slots = array.elems.clone();
            let field_slot = match slots.first() {
                Some(Some(Pat::Ident(b))) => b.id.sym.to_string(),
                _ => field.to_string(),
            };
            decl.name = synth::array_pat(&[Some(&field_slot), Some(form)]);
            return Some((
                idx,
                HookSite {
                    slots,
                    name,
                    value_type,
                },
            ));
        }
    }
    None
}

/// `"email"`, `name`, `{ name: "email" }` → the name expression.
fn field_name(arg: &Expr) -> Box<Expr> {
    if let Expr::Object(obj) = query::unparen(arg) {
        for prop in &obj.props {
            let PropOrSpread::Prop(prop) = prop else {
                continue;
            };
            match &**prop {
                Prop::KeyValue(kv) if matches!(&kv.key, PropName::Ident(k) if k.sym.as_ref() == "name") => {
                    return kv.value.clone();
                }
                Prop::Shorthand(id) if id.sym.as_ref() == "name" => {
                    return Box::new(Expr::Ident(id.clone()));
                }
                _ => {}
            }
        }
    }
    Box::new(arg.clone())
}

/// Names handed out for one site.
struct SiteNames {
    field: String,
    form: String,
}

struct Synthesis<'a, 'c> {
    ctx: &'a Ctx<'c>,
    usage: &'a IdentUsage<'a>,
    names: SiteNames,
    /// Setter locals whose calls must not be awaited.
    setters: Vec<String>,
}

impl Synthesis<'_, '_> {
    fn field_member(&self, key: &str) -> Box<Expr> {
        synth::member(synth::ident_expr(&self.names.field), key)
    }

    /// `field.errors?.[0]`
    fn first_error(&self) -> Box<Expr> {
        Box::new(Expr::OptChain(OptChainExpr {
            span: DUMMY_SP,
            optional: true,
            base: Box::new(OptChainBase::Member(MemberExpr {
                span: DUMMY_SP,
                obj: self.field_member("errors"),
                prop: MemberProp::Computed(ComputedPropName {
                    span: DUMMY_SP,
                    expr: Box::new(Expr::Lit(Lit::Num(Number {
                        span: DUMMY_SP,
                        value: 0.0,
                        raw: None,
                    }))),
                }),
            })),
        }))
    }

    fn meta_member(&self, key: &str) -> Box<Expr> {
        match key {
            "error" => self.first_error(),
            other => self.field_member(other),
        }
    }

    fn set_value(&self, site: &HookSite) -> Box<Expr> {
        let value_type = site
            .value_type
            .clone()
            .unwrap_or_else(|| synth::keyword_type(TsKeywordTypeKind::TsAnyKeyword));
        let value = if self.ctx.typescript {
            synth::param("value", Some(value_type), false)
        } else {
            synth::binding("value")
        };
        let update = Box::new(Expr::Call(synth::call(
            synth::member(synth::ident_expr(&self.names.form), "update"),
            vec![synth::object(vec![
                synth::key_value("name", site.name.clone()),
                synth::shorthand("value"),
                synth::key_value("validated", synth::double_not(synth::ident_expr("shouldValidate"))),
            ])],
        )));
        synth::arrow(
            vec![
                value,
                typed_param(self.ctx, "shouldValidate", TsKeywordTypeKind::TsBooleanKeyword, true),
            ],
            BlockStmtOrExpr::Expr(update),
        )
    }

    fn set_touched(&self) -> Box<Expr> {
        synth::arrow(
            vec![
                typed_param(self.ctx, "_", TsKeywordTypeKind::TsBooleanKeyword, false),
                typed_param(self.ctx, "__", TsKeywordTypeKind::TsBooleanKeyword, true),
            ],
            BlockStmtOrExpr::BlockStmt(synth::block(vec![])),
        )
    }

    fn value_slot(&self, slot: Option<&Pat>, out: &mut Vec<Stmt>) {
        let Some(Pat::Object(obj)) = slot else {
            return;
        };
        for (key, local) in object_bindings(obj) {
            out.push(synth::const_ident(&local, self.field_member(&key)));
        }
    }

    fn meta_slot(&self, slot: Option<&Pat>, out: &mut Vec<Stmt>) {
        match slot {
            Some(Pat::Object(obj)) => {
                for (key, local) in object_bindings(obj) {
                    out.push(synth::const_ident(&local, self.meta_member(&key)));
                }
            }
            Some(Pat::Ident(b)) if self.usage.references(b.id.sym.as_ref()) => {
                let meta = synth::object(vec![
                    synth::key_value("value", self.field_member("value")),
                    synth::key_value("error", self.first_error()),
                    synth::key_value("initialValue", self.field_member("initialValue")),
                ]);
                out.push(synth::const_ident(b.id.sym.as_ref(), meta));
            }
            _ => {}
        }
    }

    fn helpers_slot(
        &mut self,
        slot: Option<&Pat>,
        site: &HookSite,
        taken: &HashSet<String>,
        out: &mut Vec<Stmt>,
    ) {
        let mut set_value = None;
        let mut set_touched = None;
        match slot {
            Some(Pat::Object(obj)) => {
                for (key, local) in object_bindings(obj) {
                    match key.as_str() {
                        "setValue" => set_value = Some(local),
                        "setTouched" => set_touched = Some(local),
                        other => debug!(helper = other, "dropped unsupported field helper"),
                    }
                }
            }
            Some(Pat::Ident(b)) if self.usage.references(b.id.sym.as_ref()) => {
                let helpers = synth::object(vec![
                    synth::key_value("setValue", self.set_value(site)),
                    synth::key_value("setTouched", self.set_touched()),
                ]);
                out.push(synth::const_ident(b.id.sym.as_ref(), helpers));
                self.setters.push(b.id.sym.to_string());
            }
            _ => {}
        }

        // setters called without having been destructured
        let called = |name: &str| self.usage.calls(name) && !taken.contains(name);
        if set_value.is_none() && called("setValue") {
            set_value = Some("setValue".to_string());
        }
        if set_touched.is_none() && called("setTouched") {
            set_touched = Some("setTouched".to_string());
        }

        if let Some(local) = set_value {
            out.push(synth::const_ident(&local, self.set_value(site)));
            self.setters.push(local);
        }
        if let Some(local) = set_touched {
            out.push(synth::const_ident(&local, self.set_touched()));
            self.setters.push(local);
        }
    }
}

/// `{ value, error: e }` → `[("value", "value"), ("error", "e")]`
fn object_bindings(obj: &ObjectPat) -> Vec<(String, String)> {
    obj.props
        .iter()
        .filter_map(|p| match p {
            ObjectPatProp::Assign(a) => Some((a.key.id.sym.to_string(), a.key.id.sym.to_string())),
            ObjectPatProp::KeyValue(kv) => {
                let key = match &kv.key {
                    PropName::Ident(id) => id.sym.to_string(),
                    PropName::Str(s) => s.value.to_string(),
                    _ => return None,
                };
                match &*kv.value {
                    Pat::Ident(local) => Some((key, local.id.sym.to_string())),
                    _ => None,
                }
            }
            ObjectPatProp::Rest(_) => None,
        })
        .collect()
}

fn convert_scope(body: &mut ScopeBody<'_>, ctx: &Ctx<'_>) {
    let usage = body.usage(None);
    let Some(stmts) = body.block_stmts() else {
        return;
    };
    let mut taken: HashSet<String> = query::declared_names(stmts);
    let mut setters = Vec::new();
    let mut from = 0;
    let mut ordinal = 0;

    loop {
        let suffix = if ordinal == 0 { String::new() } else { ordinal.to_string() };
        let field = query::fresh_name(&format!("field{suffix}"), &taken);
        let form = query::fresh_name(&format!("form{suffix}"), &taken);
        let Some((idx, site)) = take_site(stmts, from, &ctx.names.use_field, &field, &form) else {
            break;
        };
        let field = match site.slots.first() {
            Some(Some(Pat::Ident(b))) => b.id.sym.to_string(),
            _ => field,
        };
        taken.insert(field.clone());
        taken.insert(form.clone());

        let mut synthesis = Synthesis {
            ctx,
            usage: &usage,
            names: SiteNames { field, form },
            setters: Vec::new(),
        };
        let mut out = Vec::new();
        synthesis.value_slot(site.slots.first().and_then(Option::as_ref), &mut out);
        synthesis.meta_slot(site.slots.get(1).and_then(Option::as_ref), &mut out);
        synthesis.helpers_slot(site.slots.get(2).and_then(Option::as_ref), &site, &taken, &mut out);
        taken.extend(synthesis.setters.iter().cloned());
        setters.append(&mut synthesis.setters);

        debug!(
            field = %synthesis.names.field,
            bindings = out.len(),
            "rewrote field hook"
        );
        let inserted = out.len();
        stmts.splice(idx + 1..idx + 1, out);
        from = idx + 1 + inserted;
        ordinal += 1;
    }

    if !setters.is_empty() {
        body.visit_mut_with(&mut ScrubAwait { setters });
    }
}

/// `await setValue(x)` → `setValue(x)`; the synthesized setters are
/// synchronous.
struct ScrubAwait {
    setters: Vec<String>,
}

impl ScrubAwait {
    fn is_setter_call(&self, expr: &Expr) -> bool {
        let Expr::Call(call) = query::unparen(expr) else {
            return false;
        };
        let Callee::Expr(callee) = &call.callee else {
            return false;
        };
        match query::unparen(callee) {
            Expr::Ident(id) => self.setters.iter().any(|s| s == id.sym.as_ref()),
            // helpers.setValue(x)
            Expr::Member(m) => query::ident_name(&m.obj)
                .is_some_and(|obj| self.setters.iter().any(|s| s == obj)),
            _ => false,
        }
    }
}

impl VisitMut for ScrubAwait {
    scope::skip_nested_scopes!();

    fn visit_mut_expr(&mut self, n: &mut Expr) {
        n.visit_mut_children_with(self);
        if let Expr::Await(await_expr) = n {
            if self.is_setter_call(&await_expr.arg) {
                let arg = std::mem::replace(
                    &mut await_expr.arg,
                    Box::new(Expr::Invalid(Invalid { span: DUMMY_SP })),
                );
                *n = *arg;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{features::SourceNames, options::ConvertOptions, print::Session};

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
        session
            .print(&module)
            .unwrap()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect()
    }

    #[test]
    fn value_and_set_value_are_rebuilt() {
        let out = run(
            r#"function ColorPicker() {
                 const [{ value }, , { setValue }] = useField<string>("color");
                 return <button onClick={() => setValue("red")}>{value}</button>;
               }"#,
        );
        assert!(out.contains(r#"const[field,form]=useField<string>("color");"#), "{out}");
        assert!(out.contains("constvalue=field.value;"), "{out}");
        assert!(
            out.contains(
                r#"constsetValue=(value:string,shouldValidate?:boolean)=>form.update({name:"color",value,validated:!!shouldValidate});"#
            ),
            "{out}"
        );
        assert!(!out.contains("setTouched"), "{out}");
    }

    #[test]
    fn plain_js_gets_untyped_params() {
        let out = run(
            r#"function A() {
                 const [{ value }, , { setValue }] = useField(name);
                 return value;
               }"#,
        );
        assert!(
            out.contains("constsetValue=(value,shouldValidate)=>form.update({name:name,value,validated:!!shouldValidate});"),
            "{out}"
        );
    }

    #[test]
    fn set_touched_only_when_requested() {
        let out = run(
            r#"function A() {
                 const [, , { setTouched }] = useField("a");
                 return null;
               }"#,
        );
        assert!(out.contains("constsetTouched=(_,__)=>{};"), "{out}");
    }

    #[test]
    fn setters_called_without_destructuring_are_synthesized() {
        let out = run(
            r#"function A() {
                 const [{ value }] = useField("a");
                 return <input value={value} onBlur={() => setTouched(true)} onInput={() => setValue("x")} />;
               }
               function B() {
                 return <p onClick={() => setTouched(true)} />;
               }"#,
        );
        assert!(out.contains(r#"const[field,form]=useField("a");constvalue=field.value;"#), "{out}");
        assert!(out.contains("constsetTouched=(_,__)=>{};"), "{out}");
        assert!(
            out.contains(r#"constsetValue=(value,shouldValidate)=>form.update({name:"a",value,validated:!!shouldValidate});"#),
            "{out}"
        );
        assert_eq!(out.matches("constsetTouched").count(), 1, "{out}");
        assert!(out.contains("functionB(){return<ponClick={()=>setTouched(true)}/>;}"), "{out}");
    }

    #[test]
    fn second_hook_gets_suffixed_names() {
        let out = run(
            r#"function Range() {
                 const [{ value: min }] = useField("min");
                 const [{ value: max }] = useField("max");
                 return min + max;
               }"#,
        );
        assert!(out.contains(r#"const[field,form]=useField("min");constmin=field.value;"#), "{out}");
        assert!(out.contains(r#"const[field1,form1]=useField("max");constmax=field1.value;"#), "{out}");
    }

    #[test]
    fn meta_identifier_is_rebuilt_when_used() {
        let out = run(
            r#"function A() {
                 const [{ value }, meta] = useField({ name: "email" });
                 return meta.error;
               }"#,
        );
        assert!(out.contains(r#"const[field,form]=useField({name:"email"});"#), "{out}");
        assert!(
            out.contains("constmeta={value:field.value,error:field.errors?.[0],initialValue:field.initialValue};"),
            "{out}"
        );
    }

    #[test]
    fn awaits_on_setters_are_scrubbed() {
        let out = run(
            r#"function A() {
                 const [, , { setValue }] = useField("a");
                 const onPick = async () => { await setValue(1); await save(); };
                 return onPick;
               }"#,
        );
        assert!(out.contains("{setValue(1);awaitsave();}"), "{out}");
    }
}
