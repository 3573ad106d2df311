//! Source emission for the typed tree.
//!
//! Reconstructs source text from [`Expr`] nodes and managed import
//! declarations. Emission is deterministic: attribute lists are
//! single-space separated, expression attribute values and non-element
//! children are brace-wrapped, opaque `Raw` nodes and JSX text print
//! verbatim. Whole-file layout is the job of the injected formatter, not
//! this module.

use crate::ast::{AttrValue, Expr, ExprKind, ImportDecl, ImportSpecifier, JsxAttr, JsxChild, JsxElement};

pub fn print_expr(expr: &Expr) -> String {
    let mut out = String::new();
    write_expr(&mut out, expr);
    out
}

fn write_expr(out: &mut String, expr: &Expr) {
    match &expr.kind {
        ExprKind::Jsx(el) => write_element(out, el),
        ExprKind::Call { callee, args } => {
            write_expr(out, callee);
            out.push('(');
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_expr(out, arg);
            }
            out.push(')');
        }
        ExprKind::Member { object, property } => {
            write_expr(out, object);
            out.push('.');
            out.push_str(property);
        }
        ExprKind::Ident(name) => out.push_str(name),
        ExprKind::Str(s) => out.push_str(&s.raw),
        ExprKind::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        ExprKind::Null => out.push_str("null"),
        ExprKind::And { left, right } => {
            write_expr(out, left);
            out.push_str(" && ");
            write_expr(out, right);
        }
        ExprKind::Paren(inner) => {
            out.push('(');
            write_expr(out, inner);
            out.push(')');
        }
        ExprKind::Raw(text) => out.push_str(text),
    }
}

fn write_element(out: &mut String, el: &JsxElement) {
    out.push('<');
    out.push_str(&el.name);
    for attr in &el.attrs {
        out.push(' ');
        match attr {
            JsxAttr::Named { name, value } => {
                out.push_str(name);
                match value {
                    None => {}
                    Some(AttrValue::Str(s)) => {
                        out.push('=');
                        out.push_str(&s.raw);
                    }
                    Some(AttrValue::Expr(e)) => {
                        out.push_str("={");
                        write_expr(out, e);
                        out.push('}');
                    }
                }
            }
            JsxAttr::Spread(e) => {
                out.push_str("{...");
                write_expr(out, e);
                out.push('}');
            }
        }
    }
    if el.self_closing && el.children.is_empty() {
        out.push_str(" />");
        return;
    }
    out.push('>');
    for child in &el.children {
        write_child(out, child);
    }
    out.push_str("</");
    out.push_str(&el.name);
    out.push('>');
}

fn write_child(out: &mut String, child: &JsxChild) {
    match child {
        JsxChild::Text { value, .. } => out.push_str(value),
        JsxChild::Expr(e) => {
            if matches!(e.kind, ExprKind::Jsx(_)) {
                write_expr(out, e);
            } else {
                out.push('{');
                write_expr(out, e);
                out.push('}');
            }
        }
    }
}

/// Print a managed import declaration, including its tag comment.
pub fn print_import(decl: &ImportDecl) -> String {
    let mut out = String::from("import ");
    let mut heads: Vec<String> = Vec::new();
    let mut named: Vec<String> = Vec::new();
    for spec in &decl.specifiers {
        match spec {
            ImportSpecifier::Default { local } => heads.push(local.clone()),
            ImportSpecifier::Namespace { local } => heads.push(format!("* as {local}")),
            ImportSpecifier::Named { imported, local } => {
                if imported == local {
                    named.push(imported.clone());
                } else {
                    named.push(format!("{imported} as {local}"));
                }
            }
        }
    }
    let mut parts: Vec<String> = heads;
    if !named.is_empty() {
        parts.push(format!("{{ {} }}", named.join(", ")));
    }
    if parts.is_empty() {
        // Bare side-effect import.
        out.push_str(&decl.source.raw);
    } else {
        out.push_str(&parts.join(", "));
        out.push_str(" from ");
        out.push_str(&decl.source.raw);
    }
    out.push(';');
    if let Some(tag) = &decl.managed {
        out.push_str(" // plasmic-import: ");
        out.push_str(&tag.id);
        if let Some(kind) = &tag.kind {
            out.push('/');
            out.push_str(kind.as_str());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ImportTagKind, ManagedImportTag, Span, StrLit};

    #[test]
    fn test_print_helper_call() {
        let call = Expr::helper_call("rh", "clsRoot", vec![]);
        assert_eq!(print_expr(&call), "rh.clsRoot()");
    }

    #[test]
    fn test_print_gated_element() {
        let el = Expr::synth(ExprKind::Jsx(JsxElement {
            span: Span::SYNTH,
            name: "div".into(),
            attrs: vec![JsxAttr::Named {
                name: "className".into(),
                value: Some(AttrValue::Expr(Expr::helper_call("rh", "clsRoot", vec![]))),
            }],
            children: vec![JsxChild::Text {
                span: Span::SYNTH,
                value: "hello".into(),
            }],
            self_closing: false,
        }));
        let gated = Expr::and(Expr::helper_call("rh", "showRoot", vec![]), el);
        assert_eq!(
            print_expr(&gated),
            "rh.showRoot() && <div className={rh.clsRoot()}>hello</div>"
        );
    }

    #[test]
    fn test_print_spread_and_self_closing() {
        let el = Expr::synth(ExprKind::Jsx(JsxElement {
            span: Span::SYNTH,
            name: "Button".into(),
            attrs: vec![JsxAttr::Spread(Expr::helper_call("rh", "propsBtn", vec![]))],
            children: vec![],
            self_closing: true,
        }));
        assert_eq!(print_expr(&el), "<Button {...rh.propsBtn()} />");
    }

    #[test]
    fn test_print_import_with_alias_and_tag() {
        let decl = ImportDecl {
            span: Span::SYNTH,
            specifiers: vec![
                ImportSpecifier::Default {
                    local: "React".into(),
                },
                ImportSpecifier::Named {
                    imported: "useState".into(),
                    local: "useState".into(),
                },
                ImportSpecifier::Named {
                    imported: "Foo".into(),
                    local: "Bar".into(),
                },
            ],
            source: StrLit::new("\"react\""),
            managed: Some(ManagedImportTag {
                id: "abc-123".into(),
                kind: Some(ImportTagKind::Component),
            }),
        };
        assert_eq!(
            print_import(&decl),
            "import React, { useState, Foo as Bar } from \"react\"; // plasmic-import: abc-123/component"
        );
    }

    #[test]
    fn test_print_bare_import() {
        let decl = ImportDecl {
            span: Span::SYNTH,
            specifiers: vec![],
            source: StrLit::new("\"./styles.css\""),
            managed: None,
        };
        assert_eq!(print_import(&decl), "import \"./styles.css\";");
    }
}
