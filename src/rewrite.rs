//! Identifier rename rewrites over the typed tree.
//!
//! When a node's stable name changes between versions, every helper
//! reference that embeds the old name must be rewritten consistently:
//! `rh.onRootClick` → `rh.onRoot2Click`, `rh.showRoot()` → `rh.showRoot2()`.
//! Typed nodes are rewritten structurally through the clone hook; opaque
//! `Raw` nodes get a textual pass, since developer handlers routinely live
//! inside expressions the parser left opaque.

use crate::ast::{clone_expr_with, visit_exprs, Expr, ExprKind};

/// Rewrite every member reference `<helper>.on<old><Rest>` to
/// `<helper>.on<new><Rest>` in a clone of `expr`.
pub fn rename_on_handlers(expr: &Expr, helper: &str, old_name: &str, new_name: &str) -> Expr {
    let old_prefix = format!("on{old_name}");
    let new_prefix = format!("on{new_name}");
    rename_member_prefix(expr, helper, &old_prefix, &new_prefix)
}

/// Rewrite `<helper>.show<old>(` call references to use `<new>` in a clone
/// of `expr`.
pub fn rename_show_call(expr: &Expr, helper: &str, old_name: &str, new_name: &str) -> Expr {
    let old_prop = format!("show{old_name}");
    let new_prop = format!("show{new_name}");
    let old_text = format!("{helper}.{old_prop}(");
    let new_text = format!("{helper}.{new_prop}(");
    clone_expr_with(expr, &mut |e| match &e.kind {
        ExprKind::Member { object, property }
            if property == &old_prop && is_ident(object, helper) =>
        {
            Some(Expr {
                span: e.span,
                kind: ExprKind::Member {
                    object: object.clone(),
                    property: new_prop.clone(),
                },
            })
        }
        ExprKind::Raw(text) if text.contains(&old_text) => Some(Expr {
            span: e.span,
            kind: ExprKind::Raw(replace_guarded(text, &old_text, &new_text)),
        }),
        _ => None,
    })
}

/// Replace the visibility gate call `<helper>.show<name>()` with the
/// literal `true`, keeping the surrounding `&&` expression intact.
pub fn drop_show_call(expr: &Expr, helper: &str, name: &str) -> Expr {
    let prop = format!("show{name}");
    let old_text = format!("{helper}.{prop}()");
    clone_expr_with(expr, &mut |e| {
        if let Some((p, args)) = e.as_helper_call(helper) {
            if p == prop && args.is_empty() {
                return Some(Expr {
                    span: e.span,
                    kind: ExprKind::Bool(true),
                });
            }
        }
        match &e.kind {
            ExprKind::Raw(text) if text.contains(&old_text) => Some(Expr {
                span: e.span,
                kind: ExprKind::Raw(replace_guarded(text, &old_text, "true")),
            }),
            _ => None,
        }
    })
}

/// Whether `expr` contains a call to `<helper>.show<name>()`, either typed
/// or textually inside an opaque node.
pub fn contains_show_call(expr: &Expr, helper: &str, name: &str) -> bool {
    let prop = format!("show{name}");
    let text_form = format!("{helper}.{prop}(");
    let mut found = false;
    visit_exprs(expr, &mut |e| {
        if found {
            return false;
        }
        if let Some((p, _)) = e.as_helper_call(helper) {
            if p == prop {
                found = true;
                return false;
            }
        }
        if let ExprKind::Raw(text) = &e.kind {
            if find_guarded(text, &text_form) {
                found = true;
                return false;
            }
        }
        true
    });
    found
}

/// Rewrite `<helper>.<old_prefix>…` member properties to `<new_prefix>…`,
/// structurally and inside opaque text.
fn rename_member_prefix(expr: &Expr, helper: &str, old_prefix: &str, new_prefix: &str) -> Expr {
    let old_text = format!("{helper}.{old_prefix}");
    let new_text = format!("{helper}.{new_prefix}");
    clone_expr_with(expr, &mut |e| match &e.kind {
        ExprKind::Member { object, property }
            if property.starts_with(old_prefix) && is_ident(object, helper) =>
        {
            let rest = &property[old_prefix.len()..];
            Some(Expr {
                span: e.span,
                kind: ExprKind::Member {
                    object: object.clone(),
                    property: format!("{new_prefix}{rest}"),
                },
            })
        }
        ExprKind::Raw(text) if text.contains(&old_text) => Some(Expr {
            span: e.span,
            kind: ExprKind::Raw(replace_guarded(text, &old_text, &new_text)),
        }),
        _ => None,
    })
}

fn is_ident(expr: &Expr, name: &str) -> bool {
    matches!(&expr.unparen().kind, ExprKind::Ident(id) if id == name)
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Replace occurrences of `from` that are not preceded by an identifier
/// character, so `myrh.onX` is left alone when renaming `rh.onX`.
fn replace_guarded(text: &str, from: &str, to: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find(from) {
        let boundary = rest[..pos].chars().last().map_or(true, |c| !is_ident_char(c));
        out.push_str(&rest[..pos]);
        if boundary {
            out.push_str(to);
        } else {
            out.push_str(from);
        }
        rest = &rest[pos + from.len()..];
    }
    out.push_str(rest);
    out
}

fn find_guarded(text: &str, needle: &str) -> bool {
    let mut rest = text;
    let mut offset = 0;
    while let Some(pos) = rest.find(needle) {
        let boundary = text[..offset + pos]
            .chars()
            .last()
            .map_or(true, |c| !is_ident_char(c));
        if boundary {
            return true;
        }
        rest = &rest[pos + needle.len()..];
        offset += pos + needle.len();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::printer::print_expr;

    #[test]
    fn test_rename_on_handler_member() {
        let handler = Expr::synth(ExprKind::Member {
            object: Box::new(Expr::ident("rh")),
            property: "onBtnClick".into(),
        });
        let renamed = rename_on_handlers(&handler, "rh", "Btn", "Btn2");
        assert_eq!(print_expr(&renamed), "rh.onBtn2Click");
    }

    #[test]
    fn test_rename_on_handler_inside_raw() {
        let raw = Expr::synth(ExprKind::Raw("(e) => rh.onBtnClick(e, myrh.onBtnClick)".into()));
        let renamed = rename_on_handlers(&raw, "rh", "Btn", "Next");
        assert_eq!(
            print_expr(&renamed),
            "(e) => rh.onNextClick(e, myrh.onBtnClick)"
        );
    }

    #[test]
    fn test_rename_show_is_call_exact() {
        let gate = Expr::and(
            Expr::helper_call("rh", "showRow", vec![]),
            Expr::ident("x"),
        );
        let renamed = rename_show_call(&gate, "rh", "Row", "Row2");
        assert_eq!(print_expr(&renamed), "rh.showRow2() && x");
        // A longer name must not be clipped by the shorter rename.
        let other = Expr::helper_call("rh", "showRowExtra", vec![]);
        let untouched = rename_show_call(&other, "rh", "Row", "Row2");
        assert_eq!(print_expr(&untouched), "rh.showRowExtra()");
    }

    #[test]
    fn test_drop_show_call_keeps_and() {
        let gate = Expr::and(
            Expr::helper_call("rh", "showRow", vec![]),
            Expr::ident("markup"),
        );
        let dropped = drop_show_call(&gate, "rh", "Row");
        assert_eq!(print_expr(&dropped), "true && markup");
    }

    #[test]
    fn test_contains_show_call_typed_and_raw() {
        let typed = Expr::and(
            Expr::helper_call("rh", "showRow", vec![]),
            Expr::ident("x"),
        );
        assert!(contains_show_call(&typed, "rh", "Row"));
        assert!(!contains_show_call(&typed, "rh", "Other"));

        let raw = Expr::synth(ExprKind::Raw("cond ? rh.showRow() && x : null".into()));
        assert!(contains_show_call(&raw, "rh", "Row"));
    }
}
