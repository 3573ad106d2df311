//! Visibility gate reconciliation.
//!
//! A managed node may be wrapped as `rh.showX() && <markup>`. After the
//! merged element has been spliced into the clone of the edited wrapper,
//! this module brings the gate in line with the new version: rename the
//! call on rename, replace it with `true` when the tool removed the gate
//! (the developer's surrounding logic stays intact), or wrap the element
//! when the tool added one. The element is located inside the clone by its
//! source span, never by object identity.

use crate::ast::{clone_expr_with, Expr, ExprKind, Span};
use crate::rewrite::{contains_show_call, drop_show_call, rename_show_call};

pub fn reconcile_visibility(
    spliced: Expr,
    element_span: Span,
    helper: &str,
    edited_name: &str,
    new_name: &str,
    new_has_show: bool,
) -> Expr {
    let edited_has_show = contains_show_call(&spliced, helper, edited_name);
    match (edited_has_show, new_has_show) {
        (true, true) => {
            if edited_name == new_name {
                spliced
            } else {
                rename_show_call(&spliced, helper, edited_name, new_name)
            }
        }
        (true, false) => drop_show_call(&spliced, helper, edited_name),
        (false, true) => wrap_with_show(spliced, element_span, helper, new_name),
        (false, false) => spliced,
    }
}

fn wrap_with_show(spliced: Expr, element_span: Span, helper: &str, new_name: &str) -> Expr {
    let show = Expr::helper_call(helper, format!("show{new_name}"), vec![]);
    let mut wrapped = false;
    let result = clone_expr_with(&spliced, &mut |e| {
        if !wrapped && e.span == element_span && matches!(e.kind, ExprKind::Jsx(_)) {
            wrapped = true;
            Some(Expr::and(show.clone(), e.clone()))
        } else {
            None
        }
    });
    if wrapped {
        result
    } else {
        // The element span was not found (fully synthesized subtree): gate
        // the whole wrapper instead.
        Expr::and(show, spliced)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{JsxElement, Span};
    use crate::printer::print_expr;

    fn element(span: Span) -> Expr {
        Expr {
            span,
            kind: ExprKind::Jsx(JsxElement {
                span,
                name: "div".into(),
                attrs: vec![],
                children: vec![],
                self_closing: true,
            }),
        }
    }

    #[test]
    fn test_gate_renamed() {
        let span = Span::new(5, 20);
        let spliced = Expr::and(Expr::helper_call("rh", "showRow", vec![]), element(span));
        let out = reconcile_visibility(spliced, span, "rh", "Row", "Row2", true);
        assert_eq!(print_expr(&out), "rh.showRow2() && <div />");
    }

    #[test]
    fn test_gate_removed_becomes_true() {
        let span = Span::new(5, 20);
        let spliced = Expr::and(Expr::helper_call("rh", "showRow", vec![]), element(span));
        let out = reconcile_visibility(spliced, span, "rh", "Row", "Row", false);
        assert_eq!(print_expr(&out), "true && <div />");
    }

    #[test]
    fn test_gate_added_wraps_bare_element() {
        let span = Span::new(5, 20);
        let out = reconcile_visibility(element(span), span, "rh", "Row", "Row", true);
        assert_eq!(print_expr(&out), "rh.showRow() && <div />");
    }

    #[test]
    fn test_gate_added_wraps_nested_element() {
        let span = Span::new(5, 20);
        let nested = Expr::synth(ExprKind::Paren(Box::new(element(span))));
        let out = reconcile_visibility(nested, span, "rh", "Row", "Row2", true);
        assert_eq!(print_expr(&out), "(rh.showRow2() && <div />)");
    }

    #[test]
    fn test_no_gate_no_op() {
        let span = Span::new(5, 20);
        let out = reconcile_visibility(element(span), span, "rh", "Row", "Row", false);
        assert_eq!(print_expr(&out), "<div />");
    }
}
