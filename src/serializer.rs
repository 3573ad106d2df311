//! Per-node merge orchestration.
//!
//! The serializer walks the new version's classified tree and decides, for
//! each node, whether to emit the new version verbatim (no developer
//! fork), nothing (the developer deleted the node), or a merged hybrid:
//! the edited element cloned with its attributes and children replaced by
//! the reconciled lists, spliced back into the edited wrapper, with the
//! visibility gate brought in line last.

use crate::ast::{clone_expr_with, Expr, ExprKind, JsxChild, JsxElement, Span};
use crate::attrs::merge_attrs;
use crate::children::merge_children;
use crate::error::MergeResult;
use crate::node::{PlasmicArg, PlasmicNode, PlasmicTagOrComponent};
use crate::version::CodeVersion;
use crate::visibility::reconcile_visibility;

/// Holds the three versions for one component merge.
pub struct Serializer<'a> {
    pub new: &'a CodeVersion,
    pub edited: &'a CodeVersion,
    pub base: &'a CodeVersion,
}

impl<'a> Serializer<'a> {
    pub fn new(new: &'a CodeVersion, edited: &'a CodeVersion, base: &'a CodeVersion) -> Self {
        Serializer { new, edited, base }
    }

    /// Serialize the new version's root. A root the developer deleted
    /// becomes the `null` literal so the expression site stays valid.
    pub fn serialize_root(&self) -> MergeResult<Expr> {
        Ok(self.serialize_node(&self.new.root)?.unwrap_or_else(Expr::null))
    }

    /// Serialize one classified node of the new tree. `None` means the
    /// node was deleted by the developer and emits nothing.
    pub fn serialize_node(&self, node: &PlasmicNode) -> MergeResult<Option<Expr>> {
        match node {
            PlasmicNode::Opaque { raw }
            | PlasmicNode::CondStrCall { raw }
            | PlasmicNode::StringLit { raw } => Ok(Some(raw.clone())),
            PlasmicNode::Text { value, .. } => {
                Ok(Some(Expr::synth(ExprKind::Raw(value.clone()))))
            }
            PlasmicNode::Arg(arg) => self.serialize_arg(arg).map(Some),
            PlasmicNode::TagOrComponent(t) => self.serialize_tag(t),
        }
    }

    /// Clone the argument expression, substituting each inner managed
    /// element with its merged serialization; deleted elements become
    /// `null` so the slot stays occupied.
    fn serialize_arg(&self, arg: &PlasmicArg) -> MergeResult<Expr> {
        let mut replacements: Vec<(Span, Expr)> = Vec::with_capacity(arg.nodes.len());
        for t in &arg.nodes {
            let merged = self.serialize_tag(t)?.unwrap_or_else(Expr::null);
            replacements.push((t.raw.span, merged));
        }
        Ok(clone_expr_with(&arg.raw, &mut |e| {
            if e.span.is_synthetic() {
                return None;
            }
            replacements
                .iter()
                .find(|(span, _)| *span == e.span)
                .map(|(_, r)| r.clone())
        }))
    }

    fn serialize_tag(&self, new_t: &PlasmicTagOrComponent) -> MergeResult<Option<Expr>> {
        let name = new_t.jsx.name_in_id.as_str();
        let edited_t = self.edited.find_matching(self.new, name);
        let base_t = self.base.find_matching(self.new, name);

        let edited_t = match (edited_t, base_t) {
            // Present in base, gone from the working copy: the developer
            // deleted it.
            (None, Some(_)) => return Ok(None),
            // Brand new node from the tool.
            (None, None) => return Ok(Some(new_t.raw.clone())),
            (Some(e), _) => e,
        };

        let merged_attrs = merge_attrs(self, new_t, edited_t, base_t)?;
        let merged_children = self.emit_children(new_t, edited_t, base_t)?;

        let edited_el = &edited_t.jsx.element;
        let self_closing = edited_el.self_closing && merged_children.is_empty();
        let element = JsxElement {
            span: edited_el.span,
            name: edited_el.name.clone(),
            attrs: merged_attrs,
            children: merged_children,
            self_closing,
        };

        // Splice the rebuilt element into a clone of the edited wrapper,
        // locating the original element by span.
        let element_span = edited_el.span;
        let element_expr = Expr {
            span: element_span,
            kind: ExprKind::Jsx(element),
        };
        let mut spliced_in = false;
        let spliced = clone_expr_with(&edited_t.raw, &mut |e| {
            if !spliced_in && e.span == element_span && matches!(e.kind, ExprKind::Jsx(_)) {
                spliced_in = true;
                Some(element_expr.clone())
            } else {
                None
            }
        });

        Ok(Some(reconcile_visibility(
            spliced,
            element_span,
            &self.edited.helper,
            &edited_t.jsx.name_in_id,
            name,
            new_t.jsx.has_show,
        )))
    }

    fn emit_children(
        &self,
        new_t: &PlasmicTagOrComponent,
        edited_t: &PlasmicTagOrComponent,
        base_t: Option<&PlasmicTagOrComponent>,
    ) -> MergeResult<Vec<JsxChild>> {
        let equiv_new_edited = self.new.equiv(self.edited);
        let equiv_base_edited = self.base.equiv(self.edited);
        let merged = merge_children(
            &new_t.jsx.children,
            &edited_t.jsx.children,
            base_t.map(|t| t.jsx.children.as_slice()),
            &equiv_new_edited,
            &equiv_base_edited,
        );

        let mut out = Vec::with_capacity(merged.len());
        for mc in merged {
            if mc.from_edited {
                out.push(edited_child(&mc.node));
                continue;
            }
            match &mc.node {
                PlasmicNode::Text { span, value } => out.push(JsxChild::Text {
                    span: *span,
                    value: value.clone(),
                }),
                PlasmicNode::Opaque { raw }
                | PlasmicNode::StringLit { raw }
                | PlasmicNode::CondStrCall { raw } => out.push(JsxChild::Expr(raw.clone())),
                PlasmicNode::TagOrComponent(_) | PlasmicNode::Arg(_) => {
                    if let Some(expr) = self.serialize_node(&mc.node)? {
                        out.push(JsxChild::Expr(expr));
                    }
                }
            }
        }
        Ok(out)
    }
}

/// A child carried over from the edited list is emitted as written.
fn edited_child(node: &PlasmicNode) -> JsxChild {
    match node {
        PlasmicNode::Text { span, value } => JsxChild::Text {
            span: *span,
            value: value.clone(),
        },
        PlasmicNode::Opaque { raw }
        | PlasmicNode::StringLit { raw }
        | PlasmicNode::CondStrCall { raw } => JsxChild::Expr(raw.clone()),
        PlasmicNode::TagOrComponent(t) => JsxChild::Expr(t.raw.clone()),
        PlasmicNode::Arg(a) => JsxChild::Expr(a.raw.clone()),
    }
}
