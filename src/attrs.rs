//! Attribute reconciliation for a paired node.
//!
//! Two passes over the three aligned attribute lists. Pass one walks the
//! new version's named attributes and emits tool-side additions and
//! updates; pass two walks the edited attributes in order, rewriting the
//! managed class/props shape to the new version's and preserving developer
//! attributes. Truly contested values are emitted twice (new first, edited
//! in place) so the duplicate surfaces as a compile error downstream.

use crate::ast::{attr_value_sem_eq, AttrValue, Expr, ExprKind, JsxAttr, JsxElement};
use crate::error::MergeResult;
use crate::node::{ManagedShape, PlasmicAttr, PlasmicNode, PlasmicTagOrComponent};
use crate::rewrite::rename_on_handlers;
use crate::serializer::Serializer;

/// Outcome of the conflict table for one named attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrDecision {
    EmitEdited,
    EmitNew,
    EmitBoth,
}

/// The conflict-resolution table.
///
/// `base` is `None` when the attribute does not exist on the base node;
/// the inner option distinguishes a valueless attribute from a valued one.
pub fn decide_attr(
    name: &str,
    base: Option<Option<&AttrValue>>,
    edited: Option<&AttrValue>,
    new: Option<&AttrValue>,
) -> AttrDecision {
    if attr_value_sem_eq(edited, new) {
        return AttrDecision::EmitEdited;
    }
    let Some(base_value) = base else {
        return AttrDecision::EmitBoth;
    };
    if attr_value_sem_eq(base_value, edited) {
        return AttrDecision::EmitNew;
    }
    if name.starts_with("on") || attr_value_sem_eq(base_value, new) {
        return AttrDecision::EmitEdited;
    }
    AttrDecision::EmitBoth
}

fn named_attr<'a>(el: &'a JsxElement, name: &str) -> Option<Option<&'a AttrValue>> {
    el.attrs.iter().find_map(|a| match a {
        JsxAttr::Named { name: n, value } if n == name => Some(value.as_ref()),
        _ => None,
    })
}

/// Reconcile the attribute lists of a paired node across the three
/// versions, producing the merged node's ordered attribute list.
pub fn merge_attrs(
    sz: &Serializer<'_>,
    new_t: &PlasmicTagOrComponent,
    edited_t: &PlasmicTagOrComponent,
    base_t: Option<&PlasmicTagOrComponent>,
) -> MergeResult<Vec<JsxAttr>> {
    let helper = sz.edited.helper.as_str();
    let new_name = new_t.jsx.name_in_id.as_str();
    let edited_name = edited_t.jsx.name_in_id.as_str();
    let new_el = &new_t.jsx.element;
    let edited_el = &edited_t.jsx.element;
    let base_el = base_t.map(|t| &t.jsx.element);
    let renames = edited_name != new_name;

    let mut out: Vec<JsxAttr> = Vec::new();

    // Pass 1: named attributes of the new version.
    for (idx, attr) in new_el.attrs.iter().enumerate() {
        let JsxAttr::Named { name, value } = attr else {
            continue;
        };
        if name == "className" && new_t.jsx.shape == ManagedShape::ClassAttr {
            continue;
        }
        match named_attr(edited_el, name) {
            Some(edited_value) => {
                let base_value = base_el.and_then(|el| named_attr(el, name));
                let decision = decide_attr(name, base_value, edited_value, value.as_ref());
                if matches!(decision, AttrDecision::EmitNew | AttrDecision::EmitBoth) {
                    out.push(JsxAttr::Named {
                        name: name.clone(),
                        value: value.clone(),
                    });
                }
            }
            None if base_el.is_some_and(|el| named_attr(el, name).is_some()) => {
                // Developer deleted the attribute; preserve the deletion.
            }
            None => {
                // Newly added by the tool: serialize the classified value so
                // any markup inside it is merged recursively.
                let emitted = match new_t.jsx.attrs.get(idx) {
                    Some(PlasmicAttr::Named {
                        value: Some(node), ..
                    }) => Some(serialize_attr_value(sz, node)?),
                    Some(PlasmicAttr::Named { value: None, .. }) => None,
                    _ => value.clone(),
                };
                out.push(JsxAttr::Named {
                    name: name.clone(),
                    value: emitted,
                });
            }
        }
    }

    // Pass 2: edited attributes, in order.
    for (idx, pattr) in edited_t.jsx.attrs.iter().enumerate() {
        match pattr {
            // Managed spread `{...rh.propsX(...)}` (shape A).
            PlasmicAttr::Spread {
                raw,
                managed_name: Some(mname),
            } if mname == edited_name => {
                let dev_args: Vec<Expr> = raw
                    .as_helper_call(helper)
                    .map(|(_, args)| args.to_vec())
                    .unwrap_or_default();
                match new_t.jsx.shape {
                    ManagedShape::PropsSpread => {
                        out.push(JsxAttr::Spread(Expr::helper_call(
                            helper,
                            format!("props{new_name}"),
                            dev_args,
                        )));
                    }
                    ManagedShape::ClassAttr => {
                        out.push(managed_class_attr(helper, new_name));
                        if !dev_args.is_empty() {
                            // The developer passed arguments to the spread the
                            // tool no longer emits. Keep the stale spread so
                            // the type error forces human review.
                            out.push(JsxAttr::Spread(raw.clone()));
                        }
                    }
                }
            }
            // Developer spread: preserved verbatim.
            PlasmicAttr::Spread { raw, .. } => out.push(JsxAttr::Spread(raw.clone())),
            // Managed `className={rh.clsX()}` (shape B).
            PlasmicAttr::Named { name, value }
                if name == "className" && is_managed_cls(value.as_ref(), helper, edited_name) =>
            {
                match new_t.jsx.shape {
                    ManagedShape::PropsSpread => out.push(JsxAttr::Spread(Expr::helper_call(
                        helper,
                        format!("props{new_name}"),
                        vec![],
                    ))),
                    ManagedShape::ClassAttr => out.push(managed_class_attr(helper, new_name)),
                }
            }
            // Any other named attribute.
            PlasmicAttr::Named { name, .. } => {
                let raw_value = match &edited_el.attrs[idx] {
                    JsxAttr::Named { value, .. } => value.as_ref(),
                    JsxAttr::Spread(_) => None,
                };
                emit_attr_in_edited_node(
                    &mut out, name, raw_value, new_el, base_el, helper, edited_name, new_name,
                    renames,
                );
            }
        }
    }

    Ok(out)
}

#[allow(clippy::too_many_arguments)]
fn emit_attr_in_edited_node(
    out: &mut Vec<JsxAttr>,
    name: &str,
    edited_value: Option<&AttrValue>,
    new_el: &JsxElement,
    base_el: Option<&JsxElement>,
    helper: &str,
    edited_name: &str,
    new_name: &str,
    renames: bool,
) {
    let emit = match named_attr(new_el, name) {
        Some(new_value) => {
            let base_value = base_el.and_then(|el| named_attr(el, name));
            // EmitNew was already handled in pass 1.
            !matches!(
                decide_attr(name, base_value, edited_value, new_value),
                AttrDecision::EmitNew
            )
        }
        // Tool deleted it, or the developer added it.
        None => !base_el.is_some_and(|el| named_attr(el, name).is_some()),
    };
    if !emit {
        return;
    }
    let value = match edited_value {
        Some(AttrValue::Expr(e)) if renames && name.starts_with("on") => Some(AttrValue::Expr(
            rename_on_handlers(e, helper, edited_name, new_name),
        )),
        other => other.cloned(),
    };
    out.push(JsxAttr::Named {
        name: name.to_owned(),
        value,
    });
}

fn serialize_attr_value(sz: &Serializer<'_>, node: &PlasmicNode) -> MergeResult<AttrValue> {
    if let PlasmicNode::StringLit { raw } = node {
        if let ExprKind::Str(s) = &raw.kind {
            return Ok(AttrValue::Str(s.clone()));
        }
    }
    let expr = sz.serialize_node(node)?.unwrap_or_else(Expr::null);
    Ok(AttrValue::Expr(expr))
}

fn managed_class_attr(helper: &str, name_in_id: &str) -> JsxAttr {
    JsxAttr::Named {
        name: "className".into(),
        value: Some(AttrValue::Expr(Expr::helper_call(
            helper,
            format!("cls{name_in_id}"),
            vec![],
        ))),
    }
}

fn is_managed_cls(value: Option<&PlasmicNode>, helper: &str, name_in_id: &str) -> bool {
    match value {
        Some(PlasmicNode::CondStrCall { raw }) => raw
            .as_helper_call(helper)
            .is_some_and(|(prop, _)| prop == format!("cls{name_in_id}")),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::StrLit;

    fn val(s: &str) -> AttrValue {
        AttrValue::Str(StrLit::new(format!("\"{s}\"")))
    }

    #[test]
    fn test_table_identical_sides_emit_edited() {
        let a = val("x");
        assert_eq!(
            decide_attr("title", None, Some(&a), Some(&a)),
            AttrDecision::EmitEdited
        );
    }

    #[test]
    fn test_table_no_base_emits_both() {
        let e = val("b");
        let n = val("c");
        assert_eq!(
            decide_attr("title", None, Some(&e), Some(&n)),
            AttrDecision::EmitBoth
        );
    }

    #[test]
    fn test_table_untouched_by_developer_emits_new() {
        let b = val("a");
        let n = val("c");
        assert_eq!(
            decide_attr("title", Some(Some(&b)), Some(&b.clone()), Some(&n)),
            AttrDecision::EmitNew
        );
    }

    #[test]
    fn test_table_untouched_by_tool_emits_edited() {
        let b = val("a");
        let e = val("b");
        assert_eq!(
            decide_attr("title", Some(Some(&b)), Some(&e), Some(&b.clone())),
            AttrDecision::EmitEdited
        );
    }

    #[test]
    fn test_table_event_handler_prefers_edited() {
        let b = val("a");
        let e = val("b");
        let n = val("c");
        assert_eq!(
            decide_attr("onClick", Some(Some(&b)), Some(&e), Some(&n)),
            AttrDecision::EmitEdited
        );
    }

    #[test]
    fn test_table_both_changed_emits_both() {
        let b = val("a");
        let e = val("b");
        let n = val("c");
        assert_eq!(
            decide_attr("title", Some(Some(&b)), Some(&e), Some(&n)),
            AttrDecision::EmitBoth
        );
    }
}
