//! Classified node model.
//!
//! Everything the merge reasons about is one of six variants: a markup
//! element owned by the design tool (`tag-or-component`), a named-argument
//! slot carrying nested tool markup (`arg`), a tool-managed conditional
//! string call (`cond-str-call`), a string literal, raw text, or an opaque
//! developer expression. The closed sum forces every walker in the engine
//! to handle all of them.
//!
//! Classification runs once per version at ingest, over the typed tree the
//! parser produced, and asserts the managed-shape invariant: a managed
//! element carries a `className={rh.clsX()}` attribute or a
//! `{...rh.propsX()}` spread, never both.

use crate::ast::{visit_exprs, AttrValue, Expr, ExprKind, JsxAttr, JsxChild, JsxElement, Span};
use crate::error::{MergeError, MergeResult};

/// A node of the classified tree.
#[derive(Debug, Clone)]
pub enum PlasmicNode {
    TagOrComponent(Box<PlasmicTagOrComponent>),
    Arg(PlasmicArg),
    CondStrCall { raw: Expr },
    StringLit { raw: Expr },
    Text { span: Span, value: String },
    Opaque { raw: Expr },
}

/// A markup element owned by the design tool, together with the wrapper
/// expression it was found under (visibility gate, parentheses).
#[derive(Debug, Clone)]
pub struct PlasmicTagOrComponent {
    /// The full expression as written: `rh.showX() && (<div …/>)` keeps the
    /// gate and parentheses here.
    pub raw: Expr,
    pub jsx: PlasmicJsxElement,
}

/// The element view the merge operates on.
#[derive(Debug, Clone)]
pub struct PlasmicJsxElement {
    pub name_in_id: String,
    pub shape: ManagedShape,
    pub has_show: bool,
    /// The raw element, cloned out of `raw`. Its span is the element's
    /// identity for splicing and visibility wrapping.
    pub element: JsxElement,
    /// Classified attributes, parallel to `element.attrs`.
    pub attrs: Vec<PlasmicAttr>,
    /// Classified children, parallel to `element.children`.
    pub children: Vec<PlasmicNode>,
}

/// The two mutually exclusive managed attribute shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagedShape {
    /// Shape B: `className={rh.clsX()}`.
    ClassAttr,
    /// Shape A: `{...rh.propsX(...)}`.
    PropsSpread,
}

/// A named-argument slot whose expression contains tool markup.
#[derive(Debug, Clone)]
pub struct PlasmicArg {
    pub arg_name: String,
    pub raw: Expr,
    /// The top-most managed elements inside `raw`, in source order.
    pub nodes: Vec<PlasmicTagOrComponent>,
}

/// One classified attribute entry.
#[derive(Debug, Clone)]
pub enum PlasmicAttr {
    /// A spread attribute. `managed_name` is the `nameInId` when this is the
    /// tool's props spread; `None` for developer spreads.
    Spread {
        raw: Expr,
        managed_name: Option<String>,
    },
    Named {
        name: String,
        value: Option<PlasmicNode>,
    },
}

impl PlasmicNode {
    /// Discriminant used for same-variant matching.
    pub fn variant(&self) -> NodeVariant {
        match self {
            PlasmicNode::TagOrComponent(_) => NodeVariant::TagOrComponent,
            PlasmicNode::Arg(_) => NodeVariant::Arg,
            PlasmicNode::CondStrCall { .. } => NodeVariant::CondStrCall,
            PlasmicNode::StringLit { .. } => NodeVariant::StringLit,
            PlasmicNode::Text { .. } => NodeVariant::Text,
            PlasmicNode::Opaque { .. } => NodeVariant::Opaque,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeVariant {
    TagOrComponent,
    Arg,
    CondStrCall,
    StringLit,
    Text,
    Opaque,
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Classify an expression from the managed markup of a version.
pub fn classify_expr(expr: &Expr, helper: &str) -> MergeResult<PlasmicNode> {
    if let Some((prop, _)) = expr.as_helper_call(helper) {
        if prop.starts_with("cls") {
            return Ok(PlasmicNode::CondStrCall { raw: expr.clone() });
        }
    }
    if let Some(el) = expr.find_markup() {
        if let Some((name_in_id, shape)) = detect_managed(el, helper)? {
            let jsx = classify_element(el, helper, name_in_id, shape, expr)?;
            return Ok(PlasmicNode::TagOrComponent(Box::new(PlasmicTagOrComponent {
                raw: expr.clone(),
                jsx,
            })));
        }
    }
    match &expr.kind {
        ExprKind::Str(_) => Ok(PlasmicNode::StringLit { raw: expr.clone() }),
        _ => Ok(PlasmicNode::Opaque { raw: expr.clone() }),
    }
}

/// Classify a JSX child slot.
pub fn classify_child(child: &JsxChild, helper: &str) -> MergeResult<PlasmicNode> {
    match child {
        JsxChild::Text { span, value } => Ok(PlasmicNode::Text {
            span: *span,
            value: value.clone(),
        }),
        JsxChild::Expr(e) => classify_expr(e, helper),
    }
}

fn classify_element(
    el: &JsxElement,
    helper: &str,
    name_in_id: String,
    shape: ManagedShape,
    wrapper: &Expr,
) -> MergeResult<PlasmicJsxElement> {
    let has_show = crate::rewrite::contains_show_call(wrapper, helper, &name_in_id);
    let mut attrs = Vec::with_capacity(el.attrs.len());
    for attr in &el.attrs {
        attrs.push(match attr {
            JsxAttr::Spread(e) => PlasmicAttr::Spread {
                raw: e.clone(),
                managed_name: e
                    .as_helper_call(helper)
                    .and_then(|(prop, _)| prop.strip_prefix("props"))
                    .map(str::to_owned),
            },
            JsxAttr::Named { name, value } => PlasmicAttr::Named {
                name: name.clone(),
                value: match value {
                    None => None,
                    Some(AttrValue::Str(s)) => Some(PlasmicNode::StringLit {
                        raw: Expr::synth(ExprKind::Str(s.clone())),
                    }),
                    Some(AttrValue::Expr(e)) => Some(classify_attr_value(e, name, helper)?),
                },
            },
        });
    }
    let mut children = Vec::with_capacity(el.children.len());
    for child in &el.children {
        children.push(classify_child(child, helper)?);
    }
    Ok(PlasmicJsxElement {
        name_in_id,
        shape,
        has_show,
        element: el.clone(),
        attrs,
        children,
    })
}

fn classify_attr_value(e: &Expr, attr_name: &str, helper: &str) -> MergeResult<PlasmicNode> {
    if let Some((prop, _)) = e.as_helper_call(helper) {
        if prop.starts_with("cls") {
            return Ok(PlasmicNode::CondStrCall { raw: e.clone() });
        }
    }
    let nodes = collect_managed(e, helper)?;
    if !nodes.is_empty() {
        return Ok(PlasmicNode::Arg(PlasmicArg {
            arg_name: attr_name.to_owned(),
            raw: e.clone(),
            nodes,
        }));
    }
    match &e.kind {
        ExprKind::Str(_) => Ok(PlasmicNode::StringLit { raw: e.clone() }),
        _ => Ok(PlasmicNode::Opaque { raw: e.clone() }),
    }
}

/// Collect the top-most managed elements inside an argument expression.
/// Descent stops at each managed element; its own markup is classified
/// recursively as part of the returned node.
fn collect_managed(e: &Expr, helper: &str) -> MergeResult<Vec<PlasmicTagOrComponent>> {
    let mut found: Vec<Expr> = Vec::new();
    let mut failure: Option<MergeError> = None;
    visit_exprs(e, &mut |sub| {
        if failure.is_some() {
            return false;
        }
        if let Some(el) = sub.find_markup() {
            match detect_managed(el, helper) {
                Ok(Some(_)) => {
                    found.push(sub.clone());
                    return false;
                }
                Ok(None) => {}
                Err(err) => {
                    failure = Some(err);
                    return false;
                }
            }
        }
        true
    });
    if let Some(err) = failure {
        return Err(err);
    }
    let mut nodes = Vec::with_capacity(found.len());
    for wrapper in found {
        match classify_expr(&wrapper, helper)? {
            PlasmicNode::TagOrComponent(t) => nodes.push(*t),
            _ => unreachable!("collect_managed only yields managed wrappers"),
        }
    }
    Ok(nodes)
}

/// Detect whether an element is tool-managed, returning its `nameInId` and
/// shape. Errors when both managed shapes are present.
pub fn detect_managed(
    el: &JsxElement,
    helper: &str,
) -> MergeResult<Option<(String, ManagedShape)>> {
    let mut cls_name: Option<String> = None;
    let mut props_name: Option<String> = None;
    for attr in &el.attrs {
        match attr {
            JsxAttr::Named {
                name,
                value: Some(AttrValue::Expr(e)),
            } if name == "className" => {
                if let Some((prop, _)) = e.as_helper_call(helper) {
                    if let Some(suffix) = prop.strip_prefix("cls") {
                        cls_name = Some(suffix.to_owned());
                    }
                }
            }
            JsxAttr::Spread(e) => {
                if let Some((prop, _)) = e.as_helper_call(helper) {
                    if let Some(suffix) = prop.strip_prefix("props") {
                        props_name = Some(suffix.to_owned());
                    }
                }
            }
            _ => {}
        }
    }
    match (cls_name, props_name) {
        (Some(c), Some(p)) => Err(MergeError::InvariantViolation(format!(
            "element <{}> carries both a managed className ({c}) and a managed props spread ({p})",
            el.name
        ))),
        (Some(c), None) => Ok(Some((c, ManagedShape::ClassAttr))),
        (None, Some(p)) => Ok(Some((p, ManagedShape::PropsSpread))),
        (None, None) => Ok(None),
    }
}

/// Visit every tag-or-component in the classified tree, including those
/// nested in argument slots and attribute values.
pub fn for_each_tag<'a>(node: &'a PlasmicNode, f: &mut dyn FnMut(&'a PlasmicTagOrComponent)) {
    match node {
        PlasmicNode::TagOrComponent(t) => visit_tag(t, f),
        PlasmicNode::Arg(arg) => {
            for t in &arg.nodes {
                visit_tag(t, f);
            }
        }
        _ => {}
    }
}

fn visit_tag<'a>(t: &'a PlasmicTagOrComponent, f: &mut dyn FnMut(&'a PlasmicTagOrComponent)) {
    f(t);
    for attr in &t.jsx.attrs {
        if let PlasmicAttr::Named {
            value: Some(node), ..
        } = attr
        {
            for_each_tag(node, f);
        }
    }
    for child in &t.jsx.children {
        for_each_tag(child, f);
    }
}
