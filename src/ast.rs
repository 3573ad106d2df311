//! Typed syntax tree for the merge.
//!
//! The parser lowers the slice of TSX the merge must inspect into these
//! owned node types: JSX elements with their attributes and children, the
//! helper calls the design tool embeds (`rh.clsX()`, `{...rh.propsX()}`,
//! `rh.showX() && ...`), and import declarations. Anything the merge never
//! needs to look inside becomes an opaque [`ExprKind::Raw`] node carrying
//! its source text verbatim.
//!
//! Every node records its byte span in the originating source. Spans are
//! copied through cloning, which makes them a stable node identity: the
//! visibility reconciler relocates an element inside a freshly cloned
//! wrapper by comparing spans, never object addresses.

use std::fmt;

/// Byte range of a node in its originating source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    /// Span for nodes synthesized during the merge (never collides with a
    /// parsed span).
    pub const SYNTH: Span = Span {
        start: usize::MAX,
        end: usize::MAX,
    };

    pub fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }

    pub fn is_synthetic(&self) -> bool {
        self.start == usize::MAX
    }
}

/// An expression node with its source span.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub span: Span,
    pub kind: ExprKind,
}

/// The expression shapes the merge can type. Everything else is `Raw`.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Jsx(JsxElement),
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Member {
        object: Box<Expr>,
        property: String,
    },
    Ident(String),
    Str(StrLit),
    Bool(bool),
    Null,
    /// `left && right`. The only binary operator the tool emits (visibility
    /// gates); other operators stay opaque.
    And {
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Paren(Box<Expr>),
    /// Developer-owned source text the merge must not inspect.
    Raw(String),
}

/// A string literal, kept with its original quoting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrLit {
    pub raw: String,
}

impl StrLit {
    pub fn new(raw: impl Into<String>) -> Self {
        StrLit { raw: raw.into() }
    }

    /// The literal's content without the surrounding quotes.
    pub fn value(&self) -> &str {
        let s = self.raw.as_str();
        if s.len() >= 2 {
            &s[1..s.len() - 1]
        } else {
            s
        }
    }
}

/// A JSX element (markup node).
#[derive(Debug, Clone, PartialEq)]
pub struct JsxElement {
    pub span: Span,
    pub name: String,
    pub attrs: Vec<JsxAttr>,
    pub children: Vec<JsxChild>,
    pub self_closing: bool,
}

/// One entry in an element's attribute list.
#[derive(Debug, Clone, PartialEq)]
pub enum JsxAttr {
    Named {
        name: String,
        value: Option<AttrValue>,
    },
    Spread(Expr),
}

impl JsxAttr {
    pub fn name(&self) -> Option<&str> {
        match self {
            JsxAttr::Named { name, .. } => Some(name),
            JsxAttr::Spread(_) => None,
        }
    }
}

/// An attribute value: `name="str"` or `name={expr}`.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Str(StrLit),
    Expr(Expr),
}

/// A child slot of a JSX element. Element children are `Expr` nodes whose
/// kind is [`ExprKind::Jsx`]; the printer emits those without braces.
#[derive(Debug, Clone, PartialEq)]
pub enum JsxChild {
    Text { span: Span, value: String },
    Expr(Expr),
}

impl JsxChild {
    pub fn as_expr(&self) -> Option<&Expr> {
        match self {
            JsxChild::Expr(e) => Some(e),
            JsxChild::Text { .. } => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Construction helpers for synthesized nodes
// ---------------------------------------------------------------------------

impl Expr {
    pub fn synth(kind: ExprKind) -> Expr {
        Expr {
            span: Span::SYNTH,
            kind,
        }
    }

    pub fn ident(name: impl Into<String>) -> Expr {
        Expr::synth(ExprKind::Ident(name.into()))
    }

    pub fn null() -> Expr {
        Expr::synth(ExprKind::Null)
    }

    pub fn bool_lit(value: bool) -> Expr {
        Expr::synth(ExprKind::Bool(value))
    }

    /// `<helper>.<method>(args...)`
    pub fn helper_call(helper: &str, method: impl Into<String>, args: Vec<Expr>) -> Expr {
        Expr::synth(ExprKind::Call {
            callee: Box::new(Expr::synth(ExprKind::Member {
                object: Box::new(Expr::ident(helper)),
                property: method.into(),
            })),
            args,
        })
    }

    pub fn and(left: Expr, right: Expr) -> Expr {
        Expr::synth(ExprKind::And {
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    /// Strip any number of surrounding parentheses.
    pub fn unparen(&self) -> &Expr {
        match &self.kind {
            ExprKind::Paren(inner) => inner.unparen(),
            _ => self,
        }
    }

    /// If this is a call `<helper>.<prop>(...)` (possibly parenthesized),
    /// return the property name and argument list.
    pub fn as_helper_call<'a>(&'a self, helper: &str) -> Option<(&'a str, &'a [Expr])> {
        match &self.unparen().kind {
            ExprKind::Call { callee, args } => match &callee.unparen().kind {
                ExprKind::Member { object, property } => match &object.unparen().kind {
                    ExprKind::Ident(obj) if obj == helper => Some((property.as_str(), args)),
                    _ => None,
                },
                _ => None,
            },
            _ => None,
        }
    }

    /// The JSX element at the top of this expression, looking through
    /// parentheses and the right-hand side of `&&` visibility gates.
    pub fn find_markup(&self) -> Option<&JsxElement> {
        match &self.unparen().kind {
            ExprKind::Jsx(el) => Some(el),
            ExprKind::And { right, .. } => right.find_markup(),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Clone with hook
// ---------------------------------------------------------------------------

/// Deep-clone `expr`, consulting `hook` at every expression node. When the
/// hook returns a replacement, the replacement is used verbatim and the
/// clone does not descend into the original subtree. Every per-subtree
/// rewrite in the engine (identifier renames, element splicing, argument
/// substitution) composes over this primitive.
pub fn clone_expr_with(expr: &Expr, hook: &mut dyn FnMut(&Expr) -> Option<Expr>) -> Expr {
    if let Some(replacement) = hook(expr) {
        return replacement;
    }
    let kind = match &expr.kind {
        ExprKind::Jsx(el) => ExprKind::Jsx(clone_element_with(el, hook)),
        ExprKind::Call { callee, args } => ExprKind::Call {
            callee: Box::new(clone_expr_with(callee, hook)),
            args: args.iter().map(|a| clone_expr_with(a, hook)).collect(),
        },
        ExprKind::Member { object, property } => ExprKind::Member {
            object: Box::new(clone_expr_with(object, hook)),
            property: property.clone(),
        },
        ExprKind::And { left, right } => ExprKind::And {
            left: Box::new(clone_expr_with(left, hook)),
            right: Box::new(clone_expr_with(right, hook)),
        },
        ExprKind::Paren(inner) => ExprKind::Paren(Box::new(clone_expr_with(inner, hook))),
        other => other.clone(),
    };
    Expr {
        span: expr.span,
        kind,
    }
}

fn clone_element_with(el: &JsxElement, hook: &mut dyn FnMut(&Expr) -> Option<Expr>) -> JsxElement {
    JsxElement {
        span: el.span,
        name: el.name.clone(),
        attrs: el
            .attrs
            .iter()
            .map(|attr| match attr {
                JsxAttr::Named { name, value } => JsxAttr::Named {
                    name: name.clone(),
                    value: value.as_ref().map(|v| match v {
                        AttrValue::Str(s) => AttrValue::Str(s.clone()),
                        AttrValue::Expr(e) => AttrValue::Expr(clone_expr_with(e, hook)),
                    }),
                },
                JsxAttr::Spread(e) => JsxAttr::Spread(clone_expr_with(e, hook)),
            })
            .collect(),
        children: el
            .children
            .iter()
            .map(|child| match child {
                JsxChild::Text { span, value } => JsxChild::Text {
                    span: *span,
                    value: value.clone(),
                },
                JsxChild::Expr(e) => JsxChild::Expr(clone_expr_with(e, hook)),
            })
            .collect(),
        self_closing: el.self_closing,
    }
}

/// Walk every expression node in pre-order, including attribute values and
/// element children. The visitor returns `true` to keep descending.
pub fn visit_exprs(expr: &Expr, visit: &mut dyn FnMut(&Expr) -> bool) {
    if !visit(expr) {
        return;
    }
    match &expr.kind {
        ExprKind::Jsx(el) => visit_element_exprs(el, visit),
        ExprKind::Call { callee, args } => {
            visit_exprs(callee, visit);
            for a in args {
                visit_exprs(a, visit);
            }
        }
        ExprKind::Member { object, .. } => visit_exprs(object, visit),
        ExprKind::And { left, right } => {
            visit_exprs(left, visit);
            visit_exprs(right, visit);
        }
        ExprKind::Paren(inner) => visit_exprs(inner, visit),
        _ => {}
    }
}

fn visit_element_exprs(el: &JsxElement, visit: &mut dyn FnMut(&Expr) -> bool) {
    for attr in &el.attrs {
        match attr {
            JsxAttr::Named {
                value: Some(AttrValue::Expr(e)),
                ..
            } => visit_exprs(e, visit),
            JsxAttr::Spread(e) => visit_exprs(e, visit),
            _ => {}
        }
    }
    for child in &el.children {
        if let JsxChild::Expr(e) = child {
            visit_exprs(e, visit);
        }
    }
}

// ---------------------------------------------------------------------------
// Semantic equality
// ---------------------------------------------------------------------------

/// Deep structural equality ignoring spans, parentheses, and comments.
/// Opaque `Raw` nodes compare by comment-stripped, whitespace-collapsed
/// text, so a reformatted developer expression still counts as unchanged.
pub fn sem_eq(a: &Expr, b: &Expr) -> bool {
    let (a, b) = (a.unparen(), b.unparen());
    match (&a.kind, &b.kind) {
        (ExprKind::Jsx(x), ExprKind::Jsx(y)) => element_sem_eq(x, y),
        (
            ExprKind::Call {
                callee: c1,
                args: a1,
            },
            ExprKind::Call {
                callee: c2,
                args: a2,
            },
        ) => {
            sem_eq(c1, c2)
                && a1.len() == a2.len()
                && a1.iter().zip(a2.iter()).all(|(x, y)| sem_eq(x, y))
        }
        (
            ExprKind::Member {
                object: o1,
                property: p1,
            },
            ExprKind::Member {
                object: o2,
                property: p2,
            },
        ) => p1 == p2 && sem_eq(o1, o2),
        (ExprKind::Ident(x), ExprKind::Ident(y)) => x == y,
        (ExprKind::Str(x), ExprKind::Str(y)) => x.raw == y.raw,
        (ExprKind::Bool(x), ExprKind::Bool(y)) => x == y,
        (ExprKind::Null, ExprKind::Null) => true,
        (
            ExprKind::And {
                left: l1,
                right: r1,
            },
            ExprKind::And {
                left: l2,
                right: r2,
            },
        ) => sem_eq(l1, l2) && sem_eq(r1, r2),
        (ExprKind::Raw(x), ExprKind::Raw(y)) => normalize_raw(x) == normalize_raw(y),
        _ => false,
    }
}

pub fn element_sem_eq(a: &JsxElement, b: &JsxElement) -> bool {
    a.name == b.name
        && a.attrs.len() == b.attrs.len()
        && a.attrs
            .iter()
            .zip(b.attrs.iter())
            .all(|(x, y)| attr_sem_eq(x, y))
        && a.children.len() == b.children.len()
        && a.children
            .iter()
            .zip(b.children.iter())
            .all(|(x, y)| child_sem_eq(x, y))
}

fn attr_sem_eq(a: &JsxAttr, b: &JsxAttr) -> bool {
    match (a, b) {
        (
            JsxAttr::Named {
                name: n1,
                value: v1,
            },
            JsxAttr::Named {
                name: n2,
                value: v2,
            },
        ) => n1 == n2 && attr_value_sem_eq(v1.as_ref(), v2.as_ref()),
        (JsxAttr::Spread(x), JsxAttr::Spread(y)) => sem_eq(x, y),
        _ => false,
    }
}

pub fn attr_value_sem_eq(a: Option<&AttrValue>, b: Option<&AttrValue>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(AttrValue::Str(x)), Some(AttrValue::Str(y))) => x.raw == y.raw,
        (Some(AttrValue::Expr(x)), Some(AttrValue::Expr(y))) => sem_eq(x, y),
        _ => false,
    }
}

fn child_sem_eq(a: &JsxChild, b: &JsxChild) -> bool {
    match (a, b) {
        (JsxChild::Text { value: x, .. }, JsxChild::Text { value: y, .. }) => x == y,
        (JsxChild::Expr(x), JsxChild::Expr(y)) => sem_eq(x, y),
        _ => false,
    }
}

/// Strip `//` and `/* */` comments, collapse whitespace runs to a single
/// space, and trim. Used only for comparing opaque text, never for output.
pub fn normalize_raw(text: &str) -> String {
    let stripped = strip_comments(text);
    let mut out = String::with_capacity(stripped.len());
    let mut in_ws = false;
    for ch in stripped.chars() {
        if ch.is_whitespace() {
            if !in_ws && !out.is_empty() {
                out.push(' ');
            }
            in_ws = true;
        } else {
            out.push(ch);
            in_ws = false;
        }
    }
    while out.ends_with(' ') {
        out.pop();
    }
    out
}

fn strip_comments(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out: Vec<u8> = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b == b'/' && i + 1 < bytes.len() && bytes[i + 1] == b'/' {
            while i < bytes.len() && bytes[i] != b'\n' {
                i += 1;
            }
        } else if b == b'/' && i + 1 < bytes.len() && bytes[i + 1] == b'*' {
            i += 2;
            while i + 1 < bytes.len() && !(bytes[i] == b'*' && bytes[i + 1] == b'/') {
                i += 1;
            }
            i = (i + 2).min(bytes.len());
        } else if b == b'"' || b == b'\'' || b == b'`' {
            // Copy string literals whole so comment markers inside them survive.
            let quote = b;
            out.push(b);
            i += 1;
            while i < bytes.len() {
                out.push(bytes[i]);
                if bytes[i] == quote && bytes[i - 1] != b'\\' {
                    i += 1;
                    break;
                }
                i += 1;
            }
        } else {
            out.push(b);
            i += 1;
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", crate::printer::print_expr(self))
    }
}

// ---------------------------------------------------------------------------
// Imports
// ---------------------------------------------------------------------------

/// One `import` declaration, with its managed tag when the trailing line
/// comment carries one.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportDecl {
    /// Full statement span, extended over the trailing tag comment.
    pub span: Span,
    pub specifiers: Vec<ImportSpecifier>,
    pub source: StrLit,
    pub managed: Option<ManagedImportTag>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportSpecifier {
    Default { local: String },
    Named { imported: String, local: String },
    Namespace { local: String },
}

/// The `plasmic-import: <id>[/<type>]` tag on a managed import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedImportTag {
    pub id: String,
    pub kind: Option<ImportTagKind>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportTagKind {
    Component,
    Css,
    Render,
    GlobalVariant,
    Projectcss,
    Defaultcss,
}

impl ImportTagKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportTagKind::Component => "component",
            ImportTagKind::Css => "css",
            ImportTagKind::Render => "render",
            ImportTagKind::GlobalVariant => "globalVariant",
            ImportTagKind::Projectcss => "projectcss",
            ImportTagKind::Defaultcss => "defaultcss",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "component" => Some(ImportTagKind::Component),
            "css" => Some(ImportTagKind::Css),
            "render" => Some(ImportTagKind::Render),
            "globalVariant" => Some(ImportTagKind::GlobalVariant),
            "projectcss" => Some(ImportTagKind::Projectcss),
            "defaultcss" => Some(ImportTagKind::Defaultcss),
        _ => None,
        }
    }
}

impl ManagedImportTag {
    /// Sort key implementing the total order over managed imports: primary
    /// by id, secondary by type with absent type first.
    pub fn sort_key(&self) -> (&str, u8, &str) {
        match &self.kind {
            None => (self.id.as_str(), 0, ""),
            Some(k) => (self.id.as_str(), 1, k.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jsx(name: &str, attrs: Vec<JsxAttr>, children: Vec<JsxChild>) -> Expr {
        Expr::synth(ExprKind::Jsx(JsxElement {
            span: Span::SYNTH,
            name: name.into(),
            attrs,
            children,
            self_closing: false,
        }))
    }

    #[test]
    fn test_helper_call_detection() {
        let call = Expr::helper_call("rh", "clsRoot", vec![]);
        let (prop, args) = call.as_helper_call("rh").unwrap();
        assert_eq!(prop, "clsRoot");
        assert!(args.is_empty());
        assert!(call.as_helper_call("other").is_none());
    }

    #[test]
    fn test_helper_call_through_parens() {
        let inner = Expr::helper_call("rh", "showX", vec![]);
        let wrapped = Expr::synth(ExprKind::Paren(Box::new(inner)));
        assert_eq!(wrapped.as_helper_call("rh").unwrap().0, "showX");
    }

    #[test]
    fn test_find_markup_through_gate() {
        let el = jsx("div", vec![], vec![]);
        let gated = Expr::and(Expr::helper_call("rh", "showX", vec![]), el);
        assert_eq!(gated.find_markup().unwrap().name, "div");
    }

    #[test]
    fn test_clone_with_hook_replaces_and_stops() {
        let target = Expr::ident("victim");
        let call = Expr::synth(ExprKind::Call {
            callee: Box::new(Expr::ident("f")),
            args: vec![target],
        });
        let cloned = clone_expr_with(&call, &mut |e| match &e.kind {
            ExprKind::Ident(name) if name == "victim" => Some(Expr::null()),
            _ => None,
        });
        match cloned.kind {
            ExprKind::Call { args, .. } => assert!(matches!(args[0].kind, ExprKind::Null)),
            _ => panic!("expected call"),
        }
    }

    #[test]
    fn test_sem_eq_ignores_parens_and_spans() {
        let a = Expr::ident("x");
        let b = Expr {
            span: Span::new(10, 11),
            kind: ExprKind::Paren(Box::new(Expr::ident("x"))),
        };
        assert!(sem_eq(&a, &b));
    }

    #[test]
    fn test_sem_eq_raw_ignores_comments_and_reflow() {
        let a = Expr::synth(ExprKind::Raw("() => doIt(1) // handler".into()));
        let b = Expr::synth(ExprKind::Raw("() =>\n  doIt(1)".into()));
        assert!(sem_eq(&a, &b));
    }

    #[test]
    fn test_normalize_raw_keeps_string_contents() {
        assert_eq!(normalize_raw("f(\"a // b\")"), "f(\"a // b\")");
    }

    #[test]
    fn test_import_tag_sort_key_absent_type_first() {
        let bare = ManagedImportTag {
            id: "7".into(),
            kind: None,
        };
        let typed = ManagedImportTag {
            id: "7".into(),
            kind: Some(ImportTagKind::Css),
        };
        assert!(bare.sort_key() < typed.sort_key());
    }
}
