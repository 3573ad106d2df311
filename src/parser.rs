//! TSX ingest: tree-sitter CST → typed tree.
//!
//! The engine only types the syntax it must reason about — JSX structure,
//! the tool's helper calls, visibility gates, string literals, and import
//! declarations. Every other expression is lowered to an opaque `Raw` node
//! carrying its exact source slice, so developer code round-trips
//! untouched. Parse errors are fatal: the merge has no recovery story for
//! unparsable input.
//!
//! Recognized file markers:
//! - leading block comment `plasmic-managed-jsx/<decimal>` annotating the
//!   managed markup expression (assignment RHS or return argument),
//! - trailing line comment `plasmic-import: <id>[/<type>]` tagging a
//!   managed import declaration.

use once_cell::sync::Lazy;
use regex::Regex;
use tree_sitter::Node;

use crate::ast::{
    AttrValue, Expr, ExprKind, ImportDecl, ImportSpecifier, ImportTagKind, JsxAttr, JsxChild,
    JsxElement, ManagedImportTag, Span, StrLit,
};
use crate::error::{MergeError, MergeResult};

static MANAGED_JSX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"plasmic-managed-jsx/(\d+)").expect("valid marker regex"));

static MANAGED_IMPORT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"plasmic-import:\s+([\w-]+)(?:/(component|css|render|globalVariant|projectcss|defaultcss))?")
        .expect("valid import tag regex")
});

/// Yields the typed view of a component source file.
pub trait SourceParser {
    fn parse_file(&self, source: &str, label: &str) -> MergeResult<ParsedFile>;
}

/// A parsed component file.
#[derive(Debug, Clone)]
pub struct ParsedFile {
    pub source: String,
    pub imports: Vec<ImportDecl>,
    pub markup: Option<ManagedMarkup>,
    /// Helper object name (`rh`), discovered from the first managed call.
    pub helper: Option<String>,
}

/// The managed markup expression and its revision marker.
#[derive(Debug, Clone)]
pub struct ManagedMarkup {
    pub revision: u64,
    /// Span of the markup expression in `source`.
    pub span: Span,
    /// Span of the `plasmic-managed-jsx` comment.
    pub marker_span: Span,
    pub expr: Expr,
}

/// Tree-sitter backed parser for TSX component files.
#[derive(Debug, Default)]
pub struct TsxParser;

impl TsxParser {
    pub fn new() -> Self {
        TsxParser
    }
}

impl SourceParser for TsxParser {
    fn parse_file(&self, source: &str, label: &str) -> MergeResult<ParsedFile> {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&tree_sitter_typescript::LANGUAGE_TSX.into())
            .map_err(|e| MergeError::Parse {
                file: label.to_owned(),
                message: e.to_string(),
            })?;
        let tree = parser.parse(source, None).ok_or_else(|| MergeError::Parse {
            file: label.to_owned(),
            message: "parser produced no tree".to_owned(),
        })?;
        let root = tree.root_node();
        if root.has_error() {
            return Err(MergeError::Parse {
                file: label.to_owned(),
                message: "syntax error in source".to_owned(),
            });
        }

        let mut imports = Vec::new();
        let mut cursor = root.walk();
        for child in root.named_children(&mut cursor) {
            if child.kind() == "import_statement" {
                imports.push(parse_import(child, source));
            }
        }

        let markup = find_managed_markup(root, source);
        let helper = markup.as_ref().and_then(|m| discover_helper(&m.expr));

        Ok(ParsedFile {
            source: source.to_owned(),
            imports,
            markup,
            helper,
        })
    }
}

fn node_text<'a>(node: Node, source: &'a str) -> &'a str {
    &source[node.start_byte()..node.end_byte()]
}

fn node_span(node: Node) -> Span {
    Span::new(node.start_byte(), node.end_byte())
}

// ---------------------------------------------------------------------------
// Managed markup discovery
// ---------------------------------------------------------------------------

fn find_managed_markup(root: Node, source: &str) -> Option<ManagedMarkup> {
    let mut comments: Vec<Node> = Vec::new();
    collect_nodes(root, &mut |n| {
        if n.kind() == "comment" {
            comments.push(n);
        }
    });
    for comment in comments {
        let text = node_text(comment, source);
        let Some(caps) = MANAGED_JSX_RE.captures(text) else {
            continue;
        };
        let revision: u64 = caps[1].parse().ok()?;
        let mut sib = comment.next_named_sibling();
        while let Some(s) = sib {
            if s.kind() != "comment" {
                break;
            }
            sib = s.next_named_sibling();
        }
        let expr_node = sib?;
        let expr = lower_expr(expr_node, source);
        return Some(ManagedMarkup {
            revision,
            span: node_span(expr_node),
            marker_span: node_span(comment),
            expr,
        });
    }
    None
}

fn collect_nodes<'a>(node: Node<'a>, f: &mut dyn FnMut(Node<'a>)) {
    f(node);
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_nodes(child, f);
    }
}

fn discover_helper(expr: &Expr) -> Option<String> {
    let mut helper: Option<String> = None;
    crate::ast::visit_exprs(expr, &mut |e| {
        if helper.is_some() {
            return false;
        }
        if let ExprKind::Call { callee, .. } = &e.kind {
            if let ExprKind::Member { object, property } = &callee.unparen().kind {
                if let ExprKind::Ident(name) = &object.unparen().kind {
                    if property.starts_with("cls")
                        || property.starts_with("props")
                        || property.starts_with("show")
                    {
                        helper = Some(name.clone());
                        return false;
                    }
                }
            }
        }
        true
    });
    helper
}

// ---------------------------------------------------------------------------
// Expression lowering
// ---------------------------------------------------------------------------

fn raw_kind(node: Node, source: &str) -> ExprKind {
    ExprKind::Raw(node_text(node, source).to_owned())
}

fn lower_expr(node: Node, source: &str) -> Expr {
    let span = node_span(node);
    let kind = match node.kind() {
        "parenthesized_expression" => match first_expr_child(node) {
            Some(inner) => ExprKind::Paren(Box::new(lower_expr(inner, source))),
            None => raw_kind(node, source),
        },
        "jsx_element" | "jsx_self_closing_element" => match lower_jsx_element(node, source) {
            Some(el) => ExprKind::Jsx(el),
            None => raw_kind(node, source),
        },
        "call_expression" => {
            let callee = node.child_by_field_name("function");
            let args = node.child_by_field_name("arguments");
            match (callee, args) {
                (Some(callee), Some(args)) if args.kind() == "arguments" => {
                    let mut cursor = args.walk();
                    let lowered: Vec<Expr> = args
                        .named_children(&mut cursor)
                        .filter(|a| a.kind() != "comment")
                        .map(|a| lower_expr(a, source))
                        .collect();
                    ExprKind::Call {
                        callee: Box::new(lower_expr(callee, source)),
                        args: lowered,
                    }
                }
                _ => raw_kind(node, source),
            }
        }
        "member_expression" => {
            let object = node.child_by_field_name("object");
            let property = node.child_by_field_name("property");
            match (object, property) {
                (Some(object), Some(property)) if property.kind() == "property_identifier" => {
                    ExprKind::Member {
                        object: Box::new(lower_expr(object, source)),
                        property: node_text(property, source).to_owned(),
                    }
                }
                _ => raw_kind(node, source),
            }
        }
        "identifier" => ExprKind::Ident(node_text(node, source).to_owned()),
        "string" => ExprKind::Str(StrLit::new(node_text(node, source))),
        "true" => ExprKind::Bool(true),
        "false" => ExprKind::Bool(false),
        "null" => ExprKind::Null,
        "binary_expression" => {
            let left = node.child_by_field_name("left");
            let op = node.child_by_field_name("operator");
            let right = node.child_by_field_name("right");
            match (left, op, right) {
                (Some(left), Some(op), Some(right)) if node_text(op, source) == "&&" => {
                    ExprKind::And {
                        left: Box::new(lower_expr(left, source)),
                        right: Box::new(lower_expr(right, source)),
                    }
                }
                _ => raw_kind(node, source),
            }
        }
        _ => raw_kind(node, source),
    };
    Expr { span, kind }
}

fn first_expr_child(node: Node) -> Option<Node> {
    let mut cursor = node.walk();
    let result = node
        .named_children(&mut cursor)
        .find(|c| c.kind() != "comment");
    result
}

fn lower_jsx_element(node: Node, source: &str) -> Option<JsxElement> {
    let span = node_span(node);
    if node.kind() == "jsx_self_closing_element" {
        let (name, attrs) = lower_tag_head(node, source)?;
        return Some(JsxElement {
            span,
            name,
            attrs,
            children: vec![],
            self_closing: true,
        });
    }

    // jsx_element: opening tag, children, closing tag.
    let mut cursor = node.walk();
    let opening = node
        .named_children(&mut cursor)
        .find(|c| c.kind() == "jsx_opening_element")?;
    let (name, attrs) = lower_tag_head(opening, source)?;

    let mut children = Vec::new();
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "jsx_opening_element" | "jsx_closing_element" => {}
            "jsx_element" | "jsx_self_closing_element" => {
                children.push(JsxChild::Expr(lower_expr(child, source)));
            }
            "jsx_expression" => children.push(lower_jsx_container(child, source)),
            // jsx_text, html entities, anything else: verbatim text.
            _ => children.push(JsxChild::Text {
                span: node_span(child),
                value: node_text(child, source).to_owned(),
            }),
        }
    }

    Some(JsxElement {
        span,
        name,
        attrs,
        children,
        self_closing: false,
    })
}

/// Extract the tag name and attribute list from an opening or
/// self-closing element node.
fn lower_tag_head(node: Node, source: &str) -> Option<(String, Vec<JsxAttr>)> {
    let mut name: Option<String> = None;
    let mut attrs = Vec::new();
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "jsx_attribute" => {
                if let Some(attr) = lower_named_attr(child, source) {
                    attrs.push(attr);
                }
            }
            "jsx_expression" => attrs.push(lower_spread_attr(child, source)),
            "comment" => {}
            _ if name.is_none() => name = Some(node_text(child, source).to_owned()),
            _ => {}
        }
    }
    name.map(|n| (n, attrs))
}

fn lower_named_attr(node: Node, source: &str) -> Option<JsxAttr> {
    let mut cursor = node.walk();
    let mut children = node.named_children(&mut cursor).filter(|c| c.kind() != "comment");
    let name_node = children.next()?;
    let name = node_text(name_node, source).to_owned();
    let value = children.next().map(|v| match v.kind() {
        "string" => AttrValue::Str(StrLit::new(node_text(v, source))),
        "jsx_expression" => AttrValue::Expr(lower_container_expr(v, source)),
        _ => AttrValue::Expr(lower_expr(v, source)),
    });
    Some(JsxAttr::Named { name, value })
}

fn lower_spread_attr(node: Node, source: &str) -> JsxAttr {
    let mut cursor = node.walk();
    let inner = node
        .named_children(&mut cursor)
        .find(|c| c.kind() != "comment");
    if let Some(spread) = inner.filter(|c| c.kind() == "spread_element") {
        let mut cursor = spread.walk();
        let inner_expr = spread
            .named_children(&mut cursor)
            .find(|c| c.kind() != "comment");
        if let Some(expr) = inner_expr {
            return JsxAttr::Spread(lower_expr(expr, source));
        }
    }
    // Malformed or exotic spread: keep its inner text opaque.
    JsxAttr::Spread(Expr {
        span: node_span(node),
        kind: ExprKind::Raw(container_inner_text(node, source).to_owned()),
    })
}

/// The expression inside a `{ … }` container in attribute position.
fn lower_container_expr(node: Node, source: &str) -> Expr {
    let mut cursor = node.walk();
    let inner = node
        .named_children(&mut cursor)
        .find(|c| c.kind() != "comment");
    match inner {
        Some(expr) => lower_expr(expr, source),
        None => Expr {
            span: node_span(node),
            kind: ExprKind::Raw(container_inner_text(node, source).to_owned()),
        },
    }
}

/// A `{ … }` container in child position.
fn lower_jsx_container(node: Node, source: &str) -> JsxChild {
    let mut cursor = node.walk();
    let inner = node
        .named_children(&mut cursor)
        .find(|c| c.kind() != "comment");
    match inner {
        Some(expr) if expr.kind() != "spread_element" => JsxChild::Expr(lower_expr(expr, source)),
        _ => JsxChild::Expr(Expr {
            span: node_span(node),
            kind: ExprKind::Raw(container_inner_text(node, source).to_owned()),
        }),
    }
}

fn container_inner_text<'a>(node: Node, source: &'a str) -> &'a str {
    let text = node_text(node, source);
    text.strip_prefix('{')
        .and_then(|t| t.strip_suffix('}'))
        .unwrap_or(text)
}

// ---------------------------------------------------------------------------
// Imports
// ---------------------------------------------------------------------------

fn parse_import(node: Node, source: &str) -> ImportDecl {
    let mut specifiers = Vec::new();
    let mut source_lit: Option<StrLit> = None;

    if let Some(src) = node.child_by_field_name("source") {
        source_lit = Some(StrLit::new(node_text(src, source)));
    }

    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "import_clause" => {
                let mut clause_cursor = child.walk();
                for item in child.named_children(&mut clause_cursor) {
                    match item.kind() {
                        "identifier" => specifiers.push(ImportSpecifier::Default {
                            local: node_text(item, source).to_owned(),
                        }),
                        "named_imports" => {
                            let mut spec_cursor = item.walk();
                            for spec in item.named_children(&mut spec_cursor) {
                                if spec.kind() != "import_specifier" {
                                    continue;
                                }
                                let Some(name) = spec.child_by_field_name("name") else {
                                    continue;
                                };
                                let imported = node_text(name, source).to_owned();
                                let local = spec
                                    .child_by_field_name("alias")
                                    .map(|a| node_text(a, source).to_owned())
                                    .unwrap_or_else(|| imported.clone());
                                specifiers.push(ImportSpecifier::Named { imported, local });
                            }
                        }
                        "namespace_import" => {
                            let mut ns_cursor = item.walk();
                            let ident = item
                                .named_children(&mut ns_cursor)
                                .find(|c| c.kind() == "identifier");
                            if let Some(ident) = ident {
                                specifiers.push(ImportSpecifier::Namespace {
                                    local: node_text(ident, source).to_owned(),
                                });
                            }
                        }
                        _ => {}
                    }
                }
            }
            "string" if source_lit.is_none() => {
                source_lit = Some(StrLit::new(node_text(child, source)));
            }
            _ => {}
        }
    }

    // Trailing line comment may carry the managed tag.
    let stmt_end = node.end_byte();
    let line_end = source[stmt_end..]
        .find('\n')
        .map(|i| stmt_end + i)
        .unwrap_or(source.len());
    let trailing = &source[stmt_end..line_end];
    let managed = MANAGED_IMPORT_RE.captures(trailing).map(|caps| ManagedImportTag {
        id: caps[1].to_owned(),
        kind: caps.get(2).and_then(|m| ImportTagKind::parse(m.as_str())),
    });
    let span_end = if managed.is_some() { line_end } else { stmt_end };

    ImportDecl {
        span: Span::new(node.start_byte(), span_end),
        specifiers,
        source: source_lit.unwrap_or_else(|| StrLit::new("\"\"")),
        managed,
    }
}
