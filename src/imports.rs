//! Managed-import union.
//!
//! Tool-managed imports (those tagged with a trailing `plasmic-import`
//! comment) from the edited and new files are concatenated, stably sorted
//! under the total order (id ascending, absent type before present, type
//! ascending), and adjacent equals are merged specifier-by-specifier.
//! Developer imports are left untouched in place; the merged managed block
//! is re-inserted where the first managed import used to live.

use crate::ast::{ImportDecl, ImportSpecifier, Span};
use crate::parser::ParsedFile;
use crate::printer::print_import;

/// Text-level plan the assembler applies to the edited source.
#[derive(Debug, Clone)]
pub struct ImportMergePlan {
    /// Spans of the edited file's managed imports, to be deleted.
    pub deletions: Vec<Span>,
    /// Byte offset in the edited file where the merged block is inserted.
    pub insert_at: usize,
    /// The merged managed imports, one per line, trailing newline included.
    pub block: String,
}

pub fn merge_imports(edited: &ParsedFile, new: &ParsedFile) -> ImportMergePlan {
    let edited_managed: Vec<&ImportDecl> =
        edited.imports.iter().filter(|d| d.managed.is_some()).collect();
    let new_managed: Vec<&ImportDecl> =
        new.imports.iter().filter(|d| d.managed.is_some()).collect();

    let mut combined: Vec<ImportDecl> = edited_managed
        .iter()
        .chain(new_managed.iter())
        .map(|d| (*d).clone())
        .collect();
    // Stable sort keeps the edited-before-new order within equal keys.
    combined.sort_by(|a, b| sort_key(a).cmp(&sort_key(b)));

    let mut merged: Vec<ImportDecl> = Vec::with_capacity(combined.len());
    for decl in combined {
        match merged.last_mut() {
            Some(last) if sort_key(last) == sort_key(&decl) => {
                merge_specifiers(last, &decl);
            }
            _ => merged.push(decl),
        }
    }

    let insert_at = edited_managed
        .first()
        .map(|d| d.span.start)
        .or_else(|| edited.imports.first().map(|d| d.span.start))
        .unwrap_or(0);

    let mut block = String::new();
    for decl in &merged {
        block.push_str(&print_import(decl));
        block.push('\n');
    }

    ImportMergePlan {
        deletions: edited_managed.iter().map(|d| d.span).collect(),
        insert_at,
        block,
    }
}

type SortKey<'a> = (&'a str, u8, &'a str);

fn sort_key(decl: &ImportDecl) -> SortKey<'_> {
    match &decl.managed {
        Some(tag) => tag.sort_key(),
        // Unreachable for managed-only lists; sorts first if it happens.
        None => ("", 0, ""),
    }
}

/// Union `b`'s specifiers into `a`, deduplicating defaults by local name
/// and named specifiers by `(local, imported)`. Namespace imports are
/// developer-introduced and always kept.
fn merge_specifiers(a: &mut ImportDecl, b: &ImportDecl) {
    for spec in &b.specifiers {
        let duplicate = match spec {
            ImportSpecifier::Default { local } => a.specifiers.iter().any(|s| {
                matches!(s, ImportSpecifier::Default { local: l } if l == local)
            }),
            ImportSpecifier::Named { imported, local } => a.specifiers.iter().any(|s| {
                matches!(
                    s,
                    ImportSpecifier::Named { imported: i, local: l }
                        if i == imported && l == local
                )
            }),
            ImportSpecifier::Namespace { .. } => false,
        };
        if !duplicate {
            a.specifiers.push(spec.clone());
        }
    }
}
