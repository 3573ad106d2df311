//! Final file assembly.
//!
//! The merged markup replaces the original expression in a clone of the
//! edited source, the revision marker is bumped to the new version's, the
//! managed imports are rewritten, and the verbatim managed region is
//! copied character-exact from the new file. All of it is span-based text
//! surgery on the edited source; the inputs are never mutated.

use crate::ast::{Expr, Span};
use crate::error::{MergeError, MergeResult};
use crate::imports::merge_imports;
use crate::printer::print_expr;
use crate::version::CodeVersion;

const REGION_START: &str = "// plasmic-managed-start";
const REGION_END: &str = "// plasmic-managed-end";

/// Final formatting pass over the assembled output. The shipped default is
/// the identity; callers plug in their project formatter.
pub trait SourceFormatter {
    fn format(&self, source: &str) -> anyhow::Result<String>;
}

#[derive(Debug, Default)]
pub struct IdentityFormatter;

impl SourceFormatter for IdentityFormatter {
    fn format(&self, source: &str) -> anyhow::Result<String> {
        Ok(source.to_owned())
    }
}

#[derive(Debug)]
struct TextEdit {
    span: Span,
    replacement: String,
}

pub fn assemble(
    uuid: &str,
    edited: &CodeVersion,
    new: &CodeVersion,
    merged_markup: &Expr,
    formatter: &dyn SourceFormatter,
) -> MergeResult<String> {
    let source = edited.file.source.as_str();
    let mut edits: Vec<TextEdit> = Vec::new();

    edits.push(TextEdit {
        span: edited.markup_span,
        replacement: print_expr(merged_markup),
    });

    let marker_text = &source[edited.marker_span.start..edited.marker_span.end];
    edits.push(TextEdit {
        span: edited.marker_span,
        replacement: bump_revision(marker_text, new.revision),
    });

    let plan = merge_imports(&edited.file, &new.file);
    if plan.deletions.is_empty() {
        edits.push(TextEdit {
            span: Span::new(plan.insert_at, plan.insert_at),
            replacement: plan.block.clone(),
        });
    } else {
        for (i, deletion) in plan.deletions.iter().enumerate() {
            edits.push(TextEdit {
                span: extend_through_newline(source, *deletion),
                // The merged block takes the place of the first managed import.
                replacement: if i == 0 { plan.block.clone() } else { String::new() },
            });
        }
    }

    let assembled = apply_edits(source, edits)?;
    let with_region = replace_managed_region(uuid, &assembled, &new.file.source)?;
    formatter.format(&with_region).map_err(MergeError::Format)
}

/// Rewrite the decimal revision inside a `plasmic-managed-jsx/<rev>`
/// marker comment.
fn bump_revision(marker_text: &str, revision: u64) -> String {
    const NEEDLE: &str = "plasmic-managed-jsx/";
    let Some(pos) = marker_text.find(NEEDLE) else {
        return marker_text.to_owned();
    };
    let digits_start = pos + NEEDLE.len();
    let digits_end = marker_text[digits_start..]
        .find(|c: char| !c.is_ascii_digit())
        .map(|i| digits_start + i)
        .unwrap_or(marker_text.len());
    format!(
        "{}{}{}",
        &marker_text[..digits_start],
        revision,
        &marker_text[digits_end..]
    )
}

fn extend_through_newline(source: &str, span: Span) -> Span {
    let bytes = source.as_bytes();
    let mut end = span.end;
    if end < bytes.len() && bytes[end] == b'\r' {
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b'\n' {
        end += 1;
    }
    Span::new(span.start, end)
}

fn apply_edits(source: &str, mut edits: Vec<TextEdit>) -> MergeResult<String> {
    edits.sort_by_key(|e| (e.span.start, e.span.end));
    let mut out = String::with_capacity(source.len());
    let mut pos = 0usize;
    for edit in &edits {
        if edit.span.start < pos {
            return Err(MergeError::InvariantViolation(
                "overlapping text edits during assembly".to_owned(),
            ));
        }
        out.push_str(&source[pos..edit.span.start]);
        out.push_str(&edit.replacement);
        pos = edit.span.end;
    }
    out.push_str(&source[pos..]);
    Ok(out)
}

/// Copy the `plasmic-managed-start` … `plasmic-managed-end` region from the
/// new file into the merged output, character-exact. Missing markers in
/// the new file are fatal; a merged output without markers (the developer
/// removed them) skips the substitution.
fn replace_managed_region(uuid: &str, merged: &str, new_source: &str) -> MergeResult<String> {
    let new_region = region_span(new_source).ok_or_else(|| MergeError::MissingManagedRegion {
        uuid: uuid.to_owned(),
    })?;
    match region_span(merged) {
        Some((start, end)) => Ok(format!(
            "{}{}{}",
            &merged[..start],
            &new_source[new_region.0..new_region.1],
            &merged[end..]
        )),
        None => {
            tracing::warn!(uuid, "merged output has no managed region markers; skipping copy");
            Ok(merged.to_owned())
        }
    }
}

fn region_span(text: &str) -> Option<(usize, usize)> {
    let start = text.find(REGION_START)?;
    let end_marker = start + text[start..].find(REGION_END)?;
    Some((start, end_marker + REGION_END.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bump_revision() {
        assert_eq!(
            bump_revision("/* plasmic-managed-jsx/12 */", 13),
            "/* plasmic-managed-jsx/13 */"
        );
    }

    #[test]
    fn test_apply_edits_in_any_order() {
        let edits = vec![
            TextEdit {
                span: Span::new(6, 11),
                replacement: "there".into(),
            },
            TextEdit {
                span: Span::new(0, 5),
                replacement: "howdy".into(),
            },
        ];
        assert_eq!(apply_edits("hello world", edits).unwrap(), "howdy there");
    }

    #[test]
    fn test_overlapping_edits_rejected() {
        let edits = vec![
            TextEdit {
                span: Span::new(0, 5),
                replacement: String::new(),
            },
            TextEdit {
                span: Span::new(3, 8),
                replacement: String::new(),
            },
        ];
        assert!(apply_edits("hello world", edits).is_err());
    }

    #[test]
    fn test_region_replacement() {
        let merged = "a\n// plasmic-managed-start\nOLD\n// plasmic-managed-end\nb\n";
        let newer = "x\n// plasmic-managed-start\nNEW\n// plasmic-managed-end\ny\n";
        let out = replace_managed_region("u", merged, newer).unwrap();
        assert_eq!(
            out,
            "a\n// plasmic-managed-start\nNEW\n// plasmic-managed-end\nb\n"
        );
    }

    #[test]
    fn test_missing_region_in_new_is_fatal() {
        let merged = "// plasmic-managed-start\n// plasmic-managed-end\n";
        let err = replace_managed_region("u", merged, "nothing here").unwrap_err();
        assert!(matches!(err, MergeError::MissingManagedRegion { .. }));
    }
}
