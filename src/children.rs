//! Children reconciliation for a paired node.
//!
//! The merged list starts as a positional copy of the new version's
//! children, so tool-side insertions and deletions hold by default. The
//! edited children are then walked in order: developer-introduced text and
//! opaque expressions are re-inserted, anchored after the match of their
//! predecessor; text the tool deleted (still present in base) is dropped.
//! Markup children are not inserted here — their content flows through
//! recursive serialization of the new version's matching child.

use crate::matcher::{find_match, MatchKind};
use crate::node::{NodeVariant, PlasmicNode};

/// One slot of the merged children list, tagged with its origin.
#[derive(Debug, Clone)]
pub struct MergedChild {
    pub node: PlasmicNode,
    pub from_edited: bool,
}

pub fn merge_children(
    new_children: &[PlasmicNode],
    edited_children: &[PlasmicNode],
    base_children: Option<&[PlasmicNode]>,
    equiv_new_edited: &dyn Fn(&str, &str) -> bool,
    equiv_base_edited: &dyn Fn(&str, &str) -> bool,
) -> Vec<MergedChild> {
    let mut merged: Vec<MergedChild> = new_children
        .iter()
        .cloned()
        .map(|node| MergedChild {
            node,
            from_edited: false,
        })
        .collect();
    let mut cursor = 0usize;

    for (i, child) in edited_children.iter().enumerate() {
        match child.variant() {
            NodeVariant::Text | NodeVariant::StringLit => {
                if let Some(m) = find_match(
                    merged.iter().map(|m| &m.node),
                    cursor,
                    equiv_new_edited,
                    child,
                ) {
                    if m.kind == MatchKind::Perfect {
                        // Already present; advance past it.
                        cursor = m.index + 1;
                        continue;
                    }
                }
                let deleted_by_tool = base_children.is_some_and(|base| {
                    matches!(
                        find_match(base.iter(), 0, equiv_base_edited, child),
                        Some(m) if m.kind == MatchKind::Perfect
                    )
                });
                if deleted_by_tool {
                    continue;
                }
                insert_anchored(
                    &mut merged,
                    &mut cursor,
                    i,
                    child,
                    edited_children,
                    equiv_new_edited,
                );
            }
            NodeVariant::Opaque => {
                insert_anchored(
                    &mut merged,
                    &mut cursor,
                    i,
                    child,
                    edited_children,
                    equiv_new_edited,
                );
            }
            // Markup, args, and conditional-string calls are carried by the
            // new list and merged through recursion.
            NodeVariant::TagOrComponent | NodeVariant::Arg | NodeVariant::CondStrCall => {}
        }
    }

    merged
}

/// Insert a developer child after the match of its predecessor.
fn insert_anchored(
    merged: &mut Vec<MergedChild>,
    cursor: &mut usize,
    index: usize,
    child: &PlasmicNode,
    edited_children: &[PlasmicNode],
    equiv: &dyn Fn(&str, &str) -> bool,
) {
    let item = MergedChild {
        node: child.clone(),
        from_edited: true,
    };
    if index == 0 {
        merged.insert(0, item);
        *cursor = 1;
        return;
    }
    let prev = &edited_children[index - 1];
    match find_match(merged.iter().map(|m| &m.node), *cursor, equiv, prev) {
        Some(m) => {
            merged.insert(m.index + 1, item);
            *cursor = m.index + 2;
        }
        None => {
            let at = (*cursor).min(merged.len());
            merged.insert(at, item);
            *cursor = at + 1;
        }
    }
}
