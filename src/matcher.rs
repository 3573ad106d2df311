//! Identity matching over sibling lists.
//!
//! Given a probe node from one version and a candidate list from another,
//! `find_match` scans forward for the best correspondence: a *perfect*
//! match on identity (same value, same `argName`, or equivalent
//! `nameInId`), falling back to the first candidate of the same variant
//! (*type* match). The `equiv` predicate is supplied by the caller and
//! closes over the right pair of uuid maps for the versions involved.

use crate::ast::sem_eq;
use crate::node::{NodeVariant, PlasmicNode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Perfect,
    Type,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    pub index: usize,
    pub kind: MatchKind,
}

/// Find the match for `probe` in `nodes[start..]`.
///
/// Returns the first perfect match at or after `start`; if none exists,
/// the first same-variant candidate; otherwise `None`.
pub fn find_match<'a, I>(
    nodes: I,
    start: usize,
    equiv: &dyn Fn(&str, &str) -> bool,
    probe: &PlasmicNode,
) -> Option<Match>
where
    I: IntoIterator<Item = &'a PlasmicNode>,
{
    let variant = probe.variant();
    let mut type_match: Option<usize> = None;
    for (offset, candidate) in nodes.into_iter().skip(start).enumerate() {
        let index = start + offset;
        if candidate.variant() != variant {
            continue;
        }
        if is_perfect(candidate, probe, equiv) {
            return Some(Match {
                index,
                kind: MatchKind::Perfect,
            });
        }
        if type_match.is_none() {
            type_match = Some(index);
        }
    }
    type_match.map(|index| Match {
        index,
        kind: MatchKind::Type,
    })
}

fn is_perfect(candidate: &PlasmicNode, probe: &PlasmicNode, equiv: &dyn Fn(&str, &str) -> bool) -> bool {
    match (candidate, probe) {
        (PlasmicNode::Text { value: a, .. }, PlasmicNode::Text { value: b, .. }) => a == b,
        (PlasmicNode::StringLit { raw: a }, PlasmicNode::StringLit { raw: b }) => sem_eq(a, b),
        (PlasmicNode::Arg(a), PlasmicNode::Arg(b)) => a.arg_name == b.arg_name,
        // At most one conditional-string call is expected per sibling list.
        (PlasmicNode::CondStrCall { .. }, PlasmicNode::CondStrCall { .. }) => true,
        (PlasmicNode::TagOrComponent(a), PlasmicNode::TagOrComponent(b)) => {
            equiv(&a.jsx.name_in_id, &b.jsx.name_in_id)
        }
        (PlasmicNode::Opaque { raw: a }, PlasmicNode::Opaque { raw: b }) => sem_eq(a, b),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Expr, ExprKind, Span};

    fn text(value: &str) -> PlasmicNode {
        PlasmicNode::Text {
            span: Span::SYNTH,
            value: value.into(),
        }
    }

    fn opaque(src: &str) -> PlasmicNode {
        PlasmicNode::Opaque {
            raw: Expr::synth(ExprKind::Raw(src.into())),
        }
    }

    fn no_equiv(_: &str, _: &str) -> bool {
        false
    }

    #[test]
    fn test_perfect_text_match_preferred_over_type() {
        let nodes = vec![text("a"), text("b")];
        let m = find_match(&nodes, 0, &no_equiv, &text("b")).unwrap();
        assert_eq!(m.index, 1);
        assert_eq!(m.kind, MatchKind::Perfect);
    }

    #[test]
    fn test_type_match_is_first_same_variant() {
        let nodes = vec![opaque("x"), text("a"), text("b")];
        let m = find_match(&nodes, 0, &no_equiv, &text("zzz")).unwrap();
        assert_eq!(m.index, 1);
        assert_eq!(m.kind, MatchKind::Type);
    }

    #[test]
    fn test_start_offset_respected() {
        let nodes = vec![text("a"), text("a")];
        let m = find_match(&nodes, 1, &no_equiv, &text("a")).unwrap();
        assert_eq!(m.index, 1);
    }

    #[test]
    fn test_no_match_for_missing_variant() {
        let nodes = vec![text("a")];
        assert!(find_match(&nodes, 0, &no_equiv, &opaque("x")).is_none());
    }

    #[test]
    fn test_opaque_perfect_by_semantic_text() {
        let nodes = vec![opaque("f(1)  // note"), opaque("g(2)")];
        let m = find_match(&nodes, 0, &no_equiv, &opaque("f(1)")).unwrap();
        assert_eq!(m.index, 0);
        assert_eq!(m.kind, MatchKind::Perfect);
    }
}
