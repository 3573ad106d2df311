//! Per-version record: the parsed file, its classified tree, and the
//! identity maps that let the merge pair nodes across versions.
//!
//! Identity is two-layered. The `nameInId` embedded in the generated helper
//! calls pairs nodes directly; when the tool renamed a node between
//! versions, the `nameInId → uuid` map resolves the pairing instead. Two
//! nodes from versions A and B correspond iff their names are equal or
//! their uuids are equal, and uuid equality is only defined when both
//! versions carry an entry.

use std::collections::BTreeMap;

use crate::ast::Span;
use crate::error::{MergeError, MergeResult};
use crate::node::{classify_expr, for_each_tag, PlasmicNode, PlasmicTagOrComponent};
use crate::parser::ParsedFile;

/// One of the three versions participating in the merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionRole {
    New,
    Edited,
    Base,
}

impl VersionRole {
    fn label(&self) -> &'static str {
        match self {
            VersionRole::New => "new",
            VersionRole::Edited => "edited",
            VersionRole::Base => "base",
        }
    }
}

/// A parsed, classified, identity-indexed version of the component file.
#[derive(Debug, Clone)]
pub struct CodeVersion {
    pub role: VersionRole,
    pub file: ParsedFile,
    pub helper: String,
    pub revision: u64,
    /// Span of the managed markup expression in `file.source`.
    pub markup_span: Span,
    /// Span of the `plasmic-managed-jsx` marker comment.
    pub marker_span: Span,
    pub root: PlasmicNode,
    pub name_in_id_to_uuid: BTreeMap<String, String>,
}

impl CodeVersion {
    /// Build a version record from a parsed file that carries a managed
    /// markup expression.
    ///
    /// Tool-generated versions (`New`, `Base`) must map every `nameInId`
    /// found in the markup; a missing entry is an upstream bug. The edited
    /// version is only warned about, since developers may paste managed
    /// markup from elsewhere.
    pub fn build(
        role: VersionRole,
        file: ParsedFile,
        helper: String,
        name_in_id_to_uuid: BTreeMap<String, String>,
    ) -> MergeResult<CodeVersion> {
        let markup = file
            .markup
            .as_ref()
            .ok_or_else(|| MergeError::MissingManagedMarker {
                file: role.label().to_owned(),
            })?;
        let revision = markup.revision;
        let markup_span = markup.span;
        let marker_span = markup.marker_span;
        let root = classify_expr(&markup.expr, &helper)?;

        let mut names: Vec<String> = Vec::new();
        for_each_tag(&root, &mut |t| names.push(t.jsx.name_in_id.clone()));
        for name in &names {
            if !name_in_id_to_uuid.contains_key(name) {
                if matches!(role, VersionRole::New | VersionRole::Base) {
                    return Err(MergeError::InvariantViolation(format!(
                        "{} version has no uuid for nameInId {name}",
                        role.label()
                    )));
                }
                tracing::warn!(name_in_id = %name, "edited markup references an unmapped nameInId");
            }
        }

        Ok(CodeVersion {
            role,
            file,
            helper,
            revision,
            markup_span,
            marker_span,
            root,
            name_in_id_to_uuid,
        })
    }

    pub fn uuid(&self, name_in_id: &str) -> Option<&str> {
        self.name_in_id_to_uuid.get(name_in_id).map(String::as_str)
    }

    /// Find the tag-or-component with the given `nameInId`. First
    /// occurrence wins if the developer duplicated managed markup.
    pub fn find_by_name_in_id(&self, name_in_id: &str) -> Option<&PlasmicTagOrComponent> {
        let mut found: Option<&PlasmicTagOrComponent> = None;
        for_each_tag(&self.root, &mut |t| {
            if found.is_none() && t.jsx.name_in_id == name_in_id {
                found = Some(t);
            }
        });
        found
    }

    /// Find this version's node corresponding to `name_in_id` as spelled in
    /// the `from` version, falling back to uuid identity for renamed nodes.
    pub fn find_matching(
        &self,
        from: &CodeVersion,
        name_in_id: &str,
    ) -> Option<&PlasmicTagOrComponent> {
        if let Some(t) = self.find_by_name_in_id(name_in_id) {
            return Some(t);
        }
        let uuid = from.uuid(name_in_id)?;
        let local = self
            .name_in_id_to_uuid
            .iter()
            .find(|(_, u)| u.as_str() == uuid)
            .map(|(n, _)| n.clone())?;
        self.find_by_name_in_id(&local)
    }

    /// Identity predicate between this version's names (candidates) and the
    /// `probe` version's names.
    pub fn equiv<'a>(&'a self, probe: &'a CodeVersion) -> impl Fn(&str, &str) -> bool + 'a {
        move |candidate, probed| {
            if candidate == probed {
                return true;
            }
            match (self.uuid(candidate), probe.uuid(probed)) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            }
        }
    }

    pub fn has_class_name_id_attr(&self, t: &PlasmicTagOrComponent) -> bool {
        t.jsx.shape == crate::node::ManagedShape::ClassAttr
    }

    pub fn has_props_id_spreador(&self, t: &PlasmicTagOrComponent) -> bool {
        t.jsx.shape == crate::node::ManagedShape::PropsSpread
    }

    pub fn has_show_func_call(&self, t: &PlasmicTagOrComponent) -> bool {
        t.jsx.has_show
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{SourceParser, TsxParser};

    fn version(role: VersionRole, source: &str, uuids: &[(&str, &str)]) -> MergeResult<CodeVersion> {
        let parser = TsxParser::new();
        let file = parser.parse_file(source, role.label()).unwrap();
        let helper = file.helper.clone().unwrap_or_else(|| "rh".to_owned());
        let map = uuids
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        CodeVersion::build(role, file, helper, map)
    }

    const SIMPLE: &str = r#"
const x = /* plasmic-managed-jsx/2 */ <div className={rh.clsRoot()}>hi</div>;
"#;

    #[test]
    fn test_build_and_lookup() {
        let v = version(VersionRole::New, SIMPLE, &[("Root", "u1")]).unwrap();
        assert_eq!(v.revision, 2);
        assert!(v.find_by_name_in_id("Root").is_some());
        assert!(v.find_by_name_in_id("Other").is_none());
        assert_eq!(v.uuid("Root"), Some("u1"));
    }

    #[test]
    fn test_strict_version_requires_uuid_entry() {
        let err = version(VersionRole::New, SIMPLE, &[]).unwrap_err();
        assert!(matches!(err, MergeError::InvariantViolation(_)));
        // The edited version tolerates the gap.
        assert!(version(VersionRole::Edited, SIMPLE, &[]).is_ok());
    }

    #[test]
    fn test_find_matching_by_uuid_rename() {
        let old = version(VersionRole::Edited, SIMPLE, &[("Root", "u1")]).unwrap();
        let renamed = r#"
const x = /* plasmic-managed-jsx/3 */ <div className={rh.clsRoot2()}>hi</div>;
"#;
        let newer = version(VersionRole::New, renamed, &[("Root2", "u1")]).unwrap();
        let found = old.find_matching(&newer, "Root2").unwrap();
        assert_eq!(found.jsx.name_in_id, "Root");
    }

    #[test]
    fn test_equiv_uses_both_maps() {
        let a = version(VersionRole::Edited, SIMPLE, &[("Root", "u1")]).unwrap();
        let renamed = r#"
const x = /* plasmic-managed-jsx/3 */ <div className={rh.clsRoot2()}>hi</div>;
"#;
        let b = version(VersionRole::New, renamed, &[("Root2", "u1")]).unwrap();
        let eq = a.equiv(&b);
        assert!(eq("Root", "Root2"));
        assert!(!eq("Root", "Missing"));
    }
}
