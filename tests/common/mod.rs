//! Shared fixture harness for end-to-end merge tests.

use std::collections::BTreeMap;

use async_trait::async_trait;
use plasmic_merge::{
    merge_files, BaseProvider, ComponentInput, ComponentSkeleton, ProjectSyncMetadata,
};

pub struct StaticProvider(pub ProjectSyncMetadata);

#[async_trait]
impl BaseProvider for StaticProvider {
    async fn project_sync_metadata(
        &self,
        _project_id: &str,
        _revision: u64,
    ) -> anyhow::Result<ProjectSyncMetadata> {
        Ok(self.0.clone())
    }
}

pub fn uuid_map(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
    entries
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect()
}

/// A minimal component file in printer-normal form.
pub fn component_file(imports: &str, markup: &str, revision: u64) -> String {
    format!(
        "{imports}// plasmic-managed-start\nconst helpers = initHelpers();\n// plasmic-managed-end\n\
         function Comp(rh: Helpers) {{\n  return /* plasmic-managed-jsx/{revision} */ {markup};\n}}\n"
    )
}

pub struct Scenario<'a> {
    pub new_markup: &'a str,
    pub edited_markup: &'a str,
    pub base_markup: &'a str,
    pub new_uuids: &'a [(&'a str, &'a str)],
    pub base_uuids: &'a [(&'a str, &'a str)],
    pub new_imports: &'a str,
    pub edited_imports: &'a str,
}

impl<'a> Scenario<'a> {
    pub fn markup_only(
        new: &'a str,
        edited: &'a str,
        base: &'a str,
        uuids: &'a [(&'a str, &'a str)],
    ) -> Self {
        Scenario {
            new_markup: new,
            edited_markup: edited,
            base_markup: base,
            new_uuids: uuids,
            base_uuids: uuids,
            new_imports: "",
            edited_imports: "",
        }
    }

    pub async fn run(&self) -> String {
        let provider = StaticProvider(ProjectSyncMetadata {
            project_id: "p1".into(),
            revision: 1,
            components: vec![ComponentSkeleton {
                uuid: "c1".into(),
                name_in_id_to_uuid: uuid_map(self.base_uuids),
                file_content: component_file(self.edited_imports, self.base_markup, 1),
            }],
        });
        let mut components = BTreeMap::new();
        components.insert(
            "c1".to_owned(),
            ComponentInput {
                edited_file: component_file(self.edited_imports, self.edited_markup, 1),
                new_file: component_file(self.new_imports, self.new_markup, 2),
                new_name_in_id_to_uuid: uuid_map(self.new_uuids),
            },
        );
        let out = merge_files(&components, "p1", &provider).await.unwrap();
        out["c1"].clone()
    }
}
