//! Engine entry point.
//!
//! `merge_files` drives the whole pipeline for a batch of components:
//! parse the three versions, classify and index them, serialize the merged
//! markup, and assemble the output file. Components whose edited file
//! carries no managed marker are skipped silently, per the sync contract.
//! The only suspension point is the base-metadata provider; everything
//! else is pure in-memory computation, deterministic for fixed inputs.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::assembler::{assemble, IdentityFormatter, SourceFormatter};
use crate::error::{MergeError, MergeResult};
use crate::parser::{SourceParser, TsxParser};
use crate::serializer::Serializer;
use crate::version::{CodeVersion, VersionRole};

/// Per-component merge input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentInput {
    pub edited_file: String,
    pub new_file: String,
    pub new_name_in_id_to_uuid: BTreeMap<String, String>,
}

/// The generated state of one component at a given revision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentSkeleton {
    pub uuid: String,
    pub name_in_id_to_uuid: BTreeMap<String, String>,
    pub file_content: String,
}

/// Base metadata for a project at a revision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectSyncMetadata {
    pub project_id: String,
    pub revision: u64,
    pub components: Vec<ComponentSkeleton>,
}

/// Fetches the base metadata for `(project_id, revision)`. This is the
/// engine's only async boundary.
#[async_trait]
pub trait BaseProvider: Send + Sync {
    async fn project_sync_metadata(
        &self,
        project_id: &str,
        revision: u64,
    ) -> anyhow::Result<ProjectSyncMetadata>;
}

/// Memoizes provider results by `(project_id, revision)`. Revisions are
/// immutable, so entries are never invalidated.
pub struct CachingBaseProvider<P> {
    inner: P,
    cache: Mutex<HashMap<(String, u64), ProjectSyncMetadata>>,
}

impl<P> CachingBaseProvider<P> {
    pub fn new(inner: P) -> Self {
        CachingBaseProvider {
            inner,
            cache: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl<P: BaseProvider> BaseProvider for CachingBaseProvider<P> {
    async fn project_sync_metadata(
        &self,
        project_id: &str,
        revision: u64,
    ) -> anyhow::Result<ProjectSyncMetadata> {
        let key = (project_id.to_owned(), revision);
        if let Some(hit) = self.cache.lock().expect("cache lock poisoned").get(&key) {
            return Ok(hit.clone());
        }
        let fetched = self.inner.project_sync_metadata(project_id, revision).await?;
        self.cache
            .lock()
            .expect("cache lock poisoned")
            .insert(key, fetched.clone());
        Ok(fetched)
    }
}

/// The merge engine, parameterized over its parser and formatter
/// collaborators.
pub struct Merger {
    parser: Box<dyn SourceParser + Send + Sync>,
    formatter: Box<dyn SourceFormatter + Send + Sync>,
}

impl Default for Merger {
    fn default() -> Self {
        Self::new()
    }
}

impl Merger {
    pub fn new() -> Self {
        Merger {
            parser: Box::new(TsxParser::new()),
            formatter: Box::new(IdentityFormatter),
        }
    }

    pub fn with_formatter(
        mut self,
        formatter: impl SourceFormatter + Send + Sync + 'static,
    ) -> Self {
        self.formatter = Box::new(formatter);
        self
    }

    /// Merge every component in the batch, returning `uuid → merged text`.
    ///
    /// Components whose edited file carries no managed marker produce no
    /// entry. Each component is processed sequentially; failures abort the
    /// whole merge.
    pub async fn merge_files(
        &self,
        component_by_uuid: &BTreeMap<String, ComponentInput>,
        project_id: &str,
        base_provider: &dyn BaseProvider,
    ) -> MergeResult<BTreeMap<String, String>> {
        let mut out = BTreeMap::new();
        for (uuid, input) in component_by_uuid {
            let edited_file = self.parser.parse_file(&input.edited_file, "edited")?;
            let Some(edited_markup) = edited_file.markup.as_ref() else {
                tracing::debug!(uuid = uuid.as_str(), "no managed marker in edited file; skipping");
                continue;
            };
            let base_revision = edited_markup.revision;

            let new_file = self.parser.parse_file(&input.new_file, "new")?;
            if new_file.markup.is_none() {
                return Err(MergeError::MissingManagedMarker {
                    file: "new".to_owned(),
                });
            }

            let metadata = base_provider
                .project_sync_metadata(project_id, base_revision)
                .await?;
            let skeleton = metadata
                .components
                .iter()
                .find(|c| &c.uuid == uuid)
                .ok_or_else(|| MergeError::MissingBaseMetadata {
                    uuid: uuid.clone(),
                    revision: base_revision,
                })?;
            let base_file = self.parser.parse_file(&skeleton.file_content, "base")?;

            // The helper object name is a per-project constant; the edited
            // file's discovery is canonical.
            let helper = edited_file
                .helper
                .clone()
                .or_else(|| new_file.helper.clone())
                .unwrap_or_else(|| "rh".to_owned());

            let new_v = CodeVersion::build(
                VersionRole::New,
                new_file,
                helper.clone(),
                input.new_name_in_id_to_uuid.clone(),
            )?;
            let edited_v = CodeVersion::build(
                VersionRole::Edited,
                edited_file,
                helper.clone(),
                skeleton.name_in_id_to_uuid.clone(),
            )?;
            let base_v = CodeVersion::build(
                VersionRole::Base,
                base_file,
                helper,
                skeleton.name_in_id_to_uuid.clone(),
            )?;

            let serializer = Serializer::new(&new_v, &edited_v, &base_v);
            let merged_markup = serializer.serialize_root()?;
            let output = assemble(uuid, &edited_v, &new_v, &merged_markup, self.formatter.as_ref())?;
            tracing::debug!(uuid = uuid.as_str(), revision = new_v.revision, "component merged");
            out.insert(uuid.clone(), output);
        }
        Ok(out)
    }
}

/// Convenience wrapper using the default parser and formatter.
pub async fn merge_files(
    component_by_uuid: &BTreeMap<String, ComponentInput>,
    project_id: &str,
    base_provider: &dyn BaseProvider,
) -> MergeResult<BTreeMap<String, String>> {
    Merger::new()
        .merge_files(component_by_uuid, project_id, base_provider)
        .await
}
