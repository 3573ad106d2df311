//! # plasmic-merge
//!
//! A three-way structural merge engine for tool-generated JSX component
//! files. A design tool periodically regenerates a component's source from
//! its canonical model while developers edit the generated file on disk;
//! this crate merges the *base* generated version (last synced), the
//! *edited* working copy, and the freshly generated *new* version into one
//! file that keeps every developer edit and absorbs every tool-side
//! change, without line-based conflicts.
//!
//! ## Pipeline
//!
//! 1. **Parse** — each version is lowered to a typed tree covering exactly
//!    the syntax the merge must inspect; everything else stays opaque
//!    ([`parser`]).
//! 2. **Classify & index** — nodes are classified into a closed set of
//!    variants and indexed by the stable `nameInId` the tool embeds in its
//!    helper calls; a `nameInId → uuid` map carries identity across
//!    renames ([`node`], [`version`]).
//! 3. **Serialize** — the new tree is walked node by node, pairing each
//!    managed element with its counterparts and emitting either the new
//!    node verbatim, nothing (developer deletion), or a merged hybrid of
//!    reconciled attributes, children, and visibility gate ([`serializer`],
//!    [`attrs`], [`children`], [`visibility`]).
//! 4. **Assemble** — the merged markup is substituted into a clone of the
//!    edited file, managed imports are unioned, the revision marker is
//!    bumped, and the verbatim managed region is copied from the new file
//!    ([`imports`], [`assembler`]).
//!
//! Conflicting attribute edits are resolved by a deterministic table;
//! truly contested values are emitted side by side so the conflict
//! surfaces as a compile error instead of a merge prompt.
//!
//! ## Example
//!
//! ```no_run
//! use std::collections::BTreeMap;
//! use plasmic_merge::{merge_files, BaseProvider, ComponentInput};
//!
//! async fn run(provider: &dyn BaseProvider) -> anyhow::Result<()> {
//!     let mut components = BTreeMap::new();
//!     components.insert("component-uuid".to_owned(), ComponentInput {
//!         edited_file: std::fs::read_to_string("Button.tsx")?,
//!         new_file: fetch_generated_button(),
//!         new_name_in_id_to_uuid: BTreeMap::new(),
//!     });
//!     let merged = merge_files(&components, "project-id", provider).await?;
//!     for (uuid, text) in merged {
//!         println!("merged {uuid}: {} bytes", text.len());
//!     }
//!     Ok(())
//! }
//! # fn fetch_generated_button() -> String { String::new() }
//! ```

pub mod assembler;
pub mod ast;
pub mod attrs;
pub mod children;
pub mod engine;
pub mod error;
pub mod imports;
pub mod matcher;
pub mod node;
pub mod parser;
pub mod printer;
pub mod rewrite;
pub mod serializer;
pub mod version;
pub mod visibility;

// Re-export primary public API
pub use assembler::{IdentityFormatter, SourceFormatter};
pub use engine::{
    merge_files, BaseProvider, CachingBaseProvider, ComponentInput, ComponentSkeleton, Merger,
    ProjectSyncMetadata,
};
pub use error::{MergeError, MergeResult};
pub use parser::{ParsedFile, SourceParser, TsxParser};
pub use serializer::Serializer;
pub use version::{CodeVersion, VersionRole};
