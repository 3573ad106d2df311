//! Error types for the merge engine.
//!
//! Everything listed here is fatal for the component being merged: the
//! engine has no meaningful partial result once one of these fires.
//! Contested edits are not errors — they are resolved by the attribute
//! conflict table or emitted side by side for the compiler to surface.

use thiserror::Error;

/// Errors that abort the merge of a component.
#[derive(Debug, Error)]
pub enum MergeError {
    /// One of the three input files failed to parse.
    #[error("parse failed for {file}: {message}")]
    Parse { file: String, message: String },

    /// The new (generated) file carries no `plasmic-managed-jsx` marker.
    /// An un-markered *edited* file merely skips the component; an
    /// un-markered generated file is an upstream bug.
    #[error("no managed markup marker in {file}")]
    MissingManagedMarker { file: String },

    /// The base metadata for the component's synced revision could not be
    /// found in the project sync metadata.
    #[error("no base metadata for component {uuid} at revision {revision}")]
    MissingBaseMetadata { uuid: String, revision: u64 },

    /// The new file lacks the `plasmic-managed-start` / `plasmic-managed-end`
    /// region markers.
    #[error("new file for component {uuid} has no managed region markers")]
    MissingManagedRegion { uuid: String },

    /// A structural invariant of generated code does not hold. Indicates an
    /// upstream bug and must not be recovered silently.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// The injected base-metadata provider failed.
    #[error("base provider error: {0}")]
    Provider(#[from] anyhow::Error),

    /// The injected source formatter failed on the assembled output.
    #[error("formatter error: {0}")]
    Format(#[source] anyhow::Error),
}

pub type MergeResult<T> = Result<T, MergeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MergeError::MissingBaseMetadata {
            uuid: "abc".into(),
            revision: 42,
        };
        assert_eq!(
            err.to_string(),
            "no base metadata for component abc at revision 42"
        );
    }

    #[test]
    fn test_provider_error_from_anyhow() {
        let err: MergeError = anyhow::anyhow!("network down").into();
        assert!(matches!(err, MergeError::Provider(_)));
    }
}
