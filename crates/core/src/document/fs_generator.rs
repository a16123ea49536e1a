//! Filesystem-backed document generator.

use async_trait::async_trait;
use std::path::PathBuf;
use tracing::debug;

use crate::identity::SyntheticIdentity;
use crate::program::ProgramDescriptor;

use super::{DocumentError, DocumentGenerator, ProofDocument};

/// Reads operator-supplied proof artifacts from a template directory.
///
/// Layout: `<root>/<program_key>/<kind_file_name>`, e.g.
/// `documents/k12_teacher/employment_record.pdf`.
pub struct FsDocumentGenerator {
    root: PathBuf,
}

impl FsDocumentGenerator {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl DocumentGenerator for FsDocumentGenerator {
    async fn generate(
        &self,
        descriptor: &ProgramDescriptor,
        _identity: &SyntheticIdentity,
    ) -> Result<Vec<ProofDocument>, DocumentError> {
        let mut documents = Vec::with_capacity(descriptor.document_kinds.len());

        for kind in descriptor.document_kinds {
            let path = self
                .root
                .join(descriptor.program.key())
                .join(kind.file_name());

            if !path.exists() {
                return Err(DocumentError::TemplateMissing(path.display().to_string()));
            }

            let content = tokio::fs::read(&path).await.map_err(|e| DocumentError::Io {
                path: path.display().to_string(),
                source: e,
            })?;

            if content.is_empty() {
                return Err(DocumentError::Empty(path.display().to_string()));
            }

            debug!(
                kind = ?kind,
                size = content.len(),
                "Loaded document template"
            );
            documents.push(ProofDocument::new(*kind, content));
        }

        Ok(documents)
    }
}
