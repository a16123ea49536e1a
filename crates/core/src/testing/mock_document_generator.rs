use async_trait::async_trait;

use crate::document::{DocumentError, DocumentGenerator, ProofDocument};
use crate::identity::SyntheticIdentity;
use crate::program::ProgramDescriptor;

/// Returns fixed in-memory bytes for every document kind the descriptor asks
/// for, in descriptor order.
#[derive(Default)]
pub struct MockDocumentGenerator;

impl MockDocumentGenerator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DocumentGenerator for MockDocumentGenerator {
    async fn generate(
        &self,
        descriptor: &ProgramDescriptor,
        _identity: &SyntheticIdentity,
    ) -> Result<Vec<ProofDocument>, DocumentError> {
        Ok(descriptor
            .document_kinds
            .iter()
            .map(|kind| ProofDocument::new(*kind, vec![0u8; 1024]))
            .collect())
    }
}
