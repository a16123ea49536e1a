use async_trait::async_trait;

use crate::identity::SyntheticIdentity;
use crate::program::ProgramDescriptor;

use super::{DocumentError, ProofDocument};

/// Produces the proof artifacts for one verification session.
///
/// Implementations must return documents in the descriptor's declared order.
#[async_trait]
pub trait DocumentGenerator: Send + Sync {
    async fn generate(
        &self,
        descriptor: &ProgramDescriptor,
        identity: &SyntheticIdentity,
    ) -> Result<Vec<ProofDocument>, DocumentError>;
}
