pub mod admission;
pub mod config;
pub mod document;
pub mod identity;
pub mod ledger;
pub mod metrics;
pub mod poller;
pub mod program;
pub mod protocol;
pub mod testing;

pub use admission::{AdmissionController, AdmissionGate, AdmissionSlot, ResourceProbe, SysinfoProbe};
pub use config::{load_config, load_config_from_str, validate_config, Config, ConfigError};
pub use document::{DocumentError, DocumentGenerator, DocumentKind, FsDocumentGenerator, ProofDocument};
pub use identity::{IdentitySynthesizer, SyntheticIdentity};
pub use ledger::{MemoryLedger, SessionLedger};
pub use poller::ResultPoller;
pub use program::{Program, ProgramDescriptor};
pub use protocol::{
    HttpTransport, StepResponse, VerificationClient, VerificationOutcome, VerificationSession,
    VerificationTransport, VerifyError,
};
