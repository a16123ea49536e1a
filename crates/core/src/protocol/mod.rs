//! Client for the remote multi-step verification workflow.
//!
//! The remote service models a verification as a server-driven state machine:
//! every step submission returns the step the session is now in, and the
//! client follows along. `VerificationClient::execute` drives one session from
//! personal-info submission through document upload; `ResultPoller` (in the
//! `poller` module) watches for the terminal outcome afterwards.

mod client;
mod transport;
mod types;
pub mod url;

pub use client::VerificationClient;
pub use transport::{HttpTransport, VerificationTransport, WireResponse};
pub use types::{StepResponse, VerificationOutcome, VerificationSession, VerifyError};
