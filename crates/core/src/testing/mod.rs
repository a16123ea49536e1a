//! Shared test doubles for the transport, document, and resource seams.

mod mock_document_generator;
mod mock_probe;
mod mock_transport;

pub use mock_document_generator::MockDocumentGenerator;
pub use mock_probe::MockProbe;
pub use mock_transport::{MockTransport, RecordedRequest, RecordedUpload};
