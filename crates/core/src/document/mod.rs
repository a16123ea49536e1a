//! Proof document types and the generator seam.
//!
//! Rendering real artifacts (HTML-to-image, PDF layout) is out of scope for
//! the core; the `DocumentGenerator` trait treats it as an opaque capability
//! that returns bytes plus a mime type for a logical document kind.

mod fs_generator;
mod traits;
mod types;

pub use fs_generator::FsDocumentGenerator;
pub use traits::DocumentGenerator;
pub use types::{DocumentError, DocumentKind, ProofDocument};
