use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from document generation.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// No template artifact available for the requested kind.
    #[error("document template not found: {0}")]
    TemplateMissing(String),

    /// Filesystem error while reading a template.
    #[error("failed to read document template {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Generator produced an empty artifact.
    #[error("generated document is empty: {0}")]
    Empty(String),
}

/// Logical kind of a proof artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    IdentityCard,
    EmploymentRecord,
    TuitionInvoice,
    EnrollmentLetter,
}

impl DocumentKind {
    /// Canonical mime type for this kind.
    pub fn mime_type(&self) -> &'static str {
        match self {
            DocumentKind::IdentityCard => "image/png",
            DocumentKind::EmploymentRecord => "application/pdf",
            DocumentKind::TuitionInvoice => "image/png",
            DocumentKind::EnrollmentLetter => "application/pdf",
        }
    }

    /// File name used in upload manifests.
    pub fn file_name(&self) -> &'static str {
        match self {
            DocumentKind::IdentityCard => "identity_card.png",
            DocumentKind::EmploymentRecord => "employment_record.pdf",
            DocumentKind::TuitionInvoice => "tuition_invoice.png",
            DocumentKind::EnrollmentLetter => "enrollment_letter.pdf",
        }
    }
}

/// A proof artifact ready for upload.
///
/// Order matters: the index of a document in the upload manifest must match
/// the index of the slot the server hands back for it.
#[derive(Debug, Clone)]
pub struct ProofDocument {
    pub kind: DocumentKind,
    pub file_name: String,
    pub mime_type: String,
    pub content: Vec<u8>,
}

impl ProofDocument {
    /// Build a document with the kind's canonical name and mime type.
    pub fn new(kind: DocumentKind, content: Vec<u8>) -> Self {
        Self {
            kind,
            file_name: kind.file_name().to_string(),
            mime_type: kind.mime_type().to_string(),
            content,
        }
    }

    pub fn size_bytes(&self) -> usize {
        self.content.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mime_matches_extension() {
        for kind in [
            DocumentKind::IdentityCard,
            DocumentKind::EmploymentRecord,
            DocumentKind::TuitionInvoice,
            DocumentKind::EnrollmentLetter,
        ] {
            let name = kind.file_name();
            match kind.mime_type() {
                "image/png" => assert!(name.ends_with(".png")),
                "application/pdf" => assert!(name.ends_with(".pdf")),
                other => panic!("unexpected mime type {other}"),
            }
        }
    }

    #[test]
    fn test_proof_document_size() {
        let doc = ProofDocument::new(DocumentKind::IdentityCard, vec![0u8; 42]);
        assert_eq!(doc.size_bytes(), 42);
        assert_eq!(doc.file_name, "identity_card.png");
        assert_eq!(doc.mime_type, "image/png");
    }
}
