use rand::Rng;
use reqwest::Method;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::ServiceConfig;
use crate::document::ProofDocument;
use crate::identity::SyntheticIdentity;
use crate::metrics;

use super::{
    StepResponse, VerificationOutcome, VerificationSession, VerificationTransport, VerifyError,
};

/// Drives one verification session through the remote step machine.
///
/// The client is cheap to share; the device fingerprint is fixed per instance
/// so all steps of a session present the same device.
pub struct VerificationClient {
    transport: Arc<dyn VerificationTransport>,
    base_url: String,
    status_base_url: String,
    locale: String,
    device_fingerprint: String,
}

impl VerificationClient {
    pub fn new(transport: Arc<dyn VerificationTransport>, config: &ServiceConfig) -> Self {
        Self {
            transport,
            base_url: config.base_url.clone(),
            status_base_url: config.status_base_url.clone(),
            locale: config.locale.clone(),
            device_fingerprint: generate_device_fingerprint(),
        }
    }

    /// Run the full submission flow for one session.
    ///
    /// Never returns an error: every internal failure becomes a
    /// `success = false` outcome so the caller can settle accounting from the
    /// value alone.
    pub async fn execute(
        &self,
        session: &mut VerificationSession,
        identity: &SyntheticIdentity,
        documents: &[ProofDocument],
    ) -> VerificationOutcome {
        let program = session.program;
        match self.run(session, identity, documents).await {
            Ok(outcome) => {
                info!(
                    program = %program,
                    verification_id = %outcome.verification_id,
                    "Verification documents submitted"
                );
                metrics::VERIFICATION_ATTEMPTS
                    .with_label_values(&[program.key(), "submitted"])
                    .inc();
                outcome
            }
            Err(e) => {
                warn!(
                    program = %program,
                    verification_id = %session.verification_id,
                    error = %e,
                    "Verification failed"
                );
                match &e {
                    VerifyError::Protocol { step, .. } => {
                        metrics::STEP_FAILURES.with_label_values(&[step]).inc();
                    }
                    VerifyError::Upload { .. } => metrics::UPLOAD_FAILURES.inc(),
                    _ => {}
                }
                metrics::VERIFICATION_ATTEMPTS
                    .with_label_values(&[program.key(), "failed"])
                    .inc();
                VerificationOutcome::failure(&session.verification_id, e.to_string())
            }
        }
    }

    async fn run(
        &self,
        session: &mut VerificationSession,
        identity: &SyntheticIdentity,
        documents: &[ProofDocument],
    ) -> Result<VerificationOutcome, VerifyError> {
        self.collect_info(session, identity).await?;
        self.skip_sso(session).await?;
        let slots = self.request_upload_slots(session, documents).await?;
        self.upload_documents(documents, &slots).await?;
        let redirect_url = self.finalize(session).await?;
        Ok(VerificationOutcome::pending(
            &session.verification_id,
            redirect_url,
        ))
    }

    /// Query the session's current status. Shared by the poller and manual
    /// code lookup.
    pub async fn fetch_status(&self, verification_id: &str) -> Result<StepResponse, VerifyError> {
        let url = format!("{}/verification/{}", self.status_base_url, verification_id);
        let wire = self.transport.request(Method::GET, &url, None).await?;
        if wire.status != 200 {
            return Err(VerifyError::Protocol {
                step: "status".to_string(),
                detail: format!("HTTP {}", wire.status),
            });
        }
        Ok(StepResponse::from_wire(wire.status, wire.body))
    }

    async fn collect_info(
        &self,
        session: &mut VerificationSession,
        identity: &SyntheticIdentity,
    ) -> Result<(), VerifyError> {
        let descriptor = session.program.descriptor();
        let url = self.step_url(&session.verification_id, descriptor.collect_step);
        let referer_url = format!(
            "{}/verification/{}",
            self.base_url, session.verification_id
        );

        let payload = json!({
            "firstName": identity.first_name,
            "lastName": identity.last_name,
            "birthDate": identity.birth_date,
            "email": identity.email,
            "phoneNumber": "",
            "organization": {
                "id": identity.organization.id,
                "idExtended": identity.organization.id_extended,
                "name": identity.organization.name,
            },
            "deviceFingerprintHash": self.device_fingerprint,
            "locale": self.locale,
            "metadata": {
                "marketConsentValue": false,
                "refererUrl": referer_url,
                "verificationId": session.verification_id,
                "submissionOptIn": descriptor.consent_text(),
            },
        });

        let response = self.post_step(&url, &payload, descriptor.collect_step).await?;
        if response.is_error() {
            return Err(VerifyError::Protocol {
                step: descriptor.collect_step.to_string(),
                detail: response.joined_errors(),
            });
        }
        session.advance(&response.current_step);
        debug!(current_step = %session.current_step, "Personal info accepted");
        Ok(())
    }

    /// Some programs insert an SSO step after info collection; it can be
    /// dismissed. A session sitting on the collect step after a successful
    /// submission means the same thing, so both trigger the dismissal.
    async fn skip_sso(&self, session: &mut VerificationSession) -> Result<(), VerifyError> {
        let collect_step = session.program.descriptor().collect_step;
        if session.current_step != "sso" && session.current_step != collect_step {
            return Ok(());
        }

        let url = self.step_url(&session.verification_id, "sso");
        let wire = self.transport.request(Method::DELETE, &url, None).await?;
        let response = StepResponse::from_wire(wire.status, wire.body);
        if wire.status != 200 || response.is_error() {
            return Err(VerifyError::Protocol {
                step: "sso".to_string(),
                detail: if wire.status != 200 {
                    format!("HTTP {}", wire.status)
                } else {
                    response.joined_errors()
                },
            });
        }
        session.advance(&response.current_step);
        debug!(current_step = %session.current_step, "SSO step dismissed");
        Ok(())
    }

    async fn request_upload_slots(
        &self,
        session: &mut VerificationSession,
        documents: &[ProofDocument],
    ) -> Result<Vec<String>, VerifyError> {
        let files: Vec<Value> = documents
            .iter()
            .map(|doc| {
                json!({
                    "fileName": doc.file_name,
                    "mimeType": doc.mime_type,
                    "fileSize": doc.size_bytes(),
                })
            })
            .collect();

        let url = self.step_url(&session.verification_id, "docUpload");
        let response = self
            .post_step(&url, &json!({ "files": files }), "docUpload")
            .await?;
        if response.is_error() {
            return Err(VerifyError::Protocol {
                step: "docUpload".to_string(),
                detail: response.joined_errors(),
            });
        }
        if response.upload_slots.len() < documents.len() {
            return Err(VerifyError::Protocol {
                step: "docUpload".to_string(),
                detail: "failed to obtain upload URL(s)".to_string(),
            });
        }
        session.advance(&response.current_step);
        Ok(response.upload_slots)
    }

    async fn upload_documents(
        &self,
        documents: &[ProofDocument],
        slots: &[String],
    ) -> Result<(), VerifyError> {
        // Slot order matches the manifest order from request_upload_slots.
        for (doc, slot) in documents.iter().zip(slots) {
            match self.transport.upload(slot, &doc.content, &doc.mime_type).await {
                Ok(status) if (200..300).contains(&status) => {
                    debug!(file = %doc.file_name, status, "Document uploaded");
                }
                Ok(status) => {
                    return Err(VerifyError::Upload {
                        file_name: doc.file_name.clone(),
                        detail: format!("HTTP {status}"),
                    });
                }
                Err(e) => {
                    return Err(VerifyError::Upload {
                        file_name: doc.file_name.clone(),
                        detail: e.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Tell the remote all uploads are in. The review verdict arrives later
    /// through polling, so the response body is only mined for a redirect.
    async fn finalize(
        &self,
        session: &mut VerificationSession,
    ) -> Result<Option<String>, VerifyError> {
        let url = self.step_url(&session.verification_id, "completeDocUpload");
        let response = self
            .post_step(&url, &json!({}), "completeDocUpload")
            .await?;
        session.advance(&response.current_step);
        Ok(response.redirect_url)
    }

    async fn post_step(
        &self,
        url: &str,
        payload: &Value,
        step: &str,
    ) -> Result<StepResponse, VerifyError> {
        let wire = self
            .transport
            .request(Method::POST, url, Some(payload))
            .await?;
        if wire.status != 200 {
            return Err(VerifyError::Protocol {
                step: step.to_string(),
                detail: format!("HTTP {}", wire.status),
            });
        }
        Ok(StepResponse::from_wire(wire.status, wire.body))
    }

    fn step_url(&self, verification_id: &str, step: &str) -> String {
        format!(
            "{}/verification/{}/step/{}",
            self.base_url, verification_id, step
        )
    }
}

/// 32 lowercase hex characters, high-entropy but not cryptographic.
fn generate_device_fingerprint() -> String {
    let mut rng = rand::thread_rng();
    (0..32)
        .map(|_| {
            let n: u8 = rng.gen_range(0..16);
            char::from_digit(n as u32, 16).unwrap_or('0')
        })
        .collect()
}
