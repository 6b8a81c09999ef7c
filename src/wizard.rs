//! Client wizard state carried between steps (upload → analyse → draft →
//! payment). The context is stored as JSON by the host; a missing or
//! unreadable context sends the customer back to the first step.

use serde::{Deserialize, Serialize};

use crate::workflow::{LetterRequest, LetterResponse, SubmitRequest, UploadResponse, ValidatedFields, VocalResponse};

/// Document type sent for drafting when extraction did not report one.
pub const DEFAULT_DOCUMENT_TYPE: &str = "AT";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    Upload,
    Analyse,
    Draft,
    Payment,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    pub request_id: String,
    pub letter_text: String,
    pub customer_email: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WizardContext {
    #[serde(default)]
    pub extraction: Option<UploadResponse>,
    #[serde(default)]
    pub vocal: Option<VocalResponse>,
    #[serde(default)]
    pub user_notes: Option<String>,
    #[serde(default)]
    pub draft: Option<Draft>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Resume {
    Continue(WizardContext),
    Restart,
}

/// Where the customer goes once the testimony has been analysed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AfterAnalysis {
    Draft,
    /// Grave cases skip drafting and book a lawyer consultation.
    GraveConsultation,
}

impl WizardContext {
    fn has_extraction(&self) -> bool {
        self.extraction
            .as_ref()
            .is_some_and(|e| !e.request_id.is_empty() && e.extracted().is_some())
    }

    fn is_grave(&self) -> bool {
        self.vocal.as_ref().is_some_and(|v| v.is_grave)
    }

    /// Whether this context holds everything `step` reads.
    pub fn satisfies(&self, step: WizardStep) -> bool {
        match step {
            WizardStep::Upload => true,
            WizardStep::Analyse | WizardStep::Draft => self.has_extraction(),
            WizardStep::Payment => {
                self.has_extraction() && (self.is_grave() || self.draft.is_some())
            }
        }
    }

    /// Restore the stored context for `step`, or ask for a restart.
    pub fn restore(raw: Option<&str>, step: WizardStep) -> Resume {
        let Some(raw) = raw.filter(|s| !s.trim().is_empty()) else {
            if step == WizardStep::Upload {
                return Resume::Continue(WizardContext::default());
            }
            log::debug!("No wizard context stored for {step:?}, restarting");
            return Resume::Restart;
        };

        match serde_json::from_str::<WizardContext>(raw) {
            Ok(ctx) if ctx.satisfies(step) => Resume::Continue(ctx),
            Ok(_) => {
                log::warn!("Wizard context incomplete for {step:?}, restarting");
                Resume::Restart
            }
            Err(e) if step == WizardStep::Upload => {
                log::warn!("Discarding unreadable wizard context: {e}");
                Resume::Continue(WizardContext::default())
            }
            Err(e) => {
                log::warn!("Unreadable wizard context for {step:?}, restarting: {e}");
                Resume::Restart
            }
        }
    }

    pub fn after_analysis(&self) -> AfterAnalysis {
        if self.is_grave() {
            AfterAnalysis::GraveConsultation
        } else {
            AfterAnalysis::Draft
        }
    }

    /// Draft generation request built from the extraction and the analysed
    /// testimony. `None` until an extraction has been accepted.
    pub fn letter_request(&self, customer_email: &str) -> Option<LetterRequest> {
        let upload = self.extraction.as_ref()?;
        let extracted = upload.extracted()?;
        Some(LetterRequest {
            request_id: upload.request_id.clone(),
            user_id: None,
            customer_email: customer_email.to_string(),
            validated_fields: ValidatedFields::from(extracted),
            vocal_data: self.vocal.clone(),
            document_type: upload
                .payload
                .document_type
                .clone()
                .unwrap_or_else(|| DEFAULT_DOCUMENT_TYPE.to_string()),
        })
    }

    /// Keep a generated draft. Failed generations leave the context untouched.
    pub fn record_draft(&mut self, response: &LetterResponse, customer_email: &str) -> bool {
        if !response.success || response.letter_text.trim().is_empty() {
            log::warn!("Draft generation failed: {}", response.message);
            return false;
        }
        let request_id = if response.request_id.is_empty() {
            self.extraction
                .as_ref()
                .map(|e| e.request_id.clone())
                .unwrap_or_default()
        } else {
            response.request_id.clone()
        };
        self.draft = Some(Draft {
            request_id,
            letter_text: response.letter_text.clone(),
            customer_email: customer_email.to_string(),
        });
        true
    }

    /// Submission of the (possibly edited) draft for lawyer review.
    pub fn submit_request(&self) -> Option<SubmitRequest> {
        self.draft.as_ref().map(|d| SubmitRequest {
            request_id: d.request_id.clone(),
            letter_text: d.letter_text.clone(),
            customer_email: d.customer_email.clone(),
        })
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
