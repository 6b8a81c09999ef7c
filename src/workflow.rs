//! Request/response contracts of the remote drafting workflows and a client
//! for them.
//!
//! Four webhooks are involved: document upload with OCR extraction (WF1),
//! testimony analysis (WF3), letter draft generation (WF4a) and submission
//! of the edited draft for lawyer review (WF4b). Field names follow the
//! webhook payloads, which mix camelCase and snake_case.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::blocking::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::dossier::LetterContext;
use crate::error::Error;

pub const DEFAULT_WORKFLOW_BASE_URL: &str = "https://n8n.srv833062.hstgr.cloud";

pub const UPLOAD_ENDPOINT: &str = "/webhook/upload";
pub const VOCAL_ENDPOINT: &str = "/webhook/wf3-vocal";
pub const GENERATE_LETTER_ENDPOINT: &str = "/webhook/generate-letter";
pub const SUBMIT_LETTER_ENDPOINT: &str = "/webhook/submit-letter";

type Section = serde_json::Map<String, serde_json::Value>;

/// Sections of an extracted accident declaration. Their content is defined
/// by the OCR workflow and kept as JSON objects.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedData {
    #[serde(default)]
    pub employeur: Section,
    #[serde(default)]
    pub victime: Section,
    #[serde(default)]
    pub accident: Section,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temoin: Option<Section>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tiers: Option<Section>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interim: Option<Section>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationField {
    pub label: String,
    pub value: Option<String>,
    pub section: String,
    pub field: String,
    pub required: bool,
    pub is_empty: bool,
    pub needs_validation: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionStats {
    pub total_fields: u32,
    pub filled_fields: u32,
    pub completion_rate: f64,
    pub required_fields: u32,
    pub filled_required_fields: u32,
    pub required_completion_rate: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UploadErrorType {
    InvalidDocument,
    MultipleDatDetected,
    InvalidDocumentType,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UploadErrorDetails {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub detected_keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detected_count: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadPayload {
    pub success: bool,
    #[serde(rename = "error_type", default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<UploadErrorType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_details: Option<UploadErrorDetails>,
    #[serde(rename = "fallback_mode", default)]
    pub fallback_mode: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted_data: Option<ExtractedData>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub validation_fields: BTreeMap<String, ValidationField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_stats: Option<CompletionStats>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_step: Option<String>,
}

/// WF1 response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub ok: bool,
    #[serde(rename = "requestId")]
    pub request_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    pub payload: UploadPayload,
}

impl UploadResponse {
    /// Extracted sections, when the document was accepted.
    pub fn extracted(&self) -> Option<&ExtractedData> {
        if self.ok && self.payload.success {
            self.payload.extracted_data.as_ref()
        } else {
            None
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VocalStatus {
    Analyzed,
    /// Transcription succeeded but the analysis did not.
    TranscribedOnly,
    /// Grave case: the customer is redirected to a lawyer.
    GraveCase,
    TextOnly,
    Error,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgumentStrength {
    Fort,
    Moyen,
    Faible,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JuridicalArgument {
    pub category: String,
    pub concern: String,
    pub strength: ArgumentStrength,
}

/// Grounds on which reserves can be raised.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReserveScenario {
    HorsHoraires,
    HorsLieu,
    Tiers,
    Preexistants,
    SansTemoin,
    CirconstancesFloues,
    DelaiDeclaration,
    AbsenceLesionImmediate,
    NonImputable,
}

/// WF3 response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VocalResponse {
    #[serde(default)]
    pub success: bool,
    pub status: VocalStatus,
    #[serde(default)]
    pub is_grave: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcription: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<JuridicalArgument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scenarios: Vec<ReserveScenario>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub grave_keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appointment_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_cents: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_action: Option<String>,
}

/// Sections confirmed by the customer, sent back for drafting.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidatedFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub victime: Option<Section>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accident: Option<Section>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employeur: Option<Section>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temoin: Option<Section>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tiers: Option<Section>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interim: Option<Section>,
}

impl From<&ExtractedData> for ValidatedFields {
    fn from(data: &ExtractedData) -> Self {
        Self {
            victime: Some(data.victime.clone()),
            accident: Some(data.accident.clone()),
            employeur: Some(data.employeur.clone()),
            temoin: data.temoin.clone(),
            tiers: data.tiers.clone(),
            interim: data.interim.clone(),
        }
    }
}

/// WF4a request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LetterRequest {
    pub request_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub customer_email: String,
    pub validated_fields: ValidatedFields,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vocal_data: Option<VocalResponse>,
    pub document_type: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LetterStatus {
    DraftReady,
    Error,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityScores {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forme: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fond: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coherence: Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LetterQuality {
    #[serde(default)]
    pub iterations: u32,
    #[serde(default)]
    pub was_refined: bool,
    #[serde(default)]
    pub scores: QualityScores,
}

/// WF4a response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LetterResponse {
    pub success: bool,
    pub status: LetterStatus,
    #[serde(default)]
    pub letter_text: String,
    #[serde(default)]
    pub scenarios: Vec<ReserveScenario>,
    #[serde(default)]
    pub risk_flags: Vec<String>,
    #[serde(default)]
    pub citations: Vec<String>,
    #[serde(default)]
    pub quality: LetterQuality,
    #[serde(default)]
    pub request_id: String,
    #[serde(default)]
    pub context: LetterContext,
    #[serde(default)]
    pub message: String,
}

/// WF4b request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub request_id: String,
    pub letter_text: String,
    pub customer_email: String,
}

/// WF4b response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_url: Option<String>,
}

/// The remote drafting workflows.
pub trait WorkflowClient {
    /// WF1: OCR extraction of an uploaded declaration (PDF or image).
    fn upload_document(&self, file_name: &str, bytes: Vec<u8>) -> Result<UploadResponse, Error>;

    /// WF3: transcription and analysis of a recorded testimony.
    fn analyze_vocal(&self, audio: Vec<u8>) -> Result<VocalResponse, Error>;

    /// WF4a: draft generation.
    fn generate_letter(&self, request: &LetterRequest) -> Result<LetterResponse, Error>;

    /// WF4b: submission of the edited draft for review.
    fn submit_letter(&self, request: &SubmitRequest) -> Result<SubmitResponse, Error>;
}

/// Calls the workflow webhooks over HTTP: JSON bodies for drafting,
/// multipart forms for file uploads.
pub struct HttpWorkflowClient {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl HttpWorkflowClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, Error> {
        // draft generation can take over a minute
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn url(&self, endpoint: &str) -> String {
        format!("{}{endpoint}", self.base_url)
    }

    fn post_json<Req: Serialize, Resp: DeserializeOwned>(&self, endpoint: &str, body: &Req) -> Result<Resp, Error> {
        let response = self.client.post(self.url(endpoint)).json(body).send()?;
        read_response(response, endpoint)
    }

    fn post_form<Resp: DeserializeOwned>(&self, endpoint: &str, form: Form) -> Result<Resp, Error> {
        let response = self.client.post(self.url(endpoint)).multipart(form).send()?;
        read_response(response, endpoint)
    }
}

fn read_response<Resp: DeserializeOwned>(response: reqwest::blocking::Response, endpoint: &str) -> Result<Resp, Error> {
    let status = response.status();
    if !status.is_success() {
        log::warn!("Workflow {endpoint} returned {status}");
        return Err(Error::Workflow {
            status: status.as_u16(),
            endpoint: endpoint.to_string(),
            message: status.canonical_reason().unwrap_or("error").to_string(),
        });
    }
    response.json::<Resp>().map_err(|e| Error::Workflow {
        status: status.as_u16(),
        endpoint: endpoint.to_string(),
        message: format!("unreadable response: {e}"),
    })
}

fn upload_mime(file_name: &str) -> &'static str {
    let lower = file_name.to_ascii_lowercase();
    if lower.ends_with(".pdf") {
        "application/pdf"
    } else if lower.ends_with(".png") {
        "image/png"
    } else if lower.ends_with(".jpg") || lower.ends_with(".jpeg") {
        "image/jpeg"
    } else {
        "application/octet-stream"
    }
}

impl WorkflowClient for HttpWorkflowClient {
    fn upload_document(&self, file_name: &str, bytes: Vec<u8>) -> Result<UploadResponse, Error> {
        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(upload_mime(file_name))?;
        let response: UploadResponse = self.post_form(UPLOAD_ENDPOINT, Form::new().part("file", part))?;
        log::info!(
            "Uploaded {file_name}: request {} (success={})",
            response.request_id,
            response.payload.success
        );
        Ok(response)
    }

    fn analyze_vocal(&self, audio: Vec<u8>) -> Result<VocalResponse, Error> {
        let part = Part::bytes(audio)
            .file_name("recording.webm")
            .mime_str("audio/webm")?;
        self.post_form(VOCAL_ENDPOINT, Form::new().part("audio", part))
    }

    fn generate_letter(&self, request: &LetterRequest) -> Result<LetterResponse, Error> {
        self.post_json(GENERATE_LETTER_ENDPOINT, request)
    }

    fn submit_letter(&self, request: &SubmitRequest) -> Result<SubmitResponse, Error> {
        self.post_json(SUBMIT_LETTER_ENDPOINT, request)
    }
}
