use std::path::PathBuf;

use crate::error::Error;
use crate::fonts::LetterFont;
use crate::mail::{DEFAULT_FROM, ResendMailer};
use crate::model::PageGeometry;
use crate::signature::{HttpSignature, source_for_url};
use crate::workflow::{DEFAULT_WORKFLOW_BASE_URL, HttpWorkflowClient};

pub const DEFAULT_RESEND_ENDPOINT: &str = "https://api.resend.com/emails";

/// Deployment settings. Geometry is fixed and never read from the environment.
#[derive(Clone, Debug, Default)]
pub struct Settings {
    pub signature_url: Option<String>,
    pub letter_font: Option<PathBuf>,
    pub resend_api_key: Option<String>,
    pub resend_endpoint: Option<String>,
    pub mail_from: Option<String>,
    pub workflow_base_url: Option<String>,
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Settings {
    /// Reads `SIGNATURE_URL`, `LETTER_FONT`, `RESEND_API_KEY`,
    /// `RESEND_ENDPOINT`, `MAIL_FROM` and `WORKFLOW_BASE_URL`.
    pub fn from_env() -> Self {
        Self {
            signature_url: non_empty_var("SIGNATURE_URL"),
            letter_font: non_empty_var("LETTER_FONT").map(PathBuf::from),
            resend_api_key: non_empty_var("RESEND_API_KEY"),
            resend_endpoint: non_empty_var("RESEND_ENDPOINT"),
            mail_from: non_empty_var("MAIL_FROM"),
            workflow_base_url: non_empty_var("WORKFLOW_BASE_URL"),
        }
    }

    pub fn geometry(&self) -> PageGeometry {
        PageGeometry::default()
    }

    pub fn letter_font(&self) -> LetterFont {
        self.letter_font
            .as_ref()
            .map(LetterFont::true_type)
            .unwrap_or_default()
    }

    pub fn signature_source(&self) -> Option<HttpSignature> {
        source_for_url(self.signature_url.as_deref())
    }

    pub fn mail_from(&self) -> &str {
        self.mail_from.as_deref().unwrap_or(DEFAULT_FROM)
    }

    pub fn mailer(&self) -> Result<ResendMailer, Error> {
        let key = self
            .resend_api_key
            .as_deref()
            .ok_or_else(|| Error::Config("RESEND_API_KEY is not set".to_string()))?;
        ResendMailer::new(
            key,
            self.resend_endpoint.as_deref().unwrap_or(DEFAULT_RESEND_ENDPOINT),
        )
    }

    pub fn workflow_base_url(&self) -> &str {
        self.workflow_base_url.as_deref().unwrap_or(DEFAULT_WORKFLOW_BASE_URL)
    }

    pub fn workflow_client(&self) -> Result<HttpWorkflowClient, Error> {
        HttpWorkflowClient::new(self.workflow_base_url())
    }
}
