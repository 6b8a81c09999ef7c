use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::dossier::{Dossier, attachment_file_name};
use crate::error::Error;

pub const DEFAULT_FROM: &str = "AccidentDoc <noreply@accidentdoc.fr>";
pub const VALIDATION_SUBJECT: &str = "Votre lettre de réserves AT/MP validée";

#[derive(Clone, Debug, PartialEq)]
pub struct Attachment {
    pub file_name: String,
    pub content: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct OutboundEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
    pub attachments: Vec<Attachment>,
}

/// Outbound email delivery.
pub trait Mailer {
    fn send(&self, email: &OutboundEmail) -> Result<(), Error>;
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn validation_html(victim: &str) -> String {
    format!(
        r#"<div style="font-family: sans-serif; max-width: 600px; margin: 0 auto;">
  <h2 style="color: #1a1a1a;">Votre lettre de réserves est prête</h2>
  <p>Bonjour,</p>
  <p>Votre lettre de réserves concernant {victim} a été validée par notre avocate partenaire et est jointe à cet email.</p>
  <p><strong>Prochaines étapes :</strong></p>
  <ol>
    <li>Téléchargez et imprimez la lettre ci-jointe</li>
    <li>Envoyez-la par courrier recommandé avec accusé de réception à votre CPAM</li>
    <li>Conservez une copie de l'accusé de réception</li>
  </ol>
  <p><strong>Important :</strong> Cette lettre doit être envoyée dans les délais légaux pour être valable.</p>
  <p>Si vous avez des questions, n'hésitez pas à nous contacter.</p>
  <p style="margin-top: 30px;">Cordialement,<br><strong>L'équipe AccidentDoc</strong></p>
  <hr style="margin-top: 40px; border: none; border-top: 1px solid #eee;" />
  <p style="font-size: 12px; color: #666;">AccidentDoc - Vos droits, nos experts<br><a href="https://accidentdoc.fr">accidentdoc.fr</a></p>
</div>"#,
        victim = escape_html(victim),
    )
}

/// Build the email carrying a validated letter to the dossier's customer.
pub fn compose_validation_email(dossier: &Dossier, pdf: Vec<u8>, from: &str) -> Result<OutboundEmail, Error> {
    let to = dossier
        .customer_email
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Error::Mail(format!("dossier {} has no customer email", dossier.id)))?;

    Ok(OutboundEmail {
        from: from.to_string(),
        to: to.to_string(),
        subject: VALIDATION_SUBJECT.to_string(),
        html: validation_html(&dossier.victim_display_name()),
        attachments: vec![Attachment {
            file_name: attachment_file_name(&dossier.request_id),
            content: pdf,
        }],
    })
}

#[derive(Serialize)]
struct ResendAttachment<'a> {
    filename: &'a str,
    content: String,
}

#[derive(Serialize)]
struct ResendRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
    attachments: Vec<ResendAttachment<'a>>,
}

impl<'a> ResendRequest<'a> {
    fn from_email(email: &'a OutboundEmail) -> Self {
        Self {
            from: &email.from,
            to: [&email.to],
            subject: &email.subject,
            html: &email.html,
            attachments: email
                .attachments
                .iter()
                .map(|a| ResendAttachment {
                    filename: &a.file_name,
                    content: STANDARD.encode(&a.content),
                })
                .collect(),
        }
    }
}

#[derive(Deserialize)]
struct ResendResponse {
    #[serde(default)]
    id: Option<String>,
}

/// Sends through a Resend-compatible `POST /emails` API.
pub struct ResendMailer {
    client: reqwest::blocking::Client,
    api_key: String,
    endpoint: String,
}

impl ResendMailer {
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>) -> Result<Self, Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            endpoint: endpoint.into(),
        })
    }

    /// The `POST` that `send` issues for `email`.
    pub fn request_for(&self, email: &OutboundEmail) -> Result<reqwest::blocking::Request, Error> {
        Ok(self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&ResendRequest::from_email(email))
            .build()?)
    }
}

impl Mailer for ResendMailer {
    fn send(&self, email: &OutboundEmail) -> Result<(), Error> {
        let request = self.request_for(email)?;
        let response = self
            .client
            .execute(request)
            .map_err(|e| Error::Mail(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().unwrap_or_default();
            return Err(Error::Mail(format!("{status}: {detail}")));
        }

        let id = response
            .json::<ResendResponse>()
            .ok()
            .and_then(|r| r.id)
            .unwrap_or_else(|| "?".to_string());
        log::info!("Email sent to {} (id {id})", email.to);
        Ok(())
    }
}
