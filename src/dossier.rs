use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DossierStatus {
    Uploaded,
    Extracted,
    Analyzed,
    DraftCreated,
    PaymentPending,
    Paid,
    Review,
    Validated,
    Sent,
    GraveCase,
}

/// Display context produced by the drafting workflow.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LetterContext {
    #[serde(default)]
    pub victime_nom: String,
    #[serde(default)]
    pub victime_prenom: String,
    #[serde(default)]
    pub accident_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accident_heure: Option<String>,
    #[serde(default)]
    pub accident_lieu: String,
    #[serde(default)]
    pub employeur_nom: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employeur_siret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temoin_present: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temoin_nom: Option<String>,
}

impl LetterContext {
    /// "Prénom Nom", or a neutral wording when neither is known.
    pub fn victim_display_name(&self) -> String {
        let name = format!("{} {}", self.victime_prenom.trim(), self.victime_nom.trim());
        let name = name.trim();
        if name.is_empty() {
            "votre dossier".to_string()
        } else {
            name.to_string()
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Dossier {
    pub id: String,
    /// External reference shared with the workflow engine.
    pub request_id: String,
    pub status: DossierStatus,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub context: Option<LetterContext>,
    #[serde(default)]
    pub is_grave: bool,
    #[serde(default)]
    pub letter_text: Option<String>,
    #[serde(default)]
    pub validated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub validated_by: Option<String>,
}

impl Dossier {
    pub fn victim_display_name(&self) -> String {
        self.context
            .as_ref()
            .map(LetterContext::victim_display_name)
            .unwrap_or_else(|| "votre dossier".to_string())
    }
}

pub fn attachment_file_name(request_id: &str) -> String {
    format!("lettre-reserves-{request_id}.pdf")
}

/// State change recorded once the validated letter has been sent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub dossier_id: String,
    pub status: DossierStatus,
    pub letter_text: String,
    pub validated_at: DateTime<Utc>,
    pub validated_by: String,
}

impl StatusUpdate {
    pub fn sent(dossier_id: &str, letter_text: &str, reviewer_id: &str, at: DateTime<Utc>) -> Self {
        Self {
            dossier_id: dossier_id.to_string(),
            status: DossierStatus::Sent,
            letter_text: letter_text.to_string(),
            validated_at: at,
            validated_by: reviewer_id.to_string(),
        }
    }

    pub fn apply_to(&self, dossier: &mut Dossier) {
        dossier.status = self.status;
        dossier.letter_text = Some(self.letter_text.clone());
        dossier.validated_at = Some(self.validated_at);
        dossier.validated_by = Some(self.validated_by.clone());
    }
}

/// Persistent dossier storage, provided by the hosting application.
pub trait DossierStore {
    fn find(&self, id: &str) -> Result<Option<Dossier>, Error>;
    fn apply(&self, update: &StatusUpdate) -> Result<(), Error>;
}

#[derive(Default)]
pub struct MemoryStore {
    dossiers: Mutex<HashMap<String, Dossier>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, dossier: Dossier) {
        if let Ok(mut map) = self.dossiers.lock() {
            map.insert(dossier.id.clone(), dossier);
        }
    }
}

impl DossierStore for MemoryStore {
    fn find(&self, id: &str) -> Result<Option<Dossier>, Error> {
        let map = self
            .dossiers
            .lock()
            .map_err(|_| Error::Store("dossier map poisoned".to_string()))?;
        Ok(map.get(id).cloned())
    }

    fn apply(&self, update: &StatusUpdate) -> Result<(), Error> {
        let mut map = self
            .dossiers
            .lock()
            .map_err(|_| Error::Store("dossier map poisoned".to_string()))?;
        let dossier = map
            .get_mut(&update.dossier_id)
            .ok_or_else(|| Error::Store(format!("dossier {} not found", update.dossier_id)))?;
        update.apply_to(dossier);
        Ok(())
    }
}
