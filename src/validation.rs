//! The lawyer validation action: render the approved letter, email it to the
//! customer, then record the status transition.
//!
//! Nothing is sent or persisted when rendering fails, and nothing is persisted
//! when dispatch fails. If persistence fails after a successful dispatch the
//! pending update is handed back to the caller for retry instead of being
//! dropped.

use chrono::Utc;
use serde::Deserialize;
use thiserror::Error;

use crate::dossier::{DossierStore, StatusUpdate};
use crate::error::Error;
use crate::mail::{Mailer, compose_validation_email};
use crate::{RenderOptions, render_letter};

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ValidationRequest {
    pub dossier_id: String,
    pub letter_text: String,
}

/// Authenticated reviewer, as established by the host's session layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reviewer {
    pub id: String,
}

pub struct Collaborators<'a> {
    pub store: &'a dyn DossierStore,
    pub mailer: &'a dyn Mailer,
    pub render: &'a RenderOptions,
    pub mail_from: &'a str,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ValidationOutcome {
    Sent { update: StatusUpdate },
    /// The email went out but the dossier could not be updated. `update`
    /// must be re-applied by the caller.
    SentPendingUpdate { update: StatusUpdate, reason: String },
}

impl ValidationOutcome {
    pub fn update(&self) -> &StatusUpdate {
        match self {
            ValidationOutcome::Sent { update } | ValidationOutcome::SentPendingUpdate { update, .. } => {
                update
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("dossier_id et letter_text requis")]
    BadRequest,

    #[error("dossier {0} not found")]
    NotFound(String),

    #[error("failed to load dossier: {0}")]
    Store(#[source] Error),

    #[error("failed to render letter: {0}")]
    Render(#[source] Error),

    #[error("failed to dispatch letter: {0}")]
    Dispatch(#[source] Error),
}

impl ValidationError {
    pub fn status_code(&self) -> u16 {
        match self {
            ValidationError::BadRequest => 400,
            ValidationError::NotFound(_) => 404,
            ValidationError::Store(_) | ValidationError::Render(_) | ValidationError::Dispatch(_) => 500,
        }
    }

    /// Message shown to the reviewer. Internal failures stay generic.
    pub fn user_message(&self) -> &'static str {
        match self {
            ValidationError::BadRequest => "dossier_id et letter_text requis",
            ValidationError::NotFound(_) => "Dossier non trouvé",
            ValidationError::Dispatch(_) => "Erreur lors de l'envoi de l'email",
            ValidationError::Store(_) | ValidationError::Render(_) => "Erreur interne du serveur",
        }
    }
}

pub fn validate_letter(
    request: &ValidationRequest,
    reviewer: &Reviewer,
    deps: &Collaborators<'_>,
) -> Result<ValidationOutcome, ValidationError> {
    let dossier_id = request.dossier_id.trim();
    if dossier_id.is_empty() || request.letter_text.trim().is_empty() {
        return Err(ValidationError::BadRequest);
    }

    let dossier = deps
        .store
        .find(dossier_id)
        .map_err(ValidationError::Store)?
        .ok_or_else(|| ValidationError::NotFound(dossier_id.to_string()))?;

    let pdf = render_letter(&request.letter_text, deps.render).map_err(|e| {
        log::error!("Rendering letter for dossier {dossier_id} failed: {e}");
        ValidationError::Render(e)
    })?;

    let email = compose_validation_email(&dossier, pdf, deps.mail_from).map_err(ValidationError::Dispatch)?;
    deps.mailer.send(&email).map_err(|e| {
        log::error!("Sending letter for dossier {dossier_id} failed: {e}");
        ValidationError::Dispatch(e)
    })?;

    let update = StatusUpdate::sent(dossier_id, &request.letter_text, &reviewer.id, Utc::now());
    match deps.store.apply(&update) {
        Ok(()) => {
            log::info!("Dossier {dossier_id} validated by {} and sent", reviewer.id);
            Ok(ValidationOutcome::Sent { update })
        }
        Err(e) => {
            log::error!("Letter for dossier {dossier_id} was sent but the status update failed: {e}");
            Ok(ValidationOutcome::SentPendingUpdate {
                update,
                reason: e.to_string(),
            })
        }
    }
}
