//! HTTP request handlers.

use super::AppState;
use crate::error::AppError;
use crate::router::{Exchange, Params};
use axum::response::Response;
use phone_vault::{legacy::storage_key, StoreError};
use tracing::{error, info, warn};

pub const ADD_FORM_TEMPLATE: &str = "client-form-add.jst";
pub const RESTORE_FORM_TEMPLATE: &str = "client-form-restore.jst";
pub const ALERT_TEMPLATE: &str = "alert.jst";

pub const MISSING_FIELDS: &str = "Please fill out all fields";
pub const CLIENT_ADDED: &str = "Phone number and email added";
pub const PHONE_SENT: &str = "Phone number sent to the email";
pub const GENERIC_FAILURE: &str = "Request could not be completed";

pub const RESTORE_SUBJECT: &str = "Restore your phone";

/// Alert styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertClass {
    Success,
    Danger,
}

impl AlertClass {
    pub fn as_str(self) -> &'static str {
        match self {
            AlertClass::Success => "success",
            AlertClass::Danger => "danger",
        }
    }
}

async fn alert(state: &AppState, class: AlertClass, text: &str) -> Result<Response, AppError> {
    let mut params = Params::new();
    params.insert("class".to_string(), class.as_str().to_string());
    params.insert("text".to_string(), text.to_string());

    Ok(state.templates.render(ALERT_TEMPLATE, Some(&params)).await?)
}

/// User-facing text for a failed store operation.
fn describe(state: &AppState, err: &StoreError) -> String {
    if state.disclose_errors {
        format!("{}: {}", err.kind(), err)
    } else {
        GENERIC_FAILURE.to_string()
    }
}

/// A form field that is present and non-empty.
fn required<'a>(form: &'a Params, field: &str) -> Option<&'a str> {
    form.get(field).map(String::as_str).filter(|v| !v.is_empty())
}

/// Render the add-client form.
pub async fn add_form(state: AppState, _exchange: Exchange) -> Result<Response, AppError> {
    Ok(state.templates.render(ADD_FORM_TEMPLATE, None).await?)
}

/// Render the restore form.
pub async fn restore_form(state: AppState, _exchange: Exchange) -> Result<Response, AppError> {
    Ok(state.templates.render(RESTORE_FORM_TEMPLATE, None).await?)
}

/// Store a phone number under an email.
pub async fn add_client(state: AppState, exchange: Exchange) -> Result<Response, AppError> {
    let (Some(email), Some(phone)) = (
        required(&exchange.form, "email"),
        required(&exchange.form, "phone"),
    ) else {
        return alert(&state, AlertClass::Danger, MISSING_FIELDS).await;
    };

    let key = storage_key(email);
    info!(storage_key = %key, "Add client request received");

    let result = {
        let mut vault = state.vault.write().await;
        vault.commit(email, phone).await
    };

    match result {
        Ok(()) => {
            info!(storage_key = %key, "Client stored");
            alert(&state, AlertClass::Success, CLIENT_ADDED).await
        }
        Err(e) => {
            error!(storage_key = %key, error = %e, "Failed to store client");
            alert(&state, AlertClass::Danger, &describe(&state, &e)).await
        }
    }
}

/// Send the stored phone number for an email through the notifier.
pub async fn restore_client(state: AppState, exchange: Exchange) -> Result<Response, AppError> {
    let Some(email) = required(&exchange.form, "email") else {
        return alert(&state, AlertClass::Danger, MISSING_FIELDS).await;
    };

    let key = storage_key(email);
    info!(storage_key = %key, "Restore request received");

    let result = state.vault.read().await.get_by_email(email);

    let phone = match result {
        Ok(phone) => phone,
        Err(e) => {
            warn!(storage_key = %key, error = %e, "Restore lookup failed");
            return alert(&state, AlertClass::Danger, &describe(&state, &e)).await;
        }
    };

    let body = format!("Your phone: {}", phone);
    if let Err(e) = state.notifier.notify(email, RESTORE_SUBJECT, &body).await {
        // Delivery is best effort; the requester sees the same answer either way
        error!(storage_key = %key, error = %e, "Failed to send restore notification");
    }

    alert(&state, AlertClass::Success, PHONE_SENT).await
}
