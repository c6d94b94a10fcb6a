//! Contact form relay.
//!
//! Posts the form as multipart data to a third-party form-relay endpoint.
//! The relay emails the submission on; any 2xx counts as delivered.

use reqwest::multipart::Form;
use std::time::Duration;
use tracing::{info, warn};

use crate::protocol::ContactMessage;

#[derive(Debug, thiserror::Error)]
pub enum ContactError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("no contact relay configured")]
    NotConfigured,
    #[error("relay request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("relay returned status {0}")]
    Status(reqwest::StatusCode),
}

/// Every field is required, as on the site's form.
pub fn validate(msg: &ContactMessage) -> Result<(), ContactError> {
    let fields = [
        ("name", &msg.name),
        ("email", &msg.email),
        ("subject", &msg.subject),
        ("message", &msg.message),
    ];
    for (name, value) in fields {
        if value.trim().is_empty() {
            return Err(ContactError::MissingField(name));
        }
    }
    Ok(())
}

fn form_for(msg: &ContactMessage) -> Form {
    Form::new()
        .text("name", msg.name.clone())
        .text("email", msg.email.clone())
        .text("subject", msg.subject.clone())
        .text("message", msg.message.clone())
        .text("_captcha", "false")
        .text("_template", "table")
}

pub struct ContactRelay {
    client: reqwest::Client,
    relay_url: Option<String>,
}

impl ContactRelay {
    pub fn new(relay_url: Option<String>, timeout: Duration) -> Result<Self, ContactError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ContactError::Transport)?;
        Ok(Self {
            client,
            relay_url: relay_url.filter(|u| !u.trim().is_empty()),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.relay_url.is_some()
    }

    pub async fn submit(&self, msg: &ContactMessage) -> Result<(), ContactError> {
        validate(msg)?;
        let url = self.relay_url.as_deref().ok_or(ContactError::NotConfigured)?;

        let response = self
            .client
            .post(url)
            .header("Accept", "application/json")
            .multipart(form_for(msg))
            .send()
            .await
            .map_err(ContactError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            warn!("[contact] Relay rejected submission: {}", status);
            return Err(ContactError::Status(status));
        }
        info!("[contact] Message from {:?} relayed", msg.name);
        Ok(())
    }
}
