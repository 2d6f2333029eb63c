use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::Client;

use super::{
    classify_status, compose_ticket_text, parse_ticket_id, SubmissionClient, SubmissionError,
    TicketId,
};
use crate::config::AppConfig;
use crate::ticket::TicketDraft;

const SCREENSHOT_FIELD: &str = "screenshot";
const SCREENSHOT_FILE_NAME: &str = "screenshot.png";
const USER_AGENT: &str = concat!("helpdesk-agent/", env!("CARGO_PKG_VERSION"));

/// Posts a multipart ticket to the configured endpoint.
#[derive(Clone)]
pub struct HttpSubmissionClient {
    endpoint: Option<String>,
    api_key: Option<String>,
    auth_code: Option<String>,
    contact_email: Option<String>,
}

impl HttpSubmissionClient {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            auth_code: config.auth_code.clone(),
            contact_email: config.contact_email.clone(),
        }
    }

    fn build_client(&self) -> Result<Client, SubmissionError> {
        Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|err| SubmissionError::network(format!("http client setup failed: {err}")))
    }
}

impl std::fmt::Debug for HttpSubmissionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSubmissionClient")
            .field("endpoint", &self.endpoint)
            .field("has_credentials", &self.api_key.is_some())
            .finish()
    }
}

impl SubmissionClient for HttpSubmissionClient {
    fn submit(&self, draft: &TicketDraft) -> Result<TicketId, SubmissionError> {
        let Some(endpoint) = self.endpoint.as_deref() else {
            return Err(SubmissionError::network(
                "no ticketing endpoint is configured",
            ));
        };

        let png = draft
            .capture
            .encode_png()
            .map_err(|err| SubmissionError::Attachment {
                message: err.to_string(),
            })?;
        let screenshot = Part::bytes(png)
            .file_name(SCREENSHOT_FILE_NAME)
            .mime_str("image/png")
            .map_err(|err| SubmissionError::Attachment {
                message: err.to_string(),
            })?;

        let form = payload_fields(draft, self.contact_email.as_deref())
            .into_iter()
            .fold(Form::new(), |form, (name, value)| form.text(name, value))
            .part(SCREENSHOT_FIELD, screenshot);

        let mut request = self.build_client()?.post(endpoint).multipart(form);
        if let Some(api_key) = self.api_key.as_deref() {
            request = request.basic_auth(api_key, self.auth_code.as_deref());
        }

        tracing::info!(
            endpoint,
            priority = %draft.priority,
            capture_id = %draft.capture.capture_id,
            "submitting ticket"
        );
        let response = request.send().map_err(classify_transport_error)?;
        let status = response.status();
        let body = response.text().unwrap_or_default();

        if status.is_success() {
            Ok(parse_ticket_id(&body))
        } else {
            Err(classify_status(status.as_u16(), &body))
        }
    }
}

fn classify_transport_error(err: reqwest::Error) -> SubmissionError {
    SubmissionError::Network {
        timed_out: err.is_timeout(),
        message: err.to_string(),
    }
}

fn payload_fields(draft: &TicketDraft, contact_email: Option<&str>) -> Vec<(&'static str, String)> {
    let host = &draft.host;
    let mut fields = vec![
        ("subject", draft.subject.clone()),
        ("description", compose_ticket_text(draft)),
        ("priority", draft.priority.label().to_ascii_lowercase()),
        ("hostname", host.hostname.clone()),
        ("ip_address", host.ip_label()),
        ("mac_address", host.mac_label()),
        ("os_version", host.os_version.clone()),
        ("username", host.username.clone()),
        ("cpu_percent", host.cpu_label()),
        ("ram_percent", host.ram_label()),
        ("disk_percent", host.disk_label()),
        ("contact_name", host.username.clone()),
    ];
    if let Some(email) = contact_email.filter(|email| email.contains('@')) {
        fields.push(("contact_email", email.to_string()));
    }
    fields
}
