use serde::Deserialize;

use crate::domain::Contact;

/// Body returned by `GET /agendas/{slug}`.
///
/// The service omits `contacts` for a fresh agenda; that reads as empty.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AgendaResponse {
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub contacts: Vec<Contact>,
}
