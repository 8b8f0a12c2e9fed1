use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use shared::{
    domain::{Contact, ContactFormData, ContactId},
    protocol::AgendaResponse,
};
use tracing::debug;
use url::Url;

use crate::error::ServiceError;

pub const DEFAULT_BASE_URL: &str = "https://playground.4geeks.com/contact";
pub const DEFAULT_AGENDA_SLUG: &str = "mi-agenda";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgendaConfig {
    pub base_url: String,
    pub agenda_slug: String,
}

impl Default for AgendaConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            agenda_slug: DEFAULT_AGENDA_SLUG.into(),
        }
    }
}

/// Remote side of the contact store: one call per agenda operation.
#[async_trait]
pub trait ContactService: Send + Sync {
    /// Creates the agenda if the service does not have it yet.
    async fn ensure_agenda(&self) -> Result<(), ServiceError>;
    async fn list_contacts(&self) -> Result<Vec<Contact>, ServiceError>;
    async fn create_contact(&self, form: &ContactFormData) -> Result<Contact, ServiceError>;
    async fn update_contact(
        &self,
        id: ContactId,
        form: &ContactFormData,
    ) -> Result<Contact, ServiceError>;
    async fn delete_contact(&self, id: ContactId) -> Result<(), ServiceError>;
}

pub struct HttpContactService {
    http: Client,
    agenda_url: Url,
}

impl HttpContactService {
    pub fn new(config: &AgendaConfig) -> Result<Self, ServiceError> {
        Self::with_client(Client::new(), config)
    }

    pub fn with_client(http: Client, config: &AgendaConfig) -> Result<Self, ServiceError> {
        let invalid = |reason: &str| ServiceError::InvalidUrl {
            url: config.base_url.clone(),
            reason: reason.to_string(),
        };

        if config.agenda_slug.trim().is_empty() {
            return Err(invalid("agenda slug must not be empty"));
        }

        let mut agenda_url = Url::parse(&config.base_url).map_err(|e| invalid(&e.to_string()))?;
        agenda_url
            .path_segments_mut()
            .map_err(|()| invalid("url cannot be a base"))?
            .pop_if_empty()
            .extend(["agendas", config.agenda_slug.as_str()]);

        Ok(Self { http, agenda_url })
    }

    pub fn agenda_url(&self) -> &Url {
        &self.agenda_url
    }

    fn contacts_url(&self, id: Option<ContactId>) -> Result<Url, ServiceError> {
        let mut url = self.agenda_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| ServiceError::InvalidUrl {
                    url: self.agenda_url.to_string(),
                    reason: "url cannot be a base".into(),
                })?;
            segments.push("contacts");
            if let Some(id) = id {
                segments.push(&id.to_string());
            }
        }
        Ok(url)
    }

    async fn send(request: RequestBuilder) -> Result<Response, ServiceError> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::Status(status));
        }
        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ServiceError> {
        let body = Self::send(request).await?.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl ContactService for HttpContactService {
    async fn ensure_agenda(&self) -> Result<(), ServiceError> {
        debug!(url = %self.agenda_url, "agenda: ensuring agenda exists");
        Self::send(self.http.post(self.agenda_url.clone())).await?;
        Ok(())
    }

    async fn list_contacts(&self) -> Result<Vec<Contact>, ServiceError> {
        let agenda: AgendaResponse =
            Self::send_json(self.http.get(self.agenda_url.clone())).await?;
        debug!(count = agenda.contacts.len(), "agenda: fetched contacts");
        Ok(agenda.contacts)
    }

    async fn create_contact(&self, form: &ContactFormData) -> Result<Contact, ServiceError> {
        let url = self.contacts_url(None)?;
        Self::send_json(self.http.post(url).json(form)).await
    }

    async fn update_contact(
        &self,
        id: ContactId,
        form: &ContactFormData,
    ) -> Result<Contact, ServiceError> {
        let url = self.contacts_url(Some(id))?;
        Self::send_json(self.http.put(url).json(form)).await
    }

    async fn delete_contact(&self, id: ContactId) -> Result<(), ServiceError> {
        let url = self.contacts_url(Some(id))?;
        Self::send(self.http.delete(url)).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/service_tests.rs"]
mod tests;
