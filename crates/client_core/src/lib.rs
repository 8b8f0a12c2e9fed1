use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use shared::domain::{Contact, ContactFormData, ContactId};
use tokio::sync::broadcast;
use tracing::{error, info, warn};

pub mod error;
pub mod service;

pub use error::{ServiceError, StoreError};
pub use service::{AgendaConfig, ContactService, HttpContactService};

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Snapshot of what the store currently knows about the agenda.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactState {
    pub contacts: Vec<Contact>,
    pub loading: bool,
    pub error: Option<StoreError>,
}

impl ContactState {
    pub fn error_message(&self) -> Option<String> {
        self.error.map(|err| err.to_string())
    }
}

#[derive(Debug, Clone)]
pub enum StoreEvent {
    Changed(ContactState),
}

/// State transitions the store applies; each one is a single locked update.
#[derive(Debug)]
enum StoreAction {
    Started,
    Loaded(Vec<Contact>),
    Created(Contact),
    Updated(Contact),
    Deleted(ContactId),
    Failed(StoreError),
    Abandoned,
}

struct StoreInner {
    state: ContactState,
    in_flight: usize,
}

impl StoreInner {
    fn reduce(&mut self, action: StoreAction) {
        match action {
            StoreAction::Started => {
                self.in_flight += 1;
            }
            StoreAction::Loaded(contacts) => {
                self.finish();
                self.state.contacts = contacts;
                self.state.error = None;
            }
            StoreAction::Created(contact) => {
                self.finish();
                self.state.contacts.push(contact);
                self.state.error = None;
            }
            StoreAction::Updated(contact) => {
                self.finish();
                let mut matched = false;
                for existing in self.state.contacts.iter_mut() {
                    if existing.id == contact.id {
                        *existing = contact.clone();
                        matched = true;
                    }
                }
                if !matched {
                    warn!(
                        contact_id = contact.id.0,
                        "store: updated contact is not cached locally, dropping it"
                    );
                }
                self.state.error = None;
            }
            StoreAction::Deleted(id) => {
                self.finish();
                self.state.contacts.retain(|contact| contact.id != id);
                self.state.error = None;
            }
            StoreAction::Failed(err) => {
                self.finish();
                self.state.error = Some(err);
            }
            StoreAction::Abandoned => {
                self.finish();
            }
        }
        self.state.loading = self.in_flight > 0;
    }

    fn finish(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
    }
}

/// Client-side cache of one remote agenda.
///
/// The four async operations are the only way to change the cached state.
/// Each one marks the store as loading, awaits the remote call without
/// holding the state lock, then applies exactly one reconciling transition.
/// An operation whose future is dropped mid-call only releases its loading
/// mark.
/// Concurrent operations are not ordered against each other: whichever
/// finishes last determines the final contents.
pub struct ContactStore {
    service: Arc<dyn ContactService>,
    inner: Mutex<StoreInner>,
    events: broadcast::Sender<StoreEvent>,
}

impl ContactStore {
    pub fn new(service: Arc<dyn ContactService>) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Arc::new(Self {
            service,
            inner: Mutex::new(StoreInner {
                state: ContactState::default(),
                in_flight: 0,
            }),
            events,
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> ContactState {
        self.lock_inner().state.clone()
    }

    /// Looks up a cached contact, e.g. to pre-fill an edit form.
    pub async fn find(&self, id: ContactId) -> Option<Contact> {
        let guard = self.lock_inner();
        guard
            .state
            .contacts
            .iter()
            .find(|contact| contact.id == id)
            .cloned()
    }

    /// Refreshes the whole contact list from the service.
    ///
    /// Failures are recorded in the state and never returned; the previously
    /// cached contacts stay in place.
    pub async fn load(&self) {
        let op = self.begin();

        if let Err(err) = self.service.ensure_agenda().await {
            info!(error = %err, "store: ensure agenda failed, continuing with fetch");
        }

        match self.service.list_contacts().await {
            Ok(contacts) => {
                info!(count = contacts.len(), "store: contacts loaded");
                op.settle(StoreAction::Loaded(contacts));
            }
            Err(err) => {
                error!(error = %err, "store: failed to load contacts");
                op.settle(StoreAction::Failed(StoreError::Load));
            }
        }
    }

    pub async fn create(&self, form: &ContactFormData) -> Result<Contact, StoreError> {
        let op = self.begin();

        match self.service.create_contact(form).await {
            Ok(contact) => {
                info!(contact_id = contact.id.0, "store: contact created");
                op.settle(StoreAction::Created(contact.clone()));
                Ok(contact)
            }
            Err(err) => {
                error!(error = %err, "store: failed to create contact");
                op.settle(StoreAction::Failed(StoreError::Create));
                Err(StoreError::Create)
            }
        }
    }

    pub async fn update(
        &self,
        id: ContactId,
        form: &ContactFormData,
    ) -> Result<Contact, StoreError> {
        let op = self.begin();

        match self.service.update_contact(id, form).await {
            Ok(contact) => {
                info!(contact_id = contact.id.0, "store: contact updated");
                op.settle(StoreAction::Updated(contact.clone()));
                Ok(contact)
            }
            Err(err) => {
                error!(contact_id = id.0, error = %err, "store: failed to update contact");
                op.settle(StoreAction::Failed(StoreError::Update));
                Err(StoreError::Update)
            }
        }
    }

    pub async fn delete(&self, id: ContactId) -> Result<(), StoreError> {
        let op = self.begin();

        match self.service.delete_contact(id).await {
            Ok(()) => {
                info!(contact_id = id.0, "store: contact deleted");
                op.settle(StoreAction::Deleted(id));
                Ok(())
            }
            Err(err) => {
                error!(contact_id = id.0, error = %err, "store: failed to delete contact");
                op.settle(StoreAction::Failed(StoreError::Delete));
                Err(StoreError::Delete)
            }
        }
    }

    fn begin(&self) -> InFlight<'_> {
        self.apply(StoreAction::Started);
        InFlight {
            store: self,
            settled: false,
        }
    }

    fn apply(&self, action: StoreAction) {
        let mut guard = self.lock_inner();
        guard.reduce(action);
        // sent under the lock so subscribers see transitions in apply order
        let _ = self.events.send(StoreEvent::Changed(guard.state.clone()));
    }

    fn lock_inner(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Loading mark held by one running operation.
///
/// Settling applies the operation's terminal transition; dropping it
/// unsettled (the caller gave up on the future) only clears the mark.
struct InFlight<'a> {
    store: &'a ContactStore,
    settled: bool,
}

impl InFlight<'_> {
    fn settle(mut self, action: StoreAction) {
        self.settled = true;
        self.store.apply(action);
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.settled {
            warn!("store: operation dropped before the service answered");
            self.store.apply(StoreAction::Abandoned);
        }
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
