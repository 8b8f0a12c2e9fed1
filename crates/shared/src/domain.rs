use std::{fmt, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{ContactField, FormError};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(ContactId);

/// A contact record as owned by the remote agenda service.
///
/// `id` is assigned by the service on creation and never changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: ContactId,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub address: String,
}

/// Unvalidated user input staged for a create or update call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactFormData {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub address: String,
}

impl ContactFormData {
    pub fn new(
        name: impl Into<String>,
        phone: impl Into<String>,
        email: impl Into<String>,
        address: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            phone: phone.into(),
            email: email.into(),
            address: address.into(),
        }
    }

    /// Checks every field and reports all problems at once, in field order.
    pub fn validate(&self) -> Result<(), Vec<FormError>> {
        let mut errors = Vec::new();

        for (field, value) in [
            (ContactField::Name, &self.name),
            (ContactField::Phone, &self.phone),
            (ContactField::Email, &self.email),
            (ContactField::Address, &self.address),
        ] {
            if value.trim().is_empty() {
                errors.push(FormError::Required(field));
            } else if field == ContactField::Email && !looks_like_email(value) {
                errors.push(FormError::InvalidEmail);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl From<&Contact> for ContactFormData {
    fn from(contact: &Contact) -> Self {
        Self {
            name: contact.name.clone(),
            phone: contact.phone.clone(),
            email: contact.email.clone(),
            address: contact.address.clone(),
        }
    }
}

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\S+@\S+\.\S+").expect("valid email regex"));

/// Loose `local@domain.tld` check: somewhere in the input there must be a
/// non-blank run, an `@`, a non-blank run, a `.`, and a non-blank run.
pub fn looks_like_email(input: &str) -> bool {
    EMAIL_RE.is_match(input)
}
