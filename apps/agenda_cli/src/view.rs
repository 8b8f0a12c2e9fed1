//! Plain-text rendering of store state for the terminal.

use std::fmt::Write as _;

use client_core::ContactState;
use shared::{domain::Contact, error::FormError};

pub fn render_contact(contact: &Contact) -> String {
    format!(
        "#{:<5} {}\n       phone:   {}\n       email:   {}\n       address: {}",
        contact.id.0, contact.name, contact.phone, contact.email, contact.address
    )
}

pub fn render_contacts(state: &ContactState) -> String {
    let mut out = String::new();

    if let Some(message) = state.error_message() {
        let _ = writeln!(out, "! {message}");
    }

    if state.contacts.is_empty() {
        out.push_str("No contacts yet. Add one with `agenda add`.\n");
        return out;
    }

    let _ = writeln!(out, "{} contact(s)", state.contacts.len());
    for contact in &state.contacts {
        let _ = writeln!(out, "{}", render_contact(contact));
    }
    out
}

pub fn render_form_errors(errors: &[FormError]) -> String {
    errors
        .iter()
        .map(|err| format!("  --{}: {err}", err.field()))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use client_core::StoreError;
    use shared::{domain::ContactId, error::ContactField};

    fn ana() -> Contact {
        Contact {
            id: ContactId(7),
            name: "Ana".into(),
            phone: "555".into(),
            email: "a@b.com".into(),
            address: "X".into(),
        }
    }

    #[test]
    fn empty_state_suggests_adding() {
        let out = render_contacts(&ContactState::default());
        assert!(out.contains("No contacts yet"));
    }

    #[test]
    fn lists_contacts_and_error_banner() {
        let state = ContactState {
            contacts: vec![ana()],
            loading: false,
            error: Some(StoreError::Load),
        };
        let out = render_contacts(&state);
        assert!(out.starts_with("! failed to load contacts\n"));
        assert!(out.contains("1 contact(s)"));
        assert!(out.contains("#7"));
        assert!(out.contains("a@b.com"));
    }

    #[test]
    fn form_errors_name_the_flag() {
        let out = render_form_errors(&[
            FormError::Required(ContactField::Name),
            FormError::InvalidEmail,
        ]);
        assert_eq!(out, "  --name: name is required\n  --email: email is not valid");
    }
}
