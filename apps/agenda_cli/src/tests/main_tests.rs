use super::*;
use client_core::ContactState;

fn current() -> ContactFormData {
    ContactFormData::new("Ana", "555", "a@b.com", "X")
}

#[test]
fn edit_keeps_fields_that_were_not_given() {
    let edits = FieldEdits {
        phone: Some("777".into()),
        ..FieldEdits::default()
    };

    let form = apply_edits(current(), edits);

    assert_eq!(form, ContactFormData::new("Ana", "777", "a@b.com", "X"));
}

#[test]
fn validated_rejects_blank_edit() {
    let edits = FieldEdits {
        name: Some("   ".into()),
        email: Some("nope".into()),
        ..FieldEdits::default()
    };

    let err = validated(apply_edits(current(), edits)).expect_err("must fail");
    let text = err.to_string();
    assert!(text.contains("--name: name is required"), "{text}");
    assert!(text.contains("--email: email is not valid"), "{text}");
}

#[test]
fn parses_edit_with_partial_flags() {
    let cli = Cli::try_parse_from(["agenda", "--agenda", "team", "edit", "7", "--email", "n@m.io"])
        .expect("parse");
    assert_eq!(cli.agenda.as_deref(), Some("team"));
    match cli.command {
        Command::Edit { id, fields } => {
            assert_eq!(id, 7);
            assert_eq!(fields.email.as_deref(), Some("n@m.io"));
            assert!(fields.name.is_none());
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn add_requires_every_field_flag() {
    assert!(Cli::try_parse_from(["agenda", "add", "--name", "Ana"]).is_err());
}

#[test]
fn delete_defaults_to_unconfirmed() {
    let cli = Cli::try_parse_from(["agenda", "delete", "7"]).expect("parse");
    assert!(matches!(cli.command, Command::Delete { id: 7, yes: false }));
}

#[test]
fn edit_of_uncached_contact_uses_full_flags() {
    let edits = FieldEdits {
        name: Some("Bo".into()),
        phone: Some("556".into()),
        email: Some("b@c.com".into()),
        address: Some("Y".into()),
    };

    let form = edit_form(None, edits).expect("all fields given");

    assert_eq!(form, ContactFormData::new("Bo", "556", "b@c.com", "Y"));
}

#[test]
fn edit_of_uncached_contact_needs_every_field() {
    let edits = FieldEdits {
        phone: Some("777".into()),
        ..FieldEdits::default()
    };

    assert!(edit_form(None, edits).is_none());
}

#[test]
fn edit_of_cached_contact_merges_flags() {
    let edits = FieldEdits {
        address: Some("Z".into()),
        ..FieldEdits::default()
    };

    let form = edit_form(Some(current()), edits).expect("cached");

    assert_eq!(form, ContactFormData::new("Ana", "555", "a@b.com", "Z"));
}

#[tokio::test]
async fn event_logger_survives_lagging() {
    let (tx, rx) = broadcast::channel(1);
    for _ in 0..3 {
        tx.send(StoreEvent::Changed(ContactState::default()))
            .expect("receiver alive");
    }
    drop(tx);

    // capacity 1: the first two are skipped, the last one is still delivered
    assert_eq!(log_store_events(rx).await, 1);
}
