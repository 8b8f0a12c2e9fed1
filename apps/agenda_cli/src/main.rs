use std::{path::PathBuf, sync::Arc};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use client_core::{AgendaConfig, ContactStore, HttpContactService, StoreEvent};
use shared::domain::{ContactFormData, ContactId};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod view;

use config::load_settings;

#[derive(Parser, Debug)]
#[command(name = "agenda", about = "Manage the contacts of a hosted agenda")]
struct Cli {
    /// Settings file; defaults to ./agenda.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    base_url: Option<String>,
    /// Agenda slug on the remote service.
    #[arg(long)]
    agenda: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    List,
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        address: String,
    },
    /// Change a contact; omitted fields keep their current value. A contact
    /// missing from the loaded list needs every field flag.
    Edit {
        id: i64,
        #[command(flatten)]
        fields: FieldEdits,
    },
    Delete {
        id: i64,
        /// Confirm the deletion.
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Args, Debug, Default)]
struct FieldEdits {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    address: Option<String>,
}

fn apply_edits(mut form: ContactFormData, edits: FieldEdits) -> ContactFormData {
    if let Some(v) = edits.name {
        form.name = v;
    }
    if let Some(v) = edits.phone {
        form.phone = v;
    }
    if let Some(v) = edits.email {
        form.email = v;
    }
    if let Some(v) = edits.address {
        form.address = v;
    }
    form
}

/// Form for `edit`: the cached contact with the given flags applied, or the
/// flags alone when every field is given and nothing is cached.
fn edit_form(current: Option<ContactFormData>, edits: FieldEdits) -> Option<ContactFormData> {
    match (current, edits) {
        (Some(current), edits) => Some(apply_edits(current, edits)),
        (
            None,
            FieldEdits {
                name: Some(name),
                phone: Some(phone),
                email: Some(email),
                address: Some(address),
            },
        ) => Some(ContactFormData::new(name, phone, email, address)),
        (None, _) => None,
    }
}

/// Logs state transitions until the store goes away; returns how many were seen.
async fn log_store_events(mut events: broadcast::Receiver<StoreEvent>) -> usize {
    let mut seen = 0;
    loop {
        match events.recv().await {
            Ok(StoreEvent::Changed(state)) => {
                seen += 1;
                debug!(
                    loading = state.loading,
                    contacts = state.contacts.len(),
                    error = ?state.error,
                    "agenda: state changed"
                );
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "agenda: state events skipped");
            }
            Err(RecvError::Closed) => break,
        }
    }
    seen
}

fn validated(form: ContactFormData) -> Result<ContactFormData> {
    form.validate().map_err(|errors| {
        anyhow!(
            "contact form is incomplete:\n{}",
            view::render_form_errors(&errors)
        )
    })?;
    Ok(form)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let mut settings = load_settings(cli.config.as_deref())?;
    if let Some(base_url) = cli.base_url {
        settings.base_url = base_url;
    }
    if let Some(agenda) = cli.agenda {
        settings.agenda_slug = agenda;
    }
    info!(
        base_url = %settings.base_url,
        agenda = %settings.agenda_slug,
        "agenda: settings resolved"
    );

    let service = HttpContactService::new(&AgendaConfig::from(&settings))
        .context("failed to configure agenda service")?;
    let store = ContactStore::new(Arc::new(service));

    tokio::spawn(log_store_events(store.subscribe_events()));

    store.load().await;

    match cli.command {
        Command::List => {
            let state = store.snapshot().await;
            print!("{}", view::render_contacts(&state));
            if let Some(err) = state.error {
                return Err(err.into());
            }
        }
        Command::Add {
            name,
            phone,
            email,
            address,
        } => {
            let form = validated(ContactFormData::new(name, phone, email, address))?;
            let created = store.create(&form).await?;
            println!("Added contact:\n{}", view::render_contact(&created));
            print!("{}", view::render_contacts(&store.snapshot().await));
        }
        Command::Edit { id, fields } => {
            let id = ContactId(id);
            let current = store.find(id).await.map(|c| ContactFormData::from(&c));
            let form = edit_form(current, fields).ok_or_else(|| {
                anyhow!(
                    "contact {id} is not in agenda '{}'; pass --name, --phone, --email and --address to update it anyway",
                    settings.agenda_slug
                )
            })?;
            let form = validated(form)?;
            let updated = store.update(id, &form).await?;
            println!("Updated contact:\n{}", view::render_contact(&updated));
            print!("{}", view::render_contacts(&store.snapshot().await));
        }
        Command::Delete { id, yes } => {
            let id = ContactId(id);
            let label = store
                .find(id)
                .await
                .map(|contact| contact.name)
                .unwrap_or_else(|| format!("#{id}"));
            if !yes {
                bail!("refusing to delete {label} without --yes");
            }
            store.delete(id).await?;
            println!("Deleted {label}.");
            print!("{}", view::render_contacts(&store.snapshot().await));
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
