use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use client_core::AgendaConfig;
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "agenda.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub base_url: String,
    pub agenda_slug: String,
}

impl Default for Settings {
    fn default() -> Self {
        let agenda = AgendaConfig::default();
        Self {
            base_url: agenda.base_url,
            agenda_slug: agenda.agenda_slug,
        }
    }
}

impl From<&Settings> for AgendaConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            base_url: settings.base_url.clone(),
            agenda_slug: settings.agenda_slug.clone(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    base_url: Option<String>,
    agenda_slug: Option<String>,
}

/// Defaults, then the config file, then environment variables.
///
/// An explicitly requested file must exist; the default `agenda.toml` is
/// optional.
pub fn load_settings(config_path: Option<&Path>) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    let (path, required) = match config_path {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
    };
    if let Some(file_cfg) = read_settings_file(&path, required)? {
        apply_file_settings(&mut settings, file_cfg);
    }

    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    Ok(settings)
}

fn read_settings_file(path: &Path, required: bool) -> anyhow::Result<Option<FileSettings>> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if !required && err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read config file '{}'", path.display()))
        }
    };

    let parsed = toml::from_str::<FileSettings>(&raw)
        .with_context(|| format!("failed to parse config file '{}'", path.display()))?;
    Ok(Some(parsed))
}

fn apply_file_settings(settings: &mut Settings, file_cfg: FileSettings) {
    if let Some(v) = file_cfg.base_url {
        settings.base_url = v;
    }
    if let Some(v) = file_cfg.agenda_slug {
        settings.agenda_slug = v;
    }
}

pub fn apply_env_overrides(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("AGENDA_BASE_URL") {
        settings.base_url = v;
    }
    if let Some(v) = lookup("APP__BASE_URL") {
        settings.base_url = v;
    }

    if let Some(v) = lookup("AGENDA_SLUG") {
        settings.agenda_slug = v;
    }
    if let Some(v) = lookup("APP__AGENDA_SLUG") {
        settings.agenda_slug = v;
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
