use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::qr::{DEFAULT_QR_MARGIN, DEFAULT_QR_SIZE};
use crate::surface::DEFAULT_FETCH_TIMEOUT;

const DEFAULT_SETTINGS_TOML: &str = include_str!("../settings.toml");

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub export_dpi: u32,
    pub output_dir: PathBuf,
    pub font_path: Option<PathBuf>,
    pub qr_size: u32,
    pub qr_margin: u32,
    pub fetch_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            export_dpi: 300,
            output_dir: PathBuf::from("."),
            font_path: None,
            qr_size: DEFAULT_QR_SIZE,
            qr_margin: DEFAULT_QR_MARGIN,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    export: Option<ExportSettings>,
    font: Option<FontSettings>,
    qr: Option<QrSettings>,
    network: Option<NetworkSettings>,
}

#[derive(Debug, Default, Deserialize)]
struct ExportSettings {
    dpi: Option<u32>,
    output_dir: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct FontSettings {
    path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct QrSettings {
    size: Option<u32>,
    margin: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct NetworkSettings {
    timeout_secs: Option<u64>,
}

pub fn load_settings(extra_path: Option<&Path>) -> Result<Settings> {
    let mut settings = Settings::default();
    ensure_home_settings_file()?;

    let mut ordered_paths = Vec::new();
    ordered_paths.push(PathBuf::from("settings.toml"));
    ordered_paths.push(PathBuf::from("settings.local.toml"));

    if let Some(home) = home_dir() {
        ordered_paths.push(home.join("settings.toml"));
        ordered_paths.push(home.join("settings.local.toml"));
    }

    if let Some(extra) = extra_path {
        if !extra.exists() {
            return Err(anyhow!("settings file not found: {}", extra.display()));
        }
        ordered_paths.push(extra.to_path_buf());
    }

    for path in ordered_paths {
        if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("failed to read settings: {}", path.display()))?;
            let parsed: SettingsFile = toml::from_str(&content)
                .with_context(|| format!("failed to parse settings: {}", path.display()))?;
            settings.merge(parsed);
        }
    }

    Ok(settings)
}

impl Settings {
    fn merge(&mut self, incoming: SettingsFile) {
        if let Some(export) = incoming.export {
            if let Some(dpi) = export.dpi.filter(|dpi| *dpi > 0) {
                self.export_dpi = dpi;
            }
            if let Some(dir) = export.output_dir.filter(|dir| !dir.trim().is_empty()) {
                self.output_dir = PathBuf::from(dir.trim());
            }
        }
        if let Some(path) = incoming
            .font
            .and_then(|font| font.path)
            .filter(|path| !path.trim().is_empty())
        {
            self.font_path = Some(PathBuf::from(path.trim()));
        }
        if let Some(qr) = incoming.qr {
            if let Some(size) = qr.size.filter(|size| *size > 0) {
                self.qr_size = size;
            }
            if let Some(margin) = qr.margin {
                self.qr_margin = margin;
            }
        }
        if let Some(secs) = incoming
            .network
            .and_then(|network| network.timeout_secs)
            .filter(|secs| *secs > 0)
        {
            self.fetch_timeout = Duration::from_secs(secs);
        }
    }
}

fn ensure_home_settings_file() -> Result<()> {
    let Some(home) = home_dir() else {
        return Ok(());
    };
    fs::create_dir_all(&home)
        .with_context(|| format!("failed to create settings directory: {}", home.display()))?;
    let path = home.join("settings.toml");
    if !path.exists() {
        fs::write(&path, DEFAULT_SETTINGS_TOML)
            .with_context(|| format!("failed to write settings: {}", path.display()))?;
    }
    Ok(())
}

pub fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME").ok().and_then(|home| {
        let home = home.trim();
        if home.is_empty() {
            None
        } else {
            Some(Path::new(home).join(".business-card-rust"))
        }
    })
}
