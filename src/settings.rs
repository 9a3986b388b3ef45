//! Réglages utilisateur : rotation, jours fériés, heures d'alarme.

use crate::error::{Result, ShiftError};
use crate::model::{RotationConfig, RotationIdentity, Shift};
use crate::pattern::{cycle_len, positive_mod};
use crate::storage::write_json_atomic;
use anyhow::Context;
use chrono::NaiveDate;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Rotation telle que persistée : l'identifiant reste une chaîne libre.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationDoc {
    pub identity: String,
    pub base_date: NaiveDate,
    #[serde(default)]
    pub base_index: u32,
}

impl Default for RotationDoc {
    fn default() -> Self {
        Self {
            identity: RotationIdentity::LongDay.as_str().to_string(),
            base_date: NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default(),
            base_index: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub rotation: RotationDoc,
    #[serde(default = "default_true")]
    pub honor_holidays: bool,
    #[serde(default = "default_alarm_times")]
    pub alarm_times: BTreeMap<Shift, String>,
    /// Fuseau IANA ; fuseau local du système si absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            rotation: RotationDoc::default(),
            honor_holidays: true,
            alarm_times: default_alarm_times(),
            timezone: None,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_alarm_times() -> BTreeMap<Shift, String> {
    [
        (Shift::Day, "07:00"),
        (Shift::Morning, "05:30"),
        (Shift::Afternoon, "12:30"),
        (Shift::Night, "22:00"),
    ]
    .into_iter()
    .map(|(shift, time)| (shift, time.to_string()))
    .collect()
}

/// Partie des réglages dont dépend le calendrier mensuel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CalendarFingerprint {
    pub config: RotationConfig,
    pub honor_holidays: bool,
}

impl Settings {
    /// Configuration normalisée : identifiant inconnu -> journée fixe,
    /// index ramené dans le cycle.
    pub fn rotation_config(&self) -> RotationConfig {
        let identity = RotationIdentity::parse_or_default(&self.rotation.identity);
        let len = cycle_len(identity) as i64;
        let base_index = positive_mod(i64::from(self.rotation.base_index), len) as u32;
        RotationConfig::new(identity, self.rotation.base_date, base_index)
    }

    pub fn set_rotation(&mut self, config: RotationConfig) {
        self.rotation = RotationDoc {
            identity: config.identity.as_str().to_string(),
            base_date: config.base_date,
            base_index: config.base_index,
        };
    }

    pub fn calendar_fingerprint(&self) -> CalendarFingerprint {
        CalendarFingerprint {
            config: self.rotation_config(),
            honor_holidays: self.honor_holidays,
        }
    }

    pub fn alarm_time(&self, shift: Shift) -> Option<&str> {
        self.alarm_times.get(&shift).map(String::as_str)
    }

    pub fn tz(&self) -> Result<Option<chrono_tz::Tz>> {
        self.timezone
            .as_deref()
            .map(|name| {
                name.parse::<chrono_tz::Tz>()
                    .map_err(|_| ShiftError::InvalidTimezone(name.to_string()))
            })
            .transpose()
    }
}

/// Source de réglages, interrogée à la demande.
pub trait SettingsProvider: Send + Sync {
    fn settings(&self) -> Settings;
}

impl SettingsProvider for Settings {
    fn settings(&self) -> Settings {
        self.clone()
    }
}

/// Réglages partagés et modifiables à chaud.
#[derive(Debug, Default)]
pub struct SharedSettings {
    inner: RwLock<Settings>,
}

impl SharedSettings {
    pub fn new(settings: Settings) -> Self {
        Self {
            inner: RwLock::new(settings),
        }
    }

    pub fn update<F: FnOnce(&mut Settings)>(&self, f: F) {
        f(&mut self.inner.write());
    }
}

impl SettingsProvider for SharedSettings {
    fn settings(&self) -> Settings {
        self.inner.read().clone()
    }
}

pub trait SettingsStore {
    /// Charge les réglages depuis un support.
    fn load(&self) -> anyhow::Result<Settings>;
    /// Sauvegarde de manière atomique.
    fn save(&self, settings: &Settings) -> anyhow::Result<()>;
}

/// Réglages dans un fichier JSON. En tant que [`SettingsProvider`], relit
/// le fichier à chaque appel.
pub struct JsonSettingsStore {
    path: PathBuf,
    last_good: RwLock<Option<Settings>>,
}

impl JsonSettingsStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            last_good: RwLock::new(None),
        }
    }

    /// Réglages par défaut si le fichier n'existe pas encore.
    pub fn load_or_default(&self) -> anyhow::Result<Settings> {
        if !self.path.exists() {
            return Ok(Settings::default());
        }
        self.load()
    }
}

impl SettingsStore for JsonSettingsStore {
    fn load(&self) -> anyhow::Result<Settings> {
        let data =
            fs::read(&self.path).with_context(|| format!("reading {}", self.path.display()))?;
        let settings: Settings =
            serde_json::from_slice(&data).with_context(|| "parsing settings.json")?;
        Ok(settings)
    }

    fn save(&self, settings: &Settings) -> anyhow::Result<()> {
        write_json_atomic(&self.path, settings)?;
        *self.last_good.write() = Some(settings.clone());
        Ok(())
    }
}

impl SettingsProvider for JsonSettingsStore {
    /// Fichier illisible : dernière valeur lue avec succès, sinon défauts.
    fn settings(&self) -> Settings {
        match self.load_or_default() {
            Ok(settings) => {
                *self.last_good.write() = Some(settings.clone());
                settings
            }
            Err(err) => {
                warn!(
                    path = %self.path.display(),
                    error = %err,
                    "unreadable settings file, keeping last known settings"
                );
                self.last_good.read().clone().unwrap_or_default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_config_normalizes_persisted_values() {
        let mut settings = Settings::default();
        settings.rotation.identity = "four-two".into();
        settings.rotation.base_index = 6;
        let cfg = settings.rotation_config();
        assert_eq!(cfg.identity, RotationIdentity::FourTwo);
        assert_eq!(cfg.base_index, 2);

        settings.rotation.identity = "three-shift-deluxe".into();
        assert_eq!(settings.rotation_config().identity, RotationIdentity::LongDay);
    }

    #[test]
    fn fingerprint_tracks_honor_flag() {
        let a = Settings::default();
        let mut b = a.clone();
        b.honor_holidays = false;
        assert_ne!(a.calendar_fingerprint(), b.calendar_fingerprint());
        b.alarm_times.insert(Shift::Night, "21:00".into());
        b.honor_holidays = true;
        assert_eq!(a.calendar_fingerprint(), b.calendar_fingerprint());
    }

    #[test]
    fn unknown_timezone_is_an_error() {
        let mut settings = Settings::default();
        assert!(settings.tz().unwrap().is_none());
        settings.timezone = Some("Europe/Paris".into());
        assert_eq!(settings.tz().unwrap(), Some(chrono_tz::Europe::Paris));
        settings.timezone = Some("Mars/Olympus".into());
        assert!(matches!(settings.tz(), Err(ShiftError::InvalidTimezone(_))));
    }
}
