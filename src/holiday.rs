//! Jeux de données de jours fériés.

use crate::model::HolidayRecord;
use crate::storage::write_json_atomic;
use anyhow::{bail, Context};
use chrono::{Datelike, NaiveDate};
use csv::ReaderBuilder;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

/// Source de jours fériés, en lecture seule pour le calcul.
pub trait HolidayProvider: Send + Sync {
    fn lookup(&self, date: NaiveDate) -> Option<HolidayRecord>;
    fn all_records(&self) -> Vec<HolidayRecord>;
    /// Incrémenté à chaque modification du jeu de données.
    fn revision(&self) -> u64;
    /// Demande de synchronisation externe d'une année. Ne doit pas bloquer.
    fn ensure_year_synced(&self, _year: i32) {}
}

/// Jeu de jours fériés en mémoire, au plus un enregistrement par date.
#[derive(Debug, Default)]
pub struct HolidayTable {
    records: RwLock<BTreeMap<NaiveDate, HolidayRecord>>,
    revision: AtomicU64,
}

impl HolidayTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records<I: IntoIterator<Item = HolidayRecord>>(records: I) -> Self {
        let table = Self::new();
        table.extend(records);
        table
    }

    /// Ajoute ou remplace l'enregistrement de la date.
    pub fn upsert(&self, record: HolidayRecord) {
        self.records.write().insert(record.date, record);
        self.bump();
    }

    pub fn extend<I: IntoIterator<Item = HolidayRecord>>(&self, records: I) {
        {
            let mut map = self.records.write();
            for rec in records {
                map.insert(rec.date, rec);
            }
        }
        self.bump();
    }

    pub fn remove(&self, date: NaiveDate) -> Option<HolidayRecord> {
        let removed = self.records.write().remove(&date);
        if removed.is_some() {
            self.bump();
        }
        removed
    }

    /// Remplace intégralement les enregistrements d'une année.
    pub fn replace_year<I: IntoIterator<Item = HolidayRecord>>(&self, year: i32, records: I) {
        {
            let mut map = self.records.write();
            map.retain(|date, _| date.year() != year);
            for rec in records.into_iter().filter(|r| r.date.year() == year) {
                map.insert(rec.date, rec);
            }
        }
        self.bump();
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    fn bump(&self) {
        self.revision.fetch_add(1, Ordering::SeqCst);
    }

    /// Import CSV : en-tête `date,name,is_rest_day`.
    pub fn import_csv<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<usize> {
        let records = read_holidays_csv(path)?;
        let count = records.len();
        self.extend(records);
        Ok(count)
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        let records: Vec<HolidayRecord> =
            serde_json::from_slice(&data).with_context(|| "parsing holidays json")?;
        Ok(Self::from_records(records))
    }

    /// Sauvegarde atomique (fichier temporaire puis renommage).
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        write_json_atomic(path.as_ref(), &self.all_records())
    }
}

impl HolidayProvider for HolidayTable {
    fn lookup(&self, date: NaiveDate) -> Option<HolidayRecord> {
        self.records.read().get(&date).cloned()
    }

    fn all_records(&self) -> Vec<HolidayRecord> {
        self.records.read().values().cloned().collect()
    }

    fn revision(&self) -> u64 {
        self.revision.load(Ordering::SeqCst)
    }
}

/// Lecture d'un CSV `date,name,is_rest_day` (dernière colonne optionnelle, vrai par défaut).
pub fn read_holidays_csv<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<HolidayRecord>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;
    let mut out = Vec::new();
    for rec in rdr.records() {
        let rec = rec?;
        let date = rec.get(0).context("missing date")?.trim();
        let name = rec.get(1).context("missing name")?.trim();
        if name.is_empty() {
            bail!("invalid holiday row for {date}: empty name");
        }
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .with_context(|| format!("invalid date: {date}"))?;
        let is_rest_day = match rec.get(2).map(str::trim) {
            None | Some("") => true,
            Some(flag) => {
                parse_bool(flag).with_context(|| format!("invalid is_rest_day for {date}"))?
            }
        };
        out.push(HolidayRecord::new(date, name, is_rest_day));
    }
    Ok(out)
}

fn parse_bool(s: &str) -> anyhow::Result<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "y" | "oui" => Ok(true),
        "false" | "0" | "no" | "n" | "non" => Ok(false),
        _ => bail!("expected boolean"),
    }
}
