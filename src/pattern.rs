//! Calcul pur du poste d'une date selon la rotation.
//!
//! Aucune E/S, aucun état : appelable depuis n'importe quel thread.

use crate::model::{RotationConfig, RotationIdentity, Shift};
use chrono::{Datelike, NaiveDate};

/// Modulo mathématique : résultat dans `[0, m)` quel que soit le signe de `v`.
pub fn positive_mod(v: i64, m: i64) -> i64 {
    v.rem_euclid(m)
}

/// Écart signé en jours entiers de `from` à `to`.
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    to.signed_duration_since(from).num_days()
}

/// Poste de `date` pour la configuration donnée.
pub fn calculate(date: NaiveDate, config: &RotationConfig) -> Shift {
    match config.identity.pattern() {
        None => long_day_shift(date),
        Some(pattern) => {
            let days = days_between(config.base_date, date);
            let idx = positive_mod(i64::from(config.base_index) + days, pattern.len() as i64);
            pattern[idx as usize]
        }
    }
}

/// Index normalisé dans le motif (`None` pour la journée fixe).
pub fn cycle_index(date: NaiveDate, config: &RotationConfig) -> Option<usize> {
    let pattern = config.identity.pattern()?;
    let days = days_between(config.base_date, date);
    Some(positive_mod(i64::from(config.base_index) + days, pattern.len() as i64) as usize)
}

/// Longueur du cycle, 7 pour la journée fixe (cycle hebdomadaire).
pub fn cycle_len(identity: RotationIdentity) -> usize {
    identity.pattern().map_or(7, <[Shift]>::len)
}

fn long_day_shift(date: NaiveDate) -> Shift {
    if date.weekday().number_from_monday() <= 5 {
        Shift::Day
    } else {
        Shift::Off
    }
}
