//! Recherche du prochain déclenchement d'alarme par poste.
//!
//! Tout est pur : `now` est fourni par l'appelant, jamais lu sur une horloge
//! globale. L'armement effectif du minuteur système est délégué à un
//! [`AlarmScheduler`] externe.

use crate::error::{Result, ShiftError};
use crate::holiday::HolidayProvider;
use crate::model::{RotationConfig, Shift};
use crate::overlay::apply_overlay;
use crate::pattern;
use crate::settings::Settings;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};

/// Horizon de recherche, en jours à partir d'aujourd'hui (inclus).
pub const SEARCH_HORIZON_DAYS: i64 = 60;

/// Origine du déclenchement retenu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerSource {
    /// Date trouvée dans le motif.
    Pattern,
    /// Horizon épuisé : lendemain à l'heure demandée. Le jour retenu peut
    /// ne pas correspondre au poste (anomalie connue, conservée).
    Fallback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlarmTrigger<Tz: TimeZone> {
    pub shift: Shift,
    pub at: DateTime<Tz>,
    /// Date calendaire du poste (la veille de `at` pour une nuit).
    pub shift_date: NaiveDate,
    pub source: TriggerSource,
}

/// Interface du planificateur d'alarmes système (hors de cette crate).
pub trait AlarmScheduler<Tz: TimeZone> {
    /// Arme (ou réarme) l'unique minuteur associé à `trigger.shift`.
    fn arm(&mut self, trigger: &AlarmTrigger<Tz>) -> anyhow::Result<()>;
    fn cancel(&mut self, shift: Shift) -> anyhow::Result<()>;
}

/// Lit une heure locale `HH:MM`.
pub fn parse_local_time(raw: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M")
        .map_err(|_| ShiftError::InvalidLocalTime(raw.to_string()))
}

/// Combine une date et une heure locales dans `tz`.
///
/// Heure ambiguë (retour à l'heure d'hiver) : première occurrence.
/// Heure inexistante (passage à l'heure d'été) : premier instant valide après le trou.
pub fn combine<Tz: TimeZone>(tz: &Tz, date: NaiveDate, time: NaiveTime) -> DateTime<Tz> {
    let naive = NaiveDateTime::new(date, time);
    if let Some(at) = tz.from_local_datetime(&naive).earliest() {
        return at;
    }
    (1..=180)
        .find_map(|minutes| {
            tz.from_local_datetime(&(naive + Duration::minutes(minutes)))
                .earliest()
        })
        .unwrap_or_else(|| tz.from_utc_datetime(&naive))
}

/// Prochain instant strictement futur où sonner pour `desired`.
pub fn next_trigger<Tz: TimeZone>(
    desired: Shift,
    local_time: &str,
    config: &RotationConfig,
    now: &DateTime<Tz>,
) -> Result<AlarmTrigger<Tz>> {
    next_trigger_by(desired, local_time, now, |date| pattern::calculate(date, config))
}

/// Comme [`next_trigger`], en tenant compte des jours fériés chômés.
pub fn next_trigger_with_holidays<Tz: TimeZone>(
    desired: Shift,
    local_time: &str,
    config: &RotationConfig,
    holidays: &dyn HolidayProvider,
    honor_holidays: bool,
    now: &DateTime<Tz>,
) -> Result<AlarmTrigger<Tz>> {
    next_trigger_by(desired, local_time, now, |date| {
        let shift = pattern::calculate(date, config);
        apply_overlay(shift, date, |d| holidays.lookup(d), honor_holidays).shift
    })
}

/// Balayage avant générique : `resolve` donne le poste de chaque date.
pub fn next_trigger_by<Tz, F>(
    desired: Shift,
    local_time: &str,
    now: &DateTime<Tz>,
    resolve: F,
) -> Result<AlarmTrigger<Tz>>
where
    Tz: TimeZone,
    F: Fn(NaiveDate) -> Shift,
{
    let time = parse_local_time(local_time)?;
    let tz = now.timezone();
    let today = now.date_naive();

    for offset in 0..=SEARCH_HORIZON_DAYS {
        let candidate = today + Duration::days(offset);
        if resolve(candidate) != desired {
            continue;
        }
        let trigger_date = trigger_date_for(desired, candidate);
        let at = combine(&tz, trigger_date, time);
        if at > *now {
            return Ok(AlarmTrigger {
                shift: desired,
                at,
                shift_date: candidate,
                source: TriggerSource::Pattern,
            });
        }
    }

    let tomorrow = today + Duration::days(1);
    tracing::warn!(
        shift = %desired,
        horizon_days = SEARCH_HORIZON_DAYS,
        "no matching date within horizon, falling back to tomorrow"
    );
    Ok(AlarmTrigger {
        shift: desired,
        at: combine(&tz, tomorrow, time),
        shift_date: tomorrow,
        source: TriggerSource::Fallback,
    })
}

/// Règle de bascule : le réveil d'une nuit sonne la veille au soir.
pub fn trigger_date_for(shift: Shift, shift_date: NaiveDate) -> NaiveDate {
    if shift == Shift::Night {
        shift_date - Duration::days(1)
    } else {
        shift_date
    }
}

/// Prochain déclenchement de chaque poste travaillé ayant une heure d'alarme,
/// trié chronologiquement.
pub fn plan_alarms<Tz: TimeZone>(
    settings: &Settings,
    holidays: &dyn HolidayProvider,
    now: &DateTime<Tz>,
) -> Result<Vec<AlarmTrigger<Tz>>> {
    let config = settings.rotation_config();
    let mut plan = Vec::new();
    for shift in config.identity.shifts().iter().copied().filter(|s| s.is_work()) {
        let Some(time) = settings.alarm_time(shift) else {
            continue;
        };
        plan.push(next_trigger_with_holidays(
            shift,
            time,
            &config,
            holidays,
            settings.honor_holidays,
            now,
        )?);
    }
    plan.sort_by(|a, b| a.at.cmp(&b.at));
    Ok(plan)
}

/// Annule les minuteurs des postes absents du plan puis arme le plan.
pub fn arm_all<Tz, S>(scheduler: &mut S, plan: &[AlarmTrigger<Tz>]) -> anyhow::Result<()>
where
    Tz: TimeZone,
    S: AlarmScheduler<Tz> + ?Sized,
{
    for shift in [Shift::Day, Shift::Morning, Shift::Afternoon, Shift::Night] {
        if !plan.iter().any(|t| t.shift == shift) {
            scheduler.cancel(shift)?;
        }
    }
    for trigger in plan {
        scheduler.arm(trigger)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn parse_local_time_rejects_garbage() {
        assert_eq!(
            parse_local_time("22:00").unwrap(),
            NaiveTime::from_hms_opt(22, 0, 0).unwrap()
        );
        assert!(matches!(
            parse_local_time("25:99"),
            Err(ShiftError::InvalidLocalTime(_))
        ));
        assert!(parse_local_time("soon").is_err());
    }

    #[test]
    fn night_triggers_the_evening_before() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(
            trigger_date_for(Shift::Night, date),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        assert_eq!(trigger_date_for(Shift::Morning, date), date);
    }

    #[test]
    fn combine_in_utc_is_plain() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let time = NaiveTime::from_hms_opt(5, 30, 0).unwrap();
        let at = combine(&Utc, date, time);
        assert_eq!(at.to_rfc3339(), "2024-06-01T05:30:00+00:00");
    }
}
