#![forbid(unsafe_code)]
//! Shiftclock — calcul des postes de rotation et des réveils associés.
//!
//! - Rotations 4x3 (8 jours), 4x2 (4 jours) et journée fixe.
//! - Jours fériés chômés superposés au motif.
//! - Prochain déclenchement d'alarme par poste (nuit : la veille au soir).
//! - Cache LRU des mois calculés, précalcul de l'année en tâche de fond.
//!
//! Le calcul est pur : l'instant courant est toujours fourni par l'appelant.

pub mod alarm;
pub mod calendar;
pub mod error;
pub mod holiday;
pub mod lunar;
pub mod model;
pub mod overlay;
pub mod pattern;
pub mod settings;
mod storage;

pub use alarm::{
    arm_all, next_trigger, next_trigger_with_holidays, parse_local_time, plan_alarms,
    AlarmScheduler, AlarmTrigger, TriggerSource, SEARCH_HORIZON_DAYS,
};
pub use calendar::{render_month, CacheOptions, CacheStats, MonthCalendarCache};
pub use error::{Result, ShiftError};
pub use holiday::{HolidayProvider, HolidayTable};
pub use lunar::{LunarCalendar, LunarLabels, NoLunar};
pub use model::{
    parse_date, DayInfo, HolidayRecord, MonthInfo, RotationConfig, RotationIdentity, Shift,
    YearMonth, FOUR_THREE_PATTERN, FOUR_TWO_PATTERN,
};
pub use overlay::{apply_overlay, OverlayOutcome};
pub use pattern::{calculate, positive_mod};
pub use settings::{JsonSettingsStore, Settings, SettingsProvider, SettingsStore, SharedSettings};
