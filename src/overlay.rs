use crate::model::{HolidayRecord, Shift};
use chrono::NaiveDate;

/// Résultat de la superposition des jours fériés sur un poste calculé.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayOutcome {
    pub shift: Shift,
    pub is_rest_day: bool,
    pub holiday_name: Option<String>,
}

/// Force le repos les jours fériés chômés quand `honor_holidays` est actif.
///
/// Un jour de rattrapage (`is_rest_day == false`) ne modifie jamais le poste.
/// Sans `honor_holidays`, le poste passe tel quel ; `is_rest_day` et
/// `holiday_name` restent renseignés pour l'affichage.
pub fn apply_overlay<F>(
    shift: Shift,
    date: NaiveDate,
    lookup: F,
    honor_holidays: bool,
) -> OverlayOutcome
where
    F: FnOnce(NaiveDate) -> Option<HolidayRecord>,
{
    apply_record(shift, lookup(date).as_ref(), honor_holidays)
}

/// Variante à partir d'un enregistrement déjà résolu.
pub fn apply_record(
    shift: Shift,
    record: Option<&HolidayRecord>,
    honor_holidays: bool,
) -> OverlayOutcome {
    let Some(record) = record else {
        return OverlayOutcome {
            shift,
            is_rest_day: false,
            holiday_name: None,
        };
    };

    let shift = if honor_holidays && record.is_rest_day {
        Shift::Off
    } else {
        shift
    };

    OverlayOutcome {
        shift,
        is_rest_day: record.is_rest_day,
        holiday_name: Some(record.name.clone()),
    }
}
