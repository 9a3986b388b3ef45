use crate::lunar::LunarCalendar;
use crate::model::{DayInfo, HolidayRecord, MonthInfo, RotationConfig, YearMonth};
use crate::overlay::apply_record;
use crate::pattern;
use chrono::{Datelike, NaiveDate};
use std::collections::HashMap;
use std::fmt::Write;

/// Matérialise un mois complet à partir d'un instantané des jours fériés.
pub fn compute_month(
    year_month: YearMonth,
    config: &RotationConfig,
    honor_holidays: bool,
    holidays: &[HolidayRecord],
    lunar: &dyn LunarCalendar,
) -> MonthInfo {
    let by_date: HashMap<NaiveDate, &HolidayRecord> = holidays
        .iter()
        .filter(|r| YearMonth::of(r.date) == year_month)
        .map(|r| (r.date, r))
        .collect();

    let days = year_month
        .days()
        .map(|date| {
            let shift = pattern::calculate(date, config);
            let outcome = apply_record(shift, by_date.get(&date).copied(), honor_holidays);
            DayInfo {
                date,
                shift: outcome.shift,
                is_rest_day: outcome.is_rest_day,
                holiday_name: outcome.holiday_name,
                lunar_label: lunar.label(date),
            }
        })
        .collect();

    MonthInfo { year_month, days }
}

/// Rendu texte, une ligne par jour.
pub fn render_month(month: &MonthInfo) -> String {
    let mut out = String::new();
    for day in &month.days {
        let _ = write!(out, "{} {} {}", day.date, day.date.weekday(), day.shift);
        if let Some(name) = &day.holiday_name {
            let rest = if day.is_rest_day { ", chômé" } else { "" };
            let _ = write!(out, " ({name}{rest})");
        }
        if let Some(label) = &day.lunar_label {
            let _ = write!(out, " {label}");
        }
        out.push('\n');
    }
    out
}
