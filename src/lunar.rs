use chrono::NaiveDate;
use std::collections::HashMap;

/// Libellé de calendrier lunaire affiché sous chaque jour.
pub trait LunarCalendar: Send + Sync {
    fn label(&self, date: NaiveDate) -> Option<String>;
}

/// Aucun libellé.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoLunar;

impl LunarCalendar for NoLunar {
    fn label(&self, _date: NaiveDate) -> Option<String> {
        None
    }
}

/// Libellés précalculés (import depuis une source externe).
#[derive(Debug, Default, Clone)]
pub struct LunarLabels {
    labels: HashMap<NaiveDate, String>,
}

impl LunarLabels {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = (NaiveDate, S)>,
        S: Into<String>,
    {
        Self {
            labels: labels.into_iter().map(|(d, s)| (d, s.into())).collect(),
        }
    }
}

impl LunarCalendar for LunarLabels {
    fn label(&self, date: NaiveDate) -> Option<String> {
        self.labels.get(&date).cloned()
    }
}
