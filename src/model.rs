use crate::error::ShiftError;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Schéma de rotation suivi par l'utilisateur.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RotationIdentity {
    /// Journée fixe : lundi-vendredi travaillés, week-end libre.
    #[default]
    LongDay,
    /// Cycle 4x3 sur 8 jours.
    FourThree,
    /// Cycle 4x2 sur 4 jours.
    FourTwo,
}

impl RotationIdentity {
    /// Motif cyclique, `None` pour la journée fixe (règle calendaire).
    pub fn pattern(self) -> Option<&'static [Shift]> {
        match self {
            Self::LongDay => None,
            Self::FourThree => Some(&FOUR_THREE_PATTERN),
            Self::FourTwo => Some(&FOUR_TWO_PATTERN),
        }
    }

    /// Postes possibles pour ce schéma (repos compris).
    pub fn shifts(self) -> &'static [Shift] {
        match self {
            Self::LongDay => &[Shift::Day, Shift::Off],
            Self::FourThree => &[Shift::Morning, Shift::Afternoon, Shift::Night, Shift::Off],
            Self::FourTwo => &[Shift::Morning, Shift::Night, Shift::Off],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::LongDay => "long-day",
            Self::FourThree => "four-three",
            Self::FourTwo => "four-two",
        }
    }

    /// Lecture tolérante d'une valeur persistée : tout identifiant inconnu
    /// retombe sur `LongDay`.
    pub fn parse_or_default(raw: &str) -> Self {
        match raw.parse() {
            Ok(identity) => identity,
            Err(_) => {
                tracing::warn!(value = raw, "unknown rotation identity, falling back to long-day");
                Self::LongDay
            }
        }
    }
}

impl FromStr for RotationIdentity {
    type Err = ShiftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .flat_map(char::to_lowercase)
            .collect();
        match key.as_str() {
            "longday" | "day" => Ok(Self::LongDay),
            "fourthree" | "4x3" => Ok(Self::FourThree),
            "fourtwo" | "4x2" => Ok(Self::FourTwo),
            _ => Err(ShiftError::UnknownRotation(s.to_string())),
        }
    }
}

impl fmt::Display for RotationIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Poste de travail (ou repos) d'une journée.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shift {
    Day,
    Morning,
    Afternoon,
    Night,
    Off,
}

impl Shift {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Morning => "morning",
            Self::Afternoon => "afternoon",
            Self::Night => "night",
            Self::Off => "off",
        }
    }

    pub fn is_work(self) -> bool {
        self != Self::Off
    }
}

impl FromStr for Shift {
    type Err = ShiftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" => Ok(Self::Day),
            "morning" => Ok(Self::Morning),
            "afternoon" => Ok(Self::Afternoon),
            "night" => Ok(Self::Night),
            "off" | "rest" => Ok(Self::Off),
            _ => Err(ShiftError::UnknownShift(s.to_string())),
        }
    }
}

impl fmt::Display for Shift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Repos, repos, matin x2, après-midi x2, nuit x2.
pub const FOUR_THREE_PATTERN: [Shift; 8] = [
    Shift::Off,
    Shift::Off,
    Shift::Morning,
    Shift::Morning,
    Shift::Afternoon,
    Shift::Afternoon,
    Shift::Night,
    Shift::Night,
];

pub const FOUR_TWO_PATTERN: [Shift; 4] = [Shift::Morning, Shift::Night, Shift::Off, Shift::Off];

/// Position confirmée dans le cycle : `base_index` est la case du motif
/// occupée le `base_date`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RotationConfig {
    pub identity: RotationIdentity,
    pub base_date: NaiveDate,
    pub base_index: u32,
}

impl RotationConfig {
    pub fn new(identity: RotationIdentity, base_date: NaiveDate, base_index: u32) -> Self {
        Self {
            identity,
            base_date,
            base_index,
        }
    }
}

/// Jour férié ou jour ouvré de rattrapage (`is_rest_day == false`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolidayRecord {
    pub date: NaiveDate,
    pub name: String,
    #[serde(default)]
    pub is_rest_day: bool,
}

impl HolidayRecord {
    pub fn new<N: Into<String>>(date: NaiveDate, name: N, is_rest_day: bool) -> Self {
        Self {
            date,
            name: name.into(),
            is_rest_day,
        }
    }
}

/// Vue calculée d'une journée.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayInfo {
    pub date: NaiveDate,
    pub shift: Shift,
    pub is_rest_day: bool,
    pub holiday_name: Option<String>,
    pub lunar_label: Option<String>,
}

/// Lit une date ISO `YYYY-MM-DD`.
pub fn parse_date(raw: &str) -> Result<NaiveDate, ShiftError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| ShiftError::InvalidDate(raw.to_string()))
}

/// Clé année-mois du cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Result<Self, ShiftError> {
        if !(1..=12).contains(&month) || NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(ShiftError::InvalidMonth { year, month });
        }
        Ok(Self { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn first_day(&self) -> NaiveDate {
        // validé à la construction
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    /// Jours du mois, dans l'ordre croissant.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let month = self.month;
        self.first_day()
            .iter_days()
            .take_while(move |d| d.month() == month)
    }

    /// Les douze mois de la même année.
    pub fn siblings(&self) -> impl Iterator<Item = YearMonth> {
        let year = self.year;
        (1..=12).map(move |month| YearMonth { year, month })
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Mois matérialisé : un `DayInfo` par jour, ordre croissant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthInfo {
    pub year_month: YearMonth,
    pub days: Vec<DayInfo>,
}

impl MonthInfo {
    pub fn day(&self, day: u32) -> Option<&DayInfo> {
        self.days.get(day.checked_sub(1)? as usize)
    }

    pub fn work_days(&self) -> usize {
        self.days.iter().filter(|d| d.shift.is_work()).count()
    }
}
