use crate::settings::CalendarFingerprint;

/// Options du cache mensuel
#[derive(Debug, Clone, Copy)]
pub struct CacheOptions {
    /// Nombre maximal de mois résidents.
    pub capacity: usize,
    /// Précalcul en tâche de fond des autres mois de l'année.
    pub prewarm: bool,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            capacity: 36,
            prewarm: true,
        }
    }
}

/// Tout ce dont dépend un mois calculé. Une différence vide le cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceFingerprint {
    pub calendar: CalendarFingerprint,
    pub holiday_revision: u64,
}

/// Compteurs d'utilisation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Mois calculés, précalcul compris.
    pub computed: u64,
    pub invalidations: u64,
}
