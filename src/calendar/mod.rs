mod month;
mod prewarm;
mod types;

pub use month::{compute_month, render_month};
pub use types::{CacheOptions, CacheStats, SourceFingerprint};

use crate::holiday::HolidayProvider;
use crate::lunar::LunarCalendar;
use crate::model::{MonthInfo, YearMonth};
use crate::settings::{Settings, SettingsProvider};
use lru::LruCache;
use parking_lot::{Mutex, RwLock};
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{debug, info};

/// Cache borné (LRU) des mois calculés, vidé en bloc dès que la rotation,
/// le respect des jours fériés ou le jeu de jours fériés change.
pub struct MonthCalendarCache {
    inner: Arc<Inner>,
    prewarm_tasks: Mutex<Vec<JoinHandle<()>>>,
}

pub(super) struct Inner {
    settings: Arc<dyn SettingsProvider>,
    holidays: Arc<dyn HolidayProvider>,
    lunar: Arc<dyn LunarCalendar>,
    options: CacheOptions,
    state: RwLock<CacheState>,
    hits: AtomicU64,
    misses: AtomicU64,
    computed: AtomicU64,
    invalidations: AtomicU64,
}

struct CacheState {
    months: LruCache<YearMonth, Arc<MonthInfo>>,
    /// Incrémenté à chaque vidage ; un calcul lancé sous une génération
    /// antérieure n'est jamais inséré.
    generation: u64,
    fingerprint: Option<SourceFingerprint>,
}

/// Instantané des entrées utilisé pour un calcul.
pub(super) struct Snapshot {
    generation: u64,
    settings: Settings,
}

impl MonthCalendarCache {
    pub fn new(
        settings: Arc<dyn SettingsProvider>,
        holidays: Arc<dyn HolidayProvider>,
        lunar: Arc<dyn LunarCalendar>,
        options: CacheOptions,
    ) -> Self {
        let capacity = NonZeroUsize::new(options.capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Arc::new(Inner {
                settings,
                holidays,
                lunar,
                options,
                state: RwLock::new(CacheState {
                    months: LruCache::new(capacity),
                    generation: 0,
                    fingerprint: None,
                }),
                hits: AtomicU64::new(0),
                misses: AtomicU64::new(0),
                computed: AtomicU64::new(0),
                invalidations: AtomicU64::new(0),
            }),
            prewarm_tasks: Mutex::new(Vec::new()),
        }
    }

    /// Mois demandé, calculé en cas d'absence. Rafraîchit la récence.
    pub fn get(&self, year_month: YearMonth) -> Arc<MonthInfo> {
        let snapshot = self.inner.refresh();

        if let Some(month) = self.inner.state.write().months.get(&year_month).cloned() {
            self.inner.hits.fetch_add(1, Ordering::Relaxed);
            debug!(%year_month, "month cache hit");
            return month;
        }

        self.inner.misses.fetch_add(1, Ordering::Relaxed);
        debug!(%year_month, "month cache miss");
        self.inner.holidays.ensure_year_synced(year_month.year());

        let month = self.inner.compute(year_month, &snapshot);
        self.inner.insert(year_month, Arc::clone(&month), snapshot.generation);

        if self.inner.options.prewarm {
            self.spawn_prewarm(year_month, snapshot);
        }
        month
    }

    /// Lecture sans calcul ni mise à jour de la récence.
    pub fn peek(&self, year_month: YearMonth) -> Option<Arc<MonthInfo>> {
        self.inner.state.read().months.peek(&year_month).cloned()
    }

    pub fn contains(&self, year_month: YearMonth) -> bool {
        self.inner.state.read().months.contains(&year_month)
    }

    /// Vide intégralement le cache.
    pub fn invalidate_all(&self) {
        self.inner.invalidate_all();
    }

    /// Compare les sources à l'instantané courant et vide le cache au moindre
    /// changement.
    pub fn refresh(&self) {
        self.inner.refresh();
    }

    pub fn len(&self) -> usize {
        self.inner.state.read().months.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.inner.hits.load(Ordering::Relaxed),
            misses: self.inner.misses.load(Ordering::Relaxed),
            computed: self.inner.computed.load(Ordering::Relaxed),
            invalidations: self.inner.invalidations.load(Ordering::Relaxed),
        }
    }

    /// Attend la fin des précalculs en cours.
    pub fn wait_prewarm(&self) {
        let tasks: Vec<_> = self.prewarm_tasks.lock().drain(..).collect();
        for task in tasks {
            prewarm::join(task);
        }
    }

    fn spawn_prewarm(&self, requested: YearMonth, snapshot: Snapshot) {
        let mut tasks = self.prewarm_tasks.lock();
        tasks.retain(|t| !t.is_finished());
        if let Some(task) = prewarm::spawn(Arc::clone(&self.inner), requested, snapshot) {
            tasks.push(task);
        }
    }
}

impl Inner {
    fn current_fingerprint(&self, settings: &Settings) -> SourceFingerprint {
        SourceFingerprint {
            calendar: settings.calendar_fingerprint(),
            holiday_revision: self.holidays.revision(),
        }
    }

    fn refresh(&self) -> Snapshot {
        let settings = self.settings.settings();
        let fingerprint = self.current_fingerprint(&settings);

        {
            let state = self.state.read();
            if state.fingerprint == Some(fingerprint) {
                return Snapshot {
                    generation: state.generation,
                    settings,
                };
            }
        }

        let mut state = self.state.write();
        // relu sous verrou : un autre appel a pu installer des réglages plus récents
        let settings = self.settings.settings();
        let fingerprint = self.current_fingerprint(&settings);
        if state.fingerprint != Some(fingerprint) {
            if state.fingerprint.is_some() {
                info!("rotation settings or holiday data changed, clearing month cache");
                self.invalidations.fetch_add(1, Ordering::Relaxed);
            }
            state.months.clear();
            state.generation += 1;
            state.fingerprint = Some(fingerprint);
        }
        Snapshot {
            generation: state.generation,
            settings,
        }
    }

    fn invalidate_all(&self) {
        let mut state = self.state.write();
        state.months.clear();
        state.generation += 1;
        self.invalidations.fetch_add(1, Ordering::Relaxed);
        info!("month cache invalidated");
    }

    pub(super) fn generation(&self) -> u64 {
        self.state.read().generation
    }

    pub(super) fn compute(&self, year_month: YearMonth, snapshot: &Snapshot) -> Arc<MonthInfo> {
        let config = snapshot.settings.rotation_config();
        let records = self.holidays.all_records();
        let month = compute_month(
            year_month,
            &config,
            snapshot.settings.honor_holidays,
            &records,
            self.lunar.as_ref(),
        );
        self.computed.fetch_add(1, Ordering::Relaxed);
        Arc::new(month)
    }

    /// Insère sauf si le cache a été vidé depuis le début du calcul.
    pub(super) fn insert(
        &self,
        year_month: YearMonth,
        month: Arc<MonthInfo>,
        generation: u64,
    ) -> bool {
        let mut state = self.state.write();
        if state.generation != generation {
            debug!(%year_month, "discarding month computed for a stale generation");
            return false;
        }
        state.months.put(year_month, month);
        true
    }

    /// Insertion de précalcul : n'écrase pas un mois déjà présent.
    pub(super) fn insert_if_absent(
        &self,
        year_month: YearMonth,
        month: Arc<MonthInfo>,
        generation: u64,
    ) -> bool {
        let mut state = self.state.write();
        if state.generation != generation || state.months.contains(&year_month) {
            return false;
        }
        state.months.put(year_month, month);
        true
    }

    pub(super) fn contains(&self, year_month: YearMonth) -> bool {
        self.state.read().months.contains(&year_month)
    }
}
