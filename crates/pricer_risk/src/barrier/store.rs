//! Hit-state store for barrier features.
//!
//! The store is the only cross-call mutable state in the engine. Every
//! update goes through [`BarrierStateStore::observe`], which performs one
//! read-modify-write under the lock, so concurrent valuations of the same
//! instrument cannot lose a hit.
//!
//! Records are keyed by [`BarrierKey`], the barrier id scoped to its
//! instrument, so barriers sharing an id across notes stay independent.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard};

use pricer_core::types::{Date, PricingError};
use pricer_models::instruments::{BarrierHitState, BarrierId};
use tracing::info;

/// Identity of one barrier within the book.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BarrierKey {
    /// Owning instrument.
    pub instrument_id: String,
    /// Barrier id within the instrument.
    pub barrier_id: BarrierId,
}

impl BarrierKey {
    /// Key for `barrier_id` on `instrument_id`.
    pub fn new(instrument_id: impl Into<String>, barrier_id: BarrierId) -> Self {
        Self {
            instrument_id: instrument_id.into(),
            barrier_id,
        }
    }
}

impl fmt::Display for BarrierKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.instrument_id, self.barrier_id)
    }
}

/// Stored state of one barrier.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BarrierRecord {
    /// Hit history; never cleared.
    pub hit_state: BarrierHitState,
    /// Whether the last observation was at or through the level.
    pub breached: bool,
}

/// Change caused by an observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Nothing changed.
    Unchanged,
    /// First recorded hit.
    Hit,
    /// A recoverable barrier moved back outside its level.
    Recovered,
    /// A recovered barrier was breached again.
    Rebreached,
}

/// One observation of a barrier against a spot level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarrierObservationSample {
    /// Observation date.
    pub date: Date,
    /// Spot observed.
    pub level: f64,
    /// Whether the spot is at or through the barrier.
    pub breached: bool,
    /// Whether the barrier type may recover.
    pub recoverable: bool,
}

/// Thread-safe store keyed by instrument and barrier identifier.
#[derive(Debug, Default)]
pub struct BarrierStateStore {
    records: Mutex<HashMap<BarrierKey, BarrierRecord>>,
}

impl BarrierStateStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<BarrierKey, BarrierRecord>>, PricingError> {
        self.records
            .lock()
            .map_err(|_| PricingError::InternalConsistency("barrier state store lock poisoned".to_string()))
    }

    /// Current record, seeded from `seed` when the barrier is unknown.
    pub fn current(&self, key: &BarrierKey, seed: BarrierHitState) -> Result<BarrierRecord, PricingError> {
        let records = self.lock()?;
        Ok(records.get(key).copied().unwrap_or(BarrierRecord {
            hit_state: seed,
            breached: false,
        }))
    }

    /// Applies one observation atomically and returns the updated record.
    ///
    /// Non-recoverable barriers stay breached once hit. The first hit date
    /// and level are kept across recoveries.
    pub fn observe(
        &self,
        key: &BarrierKey,
        seed: BarrierHitState,
        sample: BarrierObservationSample,
    ) -> Result<(BarrierRecord, Transition), PricingError> {
        let mut records = self.lock()?;
        let record = records.entry(key.clone()).or_insert(BarrierRecord {
            hit_state: seed,
            breached: false,
        });

        let permanent = record.hit_state.has_been_hit && !sample.recoverable;
        let transition = match (record.hit_state.has_been_hit, record.breached, sample.breached) {
            (false, _, true) => {
                record.hit_state = BarrierHitState::hit(sample.date, sample.level);
                record.breached = true;
                Transition::Hit
            }
            _ if permanent => {
                record.breached = true;
                Transition::Unchanged
            }
            (true, true, false) => {
                record.breached = false;
                Transition::Recovered
            }
            (true, false, true) => {
                record.breached = true;
                Transition::Rebreached
            }
            _ => Transition::Unchanged,
        };

        match transition {
            Transition::Hit => info!(barrier = %key, date = %sample.date, level = sample.level, "barrier hit"),
            Transition::Recovered => info!(barrier = %key, date = %sample.date, level = sample.level, "barrier recovered"),
            Transition::Rebreached => info!(barrier = %key, date = %sample.date, level = sample.level, "barrier breached again"),
            Transition::Unchanged => {}
        }
        Ok((*record, transition))
    }

    /// Number of tracked barriers.
    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    /// Whether no barrier is tracked.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn date(day: u32) -> Date {
        Date::from_ymd(2024, 3, day).unwrap()
    }

    fn key(instrument: &str, barrier: &str) -> BarrierKey {
        BarrierKey::new(instrument, BarrierId::new(barrier))
    }

    fn sample(day: u32, level: f64, breached: bool, recoverable: bool) -> BarrierObservationSample {
        BarrierObservationSample {
            date: date(day),
            level,
            breached,
            recoverable,
        }
    }

    #[test]
    fn test_first_hit_is_recorded() {
        let store = BarrierStateStore::new();
        let id = key("NOTE", "KO");
        let (record, t) = store.observe(&id, BarrierHitState::default(), sample(1, 97.0, true, false)).unwrap();
        assert_eq!(t, Transition::Hit);
        assert!(record.hit_state.has_been_hit);
        assert_eq!(record.hit_state.hit_date, Some(date(1)));
        assert_eq!(record.hit_state.hit_level, Some(97.0));
    }

    #[test]
    fn test_knock_out_never_recovers() {
        let store = BarrierStateStore::new();
        let id = key("NOTE", "KO");
        store.observe(&id, BarrierHitState::default(), sample(1, 97.0, true, false)).unwrap();
        let (record, t) = store.observe(&id, BarrierHitState::default(), sample(2, 120.0, false, false)).unwrap();
        assert_eq!(t, Transition::Unchanged);
        assert!(record.breached);
        assert_eq!(record.hit_state.hit_date, Some(date(1)));
    }

    #[test]
    fn test_coupon_barrier_recovers_and_keeps_history() {
        let store = BarrierStateStore::new();
        let id = key("NOTE", "CPN");
        store.observe(&id, BarrierHitState::default(), sample(1, 60.0, true, true)).unwrap();
        let (record, t) = store.observe(&id, BarrierHitState::default(), sample(2, 80.0, false, true)).unwrap();
        assert_eq!(t, Transition::Recovered);
        assert!(!record.breached);
        assert_eq!(record.hit_state.hit_level, Some(60.0));

        let (_, t) = store.observe(&id, BarrierHitState::default(), sample(3, 55.0, true, true)).unwrap();
        assert_eq!(t, Transition::Rebreached);
    }

    #[test]
    fn test_seeded_permanent_hit() {
        let store = BarrierStateStore::new();
        let id = key("NOTE", "KI");
        let seed = BarrierHitState::hit(date(1), 70.0);
        let (record, t) = store.observe(&id, seed, sample(5, 100.0, false, false)).unwrap();
        assert_eq!(t, Transition::Unchanged);
        assert!(record.breached);
    }

    #[test]
    fn test_shared_barrier_id_is_scoped_to_instrument() {
        let store = BarrierStateStore::new();
        let first = key("NOTE-A", "KO");
        let second = key("NOTE-B", "KO");
        store.observe(&first, BarrierHitState::default(), sample(1, 90.0, true, false)).unwrap();

        let record = store.current(&second, BarrierHitState::default()).unwrap();
        assert!(!record.hit_state.has_been_hit);
        assert!(!record.breached);

        let (_, t) = store.observe(&second, BarrierHitState::default(), sample(2, 120.0, false, false)).unwrap();
        assert_eq!(t, Transition::Unchanged);
        assert_eq!(store.len(), 2);
        assert_eq!(first.to_string(), "NOTE-A/KO");
    }

    #[test]
    fn test_concurrent_hits_are_recorded_once() {
        let store = Arc::new(BarrierStateStore::new());
        let id = key("NOTE", "RACE");
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                let id = id.clone();
                std::thread::spawn(move || {
                    store
                        .observe(&id, BarrierHitState::default(), sample(1, 90.0 + i as f64, true, false))
                        .unwrap()
                        .1
                })
            })
            .collect();
        let hits = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|t| *t == Transition::Hit)
            .count();
        assert_eq!(hits, 1);
        assert_eq!(store.len(), 1);
    }
}
