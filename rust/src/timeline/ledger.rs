//! Equipment ledger: per-equipment busy intervals for one scheduling run.

use chrono::{DateTime, TimeDelta, Utc};
use rustc_hash::FxHashMap;

use crate::error::PlannerError;
use crate::log_debug;
use crate::models::Equipment;

/// Error types for ledger operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Equipment id was not declared in the run's inventory.
    UnknownEquipment(String),
    /// Interval would overlap an existing reservation.
    DoubleBooking {
        equipment: String,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    /// Interval with `end <= start`.
    EmptyInterval {
        equipment: String,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

impl std::fmt::Display for LedgerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LedgerError::UnknownEquipment(id) => {
                write!(f, "Equipment '{}' is not in the inventory", id)
            }
            LedgerError::DoubleBooking {
                equipment,
                start,
                end,
            } => write!(
                f,
                "Equipment '{}' is already booked during {} - {}",
                equipment, start, end
            ),
            LedgerError::EmptyInterval {
                equipment,
                start,
                end,
            } => write!(
                f,
                "Cannot reserve '{}' for empty interval {} - {}",
                equipment, start, end
            ),
        }
    }
}

impl std::error::Error for LedgerError {}

impl From<LedgerError> for PlannerError {
    fn from(err: LedgerError) -> Self {
        PlannerError::Internal(err.to_string())
    }
}

/// Sorted set of half-open `[start, end)` busy intervals for one piece of equipment.
///
/// Invariant: sorted by start and pairwise non-overlapping. Adjacent intervals are
/// kept as separate entries (no merging). Because intervals never overlap, the end
/// times are sorted as well, which the binary searches below rely on.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BusyIntervals {
    periods: Vec<(DateTime<Utc>, DateTime<Utc>)>,
}

impl BusyIntervals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn periods(&self) -> &[(DateTime<Utc>, DateTime<Utc>)] {
        &self.periods
    }

    pub fn len(&self) -> usize {
        self.periods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    /// True if `[start, end)` overlaps any interval. Touching endpoints do not overlap.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        if start >= end {
            return false;
        }
        // First interval that ends after our start is the only candidate
        let idx = self.periods.partition_point(|(_, busy_end)| *busy_end <= start);
        match self.periods.get(idx) {
            Some((busy_start, _)) => *busy_start < end,
            None => false,
        }
    }

    /// Insert `[start, end)` keeping the set sorted.
    ///
    /// Returns false (and leaves the set unchanged) if the interval overlaps.
    pub fn insert(&mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        if self.overlaps(start, end) {
            return false;
        }
        let idx = self.periods.partition_point(|(s, _)| *s < start);
        self.periods.insert(idx, (start, end));
        true
    }

    /// Latest end time `<= preferred_end` such that `[end - duration, end)` is free.
    ///
    /// Walks bookings backwards from the preferred end; every booking that overlaps the
    /// candidate window pulls the candidate end back to that booking's start.
    pub fn latest_free_end(
        &self,
        duration: TimeDelta,
        preferred_end: DateTime<Utc>,
    ) -> DateTime<Utc> {
        let mut end = preferred_end;
        for &(busy_start, busy_end) in self.periods.iter().rev() {
            if busy_start >= end {
                continue;
            }
            match end.checked_sub_signed(duration) {
                Some(window_start) if busy_end <= window_start => break,
                _ => {}
            }
            end = busy_start;
        }
        end
    }
}

/// Busy intervals for every equipment id in a scheduling run.
#[derive(Clone, Debug)]
pub struct EquipmentLedger {
    schedules: FxHashMap<String, BusyIntervals>,
    verbosity: u8,
}

impl EquipmentLedger {
    /// Create an empty ledger for the given inventory.
    pub fn new(inventory: &[Equipment], verbosity: u8) -> Self {
        let schedules = inventory
            .iter()
            .map(|eq| (eq.id.clone(), BusyIntervals::new()))
            .collect();
        Self {
            schedules,
            verbosity,
        }
    }

    fn schedule(&self, equipment_id: &str) -> Result<&BusyIntervals, LedgerError> {
        self.schedules
            .get(equipment_id)
            .ok_or_else(|| LedgerError::UnknownEquipment(equipment_id.to_string()))
    }

    /// Bookings for one piece of equipment, sorted by start.
    pub fn bookings(&self, equipment_id: &str) -> Option<&[(DateTime<Utc>, DateTime<Utc>)]> {
        self.schedules.get(equipment_id).map(BusyIntervals::periods)
    }

    pub fn conflict(
        &self,
        equipment_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<bool, LedgerError> {
        Ok(self.schedule(equipment_id)?.overlaps(start, end))
    }

    pub fn reserve(
        &mut self,
        equipment_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        if end <= start {
            return Err(LedgerError::EmptyInterval {
                equipment: equipment_id.to_string(),
                start,
                end,
            });
        }
        let schedule = self
            .schedules
            .get_mut(equipment_id)
            .ok_or_else(|| LedgerError::UnknownEquipment(equipment_id.to_string()))?;
        if !schedule.insert(start, end) {
            return Err(LedgerError::DoubleBooking {
                equipment: equipment_id.to_string(),
                start,
                end,
            });
        }
        log_debug!(
            self.verbosity,
            "    ledger {}: {} bookings after adding {} - {}",
            equipment_id,
            schedule.len(),
            start,
            end
        );
        Ok(())
    }

    /// Latest feasible end `<= preferred_end` for a `duration` booking on `equipment_id`.
    pub fn find_next_free_slot_backward(
        &self,
        equipment_id: &str,
        duration: TimeDelta,
        preferred_end: DateTime<Utc>,
    ) -> Result<DateTime<Utc>, LedgerError> {
        let schedule = self.schedule(equipment_id)?;
        let end = schedule.latest_free_end(duration, preferred_end);
        log_debug!(
            self.verbosity,
            "    slot search {}: preferred end {}, found {} ({} bookings)",
            equipment_id,
            preferred_end,
            end,
            schedule.len()
        );
        Ok(end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EquipmentType;
    use chrono::TimeZone;

    fn t(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, hour, minute, 0).unwrap()
    }

    fn mins(m: i64) -> TimeDelta {
        TimeDelta::minutes(m)
    }

    fn oven_ledger() -> EquipmentLedger {
        let oven = Equipment {
            id: "oven-1".to_string(),
            name: "Oven".to_string(),
            equipment_type: EquipmentType::Oven,
            capacity: 1,
        };
        EquipmentLedger::new(&[oven], 0)
    }

    #[test]
    fn test_empty_ledger_has_no_conflicts() {
        let ledger = oven_ledger();
        assert!(!ledger.conflict("oven-1", t(17, 0), t(18, 0)).unwrap());
        assert_eq!(
            ledger
                .find_next_free_slot_backward("oven-1", mins(20), t(18, 0))
                .unwrap(),
            t(18, 0)
        );
    }

    #[test]
    fn test_touching_intervals_do_not_conflict() {
        let mut ledger = oven_ledger();
        ledger.reserve("oven-1", t(17, 40), t(18, 0)).unwrap();
        assert!(!ledger.conflict("oven-1", t(17, 20), t(17, 40)).unwrap());
        assert!(!ledger.conflict("oven-1", t(18, 0), t(18, 30)).unwrap());
        assert!(ledger.conflict("oven-1", t(17, 30), t(17, 50)).unwrap());
        assert!(ledger.conflict("oven-1", t(17, 0), t(19, 0)).unwrap());
    }

    #[test]
    fn test_reserve_keeps_sorted_without_merging() {
        let mut ledger = oven_ledger();
        ledger.reserve("oven-1", t(17, 40), t(18, 0)).unwrap();
        ledger.reserve("oven-1", t(16, 0), t(16, 30)).unwrap();
        ledger.reserve("oven-1", t(17, 20), t(17, 40)).unwrap();
        assert_eq!(
            ledger.bookings("oven-1").unwrap(),
            &[
                (t(16, 0), t(16, 30)),
                (t(17, 20), t(17, 40)),
                (t(17, 40), t(18, 0))
            ]
        );
    }

    #[test]
    fn test_reserve_rejects_double_booking() {
        let mut ledger = oven_ledger();
        ledger.reserve("oven-1", t(17, 40), t(18, 0)).unwrap();
        let err = ledger.reserve("oven-1", t(17, 50), t(18, 10)).unwrap_err();
        assert!(matches!(err, LedgerError::DoubleBooking { .. }));
        assert_eq!(ledger.bookings("oven-1").unwrap().len(), 1);
        assert_eq!(PlannerError::from(err).code(), "INTERNAL");
    }

    #[test]
    fn test_reserve_rejects_empty_interval() {
        let mut ledger = oven_ledger();
        assert!(matches!(
            ledger.reserve("oven-1", t(18, 0), t(18, 0)),
            Err(LedgerError::EmptyInterval { .. })
        ));
    }

    #[test]
    fn test_unknown_equipment() {
        let ledger = oven_ledger();
        assert_eq!(
            ledger.conflict("mixer-1", t(17, 0), t(18, 0)),
            Err(LedgerError::UnknownEquipment("mixer-1".to_string()))
        );
    }

    #[test]
    fn test_slot_before_existing_booking() {
        let mut ledger = oven_ledger();
        ledger.reserve("oven-1", t(17, 40), t(18, 0)).unwrap();
        // Window 17:40-18:00 is taken, so the latest fit ends where the booking starts
        assert_eq!(
            ledger
                .find_next_free_slot_backward("oven-1", mins(20), t(18, 0))
                .unwrap(),
            t(17, 40)
        );
    }

    #[test]
    fn test_slot_uses_gap_between_bookings() {
        let mut ledger = oven_ledger();
        ledger.reserve("oven-1", t(16, 0), t(17, 0)).unwrap();
        ledger.reserve("oven-1", t(17, 30), t(18, 0)).unwrap();
        // 30 minute gap fits a 30 minute step
        assert_eq!(
            ledger
                .find_next_free_slot_backward("oven-1", mins(30), t(18, 0))
                .unwrap(),
            t(17, 30)
        );
        // A 40 minute step has to go before the first booking
        assert_eq!(
            ledger
                .find_next_free_slot_backward("oven-1", mins(40), t(18, 0))
                .unwrap(),
            t(16, 0)
        );
    }

    #[test]
    fn test_slot_never_later_than_preferred() {
        let mut ledger = oven_ledger();
        ledger.reserve("oven-1", t(18, 0), t(19, 0)).unwrap();
        assert_eq!(
            ledger
                .find_next_free_slot_backward("oven-1", mins(15), t(17, 30))
                .unwrap(),
            t(17, 30)
        );
    }

    #[test]
    fn test_busy_intervals_overlap_binary_search() {
        let mut set = BusyIntervals::new();
        assert!(set.insert(t(10, 0), t(11, 0)));
        assert!(set.insert(t(12, 0), t(13, 0)));
        assert!(!set.overlaps(t(11, 0), t(12, 0)));
        assert!(set.overlaps(t(12, 59), t(14, 0)));
        assert!(!set.insert(t(10, 30), t(10, 45)));
        assert_eq!(set.len(), 2);
    }
}
