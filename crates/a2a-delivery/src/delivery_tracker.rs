//! Tracks the last-known delivery status of each outbound envelope, as
//! reported by receipts or by the delivery attempt itself.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use a2a_types::envelope::ReceiptStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryRecord {
    pub status: ReceiptStatus,
    pub updated_at: DateTime<Utc>,
}

pub struct DeliveryTracker {
    records: DashMap<Uuid, DeliveryRecord>,
}

impl Default for DeliveryTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl DeliveryTracker {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
        }
    }

    /// Records a status update, but only moves forward through
    /// Sent → Delivered → Read; a `Failed` update always overwrites, and an
    /// update that would move backward (e.g. a stale `Delivered` arriving
    /// after `Read`) is ignored. Returns whether the update was applied, so
    /// callers can gate an event emission on it actually taking effect.
    pub fn record(&self, message_id: Uuid, status: ReceiptStatus, at: DateTime<Utc>) -> bool {
        let rank = |s: ReceiptStatus| match s {
            ReceiptStatus::Sent => 0,
            ReceiptStatus::Delivered => 1,
            ReceiptStatus::Read => 2,
            ReceiptStatus::Failed => 3,
        };
        let should_ignore = match self.records.get(&message_id) {
            Some(existing) => existing.status != ReceiptStatus::Failed && rank(status) < rank(existing.status),
            None => false,
        };
        if should_ignore {
            return false;
        }
        self.records.insert(message_id, DeliveryRecord { status, updated_at: at });
        true
    }

    pub fn status_of(&self, message_id: Uuid) -> Option<DeliveryRecord> {
        self.records.get(&message_id).map(|r| *r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_message_has_no_record() {
        let tracker = DeliveryTracker::new();
        assert!(tracker.status_of(Uuid::new_v4()).is_none());
    }

    #[test]
    fn test_records_progress_sent_to_delivered_to_read() {
        let tracker = DeliveryTracker::new();
        let id = Uuid::new_v4();
        let now = Utc::now();
        tracker.record(id, ReceiptStatus::Sent, now);
        tracker.record(id, ReceiptStatus::Delivered, now);
        tracker.record(id, ReceiptStatus::Read, now);
        assert_eq!(tracker.status_of(id).expect("present").status, ReceiptStatus::Read);
    }

    #[test]
    fn test_stale_backward_update_is_ignored() {
        let tracker = DeliveryTracker::new();
        let id = Uuid::new_v4();
        let now = Utc::now();
        tracker.record(id, ReceiptStatus::Read, now);
        tracker.record(id, ReceiptStatus::Delivered, now);
        assert_eq!(tracker.status_of(id).expect("present").status, ReceiptStatus::Read);
    }

    #[test]
    fn test_record_reports_whether_it_applied() {
        let tracker = DeliveryTracker::new();
        let id = Uuid::new_v4();
        let now = Utc::now();
        assert!(tracker.record(id, ReceiptStatus::Read, now));
        assert!(!tracker.record(id, ReceiptStatus::Delivered, now));
    }

    #[test]
    fn test_failed_always_overwrites() {
        let tracker = DeliveryTracker::new();
        let id = Uuid::new_v4();
        let now = Utc::now();
        tracker.record(id, ReceiptStatus::Read, now);
        tracker.record(id, ReceiptStatus::Failed, now);
        assert_eq!(tracker.status_of(id).expect("present").status, ReceiptStatus::Failed);
    }
}
