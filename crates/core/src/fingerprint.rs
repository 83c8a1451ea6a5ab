//! Canonical request fingerprints for scan-log entries.
//!
//! Every scan attempt is logged with a fingerprint of its identifying fields
//! so duplicate submissions can be correlated in the audit trail without
//! storing the raw request.

use crate::hashing;
use crate::types::{DbId, Timestamp};

/// Compute the fingerprint for a scan request.
///
/// The canonical form is `ticket_id|event_id|device_id|location|timestamp`,
/// hashed with SHA-256. Identical requests produce identical fingerprints;
/// any field change produces a new one.
pub fn scan_fingerprint(
    ticket_id: DbId,
    event_id: DbId,
    device_id: &str,
    location: &str,
    timestamp: Timestamp,
) -> String {
    let canonical = format!(
        "{ticket_id}|{event_id}|{device_id}|{location}|{}",
        timestamp.to_rfc3339(),
    );
    hashing::sha256_hex(canonical.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts() -> Timestamp {
        "2026-06-01T12:00:00Z".parse().unwrap()
    }

    #[test]
    fn identical_requests_share_a_fingerprint() {
        let a = scan_fingerprint(1, 2, "D1", "gate-A", ts());
        let b = scan_fingerprint(1, 2, "D1", "gate-A", ts());
        assert_eq!(a, b);
    }

    #[test]
    fn any_field_change_changes_the_fingerprint() {
        let base = scan_fingerprint(1, 2, "D1", "gate-A", ts());
        assert_ne!(base, scan_fingerprint(9, 2, "D1", "gate-A", ts()));
        assert_ne!(base, scan_fingerprint(1, 9, "D1", "gate-A", ts()));
        assert_ne!(base, scan_fingerprint(1, 2, "D2", "gate-A", ts()));
        assert_ne!(base, scan_fingerprint(1, 2, "D1", "gate-B", ts()));
        assert_ne!(
            base,
            scan_fingerprint(1, 2, "D1", "gate-A", ts() + chrono::Duration::seconds(1)),
        );
    }

    #[test]
    fn fingerprint_is_hex_sha256() {
        let fp = scan_fingerprint(1, 2, "D1", "gate-A", ts());
        assert_eq!(fp.len(), 64);
    }
}
