//! Port Allocator Service
//!
//! Pure domain logic for picking the port of a new casker.
//! This service has NO external dependencies - it's pure Rust.

use crate::domain::entities::CaskerRecord;
use crate::domain::value_objects::PortRange;
use std::collections::HashSet;

/// Port allocator for new caskers.
///
/// Picks the smallest port of the range that no existing record uses.
/// The allocator only sees the snapshot it is given: two callers working
/// from the same snapshot get the same port.
pub struct PortAllocator;

impl PortAllocator {
    /// Select the first free port in `range`.
    ///
    /// # Arguments
    /// * `range` - Inclusive window of candidate ports
    /// * `records` - Existing records, in any order, duplicates allowed
    ///
    /// # Returns
    /// The minimum port of `range` not used by any record, or
    /// `AllocationError::Exhausted` when every port is taken.
    ///
    /// # Example
    /// ```ignore
    /// let records = store.fetch_all(&SortSpec::by_port_desc()).await?;
    /// let port = PortAllocator::allocate(&range, &records)?;
    /// ```
    pub fn allocate<'a, I>(range: &PortRange, records: I) -> Result<u16, AllocationError>
    where
        I: IntoIterator<Item = &'a CaskerRecord>,
    {
        let used = Self::used_ports(records);

        range
            .iter()
            .find(|port| !used.contains(port))
            .ok_or(AllocationError::Exhausted {
                start: range.start(),
                end: range.end(),
            })
    }

    /// Collect the set of ports used by `records`.
    pub fn used_ports<'a, I>(records: I) -> HashSet<u16>
    where
        I: IntoIterator<Item = &'a CaskerRecord>,
    {
        records.into_iter().map(|record| record.port).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AllocationError {
    #[error("no available port found in the specified range ({start}-{end})")]
    Exhausted { start: u16, end: u16 },
}

#[cfg(test)]
mod tests {
    use super::*;

    // ===== Test Helpers =====

    fn record(port: u16) -> CaskerRecord {
        CaskerRecord {
            id: format!("rec-{}", port),
            name: format!("casker-{}", port),
            email: "owner@example.com".to_string(),
            port,
            active: true,
            icon: vec!["icon.png".to_string()],
        }
    }

    fn records(ports: &[u16]) -> Vec<CaskerRecord> {
        ports.iter().copied().map(record).collect()
    }

    fn range(start: u16, end: u16) -> PortRange {
        PortRange::new(start, end).unwrap()
    }

    // ===== Scenarios =====

    #[test]
    fn test_allocate_after_contiguous_prefix() {
        let existing = records(&[8090, 8091, 8092]);
        let port = PortAllocator::allocate(&range(8090, 8190), &existing).unwrap();
        assert_eq!(port, 8093);
    }

    #[test]
    fn test_allocate_full_range_exhausted() {
        let ports: Vec<u16> = (8092..=8190).collect();
        let existing = records(&ports);

        let result = PortAllocator::allocate(&range(8092, 8190), &existing);

        assert_eq!(
            result,
            Err(AllocationError::Exhausted {
                start: 8092,
                end: 8190
            })
        );
    }

    #[test]
    fn test_allocate_empty_records_returns_start() {
        let port = PortAllocator::allocate(&range(8090, 8190), &records(&[])).unwrap();
        assert_eq!(port, 8090);
    }

    #[test]
    fn test_allocate_with_duplicate_ports() {
        let existing = records(&[8095, 8090, 8090]);
        let port = PortAllocator::allocate(&range(8090, 8190), &existing).unwrap();
        assert_eq!(port, 8091);
    }

    // ===== Edge Cases =====

    #[test]
    fn test_allocate_fills_gap() {
        let existing = records(&[8092, 8093, 8095, 8096]);
        let port = PortAllocator::allocate(&range(8092, 8190), &existing).unwrap();
        assert_eq!(port, 8094);
    }

    #[test]
    fn test_allocate_last_port_free() {
        let ports: Vec<u16> = (8092..8190).collect();
        let existing = records(&ports);
        let port = PortAllocator::allocate(&range(8092, 8190), &existing).unwrap();
        assert_eq!(port, 8190);
    }

    #[test]
    fn test_allocate_ignores_ports_outside_range() {
        let existing = records(&[80, 8091, 9000]);
        let port = PortAllocator::allocate(&range(8092, 8094), &existing).unwrap();
        assert_eq!(port, 8092);
    }

    #[test]
    fn test_allocate_single_port_range() {
        assert_eq!(PortAllocator::allocate(&range(8092, 8092), &records(&[])).unwrap(), 8092);

        let taken = records(&[8092]);
        assert!(PortAllocator::allocate(&range(8092, 8092), &taken).is_err());
    }

    #[test]
    fn test_allocate_upper_u16_bound() {
        let existing = records(&[u16::MAX - 1]);
        let port = PortAllocator::allocate(&range(u16::MAX - 1, u16::MAX), &existing).unwrap();
        assert_eq!(port, u16::MAX);

        let full = records(&[u16::MAX - 1, u16::MAX]);
        assert!(PortAllocator::allocate(&range(u16::MAX - 1, u16::MAX), &full).is_err());
    }

    // ===== Properties =====

    #[test]
    fn test_allocate_is_order_independent() {
        let mut existing = records(&[8090, 8093, 8091, 8092, 8097]);
        let expected = PortAllocator::allocate(&range(8090, 8190), &existing).unwrap();

        existing.reverse();
        assert_eq!(PortAllocator::allocate(&range(8090, 8190), &existing).unwrap(), expected);

        existing.rotate_left(2);
        assert_eq!(PortAllocator::allocate(&range(8090, 8190), &existing).unwrap(), expected);
        assert_eq!(expected, 8094);
    }

    #[test]
    fn test_allocate_is_idempotent_and_does_not_mutate() {
        let existing = records(&[8090, 8092]);
        let before = existing.clone();

        let first = PortAllocator::allocate(&range(8090, 8190), &existing);
        let second = PortAllocator::allocate(&range(8090, 8190), &existing);

        assert_eq!(first, second);
        assert_eq!(existing, before);
    }

    #[test]
    fn test_used_ports_collapses_duplicates() {
        let used = PortAllocator::used_ports(&records(&[8090, 8090, 8091]));
        assert_eq!(used.len(), 2);
        assert!(used.contains(&8090));
        assert!(used.contains(&8091));
    }

    #[test]
    fn test_exhausted_error_message() {
        let err = AllocationError::Exhausted {
            start: 8092,
            end: 8190,
        };
        assert!(err
            .to_string()
            .contains("no available port found in the specified range"));
    }
}
