//! Value Objects - Immutable domain primitives
//!
//! Value objects are identified by their value rather than identity.
//! They are immutable and can be freely shared.

use serde::{Deserialize, Serialize};

/// Inclusive window of candidate ports handed out to new caskers.
///
/// Both bounds are part of the range. A range is constant for the
/// duration of one allocation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "PortBounds")]
pub struct PortRange {
    start: u16,
    end: u16,
}

/// Unchecked wire form of a `PortRange`.
#[derive(Deserialize)]
struct PortBounds {
    start: u16,
    end: u16,
}

impl TryFrom<PortBounds> for PortRange {
    type Error = RangeError;

    fn try_from(bounds: PortBounds) -> Result<Self, Self::Error> {
        PortRange::new(bounds.start, bounds.end)
    }
}

impl PortRange {
    /// Create a range, rejecting `start > end`.
    pub fn new(start: u16, end: u16) -> Result<Self, RangeError> {
        if start > end {
            return Err(RangeError::Inverted { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> u16 {
        self.start
    }

    pub fn end(&self) -> u16 {
        self.end
    }

    /// Check if a port is inside this range.
    pub fn contains(&self, port: u16) -> bool {
        port >= self.start && port <= self.end
    }

    /// Number of ports in the range.
    pub fn len(&self) -> usize {
        usize::from(self.end - self.start) + 1
    }

    /// A valid range always holds at least one port.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Candidate ports in strictly increasing order.
    pub fn iter(&self) -> std::ops::RangeInclusive<u16> {
        self.start..=self.end
    }
}

impl std::fmt::Display for PortRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RangeError {
    #[error("invalid port range: start {start} is greater than end {end}")]
    Inverted { start: u16, end: u16 },
}

/// How a submission carrying several icon files is turned into records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum IconPolicy {
    /// One record per icon, each with the same name, email and port.
    #[default]
    RecordPerFile,
    /// A single record with every icon attached.
    SingleRecord,
}

impl IconPolicy {
    /// Parse a policy name. Unknown values fall back to the default.
    ///
    /// ```
    /// use casker_intake::domain::value_objects::IconPolicy;
    ///
    /// assert_eq!(IconPolicy::from_str("single"), IconPolicy::SingleRecord);
    /// assert_eq!(IconPolicy::from_str("whatever"), IconPolicy::RecordPerFile);
    /// ```
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "single" | "single-record" => Self::SingleRecord,
            _ => Self::RecordPerFile,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RecordPerFile => "per-file",
            Self::SingleRecord => "single",
        }
    }
}

impl std::fmt::Display for IconPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Direction of a sort request sent to the record store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Sort request for listing records, rendered the PocketBase way
/// (`port` ascending, `-port` descending).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn ascending(field: &str) -> Self {
        Self {
            field: field.to_string(),
            direction: SortDirection::Ascending,
        }
    }

    pub fn descending(field: &str) -> Self {
        Self {
            field: field.to_string(),
            direction: SortDirection::Descending,
        }
    }

    /// The order the submission flow asks for. Nothing downstream relies on it.
    pub fn by_port_desc() -> Self {
        Self::descending("port")
    }

    /// Render as a query parameter value.
    pub fn to_query(&self) -> String {
        match self.direction {
            SortDirection::Ascending => self.field.clone(),
            SortDirection::Descending => format!("-{}", self.field),
        }
    }
}

impl std::fmt::Display for SortSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_query())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ===== PortRange Tests =====

    #[test]
    fn test_port_range_new_valid() {
        let range = PortRange::new(8092, 8190).unwrap();
        assert_eq!(range.start(), 8092);
        assert_eq!(range.end(), 8190);
        assert_eq!(range.len(), 99);
    }

    #[test]
    fn test_port_range_single_port() {
        let range = PortRange::new(8090, 8090).unwrap();
        assert_eq!(range.len(), 1);
        assert_eq!(range.iter().collect::<Vec<_>>(), vec![8090]);
    }

    #[test]
    fn test_port_range_deserialize_validates() {
        let range: PortRange = serde_json::from_str(r#"{"start":8092,"end":8190}"#).unwrap();
        assert_eq!(range.len(), 99);

        let inverted = serde_json::from_str::<PortRange>(r#"{"start":8190,"end":8092}"#);
        let err = inverted.unwrap_err().to_string();
        assert!(err.contains("start 8190 is greater than end 8092"), "{}", err);
    }

    #[test]
    fn test_port_range_inverted_rejected() {
        let result = PortRange::new(8190, 8090);
        assert_eq!(
            result,
            Err(RangeError::Inverted {
                start: 8190,
                end: 8090
            })
        );
    }

    #[test]
    fn test_port_range_contains_is_inclusive() {
        let range = PortRange::new(8090, 8190).unwrap();
        assert!(range.contains(8090));
        assert!(range.contains(8190));
        assert!(range.contains(8100));
        assert!(!range.contains(8089));
        assert!(!range.contains(8191));
    }

    #[test]
    fn test_port_range_full_u16() {
        let range = PortRange::new(0, u16::MAX).unwrap();
        assert_eq!(range.len(), 65536);
        assert!(!range.is_empty());
    }

    #[test]
    fn test_port_range_display() {
        let range = PortRange::new(8092, 8190).unwrap();
        assert_eq!(range.to_string(), "8092-8190");
    }

    // ===== IconPolicy Tests =====

    #[test]
    fn test_icon_policy_from_str() {
        let tests = vec![
            ("per-file", IconPolicy::RecordPerFile),
            ("single", IconPolicy::SingleRecord),
            ("SINGLE", IconPolicy::SingleRecord),
            ("single-record", IconPolicy::SingleRecord),
            ("", IconPolicy::RecordPerFile),
        ];

        for (input, expected) in tests {
            assert_eq!(IconPolicy::from_str(input), expected, "input: {}", input);
        }
    }

    #[test]
    fn test_icon_policy_roundtrip_names() {
        for policy in [IconPolicy::RecordPerFile, IconPolicy::SingleRecord] {
            assert_eq!(IconPolicy::from_str(policy.as_str()), policy);
        }
    }

    #[test]
    fn test_icon_policy_default() {
        assert_eq!(IconPolicy::default(), IconPolicy::RecordPerFile);
    }

    // ===== SortSpec Tests =====

    #[test]
    fn test_sort_spec_query() {
        assert_eq!(SortSpec::descending("port").to_query(), "-port");
        assert_eq!(SortSpec::ascending("port").to_query(), "port");
        assert_eq!(SortSpec::by_port_desc().to_string(), "-port");
    }
}
