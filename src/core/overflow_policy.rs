//! Back-pressure policies for the bounded async queue
//!
//! When the queue is full, the policy decides whether the producer waits,
//! the new record is discarded, or the oldest queued record is evicted.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Policy for handling a full queue
///
/// # Example
///
/// ```
/// use rust_fast_logger::OverflowPolicy;
/// use std::time::Duration;
///
/// // Default behavior: never lose a record
/// assert_eq!(OverflowPolicy::default(), OverflowPolicy::Block);
///
/// // Wait a little, then give up on the record
/// let policy = OverflowPolicy::BlockWithTimeout(Duration::from_millis(100));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[derive(Default)]
pub enum OverflowPolicy {
    /// Wait until the consumer frees a slot
    ///
    /// A stalled consumer stalls every producer. `close()` wakes waiting
    /// producers, which then fail with `LoggerClosed`.
    #[default]
    Block,

    /// Wait at most the given duration, then drop the record
    BlockWithTimeout(Duration),

    /// Discard the new record and count it as dropped
    DropNewest,

    /// Evict the oldest unconsumed record to make room
    OverwriteOldest,
}

impl OverflowPolicy {
    /// Whether producers may be suspended by this policy
    pub fn may_block(&self) -> bool {
        matches!(self, OverflowPolicy::Block | OverflowPolicy::BlockWithTimeout(_))
    }
}

impl fmt::Display for OverflowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverflowPolicy::Block => write!(f, "Block"),
            OverflowPolicy::BlockWithTimeout(d) => write!(f, "BlockWithTimeout({:?})", d),
            OverflowPolicy::DropNewest => write!(f, "DropNewest"),
            OverflowPolicy::OverwriteOldest => write!(f, "OverwriteOldest"),
        }
    }
}

/// Callback type for overflow notifications
///
/// Called when records are dropped because the queue is full.
/// The parameter is the total count of dropped records so far.
pub type OverflowCallback = Arc<dyn Fn(u64) + Send + Sync>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overflow_policy_default() {
        assert_eq!(OverflowPolicy::default(), OverflowPolicy::Block);
    }

    #[test]
    fn test_overflow_policy_display() {
        assert_eq!(OverflowPolicy::Block.to_string(), "Block");
        assert_eq!(OverflowPolicy::DropNewest.to_string(), "DropNewest");
        assert_eq!(OverflowPolicy::OverwriteOldest.to_string(), "OverwriteOldest");
        assert_eq!(
            OverflowPolicy::BlockWithTimeout(Duration::from_millis(100)).to_string(),
            "BlockWithTimeout(100ms)"
        );
    }

    #[test]
    fn test_may_block() {
        assert!(OverflowPolicy::Block.may_block());
        assert!(OverflowPolicy::BlockWithTimeout(Duration::from_millis(1)).may_block());
        assert!(!OverflowPolicy::DropNewest.may_block());
        assert!(!OverflowPolicy::OverwriteOldest.may_block());
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&OverflowPolicy::DropNewest).unwrap();
        assert_eq!(json, "\"drop_newest\"");
        let policy: OverflowPolicy = serde_json::from_str("\"overwrite_oldest\"").unwrap();
        assert_eq!(policy, OverflowPolicy::OverwriteOldest);
    }
}
