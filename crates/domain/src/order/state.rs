//! Order status state machine.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::OrderError;

/// The status of an order in its fulfilment lifecycle.
///
/// Status stages:
/// ```text
/// Pending ──► Confirmed ──► Preparing ──► Ready ──► Shipped ──► Delivered
///    │            │             │           │          │
///    └────────────┴─────────────┴───────────┴──────────┴──► Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Order placed, awaiting the farmer.
    #[default]
    Pending,

    /// Farmer accepted the order.
    Confirmed,

    /// Produce is being prepared.
    Preparing,

    /// Ready for pickup or dispatch.
    Ready,

    /// Handed to delivery.
    Shipped,

    /// Received by the customer (terminal state).
    Delivered,

    /// Order was cancelled (terminal state).
    Cancelled,
}

impl OrderStatus {
    /// All statuses in stage order.
    pub const ALL: [OrderStatus; 7] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    /// Returns true if the order can be cancelled in this status.
    pub fn can_cancel(&self) -> bool {
        !self.is_terminal()
    }

    /// Returns true if this is a terminal status (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Position along the fulfilment path. Cancelled sits outside it.
    pub fn stage(&self) -> Option<u8> {
        match self {
            OrderStatus::Pending => Some(0),
            OrderStatus::Confirmed => Some(1),
            OrderStatus::Preparing => Some(2),
            OrderStatus::Ready => Some(3),
            OrderStatus::Shipped => Some(4),
            OrderStatus::Delivered => Some(5),
            OrderStatus::Cancelled => None,
        }
    }

    /// Returns the status label as used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| OrderError::InvalidStatus(s.to_string()))
    }
}

/// Which moves between non-terminal statuses are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitionPolicy {
    /// Any non-terminal status may move to any other, including backward.
    #[default]
    Permissive,

    /// Only moves to a later stage are accepted.
    ForwardOnly,
}

impl TransitionPolicy {
    /// Returns true if the policy admits `from -> to`.
    ///
    /// Terminal source statuses are rejected by the order itself, not here.
    pub fn allows(&self, from: OrderStatus, to: OrderStatus) -> bool {
        match self {
            TransitionPolicy::Permissive => true,
            TransitionPolicy::ForwardOnly => match (from.stage(), to.stage()) {
                (Some(from), Some(to)) => to > from,
                _ => true,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_status_is_pending() {
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
    }

    #[test]
    fn test_terminal_statuses() {
        for status in OrderStatus::ALL {
            let terminal = matches!(status, OrderStatus::Delivered | OrderStatus::Cancelled);
            assert_eq!(status.is_terminal(), terminal, "{status}");
            assert_eq!(status.can_cancel(), !terminal, "{status}");
        }
    }

    #[test]
    fn test_parse_every_label() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_parse_unknown_label() {
        let err = "bogus".parse::<OrderStatus>().unwrap_err();
        assert!(matches!(err, OrderError::InvalidStatus(s) if s == "bogus"));

        // Labels are case sensitive
        assert!("Pending".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_serialization_uses_lowercase_labels() {
        let json = serde_json::to_string(&OrderStatus::Shipped).unwrap();
        assert_eq!(json, "\"shipped\"");

        let status: OrderStatus = serde_json::from_str("\"ready\"").unwrap();
        assert_eq!(status, OrderStatus::Ready);
    }

    #[test]
    fn test_permissive_allows_backward_moves() {
        let policy = TransitionPolicy::Permissive;
        assert!(policy.allows(OrderStatus::Shipped, OrderStatus::Pending));
        assert!(policy.allows(OrderStatus::Pending, OrderStatus::Delivered));
    }

    #[test]
    fn test_forward_only_rejects_backward_and_same_stage() {
        let policy = TransitionPolicy::ForwardOnly;
        assert!(policy.allows(OrderStatus::Pending, OrderStatus::Confirmed));
        assert!(policy.allows(OrderStatus::Confirmed, OrderStatus::Shipped));
        assert!(!policy.allows(OrderStatus::Ready, OrderStatus::Preparing));
        assert!(!policy.allows(OrderStatus::Ready, OrderStatus::Ready));
    }
}
