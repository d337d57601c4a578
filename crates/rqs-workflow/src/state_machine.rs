//! Requisition lifecycle state machine.
//!
//! # State diagram
//!
//! ```text
//!   initiate
//!   ───────► INITIATED ──Submit──► SUBMITTED ──Authorize──► AUTHORIZED ──Approve──► APPROVED
//!              │   ▲                   │                        │                     │
//!            Skip  └──────Reject───────┼────────────────────────┘                  Release
//!              │                       └──Approve{skip_authorization}──► APPROVED     │
//!              ▼                                                                      ▼
//!           SKIPPED (term.)                                                    RELEASED (term.)
//! ```
//!
//! `Delete` is a guard only (INITIATED → INITIATED); the store performs the
//! removal. `Release` is accepted from every status: batch release carries no
//! status guard.
//!
//! Orders have a one-edge table of their own: ORDERED → SHIPPED on finalize.

use rqs_schemas::{OrderStatus, RequisitionStatus};

// ---------------------------------------------------------------------------
// RequisitionAction
// ---------------------------------------------------------------------------

/// Lifecycle operations that drive a requisition's status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequisitionAction {
    Submit,
    Skip,
    Authorize,
    Reject,
    /// `skip_authorization` is the process-wide setting read at approval time.
    Approve { skip_authorization: bool },
    Delete,
    Release,
}

// ---------------------------------------------------------------------------
// TransitionError
// ---------------------------------------------------------------------------

/// Returned when an action cannot legally be applied in the current status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionError {
    /// `"requisition"` or `"order"`.
    pub entity: &'static str,
    /// Status the entity was in when the action arrived.
    pub from: String,
    /// Debug string of the rejected action.
    pub action: String,
}

impl std::fmt::Display for TransitionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "illegal {} transition: {} + {}",
            self.entity, self.from, self.action
        )
    }
}

impl std::error::Error for TransitionError {}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

/// The requisition transition table.
pub fn next_status(
    from: RequisitionStatus,
    action: RequisitionAction,
) -> Result<RequisitionStatus, TransitionError> {
    use RequisitionAction::*;
    use RequisitionStatus::*;

    let next = match (from, action) {
        (Initiated, Submit) => Submitted,
        (Initiated, Skip) => Skipped,
        (Initiated, Delete) => Initiated,

        (Submitted, Authorize) => Authorized,
        (
            Submitted,
            Approve {
                skip_authorization: true,
            },
        ) => Approved,

        (Authorized, Approve { .. }) => Approved,
        // Rejection re-enters the flow from the top.
        (Authorized, Reject) => Initiated,

        (_, Release) => Released,

        (state, act) => {
            return Err(TransitionError {
                entity: "requisition",
                from: state.as_str().to_string(),
                action: format!("{act:?}"),
            });
        }
    };

    Ok(next)
}

/// Order finalize: ORDERED → SHIPPED, anything else is illegal.
pub fn finalize_order(from: OrderStatus) -> Result<OrderStatus, TransitionError> {
    match from {
        OrderStatus::Ordered => Ok(OrderStatus::Shipped),
        other => Err(TransitionError {
            entity: "order",
            from: other.as_str().to_string(),
            action: "Finalize".to_string(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use RequisitionAction::*;
    use RequisitionStatus::*;

    const ACTIONS: [RequisitionAction; 8] = [
        Submit,
        Skip,
        Authorize,
        Reject,
        Approve {
            skip_authorization: false,
        },
        Approve {
            skip_authorization: true,
        },
        Delete,
        Release,
    ];

    /// The full legal edge list; every other pair must be refused.
    fn legal(from: RequisitionStatus, action: RequisitionAction) -> Option<RequisitionStatus> {
        match (from, action) {
            (Initiated, Submit) => Some(Submitted),
            (Initiated, Skip) => Some(Skipped),
            (Initiated, Delete) => Some(Initiated),
            (Submitted, Authorize) => Some(Authorized),
            (
                Submitted,
                Approve {
                    skip_authorization: true,
                },
            ) => Some(Approved),
            (Authorized, Approve { .. }) => Some(Approved),
            (Authorized, Reject) => Some(Initiated),
            (_, Release) => Some(Released),
            _ => None,
        }
    }

    #[test]
    fn table_matches_edge_list_exhaustively() {
        for from in RequisitionStatus::ALL {
            for action in ACTIONS {
                match legal(from, action) {
                    Some(to) => assert_eq!(next_status(from, action), Ok(to), "{from} {action:?}"),
                    None => {
                        let err = next_status(from, action).unwrap_err();
                        assert_eq!(err.from, from.as_str());
                        assert_eq!(err.entity, "requisition");
                    }
                }
            }
        }
    }

    #[test]
    fn authorize_only_from_submitted() {
        assert_eq!(next_status(Submitted, Authorize), Ok(Authorized));
        for from in [Initiated, Authorized, Approved, Released, Skipped] {
            assert!(next_status(from, Authorize).is_err());
        }
    }

    #[test]
    fn approve_from_submitted_needs_skip_authorization() {
        assert!(next_status(
            Submitted,
            Approve {
                skip_authorization: false
            }
        )
        .is_err());
        assert_eq!(
            next_status(
                Submitted,
                Approve {
                    skip_authorization: true
                }
            ),
            Ok(Approved)
        );
    }

    #[test]
    fn reject_returns_to_initiated() {
        assert_eq!(next_status(Authorized, Reject), Ok(Initiated));
        assert!(next_status(Submitted, Reject).is_err());
    }

    #[test]
    fn terminal_states_refuse_lifecycle_actions() {
        for from in [Released, Skipped] {
            assert!(from.is_terminal());
            for action in [Submit, Skip, Authorize, Reject, Delete] {
                assert!(next_status(from, action).is_err());
            }
        }
    }

    #[test]
    fn transition_error_display() {
        let err = next_status(Skipped, Submit).unwrap_err();
        assert_eq!(
            err.to_string(),
            "illegal requisition transition: SKIPPED + Submit"
        );
    }

    #[test]
    fn finalize_only_from_ordered() {
        assert_eq!(finalize_order(OrderStatus::Ordered), Ok(OrderStatus::Shipped));
        let err = finalize_order(OrderStatus::Shipped).unwrap_err();
        assert_eq!(err.entity, "order");
        assert_eq!(err.from, "SHIPPED");
        assert!(finalize_order(OrderStatus::Received).is_err());
    }
}
