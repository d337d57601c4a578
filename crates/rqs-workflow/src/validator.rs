//! Submit-time line completeness checks.
//!
//! Rules run in a fixed order and stop at the first failure on the first
//! failing line. Only one error is ever reported per submit attempt.

use rqs_schemas::RequisitionLine;

/// Field every line-completeness error is reported under.
pub const REQUISITION_LINES_FIELD: &str = "requisitionLines";

pub const MSG_LINES_MISSING: &str =
    "A requisitionLines must be entered prior to submission of a requisition.";
pub const MSG_QUANTITY_MISSING: &str =
    "A quantity must be entered prior to submission of a requisition.";
pub const MSG_BEGINNING_BALANCE_MISSING: &str =
    "A beginning balance must be entered prior to submission of a requisition.";
pub const MSG_BEGINNING_BALANCE_NEGATIVE: &str =
    "A beginning balance must be a non-negative value.";
pub const MSG_RECEIVED_MISSING: &str =
    "A total received quantity must be entered prior to submission of a requisition.";
pub const MSG_RECEIVED_NEGATIVE: &str = "A total received quantity must be a non-negative value.";
pub const MSG_STOCK_ON_HAND_MISSING: &str =
    "A total stock on hand must be entered prior to submission of a requisition.";
pub const MSG_CONSUMED_MISSING: &str =
    "A total consumed quantity must be entered prior to submission of a requisition.";
pub const MSG_LOSSES_MISSING: &str =
    "A total losses and adjustments must be entered prior to submission of a requisition.";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

impl FieldError {
    fn lines(message: &'static str) -> Self {
        Self {
            field: REQUISITION_LINES_FIELD,
            message,
        }
    }
}

/// Validate a requisition's line collection before it may leave INITIATED.
pub fn validate_for_submit(lines: &[RequisitionLine]) -> Result<(), FieldError> {
    if lines.is_empty() {
        return Err(FieldError::lines(MSG_LINES_MISSING));
    }
    for line in lines {
        check_line(line)?;
    }
    Ok(())
}

fn check_line(line: &RequisitionLine) -> Result<(), FieldError> {
    if line.requested_quantity.is_none() {
        return Err(FieldError::lines(MSG_QUANTITY_MISSING));
    }

    match line.beginning_balance {
        None => return Err(FieldError::lines(MSG_BEGINNING_BALANCE_MISSING)),
        Some(v) if v < 0 => return Err(FieldError::lines(MSG_BEGINNING_BALANCE_NEGATIVE)),
        Some(_) => {}
    }

    match line.total_received_quantity {
        None => return Err(FieldError::lines(MSG_RECEIVED_MISSING)),
        Some(v) if v < 0 => return Err(FieldError::lines(MSG_RECEIVED_NEGATIVE)),
        Some(_) => {}
    }

    if line.stock_on_hand.is_none() {
        return Err(FieldError::lines(MSG_STOCK_ON_HAND_MISSING));
    }
    if line.total_consumed_quantity.is_none() {
        return Err(FieldError::lines(MSG_CONSUMED_MISSING));
    }
    if line.total_losses_and_adjustments.is_none() {
        return Err(FieldError::lines(MSG_LOSSES_MISSING));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn complete_line() -> RequisitionLine {
        RequisitionLine {
            product: Uuid::new_v4(),
            requested_quantity: Some(1),
            beginning_balance: Some(1),
            stock_on_hand: Some(1),
            total_consumed_quantity: Some(1),
            total_received_quantity: Some(1),
            total_losses_and_adjustments: Some(1),
            approved_quantity: None,
        }
    }

    fn message_for(line: RequisitionLine) -> &'static str {
        validate_for_submit(&[line]).unwrap_err().message
    }

    #[test]
    fn complete_line_passes() {
        assert_eq!(validate_for_submit(&[complete_line()]), Ok(()));
    }

    #[test]
    fn empty_lines_fail_before_anything_else() {
        let err = validate_for_submit(&[]).unwrap_err();
        assert_eq!(err.field, "requisitionLines");
        assert_eq!(err.message, MSG_LINES_MISSING);
    }

    #[test]
    fn each_rule_reports_its_message() {
        let mut l = complete_line();
        l.requested_quantity = None;
        assert_eq!(message_for(l), MSG_QUANTITY_MISSING);

        let mut l = complete_line();
        l.beginning_balance = None;
        assert_eq!(message_for(l), MSG_BEGINNING_BALANCE_MISSING);

        let mut l = complete_line();
        l.beginning_balance = Some(-1);
        assert_eq!(message_for(l), MSG_BEGINNING_BALANCE_NEGATIVE);

        let mut l = complete_line();
        l.total_received_quantity = None;
        assert_eq!(message_for(l), MSG_RECEIVED_MISSING);

        let mut l = complete_line();
        l.total_received_quantity = Some(-5);
        assert_eq!(message_for(l), MSG_RECEIVED_NEGATIVE);

        let mut l = complete_line();
        l.stock_on_hand = None;
        assert_eq!(message_for(l), MSG_STOCK_ON_HAND_MISSING);

        let mut l = complete_line();
        l.total_consumed_quantity = None;
        assert_eq!(message_for(l), MSG_CONSUMED_MISSING);

        let mut l = complete_line();
        l.total_losses_and_adjustments = None;
        assert_eq!(message_for(l), MSG_LOSSES_MISSING);
    }

    #[test]
    fn negative_beginning_balance_wins_over_later_rules() {
        let mut l = complete_line();
        l.beginning_balance = Some(-1);
        l.total_received_quantity = None;
        l.stock_on_hand = None;
        assert_eq!(message_for(l), MSG_BEGINNING_BALANCE_NEGATIVE);
    }

    #[test]
    fn missing_balance_reported_before_negative_received() {
        let mut l = complete_line();
        l.beginning_balance = None;
        l.total_received_quantity = Some(-1);
        assert_eq!(message_for(l), MSG_BEGINNING_BALANCE_MISSING);
    }

    #[test]
    fn first_failing_line_decides() {
        let mut a = complete_line();
        a.stock_on_hand = None;
        let mut b = complete_line();
        b.requested_quantity = None;
        let err = validate_for_submit(&[complete_line(), a, b]).unwrap_err();
        assert_eq!(err.message, MSG_STOCK_ON_HAND_MISSING);
    }

    #[test]
    fn zero_quantities_are_non_negative() {
        let mut l = complete_line();
        l.beginning_balance = Some(0);
        l.total_received_quantity = Some(0);
        assert_eq!(validate_for_submit(&[l]), Ok(()));
    }
}
