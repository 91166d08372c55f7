use tracing::warn;

use crate::{
    cell::Cell,
    error::{ReplError, ReplResult},
    protocol::EvaluationResponse,
};

/// Maps an evaluator response onto the cell that displays it.
///
/// Evaluator-reported errors are ordinary cells; only a response we cannot
/// interpret is an `Err`.
pub fn map_response(response: &EvaluationResponse) -> ReplResult<Cell> {
    match response {
        EvaluationResponse::Expr { value } => Ok(Cell::result(value.as_str())),
        EvaluationResponse::Error { message } => {
            warn!(message = %message, "evaluator reported an error");
            Ok(Cell::error(message.as_str()))
        }
        EvaluationResponse::Invalid { reason } => Err(ReplError::protocol(reason.as_str())),
    }
}
