//! # Evaluation Session
//!
//! The session owns the conversation with the remote evaluator. Every submission
//! goes through two phases:
//!
//! 1. **Echo**: the input cell is built and handed back synchronously, before any
//!    network activity starts.
//! 2. **Outcome**: a future that performs exactly one request and resolves to
//!    exactly one result or error cell.
//!
//! Outcome futures own everything they need (`'static`), so several submissions
//! can be in flight at once. Nothing orders their completion relative to each
//! other.

use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::{debug, info, warn};

use crate::{
    cell::Cell,
    client::Evaluator,
    error::{ReplError, ReplResult},
    mapper::map_response,
    protocol::{CompletionsResponse, EvaluationRequest},
};

pub const EVAL_ENDPOINT: &str = "eval";
pub const COMPLETIONS_ENDPOINT: &str = "completions";
pub const MIN_COMPLETION_PREFIX: usize = 3;

/// Both phases of one submission.
pub struct Submission {
    pub echo: Cell,
    pub outcome: BoxFuture<'static, Cell>,
}

pub struct EvaluationSession {
    evaluator: Arc<dyn Evaluator>,
    base_path: String,
    // append-only; read back only by recall
    exprs: Vec<String>,
}

impl EvaluationSession {
    pub fn new(evaluator: Arc<dyn Evaluator>, base_path: impl Into<String>) -> Self {
        Self {
            evaluator,
            base_path: base_path.into(),
            exprs: Vec::new(),
        }
    }

    /// Joins the base path and `parts` with `/`, skipping empty segments.
    pub fn make_url(&self, parts: &[&str]) -> String {
        std::iter::once(self.base_path.as_str())
            .chain(parts.iter().copied())
            .map(|part| part.trim_matches('/'))
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("/")
    }

    pub fn expressions(&self) -> &[String] {
        &self.exprs
    }

    pub fn submit(&mut self, input: &str) -> Submission {
        let echo = Cell::input(input);
        self.exprs.push(input.to_string());
        debug!(input, "submitted expression");

        let evaluator = Arc::clone(&self.evaluator);
        let path = self.make_url(&[EVAL_ENDPOINT]);
        let request = EvaluationRequest::new(input);
        let outcome: BoxFuture<'static, Cell> =
            Box::pin(async move { Self::evaluate(evaluator, path, request).await });

        Submission { echo, outcome }
    }

    /// Callback flavour of [`submit`](Self::submit).
    ///
    /// `on_echo` runs before this returns; `on_outcome` runs once when the
    /// returned future completes.
    pub fn submit_with<E, O>(
        &mut self,
        input: &str,
        on_echo: E,
        on_outcome: O,
    ) -> BoxFuture<'static, ()>
    where
        E: FnOnce(Cell),
        O: FnOnce(Cell) + Send + 'static,
    {
        let Submission { echo, outcome } = self.submit(input);
        on_echo(echo);
        Box::pin(async move { on_outcome(outcome.await) })
    }

    async fn evaluate(
        evaluator: Arc<dyn Evaluator>,
        path: String,
        request: EvaluationRequest,
    ) -> Cell {
        let result = evaluator
            .evaluate(&path, &request)
            .await
            .and_then(|response| map_response(&response));

        match result {
            Ok(cell) => {
                info!(input = %request.input, category = %cell.category(), "evaluation finished");
                cell
            }
            Err(err) => {
                warn!(input = %request.input, error = %err, "evaluation failed");
                Cell::error(err.to_string())
            }
        }
    }

    /// Names known to the evaluator that start with `prefix`.
    pub async fn complete(&self, prefix: &str) -> ReplResult<Vec<String>> {
        self.completion(prefix)?.await
    }

    /// Validates `prefix` now and returns the lookup as an owned, lazy future,
    /// so a caller can keep polling other work while it is in flight.
    #[tracing::instrument(skip(self))]
    pub fn completion(
        &self,
        prefix: &str,
    ) -> ReplResult<BoxFuture<'static, ReplResult<Vec<String>>>> {
        let prefix = prefix.trim();
        if prefix.is_empty() {
            return Err(ReplError::EmptyInput);
        }
        if prefix.chars().count() < MIN_COMPLETION_PREFIX {
            return Err(ReplError::CompletionPrefixTooShort(prefix.to_string()));
        }

        let evaluator = Arc::clone(&self.evaluator);
        let path = self.make_url(&[COMPLETIONS_ENDPOINT]);
        let prefix = prefix.to_string();
        Ok(Box::pin(async move {
            match evaluator.completions(&path, &prefix).await? {
                CompletionsResponse::Values { values } => Ok(values),
                CompletionsResponse::Error { message } => {
                    warn!(prefix = %prefix, message = %message, "evaluator rejected completion");
                    Err(ReplError::Evaluator(message))
                }
            }
        }))
    }

    /// The `number`-th submitted input, counting from 1.
    pub fn expression(&self, number: usize) -> ReplResult<&str> {
        number
            .checked_sub(1)
            .and_then(|index| self.exprs.get(index))
            .map(String::as_str)
            .ok_or(ReplError::NoSuchInput(number))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        cell::{CellCategory, HtmlRenderer},
        client::MockEvaluator,
        protocol::EvaluationResponse,
    };
    use futures::FutureExt;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    fn session_with(mock: MockEvaluator) -> EvaluationSession {
        EvaluationSession::new(Arc::new(mock), "")
    }

    fn expect_response(mock: &mut MockEvaluator, input: &'static str, response: EvaluationResponse) {
        mock.expect_evaluate()
            .withf(move |path, request| path == "eval" && request.input == input)
            .times(1)
            .returning(move |_, _| Ok(response.clone()));
    }

    #[test]
    fn test_make_url() {
        let session = session_with(MockEvaluator::new());
        assert_eq!(session.make_url(&["eval"]), "eval");

        let session = EvaluationSession::new(Arc::new(MockEvaluator::new()), "/api/v1/");
        assert_eq!(session.make_url(&["eval"]), "api/v1/eval");
        assert_eq!(session.make_url(&["completions"]), "api/v1/completions");
    }

    #[test]
    fn test_echo_is_synchronous_and_lazy() {
        // no expectations: any network call would panic
        let mut session = session_with(MockEvaluator::new());
        let submission = session.submit("1 + 1");

        assert_eq!(submission.echo, Cell::input("1 + 1"));
        assert_eq!(session.expressions(), &["1 + 1".to_string()]);
        drop(submission.outcome);
    }

    #[tokio::test]
    async fn test_result_outcome() {
        let mut mock = MockEvaluator::new();
        expect_response(&mut mock, "1 + 1", EvaluationResponse::expr("2"));
        let mut session = session_with(mock);

        let submission = session.submit("1 + 1");
        assert_eq!(submission.outcome.await, Cell::result("2"));
    }

    #[tokio::test]
    async fn test_evaluator_error_outcome() {
        let mut mock = MockEvaluator::new();
        expect_response(&mut mock, "1 / 0", EvaluationResponse::error("division by zero"));
        let mut session = session_with(mock);

        let outcome = session.submit("1 / 0").outcome.await;
        assert_eq!(outcome, Cell::error("division by zero"));
    }

    #[tokio::test]
    async fn test_protocol_error_outcome() {
        let mut mock = MockEvaluator::new();
        expect_response(
            &mut mock,
            "x",
            EvaluationResponse::Invalid {
                reason: "unrecognized response type 'bogus'".to_string(),
            },
        );
        let mut session = session_with(mock);

        let outcome = session.submit("x").outcome.await;
        assert_eq!(outcome.category(), CellCategory::Error);
        assert_eq!(
            outcome.text(),
            "Protocol error: unrecognized response type 'bogus'"
        );
    }

    #[tokio::test]
    async fn test_transport_failure_outcome() {
        let mut mock = MockEvaluator::new();
        mock.expect_evaluate()
            .times(1)
            .returning(|_, _| Err(ReplError::transport("connection refused")));
        let mut session = session_with(mock);

        let outcome = session.submit("x").outcome.await;
        assert_eq!(outcome, Cell::error("Transport failure: connection refused"));
    }

    #[tokio::test]
    async fn test_submit_with_shared_callback() {
        let mut mock = MockEvaluator::new();
        expect_response(&mut mock, "1 + 1", EvaluationResponse::expr("2"));
        let mut session = session_with(mock);

        let delivered = Arc::new(Mutex::new(Vec::new()));
        let deliver = {
            let delivered = Arc::clone(&delivered);
            move |cell: Cell| delivered.lock().unwrap().push(cell)
        };

        let pending = session.submit_with("1 + 1", deliver.clone(), deliver);
        assert_eq!(*delivered.lock().unwrap(), vec![Cell::input("1 + 1")]);

        pending.await;
        let delivered = delivered.lock().unwrap();
        let categories: Vec<_> = delivered.iter().map(Cell::category).collect();
        assert_eq!(categories, vec![CellCategory::Input, CellCategory::Result]);
        assert_eq!(
            delivered[0].render(&HtmlRenderer),
            "<div class=\"cell cell-input\">1 + 1</div>"
        );
    }

    #[tokio::test]
    async fn test_outcome_resolves_when_polled() {
        let mut mock = MockEvaluator::new();
        mock.expect_evaluate().returning(|_, _| Ok(EvaluationResponse::expr("ok")));
        let mut session = session_with(mock);

        let mut echoed = false;
        let pending = session.submit_with("slow", |_| echoed = true, |_| {});
        assert!(echoed);
        assert!(pending.now_or_never().is_some());
    }

    #[tokio::test]
    async fn test_complete() {
        let mut mock = MockEvaluator::new();
        mock.expect_completions()
            .withf(|path, prefix| path == "completions" && prefix == "fol")
            .times(1)
            .returning(|_, _| {
                Ok(CompletionsResponse::Values {
                    values: vec!["foldl".to_string(), "foldr".to_string()],
                })
            });
        let session = session_with(mock);

        assert_eq!(
            session.complete(" fol ").await.unwrap(),
            vec!["foldl".to_string(), "foldr".to_string()]
        );
    }

    #[tokio::test]
    async fn test_complete_rejects_short_prefix() {
        let session = session_with(MockEvaluator::new());
        assert!(matches!(
            session.complete("fo").await,
            Err(ReplError::CompletionPrefixTooShort(_))
        ));
        assert!(matches!(
            session.complete("   ").await,
            Err(ReplError::EmptyInput)
        ));
    }

    #[tokio::test]
    async fn test_complete_error_response() {
        let mut mock = MockEvaluator::new();
        mock.expect_completions().returning(|_, _| {
            Ok(CompletionsResponse::Error {
                message: "No input given".to_string(),
            })
        });
        let session = session_with(mock);

        let err = session.complete("abc").await.unwrap_err();
        assert!(matches!(err, ReplError::Evaluator(_)));
        assert_eq!(Cell::error(err.to_string()).text(), "No input given");
    }

    #[test]
    fn test_completion_is_lazy() {
        // no expectations: polling would panic
        let session = session_with(MockEvaluator::new());
        let lookup = session.completion("fol").unwrap();
        drop(lookup);
        assert!(matches!(
            session.completion("f"),
            Err(ReplError::CompletionPrefixTooShort(_))
        ));
    }

    #[test]
    fn test_expression_lookup() {
        let mut session = session_with(MockEvaluator::new());
        drop(session.submit("1 + 1").outcome);
        drop(session.submit("2 * 3").outcome);

        assert_eq!(session.expression(1).unwrap(), "1 + 1");
        assert_eq!(session.expression(2).unwrap(), "2 * 3");
        assert!(matches!(session.expression(0), Err(ReplError::NoSuchInput(0))));
        assert!(matches!(session.expression(3), Err(ReplError::NoSuchInput(3))));
    }
}
