use std::io::Write;

use crossterm::{
    cursor::MoveToColumn,
    queue,
    terminal::{Clear, ClearType},
};

use futures::{StreamExt, future::BoxFuture, stream::FuturesUnordered};
use tracing::debug;

use crate::{
    cell::{Cell, Renderer},
    error::{ReplError, ReplResult},
    session::EvaluationSession,
};

/// Text entry the user submits from. Cleared on every trigger.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputField {
    text: String,
}

impl InputField {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn set(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.text)
    }
}

/// Append-only list of rendered cells.
pub trait CellList<F> {
    fn append(&mut self, fragment: F);

    /// Shows an input prompt. Lists without a cursor ignore it.
    fn prompt(&mut self, _prompt: &str) {}
}

impl<F> CellList<F> for Vec<F> {
    fn append(&mut self, fragment: F) {
        self.push(fragment);
    }
}

/// Writes each fragment as one line.
pub struct TerminalList<W: Write> {
    out: W,
    prompt_shown: bool,
}

impl<W: Write> TerminalList<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            prompt_shown: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_line(&mut self, line: &str) -> std::io::Result<()> {
        // a cell arriving under a bare prompt replaces the prompt line
        if std::mem::take(&mut self.prompt_shown) {
            queue!(self.out, MoveToColumn(0), Clear(ClearType::CurrentLine))?;
        }
        writeln!(self.out, "{}", line)?;
        self.out.flush()
    }
}

impl<W: Write> CellList<String> for TerminalList<W> {
    fn append(&mut self, fragment: String) {
        if let Err(e) = self.write_line(&fragment) {
            tracing::error!("failed to write cell: {}", e);
        }
    }

    fn prompt(&mut self, prompt: &str) {
        if let Err(e) = write!(self.out, "{}", prompt).and_then(|_| self.out.flush()) {
            tracing::error!("failed to write prompt: {}", e);
            return;
        }
        self.prompt_shown = true;
    }
}

/// Connects user triggers to the session and renders every produced cell into
/// the list, in delivery order.
pub struct Orchestrator<R: Renderer, L: CellList<R::Fragment>> {
    session: EvaluationSession,
    renderer: R,
    list: L,
    pending: FuturesUnordered<BoxFuture<'static, Cell>>,
}

impl<R: Renderer, L: CellList<R::Fragment>> Orchestrator<R, L> {
    pub fn new(session: EvaluationSession, renderer: R, list: L) -> Self {
        Self {
            session,
            renderer,
            list,
            pending: FuturesUnordered::new(),
        }
    }

    pub fn session(&self) -> &EvaluationSession {
        &self.session
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn list(&self) -> &L {
        &self.list
    }

    pub fn list_mut(&mut self) -> &mut L {
        &mut self.list
    }

    pub fn into_list(self) -> L {
        self.list
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Submits the field's text. The field is cleared first, whatever it held.
    pub fn trigger(&mut self, field: &mut InputField) -> ReplResult<()> {
        let raw = field.take();
        self.submit(&raw)
    }

    pub fn submit(&mut self, raw: &str) -> ReplResult<()> {
        let input = raw.trim();
        if input.is_empty() {
            return Err(ReplError::EmptyInput);
        }

        let submission = self.session.submit(input);
        self.add_cell(&submission.echo);
        self.pending.push(submission.outcome);
        debug!(pending = self.pending.len(), "submission queued");
        Ok(())
    }

    /// Waits for the first outstanding outcome and appends it.
    /// Returns `false` when nothing is pending.
    pub async fn next_outcome(&mut self) -> bool {
        match self.pending.next().await {
            Some(cell) => {
                self.add_cell(&cell);
                true
            }
            None => false,
        }
    }

    /// Copies the `number`-th submitted input (from 1) back into `field`.
    pub fn recall(&self, number: usize, field: &mut InputField) -> ReplResult<()> {
        let input = self.session.expression(number)?;
        field.set(input);
        Ok(())
    }

    /// Queues a completion lookup next to the pending outcomes. Its listing,
    /// or its failure, is appended as one cell when the lookup resolves.
    pub fn request_completions(&mut self, prefix: &str) -> ReplResult<()> {
        let lookup = self.session.completion(prefix)?;
        self.pending.push(Box::pin(async move {
            match lookup.await {
                Ok(values) if values.is_empty() => Cell::result("(no completions)"),
                Ok(values) => Cell::result(values.join("  ")),
                Err(e) => Cell::error(e.to_string()),
            }
        }));
        Ok(())
    }

    pub async fn drain(&mut self) {
        while self.next_outcome().await {}
    }

    /// Appends an out-of-band cell, e.g. a command error.
    pub fn add_cell(&mut self, cell: &Cell) {
        let fragment = cell.render(&self.renderer);
        self.list.append(fragment);
    }
}
