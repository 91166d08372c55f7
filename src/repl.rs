//! Line-oriented front end.
//!
//! Input lines and outcome deliveries are interleaved on a single task with
//! `tokio::select!`, so the cell list only ever has one writer.

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info};

use crate::{
    cell::{Cell, TerminalRenderer},
    error::{ReplError, ReplResult},
    orchestrator::{CellList, InputField, Orchestrator},
    session::EvaluationSession,
};

pub const BANNER_WIDTH: usize = 72;

const HELP: &[&str] = &[
    "<expression>       evaluate an expression",
    ":complete <prefix> list names starting with <prefix>",
    ":recall [n]        resubmit input n (default: the last one)",
    ": <text>           print a warning line",
    ":help              show this help",
    ":q, :quit          exit",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Quit,
    Warning(String),
    Complete(String),
    Recall(Option<usize>),
    Help,
    Undefined(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    Blank,
    Command(Command),
    Expr(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

pub fn parse_line(raw: &str) -> Line {
    let line = raw.trim();
    if line.is_empty() {
        return Line::Blank;
    }
    let Some(cmd) = line.strip_prefix(':') else {
        return Line::Expr(line.to_string());
    };

    let command = if let Some(text) = cmd.strip_prefix(' ') {
        Command::Warning(text.to_string())
    } else {
        let (name, arg) = cmd.split_once(' ').unwrap_or((cmd, ""));
        match name {
            "q" | "quit" => Command::Quit,
            "help" | "h" => Command::Help,
            "complete" | "c" => Command::Complete(arg.trim().to_string()),
            "recall" | "r" => match arg.trim() {
                "" => Command::Recall(None),
                n => match n.parse() {
                    Ok(number) => Command::Recall(Some(number)),
                    Err(_) => Command::Undefined(cmd.to_string()),
                },
            },
            _ => Command::Undefined(cmd.to_string()),
        }
    };
    Line::Command(command)
}

pub fn banner_title() -> String {
    format!("Poly REPL {}", env!("CARGO_PKG_VERSION"))
}

pub struct Repl<L: CellList<String>> {
    orchestrator: Orchestrator<TerminalRenderer, L>,
    banner: bool,
    prompt: bool,
}

impl<L: CellList<String>> Repl<L> {
    pub fn new(session: EvaluationSession, renderer: TerminalRenderer, list: L) -> Self {
        Self {
            orchestrator: Orchestrator::new(session, renderer, list),
            banner: true,
            prompt: false,
        }
    }

    pub fn with_banner(mut self, banner: bool) -> Self {
        self.banner = banner;
        self
    }

    /// Shows the input prompt whenever the loop waits, for interactive terminals.
    pub fn with_prompt(mut self, prompt: bool) -> Self {
        self.prompt = prompt;
        self
    }

    pub fn orchestrator(&self) -> &Orchestrator<TerminalRenderer, L> {
        &self.orchestrator
    }

    pub fn into_list(self) -> L {
        self.orchestrator.into_list()
    }

    /// Runs until `:quit` or end of input. At end of input, outstanding
    /// submissions are awaited; `:quit` abandons them.
    pub async fn run<I: AsyncBufRead + Unpin>(&mut self, input: I) -> ReplResult<()> {
        if self.banner {
            self.print_banner(&banner_title());
        }

        let mut lines = input.lines();
        loop {
            if self.prompt {
                let prompt = self.orchestrator.renderer().in_prompt().to_string();
                self.orchestrator.list_mut().prompt(&prompt);
            }
            tokio::select! {
                line = lines.next_line() => {
                    match line? {
                        Some(line) => {
                            if self.handle_line(&line) == Flow::Exit {
                                info!(abandoned = self.orchestrator.pending(), "quit requested");
                                return Ok(());
                            }
                        }
                        None => break,
                    }
                }
                _ = self.orchestrator.next_outcome(), if self.orchestrator.pending() > 0 => {}
            }
        }

        debug!(pending = self.orchestrator.pending(), "end of input");
        self.orchestrator.drain().await;
        Ok(())
    }

    fn handle_line(&mut self, raw: &str) -> Flow {
        match parse_line(raw) {
            Line::Blank => {}
            Line::Expr(expr) => {
                if let Err(e) = self.orchestrator.submit(&expr) {
                    self.orchestrator.add_cell(&Cell::error(e.to_string()));
                }
            }
            Line::Command(command) => return self.handle_command(command),
        }
        Flow::Continue
    }

    fn handle_command(&mut self, command: Command) -> Flow {
        match command {
            Command::Quit => return Flow::Exit,
            Command::Warning(text) => {
                let line = self.orchestrator.renderer().warning(&text);
                self.print(line);
            }
            Command::Help => {
                for line in HELP {
                    self.print(line.to_string());
                }
            }
            Command::Complete(prefix) => {
                if let Err(e) = self.orchestrator.request_completions(&prefix) {
                    self.orchestrator.add_cell(&Cell::error(e.to_string()));
                }
            }
            Command::Recall(number) => {
                let number =
                    number.unwrap_or_else(|| self.orchestrator.session().expressions().len());
                let mut field = InputField::default();
                let result = self
                    .orchestrator
                    .recall(number, &mut field)
                    .and_then(|_| self.orchestrator.trigger(&mut field));
                if let Err(e) = result {
                    self.orchestrator.add_cell(&Cell::error(e.to_string()));
                }
            }
            Command::Undefined(name) => {
                let err = ReplError::UndefinedCommand(name);
                self.orchestrator.add_cell(&Cell::error(err.to_string()));
            }
        }
        Flow::Continue
    }

    fn print_banner(&mut self, title: &str) {
        let line = "-".repeat(BANNER_WIDTH);
        self.print(line.clone());
        self.print(title.to_string());
        self.print(line);
        self.print(String::new());
    }

    fn print(&mut self, line: String) {
        self.orchestrator.list_mut().append(line);
    }
}
