// src/presenters/console.rs

//! Human-readable terminal rendering of presenter notifications.
//!
//! Colour is used only when stdout is a terminal and `NO_COLOR` is unset.

use std::io::{self, IsTerminal, Write};
use std::sync::{Mutex, PoisonError};

use crate::engine::presenter::Presenter;

pub struct ConsolePresenter<W: Write + Send = io::Stdout> {
    out: Mutex<W>,
    use_color: bool,
    show_valid: bool,
}

impl ConsolePresenter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout(), should_use_color())
    }
}

impl<W: Write + Send> ConsolePresenter<W> {
    pub fn new(out: W, use_color: bool) -> Self {
        Self {
            out: Mutex::new(out),
            use_color,
            show_valid: false,
        }
    }

    /// Also print a line for fields that pass.
    pub fn show_valid(mut self, show: bool) -> Self {
        self.show_valid = show;
        self
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    fn line(&self, text: &str) {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        // a closed pipe is not worth failing an attempt over
        let _ = writeln!(out, "{}", text);
    }
}

impl<W: Write + Send> Presenter for ConsolePresenter<W> {
    fn report_field_validity(&self, field: &str, valid: bool, message: Option<&str>) {
        if valid {
            if self.show_valid {
                self.line(&format!("{} {}", paint("✔", "32", self.use_color), field));
            }
            return;
        }

        self.line(&format!(
            "{} {}: {}",
            paint("✖", "31", self.use_color),
            field,
            message.unwrap_or_default()
        ));
    }

    fn set_busy(&self, busy: bool) {
        if busy {
            self.line(&paint("處理中...", "2", self.use_color));
        }
    }

    fn on_success(&self, code: &str, timestamp: &str) {
        self.line(&format!(
            "{}\ncode: {}\ntime: {}",
            paint("兌換成功", "32", self.use_color),
            code,
            timestamp
        ));
    }

    fn on_failure(&self, reason: &str) {
        self.line(&format!("{} {}", paint("FAIL", "31", self.use_color), reason));
    }
}

pub fn should_use_color() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    io::stdout().is_terminal()
}

fn paint(text: &str, color: &str, use_color: bool) -> String {
    if use_color {
        format!("\x1b[{}m{}\x1b[0m", color, text)
    } else {
        text.to_string()
    }
}
