#![warn(rust_2018_idioms)]
#![warn(clippy::print_stdout)]

//! Structured diagnostics shared by all compiler passes.
//!
//! Recoverable errors never cross an API boundary as `Err`: each pass pushes
//! an [`ErrorRecord`] onto the error list of the module it is working on and
//! keeps going with a best-effort result. The records carry plain
//! line/column ranges because positions are produced by the parser and only
//! replayed here.

use std::io::{self, Write};
use termcolor::{Buffer, Color, ColorSpec, WriteColor};

/// Zero-based line/column caret into a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Position { line, column }
    }
}

/// Inclusive source range, the location every diagnostic is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    /// Used for manufactured library declarations, which have no source.
    pub const EMPTY: Range = Range {
        start: Position { line: 0, column: 0 },
        end: Position { line: 0, column: 0 },
    };

    pub fn new(start: Position, end: Position) -> Self {
        Range { start, end }
    }

    pub fn at_line(line: u32) -> Self {
        Range {
            start: Position { line, column: 0 },
            end: Position { line, column: 0 },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Error,
}

impl Severity {
    fn as_str(self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Error => "error",
        }
    }

    fn color(self) -> Color {
        match self {
            Severity::Info => Color::Cyan,
            Severity::Error => Color::Red,
        }
    }
}

/// A single user-visible diagnostic, owned by the module it was reported on.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorRecord {
    pub message: String,
    pub severity: Severity,
    pub range: Range,
}

impl ErrorRecord {
    pub fn error(message: String, range: Range) -> Self {
        ErrorRecord {
            message,
            severity: Severity::Error,
            range,
        }
    }

    pub fn info(message: String, range: Range) -> Self {
        ErrorRecord {
            message,
            severity: Severity::Info,
            range,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Renders the records of one module, in reporting order.
pub fn write_records(
    writer: &mut dyn WriteColor,
    module_name: &str,
    records: &[ErrorRecord],
) -> io::Result<()> {
    for record in records {
        writer.set_color(ColorSpec::new().set_fg(Some(record.severity.color())).set_bold(true))?;
        write!(writer, "{}", record.severity.as_str())?;
        writer.reset()?;
        writeln!(
            writer,
            ": {} ({}:{}:{})",
            record.message,
            module_name,
            record.range.start.line + 1,
            record.range.start.column + 1,
        )?;
    }
    Ok(())
}

/// Writer for tests that only care about the rendered text.
pub fn no_color_buffer() -> Buffer {
    Buffer::no_color()
}
