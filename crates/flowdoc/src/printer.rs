//! Terminal report printer
//!
//! This module prints the result of a conversion run: one line per file
//! followed by a summary, with colored status labels.
//!
//! # Example
//!
//! ```no_run
//! use flowdoc::printer::ReportPrinter;
//! use flowdoc::Converter;
//!
//! let output = Converter::new().path("src").run().unwrap();
//! ReportPrinter::new(&output, true).print_to_stdout();
//! ```

use crate::builder::{ConvertOutput, FileReport, FileStatus};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::io;
use termcolor::{Color, ColorChoice, ColorSpec, NoColor, StandardStream, WriteColor};

/// Terminal printer for a [`ConvertOutput`]
pub struct ReportPrinter<'a> {
    /// Output to print
    output: &'a ConvertOutput,
    /// Whether to use colored output
    use_color: bool,
    /// Whether to list unchanged files too
    verbose: bool,
}

impl<'a> ReportPrinter<'a> {
    /// Create a new printer
    pub fn new(output: &'a ConvertOutput, use_color: bool) -> Self {
        Self {
            output,
            use_color,
            verbose: false,
        }
    }

    /// List unchanged files as well
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Print directly to stdout with colors
    pub fn print_to_stdout(&self) {
        let choice = if self.use_color {
            ColorChoice::Auto
        } else {
            ColorChoice::Never
        };
        let mut stdout = StandardStream::stdout(choice);
        if let Err(e) = self.write_colored(&mut stdout) {
            tracing::error!(error = %e, "failed to print report");
        }
    }

    /// Write the report to a WriteColor implementor
    pub fn write_colored<W: WriteColor>(&self, w: &mut W) -> io::Result<()> {
        for file in &self.output.files {
            if file.status == FileStatus::Unchanged && !self.verbose {
                continue;
            }
            self.write_file(w, file)?;
        }

        if !self.output.files.is_empty() {
            writeln!(w)?;
        }
        self.write_summary(w)
    }

    fn write_file<W: WriteColor>(&self, w: &mut W, file: &FileReport) -> io::Result<()> {
        let color = match file.status {
            FileStatus::Unchanged => None,
            FileStatus::Changed => Some(Color::Yellow),
            FileStatus::Written => Some(Color::Green),
            FileStatus::Failed => Some(Color::Red),
        };
        w.set_color(ColorSpec::new().set_fg(color).set_bold(color.is_some()))?;
        write!(w, "{:<13}", file.status.display())?;
        w.reset()?;

        write!(w, "{}", file.path.display())?;
        match &file.error {
            Some(error) => {
                write!(w, ": ")?;
                self.write_gray(w, error)?;
            }
            None if file.edits > 0 => {
                self.write_gray(w, &format!(" ({})", plural(file.edits, "annotation")))?;
            }
            None => {}
        }
        writeln!(w)
    }

    fn write_summary<W: WriteColor>(&self, w: &mut W) -> io::Result<()> {
        let output = self.output;
        self.write_bold(w, &plural(output.files.len(), "file"))?;
        write!(w, " checked, ")?;

        let changed = output.changed_count();
        let label = if output.written_count() == changed && changed > 0 {
            "written"
        } else {
            "changed"
        };
        self.write_colored_text(w, Color::Green, &format!("{} {}", changed, label))?;

        let failed = output.failed_count();
        if failed > 0 {
            write!(w, ", ")?;
            self.write_colored_text(w, Color::Red, &format!("{} failed", failed))?;
        }
        writeln!(w, ", {}", plural(output.edit_count(), "annotation"))
    }

    // === Color helper methods ===

    fn write_colored_text<W: WriteColor>(&self, w: &mut W, color: Color, s: &str) -> io::Result<()> {
        w.set_color(ColorSpec::new().set_fg(Some(color)))?;
        write!(w, "{}", s)?;
        w.reset()
    }

    fn write_bold<W: WriteColor>(&self, w: &mut W, s: &str) -> io::Result<()> {
        w.set_color(ColorSpec::new().set_bold(true))?;
        write!(w, "{}", s)?;
        w.reset()
    }

    fn write_gray<W: WriteColor>(&self, w: &mut W, s: &str) -> io::Result<()> {
        w.set_color(ColorSpec::new().set_fg(Some(Color::White)).set_dimmed(true))?;
        write!(w, "{}", s)?;
        w.reset()
    }
}

impl Display for ReportPrinter<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let mut plain = NoColor::new(Vec::new());
        self.write_colored(&mut plain).map_err(|_| std::fmt::Error)?;
        f.write_str(&String::from_utf8_lossy(&plain.into_inner()))
    }
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{} {}", count, noun)
    } else {
        format!("{} {}s", count, noun)
    }
}
