//! Reporting the outcome of a command to the user.

use std::io::{self, Write};
use std::process::ExitCode;

use log::error;
use serde_json::Value;


//------------ Report --------------------------------------------------------

/// What a command has to tell the user.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Report {
    /// A JSON document pretty-printed to stdout.
    Json(Value),

    /// A line of text printed to stdout.
    Line(String),

    /// Nothing to print.
    Empty,

    /// A failure, logged at error level.
    Failed(String),

    /// A failure that happened before logging was set up.
    ///
    /// These go straight to stderr.
    Fatal(String),
}

impl Report {
    pub fn failed(err: impl ToString) -> Self {
        Report::Failed(err.to_string())
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Report::Failed(_) | Report::Fatal(_))
    }

    /// Writes the successful output of the report.
    pub fn write(&self, out: &mut impl Write) -> io::Result<()> {
        match self {
            Report::Json(value) => {
                serde_json::to_writer_pretty(&mut *out, value)?;
                writeln!(out)
            }
            Report::Line(line) => writeln!(out, "{}", line),
            Report::Empty | Report::Failed(_) | Report::Fatal(_) => Ok(()),
        }
    }

    /// Delivers the report and returns the exit code for the process.
    pub fn finish(self) -> ExitCode {
        match self {
            Report::Failed(msg) => {
                error!("{}", msg);
                ExitCode::FAILURE
            }
            Report::Fatal(msg) => {
                eprintln!("{}", msg);
                ExitCode::FAILURE
            }
            report => {
                let stdout = io::stdout();
                match report.write(&mut stdout.lock()) {
                    Ok(()) => ExitCode::SUCCESS,
                    Err(e) => {
                        error!("Cannot write output: {}", e);
                        ExitCode::FAILURE
                    }
                }
            }
        }
    }
}


//------------ Tests ---------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn output(report: &Report) -> String {
        let mut out = Vec::new();
        report.write(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn json_is_pretty_printed() {
        let report = Report::Json(json!({"url": {"a": "<b>&"}}));
        assert_eq!(output(&report), "{\n  \"url\": {\n    \"a\": \"<b>&\"\n  }\n}\n");
    }

    #[test]
    fn failures_print_nothing_to_stdout() {
        assert_eq!(output(&Report::failed("boom")), "");
        assert!(Report::Fatal("boom".into()).is_failure());
        assert!(!Report::Empty.is_failure());
    }
}
