// SPDX-License-Identifier: GPL-3.0-only

//! Print pipeline supervision
//!
//! Printing is two external commands run one after the other: convert the
//! composite to the print format, then hand the result to the printer.
//! Both are fire-and-forget OS processes; the state machine polls their
//! exit status once per tick and never blocks on them. A non-zero exit at
//! either step is terminal for that session's printing, and a running
//! child is never cancelled.

use crate::config::Config;
use crate::errors::PrintError;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use tracing::{error, info};

/// Renders the configured command templates and spawns their processes
pub struct PrintSpooler {
    convert_template: Vec<String>,
    submit_template: Vec<String>,
    printer: String,
}

impl PrintSpooler {
    pub fn new(
        convert_template: Vec<String>,
        submit_template: Vec<String>,
        printer: impl Into<String>,
    ) -> Self {
        Self {
            convert_template,
            submit_template,
            printer: printer.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.convert_command.clone(),
            config.print_command.clone(),
            config.printer_name.clone(),
        )
    }

    /// Start the convert-to-print-format step
    pub fn spawn_convert(&self, src: &Path, dst: &Path) -> Result<Child, PrintError> {
        let argv = render(&self.convert_template, &[
            ("{src}", &src.display().to_string()),
            ("{dst}", &dst.display().to_string()),
        ]);
        spawn(argv)
    }

    /// Start the submit-to-printer step
    pub fn spawn_submit(&self, pdf: &Path) -> Result<Child, PrintError> {
        let argv = render(&self.submit_template, &[
            ("{printer}", &self.printer),
            ("{pdf}", &pdf.display().to_string()),
        ]);
        spawn(argv)
    }
}

fn render(template: &[String], vars: &[(&str, &str)]) -> Vec<String> {
    template
        .iter()
        .map(|arg| {
            let mut arg = arg.clone();
            for (name, value) in vars {
                arg = arg.replace(name, value);
            }
            arg
        })
        .collect()
}

fn spawn(argv: Vec<String>) -> Result<Child, PrintError> {
    let (program, args) = argv.split_first().ok_or(PrintError::EmptyCommand)?;
    Command::new(program)
        .args(args)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| PrintError::SpawnFailed(format!("{}: {}", program, e)))
}

/// Where a print job currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrintStage {
    /// Convert step is running
    Converting,
    /// Submit step is running
    Submitting,
    /// Both steps exited successfully
    Done,
    /// A step failed to spawn or exited non-zero
    Failed,
}

enum Stage {
    Converting(Child),
    Submitting(Child),
    Done,
    Failed,
}

/// One session's print job: convert, then submit, each observed by
/// non-blocking polls. At most one child process is tracked at a time.
pub struct PrintJob {
    pdf: PathBuf,
    stage: Stage,
}

impl PrintJob {
    /// Kick off the convert step. A spawn failure is recorded as a failed
    /// job rather than returned, so the caller's tick stays total.
    pub fn start(spooler: &PrintSpooler, src: &Path, pdf: PathBuf) -> PrintJob {
        let stage = match spooler.spawn_convert(src, &pdf) {
            Ok(child) => {
                info!(src = %src.display(), pdf = %pdf.display(), "Print conversion started");
                Stage::Converting(child)
            }
            Err(e) => {
                error!(error = %e, "Print conversion could not start");
                Stage::Failed
            }
        };
        PrintJob { pdf, stage }
    }

    /// Check the pending child without blocking and advance the job.
    /// The submit step starts strictly after convert reports success.
    pub fn poll(&mut self, spooler: &PrintSpooler) {
        match &mut self.stage {
            Stage::Converting(child) => match child.try_wait() {
                Ok(Some(status)) if status.success() => {
                    self.stage = match spooler.spawn_submit(&self.pdf) {
                        Ok(next) => {
                            info!(pdf = %self.pdf.display(), "Submitting to printer");
                            Stage::Submitting(next)
                        }
                        Err(e) => {
                            error!(error = %e, "Print submission could not start");
                            Stage::Failed
                        }
                    };
                }
                Ok(Some(status)) => {
                    error!(%status, "Print conversion failed");
                    self.stage = Stage::Failed;
                }
                Ok(None) => {}
                Err(e) => {
                    error!(error = %e, "Lost track of conversion process");
                    self.stage = Stage::Failed;
                }
            },
            Stage::Submitting(child) => match child.try_wait() {
                Ok(Some(status)) if status.success() => {
                    info!(pdf = %self.pdf.display(), "Print job handed to printer");
                    self.stage = Stage::Done;
                }
                Ok(Some(status)) => {
                    error!(%status, "Print submission failed");
                    self.stage = Stage::Failed;
                }
                Ok(None) => {}
                Err(e) => {
                    error!(error = %e, "Lost track of submission process");
                    self.stage = Stage::Failed;
                }
            },
            Stage::Done | Stage::Failed => {}
        }
    }

    pub fn stage(&self) -> PrintStage {
        match self.stage {
            Stage::Converting(_) => PrintStage::Converting,
            Stage::Submitting(_) => PrintStage::Submitting,
            Stage::Done => PrintStage::Done,
            Stage::Failed => PrintStage::Failed,
        }
    }

    /// Whether the job has reached a terminal stage
    pub fn is_settled(&self) -> bool {
        matches!(self.stage, Stage::Done | Stage::Failed)
    }

    pub fn succeeded(&self) -> bool {
        matches!(self.stage, Stage::Done)
    }
}
