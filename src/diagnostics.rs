//! Non-fatal findings: unknown opcodes, cycle truncation, item/scene-name
//! ambiguity resolved by fallback. Modeled directly on
//! `amtep-ck3-tiger/src/report/{report_struct.rs,builder.rs,errors.rs}`:
//! a severity-ordered struct, a fluent builder, and a process-global sink
//! that never affects the exit status.

use std::fmt;
use std::sync::Mutex;

use crate::loc::{ErrorLoc, Loc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        f.write_str(s)
    }
}

/// Identifies the *kind* of non-fatal finding, used for optional filtering
/// and for grouping in the final summary. Not exhaustive by design — new
/// kinds can be added as new subsystems grow findings of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FindingKey {
    UnknownOpcode,
    CycleDetected,
    AmbiguousItemName,
    AmbiguousConversationConvergence,
    MissingMachine,
    SkippedTempItem,
    MultipleNameModifiers,
}

impl fmt::Display for FindingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FindingKey::UnknownOpcode => "unknown-opcode",
            FindingKey::CycleDetected => "cycle-detected",
            FindingKey::AmbiguousItemName => "ambiguous-item-name",
            FindingKey::AmbiguousConversationConvergence => "ambiguous-conversation-convergence",
            FindingKey::MissingMachine => "missing-machine",
            FindingKey::SkippedTempItem => "skipped-temp-item",
            FindingKey::MultipleNameModifiers => "multiple-name-modifiers",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone)]
pub struct Finding {
    pub severity: Severity,
    pub key: FindingKey,
    pub message: String,
    pub loc: Option<Loc>,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: [{}] {}", self.severity, self.key, self.message)?;
        if let Some(loc) = &self.loc {
            write!(f, " ({loc})")?;
        }
        Ok(())
    }
}

/// Stage 1 of the fluent builder: choose severity then message.
pub struct FindingBuilder {
    key: FindingKey,
    severity: Severity,
}

pub struct FindingBuilderStage2 {
    key: FindingKey,
    severity: Severity,
    message: String,
    loc: Option<Loc>,
}

pub fn info(key: FindingKey) -> FindingBuilder {
    FindingBuilder { key, severity: Severity::Info }
}

pub fn warn(key: FindingKey) -> FindingBuilder {
    FindingBuilder { key, severity: Severity::Warning }
}

pub fn err(key: FindingKey) -> FindingBuilder {
    FindingBuilder { key, severity: Severity::Error }
}

impl FindingBuilder {
    pub fn msg(self, message: impl Into<String>) -> FindingBuilderStage2 {
        FindingBuilderStage2 {
            key: self.key,
            severity: self.severity,
            message: message.into(),
            loc: None,
        }
    }
}

impl FindingBuilderStage2 {
    pub fn loc(mut self, loc: impl ErrorLoc) -> Self {
        self.loc = Some(loc.into_loc());
        self
    }

    pub fn push(self) {
        push_finding(Finding {
            severity: self.severity,
            key: self.key,
            message: self.message,
            loc: self.loc,
        });
    }
}

struct Sink {
    findings: Vec<Finding>,
}

static SINK: Mutex<Vec<Finding>> = Mutex::new(Vec::new());

fn push_finding(finding: Finding) {
    SINK.lock().expect("diagnostics sink poisoned").push(finding);
}

/// Drains the accumulated findings, sorted by descending severity then by
/// insertion order within a severity (stable sort), matching the teacher's
/// `take_reports` ordering contract.
pub fn take_findings() -> Vec<Finding> {
    let mut findings = std::mem::take(&mut *SINK.lock().expect("diagnostics sink poisoned"));
    findings.sort_by(|a, b| b.severity.cmp(&a.severity));
    findings
}

pub fn count() -> usize {
    SINK.lock().expect("diagnostics sink poisoned").len()
}

/// Colours a severity tag the way the teacher's `report/output_style.rs`
/// colours its own `InfoTag`/error styles (bold red for errors, yellow for
/// warnings, plain for info) — simplified here to one `ansiterm::Colour`
/// per severity rather than the teacher's full styled-element map, since
/// we only ever colour the one tag, not a whole source-excerpt rendering.
fn styled_severity(severity: Severity) -> ansiterm::ANSIString<'static> {
    use ansiterm::Colour::{Red, White, Yellow};
    match severity {
        Severity::Error => Red.bold().paint(severity.to_string()),
        Severity::Warning => Yellow.paint(severity.to_string()),
        Severity::Info => White.paint(severity.to_string()),
    }
}

/// Prints the accumulated findings to stderr, grouped by severity. Never
/// affects the process exit status — call sites must independently decide
/// whether `Error`-severity findings should influence exit code (they do
/// not, by spec: the taxonomy in §7 treats diagnostics as advisory).
pub fn emit_to_stderr() {
    let findings = take_findings();
    if findings.is_empty() {
        return;
    }
    eprintln!("--- {} diagnostic(s) ---", findings.len());
    for finding in &findings {
        eprintln!("{}: [{}] {}", styled_severity(finding.severity), finding.key, finding.message);
        if let Some(loc) = &finding.loc {
            eprintln!("  ({loc})");
        }
    }
}

// A private helper used only by tests to reset the global sink between
// cases, since tests otherwise share process-global state.
#[cfg(test)]
fn reset() {
    SINK.lock().expect("diagnostics sink poisoned").clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    // Serializes tests touching the global sink.
    static TEST_LOCK: StdMutex<()> = StdMutex::new(());

    #[test]
    fn findings_sort_by_descending_severity() {
        let _guard = TEST_LOCK.lock().unwrap();
        reset();
        info(FindingKey::MissingMachine).msg("first").push();
        err(FindingKey::UnknownOpcode).msg("second").push();
        warn(FindingKey::CycleDetected).msg("third").push();

        let findings = take_findings();
        assert_eq!(findings.len(), 3);
        assert_eq!(findings[0].severity, Severity::Error);
        assert_eq!(findings[1].severity, Severity::Warning);
        assert_eq!(findings[2].severity, Severity::Info);
    }

    #[test]
    fn take_findings_drains_the_sink() {
        let _guard = TEST_LOCK.lock().unwrap();
        reset();
        warn(FindingKey::AmbiguousItemName).msg("x").push();
        assert_eq!(take_findings().len(), 1);
        assert_eq!(count(), 0);
    }
}
