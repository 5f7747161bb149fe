//! The trait seam between `pinch_core` and its callers.
//!
//! `pinch_core` never logs to a file and never decides how a warning should
//! be surfaced; it only knows that it has one. Callers supply a `WarnSink`
//! implementation to decide what happens next.

use std::fmt;

/// A structured warning emitted by a detector or loader.
///
/// `kind` is stable and matchable; `message` is a human-readable detail
/// that may include numeric context (measured vs. configured values, etc).
#[derive(Debug, Clone, PartialEq)]
pub struct Warning {
    pub kind: WarnKind,
    pub message: String,
}

impl Warning {
    pub fn new(kind: WarnKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// The taxonomy of non-fatal conditions a detector or loader may report.
///
/// These correspond to the warning-only error kinds in the error handling
/// design: a run never aborts because of one of these, it only tells the
/// caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarnKind {
    /// Gaps between consecutive samples exceeded `max_gap_s`.
    SamplingGap,
    /// Measured sample rate deviates from the configured one by more than 2%.
    SamplingRateMismatch,
    /// A loaded template bundle's critical config deviates from the current
    /// detector config by more than 0.1 in some field.
    TemplateMismatch,
}

impl fmt::Display for WarnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WarnKind::SamplingGap => "sampling gap",
            WarnKind::SamplingRateMismatch => "sampling rate mismatch",
            WarnKind::TemplateMismatch => "template mismatch",
        };
        f.write_str(s)
    }
}

/// Receives structured warnings from the core or from loaders.
///
/// Implementors decide what to do with a warning: print it, collect it,
/// forward it to `tracing`, or drop it. The core holds only a `&mut dyn
/// WarnSink` for the duration of a single run; it never stores one.
pub trait WarnSink {
    fn warn(&mut self, warning: Warning);
}

/// Discards every warning. Useful for callers that genuinely don't care,
/// and for tests that only check the return value of a run.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullWarnSink;

impl WarnSink for NullWarnSink {
    fn warn(&mut self, _warning: Warning) {}
}

/// Collects warnings into a `Vec` in emission order. Used by tests that
/// need to assert on exactly which warnings fired.
#[derive(Debug, Default, Clone)]
pub struct VecWarnSink(pub Vec<Warning>);

impl WarnSink for VecWarnSink {
    fn warn(&mut self, warning: Warning) {
        self.0.push(warning);
    }
}

/// Forwards every warning to `tracing::warn!`. The default choice for
/// `pinch_cli`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingWarnSink;

impl WarnSink for TracingWarnSink {
    fn warn(&mut self, warning: Warning) {
        tracing::warn!(kind = %warning.kind, message = %warning.message, "detector warning");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vec_sink_records_in_order() {
        let mut sink = VecWarnSink::default();
        sink.warn(Warning::new(WarnKind::SamplingGap, "gap at t=1.2s"));
        sink.warn(Warning::new(WarnKind::TemplateMismatch, "fs differs"));
        assert_eq!(sink.0.len(), 2);
        assert_eq!(sink.0[0].kind, WarnKind::SamplingGap);
        assert_eq!(sink.0[1].kind, WarnKind::TemplateMismatch);
    }

    #[test]
    fn null_sink_drops_everything() {
        let mut sink = NullWarnSink;
        sink.warn(Warning::new(WarnKind::SamplingRateMismatch, "fs off by 3%"));
        // nothing to assert; this just must not panic
    }
}
