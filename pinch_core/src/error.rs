//! Domain errors for the pinch detector core.
//!
//! Only the two fatal kinds from the error-handling design live here.
//! Template-mismatch and sampling-rate-mismatch are warnings, delivered
//! through `pinch_traits::WarnSink`, not propagated as `Err`.
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DetectorError {
    /// A `SensorStream` invariant was violated: too few samples, a
    /// duration shorter than `min_duration_s`, or a non-finite value in
    /// `t`/`a_xyz`/`g_xyz`.
    #[error("precondition violated: {0}")]
    Precondition(String),
    /// A `DetectorConfig` field was unrecognized or out of range.
    #[error("invalid configuration: {0}")]
    Configuration(String),
}

#[cfg(test)]
mod tests {
    use super::DetectorError;

    #[test]
    fn display_is_stable() {
        assert_eq!(
            DetectorError::Precondition("N < 3".into()).to_string(),
            "precondition violated: N < 3"
        );
        assert_eq!(
            DetectorError::Configuration("k_mad <= 0".into()).to_string(),
            "invalid configuration: k_mad <= 0"
        );
    }
}
