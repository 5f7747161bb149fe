//! `Detector`: the tagged-variant entry point a caller reaches for instead
//! of importing `offline`/`streaming`/`twostage` directly.
//!
//! Each variant carries its own resolved config, mirroring
//! `pinch_config::DetectorConfig` one-to-one. `run` dispatches to the
//! matching module and returns the same `DetectorOutput` shape regardless
//! of which detector produced it.

use std::sync::Arc;

use pinch_config::DetectorConfig;

use crate::error::DetectorError;
use crate::model::{DetectorOutput, SensorStream};
use crate::template::TemplateVerifier;
use crate::{offline, streaming, twostage};

#[derive(Debug, Clone)]
pub enum Detector {
    Offline(pinch_config::OfflineConfig),
    Streaming(pinch_config::StreamingConfig),
    TwoStage(pinch_config::TwoStageConfig),
}

impl Detector {
    pub fn from_config(cfg: DetectorConfig) -> Self {
        match cfg {
            DetectorConfig::Stationary(c) => Detector::Offline(c),
            DetectorConfig::Streaming(c) => Detector::Streaming(c),
            DetectorConfig::TwoStage(c) => Detector::TwoStage(c),
        }
    }

    pub fn config(&self) -> DetectorConfig {
        match self {
            Detector::Offline(c) => DetectorConfig::Stationary(c.clone()),
            Detector::Streaming(c) => DetectorConfig::Streaming(c.clone()),
            Detector::TwoStage(c) => DetectorConfig::TwoStage(c.clone()),
        }
    }

    /// Runs the configured detector over a whole session.
    ///
    /// `templates` only matters to the two-stage detector; the offline and
    /// streaming detectors ignore it. `collect_rejections` only matters to
    /// the offline detector; the others ignore it and always report
    /// `rejected: None`.
    pub fn run(
        &self,
        stream: Arc<SensorStream>,
        templates: Option<&TemplateVerifier>,
        collect_rejections: bool,
    ) -> Result<DetectorOutput, DetectorError> {
        match self {
            Detector::Offline(cfg) => offline::run(stream, cfg, collect_rejections),
            Detector::Streaming(cfg) => streaming::run(stream, cfg),
            Detector::TwoStage(cfg) => twostage::run(stream, cfg, templates),
        }
    }
}
