//! Effective per-camera pipeline configuration (§3).

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Trigger mode selecting a detection strategy variant (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum PipelineMode {
    #[default]
    Disabled,
    VisualOnly,
    Continuous,
    MotionTriggered,
    Scheduled,
    Hybrid,
}

impl PipelineMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineMode::Disabled => "disabled",
            PipelineMode::VisualOnly => "visual_only",
            PipelineMode::Continuous => "continuous",
            PipelineMode::MotionTriggered => "motion_triggered",
            PipelineMode::Scheduled => "scheduled",
            PipelineMode::Hybrid => "hybrid",
        }
    }

    /// Whether motion events may be persisted and alerts dispatched in this
    /// mode (§3 Motion event, §7 event suppression invariant).
    pub fn events_allowed(&self) -> bool {
        !matches!(self, PipelineMode::VisualOnly | PipelineMode::Disabled)
    }
}

/// Only `Sequential` is supported (§3, §4.5: parallel execution excluded).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    #[default]
    Sequential,
}

/// Resolved, camera-specific pipeline configuration.
///
/// Unset per-camera fields inherit from global defaults at merge time (see
/// `EffectivePipelineConfig::merge`).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EffectivePipelineConfig {
    pub mode: PipelineMode,
    pub execution_mode: ExecutionMode,
    /// Ordered list of enabled detector names (e.g. ["yolo", "face"]).
    pub detectors: Vec<String>,
    pub schedule_interval_secs: u64,
    /// In (0, 1].
    pub motion_sensitivity: f32,
    pub motion_cooldown_ms: u64,
    /// Confidence threshold passed to the primary detector.
    pub confidence_threshold: f32,
    pub face_recognition_enabled: bool,
    pub plate_recognition_enabled: bool,
    /// Minimum interval enforced by `continuous`/`visual_only` when > 0.
    pub min_interval_ms: u64,
}

impl Default for EffectivePipelineConfig {
    fn default() -> Self {
        Self {
            mode: PipelineMode::Disabled,
            execution_mode: ExecutionMode::Sequential,
            detectors: Vec::new(),
            schedule_interval_secs: 5,
            motion_sensitivity: 0.1,
            motion_cooldown_ms: 2000,
            confidence_threshold: 0.5,
            face_recognition_enabled: false,
            plate_recognition_enabled: false,
            min_interval_ms: 0,
        }
    }
}

/// Optional per-camera overrides of the global defaults; any field left
/// `None` inherits from the supplied defaults at merge time.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct PipelineConfigOverrides {
    pub mode: Option<PipelineMode>,
    pub detectors: Option<Vec<String>>,
    pub schedule_interval_secs: Option<u64>,
    pub motion_sensitivity: Option<f32>,
    pub motion_cooldown_ms: Option<u64>,
    pub confidence_threshold: Option<f32>,
    pub face_recognition_enabled: Option<bool>,
    pub plate_recognition_enabled: Option<bool>,
    pub min_interval_ms: Option<u64>,
}

impl EffectivePipelineConfig {
    pub fn merge(defaults: &EffectivePipelineConfig, overrides: &PipelineConfigOverrides) -> Self {
        Self {
            mode: overrides.mode.unwrap_or(defaults.mode),
            execution_mode: defaults.execution_mode,
            detectors: overrides
                .detectors
                .clone()
                .unwrap_or_else(|| defaults.detectors.clone()),
            schedule_interval_secs: overrides
                .schedule_interval_secs
                .unwrap_or(defaults.schedule_interval_secs),
            motion_sensitivity: overrides
                .motion_sensitivity
                .unwrap_or(defaults.motion_sensitivity),
            motion_cooldown_ms: overrides
                .motion_cooldown_ms
                .unwrap_or(defaults.motion_cooldown_ms),
            confidence_threshold: overrides
                .confidence_threshold
                .unwrap_or(defaults.confidence_threshold),
            face_recognition_enabled: overrides
                .face_recognition_enabled
                .unwrap_or(defaults.face_recognition_enabled),
            plate_recognition_enabled: overrides
                .plate_recognition_enabled
                .unwrap_or(defaults.plate_recognition_enabled),
            min_interval_ms: overrides.min_interval_ms.unwrap_or(defaults.min_interval_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visual_only_and_disabled_suppress_events() {
        assert!(!PipelineMode::VisualOnly.events_allowed());
        assert!(!PipelineMode::Disabled.events_allowed());
        assert!(PipelineMode::Continuous.events_allowed());
        assert!(PipelineMode::MotionTriggered.events_allowed());
    }

    #[test]
    fn merge_inherits_unset_fields() {
        let defaults = EffectivePipelineConfig::default();
        let overrides = PipelineConfigOverrides {
            mode: Some(PipelineMode::Continuous),
            ..Default::default()
        };
        let effective = EffectivePipelineConfig::merge(&defaults, &overrides);
        assert_eq!(effective.mode, PipelineMode::Continuous);
        assert_eq!(effective.motion_cooldown_ms, defaults.motion_cooldown_ms);
    }
}
