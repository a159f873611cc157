use std::path::PathBuf;

use latch_core::bench::{BenchmarkConfig, LaunchCheck, PipelineStage, RunPhase};
use latch_core::compute::DevicePreference;
use latch_core::detect::{OrbParams, ScoreType};
use latch_core::error::LatchError;

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

#[test]
fn test_benchmark_defaults() {
    let config = BenchmarkConfig::default();
    assert_eq!(config.input, PathBuf::from("test.jpg"));
    assert_eq!(config.warmups, 100);
    assert_eq!(config.runs, 500);
    assert_eq!(config.border_margin, 36.0);
    assert_eq!(config.device, DevicePreference::Auto);
    assert_eq!(config.launch_check, LaunchCheck::Aggregate);
    assert!(config.descriptor_dump.is_none());
}

#[test]
fn test_orb_defaults() {
    let params = OrbParams::default();
    assert_eq!(params.n_features, 5000);
    assert_eq!(params.scale_factor, 1.2);
    assert_eq!(params.n_levels, 8);
    assert_eq!(params.edge_threshold, 31);
    assert_eq!(params.first_level, 0);
    assert_eq!(params.wta_k, 2);
    assert_eq!(params.score_type, ScoreType::Harris);
    assert_eq!(params.patch_size, 31);
    assert_eq!(params.fast_threshold, 20);
}

#[test]
fn test_plan_from_config() {
    let config = BenchmarkConfig {
        warmups: 3,
        runs: 7,
        launch_check: LaunchCheck::PerLaunch,
        ..Default::default()
    };
    let plan = config.plan();
    assert_eq!(plan.warmups, 3);
    assert_eq!(plan.runs, 7);
    assert_eq!(plan.launch_check, LaunchCheck::PerLaunch);
}

// ---------------------------------------------------------------------------
// TOML / JSON
// ---------------------------------------------------------------------------

#[test]
fn test_empty_toml_gives_defaults() {
    let config: BenchmarkConfig = toml::from_str("").unwrap();
    assert_eq!(config, BenchmarkConfig::default());
}

#[test]
fn test_partial_toml_overrides() {
    let text = r#"
        input = "frames/a.png"
        device = "Cpu"
        runs = 10
        launch_check = "PerLaunch"
        descriptor_dump = "out.bin"

        [detector]
        n_features = 800
        score_type = "Fast"
    "#;
    let config: BenchmarkConfig = toml::from_str(text).unwrap();
    assert_eq!(config.input, PathBuf::from("frames/a.png"));
    assert_eq!(config.device, DevicePreference::Cpu);
    assert_eq!(config.runs, 10);
    assert_eq!(config.warmups, 100);
    assert_eq!(config.launch_check, LaunchCheck::PerLaunch);
    assert_eq!(config.descriptor_dump, Some(PathBuf::from("out.bin")));
    assert_eq!(config.detector.n_features, 800);
    assert_eq!(config.detector.score_type, ScoreType::Fast);
    assert_eq!(config.detector.n_levels, 8);
}

#[test]
fn test_default_toml_round_trip() {
    let config = BenchmarkConfig::default();
    let text = toml::to_string_pretty(&config).unwrap();
    let back: BenchmarkConfig = toml::from_str(&text).unwrap();
    assert_eq!(back, config);
}

#[test]
fn test_json_serialization() {
    let config = BenchmarkConfig::default();
    let json = serde_json::to_value(&config).unwrap();
    assert_eq!(json["warmups"], 100);
    assert_eq!(json["device"], "Auto");
    assert_eq!(json["detector"]["score_type"], "Harris");
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

#[test]
fn test_negative_margin_rejected() {
    let config = BenchmarkConfig {
        border_margin: -1.0,
        ..Default::default()
    };
    assert!(matches!(config.validate(), Err(LatchError::InvalidConfig(_))));
}

#[test]
fn test_bad_detector_rejected() {
    let config = BenchmarkConfig {
        detector: OrbParams {
            wta_k: 7,
            ..Default::default()
        },
        ..Default::default()
    };
    assert!(config.validate().is_err());
    assert!(BenchmarkConfig::default().validate().is_ok());
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

#[test]
fn test_device_preference_display() {
    assert_eq!(DevicePreference::Auto.to_string(), "Auto");
    assert_eq!(DevicePreference::Cpu.to_string(), "CPU");
    assert_eq!(DevicePreference::Gpu.to_string(), "GPU");
}

#[test]
fn test_launch_check_display() {
    assert_eq!(LaunchCheck::Aggregate.to_string(), "aggregate");
    assert_eq!(LaunchCheck::PerLaunch.to_string(), "per launch");
}

#[test]
fn test_stage_and_phase_display() {
    assert_eq!(PipelineStage::Detecting.to_string(), "Detecting keypoints");
    assert_eq!(PipelineStage::WarmingUp.to_string(), "Warming up");
    assert_eq!(RunPhase::Provisioned.to_string(), "provisioned");
    assert_eq!(RunPhase::Released.to_string(), "released");
}
