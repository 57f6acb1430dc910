use clap::{parser::ValueSource, ArgMatches, Args, ValueEnum};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use strum_macros::{Display, EnumIter, EnumString};

#[derive(Args, Debug, Clone, Serialize, Deserialize, Default)]
pub struct RunConfig {
    #[command(flatten)]
    #[serde(default)]
    pub search: SearchParams,
    #[command(flatten)]
    #[serde(default)]
    pub anneal: AnnealParams,
    #[command(flatten)]
    #[serde(default)]
    pub termination: TerminationParams,
    #[command(flatten)]
    #[serde(default)]
    pub kernels: KernelParams,
}

#[derive(Args, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchParams {
    /// Seed for the proposal RNG. Unseeded runs are not reproducible.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Emit a reported (pixelized) checkpoint every N iterations.
    #[arg(long, default_value_t = 1)]
    pub report_every: usize,

    /// Check partition/configuration agreement after every acceptance.
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub verify_consistency: bool,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            seed: None,
            report_every: 1,
            verify_consistency: true,
        }
    }
}

#[derive(
    ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[value(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AnnealKind {
    Constant,
    Geometric,
    LogInterpolated,
}

#[derive(Args, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnealParams {
    #[arg(long, value_enum, default_value_t = AnnealKind::LogInterpolated)]
    pub anneal: AnnealKind,
    #[arg(long, default_value_t = 1000.0)]
    pub temp_max: f64,
    #[arg(long, default_value_t = 0.08)]
    pub temp_min: f64,
    /// Multiplicative decay per iteration (geometric scheme).
    #[arg(long, default_value_t = 0.999)]
    pub temp_decay: f64,
    /// Iterations over which `temp_max` falls to `temp_min` (log-interpolated scheme).
    #[arg(long, default_value_t = 10_000)]
    pub temp_horizon: usize,
}

impl Default for AnnealParams {
    fn default() -> Self {
        Self {
            anneal: AnnealKind::LogInterpolated,
            temp_max: 1000.0,
            temp_min: 0.08,
            temp_decay: 0.999,
            temp_horizon: 10_000,
        }
    }
}

#[derive(Args, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminationParams {
    #[arg(long, default_value_t = 10_000)]
    pub max_iterations: usize,

    /// Stop once the score has not moved for this many consecutive iterations.
    #[arg(long)]
    pub unchanged_score_iterations: Option<usize>,

    /// Score tolerance as a power of ten (-2 means 0.01).
    #[arg(long, default_value_t = -2, allow_hyphen_values = true)]
    pub score_tolerance: i32,

    /// Stop once the mark count has not moved for this many consecutive iterations.
    #[arg(long)]
    pub unchanged_size_iterations: Option<usize>,

    /// Wall-clock budget in seconds.
    #[arg(long)]
    pub max_seconds: Option<u64>,
}

impl Default for TerminationParams {
    fn default() -> Self {
        Self {
            max_iterations: 10_000,
            unchanged_score_iterations: None,
            score_tolerance: -2,
            unchanged_size_iterations: None,
            max_seconds: None,
        }
    }
}

#[derive(
    ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[value(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RemovalStrategy {
    Uniform,
    EnergyWeighted,
}

#[derive(Args, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelParams {
    #[arg(long, default_value_t = 0.4)]
    pub birth_probability: f64,
    #[arg(long, default_value_t = 0.3)]
    pub death_probability: f64,
    #[arg(long, default_value_t = 0.3)]
    pub replace_probability: f64,

    /// Marks proposed per birth.
    #[arg(long, default_value_t = 1)]
    pub birth_count: usize,

    /// Birth attempts per death inside a replace move.
    #[arg(long, default_value_t = 3, allow_hyphen_values = true)]
    pub replace_repeats: i64,

    #[arg(long, value_enum, default_value_t = RemovalStrategy::Uniform)]
    pub removal: RemovalStrategy,

    /// Exponent applied to shifted mark energies by the energy-weighted removal.
    #[arg(long, default_value_t = 1.5)]
    pub removal_exponent: f64,
}

impl Default for KernelParams {
    fn default() -> Self {
        Self {
            birth_probability: 0.4,
            death_probability: 0.3,
            replace_probability: 0.3,
            birth_count: 1,
            replace_repeats: 3,
            removal: RemovalStrategy::Uniform,
            removal_exponent: 1.5,
        }
    }
}

impl RunConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {:?}: {}", path, e))?;
        serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse config JSON {:?}: {}", path, e))
    }

    /// Rejects values the optimizer cannot run with. Called before any kernel is built.
    pub fn validate(&self) -> Result<(), String> {
        let k = &self.kernels;
        let probs = [
            ("birth_probability", k.birth_probability),
            ("death_probability", k.death_probability),
            ("replace_probability", k.replace_probability),
        ];
        for (name, p) in probs {
            if !p.is_finite() || p < 0.0 {
                return Err(format!("{} must be a non-negative number, got {}", name, p));
            }
        }
        if probs.iter().map(|(_, p)| p).sum::<f64>() <= 0.0 {
            return Err("at least one kernel probability must be positive".to_string());
        }
        if k.replace_repeats < 0 {
            return Err(format!(
                "replace_repeats must not be negative, got {}",
                k.replace_repeats
            ));
        }
        if k.birth_count == 0 {
            return Err("birth_count must be at least 1".to_string());
        }
        if self.search.report_every == 0 {
            return Err("report_every must be at least 1".to_string());
        }

        let a = &self.anneal;
        if !(a.temp_max > 0.0 && a.temp_min > 0.0) {
            return Err(format!(
                "temperatures must be positive (temp_max={}, temp_min={})",
                a.temp_max, a.temp_min
            ));
        }
        if a.temp_min > a.temp_max {
            return Err("temp_min must not exceed temp_max".to_string());
        }
        if !(a.temp_decay > 0.0 && a.temp_decay <= 1.0) {
            return Err(format!("temp_decay must lie in (0, 1], got {}", a.temp_decay));
        }

        if self.termination.unchanged_score_iterations == Some(0)
            || self.termination.unchanged_size_iterations == Some(0)
        {
            return Err("unchanged-* iteration counts must be at least 1".to_string());
        }
        Ok(())
    }

    /// Overwrites fields with command-line values, but only those the user actually typed.
    pub fn merge_from_cli(&mut self, cli: &RunConfig, matches: &ArgMatches) {
        macro_rules! update_if_present {
            ($group:ident . $field:ident) => {
                if matches.value_source(stringify!($field)) == Some(ValueSource::CommandLine) {
                    self.$group.$field = cli.$group.$field.clone();
                }
            };
        }

        update_if_present!(search.seed);
        update_if_present!(search.report_every);
        update_if_present!(search.verify_consistency);

        update_if_present!(anneal.anneal);
        update_if_present!(anneal.temp_max);
        update_if_present!(anneal.temp_min);
        update_if_present!(anneal.temp_decay);
        update_if_present!(anneal.temp_horizon);

        update_if_present!(termination.max_iterations);
        update_if_present!(termination.unchanged_score_iterations);
        update_if_present!(termination.score_tolerance);
        update_if_present!(termination.unchanged_size_iterations);
        update_if_present!(termination.max_seconds);

        update_if_present!(kernels.birth_probability);
        update_if_present!(kernels.death_probability);
        update_if_present!(kernels.replace_probability);
        update_if_present!(kernels.birth_count);
        update_if_present!(kernels.replace_repeats);
        update_if_present!(kernels.removal);
        update_if_present!(kernels.removal_exponent);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(RunConfig::default().validate().is_ok());
    }

    #[test]
    fn negative_repeats_rejected() {
        let mut cfg = RunConfig::default();
        cfg.kernels.replace_repeats = -1;
        let err = cfg.validate().unwrap_err();
        assert!(err.contains("replace_repeats"));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg: RunConfig =
            serde_json::from_str(r#"{ "termination": { "max_iterations": 42 } }"#).unwrap();
        assert_eq!(cfg.termination.max_iterations, 42);
        assert_eq!(cfg.termination.score_tolerance, -2);
        assert_eq!(cfg.kernels.removal, RemovalStrategy::Uniform);
    }

    #[test]
    fn kinds_round_trip_through_strings() {
        use std::str::FromStr;
        assert_eq!(AnnealKind::LogInterpolated.to_string(), "log_interpolated");
        assert_eq!(
            <RemovalStrategy as FromStr>::from_str("energy_weighted").unwrap(),
            RemovalStrategy::EnergyWeighted
        );
    }
}
