/// Temperatures at or below this are treated as zero: worsening moves are never accepted.
pub const TEMPERATURE_EPSILON: f64 = 1e-12;

/// Energy added per placed mark by the coverage oracle. Keeps an empty
/// configuration from being a trivial optimum on flat backgrounds.
pub const DEFAULT_MARK_COST: f64 = 0.5;

/// Energy added per voxel claimed by more than one mark.
pub const DEFAULT_OVERLAP_PENALTY: f64 = 2.0;

