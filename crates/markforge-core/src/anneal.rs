use crate::config::{AnnealKind, AnnealParams};
use crate::error::{MppError, MppResult};

/// Temperature as a function of the iteration number.
pub trait AnnealScheme: Send + Sync {
    fn temperature(&self, iteration: usize) -> f64;

    fn describe(&self) -> String;
}

#[derive(Debug, Clone, Copy)]
pub struct ConstantTemperature(pub f64);

impl AnnealScheme for ConstantTemperature {
    fn temperature(&self, _iteration: usize) -> f64 {
        self.0
    }

    fn describe(&self) -> String {
        format!("constant T={}", self.0)
    }
}

/// `T(i) = max(temp_max * decay^i, temp_min)`.
#[derive(Debug, Clone, Copy)]
pub struct GeometricCooling {
    pub temp_max: f64,
    pub temp_min: f64,
    pub decay: f64,
}

impl AnnealScheme for GeometricCooling {
    fn temperature(&self, iteration: usize) -> f64 {
        let exp = iteration.min(i32::MAX as usize) as i32;
        (self.temp_max * self.decay.powi(exp)).max(self.temp_min)
    }

    fn describe(&self) -> String {
        format!(
            "geometric T={}..{} decay={}",
            self.temp_max, self.temp_min, self.decay
        )
    }
}

/// Log-space interpolation from `temp_max` down to `temp_min` over
/// `horizon` iterations, flat afterwards.
#[derive(Debug, Clone, Copy)]
pub struct LogInterpolated {
    pub temp_max: f64,
    pub temp_min: f64,
    pub horizon: usize,
}

impl AnnealScheme for LogInterpolated {
    fn temperature(&self, iteration: usize) -> f64 {
        if self.horizon == 0 {
            return self.temp_min;
        }
        let progress = 1.0 - (iteration.min(self.horizon) as f64 / self.horizon as f64);
        self.temp_min * (self.temp_max / self.temp_min).powf(progress)
    }

    fn describe(&self) -> String {
        format!(
            "log-interpolated T={}..{} over {} iterations",
            self.temp_max, self.temp_min, self.horizon
        )
    }
}

pub fn from_params(params: &AnnealParams) -> MppResult<Box<dyn AnnealScheme>> {
    let bad = |reason: String| MppError::Config(format!("anneal: {}", reason));
    if !params.temp_max.is_finite() || params.temp_max < 0.0 {
        return Err(bad(format!("temp_max must be finite and >= 0, got {}", params.temp_max)));
    }
    Ok(match params.anneal {
        AnnealKind::Constant => Box::new(ConstantTemperature(params.temp_max)),
        AnnealKind::Geometric => {
            if !(params.temp_decay > 0.0 && params.temp_decay <= 1.0) {
                return Err(bad(format!("temp_decay must be in (0, 1], got {}", params.temp_decay)));
            }
            Box::new(GeometricCooling {
                temp_max: params.temp_max,
                temp_min: params.temp_min.max(0.0),
                decay: params.temp_decay,
            })
        }
        AnnealKind::LogInterpolated => {
            if !(params.temp_min > 0.0 && params.temp_min <= params.temp_max) {
                return Err(bad(format!(
                    "log interpolation needs 0 < temp_min <= temp_max, got {}..{}",
                    params.temp_min, params.temp_max
                )));
            }
            Box::new(LogInterpolated {
                temp_max: params.temp_max,
                temp_min: params.temp_min,
                horizon: params.temp_horizon,
            })
        }
    })
}
