//! Online Bayesian quality model
//!
//! Diagonal-Laplace logistic regression over event features. Prediction
//! uses the probit approximation to integrate the posterior; updates are
//! per-component Newton steps that also shrink the diagonal variance.

use std::path::Path;
use std::sync::RwLock;

use contracts::{Event, EventKind, TelemetryError};
use serde::{Deserialize, Serialize};

use crate::persist;

/// Feature vector length produced by [`extract_features`]
pub const FEATURE_DIM: usize = 11;

/// Componentwise feature scales (matching the tuning corpus)
const FEATURE_SCALES: [f64; FEATURE_DIM] =
    [150.0, 1.5, 2.5, 25.0, 0.4, 1.0, 1.0, 1.0, 40.0, 180.0, 1.0];

/// Online Bayesian logistic regression with diagonal posterior
pub struct BayesianQa {
    d: usize,
    state: RwLock<Posterior>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Posterior {
    d: usize,
    mu: Vec<f64>,
    var: Vec<f64>,
}

impl BayesianQa {
    /// Fresh model: zero mean, `sigma0^2` diagonal variance
    pub fn new(d: usize, sigma0: f64) -> Self {
        Self {
            d,
            state: RwLock::new(Posterior {
                d,
                mu: vec![0.0; d],
                var: vec![sigma0 * sigma0; d],
            }),
        }
    }

    /// Probability that an event with features `x` is a correct detection.
    /// Returns 0.5 for a dimension mismatch.
    pub fn predict_proba(&self, x: &[f64]) -> f64 {
        let state = self.state.read().expect("bayes lock poisoned");

        if x.len() != self.d {
            return 0.5;
        }

        let m: f64 = state.mu.iter().zip(x).map(|(mu, xi)| mu * xi).sum();
        let s2: f64 = state.var.iter().zip(x).map(|(v, xi)| v * xi * xi).sum();

        // Probit approximation of the posterior predictive
        let k = 1.0 / (1.0 + std::f64::consts::PI * s2 / 8.0).sqrt();
        sigmoid(k * m)
    }

    /// Online update with label `y` in {0, 1}
    pub fn update(&self, x: &[f64], y: f64, iters: usize) {
        let mut state = self.state.write().expect("bayes lock poisoned");

        if x.len() != self.d {
            return;
        }

        for _ in 0..iters {
            let z: f64 = state.mu.iter().zip(x).map(|(mu, xi)| mu * xi).sum();
            let p = sigmoid(z);

            for i in 0..self.d {
                let g = (y - p) * x[i];
                let h = p * (1.0 - p) * x[i] * x[i] + 1.0 / state.var[i];

                state.mu[i] += g / h;
                state.var[i] = 1.0 / h;
            }
        }
    }

    /// Posterior snapshot: (mu, var)
    pub fn posterior(&self) -> (Vec<f64>, Vec<f64>) {
        let state = self.state.read().expect("bayes lock poisoned");
        (state.mu.clone(), state.var.clone())
    }

    /// Persist the posterior as JSON `{d, mu, var}`
    pub fn save_to_file(&self, path: &Path) -> Result<(), TelemetryError> {
        let state = self.state.read().expect("bayes lock poisoned");
        persist::save_json(path, &*state)
    }

    /// Restore a persisted posterior; a missing file keeps the prior
    pub fn load_from_file(&self, path: &Path) -> Result<bool, TelemetryError> {
        let Some(loaded) = persist::load_json::<Posterior>(path)? else {
            return Ok(false);
        };

        if loaded.mu.len() != self.d
            || loaded.var.len() != self.d
            || loaded.var.iter().any(|v| *v <= 0.0)
        {
            return Err(TelemetryError::state_persist(
                path.display().to_string(),
                format!(
                    "posterior shape mismatch: expected d={}, got mu={} var={}",
                    self.d,
                    loaded.mu.len(),
                    loaded.var.len()
                ),
            ));
        }

        let mut state = self.state.write().expect("bayes lock poisoned");
        *state = Posterior {
            d: self.d,
            ..loaded
        };
        Ok(true)
    }
}

/// Event to scaled feature vector:
/// [gyPeak, boomDelta, dt, rollDelta, overshoot,
///  isTack, isGybeNormal, isGybeCrash, windSpeed, windAngle, bias]
pub fn extract_features(event: &Event) -> Vec<f64> {
    let mut x = vec![
        event.gyro_peak,
        event.boom_delta,
        event.duration,
        event.roll_delta,
        event.overshoot,
        f64::from(event.kind == EventKind::Tack),
        f64::from(event.kind == EventKind::GybeNormal),
        f64::from(event.kind == EventKind::GybeCrash),
        event.wind_speed,
        event.wind_angle,
        1.0,
    ];

    for (xi, scale) in x.iter_mut().zip(FEATURE_SCALES) {
        *xi /= scale;
    }

    x
}

/// Logistic sigmoid with overflow clamping
fn sigmoid(z: f64) -> f64 {
    let z = z.clamp(-60.0, 60.0);
    1.0 / (1.0 + (-z).exp())
}
