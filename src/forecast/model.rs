use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Failed to open model artifact {path}: {source}")]
    Open {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse model artifact {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },

    #[error("Seasonal terms require a seasonal period greater than zero")]
    InvalidSeasonalPeriod,

    #[error("Model needs at least {needed} historical values, artifact has {available}")]
    InsufficientHistory { needed: usize, available: usize },

    #[error("Model artifact contains non-finite values")]
    NonFiniteParameters,

    #[error("Model produced {produced} values, {requested} requested")]
    ShortForecast { requested: usize, produced: usize },

    #[error("Model produced a non-finite value at step {step}")]
    NonFiniteForecast { step: usize },
}

/// Black-box seasonal forecaster.
///
/// `forecast(steps)` returns one point estimate per month following the
/// model's own last observation, in the model's native representation.
pub trait SeasonalModel: Send + Sync {
    fn forecast(&self, steps: usize) -> Result<Vec<f64>, ModelError>;
}

/// Persisted multiplicative seasonal ARIMA model.
///
/// The artifact carries the fitted coefficients plus the trailing history
/// (levels) and residuals the recursion needs:
///
/// ```text
/// phi(B) Phi(B^s) (1 - B)^d (1 - B^s)^D y_t = c + theta(B) Theta(B^s) e_t
/// ```
///
/// Future shocks are taken as zero, so the forecast is the conditional mean.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SarimaModel {
    #[serde(default)]
    pub intercept: f64,
    #[serde(default)]
    pub ar: Vec<f64>,
    #[serde(default)]
    pub ma: Vec<f64>,
    #[serde(default)]
    pub seasonal_ar: Vec<f64>,
    #[serde(default)]
    pub seasonal_ma: Vec<f64>,
    #[serde(default)]
    pub seasonal_period: usize,
    #[serde(default)]
    pub differencing: usize,
    #[serde(default)]
    pub seasonal_differencing: usize,
    pub history: Vec<f64>,
    #[serde(default)]
    pub residuals: Vec<f64>,
}

impl SarimaModel {
    /// Load and validate a JSON artifact
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let artifact = path.display().to_string();
        info!("Loading model artifact: {}", artifact);

        let file = File::open(path).map_err(|source| ModelError::Open {
            path: artifact.clone(),
            source,
        })?;
        let model: SarimaModel = serde_json::from_reader(BufReader::new(file))
            .map_err(|source| ModelError::Parse {
                path: artifact.clone(),
                source,
            })?;
        model.validate()?;

        debug!(
            "Model {} loaded: p={}, q={}, P={}, Q={}, s={}, d={}, D={}, history={}",
            artifact,
            model.ar.len(),
            model.ma.len(),
            model.seasonal_ar.len(),
            model.seasonal_ma.len(),
            model.seasonal_period,
            model.differencing,
            model.seasonal_differencing,
            model.history.len()
        );
        Ok(model)
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        let has_seasonal_terms = !self.seasonal_ar.is_empty()
            || !self.seasonal_ma.is_empty()
            || self.seasonal_differencing > 0;
        if has_seasonal_terms && self.seasonal_period == 0 {
            return Err(ModelError::InvalidSeasonalPeriod);
        }

        let all_finite = std::iter::once(&self.intercept)
            .chain(&self.ar)
            .chain(&self.ma)
            .chain(&self.seasonal_ar)
            .chain(&self.seasonal_ma)
            .chain(&self.history)
            .chain(&self.residuals)
            .all(|v| v.is_finite());
        if !all_finite {
            return Err(ModelError::NonFiniteParameters);
        }

        let needed = ((self.differencing_polynomial().len() - 1)
            + (self.ar_polynomial().len() - 1))
            .max(1);
        if self.history.len() < needed {
            return Err(ModelError::InsufficientHistory {
                needed,
                available: self.history.len(),
            });
        }

        Ok(())
    }

    /// (1 - B)^d (1 - B^s)^D
    fn differencing_polynomial(&self) -> Vec<f64> {
        let mut poly = vec![1.0];
        for _ in 0..self.differencing {
            poly = poly_mul(&poly, &[1.0, -1.0]);
        }
        for _ in 0..self.seasonal_differencing {
            poly = poly_mul(&poly, &lag_polynomial(&[1.0], self.seasonal_period, -1.0));
        }
        poly
    }

    /// phi(B) Phi(B^s)
    fn ar_polynomial(&self) -> Vec<f64> {
        poly_mul(
            &lag_polynomial(&self.ar, 1, -1.0),
            &lag_polynomial(&self.seasonal_ar, self.seasonal_period, -1.0),
        )
    }

    /// theta(B) Theta(B^s)
    fn ma_polynomial(&self) -> Vec<f64> {
        poly_mul(
            &lag_polynomial(&self.ma, 1, 1.0),
            &lag_polynomial(&self.seasonal_ma, self.seasonal_period, 1.0),
        )
    }
}

impl SeasonalModel for SarimaModel {
    fn forecast(&self, steps: usize) -> Result<Vec<f64>, ModelError> {
        self.validate()?;

        let diff = self.differencing_polynomial();
        let ar = self.ar_polynomial();
        let ma = self.ma_polynomial();

        let mut levels = self.history.clone();
        let mut working: Vec<f64> = (diff.len() - 1..levels.len())
            .map(|t| diff.iter().enumerate().map(|(k, p)| p * levels[t - k]).sum::<f64>())
            .collect();

        // Residuals align with the tail of the differenced series
        let mut shocks = vec![0.0; working.len()];
        let known = self.residuals.len().min(shocks.len());
        let shocks_len = shocks.len();
        shocks[shocks_len - known..]
            .copy_from_slice(&self.residuals[self.residuals.len() - known..]);

        let mut out = Vec::with_capacity(steps);
        for step in 1..=steps {
            let t = working.len();

            let mut next = self.intercept;
            for (k, a) in ar.iter().enumerate().skip(1) {
                next -= a * working[t - k];
            }
            for (k, m) in ma.iter().enumerate().skip(1) {
                if let Some(idx) = t.checked_sub(k) {
                    next += m * shocks[idx];
                }
            }
            working.push(next);
            shocks.push(0.0);

            let tl = levels.len();
            let mut level = next;
            for (k, p) in diff.iter().enumerate().skip(1) {
                level -= p * levels[tl - k];
            }

            if !level.is_finite() {
                return Err(ModelError::NonFiniteForecast { step });
            }
            levels.push(level);
            out.push(level);
        }

        Ok(out)
    }
}

/// 1 + sign * sum(c_i B^(i * spacing))
fn lag_polynomial(coeffs: &[f64], spacing: usize, sign: f64) -> Vec<f64> {
    let mut poly = vec![0.0; coeffs.len() * spacing + 1];
    poly[0] = 1.0;
    for (i, c) in coeffs.iter().enumerate() {
        poly[(i + 1) * spacing] += sign * c;
    }
    poly
}

fn poly_mul(a: &[f64], b: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, x) in a.iter().enumerate() {
        for (j, y) in b.iter().enumerate() {
            out[i + j] += x * y;
        }
    }
    out
}
