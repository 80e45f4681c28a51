use std::f64::consts::PI;

use once_cell::sync::Lazy;
use rand::distributions::Standard;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use statrs::distribution::{ContinuousCDF, Normal};

use crate::constants::{clamp, POISSON_MAX_EVENTS, POISSON_NORMAL_APPROX_ABOVE};

const CDF_EPS: f64 = 1e-12;

static STANDARD_NORMAL: Lazy<Normal> =
    Lazy::new(|| Normal::new(0.0, 1.0).expect("unit normal parameters are valid"));

/// Uniform source for the simulators. Seeded runs are reproducible.
#[derive(Debug, Clone)]
pub struct SimRng {
    inner: StdRng,
}

impl SimRng {
    pub fn new(seed: Option<u64>) -> Self {
        let inner = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { inner }
    }

    pub fn seeded(seed: u64) -> Self {
        Self::new(Some(seed))
    }

    /// Uniform in `[0, 1)`.
    pub fn uniform(&mut self) -> f64 {
        self.inner.sample(Standard)
    }

    /// Two independent standard normals via Box-Muller.
    pub fn normal_pair(&mut self) -> (f64, f64) {
        let u1 = clamp(self.uniform(), CDF_EPS, 1.0 - CDF_EPS);
        let u2 = self.uniform();
        let radius = (-2.0 * u1.ln()).sqrt();
        let theta = 2.0 * PI * u2;
        (radius * theta.cos(), radius * theta.sin())
    }

    /// Standard normals with correlation `corr`: `zb = corr * za + sqrt(1 - corr^2) * z_ind`.
    pub fn correlated_normals(&mut self, corr: f64) -> (f64, f64) {
        let (za, z_ind) = self.normal_pair();
        (za, correlate(za, z_ind, corr))
    }
}

pub fn correlate(z1: f64, z2: f64, corr: f64) -> f64 {
    corr * z1 + (1.0 - corr * corr).max(0.0).sqrt() * z2
}

/// Standard normal CDF, kept strictly inside `(0, 1)`.
pub fn normal_cdf(z: f64) -> f64 {
    clamp(STANDARD_NORMAL.cdf(z), CDF_EPS, 1.0 - CDF_EPS)
}

/// Smallest `k` with `P(X <= k) >= u` for `X ~ Poisson(lambda)`.
///
/// Direct summation up to `lambda = 30`, normal approximation above. The
/// approximation is capped at `POISSON_MAX_EVENTS`.
pub fn poisson_inverse(lambda: f64, u: f64) -> u32 {
    if lambda.is_nan() || lambda <= 0.0 {
        return 0;
    }
    if lambda > POISSON_NORMAL_APPROX_ABOVE {
        let z = STANDARD_NORMAL.inverse_cdf(clamp(u, CDF_EPS, 1.0 - CDF_EPS));
        let approx = lambda + lambda.sqrt() * z;
        return clamp(approx.round(), 0.0, POISSON_MAX_EVENTS as f64) as u32;
    }

    let mut prob = (-lambda).exp();
    let mut cumulative = prob;
    let mut k = 0u32;
    while u > cumulative {
        k += 1;
        prob *= lambda / k as f64;
        cumulative += prob;
        if k > POISSON_MAX_EVENTS {
            break;
        }
    }
    k
}
