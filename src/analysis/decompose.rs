use serde::Serialize;

use crate::error::DashboardError;

// ---------------------------------------------------------------------------
// Decomposition interface
// ---------------------------------------------------------------------------

/// Trend / seasonal / residual split of an ordered series.
///
/// `trend` and `residual` are `None` where the moving-average window does not
/// fit (the first and last `period / 2` points).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Components {
    pub period: usize,
    pub observed: Vec<f64>,
    pub trend: Vec<Option<f64>>,
    pub seasonal: Vec<f64>,
    pub residual: Vec<Option<f64>>,
}

/// Given an ordered numeric series and a period, return its components or
/// fail below the minimum length.
pub trait Decomposer {
    fn decompose(&self, series: &[f64], period: usize) -> Result<Components, DashboardError>;
}

// ---------------------------------------------------------------------------
// Classical additive decomposition
// ---------------------------------------------------------------------------

/// Moving-average additive decomposition: observed = trend + seasonal + residual.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassicalAdditive;

impl Decomposer for ClassicalAdditive {
    fn decompose(&self, series: &[f64], period: usize) -> Result<Components, DashboardError> {
        let period = period.max(1);
        let required = 2 * period;
        if series.len() < required {
            return Err(DashboardError::InsufficientData {
                points: series.len(),
                required,
            });
        }

        let trend = centered_moving_average(series, period);

        // Mean detrended value per phase, then re-centred to sum to zero.
        let mut sums = vec![0.0; period];
        let mut counts = vec![0usize; period];
        for (t, (x, tr)) in series.iter().zip(&trend).enumerate() {
            if let Some(tr) = tr {
                sums[t % period] += x - tr;
                counts[t % period] += 1;
            }
        }
        let mut phase_means: Vec<f64> = sums
            .iter()
            .zip(&counts)
            .map(|(s, &c)| if c == 0 { 0.0 } else { s / c as f64 })
            .collect();
        let offset = phase_means.iter().sum::<f64>() / period as f64;
        for m in &mut phase_means {
            *m -= offset;
        }

        let seasonal: Vec<f64> = (0..series.len()).map(|t| phase_means[t % period]).collect();
        let residual = series
            .iter()
            .zip(&trend)
            .zip(&seasonal)
            .map(|((x, tr), s)| tr.map(|tr| x - tr - s))
            .collect();

        Ok(Components {
            period,
            observed: series.to_vec(),
            trend,
            seasonal,
            residual,
        })
    }
}

/// Centred moving average over one period. Even periods use the 2×period
/// filter (half weight on both ends) so the window stays centred.
fn centered_moving_average(series: &[f64], period: usize) -> Vec<Option<f64>> {
    let weights: Vec<f64> = if period % 2 == 0 {
        let mut w = vec![1.0 / period as f64; period + 1];
        w[0] /= 2.0;
        w[period] /= 2.0;
        w
    } else {
        vec![1.0 / period as f64; period]
    };
    let half = weights.len() / 2;

    (0..series.len())
        .map(|t| {
            if t < half || t + half >= series.len() {
                return None;
            }
            let window = &series[t - half..=t + half];
            Some(window.iter().zip(&weights).map(|(x, w)| x * w).sum())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEASON: [f64; 12] = [
        -5.0, -3.0, -1.0, 0.0, 2.0, 4.0, 6.0, 4.0, 1.0, -2.0, -3.0, -3.0,
    ];

    fn synthetic(n: usize) -> Vec<f64> {
        (0..n).map(|t| 100.0 + 2.0 * t as f64 + SEASON[t % 12]).collect()
    }

    #[test]
    fn rejects_short_series() {
        let err = ClassicalAdditive.decompose(&synthetic(23), 12).unwrap_err();
        assert!(matches!(
            err,
            DashboardError::InsufficientData { points: 23, required: 24 }
        ));
    }

    #[test]
    fn recovers_linear_trend_and_season() {
        let series = synthetic(48);
        let c = ClassicalAdditive.decompose(&series, 12).unwrap();

        assert!(c.trend[..6].iter().all(Option::is_none));
        assert!(c.trend[42..].iter().all(Option::is_none));

        for t in 6..42 {
            let trend = c.trend[t].unwrap();
            assert!((trend - (100.0 + 2.0 * t as f64)).abs() < 1e-9, "trend at {t}");
            assert!((c.seasonal[t] - SEASON[t % 12]).abs() < 1e-9, "seasonal at {t}");
            assert!(c.residual[t].unwrap().abs() < 1e-9, "residual at {t}");
        }
    }

    #[test]
    fn components_add_back_up() {
        let series: Vec<f64> = (0..30)
            .map(|t| ((t * 37) % 11) as f64 + 0.5 * t as f64)
            .collect();
        let c = ClassicalAdditive.decompose(&series, 12).unwrap();

        let seasonal_sum: f64 = c.seasonal[..12].iter().sum();
        assert!(seasonal_sum.abs() < 1e-9);

        for t in 0..series.len() {
            if let (Some(tr), Some(r)) = (c.trend[t], c.residual[t]) {
                assert!((tr + c.seasonal[t] + r - series[t]).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn odd_period_uses_plain_window() {
        let series: Vec<f64> = (0..9).map(|t| t as f64).collect();
        let c = ClassicalAdditive.decompose(&series, 3).unwrap();
        assert_eq!(c.trend[0], None);
        assert!((c.trend[1].unwrap() - 1.0).abs() < 1e-12);
        assert_eq!(c.trend[8], None);
    }
}
