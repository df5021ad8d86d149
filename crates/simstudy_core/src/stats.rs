//! Small numeric helpers shared by analyzers and the aggregator.
//!
//! Distribution quantiles and tail probabilities come from `statrs`; the
//! helpers return `None` instead of panicking when their inputs cannot
//! support a result (too few values, non-positive degrees of freedom).

use statrs::distribution::{Beta, ContinuousCDF, FisherSnedecor, Normal, StudentsT};

/// Arithmetic mean, `None` for an empty slice
#[must_use]
pub fn mean(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    Some(data.iter().sum::<f64>() / data.len() as f64)
}

/// Sample variance (n − 1 denominator), two-pass. `None` for fewer than two values.
#[must_use]
pub fn variance(data: &[f64]) -> Option<f64> {
    if data.len() < 2 {
        return None;
    }
    let m = mean(data)?;
    let ss: f64 = data.iter().map(|x| (x - m) * (x - m)).sum();
    Some(ss / (data.len() - 1) as f64)
}

#[must_use]
pub fn std_dev(data: &[f64]) -> Option<f64> {
    variance(data).map(f64::sqrt)
}

/// Standard normal quantile
#[must_use]
pub fn normal_quantile(p: f64) -> Option<f64> {
    if !(0.0..=1.0).contains(&p) {
        return None;
    }
    let normal = Normal::new(0.0, 1.0).ok()?;
    Some(normal.inverse_cdf(p))
}

/// Quantile of Student's t with `df` degrees of freedom
#[must_use]
pub fn t_quantile(p: f64, df: f64) -> Option<f64> {
    if !(0.0..=1.0).contains(&p) {
        return None;
    }
    let dist = StudentsT::new(0.0, 1.0, df).ok()?;
    let q = dist.inverse_cdf(p);
    q.is_finite().then_some(q)
}

/// Two-sided p-value of a t statistic
#[must_use]
pub fn t_two_sided_p(t: f64, df: f64) -> Option<f64> {
    if !t.is_finite() {
        return None;
    }
    let dist = StudentsT::new(0.0, 1.0, df).ok()?;
    Some((2.0 * dist.sf(t.abs())).min(1.0))
}

/// Upper-tail p-value of an F statistic
#[must_use]
pub fn f_upper_p(f: f64, df1: f64, df2: f64) -> Option<f64> {
    if !f.is_finite() {
        return None;
    }
    let dist = FisherSnedecor::new(df1, df2).ok()?;
    Some(dist.sf(f.max(0.0)))
}

/// Welch–Satterthwaite degrees of freedom for two independent means
#[must_use]
pub fn welch_df(var1: f64, n1: usize, var2: f64, n2: usize) -> f64 {
    let a = var1 / n1 as f64;
    let b = var2 / n2 as f64;
    (a + b).powi(2) / (a * a / (n1 - 1) as f64 + b * b / (n2 - 1) as f64)
}

/// Wilson score interval for a binomial proportion at confidence `level`
#[must_use]
pub fn wilson_interval(successes: usize, trials: usize, level: f64) -> Option<(f64, f64)> {
    if trials == 0 || successes > trials {
        return None;
    }
    let z = normal_quantile(1.0 - (1.0 - level) / 2.0)?;
    let n = trials as f64;
    let p = successes as f64 / n;
    let z2 = z * z;
    let denom = 1.0 + z2 / n;
    let center = (p + z2 / (2.0 * n)) / denom;
    let half = z * (p * (1.0 - p) / n + z2 / (4.0 * n * n)).sqrt() / denom;
    Some(((center - half).max(0.0), (center + half).min(1.0)))
}

/// Exact (Clopper–Pearson) interval for a binomial proportion
#[must_use]
pub fn clopper_pearson_interval(successes: usize, trials: usize, level: f64) -> Option<(f64, f64)> {
    if trials == 0 || successes > trials {
        return None;
    }
    let tail = (1.0 - level) / 2.0;
    let x = successes as f64;
    let n = trials as f64;

    let lower = if successes == 0 {
        0.0
    } else {
        Beta::new(x, n - x + 1.0).ok()?.inverse_cdf(tail)
    };
    let upper = if successes == trials {
        1.0
    } else {
        Beta::new(x + 1.0, n - x).ok()?.inverse_cdf(1.0 - tail)
    };
    Some((lower, upper))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() < tol
    }

    #[test]
    fn test_mean_and_variance() {
        let data = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(mean(&data), Some(5.0));
        assert!(close(variance(&data).unwrap(), 32.0 / 7.0, 1e-12));
        assert_eq!(mean(&[]), None);
        assert_eq!(variance(&[1.0]), None);
    }

    #[test]
    fn test_quantiles() {
        assert!(close(normal_quantile(0.975).unwrap(), 1.959964, 1e-5));
        // t_{0.975, 9} = 2.262157
        assert!(close(t_quantile(0.975, 9.0).unwrap(), 2.262157, 1e-5));
        assert!(t_quantile(0.975, 0.0).is_none());
    }

    #[test]
    fn test_t_two_sided_p() {
        let p = t_two_sided_p(2.262157, 9.0).unwrap();
        assert!(close(p, 0.05, 1e-5));
        assert!(close(t_two_sided_p(0.0, 5.0).unwrap(), 1.0, 1e-12));
    }

    #[test]
    fn test_f_upper_p() {
        // F_{0.95}(2, 27) = 3.354131
        let p = f_upper_p(3.354131, 2.0, 27.0).unwrap();
        assert!(close(p, 0.05, 1e-5));
    }

    #[test]
    fn test_welch_df_equal_groups() {
        // Equal variances and sizes reduce to 2(n - 1)
        assert!(close(welch_df(1.0, 10, 1.0, 10), 18.0, 1e-12));
    }

    #[test]
    fn test_wilson_interval() {
        let (lo, hi) = wilson_interval(950, 1000, 0.95).unwrap();
        assert!(lo < 0.95 && 0.95 < hi);
        assert!(close(lo, 0.9346, 1e-3));
        assert!(close(hi, 0.9620, 1e-3));

        let (lo, hi) = wilson_interval(0, 20, 0.95).unwrap();
        assert_eq!(lo, 0.0);
        assert!(hi > 0.0 && hi < 0.2);

        assert!(wilson_interval(0, 0, 0.95).is_none());
    }

    #[test]
    fn test_clopper_pearson_interval() {
        let (lo, hi) = clopper_pearson_interval(5, 10, 0.95).unwrap();
        // Reference values: 0.187086, 0.812914
        assert!(close(lo, 0.187086, 1e-5));
        assert!(close(hi, 0.812914, 1e-5));

        let (lo, hi) = clopper_pearson_interval(10, 10, 0.95).unwrap();
        assert_eq!(hi, 1.0);
        assert!(close(lo, 0.691503, 1e-5));
    }
}
