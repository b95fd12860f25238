use serde::{Deserialize, Serialize};

/// A reprojected figure for one district and key. All fields are null until
/// observed; `bias` and `bias_sd` are filled once the cross-district
/// statistics are known.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Stat {
    pub value: Option<f64>,
    pub bias: Option<f64>,
    pub bias_sd: Option<f64>,
}

impl Stat {
    /// Add `x` to the value, turning a null value into `x`.
    #[inline]
    pub(crate) fn accumulate(&mut self, x: f64) {
        self.value = Some(self.value.unwrap_or(0.0) + x);
    }

    /// Fill `bias` and `bias_sd` from the statistics of the value's series.
    /// Null values stay unbiased.
    pub(crate) fn backfill(&mut self, stats: &SeriesStats) {
        let (Some(value), Some(mean)) = (self.value, stats.mean) else { return };
        let bias = value - mean;
        self.bias = Some(bias);
        self.bias_sd = Some(stats.standardize(bias));
    }
}

/// Summary statistics of one key's values across districts.
/// `sd` is the sample standard deviation, undefined for fewer than two values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesStats {
    pub mean: Option<f64>,
    pub sd: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub count: usize,
}

impl SeriesStats {
    pub fn from_values(values: &[f64]) -> Self {
        let count = values.len();
        if count == 0 { return Self::default() }

        let n = count as f64;
        let mean = values.iter().sum::<f64>() / n;
        let sd = (count > 1).then(|| {
            (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt()
        });

        Self {
            mean: Some(mean),
            sd,
            min: values.iter().copied().reduce(f64::min),
            max: values.iter().copied().reduce(f64::max),
            count,
        }
    }

    /// Express a bias in standard deviations; 0 when the deviation is
    /// undefined or not positive.
    #[inline]
    pub fn standardize(&self, bias: f64) -> f64 {
        match self.sd {
            Some(sd) if sd > 0.0 => bias / sd,
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_statistics() {
        let stats = SeriesStats::from_values(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert_eq!(stats.mean, Some(5.0));
        assert!((stats.sd.unwrap() - (32.0f64 / 7.0).sqrt()).abs() < 1e-12);
        assert_eq!(stats.min, Some(2.0));
        assert_eq!(stats.max, Some(9.0));
        assert_eq!(stats.count, 8);
    }

    #[test]
    fn empty_and_single_series() {
        assert_eq!(SeriesStats::from_values(&[]), SeriesStats::default());
        let one = SeriesStats::from_values(&[3.0]);
        assert_eq!(one.mean, Some(3.0));
        assert_eq!(one.sd, None);
    }

    #[test]
    fn bias_sd_is_zero_without_variance() {
        for stats in [
            SeriesStats::from_values(&[1.0, 1.0, 1.0]),
            SeriesStats::from_values(&[1.0]),
            SeriesStats { mean: Some(1.0), sd: Some(-2.0), ..Default::default() },
        ] {
            let mut stat = Stat { value: Some(1.5), ..Default::default() };
            stat.backfill(&stats);
            assert_eq!(stat.bias_sd, Some(0.0));
            assert!(!stat.bias_sd.unwrap().is_nan());
        }
    }

    #[test]
    fn backfill_skips_null_values() {
        let stats = SeriesStats::from_values(&[1.0, 3.0]);
        let mut stat = Stat::default();
        stat.backfill(&stats);
        assert_eq!(stat, Stat::default());

        let mut stat = Stat { value: Some(3.0), ..Default::default() };
        stat.backfill(&stats);
        assert_eq!(stat.bias, Some(1.0));
        assert!((stat.bias_sd.unwrap() - 1.0 / 2f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn accumulate_turns_null_into_value() {
        let mut stat = Stat::default();
        stat.accumulate(0.0);
        assert_eq!(stat.value, Some(0.0));
        stat.accumulate(2.5);
        assert_eq!(stat.value, Some(2.5));
    }
}
