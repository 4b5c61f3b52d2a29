//! Whole-tensor reductions in double precision

/// Sum reduction
pub struct Sum;

impl Sum {
    /// Sums every value with compensated (Kahan) accumulation
    pub fn reduce_all<I>(values: I) -> f64
    where
        I: IntoIterator<Item = f64>,
    {
        let mut sum = 0.0f64;
        let mut compensation = 0.0f64;
        for v in values {
            let y = v - compensation;
            let t = sum + y;
            compensation = (t - sum) - y;
            sum = t;
        }
        sum
    }
}

/// Mean reduction
pub struct Mean;

impl Mean {
    /// Arithmetic mean; `None` for an empty input
    pub fn reduce_all<I>(values: I) -> Option<f64>
    where
        I: IntoIterator<Item = f64>,
    {
        let mut count = 0usize;
        let sum = Sum::reduce_all(values.into_iter().inspect(|_| count += 1));
        if count == 0 {
            None
        } else {
            Some(sum / count as f64)
        }
    }
}

/// Minimum and maximum in one pass
pub struct MinMax;

impl MinMax {
    /// Returns `(min, max)`, skipping NaN; `None` if no finite ordering exists
    pub fn reduce_all<I>(values: I) -> Option<(f64, f64)>
    where
        I: IntoIterator<Item = f64>,
    {
        values
            .into_iter()
            .filter(|v| !v.is_nan())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}
