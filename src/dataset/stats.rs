use crate::error::DatasetError;

const LOCATED_WIDTH: usize = 5;
const SUM_COUNT_WIDTH: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Extreme {
    Min,
    Max,
}

impl Extreme {
    #[inline]
    fn improves(self, candidate: f64, current: f64) -> bool {
        match self {
            Self::Min => candidate < current,
            Self::Max => candidate > current,
        }
    }
}

/// Extremum candidate with the position of its sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct Located {
    pub(super) value: f64,
    pub(super) position: [f64; 3],
}

/// Folds `values` into `current`; the first occurrence wins ties and NaN is skipped.
pub(super) fn scan_extremum(
    values: &[f64],
    positions: &[[f64; 3]],
    mut current: Option<Located>,
    which: Extreme,
) -> Option<Located> {
    for (idx, value) in values.iter().copied().enumerate() {
        if value.is_nan() {
            continue;
        }
        let replace = match current {
            None => true,
            Some(best) => which.improves(value, best.value),
        };
        if replace {
            current = Some(Located {
                value,
                position: positions.get(idx).copied().unwrap_or([0.0; 3]),
            });
        }
    }
    current
}

pub(super) fn encode_located(local: Option<Located>) -> [f64; LOCATED_WIDTH] {
    match local {
        None => [0.0, f64::NAN, 0.0, 0.0, 0.0],
        Some(loc) => [
            1.0,
            loc.value,
            loc.position[0],
            loc.position[1],
            loc.position[2],
        ],
    }
}

/// Combines per-rank candidates in rank order; lower ranks win ties.
pub(super) fn combine_located(
    gathered: &[Vec<f64>],
    which: Extreme,
) -> Result<Option<Located>, DatasetError> {
    let mut best: Option<Located> = None;
    for part in gathered {
        let part = expect_width(part, LOCATED_WIDTH)?;
        if part[0] == 0.0 {
            continue;
        }
        let candidate = Located {
            value: part[1],
            position: [part[2], part[3], part[4]],
        };
        let replace = match best {
            None => true,
            Some(current) => which.improves(candidate.value, current.value),
        };
        if replace {
            best = Some(candidate);
        }
    }
    Ok(best)
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(super) struct SumCount {
    pub(super) sum: f64,
    pub(super) count: f64,
}

impl SumCount {
    /// NaN samples are counted and poison the sum.
    pub(super) fn extend(&mut self, values: &[f64]) {
        for &value in values {
            self.sum += value;
            self.count += 1.0;
        }
    }

    #[inline]
    pub(super) fn encode(self) -> [f64; SUM_COUNT_WIDTH] {
        [self.sum, self.count]
    }

    pub(super) fn combine(gathered: &[Vec<f64>]) -> Result<Self, DatasetError> {
        let mut total = Self::default();
        for part in gathered {
            let part = expect_width(part, SUM_COUNT_WIDTH)?;
            total.sum += part[0];
            total.count += part[1];
        }
        Ok(total)
    }

    #[inline]
    pub(super) fn mean(self) -> Option<f64> {
        if self.count > 0.0 {
            Some(self.sum / self.count)
        } else {
            None
        }
    }
}

/// Bin of `value` within `[min_val, max_val]`, clamped to the outer bins.
#[inline]
pub(super) fn bin_index(value: f64, min_val: f64, max_val: f64, num_bins: usize) -> Option<usize> {
    if value.is_nan() || num_bins == 0 {
        return None;
    }
    let scaled = (value - min_val) / (max_val - min_val) * num_bins as f64;
    let idx = if scaled <= 0.0 {
        0
    } else {
        (scaled.floor() as usize).min(num_bins - 1)
    };
    Some(idx)
}

pub(super) fn accumulate_bins(
    counts: &mut [f64],
    values: &[f64],
    min_val: f64,
    max_val: f64,
) {
    let num_bins = counts.len();
    for value in values {
        if let Some(idx) = bin_index(*value, min_val, max_val, num_bins) {
            counts[idx] += 1.0;
        }
    }
}

pub(super) fn combine_bins(
    gathered: &[Vec<f64>],
    num_bins: usize,
) -> Result<Vec<u64>, DatasetError> {
    let mut totals = vec![0_u64; num_bins];
    for part in gathered {
        let part = expect_width(part, num_bins)?;
        for (total, count) in totals.iter_mut().zip(part) {
            *total += *count as u64;
        }
    }
    Ok(totals)
}

fn expect_width(part: &[f64], width: usize) -> Result<&[f64], DatasetError> {
    if part.len() == width {
        Ok(part)
    } else {
        Err(DatasetError::Communication {
            reason: format!("expected {width} values per rank, got {}", part.len()),
        })
    }
}
