//! Window resolution: the observed span of a scope split into virtual weeks.

use chrono::{DateTime, TimeDelta, Utc};
use trendclue_core::MAX_WEEKS;

use crate::error::PipelineError;

/// The observed span of a scope divided into `weeks` equal segments.
///
/// `boundaries` always holds `weeks + 1` timestamps, first = `start`,
/// last = `end`. Every recent-vs-older comparison in a run reads from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub boundaries: Vec<DateTime<Utc>>,
    pub weeks: u32,
}

impl TimeWindow {
    /// Resolve the window for a scope.
    ///
    /// `span` is the (min, max) `observed_at` among the scope's retail
    /// records, or `None` when the scope has none; the window then falls back
    /// to `[now - weeks, now]`. A zero-length span is widened to one day.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidWindow`] if `weeks` is zero, above
    /// [`MAX_WEEKS`], or the fallback lookback reaches before the
    /// representable range.
    pub fn resolve(
        span: Option<(DateTime<Utc>, DateTime<Utc>)>,
        weeks: u32,
        now: DateTime<Utc>,
    ) -> Result<Self, PipelineError> {
        if weeks == 0 || weeks > MAX_WEEKS {
            return Err(PipelineError::InvalidWindow);
        }
        let segments = i32::try_from(weeks).map_err(|_| PipelineError::InvalidWindow)?;

        let (start, mut end) = match span {
            Some((min, max)) if min <= max => (min, max),
            Some((min, max)) => (max, min),
            None => {
                let lookback =
                    TimeDelta::try_weeks(i64::from(weeks)).ok_or(PipelineError::InvalidWindow)?;
                let start = now
                    .checked_sub_signed(lookback)
                    .ok_or(PipelineError::InvalidWindow)?;
                (start, now)
            }
        };
        if end == start {
            end = start + TimeDelta::days(1);
        }

        let segment = (end - start) / segments;
        let mut boundaries: Vec<DateTime<Utc>> =
            (0..segments).map(|i| start + segment * i).collect();
        boundaries.push(end);

        Ok(Self {
            start,
            end,
            boundaries,
            weeks,
        })
    }

    /// `boundaries[weeks / 2]`: splits the window into older and recent halves.
    #[must_use]
    pub fn midpoint(&self) -> DateTime<Utc> {
        let idx = usize::try_from(self.weeks / 2).unwrap_or(0);
        self.boundaries.get(idx).copied().unwrap_or(self.start)
    }

    /// Whether `ts` lies in the full window `[start, end]`.
    #[must_use]
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start <= ts && ts <= self.end
    }

    /// Which half of the window `ts` falls in, if any.
    #[must_use]
    pub fn half_of(&self, ts: DateTime<Utc>) -> Option<Half> {
        if !self.contains(ts) {
            return None;
        }
        if ts < self.midpoint() {
            Some(Half::Older)
        } else {
            Some(Half::Recent)
        }
    }
}

/// `[start, mid)` vs `[mid, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Half {
    Older,
    Recent,
}
