//! Channel signals (social, retail, review) per combination.
//!
//! Every half-window comparison reads the midpoint from the run's
//! [`TimeWindow`]; nothing here re-derives time boundaries.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use regex::{Regex, RegexBuilder};
use trendclue_core::{ReviewRecord, Sentiment, Signals, SocialPost};

use crate::combination::Combination;
use crate::scoring::{clamp_signal, growth_pct, round_to};
use crate::window::{Half, TimeWindow};

/// Keywords of (ingredients ++ effects) searched in social posts.
const SOCIAL_KEYWORD_LIMIT: usize = 3;
/// Member products whose retail and review history feed the signals.
const MEMBER_SAMPLE: usize = 5;
/// Retail signal when either half of the window has no rank history.
pub const DEFAULT_RETAIL_SIGNAL: f64 = 70.0;
/// Review signal when the sampled products have no reviews in the window.
pub const DEFAULT_REVIEW_SIGNAL: f64 = 65.0;

/// One retail rank observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankPoint {
    pub observed_at: DateTime<Utc>,
    pub rank: i32,
}

/// Case-insensitive literal keyword match over post content and hashtags.
pub struct MentionMatcher {
    regex: Option<Regex>,
    lowered: String,
}

impl MentionMatcher {
    #[must_use]
    pub fn new(keyword: &str) -> Self {
        let regex = RegexBuilder::new(&regex::escape(keyword))
            .case_insensitive(true)
            .build()
            .ok();
        Self {
            regex,
            lowered: keyword.to_lowercase(),
        }
    }

    fn hit(&self, text: &str) -> bool {
        match &self.regex {
            Some(re) => re.is_match(text),
            None => text.to_lowercase().contains(&self.lowered),
        }
    }

    #[must_use]
    pub fn matches(&self, post: &SocialPost) -> bool {
        self.hit(&post.content) || post.hashtags.iter().any(|tag| self.hit(tag))
    }
}

/// Mentions of one keyword, split by window half.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MentionCounts {
    pub older: usize,
    pub recent: usize,
}

impl MentionCounts {
    #[must_use]
    pub fn total(&self) -> usize {
        self.older + self.recent
    }

    #[must_use]
    pub fn growth_pct(&self) -> f64 {
        growth_pct(self.older, self.recent)
    }
}

/// Count posts in the window that `matcher` hits, split by half.
#[must_use]
pub fn count_mentions<'p, I>(
    window: &TimeWindow,
    posts: I,
    matcher: &MentionMatcher,
) -> MentionCounts
where
    I: IntoIterator<Item = &'p SocialPost>,
{
    let mut counts = MentionCounts::default();

    for post in posts {
        let Some(half) = window.half_of(post.posted_at) else {
            continue;
        };
        if !matcher.matches(post) {
            continue;
        }
        match half {
            Half::Older => counts.older += 1,
            Half::Recent => counts.recent += 1,
        }
    }

    counts
}

/// Inputs shared by every combination in a run.
pub struct SignalCalculator<'a> {
    pub window: &'a TimeWindow,
    /// Posts already restricted to the scope's country.
    pub posts: &'a [SocialPost],
    pub rank_history: &'a HashMap<String, Vec<RankPoint>>,
    /// Reviews per product with sentiment resolved.
    pub reviews: &'a HashMap<String, Vec<ReviewRecord>>,
}

impl SignalCalculator<'_> {
    /// All three signals for one combination, each in `[0, 100]` with one
    /// decimal.
    #[must_use]
    pub fn compute(&self, combination: &Combination) -> Signals {
        let members: Vec<&str> = combination
            .product_ids
            .iter()
            .take(MEMBER_SAMPLE)
            .map(String::as_str)
            .collect();

        Signals {
            social: round_to(self.social_signal(combination), 1),
            retail: round_to(self.retail_signal(&members), 1),
            review: round_to(self.review_signal(&members), 1),
        }
    }

    fn social_signal(&self, combination: &Combination) -> f64 {
        let mut total = MentionCounts::default();
        for keyword in combination
            .ingredients
            .iter()
            .chain(&combination.effects)
            .take(SOCIAL_KEYWORD_LIMIT)
        {
            let counts = count_mentions(self.window, self.posts, &MentionMatcher::new(keyword));
            total.older += counts.older;
            total.recent += counts.recent;
        }
        clamp_signal(50.0 + total.growth_pct())
    }

    fn retail_signal(&self, members: &[&str]) -> f64 {
        let (mut older, mut recent) = (Vec::new(), Vec::new());
        for id in members {
            let Some(history) = self.rank_history.get(*id) else {
                continue;
            };
            for point in history {
                match self.window.half_of(point.observed_at) {
                    Some(Half::Older) => older.push(point.rank),
                    Some(Half::Recent) => recent.push(point.rank),
                    None => {}
                }
            }
        }

        let (Some(avg_older), Some(avg_recent)) = (mean(&older), mean(&recent)) else {
            return DEFAULT_RETAIL_SIGNAL;
        };
        let improvement_pct = (avg_older - avg_recent) / avg_older.max(1.0) * 100.0;
        clamp_signal(50.0 + 2.0 * improvement_pct)
    }

    fn review_signal(&self, members: &[&str]) -> f64 {
        let in_window: Vec<&ReviewRecord> = members
            .iter()
            .filter_map(|id| self.reviews.get(*id))
            .flatten()
            .filter(|r| self.window.contains(r.posted_at))
            .collect();

        if in_window.is_empty() {
            return DEFAULT_REVIEW_SIGNAL;
        }

        #[allow(clippy::cast_precision_loss)]
        let count = in_window.len() as f64;
        let avg_rating = in_window.iter().map(|r| f64::from(r.rating)).sum::<f64>() / count;
        #[allow(clippy::cast_precision_loss)]
        let positive = in_window
            .iter()
            .filter(|r| r.sentiment == Some(Sentiment::Positive))
            .count() as f64;
        let positive_ratio = positive / count;
        let volume = (count / 20.0).min(1.0);

        clamp_signal(avg_rating / 5.0 * 40.0 + positive_ratio * 40.0 + volume * 20.0)
    }
}

fn mean(ranks: &[i32]) -> Option<f64> {
    if ranks.is_empty() {
        return None;
    }
    #[allow(clippy::cast_precision_loss)]
    let n = ranks.len() as f64;
    Some(ranks.iter().map(|&r| f64::from(r)).sum::<f64>() / n)
}
