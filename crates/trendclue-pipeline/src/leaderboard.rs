//! Keyword leaderboards: per social platform and cross-platform per type.

use std::collections::{HashMap, HashSet};

use trendclue_core::{
    KeywordAssignment, KeywordLeaderboardEntry, KeywordType, Platform, PlatformLeaderboardEntry,
    SocialPost, Trend, TrendTier,
};

use crate::scoring::round_to;
use crate::signals::{count_mentions, MentionMatcher};
use crate::window::TimeWindow;

pub const PLATFORM_BOARD_SIZE: usize = 10;
pub const KEYWORD_BOARD_SIZE: usize = 20;

/// Distinct keywords in first-seen order, each typed by its first occurrence.
fn distinct_keywords(assignments: &[KeywordAssignment]) -> Vec<(&str, KeywordType)> {
    let mut seen = HashSet::new();
    assignments
        .iter()
        .filter(|a| seen.insert(a.keyword.as_str()))
        .map(|a| (a.keyword.as_str(), a.keyword_type))
        .collect()
}

/// Top keywords by mention volume on each platform in
/// [`Platform::ALL`]. Platforms with no mentions contribute no rows.
#[must_use]
pub fn build_platform_leaderboards(
    window: &TimeWindow,
    posts: &[SocialPost],
    assignments: &[KeywordAssignment],
) -> Vec<PlatformLeaderboardEntry> {
    let keywords = distinct_keywords(assignments);
    let matchers: Vec<MentionMatcher> = keywords
        .iter()
        .map(|&(keyword, _)| MentionMatcher::new(keyword))
        .collect();

    let mut by_platform: HashMap<Platform, Vec<&SocialPost>> = HashMap::new();
    for post in posts {
        if let Some(platform) = Platform::parse(&post.platform) {
            by_platform.entry(platform).or_default().push(post);
        }
    }

    let mut entries = Vec::new();

    for platform in Platform::ALL {
        let Some(platform_posts) = by_platform.get(&platform) else {
            continue;
        };
        let mut board: Vec<PlatformLeaderboardEntry> = keywords
            .iter()
            .zip(&matchers)
            .filter_map(|(&(keyword, keyword_type), matcher)| {
                let counts = count_mentions(window, platform_posts.iter().copied(), matcher);
                let mentions = counts.total();
                if mentions == 0 {
                    return None;
                }
                #[allow(clippy::cast_precision_loss)]
                let value = (mentions as f64 * 10.0).min(100.0);
                Some(PlatformLeaderboardEntry {
                    platform,
                    rank: 0,
                    keyword: keyword.to_owned(),
                    keyword_type,
                    value,
                    growth_pct: round_to(counts.growth_pct(), 1),
                    mention_count: mentions,
                })
            })
            .collect();

        // Stable: equal values keep first-seen keyword order.
        board.sort_by(|a, b| b.value.total_cmp(&a.value));
        board.truncate(PLATFORM_BOARD_SIZE);

        tracing::debug!(platform = %platform, keywords = board.len(), "platform board built");

        for (i, mut entry) in board.into_iter().enumerate() {
            entry.rank = i + 1;
            entries.push(entry);
        }
    }

    entries
}

struct KeywordTally<'a> {
    keyword: &'a str,
    count: usize,
    products: HashSet<&'a str>,
}

/// Top keywords per type by assignment count, scored against the trends
/// they appear in.
#[must_use]
pub fn build_keyword_leaderboard(
    assignments: &[KeywordAssignment],
    trends: &[Trend],
) -> Vec<KeywordLeaderboardEntry> {
    let mut entries = Vec::new();

    for kind in KeywordType::ALL {
        let mut order: Vec<KeywordTally<'_>> = Vec::new();
        let mut index: HashMap<&str, usize> = HashMap::new();

        for a in assignments.iter().filter(|a| a.keyword_type == kind) {
            let slot = *index.entry(a.keyword.as_str()).or_insert_with(|| {
                order.push(KeywordTally {
                    keyword: a.keyword.as_str(),
                    count: 0,
                    products: HashSet::new(),
                });
                order.len() - 1
            });
            let tally = &mut order[slot];
            tally.count += 1;
            tally.products.insert(a.source_product_id.as_str());
        }

        // Stable: equal counts keep insertion order.
        order.sort_by(|a, b| b.count.cmp(&a.count));
        order.truncate(KEYWORD_BOARD_SIZE);

        for (i, tally) in order.into_iter().enumerate() {
            let related: Vec<&Trend> = trends
                .iter()
                .filter(|t| t.mentions_keyword(tally.keyword))
                .collect();

            #[allow(clippy::cast_precision_loss)]
            let score = if related.is_empty() {
                tally.count as f64 * 8.0
            } else {
                let sum: f64 = related.iter().map(|t| t.composite_score).sum();
                round_to(sum / related.len() as f64, 1)
            };
            let tier = related
                .iter()
                .map(|t| t.tier)
                .max()
                .unwrap_or(TrendTier::Early);

            entries.push(KeywordLeaderboardEntry {
                rank: i + 1,
                keyword: tally.keyword.to_owned(),
                keyword_type: kind,
                score,
                assignment_count: tally.count,
                product_count: tally.products.len(),
                tier,
            });
        }
    }

    entries
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};
    use trendclue_core::Signals;

    use super::*;

    fn assignment(keyword: &str, kind: KeywordType, product: &str) -> KeywordAssignment {
        KeywordAssignment {
            keyword: keyword.into(),
            keyword_type: kind,
            source_product_id: product.into(),
            effects: vec![],
        }
    }

    fn trend(key: &str, ingredients: &[&str], score: f64, tier: TrendTier) -> Trend {
        Trend {
            combination_key: key.into(),
            ingredients: ingredients.iter().map(|s| (*s).to_owned()).collect(),
            formats: vec!["serum".into()],
            effects: vec![],
            product_ids: vec!["A".into()],
            product_count: 1,
            avg_rank: 1.0,
            total_sales: 0,
            synergy_score: 0.5,
            signals: Signals {
                social: 50.0,
                retail: 50.0,
                review: 50.0,
            },
            composite_score: score,
            tier,
        }
    }

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, d, 12, 0, 0).unwrap()
    }

    fn window() -> TimeWindow {
        TimeWindow::resolve(
            Some((
                Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2024, 1, 29, 0, 0, 0).unwrap(),
            )),
            4,
            day(30),
        )
        .unwrap()
    }

    fn post(platform: &str, content: &str, at: DateTime<Utc>) -> SocialPost {
        SocialPost {
            platform: platform.into(),
            content: content.into(),
            hashtags: vec![],
            posted_at: at,
            country: "usa".into(),
        }
    }

    #[test]
    fn keyword_board_counts_ranks_and_joins_trends() {
        let assignments = vec![
            assignment("retinol", KeywordType::Ingredient, "A"),
            assignment("niacinamide", KeywordType::Ingredient, "A"),
            assignment("retinol", KeywordType::Ingredient, "B"),
            assignment("retinol", KeywordType::Ingredient, "B"),
            assignment("serum", KeywordType::Format, "A"),
        ];
        let trends = vec![
            trend("t1", &["retinol"], 80.0, TrendTier::Growing),
            trend("t2", &["retinol"], 70.0, TrendTier::Actionable),
        ];

        let board = build_keyword_leaderboard(&assignments, &trends);
        let retinol = &board[0];
        assert_eq!(retinol.keyword, "retinol");
        assert_eq!(retinol.rank, 1);
        assert_eq!(retinol.assignment_count, 3);
        assert_eq!(retinol.product_count, 2);
        assert!((retinol.score - 75.0).abs() < 1e-9);
        assert_eq!(retinol.tier, TrendTier::Actionable);

        let niacinamide = &board[1];
        assert_eq!(niacinamide.rank, 2);
        assert!((niacinamide.score - 8.0).abs() < 1e-9);
        assert_eq!(niacinamide.tier, TrendTier::Early);

        // serum appears in every test trend's formats
        let serum = board.iter().find(|e| e.keyword == "serum").unwrap();
        assert_eq!(serum.keyword_type, KeywordType::Format);
        assert_eq!(serum.rank, 1);
        assert_eq!(serum.tier, TrendTier::Actionable);
    }

    #[test]
    fn keyword_board_ties_keep_insertion_order_and_cap() {
        let assignments: Vec<_> = (0..25)
            .map(|i| assignment(&format!("kw{i:02}"), KeywordType::Mood, "A"))
            .collect();
        let board = build_keyword_leaderboard(&assignments, &[]);
        assert_eq!(board.len(), KEYWORD_BOARD_SIZE);
        assert_eq!(board[0].keyword, "kw00");
        assert_eq!(board[19].keyword, "kw19");
        assert!((board[0].score - 8.0).abs() < 1e-9);
    }

    #[test]
    fn platform_board_counts_per_platform_and_drops_zero() {
        let w = window();
        let posts = vec![
            post("TikTok", "retinol serum", day(3)),
            post("TikTok", "retinol", day(20)),
            post("TikTok", "retinol", day(21)),
            post("Instagram", "serum", day(20)),
        ];
        let assignments = vec![
            assignment("retinol", KeywordType::Ingredient, "A"),
            assignment("serum", KeywordType::Format, "A"),
            assignment("retinol", KeywordType::Effect, "B"),
        ];

        let board = build_platform_leaderboards(&w, &posts, &assignments);
        let tiktok: Vec<_> = board.iter().filter(|e| e.platform == Platform::TikTok).collect();
        assert_eq!(tiktok.len(), 2);
        assert_eq!(tiktok[0].keyword, "retinol");
        assert_eq!(tiktok[0].keyword_type, KeywordType::Ingredient);
        assert_eq!(tiktok[0].mention_count, 3);
        assert!((tiktok[0].value - 30.0).abs() < 1e-9);
        assert!((tiktok[0].growth_pct - 100.0).abs() < 1e-9);
        assert_eq!(tiktok[1].keyword, "serum");
        assert_eq!(tiktok[1].rank, 2);

        let instagram: Vec<_> = board.iter().filter(|e| e.platform == Platform::Instagram).collect();
        assert_eq!(instagram.len(), 1);
        assert!((instagram[0].growth_pct - 50.0).abs() < 1e-9);
        assert!(board.iter().all(|e| e.platform != Platform::Cosme));
    }

    #[test]
    fn platform_board_keeps_top_ten_with_first_seen_ties() {
        let w = window();
        let assignments: Vec<_> = (0..12)
            .map(|i| assignment(&format!("kw{i:02}"), KeywordType::Ingredient, "A"))
            .collect();
        let mut posts: Vec<_> = (0..12)
            .map(|i| post("TikTok", &format!("kw{i:02}"), day(20)))
            .collect();
        posts.push(post("TikTok", "kw11 again", day(21)));
        posts.push(post("TikTok", "#kw11", day(22)));

        let board = build_platform_leaderboards(&w, &posts, &assignments);
        assert_eq!(board.len(), PLATFORM_BOARD_SIZE);
        let ranks: Vec<usize> = board.iter().map(|e| e.rank).collect();
        assert_eq!(ranks, (1..=10).collect::<Vec<_>>());

        assert_eq!(board[0].keyword, "kw11");
        assert_eq!(board[0].mention_count, 3);
        let tied: Vec<&str> = board[1..].iter().map(|e| e.keyword.as_str()).collect();
        assert_eq!(
            tied,
            vec!["kw00", "kw01", "kw02", "kw03", "kw04", "kw05", "kw06", "kw07", "kw08"]
        );
    }

    #[test]
    fn platform_board_value_caps_at_one_hundred() {
        let w = window();
        let posts: Vec<_> = (0..15).map(|_| post("Shopee", "snail mucin", day(10))).collect();
        let assignments = vec![assignment("snail mucin", KeywordType::Ingredient, "A")];
        let board = build_platform_leaderboards(&w, &posts, &assignments);
        assert_eq!(board.len(), 1);
        assert!((board[0].value - 100.0).abs() < 1e-9);
        assert_eq!(board[0].mention_count, 15);
    }
}
