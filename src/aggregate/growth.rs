/// 期間比較の成長率計算。
///
/// 2期間のカテゴリ集合は積ではなく和で突き合わせます（片側にしか
/// 現れないカテゴリも必ず行に出す）。
use std::collections::BTreeSet;

use super::counts::CategoryCounts;

/// 前期間が0件のときに返す番兵文字列。
pub const GROWTH_SENTINEL: &str = "new";

/// 1カテゴリ分の比較行。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrowthEntry {
    pub id: u32,
    pub title: String,
    pub current: u64,
    pub prior: u64,
    pub rate: String,
}

/// 成長率を表示用文字列にする。
///
/// 前期間が0件の場合は [`GROWTH_SENTINEL`] を返す（0→0も含む）。
/// それ以外は傾向矢印付きの符号付きパーセント表示。
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn growth_rate(current: u64, prior: u64) -> String {
    if prior == 0 {
        return GROWTH_SENTINEL.to_string();
    }

    let pct = (current as f64 - prior as f64) / prior as f64 * 100.0;
    let arrow = match current.cmp(&prior) {
        std::cmp::Ordering::Greater => "↑",
        std::cmp::Ordering::Less => "↓",
        std::cmp::Ordering::Equal => "→",
    };
    format!("{arrow} {pct:+.1}%")
}

/// 現期間と前期間のカテゴリ件数を突き合わせる。
///
/// キーは両期間の和集合。タイトルは現期間を優先し、現期間に
/// 存在しないカテゴリは前期間のタイトルを使う。
#[must_use]
pub fn diff_counts(current: &CategoryCounts, prior: &CategoryCounts) -> Vec<GrowthEntry> {
    let ids: BTreeSet<u32> = current
        .by_category
        .keys()
        .chain(prior.by_category.keys())
        .copied()
        .collect();

    ids.into_iter()
        .map(|id| {
            let current_count = current.by_category.get(&id);
            let prior_count = prior.by_category.get(&id);
            let title = current_count
                .or(prior_count)
                .map_or_else(|| id.to_string(), |count| count.title.clone());
            let current_total = current_count.map_or(0, |count| count.total);
            let prior_total = prior_count.map_or(0, |count| count.total);
            GrowthEntry {
                id,
                title,
                current: current_total,
                prior: prior_total,
                rate: growth_rate(current_total, prior_total),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::counts::CategoryCount;

    fn counts(entries: &[(u32, &str, u64)]) -> CategoryCounts {
        let mut counts = CategoryCounts::default();
        for (id, title, total) in entries {
            counts.insert(CategoryCount {
                id: *id,
                title: (*title).to_string(),
                total: *total,
            });
        }
        counts
    }

    #[test]
    fn growth_rate_returns_sentinel_when_prior_is_zero() {
        assert_eq!(growth_rate(5, 0), GROWTH_SENTINEL);
        assert_eq!(growth_rate(0, 0), GROWTH_SENTINEL);
    }

    #[test]
    fn growth_rate_formats_signed_percentage_with_trend_arrow() {
        assert_eq!(growth_rate(30, 25), "↑ +20.0%");
        assert_eq!(growth_rate(7, 8), "↓ -12.5%");
        assert_eq!(growth_rate(4, 4), "→ +0.0%");
    }

    #[test]
    fn diff_unions_category_keys_from_both_periods() {
        let current = counts(&[(25, "product", 3), (31, "account", 2)]);
        let prior = counts(&[(31, "account", 4), (36, "other", 1)]);

        let entries = diff_counts(&current, &prior);

        let ids: Vec<u32> = entries.iter().map(|entry| entry.id).collect();
        assert_eq!(ids, vec![25, 31, 36]);

        assert_eq!(entries[0].prior, 0);
        assert_eq!(entries[0].rate, GROWTH_SENTINEL);
        assert_eq!(entries[1].current, 2);
        assert_eq!(entries[1].prior, 4);
        assert_eq!(entries[1].rate, "↓ -50.0%");
        assert_eq!(entries[2].title, "other");
        assert_eq!(entries[2].current, 0);
        assert_eq!(entries[2].rate, "↓ -100.0%");
    }
}
