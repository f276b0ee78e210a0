/// 期間比較サマリーカードのMarkdownレンダリング。
use chrono::NaiveDate;

use crate::{
    aggregate::{
        counts::CategoryCounts,
        growth::{GrowthEntry, growth_rate},
    },
    snapshot::store::{CategorySnapshot, ChannelSnapshot},
};

/// 週次・月次サマリー本文を描画する。
///
/// 総数2行＋カテゴリ別の比較行。カテゴリ行は両期間の和集合
/// （`entries` は [`diff_counts`] の出力）をそのまま並べる。
///
/// [`diff_counts`]: crate::aggregate::growth::diff_counts
#[must_use]
pub fn render_window_summary(
    current_label: &str,
    prior_label: &str,
    current: &CategoryCounts,
    prior: &CategoryCounts,
    entries: &[GrowthEntry],
) -> String {
    let mut lines = vec![
        format!("**{current_label} total**: {}", current.total),
        format!(
            "**{prior_label} total**: {} ({})",
            prior.total,
            growth_rate(current.total, prior.total)
        ),
        String::new(),
        "**By category**:".to_string(),
    ];
    for entry in entries {
        lines.push(format!(
            "**{}**: {} (prior {}, {})",
            entry.title, entry.current, entry.prior, entry.rate
        ));
    }
    lines.join("\n")
}

/// 日次スナップショット比較の本文を描画する。
///
/// カテゴリは両日付の和集合。合計（未解決＋解決済み）で成長率を計算する。
#[must_use]
pub fn render_snapshot_comparison(
    current_date: NaiveDate,
    current: &ChannelSnapshot,
    prior_date: NaiveDate,
    prior: &ChannelSnapshot,
) -> String {
    let ids: std::collections::BTreeSet<u32> =
        current.keys().chain(prior.keys()).copied().collect();

    let mut lines = vec![
        format!("**Date**: {current_date} (prior {prior_date})"),
        String::new(),
    ];
    for id in ids {
        let current_entry = current.get(&id);
        let prior_entry = prior.get(&id);
        let title = current_entry
            .or(prior_entry)
            .map_or_else(|| id.to_string(), |entry| entry.category_title.clone());
        let (resolved, unresolved, total) = current_entry
            .map_or((0, 0, 0), |entry| {
                (entry.resolved_total, entry.unresolved_total, entry.total())
            });
        let prior_total = prior_entry.map_or(0, CategorySnapshot::total);
        lines.push(format!(
            "**{title}**: open {unresolved} / resolved {resolved}, total {total} (prior {prior_total}, {})",
            growth_rate(total, prior_total)
        ));
    }
    lines.join("\n")
}
