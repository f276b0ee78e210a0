/// 日次スナップショットと前日比レポートのパイプライン。
///
/// 前日1日分の解決済み・未解決件数をチャンネル×カテゴリで数えて
/// ストアへ追記し（既存日付はスキップ）、直近2日付の差分カードを
/// 各チャンネルへ送ります。
use std::{num::NonZeroUsize, sync::Arc};

use anyhow::{Context, Result};
use chrono::FixedOffset;
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use crate::{
    aggregate::{
        counts::{CountFilter, collect_counts},
        window::ReportWindow,
    },
    clients::{CmsClient, webhook::Notifier},
    config::{Category, Channel},
    report::summary::render_snapshot_comparison,
    schema::cms::FeedbackStatus,
    snapshot::store::{CategorySnapshot, ChannelSnapshot, DaySnapshot, SnapshotStore},
};

/// 日次パイプラインの設定。
#[derive(Debug, Clone)]
pub struct DailySettings {
    pub categories: Vec<Category>,
    pub channels: Vec<Channel>,
    pub concurrency: NonZeroUsize,
    pub tz: FixedOffset,
}

pub struct DailyPipeline {
    cms: Arc<CmsClient>,
    notifier: Arc<dyn Notifier>,
    settings: DailySettings,
    store: Mutex<SnapshotStore>,
}

impl DailyPipeline {
    pub fn new(
        cms: Arc<CmsClient>,
        notifier: Arc<dyn Notifier>,
        settings: DailySettings,
        store: SnapshotStore,
    ) -> Self {
        Self {
            cms,
            notifier,
            settings,
            store: Mutex::new(store),
        }
    }

    /// スナップショットの記録と前日比カードの配信を行う。
    ///
    /// # Errors
    /// ログイン、ストアへの書き出し、カード配信に失敗した場合はエラーを返す。
    pub async fn run(&self, job_id: Uuid) -> Result<()> {
        let now = crate::util::time::now().with_timezone(&self.settings.tz);
        let range = ReportWindow::Daily.current(now);
        let date = range.start.date_naive();

        let already_recorded = { self.store.lock().await.contains(date) };
        if already_recorded {
            info!(%job_id, %date, "snapshot already recorded for date, keeping existing entry");
        } else {
            let token = self.cms.login().await.context("CMS login failed")?;

            let mut day = DaySnapshot::new();
            for channel in &self.settings.channels {
                let snapshot = self.count_channel(&token, &channel.key, &range).await;
                day.insert(channel.key.clone(), snapshot);
            }

            let mut store = self.store.lock().await;
            let inserted = store
                .record(date, day)
                .context("failed to persist daily snapshot")?;
            if inserted {
                info!(%job_id, %date, "daily snapshot recorded");
            }
        }

        self.send_comparisons(job_id).await
    }

    /// 1チャンネル分の解決済み・未解決件数を収集する。
    async fn count_channel(
        &self,
        token: &str,
        channel_key: &str,
        range: &crate::aggregate::window::TimeRange,
    ) -> ChannelSnapshot {
        let resolved_filter = CountFilter {
            status: Some(FeedbackStatus::Resolved),
            client_type: Some(channel_key.to_string()),
        };
        let unresolved_filter = CountFilter {
            status: Some(FeedbackStatus::Unresolved),
            client_type: Some(channel_key.to_string()),
        };

        let resolved = collect_counts(
            &self.cms,
            token,
            &self.settings.categories,
            range,
            &resolved_filter,
            self.settings.concurrency,
        )
        .await;
        let unresolved = collect_counts(
            &self.cms,
            token,
            &self.settings.categories,
            range,
            &unresolved_filter,
            self.settings.concurrency,
        )
        .await;

        let mut snapshot = ChannelSnapshot::new();
        for category in &self.settings.categories {
            snapshot.insert(
                category.id,
                CategorySnapshot {
                    category_title: category.title.clone(),
                    resolved_total: resolved.get(category.id).map_or(0, |count| count.total),
                    unresolved_total: unresolved.get(category.id).map_or(0, |count| count.total),
                },
            );
        }
        snapshot
    }

    /// 直近2日付の差分カードをチャンネルごとに配信する。
    async fn send_comparisons(&self, job_id: Uuid) -> Result<()> {
        let store = self.store.lock().await;
        let Some(((current_date, current_day), (prior_date, prior_day))) = store.latest_two()
        else {
            info!(%job_id, "not enough snapshot history for day-over-day comparison");
            return Ok(());
        };

        let empty = ChannelSnapshot::new();
        for channel in &self.settings.channels {
            let current = current_day.get(&channel.key).unwrap_or(&empty);
            let prior = prior_day.get(&channel.key).unwrap_or(&empty);
            let body = render_snapshot_comparison(current_date, current, prior_date, prior);
            let title = format!("Daily feedback trend ({})", channel.key);
            self.notifier
                .send_card(&channel.webhook_url, &title, &body)
                .await
                .with_context(|| {
                    format!("failed to deliver day-over-day card for {}", channel.key)
                })?;
        }

        info!(%job_id, %current_date, %prior_date, "day-over-day comparison delivered");
        Ok(())
    }
}
