/// 週次・月次サマリーのパイプライン。
///
/// 現期間と前期間のカテゴリ別件数をそれぞれ収集し、和集合で突き合わせた
/// 成長率つきのサマリーカードを運用チャンネルへ送ります。
use std::{num::NonZeroUsize, sync::Arc};

use anyhow::{Context, Result};
use chrono::FixedOffset;
use tracing::info;
use uuid::Uuid;

use crate::{
    aggregate::{
        counts::{CountFilter, collect_counts},
        growth::diff_counts,
        window::ReportWindow,
    },
    clients::{CmsClient, webhook::Notifier},
    config::Category,
    report::summary::render_window_summary,
};

/// サマリーパイプラインの設定。
#[derive(Debug, Clone)]
pub struct SummarySettings {
    pub categories: Vec<Category>,
    pub summary_webhook_url: String,
    pub concurrency: NonZeroUsize,
    pub tz: FixedOffset,
}

pub struct SummaryPipeline {
    cms: Arc<CmsClient>,
    notifier: Arc<dyn Notifier>,
    settings: SummarySettings,
}

impl SummaryPipeline {
    pub fn new(
        cms: Arc<CmsClient>,
        notifier: Arc<dyn Notifier>,
        settings: SummarySettings,
    ) -> Self {
        Self {
            cms,
            notifier,
            settings,
        }
    }

    /// 週次サマリーを配信する。
    ///
    /// # Errors
    /// ログインまたはカード配信に失敗した場合はエラーを返す。
    pub async fn run_weekly(&self, job_id: Uuid) -> Result<()> {
        self.run_comparison(
            job_id,
            ReportWindow::Weekly,
            "Weekly feedback summary",
            "this week",
            "last week",
        )
        .await
    }

    /// 月次サマリーを配信する。
    ///
    /// # Errors
    /// ログインまたはカード配信に失敗した場合はエラーを返す。
    pub async fn run_monthly(&self, job_id: Uuid) -> Result<()> {
        self.run_comparison(
            job_id,
            ReportWindow::Monthly,
            "Monthly feedback summary",
            "this month",
            "last month",
        )
        .await
    }

    async fn run_comparison(
        &self,
        job_id: Uuid,
        window: ReportWindow,
        card_title: &str,
        current_label: &str,
        prior_label: &str,
    ) -> Result<()> {
        let token = self.cms.login().await.context("CMS login failed")?;
        let now = crate::util::time::now().with_timezone(&self.settings.tz);
        let current_range = window.current(now);
        let prior_range = window
            .prior(now)
            .context("summary window has no prior range")?;

        let filter = CountFilter::none();
        let current = collect_counts(
            &self.cms,
            &token,
            &self.settings.categories,
            &current_range,
            &filter,
            self.settings.concurrency,
        )
        .await;
        let prior = collect_counts(
            &self.cms,
            &token,
            &self.settings.categories,
            &prior_range,
            &filter,
            self.settings.concurrency,
        )
        .await;

        let entries = diff_counts(&current, &prior);
        let body = render_window_summary(current_label, prior_label, &current, &prior, &entries);

        let (start_date, end_date) = current_range.query_bounds();
        let title = format!("{card_title} ({start_date} to {end_date})");
        self.notifier
            .send_card(&self.settings.summary_webhook_url, &title, &body)
            .await
            .context("failed to deliver summary card")?;

        info!(
            %job_id,
            current_total = current.total,
            prior_total = prior.total,
            "summary delivered"
        );
        Ok(())
    }
}
