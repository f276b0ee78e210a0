use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, FixedOffset, Timelike};
use tracing::{error, info};
use uuid::Uuid;

use crate::{
    aggregate::window::ReportWindow,
    clients::webhook::Notifier,
    pipeline::{daily::DailyPipeline, digest::DigestPipeline, summary::SummaryPipeline},
    scheduler::plan::{Job, plan_for},
};

/// 1回のジョブ実行に付随するコンテキスト。
#[derive(Debug, Clone)]
pub struct JobContext {
    pub job_id: Uuid,
    pub fired_at: DateTime<FixedOffset>,
}

impl JobContext {
    #[must_use]
    pub fn new(fired_at: DateTime<FixedOffset>) -> Self {
        Self {
            job_id: Uuid::new_v4(),
            fired_at,
        }
    }
}

/// 実行計画に従ってパイプラインを起動するスケジューラ。
pub struct Scheduler {
    digest: Arc<DigestPipeline>,
    summary: Arc<SummaryPipeline>,
    daily: Arc<DailyPipeline>,
    notifier: Arc<dyn Notifier>,
    ops_webhook_url: String,
    snapshot_hour: u32,
}

impl Scheduler {
    pub fn new(
        digest: Arc<DigestPipeline>,
        summary: Arc<SummaryPipeline>,
        daily: Arc<DailyPipeline>,
        notifier: Arc<dyn Notifier>,
        ops_webhook_url: String,
        snapshot_hour: u32,
    ) -> Self {
        Self {
            digest,
            summary,
            daily,
            notifier,
            ops_webhook_url,
            snapshot_hour,
        }
    }

    /// 1時間分の実行計画を順に処理する。
    ///
    /// ジョブの失敗は運用チャンネルへのエラーカードとして報告し、
    /// 残りのジョブとデーモンの運転は継続する。
    pub async fn run_hour(&self, fired_at: DateTime<FixedOffset>) {
        let jobs = plan_for(fired_at, self.snapshot_hour);
        if jobs.is_empty() {
            info!(hour = fired_at.hour(), "no jobs planned for this hour");
            return;
        }

        for job in jobs {
            let context = JobContext::new(fired_at);
            info!(job_id = %context.job_id, job = job.label(), "running scheduled job");
            match self.run_job(job, &context).await {
                Ok(()) => {
                    info!(job_id = %context.job_id, job = job.label(), "scheduled job completed");
                }
                Err(err) => {
                    let error_msg = format!("{err:#}");
                    error!(
                        job_id = %context.job_id,
                        job = job.label(),
                        error = %error_msg,
                        "scheduled job failed"
                    );
                    self.report_failure(job, &error_msg).await;
                }
            }
        }
    }

    async fn run_job(&self, job: Job, context: &JobContext) -> Result<()> {
        match job {
            Job::HourlyDigest => {
                self.digest
                    .run(context.job_id, ReportWindow::Hours(1), false)
                    .await
            }
            Job::BackfillDigest => {
                self.digest
                    .run(context.job_id, ReportWindow::Hours(8), true)
                    .await
            }
            Job::WeeklySummary => self.summary.run_weekly(context.job_id).await,
            Job::MonthlySummary => self.summary.run_monthly(context.job_id).await,
            Job::DailySnapshot => self.daily.run(context.job_id).await,
        }
    }

    /// トップレベルの失敗を通常レポートと同じWebhookチャンネルで報告する。
    async fn report_failure(&self, job: Job, error_msg: &str) {
        let body = format!("**Job**: {}\n**Error**: {error_msg}", job.label());
        if let Err(send_error) = self
            .notifier
            .send_card(&self.ops_webhook_url, "feedback-worker error", &body)
            .await
        {
            error!(error = %send_error, "failed to deliver error report card");
        }
    }
}
