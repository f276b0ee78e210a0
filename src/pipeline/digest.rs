/// 時間帯ダイジェストのパイプライン（fetch → enrich → split → notify）。
///
/// カテゴリごとに取得・付加情報解決を並行実行し、結果をプラットフォーム別の
/// カードへまとめて各チャンネルのWebhookに送ります。個々のカテゴリの失敗は
/// 空リストへ縮退し、ダイジェスト全体は残りのカテゴリで続行します。
use std::{collections::HashMap, num::NonZeroUsize, sync::Arc};

use anyhow::{Context, Result};
use chrono::FixedOffset;
use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    aggregate::window::ReportWindow,
    classification::platform::{Platform, classify_device_id},
    clients::{CmsClient, TranslateClient, webhook::Notifier},
    config::Category,
    report::digest::{DigestBody, EnrichedFeedback},
    schema::cms::{FeedbackDetail, FeedbackQuery},
};

/// 空ウィンドウ時に運用チャンネルへ送る一言。
pub const QUIET_NOTICE: &str = "No pending feedback in this window. Keep it up!";

/// ダイジェストパイプラインの設定。
#[derive(Debug, Clone)]
pub struct DigestSettings {
    pub categories: Vec<Category>,
    /// チャンネルキー → Webhook URL。
    pub webhooks: HashMap<String, String>,
    pub ops_webhook_url: String,
    pub concurrency: NonZeroUsize,
    pub page_size: u32,
    pub tz: FixedOffset,
}

pub struct DigestPipeline {
    cms: Arc<CmsClient>,
    translate: Arc<TranslateClient>,
    notifier: Arc<dyn Notifier>,
    settings: DigestSettings,
}

impl DigestPipeline {
    pub fn new(
        cms: Arc<CmsClient>,
        translate: Arc<TranslateClient>,
        notifier: Arc<dyn Notifier>,
        settings: DigestSettings,
    ) -> Self {
        Self {
            cms,
            translate,
            notifier,
            settings,
        }
    }

    /// 指定ウィンドウのダイジェストを作成して配信する。
    ///
    /// `quiet_notice` が真のとき、ウィンドウが空なら運用チャンネルへ
    /// その旨の一言カードを送る（時間帯ダイジェストでは何も送らない）。
    ///
    /// # Errors
    /// ログインまたはカード配信に失敗した場合はエラーを返す。
    pub async fn run(&self, job_id: Uuid, window: ReportWindow, quiet_notice: bool) -> Result<()> {
        let token = self.cms.login().await.context("CMS login failed")?;
        let now = crate::util::time::now().with_timezone(&self.settings.tz);
        let range = window.current(now);
        let (start_date, end_date) = range.query_bounds();

        let semaphore = Arc::new(Semaphore::new(self.settings.concurrency.get()));
        let mut tasks = Vec::with_capacity(self.settings.categories.len());
        for category in &self.settings.categories {
            let cms = Arc::clone(&self.cms);
            let translate = Arc::clone(&self.translate);
            let semaphore = Arc::clone(&semaphore);
            let token = token.clone();
            let category = category.clone();
            let query = FeedbackQuery {
                types: vec![category.id],
                start_date: start_date.clone(),
                end_date: end_date.clone(),
                page: 0,
                size: self.settings.page_size,
                status: None,
                client_type: None,
            };

            tasks.push(tokio::spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return (category, Vec::new());
                };
                process_category(&cms, &translate, &token, category, &query).await
            }));
        }

        let mut body = DigestBody::default();
        let mut total_items = 0usize;
        for result in join_all(tasks).await {
            match result {
                Ok((category, items)) => {
                    total_items += items.len();
                    if !items.is_empty() {
                        body.append_category(&category.title, &items);
                    }
                }
                Err(error) => warn!(%job_id, error = %error, "digest category task panicked"),
            }
        }

        let title = format!("User feedback ({start_date} to {end_date})");
        if body.is_empty() {
            info!(%job_id, "digest window is empty");
            if quiet_notice {
                self.notifier
                    .send_card(&self.settings.ops_webhook_url, &title, QUIET_NOTICE)
                    .await
                    .context("failed to deliver quiet notice")?;
            }
            return Ok(());
        }

        for platform in [Platform::Ios, Platform::Android] {
            let content = body.for_platform(platform);
            if content.is_empty() {
                continue;
            }
            let Some(url) = self.settings.webhooks.get(platform.channel_key()) else {
                warn!(
                    platform = platform.label(),
                    "no webhook configured for platform, skipping digest delivery"
                );
                continue;
            };
            self.notifier
                .send_card(url, &title, content)
                .await
                .with_context(|| format!("failed to deliver {} digest", platform.label()))?;
        }

        info!(%job_id, total_items, "digest delivered");
        Ok(())
    }
}

/// 1カテゴリ分の取得と付加情報解決。取得失敗は空リストへ縮退する。
async fn process_category(
    cms: &CmsClient,
    translate: &TranslateClient,
    token: &str,
    category: Category,
    query: &FeedbackQuery,
) -> (Category, Vec<EnrichedFeedback>) {
    let items = match cms.fetch_feedback(token, query).await {
        Ok(items) => items,
        Err(error) => {
            warn!(
                category = category.id,
                error = %error,
                "feedback fetch failed, skipping category"
            );
            return (category, Vec::new());
        }
    };

    let mut enriched = Vec::with_capacity(items.len());
    for item in items {
        let detail = match cms.fetch_detail(token, item.id).await {
            Ok(detail) => detail,
            Err(error) => {
                warn!(
                    feedback_id = item.id,
                    error = %error,
                    "detail lookup failed, using defaults"
                );
                FeedbackDetail::default()
            }
        };
        let question = item.question.clone().unwrap_or_default();
        let translated = translate.translate(&question).await;
        let platform = classify_device_id(item.device_id.as_deref().unwrap_or_default());
        enriched.push(EnrichedFeedback {
            item,
            detail,
            translated,
            platform,
        });
    }
    (category, enriched)
}
