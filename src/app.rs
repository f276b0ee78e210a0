use std::sync::Arc;

use anyhow::{Context, Result};

use crate::{
    clients::{
        cms::{CmsClient, CmsConfig},
        translate::{TranslateClient, TranslateConfig},
        webhook::{Notifier, WebhookClient},
    },
    config::Config,
    pipeline::{
        daily::{DailyPipeline, DailySettings},
        digest::{DigestPipeline, DigestSettings},
        summary::{SummaryPipeline, SummarySettings},
    },
    scheduler::Scheduler,
    snapshot::store::SnapshotStore,
};

/// アプリケーション全体の共有コンポーネント。
pub struct ComponentRegistry {
    config: Arc<Config>,
    scheduler: Arc<Scheduler>,
}

impl ComponentRegistry {
    /// 構成情報と依存をまとめて初期化し、アプリケーションの共有レジストリを構築する。
    ///
    /// # Errors
    /// HTTPクライアントの構築またはスナップショットストアの読み込みが
    /// 失敗した場合はエラーを返す。
    pub fn build(config: Config) -> Result<Self> {
        let config = Arc::new(config);

        let cms = Arc::new(
            CmsClient::new(CmsConfig {
                base_url: config.cms_base_url().to_string(),
                username: config.cms_username().to_string(),
                password: config.cms_password().to_string(),
                connect_timeout: config.cms_connect_timeout(),
                total_timeout: config.cms_total_timeout(),
            })
            .context("failed to build CMS client")?,
        );

        let translate = Arc::new(
            TranslateClient::new(TranslateConfig {
                endpoint: config.translate_endpoint().to_string(),
                app_id: config.translate_app_id().map(str::to_string),
                app_key: config.translate_app_key().map(str::to_string),
                target_lang: config.translate_target_lang().to_string(),
                connect_timeout: config.cms_connect_timeout(),
                total_timeout: config.cms_total_timeout(),
            })
            .context("failed to build translate client")?,
        );

        let notifier: Arc<dyn Notifier> = Arc::new(
            WebhookClient::new(config.cms_connect_timeout(), config.cms_total_timeout())
                .context("failed to build webhook client")?,
        );

        let store = SnapshotStore::open(config.snapshot_path().clone())
            .context("failed to open snapshot store")?;

        let webhooks = config
            .channels()
            .iter()
            .map(|channel| (channel.key.clone(), channel.webhook_url.clone()))
            .collect();

        let digest = Arc::new(DigestPipeline::new(
            Arc::clone(&cms),
            Arc::clone(&translate),
            Arc::clone(&notifier),
            DigestSettings {
                categories: config.categories().to_vec(),
                webhooks,
                ops_webhook_url: config.ops_webhook_url().to_string(),
                concurrency: config.fetch_concurrency(),
                page_size: config.page_size(),
                tz: config.report_tz(),
            },
        ));

        let summary = Arc::new(SummaryPipeline::new(
            Arc::clone(&cms),
            Arc::clone(&notifier),
            SummarySettings {
                categories: config.categories().to_vec(),
                summary_webhook_url: config.ops_webhook_url().to_string(),
                concurrency: config.fetch_concurrency(),
                tz: config.report_tz(),
            },
        ));

        let daily = Arc::new(DailyPipeline::new(
            Arc::clone(&cms),
            Arc::clone(&notifier),
            DailySettings {
                categories: config.categories().to_vec(),
                channels: config.channels().to_vec(),
                concurrency: config.fetch_concurrency(),
                tz: config.report_tz(),
            },
            store,
        ));

        let scheduler = Arc::new(Scheduler::new(
            digest,
            summary,
            daily,
            notifier,
            config.ops_webhook_url().to_string(),
            config.snapshot_hour(),
        ));

        Ok(Self { config, scheduler })
    }

    #[must_use]
    pub fn scheduler(&self) -> Arc<Scheduler> {
        Arc::clone(&self.scheduler)
    }

    #[must_use]
    pub fn config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }
}
