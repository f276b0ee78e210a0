/// チャットWebhookクライアントと通知の抽象。
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, error};

use crate::schema::card::CardMessage;

/// カード送信の抽象。パイプラインはこのトレイト経由で通知する。
#[async_trait]
pub trait Notifier: Send + Sync {
    /// タイトルとMarkdown本文を1枚のカードとして送信する。
    ///
    /// # Errors
    /// 送信に失敗した場合、またはWebhookがエラーステータスを返した場合は
    /// エラーを返す。
    async fn send_card(&self, webhook_url: &str, title: &str, body: &str) -> Result<()>;
}

/// 固定URLのWebhookへカードをPOSTするクライアント。
#[derive(Debug, Clone)]
pub struct WebhookClient {
    client: Client,
}

impl WebhookClient {
    /// 新しいWebhookクライアントを作成する。
    ///
    /// # Errors
    /// HTTPクライアントの構築に失敗した場合はエラーを返す。
    pub fn new(connect_timeout: Duration, total_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(total_timeout)
            .build()
            .context("failed to build webhook HTTP client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Notifier for WebhookClient {
    async fn send_card(&self, webhook_url: &str, title: &str, body: &str) -> Result<()> {
        let message = CardMessage::interactive(title, body);

        let response = self
            .client
            .post(webhook_url)
            .json(&message)
            .send()
            .await
            .context("webhook request failed")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(%status, body = %error_body, "webhook card delivery failed");
            anyhow::bail!("webhook returned error status {status}");
        }

        debug!(title, "webhook card delivered");
        Ok(())
    }
}
