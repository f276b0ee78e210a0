/// CMSフィードバックAPIクライアント。
///
/// ログイン、ページング付き一覧取得、詳細取得、件数クエリを提供します。
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, Url};
use serde_json::json;
use tracing::debug;

use crate::schema::cms::{ApiEnvelope, FeedbackDetail, FeedbackItem, FeedbackPage, FeedbackQuery};

use super::headers;

const LOGIN_PATH: &str = "auth/backend/account/login";
const FEEDBACK_PAGE_PATH: &str = "user/behavior/backend/feedback/v2/page/0";
const FEEDBACK_DETAIL_PATH: &str = "user/behavior/backend/feedback/v2/detail";

/// CMSクライアントの設定。
#[derive(Debug, Clone)]
pub struct CmsConfig {
    pub base_url: String,
    pub username: String,
    pub password: String,
    pub connect_timeout: Duration,
    pub total_timeout: Duration,
}

/// CMSとの通信を管理するクライアント。
#[derive(Debug, Clone)]
pub struct CmsClient {
    client: Client,
    base_url: Url,
    username: String,
    password: String,
}

impl CmsClient {
    /// 新しいCMSクライアントを作成する。
    ///
    /// # Errors
    /// URLのパースまたはHTTPクライアントの構築に失敗した場合はエラーを返す。
    pub fn new(config: CmsConfig) -> Result<Self> {
        let client = Client::builder()
            .default_headers(headers::default_headers())
            .connect_timeout(config.connect_timeout)
            .timeout(config.total_timeout)
            .build()
            .context("failed to build CMS HTTP client")?;

        let base_url = Url::parse(&config.base_url).context("invalid CMS base URL")?;

        Ok(Self {
            client,
            base_url,
            username: config.username,
            password: config.password,
        })
    }

    /// ログインしてベアラートークン文字列を取得する。
    ///
    /// # Errors
    /// リクエスト失敗、エラーステータス、トークン欠落時はエラーを返す。
    pub async fn login(&self) -> Result<String> {
        let url = self
            .base_url
            .join(LOGIN_PATH)
            .context("failed to build login URL")?;
        let body = json!({
            "username": self.username,
            "password": self.password,
        });

        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .context("CMS login request failed")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            anyhow::bail!("CMS login returned error status {status}: {error_body}");
        }

        let envelope = response
            .json::<ApiEnvelope<String>>()
            .await
            .context("failed to deserialize CMS login response")?;

        envelope
            .into_data()
            .filter(|token| !token.is_empty())
            .ok_or_else(|| anyhow::anyhow!("CMS login response contained no token"))
    }

    /// 単一ページのフィードバック一覧を取得する。
    ///
    /// # Errors
    /// リクエスト失敗、エラーステータス、デシリアライズ失敗時はエラーを返す。
    pub async fn fetch_page(&self, token: &str, query: &FeedbackQuery) -> Result<FeedbackPage> {
        let url = self
            .base_url
            .join(FEEDBACK_PAGE_PATH)
            .context("failed to build feedback page URL")?;

        let response = self
            .client
            .post(url)
            .headers(headers::with_token(token))
            .json(query)
            .send()
            .await
            .context("CMS feedback page request failed")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            anyhow::bail!("CMS feedback page returned error status {status}: {error_body}");
        }

        let envelope = response
            .json::<ApiEnvelope<FeedbackPage>>()
            .await
            .context("failed to deserialize CMS feedback page response")?;

        Ok(envelope.into_data().unwrap_or_default())
    }

    /// 指定条件のフィードバックを全ページ取得する。
    ///
    /// `query.size` をページサイズとして、全件集まるまで自動でページングします。
    ///
    /// # Errors
    /// いずれかのページの取得に失敗した場合はエラーを返す。
    pub async fn fetch_feedback(
        &self,
        token: &str,
        query: &FeedbackQuery,
    ) -> Result<Vec<FeedbackItem>> {
        let mut items = Vec::new();
        let mut page_index = 0u32;

        loop {
            let page = self.fetch_page(token, &query.at_page(page_index)).await?;
            let fetched = page.content.len();
            items.extend(page.content);

            debug!(
                page = page_index,
                fetched,
                total = items.len(),
                "fetched feedback page"
            );

            if fetched == 0
                || fetched < query.size as usize
                || items.len() as u64 >= page.total_elements
            {
                break;
            }
            page_index += 1;
        }

        Ok(items)
    }

    /// 件数のみを取得する（1行クエリの `totalElements` を読む）。
    ///
    /// # Errors
    /// ページ取得に失敗した場合はエラーを返す。
    pub async fn count_feedback(&self, token: &str, query: &FeedbackQuery) -> Result<u64> {
        let page = self.fetch_page(token, &query.as_count()).await?;
        Ok(page.total_elements)
    }

    /// フィードバック詳細を取得する。`data` 欠落時は空の詳細へ縮退する。
    ///
    /// # Errors
    /// リクエスト失敗、エラーステータス、デシリアライズ失敗時はエラーを返す。
    pub async fn fetch_detail(&self, token: &str, feedback_id: i64) -> Result<FeedbackDetail> {
        let url = self
            .base_url
            .join(&format!("{FEEDBACK_DETAIL_PATH}/{feedback_id}"))
            .context("failed to build feedback detail URL")?;

        let response = self
            .client
            .get(url)
            .headers(headers::with_token(token))
            .send()
            .await
            .context("CMS feedback detail request failed")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            anyhow::bail!("CMS feedback detail returned error status {status}: {error_body}");
        }

        let envelope = response
            .json::<ApiEnvelope<FeedbackDetail>>()
            .await
            .context("failed to deserialize CMS feedback detail response")?;

        Ok(envelope.into_data().unwrap_or_default())
    }
}
