/// 署名付き機械翻訳クライアント。
///
/// `md5(appid + query + salt + appkey)` のレガシー署名方式を使う
/// 翻訳APIを呼び出します。認証情報が未設定の場合、および呼び出しが
/// 失敗した場合は常に原文へ縮退します。
use std::time::Duration;

use anyhow::{Context, Result};
use rand::Rng;
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::warn;

/// 翻訳クライアントの設定。
#[derive(Debug, Clone)]
pub struct TranslateConfig {
    pub endpoint: String,
    pub app_id: Option<String>,
    pub app_key: Option<String>,
    pub target_lang: String,
    pub connect_timeout: Duration,
    pub total_timeout: Duration,
}

#[derive(Debug, Clone)]
struct Credentials {
    app_id: String,
    app_key: String,
}

/// 翻訳APIとの通信を管理するクライアント。
#[derive(Debug, Clone)]
pub struct TranslateClient {
    client: Client,
    endpoint: Url,
    credentials: Option<Credentials>,
    target_lang: String,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    #[serde(default)]
    trans_result: Vec<TranslatedSegment>,
}

#[derive(Debug, Deserialize)]
struct TranslatedSegment {
    #[serde(default)]
    dst: String,
}

impl TranslateClient {
    /// 新しい翻訳クライアントを作成する。
    ///
    /// `app_id` と `app_key` の両方が揃っていない場合は無効化された
    /// クライアントとなり、`translate` は常に原文を返す。
    ///
    /// # Errors
    /// URLのパースまたはHTTPクライアントの構築に失敗した場合はエラーを返す。
    pub fn new(config: TranslateConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.total_timeout)
            .build()
            .context("failed to build translate HTTP client")?;

        let endpoint = Url::parse(&config.endpoint).context("invalid translate endpoint")?;

        let credentials = match (config.app_id, config.app_key) {
            (Some(app_id), Some(app_key)) => Some(Credentials { app_id, app_key }),
            _ => None,
        };

        Ok(Self {
            client,
            endpoint,
            credentials,
            target_lang: config.target_lang,
        })
    }

    /// テキストを翻訳する。
    ///
    /// 失敗（HTTPエラー、応答形式不一致、空の結果）は警告ログの上で
    /// 原文をそのまま返します。空文字は呼び出しせずに即返します。
    pub async fn translate(&self, text: &str) -> String {
        if text.trim().is_empty() {
            return text.to_string();
        }
        let Some(credentials) = &self.credentials else {
            return text.to_string();
        };

        match self.request(credentials, text).await {
            Ok(translated) if !translated.is_empty() => translated,
            Ok(_) => text.to_string(),
            Err(error) => {
                warn!(error = %error, "translation failed, keeping original text");
                text.to_string()
            }
        }
    }

    async fn request(&self, credentials: &Credentials, text: &str) -> Result<String> {
        let salt: u32 = rand::rng().random_range(32768..=65536);
        let salt_text = salt.to_string();
        let sign = sign_request(&credentials.app_id, text, salt, &credentials.app_key);

        let params = [
            ("appid", credentials.app_id.as_str()),
            ("q", text),
            ("from", "auto"),
            ("to", self.target_lang.as_str()),
            ("salt", salt_text.as_str()),
            ("sign", sign.as_str()),
        ];

        let response = self
            .client
            .post(self.endpoint.clone())
            .form(&params)
            .send()
            .await
            .context("translate request failed")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("translate endpoint returned error status {status}");
        }

        let parsed = response
            .json::<TranslateResponse>()
            .await
            .context("failed to deserialize translate response")?;

        Ok(parsed
            .trans_result
            .into_iter()
            .next()
            .map(|segment| segment.dst)
            .unwrap_or_default())
    }
}

/// レガシー署名を計算する: `md5(appid + query + salt + appkey)` の小文字16進。
fn sign_request(app_id: &str, query: &str, salt: u32, app_key: &str) -> String {
    let digest = md5::compute(format!("{app_id}{query}{salt}{app_key}"));
    format!("{digest:x}")
}
