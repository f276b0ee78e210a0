/// CMS反映APIのワイヤ型。
///
/// すべてのエンドポイントは `{ code, msg, data }` エンベロープでペイロードを包みます。
/// `data` が欠落・null の場合は呼び出し側がデフォルト値へ縮退します。
use serde::{Deserialize, Serialize};

/// CMS応答の共通エンベロープ。
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default, alias = "message")]
    pub msg: Option<String>,
    #[serde(default)]
    pub data: Option<T>,
}

impl<T> ApiEnvelope<T> {
    /// ペイロードを取り出す。欠落時は `None`。
    pub fn into_data(self) -> Option<T> {
        self.data
    }
}

/// フィードバックの処理状態。
///
/// CMSは 0=未処理 / 1=処理済み / 2=無視 の数値コードを使用します。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackStatus {
    Unresolved,
    Resolved,
    Ignored,
}

impl FeedbackStatus {
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::Unresolved => 0,
            Self::Resolved => 1,
            Self::Ignored => 2,
        }
    }
}

/// フィードバック一覧取得のクエリ本体。
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackQuery {
    pub types: Vec<u32>,
    pub start_date: String,
    pub end_date: String,
    pub page: u32,
    pub size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_type: Option<String>,
}

impl FeedbackQuery {
    /// ページ番号だけ差し替えたコピーを返す。
    #[must_use]
    pub fn at_page(&self, page: u32) -> Self {
        let mut query = self.clone();
        query.page = page;
        query
    }

    /// `totalElements` のみ必要な件数クエリへ変換する。
    #[must_use]
    pub fn as_count(&self) -> Self {
        let mut query = self.clone();
        query.page = 0;
        query.size = 1;
        query
    }
}

/// ページング付きフィードバック一覧。
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackPage {
    #[serde(default)]
    pub content: Vec<FeedbackItem>,
    #[serde(default)]
    pub total_elements: u64,
}

/// フィードバック一覧の1行。
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackItem {
    pub id: i64,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default)]
    pub app_name: Option<String>,
    #[serde(default)]
    pub app_version: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub create_time: Option<String>,
    #[serde(default)]
    pub status: Option<u8>,
}

/// 詳細エンドポイントの応答。一覧行で空のフィールドを補完する。
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackDetail {
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub img_url: Option<String>,
}
