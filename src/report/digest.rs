/// ダイジェストカードのMarkdownレンダリング。
///
/// 項目ラベルと並び順は運用チャンネルの既存カード形式に合わせてあり、
/// 説明文のみ太字で強調します。
use crate::{
    classification::platform::Platform,
    schema::cms::{FeedbackDetail, FeedbackItem},
};

/// 付加情報を解決済みのフィードバック1件。
#[derive(Debug, Clone)]
pub struct EnrichedFeedback {
    pub item: FeedbackItem,
    pub detail: FeedbackDetail,
    pub translated: String,
    pub platform: Platform,
}

/// プラットフォーム別に分割されたダイジェスト本文。
#[derive(Debug, Clone, Default)]
pub struct DigestBody {
    pub android: String,
    pub ios: String,
}

impl DigestBody {
    /// 1カテゴリ分の項目を本文へ追記する。
    ///
    /// カテゴリ見出しは各プラットフォームの最初の項目の直前に一度だけ出す。
    pub fn append_category(&mut self, title: &str, items: &[EnrichedFeedback]) {
        let mut android_header_pending = true;
        let mut ios_header_pending = true;

        for entry in items {
            let (buffer, header_pending) = match entry.platform {
                Platform::Android => (&mut self.android, &mut android_header_pending),
                Platform::Ios => (&mut self.ios, &mut ios_header_pending),
            };
            if *header_pending {
                buffer.push_str(&category_header(title, items.len()));
                *header_pending = false;
            }
            buffer.push_str(&render_item(entry));
            buffer.push_str("\n\n");
        }
    }

    #[must_use]
    pub fn for_platform(&self, platform: Platform) -> &str {
        match platform {
            Platform::Android => &self.android,
            Platform::Ios => &self.ios,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.android.is_empty() && self.ios.is_empty()
    }
}

fn category_header(title: &str, count: usize) -> String {
    format!("**{title}**: {count} feedback item(s) in this window ----------------------\n")
}

/// 1件分の行を描画する。
#[must_use]
pub fn render_item(entry: &EnrichedFeedback) -> String {
    let item = &entry.item;
    let detail = &entry.detail;

    let user_id = item
        .user_id
        .map_or_else(|| "None".to_string(), |id| id.to_string());
    let region = item
        .region
        .as_deref()
        .or(detail.region.as_deref())
        .unwrap_or_default();
    let ip_address = item
        .ip_address
        .as_deref()
        .or(detail.ip_address.as_deref())
        .unwrap_or_default();
    let question = item.question.as_deref().unwrap_or_default();

    let lines = [
        format!("User ID: {user_id}"),
        format!("Region: {region}"),
        format!("IP: {ip_address}"),
        format!("Channel: {}", item.app_name.as_deref().unwrap_or_default()),
        format!(
            "**Description**: {}",
            format_description(question, &entry.translated)
        ),
        format!(
            "Device ID: {}",
            item.device_id.as_deref().unwrap_or_default()
        ),
        format!(
            "App version: {}",
            item.app_version.as_deref().unwrap_or_default()
        ),
        format!(
            "Submitted at: {}",
            item.create_time.as_deref().unwrap_or_default()
        ),
        format!(
            "Screenshots: {}",
            format_images(detail.img_url.as_deref().unwrap_or_default())
        ),
    ];
    lines.join("\n")
}

/// 原文と訳文を併記した説明ブロックを描画する。原文が空なら空文字。
#[must_use]
pub fn format_description(original: &str, translated: &str) -> String {
    if original.is_empty() {
        return String::new();
    }
    format!("\n**Original**: {original}\n**Translated**: {translated}")
}

/// JSONリスト形式のままのスクリーンショットURL文字列を1行1URLへ整形する。
#[must_use]
pub fn format_images(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    raw.trim_matches(|c| c == '[' || c == ']')
        .replace('"', "")
        .replace(',', "\n")
}
