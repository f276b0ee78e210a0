/// デバイスIDからの配信プラットフォーム分類。
///
/// iOSのIDFVは大文字16進で報告されるため、デバイスIDに
/// ASCII大文字が1文字でも含まれていればiOS、それ以外はAndroidと判定します。

/// 配信プラットフォーム。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Android,
    Ios,
}

impl Platform {
    /// チャンネルキー（Webhookルーティングに使用）。
    #[must_use]
    pub fn channel_key(self) -> &'static str {
        match self {
            Self::Android => "android",
            Self::Ios => "ios",
        }
    }

    /// 表示ラベル。
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Android => "Android",
            Self::Ios => "iOS",
        }
    }
}

/// デバイスIDをプラットフォームへ分類する。
#[must_use]
pub fn classify_device_id(device_id: &str) -> Platform {
    if device_id.chars().any(|c| c.is_ascii_uppercase()) {
        Platform::Ios
    } else {
        Platform::Android
    }
}
