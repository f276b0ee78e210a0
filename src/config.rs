use std::{env, num::NonZeroUsize, path::PathBuf, time::Duration};

use chrono::FixedOffset;
use thiserror::Error;

#[cfg(test)]
use once_cell::sync::Lazy;
#[cfg(test)]
pub(crate) static ENV_MUTEX: Lazy<std::sync::Mutex<()>> = Lazy::new(|| std::sync::Mutex::new(()));

/// フィードバックカテゴリ（CMSの分類ID + 表示タイトル）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: u32,
    pub title: String,
}

/// 通知チャンネル（アプリ/クライアント群とWebhook URLの組）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub key: String,
    pub webhook_url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    cms_base_url: String,
    cms_username: String,
    cms_password: String,
    cms_connect_timeout: Duration,
    cms_total_timeout: Duration,
    translate_endpoint: String,
    translate_app_id: Option<String>,
    translate_app_key: Option<String>,
    translate_target_lang: String,
    ops_webhook_url: String,
    channels: Vec<Channel>,
    categories: Vec<Category>,
    snapshot_path: PathBuf,
    snapshot_hour: u32,
    tz_offset_hours: i32,
    fetch_concurrency: NonZeroUsize,
    page_size: u32,
    run_once: bool,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable: {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {source}")]
    Invalid {
        name: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

const DEFAULT_CATEGORIES: &str = "25:product,26:smart_tv,27:pc,29:vip,30:subtitles,\
31:account,32:minor_mode,33:watch_party,34:contact,35:feature_guide,36:other";

impl Config {
    /// 環境変数からワーカーの設定値を読み込み、検証する。
    ///
    /// # Errors
    /// 必須の環境変数（CMS接続情報・Webhook URL）が未設定、
    /// もしくは数値等のパースに失敗した場合は [`ConfigError`] を返す。
    pub fn from_env() -> Result<Self, ConfigError> {
        let cms_base_url = env_var("CMS_BASE_URL")?;
        let cms_username = env_var("CMS_USERNAME")?;
        let cms_password = env_var("CMS_PASSWORD")?;
        let cms_connect_timeout = parse_duration_ms("CMS_CONNECT_TIMEOUT_MS", 3000)?;
        let cms_total_timeout = parse_duration_ms("CMS_TOTAL_TIMEOUT_MS", 30000)?;

        let translate_endpoint = env::var("TRANSLATE_ENDPOINT").unwrap_or_else(|_| {
            "https://fanyi-api.baidu.com/api/trans/vip/translate".to_string()
        });
        let translate_app_id = env::var("TRANSLATE_APP_ID").ok();
        let translate_app_key = env::var("TRANSLATE_APP_KEY").ok();
        let translate_target_lang =
            env::var("TRANSLATE_TARGET_LANG").unwrap_or_else(|_| "zh".to_string());

        let ops_webhook_url = env_var("FEEDBACK_OPS_WEBHOOK_URL")?;
        let channels = parse_channels("FEEDBACK_CHANNELS", "android,ios")?;
        let categories = parse_categories("FEEDBACK_CATEGORIES", DEFAULT_CATEGORIES)?;

        let snapshot_path = PathBuf::from(
            env::var("FEEDBACK_SNAPSHOT_PATH")
                .unwrap_or_else(|_| "data/feedback_snapshots.yaml".to_string()),
        );
        let snapshot_hour = parse_hour("FEEDBACK_SNAPSHOT_HOUR", 9)?;
        let tz_offset_hours = parse_tz_offset("FEEDBACK_TZ_OFFSET_HOURS", 8)?;
        let fetch_concurrency = parse_non_zero_usize("FEEDBACK_FETCH_CONCURRENCY", 4)?;
        let page_size = parse_u32("FEEDBACK_PAGE_SIZE", 200)?;
        let run_once = parse_bool("FEEDBACK_RUN_ONCE", false)?;

        Ok(Self {
            cms_base_url,
            cms_username,
            cms_password,
            cms_connect_timeout,
            cms_total_timeout,
            translate_endpoint,
            translate_app_id,
            translate_app_key,
            translate_target_lang,
            ops_webhook_url,
            channels,
            categories,
            snapshot_path,
            snapshot_hour,
            tz_offset_hours,
            fetch_concurrency,
            page_size,
            run_once,
        })
    }

    #[must_use]
    pub fn cms_base_url(&self) -> &str {
        &self.cms_base_url
    }

    #[must_use]
    pub fn cms_username(&self) -> &str {
        &self.cms_username
    }

    #[must_use]
    pub fn cms_password(&self) -> &str {
        &self.cms_password
    }

    #[must_use]
    pub fn cms_connect_timeout(&self) -> Duration {
        self.cms_connect_timeout
    }

    #[must_use]
    pub fn cms_total_timeout(&self) -> Duration {
        self.cms_total_timeout
    }

    #[must_use]
    pub fn translate_endpoint(&self) -> &str {
        &self.translate_endpoint
    }

    #[must_use]
    pub fn translate_app_id(&self) -> Option<&str> {
        self.translate_app_id.as_deref()
    }

    #[must_use]
    pub fn translate_app_key(&self) -> Option<&str> {
        self.translate_app_key.as_deref()
    }

    #[must_use]
    pub fn translate_target_lang(&self) -> &str {
        &self.translate_target_lang
    }

    #[must_use]
    pub fn ops_webhook_url(&self) -> &str {
        &self.ops_webhook_url
    }

    #[must_use]
    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    #[must_use]
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    #[must_use]
    pub fn snapshot_path(&self) -> &PathBuf {
        &self.snapshot_path
    }

    #[must_use]
    pub fn snapshot_hour(&self) -> u32 {
        self.snapshot_hour
    }

    /// レポートに使う固定オフセットのタイムゾーン。
    ///
    /// オフセットは `from_env` で ±23 時間に検証済み。
    #[must_use]
    pub fn report_tz(&self) -> FixedOffset {
        FixedOffset::east_opt(self.tz_offset_hours * 3600).expect("validated offset")
    }

    #[must_use]
    pub fn fetch_concurrency(&self) -> NonZeroUsize {
        self.fetch_concurrency
    }

    #[must_use]
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    #[must_use]
    pub fn run_once(&self) -> bool {
        self.run_once
    }
}

fn env_var(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::Missing(name))
}

fn parse_duration_ms(name: &'static str, default_ms: u64) -> Result<Duration, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default_ms.to_string());
    let ms = raw.parse::<u64>().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })?;
    Ok(Duration::from_millis(ms))
}

fn parse_non_zero_usize(name: &'static str, default: usize) -> Result<NonZeroUsize, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    let parsed = raw.parse::<usize>().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })?;
    NonZeroUsize::new(parsed).ok_or_else(|| ConfigError::Invalid {
        name,
        source: anyhow::anyhow!("must be greater than zero"),
    })
}

fn parse_u32(name: &'static str, default: u32) -> Result<u32, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.parse::<u32>().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })
}

fn parse_hour(name: &'static str, default: u32) -> Result<u32, ConfigError> {
    let hour = parse_u32(name, default)?;
    if hour > 23 {
        return Err(ConfigError::Invalid {
            name,
            source: anyhow::anyhow!("hour must be between 0 and 23"),
        });
    }
    Ok(hour)
}

fn parse_tz_offset(name: &'static str, default: i32) -> Result<i32, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    let offset = raw.parse::<i32>().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })?;
    if !(-23..=23).contains(&offset) {
        return Err(ConfigError::Invalid {
            name,
            source: anyhow::anyhow!("offset must be between -23 and 23 hours"),
        });
    }
    Ok(offset)
}

fn parse_bool(name: &'static str, default: bool) -> Result<bool, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    match raw.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            name,
            source: anyhow::anyhow!("invalid boolean value: {raw}"),
        }),
    }
}

/// `id:title` CSVをカテゴリ一覧へパースする。
fn parse_categories(name: &'static str, default: &str) -> Result<Vec<Category>, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    let mut categories = Vec::new();
    for pair in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let (id, title) = pair.split_once(':').ok_or_else(|| ConfigError::Invalid {
            name,
            source: anyhow::anyhow!("expected id:title pair, got {pair}"),
        })?;
        let id = id.trim().parse::<u32>().map_err(|error| ConfigError::Invalid {
            name,
            source: anyhow::Error::new(error),
        })?;
        categories.push(Category {
            id,
            title: title.trim().to_string(),
        });
    }
    if categories.is_empty() {
        return Err(ConfigError::Invalid {
            name,
            source: anyhow::anyhow!("at least one category is required"),
        });
    }
    Ok(categories)
}

/// チャンネルキーのCSVを読み、各キーの `FEEDBACK_WEBHOOK_URL_<KEY>` を解決する。
fn parse_channels(name: &'static str, default: &str) -> Result<Vec<Channel>, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    let mut channels = Vec::new();
    for key in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let url_var = format!("FEEDBACK_WEBHOOK_URL_{}", key.to_uppercase());
        let webhook_url = env::var(&url_var).map_err(|_| ConfigError::Invalid {
            name,
            source: anyhow::anyhow!("missing webhook URL variable {url_var} for channel {key}"),
        })?;
        channels.push(Channel {
            key: key.to_string(),
            webhook_url,
        });
    }
    if channels.is_empty() {
        return Err(ConfigError::Invalid {
            name,
            source: anyhow::anyhow!("at least one channel is required"),
        });
    }
    Ok(channels)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_env(name: &str, value: &str) {
        // SAFETY: tests run sequentially and assign valid UTF-8 values.
        unsafe {
            env::set_var(name, value);
        }
    }

    fn remove_env(name: &str) {
        // SAFETY: tests run sequentially and clean up deterministic keys.
        unsafe {
            env::remove_var(name);
        }
    }

    fn reset_env() {
        remove_env("CMS_BASE_URL");
        remove_env("CMS_USERNAME");
        remove_env("CMS_PASSWORD");
        remove_env("CMS_CONNECT_TIMEOUT_MS");
        remove_env("CMS_TOTAL_TIMEOUT_MS");
        remove_env("TRANSLATE_ENDPOINT");
        remove_env("TRANSLATE_APP_ID");
        remove_env("TRANSLATE_APP_KEY");
        remove_env("TRANSLATE_TARGET_LANG");
        remove_env("FEEDBACK_OPS_WEBHOOK_URL");
        remove_env("FEEDBACK_CHANNELS");
        remove_env("FEEDBACK_WEBHOOK_URL_ANDROID");
        remove_env("FEEDBACK_WEBHOOK_URL_IOS");
        remove_env("FEEDBACK_WEBHOOK_URL_WEB");
        remove_env("FEEDBACK_CATEGORIES");
        remove_env("FEEDBACK_SNAPSHOT_PATH");
        remove_env("FEEDBACK_SNAPSHOT_HOUR");
        remove_env("FEEDBACK_TZ_OFFSET_HOURS");
        remove_env("FEEDBACK_FETCH_CONCURRENCY");
        remove_env("FEEDBACK_PAGE_SIZE");
        remove_env("FEEDBACK_RUN_ONCE");
    }

    fn set_required() {
        set_env("CMS_BASE_URL", "https://admin-api.example.com/");
        set_env("CMS_USERNAME", "reporter");
        set_env("CMS_PASSWORD", "secret");
        set_env("FEEDBACK_OPS_WEBHOOK_URL", "https://hooks.example.com/ops");
        set_env(
            "FEEDBACK_WEBHOOK_URL_ANDROID",
            "https://hooks.example.com/android",
        );
        set_env("FEEDBACK_WEBHOOK_URL_IOS", "https://hooks.example.com/ios");
    }

    #[test]
    fn from_env_uses_defaults_when_optional_missing() {
        let _lock = ENV_MUTEX.lock().expect("env mutex");
        reset_env();
        set_required();

        let config = Config::from_env().expect("config should load");

        assert_eq!(config.cms_base_url(), "https://admin-api.example.com/");
        assert_eq!(config.cms_connect_timeout(), Duration::from_millis(3000));
        assert_eq!(config.cms_total_timeout(), Duration::from_millis(30000));
        assert_eq!(config.translate_target_lang(), "zh");
        assert!(config.translate_app_id().is_none());
        assert_eq!(config.channels().len(), 2);
        assert_eq!(config.channels()[0].key, "android");
        assert_eq!(
            config.channels()[1].webhook_url,
            "https://hooks.example.com/ios"
        );
        assert_eq!(config.categories().len(), 11);
        assert_eq!(config.categories()[0].id, 25);
        assert_eq!(config.categories()[0].title, "product");
        assert_eq!(
            config.snapshot_path(),
            &PathBuf::from("data/feedback_snapshots.yaml")
        );
        assert_eq!(config.snapshot_hour(), 9);
        assert_eq!(config.report_tz().local_minus_utc(), 8 * 3600);
        assert_eq!(config.fetch_concurrency().get(), 4);
        assert_eq!(config.page_size(), 200);
        assert!(!config.run_once());
    }

    #[test]
    fn from_env_overrides_values() {
        let _lock = ENV_MUTEX.lock().expect("env mutex");
        reset_env();
        set_required();
        set_env("CMS_CONNECT_TIMEOUT_MS", "5000");
        set_env("FEEDBACK_CHANNELS", "web");
        set_env("FEEDBACK_WEBHOOK_URL_WEB", "https://hooks.example.com/web");
        set_env("FEEDBACK_CATEGORIES", "1:bug, 2:billing");
        set_env("FEEDBACK_SNAPSHOT_HOUR", "7");
        set_env("FEEDBACK_TZ_OFFSET_HOURS", "-5");
        set_env("FEEDBACK_FETCH_CONCURRENCY", "8");
        set_env("FEEDBACK_PAGE_SIZE", "50");
        set_env("FEEDBACK_RUN_ONCE", "true");

        let config = Config::from_env().expect("config should load");

        assert_eq!(config.cms_connect_timeout(), Duration::from_millis(5000));
        assert_eq!(config.channels().len(), 1);
        assert_eq!(config.channels()[0].key, "web");
        assert_eq!(
            config.categories(),
            &[
                Category {
                    id: 1,
                    title: "bug".to_string()
                },
                Category {
                    id: 2,
                    title: "billing".to_string()
                }
            ]
        );
        assert_eq!(config.snapshot_hour(), 7);
        assert_eq!(config.report_tz().local_minus_utc(), -5 * 3600);
        assert_eq!(config.fetch_concurrency().get(), 8);
        assert_eq!(config.page_size(), 50);
        assert!(config.run_once());
    }

    #[test]
    fn from_env_errors_when_credentials_missing() {
        let _lock = ENV_MUTEX.lock().expect("env mutex");
        reset_env();
        set_env("CMS_BASE_URL", "https://admin-api.example.com/");

        let error = Config::from_env().expect_err("missing username should fail");

        assert!(matches!(error, ConfigError::Missing("CMS_USERNAME")));
    }

    #[test]
    fn from_env_errors_when_channel_webhook_missing() {
        let _lock = ENV_MUTEX.lock().expect("env mutex");
        reset_env();
        set_required();
        set_env("FEEDBACK_CHANNELS", "android,web");

        let error = Config::from_env().expect_err("missing web webhook should fail");

        assert!(matches!(
            error,
            ConfigError::Invalid {
                name: "FEEDBACK_CHANNELS",
                ..
            }
        ));
    }

    #[test]
    fn from_env_rejects_malformed_category_pair() {
        let _lock = ENV_MUTEX.lock().expect("env mutex");
        reset_env();
        set_required();
        set_env("FEEDBACK_CATEGORIES", "25-product");

        let error = Config::from_env().expect_err("malformed pair should fail");

        assert!(matches!(
            error,
            ConfigError::Invalid {
                name: "FEEDBACK_CATEGORIES",
                ..
            }
        ));
    }

    #[test]
    fn from_env_rejects_out_of_range_snapshot_hour() {
        let _lock = ENV_MUTEX.lock().expect("env mutex");
        reset_env();
        set_required();
        set_env("FEEDBACK_SNAPSHOT_HOUR", "24");

        let error = Config::from_env().expect_err("hour 24 should fail");

        assert!(matches!(
            error,
            ConfigError::Invalid {
                name: "FEEDBACK_SNAPSHOT_HOUR",
                ..
            }
        ));
    }
}
