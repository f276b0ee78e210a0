/// CMS向け共通ヘッダーの構築ヘルパー。
///
/// 管理APIはブラウザ相当のUser-Agentを要求し、認証は `token` ヘッダーで行う。
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};

pub(crate) const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36";

pub(crate) const TOKEN_HEADER: &str = "token";

/// User-Agentのみの既定ヘッダーマップを構築する。
pub(crate) fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    headers
}

/// 既定ヘッダーに認証トークンを加えたヘッダーマップを構築する。
///
/// トークンがヘッダー値として不正な場合は認証ヘッダーを付けずに返す
/// （呼び出しはサーバー側で401として観測される）。
pub(crate) fn with_token(token: &str) -> HeaderMap {
    let mut headers = default_headers();
    if let Ok(value) = HeaderValue::from_str(token) {
        headers.insert(HeaderName::from_static(TOKEN_HEADER), value);
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_headers_carry_browser_user_agent() {
        let headers = default_headers();
        assert_eq!(
            headers.get(USER_AGENT).and_then(|v| v.to_str().ok()),
            Some(BROWSER_USER_AGENT)
        );
    }

    #[test]
    fn with_token_adds_token_header() {
        let headers = with_token("tok-123");
        assert_eq!(
            headers.get(TOKEN_HEADER).and_then(|v| v.to_str().ok()),
            Some("tok-123")
        );
        assert_eq!(headers.len(), 2);
    }

    #[test]
    fn with_token_skips_invalid_header_value() {
        let headers = with_token("bad\nvalue");
        assert!(headers.get(TOKEN_HEADER).is_none());
    }
}
