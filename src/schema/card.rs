/// チャットWebhookへ送るインタラクティブカードのエンベロープ。
///
/// 固定形式のJSONカード（plain_textヘッダー + lark_md本文1要素）です。
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct CardMessage {
    pub msg_type: String,
    pub card: Card,
}

#[derive(Debug, Clone, Serialize)]
pub struct Card {
    pub header: CardHeader,
    pub elements: Vec<CardElement>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CardHeader {
    pub title: CardText,
}

#[derive(Debug, Clone, Serialize)]
pub struct CardElement {
    pub tag: String,
    pub text: CardText,
}

#[derive(Debug, Clone, Serialize)]
pub struct CardText {
    pub content: String,
    pub tag: String,
}

impl CardMessage {
    /// タイトルとMarkdown本文からカードを組み立てる。
    #[must_use]
    pub fn interactive(title: &str, body: &str) -> Self {
        Self {
            msg_type: "interactive".to_string(),
            card: Card {
                header: CardHeader {
                    title: CardText {
                        content: title.to_string(),
                        tag: "plain_text".to_string(),
                    },
                },
                elements: vec![CardElement {
                    tag: "div".to_string(),
                    text: CardText {
                        content: format!("### {title}\n\n{body}"),
                        tag: "lark_md".to_string(),
                    },
                }],
            },
        }
    }
}
