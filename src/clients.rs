pub mod cms;
pub(crate) mod headers;
pub mod translate;
pub mod webhook;

pub use cms::CmsClient;
pub use translate::TranslateClient;
pub use webhook::{Notifier, WebhookClient};
