/// カテゴリ別件数の収集。
///
/// カテゴリごとに独立した件数クエリをセマフォで制限しながら並行発行し、
/// 失敗したカテゴリは警告ログの上で0件として扱います（部分成功）。
use std::{collections::BTreeMap, num::NonZeroUsize, sync::Arc};

use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::warn;

use crate::{
    clients::cms::CmsClient,
    config::Category,
    schema::cms::{FeedbackQuery, FeedbackStatus},
};

use super::window::TimeRange;

/// 1カテゴリの件数。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryCount {
    pub id: u32,
    pub title: String,
    pub total: u64,
}

/// 期間内のカテゴリ別件数と総計。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryCounts {
    pub by_category: BTreeMap<u32, CategoryCount>,
    pub total: u64,
}

impl CategoryCounts {
    pub fn insert(&mut self, count: CategoryCount) {
        self.total += count.total;
        self.by_category.insert(count.id, count);
    }

    #[must_use]
    pub fn get(&self, id: u32) -> Option<&CategoryCount> {
        self.by_category.get(&id)
    }
}

/// 件数クエリの共通条件。
#[derive(Debug, Clone)]
pub struct CountFilter {
    pub status: Option<FeedbackStatus>,
    pub client_type: Option<String>,
}

impl CountFilter {
    /// 絞り込みなし。
    #[must_use]
    pub fn none() -> Self {
        Self {
            status: None,
            client_type: None,
        }
    }
}

/// カテゴリごとの件数を並行に収集する。
///
/// 個々のクエリの失敗は0件へ縮退し、収集全体は常に成功します。
pub async fn collect_counts(
    cms: &Arc<CmsClient>,
    token: &str,
    categories: &[Category],
    range: &TimeRange,
    filter: &CountFilter,
    concurrency: NonZeroUsize,
) -> CategoryCounts {
    let semaphore = Arc::new(Semaphore::new(concurrency.get()));
    let (start_date, end_date) = range.query_bounds();

    let mut tasks = Vec::with_capacity(categories.len());
    for category in categories {
        let cms = Arc::clone(cms);
        let semaphore = Arc::clone(&semaphore);
        let token = token.to_string();
        let category = category.clone();
        let query = FeedbackQuery {
            types: vec![category.id],
            start_date: start_date.clone(),
            end_date: end_date.clone(),
            page: 0,
            size: 1,
            status: filter.status.map(FeedbackStatus::code),
            client_type: filter.client_type.clone(),
        };

        tasks.push(tokio::spawn(async move {
            let Ok(_permit) = semaphore.acquire_owned().await else {
                return CategoryCount {
                    id: category.id,
                    title: category.title,
                    total: 0,
                };
            };
            match cms.count_feedback(&token, &query).await {
                Ok(total) => CategoryCount {
                    id: category.id,
                    title: category.title,
                    total,
                },
                Err(error) => {
                    warn!(
                        category = category.id,
                        error = %error,
                        "feedback count failed, defaulting to zero"
                    );
                    CategoryCount {
                        id: category.id,
                        title: category.title,
                        total: 0,
                    }
                }
            }
        }));
    }

    let mut counts = CategoryCounts::default();
    for result in join_all(tasks).await {
        match result {
            Ok(count) => counts.insert(count),
            Err(error) => warn!(error = %error, "count task panicked"),
        }
    }
    counts
}
