/// 日次スナップショットの永続化。
///
/// ISO日付 → チャンネルキー → カテゴリID → 件数、という入れ子のYAML文書を
/// 1ファイルに保持します。既存日付のエントリは決して上書きされず、
/// 日付単位の追記のみを許します。
use std::{collections::BTreeMap, fs, path::PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// 1カテゴリの日次件数。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySnapshot {
    pub category_title: String,
    pub resolved_total: u64,
    pub unresolved_total: u64,
}

impl CategorySnapshot {
    /// 解決済み・未解決の合算。
    #[must_use]
    pub fn total(&self) -> u64 {
        self.resolved_total + self.unresolved_total
    }
}

/// チャンネル1つ分のカテゴリ別件数。
pub type ChannelSnapshot = BTreeMap<u32, CategorySnapshot>;

/// 1日分のチャンネル別スナップショット。
pub type DaySnapshot = BTreeMap<String, ChannelSnapshot>;

/// 追記専用のスナップショットストア。
#[derive(Debug)]
pub struct SnapshotStore {
    path: PathBuf,
    days: BTreeMap<NaiveDate, DaySnapshot>,
}

impl SnapshotStore {
    /// ストアを開く。ファイルが存在しない場合は空のストアとして扱う。
    ///
    /// # Errors
    /// ファイルの読み込みまたはYAMLのパースに失敗した場合はエラーを返す。
    pub fn open(path: PathBuf) -> Result<Self> {
        let days = if path.exists() {
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("failed to read snapshot file {}", path.display()))?;
            serde_yaml::from_str(&raw)
                .with_context(|| format!("failed to parse snapshot file {}", path.display()))?
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, days })
    }

    /// 指定日付のエントリが既に存在するか。
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.days.contains_key(&date)
    }

    /// 指定日付のスナップショットを参照する。
    #[must_use]
    pub fn day(&self, date: NaiveDate) -> Option<&DaySnapshot> {
        self.days.get(&date)
    }

    /// 記録済みの日付数。
    #[must_use]
    pub fn len(&self) -> usize {
        self.days.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// 1日分のスナップショットを追記する。
    ///
    /// 既に同じ日付が存在する場合は何も書かず `false` を返す
    /// （既存エントリは保持される）。追記した場合は `true`。
    ///
    /// # Errors
    /// ファイルへの書き出しに失敗した場合はエラーを返す。
    pub fn record(&mut self, date: NaiveDate, day: DaySnapshot) -> Result<bool> {
        if self.days.contains_key(&date) {
            debug!(%date, "snapshot date already recorded, keeping existing entry");
            return Ok(false);
        }
        self.days.insert(date, day);
        self.persist()?;
        Ok(true)
    }

    /// 最新2日付のスナップショットを (最新, その前) の順で返す。
    /// 2日付未満の場合は `None`。
    #[must_use]
    pub fn latest_two(&self) -> Option<((NaiveDate, &DaySnapshot), (NaiveDate, &DaySnapshot))> {
        let mut iter = self.days.iter().rev();
        let (latest_date, latest) = iter.next()?;
        let (prior_date, prior) = iter.next()?;
        Some(((*latest_date, latest), (*prior_date, prior)))
    }

    /// 一時ファイルへ書いてからリネームする。
    fn persist(&self) -> Result<()> {
        let yaml = serde_yaml::to_string(&self.days).context("failed to serialize snapshots")?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("failed to create snapshot directory {}", parent.display())
                })?;
            }
        }
        let tmp = self.path.with_extension("yaml.tmp");
        fs::write(&tmp, yaml)
            .with_context(|| format!("failed to write snapshot file {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("failed to replace snapshot file {}", self.path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_day(resolved: u64, unresolved: u64) -> DaySnapshot {
        let mut channel = ChannelSnapshot::new();
        channel.insert(
            25,
            CategorySnapshot {
                category_title: "product".to_string(),
                resolved_total: resolved,
                unresolved_total: unresolved,
            },
        );
        let mut day = DaySnapshot::new();
        day.insert("android".to_string(), channel);
        day
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().expect("valid date")
    }

    #[test]
    fn record_appends_and_survives_reload() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("snapshots.yaml");

        let mut store = SnapshotStore::open(path.clone()).expect("open empty");
        assert!(store.is_empty());
        assert!(store.record(date("2026-08-04"), sample_day(4, 9)).expect("record"));

        let reloaded = SnapshotStore::open(path).expect("reload");
        assert_eq!(reloaded.len(), 1);
        let day = reloaded.day(date("2026-08-04")).expect("day exists");
        assert_eq!(day["android"][&25].resolved_total, 4);
        assert_eq!(day["android"][&25].unresolved_total, 9);
        assert_eq!(day["android"][&25].total(), 13);
    }

    #[test]
    fn record_never_overwrites_existing_date() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("snapshots.yaml");

        let mut store = SnapshotStore::open(path.clone()).expect("open");
        assert!(store.record(date("2026-08-04"), sample_day(1, 2)).expect("first"));
        assert!(!store.record(date("2026-08-04"), sample_day(7, 7)).expect("second"));

        let reloaded = SnapshotStore::open(path).expect("reload");
        let day = reloaded.day(date("2026-08-04")).expect("day exists");
        assert_eq!(day["android"][&25].resolved_total, 1);
        assert_eq!(day["android"][&25].unresolved_total, 2);
    }

    #[test]
    fn latest_two_returns_most_recent_dates_in_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("snapshots.yaml");

        let mut store = SnapshotStore::open(path).expect("open");
        assert!(store.latest_two().is_none());

        store.record(date("2026-08-02"), sample_day(1, 1)).expect("rec");
        assert!(store.latest_two().is_none());

        store.record(date("2026-08-04"), sample_day(3, 3)).expect("rec");
        store.record(date("2026-08-03"), sample_day(2, 2)).expect("rec");

        let ((latest_date, latest), (prior_date, _)) = store.latest_two().expect("pair");
        assert_eq!(latest_date, date("2026-08-04"));
        assert_eq!(prior_date, date("2026-08-03"));
        assert_eq!(latest["android"][&25].resolved_total, 3);
    }

    #[test]
    fn creates_parent_directory_on_first_write() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested/deeper/snapshots.yaml");

        let mut store = SnapshotStore::open(path.clone()).expect("open");
        assert!(store.record(date("2026-08-04"), sample_day(0, 5)).expect("record"));
        assert!(path.exists());
    }
}
