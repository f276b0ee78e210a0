/// 時刻ゲーティング表。
///
/// 毎正時のティックごとに、その時刻に実行すべきジョブの一覧を返す。
/// 元々はスクリプトごとのcron起動で表現されていたゲーティングを
/// 1つのデータ駆動の表に集約したもの。
use chrono::{DateTime, Datelike, FixedOffset, Timelike, Weekday};

/// スケジュール対象のジョブ種別。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Job {
    /// 直近1時間のダイジェスト（9時〜23時）。
    HourlyDigest,
    /// 朝8時の夜間まとめ（直近8時間、空でも一言通知）。
    BackfillDigest,
    /// 木曜15時の週次サマリー。
    WeeklySummary,
    /// 毎月1日10時の月次サマリー。
    MonthlySummary,
    /// 日次スナップショットの記録と前日比レポート。
    DailySnapshot,
}

impl Job {
    /// ログ・エラーレポート用のラベル。
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::HourlyDigest => "hourly_digest",
            Self::BackfillDigest => "backfill_digest",
            Self::WeeklySummary => "weekly_summary",
            Self::MonthlySummary => "monthly_summary",
            Self::DailySnapshot => "daily_snapshot",
        }
    }
}

/// 指定ローカル時刻に実行するジョブ一覧を返す。
#[must_use]
pub fn plan_for(now: DateTime<FixedOffset>, snapshot_hour: u32) -> Vec<Job> {
    let hour = now.hour();
    let mut jobs = Vec::new();

    if now.weekday() == Weekday::Thu && hour == 15 {
        jobs.push(Job::WeeklySummary);
    }
    if now.day() == 1 && hour == 10 {
        jobs.push(Job::MonthlySummary);
    }
    if hour == snapshot_hour {
        jobs.push(Job::DailySnapshot);
    }
    if (9..=23).contains(&hour) {
        jobs.push(Job::HourlyDigest);
    } else if hour == 8 {
        jobs.push(Job::BackfillDigest);
    }

    jobs
}
