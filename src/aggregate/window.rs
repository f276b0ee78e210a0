/// レポート対象期間の計算。
///
/// すべての期間はレポート用タイムゾーン（固定オフセット）のローカル時刻で
/// 計算し、CMSクエリには `%Y-%m-%d %H:%M:%S` 形式で渡します。
use chrono::{DateTime, Datelike, Duration, FixedOffset, LocalResult, Months, NaiveDate, TimeZone};

const QUERY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 開始・終了のローカル日時の組。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

impl TimeRange {
    /// CMSクエリ用の文字列表現（開始, 終了）。
    #[must_use]
    pub fn query_bounds(&self) -> (String, String) {
        (
            self.start.format(QUERY_FORMAT).to_string(),
            self.end.format(QUERY_FORMAT).to_string(),
        )
    }
}

/// 集計ウィンドウの種別。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportWindow {
    /// 直近Nの時間（時間帯ダイジェスト用）。
    Hours(u32),
    /// 直前の暦日1日分（スナップショット用）。
    Daily,
    /// 直近7日間。前期間は14日前〜8日前（元の週次集計の定義をそのまま踏襲）。
    Weekly,
    /// 当月1日から現在まで。前期間は前月同経過分。
    Monthly,
}

impl ReportWindow {
    /// 現期間の範囲を返す。
    #[must_use]
    pub fn current(self, now: DateTime<FixedOffset>) -> TimeRange {
        let tz = *now.offset();
        match self {
            Self::Hours(hours) => TimeRange {
                start: now - Duration::hours(i64::from(hours)),
                end: now,
            },
            Self::Daily => {
                let date = now.date_naive() - Duration::days(1);
                TimeRange {
                    start: at(tz, date, 0, 0, 0),
                    end: at(tz, date, 23, 59, 59),
                }
            }
            Self::Weekly => TimeRange {
                start: now - Duration::days(7),
                end: now,
            },
            Self::Monthly => {
                let first = now.date_naive().with_day(1).expect("day 1 is always valid");
                TimeRange {
                    start: at(tz, first, 0, 0, 0),
                    end: now,
                }
            }
        }
    }

    /// 比較対象となる前期間の範囲を返す。時間帯ウィンドウに前期間はない。
    #[must_use]
    pub fn prior(self, now: DateTime<FixedOffset>) -> Option<TimeRange> {
        let tz = *now.offset();
        match self {
            Self::Hours(_) => None,
            Self::Daily => {
                let date = now.date_naive() - Duration::days(2);
                Some(TimeRange {
                    start: at(tz, date, 0, 0, 0),
                    end: at(tz, date, 23, 59, 59),
                })
            }
            Self::Weekly => Some(TimeRange {
                start: now - Duration::days(14),
                end: now - Duration::days(8),
            }),
            Self::Monthly => {
                let first = now.date_naive().with_day(1).expect("day 1 is always valid");
                let prior_first = first.checked_sub_months(Months::new(1))?;
                let elapsed = now - at(tz, first, 0, 0, 0);
                let start = at(tz, prior_first, 0, 0, 0);
                Some(TimeRange {
                    start,
                    end: start + elapsed,
                })
            }
        }
    }
}

fn at(tz: FixedOffset, date: NaiveDate, hour: u32, min: u32, sec: u32) -> DateTime<FixedOffset> {
    let naive = date
        .and_hms_opt(hour, min, sec)
        .expect("valid wall clock time");
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(first, _) => first,
        LocalResult::None => unreachable!("fixed offset should not produce nonexistent times"),
    }
}
