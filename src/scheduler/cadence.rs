use chrono::{DateTime, Duration, FixedOffset, LocalResult, NaiveTime, TimeZone, Timelike, Utc};

/// Ticks at the top of every hour in the report timezone.
///
/// The next run is always strictly in the future: firing exactly at the top
/// of an hour schedules the following hour, so a completed tick never
/// re-triggers itself.
#[derive(Debug, Clone)]
pub(crate) struct HourlyCadence {
    tz: FixedOffset,
}

impl HourlyCadence {
    pub(crate) fn new(tz: FixedOffset) -> Self {
        Self { tz }
    }

    pub(crate) fn next_run_from(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let localized_now = now.with_timezone(&self.tz);
        let truncated = NaiveTime::from_hms_opt(localized_now.hour(), 0, 0)
            .expect("hour taken from a valid timestamp");
        let next_local = localized_now.date_naive().and_time(truncated) + Duration::hours(1);

        match self.tz.from_local_datetime(&next_local) {
            LocalResult::Single(dt) => dt.with_timezone(&Utc),
            LocalResult::Ambiguous(first, _) => first.with_timezone(&Utc),
            LocalResult::None => unreachable!("fixed offset should not produce nonexistent times"),
        }
    }
}
