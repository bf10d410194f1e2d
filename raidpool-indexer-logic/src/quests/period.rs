use chrono::NaiveDateTime;
use entity::sea_orm_active_enums::ResetFrequency;

const DAY_SECS: i64 = 86_400;

/// Maps an event time onto the period a quest counter lives in. Counters in
/// different periods never interact, which is what makes daily and weekly
/// quests reset without any scheduled job.
pub fn period_index(frequency: &ResetFrequency, at: NaiveDateTime, current_season: i64) -> i64 {
    let secs = at.and_utc().timestamp();
    match frequency {
        ResetFrequency::Daily => secs.div_euclid(DAY_SECS),
        ResetFrequency::Weekly => secs.div_euclid(7 * DAY_SECS),
        ResetFrequency::Seasonal => current_season,
        ResetFrequency::OneTime => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn at(secs: i64) -> NaiveDateTime {
        chrono::DateTime::from_timestamp(secs, 0).unwrap().naive_utc()
    }

    #[test]
    fn daily_periods_change_at_utc_midnight() {
        let last_second = at(3 * DAY_SECS - 1);
        let midnight = at(3 * DAY_SECS);
        assert_eq!(period_index(&ResetFrequency::Daily, last_second, 1), 2);
        assert_eq!(period_index(&ResetFrequency::Daily, midnight, 1), 3);
    }

    #[test]
    fn weekly_periods_span_seven_days() {
        let day_one = at(DAY_SECS);
        let day_six = at(6 * DAY_SECS);
        let day_eight = at(8 * DAY_SECS);
        assert_eq!(
            period_index(&ResetFrequency::Weekly, day_one, 1),
            period_index(&ResetFrequency::Weekly, day_six, 1)
        );
        assert_ne!(
            period_index(&ResetFrequency::Weekly, day_one, 1),
            period_index(&ResetFrequency::Weekly, day_eight, 1)
        );
    }

    #[test]
    fn seasonal_follows_configuration_and_one_time_never_resets() {
        let now = at(1_700_000_000);
        assert_eq!(period_index(&ResetFrequency::Seasonal, now, 4), 4);
        assert_eq!(period_index(&ResetFrequency::OneTime, now, 4), 0);
    }
}
