//! Recurrence rules for events and reminders.
//!
//! Rules arrive as structured mappings and are range-checked field by field
//! and for by-rule/frequency combinations. Before a rule is written it is
//! also rendered to an RRULE and parsed by the rrule crate against the
//! item's start.

use chrono::{DateTime, Duration, Utc};
use rrule::RRuleSet;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{BridgeError, BridgeResult};
use crate::fields::{self, FieldMap};

const FIELD: &str = "recurrenceRule";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "daily" => Some(Frequency::Daily),
            "weekly" => Some(Frequency::Weekly),
            "monthly" => Some(Frequency::Monthly),
            "yearly" => Some(Frequency::Yearly),
            _ => None,
        }
    }

    fn as_rrule_str(self) -> &'static str {
        match self {
            Frequency::Daily => "DAILY",
            Frequency::Weekly => "WEEKLY",
            Frequency::Monthly => "MONTHLY",
            Frequency::Yearly => "YEARLY",
        }
    }
}

/// A weekday, optionally restricted to the n-th occurrence in the period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayOfWeek {
    /// 1 = Sunday ... 7 = Saturday.
    pub day_of_the_week: u8,
    /// 0 means every such weekday.
    #[serde(default)]
    pub week_number: i8,
}

const WEEKDAYS: [&str; 7] = ["SU", "MO", "TU", "WE", "TH", "FR", "SA"];

impl DayOfWeek {
    fn to_rrule_string(self) -> String {
        let day = WEEKDAYS[usize::from(self.day_of_the_week.clamp(1, 7) - 1)];
        if self.week_number == 0 {
            day.to_string()
        } else {
            format!("{}{}", self.week_number, day)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurrenceRule {
    pub frequency: Frequency,
    pub interval: u32,
    pub end_date: Option<DateTime<Utc>>,
    pub occurrence: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub days_of_the_week: Vec<DayOfWeek>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub days_of_the_month: Vec<i32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub months_of_the_year: Vec<i32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub weeks_of_the_year: Vec<i32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub days_of_the_year: Vec<i32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub set_positions: Vec<i32>,
}

impl RecurrenceRule {
    pub fn new(frequency: Frequency) -> Self {
        RecurrenceRule {
            frequency,
            interval: 1,
            end_date: None,
            occurrence: None,
            days_of_the_week: Vec::new(),
            days_of_the_month: Vec::new(),
            months_of_the_year: Vec::new(),
            weeks_of_the_year: Vec::new(),
            days_of_the_year: Vec::new(),
            set_positions: Vec::new(),
        }
    }

    /// Decode a rule from its mapping form. Field ranges are checked here;
    /// use [`RecurrenceRule::check`] to validate the rule as a whole.
    pub fn decode(value: &Value) -> BridgeResult<Self> {
        let map = fields::object(FIELD, value)?;

        let frequency = match map.get("frequency") {
            Some(Value::String(s)) => Frequency::parse(s).ok_or_else(|| {
                BridgeError::InvalidRecurrence(format!("unknown frequency '{}'", s))
            })?,
            Some(other) => {
                return Err(BridgeError::InvalidRecurrence(format!(
                    "frequency must be a string, got {}",
                    other
                )));
            }
            None => return Err(BridgeError::InvalidRecurrence("missing frequency".into())),
        };

        let mut rule = RecurrenceRule::new(frequency);

        if let Some(v) = present(map, "interval") {
            let interval = fields::integer(FIELD, v).map_err(recurrence_error)?;
            rule.interval = u32::try_from(interval)
                .ok()
                .filter(|i| *i >= 1)
                .ok_or_else(|| {
                    BridgeError::InvalidRecurrence(format!("interval must be at least 1, got {}", interval))
                })?;
        }

        if let Some(v) = present(map, "endDate") {
            rule.end_date = Some(fields::timestamp("recurrenceRule.endDate", v)?);
        }

        if let Some(v) = present(map, "occurrence") {
            let count = fields::integer(FIELD, v).map_err(recurrence_error)?;
            rule.occurrence = Some(u32::try_from(count).ok().filter(|c| *c >= 1).ok_or_else(
                || BridgeError::InvalidRecurrence(format!("occurrence must be at least 1, got {}", count)),
            )?);
        }

        if rule.end_date.is_some() && rule.occurrence.is_some() {
            return Err(BridgeError::InvalidRecurrence(
                "endDate and occurrence cannot both be set".into(),
            ));
        }

        if let Some(v) = present(map, "daysOfTheWeek") {
            rule.days_of_the_week = fields::array(FIELD, v)
                .map_err(recurrence_error)?
                .iter()
                .map(decode_day_of_week)
                .collect::<BridgeResult<_>>()?;
        }

        let list = |key: &str, range: std::ops::RangeInclusive<i32>| -> BridgeResult<Vec<i32>> {
            match present(map, key) {
                Some(v) => fields::integer_list(key, v, range, true).map_err(recurrence_error),
                None => Ok(Vec::new()),
            }
        };
        rule.days_of_the_month = list("daysOfTheMonth", -31..=31)?;
        rule.months_of_the_year = list("monthsOfTheYear", 1..=12)?;
        rule.weeks_of_the_year = list("weeksOfTheYear", -53..=53)?;
        rule.days_of_the_year = list("daysOfTheYear", -366..=366)?;
        rule.set_positions = list("setPositions", -366..=366)?;

        rule.check_combinations()?;
        Ok(rule)
    }

    /// Reject by-rules that RFC 5545 does not allow with the rule's frequency.
    fn check_combinations(&self) -> BridgeResult<()> {
        let conflict = |msg: &str| Err(BridgeError::InvalidRecurrence(msg.to_string()));

        if !self.weeks_of_the_year.is_empty() && self.frequency != Frequency::Yearly {
            return conflict("weeksOfTheYear is only allowed in yearly rules");
        }
        if !self.days_of_the_year.is_empty()
            && matches!(
                self.frequency,
                Frequency::Daily | Frequency::Weekly | Frequency::Monthly
            )
        {
            return conflict("daysOfTheYear is only allowed in yearly rules");
        }
        if !self.days_of_the_month.is_empty() && self.frequency == Frequency::Weekly {
            return conflict("daysOfTheMonth is not allowed in weekly rules");
        }
        if self.days_of_the_week.iter().any(|d| d.week_number != 0)
            && !matches!(self.frequency, Frequency::Monthly | Frequency::Yearly)
        {
            return conflict("weekNumber is only allowed in monthly or yearly rules");
        }
        let has_by_rule = !self.days_of_the_week.is_empty()
            || !self.days_of_the_month.is_empty()
            || !self.months_of_the_year.is_empty()
            || !self.weeks_of_the_year.is_empty()
            || !self.days_of_the_year.is_empty();
        if !self.set_positions.is_empty() && !has_by_rule {
            return conflict("setPositions needs another by-rule to select from");
        }

        Ok(())
    }

    /// Render as the value of an RRULE property.
    pub fn to_rrule_string(&self) -> String {
        let mut parts = vec![format!("FREQ={}", self.frequency.as_rrule_str())];

        if self.interval > 1 {
            parts.push(format!("INTERVAL={}", self.interval));
        }
        if let Some(count) = self.occurrence {
            parts.push(format!("COUNT={}", count));
        }
        if let Some(until) = self.end_date {
            parts.push(format!("UNTIL={}", until.format("%Y%m%dT%H%M%SZ")));
        }
        if !self.days_of_the_week.is_empty() {
            let days: Vec<String> = self
                .days_of_the_week
                .iter()
                .map(|d| d.to_rrule_string())
                .collect();
            parts.push(format!("BYDAY={}", days.join(",")));
        }

        let by_lists = [
            ("BYMONTHDAY", &self.days_of_the_month),
            ("BYMONTH", &self.months_of_the_year),
            ("BYWEEKNO", &self.weeks_of_the_year),
            ("BYYEARDAY", &self.days_of_the_year),
            ("BYSETPOS", &self.set_positions),
        ];
        for (name, values) in by_lists {
            if !values.is_empty() {
                let joined: Vec<String> = values.iter().map(i32::to_string).collect();
                parts.push(format!("{}={}", name, joined.join(",")));
            }
        }

        parts.join(";")
    }

    /// Validate the whole rule against a start time.
    pub fn check(&self, dtstart: DateTime<Utc>) -> BridgeResult<()> {
        self.rrule_set(dtstart).map(|_| ())
    }

    /// Occurrences starting within `[from, to]`, at most `limit` of them.
    pub fn occurrences_between(
        &self,
        dtstart: DateTime<Utc>,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        limit: u16,
    ) -> BridgeResult<Vec<DateTime<Utc>>> {
        let rrule_set = self.rrule_set(dtstart)?;

        // after/before are exclusive, widen by a second to include the bounds
        let tz: rrule::Tz = Utc.into();
        let after = (from - Duration::seconds(1)).with_timezone(&tz);
        let before = (to + Duration::seconds(1)).with_timezone(&tz);

        let result = rrule_set.after(after).before(before).all(limit);

        Ok(result
            .dates
            .iter()
            .map(|dt| dt.with_timezone(&Utc))
            .collect())
    }

    fn rrule_set(&self, dtstart: DateTime<Utc>) -> BridgeResult<RRuleSet> {
        let source = format!(
            "DTSTART:{}\nRRULE:{}",
            dtstart.format("%Y%m%dT%H%M%SZ"),
            self.to_rrule_string()
        );

        source
            .parse()
            .map_err(|e| BridgeError::InvalidRecurrence(format!("{}", e)))
    }
}

fn present<'a>(map: &'a FieldMap, key: &str) -> Option<&'a Value> {
    map.get(key).filter(|v| !v.is_null())
}

fn decode_day_of_week(value: &Value) -> BridgeResult<DayOfWeek> {
    let entry = fields::object("daysOfTheWeek", value).map_err(recurrence_error)?;

    let day = match entry.get("dayOfTheWeek") {
        Some(v) => fields::integer("dayOfTheWeek", v).map_err(recurrence_error)?,
        None => return Err(BridgeError::InvalidRecurrence("daysOfTheWeek entry is missing dayOfTheWeek".into())),
    };
    if !(1..=7).contains(&day) {
        return Err(BridgeError::InvalidRecurrence(format!(
            "dayOfTheWeek must be 1..=7, got {}",
            day
        )));
    }

    let week = match present(entry, "weekNumber") {
        Some(v) => fields::integer("weekNumber", v).map_err(recurrence_error)?,
        None => 0,
    };
    if !(-53..=53).contains(&week) {
        return Err(BridgeError::InvalidRecurrence(format!(
            "weekNumber must be -53..=53, got {}",
            week
        )));
    }

    Ok(DayOfWeek {
        day_of_the_week: day as u8,
        week_number: week as i8,
    })
}

fn recurrence_error(e: BridgeError) -> BridgeError {
    BridgeError::InvalidRecurrence(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_decode_weekly_rule() {
        let rule = RecurrenceRule::decode(&json!({
            "frequency": "weekly",
            "interval": 2,
            "occurrence": 10,
            "daysOfTheWeek": [{ "dayOfTheWeek": 2 }, { "dayOfTheWeek": 6 }],
        }))
        .unwrap();

        assert_eq!(rule.frequency, Frequency::Weekly);
        assert_eq!(rule.to_rrule_string(), "FREQ=WEEKLY;INTERVAL=2;COUNT=10;BYDAY=MO,FR");
        rule.check(start()).unwrap();
    }

    #[test]
    fn test_monthly_rule_with_positional_weekday() {
        let rule = RecurrenceRule::decode(&json!({
            "frequency": "MONTHLY",
            "daysOfTheWeek": [{ "dayOfTheWeek": 6, "weekNumber": -1 }],
        }))
        .unwrap();

        assert_eq!(rule.to_rrule_string(), "FREQ=MONTHLY;BYDAY=-1FR");
    }

    #[test]
    fn test_unknown_frequency_is_rejected() {
        let err = RecurrenceRule::decode(&json!({ "frequency": "fortnightly" })).unwrap_err();
        assert!(matches!(err, BridgeError::InvalidRecurrence(_)));
    }

    #[test]
    fn test_end_date_and_occurrence_are_exclusive() {
        let err = RecurrenceRule::decode(&json!({
            "frequency": "daily",
            "endDate": "2024-02-01T00:00:00Z",
            "occurrence": 3,
        }))
        .unwrap_err();
        assert!(matches!(err, BridgeError::InvalidRecurrence(_)));
    }

    #[test]
    fn test_out_of_range_by_values_are_rejected() {
        assert!(RecurrenceRule::decode(&json!({ "frequency": "yearly", "monthsOfTheYear": [13] })).is_err());
        assert!(RecurrenceRule::decode(&json!({ "frequency": "weekly", "daysOfTheWeek": [{ "dayOfTheWeek": 8 }] })).is_err());
        assert!(RecurrenceRule::decode(&json!({ "frequency": "daily", "interval": 0 })).is_err());
    }

    #[test]
    fn test_conflicting_by_rules_are_rejected() {
        assert!(RecurrenceRule::decode(&json!({ "frequency": "daily", "weeksOfTheYear": [10] })).is_err());
        assert!(RecurrenceRule::decode(&json!({ "frequency": "weekly", "daysOfTheMonth": [1] })).is_err());
        assert!(RecurrenceRule::decode(&json!({ "frequency": "monthly", "setPositions": [1] })).is_err());
        assert!(
            RecurrenceRule::decode(&json!({
                "frequency": "monthly",
                "daysOfTheWeek": [{ "dayOfTheWeek": 2 }, { "dayOfTheWeek": 3 }],
                "setPositions": [-1],
            }))
            .is_ok()
        );
    }

    #[test]
    fn test_occurrences_between_respects_count() {
        let rule = RecurrenceRule::decode(&json!({ "frequency": "daily", "occurrence": 3 })).unwrap();
        let dates = rule
            .occurrences_between(start(), start(), start() + Duration::days(30), 100)
            .unwrap();

        assert_eq!(
            dates,
            vec![
                start(),
                start() + Duration::days(1),
                start() + Duration::days(2)
            ]
        );
    }

    #[test]
    fn test_occurrences_between_skips_earlier_dates() {
        let rule = RecurrenceRule::new(Frequency::Weekly);
        let from = start() + Duration::days(20);
        let dates = rule
            .occurrences_between(start(), from, from + Duration::days(7), 100)
            .unwrap();

        assert_eq!(dates, vec![start() + Duration::days(21)]);
    }
}
