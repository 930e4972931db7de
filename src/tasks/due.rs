//! Due date/clock normalization.
//!
//! Raw strings are validated against their exact shapes (`YYYY-MM-DD`,
//! `HH:MM:SS`) before any calendar checks, so `2024-3-1` or `9:30` are
//! rejected rather than leniently accepted.

use super::task::Task;
use crate::error::{Result, TrackerError};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// Parse a `YYYY-MM-DD` date, rejecting impossible calendar dates.
pub fn parse_due_date(raw: &str) -> Result<NaiveDate> {
    let fields = split_fixed(raw, b'-', &[4, 2, 2])
        .ok_or_else(|| invalid("due date", raw, "expected YYYY-MM-DD"))?;
    let [year, month, day] = [fields[0], fields[1], fields[2]];
    let year = i32::try_from(year).map_err(|_| invalid("due date", raw, "year out of range"))?;

    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| invalid("due date", raw, "no such calendar date"))
}

/// Parse a 24-hour `HH:MM:SS` clock.
pub fn parse_due_clock(raw: &str) -> Result<NaiveTime> {
    let fields = split_fixed(raw, b':', &[2, 2, 2])
        .ok_or_else(|| invalid("due clock", raw, "expected HH:MM:SS"))?;
    let [hour, min, sec] = [fields[0], fields[1], fields[2]];

    // from_hms_opt already rejects 24:00:00 and second 60.
    NaiveTime::from_hms_opt(hour, min, sec)
        .ok_or_else(|| invalid("due clock", raw, "hour, minute or second out of range"))
}

/// Derived instants for a pair of raw due fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DueInstants {
    /// The due date at midnight.
    pub date_time: Option<NaiveDateTime>,
    /// The combined due instant.
    pub clock_time: Option<NaiveDateTime>,
}

/// Compute the due instants for raw date/clock strings.
///
/// Blank strings count as absent. A clock without a date is validated but
/// yields no instant.
pub fn resolve(due_date: Option<&str>, due_clock: Option<&str>) -> Result<DueInstants> {
    let date = due_date
        .filter(|d| !is_blank(d))
        .map(parse_due_date)
        .transpose()?;
    let clock = due_clock
        .filter(|c| !is_blank(c))
        .map(parse_due_clock)
        .transpose()?;

    let Some(date) = date else {
        return Ok(DueInstants::default());
    };

    Ok(DueInstants {
        date_time: Some(date.and_time(NaiveTime::MIN)),
        clock_time: Some(date.and_time(clock.unwrap_or(NaiveTime::MIN))),
    })
}

/// Recompute a task's derived due instants from its raw fields.
///
/// Blank raw fields are cleared to `None`, so a raw value is only ever
/// present alongside its parsed instant. On error the task is left
/// untouched.
pub fn normalize(task: &mut Task) -> Result<()> {
    let instants = resolve(task.due_date.as_deref(), task.due_clock.as_deref())?;
    if task.due_date.as_deref().is_some_and(is_blank) {
        task.due_date = None;
    }
    if task.due_clock.as_deref().is_some_and(is_blank) {
        task.due_clock = None;
    }
    task.due_date_time = instants.date_time;
    task.due_clock_time = instants.clock_time;
    Ok(())
}

/// Whether a raw due field is empty or only whitespace.
pub fn is_blank(raw: &str) -> bool {
    raw.trim().is_empty()
}

/// Split `raw` on `sep` into all-digit fields of exactly the given widths.
fn split_fixed(raw: &str, sep: u8, widths: &[usize; 3]) -> Option<[u32; 3]> {
    let expected_len = widths.iter().sum::<usize>() + widths.len() - 1;
    if raw.len() != expected_len {
        return None;
    }

    let mut out = [0_u32; 3];
    let mut parts = raw.as_bytes().split(|b| *b == sep);
    for (slot, width) in out.iter_mut().zip(widths) {
        let part = parts.next()?;
        if part.len() != *width || !part.iter().all(u8::is_ascii_digit) {
            return None;
        }
        *slot = part
            .iter()
            .fold(0_u32, |acc, b| acc * 10 + u32::from(b - b'0'));
    }
    if parts.next().is_some() {
        return None;
    }
    Some(out)
}

fn invalid(field: &str, raw: &str, why: &str) -> TrackerError {
    TrackerError::Validation(format!("invalid {field} '{raw}': {why}"))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    fn instant(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn date_only_defaults_to_midnight() {
        let due = resolve(Some("2024-03-01"), None).unwrap();
        assert_eq!(due.clock_time, Some(instant(2024, 3, 1, 0, 0, 0)));
        assert_eq!(due.date_time, Some(instant(2024, 3, 1, 0, 0, 0)));
    }

    #[test]
    fn date_and_clock_combine() {
        let due = resolve(Some("2024-03-01"), Some("09:30:00")).unwrap();
        assert_eq!(due.clock_time, Some(instant(2024, 3, 1, 9, 30, 0)));
        assert_eq!(due.date_time, Some(instant(2024, 3, 1, 0, 0, 0)));
    }

    #[test]
    fn nothing_set_yields_no_instant() {
        assert_eq!(resolve(None, None).unwrap(), DueInstants::default());
        assert_eq!(resolve(Some(""), Some("")).unwrap(), DueInstants::default());
    }

    #[test]
    fn clock_without_date_is_validated_but_not_due() {
        assert_eq!(
            resolve(None, Some("23:59:59")).unwrap(),
            DueInstants::default()
        );
        assert!(matches!(
            resolve(None, Some("25:00:00")),
            Err(TrackerError::Validation(_))
        ));
    }

    #[test]
    fn rejects_impossible_dates() {
        for raw in ["2024-13-40", "2023-02-29", "2024-02-30", "2024-00-10", "2024-04-31"] {
            assert!(
                matches!(parse_due_date(raw), Err(TrackerError::Validation(_))),
                "{raw} should be rejected"
            );
        }
        assert!(parse_due_date("2024-02-29").is_ok());
    }

    #[test]
    fn rejects_loose_date_shapes() {
        for raw in ["2024-3-1", "24-03-01", "2024/03/01", "2024-03-01T00", "2024-03-0a", "", "+024-03-01"] {
            assert!(parse_due_date(raw).is_err(), "{raw} should be rejected");
        }
    }

    #[test]
    fn rejects_out_of_range_clocks() {
        for raw in ["24:00:00", "23:60:00", "23:59:60", "9:30:00", "09:30", "09-30-00", "09:30:00 "] {
            assert!(
                matches!(parse_due_clock(raw), Err(TrackerError::Validation(_))),
                "{raw} should be rejected"
            );
        }
        assert_eq!(
            parse_due_clock("23:59:59").unwrap(),
            NaiveTime::from_hms_opt(23, 59, 59).unwrap()
        );
    }

    #[test]
    fn normalize_replaces_stale_instants() {
        let mut task = Task::new("t").with_due_date("2024-03-01").with_due_clock("09:30:00");
        normalize(&mut task).unwrap();
        assert_eq!(task.due_instant(), Some(instant(2024, 3, 1, 9, 30, 0)));

        task.due_date = Some("2024-04-02".to_owned());
        task.due_clock = None;
        normalize(&mut task).unwrap();
        assert_eq!(task.due_instant(), Some(instant(2024, 4, 2, 0, 0, 0)));
    }

    #[test]
    fn normalize_failure_leaves_task_untouched() {
        let mut task = Task::new("t").with_due_date("2024-03-01");
        normalize(&mut task).unwrap();
        let before = task.clone();

        task.due_clock = Some("99:00:00".to_owned());
        assert!(normalize(&mut task).is_err());
        assert_eq!(task.due_clock_time, before.due_clock_time);
        assert_eq!(task.due_date_time, before.due_date_time);
    }

    #[test]
    fn normalize_clears_blank_raw_fields() {
        let mut task = Task::new("t").with_due_date("").with_due_clock("  ");
        normalize(&mut task).unwrap();
        assert!(task.due_date.is_none());
        assert!(task.due_clock.is_none());
        assert!(task.due_instant().is_none());

        let mut dated = Task::new("t").with_due_date("2024-03-01").with_due_clock("");
        normalize(&mut dated).unwrap();
        assert_eq!(dated.due_date.as_deref(), Some("2024-03-01"));
        assert!(dated.due_clock.is_none());
        assert_eq!(dated.due_instant(), Some(instant(2024, 3, 1, 0, 0, 0)));
    }
}
