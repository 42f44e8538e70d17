//! Scheduling views over an already-fetched appointment list.

use chrono::{Datelike, Duration, NaiveDate};

use crate::models::{Appointment, AppointmentStatus};

/// Window for [`upcoming_appointments`].
pub const UPCOMING_WINDOW_DAYS: i64 = 7;

/// Appointments matching a search term and, optionally, a status.
///
/// The term matches patient name and notes case-insensitively and the
/// phone number as a plain substring.
pub fn filter_appointments<'a>(
    appointments: &'a [Appointment],
    term: &str,
    status: Option<AppointmentStatus>,
) -> Vec<&'a Appointment> {
    let lower = term.to_lowercase();
    appointments
        .iter()
        .filter(|a| {
            a.snapshot.patient_name.to_lowercase().contains(&lower)
                || a.snapshot.patient_phone.contains(term)
                || a.notes.to_lowercase().contains(&lower)
        })
        .filter(|a| status.map_or(true, |s| a.status == s))
        .collect()
}

/// Scheduled appointments from `today` through the next seven days,
/// soonest first. Dates that do not parse are skipped.
pub fn upcoming_appointments(appointments: &[Appointment], today: NaiveDate) -> Vec<&Appointment> {
    let horizon = today + Duration::days(UPCOMING_WINDOW_DAYS);
    let mut upcoming: Vec<_> = appointments
        .iter()
        .filter(|a| a.status == AppointmentStatus::Scheduled)
        .filter_map(|a| parse_date(&a.date).map(|date| (date, a)))
        .filter(|(date, _)| *date >= today && *date <= horizon)
        .collect();
    upcoming.sort_by(|(da, a), (db, b)| da.cmp(db).then_with(|| a.time.cmp(&b.time)));
    upcoming.into_iter().map(|(_, a)| a).collect()
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()
}

/// Month grid for the appointment calendar, weeks starting on Sunday.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthCalendar {
    first: NaiveDate,
    days_in_month: u32,
}

impl MonthCalendar {
    /// Calendar for `month` (1-12) of `year`.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)?;
        let next = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)?
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)?
        };
        let days_in_month = u32::try_from((next - first).num_days()).ok()?;
        Some(Self {
            first,
            days_in_month,
        })
    }

    /// Calendar for the month containing `date`.
    pub fn containing(date: NaiveDate) -> Self {
        // Day 1 of a valid date's month is always valid.
        Self::new(date.year(), date.month()).unwrap_or(Self {
            first: date,
            days_in_month: 1,
        })
    }

    pub fn year(&self) -> i32 {
        self.first.year()
    }

    pub fn month(&self) -> u32 {
        self.first.month()
    }

    pub fn days_in_month(&self) -> u32 {
        self.days_in_month
    }

    /// Heading such as "March 2024".
    pub fn title(&self) -> String {
        self.first.format("%B %Y").to_string()
    }

    /// Grid cells: one blank per weekday before the 1st, then each day.
    pub fn cells(&self) -> Vec<Option<u32>> {
        let offset = self.first.weekday().num_days_from_sunday() as usize;
        std::iter::repeat(None)
            .take(offset)
            .chain((1..=self.days_in_month).map(Some))
            .collect()
    }

    /// Zero-padded `YYYY-MM-DD` text for a day of this month.
    pub fn date_key(&self, day: u32) -> String {
        format!("{:04}-{:02}-{:02}", self.year(), self.month(), day)
    }

    /// Scheduled appointments on `day`, matched on the exact date text.
    pub fn scheduled_on<'a>(&self, day: u32, appointments: &'a [Appointment]) -> Vec<&'a Appointment> {
        let key = self.date_key(day);
        appointments
            .iter()
            .filter(|a| a.date == key && a.status == AppointmentStatus::Scheduled)
            .collect()
    }

    pub fn next(&self) -> Self {
        Self::containing(self.first + Duration::days(i64::from(self.days_in_month)))
    }

    pub fn previous(&self) -> Self {
        Self::containing(self.first - Duration::days(1))
    }
}
