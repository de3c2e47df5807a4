use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, Duration, PrimitiveDateTime, Time, Weekday};

const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Accepted time layouts, most specific first. Hours and minutes may omit
/// the leading zero.
const TIME_FORMATS: [&[BorrowedFormatItem<'static>]; 3] = [
    format_description!(
        "[hour padding:none]:[minute padding:none]:[second].[subsecond]"
    ),
    format_description!("[hour padding:none]:[minute padding:none]:[second]"),
    format_description!("[hour padding:none]:[minute padding:none]"),
];

pub const DAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Which weekday opens a week bucket.
///
/// `Monday` matches ISO-8601 weeks and is the default. The day-of-week index
/// reported on derived rows is always Monday-based, whatever the convention.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekStart {
    #[default]
    Monday,
    Sunday,
}

impl WeekStart {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Monday => "monday",
            Self::Sunday => "sunday",
        }
    }

    /// Days between the opening weekday and `weekday`.
    pub fn days_into_week(self, weekday: Weekday) -> u8 {
        match self {
            Self::Monday => weekday.number_days_from_monday(),
            Self::Sunday => weekday.number_days_from_sunday(),
        }
    }
}

impl Display for WeekStart {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WeekStart {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "monday" | "iso" => Ok(Self::Monday),
            "sunday" => Ok(Self::Sunday),
            other => Err(format!(
                "invalid week start '{other}', expected monday or sunday"
            )),
        }
    }
}

/// Calendar date serialized as `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SaleDate(Date);

impl SaleDate {
    pub fn parse(input: &str) -> Result<Self, time::error::Parse> {
        Date::parse(input.trim(), DATE_FORMAT).map(Self)
    }

    /// First day of the week containing this date. `None` only at the lower
    /// edge of the representable calendar.
    pub fn week_start(self, convention: WeekStart) -> Option<Self> {
        let back = i64::from(convention.days_into_week(self.0.weekday()));
        self.0.checked_sub(Duration::days(back)).map(Self)
    }

    /// Signed whole days from `earlier` to `self`.
    pub fn days_since(self, earlier: Self) -> i64 {
        (self.0 - earlier.0).whole_days()
    }

    pub fn checked_add_days(self, days: i64) -> Option<Self> {
        self.0.checked_add(Duration::days(days)).map(Self)
    }
}

impl Display for SaleDate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02}",
            self.0.year(),
            u8::from(self.0.month()),
            self.0.day()
        )
    }
}

impl Serialize for SaleDate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SaleDate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::parse(&value).map_err(D::Error::custom)
    }
}

/// Parse a wall-clock time in one of the accepted layouts.
pub fn parse_time(input: &str) -> Option<Time> {
    let input = input.trim();
    TIME_FORMATS
        .iter()
        .find_map(|format| Time::parse(input, *format).ok())
}

/// Local wall-clock timestamp of a purchase, serialized as
/// `YYYY-MM-DD HH:MM:SS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SaleTimestamp(PrimitiveDateTime);

impl SaleTimestamp {
    pub const fn new(date: SaleDate, time: Time) -> Self {
        Self(PrimitiveDateTime::new(date.0, time))
    }

    pub const fn date(self) -> SaleDate {
        SaleDate(self.0.date())
    }

    pub const fn hour(self) -> u8 {
        self.0.hour()
    }

    /// Monday-based weekday index (0 = Monday, 6 = Sunday).
    pub fn day_of_week(self) -> u8 {
        self.0.weekday().number_days_from_monday()
    }
}

impl Display for SaleTimestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {:02}:{:02}:{:02}",
            self.date(),
            self.0.hour(),
            self.0.minute(),
            self.0.second()
        )
    }
}

impl Serialize for SaleTimestamp {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}
