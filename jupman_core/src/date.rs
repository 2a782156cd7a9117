use std::fmt::Display;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use serde::Serialize;

use crate::JupmanError;
use crate::JupmanResult;

static ISO_DATE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"^(\d{4})-(\d{2})-(\d{2})$").unwrap_or_else(|e| unreachable!("{e}"))
});

/// A calendar day, as used for course release dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CourseDate {
	pub year: u16,
	pub month: u8,
	pub day: u8,
}

impl CourseDate {
	pub fn new(year: u16, month: u8, day: u8) -> JupmanResult<Self> {
		if !(1..=12).contains(&month) || day == 0 || day > days_in_month(year, month) {
			return Err(JupmanError::DateFormat(format!("{year:04}-{month:02}-{day:02}")));
		}

		Ok(Self { year, month, day })
	}
}

fn is_leap_year(year: u16) -> bool {
	(year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

fn days_in_month(year: u16, month: u8) -> u8 {
	match month {
		2 if is_leap_year(year) => 29,
		2 => 28,
		4 | 6 | 9 | 11 => 30,
		_ => 31,
	}
}

impl Display for CourseDate {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
	}
}

impl FromStr for CourseDate {
	type Err = JupmanError;

	fn from_str(text: &str) -> Result<Self, Self::Err> {
		parse_date(text)
	}
}

/// Parse a strict `YYYY-MM-DD` date.
pub fn parse_date(text: &str) -> JupmanResult<CourseDate> {
	let invalid = || JupmanError::DateFormat(text.to_string());
	let caps = ISO_DATE.captures(text).ok_or_else(invalid)?;

	let year = caps[1].parse().map_err(|_| invalid())?;
	let month = caps[2].parse().map_err(|_| invalid())?;
	let day = caps[3].parse().map_err(|_| invalid())?;

	CourseDate::new(year, month, day).map_err(|_| invalid())
}

/// Validate a strict `YYYY-MM-DD` date and hand the text back unchanged.
pub fn parse_date_str(text: &str) -> JupmanResult<String> {
	parse_date(text)?;
	Ok(text.to_string())
}
