use chrono::{DateTime, Utc};
use regex::Regex;
use std::sync::OnceLock;

static UNSAFE_FILE_CHARS: OnceLock<Regex> = OnceLock::new();

/// Usernames compare case-insensitively everywhere except login.
pub fn same_username(a: &str, b: &str) -> bool {
  a.to_lowercase() == b.to_lowercase()
}

/// Survey name stripped to ASCII letters, digits and whitespace, plus
/// `_Responses.csv`.
pub fn export_file_name(survey_name: &str) -> String {
  let unsafe_chars = UNSAFE_FILE_CHARS.get_or_init(|| Regex::new(r"[^a-zA-Z0-9\s]").expect("regex"));
  format!("{}_Responses.csv", unsafe_chars.replace_all(survey_name, ""))
}

pub fn format_date(value: Option<&DateTime<Utc>>) -> String {
  value
    .map(|d| d.format("%Y-%m-%d").to_string())
    .unwrap_or_else(|| "N/A".to_string())
}

pub fn format_timestamp(value: &DateTime<Utc>) -> String {
  value.format("%Y-%m-%d %H:%M:%S").to_string()
}

pub fn non_blank(value: &str) -> Option<&str> {
  let trimmed = value.trim();
  if trimmed.is_empty() {
    None
  } else {
    Some(trimmed)
  }
}

#[cfg(test)]
mod tests {
  use super::{export_file_name, format_date, non_blank, same_username};
  use chrono::{TimeZone, Utc};

  #[test]
  fn export_name_keeps_letters_digits_and_spaces() {
    assert_eq!(
      export_file_name("Q3 Field/Visit: Ghana #2"),
      "Q3 FieldVisit Ghana 2_Responses.csv"
    );
    assert_eq!(export_file_name("Café"), "Caf_Responses.csv");
  }

  #[test]
  fn dates_fall_back_to_na() {
    let d = Utc.with_ymd_and_hms(2024, 3, 9, 23, 59, 0).unwrap();
    assert_eq!(format_date(Some(&d)), "2024-03-09");
    assert_eq!(format_date(None), "N/A");
  }

  #[test]
  fn helpers_compare_and_trim() {
    assert!(same_username("Admin", "admin"));
    assert!(!same_username("admin", "admin2"));
    assert_eq!(non_blank("  bob "), Some("bob"));
    assert_eq!(non_blank("   "), None);
  }
}
