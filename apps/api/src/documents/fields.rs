//! Typed reads over the free-form field map submitted with a generation request.
//!
//! The core enforces no schema: every accessor tolerates missing keys and loosely
//! typed values (numbers as strings, flags as "yes"/"true").

use chrono::NaiveDate;
use serde_json::{Map, Value};

use crate::support::{PartyIncome, SupportInputs};

/// Structured, user-supplied case data.
pub type FieldMap = Map<String, Value>;

/// Date pairs that must be ordered (start, later event) when both are supplied.
const ORDERED_DATE_PAIRS: &[(&str, &str)] = &[
    ("marriage_date", "separation_date"),
    ("cohabitation_start_date", "separation_date"),
    ("start_date", "event_date"),
];

/// Non-empty trimmed string value. Numbers are rendered as text.
pub fn text<'a>(fields: &'a FieldMap, key: &str) -> Option<std::borrow::Cow<'a, str>> {
    match fields.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(std::borrow::Cow::Borrowed(s.trim())),
        Value::Number(n) => Some(std::borrow::Cow::Owned(n.to_string())),
        _ => None,
    }
}

/// First non-empty text value among `keys`, in priority order.
pub fn first_text(fields: &FieldMap, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| text(fields, key).map(|v| v.into_owned()))
}

/// Boolean flag. Accepts JSON booleans and "true"/"yes"/"on"/"1" strings.
pub fn flag(fields: &FieldMap, key: &str) -> bool {
    match fields.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "true" | "yes" | "on" | "1"
        ),
        Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
        _ => false,
    }
}

/// Numeric value. Accepts numbers and numeric strings ("$1,200.50" included).
pub fn number(fields: &FieldMap, key: &str) -> Option<f64> {
    match fields.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let cleaned: String = s
                .trim()
                .chars()
                .filter(|c| !matches!(c, '$' | ',' | '%'))
                .collect();
            cleaned.parse::<f64>().ok()
        }
        _ => None,
    }
}

/// Date value in `YYYY-MM-DD` (optionally with a time suffix) or `MM/DD/YYYY`.
pub fn date(fields: &FieldMap, key: &str) -> Option<NaiveDate> {
    let raw = text(fields, key)?;
    let raw = raw.as_ref();
    let date_part = raw.split('T').next().unwrap_or(raw);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%m/%d/%Y"))
        .ok()
}

/// Array of strings, or a comma-separated string, as a list.
pub fn list(fields: &FieldMap, key: &str) -> Vec<String> {
    match fields.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                Value::Object(obj) => obj
                    .get("name")
                    .and_then(|v| v.as_str())
                    .map(|s| s.trim().to_string()),
                _ => None,
            })
            .collect(),
        Some(Value::String(s)) => s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
        _ => Vec::new(),
    }
}

/// Formats a date for document prose, e.g. "October 18, 2026".
pub fn format_long_date(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

/// Checks that no later event date precedes its start date.
/// Returns a human-readable message per violated pair.
pub fn check_date_order(fields: &FieldMap) -> Result<(), Vec<String>> {
    let violations: Vec<String> = ORDERED_DATE_PAIRS
        .iter()
        .filter_map(|(start_key, end_key)| {
            let start = date(fields, start_key)?;
            let end = date(fields, end_key)?;
            (end < start).then(|| {
                format!("{end_key} ({end}) must not precede {start_key} ({start})")
            })
        })
        .collect();

    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}

/// Builds guideline-calculator inputs from the conventional field names.
/// Returns `None` unless both parties' gross incomes are present.
pub fn support_inputs(fields: &FieldMap) -> Option<SupportInputs> {
    let petitioner_gross = number(fields, "petitioner_gross_income")?;
    let respondent_gross = number(fields, "respondent_gross_income")?;

    let petitioner_timeshare = number(fields, "petitioner_timeshare");
    let respondent_timeshare = number(fields, "respondent_timeshare");
    let (petitioner_timeshare, respondent_timeshare) =
        match (petitioner_timeshare, respondent_timeshare) {
            (Some(p), Some(r)) => (p, r),
            (Some(p), None) => (p, 100.0 - p),
            (None, Some(r)) => (100.0 - r, r),
            (None, None) => return None,
        };

    let children = number(fields, "number_of_children")
        .map(|n| n.max(0.0) as u32)
        .unwrap_or_else(|| list(fields, "children").len() as u32);

    Some(SupportInputs {
        petitioner: PartyIncome {
            gross_monthly_income: petitioner_gross,
            deductions: number(fields, "petitioner_deductions").unwrap_or(0.0),
            timeshare_percent: petitioner_timeshare,
        },
        respondent: PartyIncome {
            gross_monthly_income: respondent_gross,
            deductions: number(fields, "respondent_deductions").unwrap_or(0.0),
            timeshare_percent: respondent_timeshare,
        },
        number_of_children: children,
        childcare_costs: number(fields, "childcare_costs").unwrap_or(0.0),
        health_insurance_premium: number(fields, "health_insurance_premium").unwrap_or(0.0),
        uninsured_medical_costs: number(fields, "uninsured_medical_costs").unwrap_or(0.0),
    })
}
