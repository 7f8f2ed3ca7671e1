//! Content Sanitizer: turns raw backend output into a document that satisfies the
//! structural invariants: no bracket placeholders, exactly one signature block.
//!
//! Steps, in order:
//! 1. keep only the text between the BEGIN/END DOCUMENT markers, if present
//! 2. replace date-shaped placeholders with today's date
//! 3. replace every other placeholder or "to be determined" marker with a blank line
//! 4. append a signature block unless the draft already carries one
//!
//! Whether a signature block is present is tracked on `Draft`, not re-derived from the
//! text, so `sanitize(sanitize(d)) == sanitize(d)`.

pub mod signature;

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::documents::fields::{format_long_date, FieldMap};
use crate::prompting::fragments::{BEGIN_MARKER, END_MARKER};
use signature::{looks_signed, render_block, SignatureLayout};

/// Replacement for unresolved placeholders.
pub const BLANK_MARKER: &str = "__________";

static FULL_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\[\s*(?:insert\s+|enter\s+)?(?:today'?s\s+|current\s+)?(?:date(?:\s+of\s+signing)?|month\s+day,?\s+year|mm/dd/yyyy)\s*\]",
    )
    .unwrap()
});

static MONTH_DAY_YEAR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\[\s*month\s*\]\s*\[\s*day\s*\]\s*,?\s*\[\s*year\s*\]").unwrap()
});

static MONTH_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\[\s*month\s*\]").unwrap());
static DAY_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\[\s*day\s*\]").unwrap());
static YEAR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\[\s*year\s*\]").unwrap());

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[^\[\]\n]{1,80}\]|\{\{[^{}\n]{1,80}\}\}").unwrap());

static TBD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bto be determined\b|\bTBD\b").unwrap());

static BEGIN_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?m)^[ \t]*{}[ \t\r]*$", regex::escape(BEGIN_MARKER))).unwrap()
});

static END_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?m)^[ \t]*{}[ \t\r]*$", regex::escape(END_MARKER))).unwrap()
});

static EXCESS_BLANK_LINES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{4,}").unwrap());

/// Document text plus the state the pipeline tracks alongside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    pub text: String,
    pub signature_block_present: bool,
}

impl Draft {
    /// Wraps raw backend output, inspecting it once for an existing signature block
    /// that covers every signer in `layout`.
    pub fn from_generated(raw: impl Into<String>, layout: &SignatureLayout) -> Self {
        let text = raw.into();
        let signature_block_present = looks_signed(strip_markers(&text), layout);
        Self {
            text,
            signature_block_present,
        }
    }
}

/// Normalizes a draft into a finished document. Idempotent.
pub fn sanitize(
    draft: Draft,
    layout: &SignatureLayout,
    fields: &FieldMap,
    today: NaiveDate,
) -> Draft {
    let body = strip_markers(&draft.text);
    let body = replace_date_placeholders(body, today);
    let body = replace_remaining_placeholders(&body);
    let mut text = normalize_whitespace(&body);

    if !draft.signature_block_present {
        let block = render_block(layout, fields, today);
        let block = replace_remaining_placeholders(&block);
        text = format!("{}\n\n\n{}", text.trim_end(), block);
        text = normalize_whitespace(&text);
    }

    Draft {
        text,
        signature_block_present: true,
    }
}

/// Returns the text between the BEGIN/END markers. Either marker may be missing.
///
/// Markers count only when they stand alone on a line, so a preamble that quotes
/// them inline cannot replace the document body.
fn strip_markers(text: &str) -> &str {
    let start = BEGIN_LINE_RE.find(text).map(|m| m.end()).unwrap_or(0);
    let rest = &text[start..];
    let end = END_LINE_RE.find(rest).map(|m| m.start()).unwrap_or(rest.len());
    rest[..end].trim()
}

fn replace_date_placeholders(text: &str, today: NaiveDate) -> String {
    let long_date = format_long_date(today);
    let text = MONTH_DAY_YEAR_RE.replace_all(text, long_date.as_str());
    let text = FULL_DATE_RE.replace_all(&text, long_date.as_str());
    let text = MONTH_RE.replace_all(&text, today.format("%B").to_string().as_str());
    let text = DAY_RE.replace_all(&text, today.format("%-d").to_string().as_str());
    YEAR_RE
        .replace_all(&text, today.format("%Y").to_string().as_str())
        .into_owned()
}

fn replace_remaining_placeholders(text: &str) -> String {
    let text = PLACEHOLDER_RE.replace_all(text, BLANK_MARKER);
    TBD_RE.replace_all(&text, BLANK_MARKER).into_owned()
}

/// Trims trailing whitespace per line, caps runs of blank lines at two, and ends
/// the document with a single newline.
fn normalize_whitespace(text: &str) -> String {
    let trimmed_lines = text
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n");
    let collapsed = EXCESS_BLANK_LINES_RE.replace_all(&trimmed_lines, "\n\n\n");
    format!("{}\n", collapsed.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    fn fields() -> FieldMap {
        json!({"petitioner_name": "Jane Doe", "respondent_name": "John Roe"})
            .as_object()
            .cloned()
            .unwrap()
    }

    fn run(raw: &str, layout: &SignatureLayout) -> Draft {
        sanitize(Draft::from_generated(raw, layout), layout, &fields(), today())
    }

    #[test]
    fn test_date_placeholders_become_today() {
        let out = run(
            "Signed on [DATE]. Effective [Month] [Day], [Year]. Filed [insert date]. Year: [year].",
            &SignatureLayout::single("Petitioner"),
        );
        assert!(out.text.starts_with(
            "Signed on October 18, 2026. Effective October 18, 2026. Filed October 18, 2026. Year: 2026."
        ));
    }

    #[test]
    fn test_other_placeholders_become_blank_marker() {
        let out = run(
            "Case No. [CASE NUMBER]; county {{county}}; hearing date to be determined; fee TBD.",
            &SignatureLayout::single("Petitioner"),
        );
        let first_line = out.text.lines().next().unwrap();
        assert_eq!(
            first_line,
            "Case No. __________; county __________; hearing date __________; fee __________."
        );
        assert!(!out.text.contains('['));
        assert!(!out.text.contains("{{"));
    }

    #[test]
    fn test_signature_appended_when_absent() {
        let out = run("The body of the petition.", &SignatureLayout::single("Petitioner"));
        assert!(out.signature_block_present);
        assert!(out.text.contains("Respectfully submitted,"));
        assert!(out.text.trim_end().ends_with("JANE DOE\nPetitioner"));
    }

    #[test]
    fn test_existing_signature_not_duplicated() {
        let raw = "Body.\n\nRespectfully submitted,\n\n____________\nJane Doe, Petitioner";
        let out = run(raw, &SignatureLayout::single("Petitioner"));
        assert_eq!(out.text.matches("Respectfully submitted").count(), 1);
    }

    #[test]
    fn test_custody_layout_appends_two_signers() {
        let out = run("Custody terms.", &SignatureLayout::both_parties());
        assert!(out.text.contains("JANE DOE\nPetitioner"));
        assert!(out.text.contains("JOHN ROE\nRespondent"));
    }

    #[test]
    fn test_markers_and_chatter_are_stripped() {
        let raw = format!(
            "Sure! Here is your document:\n{BEGIN_MARKER}\nPETITION\n\nBody.\n{END_MARKER}\nLet me know if you need changes."
        );
        let out = run(&raw, &SignatureLayout::single("Petitioner"));
        assert!(out.text.starts_with("PETITION\n\nBody."));
        assert!(!out.text.contains("Sure!"));
        assert!(!out.text.contains("Let me know"));
        assert!(!out.text.contains(BEGIN_MARKER));
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let layouts = [
            SignatureLayout::single("Petitioner"),
            SignatureLayout::both_parties(),
        ];
        let raws = [
            "Plain body without closing.",
            "Body dated [DATE] for [CLIENT NAME].\n\n\n\n\nMore body.   ",
            "Body.\n\nRespectfully submitted,\n\n__________\n[Attorney Name]",
        ];
        for layout in &layouts {
            for raw in raws {
                let once = run(raw, layout);
                let twice = sanitize(once.clone(), layout, &fields(), today());
                assert_eq!(once, twice, "not idempotent for {raw:?}");
            }
        }
    }

    #[test]
    fn test_idempotent_even_on_a_later_day() {
        let layout = SignatureLayout::single("Petitioner");
        let once = run("Dated [DATE].", &layout);
        let later = NaiveDate::from_ymd_opt(2027, 1, 2).unwrap();
        let twice = sanitize(once.clone(), &layout, &fields(), later);
        assert_eq!(once.text, twice.text);
    }

    #[test]
    fn test_bracketed_name_in_fields_is_blanked_in_signature() {
        let f = json!({"petitioner_name": "[Your Name]"}).as_object().cloned().unwrap();
        let out = sanitize(
            Draft::from_generated("Body.", &SignatureLayout::single("Petitioner")),
            &SignatureLayout::single("Petitioner"),
            &f,
            today(),
        );
        assert!(!out.text.contains('['));
        let again = sanitize(out.clone(), &SignatureLayout::single("Petitioner"), &f, today());
        assert_eq!(out, again);
    }

    #[test]
    fn test_excess_blank_lines_collapse() {
        let out = run("A\n\n\n\n\n\nB", &SignatureLayout::single("Petitioner"));
        assert!(out.text.starts_with("A\n\n\nB"));
    }

    #[test]
    fn test_prose_mentioning_signature_still_gets_both_signers() {
        let raw = "STIPULATED CUSTODY AND VISITATION AGREEMENT\n\n\
                   1. The parties share joint legal custody.\n\n\
                   ACKNOWLEDGMENT OF THE PARTIES\n\n\
                   2. Each party confirms assent to these terms by signature below.";
        let out = run(raw, &SignatureLayout::both_parties());
        assert!(out.text.contains("by signature below.\n\n\nDated: October 18, 2026"));
        assert!(out.text.contains("JANE DOE\nPetitioner"));
        assert!(out.text.trim_end().ends_with("JOHN ROE\nRespondent"));
    }

    #[test]
    fn test_inline_quoted_markers_do_not_replace_body() {
        let raw = format!(
            "I will place the text between {BEGIN_MARKER} and {END_MARKER} as requested.\n\
             {BEGIN_MARKER}\nPETITION\n\nBody paragraph.\n{END_MARKER}"
        );
        let out = run(&raw, &SignatureLayout::single("Petitioner"));
        assert!(out.text.starts_with("PETITION\n\nBody paragraph.\n\n\nDated:"), "{}", out.text);
        assert!(!out.text.contains("as requested"));
    }
}
