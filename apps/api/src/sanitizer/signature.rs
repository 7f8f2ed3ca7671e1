//! Signature layouts and signature-block synthesis.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::documents::fields::{first_text, format_long_date, FieldMap};

/// Width of the signing rule.
const SIGNATURE_RULE: &str = "______________________________";

/// Only the tail of raw output is inspected for an existing signature block.
const SIGNATURE_SCAN_LINES: usize = 20;

/// A line that is itself a place to sign: a bare rule, a `/s/` mark, or a "Signature:" label.
static SIGNING_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:_{5,}\s*$|/s/\s*\S|signature\s*:)").unwrap()
});

static CLOSING_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*respectfully submitted\b").unwrap());

/// One person who must sign the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignerSlot {
    /// Printed beneath the name, e.g. "Petitioner".
    pub role: &'static str,
    /// Field-map keys holding this signer's name, highest priority first.
    pub name_keys: &'static [&'static str],
}

/// Which signers a document type requires, in signing order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureLayout {
    pub signers: Vec<SignerSlot>,
}

/// Name keys tried for the primary party of any document type.
pub const PRIMARY_NAME_KEYS: &[&str] = &[
    "petitioner_name",
    "declarant_name",
    "party_name",
    "client_name",
    "full_name",
    "name",
];

pub const RESPONDENT_NAME_KEYS: &[&str] = &["respondent_name", "other_party_name"];

impl SignatureLayout {
    /// A single signer labelled `role`, named from the primary-party keys.
    pub fn single(role: &'static str) -> Self {
        Self {
            signers: vec![SignerSlot {
                role,
                name_keys: PRIMARY_NAME_KEYS,
            }],
        }
    }

    /// Petitioner and respondent both sign.
    pub fn both_parties() -> Self {
        Self {
            signers: vec![
                SignerSlot {
                    role: "Petitioner",
                    name_keys: PRIMARY_NAME_KEYS,
                },
                SignerSlot {
                    role: "Respondent",
                    name_keys: RESPONDENT_NAME_KEYS,
                },
            ],
        }
    }
}

/// Heuristic check for an existing signature block in raw backend output.
///
/// Only structural lines count, never a keyword inside a sentence. Every signer in
/// `layout` needs a signing line of their own; a lone closing phrase is enough only
/// for single-signer documents.
///
/// Runs once per generation, when raw text enters the pipeline. Sanitized text carries
/// the answer as state and is never re-scanned.
pub fn looks_signed(raw: &str, layout: &SignatureLayout) -> bool {
    let lines: Vec<&str> = raw.lines().filter(|l| !l.trim().is_empty()).collect();
    let tail = &lines[lines.len().saturating_sub(SIGNATURE_SCAN_LINES)..];

    let signing_lines = tail.iter().filter(|l| SIGNING_LINE_RE.is_match(l)).count();
    let required = layout.signers.len().max(1);
    if signing_lines >= required {
        return true;
    }
    required == 1 && tail.iter().any(|l| CLOSING_LINE_RE.is_match(l))
}

/// Renders the signature block for every signer in `layout`.
///
/// The first signer gets the closing phrase. A signer whose name is absent from the
/// field map gets the rule and role only.
pub fn render_block(layout: &SignatureLayout, fields: &FieldMap, today: NaiveDate) -> String {
    let dated = format!("Dated: {}", format_long_date(today));

    layout
        .signers
        .iter()
        .enumerate()
        .map(|(index, slot)| {
            let mut block = vec![dated.clone(), String::new()];
            if index == 0 {
                block.push("Respectfully submitted,".to_string());
                block.push(String::new());
            }
            block.push(SIGNATURE_RULE.to_string());
            if let Some(name) = first_text(fields, slot.name_keys) {
                block.push(name.to_uppercase());
            }
            block.push(slot.role.to_string());
            block.join("\n")
        })
        .collect::<Vec<_>>()
        .join("\n\n\n")
}
