//! Fallback builder for document types without a registered builder.
//!
//! Serializes the field map as-is. This is the only builder without a fixed skeleton.

use chrono::NaiveDate;

use crate::documents::fields::{format_long_date, FieldMap};
use crate::prompting::fragments::{GENERIC_FORMATTING, GENERIC_SYSTEM, OUTPUT_CONSTRAINTS};
use crate::prompting::{PromptBuilder, PromptPair};

pub struct GenericBuilder;

/// "lease_termination-notice" → "Lease Termination Notice"
pub fn humanize_document_type(document_type: &str) -> String {
    document_type
        .split(['_', '-', ' '])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut c = w.chars();
            match c.next() {
                None => String::new(),
                Some(f) => f.to_uppercase().to_string() + c.as_str(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

impl PromptBuilder for GenericBuilder {
    fn build(&self, document_type: &str, fields: &FieldMap, today: NaiveDate) -> PromptPair {
        let fields_json =
            serde_json::to_string_pretty(fields).unwrap_or_else(|_| "{}".to_string());

        let user = format!(
            "Draft a {} as of {} using the following information:\n\n{fields_json}\n\n\
             FORMATTING:\n{GENERIC_FORMATTING}\n\nOUTPUT CONSTRAINTS:\n{OUTPUT_CONSTRAINTS}\n",
            humanize_document_type(document_type),
            format_long_date(today),
        );

        PromptPair {
            system: GENERIC_SYSTEM.to_string(),
            user,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_humanize_document_type() {
        assert_eq!(humanize_document_type("lease_termination-notice"), "Lease Termination Notice");
        assert_eq!(humanize_document_type("will"), "Will");
    }

    #[test]
    fn test_generic_prompt_serializes_fields_verbatim() {
        let fields = json!({"tenant": "Bo", "move_out": "2026-11-30", "pets": false})
            .as_object()
            .cloned()
            .unwrap();
        let prompt = GenericBuilder.build(
            "notice",
            &fields,
            NaiveDate::from_ymd_opt(2026, 10, 18).unwrap(),
        );
        assert!(prompt.user.contains("\"tenant\": \"Bo\""));
        assert!(prompt.user.contains("\"pets\": false"));
        assert!(prompt.user.contains("Draft a Notice as of October 18, 2026"));
        assert!(prompt.user.contains("=== END DOCUMENT ==="));
    }
}
