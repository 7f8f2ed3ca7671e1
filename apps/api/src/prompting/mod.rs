//! Prompt Compiler: maps a document type and field map to a (system, user) prompt pair.
//!
//! Dispatch goes through the `DocumentRegistry`: every registered type owns a
//! `PromptBuilder`; unregistered types fall back to `GenericBuilder`. Compilation is
//! pure apart from the `today` argument, which callers read from the clock.

pub mod builders;
pub mod fragments;
pub mod generic;

use chrono::NaiveDate;
use serde::Serialize;

use crate::documents::fields::FieldMap;
use crate::documents::registry::DocumentRegistry;

/// System and user instructions for one generation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptPair {
    pub system: String,
    pub user: String,
}

/// Builds the prompt pair for one document type.
pub trait PromptBuilder: Send + Sync {
    fn build(&self, document_type: &str, fields: &FieldMap, today: NaiveDate) -> PromptPair;
}

/// Compiles the prompt pair for `document_type`.
pub fn compile(
    registry: &DocumentRegistry,
    document_type: &str,
    fields: &FieldMap,
    today: NaiveDate,
) -> PromptPair {
    registry
        .resolve(document_type)
        .builder
        .build(document_type, fields, today)
}

/// One instruction section: an UPPERCASE heading and its body.
pub(crate) struct Section {
    pub heading: &'static str,
    pub body: String,
}

/// Assembles a registered builder's user instruction in the fixed order:
/// request line, case facts, conditional sections, skeleton, formatting rules, constraints.
pub(crate) fn assemble_user_prompt(
    title: &str,
    today: NaiveDate,
    facts: &[(String, String)],
    sections: &[Section],
    skeleton: &[&str],
) -> String {
    let mut out = format!(
        "Draft a {title}. All statements are made as of {}.\n\n",
        crate::documents::fields::format_long_date(today)
    );

    out.push_str("CASE INFORMATION:\n");
    if facts.is_empty() {
        out.push_str("- No case facts were supplied beyond the document type.\n");
    }
    for (label, value) in facts {
        out.push_str(&format!("- {label}: {value}\n"));
    }

    for section in sections {
        out.push_str(&format!("\n{}:\n{}\n", section.heading, section.body.trim_end()));
    }

    out.push_str("\nDOCUMENT STRUCTURE (use exactly these headings, in this order, and no others):\n");
    for (i, heading) in skeleton.iter().enumerate() {
        out.push_str(&format!("{}. {heading}\n", i + 1));
    }

    out.push_str(&format!("\nFORMATTING RULES:\n{}\n", fragments::FORMATTING_RULES));
    out.push_str(&format!("\nOUTPUT CONSTRAINTS:\n{}\n", fragments::OUTPUT_CONSTRAINTS));
    out
}
