//! Terminal local stub, the never-failing last entry of the fallback chain.
//!
//! Selects a canned skeleton by matching the compiled prompt text against known document
//! titles. Names and the guideline figure are lifted from the prompt when present;
//! anything missing is left as a bracket placeholder for the sanitizer to blank out.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;

use crate::backends::{BackendError, GenerationBackend, GenerationParams};
use crate::prompting::fragments::{BEGIN_MARKER, END_MARKER};

pub const BACKEND_ID: &str = "local";

static PETITIONER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^- Petitioner: (.+)$").unwrap());
static RESPONDENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^- Respondent: (.+)$").unwrap());
static SUPPORT_AMOUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\$[\d,]+) per month").unwrap());
static DRAFT_TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\ADraft an? (.+?)(?:\.| as of)").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Skeleton {
    Petition,
    Custody,
    SupportDeclaration,
    Settlement,
    Generic,
}

impl Skeleton {
    /// Matches on the requested title only, never on user-supplied field values.
    fn detect(title: &str) -> Self {
        let lower = title.to_lowercase();
        if lower.contains("petition for dissolution") {
            Skeleton::Petition
        } else if lower.contains("custody and visitation agreement") {
            Skeleton::Custody
        } else if lower.contains("declaration regarding child support") {
            Skeleton::SupportDeclaration
        } else if lower.contains("marital settlement agreement") {
            Skeleton::Settlement
        } else {
            Skeleton::Generic
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LocalStub;

impl LocalStub {
    /// Produces a document skeleton for `user_prompt`. Infallible.
    pub fn draft(&self, user_prompt: &str) -> String {
        let petitioner = capture(&PETITIONER_RE, user_prompt)
            .unwrap_or_else(|| "[Petitioner Name]".to_string());
        let respondent = capture(&RESPONDENT_RE, user_prompt)
            .unwrap_or_else(|| "[Respondent Name]".to_string());
        let support = capture(&SUPPORT_AMOUNT_RE, user_prompt);
        let title = capture(&DRAFT_TITLE_RE, user_prompt);

        let body = match Skeleton::detect(title.as_deref().unwrap_or_default()) {
            Skeleton::Petition => format!(
                "PETITION FOR DISSOLUTION OF MARRIAGE\n\n\
                 In re the Marriage of {petitioner}, Petitioner, and {respondent}, Respondent.\n\n\
                 LEGAL RELATIONSHIP AND RESIDENCE\n\n\
                 1. Petitioner and Respondent are married. Petitioner has been a resident of \
                 California for at least six months and of the filing county for at least three months.\n\n\
                 GROUNDS FOR DISSOLUTION\n\n\
                 2. Dissolution is requested on the ground of irreconcilable differences \
                 pursuant to Cal. Fam. Code § 2310.\n\n\
                 RELIEF REQUESTED\n\n\
                 3. Petitioner requests that the marriage be dissolved and that the Court \
                 grant such further relief as is just."
            ),
            Skeleton::Custody => format!(
                "STIPULATED CUSTODY AND VISITATION AGREEMENT\n\n\
                 This agreement is entered into by {petitioner}, Petitioner, and {respondent}, Respondent.\n\n\
                 LEGAL CUSTODY\n\n\
                 1. The parties shall share joint legal custody of the minor children \
                 pursuant to Cal. Fam. Code § 3003.\n\n\
                 PHYSICAL CUSTODY AND PARENTING TIME\n\n\
                 2. Parenting time shall follow the schedule of [Parenting Schedule].\n\n\
                 CHILD SUPPORT\n\n\
                 3. {}\n\n\
                 DISPUTE RESOLUTION\n\n\
                 4. The parties shall attend mediation before seeking a court order \
                 modifying this agreement.",
                support_sentence(support.as_deref())
            ),
            Skeleton::SupportDeclaration => format!(
                "DECLARATION REGARDING CHILD SUPPORT\n\n\
                 IDENTITY OF DECLARANT\n\n\
                 1. The declarant, {petitioner}, is the Petitioner in this action.\n\n\
                 GUIDELINE CALCULATION\n\n\
                 2. {}\n\n\
                 DECLARATION UNDER PENALTY OF PERJURY\n\n\
                 3. The declarant declares under penalty of perjury under the laws of the \
                 State of California that the foregoing is true and correct.",
                support_sentence(support.as_deref())
            ),
            Skeleton::Settlement => format!(
                "MARITAL SETTLEMENT AGREEMENT\n\n\
                 RECITALS\n\n\
                 1. This agreement is made between {petitioner}, Petitioner, and {respondent}, \
                 Respondent, who separated on [Separation Date].\n\n\
                 MUTUAL RELEASES\n\n\
                 2. Except as provided in this agreement, each party releases the other from \
                 all claims arising from the marriage.\n\n\
                 GENERAL PROVISIONS\n\n\
                 3. This agreement shall be incorporated into the judgment of dissolution."
            ),
            Skeleton::Generic => {
                let title = title.unwrap_or_else(|| "Legal Document".to_string());
                format!(
                    "{}\n\n\
                     1. This document was prepared on [DATE] from the information supplied.\n\n\
                     2. [Document Body]",
                    title.to_uppercase()
                )
            }
        };

        format!("{BEGIN_MARKER}\n{body}\n{END_MARKER}")
    }
}

#[async_trait]
impl GenerationBackend for LocalStub {
    fn id(&self) -> &str {
        BACKEND_ID
    }

    async fn generate(&self, params: &GenerationParams<'_>) -> Result<String, BackendError> {
        Ok(self.draft(params.user))
    }
}

fn capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn support_sentence(amount: Option<&str>) -> String {
    match amount {
        Some(amount) => format!(
            "Guideline child support is {amount} per month pursuant to Cal. Fam. Code § 4055."
        ),
        None => "Child support shall be set by the Court pursuant to Cal. Fam. Code § 4055."
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    use crate::documents::registry::{
        DocumentRegistry, CHILD_SUPPORT_DECLARATION, CUSTODY_AGREEMENT, DIVORCE_PETITION,
        MARITAL_SETTLEMENT_AGREEMENT,
    };
    use crate::prompting::compile;

    fn compiled(document_type: &str, fields: serde_json::Value) -> String {
        let fields = fields.as_object().cloned().unwrap();
        compile(
            &DocumentRegistry::standard(),
            document_type,
            &fields,
            NaiveDate::from_ymd_opt(2026, 10, 18).unwrap(),
        )
        .user
    }

    #[test]
    fn test_recognizes_every_registered_type() {
        let cases = [
            (DIVORCE_PETITION, "PETITION FOR DISSOLUTION OF MARRIAGE"),
            (CUSTODY_AGREEMENT, "STIPULATED CUSTODY AND VISITATION AGREEMENT"),
            (CHILD_SUPPORT_DECLARATION, "DECLARATION REGARDING CHILD SUPPORT"),
            (MARITAL_SETTLEMENT_AGREEMENT, "MARITAL SETTLEMENT AGREEMENT"),
        ];
        for (id, heading) in cases {
            let out = LocalStub.draft(&compiled(id, json!({})));
            assert!(out.contains(heading), "{id} produced: {out}");
            assert!(out.starts_with(BEGIN_MARKER));
            assert!(out.ends_with(END_MARKER));
        }
    }

    #[test]
    fn test_names_are_lifted_from_prompt() {
        let prompt = compiled(
            DIVORCE_PETITION,
            json!({"petitioner_name": "Jane Doe", "respondent_name": "John Roe"}),
        );
        let out = LocalStub.draft(&prompt);
        assert!(out.contains("In re the Marriage of Jane Doe, Petitioner, and John Roe, Respondent."));
    }

    #[test]
    fn test_support_figure_is_carried_into_declaration() {
        let prompt = compiled(
            CHILD_SUPPORT_DECLARATION,
            json!({
                "petitioner_gross_income": 6500, "petitioner_deductions": 1300, "petitioner_timeshare": 20,
                "respondent_gross_income": 4500, "respondent_deductions": 900, "respondent_timeshare": 80,
                "number_of_children": 2
            }),
        );
        let out = LocalStub.draft(&prompt);
        assert!(out.contains("Guideline child support is $963 per month"));
    }

    #[test]
    fn test_unrecognized_prompt_gets_generic_placeholder_document() {
        let out = LocalStub.draft(&compiled("eviction_notice", json!({"tenant": "Bo"})));
        assert!(out.contains("EVICTION NOTICE"));
        assert!(out.contains("[Document Body]"));
    }

    #[test]
    fn test_field_values_do_not_change_the_skeleton() {
        let prompt = compiled(
            CUSTODY_AGREEMENT,
            json!({
                "petitioner_name": "Jane Doe",
                "special_provisions": "This agreement survives any later Petition for Dissolution of Marriage."
            }),
        );
        let out = LocalStub.draft(&prompt);
        assert!(out.contains("STIPULATED CUSTODY AND VISITATION AGREEMENT"), "{out}");
        assert!(!out.contains("GROUNDS FOR DISSOLUTION"));
    }

    #[tokio::test]
    async fn test_stub_backend_never_fails() {
        let params = GenerationParams {
            system: "",
            user: "",
            temperature: 0.0,
            max_tokens: 1,
        };
        let out = LocalStub.generate(&params).await.unwrap();
        assert!(out.contains("LEGAL DOCUMENT"));
    }
}
