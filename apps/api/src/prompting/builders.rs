//! Prompt builders for the registered family-law document types.
//!
//! Every builder emits a fixed heading skeleton. Optional sections (custody, property,
//! support) are included only when the corresponding flag or inputs are present, and the
//! skeleton gains the matching heading at a fixed position.

use chrono::NaiveDate;

use crate::documents::fields::{date, first_text, flag, format_long_date, list, support_inputs, text, FieldMap};
use crate::prompting::fragments::FAMILY_LAW_SYSTEM;
use crate::prompting::{assemble_user_prompt, PromptBuilder, PromptPair, Section};
use crate::sanitizer::signature::{PRIMARY_NAME_KEYS, RESPONDENT_NAME_KEYS};
use crate::support::{compute, validate};

// ────────────────────────────────────────────────────────────────────────────
// Shared helpers
// ────────────────────────────────────────────────────────────────────────────

/// Formats whole currency units with thousands separators: 3640.4 → "$3,640".
pub fn format_currency(amount: f64) -> String {
    let whole = amount.round().max(0.0) as u64;
    let digits = whole.to_string();
    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    format!("${grouped}")
}

/// Party names, county, case number, and the marriage timeline.
fn party_facts(fields: &FieldMap) -> Vec<(String, String)> {
    let mut facts = Vec::new();
    if let Some(name) = first_text(fields, PRIMARY_NAME_KEYS) {
        facts.push(("Petitioner".to_string(), name));
    }
    if let Some(name) = first_text(fields, RESPONDENT_NAME_KEYS) {
        facts.push(("Respondent".to_string(), name));
    }
    if let Some(county) = text(fields, "county") {
        facts.push(("County".to_string(), format!("{county} County Superior Court")));
    }
    if let Some(case) = text(fields, "case_number") {
        facts.push(("Case number".to_string(), case.into_owned()));
    }
    for (label, key) in [
        ("Date of marriage", "marriage_date"),
        ("Date of separation", "separation_date"),
    ] {
        if let Some(d) = date(fields, key) {
            facts.push((label.to_string(), format_long_date(d)));
        }
    }
    facts
}

fn children_section(fields: &FieldMap) -> Section {
    let names = list(fields, "children");
    let mut body = if names.is_empty() {
        "- The parties have minor children of the relationship.".to_string()
    } else {
        format!("- Minor children of the relationship: {}.", names.join(", "))
    };
    if let Some(legal) = text(fields, "legal_custody") {
        body.push_str(&format!("\n- Requested legal custody: {legal}."));
    }
    if let Some(physical) = text(fields, "physical_custody") {
        body.push_str(&format!("\n- Requested physical custody: {physical}."));
    }
    if let Some(schedule) = text(fields, "visitation_schedule") {
        body.push_str(&format!("\n- Parenting time schedule: {schedule}."));
    }
    body.push_str(
        "\n- Address custody under Cal. Fam. Code § 3020 (best interest of the child) \
         and the Uniform Child Custody Jurisdiction and Enforcement Act.",
    );
    Section {
        heading: "CUSTODY INSTRUCTIONS",
        body,
    }
}

fn property_section(fields: &FieldMap) -> Section {
    let mut body = String::new();
    if let Some(community) = text(fields, "community_property") {
        body.push_str(&format!("- Community property: {community}.\n"));
    }
    if let Some(separate) = text(fields, "separate_property") {
        body.push_str(&format!("- Separate property: {separate}.\n"));
    }
    if let Some(debts) = text(fields, "debts") {
        body.push_str(&format!("- Community debts: {debts}.\n"));
    }
    body.push_str(
        "- Characterize each item as community or separate and request division \
         under Cal. Fam. Code § 2550 (equal division of community estate).",
    );
    Section {
        heading: "PROPERTY INSTRUCTIONS",
        body,
    }
}

/// Runs the guideline calculator on the field map so the stated figure matches the
/// deterministic computation. Invalid or missing inputs yield court-determined language.
fn support_section(fields: &FieldMap) -> Section {
    let body = match support_inputs(fields) {
        Some(inputs) if validate(&inputs).is_valid => {
            let result = compute(&inputs);
            let payer = result.breakdown.payer;
            let payee = match payer {
                crate::support::Party::Petitioner => "Respondent",
                crate::support::Party::Respondent => "Petitioner",
            };
            format!(
                "- Guideline child support has been computed for this case: {} per month, \
                 payable by {} to {payee}.\n\
                 - Net disposable monthly income: Petitioner {}, Respondent {}.\n\
                 - {}'s timeshare: {:.0}%. Number of children: {}.\n\
                 - State the monthly amount exactly as given. Do NOT recompute or round it differently.\n\
                 - Cite Cal. Fam. Code § 4055 as the statutory basis.",
                format_currency(result.monthly_support),
                payer.label(),
                format_currency(result.breakdown.petitioner_net_income),
                format_currency(result.breakdown.respondent_net_income),
                payer.label(),
                result.breakdown.payer_timeshare * 100.0,
                inputs.number_of_children,
            )
        }
        _ => "- Guideline support inputs are incomplete. State that child support shall be \
              set by the court pursuant to Cal. Fam. Code § 4055. Do NOT state any amount."
            .to_string(),
    };
    Section {
        heading: "CHILD SUPPORT INSTRUCTIONS",
        body,
    }
}

fn has_support_inputs(fields: &FieldMap) -> bool {
    support_inputs(fields).is_some()
}

// ────────────────────────────────────────────────────────────────────────────
// Petition for Dissolution of Marriage
// ────────────────────────────────────────────────────────────────────────────

pub struct DivorcePetitionBuilder;

impl PromptBuilder for DivorcePetitionBuilder {
    fn build(&self, _document_type: &str, fields: &FieldMap, today: NaiveDate) -> PromptPair {
        let mut facts = party_facts(fields);
        let grounds = text(fields, "grounds")
            .map(|g| g.into_owned())
            .unwrap_or_else(|| "irreconcilable differences".to_string());
        facts.push(("Grounds".to_string(), grounds));
        if let Some(months) = text(fields, "residency_months") {
            facts.push(("Months of California residency".to_string(), months.into_owned()));
        }

        let mut sections = Vec::new();
        let mut skeleton = vec![
            "CAPTION",
            "LEGAL RELATIONSHIP AND RESIDENCE",
            "STATISTICAL FACTS",
            "GROUNDS FOR DISSOLUTION",
        ];

        if flag(fields, "has_children") {
            sections.push(children_section(fields));
            skeleton.push("MINOR CHILDREN, CUSTODY AND VISITATION");
        }
        if flag(fields, "has_property") {
            sections.push(property_section(fields));
            skeleton.push("PROPERTY AND DEBTS");
        }
        if flag(fields, "spousal_support_requested") {
            sections.push(Section {
                heading: "SPOUSAL SUPPORT INSTRUCTIONS",
                body: "- Petitioner requests spousal support under Cal. Fam. Code § 4320.".to_string(),
            });
            skeleton.push("SPOUSAL SUPPORT");
        }
        skeleton.push("RELIEF REQUESTED");

        PromptPair {
            system: FAMILY_LAW_SYSTEM.to_string(),
            user: assemble_user_prompt(
                "Petition for Dissolution of Marriage",
                today,
                &facts,
                &sections,
                &skeleton,
            ),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Stipulated Custody and Visitation Agreement
// ────────────────────────────────────────────────────────────────────────────

pub struct CustodyAgreementBuilder;

impl PromptBuilder for CustodyAgreementBuilder {
    fn build(&self, _document_type: &str, fields: &FieldMap, today: NaiveDate) -> PromptPair {
        let facts = party_facts(fields);

        // Custody terms are the core of this document, so the section is always present.
        let mut sections = vec![children_section(fields)];
        let mut skeleton = vec![
            "CAPTION",
            "PARTIES AND CHILDREN",
            "JURISDICTION",
            "LEGAL CUSTODY",
            "PHYSICAL CUSTODY AND PARENTING TIME",
            "HOLIDAYS AND VACATIONS",
        ];

        if has_support_inputs(fields) {
            sections.push(support_section(fields));
            skeleton.push("CHILD SUPPORT");
        }
        if let Some(provisions) = text(fields, "special_provisions") {
            sections.push(Section {
                heading: "SPECIAL PROVISIONS",
                body: format!("- {provisions}"),
            });
        }
        skeleton.push("DISPUTE RESOLUTION");
        skeleton.push("ACKNOWLEDGMENT OF THE PARTIES");

        PromptPair {
            system: FAMILY_LAW_SYSTEM.to_string(),
            user: assemble_user_prompt(
                "Stipulated Custody and Visitation Agreement",
                today,
                &facts,
                &sections,
                &skeleton,
            ),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Declaration Regarding Child Support
// ────────────────────────────────────────────────────────────────────────────

pub struct ChildSupportDeclarationBuilder;

impl PromptBuilder for ChildSupportDeclarationBuilder {
    fn build(&self, _document_type: &str, fields: &FieldMap, today: NaiveDate) -> PromptPair {
        let mut facts = party_facts(fields);
        for (label, key) in [
            ("Petitioner gross monthly income", "petitioner_gross_income"),
            ("Respondent gross monthly income", "respondent_gross_income"),
            ("Childcare costs (monthly)", "childcare_costs"),
            ("Health insurance premium (monthly)", "health_insurance_premium"),
        ] {
            if let Some(amount) = crate::documents::fields::number(fields, key) {
                facts.push((label.to_string(), format_currency(amount)));
            }
        }

        let sections = vec![support_section(fields)];
        let skeleton = [
            "CAPTION",
            "IDENTITY OF DECLARANT",
            "INCOME AND DEDUCTIONS",
            "TIMESHARE",
            "GUIDELINE CALCULATION",
            "ADD-ON EXPENSES",
            "REQUEST",
            "DECLARATION UNDER PENALTY OF PERJURY",
        ];

        PromptPair {
            system: FAMILY_LAW_SYSTEM.to_string(),
            user: assemble_user_prompt(
                "Declaration Regarding Child Support",
                today,
                &facts,
                &sections,
                &skeleton,
            ),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Marital Settlement Agreement
// ────────────────────────────────────────────────────────────────────────────

pub struct SettlementAgreementBuilder;

impl PromptBuilder for SettlementAgreementBuilder {
    fn build(&self, _document_type: &str, fields: &FieldMap, today: NaiveDate) -> PromptPair {
        let facts = party_facts(fields);

        let mut sections = Vec::new();
        let mut skeleton = vec!["CAPTION", "RECITALS", "DATE OF SEPARATION"];

        if flag(fields, "has_children") {
            sections.push(children_section(fields));
            skeleton.push("CUSTODY AND PARENTING TIME");
            if has_support_inputs(fields) {
                sections.push(support_section(fields));
                skeleton.push("CHILD SUPPORT");
            }
        }
        if flag(fields, "has_property") {
            sections.push(property_section(fields));
            skeleton.push("DIVISION OF COMMUNITY PROPERTY");
            skeleton.push("CONFIRMATION OF SEPARATE PROPERTY");
            skeleton.push("ALLOCATION OF DEBTS");
        }
        skeleton.push("SPOUSAL SUPPORT");
        skeleton.push("MUTUAL RELEASES");
        skeleton.push("GENERAL PROVISIONS");

        PromptPair {
            system: FAMILY_LAW_SYSTEM.to_string(),
            user: assemble_user_prompt(
                "Marital Settlement Agreement",
                today,
                &facts,
                &sections,
                &skeleton,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    fn fields(value: Value) -> FieldMap {
        value.as_object().cloned().unwrap()
    }

    fn support_fields() -> Value {
        json!({
            "petitioner_name": "Jane Doe",
            "respondent_name": "John Roe",
            "petitioner_gross_income": 6500,
            "petitioner_deductions": 1300,
            "petitioner_timeshare": 20,
            "respondent_gross_income": 4500,
            "respondent_deductions": 900,
            "respondent_timeshare": 80,
            "number_of_children": 2
        })
    }

    #[test]
    fn test_format_currency_groups_thousands() {
        assert_eq!(format_currency(0.0), "$0");
        assert_eq!(format_currency(963.2), "$963");
        assert_eq!(format_currency(3640.0), "$3,640");
        assert_eq!(format_currency(1_234_567.0), "$1,234,567");
    }

    #[test]
    fn test_petition_custody_section_only_with_children_flag() {
        let without = DivorcePetitionBuilder.build(
            "divorce_petition",
            &fields(json!({"petitioner_name": "Jane Doe"})),
            today(),
        );
        assert!(!without.user.contains("MINOR CHILDREN, CUSTODY AND VISITATION"));
        assert!(!without.user.contains("CUSTODY INSTRUCTIONS"));

        let with = DivorcePetitionBuilder.build(
            "divorce_petition",
            &fields(json!({"petitioner_name": "Jane Doe", "has_children": true, "children": ["Ana"]})),
            today(),
        );
        assert!(with.user.contains("MINOR CHILDREN, CUSTODY AND VISITATION"));
        assert!(with.user.contains("Minor children of the relationship: Ana."));
    }

    #[test]
    fn test_petition_property_section_only_with_property_flag() {
        let with = DivorcePetitionBuilder.build(
            "divorce_petition",
            &fields(json!({"has_property": "yes", "community_property": "family home"})),
            today(),
        );
        assert!(with.user.contains("PROPERTY AND DEBTS"));
        assert!(with.user.contains("Community property: family home."));

        let without = DivorcePetitionBuilder.build("divorce_petition", &FieldMap::new(), today());
        assert!(!without.user.contains("PROPERTY AND DEBTS"));
    }

    #[test]
    fn test_petition_skeleton_order_is_fixed() {
        let prompt = DivorcePetitionBuilder.build(
            "divorce_petition",
            &fields(json!({"has_children": true, "has_property": true})),
            today(),
        );
        let order = [
            "1. CAPTION",
            "2. LEGAL RELATIONSHIP AND RESIDENCE",
            "3. STATISTICAL FACTS",
            "4. GROUNDS FOR DISSOLUTION",
            "5. MINOR CHILDREN, CUSTODY AND VISITATION",
            "6. PROPERTY AND DEBTS",
            "7. RELIEF REQUESTED",
        ];
        let positions: Vec<usize> = order.iter().map(|h| prompt.user.find(h).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_declaration_embeds_calculator_result() {
        let prompt = ChildSupportDeclarationBuilder.build(
            "child_support_declaration",
            &fields(support_fields()),
            today(),
        );
        assert!(prompt.user.contains("$963 per month, payable by Petitioner to Respondent"));
        assert!(prompt.user.contains("Petitioner $3,640, Respondent $2,520"));
        assert!(prompt.user.contains("Do NOT recompute"));
    }

    #[test]
    fn test_declaration_with_invalid_inputs_defers_to_court() {
        let mut value = support_fields();
        value["respondent_timeshare"] = json!(50);
        let prompt = ChildSupportDeclarationBuilder.build(
            "child_support_declaration",
            &fields(value),
            today(),
        );
        assert!(prompt.user.contains("set by the court"));
        assert!(!prompt.user.contains("per month, payable"));
    }

    #[test]
    fn test_custody_agreement_adds_support_when_incomes_present() {
        let prompt =
            CustodyAgreementBuilder.build("custody_agreement", &fields(support_fields()), today());
        assert!(prompt.user.contains("CHILD SUPPORT"));
        assert!(prompt.user.contains("$963 per month"));

        let bare = CustodyAgreementBuilder.build(
            "custody_agreement",
            &fields(json!({"petitioner_name": "Jane Doe"})),
            today(),
        );
        assert!(!bare.user.contains("CHILD SUPPORT"));
        assert!(bare.user.contains("LEGAL CUSTODY"));
    }

    #[test]
    fn test_every_builder_injects_structural_directives() {
        let builders: [(&str, &dyn PromptBuilder); 4] = [
            ("divorce_petition", &DivorcePetitionBuilder),
            ("custody_agreement", &CustodyAgreementBuilder),
            ("child_support_declaration", &ChildSupportDeclarationBuilder),
            ("marital_settlement_agreement", &SettlementAgreementBuilder),
        ];
        for (id, builder) in builders {
            let prompt = builder.build(id, &fields(support_fields()), today());
            assert_eq!(prompt.system, FAMILY_LAW_SYSTEM);
            assert!(prompt.user.contains("DOCUMENT STRUCTURE"), "{id}");
            assert!(prompt.user.contains("Cal. Fam. Code §"), "{id}");
            assert!(prompt.user.contains("third person"), "{id}");
            assert!(prompt.user.contains("=== BEGIN DOCUMENT ==="), "{id}");
            assert!(prompt.user.contains("Do NOT use placeholders"), "{id}");
            assert!(prompt.user.contains("October 18, 2026"), "{id}");
        }
    }

    #[test]
    fn test_settlement_agreement_conditional_sections() {
        let prompt = SettlementAgreementBuilder.build(
            "marital_settlement_agreement",
            &fields(json!({"has_property": true})),
            today(),
        );
        assert!(prompt.user.contains("DIVISION OF COMMUNITY PROPERTY"));
        assert!(!prompt.user.contains("CUSTODY AND PARENTING TIME"));
    }
}
