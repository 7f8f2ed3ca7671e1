//! Guideline support formula.
//!
//! Algorithm:
//! 1. Approximate each party's monthly net disposable income (see `tax`).
//! 2. The party with the higher net income is the payer.
//! 3. base = (payer_net − payer_timeshare × combined_net) × child_multiplier, floored at 0
//! 4. total = base + childcare + health_insurance + uninsured_medical
//! 5. total is floored at 0 and rounded to the nearest whole currency unit.
//!
//! `compute` never fails. Out-of-range conditions surface as advisory `warnings`;
//! hard precondition failures are reported by `validate`.

use serde::{Deserialize, Serialize};

use crate::support::tax::net_disposable_monthly;

/// Timeshare sums within this distance of 100 are accepted.
const TIMESHARE_TOLERANCE: f64 = 0.01;
const MAX_CHILDREN: u32 = 20;
const LOW_RESULT_THRESHOLD: f64 = 50.0;
const HIGH_RESULT_THRESHOLD: f64 = 10_000.0;

/// One party's monthly figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartyIncome {
    pub gross_monthly_income: f64,
    #[serde(default)]
    pub deductions: f64,
    /// Percentage of time the children spend with this party, 0–100.
    pub timeshare_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportInputs {
    pub petitioner: PartyIncome,
    pub respondent: PartyIncome,
    pub number_of_children: u32,
    #[serde(default)]
    pub childcare_costs: f64,
    #[serde(default)]
    pub health_insurance_premium: f64,
    #[serde(default)]
    pub uninsured_medical_costs: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Party {
    Petitioner,
    Respondent,
}

impl Party {
    pub fn label(&self) -> &'static str {
        match self {
            Party::Petitioner => "Petitioner",
            Party::Respondent => "Respondent",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportBreakdown {
    pub petitioner_net_income: f64,
    pub respondent_net_income: f64,
    pub combined_net_income: f64,
    pub payer: Party,
    /// Payer's timeshare as a fraction (0.0 – 1.0).
    pub payer_timeshare: f64,
    pub child_multiplier: f64,
    pub base_support: f64,
    pub childcare_costs: f64,
    pub health_insurance_premium: f64,
    pub uninsured_medical_costs: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportResult {
    /// Whole currency units, always ≥ 0.
    pub monthly_support: f64,
    pub breakdown: SupportBreakdown,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

/// Share of the adjusted income gap allocated to support, by number of children.
pub fn child_multiplier(children: u32) -> f64 {
    match children {
        0 => 0.0,
        1 => 0.25,
        2 => 0.40,
        3 => 0.50,
        4 => 0.55,
        _ => 0.60,
    }
}

/// Hard precondition checks. Callers must reject inputs with `is_valid == false`.
pub fn validate(inputs: &SupportInputs) -> ValidationReport {
    let mut errors = Vec::new();

    for (label, party) in [
        ("Petitioner", &inputs.petitioner),
        ("Respondent", &inputs.respondent),
    ] {
        if !party.gross_monthly_income.is_finite() || party.gross_monthly_income < 0.0 {
            errors.push(format!("{label} gross income cannot be negative"));
        }
        if !party.deductions.is_finite() || party.deductions < 0.0 {
            errors.push(format!("{label} deductions cannot be negative"));
        }
        if !(0.0..=100.0).contains(&party.timeshare_percent) {
            errors.push(format!("{label} timeshare must be between 0 and 100"));
        }
    }

    let timeshare_sum = inputs.petitioner.timeshare_percent + inputs.respondent.timeshare_percent;
    if (timeshare_sum - 100.0).abs() > TIMESHARE_TOLERANCE {
        errors.push(format!(
            "Timeshare percentages must sum to 100 (got {timeshare_sum})"
        ));
    }

    if inputs.number_of_children < 1 || inputs.number_of_children > MAX_CHILDREN {
        errors.push(format!(
            "Number of children must be between 1 and {MAX_CHILDREN}"
        ));
    }

    for (label, amount) in [
        ("Childcare costs", inputs.childcare_costs),
        ("Health insurance premium", inputs.health_insurance_premium),
        ("Uninsured medical costs", inputs.uninsured_medical_costs),
    ] {
        if !amount.is_finite() || amount < 0.0 {
            errors.push(format!("{label} cannot be negative"));
        }
    }

    ValidationReport {
        is_valid: errors.is_empty(),
        errors,
    }
}

/// Computes the guideline monthly support amount. Never fails.
pub fn compute(inputs: &SupportInputs) -> SupportResult {
    let mut warnings = Vec::new();

    let petitioner_net = net_disposable_monthly(
        inputs.petitioner.gross_monthly_income.max(0.0),
        inputs.petitioner.deductions.max(0.0),
    );
    let respondent_net = net_disposable_monthly(
        inputs.respondent.gross_monthly_income.max(0.0),
        inputs.respondent.deductions.max(0.0),
    );
    let combined_net = petitioner_net + respondent_net;

    // Ties resolve to the petitioner.
    let (payer, payer_net, payer_timeshare_pct) = if respondent_net > petitioner_net {
        (
            Party::Respondent,
            respondent_net,
            inputs.respondent.timeshare_percent,
        )
    } else {
        (
            Party::Petitioner,
            petitioner_net,
            inputs.petitioner.timeshare_percent,
        )
    };
    let payer_timeshare = payer_timeshare_pct.clamp(0.0, 100.0) / 100.0;
    let multiplier = child_multiplier(inputs.number_of_children);

    let base_support = ((payer_net - payer_timeshare * combined_net) * multiplier).max(0.0);
    let add_ons = inputs.childcare_costs
        + inputs.health_insurance_premium
        + inputs.uninsured_medical_costs;
    let monthly_support = (base_support + add_ons).max(0.0).round();

    if combined_net <= 0.0 {
        warnings.push(
            "Combined net income is zero; guideline support cannot be meaningfully estimated"
                .to_string(),
        );
    }

    let timeshare_sum = inputs.petitioner.timeshare_percent + inputs.respondent.timeshare_percent;
    if (timeshare_sum - 100.0).abs() > TIMESHARE_TOLERANCE {
        warnings.push(format!(
            "Timeshare percentages sum to {timeshare_sum}%, not 100%"
        ));
    }

    if inputs.number_of_children == 0 {
        warnings.push("No children specified; child multiplier is zero".to_string());
    }

    if payer_net > 0.0 && monthly_support > payer_net * 0.5 {
        warnings.push(format!(
            "Support of {monthly_support:.0} exceeds half of the {} net income ({payer_net:.0})",
            payer.label()
        ));
    }

    if combined_net > 0.0 && monthly_support < LOW_RESULT_THRESHOLD {
        warnings.push(format!(
            "Result of {monthly_support:.0} is unusually low; review income and timeshare inputs"
        ));
    }

    if monthly_support > HIGH_RESULT_THRESHOLD {
        warnings.push(format!(
            "Result of {monthly_support:.0} is unusually high; review income inputs"
        ));
    }

    SupportResult {
        monthly_support,
        breakdown: SupportBreakdown {
            petitioner_net_income: petitioner_net,
            respondent_net_income: respondent_net,
            combined_net_income: combined_net,
            payer,
            payer_timeshare,
            child_multiplier: multiplier,
            base_support,
            childcare_costs: inputs.childcare_costs,
            health_insurance_premium: inputs.health_insurance_premium,
            uninsured_medical_costs: inputs.uninsured_medical_costs,
        },
        warnings,
    }
}
