//! Prompt construction for one synthetic client.

use crate::{
    form::GenerationForm,
    name_generator::NameGenerator,
    risk_policy::RiskBucket,
    types::RiskLevel,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

const SYSTEM_PROMPT: &str = "You generate realistic but entirely fictional client records for a \
sales-tax economic-nexus advisory dashboard. Respond with exactly one JSON object and nothing \
else: no markdown, no commentary. Use only the field names given. All monetary values are US \
dollars as plain numbers. Percentages are numbers between 0 and 100.";

/// Build the prompt for the `index`-th client of a batch.
///
/// Company name and industry are fixed by rotation so that concurrent or
/// repeated calls never pick the same pair within one batch, and so the
/// fallback record for the same index has the same identity.
pub fn build_prompt(
    form: &GenerationForm,
    index: usize,
    risk_level: RiskLevel,
    jurisdictions: &[String],
) -> Prompt {
    let company = NameGenerator::company_name(index);
    let industry = NameGenerator::industry(index);
    let bucket = RiskBucket::for_level(risk_level);

    let mut context = format!("Advisory firm: {}\n", form.display_name());
    if let Some(primary) = non_empty(form.primary_industry.as_deref()) {
        context.push_str(&format!("Firm's primary industry focus: {primary}\n"));
    }
    if let Some(strategy) = non_empty(form.qualification_strategy.as_deref()) {
        context.push_str(&format!("Qualification strategy: {strategy}\n"));
    }
    if !form.pain_points.is_empty() {
        context.push_str(&format!("Client pain points: {}\n", form.pain_points.join("; ")));
    }
    if let Some(notes) = non_empty(form.additional_notes.as_deref()) {
        context.push_str(&format!("Additional notes: {notes}\n"));
    }

    let user = format!(
        "{context}
Generate client #{number} for this firm's multi-state portfolio.

Company name: {company}
Industry: {industry}
Risk level: {risk}
Jurisdictions with sales activity: {states}

Constraints:
- riskLevel must be \"{risk}\"
- penaltyExposure between {pmin:.0} and {pmax:.0}
- qualityScore an integer between {qmin} and {qmax}
- taxId formatted NN-NNNNNNN
- exactly one contact has isPrimary true
- businessLocations use stateCode values from the jurisdiction list; the first is the headquarters
- revenueBreakdowns percentages sum to 100
- customerDemographics b2bPercentage + b2cPercentage = 100
- geographicDistributions has one entry per jurisdiction and revenuePercentage values sum to 100

JSON fields:
{{
  \"name\": string, \"legalName\": string, \"taxId\": string, \"industry\": string,
  \"employeeCount\": integer, \"annualRevenue\": number, \"riskLevel\": string,
  \"penaltyExposure\": number, \"qualityScore\": integer,
  \"contacts\": [{{\"firstName\", \"lastName\", \"title\", \"email\", \"phone\", \"isPrimary\"}}],
  \"businessLocations\": [{{\"locationType\", \"address\", \"city\", \"stateCode\", \"postalCode\", \"employeeCount\"}}],
  \"revenueBreakdowns\": [{{\"category\", \"amount\", \"percentage\"}}],
  \"customerDemographics\": {{\"b2bPercentage\", \"b2cPercentage\", \"totalCustomers\", \"averageOrderValue\", \"repeatCustomerRate\"}},
  \"geographicDistributions\": [{{\"stateCode\", \"revenuePercentage\", \"customerCount\"}}]
}}",
        number = index + 1,
        risk = risk_level,
        states = jurisdictions.join(", "),
        pmin = bucket.penalty_exposure.start(),
        pmax = bucket.penalty_exposure.end(),
        qmin = bucket.quality_score.start(),
        qmax = bucket.quality_score.end(),
    );

    Prompt {
        system: SYSTEM_PROMPT.to_string(),
        user,
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_embeds_rotation_and_constraints() {
        let form = GenerationForm {
            client_name: "Acme Advisory".into(),
            pain_points: vec!["missed registrations".into()],
            primary_industry: Some("SaaS".into()),
            ..Default::default()
        };
        let states = vec!["CA".to_string(), "TX".to_string()];
        let prompt = build_prompt(&form, 2, RiskLevel::Critical, &states);

        assert!(prompt.user.contains("Advisory firm: Acme Advisory"));
        assert!(prompt.user.contains(NameGenerator::company_name(2)));
        assert!(prompt.user.contains(NameGenerator::industry(2)));
        assert!(prompt.user.contains("penaltyExposure between 50000 and 200000"));
        assert!(prompt.user.contains("qualityScore an integer between 60 and 75"));
        assert!(prompt.user.contains("CA, TX"));
        assert!(prompt.user.contains("missed registrations"));
        assert!(prompt.user.contains("client #3"));
        assert!(!prompt.user.contains("Qualification strategy"));
    }

    #[test]
    fn different_indices_get_different_companies() {
        let form = GenerationForm::default();
        let states = vec!["NY".to_string()];
        let a = build_prompt(&form, 0, RiskLevel::Low, &states);
        let b = build_prompt(&form, 1, RiskLevel::Low, &states);
        assert_ne!(a.user, b.user);
    }
}
