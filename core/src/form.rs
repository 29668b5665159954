//! The input contract: a form describing a hypothetical advisory firm and
//! the portfolio it wants generated.

use crate::error::{SeedError, SeedResult};
use serde::{Deserialize, Serialize};

/// `multiStateClientCount` arrives either as a number or as the label of a
/// dropdown bucket such as `"11-50"` or `"250+"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClientCount {
    Number(u64),
    Label(String),
}

impl ClientCount {
    /// Leading integer of the value, if any.
    pub fn leading_number(&self) -> Option<u64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Label(label) => {
                let digits: String = label
                    .trim()
                    .chars()
                    .take_while(|c| c.is_ascii_digit())
                    .collect();
                digits.parse().ok()
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerationForm {
    pub client_name: String,
    pub priority_states: Vec<String>,
    pub pain_points: Vec<String>,
    pub multi_state_client_count: Option<ClientCount>,
    pub primary_industry: Option<String>,
    pub qualification_strategy: Option<String>,
    pub additional_notes: Option<String>,
}

impl GenerationForm {
    /// Number of clients the form asks for. Absent, zero or unparsable
    /// counts fall back to `default`.
    pub fn requested_count(&self, default: usize) -> usize {
        self.multi_state_client_count
            .as_ref()
            .and_then(ClientCount::leading_number)
            .filter(|n| *n > 0)
            .map(|n| usize::try_from(n).unwrap_or(usize::MAX))
            .unwrap_or(default)
    }

    /// Requested count clamped to `cap`.
    pub fn effective_count(&self, default: usize, cap: usize) -> usize {
        self.requested_count(default).min(cap)
    }

    /// Normalised jurisdiction codes: trimmed, upper-cased, de-duplicated in
    /// first-seen order. An empty list yields `defaults`.
    pub fn jurisdictions(&self, defaults: &[String]) -> SeedResult<Vec<String>> {
        let source: &[String] = if self.priority_states.iter().all(|s| s.trim().is_empty()) {
            defaults
        } else {
            &self.priority_states
        };

        let mut codes: Vec<String> = Vec::with_capacity(source.len());
        for raw in source {
            let code = raw.trim().to_ascii_uppercase();
            if code.is_empty() {
                continue;
            }
            if code.len() != 2 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
                return Err(SeedError::validation(
                    "priorityStates",
                    format!("'{raw}' is not a two-letter jurisdiction code"),
                ));
            }
            if !codes.contains(&code) {
                codes.push(code);
            }
        }
        if codes.is_empty() {
            return Err(SeedError::validation("priorityStates", "no jurisdictions to monitor"));
        }
        Ok(codes)
    }

    /// Firm name for prompts and audit text.
    pub fn display_name(&self) -> &str {
        let name = self.client_name.trim();
        if name.is_empty() {
            "Unnamed Firm"
        } else {
            name
        }
    }

    /// Free-form notes stored on each generated client.
    pub fn client_notes(&self) -> Option<String> {
        let mut parts = Vec::new();
        if let Some(notes) = self.additional_notes.as_deref().map(str::trim) {
            if !notes.is_empty() {
                parts.push(notes.to_string());
            }
        }
        if !self.pain_points.is_empty() {
            parts.push(format!("Pain points: {}", self.pain_points.join(", ")));
        }
        if parts.is_empty() {
            None
        } else {
            Some(parts.join("\n"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form_with_count(count: Option<ClientCount>) -> GenerationForm {
        GenerationForm {
            multi_state_client_count: count,
            ..Default::default()
        }
    }

    #[test]
    fn parses_bucket_labels() {
        let cases = [("250+", 250), ("11-50", 11), (" 7 ", 7), ("1-10", 1)];
        for (label, expected) in cases {
            let form = form_with_count(Some(ClientCount::Label(label.into())));
            assert_eq!(form.requested_count(5), expected, "label {label}");
        }
    }

    #[test]
    fn falls_back_to_default_count() {
        assert_eq!(form_with_count(None).requested_count(5), 5);
        assert_eq!(form_with_count(Some(ClientCount::Label("many".into()))).requested_count(5), 5);
        assert_eq!(form_with_count(Some(ClientCount::Number(0))).requested_count(5), 5);
    }

    #[test]
    fn effective_count_is_capped() {
        let form = form_with_count(Some(ClientCount::Label("250+".into())));
        assert_eq!(form.effective_count(5, 20), 20);
        let form = form_with_count(Some(ClientCount::Number(3)));
        assert_eq!(form.effective_count(5, 20), 3);
    }

    #[test]
    fn deserializes_camel_case_json() {
        let form: GenerationForm = serde_json::from_str(
            r#"{"clientName":"Acme Advisory","priorityStates":["ca","tx"],
                "multiStateClientCount":"51-100","painPoints":["audits"]}"#,
        )
        .unwrap();
        assert_eq!(form.client_name, "Acme Advisory");
        assert_eq!(form.requested_count(5), 51);
        assert_eq!(form.pain_points, vec!["audits"]);

        let numeric: GenerationForm =
            serde_json::from_str(r#"{"multiStateClientCount": 12}"#).unwrap();
        assert_eq!(numeric.requested_count(5), 12);
    }

    #[test]
    fn normalises_jurisdictions() {
        let defaults = vec!["CA".to_string()];
        let form = GenerationForm {
            priority_states: vec![" ny".into(), "TX".into(), "ny".into(), "".into()],
            ..Default::default()
        };
        assert_eq!(form.jurisdictions(&defaults).unwrap(), vec!["NY", "TX"]);

        let empty = GenerationForm::default();
        assert_eq!(empty.jurisdictions(&defaults).unwrap(), vec!["CA"]);

        let bad = GenerationForm {
            priority_states: vec!["California".into()],
            ..Default::default()
        };
        assert!(bad.jurisdictions(&defaults).is_err());
    }
}
