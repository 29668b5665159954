//! Nexus monitoring rows for one client: a state row per jurisdiction, the
//! alerts and activities those states imply, and follow-up tasks.
//!
//! RULE: status is computed exactly once per jurisdiction, in
//! `assess_jurisdiction`. Alert, activity and task emission read the
//! resulting `StateAssessment`; nothing re-derives status from amounts.

use crate::{
    error::SeedResult,
    risk_policy::RiskBucket,
    rng::SeedRng,
    store::{AlertRow, ClientRow, ClientStateRow, NexusActivityRow, NexusAlertRow, TaskRow},
    thresholds::{
        lookup_jurisdiction, penalty_risk, round_cents, status_for_ratio, threshold_ratio,
        JurisdictionInfo,
    },
    types::{AlertSeverity, AlertStatus, NexusStatus, Priority, RiskLevel, TaskStatus},
};
use chrono::{DateTime, Duration, Utc};

/// Share of annual revenue attributed to a single jurisdiction before the
/// risk multiplier and jitter.
pub const BASE_STATE_SHARE: f64 = 0.10;
pub const JITTER_MIN: f64 = 0.8;
pub const JITTER_MAX: f64 = 1.2;

/// Ratio at or above which a breach is escalated to critical priority.
pub const ESCALATION_RATIO: u32 = 150;

pub const REGISTRATION_HOURS_PER_STATE: f64 = 4.0;
pub const REGISTRATION_DUE_DAYS: i64 = 30;

/// Result of assessing one jurisdiction.
#[derive(Debug, Clone, PartialEq)]
pub struct StateAssessment {
    pub jurisdiction: JurisdictionInfo,
    pub current_amount: f64,
    pub ratio: u32,
    pub status: NexusStatus,
    pub penalty_risk: f64,
}

impl StateAssessment {
    /// Threshold exceeded.
    pub fn needs_nexus_alert(&self) -> bool {
        self.status == NexusStatus::Critical
    }

    /// Approaching or exceeded.
    pub fn needs_alert(&self) -> bool {
        matches!(self.status, NexusStatus::Warning | NexusStatus::Critical)
    }
}

/// Assess `current_amount` of sales against the jurisdiction's threshold.
pub fn assess_jurisdiction(code: &str, current_amount: f64) -> SeedResult<StateAssessment> {
    assess(lookup_jurisdiction(code), current_amount)
}

/// Same as `assess_jurisdiction` for an explicit jurisdiction record.
pub fn assess(jurisdiction: JurisdictionInfo, current_amount: f64) -> SeedResult<StateAssessment> {
    let ratio = threshold_ratio(jurisdiction.threshold, current_amount)?;
    let status = status_for_ratio(ratio);
    Ok(StateAssessment {
        penalty_risk: penalty_risk(status, current_amount),
        jurisdiction,
        current_amount,
        ratio,
        status,
    })
}

/// In-state sales estimate: revenue × 10 % × risk multiplier × jitter.
pub fn estimate_current_amount(annual_revenue: f64, risk_level: RiskLevel, rng: &mut SeedRng) -> f64 {
    let multiplier = RiskBucket::for_level(risk_level).exposure_multiplier;
    let jitter = rng.range_f64(JITTER_MIN, JITTER_MAX);
    round_cents(annual_revenue * BASE_STATE_SHARE * multiplier * jitter)
}

/// Everything the monitoring builder wants written for one client.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonitoringPlan {
    pub client_states: Vec<ClientStateRow>,
    pub nexus_alerts: Vec<NexusAlertRow>,
    pub alerts: Vec<AlertRow>,
    pub activities: Vec<NexusActivityRow>,
    pub tasks: Vec<TaskRow>,
}

impl MonitoringPlan {
    pub fn total_penalty_risk(&self) -> f64 {
        round_cents(self.client_states.iter().map(|s| s.penalty_risk).sum())
    }

    pub fn row_count(&self) -> usize {
        self.client_states.len()
            + self.nexus_alerts.len()
            + self.alerts.len()
            + self.activities.len()
            + self.tasks.len()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MonitoringBuilder;

impl MonitoringBuilder {
    /// Build monitoring rows for `client` across `jurisdictions`.
    ///
    /// Amounts are drawn from `rng`, row ids from `ids`; every timestamp is
    /// `now`.
    pub fn build_monitoring(
        client: &ClientRow,
        jurisdictions: &[String],
        rng: &mut SeedRng,
        ids: &mut SeedRng,
        now: DateTime<Utc>,
    ) -> SeedResult<MonitoringPlan> {
        let mut plan = MonitoringPlan::default();

        for code in jurisdictions {
            let current = estimate_current_amount(client.annual_revenue, client.risk_level, rng);
            let assessment = assess_jurisdiction(code, current)?;
            let state = Self::state_row(client, &assessment, ids, now);

            if assessment.needs_nexus_alert() {
                plan.nexus_alerts
                    .push(Self::nexus_alert_row(client, &state, &assessment, ids, now));
            }
            if assessment.needs_alert() {
                plan.alerts.push(Self::alert_row(client, &state, &assessment, ids, now));
                plan.activities
                    .push(Self::activity_row(client, &state, &assessment, ids, now));
            }
            plan.client_states.push(state);
        }

        if let Some(task) = Self::risk_assessment_task(client, ids, now) {
            plan.tasks.push(task);
        }
        if !plan.nexus_alerts.is_empty() {
            plan.tasks
                .push(Self::registration_task(client, &plan.nexus_alerts, ids, now));
        }

        log::debug!(
            "monitoring: client={} states={} nexus_alerts={} alerts={} tasks={}",
            client.id,
            plan.client_states.len(),
            plan.nexus_alerts.len(),
            plan.alerts.len(),
            plan.tasks.len()
        );
        Ok(plan)
    }

    fn state_row(
        client: &ClientRow,
        a: &StateAssessment,
        rng: &mut SeedRng,
        now: DateTime<Utc>,
    ) -> ClientStateRow {
        ClientStateRow {
            id: rng.next_uuid().to_string(),
            organization_id: client.organization_id.clone(),
            client_id: client.id.clone(),
            state_code: a.jurisdiction.code.clone(),
            state_name: a.jurisdiction.name.clone(),
            threshold_amount: a.jurisdiction.threshold,
            current_amount: a.current_amount,
            threshold_ratio: a.ratio,
            status: a.status,
            penalty_risk: a.penalty_risk,
            last_updated: now,
        }
    }

    fn nexus_alert_row(
        client: &ClientRow,
        state: &ClientStateRow,
        a: &StateAssessment,
        rng: &mut SeedRng,
        now: DateTime<Utc>,
    ) -> NexusAlertRow {
        let priority = if a.ratio >= ESCALATION_RATIO {
            Priority::Critical
        } else {
            Priority::High
        };
        NexusAlertRow {
            id: rng.next_uuid().to_string(),
            organization_id: client.organization_id.clone(),
            client_id: client.id.clone(),
            client_state_id: state.id.clone(),
            state_code: state.state_code.clone(),
            alert_type: "threshold_exceeded".into(),
            title: format!("{} economic nexus threshold exceeded", state.state_name),
            description: format!(
                "{} sales of {} are {}% of the {} threshold. Estimated uncollected tax {}.",
                client.name,
                usd(state.current_amount),
                state.threshold_ratio,
                usd(state.threshold_amount),
                usd(state.penalty_risk)
            ),
            threshold_amount: state.threshold_amount,
            current_amount: state.current_amount,
            penalty_risk: state.penalty_risk,
            priority,
            status: AlertStatus::Open,
            created_at: now,
        }
    }

    fn alert_row(
        client: &ClientRow,
        state: &ClientStateRow,
        a: &StateAssessment,
        rng: &mut SeedRng,
        now: DateTime<Utc>,
    ) -> AlertRow {
        let (severity, verb) = match a.status {
            NexusStatus::Critical => (AlertSeverity::Critical, "exceeded"),
            _ => (AlertSeverity::Medium, "approaching"),
        };
        AlertRow {
            id: rng.next_uuid().to_string(),
            organization_id: client.organization_id.clone(),
            client_id: client.id.clone(),
            client_state_id: state.id.clone(),
            title: format!("{} nexus threshold {verb}", state.state_name),
            description: format!(
                "{} has reached {}% of the {} threshold ({} of {}).",
                client.name,
                state.threshold_ratio,
                state.state_code,
                usd(state.current_amount),
                usd(state.threshold_amount)
            ),
            severity,
            category: "nexus_threshold".into(),
            status: AlertStatus::Open,
            created_at: now,
        }
    }

    fn activity_row(
        client: &ClientRow,
        state: &ClientStateRow,
        a: &StateAssessment,
        rng: &mut SeedRng,
        now: DateTime<Utc>,
    ) -> NexusActivityRow {
        let (activity_type, title) = match a.status {
            NexusStatus::Critical => (
                "threshold_exceeded",
                format!("Threshold exceeded in {}", state.state_name),
            ),
            _ => (
                "threshold_approaching",
                format!("Approaching threshold in {}", state.state_name),
            ),
        };
        NexusActivityRow {
            id: rng.next_uuid().to_string(),
            organization_id: client.organization_id.clone(),
            client_id: client.id.clone(),
            client_state_id: state.id.clone(),
            state_code: state.state_code.clone(),
            activity_type: activity_type.into(),
            title,
            description: format!(
                "Sales reached {} against a {} threshold ({}%).",
                usd(state.current_amount),
                usd(state.threshold_amount),
                state.threshold_ratio
            ),
            amount: state.current_amount,
            created_at: now,
        }
    }

    /// High and critical clients get a risk assessment; others get none.
    fn risk_assessment_task(
        client: &ClientRow,
        rng: &mut SeedRng,
        now: DateTime<Utc>,
    ) -> Option<TaskRow> {
        let (priority, hours, due_days) = match client.risk_level {
            RiskLevel::Critical => (Priority::Critical, 12.0, 7),
            RiskLevel::High => (Priority::High, 8.0, 14),
            RiskLevel::Medium | RiskLevel::Low => return None,
        };
        Some(TaskRow {
            id: rng.next_uuid().to_string(),
            organization_id: client.organization_id.clone(),
            client_id: client.id.clone(),
            title: format!("Nexus risk assessment for {}", client.name),
            description: format!(
                "Review {} multi-state exposure ({} risk, estimated penalty exposure {}).",
                client.name,
                client.risk_level,
                usd(client.penalty_exposure)
            ),
            category: "risk_assessment".into(),
            priority,
            status: TaskStatus::Pending,
            estimated_hours: hours,
            progress: 0,
            due_date: now + Duration::days(due_days),
            created_at: now,
        })
    }

    fn registration_task(
        client: &ClientRow,
        breaches: &[NexusAlertRow],
        rng: &mut SeedRng,
        now: DateTime<Utc>,
    ) -> TaskRow {
        let codes: Vec<&str> = breaches.iter().map(|a| a.state_code.as_str()).collect();
        let exposure: f64 = breaches.iter().map(|a| a.penalty_risk).sum();
        TaskRow {
            id: rng.next_uuid().to_string(),
            organization_id: client.organization_id.clone(),
            client_id: client.id.clone(),
            title: format!("Register and remediate nexus in {} state(s)", codes.len()),
            description: format!(
                "Register for sales tax and file voluntary disclosures in {}. Estimated uncollected tax {}.",
                codes.join(", "),
                usd(round_cents(exposure))
            ),
            category: "registration".into(),
            priority: Priority::High,
            status: TaskStatus::Pending,
            estimated_hours: REGISTRATION_HOURS_PER_STATE * codes.len() as f64,
            progress: 0,
            due_date: now + Duration::days(REGISTRATION_DUE_DAYS),
            created_at: now,
        }
    }
}

/// `$1,234,567.89`
fn usd(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    let sign = if amount < 0.0 { "-" } else { "" };
    format!("{sign}${grouped}.{:02}", cents % 100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::{RngBank, StreamSlot};

    #[test]
    fn usd_groups_thousands() {
        assert_eq!(usd(0.0), "$0.00");
        assert_eq!(usd(999.5), "$999.50");
        assert_eq!(usd(1_234_567.891), "$1,234,567.89");
        assert_eq!(usd(100_000.0), "$100,000.00");
    }

    #[test]
    fn penalty_risk_only_on_breach() {
        let breach = assess_jurisdiction("FL", 120_000.0).unwrap();
        assert_eq!(breach.status, NexusStatus::Critical);
        assert_eq!(breach.penalty_risk, 8_700.0);

        let warning = assess_jurisdiction("FL", 90_000.0).unwrap();
        assert_eq!(warning.status, NexusStatus::Warning);
        assert_eq!(warning.penalty_risk, 0.0);
    }

    #[test]
    fn current_amount_stays_in_jitter_band() {
        let mut rng = RngBank::new(3).for_client(StreamSlot::Monitoring, 0);
        for level in RiskLevel::ALL {
            let m = RiskBucket::for_level(*level).exposure_multiplier;
            for _ in 0..200 {
                let v = estimate_current_amount(1_000_000.0, *level, &mut rng);
                assert!(v >= 100_000.0 * m * JITTER_MIN - 0.01, "{v}");
                assert!(v <= 100_000.0 * m * JITTER_MAX + 0.01, "{v}");
            }
        }
    }

    #[test]
    fn negative_amount_is_rejected() {
        assert!(assess_jurisdiction("TX", -1.0).is_err());
    }
}
