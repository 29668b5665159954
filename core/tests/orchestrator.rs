//! Batch behaviour of the generation orchestrator: cap, partial failure,
//! total failure, LLM/fallback selection and slug uniqueness.

use async_trait::async_trait;
use nexus_core::{
    clock::FixedClock,
    config::GeneratorConfig,
    error::{SeedError, SeedResult},
    fallback::FallbackGenerator,
    form::{ClientCount, GenerationForm},
    llm::{LlmClient, RecordGenerator},
    orchestrator::Orchestrator,
    risk_policy::{CyclingRiskPolicy, FixedRiskPolicy, RiskLevelPolicy},
    rng::{RngBank, StreamSlot},
    store::*,
    types::{RecordSource, RiskLevel},
};
use parking_lot::Mutex;
use std::sync::Arc;

const ORG: &str = "org-test";

fn form(count: Option<ClientCount>) -> GenerationForm {
    GenerationForm {
        client_name: "Harbor Point Advisors".into(),
        priority_states: vec!["CA".into(), "TX".into(), "FL".into()],
        pain_points: vec!["Marketplace facilitator rules".into()],
        multi_state_client_count: count,
        primary_industry: Some("SaaS".into()),
        qualification_strategy: Some("Quarterly review".into()),
        additional_notes: None,
    }
}

fn orchestrator(
    repo: Arc<dyn Repository>,
    generator: RecordGenerator,
    policy: Box<dyn RiskLevelPolicy>,
) -> Orchestrator {
    Orchestrator::new(
        repo,
        generator,
        policy,
        Arc::new(FixedClock::at_unix(1_700_000_000)),
        GeneratorConfig::default_test(),
    )
}

fn fallback_orchestrator(repo: Arc<dyn Repository>) -> Orchestrator {
    orchestrator(
        repo,
        RecordGenerator::fallback_only(),
        Box::new(CyclingRiskPolicy::new(Vec::new())),
    )
}

// ── Test doubles ───────────────────────────────────────────────

/// Replies with canned text, or an API error when `reply` is `None`.
struct ScriptedLlm {
    reply: Option<String>,
    calls: Mutex<usize>,
}

impl ScriptedLlm {
    fn new(reply: Option<String>) -> Arc<Self> {
        Arc::new(Self {
            reply,
            calls: Mutex::new(0),
        })
    }

    fn calls(&self) -> usize {
        *self.calls.lock()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn complete(&self, _system: &str, _user: &str) -> SeedResult<String> {
        *self.calls.lock() += 1;
        match &self.reply {
            Some(text) => Ok(text.clone()),
            None => Err(SeedError::LlmApi {
                status: 529,
                body: "overloaded".into(),
            }),
        }
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

/// A valid model reply for `risk`, wrapped in prose and a code fence.
fn valid_reply(name: &str, risk: RiskLevel) -> String {
    let mut rng = RngBank::new(7).for_client(StreamSlot::Record, 0);
    let mut record = FallbackGenerator.fallback_client(
        &form(None),
        0,
        risk,
        &["CA".to_string(), "TX".to_string(), "FL".to_string()],
        &mut rng,
    );
    record.name = name.to_string();
    let json = serde_json::to_string_pretty(&record).expect("serialise record");
    format!("Here is the client you asked for:\n```json\n{json}\n```\nLet me know if you need more.")
}

/// Fails writes selected by `fail_client` / `fail_contacts_of_client`.
struct FailingRepo {
    inner: MemoryStore,
    /// 1-based client insert that fails outright.
    fail_client: Option<usize>,
    /// 1-based client whose contact rows fail.
    fail_contacts_of_client: Option<usize>,
    attempts: Mutex<usize>,
    inserted: Mutex<Vec<String>>,
}

impl FailingRepo {
    fn new(fail_client: Option<usize>, fail_contacts_of_client: Option<usize>) -> Self {
        Self {
            inner: MemoryStore::new(),
            fail_client,
            fail_contacts_of_client,
            attempts: Mutex::new(0),
            inserted: Mutex::new(Vec::new()),
        }
    }

    fn fails_every_client() -> Self {
        Self {
            fail_client: Some(0),
            ..Self::new(None, None)
        }
    }
}

#[async_trait]
impl Repository for FailingRepo {
    async fn insert_client(&self, row: &ClientRow) -> SeedResult<()> {
        let attempt = {
            let mut attempts = self.attempts.lock();
            *attempts += 1;
            *attempts
        };
        if self.fail_client == Some(0) || self.fail_client == Some(attempt) {
            return Err(SeedError::Storage("injected client failure".into()));
        }
        self.inner.insert_client(row).await?;
        self.inserted.lock().push(row.id.clone());
        Ok(())
    }
    async fn insert_contact(&self, row: &ContactRow) -> SeedResult<()> {
        let doomed = self
            .fail_contacts_of_client
            .and_then(|n| self.inserted.lock().get(n - 1).cloned());
        if doomed.as_deref() == Some(row.client_id.as_str()) {
            return Err(SeedError::Storage("injected contact failure".into()));
        }
        self.inner.insert_contact(row).await
    }
    async fn insert_client_state(&self, row: &ClientStateRow) -> SeedResult<()> {
        self.inner.insert_client_state(row).await
    }
    async fn insert_nexus_alert(&self, row: &NexusAlertRow) -> SeedResult<()> {
        self.inner.insert_nexus_alert(row).await
    }
    async fn insert_nexus_activity(&self, row: &NexusActivityRow) -> SeedResult<()> {
        self.inner.insert_nexus_activity(row).await
    }
    async fn insert_alert(&self, row: &AlertRow) -> SeedResult<()> {
        self.inner.insert_alert(row).await
    }
    async fn insert_task(&self, row: &TaskRow) -> SeedResult<()> {
        self.inner.insert_task(row).await
    }
    async fn insert_business_profile(&self, row: &BusinessProfileRow) -> SeedResult<()> {
        self.inner.insert_business_profile(row).await
    }
    async fn insert_business_location(&self, row: &BusinessLocationRow) -> SeedResult<()> {
        self.inner.insert_business_location(row).await
    }
    async fn insert_revenue_breakdown(&self, row: &RevenueBreakdownRow) -> SeedResult<()> {
        self.inner.insert_revenue_breakdown(row).await
    }
    async fn insert_customer_demographics(&self, row: &CustomerDemographicsRow) -> SeedResult<()> {
        self.inner.insert_customer_demographics(row).await
    }
    async fn insert_geographic_distribution(
        &self,
        row: &GeographicDistributionRow,
    ) -> SeedResult<()> {
        self.inner.insert_geographic_distribution(row).await
    }
    async fn insert_audit_entry(&self, row: &AuditTrailRow) -> SeedResult<()> {
        self.inner.insert_audit_entry(row).await
    }
    async fn clients(&self, org: &str) -> SeedResult<Vec<ClientRow>> {
        self.inner.clients(org).await
    }
    async fn client_states(&self, client_id: &str) -> SeedResult<Vec<ClientStateRow>> {
        self.inner.client_states(client_id).await
    }
    async fn nexus_alerts(&self, client_id: &str) -> SeedResult<Vec<NexusAlertRow>> {
        self.inner.nexus_alerts(client_id).await
    }
    async fn alerts(&self, client_id: &str) -> SeedResult<Vec<AlertRow>> {
        self.inner.alerts(client_id).await
    }
    async fn tasks(&self, client_id: &str) -> SeedResult<Vec<TaskRow>> {
        self.inner.tasks(client_id).await
    }
    async fn audit_entries(&self, org: &str) -> SeedResult<Vec<AuditTrailRow>> {
        self.inner.audit_entries(org).await
    }
    async fn table_counts(&self, org: &str) -> SeedResult<TableCounts> {
        self.inner.table_counts(org).await
    }
    async fn delete_organization_data(&self, org: &str) -> SeedResult<u64> {
        self.inner.delete_organization_data(org).await
    }
}

// ── Batch size ─────────────────────────────────────────────────

#[tokio::test]
async fn open_ended_label_is_capped_at_twenty() {
    let repo = Arc::new(MemoryStore::new());
    let orch = fallback_orchestrator(repo.clone());

    let result = orch
        .generate_and_persist(&form(Some(ClientCount::Label("250+".into()))), ORG)
        .await
        .expect("generate");

    assert_eq!(result.total_clients, 20);
    assert_eq!(result.requested_clients, 250);
    assert_eq!(result.failed_clients, 0);
    assert_eq!(repo.table_counts(ORG).await.expect("counts").clients, 20);
}

#[tokio::test]
async fn numeric_count_above_cap_is_capped() {
    let repo = Arc::new(MemoryStore::new());
    let result = fallback_orchestrator(repo)
        .generate_and_persist(&form(Some(ClientCount::Number(75))), ORG)
        .await
        .expect("generate");
    assert_eq!(result.total_clients, 20);
}

#[tokio::test]
async fn configured_cap_lowers_batch() {
    let config = GeneratorConfig {
        max_clients: 3,
        ..GeneratorConfig::default_test()
    };
    let orch = Orchestrator::new(
        Arc::new(MemoryStore::new()),
        RecordGenerator::fallback_only(),
        Box::new(FixedRiskPolicy(RiskLevel::Medium)),
        Arc::new(FixedClock::at_unix(0)),
        config,
    );
    let result = orch
        .generate_and_persist(&form(Some(ClientCount::Label("11-50".into()))), ORG)
        .await
        .expect("generate");
    assert_eq!(result.total_clients, 3);
    assert_eq!(result.requested_clients, 11);
}

#[tokio::test]
async fn missing_count_uses_default_of_five() {
    let result = fallback_orchestrator(Arc::new(MemoryStore::new()))
        .generate_and_persist(&form(None), ORG)
        .await
        .expect("generate");
    assert_eq!(result.total_clients, 5);
}

// ── Persistence ────────────────────────────────────────────────

#[tokio::test]
async fn every_client_gets_its_dependent_rows() {
    let repo = Arc::new(MemoryStore::new());
    let result = fallback_orchestrator(repo.clone())
        .generate_and_persist(&form(Some(ClientCount::Number(4))), ORG)
        .await
        .expect("generate");

    let counts = repo.table_counts(ORG).await.expect("counts");
    assert_eq!(counts.clients, 4);
    assert_eq!(counts.client_states, 4 * 3);
    assert_eq!(counts.business_profiles, 4);
    assert_eq!(counts.customer_demographics, 4);
    assert_eq!(counts.audit_entries, 4);
    assert_eq!(counts.revenue_breakdowns, 4 * 3);
    assert_eq!(counts.geographic_distributions, 4 * 3);
    assert!(counts.contacts >= 8);
    assert!(counts.business_locations >= 4);
    assert_eq!(counts.nexus_activities, counts.alerts);

    let audit = repo.audit_entries(ORG).await.expect("audit");
    assert!(audit.iter().all(|a| a.action == "client_created"));

    for generated in &result.clients {
        let states = repo.client_states(&generated.client.id).await.expect("states");
        assert_eq!(states, generated.nexus_data);
        let nexus_alerts = repo.nexus_alerts(&generated.client.id).await.expect("alerts");
        let critical = states
            .iter()
            .filter(|s| s.status == nexus_core::types::NexusStatus::Critical)
            .count();
        assert_eq!(nexus_alerts.len(), critical);
    }
}

#[tokio::test]
async fn result_aggregates_match_clients() {
    let result = fallback_orchestrator(Arc::new(MemoryStore::new()))
        .generate_and_persist(&form(Some(ClientCount::Number(8))), ORG)
        .await
        .expect("generate");

    // Cycling policy: two of each level.
    let dist = result.risk_distribution;
    assert_eq!((dist.low, dist.medium, dist.high, dist.critical), (2, 2, 2, 2));

    let sum: f64 = result.clients.iter().map(|c| c.penalty_exposure).sum();
    assert!((result.total_penalty_exposure - sum).abs() < 0.01);
    assert!(result
        .clients
        .iter()
        .all(|c| c.risk_level == c.client.risk_level && c.source == RecordSource::Fallback));
}

#[tokio::test]
async fn invalid_state_code_is_rejected_before_writing() {
    let repo = Arc::new(MemoryStore::new());
    let mut bad = form(None);
    bad.priority_states = vec!["California".into()];

    let err = fallback_orchestrator(repo.clone())
        .generate_and_persist(&bad, ORG)
        .await
        .expect_err("invalid state code");
    assert!(matches!(err, SeedError::Validation { .. }));
    assert_eq!(repo.table_counts(ORG).await.expect("counts").total(), 0);
}

// ── Failure policy ─────────────────────────────────────────────

#[tokio::test]
async fn one_failing_client_does_not_abort_batch() {
    let repo = Arc::new(FailingRepo::new(None, Some(3)));
    let result = fallback_orchestrator(repo.clone())
        .generate_and_persist(&form(Some(ClientCount::Number(5))), ORG)
        .await
        .expect("partial success is still success");

    assert_eq!(result.total_clients, 4);
    assert_eq!(result.failed_clients, 1);
    assert_eq!(result.requested_clients, 5);

    // The failed client's row is not rolled back.
    let counts = repo.table_counts(ORG).await.expect("counts");
    assert_eq!(counts.clients, 5);
    let failed_id = repo.inserted.lock()[2].clone();
    assert!(result.clients.iter().all(|c| c.client.id != failed_id));
}

#[tokio::test]
async fn client_insert_failure_skips_only_that_client() {
    let repo = Arc::new(FailingRepo::new(Some(2), None));
    let result = fallback_orchestrator(repo.clone())
        .generate_and_persist(&form(Some(ClientCount::Number(4))), ORG)
        .await
        .expect("generate");
    assert_eq!(result.total_clients, 3);
    assert_eq!(result.failed_clients, 1);
}

#[tokio::test]
async fn zero_successes_is_fatal() {
    let repo = Arc::new(FailingRepo::fails_every_client());
    let err = fallback_orchestrator(repo)
        .generate_and_persist(&form(None), ORG)
        .await
        .expect_err("no client can be created");
    assert!(matches!(err, SeedError::NoClientsCreated { requested: 5 }));
}

// ── LLM and fallback ───────────────────────────────────────────

#[tokio::test]
async fn valid_model_reply_is_used() {
    let llm = ScriptedLlm::new(Some(valid_reply("Cobalt Ridge Outfitters", RiskLevel::High)));
    let orch = orchestrator(
        Arc::new(MemoryStore::new()),
        RecordGenerator::new(Some(llm.clone())),
        Box::new(FixedRiskPolicy(RiskLevel::High)),
    );

    let result = orch
        .generate_and_persist(&form(Some(ClientCount::Number(2))), ORG)
        .await
        .expect("generate");

    assert_eq!(llm.calls(), 2);
    assert_eq!(result.llm_clients(), 2);
    for c in &result.clients {
        assert_eq!(c.client.name, "Cobalt Ridge Outfitters");
        assert!(c.client.tags.iter().any(|t| t == "ai-generated"));
    }
}

#[tokio::test]
async fn reply_outside_risk_bucket_falls_back() {
    // Low-risk record offered for a critical client.
    let llm = ScriptedLlm::new(Some(valid_reply("Mismatch Co", RiskLevel::Low)));
    let orch = orchestrator(
        Arc::new(MemoryStore::new()),
        RecordGenerator::new(Some(llm)),
        Box::new(FixedRiskPolicy(RiskLevel::Critical)),
    );
    let result = orch
        .generate_and_persist(&form(Some(ClientCount::Number(1))), ORG)
        .await
        .expect("generate");
    assert_eq!(result.clients[0].source, RecordSource::Fallback);
    assert_eq!(result.clients[0].risk_level, RiskLevel::Critical);
}

#[tokio::test]
async fn garbage_reply_falls_back() {
    let llm = ScriptedLlm::new(Some("I'm sorry, I cannot produce that {not json".into()));
    let orch = orchestrator(
        Arc::new(MemoryStore::new()),
        RecordGenerator::new(Some(llm.clone())),
        Box::new(CyclingRiskPolicy::new(Vec::new())),
    );
    let result = orch
        .generate_and_persist(&form(Some(ClientCount::Number(3))), ORG)
        .await
        .expect("fallback keeps the batch alive");

    assert_eq!(llm.calls(), 3);
    assert_eq!(result.total_clients, 3);
    assert_eq!(result.llm_clients(), 0);
}

#[tokio::test]
async fn api_error_falls_back() {
    let llm = ScriptedLlm::new(None);
    let orch = orchestrator(
        Arc::new(MemoryStore::new()),
        RecordGenerator::new(Some(llm)),
        Box::new(FixedRiskPolicy(RiskLevel::Medium)),
    );
    let result = orch
        .generate_and_persist(&form(Some(ClientCount::Number(2))), ORG)
        .await
        .expect("generate");
    assert!(result.clients.iter().all(|c| c.source == RecordSource::Fallback));
}

#[tokio::test]
async fn identical_names_get_distinct_slugs() {
    let llm = ScriptedLlm::new(Some(valid_reply("Twin Peaks Trading", RiskLevel::Medium)));
    let repo = Arc::new(MemoryStore::new());
    let orch = orchestrator(
        repo.clone(),
        RecordGenerator::new(Some(llm)),
        Box::new(FixedRiskPolicy(RiskLevel::Medium)),
    );
    let result = orch
        .generate_and_persist(&form(Some(ClientCount::Number(3))), ORG)
        .await
        .expect("generate");

    assert_eq!(result.total_clients, 3);
    let mut slugs: Vec<_> = result.clients.iter().map(|c| c.client.slug.clone()).collect();
    assert!(slugs.iter().all(|s| s.starts_with("twin-peaks-trading-")));
    slugs.sort();
    slugs.dedup();
    assert_eq!(slugs.len(), 3);
}
