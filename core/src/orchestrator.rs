//! Generation and persistence of a synthetic client portfolio.
//!
//! RULE: clients are processed one at a time. Within one client, rows that
//! only depend on the client row are written concurrently (stage 1); rows
//! that reference a client state are written after every state exists
//! (stage 2). A client that fails is logged and skipped; only a batch with
//! no successful client is an error.

use crate::{
    clock::{Clock, SystemClock},
    config::GeneratorConfig,
    error::{SeedError, SeedResult},
    form::GenerationForm,
    llm::{AnthropicClient, LlmClient, RecordGenerator},
    monitoring::{MonitoringBuilder, MonitoringPlan},
    name_generator::unique_slug,
    record::ClientRecord,
    risk_policy::{RiskLevelPolicy, UniformRiskPolicy},
    rng::{RngBank, SeedRng, StreamSlot},
    store::{
        AuditTrailRow, BusinessLocationRow, BusinessProfileRow, ClientRow, ClientStateRow,
        ContactRow, CustomerDemographicsRow, GeographicDistributionRow, Repository,
        RevenueBreakdownRow,
    },
    thresholds::round_cents,
    types::{OrganizationId, RecordSource, RiskLevel},
};
use chrono::{DateTime, Utc};
use futures::future::{try_join_all, BoxFuture};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const FISCAL_YEAR_ENDS: [&str; 4] = ["12-31", "06-30", "09-30", "03-31"];

/// Demographic share at which a business counts as purely B2B or B2C.
const DOMINANT_SHARE: f64 = 70.0;

// ── Result contract ────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedClient {
    pub client: ClientRow,
    pub risk_level: RiskLevel,
    pub penalty_exposure: f64,
    pub source: RecordSource,
    pub nexus_data: Vec<ClientStateRow>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskDistribution {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
    pub critical: usize,
}

impl RiskDistribution {
    pub fn record(&mut self, level: RiskLevel) {
        match level {
            RiskLevel::Low => self.low += 1,
            RiskLevel::Medium => self.medium += 1,
            RiskLevel::High => self.high += 1,
            RiskLevel::Critical => self.critical += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.low + self.medium + self.high + self.critical
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub clients: Vec<GeneratedClient>,
    pub total_clients: usize,
    /// What the form asked for, before the cap.
    pub requested_clients: usize,
    pub failed_clients: usize,
    pub risk_distribution: RiskDistribution,
    pub total_penalty_exposure: f64,
    /// Master seed of the run. Replaying it reproduces every generated
    /// value; row ids also depend on the organization and run instant.
    pub seed: u64,
}

impl GenerationResult {
    fn summarise(
        clients: Vec<GeneratedClient>,
        requested_clients: usize,
        failed_clients: usize,
        seed: u64,
    ) -> Self {
        let mut risk_distribution = RiskDistribution::default();
        for c in &clients {
            risk_distribution.record(c.risk_level);
        }
        let total_penalty_exposure = round_cents(clients.iter().map(|c| c.penalty_exposure).sum());
        Self {
            total_clients: clients.len(),
            clients,
            requested_clients,
            failed_clients,
            risk_distribution,
            total_penalty_exposure,
            seed,
        }
    }

    /// Number of clients whose record came from the model.
    pub fn llm_clients(&self) -> usize {
        self.clients
            .iter()
            .filter(|c| c.source == RecordSource::Llm)
            .count()
    }
}

// ── Orchestrator ───────────────────────────────────────────────

pub struct Orchestrator {
    repo: Arc<dyn Repository>,
    generator: RecordGenerator,
    risk_policy: Box<dyn RiskLevelPolicy>,
    clock: Arc<dyn Clock>,
    config: GeneratorConfig,
}

impl Orchestrator {
    pub fn new(
        repo: Arc<dyn Repository>,
        generator: RecordGenerator,
        risk_policy: Box<dyn RiskLevelPolicy>,
        clock: Arc<dyn Clock>,
        config: GeneratorConfig,
    ) -> Self {
        Self {
            repo,
            generator,
            risk_policy,
            clock,
            config,
        }
    }

    /// Production wiring: Anthropic client when a key is configured,
    /// uniform risk levels, wall clock.
    pub fn from_config(repo: Arc<dyn Repository>, config: GeneratorConfig) -> SeedResult<Self> {
        let llm: Option<Arc<dyn LlmClient>> = match AnthropicClient::from_config(&config.llm)? {
            Some(client) => {
                log::info!("orchestrator: LLM generation enabled model={}", config.llm.model);
                Some(Arc::new(client))
            }
            None => {
                log::info!("orchestrator: no LLM API key configured, using fallback generation");
                None
            }
        };
        Ok(Self::new(
            repo,
            RecordGenerator::new(llm),
            Box::new(UniformRiskPolicy),
            Arc::new(SystemClock),
            config,
        ))
    }

    /// Generate up to `min(requested, cap)` clients for `organization_id`
    /// and write every row they imply.
    pub async fn generate_and_persist(
        &self,
        form: &GenerationForm,
        organization_id: &str,
    ) -> SeedResult<GenerationResult> {
        let requested = form.requested_count(self.config.default_client_count);
        let count = form.effective_count(self.config.default_client_count, self.config.client_cap());
        let jurisdictions = form.jurisdictions(&self.config.default_jurisdictions)?;
        let now = self.clock.now();
        let seed = self
            .config
            .seed
            .unwrap_or_else(|| now.timestamp_millis().unsigned_abs());
        let bank = RngBank::new(seed);
        let id_bank = RngBank::new(seed ^ run_salt(organization_id, now));

        log::info!(
            "orchestrator: generating {count} client(s) for org={organization_id} \
             requested={requested} states={} seed={seed} llm={}",
            jurisdictions.join(","),
            self.generator.uses_llm()
        );

        let mut clients = Vec::with_capacity(count);
        let mut failed = 0usize;
        for index in 0..count {
            match self
                .create_client(form, organization_id, index, &jurisdictions, &bank, &id_bank, now)
                .await
            {
                Ok(created) => {
                    log::info!(
                        "orchestrator: client {}/{count} created id={} risk={} source={}",
                        index + 1,
                        created.client.id,
                        created.risk_level,
                        created.source
                    );
                    clients.push(created);
                }
                Err(e) => {
                    failed += 1;
                    log::warn!(
                        "orchestrator: client {}/{count} failed, continuing with next client: {e}",
                        index + 1
                    );
                }
            }
        }

        if clients.is_empty() {
            log::error!("orchestrator: no clients created out of {count}");
            return Err(SeedError::NoClientsCreated { requested: count });
        }

        let result = GenerationResult::summarise(clients, requested, failed, seed);
        log::info!(
            "orchestrator: batch done created={} failed={} penalty_exposure={:.2}",
            result.total_clients,
            result.failed_clients,
            result.total_penalty_exposure
        );
        Ok(result)
    }

    #[allow(clippy::too_many_arguments)]
    async fn create_client(
        &self,
        form: &GenerationForm,
        organization_id: &str,
        index: usize,
        jurisdictions: &[String],
        bank: &RngBank,
        id_bank: &RngBank,
        now: DateTime<Utc>,
    ) -> SeedResult<GeneratedClient> {
        let mut risk_rng = bank.for_client(StreamSlot::RiskPolicy, index);
        let risk_level = self.risk_policy.risk_level(index, &mut risk_rng);

        let mut record_rng = bank.for_client(StreamSlot::Record, index);
        let generated = self
            .generator
            .generate(form, index, risk_level, jurisdictions, &mut record_rng)
            .await;
        let record = &generated.record;
        let fiscal_year_end = *record_rng.pick(&FISCAL_YEAR_ENDS);

        let mut ids = id_bank.for_client(StreamSlot::Persistence, index);
        let client = client_row(
            form,
            organization_id,
            index,
            record,
            generated.source,
            jurisdictions,
            fiscal_year_end,
            &mut ids,
            now,
        );
        self.repo.insert_client(&client).await?;

        let mut monitoring_rng = bank.for_client(StreamSlot::Monitoring, index);
        let plan = MonitoringBuilder::build_monitoring(
            &client,
            jurisdictions,
            &mut monitoring_rng,
            &mut ids,
            now,
        )?;
        let satellites = Satellites::build(form, &client, record, jurisdictions, &mut ids, now);
        let audit = AuditTrailRow {
            id: ids.next_uuid().to_string(),
            organization_id: client.organization_id.clone(),
            entity_type: "client".into(),
            entity_id: client.id.clone(),
            action: "client_created".into(),
            description: format!(
                "Created {} risk client {} ({} record) monitoring {} for {}",
                risk_level,
                client.name,
                generated.source,
                jurisdictions.join(", "),
                form.display_name()
            ),
            created_at: now,
        };

        self.write_stage_one(&plan, &satellites, &audit).await?;
        self.write_stage_two(&plan).await?;

        log::debug!(
            "orchestrator: client={} wrote {} monitoring rows and {} satellite rows",
            client.id,
            plan.row_count(),
            satellites.row_count() + 1
        );

        Ok(GeneratedClient {
            risk_level,
            penalty_exposure: client.penalty_exposure,
            source: generated.source,
            nexus_data: plan.client_states,
            client,
        })
    }

    /// Rows that depend only on the client row.
    async fn write_stage_one(
        &self,
        plan: &MonitoringPlan,
        satellites: &Satellites,
        audit: &AuditTrailRow,
    ) -> SeedResult<()> {
        let repo = &self.repo;
        let mut writes: Vec<BoxFuture<'_, SeedResult<()>>> = Vec::new();
        writes.extend(plan.client_states.iter().map(|s| repo.insert_client_state(s)));
        writes.push(repo.insert_business_profile(&satellites.profile));
        writes.extend(satellites.contacts.iter().map(|c| repo.insert_contact(c)));
        writes.extend(satellites.locations.iter().map(|l| repo.insert_business_location(l)));
        writes.extend(satellites.revenue.iter().map(|r| repo.insert_revenue_breakdown(r)));
        writes.push(repo.insert_customer_demographics(&satellites.demographics));
        writes.extend(
            satellites
                .geography
                .iter()
                .map(|g| repo.insert_geographic_distribution(g)),
        );
        writes.push(repo.insert_audit_entry(audit));
        try_join_all(writes).await?;
        Ok(())
    }

    /// Rows that reference client states.
    async fn write_stage_two(&self, plan: &MonitoringPlan) -> SeedResult<()> {
        let repo = &self.repo;
        let mut writes: Vec<BoxFuture<'_, SeedResult<()>>> = Vec::new();
        writes.extend(plan.nexus_alerts.iter().map(|a| repo.insert_nexus_alert(a)));
        writes.extend(plan.alerts.iter().map(|a| repo.insert_alert(a)));
        writes.extend(plan.activities.iter().map(|a| repo.insert_nexus_activity(a)));
        writes.extend(plan.tasks.iter().map(|t| repo.insert_task(t)));
        try_join_all(writes).await?;
        Ok(())
    }
}

/// Salt for the row-id streams, so repeated runs with one seed never reuse
/// a primary key. FNV-1a over the organization id, mixed with the instant.
fn run_salt(organization_id: &str, now: DateTime<Utc>) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in organization_id.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    hash ^ now.timestamp_millis() as u64
}

#[allow(clippy::too_many_arguments)]
fn client_row(
    form: &GenerationForm,
    organization_id: &str,
    index: usize,
    record: &ClientRecord,
    source: RecordSource,
    jurisdictions: &[String],
    fiscal_year_end: &str,
    ids: &mut SeedRng,
    now: DateTime<Utc>,
) -> ClientRow {
    let contact = record.primary_contact();
    let hq = record.headquarters();
    let organization_id: OrganizationId = organization_id.to_string();

    ClientRow {
        id: ids.next_uuid().to_string(),
        organization_id,
        name: record.name.clone(),
        slug: unique_slug(&record.name, now, index),
        legal_name: record.legal_name.clone(),
        tax_id: record.tax_id.clone(),
        industry: record.industry.clone(),
        employee_count: record.employee_count,
        annual_revenue: record.annual_revenue,
        fiscal_year_end: fiscal_year_end.to_string(),
        risk_level: record.risk_level,
        penalty_exposure: record.penalty_exposure,
        quality_score: record.quality_score,
        email: contact.map(|c| c.email.clone()),
        phone: contact.map(|c| c.phone.clone()),
        address: hq.map(|l| l.address.clone()),
        city: hq.map(|l| l.city.clone()),
        state_code: hq.map(|l| l.state_code.clone()),
        postal_code: hq.map(|l| l.postal_code.clone()),
        status: "active".into(),
        notes: form.client_notes(),
        tags: vec![
            "multi-state".into(),
            format!("{}-risk", record.risk_level),
            match source {
                RecordSource::Llm => "ai-generated".into(),
                RecordSource::Fallback => "synthetic".into(),
            },
        ],
        custom_fields: serde_json::json!({
            "generationIndex": index + 1,
            "source": source.as_str(),
            "advisoryFirm": form.display_name(),
            "monitoredStates": jurisdictions,
            "primaryIndustry": form.primary_industry,
            "qualificationStrategy": form.qualification_strategy,
        }),
        created_at: now,
    }
}

/// Satellite rows for one client, built before any is written.
struct Satellites {
    profile: BusinessProfileRow,
    contacts: Vec<ContactRow>,
    locations: Vec<BusinessLocationRow>,
    revenue: Vec<RevenueBreakdownRow>,
    demographics: CustomerDemographicsRow,
    geography: Vec<GeographicDistributionRow>,
}

impl Satellites {
    fn build(
        form: &GenerationForm,
        client: &ClientRow,
        record: &ClientRecord,
        jurisdictions: &[String],
        ids: &mut SeedRng,
        now: DateTime<Utc>,
    ) -> Self {
        let org = &client.organization_id;
        let client_id = &client.id;
        let demo = &record.customer_demographics;

        let business_model = if demo.b2b_percentage >= DOMINANT_SHARE {
            "b2b"
        } else if demo.b2c_percentage >= DOMINANT_SHARE {
            "b2c"
        } else {
            "mixed"
        };
        let primary_jurisdiction = client
            .state_code
            .clone()
            .or_else(|| jurisdictions.first().cloned())
            .unwrap_or_default();

        let profile = BusinessProfileRow {
            id: ids.next_uuid().to_string(),
            organization_id: org.clone(),
            client_id: client_id.clone(),
            legal_name: record.legal_name.clone(),
            tax_id: record.tax_id.clone(),
            industry: record.industry.clone(),
            employee_count: record.employee_count,
            annual_revenue: record.annual_revenue,
            fiscal_year_end: client.fiscal_year_end.clone(),
            business_model: business_model.into(),
            primary_jurisdiction,
            qualification_strategy: form.qualification_strategy.clone(),
            created_at: now,
        };

        let contacts = record
            .contacts
            .iter()
            .map(|c| ContactRow {
                id: ids.next_uuid().to_string(),
                organization_id: org.clone(),
                client_id: client_id.clone(),
                first_name: c.first_name.clone(),
                last_name: c.last_name.clone(),
                title: c.title.clone(),
                email: c.email.clone(),
                phone: c.phone.clone(),
                is_primary: c.is_primary,
                created_at: now,
            })
            .collect();

        let locations = record
            .business_locations
            .iter()
            .map(|l| BusinessLocationRow {
                id: ids.next_uuid().to_string(),
                organization_id: org.clone(),
                client_id: client_id.clone(),
                location_type: l.location_type.clone(),
                address: l.address.clone(),
                city: l.city.clone(),
                state_code: l.state_code.clone(),
                postal_code: l.postal_code.clone(),
                employee_count: l.employee_count,
                created_at: now,
            })
            .collect();

        let revenue = record
            .revenue_breakdowns
            .iter()
            .map(|r| RevenueBreakdownRow {
                id: ids.next_uuid().to_string(),
                organization_id: org.clone(),
                client_id: client_id.clone(),
                category: r.category.clone(),
                amount: r.amount,
                percentage: r.percentage,
                created_at: now,
            })
            .collect();

        let demographics = CustomerDemographicsRow {
            id: ids.next_uuid().to_string(),
            organization_id: org.clone(),
            client_id: client_id.clone(),
            b2b_percentage: demo.b2b_percentage,
            b2c_percentage: demo.b2c_percentage,
            total_customers: demo.total_customers,
            average_order_value: demo.average_order_value,
            repeat_customer_rate: demo.repeat_customer_rate,
            created_at: now,
        };

        let geography = record
            .geographic_distributions
            .iter()
            .map(|g| GeographicDistributionRow {
                id: ids.next_uuid().to_string(),
                organization_id: org.clone(),
                client_id: client_id.clone(),
                state_code: g.state_code.clone(),
                revenue_percentage: g.revenue_percentage,
                customer_count: g.customer_count,
                created_at: now,
            })
            .collect();

        Self {
            profile,
            contacts,
            locations,
            revenue,
            demographics,
            geography,
        }
    }

    fn row_count(&self) -> usize {
        2 + self.contacts.len() + self.locations.len() + self.revenue.len() + self.geography.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn risk_distribution_counts_each_level() {
        let mut dist = RiskDistribution::default();
        for level in [RiskLevel::Low, RiskLevel::High, RiskLevel::High, RiskLevel::Critical] {
            dist.record(level);
        }
        assert_eq!(
            dist,
            RiskDistribution {
                low: 1,
                medium: 0,
                high: 2,
                critical: 1
            }
        );
        assert_eq!(dist.total(), 4);
    }

    #[test]
    fn result_serialises_camel_case() {
        let result = GenerationResult::summarise(Vec::new(), 7, 2, 42);
        let json = serde_json::to_value(&result).unwrap();
        for key in [
            "clients",
            "totalClients",
            "requestedClients",
            "failedClients",
            "riskDistribution",
            "totalPenaltyExposure",
        ] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert_eq!(json["riskDistribution"]["critical"], 0);
    }
}
