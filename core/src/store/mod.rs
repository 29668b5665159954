//! Persistence layer.
//!
//! RULE: Only the store module talks to storage.
//! The orchestrator hands rows to a `Repository` and never executes SQL.
//!
//! Every row is scoped by `organization_id`; everything except clients and
//! audit entries also carries the owning `client_id`, and implementations
//! must refuse a satellite whose client does not exist.

use crate::{
    error::SeedResult,
    types::{
        AlertSeverity, AlertStatus, ClientId, EntityId, NexusStatus, OrganizationId, Priority,
        RiskLevel, TaskStatus,
    },
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

// ── Client ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientRow {
    pub id: ClientId,
    pub organization_id: OrganizationId,
    pub name: String,
    /// Unique per organization.
    pub slug: String,
    pub legal_name: String,
    pub tax_id: String,
    pub industry: String,
    pub employee_count: u32,
    pub annual_revenue: f64,
    pub fiscal_year_end: String,
    pub risk_level: RiskLevel,
    pub penalty_exposure: f64,
    pub quality_score: u32,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state_code: Option<String>,
    pub postal_code: Option<String>,
    pub status: String,
    pub notes: Option<String>,
    pub tags: Vec<String>,
    pub custom_fields: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

// ── Monitoring ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientStateRow {
    pub id: EntityId,
    pub organization_id: OrganizationId,
    pub client_id: ClientId,
    pub state_code: String,
    pub state_name: String,
    pub threshold_amount: f64,
    pub current_amount: f64,
    /// Rounded percent of threshold reached. `status` is derived from it.
    pub threshold_ratio: u32,
    pub status: NexusStatus,
    pub penalty_risk: f64,
    pub last_updated: DateTime<Utc>,
}

/// Only ever written for a critical `ClientStateRow`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NexusAlertRow {
    pub id: EntityId,
    pub organization_id: OrganizationId,
    pub client_id: ClientId,
    pub client_state_id: EntityId,
    pub state_code: String,
    pub alert_type: String,
    pub title: String,
    pub description: String,
    pub threshold_amount: f64,
    pub current_amount: f64,
    pub penalty_risk: f64,
    pub priority: Priority,
    pub status: AlertStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NexusActivityRow {
    pub id: EntityId,
    pub organization_id: OrganizationId,
    pub client_id: ClientId,
    pub client_state_id: EntityId,
    pub state_code: String,
    pub activity_type: String,
    pub title: String,
    pub description: String,
    pub amount: f64,
    pub created_at: DateTime<Utc>,
}

/// General alert, written for warning and critical states.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertRow {
    pub id: EntityId,
    pub organization_id: OrganizationId,
    pub client_id: ClientId,
    pub client_state_id: EntityId,
    pub title: String,
    pub description: String,
    pub severity: AlertSeverity,
    pub category: String,
    pub status: AlertStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRow {
    pub id: EntityId,
    pub organization_id: OrganizationId,
    pub client_id: ClientId,
    pub title: String,
    pub description: String,
    pub category: String,
    pub priority: Priority,
    pub status: TaskStatus,
    pub estimated_hours: f64,
    /// 0..=100
    pub progress: u8,
    pub due_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

// ── Satellites ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessProfileRow {
    pub id: EntityId,
    pub organization_id: OrganizationId,
    pub client_id: ClientId,
    pub legal_name: String,
    pub tax_id: String,
    pub industry: String,
    pub employee_count: u32,
    pub annual_revenue: f64,
    pub fiscal_year_end: String,
    /// "b2b", "b2c" or "mixed", from the demographics split.
    pub business_model: String,
    pub primary_jurisdiction: String,
    pub qualification_strategy: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactRow {
    pub id: EntityId,
    pub organization_id: OrganizationId,
    pub client_id: ClientId,
    pub first_name: String,
    pub last_name: String,
    pub title: String,
    pub email: String,
    pub phone: String,
    pub is_primary: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessLocationRow {
    pub id: EntityId,
    pub organization_id: OrganizationId,
    pub client_id: ClientId,
    pub location_type: String,
    pub address: String,
    pub city: String,
    pub state_code: String,
    pub postal_code: String,
    pub employee_count: u32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueBreakdownRow {
    pub id: EntityId,
    pub organization_id: OrganizationId,
    pub client_id: ClientId,
    pub category: String,
    pub amount: f64,
    pub percentage: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDemographicsRow {
    pub id: EntityId,
    pub organization_id: OrganizationId,
    pub client_id: ClientId,
    pub b2b_percentage: f64,
    pub b2c_percentage: f64,
    pub total_customers: u32,
    pub average_order_value: f64,
    pub repeat_customer_rate: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeographicDistributionRow {
    pub id: EntityId,
    pub organization_id: OrganizationId,
    pub client_id: ClientId,
    pub state_code: String,
    pub revenue_percentage: f64,
    pub customer_count: u32,
    pub created_at: DateTime<Utc>,
}

// ── Audit ──────────────────────────────────────────────────────

/// Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditTrailRow {
    pub id: EntityId,
    pub organization_id: OrganizationId,
    pub entity_type: String,
    pub entity_id: EntityId,
    pub action: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// Row count per table for one organization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableCounts {
    pub clients: u64,
    pub client_states: u64,
    pub nexus_alerts: u64,
    pub nexus_activities: u64,
    pub alerts: u64,
    pub tasks: u64,
    pub business_profiles: u64,
    pub contacts: u64,
    pub business_locations: u64,
    pub revenue_breakdowns: u64,
    pub customer_demographics: u64,
    pub geographic_distributions: u64,
    pub audit_entries: u64,
}

impl TableCounts {
    pub fn total(&self) -> u64 {
        self.as_pairs().iter().map(|(_, n)| n).sum()
    }

    /// (table name, count) in schema order.
    pub fn as_pairs(&self) -> [(&'static str, u64); 13] {
        [
            ("client", self.clients),
            ("client_state", self.client_states),
            ("nexus_alert", self.nexus_alerts),
            ("nexus_activity", self.nexus_activities),
            ("alert", self.alerts),
            ("task", self.tasks),
            ("business_profile", self.business_profiles),
            ("contact", self.contacts),
            ("business_location", self.business_locations),
            ("revenue_breakdown", self.revenue_breakdowns),
            ("customer_demographics", self.customer_demographics),
            ("geographic_distribution", self.geographic_distributions),
            ("audit_trail", self.audit_entries),
        ]
    }
}

/// Storage handle passed explicitly to the orchestrator.
#[async_trait]
pub trait Repository: Send + Sync {
    async fn insert_client(&self, row: &ClientRow) -> SeedResult<()>;
    async fn insert_client_state(&self, row: &ClientStateRow) -> SeedResult<()>;
    async fn insert_nexus_alert(&self, row: &NexusAlertRow) -> SeedResult<()>;
    async fn insert_nexus_activity(&self, row: &NexusActivityRow) -> SeedResult<()>;
    async fn insert_alert(&self, row: &AlertRow) -> SeedResult<()>;
    async fn insert_task(&self, row: &TaskRow) -> SeedResult<()>;
    async fn insert_business_profile(&self, row: &BusinessProfileRow) -> SeedResult<()>;
    async fn insert_contact(&self, row: &ContactRow) -> SeedResult<()>;
    async fn insert_business_location(&self, row: &BusinessLocationRow) -> SeedResult<()>;
    async fn insert_revenue_breakdown(&self, row: &RevenueBreakdownRow) -> SeedResult<()>;
    async fn insert_customer_demographics(&self, row: &CustomerDemographicsRow)
        -> SeedResult<()>;
    async fn insert_geographic_distribution(
        &self,
        row: &GeographicDistributionRow,
    ) -> SeedResult<()>;
    async fn insert_audit_entry(&self, row: &AuditTrailRow) -> SeedResult<()>;

    /// Clients of an organization in insertion order.
    async fn clients(&self, organization_id: &str) -> SeedResult<Vec<ClientRow>>;
    async fn client_states(&self, client_id: &str) -> SeedResult<Vec<ClientStateRow>>;
    async fn nexus_alerts(&self, client_id: &str) -> SeedResult<Vec<NexusAlertRow>>;
    async fn alerts(&self, client_id: &str) -> SeedResult<Vec<AlertRow>>;
    async fn tasks(&self, client_id: &str) -> SeedResult<Vec<TaskRow>>;
    async fn audit_entries(&self, organization_id: &str) -> SeedResult<Vec<AuditTrailRow>>;
    async fn table_counts(&self, organization_id: &str) -> SeedResult<TableCounts>;

    /// Bulk "delete all data" for one organization, dependents first.
    /// Returns the number of rows removed.
    async fn delete_organization_data(&self, organization_id: &str) -> SeedResult<u64>;
}
