//! In-process repository.
//!
//! Enforces what the SQLite schema enforces: unique ids, unique
//! (organization, slug), and that every satellite's client (and, for alerts
//! and activities, client state) already exists.

use super::*;
use crate::error::{SeedError, SeedResult};
use parking_lot::Mutex;

#[derive(Default)]
struct Tables {
    clients: Vec<ClientRow>,
    client_states: Vec<ClientStateRow>,
    nexus_alerts: Vec<NexusAlertRow>,
    nexus_activities: Vec<NexusActivityRow>,
    alerts: Vec<AlertRow>,
    tasks: Vec<TaskRow>,
    business_profiles: Vec<BusinessProfileRow>,
    contacts: Vec<ContactRow>,
    business_locations: Vec<BusinessLocationRow>,
    revenue_breakdowns: Vec<RevenueBreakdownRow>,
    customer_demographics: Vec<CustomerDemographicsRow>,
    geographic_distributions: Vec<GeographicDistributionRow>,
    audit_entries: Vec<AuditTrailRow>,
}

impl Tables {
    fn require_client(&self, client_id: &str, table: &str) -> SeedResult<()> {
        if self.clients.iter().any(|c| c.id == client_id) {
            Ok(())
        } else {
            Err(SeedError::Storage(format!(
                "{table}: foreign key violation, no client {client_id}"
            )))
        }
    }

    fn require_state(&self, client_state_id: &str, table: &str) -> SeedResult<()> {
        if self.client_states.iter().any(|s| s.id == client_state_id) {
            Ok(())
        } else {
            Err(SeedError::Storage(format!(
                "{table}: foreign key violation, no client_state {client_state_id}"
            )))
        }
    }
}

fn require_new_id<'a>(
    mut existing: impl Iterator<Item = &'a str>,
    id: &str,
    table: &str,
) -> SeedResult<()> {
    if existing.any(|e| e == id) {
        return Err(SeedError::Storage(format!("{table}: duplicate id {id}")));
    }
    Ok(())
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Satellite insert: id unique, client exists.
macro_rules! insert_satellite {
    ($self:ident, $row:ident, $table:ident, $name:literal) => {{
        let mut t = $self.tables.lock();
        require_new_id(t.$table.iter().map(|r| r.id.as_str()), &$row.id, $name)?;
        t.require_client(&$row.client_id, $name)?;
        t.$table.push($row.clone());
        Ok(())
    }};
}

#[async_trait]
impl Repository for MemoryStore {
    async fn insert_client(&self, row: &ClientRow) -> SeedResult<()> {
        let mut t = self.tables.lock();
        require_new_id(t.clients.iter().map(|c| c.id.as_str()), &row.id, "client")?;
        if t
            .clients
            .iter()
            .any(|c| c.organization_id == row.organization_id && c.slug == row.slug)
        {
            return Err(SeedError::Storage(format!(
                "client: slug '{}' already used in organization {}",
                row.slug, row.organization_id
            )));
        }
        t.clients.push(row.clone());
        Ok(())
    }

    async fn insert_client_state(&self, row: &ClientStateRow) -> SeedResult<()> {
        let mut t = self.tables.lock();
        require_new_id(t.client_states.iter().map(|s| s.id.as_str()), &row.id, "client_state")?;
        t.require_client(&row.client_id, "client_state")?;
        if t
            .client_states
            .iter()
            .any(|s| s.client_id == row.client_id && s.state_code == row.state_code)
        {
            return Err(SeedError::Storage(format!(
                "client_state: {} already tracked for client {}",
                row.state_code, row.client_id
            )));
        }
        t.client_states.push(row.clone());
        Ok(())
    }

    async fn insert_nexus_alert(&self, row: &NexusAlertRow) -> SeedResult<()> {
        let mut t = self.tables.lock();
        require_new_id(t.nexus_alerts.iter().map(|a| a.id.as_str()), &row.id, "nexus_alert")?;
        t.require_client(&row.client_id, "nexus_alert")?;
        t.require_state(&row.client_state_id, "nexus_alert")?;
        t.nexus_alerts.push(row.clone());
        Ok(())
    }

    async fn insert_nexus_activity(&self, row: &NexusActivityRow) -> SeedResult<()> {
        let mut t = self.tables.lock();
        require_new_id(
            t.nexus_activities.iter().map(|a| a.id.as_str()),
            &row.id,
            "nexus_activity",
        )?;
        t.require_client(&row.client_id, "nexus_activity")?;
        t.require_state(&row.client_state_id, "nexus_activity")?;
        t.nexus_activities.push(row.clone());
        Ok(())
    }

    async fn insert_alert(&self, row: &AlertRow) -> SeedResult<()> {
        let mut t = self.tables.lock();
        require_new_id(t.alerts.iter().map(|a| a.id.as_str()), &row.id, "alert")?;
        t.require_client(&row.client_id, "alert")?;
        t.require_state(&row.client_state_id, "alert")?;
        t.alerts.push(row.clone());
        Ok(())
    }

    async fn insert_task(&self, row: &TaskRow) -> SeedResult<()> {
        if row.progress > 100 {
            return Err(SeedError::Storage(format!(
                "task: progress {} out of range",
                row.progress
            )));
        }
        insert_satellite!(self, row, tasks, "task")
    }

    async fn insert_business_profile(&self, row: &BusinessProfileRow) -> SeedResult<()> {
        {
            let t = self.tables.lock();
            if t.business_profiles.iter().any(|p| p.client_id == row.client_id) {
                return Err(SeedError::Storage(format!(
                    "business_profile: client {} already has a profile",
                    row.client_id
                )));
            }
        }
        insert_satellite!(self, row, business_profiles, "business_profile")
    }

    async fn insert_contact(&self, row: &ContactRow) -> SeedResult<()> {
        insert_satellite!(self, row, contacts, "contact")
    }

    async fn insert_business_location(&self, row: &BusinessLocationRow) -> SeedResult<()> {
        insert_satellite!(self, row, business_locations, "business_location")
    }

    async fn insert_revenue_breakdown(&self, row: &RevenueBreakdownRow) -> SeedResult<()> {
        insert_satellite!(self, row, revenue_breakdowns, "revenue_breakdown")
    }

    async fn insert_customer_demographics(
        &self,
        row: &CustomerDemographicsRow,
    ) -> SeedResult<()> {
        {
            let t = self.tables.lock();
            if t.customer_demographics.iter().any(|d| d.client_id == row.client_id) {
                return Err(SeedError::Storage(format!(
                    "customer_demographics: client {} already has demographics",
                    row.client_id
                )));
            }
        }
        insert_satellite!(self, row, customer_demographics, "customer_demographics")
    }

    async fn insert_geographic_distribution(
        &self,
        row: &GeographicDistributionRow,
    ) -> SeedResult<()> {
        insert_satellite!(self, row, geographic_distributions, "geographic_distribution")
    }

    async fn insert_audit_entry(&self, row: &AuditTrailRow) -> SeedResult<()> {
        let mut t = self.tables.lock();
        require_new_id(t.audit_entries.iter().map(|a| a.id.as_str()), &row.id, "audit_trail")?;
        t.audit_entries.push(row.clone());
        Ok(())
    }

    async fn clients(&self, organization_id: &str) -> SeedResult<Vec<ClientRow>> {
        let t = self.tables.lock();
        Ok(t.clients
            .iter()
            .filter(|c| c.organization_id == organization_id)
            .cloned()
            .collect())
    }

    async fn client_states(&self, client_id: &str) -> SeedResult<Vec<ClientStateRow>> {
        let t = self.tables.lock();
        Ok(t.client_states
            .iter()
            .filter(|s| s.client_id == client_id)
            .cloned()
            .collect())
    }

    async fn nexus_alerts(&self, client_id: &str) -> SeedResult<Vec<NexusAlertRow>> {
        let t = self.tables.lock();
        Ok(t.nexus_alerts
            .iter()
            .filter(|a| a.client_id == client_id)
            .cloned()
            .collect())
    }

    async fn alerts(&self, client_id: &str) -> SeedResult<Vec<AlertRow>> {
        let t = self.tables.lock();
        Ok(t.alerts
            .iter()
            .filter(|a| a.client_id == client_id)
            .cloned()
            .collect())
    }

    async fn tasks(&self, client_id: &str) -> SeedResult<Vec<TaskRow>> {
        let t = self.tables.lock();
        Ok(t.tasks
            .iter()
            .filter(|task| task.client_id == client_id)
            .cloned()
            .collect())
    }

    async fn audit_entries(&self, organization_id: &str) -> SeedResult<Vec<AuditTrailRow>> {
        let t = self.tables.lock();
        Ok(t.audit_entries
            .iter()
            .filter(|a| a.organization_id == organization_id)
            .cloned()
            .collect())
    }

    async fn table_counts(&self, organization_id: &str) -> SeedResult<TableCounts> {
        let t = self.tables.lock();
        let org = organization_id;
        let count = |n: usize| n as u64;
        Ok(TableCounts {
            clients: count(t.clients.iter().filter(|r| r.organization_id == org).count()),
            client_states: count(t.client_states.iter().filter(|r| r.organization_id == org).count()),
            nexus_alerts: count(t.nexus_alerts.iter().filter(|r| r.organization_id == org).count()),
            nexus_activities: count(
                t.nexus_activities.iter().filter(|r| r.organization_id == org).count(),
            ),
            alerts: count(t.alerts.iter().filter(|r| r.organization_id == org).count()),
            tasks: count(t.tasks.iter().filter(|r| r.organization_id == org).count()),
            business_profiles: count(
                t.business_profiles.iter().filter(|r| r.organization_id == org).count(),
            ),
            contacts: count(t.contacts.iter().filter(|r| r.organization_id == org).count()),
            business_locations: count(
                t.business_locations.iter().filter(|r| r.organization_id == org).count(),
            ),
            revenue_breakdowns: count(
                t.revenue_breakdowns.iter().filter(|r| r.organization_id == org).count(),
            ),
            customer_demographics: count(
                t.customer_demographics.iter().filter(|r| r.organization_id == org).count(),
            ),
            geographic_distributions: count(
                t.geographic_distributions
                    .iter()
                    .filter(|r| r.organization_id == org)
                    .count(),
            ),
            audit_entries: count(t.audit_entries.iter().filter(|r| r.organization_id == org).count()),
        })
    }

    async fn delete_organization_data(&self, organization_id: &str) -> SeedResult<u64> {
        let mut t = self.tables.lock();
        let before = total_rows(&t);
        let keep = |org: &str| org != organization_id;
        t.nexus_alerts.retain(|r| keep(&r.organization_id));
        t.nexus_activities.retain(|r| keep(&r.organization_id));
        t.alerts.retain(|r| keep(&r.organization_id));
        t.tasks.retain(|r| keep(&r.organization_id));
        t.client_states.retain(|r| keep(&r.organization_id));
        t.business_profiles.retain(|r| keep(&r.organization_id));
        t.contacts.retain(|r| keep(&r.organization_id));
        t.business_locations.retain(|r| keep(&r.organization_id));
        t.revenue_breakdowns.retain(|r| keep(&r.organization_id));
        t.customer_demographics.retain(|r| keep(&r.organization_id));
        t.geographic_distributions.retain(|r| keep(&r.organization_id));
        t.audit_entries.retain(|r| keep(&r.organization_id));
        t.clients.retain(|r| keep(&r.organization_id));
        let removed = (before - total_rows(&t)) as u64;
        log::info!("store: deleted {removed} rows for organization {organization_id}");
        Ok(removed)
    }
}

fn total_rows(t: &Tables) -> usize {
    t.clients.len()
        + t.client_states.len()
        + t.nexus_alerts.len()
        + t.nexus_activities.len()
        + t.alerts.len()
        + t.tasks.len()
        + t.business_profiles.len()
        + t.contacts.len()
        + t.business_locations.len()
        + t.revenue_breakdowns.len()
        + t.customer_demographics.len()
        + t.geographic_distributions.len()
        + t.audit_entries.len()
}
