//! SQLite-backed repository.
//!
//! rusqlite is synchronous and the connection sits behind one mutex, so the
//! concurrent writes of a stage are serialized here.

use super::*;
use crate::error::SeedResult;
use parking_lot::Mutex;
use rusqlite::{
    params,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, Type, ValueRef},
    Connection, Row, ToSql,
};
use serde::de::DeserializeOwned;

/// Tables in delete order: anything referencing client_state first, then
/// the other satellites, then clients.
const DELETE_ORDER: [&str; 13] = [
    "nexus_alert",
    "nexus_activity",
    "alert",
    "task",
    "client_state",
    "business_profile",
    "contact",
    "business_location",
    "revenue_breakdown",
    "customer_demographics",
    "geographic_distribution",
    "audit_trail",
    "client",
];

pub struct SqliteStore {
    conn: Mutex<Connection>,
    path: Option<String>, // None for :memory:, Some(path) for file
}

impl SqliteStore {
    pub fn open(path: &str) -> SeedResult<Self> {
        if path == ":memory:" {
            return Self::in_memory();
        }
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: Some(path.to_string()),
        })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> SeedResult<Self> {
        let conn = Connection::open(":memory:")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: None,
        })
    }

    /// Open and migrate in one step.
    pub fn open_migrated(path: &str) -> SeedResult<Self> {
        let store = Self::open(path)?;
        store.migrate()?;
        Ok(store)
    }

    /// Apply all schema migrations in order. Idempotent.
    pub fn migrate(&self) -> SeedResult<()> {
        self.conn
            .lock()
            .execute_batch(include_str!("../../../migrations/001_nexus_schema.sql"))?;
        Ok(())
    }

    fn execute(&self, sql: &str, params: &[&dyn ToSql]) -> SeedResult<()> {
        self.conn.lock().execute(sql, params)?;
        Ok(())
    }

    fn query<T>(
        &self,
        sql: &str,
        key: &str,
        map: impl FnMut(&Row<'_>) -> rusqlite::Result<T>,
    ) -> SeedResult<Vec<T>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
            .query_map(params![key], map)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn count(&self, table: &str, organization_id: &str) -> SeedResult<u64> {
        let n: i64 = self.conn.lock().query_row(
            &format!("SELECT COUNT(*) FROM {table} WHERE organization_id = ?1"),
            params![organization_id],
            |row| row.get(0),
        )?;
        Ok(n as u64)
    }
}

/// JSON-encoded TEXT column.
fn json_column<T: DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let text: String = row.get(idx)?;
    serde_json::from_str(&text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

macro_rules! sql_label {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl ToSql for $ty {
                fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                    Ok(ToSqlOutput::from(self.as_str()))
                }
            }

            impl FromSql for $ty {
                fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                    value
                        .as_str()?
                        .parse()
                        .map_err(|e| FromSqlError::Other(Box::new(e)))
                }
            }
        )+
    };
}

sql_label!(RiskLevel, NexusStatus, Priority, AlertSeverity, AlertStatus, TaskStatus);

#[async_trait]
impl Repository for SqliteStore {
    // ── Client ─────────────────────────────────────────────────

    async fn insert_client(&self, c: &ClientRow) -> SeedResult<()> {
        let tags = serde_json::to_string(&c.tags)?;
        let custom_fields = serde_json::to_string(&c.custom_fields)?;
        self.execute(
            "INSERT INTO client (
                id, organization_id, name, slug, legal_name, tax_id, industry,
                employee_count, annual_revenue, fiscal_year_end, risk_level,
                penalty_exposure, quality_score, email, phone, address, city,
                state_code, postal_code, status, notes, tags, custom_fields, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
                      ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24)",
            params![
                &c.id,
                &c.organization_id,
                &c.name,
                &c.slug,
                &c.legal_name,
                &c.tax_id,
                &c.industry,
                c.employee_count,
                c.annual_revenue,
                &c.fiscal_year_end,
                c.risk_level,
                c.penalty_exposure,
                c.quality_score,
                &c.email,
                &c.phone,
                &c.address,
                &c.city,
                &c.state_code,
                &c.postal_code,
                &c.status,
                &c.notes,
                tags,
                custom_fields,
                c.created_at,
            ],
        )
    }

    async fn clients(&self, organization_id: &str) -> SeedResult<Vec<ClientRow>> {
        self.query(
            "SELECT id, organization_id, name, slug, legal_name, tax_id, industry,
                    employee_count, annual_revenue, fiscal_year_end, risk_level,
                    penalty_exposure, quality_score, email, phone, address, city,
                    state_code, postal_code, status, notes, tags, custom_fields, created_at
             FROM client WHERE organization_id = ?1
             ORDER BY rowid ASC",
            organization_id,
            |r| {
                Ok(ClientRow {
                    id: r.get(0)?,
                    organization_id: r.get(1)?,
                    name: r.get(2)?,
                    slug: r.get(3)?,
                    legal_name: r.get(4)?,
                    tax_id: r.get(5)?,
                    industry: r.get(6)?,
                    employee_count: r.get(7)?,
                    annual_revenue: r.get(8)?,
                    fiscal_year_end: r.get(9)?,
                    risk_level: r.get(10)?,
                    penalty_exposure: r.get(11)?,
                    quality_score: r.get(12)?,
                    email: r.get(13)?,
                    phone: r.get(14)?,
                    address: r.get(15)?,
                    city: r.get(16)?,
                    state_code: r.get(17)?,
                    postal_code: r.get(18)?,
                    status: r.get(19)?,
                    notes: r.get(20)?,
                    tags: json_column(r, 21)?,
                    custom_fields: json_column(r, 22)?,
                    created_at: r.get(23)?,
                })
            },
        )
    }

    // ── Monitoring ─────────────────────────────────────────────

    async fn insert_client_state(&self, s: &ClientStateRow) -> SeedResult<()> {
        self.execute(
            "INSERT INTO client_state (
                id, organization_id, client_id, state_code, state_name, threshold_amount,
                current_amount, threshold_ratio, status, penalty_risk, last_updated
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                &s.id,
                &s.organization_id,
                &s.client_id,
                &s.state_code,
                &s.state_name,
                s.threshold_amount,
                s.current_amount,
                s.threshold_ratio,
                s.status,
                s.penalty_risk,
                s.last_updated,
            ],
        )
    }

    async fn client_states(&self, client_id: &str) -> SeedResult<Vec<ClientStateRow>> {
        self.query(
            "SELECT id, organization_id, client_id, state_code, state_name, threshold_amount,
                    current_amount, threshold_ratio, status, penalty_risk, last_updated
             FROM client_state WHERE client_id = ?1
             ORDER BY rowid ASC",
            client_id,
            |r| {
                Ok(ClientStateRow {
                    id: r.get(0)?,
                    organization_id: r.get(1)?,
                    client_id: r.get(2)?,
                    state_code: r.get(3)?,
                    state_name: r.get(4)?,
                    threshold_amount: r.get(5)?,
                    current_amount: r.get(6)?,
                    threshold_ratio: r.get(7)?,
                    status: r.get(8)?,
                    penalty_risk: r.get(9)?,
                    last_updated: r.get(10)?,
                })
            },
        )
    }

    async fn insert_nexus_alert(&self, a: &NexusAlertRow) -> SeedResult<()> {
        self.execute(
            "INSERT INTO nexus_alert (
                id, organization_id, client_id, client_state_id, state_code, alert_type,
                title, description, threshold_amount, current_amount, penalty_risk,
                priority, status, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                &a.id,
                &a.organization_id,
                &a.client_id,
                &a.client_state_id,
                &a.state_code,
                &a.alert_type,
                &a.title,
                &a.description,
                a.threshold_amount,
                a.current_amount,
                a.penalty_risk,
                a.priority,
                a.status,
                a.created_at,
            ],
        )
    }

    async fn nexus_alerts(&self, client_id: &str) -> SeedResult<Vec<NexusAlertRow>> {
        self.query(
            "SELECT id, organization_id, client_id, client_state_id, state_code, alert_type,
                    title, description, threshold_amount, current_amount, penalty_risk,
                    priority, status, created_at
             FROM nexus_alert WHERE client_id = ?1
             ORDER BY rowid ASC",
            client_id,
            |r| {
                Ok(NexusAlertRow {
                    id: r.get(0)?,
                    organization_id: r.get(1)?,
                    client_id: r.get(2)?,
                    client_state_id: r.get(3)?,
                    state_code: r.get(4)?,
                    alert_type: r.get(5)?,
                    title: r.get(6)?,
                    description: r.get(7)?,
                    threshold_amount: r.get(8)?,
                    current_amount: r.get(9)?,
                    penalty_risk: r.get(10)?,
                    priority: r.get(11)?,
                    status: r.get(12)?,
                    created_at: r.get(13)?,
                })
            },
        )
    }

    async fn insert_nexus_activity(&self, a: &NexusActivityRow) -> SeedResult<()> {
        self.execute(
            "INSERT INTO nexus_activity (
                id, organization_id, client_id, client_state_id, state_code,
                activity_type, title, description, amount, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                &a.id,
                &a.organization_id,
                &a.client_id,
                &a.client_state_id,
                &a.state_code,
                &a.activity_type,
                &a.title,
                &a.description,
                a.amount,
                a.created_at,
            ],
        )
    }

    async fn insert_alert(&self, a: &AlertRow) -> SeedResult<()> {
        self.execute(
            "INSERT INTO alert (
                id, organization_id, client_id, client_state_id, title, description,
                severity, category, status, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                &a.id,
                &a.organization_id,
                &a.client_id,
                &a.client_state_id,
                &a.title,
                &a.description,
                a.severity,
                &a.category,
                a.status,
                a.created_at,
            ],
        )
    }

    async fn alerts(&self, client_id: &str) -> SeedResult<Vec<AlertRow>> {
        self.query(
            "SELECT id, organization_id, client_id, client_state_id, title, description,
                    severity, category, status, created_at
             FROM alert WHERE client_id = ?1
             ORDER BY rowid ASC",
            client_id,
            |r| {
                Ok(AlertRow {
                    id: r.get(0)?,
                    organization_id: r.get(1)?,
                    client_id: r.get(2)?,
                    client_state_id: r.get(3)?,
                    title: r.get(4)?,
                    description: r.get(5)?,
                    severity: r.get(6)?,
                    category: r.get(7)?,
                    status: r.get(8)?,
                    created_at: r.get(9)?,
                })
            },
        )
    }

    async fn insert_task(&self, t: &TaskRow) -> SeedResult<()> {
        self.execute(
            "INSERT INTO task (
                id, organization_id, client_id, title, description, category, priority,
                status, estimated_hours, progress, due_date, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                &t.id,
                &t.organization_id,
                &t.client_id,
                &t.title,
                &t.description,
                &t.category,
                t.priority,
                t.status,
                t.estimated_hours,
                t.progress,
                t.due_date,
                t.created_at,
            ],
        )
    }

    async fn tasks(&self, client_id: &str) -> SeedResult<Vec<TaskRow>> {
        self.query(
            "SELECT id, organization_id, client_id, title, description, category, priority,
                    status, estimated_hours, progress, due_date, created_at
             FROM task WHERE client_id = ?1
             ORDER BY rowid ASC",
            client_id,
            |r| {
                Ok(TaskRow {
                    id: r.get(0)?,
                    organization_id: r.get(1)?,
                    client_id: r.get(2)?,
                    title: r.get(3)?,
                    description: r.get(4)?,
                    category: r.get(5)?,
                    priority: r.get(6)?,
                    status: r.get(7)?,
                    estimated_hours: r.get(8)?,
                    progress: r.get(9)?,
                    due_date: r.get(10)?,
                    created_at: r.get(11)?,
                })
            },
        )
    }

    // ── Satellites ─────────────────────────────────────────────

    async fn insert_business_profile(&self, p: &BusinessProfileRow) -> SeedResult<()> {
        self.execute(
            "INSERT INTO business_profile (
                id, organization_id, client_id, legal_name, tax_id, industry,
                employee_count, annual_revenue, fiscal_year_end, business_model,
                primary_jurisdiction, qualification_strategy, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                &p.id,
                &p.organization_id,
                &p.client_id,
                &p.legal_name,
                &p.tax_id,
                &p.industry,
                p.employee_count,
                p.annual_revenue,
                &p.fiscal_year_end,
                &p.business_model,
                &p.primary_jurisdiction,
                &p.qualification_strategy,
                p.created_at,
            ],
        )
    }

    async fn insert_contact(&self, c: &ContactRow) -> SeedResult<()> {
        self.execute(
            "INSERT INTO contact (
                id, organization_id, client_id, first_name, last_name, title, email,
                phone, is_primary, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                &c.id,
                &c.organization_id,
                &c.client_id,
                &c.first_name,
                &c.last_name,
                &c.title,
                &c.email,
                &c.phone,
                c.is_primary,
                c.created_at,
            ],
        )
    }

    async fn insert_business_location(&self, l: &BusinessLocationRow) -> SeedResult<()> {
        self.execute(
            "INSERT INTO business_location (
                id, organization_id, client_id, location_type, address, city,
                state_code, postal_code, employee_count, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                &l.id,
                &l.organization_id,
                &l.client_id,
                &l.location_type,
                &l.address,
                &l.city,
                &l.state_code,
                &l.postal_code,
                l.employee_count,
                l.created_at,
            ],
        )
    }

    async fn insert_revenue_breakdown(&self, r: &RevenueBreakdownRow) -> SeedResult<()> {
        self.execute(
            "INSERT INTO revenue_breakdown (
                id, organization_id, client_id, category, amount, percentage, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                &r.id,
                &r.organization_id,
                &r.client_id,
                &r.category,
                r.amount,
                r.percentage,
                r.created_at,
            ],
        )
    }

    async fn insert_customer_demographics(&self, d: &CustomerDemographicsRow) -> SeedResult<()> {
        self.execute(
            "INSERT INTO customer_demographics (
                id, organization_id, client_id, b2b_percentage, b2c_percentage,
                total_customers, average_order_value, repeat_customer_rate, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                &d.id,
                &d.organization_id,
                &d.client_id,
                d.b2b_percentage,
                d.b2c_percentage,
                d.total_customers,
                d.average_order_value,
                d.repeat_customer_rate,
                d.created_at,
            ],
        )
    }

    async fn insert_geographic_distribution(
        &self,
        g: &GeographicDistributionRow,
    ) -> SeedResult<()> {
        self.execute(
            "INSERT INTO geographic_distribution (
                id, organization_id, client_id, state_code, revenue_percentage,
                customer_count, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                &g.id,
                &g.organization_id,
                &g.client_id,
                &g.state_code,
                g.revenue_percentage,
                g.customer_count,
                g.created_at,
            ],
        )
    }

    // ── Audit ──────────────────────────────────────────────────

    async fn insert_audit_entry(&self, a: &AuditTrailRow) -> SeedResult<()> {
        self.execute(
            "INSERT INTO audit_trail (
                id, organization_id, entity_type, entity_id, action, description, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                &a.id,
                &a.organization_id,
                &a.entity_type,
                &a.entity_id,
                &a.action,
                &a.description,
                a.created_at,
            ],
        )
    }

    async fn audit_entries(&self, organization_id: &str) -> SeedResult<Vec<AuditTrailRow>> {
        self.query(
            "SELECT id, organization_id, entity_type, entity_id, action, description, created_at
             FROM audit_trail WHERE organization_id = ?1
             ORDER BY rowid ASC",
            organization_id,
            |r| {
                Ok(AuditTrailRow {
                    id: r.get(0)?,
                    organization_id: r.get(1)?,
                    entity_type: r.get(2)?,
                    entity_id: r.get(3)?,
                    action: r.get(4)?,
                    description: r.get(5)?,
                    created_at: r.get(6)?,
                })
            },
        )
    }

    // ── Bulk ───────────────────────────────────────────────────

    async fn table_counts(&self, organization_id: &str) -> SeedResult<TableCounts> {
        let org = organization_id;
        Ok(TableCounts {
            clients: self.count("client", org)?,
            client_states: self.count("client_state", org)?,
            nexus_alerts: self.count("nexus_alert", org)?,
            nexus_activities: self.count("nexus_activity", org)?,
            alerts: self.count("alert", org)?,
            tasks: self.count("task", org)?,
            business_profiles: self.count("business_profile", org)?,
            contacts: self.count("contact", org)?,
            business_locations: self.count("business_location", org)?,
            revenue_breakdowns: self.count("revenue_breakdown", org)?,
            customer_demographics: self.count("customer_demographics", org)?,
            geographic_distributions: self.count("geographic_distribution", org)?,
            audit_entries: self.count("audit_trail", org)?,
        })
    }

    async fn delete_organization_data(&self, organization_id: &str) -> SeedResult<u64> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let mut removed = 0u64;
        for table in DELETE_ORDER {
            removed += tx.execute(
                &format!("DELETE FROM {table} WHERE organization_id = ?1"),
                params![organization_id],
            )? as u64;
        }
        tx.commit()?;
        log::info!("store: deleted {removed} rows for organization {organization_id}");
        Ok(removed)
    }
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}
