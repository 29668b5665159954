//! The in-memory client record both generators produce.
//!
//! RULE: the LLM generator and the fallback generator return the same
//! struct, so persistence has exactly one shape to handle. Anything parsed
//! from model output must pass `ClientRecord::validate` before use.

use crate::{
    error::{SeedError, SeedResult},
    risk_policy::RiskBucket,
    types::{RecordSource, RiskLevel},
};
use serde::{Deserialize, Serialize};

/// Tolerance, in percentage points, for shares that must sum to 100.
const PERCENT_TOLERANCE: f64 = 1.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientRecord {
    pub name: String,
    pub legal_name: String,
    pub tax_id: String,
    pub industry: String,
    pub employee_count: u32,
    pub annual_revenue: f64,
    pub risk_level: RiskLevel,
    pub penalty_exposure: f64,
    pub quality_score: u32,
    pub contacts: Vec<ContactRecord>,
    pub business_locations: Vec<LocationRecord>,
    pub revenue_breakdowns: Vec<RevenueBreakdownRecord>,
    pub customer_demographics: DemographicsRecord,
    pub geographic_distributions: Vec<GeoDistributionRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactRecord {
    pub first_name: String,
    pub last_name: String,
    pub title: String,
    pub email: String,
    pub phone: String,
    pub is_primary: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationRecord {
    pub location_type: String,
    pub address: String,
    pub city: String,
    pub state_code: String,
    pub postal_code: String,
    pub employee_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueBreakdownRecord {
    pub category: String,
    pub amount: f64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemographicsRecord {
    pub b2b_percentage: f64,
    pub b2c_percentage: f64,
    pub total_customers: u32,
    pub average_order_value: f64,
    pub repeat_customer_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoDistributionRecord {
    pub state_code: String,
    pub revenue_percentage: f64,
    pub customer_count: u32,
}

/// A record together with the generator that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedRecord {
    pub record: ClientRecord,
    pub source: RecordSource,
}

impl ClientRecord {
    /// Strict schema check. A record that fails here is never persisted.
    pub fn validate(&self, expected_risk: RiskLevel) -> SeedResult<()> {
        require(!self.name.trim().is_empty(), "name", "must not be empty")?;
        require(!self.legal_name.trim().is_empty(), "legalName", "must not be empty")?;
        require(
            is_ein(&self.tax_id),
            "taxId",
            format!("'{}' is not in NN-NNNNNNN form", self.tax_id),
        )?;
        require(!self.industry.trim().is_empty(), "industry", "must not be empty")?;
        require(self.employee_count > 0, "employeeCount", "must be positive")?;
        require(
            self.annual_revenue.is_finite() && self.annual_revenue > 0.0,
            "annualRevenue",
            "must be a positive amount",
        )?;
        require(
            self.risk_level == expected_risk,
            "riskLevel",
            format!("expected {expected_risk}, got {}", self.risk_level),
        )?;

        let bucket = RiskBucket::for_level(expected_risk);
        require(
            bucket.penalty_exposure.contains(&self.penalty_exposure),
            "penaltyExposure",
            format!(
                "{} outside {:?} for {expected_risk} risk",
                self.penalty_exposure, bucket.penalty_exposure
            ),
        )?;
        require(
            bucket.quality_score.contains(&self.quality_score),
            "qualityScore",
            format!(
                "{} outside {:?} for {expected_risk} risk",
                self.quality_score, bucket.quality_score
            ),
        )?;

        require(!self.contacts.is_empty(), "contacts", "at least one contact required")?;
        let primaries = self.contacts.iter().filter(|c| c.is_primary).count();
        require(primaries == 1, "contacts", format!("expected one primary contact, got {primaries}"))?;
        for contact in &self.contacts {
            require(
                !contact.first_name.trim().is_empty() && !contact.last_name.trim().is_empty(),
                "contacts.name",
                "must not be empty",
            )?;
            require(
                contact.email.contains('@'),
                "contacts.email",
                format!("'{}' is not an email address", contact.email),
            )?;
        }

        require(
            !self.business_locations.is_empty(),
            "businessLocations",
            "at least one location required",
        )?;
        for location in &self.business_locations {
            require(
                is_state_code(&location.state_code),
                "businessLocations.stateCode",
                format!("'{}' is not a jurisdiction code", location.state_code),
            )?;
        }

        require(
            !self.revenue_breakdowns.is_empty(),
            "revenueBreakdowns",
            "at least one category required",
        )?;
        require(
            self.revenue_breakdowns.iter().all(|r| r.amount.is_finite() && r.amount >= 0.0),
            "revenueBreakdowns.amount",
            "must be non-negative",
        )?;
        sums_to_hundred(
            "revenueBreakdowns.percentage",
            self.revenue_breakdowns.iter().map(|r| r.percentage),
        )?;

        let demo = &self.customer_demographics;
        sums_to_hundred(
            "customerDemographics",
            [demo.b2b_percentage, demo.b2c_percentage].into_iter(),
        )?;
        require(
            (0.0..=100.0).contains(&demo.repeat_customer_rate),
            "customerDemographics.repeatCustomerRate",
            "must be a percentage",
        )?;

        require(
            !self.geographic_distributions.is_empty(),
            "geographicDistributions",
            "at least one jurisdiction required",
        )?;
        for geo in &self.geographic_distributions {
            require(
                is_state_code(&geo.state_code),
                "geographicDistributions.stateCode",
                format!("'{}' is not a jurisdiction code", geo.state_code),
            )?;
        }
        sums_to_hundred(
            "geographicDistributions.revenuePercentage",
            self.geographic_distributions.iter().map(|g| g.revenue_percentage),
        )?;

        Ok(())
    }

    pub fn primary_contact(&self) -> Option<&ContactRecord> {
        self.contacts.iter().find(|c| c.is_primary)
    }

    pub fn headquarters(&self) -> Option<&LocationRecord> {
        self.business_locations
            .iter()
            .find(|l| l.location_type == "headquarters")
            .or_else(|| self.business_locations.first())
    }
}

fn require(ok: bool, field: &str, reason: impl Into<String>) -> SeedResult<()> {
    if ok {
        Ok(())
    } else {
        Err(SeedError::validation(field, reason))
    }
}

fn sums_to_hundred(field: &str, shares: impl Iterator<Item = f64>) -> SeedResult<()> {
    let mut total = 0.0;
    for share in shares {
        require(
            share.is_finite() && (0.0..=100.0).contains(&share),
            field,
            format!("{share} is not a percentage"),
        )?;
        total += share;
    }
    require(
        (total - 100.0).abs() <= PERCENT_TOLERANCE,
        field,
        format!("shares sum to {total:.1}, expected 100"),
    )
}

fn is_ein(tax_id: &str) -> bool {
    let bytes = tax_id.as_bytes();
    bytes.len() == 10
        && bytes[2] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 2 || b.is_ascii_digit())
}

fn is_state_code(code: &str) -> bool {
    code.len() == 2 && code.chars().all(|c| c.is_ascii_uppercase())
}
