//! Economic-nexus thresholds and status breakpoints.
//!
//! Status is derived from the rounded percentage of a jurisdiction's
//! statutory threshold a client has reached. The breakpoints are fixed:
//!
//!   ratio >= 100  → critical (threshold exceeded)
//!   ratio >=  80  → warning  (approaching)
//!   ratio >=  50  → pending
//!   ratio >=  20  → transit
//!   otherwise     → compliant

use crate::{
    error::{SeedError, SeedResult},
    types::NexusStatus,
};

pub const DEFAULT_THRESHOLD: f64 = 100_000.0;

pub const CRITICAL_RATIO: u32 = 100;
pub const WARNING_RATIO: u32 = 80;
pub const PENDING_RATIO: u32 = 50;
pub const TRANSIT_RATIO: u32 = 20;

/// Blended sales-tax rate used to estimate uncollected tax on a breach.
pub const ESTIMATED_TAX_RATE: f64 = 0.0725;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Jurisdiction {
    pub code: &'static str,
    pub name: &'static str,
    pub threshold: f64,
    pub city: &'static str,
}

/// Resolved name, threshold and city for a jurisdiction code. Codes missing
/// from the table get the default threshold and their own code as name.
#[derive(Debug, Clone, PartialEq)]
pub struct JurisdictionInfo {
    pub code: String,
    pub name: String,
    pub threshold: f64,
    pub city: String,
}

impl From<&Jurisdiction> for JurisdictionInfo {
    fn from(j: &Jurisdiction) -> Self {
        Self {
            code: j.code.to_string(),
            name: j.name.to_string(),
            threshold: j.threshold,
            city: j.city.to_string(),
        }
    }
}

const fn j(code: &'static str, name: &'static str, threshold: f64, city: &'static str) -> Jurisdiction {
    Jurisdiction { code, name, threshold, city }
}

pub const JURISDICTIONS: &[Jurisdiction] = &[
    j("AL", "Alabama", 250_000.0, "Birmingham"),
    j("AK", "Alaska", 100_000.0, "Anchorage"),
    j("AZ", "Arizona", 100_000.0, "Phoenix"),
    j("AR", "Arkansas", 100_000.0, "Little Rock"),
    j("CA", "California", 500_000.0, "Los Angeles"),
    j("CO", "Colorado", 100_000.0, "Denver"),
    j("CT", "Connecticut", 100_000.0, "Hartford"),
    j("DE", "Delaware", 100_000.0, "Wilmington"),
    j("DC", "District of Columbia", 100_000.0, "Washington"),
    j("FL", "Florida", 100_000.0, "Miami"),
    j("GA", "Georgia", 100_000.0, "Atlanta"),
    j("HI", "Hawaii", 100_000.0, "Honolulu"),
    j("ID", "Idaho", 100_000.0, "Boise"),
    j("IL", "Illinois", 100_000.0, "Chicago"),
    j("IN", "Indiana", 100_000.0, "Indianapolis"),
    j("IA", "Iowa", 100_000.0, "Des Moines"),
    j("KS", "Kansas", 100_000.0, "Wichita"),
    j("KY", "Kentucky", 100_000.0, "Louisville"),
    j("LA", "Louisiana", 100_000.0, "New Orleans"),
    j("ME", "Maine", 100_000.0, "Portland"),
    j("MD", "Maryland", 100_000.0, "Baltimore"),
    j("MA", "Massachusetts", 100_000.0, "Boston"),
    j("MI", "Michigan", 100_000.0, "Detroit"),
    j("MN", "Minnesota", 100_000.0, "Minneapolis"),
    j("MS", "Mississippi", 250_000.0, "Jackson"),
    j("MO", "Missouri", 100_000.0, "Kansas City"),
    j("MT", "Montana", 100_000.0, "Billings"),
    j("NE", "Nebraska", 100_000.0, "Omaha"),
    j("NV", "Nevada", 100_000.0, "Las Vegas"),
    j("NH", "New Hampshire", 100_000.0, "Manchester"),
    j("NJ", "New Jersey", 100_000.0, "Newark"),
    j("NM", "New Mexico", 100_000.0, "Albuquerque"),
    j("NY", "New York", 500_000.0, "New York"),
    j("NC", "North Carolina", 100_000.0, "Charlotte"),
    j("ND", "North Dakota", 100_000.0, "Fargo"),
    j("OH", "Ohio", 100_000.0, "Columbus"),
    j("OK", "Oklahoma", 100_000.0, "Oklahoma City"),
    j("OR", "Oregon", 100_000.0, "Portland"),
    j("PA", "Pennsylvania", 100_000.0, "Philadelphia"),
    j("RI", "Rhode Island", 100_000.0, "Providence"),
    j("SC", "South Carolina", 100_000.0, "Columbia"),
    j("SD", "South Dakota", 100_000.0, "Sioux Falls"),
    j("TN", "Tennessee", 100_000.0, "Nashville"),
    j("TX", "Texas", 500_000.0, "Houston"),
    j("UT", "Utah", 100_000.0, "Salt Lake City"),
    j("VT", "Vermont", 100_000.0, "Burlington"),
    j("VA", "Virginia", 100_000.0, "Virginia Beach"),
    j("WA", "Washington", 100_000.0, "Seattle"),
    j("WV", "West Virginia", 100_000.0, "Charleston"),
    j("WI", "Wisconsin", 100_000.0, "Milwaukee"),
    j("WY", "Wyoming", 100_000.0, "Cheyenne"),
];

/// Look up a jurisdiction by code (case-insensitive).
pub fn find_jurisdiction(code: &str) -> Option<&'static Jurisdiction> {
    let code = code.trim();
    JURISDICTIONS.iter().find(|j| j.code.eq_ignore_ascii_case(code))
}

/// Canonical name, threshold and city for a code. Unknown codes keep the
/// code as their name and get the default $100,000 threshold.
pub fn lookup_jurisdiction(code: &str) -> JurisdictionInfo {
    match find_jurisdiction(code) {
        Some(j) => j.into(),
        None => {
            let code = code.trim().to_ascii_uppercase();
            JurisdictionInfo {
                name: code.clone(),
                code,
                threshold: DEFAULT_THRESHOLD,
                city: "Unknown".into(),
            }
        }
    }
}

/// Percentage of the threshold reached, rounded to the nearest integer.
pub fn threshold_ratio(threshold_amount: f64, current_amount: f64) -> SeedResult<u32> {
    if !threshold_amount.is_finite() || threshold_amount <= 0.0 {
        return Err(SeedError::InvalidThreshold { amount: threshold_amount });
    }
    if !current_amount.is_finite() || current_amount < 0.0 {
        return Err(SeedError::validation(
            "current_amount",
            format!("must be a non-negative amount, got {current_amount}"),
        ));
    }
    let pct = (current_amount / threshold_amount * 100.0).round();
    Ok(pct.min(u32::MAX as f64) as u32)
}

/// Map a rounded ratio onto the fixed status breakpoints.
pub fn status_for_ratio(ratio: u32) -> NexusStatus {
    if ratio >= CRITICAL_RATIO {
        NexusStatus::Critical
    } else if ratio >= WARNING_RATIO {
        NexusStatus::Warning
    } else if ratio >= PENDING_RATIO {
        NexusStatus::Pending
    } else if ratio >= TRANSIT_RATIO {
        NexusStatus::Transit
    } else {
        NexusStatus::Compliant
    }
}

pub fn compute_status(threshold_amount: f64, current_amount: f64) -> SeedResult<NexusStatus> {
    threshold_ratio(threshold_amount, current_amount).map(status_for_ratio)
}

/// Estimated penalty exposure for one jurisdiction. Only a breached
/// threshold carries exposure.
pub fn penalty_risk(status: NexusStatus, current_amount: f64) -> f64 {
    match status {
        NexusStatus::Critical => round_cents(current_amount * ESTIMATED_TAX_RATE),
        _ => 0.0,
    }
}

pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}
