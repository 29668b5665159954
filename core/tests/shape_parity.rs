//! Both generators hand persistence the same record shape.

use nexus_core::{
    fallback::FallbackGenerator,
    form::GenerationForm,
    llm::generator::parse_client_record,
    risk_policy::RiskBucket,
    rng::{RngBank, StreamSlot},
    types::RiskLevel,
};
use std::collections::BTreeSet;

const TOP_LEVEL_FIELDS: [&str; 14] = [
    "name",
    "legalName",
    "taxId",
    "industry",
    "employeeCount",
    "annualRevenue",
    "riskLevel",
    "penaltyExposure",
    "qualityScore",
    "contacts",
    "businessLocations",
    "revenueBreakdowns",
    "customerDemographics",
    "geographicDistributions",
];

fn keys(value: &serde_json::Value) -> BTreeSet<String> {
    value
        .as_object()
        .expect("record serialises to an object")
        .keys()
        .cloned()
        .collect()
}

fn jurisdictions() -> Vec<String> {
    ["CA", "TX", "NY"].iter().map(|s| s.to_string()).collect()
}

#[test]
fn fallback_and_llm_records_share_field_set() {
    let expected: BTreeSet<String> = TOP_LEVEL_FIELDS.iter().map(|s| s.to_string()).collect();
    let form = GenerationForm::default();
    let bank = RngBank::new(2024);

    for (index, level) in RiskLevel::ALL.iter().enumerate() {
        let mut rng = bank.for_client(StreamSlot::Record, index);
        let fallback =
            FallbackGenerator.fallback_client(&form, index, *level, &jurisdictions(), &mut rng);
        let fallback_json = serde_json::to_value(&fallback).expect("serialise");
        assert_eq!(keys(&fallback_json), expected);

        // The same object as a model would reply with it.
        let reply = format!("Sure! {fallback_json} Hope this helps.");
        let parsed = parse_client_record(&reply, *level).expect("valid reply parses");
        let parsed_json = serde_json::to_value(&parsed).expect("serialise");
        assert_eq!(keys(&parsed_json), expected);
        assert_eq!(parsed, fallback);
    }
}

#[test]
fn fallback_respects_every_risk_bucket() {
    let form = GenerationForm::default();
    let bank = RngBank::new(77);

    for level in RiskLevel::ALL {
        let bucket = RiskBucket::for_level(*level);
        for index in 0..100 {
            let mut rng = bank.for_client(StreamSlot::Record, index);
            let record =
                FallbackGenerator.fallback_client(&form, index, *level, &jurisdictions(), &mut rng);
            assert!(bucket.penalty_exposure.contains(&record.penalty_exposure));
            assert!(bucket.quality_score.contains(&record.quality_score));
            record.validate(*level).expect("fallback output validates");
        }
    }
}

#[test]
fn critical_bucket_matches_documented_bounds() {
    let bucket = RiskBucket::for_level(RiskLevel::Critical);
    assert_eq!(*bucket.penalty_exposure.start(), 50_000.0);
    assert_eq!(*bucket.penalty_exposure.end(), 200_000.0);
    assert_eq!(*bucket.quality_score.start(), 60);
    assert_eq!(*bucket.quality_score.end(), 75);
}
