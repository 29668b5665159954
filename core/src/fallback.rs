//! Deterministic record synthesis used when the LLM is unavailable or its
//! output does not validate.
//!
//! Name and industry come from the same rotation tables the prompt uses, so a
//! fallback record for index `i` looks like the LLM record for index `i`
//! would. Every numeric field is drawn from the caller's seeded RNG inside
//! fixed bounds; output always passes `ClientRecord::validate`.

use crate::{
    form::GenerationForm,
    name_generator::NameGenerator,
    record::{
        ClientRecord, ContactRecord, DemographicsRecord, GeoDistributionRecord, LocationRecord,
        RevenueBreakdownRecord,
    },
    risk_policy::RiskBucket,
    rng::SeedRng,
    thresholds::{lookup_jurisdiction, round_cents},
    types::RiskLevel,
};

pub const MIN_REVENUE: f64 = 1_000_000.0;
pub const MAX_REVENUE: f64 = 50_000_000.0;
pub const MIN_EMPLOYEES: u64 = 10;
pub const MAX_EMPLOYEES: u64 = 500;

/// Branch locations beyond headquarters, at most.
const MAX_BRANCHES: usize = 2;

#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackGenerator;

impl FallbackGenerator {
    pub fn fallback_client(
        &self,
        form: &GenerationForm,
        index: usize,
        risk_level: RiskLevel,
        jurisdictions: &[String],
        rng: &mut SeedRng,
    ) -> ClientRecord {
        let name = NameGenerator::company_name(index).to_string();
        let industry = NameGenerator::industry(index).to_string();
        let bucket = RiskBucket::for_level(risk_level);

        let annual_revenue = (rng.range_f64(MIN_REVENUE, MAX_REVENUE) / 1_000.0).round() * 1_000.0;
        let employee_count = rng.range_u64(MIN_EMPLOYEES, MAX_EMPLOYEES) as u32;
        let penalty_exposure = round_cents(rng.range_f64(
            *bucket.penalty_exposure.start(),
            *bucket.penalty_exposure.end(),
        ));
        let quality_score = rng.range_u64(
            *bucket.quality_score.start() as u64,
            *bucket.quality_score.end() as u64,
        ) as u32;

        let legal_name = NameGenerator::legal_name(&name, rng);
        let tax_id = NameGenerator::tax_id(rng);
        let contacts = Self::contacts(&name, rng);
        let business_locations = Self::locations(jurisdictions, employee_count, rng);
        let revenue_breakdowns = Self::revenue_breakdowns(&industry, annual_revenue, rng);
        let customer_demographics = Self::demographics(form, annual_revenue, rng);
        let geographic_distributions =
            Self::geographic_distributions(jurisdictions, customer_demographics.total_customers, rng);

        ClientRecord {
            name,
            legal_name,
            tax_id,
            industry,
            employee_count,
            annual_revenue,
            risk_level,
            penalty_exposure,
            quality_score,
            contacts,
            business_locations,
            revenue_breakdowns,
            customer_demographics,
            geographic_distributions,
        }
    }

    fn contacts(company: &str, rng: &mut SeedRng) -> Vec<ContactRecord> {
        let domain = NameGenerator::email_domain(company);
        let count = rng.range_u64(2, 3) as usize;
        (0..count)
            .map(|position| {
                let (first, last) = NameGenerator::generate_full_name(rng);
                ContactRecord {
                    first_name: first.to_string(),
                    last_name: last.to_string(),
                    title: NameGenerator::contact_title(position).to_string(),
                    email: NameGenerator::email(first, last, &domain),
                    phone: NameGenerator::phone(rng),
                    is_primary: position == 0,
                }
            })
            .collect()
    }

    /// Headquarters in the first jurisdiction, branches in the next ones.
    fn locations(jurisdictions: &[String], employees: u32, rng: &mut SeedRng) -> Vec<LocationRecord> {
        let sites = jurisdictions.len().clamp(1, MAX_BRANCHES + 1);
        let shares = rng.percentage_split(sites);
        let fallback_code = String::from("DE");

        (0..sites)
            .map(|i| {
                let code = jurisdictions.get(i).unwrap_or(&fallback_code);
                let info = lookup_jurisdiction(code);
                let headcount = ((employees as f64) * shares[i] / 100.0).round().max(1.0) as u32;
                LocationRecord {
                    location_type: (if i == 0 { "headquarters" } else { "branch" }).to_string(),
                    address: NameGenerator::street_address(rng),
                    city: info.city,
                    state_code: info.code,
                    postal_code: NameGenerator::postal_code(rng),
                    employee_count: headcount,
                }
            })
            .collect()
    }

    fn revenue_breakdowns(
        industry: &str,
        annual_revenue: f64,
        rng: &mut SeedRng,
    ) -> Vec<RevenueBreakdownRecord> {
        let categories = NameGenerator::revenue_categories(industry);
        let shares = rng.percentage_split(categories.len());
        categories
            .iter()
            .zip(shares)
            .map(|(category, percentage)| RevenueBreakdownRecord {
                category: category.to_string(),
                amount: round_cents(annual_revenue * percentage / 100.0),
                percentage,
            })
            .collect()
    }

    fn demographics(form: &GenerationForm, annual_revenue: f64, rng: &mut SeedRng) -> DemographicsRecord {
        // B2B-leaning firms unless the form says the portfolio sells to consumers.
        let consumer_hint = form
            .primary_industry
            .as_deref()
            .map(|i| {
                let i = i.to_ascii_lowercase();
                i.contains("retail") || i.contains("consumer") || i.contains("commerce")
            })
            .unwrap_or(false);
        let (lo, hi) = if consumer_hint { (10, 45) } else { (40, 90) };
        let b2b = rng.range_u64(lo, hi) as f64;
        let total_customers = rng.range_u64(150, 25_000) as u32;
        DemographicsRecord {
            b2b_percentage: b2b,
            b2c_percentage: 100.0 - b2b,
            total_customers,
            average_order_value: round_cents(annual_revenue / total_customers as f64 / rng.range_f64(2.0, 12.0)),
            repeat_customer_rate: (rng.range_f64(25.0, 80.0) * 10.0).round() / 10.0,
        }
    }

    fn geographic_distributions(
        jurisdictions: &[String],
        total_customers: u32,
        rng: &mut SeedRng,
    ) -> Vec<GeoDistributionRecord> {
        let codes: Vec<String> = if jurisdictions.is_empty() {
            vec!["DE".to_string()]
        } else {
            jurisdictions.to_vec()
        };
        let shares = rng.percentage_split(codes.len());
        codes
            .into_iter()
            .zip(shares)
            .map(|(state_code, revenue_percentage)| GeoDistributionRecord {
                state_code,
                revenue_percentage,
                customer_count: ((total_customers as f64) * revenue_percentage / 100.0).round() as u32,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::{RngBank, StreamSlot};

    fn jurisdictions() -> Vec<String> {
        vec!["CA".into(), "TX".into(), "NY".into(), "FL".into()]
    }

    #[test]
    fn fallback_records_always_validate() {
        let bank = RngBank::new(2024);
        let form = GenerationForm::default();
        for index in 0..40 {
            for level in RiskLevel::ALL {
                let mut rng = bank.for_client(StreamSlot::Record, index);
                let record =
                    FallbackGenerator.fallback_client(&form, index, *level, &jurisdictions(), &mut rng);
                record
                    .validate(*level)
                    .unwrap_or_else(|e| panic!("index {index} level {level}: {e}"));
            }
        }
    }

    #[test]
    fn every_two_letter_code_still_validates() {
        let codes: Vec<String> = (b'A'..=b'Z')
            .flat_map(|a| (b'A'..=b'Z').map(move |b| format!("{}{}", a as char, b as char)))
            .collect();
        let bank = RngBank::new(9);
        let form = GenerationForm::default();
        for index in 0..60 {
            let mut rng = bank.for_client(StreamSlot::Record, index);
            let record = FallbackGenerator.fallback_client(&form, index, RiskLevel::Low, &codes, &mut rng);
            assert_eq!(record.geographic_distributions.len(), codes.len());
            record
                .validate(RiskLevel::Low)
                .unwrap_or_else(|e| panic!("index {index}: {e}"));
        }
    }

    #[test]
    fn risk_buckets_are_respected() {
        let bank = RngBank::new(77);
        let form = GenerationForm::default();
        for index in 0..100 {
            let mut rng = bank.for_client(StreamSlot::Record, index);
            let record = FallbackGenerator.fallback_client(
                &form,
                index,
                RiskLevel::Critical,
                &jurisdictions(),
                &mut rng,
            );
            assert!((50_000.0..=200_000.0).contains(&record.penalty_exposure));
            assert!((60..=75).contains(&record.quality_score));
        }
    }

    #[test]
    fn same_stream_same_record() {
        let bank = RngBank::new(5);
        let form = GenerationForm::default();
        let a = FallbackGenerator.fallback_client(
            &form,
            3,
            RiskLevel::Medium,
            &jurisdictions(),
            &mut bank.for_client(StreamSlot::Record, 3),
        );
        let b = FallbackGenerator.fallback_client(
            &form,
            3,
            RiskLevel::Medium,
            &jurisdictions(),
            &mut bank.for_client(StreamSlot::Record, 3),
        );
        assert_eq!(a, b);
    }

    #[test]
    fn name_and_industry_follow_rotation() {
        let bank = RngBank::new(5);
        let form = GenerationForm::default();
        let record = FallbackGenerator.fallback_client(
            &form,
            7,
            RiskLevel::Low,
            &jurisdictions(),
            &mut bank.for_client(StreamSlot::Record, 7),
        );
        assert_eq!(record.name, NameGenerator::company_name(7));
        assert_eq!(record.industry, NameGenerator::industry(7));
        assert_eq!(record.business_locations[0].state_code, "CA");
        assert_eq!(record.geographic_distributions.len(), 4);
    }
}
