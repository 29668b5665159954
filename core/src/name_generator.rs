//! Company, contact and identifier generation from curated tables.
//!
//! Company names and industries are chosen by rotation (`index % N`), never
//! by RNG, so clients in one batch never collide on name or industry and the
//! LLM prompt and the fallback generator agree on both for a given index.
//! Everything else draws from the caller's deterministic RNG.

use crate::rng::SeedRng;
use chrono::{DateTime, Utc};

/// Deterministic name generator using curated name lists
pub struct NameGenerator;

impl NameGenerator {
    /// Company name for the `index`-th client of a batch.
    pub fn company_name(index: usize) -> &'static str {
        let names = Self::company_names();
        names[index % names.len()]
    }

    /// Industry for the `index`-th client of a batch.
    pub fn industry(index: usize) -> &'static str {
        let industries = Self::industries();
        industries[index % industries.len()]
    }

    /// Registered legal name: company name plus an entity suffix.
    pub fn legal_name(company: &str, rng: &mut SeedRng) -> String {
        let suffix = rng.pick(Self::entity_suffixes());
        format!("{company} {suffix}")
    }

    /// Federal EIN in `NN-NNNNNNN` form.
    pub fn tax_id(rng: &mut SeedRng) -> String {
        format!(
            "{:02}-{:07}",
            rng.range_u64(10, 99),
            rng.next_u64_below(10_000_000)
        )
    }

    /// Generate a full name (first + last) deterministically
    pub fn generate_full_name(rng: &mut SeedRng) -> (&'static str, &'static str) {
        (Self::generate_first_name(rng), Self::generate_last_name(rng))
    }

    /// Generate first name from curated list
    pub fn generate_first_name(rng: &mut SeedRng) -> &'static str {
        *rng.pick(Self::first_names())
    }

    /// Generate last name from curated list
    pub fn generate_last_name(rng: &mut SeedRng) -> &'static str {
        *rng.pick(Self::last_names())
    }

    /// Contact title by position in the contact list; the first contact is
    /// always the finance lead.
    pub fn contact_title(position: usize) -> &'static str {
        let titles = Self::contact_titles();
        titles[position % titles.len()]
    }

    /// Email domain derived from the company name.
    pub fn email_domain(company: &str) -> String {
        let compact: String = slugify(company).chars().filter(|c| *c != '-').collect();
        if compact.is_empty() {
            "example.com".into()
        } else {
            format!("{compact}.com")
        }
    }

    pub fn email(first: &str, last: &str, domain: &str) -> String {
        format!(
            "{}.{}@{}",
            first.to_ascii_lowercase(),
            last.to_ascii_lowercase(),
            domain
        )
    }

    /// Phone number in the fictional 555-01xx exchange.
    pub fn phone(rng: &mut SeedRng) -> String {
        format!(
            "({}) 555-01{:02}",
            rng.range_u64(201, 989),
            rng.next_u64_below(100)
        )
    }

    pub fn street_address(rng: &mut SeedRng) -> String {
        format!(
            "{} {} {}",
            rng.range_u64(100, 9999),
            rng.pick(Self::street_names()),
            rng.pick(Self::street_suffixes())
        )
    }

    pub fn postal_code(rng: &mut SeedRng) -> String {
        format!("{:05}", rng.range_u64(1001, 99950))
    }

    /// Revenue categories typical for an industry.
    pub fn revenue_categories(industry: &str) -> [&'static str; 3] {
        match industry {
            "Software & SaaS" => ["Subscriptions", "Professional Services", "Licensing"],
            "E-commerce Retail" | "Consumer Goods" => {
                ["Online Sales", "Marketplace Sales", "Wholesale"]
            }
            "Manufacturing" | "Industrial Equipment" => {
                ["Product Sales", "Parts & Repairs", "Installation Services"]
            }
            "Healthcare Services" | "Medical Devices" => {
                ["Patient Services", "Device Sales", "Maintenance Contracts"]
            }
            _ => ["Product Sales", "Services", "Recurring Contracts"],
        }
    }

    fn company_names() -> &'static [&'static str] {
        &[
            "Summit Ridge Technologies",
            "Blue Harbor Commerce",
            "Ironwood Manufacturing",
            "Crescent Health Partners",
            "Northstar Logistics",
            "Evergreen Consumer Brands",
            "Granite Peak Software",
            "Silverline Medical Devices",
            "Redwood Industrial Supply",
            "Clearwater Digital Media",
            "Pioneer Food Distributors",
            "Beacon Financial Systems",
            "Cascade Outdoor Gear",
            "Lakeshore Building Products",
            "Meridian Data Services",
            "Harborview Apparel",
            "Keystone Auto Parts",
            "Brightpath Learning",
            "Copperfield Energy Solutions",
            "Westgate Home Furnishings",
            "Aurora Specialty Chemicals",
            "Tidewater Marine Supply",
            "Falcon Crest Electronics",
            "Prairie Wind Agritech",
        ]
    }

    fn industries() -> &'static [&'static str] {
        &[
            "Software & SaaS",
            "E-commerce Retail",
            "Manufacturing",
            "Healthcare Services",
            "Logistics & Distribution",
            "Consumer Goods",
            "Medical Devices",
            "Industrial Equipment",
            "Digital Media",
            "Food & Beverage",
        ]
    }

    fn entity_suffixes() -> &'static [&'static str] {
        &["Inc.", "LLC", "Corp.", "Holdings, Inc.", "Group LLC"]
    }

    fn contact_titles() -> &'static [&'static str] {
        &[
            "Chief Financial Officer",
            "Tax Director",
            "Controller",
            "VP of Finance",
            "Sales Tax Manager",
        ]
    }

    fn street_names() -> &'static [&'static str] {
        &[
            "Market", "Commerce", "Oak", "Maple", "Lakeview", "Industrial", "Park",
            "Washington", "Lincoln", "Harbor", "Ridge", "Meadow", "Cedar", "Main",
        ]
    }

    fn street_suffixes() -> &'static [&'static str] {
        &["Street", "Avenue", "Boulevard", "Parkway", "Drive", "Way"]
    }

    fn first_names() -> &'static [&'static str] {
        &[
            "James", "John", "Robert", "Michael", "William", "David", "Richard", "Joseph",
            "Thomas", "Charles", "Christopher", "Daniel", "Matthew", "Anthony", "Mark",
            "Steven", "Paul", "Andrew", "Joshua", "Kevin", "Brian", "Jason", "Ryan",
            "Nathan", "Samuel", "Gabriel", "Elijah", "Victor", "Martin",
            "Mary", "Patricia", "Jennifer", "Linda", "Elizabeth", "Susan", "Jessica",
            "Sarah", "Karen", "Lisa", "Nancy", "Margaret", "Ashley", "Emily", "Michelle",
            "Amanda", "Melissa", "Stephanie", "Rebecca", "Laura", "Angela", "Rachel",
            "Maria", "Olivia", "Victoria", "Lauren", "Hannah", "Sophia", "Grace", "Priya",
        ]
    }

    fn last_names() -> &'static [&'static str] {
        &[
            "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis",
            "Rodriguez", "Martinez", "Hernandez", "Lopez", "Gonzalez", "Wilson", "Anderson",
            "Thomas", "Taylor", "Moore", "Jackson", "Martin", "Lee", "Perez", "Thompson",
            "White", "Harris", "Sanchez", "Clark", "Ramirez", "Lewis", "Robinson",
            "Walker", "Young", "Allen", "King", "Wright", "Scott", "Torres", "Nguyen",
            "Hill", "Flores", "Green", "Adams", "Nelson", "Baker", "Hall", "Rivera",
            "Campbell", "Mitchell", "Carter", "Roberts", "Patel", "Chen", "Kim", "Tran",
        ]
    }
}

/// Lower-case, ASCII-only, hyphen-separated form of a name.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// Slug that is unique within one generation run: the name slug, the run's
/// timestamp in epoch millis, and the 1-based position in the batch.
pub fn unique_slug(name: &str, now: DateTime<Utc>, index: usize) -> String {
    let base = slugify(name);
    let base = if base.is_empty() { "client".to_string() } else { base };
    format!("{base}-{}-{}", now.timestamp_millis(), index + 1)
}
