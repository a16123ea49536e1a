//! Synthetic identity generation.
//!
//! Identities are generated fresh for every session and never reused;
//! reusing one would correlate submissions. Generation is pure randomness,
//! no I/O, and cannot fail.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::program::{EmailStyle, Organization, ProgramDescriptor};

const NAME_PREFIXES: &[&str] = &[
    "Al", "Bri", "Car", "Dan", "El", "Fer", "Gar", "Har", "Jes", "Kar", "Lar", "Mar", "Nor",
    "Par", "Quin", "Ros", "Sar", "Tar", "Val", "Wil",
];
const NAME_MIDDLES: &[&str] = &[
    "an", "en", "in", "on", "ar", "er", "or", "ur", "al", "el", "il", "ol", "am", "em", "im",
    "om", "ay", "ey", "oy", "ian",
];
const NAME_SUFFIXES: &[&str] = &[
    "ton", "son", "man", "ley", "field", "ford", "wood", "stone", "worth", "berg", "stein",
    "bach", "heim", "gard", "land", "wick", "shire", "dale", "brook", "ridge",
];
const NAME_ROOTS: &[&str] = &[
    "Alex", "Bern", "Crist", "Dav", "Edw", "Fred", "Greg", "Henr", "Ivan", "John", "Ken",
    "Leon", "Mich", "Nick", "Oliv", "Paul", "Rich", "Step", "Thom", "Will",
];
const NAME_ENDINGS: &[&str] = &[
    "a", "e", "i", "o", "y", "ie", "ey", "an", "en", "in", "on", "er", "ar", "or", "el", "al",
    "iel", "ael", "ine", "lyn",
];
const CONSUMER_DOMAINS: &[&str] = &[
    "gmail.com",
    "outlook.com",
    "hotmail.com",
    "yahoo.com",
    "icloud.com",
];

/// A generated identity, immutable once produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyntheticIdentity {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// `YYYY-MM-DD`.
    pub birth_date: String,
    pub organization: Organization,
}

impl SyntheticIdentity {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Generates internally consistent identities for a program's constraints.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentitySynthesizer;

impl IdentitySynthesizer {
    pub fn new() -> Self {
        Self
    }

    /// Generate a fresh identity satisfying the descriptor's constraints,
    /// drawing the organization at random from the program's directory.
    pub fn generate(&self, descriptor: &ProgramDescriptor) -> SyntheticIdentity {
        let organization = {
            let mut rng = rand::thread_rng();
            descriptor
                .organizations
                .choose(&mut rng)
                .unwrap_or_else(|| descriptor.default_organization())
                .clone()
        };
        self.generate_with(descriptor, &organization)
    }

    /// Generate an identity tied to a caller-selected organization.
    pub fn generate_with(
        &self,
        descriptor: &ProgramDescriptor,
        organization: &Organization,
    ) -> SyntheticIdentity {
        let mut rng = rand::thread_rng();

        let first_name = generate_first_name(&mut rng);
        let last_name = generate_last_name(&mut rng);
        let organization = organization.clone();
        let email = generate_email(
            &mut rng,
            descriptor.identity.email,
            &first_name,
            &last_name,
            &organization,
        );
        let birth_date = generate_birth_date(
            &mut rng,
            descriptor.identity.birth_year_min,
            descriptor.identity.birth_year_max,
        );

        SyntheticIdentity {
            first_name,
            last_name,
            email,
            birth_date,
            organization,
        }
    }
}

fn pick<'a>(rng: &mut impl Rng, parts: &[&'a str]) -> &'a str {
    parts.choose(rng).copied().unwrap_or("")
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

fn generate_first_name(rng: &mut impl Rng) -> String {
    let composed = match rng.gen_range(0..4) {
        0 => format!("{}{}", pick(rng, NAME_PREFIXES), pick(rng, NAME_ENDINGS)),
        1 => format!("{}{}", pick(rng, NAME_ROOTS), pick(rng, NAME_ENDINGS)),
        2 => format!(
            "{}{}{}",
            pick(rng, NAME_PREFIXES),
            pick(rng, NAME_MIDDLES),
            pick(rng, NAME_ENDINGS)
        ),
        _ => format!(
            "{}{}{}",
            pick(rng, NAME_ROOTS),
            pick(rng, NAME_MIDDLES),
            pick(rng, NAME_ENDINGS)
        ),
    };
    capitalize(&composed)
}

fn generate_last_name(rng: &mut impl Rng) -> String {
    let composed = match rng.gen_range(0..4) {
        0 => format!("{}{}", pick(rng, NAME_PREFIXES), pick(rng, NAME_SUFFIXES)),
        1 => format!("{}{}", pick(rng, NAME_ROOTS), pick(rng, NAME_SUFFIXES)),
        2 => format!(
            "{}{}{}",
            pick(rng, NAME_PREFIXES),
            pick(rng, NAME_MIDDLES),
            pick(rng, NAME_SUFFIXES)
        ),
        _ => format!("{}{}", pick(rng, NAME_PREFIXES), pick(rng, NAME_SUFFIXES)),
    };
    capitalize(&composed)
}

fn generate_email(
    rng: &mut impl Rng,
    style: EmailStyle,
    first_name: &str,
    last_name: &str,
    organization: &Organization,
) -> String {
    let org_domain = organization.domain.as_deref().unwrap_or("example.edu");

    match style {
        EmailStyle::ConsumerMailbox => {
            let number: u32 = rng.gen_range(1000..10000);
            let domain = pick(rng, CONSUMER_DOMAINS);
            format!(
                "{}.{}{}@{}",
                first_name.to_lowercase(),
                last_name.to_lowercase(),
                number,
                domain
            )
        }
        EmailStyle::OrganizationMailbox => {
            let first = first_name.to_lowercase();
            let last = last_name.to_lowercase();
            let initial = first.chars().next().unwrap_or('x');
            let local = match rng.gen_range(0..3) {
                0 => format!("{}{}{}", initial, last, rng.gen_range(100..1000)),
                1 => format!("{}.{}{}", first, last, rng.gen_range(10..100)),
                _ => format!("{}{}{}", last, initial, rng.gen_range(100..1000)),
            };
            format!("{}@{}", local, org_domain.to_lowercase())
        }
        EmailStyle::CampusToken => {
            const CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
            let token: String = (0..8)
                .map(|_| CHARS[rng.gen_range(0..CHARS.len())] as char)
                .collect();
            format!("{}@{}", token, org_domain.to_uppercase())
        }
    }
}

fn generate_birth_date(rng: &mut impl Rng, year_min: i32, year_max: i32) -> String {
    let year = rng.gen_range(year_min..=year_max);
    let month = rng.gen_range(1..=12);
    // Day capped at 28 so the date is valid in every month.
    let day = rng.gen_range(1..=28);
    format!("{year:04}-{month:02}-{day:02}")
}
