// src/common/id_generator.rs
//! Crockford Base32 ID Generator
//!
//! Generates human-readable, prefixed IDs using Crockford Base32 encoding.
//! Format: PREFIX_XXXXXXXX (e.g., U_K7NP3XQ2 for users)
//!
//! Also produces the short secrets the marketplace hands out: numeric
//! meeting OTPs, verification codes and URL slugs.

use rand::Rng;

/// Crockford Base32 alphabet (excludes I, L, O, U to avoid confusion)
const CROCKFORD_ALPHABET: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

/// Lowercase alphabet for slugs that end up in URLs people type by hand
const SLUG_ALPHABET: &[u8; 32] = b"23456789abcdefghjkmnpqrstuvwxyz_";

/// Random characters after the prefix
const ID_LENGTH: usize = 8;

/// Entity type prefixes for ID generation
#[derive(Debug, Clone, Copy)]
pub enum EntityPrefix {
    /// User account (U_)
    User,
    /// Tutoring proposal (A_)
    Application,
    /// Contract (K_)
    Contract,
    /// In-person appointment (P_)
    Appointment,
    /// Review (R_)
    Review,
    /// Direct message (M_)
    Message,
    /// Anonymous inbox link (L_)
    Link,
    /// Anonymous link message, stored in link history (H_)
    LinkMessage,
    /// Verification code row (V_)
    Verification,
}

impl EntityPrefix {
    /// Get the string prefix for this entity type
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityPrefix::User => "U",
            EntityPrefix::Application => "A",
            EntityPrefix::Contract => "K",
            EntityPrefix::Appointment => "P",
            EntityPrefix::Review => "R",
            EntityPrefix::Message => "M",
            EntityPrefix::Link => "L",
            EntityPrefix::LinkMessage => "H",
            EntityPrefix::Verification => "V",
        }
    }
}

fn random_from_alphabet(alphabet: &[u8; 32], length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| alphabet[rng.gen_range(0..32)] as char)
        .collect()
}

/// Generate a prefixed ID, e.g. `generate_id(EntityPrefix::Contract)` → `K_8MWQT2ZD`
pub fn generate_id(prefix: EntityPrefix) -> String {
    format!(
        "{}_{}",
        prefix.as_str(),
        random_from_alphabet(CROCKFORD_ALPHABET, ID_LENGTH)
    )
}

/// Generate a numeric code such as a meeting OTP. Leading zeros are kept.
pub fn generate_numeric_code(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

/// Generate a lowercase URL slug
pub fn generate_slug(length: usize) -> String {
    random_from_alphabet(SLUG_ALPHABET, length)
}

pub fn generate_user_id() -> String {
    generate_id(EntityPrefix::User)
}

pub fn generate_application_id() -> String {
    generate_id(EntityPrefix::Application)
}

pub fn generate_contract_id() -> String {
    generate_id(EntityPrefix::Contract)
}

pub fn generate_appointment_id() -> String {
    generate_id(EntityPrefix::Appointment)
}

pub fn generate_review_id() -> String {
    generate_id(EntityPrefix::Review)
}

pub fn generate_message_id() -> String {
    generate_id(EntityPrefix::Message)
}

pub fn generate_link_id() -> String {
    generate_id(EntityPrefix::Link)
}

pub fn generate_link_message_id() -> String {
    generate_id(EntityPrefix::LinkMessage)
}

pub fn generate_verification_id() -> String {
    generate_id(EntityPrefix::Verification)
}
