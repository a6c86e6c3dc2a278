/// Canonical form of a public site identifier.
///
/// Identifiers are generated lowercase, so every lookup trims the incoming
/// value and lowercases it. Ingest and dashboard routes share this policy.
pub fn normalize_site_id(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Generate a new opaque site identifier (lowercase UUID v4).
pub fn generate_site_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
