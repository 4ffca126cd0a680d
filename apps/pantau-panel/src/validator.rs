use regex::Regex;
use std::sync::OnceLock;

static DOMAIN_RE: OnceLock<Regex> = OnceLock::new();

/// Hostname check: dot-separated labels of alphanumerics/hyphens (hyphen
/// not at label edges, label max 63 chars) ending in an alphabetic TLD of
/// at least two chars. No IDN, no IP literals.
pub fn is_valid_domain(name: &str) -> bool {
    let re = DOMAIN_RE.get_or_init(|| {
        Regex::new(r"^(?:[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?\.)+[a-zA-Z]{2,}$")
            .expect("domain regex is valid")
    });
    re.is_match(name)
}

/// Trim, lowercase, strip one leading scheme and one leading `www.`.
/// Each prefix is stripped independently, not in a loop, and the whole
/// transform is idempotent.
pub fn clean_domain(raw: &str) -> String {
    let mut domain = raw.trim().to_lowercase();
    for scheme in ["http://", "https://"] {
        if let Some(rest) = domain.strip_prefix(scheme) {
            domain = rest.to_string();
            break;
        }
    }
    if let Some(rest) = domain.strip_prefix("www.") {
        domain = rest.to_string();
    }
    domain
}

/// Outcome of validating a parsed upload. Errors are fatal; warnings are
/// advisories the pipeline proceeds past.
#[derive(Debug, Default)]
pub struct TableValidation {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl TableValidation {
    pub fn is_fatal(&self) -> bool {
        !self.errors.is_empty()
    }
}

pub const REQUIRED_COLUMNS: [&str; 2] = ["domain", "brand"];

/// Validate an uploaded table: required columns must exist (fatal),
/// empty fields / unknown brands / malformed domains are warnings.
pub fn validate_table(
    columns: &[String],
    rows: &[std::collections::HashMap<String, String>],
    valid_brands: &[String],
) -> TableValidation {
    let mut result = TableValidation::default();

    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|c| !columns.iter().any(|col| col == c))
        .collect();
    if !missing.is_empty() {
        result
            .errors
            .push(format!("Missing required columns: {}", missing.join(", ")));
        return result;
    }

    let empty_domains = rows
        .iter()
        .filter(|r| r.get("domain").map(|v| v.trim().is_empty()).unwrap_or(true))
        .count();
    if empty_domains > 0 {
        result
            .warnings
            .push(format!("{} rows have empty domain values", empty_domains));
    }

    let empty_brands = rows
        .iter()
        .filter(|r| r.get("brand").map(|v| v.trim().is_empty()).unwrap_or(true))
        .count();
    if empty_brands > 0 {
        result
            .warnings
            .push(format!("{} rows have empty brand values", empty_brands));
    }

    let mut invalid_brands: Vec<String> = rows
        .iter()
        .filter_map(|r| r.get("brand"))
        .filter(|b| !b.trim().is_empty() && !valid_brands.iter().any(|v| v == b.trim()))
        .map(|b| b.trim().to_string())
        .collect();
    invalid_brands.sort();
    invalid_brands.dedup();
    if !invalid_brands.is_empty() {
        result.warnings.push(format!(
            "Invalid brands found: {}. Valid brands: {}",
            invalid_brands.join(", "),
            valid_brands.join(", ")
        ));
    }

    let malformed = rows
        .iter()
        .filter_map(|r| r.get("domain"))
        .filter(|d| !d.trim().is_empty() && !is_valid_domain(d.trim()))
        .count();
    if malformed > 0 {
        result
            .warnings
            .push(format!("{} domains have invalid format", malformed));
    }

    result
}
