use serde::{Deserialize, Serialize};

/// Wire types exchanged between the panel and external reporting agents.
pub mod api {
    use super::*;

    /// Internal domain submission (dashboard, bulk import).
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct DomainSubmission {
        pub domain: String,
        pub brand: String,
        pub status: Option<String>,
        pub kategori: Option<String>,
        pub expired: Option<String>,
        pub catatan: Option<String>,
    }

    /// Report pushed by an external agent, authenticated per-brand.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct ReportSubmission {
        pub domain: String,
        pub brand: String,
        pub status: String,
        pub kategori: String,
        pub expired: Option<String>,
        pub catatan: Option<String>,
        pub api_key: String,
    }

    /// Outcome of a reachability probe. `status_code` is absent when
    /// neither scheme answered.
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct StatusInfo {
        pub status: String,
        pub status_code: Option<u16>,
        pub accessible: bool,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct ImportFailure {
        pub domain: String,
        pub error: String,
    }

    /// Per-file outcome of a bulk import. The pipeline always runs to the
    /// end of the file; partial success is reported, not rolled back.
    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    pub struct ImportSummary {
        pub success_count: usize,
        pub error_count: usize,
        pub removed_count: usize,
        pub failures: Vec<ImportFailure>,
    }
}
