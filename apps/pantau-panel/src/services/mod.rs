pub mod export_service;
pub mod import_service;
pub mod probe_service;
