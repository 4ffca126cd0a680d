pub mod domain;
pub mod report;
pub mod uploaded_file;
