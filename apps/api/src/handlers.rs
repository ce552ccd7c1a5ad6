pub mod admissions;
pub mod health;
pub mod issuers;
pub mod roles;
