pub mod audits;
pub mod locations;
pub mod report;
