pub mod intake;
pub mod prioritization;
