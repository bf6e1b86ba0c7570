pub mod approval;
pub mod proposal;
pub mod tender;
