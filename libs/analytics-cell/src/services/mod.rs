pub mod dashboard;
pub mod grouping;

pub use dashboard::DashboardService;
pub use grouping::{aggregate, grouping_sets};
