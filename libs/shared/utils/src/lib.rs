pub mod test_utils;
pub mod timestamp;

pub use timestamp::{combine_date_time, parse_timestamp, TimestampError};
