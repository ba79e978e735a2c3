pub mod duration;
pub mod hot_reload;
pub mod logging;
pub mod metric_handler;

pub use duration::parse_duration;
