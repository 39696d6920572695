pub mod batch;
pub mod chart;
pub mod dataset;
pub mod error;
pub mod format;

pub mod utils;

pub use chart::{render, ChartSpec, RenderedChart};
pub use dataset::Dataset;
pub use error::{Error, Result};
pub use format::Formatter;
pub use utils::{file_logger, init_log, local_now, stdout_logger};
