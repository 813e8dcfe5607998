pub mod analysis;
pub mod dataset;
pub mod operations;
pub mod pipeline;
pub mod run_log;

pub use analysis::*;
pub use dataset::*;
pub use operations::*;
pub use pipeline::*;
