// Domain layer - URL context, panel tree, templating and metric reduction
pub mod context;
pub mod errors;
pub mod metrics;
pub mod panel;
pub mod variables;
