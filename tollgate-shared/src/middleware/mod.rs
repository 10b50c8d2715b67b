mod auth_extractor;
mod metrics_layer;
mod tracing_layer;
mod validated_json;

pub use auth_extractor::*;
pub use metrics_layer::*;
pub use tracing_layer::*;
pub use validated_json::*;
