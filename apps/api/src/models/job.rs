use serde::{Deserialize, Serialize};

/// Read-only description of the position a candidate is scored against.
/// Supplied alongside the candidate record; never mutated by this service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobDescriptor {
    pub title: String,
    pub description: String,
    pub requirements: String,
}
