//! Correlation and tracing identifiers for launch runs

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Correlation ID shared by every log line of one launch run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct CorrelationId(String);

impl CorrelationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CorrelationId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Trace context for one stage of a launch run
///
/// A run starts with `TraceContext::new("launch")`; assembly and submission
/// attempts get child spans so a rebuild shows up as a second span under the
/// same trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceContext {
    /// Unique trace identifier for the entire run
    pub trace_id: String,

    /// Unique span identifier for this stage
    pub span_id: String,

    pub correlation_id: CorrelationId,

    pub parent_span_id: Option<String>,

    /// Stage name
    pub operation: String,

    /// Creation timestamp (Unix epoch seconds)
    pub timestamp: i64,
}

impl TraceContext {
    pub fn new(operation: &str) -> Self {
        Self {
            trace_id: Uuid::new_v4().to_string(),
            span_id: Uuid::new_v4().to_string(),
            correlation_id: CorrelationId::new(),
            parent_span_id: None,
            operation: operation.to_string(),
            timestamp: Utc::now().timestamp(),
        }
    }

    /// Create a child span sharing this trace and correlation ID
    pub fn child_span(&self, operation: &str) -> Self {
        Self {
            trace_id: self.trace_id.clone(),
            span_id: Uuid::new_v4().to_string(),
            correlation_id: self.correlation_id.clone(),
            parent_span_id: Some(self.span_id.clone()),
            operation: operation.to_string(),
            timestamp: Utc::now().timestamp(),
        }
    }

    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    pub fn correlation_id(&self) -> &CorrelationId {
        &self.correlation_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_span_keeps_trace() {
        let root = TraceContext::new("launch");
        let child = root.child_span("submit");

        assert_eq!(child.trace_id(), root.trace_id());
        assert_eq!(child.correlation_id(), root.correlation_id());
        assert_eq!(child.parent_span_id.as_deref(), Some(root.span_id.as_str()));
        assert_ne!(child.span_id, root.span_id);
        assert_eq!(child.operation, "submit");
    }

    #[test]
    fn test_correlation_ids_unique() {
        assert_ne!(CorrelationId::new(), CorrelationId::new());
    }
}
