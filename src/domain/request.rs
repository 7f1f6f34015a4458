//! Analysis request validation and query derivation.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{OrchestratorError, Result};

/// A pipeline start request, as consumed from the external layer.
///
/// `segment` and `product` are mandatory; their absence is a caller error
/// rejected before any stage runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisRequest {
    /// Business segment under analysis (e.g. "fitness")
    pub segment: String,

    /// Product or service being positioned (e.g. "coaching app")
    pub product: String,

    /// Target audience description
    #[serde(default)]
    pub target_audience: Option<String>,

    /// Strategic objectives
    #[serde(default)]
    pub objectives: Option<String>,

    /// Free-form additional context
    #[serde(default)]
    pub context: Option<String>,

    /// Explicit research query (derived from segment/product if absent)
    #[serde(default)]
    pub query: Option<String>,

    /// Caller-supplied session identifier
    pub session_id: String,
}

impl AnalysisRequest {
    /// Create a request with a generated session id
    pub fn new(segment: impl Into<String>, product: impl Into<String>) -> Self {
        Self {
            segment: segment.into(),
            product: product.into(),
            session_id: Uuid::new_v4().to_string(),
            ..Default::default()
        }
    }

    /// Validate mandatory fields
    pub fn validate(&self) -> Result<()> {
        if self.segment.trim().is_empty() {
            return Err(OrchestratorError::InvalidRequest(
                "segment is required".to_string(),
            ));
        }
        if self.product.trim().is_empty() {
            return Err(OrchestratorError::InvalidRequest(
                "product is required".to_string(),
            ));
        }
        if self.session_id.trim().is_empty() {
            return Err(OrchestratorError::InvalidRequest(
                "session_id is required".to_string(),
            ));
        }
        Ok(())
    }

    /// The web research query: explicit if provided, otherwise derived
    /// from segment and product.
    pub fn search_query(&self) -> String {
        match &self.query {
            Some(q) if !q.trim().is_empty() => q.trim().to_string(),
            _ => format!("{} {} market analysis", self.segment, self.product),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mandatory_fields() {
        let req = AnalysisRequest::new("fitness", "coaching app");
        assert!(req.validate().is_ok());

        let req = AnalysisRequest::new("", "coaching app");
        assert!(matches!(
            req.validate(),
            Err(OrchestratorError::InvalidRequest(_))
        ));

        let req = AnalysisRequest::new("fitness", "  ");
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_derived_query() {
        let mut req = AnalysisRequest::new("fitness", "coaching app");
        assert_eq!(req.search_query(), "fitness coaching app market analysis");

        req.query = Some("wearables brazil 2025".to_string());
        assert_eq!(req.search_query(), "wearables brazil 2025");

        req.query = Some("   ".to_string());
        assert_eq!(req.search_query(), "fitness coaching app market analysis");
    }
}
