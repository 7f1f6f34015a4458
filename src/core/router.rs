//! Capability router: dispatch by operation-pattern synonyms.
//!
//! Callers name a logical service plus an ordered list of operation
//! patterns. The router matches patterns against the service's static
//! operation table and calls each match in order until one produces a
//! non-empty payload. No dynamic discovery: if a name is not in the table,
//! it does not exist.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::error::{OrchestratorError, Result};
use crate::services::{OpArgs, ServiceCatalog};

pub struct CapabilityRouter {
    catalog: ServiceCatalog,
}

impl CapabilityRouter {
    pub fn new(catalog: ServiceCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &ServiceCatalog {
        &self.catalog
    }

    /// Dispatch the first working operation among `patterns`.
    ///
    /// Patterns that do not appear in the service's table are skipped. A
    /// matched operation that fails or returns an empty payload falls
    /// through to the next match. Exhausting every pattern yields
    /// `OperationNotFound` with full diagnostics.
    #[instrument(skip(self, args), fields(service = service))]
    pub async fn dispatch(
        &self,
        service: &str,
        patterns: &[&str],
        args: &OpArgs,
    ) -> Result<Value> {
        let Some(svc) = self.catalog.get(service) else {
            return Err(OrchestratorError::ServiceUnavailable {
                service: service.to_string(),
                available: self.catalog.names(),
            });
        };

        let table = svc.operations();
        let mut last_error = None;
        for pattern in patterns {
            if !table.contains(pattern) {
                continue;
            }

            debug!(operation = pattern, "dispatching operation");
            match svc.call(pattern, args).await {
                Ok(payload) if is_usable(&payload) => return Ok(payload),
                Ok(_) => {
                    warn!(operation = pattern, "operation returned empty payload");
                }
                Err(err) => {
                    warn!(operation = pattern, error = %err, "operation failed");
                    last_error = Some(err);
                }
            }
        }

        // Provider outages outrank naming problems in diagnostics
        if let Some(err) = last_error {
            return Err(err);
        }

        Err(OrchestratorError::OperationNotFound {
            service: service.to_string(),
            tried: patterns.iter().map(|p| p.to_string()).collect(),
            available: table.iter().map(|o| o.to_string()).collect(),
        })
    }

    /// Self-description of every service and its operation table
    pub fn describe(&self) -> Vec<(String, Vec<String>)> {
        self.catalog
            .names()
            .into_iter()
            .filter_map(|name| {
                self.catalog.get(&name).map(|svc| {
                    let ops = svc.operations().iter().map(|o| o.to_string()).collect();
                    (name, ops)
                })
            })
            .collect()
    }
}

/// A payload is usable when it is a non-empty object, a non-empty array,
/// or any other non-null scalar
fn is_usable(payload: &Value) -> bool {
    match payload {
        Value::Null => false,
        Value::Object(m) => !m.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::String(s) => !s.trim().is_empty(),
        _ => true,
    }
}
