//! Stage declarations for the analysis pipeline.
//!
//! Each stage names its service, the operation patterns to try in order,
//! and a deterministic fallback payload builder used when every pattern
//! and provider is exhausted. Fallback payloads are never empty so the
//! consolidation step always has something to fold in.

use serde_json::{json, Value};

use crate::domain::AnalysisRequest;

/// Declaration of one pipeline stage
pub struct StageSpec {
    /// Stage key, also the key under which the payload is stored
    pub name: &'static str,

    /// Human-readable description shown in progress output
    pub description: &'static str,

    /// Catalog name of the service this stage dispatches to
    pub service: &'static str,

    /// Operation patterns, preferred first
    pub patterns: &'static [&'static str],

    /// Deterministic placeholder payload for total stage failure
    pub fallback: fn(&AnalysisRequest) -> Value,
}

/// The domain stages, in execution order. Consolidation is not a stage;
/// the executor runs it separately because its failure semantics differ.
pub fn default_stages() -> Vec<StageSpec> {
    vec![
        StageSpec {
            name: "web_research",
            description: "Researching the market",
            service: "research",
            patterns: &["comprehensive_search", "search_web", "perform_search"],
            fallback: |req| {
                json!({
                    "query": req.search_query(),
                    "total_results": 0,
                    "results": [],
                    "fallback_mode": true,
                    "note": "web research unavailable; downstream stages use request fields only",
                })
            },
        },
        StageSpec {
            name: "social_analysis",
            description: "Analyzing social platforms",
            service: "social_analysis",
            patterns: &["search_all_platforms", "search_platforms", "analyze_platforms"],
            fallback: |req| {
                json!({
                    "platforms": [
                        {
                            "platform": "instagram",
                            "dominant_topics": [req.segment.clone()],
                            "sentiment": "unknown",
                        },
                    ],
                    "total_posts": 0,
                    "fallback_mode": true,
                })
            },
        },
        StageSpec {
            name: "avatar",
            description: "Building the customer avatar",
            service: "avatar",
            patterns: &["create_avatar", "generate_avatar", "build_customer_profile"],
            fallback: |req| {
                json!({
                    "name": format!("Typical {} customer", req.segment),
                    "demographics": { "segment": req.segment },
                    "pains": ["needs better results", "short on time"],
                    "desires": [format!("succeed with {}", req.product)],
                    "objections": ["price", "trust"],
                    "buying_triggers": ["proof", "urgency"],
                    "fallback_mode": true,
                })
            },
        },
        StageSpec {
            name: "mental_drivers",
            description: "Deriving mental drivers",
            service: "mental_drivers",
            patterns: &["create_mental_drivers", "generate_drivers", "analyze_drivers"],
            fallback: |req| {
                json!({
                    "drivers": [
                        {
                            "name": "Urgency",
                            "description": format!("The cost of waiting in {}", req.segment),
                            "activation_phrase": "every month without a system is a month lost",
                        },
                        {
                            "name": "Authority",
                            "description": "Trust built through demonstrated method",
                            "activation_phrase": "a method proven in the field",
                        },
                    ],
                    "fallback_mode": true,
                })
            },
        },
        StageSpec {
            name: "visual_proofs",
            description: "Designing visual proofs",
            service: "visual_proofs",
            patterns: &["generate_visual_proofs", "create_proofs", "build_proofs"],
            fallback: |req| {
                json!({
                    "proofs": [
                        {
                            "name": "Before and after",
                            "concept": format!("documented transformation inside {}", req.segment),
                            "materials": ["client records", "timeline"],
                            "driver_supported": "Authority",
                        },
                    ],
                    "fallback_mode": true,
                })
            },
        },
        StageSpec {
            name: "anti_objection",
            description: "Preparing objection handling",
            service: "anti_objection",
            patterns: &["handle_objections", "generate_anti_objection", "counter_objections"],
            fallback: |req| {
                json!({
                    "objections": [
                        {
                            "objection": "it is too expensive",
                            "counter": format!("compare against the cost of staying stuck in {}", req.segment),
                            "proof_element": "case studies",
                        },
                        {
                            "objection": "I don't have time",
                            "counter": "the system is designed for limited weekly hours",
                            "proof_element": "time-boxed curriculum",
                        },
                    ],
                    "fallback_mode": true,
                })
            },
        },
        StageSpec {
            name: "pre_pitch",
            description: "Designing the pre-pitch sequence",
            service: "pre_pitch",
            patterns: &["orchestrate_pre_pitch", "generate_pre_pitch", "create_pre_pitch"],
            fallback: |_req| {
                json!({
                    "phases": [
                        { "name": "problem", "goal": "make the pain explicit", "script_outline": "story of the stuck customer" },
                        { "name": "mechanism", "goal": "present the unique method", "script_outline": "why common approaches fail" },
                        { "name": "proof", "goal": "establish credibility", "script_outline": "results walkthrough" },
                    ],
                    "fallback_mode": true,
                })
            },
        },
        StageSpec {
            name: "future_predictions",
            description: "Projecting segment trends",
            service: "future_predictions",
            patterns: &["create_predictions", "generate_predictions", "predict_future"],
            fallback: |req| {
                json!({
                    "predictions": [
                        {
                            "horizon": "12 months",
                            "prediction": format!("demand in {} keeps shifting toward specialized offers", req.segment),
                            "confidence": "low",
                            "implication": "narrow the positioning early",
                        },
                    ],
                    "fallback_mode": true,
                })
            },
        },
        StageSpec {
            name: "competition",
            description: "Mapping the competition",
            service: "competition",
            patterns: &["analyze_competition", "competitive_analysis", "map_competitors"],
            fallback: |req| {
                json!({
                    "competitors": [],
                    "differentiation": format!("position {} on specificity for {}", req.product, req.segment),
                    "fallback_mode": true,
                })
            },
        },
        StageSpec {
            name: "insights",
            description: "Extracting market insights",
            service: "insights",
            patterns: &["exclusive_insights", "extract_insights", "generate_insights"],
            fallback: |req| {
                json!({
                    "insights": [
                        format!("The {} segment rewards specific positioning over broad offers", req.segment),
                        "Objection handling before the pitch raises close rates",
                    ],
                    "fallback_mode": true,
                })
            },
        },
        StageSpec {
            name: "keywords",
            description: "Extracting strategic keywords",
            service: "keywords",
            patterns: &["analyze_keywords", "extract_keywords", "identify_keywords"],
            fallback: |req| {
                json!({
                    "keywords": [
                        { "keyword": format!("{} {}", req.segment, req.product), "intent": "commercial", "priority": "high" },
                        { "keyword": format!("best {} for {}", req.product, req.segment), "intent": "comparison", "priority": "medium" },
                    ],
                    "fallback_mode": true,
                })
            },
        },
        StageSpec {
            name: "sales_funnel",
            description: "Optimizing the sales funnel",
            service: "sales_funnel",
            patterns: &["optimize_sales_funnel", "create_funnel", "build_funnel"],
            fallback: |req| {
                json!({
                    "stages": [
                        { "name": "awareness", "goal": "reach the segment where it already gathers", "channel": "organic content", "driver_applied": "Urgency" },
                        { "name": "consideration", "goal": format!("show {} solving the core pain", req.product), "channel": "case studies", "driver_applied": "Authority" },
                        { "name": "decision", "goal": "remove the last objection", "channel": "direct offer", "driver_applied": "Urgency" },
                    ],
                    "fallback_mode": true,
                })
            },
        },
    ]
}

/// Patterns used for the consolidation step
pub const CONSOLIDATION_SERVICE: &str = "report";
pub const CONSOLIDATION_PATTERNS: &[&str] = &["consolidate_report", "generate_final_report"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_order_is_stable() {
        let names: Vec<&str> = default_stages().iter().map(|s| s.name).collect();
        assert_eq!(
            names,
            vec![
                "web_research",
                "social_analysis",
                "avatar",
                "mental_drivers",
                "visual_proofs",
                "anti_objection",
                "pre_pitch",
                "future_predictions",
                "competition",
                "insights",
                "keywords",
                "sales_funnel",
            ]
        );
    }

    #[test]
    fn test_fallbacks_are_never_empty() {
        let req = AnalysisRequest::new("fitness", "coaching app");
        for stage in default_stages() {
            let payload = (stage.fallback)(&req);
            let obj = payload.as_object().expect("fallback must be an object");
            assert!(!obj.is_empty(), "empty fallback for {}", stage.name);
            assert_eq!(payload["fallback_mode"], true);
        }
    }

    #[test]
    fn test_every_stage_has_patterns() {
        for stage in default_stages() {
            assert!(!stage.patterns.is_empty(), "no patterns for {}", stage.name);
        }
    }
}
