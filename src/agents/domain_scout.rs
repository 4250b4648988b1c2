// Domain scout: asks the model for emerging research domains

use serde_json::Value;

use super::{prompts, AgentContext, AgentOutcome};
use crate::llm::LlmRequest;
use crate::models::Domain;
use crate::parsers::parse_extracted;

/// Returned whenever the model's answer cannot be used
pub fn fallback_domains() -> Vec<Value> {
    [
        Domain::new("Quantum-inspired GNNs for drug repurposing", 0.72),
        Domain::new("Neuro-symbolic causal discovery in climate models", 0.68),
        Domain::new("Microscopy transformer embeddings for histopathology", 0.65),
    ]
    .iter()
    .map(Domain::to_value)
    .collect()
}

pub struct DomainScout {
    ctx: AgentContext,
}

impl DomainScout {
    pub fn new(ctx: AgentContext) -> Self {
        Self { ctx }
    }

    /// Domain entries exactly as the model produced them, or the fallback list
    pub async fn run(&self) -> AgentOutcome<Vec<Value>> {
        let events = &self.ctx.events;
        events.log("DomainScout: searching for emerging domains...");

        let raw = self
            .ctx
            .llm
            .generate(&LlmRequest::new(prompts::DOMAIN_SCOUT))
            .await;
        events.log("DomainScout: LLM response received");

        match parse_domains(&raw) {
            Ok(domains) => AgentOutcome::parsed(domains),
            Err(reason) => {
                events.log(format!("DomainScout: JSON parse failed: {}", reason));
                events.log("DomainScout: using fallback domain list");
                AgentOutcome::fallback(fallback_domains(), reason)
            }
        }
    }
}

fn parse_domains(raw: &str) -> Result<Vec<Value>, String> {
    if raw.trim().is_empty() {
        return Err("empty response".to_string());
    }

    let parsed = parse_extracted(raw).map_err(|e| e.to_string())?;
    match parsed.get("domains") {
        Some(Value::Array(domains)) if !domains.is_empty() => Ok(domains.clone()),
        Some(Value::Array(_)) => Err("'domains' is empty".to_string()),
        Some(_) => Err("'domains' is not a list".to_string()),
        None => Err("missing 'domains' key".to_string()),
    }
}
