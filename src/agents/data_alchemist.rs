// Data alchemist: synthesizes a small labelled dataset for a question
//
// No network access. The row count and values are a pure function of the
// question text, so the same question always yields the same dataset.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::time::Duration;

use super::{AgentContext, AgentOutcome};
use crate::models::{Dataset, DatasetMeta, DatasetRow};

pub const SOURCES: [&str; 2] = ["synthetic://generated", "example.pdf"];

const SEED_MODULUS: u64 = 1 << 32;
const LABEL_NOISE: f64 = 0.15;

pub struct DataAlchemist {
    ctx: AgentContext,
    delay: Duration,
}

impl DataAlchemist {
    pub fn new(ctx: AgentContext) -> Self {
        Self {
            ctx,
            delay: Duration::from_millis(800),
        }
    }

    /// Simulated I/O wait before synthesis
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Dataset for `question` (a string, an object with a `text` field, or
    /// anything else, which is used as its JSON text)
    pub async fn run(&self, question: &Value) -> AgentOutcome<Dataset> {
        match self.try_run(question).await {
            Ok(dataset) => AgentOutcome::parsed(dataset),
            Err(e) => {
                self.ctx
                    .events
                    .log(format!("DataAlchemist: unexpected error: {}", e));
                AgentOutcome::fallback(Dataset::failed(e.to_string()), e.to_string())
            }
        }
    }

    async fn try_run(&self, question: &Value) -> Result<Dataset, serde_json::Error> {
        let events = &self.ctx.events;
        let text = question_text(question)?;
        events.log(format!(
            "DataAlchemist: collecting data for question: {}",
            text.as_deref().unwrap_or("None")
        ));

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let seed = seed_for(text.as_deref());
        let dataset = synthesize(seed, text);

        if let Err(e) = self.ctx.memory.add_serialized("dataset", &dataset) {
            events.log(format!("DataAlchemist: memory.add failed: {}", e));
        }

        events.log(format!(
            "DataAlchemist: dataset ready with {} rows",
            dataset.rows.len()
        ));
        Ok(dataset)
    }
}

/// Text to seed from. Objects contribute their `text` field; a missing or
/// null `text` means there is no question text.
pub fn question_text(question: &Value) -> Result<Option<String>, serde_json::Error> {
    match question {
        Value::String(s) => Ok(Some(s.clone())),
        Value::Object(map) => match map.get("text") {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(other) => serde_json::to_string(other).map(Some),
        },
        other => serde_json::to_string(other).map(Some),
    }
}

/// Stable seed in `[0, 2^32)`. Empty or missing text gets a random seed.
pub fn seed_for(text: Option<&str>) -> u64 {
    match text.filter(|t| !t.is_empty()) {
        Some(text) => {
            let digest = Sha256::digest(text.as_bytes());
            let mut head = [0u8; 8];
            head.copy_from_slice(&digest[..8]);
            u64::from_be_bytes(head) % SEED_MODULUS
        }
        None => rand::thread_rng().gen_range(0..SEED_MODULUS),
    }
}

/// Build the dataset for `seed`: 8 to 12 rows with `feature` in [0, 1]
/// (4 decimals) and a label correlated with the feature plus noise.
pub fn synthesize(seed: u64, question: Option<String>) -> Dataset {
    let mut rng = StdRng::seed_from_u64(seed);
    let n_rows = 8 + (seed % 5) as u32;

    let rows: Vec<DatasetRow> = (1..=n_rows)
        .map(|id| {
            let feature = round4(rng.gen_range(0.0..=1.0));
            let noise = rng.gen_range(-LABEL_NOISE..=LABEL_NOISE);
            let label = u8::from(feature + noise > 0.5);
            DatasetRow { id, feature, label }
        })
        .collect();

    Dataset {
        meta: DatasetMeta {
            sources: SOURCES.iter().map(|s| s.to_string()).collect(),
            question,
            n_rows: Some(rows.len()),
            error: None,
        },
        rows,
    }
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
