// Built-in prompt templates for the LLM-backed agents

/// Domain scout: asks for three emerging topics under a `domains` key
pub const DOMAIN_SCOUT: &str = "You are a research scout. List 3 emerging research topics (short names) \
with a confidence score (0-1). Return ONLY valid JSON (no extra commentary) with the key 'domains' \
as a list of objects: e.g. {\"domains\": [{\"name\": \"...\", \"confidence\": 0.72}, ...]}. \
Wrap the JSON in triple backticks if you must. Keep it concise and strictly machine-readable.";

const QUESTION_GENERATOR_TEMPLATE: &str = "Given these research topics: {topics}. \
Generate 3 concise, testable research questions (single sentences). \
Return ONLY valid JSON like {\"questions\": [\"q1\",\"q2\",\"q3\"]} with no explanatory text. \
Wrap JSON in triple backticks if you must. Be concise and scientific.";

const CRITIC_TEMPLATE: &str = "Critique these experiment results: {results}. \
Return ONLY valid JSON with keys 'critique' (string) and 'confidence' (0-1). \
Example: {\"critique\": \"...\", \"confidence\": 0.7}. \
Do NOT include explanations or extra text. If needed, wrap JSON in triple backticks.";

/// Question generator prompt embedding the topic names as a JSON list
pub fn question_generator(topics: &[String]) -> String {
    let topics = serde_json::to_string(topics).unwrap_or_else(|_| "[]".to_string());
    QUESTION_GENERATOR_TEMPLATE.replacen("{topics}", &topics, 1)
}

/// Critic prompt embedding an (already truncated) results excerpt
pub fn critic(results_excerpt: &str) -> String {
    CRITIC_TEMPLATE.replacen("{results}", results_excerpt, 1)
}
