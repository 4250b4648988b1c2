// Parsers for model output

pub mod json_extract;

pub use json_extract::{extract_json, extract_json_value, parse_extracted};
