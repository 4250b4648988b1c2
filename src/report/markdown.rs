// Markdown rendering of a paper using Tera

use tera::{Context, Tera};

use super::ReportError;
use crate::models::Paper;

const PAPER_TEMPLATE: &str = "# {{ title }}

## Abstract

{{ abstract }}

## Results

```json
{{ results }}
```

## Critic

```json
{{ critique }}
```
{% if has_meta %}
## Meta

```json
{{ meta }}
```
{% endif %}";

/// Render `paper` as a Markdown document. JSON sections are pretty-printed
/// in fenced blocks; the Meta section appears only when the paper has meta.
pub fn markdown_from_paper(paper: &Paper) -> Result<String, ReportError> {
    let title = if paper.title.trim().is_empty() {
        "Untitled"
    } else {
        paper.title.as_str()
    };

    let mut context = Context::new();
    context.insert("title", title);
    context.insert("abstract", &paper.abstract_text);
    context.insert("results", &serde_json::to_string_pretty(&paper.results)?);
    context.insert("critique", &serde_json::to_string_pretty(&paper.critique)?);
    context.insert("has_meta", &paper.meta.is_some());
    let meta = match &paper.meta {
        Some(meta) => serde_json::to_string_pretty(meta)?,
        None => String::new(),
    };
    context.insert("meta", &meta);

    // Autoescape off: the output is Markdown, not HTML
    Ok(Tera::one_off(PAPER_TEMPLATE, &context, false)?)
}
