use crate::Result;
use crate::error::TemplateError;
use crate::loader;
use crate::tpl::parser::parse_document;
use crate::tpl::render::render;
use log::debug;
use std::time::Instant;

/// Outcome of re-parsing a reconstructed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundTrip {
    /// Template text rebuilt from the first parse.
    pub rendered: String,
    /// Whether parsing `rendered` produced a tree equal to the first parse.
    pub consistent: bool,
}

/// Parses a template and serializes the tree back to template text.
pub fn reconstruct(text: &str) -> Result<String> {
    let start = Instant::now();
    let result = parse_document(text).map(|doc| render(&doc));
    let elapsed = start.elapsed().as_micros();

    match &result {
        Ok(rendered) => debug!(
            "Reconstruct: source_len={}, rendered_len={}, elapsed={}us",
            text.len(),
            rendered.len(),
            elapsed
        ),
        Err(e) => debug!(
            "Reconstruct: source_len={}, elapsed={}us, error={:?}",
            text.len(),
            elapsed,
            e
        ),
    }

    Ok(result?)
}

/// Parses `text`, renders it, parses the rendering again and compares both trees.
pub fn check_round_trip(text: &str) -> Result<RoundTrip> {
    let first = parse_document(text)?;
    let rendered = render(&first);
    let second = parse_document(&rendered)?;

    let consistent = first == second;
    if !consistent {
        debug!("Round trip mismatch: rendered=\n{}", rendered);
    }
    Ok(RoundTrip {
        rendered,
        consistent,
    })
}

/// Renders a template previously registered through [`loader`].
pub fn reconstruct_named(name: &str) -> Result<String> {
    let document = loader::find_document(name)
        .ok_or_else(|| TemplateError::TemplateNotFound(name.to_string()))?;
    Ok(render(&document))
}
