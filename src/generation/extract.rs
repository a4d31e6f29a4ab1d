use regex::Regex;
use std::sync::LazyLock;

use super::GeneratedVariants;
use crate::error::GenerationError;

static HTML_SECTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"HTML_VERSION:\s*```html\s*([\s\S]*?)\s*```").expect("valid HTML section regex")
});

static NEXTJS_SECTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"NEXTJS_VERSION:\s*```tsx\s*([\s\S]*?)\s*```").expect("valid Next.js section regex")
});

/// Pulls both fenced sections out of the model text. Each section must be
/// present and non-empty after trimming.
pub fn extract_variants(text: &str) -> Result<GeneratedVariants, GenerationError> {
    let html_version =
        section(&HTML_SECTION, text).ok_or(GenerationError::MissingSection("HTML_VERSION"))?;
    let nextjs_version =
        section(&NEXTJS_SECTION, text).ok_or(GenerationError::MissingSection("NEXTJS_VERSION"))?;

    Ok(GeneratedVariants {
        html_version,
        nextjs_version,
    })
}

fn section(re: &Regex, text: &str) -> Option<String> {
    let body = re.captures(text)?.get(1)?.as_str().trim();
    (!body.is_empty()).then(|| body.to_string())
}
