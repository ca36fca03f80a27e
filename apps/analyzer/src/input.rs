use std::io::Read;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tracing::debug;

/// Reads draft text from a file path, or stdin when the path is `-`.
/// PDF files are converted to text; anything else is read as UTF-8.
pub fn read_text(source: &str) -> Result<String> {
    if source == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read from stdin")?;
        return Ok(text);
    }

    let path = Path::new(source);
    if is_pdf(path) {
        debug!("Extracting text from PDF {}", path.display());
        return pdf_extract::extract_text(path)
            .map_err(|e| anyhow!("Failed to extract text from '{}': {e}", path.display()));
    }

    std::fs::read_to_string(path).with_context(|| format!("Failed to read '{}'", path.display()))
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}
