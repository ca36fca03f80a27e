use crate::errors::ValidationError;

/// Minimum trimmed length for text to be submitted.
pub const MIN_RESUME_CHARS: usize = 250;

/// Minimum number of distinct section keywords the text must mention.
pub const MIN_SECTION_KEYWORDS: usize = 2;

const SECTION_KEYWORDS: &[&str] = &[
    "experience",
    "education",
    "skills",
    "project",
    "summary",
    "objective",
];

/// Checks raw resume text against minimal structural heuristics.
///
/// FAIL conditions, checked in order:
/// - Fewer than 250 characters after trimming
/// - Fewer than 2 section keywords (case-insensitive substring match)
pub fn validate_resume(text: &str) -> Result<(), ValidationError> {
    let trimmed = text.trim();
    let length = trimmed.chars().count();
    if length < MIN_RESUME_CHARS {
        return Err(ValidationError::TooShort { length });
    }

    let found = count_section_keywords(trimmed);
    if found < MIN_SECTION_KEYWORDS {
        return Err(ValidationError::NotResumeLike { found });
    }

    Ok(())
}

fn count_section_keywords(text: &str) -> usize {
    let text_lower = text.to_lowercase();
    SECTION_KEYWORDS
        .iter()
        .filter(|&&keyword| text_lower.contains(keyword))
        .count()
}
