use regex::{Regex, RegexBuilder};

use crate::config::ConfigError;

/// Placeholder a title template gets in place of its `/pattern/flags` segment.
pub const REGEX_RESULT: &str = "$REGEXRESULT";

const ELLIPSIS: &str = "...";

/// Clamp `input` to at most `max` characters, ending in `...` when cut.
pub fn clamp_with_ellipsis(input: &str, max: usize) -> String {
    if input.chars().count() <= max {
        return input.to_string();
    }
    if max <= ELLIPSIS.len() {
        return input.chars().take(max).collect();
    }

    let mut out: String = input.chars().take(max - ELLIPSIS.len()).collect();
    out.push_str(ELLIPSIS);
    out
}

pub fn plural(word: &str, count: usize) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{}s", word)
    }
}

/// A regex lifted out of a title template.
#[derive(Debug, Clone)]
pub struct TitleRegex {
    regex: Regex,
    global: bool,
}

impl TitleRegex {
    /// Every match when the `g` flag was set, otherwise the first match followed by its groups.
    pub fn matches(&self, content: &str) -> Vec<String> {
        if self.global {
            return self
                .regex
                .find_iter(content)
                .map(|m| m.as_str().to_string())
                .collect();
        }

        match self.regex.captures(content) {
            Some(caps) => caps
                .iter()
                .map(|g| g.map(|m| m.as_str().to_string()).unwrap_or_default())
                .collect(),
            None => Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExtractedTemplate {
    /// The template with its regex segment replaced by `$REGEXRESULT`.
    pub input_with_regex_variable: String,
    pub regex: Option<TitleRegex>,
}

/// Pull the first `/pattern/flags` segment out of a title template.
///
/// The segment runs from the first `/` to the last `/`, followed by any JS-style
/// flags (`dgimsuy`). Only `g`, `i`, `m` and `s` change matching.
pub fn extract_regex(input: &str) -> Result<ExtractedTemplate, ConfigError> {
    let (Some(start), Some(end)) = (input.find('/'), input.rfind('/')) else {
        return Ok(ExtractedTemplate {
            input_with_regex_variable: input.to_string(),
            regex: None,
        });
    };
    if end <= start {
        return Ok(ExtractedTemplate {
            input_with_regex_variable: input.to_string(),
            regex: None,
        });
    }

    let pattern = &input[start + 1..end];
    let flags: String = input[end + 1..]
        .chars()
        .take_while(|c| "dgimsuy".contains(*c))
        .collect();
    let segment_end = end + 1 + flags.len();

    let regex = RegexBuilder::new(pattern)
        .case_insensitive(flags.contains('i'))
        .multi_line(flags.contains('m'))
        .dot_matches_new_line(flags.contains('s'))
        .build()
        .map_err(|source| ConfigError::InvalidRegex {
            pattern: pattern.to_string(),
            source,
        })?;

    let input_with_regex_variable = format!(
        "{}{}{}",
        &input[..start],
        REGEX_RESULT,
        &input[segment_end..]
    );

    Ok(ExtractedTemplate {
        input_with_regex_variable,
        regex: Some(TitleRegex {
            regex,
            global: flags.contains('g'),
        }),
    })
}
