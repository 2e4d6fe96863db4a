//! Template-based destination path formatting.

use std::path::PathBuf;

use crate::config::PathConfig;
use crate::error::FormatError;
use crate::media::{MediaType, ResolvedMatch};
use crate::resolve::PathFormatter;

/// Characters that cannot appear inside a single path component.
const ILLEGAL_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Formats destinations from the templates in a [`PathConfig`].
#[derive(Debug, Clone, Default)]
pub struct TemplateFormatter {
    config: PathConfig,
}

impl TemplateFormatter {
    /// Create a formatter for the given templates.
    pub fn new(config: PathConfig) -> Self {
        Self { config }
    }

    /// The templates in use.
    pub fn config(&self) -> &PathConfig {
        &self.config
    }

    fn template_for(&self, media_type: MediaType) -> &str {
        match media_type {
            MediaType::Movie => &self.config.movie_template,
            _ => &self.config.tv_template,
        }
    }
}

impl PathFormatter for TemplateFormatter {
    fn format(&self, matched: &ResolvedMatch) -> Result<PathBuf, FormatError> {
        let rendered = render(self.template_for(matched.media_type), matched)?;

        let mut path = PathBuf::new();
        for component in rendered.split('/').map(str::trim).filter(|c| !c.is_empty()) {
            if component == "." || component == ".." {
                return Err(FormatError::InvalidComponent {
                    component: component.to_string(),
                });
            }
            path.push(component);
        }

        if path.as_os_str().is_empty() {
            return Err(FormatError::EmptyPath);
        }
        Ok(path)
    }
}

fn render(template: &str, matched: &ResolvedMatch) -> Result<String, FormatError> {
    let mut out = String::with_capacity(template.len() + matched.title.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let close = after.find('}').ok_or_else(|| FormatError::Unterminated {
            template: template.to_string(),
        })?;
        out.push_str(&placeholder(&after[..close], matched)?);
        rest = &after[close + 1..];
    }
    out.push_str(rest);

    Ok(out)
}

fn placeholder(name: &str, matched: &ResolvedMatch) -> Result<String, FormatError> {
    let value = match name.trim() {
        "title" => Some(sanitize(&matched.title))
            .filter(|t| !t.is_empty())
            .ok_or(FormatError::MissingField { field: "title" })?,
        "season" => format!(
            "{:02}",
            matched
                .season
                .ok_or(FormatError::MissingField { field: "season" })?
        ),
        "episode" => format!(
            "{:02}",
            matched
                .episode
                .ok_or(FormatError::MissingField { field: "episode" })?
        ),
        "year" => matched
            .year
            .ok_or(FormatError::MissingField { field: "year" })?
            .to_string(),
        "ext" => sanitize(&matched.extension),
        other => {
            return Err(FormatError::UnknownPlaceholder {
                name: other.to_string(),
            });
        }
    };
    Ok(value)
}

fn sanitize(value: &str) -> String {
    value
        .chars()
        .map(|c| if ILLEGAL_CHARS.contains(&c) { '-' } else { c })
        .collect::<String>()
        .trim_matches('.')
        .to_string()
}
