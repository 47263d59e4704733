//! Deal-source configuration file.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// One scrapeable deal listing page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DealSource {
    pub url: String,
    /// Category attached to candidates extracted from this source.
    #[serde(default)]
    pub category: String,
}

#[derive(Debug, Deserialize)]
pub struct SourcesFile {
    pub sources: Vec<DealSource>,
}

/// Load and validate the deal sources configuration from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_sources(path: &Path) -> Result<SourcesFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::SourcesFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let sources_file: SourcesFile =
        serde_yaml::from_str(&content).map_err(ConfigError::SourcesFileParse)?;

    validate_sources(&sources_file)?;

    Ok(sources_file)
}

fn validate_sources(sources_file: &SourcesFile) -> Result<(), ConfigError> {
    if sources_file.sources.is_empty() {
        return Err(ConfigError::Validation(
            "sources file must list at least one source".to_string(),
        ));
    }

    let mut seen_urls = HashSet::new();
    for source in &sources_file.sources {
        let url = source.url.trim();
        if url.is_empty() {
            return Err(ConfigError::Validation(
                "source url must be non-empty".to_string(),
            ));
        }
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ConfigError::Validation(format!(
                "source url \"{url}\" must start with http:// or https://"
            )));
        }
        if !seen_urls.insert(url.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate source url: \"{url}\""
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(url: &str) -> DealSource {
        DealSource {
            url: url.to_string(),
            category: "electronics".to_string(),
        }
    }

    #[test]
    fn validate_accepts_distinct_sources() {
        let file = SourcesFile {
            sources: vec![
                source("https://www.amazon.in/gp/goldbox"),
                source("https://www.amazon.in/deals"),
            ],
        };
        assert!(validate_sources(&file).is_ok());
    }

    #[test]
    fn validate_rejects_empty_list() {
        let file = SourcesFile { sources: vec![] };
        let err = validate_sources(&file).unwrap_err();
        assert!(err.to_string().contains("at least one"));
    }

    #[test]
    fn validate_rejects_blank_url() {
        let file = SourcesFile {
            sources: vec![source("  ")],
        };
        let err = validate_sources(&file).unwrap_err();
        assert!(err.to_string().contains("non-empty"));
    }

    #[test]
    fn validate_rejects_non_http_url() {
        let file = SourcesFile {
            sources: vec![source("ftp://example.com/deals")],
        };
        let err = validate_sources(&file).unwrap_err();
        assert!(err.to_string().contains("http"));
    }

    #[test]
    fn validate_rejects_duplicate_urls_case_insensitively() {
        let file = SourcesFile {
            sources: vec![
                source("https://www.amazon.in/deals"),
                source("https://WWW.AMAZON.IN/deals"),
            ],
        };
        let err = validate_sources(&file).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn parses_yaml_document() {
        let yaml = r"
sources:
  - url: https://www.amazon.in/gp/goldbox
    category: electronics
  - url: https://www.amazon.in/deals
";
        let file: SourcesFile = serde_yaml::from_str(yaml).expect("parse sources yaml");
        assert_eq!(file.sources.len(), 2);
        assert_eq!(file.sources[0].category, "electronics");
        assert_eq!(file.sources[1].category, "");
    }
}
