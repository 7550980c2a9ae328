use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::types::Prompt;
use crate::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryConfig {
    pub name: String,
    pub prompts: Vec<String>,
}

/// On-disk shape of `config/catalog.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogFile {
    pub brand: String,
    pub variants: Vec<String>,
    pub categories: Vec<CategoryConfig>,
}

/// Immutable, validated prompt catalog.
///
/// Prompts are flattened in file order; a prompt's `id` is its position and
/// stays stable across runs as long as the file is unchanged.
#[derive(Debug, Clone)]
pub struct PromptCatalog {
    brand: String,
    variants: Vec<String>,
    categories: Vec<String>,
    prompts: Vec<Prompt>,
}

impl PromptCatalog {
    /// Validate a parsed catalog file and freeze it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] when the brand, variants, categories
    /// or prompts break the catalog rules.
    pub fn from_file(file: CatalogFile) -> Result<Self, ConfigError> {
        validate_catalog(&file)?;

        let categories = file
            .categories
            .iter()
            .map(|c| c.name.trim().to_string())
            .collect();
        let prompts = file
            .categories
            .iter()
            .flat_map(|c| c.prompts.iter().map(move |text| (c.name.trim(), text)))
            .enumerate()
            .map(|(id, (category, text))| Prompt {
                id,
                category: category.to_string(),
                text: text.trim().to_string(),
            })
            .collect();
        let variants = file
            .variants
            .into_iter()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .collect();

        Ok(Self {
            brand: file.brand.trim().to_string(),
            variants,
            categories,
            prompts,
        })
    }

    #[must_use]
    pub fn brand(&self) -> &str {
        &self.brand
    }

    /// Recognized spellings of the brand, blank entries removed.
    #[must_use]
    pub fn variants(&self) -> &[String] {
        &self.variants
    }

    /// Distinct category names in catalog order.
    #[must_use]
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    #[must_use]
    pub fn prompts(&self) -> &[Prompt] {
        &self.prompts
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }

    /// Position of `category` in catalog order, or `None` for an unknown name.
    #[must_use]
    pub fn category_rank(&self, category: &str) -> Option<usize> {
        self.categories.iter().position(|c| c == category)
    }
}

/// Load and validate the prompt catalog from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_catalog(path: &Path) -> Result<PromptCatalog, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::CatalogIo {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_catalog(&content)
}

/// Parse and validate a catalog from YAML text.
///
/// # Errors
///
/// Returns [`ConfigError::CatalogParse`] for malformed YAML and
/// [`ConfigError::Validation`] for content that breaks the catalog rules.
pub fn parse_catalog(content: &str) -> Result<PromptCatalog, ConfigError> {
    let file: CatalogFile = serde_yaml::from_str(content)?;
    PromptCatalog::from_file(file)
}

fn validate_catalog(file: &CatalogFile) -> Result<(), ConfigError> {
    if file.brand.trim().is_empty() {
        return Err(ConfigError::Validation(
            "brand must be non-empty".to_string(),
        ));
    }

    if file.variants.iter().all(|v| v.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "at least one non-blank brand variant is required".to_string(),
        ));
    }

    if file.categories.is_empty() {
        return Err(ConfigError::Validation(
            "catalog must contain at least one category".to_string(),
        ));
    }

    let mut seen_categories = HashSet::new();
    let mut seen_prompts = HashSet::new();

    for category in &file.categories {
        let name = category.name.trim();
        if name.is_empty() {
            return Err(ConfigError::Validation(
                "category name must be non-empty".to_string(),
            ));
        }

        if !seen_categories.insert(name.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate category: '{name}'"
            )));
        }

        if category.prompts.is_empty() {
            return Err(ConfigError::Validation(format!(
                "category '{name}' has no prompts"
            )));
        }

        for prompt in &category.prompts {
            let text = prompt.trim();
            if text.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "category '{name}' contains an empty prompt"
                )));
            }
            if !seen_prompts.insert(text.to_lowercase()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate prompt: '{text}'"
                )));
            }
        }
    }

    Ok(())
}
