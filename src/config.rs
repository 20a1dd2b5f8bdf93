use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

static DEFAULT_CONFIG: &str = include_str!("default_config.toml");

/// Caller-supplied settings. These are the only knobs the renderers consult;
/// everything else about the output is a fixed default.
#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub document: DocumentConfig,
    pub page: PageConfig,
    pub theme: ThemeConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DocumentConfig {
    /// Running page header text
    pub title: String,
    /// Right-aligned tag in the page header. Empty hides it.
    pub document_id: String,
    /// Footer marking
    pub classification: String,
    /// Second line of the title page
    pub subtitle: String,
    /// Extra rows for the title page's document-info table
    pub info: Vec<InfoRow>,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            title: "Untitled Document".to_string(),
            document_id: String::new(),
            classification: "Internal Use Only".to_string(),
            subtitle: String::new(),
            info: Vec::new(),
        }
    }
}

impl DocumentConfig {
    /// Title-page info rows: document id, the configured rows, classification.
    pub fn info_rows(&self) -> Vec<InfoRow> {
        let mut rows = Vec::with_capacity(self.info.len() + 2);
        if !self.document_id.is_empty() {
            rows.push(InfoRow::new("Document ID", &self.document_id));
        }
        rows.extend(self.info.iter().cloned());
        rows.push(InfoRow::new("Classification", &self.classification));
        rows
    }
}

/// One `label: value` line of the document-info table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfoRow {
    pub label: String,
    pub value: String,
}

impl InfoRow {
    pub fn new(label: &str, value: &str) -> Self {
        Self {
            label: label.to_string(),
            value: value.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    /// Page counter in the footer
    pub numbers: bool,
    /// Open the document with a title page
    pub title_page: bool,
    /// Headings of this level start a new page; 0 turns section breaks off
    pub break_level: u8,
    /// Footer date stamp, e.g. "January 12, 2026"
    pub generated: Option<String>,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            numbers: true,
            title_page: false,
            break_level: 1,
            generated: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    pub primary: Color,
    pub secondary: Color,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            primary: Color::rgb(0x1E, 0x3A, 0x8A),
            secondary: Color::rgb(0x3B, 0x82, 0xF6),
        }
    }
}

impl ThemeConfig {
    /// Text color for a heading level.
    pub fn heading_color(&self, level: u8) -> &Color {
        match level {
            2 => &self.secondary,
            _ => &self.primary,
        }
    }

    pub fn table_header(&self) -> &Color {
        &self.primary
    }
}

/// A `#RRGGBB` color, validated on construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct Color(String);

impl Color {
    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self(format!("#{:02X}{:02X}{:02X}", r, g, b))
    }

    pub fn hex(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Color {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        let digits = value.strip_prefix('#').unwrap_or("");
        if digits.len() == 6 && digits.chars().all(|c| c.is_ascii_hexdigit()) {
            Ok(Self(value.to_ascii_uppercase()))
        } else {
            Err(Error::InvalidColor(value))
        }
    }
}

impl Config {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// The configuration shipped in `default_config.toml`.
    ///
    /// `build.rs` rejects an invalid file, so the fallback only matters if the
    /// two ever drift apart.
    pub fn compiled_default() -> Self {
        Self::from_toml_str(DEFAULT_CONFIG).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn compiled_default_matches_builtin_default() {
        assert_eq!(Config::compiled_default(), Config::default());
    }

    #[test]
    fn empty_file_uses_defaults() {
        assert_eq!(Config::from_toml_str("").unwrap(), Config::default());
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config = Config::from_toml_str(
            r##"
            [document]
            title = "Purchase Order SOP"

            [theme]
            secondary = "#10b981"
            "##,
        )
        .unwrap();

        assert_eq!(config.document.title, "Purchase Order SOP");
        assert_eq!(config.document.classification, "Internal Use Only");
        assert!(config.page.numbers);
        assert_eq!(config.theme.primary.hex(), "#1E3A8A");
        assert_eq!(config.theme.secondary.hex(), "#10B981");
    }

    #[test]
    fn rejects_malformed_color() {
        let err = Config::from_toml_str("[theme]\nprimary = \"navy\"\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("navy"), "{err}");
    }

    #[test]
    fn title_page_settings() {
        let config = Config::from_toml_str(
            r##"
            [document]
            document_id = "ASR-SOP-PO-001"
            subtitle = "Standard Operating Procedure"
            info = [
                { label = "Version", value = "1.0" },
                { label = "Document Owner", value = "Operations" },
            ]

            [page]
            title_page = true
            break_level = 2
            generated = "January 12, 2026"
            "##,
        )
        .unwrap();

        assert!(config.page.title_page);
        assert_eq!(config.page.break_level, 2);
        assert_eq!(config.page.generated.as_deref(), Some("January 12, 2026"));
        assert_eq!(
            config.document.info_rows(),
            vec![
                InfoRow::new("Document ID", "ASR-SOP-PO-001"),
                InfoRow::new("Version", "1.0"),
                InfoRow::new("Document Owner", "Operations"),
                InfoRow::new("Classification", "Internal Use Only"),
            ]
        );
    }

    #[test]
    fn heading_colors_follow_level() {
        let theme = ThemeConfig::default();
        assert_eq!(theme.heading_color(1), &theme.primary);
        assert_eq!(theme.heading_color(2), &theme.secondary);
        assert_eq!(theme.heading_color(3), &theme.primary);
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[document]\ndocument_id = \"ASR-SOP-PO-001\"").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.document.document_id, "ASR-SOP-PO-001");
    }

    #[test]
    fn load_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(&dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, Error::Read { .. }));
    }
}
