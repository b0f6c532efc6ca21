//! Descriptor file parsing.
//!
//! A descriptor is an INI-style file: `[section]` headers followed by
//! `key = value` (or `key: value`) lines. Lines starting with `#` or `;` are
//! comments. Section and key names are case-insensitive and stored lowercase.
//! A repeated header continues the earlier section; a repeated key takes the
//! value of its last declaration.

use convy_core::{keys, Mode, Section};
use regex::Regex;
use std::path::Path;

use crate::{ConfigError, Result};

/// Descriptor file name looked up in every managed directory.
pub const DESCRIPTOR_FILE: &str = "convy.cfg";

/// A parsed descriptor.
#[derive(Debug, Clone, Default)]
pub struct Descriptor {
    sections: Vec<Section>,
}

impl Descriptor {
    /// Parse descriptor text. `path` is only used for error messages.
    pub fn parse(text: &str, path: &Path) -> Result<Self> {
        let grammar = |pattern: &str| Regex::new(pattern).map_err(|e| syntax(path, 0, e.to_string()));
        let header = grammar(r"^\[\s*([^\]]+?)\s*\]$")?;
        let pair = grammar(r"^([^=:]+?)\s*[=:]\s*(.*)$")?;

        let mut sections: Vec<Section> = Vec::new();
        let mut current: Option<usize> = None;

        for (i, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            if let Some(caps) = header.captures(line) {
                let name = caps[1].to_lowercase();
                let idx = match sections.iter().position(|s| s.name == name) {
                    Some(idx) => idx,
                    None => {
                        sections.push(Section::new(name));
                        sections.len() - 1
                    }
                };
                current = Some(idx);
                continue;
            }

            let Some(caps) = pair.captures(line) else {
                return Err(syntax(path, i + 1, format!("expected `key = value`, found {line:?}")));
            };
            let Some(idx) = current else {
                return Err(syntax(path, i + 1, "key outside of any section"));
            };
            sections[idx].insert(caps[1].trim().to_lowercase(), caps[2].trim());
        }

        Ok(Self { sections })
    }

    /// Find a section by name.
    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    /// Sections in file order.
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Check the descriptor and return its mode.
    ///
    /// `[main] mode` must name a known mode and every `[settings-*]` section
    /// must carry a valid `tier` key.
    pub fn validate(&self, path: &Path) -> Result<Mode> {
        let declared = self.section(keys::MAIN).and_then(|s| s.get(keys::MODE));
        let mode = declared
            .and_then(|v| v.parse::<Mode>().ok())
            .ok_or_else(|| ConfigError::InvalidMode {
                path: path.to_path_buf(),
                value: declared.map(str::to_string),
            })?;

        for section in self.sections.iter().filter(|s| s.is_tiered()) {
            match section.get(keys::TIER) {
                None => {
                    return Err(ConfigError::MissingTierKey {
                        path: path.to_path_buf(),
                        section: section.name.clone(),
                    })
                }
                Some(value) if section.tier().is_none() => {
                    return Err(ConfigError::InvalidTier {
                        path: path.to_path_buf(),
                        section: section.name.clone(),
                        value: value.to_string(),
                    })
                }
                Some(_) => {}
            }
        }

        Ok(mode)
    }

    /// Consume into sections.
    pub fn into_sections(self) -> Vec<Section> {
        self.sections
    }
}

fn syntax(path: &Path, line: usize, message: impl Into<String>) -> ConfigError {
    ConfigError::Syntax {
        path: path.to_path_buf(),
        line,
        message: message.into(),
    }
}
