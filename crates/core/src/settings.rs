//! Descriptor sections, settings layers and the resolved settings map.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::Tier;

/// Well-known section names and keys of a descriptor file.
pub mod keys {
    /// `[main]`
    pub const MAIN: &str = "main";
    /// `[settings]`
    pub const SETTINGS: &str = "settings";
    /// Prefix of tier-specific sections, `[settings-<label>]`
    pub const SETTINGS_PREFIX: &str = "settings-";
    /// `[feature]`
    pub const FEATURE: &str = "feature";
    /// `[special]`
    pub const SPECIAL: &str = "special";
    /// `[episode]`
    pub const EPISODE: &str = "episode";
    /// `[pushover]`
    pub const PUSHOVER: &str = "pushover";

    /// Directory mode in `[main]`
    pub const MODE: &str = "mode";
    /// Tier a `[settings-*]` section applies to
    pub const TIER: &str = "tier";
    /// Fan out to every lower tier
    pub const MULTIPLE_RESOLUTION: &str = "multipleresolution";

    /// Video codec
    pub const VIDEO_CODEC: &str = "video.codec";
    /// Video bitrate
    pub const VIDEO_BITRATE: &str = "video.bitrate";
    /// Encoder preset
    pub const VIDEO_PRESET: &str = "video.preset";
    /// Number of encode passes
    pub const VIDEO_PASSES: &str = "video.passes";
    /// Extra whitespace-separated arguments
    pub const VIDEO_PARAMS: &str = "video.params";
    /// Audio codec
    pub const AUDIO_CODEC: &str = "audio.codec";
    /// Output muxer
    pub const OUTPUT_FORMAT: &str = "output.format";
    /// Output directory, relative to the source's directory
    pub const OUTPUT_DIRECTORY: &str = "output.directory";

    /// Pushover user key
    pub const PUSHOVER_USER: &str = "user";
    /// Pushover application token
    pub const PUSHOVER_API: &str = "api";
}

/// Parse a descriptor boolean.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "yes" | "true" | "on" => Some(true),
        "0" | "no" | "false" | "off" => Some(false),
        _ => None,
    }
}

/// One `[section]` of a descriptor, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Section name (lowercased)
    pub name: String,

    /// Key/value pairs in declaration order
    entries: Vec<(String, String)>,
}

impl Section {
    /// Create an empty section.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    /// Insert a key. A repeated key keeps its first position and takes the
    /// value of the last declaration.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Look up a key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Entries in declaration order.
    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    /// Whether this is a `[settings-*]` section.
    pub fn is_tiered(&self) -> bool {
        self.name.starts_with(keys::SETTINGS_PREFIX)
    }

    /// Tier declared by a `[settings-*]` section, if parseable.
    pub fn tier(&self) -> Option<Tier> {
        self.get(keys::TIER).and_then(|v| v.parse().ok())
    }
}

/// Immutable snapshot of one section's contribution to resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layer {
    /// Directory the section came from
    pub origin: PathBuf,

    /// Section name
    pub section: String,

    /// Pairs applied by this layer
    pub entries: Vec<(String, String)>,
}

impl Layer {
    /// Snapshot a section. The `tier` selector is not a setting and is dropped.
    pub fn from_section(origin: impl Into<PathBuf>, section: &Section) -> Self {
        Self {
            origin: origin.into(),
            section: section.name.clone(),
            entries: section
                .entries()
                .iter()
                .filter(|(k, _)| k != keys::TIER)
                .cloned()
                .collect(),
        }
    }
}

/// Flat key/value settings for one (item, tier) pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedSettings {
    values: BTreeMap<String, String>,
}

impl ResolvedSettings {
    /// Fold layers, first to last, into a fresh map. Later layers overwrite.
    pub fn fold<'a>(layers: impl IntoIterator<Item = &'a Layer>) -> Self {
        let values = layers
            .into_iter()
            .flat_map(|layer| layer.entries.iter().cloned())
            .fold(BTreeMap::new(), |mut acc, (k, v)| {
                acc.insert(k, v);
                acc
            });
        Self { values }
    }

    /// Look up a key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|v| v.as_str())
    }

    /// All values.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no key is set.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Video codec, `libx264` when unset.
    pub fn video_codec(&self) -> &str {
        self.get(keys::VIDEO_CODEC).unwrap_or("libx264")
    }

    /// Audio codec, `copy` when unset.
    pub fn audio_codec(&self) -> &str {
        self.get(keys::AUDIO_CODEC).unwrap_or("copy")
    }

    /// Pass count. Missing, unparseable or zero values mean a single pass.
    pub fn passes(&self) -> u32 {
        self.get(keys::VIDEO_PASSES)
            .and_then(|v| v.trim().parse::<u32>().ok())
            .filter(|n| *n >= 1)
            .unwrap_or(1)
    }

    /// Extra encoder arguments.
    pub fn params(&self) -> Vec<String> {
        self.get(keys::VIDEO_PARAMS)
            .map(|p| p.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Output muxer, `matroska` when unset.
    pub fn output_format(&self) -> &str {
        self.get(keys::OUTPUT_FORMAT).unwrap_or("matroska")
    }

    /// File extension for the output muxer.
    pub fn output_extension(&self) -> &str {
        match self.output_format() {
            "matroska" => "mkv",
            "mpegts" => "ts",
            other => other,
        }
    }

    /// Output directory relative to the source's directory.
    pub fn output_directory(&self) -> &str {
        self.get(keys::OUTPUT_DIRECTORY).unwrap_or(".convy")
    }
}

impl FromIterator<(String, String)> for ResolvedSettings {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer(section: &str, pairs: &[(&str, &str)]) -> Layer {
        let mut s = Section::new(section);
        for (k, v) in pairs {
            s.insert(*k, *v);
        }
        Layer::from_section("/media", &s)
    }

    #[test]
    fn test_section_last_declaration_wins() {
        let mut s = Section::new("settings");
        s.insert("video.codec", "x264");
        s.insert("video.passes", "1");
        s.insert("video.codec", "x265");

        assert_eq!(s.get("video.codec"), Some("x265"));
        assert_eq!(s.entries()[0].0, "video.codec");
        assert_eq!(s.entries().len(), 2);
    }

    #[test]
    fn test_fold_later_layers_win() {
        let root = layer("settings", &[("video.codec", "x264"), ("video.passes", "2")]);
        let leaf = layer("settings", &[("video.codec", "x265")]);

        let resolved = ResolvedSettings::fold([&root, &leaf]);
        assert_eq!(resolved.get("video.codec"), Some("x265"));
        assert_eq!(resolved.passes(), 2);

        let reversed = ResolvedSettings::fold([&leaf, &root]);
        assert_eq!(reversed.get("video.codec"), Some("x264"));
    }

    #[test]
    fn test_tier_key_is_not_a_setting() {
        let l = layer("settings-uhd", &[("tier", "4k"), ("video.bitrate", "20M")]);
        assert_eq!(l.entries, vec![("video.bitrate".to_string(), "20M".to_string())]);
    }

    #[test]
    fn test_defaults() {
        let resolved = ResolvedSettings::default();
        assert_eq!(resolved.passes(), 1);
        assert_eq!(resolved.video_codec(), "libx264");
        assert_eq!(resolved.output_extension(), "mkv");
        assert!(resolved.params().is_empty());
    }

    #[test]
    fn test_passes_rejects_zero_and_garbage() {
        let zero: ResolvedSettings = [("video.passes".to_string(), "0".to_string())].into_iter().collect();
        assert_eq!(zero.passes(), 1);
        let junk: ResolvedSettings = [("video.passes".to_string(), "two".to_string())].into_iter().collect();
        assert_eq!(junk.passes(), 1);
    }

    #[test]
    fn test_params_split_on_whitespace() {
        let s: ResolvedSettings = [("video.params".to_string(), " -tune  film -crf 20 ".to_string())]
            .into_iter()
            .collect();
        assert_eq!(s.params(), vec!["-tune", "film", "-crf", "20"]);
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("Yes"), Some(true));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
