use crate::types::Platform;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    /// Decides Home/End equivalents and the primary shortcut modifier.
    pub platform: Platform,
    /// Wrap shifted glyphs typed without an explicit Shift in an implicit Shift chord.
    #[serde(default = "default_true")]
    pub implicit_shift: bool,
    /// Shift held explicitly turns `a` into `A` and `1` into `!`.
    #[serde(default = "default_true")]
    pub shift_transforms_glyphs: bool,
}

fn default_true() -> bool {
    true
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            platform: Platform::host(),
            implicit_shift: true,
            shift_transforms_glyphs: true,
        }
    }
}

impl Profile {
    pub fn for_platform(platform: Platform) -> Self {
        Self {
            platform,
            ..Self::default()
        }
    }

    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("invalid profile JSON")
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading profile {}", path.display()))?;
        let profile = Self::from_json(&text)?;
        info!("Profile loaded from {}: {:?}", path.display(), profile);
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let profile = Profile::from_json(r#"{ "platform": "MacOs" }"#).expect("parse");
        assert_eq!(profile.platform, Platform::MacOs);
        assert!(profile.implicit_shift);
        assert!(profile.shift_transforms_glyphs);
    }

    #[test]
    fn test_flags_override() {
        let profile = Profile::from_json(r#"{ "platform": "Linux", "implicit_shift": false }"#)
            .expect("parse");
        assert_eq!(profile.platform, Platform::Linux);
        assert!(!profile.implicit_shift);
    }

    #[test]
    fn test_malformed_json_is_error() {
        assert!(Profile::from_json("{ platform: ").is_err());
    }
}
