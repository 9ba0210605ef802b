use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Response tone applied to every request until the user picks another one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StyleProfile {
    #[default]
    Professional,
    Friendly,
    Concise,
}

impl StyleProfile {
    pub const ALL: [StyleProfile; 3] = [
        StyleProfile::Professional,
        StyleProfile::Friendly,
        StyleProfile::Concise,
    ];

    pub fn id(self) -> &'static str {
        match self {
            StyleProfile::Professional => "professional",
            StyleProfile::Friendly => "friendly",
            StyleProfile::Concise => "concise",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            StyleProfile::Professional => "Professional",
            StyleProfile::Friendly => "Friendly",
            StyleProfile::Concise => "Concise",
        }
    }

    pub fn system_prompt(self) -> &'static str {
        match self {
            StyleProfile::Professional => {
                "Answer in a professional, formal tone. Use precise terminology and provide detailed analysis and insight."
            }
            StyleProfile::Friendly => {
                "Answer in a friendly, relaxed tone. Use everyday language, keep things easy to follow, and add a touch of playfulness where it fits."
            }
            StyleProfile::Concise => {
                "Answer concisely and directly. Go straight to the point, skip embellishment, and use as few words as possible to convey the core content."
            }
        }
    }

    pub fn temperature(self) -> f64 {
        match self {
            StyleProfile::Professional => 0.7,
            StyleProfile::Friendly => 0.8,
            StyleProfile::Concise => 0.5,
        }
    }
}

impl fmt::Display for StyleProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for StyleProfile {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        StyleProfile::ALL
            .into_iter()
            .find(|style| style.id() == normalized)
            .ok_or_else(|| {
                let available: Vec<&str> = StyleProfile::ALL.iter().map(|s| s.id()).collect();
                format!(
                    "Unknown style '{}'. Available styles: {}",
                    value.trim(),
                    available.join(", ")
                )
            })
    }
}
