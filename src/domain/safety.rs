//! Content safety policy attached to every model invocation of a flow

use serde::{Deserialize, Serialize};

/// Content-risk category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HarmCategory {
    #[serde(rename = "HARM_CATEGORY_HATE_SPEECH")]
    HateSpeech,
    #[serde(rename = "HARM_CATEGORY_SEXUALLY_EXPLICIT")]
    SexuallyExplicit,
    #[serde(rename = "HARM_CATEGORY_HARASSMENT")]
    Harassment,
    #[serde(rename = "HARM_CATEGORY_DANGEROUS_CONTENT")]
    DangerousContent,
}

impl HarmCategory {
    pub const ALL: [HarmCategory; 4] = [
        HarmCategory::HateSpeech,
        HarmCategory::SexuallyExplicit,
        HarmCategory::Harassment,
        HarmCategory::DangerousContent,
    ];

    /// Wire name used by the provider API
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HateSpeech => "HARM_CATEGORY_HATE_SPEECH",
            Self::SexuallyExplicit => "HARM_CATEGORY_SEXUALLY_EXPLICIT",
            Self::Harassment => "HARM_CATEGORY_HARASSMENT",
            Self::DangerousContent => "HARM_CATEGORY_DANGEROUS_CONTENT",
        }
    }

    pub fn from_wire(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == name)
    }
}

/// Lowest severity at which content is blocked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockThreshold {
    BlockLowAndAbove,
    BlockMediumAndAbove,
    BlockOnlyHigh,
    BlockNone,
}

/// Threshold for one category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetySetting {
    pub category: HarmCategory,
    pub threshold: BlockThreshold,
}

/// Fixed set of thresholds, one per harm category
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SafetyPolicy {
    settings: Vec<SafetySetting>,
}

impl SafetyPolicy {
    /// The same threshold for every category
    pub fn uniform(threshold: BlockThreshold) -> Self {
        Self {
            settings: HarmCategory::ALL
                .into_iter()
                .map(|category| SafetySetting {
                    category,
                    threshold,
                })
                .collect(),
        }
    }

    /// Block at medium severity and above in all four categories
    pub fn standard() -> Self {
        Self::uniform(BlockThreshold::BlockMediumAndAbove)
    }

    /// Override the threshold for one category
    pub fn with_threshold(mut self, category: HarmCategory, threshold: BlockThreshold) -> Self {
        if let Some(setting) = self.settings.iter_mut().find(|s| s.category == category) {
            setting.threshold = threshold;
        }
        self
    }

    pub fn settings(&self) -> &[SafetySetting] {
        &self.settings
    }

    pub fn threshold(&self, category: HarmCategory) -> Option<BlockThreshold> {
        self.settings
            .iter()
            .find(|s| s.category == category)
            .map(|s| s.threshold)
    }
}

impl Default for SafetyPolicy {
    fn default() -> Self {
        Self::standard()
    }
}
