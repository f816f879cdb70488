//! Emotional state labels and PAD deltas

use serde::{Deserialize, Serialize};
use std::fmt;

/// Emotional state reported by the emotion system.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Emotion {
    Angry,
    Sad,
    Fear,
    Inhibited,
    Happy,
    Loved,
    Dignified,
    #[default]
    Neutral,
    Elated,
    Bored,
    Curious,
    Unconcerned,
    /// A label this layer has no policy for. Kept verbatim for response lookups.
    Other(String),
}

/// How the planning policy groups emotions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AffectClass {
    /// angry, sad, fear, inhibited
    Negative,
    /// happy, loved, dignified, neutral, elated
    Positive,
    /// bored, curious, unconcerned
    LowArousal,
    Unclassified,
}

impl Emotion {
    /// Parse an emotion label. Unknown labels are kept as [`Emotion::Other`].
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "angry" => Emotion::Angry,
            "sad" => Emotion::Sad,
            "fear" => Emotion::Fear,
            "inhibited" => Emotion::Inhibited,
            "happy" => Emotion::Happy,
            "loved" => Emotion::Loved,
            "dignified" => Emotion::Dignified,
            "neutral" => Emotion::Neutral,
            "elated" => Emotion::Elated,
            "bored" => Emotion::Bored,
            "curious" => Emotion::Curious,
            "unconcerned" => Emotion::Unconcerned,
            _ => Emotion::Other(label.trim().to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Emotion::Angry => "angry",
            Emotion::Sad => "sad",
            Emotion::Fear => "fear",
            Emotion::Inhibited => "inhibited",
            Emotion::Happy => "happy",
            Emotion::Loved => "loved",
            Emotion::Dignified => "dignified",
            Emotion::Neutral => "neutral",
            Emotion::Elated => "elated",
            Emotion::Bored => "bored",
            Emotion::Curious => "curious",
            Emotion::Unconcerned => "unconcerned",
            Emotion::Other(label) => label,
        }
    }

    pub fn affect_class(&self) -> AffectClass {
        match self {
            Emotion::Angry | Emotion::Sad | Emotion::Fear | Emotion::Inhibited => {
                AffectClass::Negative
            }
            Emotion::Happy
            | Emotion::Loved
            | Emotion::Dignified
            | Emotion::Neutral
            | Emotion::Elated => AffectClass::Positive,
            Emotion::Bored | Emotion::Curious | Emotion::Unconcerned => AffectClass::LowArousal,
            Emotion::Other(_) => AffectClass::Unclassified,
        }
    }

    /// Whether the robot keeps wandering in this emotional state
    pub fn is_wandering_eligible(&self) -> bool {
        self.affect_class() == AffectClass::LowArousal
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<String> for Emotion {
    fn from(label: String) -> Self {
        Emotion::from_label(&label)
    }
}

impl From<Emotion> for String {
    fn from(emotion: Emotion) -> Self {
        emotion.label().to_string()
    }
}

/// A (pleasure, arousal, dominance) adjustment sent to the emotion system.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PadDelta {
    pub pleasure: f64,
    pub arousal: f64,
    pub dominance: f64,
}

impl PadDelta {
    pub const fn new(pleasure: f64, arousal: f64, dominance: f64) -> Self {
        PadDelta {
            pleasure,
            arousal,
            dominance,
        }
    }

    pub const fn dominance(dominance: f64) -> Self {
        PadDelta::new(0.0, 0.0, dominance)
    }

    pub const fn pleasure(pleasure: f64) -> Self {
        PadDelta::new(pleasure, 0.0, 0.0)
    }
}
