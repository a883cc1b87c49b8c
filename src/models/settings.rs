//! Scoring configuration, presets and the locally stored settings document.

use serde::{Deserialize, Serialize};

/// Fixed points applied to the two sides of a resolved duel.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct DuelPayout {
    pub win: i64,
    pub loss: i64,
}

impl Default for DuelPayout {
    fn default() -> Self {
        Self {
            win: 1000,
            loss: -500,
        }
    }
}

/// Points for a measurement. Penalties are per gram of deviation.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringConfig {
    pub perfect_score: i64,
    pub margin_penalty: i64,
    pub failure_penalty: i64,
    /// Floor for every non-duel score.
    pub min_score: i64,
    #[serde(default)]
    pub duel: DuelPayout,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            perfect_score: 1000,
            margin_penalty: 100,
            failure_penalty: 200,
            min_score: -500,
            duel: DuelPayout::default(),
        }
    }
}

/// What drives a single round: allowed margin, retries and scoring.
/// Also the `settings` document of a multiplayer session.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundRules {
    /// Allowed absolute deviation in grams.
    pub margin: f64,
    pub max_retries: u32,
    pub scoring: ScoringConfig,
}

impl Default for RoundRules {
    fn default() -> Self {
        Self {
            margin: 5.0,
            max_retries: 2,
            scoring: ScoringConfig::default(),
        }
    }
}

/// A named bundle of round rules selectable by players.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSettingPreset {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub rules: RoundRules,
}

impl GameSettingPreset {
    fn builtin(
        id: &str,
        name: &str,
        description: &str,
        margin: f64,
        max_retries: u32,
        scoring: [i64; 4],
    ) -> Self {
        let [perfect_score, margin_penalty, failure_penalty, min_score] = scoring;
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            rules: RoundRules {
                margin,
                max_retries,
                scoring: ScoringConfig {
                    perfect_score,
                    margin_penalty,
                    failure_penalty,
                    min_score,
                    duel: DuelPayout::default(),
                },
            },
        }
    }

    /// The balanced preset used when nothing else is configured.
    pub fn standard() -> Self {
        Self::builtin(
            "standard",
            "Standard",
            "Balanced settings for casual play",
            5.0,
            2,
            [1000, 100, 200, -500],
        )
    }
}

/// The presets shipped with the game.
pub fn default_presets() -> Vec<GameSettingPreset> {
    vec![
        GameSettingPreset::builtin(
            "beginner",
            "Beginner",
            "Larger margin and more retries for new players",
            8.0,
            3,
            [1000, 50, 100, -200],
        ),
        GameSettingPreset::standard(),
        GameSettingPreset::builtin(
            "expert",
            "Expert",
            "Smaller margin and fewer retries for skilled players",
            3.0,
            1,
            [2000, 200, 400, -1000],
        ),
    ]
}

/// Locally persisted settings: which preset is active, the preset list, remembered player names.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameSettings {
    pub active_preset_id: String,
    pub presets: Vec<GameSettingPreset>,
    pub players: Vec<String>,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            active_preset_id: "standard".to_string(),
            presets: default_presets(),
            players: Vec::new(),
        }
    }
}

impl GameSettings {
    /// Active preset; an unknown id falls back to the first preset, an empty list to the defaults.
    pub fn active_preset(&self) -> GameSettingPreset {
        self.presets
            .iter()
            .find(|p| p.id == self.active_preset_id)
            .or_else(|| self.presets.first())
            .cloned()
            .unwrap_or_else(GameSettingPreset::standard)
    }

    /// Rules of the active preset.
    pub fn active_rules(&self) -> RoundRules {
        self.active_preset().rules
    }
}
