use crate::chat::SentimentGains;
use anyhow::{Context, Result};
use directories::{BaseDirs, ProjectDirs};
use std::{env, fs, path::PathBuf, str::FromStr, time::Duration};
use tracing::warn;

const SAVE_FILE_NAME: &str = ".pixelgotchi_save.json";
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
const DEFAULT_FPS: u32 = 30;

/// Need levels at which the pet starts complaining.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Thresholds {
    pub energy_low: f64,
    pub hunger_high: f64,
    pub fun_low: f64,
    pub hygiene_low: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            energy_low: 0.20,
            hunger_high: 0.85,
            fun_low: 0.20,
            hygiene_low: 0.20,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatCue {
    EnergyLow,
    HungerHigh,
    FunLow,
    HygieneLow,
}

impl StatCue {
    pub const DEFAULT_PRIORITY: [StatCue; 4] = [
        StatCue::EnergyLow,
        StatCue::HungerHigh,
        StatCue::FunLow,
        StatCue::HygieneLow,
    ];
}

impl FromStr for StatCue {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "energy_low" => Ok(StatCue::EnergyLow),
            "hunger_high" => Ok(StatCue::HungerHigh),
            "fun_low" => Ok(StatCue::FunLow),
            "hygiene_low" => Ok(StatCue::HygieneLow),
            other => Err(format!("unknown emotion cue '{other}'")),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct EmotionConfig {
    pub thresholds: Thresholds,
    /// First breached cue wins.
    pub priority: Vec<StatCue>,
    pub surprise_prob_play: f64,
    pub wake_angry: bool,
}

impl Default for EmotionConfig {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
            priority: StatCue::DEFAULT_PRIORITY.to_vec(),
            surprise_prob_play: 0.25,
            wake_angry: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChatConfig {
    pub enabled: bool,
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
    pub max_history: usize,
    pub gains: SentimentGains,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(20),
            max_history: 6,
            gains: SentimentGains::default(),
        }
    }
}

impl ChatConfig {
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

/// Process-wide settings, built once at startup and passed down by reference.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub emotion: EmotionConfig,
    pub chat: ChatConfig,
    pub fps: u32,
    pub save_path: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Lookup(lookup);

        let d = Thresholds::default();
        let thresholds = Thresholds {
            energy_low: env.unit("ENERGY_LOW", d.energy_low),
            hunger_high: env.unit("HUNGER_HIGH", d.hunger_high),
            fun_low: env.unit("FUN_LOW", d.fun_low),
            hygiene_low: env.unit("HYGIENE_LOW", d.hygiene_low),
        };

        let emotion_defaults = EmotionConfig::default();
        let emotion = EmotionConfig {
            thresholds,
            priority: env
                .get("EMOTION_PRIORITY")
                .map(|raw| parse_priority(&raw))
                .unwrap_or(emotion_defaults.priority),
            surprise_prob_play: env.unit("SURPRISE_PROB_PLAY", emotion_defaults.surprise_prob_play),
            wake_angry: env.flag("WAKE_ANGRY", emotion_defaults.wake_angry),
        };

        let cd = ChatConfig::default();
        let g = cd.gains;
        let chat = ChatConfig {
            enabled: env.flag("ENABLE_CHAT", cd.enabled),
            api_key: env
                .get("OPENAI_API_KEY")
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty()),
            base_url: env
                .get("OPENAI_BASE_URL")
                .map(|u| u.trim().to_string())
                .filter(|u| !u.is_empty())
                .unwrap_or(cd.base_url),
            model: env
                .get("OPENAI_MODEL")
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty())
                .unwrap_or(cd.model),
            timeout: Duration::from_secs(
                env.number("OPENAI_TIMEOUT_SECS", cd.timeout.as_secs()).max(1),
            ),
            max_history: env.number("CHAT_MAX_HISTORY", cd.max_history).max(1),
            gains: SentimentGains {
                fun_gain: env.number("CHAT_SENTIMENT_FUN_GAIN", g.fun_gain),
                fun_loss: env.number("CHAT_SENTIMENT_FUN_LOSS", g.fun_loss),
                energy_gain: env.number("CHAT_SENTIMENT_ENERGY_GAIN", g.energy_gain),
                energy_loss: env.number("CHAT_SENTIMENT_ENERGY_LOSS", g.energy_loss),
                hygiene_gain: env.number("CHAT_SENTIMENT_HYGIENE_GAIN", g.hygiene_gain),
                hygiene_loss: env.number("CHAT_SENTIMENT_HYGIENE_LOSS", g.hygiene_loss),
            },
        };

        let fps = env.number("PIXELGOTCHI_FPS", DEFAULT_FPS).clamp(10, 120);

        let save_path = match env.get("PIXELGOTCHI_SAVE").filter(|p| !p.trim().is_empty()) {
            Some(p) => PathBuf::from(p.trim()),
            None => default_save_path()?,
        };

        Ok(Self {
            emotion,
            chat,
            fps,
            save_path,
        })
    }
}

struct Lookup<F>(F);

impl<F> Lookup<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key)
    }

    fn number<T>(&self, key: &str, default: T) -> T
    where
        T: FromStr + Copy,
    {
        match self.get(key) {
            None => default,
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                warn!(key, value = %raw, "ignoring unparseable setting");
                default
            }),
        }
    }

    fn unit(&self, key: &str, default: f64) -> f64 {
        let v: f64 = self.number(key, default);
        if v.is_finite() {
            v.clamp(0.0, 1.0)
        } else {
            default
        }
    }

    fn flag(&self, key: &str, default: bool) -> bool {
        self.get(key)
            .map(|raw| {
                matches!(
                    raw.trim().to_ascii_lowercase().as_str(),
                    "1" | "true" | "yes" | "on"
                )
            })
            .unwrap_or(default)
    }
}

fn parse_priority(raw: &str) -> Vec<StatCue> {
    let mut out = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.parse::<StatCue>() {
            Ok(cue) if !out.contains(&cue) => out.push(cue),
            Ok(_) => {}
            Err(err) => warn!("EMOTION_PRIORITY: {err}"),
        }
    }
    if out.is_empty() {
        return StatCue::DEFAULT_PRIORITY.to_vec();
    }
    out
}

pub fn default_save_path() -> Result<PathBuf> {
    let dirs = BaseDirs::new().context("could not resolve home directory")?;
    Ok(dirs.home_dir().join(SAVE_FILE_NAME))
}

/// Directory for the log file; created on demand.
pub fn log_dir() -> Result<PathBuf> {
    let proj = ProjectDirs::from("com", "pixelgotchi", "Pixelgotchi")
        .context("could not resolve project directories")?;
    let dir = proj.data_local_dir().to_path_buf();
    fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let mut map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        map.entry("PIXELGOTCHI_SAVE".to_string())
            .or_insert_with(|| "/tmp/pixelgotchi-test.json".to_string());
        Config::from_lookup(|k| map.get(k).cloned()).expect("config")
    }

    #[test]
    fn defaults_when_environment_is_empty() {
        let cfg = config_from(&[]);
        assert_eq!(cfg.emotion, EmotionConfig::default());
        assert_eq!(cfg.chat.model, DEFAULT_MODEL);
        assert_eq!(cfg.chat.api_key, None);
        assert_eq!(cfg.chat.max_history, 6);
        assert_eq!(cfg.chat.gains, SentimentGains::default());
        assert_eq!(cfg.fps, DEFAULT_FPS);
        assert_eq!(cfg.save_path, PathBuf::from("/tmp/pixelgotchi-test.json"));
    }

    #[test]
    fn overrides_are_parsed() {
        let cfg = config_from(&[
            ("ENERGY_LOW", "0.3"),
            ("HUNGER_HIGH", "7"),
            ("EMOTION_PRIORITY", "hygiene_low, fun_low,bogus,fun_low"),
            ("WAKE_ANGRY", "off"),
            ("ENABLE_CHAT", "No"),
            ("OPENAI_API_KEY", "  sk-test  "),
            ("OPENAI_BASE_URL", "http://localhost:8000/v1/"),
            ("CHAT_SENTIMENT_FUN_GAIN", "0.5"),
            ("PIXELGOTCHI_FPS", "1000"),
        ]);
        assert_eq!(cfg.emotion.thresholds.energy_low, 0.3);
        assert_eq!(cfg.emotion.thresholds.hunger_high, 1.0);
        assert_eq!(
            cfg.emotion.priority,
            vec![StatCue::HygieneLow, StatCue::FunLow]
        );
        assert!(!cfg.emotion.wake_angry);
        assert!(!cfg.chat.enabled);
        assert_eq!(cfg.chat.api_key.as_deref(), Some("sk-test"));
        assert_eq!(
            cfg.chat.completions_url(),
            "http://localhost:8000/v1/chat/completions"
        );
        assert_eq!(cfg.chat.gains.fun_gain, 0.5);
        assert_eq!(cfg.fps, 120);
    }

    #[test]
    fn garbage_values_fall_back() {
        let cfg = config_from(&[
            ("FUN_LOW", "lots"),
            ("CHAT_MAX_HISTORY", "-2"),
            ("EMOTION_PRIORITY", "nope,,"),
            ("OPENAI_API_KEY", "   "),
        ]);
        assert_eq!(cfg.emotion.thresholds.fun_low, 0.20);
        assert_eq!(cfg.chat.max_history, 6);
        assert_eq!(cfg.emotion.priority, StatCue::DEFAULT_PRIORITY.to_vec());
        assert_eq!(cfg.chat.api_key, None);
    }
}
