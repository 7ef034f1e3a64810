use log::{info, warn};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::sync::Mutex;

use crate::game::judgment::{JUDGE_ADJUST_S, JUDGE_CRITICAL_S, JUDGE_EDGE_S, JUDGE_NEAR_S};
use crate::game::play_status::GAUGE_DEFAULT_MAX;

const CONFIG_PATH: &str = "urchin.ini";

/// `[Section]` / `key=value` document. Lines starting with `;` or `#` are
/// comments; keys before the first header land in the unnamed section and a
/// repeated key keeps its last value.
#[derive(Debug, Default)]
pub struct IniDocument {
    sections: HashMap<String, HashMap<String, String>>,
}

impl IniDocument {
    pub fn read(path: &Path) -> std::io::Result<Self> {
        Ok(Self::parse(&std::fs::read_to_string(path)?))
    }

    pub fn parse(content: &str) -> Self {
        let mut doc = Self::default();
        let mut section = String::new();
        for line in content.lines().map(str::trim) {
            if line.is_empty() || line.starts_with([';', '#']) {
                continue;
            }
            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                section = name.trim().to_string();
                doc.sections.entry(section.clone()).or_default();
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim();
            if key.is_empty() {
                continue;
            }
            doc.sections
                .entry(section.clone())
                .or_default()
                .insert(key.to_string(), value.trim().to_string());
        }
        doc
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(section)
            .and_then(|keys| keys.get(key))
            .map(String::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    const fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "Off",
            Self::Error => "Error",
            Self::Warn => "Warn",
            Self::Info => "Info",
            Self::Debug => "Debug",
            Self::Trace => "Trace",
        }
    }

    pub const fn as_level_filter(&self) -> log::LevelFilter {
        match self {
            Self::Off => log::LevelFilter::Off,
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

impl FromStr for LogLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" => Ok(Self::Off),
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub log_level: LogLevel,
    /// Fixed frame rate of the headless runner.
    pub frame_rate: u32,
    /// Safety stop for the headless runner. 0 = run until every scene dies.
    pub max_frames: u64,
    pub autoplay: bool,
    /// Scene script to run. Empty = run the autoplay demo session instead.
    pub scene_script: String,
    // Seconds a note is visible before it reaches the judgment line.
    pub seen_duration: f64,
    pub gauge_max: f64,
    pub judge_critical_seconds: f64,
    pub judge_near_seconds: f64,
    pub judge_edge_seconds: f64,
    pub judge_adjust_seconds: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            frame_rate: 60,
            max_frames: 60 * 60 * 10,
            autoplay: true,
            scene_script: String::new(),
            seen_duration: 1.0,
            gauge_max: GAUGE_DEFAULT_MAX,
            judge_critical_seconds: JUDGE_CRITICAL_S,
            judge_near_seconds: JUDGE_NEAR_S,
            judge_edge_seconds: JUDGE_EDGE_S,
            judge_adjust_seconds: JUDGE_ADJUST_S,
        }
    }
}

impl Config {
    /// Builds a config from parsed INI, using defaults for missing or
    /// malformed keys.
    pub fn from_ini(conf: &IniDocument) -> Self {
        let default = Self::default();
        let positive = |key: &str, fallback: f64| {
            conf.get("Options", key)
                .and_then(|v| v.parse::<f64>().ok())
                .filter(|v| v.is_finite() && *v > 0.0)
                .unwrap_or(fallback)
        };

        Self {
            log_level: conf
                .get("Options", "LogLevel")
                .and_then(|v| LogLevel::from_str(v).ok())
                .unwrap_or(default.log_level),
            frame_rate: conf
                .get("Options", "FrameRate")
                .and_then(|v| v.parse::<u32>().ok())
                .filter(|v| *v > 0)
                .unwrap_or(default.frame_rate),
            max_frames: conf
                .get("Options", "MaxFrames")
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(default.max_frames),
            autoplay: conf
                .get("Options", "AutoPlay")
                .and_then(|v| v.parse::<u8>().ok())
                .map_or(default.autoplay, |v| v != 0),
            scene_script: conf
                .get("Options", "SceneScript")
                .map_or(default.scene_script, str::to_string),
            seen_duration: positive("SeenDuration", default.seen_duration),
            gauge_max: positive("GaugeMax", default.gauge_max),
            judge_critical_seconds: positive(
                "JudgeCriticalSeconds",
                default.judge_critical_seconds,
            ),
            judge_near_seconds: positive("JudgeNearSeconds", default.judge_near_seconds),
            judge_edge_seconds: positive("JudgeEdgeSeconds", default.judge_edge_seconds),
            // The adjust may legitimately be zero or negative.
            judge_adjust_seconds: conf
                .get("Options", "JudgeAdjustSeconds")
                .and_then(|v| v.parse::<f64>().ok())
                .filter(|v| v.is_finite())
                .unwrap_or(default.judge_adjust_seconds),
        }
    }

    pub fn frame_delta(&self) -> f64 {
        1.0 / f64::from(self.frame_rate.max(1))
    }
}

// Global, mutable configuration instance.
static CONFIG: std::sync::LazyLock<Mutex<Config>> =
    std::sync::LazyLock::new(|| Mutex::new(Config::default()));

fn create_default_config_file() -> Result<(), std::io::Error> {
    info!("'{CONFIG_PATH}' not found, creating with default values.");
    let default = Config::default();

    let mut content = String::new();
    content.push_str("[Options]\n");
    content.push_str(&format!(
        "AutoPlay={}\n",
        if default.autoplay { "1" } else { "0" }
    ));
    content.push_str(&format!("FrameRate={}\n", default.frame_rate));
    content.push_str(&format!("GaugeMax={}\n", default.gauge_max));
    content.push_str(&format!(
        "JudgeAdjustSeconds={}\n",
        default.judge_adjust_seconds
    ));
    content.push_str(&format!(
        "JudgeCriticalSeconds={}\n",
        default.judge_critical_seconds
    ));
    content.push_str(&format!("JudgeEdgeSeconds={}\n", default.judge_edge_seconds));
    content.push_str(&format!("JudgeNearSeconds={}\n", default.judge_near_seconds));
    content.push_str(&format!("LogLevel={}\n", default.log_level.as_str()));
    content.push_str(&format!("MaxFrames={}\n", default.max_frames));
    content.push_str(&format!("SceneScript={}\n", default.scene_script));
    content.push_str(&format!("SeenDuration={}\n", default.seen_duration));
    content.push('\n');

    std::fs::write(CONFIG_PATH, content)
}

pub fn load() {
    if !Path::new(CONFIG_PATH).exists()
        && let Err(e) = create_default_config_file()
    {
        warn!("Failed to create default config file: {e}");
    }

    match IniDocument::read(Path::new(CONFIG_PATH)) {
        Ok(conf) => {
            let cfg = Config::from_ini(&conf);
            info!("Configuration loaded from '{CONFIG_PATH}'.");
            *lock() = cfg;
        }
        Err(e) => {
            warn!("Failed to load '{CONFIG_PATH}': {e}. Using default values.");
        }
    }
}

fn lock() -> std::sync::MutexGuard<'static, Config> {
    // A panic while holding the lock leaves plain data behind; keep using it.
    CONFIG.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

pub fn get() -> Config {
    lock().clone()
}

#[cfg(test)]
mod tests {
    use super::{Config, IniDocument, LogLevel};

    fn parse(content: &str) -> Config {
        Config::from_ini(&IniDocument::parse(content))
    }

    #[test]
    fn empty_file_yields_defaults() {
        assert_eq!(parse(""), Config::default());
    }

    #[test]
    fn reads_known_keys() {
        let cfg = parse(
            "; comment\n[Options]\nAutoPlay=0\nFrameRate=120\nLogLevel=debug\n\
             JudgeAdjustSeconds=-0.005\nSceneScript = scenes/demo.lua \nSeenDuration=0.8\n",
        );
        assert!(!cfg.autoplay);
        assert_eq!(cfg.frame_rate, 120);
        assert_eq!(cfg.log_level, LogLevel::Debug);
        assert!((cfg.judge_adjust_seconds + 0.005).abs() <= 1e-12);
        assert_eq!(cfg.scene_script, "scenes/demo.lua");
        assert!((cfg.seen_duration - 0.8).abs() <= 1e-12);
    }

    #[test]
    fn malformed_values_fall_back() {
        let cfg = parse(
            "[Options]\nFrameRate=0\nGaugeMax=-5\nJudgeEdgeSeconds=wide\nLogLevel=loud\n",
        );
        let default = Config::default();
        assert_eq!(cfg.frame_rate, default.frame_rate);
        assert!((cfg.gauge_max - default.gauge_max).abs() <= f64::EPSILON);
        assert!((cfg.judge_edge_seconds - default.judge_edge_seconds).abs() <= f64::EPSILON);
        assert_eq!(cfg.log_level, default.log_level);
    }

    #[test]
    fn keys_outside_options_are_ignored() {
        let cfg = parse("FrameRate=30\n[Other]\nFrameRate=15\n");
        assert_eq!(cfg.frame_rate, Config::default().frame_rate);
    }

    #[test]
    fn document_keeps_sections_apart_and_last_value_wins() {
        let doc = IniDocument::parse("a=1\n# note\n[S]\na = 2\na=3\n=orphan\n[Empty]\n");
        assert_eq!(doc.get("", "a"), Some("1"));
        assert_eq!(doc.get("S", "a"), Some("3"));
        assert_eq!(doc.get("Empty", "a"), None);
        assert_eq!(doc.get("Missing", "a"), None);
    }
}
