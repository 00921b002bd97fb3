use blaseball_api::client::DEFAULT_API_ROOT;
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorScheme {
    Light,
    #[default]
    Dark,
}

impl ColorScheme {
    pub fn toggled(self) -> Self {
        match self {
            ColorScheme::Light => ColorScheme::Dark,
            ColorScheme::Dark => ColorScheme::Light,
        }
    }
}

/// The one persisted user preference.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredPreferences {
    color_scheme: Option<ColorScheme>,
}

#[derive(Debug, Clone)]
pub struct AppSettings {
    pub api_root: String,
    pub color_scheme: ColorScheme,
    pub full_screen: bool,
    pub log_level: Option<LevelFilter>,
    preferences_path: PathBuf,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            api_root: DEFAULT_API_ROOT.to_string(),
            color_scheme: ColorScheme::default(),
            full_screen: false,
            log_level: None,
            preferences_path: preferences_path(),
        }
    }
}

impl AppSettings {
    pub fn load() -> Self {
        let preferences_path = preferences_path();
        let color_scheme = load_color_scheme(&preferences_path)
            .or_else(|| std::env::var("COLORFGBG").ok().and_then(|v| color_scheme_hint(&v)))
            .unwrap_or_default();

        Self {
            api_root: std::env::var("BOXSCORE_API_ROOT")
                .ok()
                .filter(|root| !root.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_API_ROOT.to_string()),
            color_scheme,
            full_screen: false,
            log_level: std::env::var("BOXSCORE_LOG")
                .ok()
                .and_then(|level| level.trim().parse().ok()),
            preferences_path,
        }
    }

    /// Flip light/dark and persist the choice.
    pub fn toggle_color_scheme(&mut self) -> Result<(), String> {
        self.color_scheme = self.color_scheme.toggled();
        store_color_scheme(&self.preferences_path, self.color_scheme)
    }
}

fn preferences_path() -> PathBuf {
    if let Ok(config_dir) = std::env::var("XDG_CONFIG_HOME")
        && !config_dir.trim().is_empty()
    {
        return PathBuf::from(config_dir).join("boxscore").join("settings.json");
    }
    if let Ok(home) = std::env::var("HOME")
        && !home.trim().is_empty()
    {
        return PathBuf::from(home)
            .join(".config")
            .join("boxscore")
            .join("settings.json");
    }
    PathBuf::from("boxscore-settings.json")
}

/// Stored flag, if the file exists and holds a valid value.
fn load_color_scheme(path: &Path) -> Option<ColorScheme> {
    let content = std::fs::read_to_string(path).ok()?;
    serde_json::from_str::<StoredPreferences>(&content)
        .ok()?
        .color_scheme
}

fn store_color_scheme(path: &Path, scheme: ColorScheme) -> Result<(), String> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| format!("create dir failed: {e}"))?;
    }
    let payload = serde_json::to_string_pretty(&StoredPreferences { color_scheme: Some(scheme) })
        .map_err(|e| format!("serialize settings failed: {e}"))?;
    std::fs::write(path, payload).map_err(|e| format!("write settings failed: {e}"))
}

/// Guess from `COLORFGBG` ("fg;bg", ANSI indexes). Backgrounds 7 and 9–15 are
/// light.
fn color_scheme_hint(colorfgbg: &str) -> Option<ColorScheme> {
    let bg: u8 = colorfgbg.rsplit(';').next()?.trim().parse().ok()?;
    Some(match bg {
        7 | 9..=15 => ColorScheme::Light,
        _ => ColorScheme::Dark,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_file(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("boxscore-test-{}", std::process::id()))
            .join(name)
    }

    #[test]
    fn toggle_persists_and_reloads() {
        let path = scratch_file("toggle.json");
        let mut settings = AppSettings {
            color_scheme: ColorScheme::Dark,
            preferences_path: path.clone(),
            ..AppSettings::default()
        };

        settings.toggle_color_scheme().unwrap();
        assert_eq!(settings.color_scheme, ColorScheme::Light);
        assert_eq!(load_color_scheme(&path), Some(ColorScheme::Light));
        assert!(std::fs::read_to_string(&path).unwrap().contains("\"colorScheme\": \"light\""));

        settings.toggle_color_scheme().unwrap();
        assert_eq!(load_color_scheme(&path), Some(ColorScheme::Dark));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn invalid_stored_value_is_ignored() {
        let path = scratch_file("invalid.json");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, r#"{"colorScheme":"sepia"}"#).unwrap();
        assert_eq!(load_color_scheme(&path), None);
        assert_eq!(load_color_scheme(&scratch_file("missing.json")), None);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn colorfgbg_hint() {
        assert_eq!(color_scheme_hint("15;0"), Some(ColorScheme::Dark));
        assert_eq!(color_scheme_hint("0;15"), Some(ColorScheme::Light));
        assert_eq!(color_scheme_hint("0;default;7"), Some(ColorScheme::Light));
        assert_eq!(color_scheme_hint("garbage"), None);
    }
}
