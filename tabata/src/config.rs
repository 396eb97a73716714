use anyhow::{Context, Result};
use directories::ProjectDirs;
use ratatui::style::Color;
use serde::Deserialize;
use std::fs;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    pub dark: Theme,
    pub light: Theme,
    pub icons: Icons,
    pub defaults: Defaults,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Theme {
    #[serde(deserialize_with = "hex_to_color")]
    pub background: Color,
    #[serde(deserialize_with = "hex_to_color")]
    pub foreground: Color,
    #[serde(deserialize_with = "hex_to_color")]
    pub selection: Color,
    #[serde(deserialize_with = "hex_to_color")]
    pub surface: Color,
    #[serde(deserialize_with = "hex_to_color")]
    pub red: Color,
    #[serde(deserialize_with = "hex_to_color")]
    pub green: Color,
    #[serde(deserialize_with = "hex_to_color")]
    pub yellow: Color,
    #[serde(deserialize_with = "hex_to_color")]
    pub blue: Color,
    #[serde(deserialize_with = "hex_to_color")]
    pub magenta: Color,
    #[serde(deserialize_with = "hex_to_color")]
    pub cyan: Color,
    #[serde(deserialize_with = "hex_to_color")]
    pub gray: Color,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Icons {
    pub action: String,
    pub rest: String,
    pub cycles: String,
    pub play: String,
    pub pause: String,
    pub stop: String,
    pub select: String,
    pub checkbox_on: String,
    pub checkbox_off: String,
    pub progress_filled: String,
    pub progress_empty: String,
    pub input_cursor: String,
    pub separator: String,
    pub header_left: String,
    pub header_right: String,
}

/// Initial values for the setup form.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Defaults {
    pub action_secs: u32,
    pub rest_secs: u32,
    pub total_secs: u32,
    pub cue: String,
    pub keep_awake: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dark: Theme::default(),
            light: Theme::light(),
            icons: Icons::default(),
            defaults: Defaults::default(),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            background: Color::Rgb(9, 14, 19),
            foreground: Color::Rgb(197, 201, 199),
            selection: Color::Rgb(230, 195, 132),
            surface: Color::Rgb(13, 12, 12),
            red: Color::Rgb(228, 104, 118),
            green: Color::Rgb(138, 154, 123),
            yellow: Color::Rgb(196, 178, 138),
            blue: Color::Rgb(127, 180, 202),
            magenta: Color::Rgb(162, 146, 163),
            cyan: Color::Rgb(122, 168, 159),
            gray: Color::Rgb(164, 167, 164),
        }
    }
}

impl Theme {
    fn light() -> Self {
        Self {
            background: Color::Rgb(246, 244, 239),
            foreground: Color::Rgb(54, 58, 62),
            selection: Color::Rgb(176, 134, 60),
            surface: Color::Rgb(230, 227, 220),
            red: Color::Rgb(186, 52, 68),
            green: Color::Rgb(94, 116, 76),
            yellow: Color::Rgb(158, 134, 82),
            blue: Color::Rgb(52, 114, 146),
            magenta: Color::Rgb(122, 98, 126),
            cyan: Color::Rgb(62, 120, 110),
            gray: Color::Rgb(110, 114, 112),
        }
    }
}

impl Default for Icons {
    fn default() -> Self {
        Self {
            action: "▲".to_string(),
            rest: "▽".to_string(),
            cycles: "↻".to_string(),
            play: "▶".to_string(),
            pause: "⏸".to_string(),
            stop: "■".to_string(),
            select: "▸".to_string(),
            checkbox_on: "☑".to_string(),
            checkbox_off: "☐".to_string(),
            progress_filled: "█".to_string(),
            progress_empty: "░".to_string(),
            input_cursor: "▊".to_string(),
            separator: "│".to_string(),
            header_left: "⟪ ".to_string(),
            header_right: " ⟫".to_string(),
        }
    }
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            action_secs: 30,
            rest_secs: 15,
            total_secs: 300,
            cue: "beep".to_string(),
            keep_awake: true,
        }
    }
}

fn hex_to_color<'de, D>(deserializer: D) -> Result<Color, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = serde::Deserialize::deserialize(deserializer)?;
    if !s.starts_with('#') || s.len() != 7 {
        return Err(serde::de::Error::custom("invalid hex color format"));
    }
    let r = u8::from_str_radix(&s[1..3], 16).map_err(serde::de::Error::custom)?;
    let g = u8::from_str_radix(&s[3..5], 16).map_err(serde::de::Error::custom)?;
    let b = u8::from_str_radix(&s[5..7], 16).map_err(serde::de::Error::custom)?;
    Ok(Color::Rgb(r, g, b))
}

pub fn load_config() -> Result<Config> {
    match ProjectDirs::from("com", "tabata", "Tabata") {
        Some(proj_dirs) => {
            let path = proj_dirs.config_dir().join("tabata.toml");
            if path.exists() {
                let config_str = fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read config file at {:?}", path))?;
                toml::from_str(&config_str)
                    .with_context(|| format!("Failed to parse config file at {:?}", path))
            } else {
                Ok(Config::default())
            }
        }
        None => Ok(Config::default()),
    }
}
