use anyhow::{Result, anyhow};
use directories::UserDirs;
use log::info;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};
use thiserror::Error;

use crate::gestures::ClassifierConfig;
use crate::hypothesis::{DoubleTouchLongPress, SingleTouchLongPress};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Meta {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Thresholds {
    pub move_threshold: f64,
    pub scroll_sensitivity: f64,
    pub zoom_sensitivity: f64,
    pub timeout_ms: u64,
    #[serde(default = "default_invert_scroll")]
    pub invert_scroll: bool,
}

fn default_invert_scroll() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LongPress {
    #[serde(default = "default_single_touch")]
    pub single_touch: SingleTouchLongPress,
    #[serde(default = "default_double_touch")]
    pub double_touch: DoubleTouchLongPress,
}

fn default_single_touch() -> SingleTouchLongPress {
    SingleTouchLongPress::ThirdButton
}

fn default_double_touch() -> DoubleTouchLongPress {
    DoubleTouchLongPress::ClickOnRelease
}

impl Default for LongPress {
    fn default() -> Self {
        Self {
            single_touch: default_single_touch(),
            double_touch: default_double_touch(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Profile {
    pub meta: Meta,
    pub thresholds: Thresholds,
    #[serde(default)]
    pub long_press: LongPress,
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("thresholds.{0} must be a finite number > 0 (got {1})")]
    BadThreshold(&'static str, f64),
    #[error("thresholds.timeout_ms must be positive")]
    ZeroTimeout,
}

impl Profile {
    pub fn from_toml_str(txt: &str) -> Result<Self> {
        let profile: Profile = toml::from_str(txt)?;
        profile.validate()?;
        Ok(profile)
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        let t = &self.thresholds;
        for (name, v) in [
            ("move_threshold", t.move_threshold),
            ("scroll_sensitivity", t.scroll_sensitivity),
            ("zoom_sensitivity", t.zoom_sensitivity),
        ] {
            if !v.is_finite() || v <= 0.0 {
                return Err(ConfigError::BadThreshold(name, v));
            }
        }
        if t.timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }

    pub fn classifier_config(&self) -> ClassifierConfig {
        let t = &self.thresholds;
        ClassifierConfig {
            move_threshold: t.move_threshold,
            scroll_sensitivity: t.scroll_sensitivity,
            zoom_sensitivity: t.zoom_sensitivity,
            timeout: Duration::from_millis(t.timeout_ms),
            invert_scroll: t.invert_scroll,
            single_touch_long_press: self.long_press.single_touch,
            double_touch_long_press: self.long_press.double_touch,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfigState {
    pub active_name: String,
    pub profile: Profile,
    pub profiles_dir: PathBuf,
    pub active_ptr: PathBuf,
}

fn config_dir() -> Result<PathBuf> {
    let dirs = UserDirs::new().ok_or_else(|| anyhow!("cannot determine home directory"))?;
    Ok(dirs.home_dir().join(".config").join("gesturectl"))
}

fn default_profile_text() -> &'static str {
    include_str!("../profiles/default.toml")
}

impl ConfigState {
    pub fn load_or_install_default() -> Result<Self> {
        Self::load_from(&config_dir()?)
    }

    /// Same as [`Self::load_or_install_default`] rooted at `cfgdir`.
    pub fn load_from(cfgdir: &Path) -> Result<Self> {
        let profdir = cfgdir.join("profiles");
        fs::create_dir_all(&profdir)?;

        let def_path = profdir.join("default.toml");
        if !def_path.exists() {
            fs::write(&def_path, default_profile_text())?;
            info!("installed default profile at {}", def_path.display());
        }

        let active_ptr = cfgdir.join("active");
        if !active_ptr.exists() {
            fs::write(&active_ptr, b"default")?;
        }

        let active_name = fs::read_to_string(&active_ptr)?.trim().to_string();
        let profile = load_profile(&profdir, &active_name)?;

        Ok(Self {
            active_name,
            profile,
            profiles_dir: profdir,
            active_ptr,
        })
    }

    /// Load a profile by name without changing the active pointer.
    pub fn profile_named(&self, name: &str) -> Result<Profile> {
        load_profile(&self.profiles_dir, name)
    }

    pub fn set_active(&mut self, name: &str) -> Result<()> {
        let profile = load_profile(&self.profiles_dir, name)?;
        fs::write(&self.active_ptr, name.as_bytes())?;
        self.active_name = name.to_string();
        self.profile = profile;
        Ok(())
    }

    pub fn list_profiles(&self) -> Vec<String> {
        let mut v = Vec::new();
        if let Ok(rd) = fs::read_dir(&self.profiles_dir) {
            for e in rd.flatten() {
                let path = e.path();
                if path.extension().is_some_and(|ext| ext == "toml") {
                    if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                        v.push(stem.to_string());
                    }
                }
            }
        }
        v.sort();
        v
    }

    pub fn doctor_report(&self) -> serde_json::Value {
        let devices: Vec<String> = crate::input::discover_multitouch()
            .into_iter()
            .map(|d| format!("{} ({})", d.name, d.path))
            .collect();
        serde_json::json!({
            "input_group_member": check_in_input_group(),
            "profiles_dir": self.profiles_dir,
            "active_profile": self.active_name,
            "devices": devices,
            "hints": {
                "add_user_to_input_group": "sudo usermod -aG input $USER && newgrp input"
            }
        })
    }
}

fn load_profile(profdir: &Path, name: &str) -> Result<Profile> {
    let path = profdir.join(format!("{name}.toml"));
    let txt = fs::read_to_string(&path)
        .map_err(|e| anyhow!("failed to read {}: {e}", path.display()))?;
    Profile::from_toml_str(&txt).map_err(|e| anyhow!("failed to load {}: {e}", path.display()))
}

fn check_in_input_group() -> bool {
    let Ok(s) = fs::read_to_string("/etc/group") else {
        return false;
    };
    let user = whoami::username();
    s.lines()
        .filter(|line| line.starts_with("input:"))
        .any(|line| line.split(':').nth(3).unwrap_or("").split(',').any(|u| u == user))
}
