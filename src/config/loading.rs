//! Configuration file location and load/save.
//!
//! The file lives at `$XDG_CONFIG_HOME/ddcbright/ddcbright.toml` unless a
//! custom directory was set with `--config-dir`. A missing file is
//! created with a commented default; an unreadable or unparsable file
//! degrades to the defaults with a warning, never an error, so a corrupt
//! config can't keep brightness control from starting.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};

use super::{Config, ConfigFile};

static CUSTOM_CONFIG_DIR: Mutex<Option<PathBuf>> = Mutex::new(None);

const DEFAULT_CONFIG: &str = "\
# ddcbright configuration
#
# hysteresis: lux dead zone for sensor mode (0-100)
hysteresis = 5.0

start_minimized = false
show_brightness_in_tray = false

# Per-monitor control, keyed by i2c device path:
# [monitors.\"/dev/i2c-4\"]
# mode = \"schedule\"    # \"disabled\" | \"schedule\" | \"sensor\" | \"follow\"
# offset = 0            # follow-mode offset, -20..=20

# Time-of-day schedule, \"HH:MM\" = brightness:
# [schedule]
# \"09:00\" = 70
# \"19:00\" = 50

# Lux calibration curve for sensor mode (needs at least 2 points;
# omitted = built-in default curve):
# [[curve]]
# lux = 0.0
# brightness = 20
";

/// Override the configuration directory (from `--config-dir`).
pub fn set_config_dir(dir: impl Into<PathBuf>) {
    *CUSTOM_CONFIG_DIR.lock().unwrap() = Some(dir.into());
}

/// Resolve the configuration file path.
pub fn config_path() -> Result<PathBuf> {
    if let Some(dir) = CUSTOM_CONFIG_DIR.lock().unwrap().clone() {
        return Ok(dir.join("ddcbright.toml"));
    }
    let base = dirs::config_dir().context("could not determine config directory")?;
    Ok(base.join("ddcbright").join("ddcbright.toml"))
}

/// Load the configuration, creating a commented default file if missing.
pub fn load() -> Result<Config> {
    let path = config_path()?;
    if !path.exists() {
        #[cfg(feature = "testing-support")]
        anyhow::bail!(
            "TEST_MODE: refusing to create {} while testing-support is active",
            path.display()
        );
        #[cfg(not(feature = "testing-support"))]
        {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            std::fs::write(&path, DEFAULT_CONFIG)
                .with_context(|| format!("failed to write {}", path.display()))?;
            log_block_start!("Created default configuration at {}", path.display());
        }
    }
    Ok(load_from_path(&path))
}

/// Load from an explicit path. Read or parse failures degrade to the
/// defaults with a warning; individual bad fields fall back per field.
pub fn load_from_path(path: &Path) -> Config {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            log_pipe!();
            log_warning!("Could not read {}: {e}, using defaults", path.display());
            return Config::default();
        }
    };

    let file: ConfigFile = match toml::from_str(&text) {
        Ok(file) => file,
        Err(e) => {
            log_pipe!();
            log_warning!("Could not parse {}: {e}", path.display());
            log_decorated!("Continuing with default configuration");
            return Config::default();
        }
    };

    file.sanitize()
}

/// Write the configuration back to its default location.
pub fn save(config: &Config) -> Result<()> {
    save_to_path(config, &config_path()?)
}

/// Write the configuration to an explicit path.
pub fn save_to_path(config: &Config, path: &Path) -> Result<()> {
    let file = ConfigFile::from_config(config);
    let text = toml::to_string_pretty(&file).context("failed to serialize configuration")?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))
}
