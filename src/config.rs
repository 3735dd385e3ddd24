use crate::error::PicbakError;
use crate::filter::{ExtensionFilter, DEFAULT_EXTENSIONS};
use crate::Result;
use configparser::ini::Ini;
use std::path::{Path, PathBuf};

const SECTION: &str = "picbak";

#[derive(Debug, Clone)]
pub struct Config {
    pub destination: Option<PathBuf>,
    pub sources: Vec<PathBuf>,
    pub case_insensitive_extensions: bool,
    pub extra_extensions: Vec<String>,
    pub progress_bar: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            destination: None,
            sources: Vec::new(),
            case_insensitive_extensions: false,
            extra_extensions: Vec::new(),
            progress_bar: true,
        }
    }
}

impl Config {
    pub fn extension_filter(&self) -> ExtensionFilter {
        ExtensionFilter::new(&self.extra_extensions, self.case_insensitive_extensions)
    }

    /// Destination and sources baked into the config file, if both are set.
    pub fn static_paths(&self) -> Option<(PathBuf, Vec<PathBuf>)> {
        match &self.destination {
            Some(destination) if !self.sources.is_empty() => {
                Some((destination.clone(), self.sources.clone()))
            }
            _ => None,
        }
    }
}

/// Get default configuration
pub fn default_config() -> Config {
    Config::default()
}

/// Load configuration from the platform config file, falling back to defaults
pub fn load_config() -> Result<Config> {
    let config_path = get_config_path()?;

    if !config_path.exists() {
        return Ok(default_config());
    }

    load_config_from(&config_path)
}

/// Load configuration from an explicit file. The file must exist.
pub fn load_config_from(path: &Path) -> Result<Config> {
    let mut conf = Ini::new();
    conf.load(path).map_err(|e| {
        PicbakError::config(format!(
            "Failed to parse config file {}: {e}",
            path.display()
        ))
    })?;

    parse_config(&conf)
}

fn parse_config(conf: &Ini) -> Result<Config> {
    let mut config = default_config();

    if let Some(value) = non_empty(conf.get(SECTION, "destination")) {
        config.destination = Some(PathBuf::from(value));
    }
    if let Some(value) = non_empty(conf.get(SECTION, "sources")) {
        config.sources = std::env::split_paths(&value)
            .filter(|p| !p.as_os_str().is_empty())
            .collect();
    }
    if let Some(value) = non_empty(conf.get(SECTION, "extra_extensions")) {
        config.extra_extensions = value
            .split(',')
            .map(|ext| ext.trim().to_string())
            .filter(|ext| !ext.is_empty())
            .collect();
    }

    // Load boolean values
    if let Some(value) = conf.get(SECTION, "case_insensitive_extensions") {
        config.case_insensitive_extensions =
            parse_bool(&value).unwrap_or(config.case_insensitive_extensions);
    }
    if let Some(value) = conf.get(SECTION, "progress_bar") {
        config.progress_bar = parse_bool(&value).unwrap_or(config.progress_bar);
    }

    if config.destination.is_some() && config.sources.is_empty() {
        return Err(PicbakError::config(
            "destination is set but sources is empty",
        ));
    }

    Ok(config)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Get the configuration file path for the current platform
pub fn get_config_path() -> Result<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return Ok(PathBuf::from(appdata).join("picbak").join("config.ini"));
        }
    }

    if let Some(config_dir) = std::env::var_os("XDG_CONFIG_HOME") {
        Ok(PathBuf::from(config_dir).join("picbak").join("config.ini"))
    } else if let Some(home) = std::env::var_os("HOME") {
        Ok(PathBuf::from(home)
            .join(".config")
            .join("picbak")
            .join("config.ini"))
    } else {
        Err(PicbakError::config("Could not determine config directory"))
    }
}

/// Parse a boolean value from INI string
fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Some(true),
        "false" | "no" | "0" | "off" => Some(false),
        _ => None,
    }
}

/// Create a sample configuration file
pub fn create_sample_config() -> String {
    r#"[picbak]
# Directory that receives the mirrored copies
destination = /mnt/backup

# Source roots, separated like PATH (':' on Unix, ';' on Windows)
sources = /home/me/Pictures:/home/me/Videos

# Match extensions regardless of case, so IMG_0001.JPG is picked up (true/false)
case_insensitive_extensions = false

# Extra extensions to back up, comma separated
extra_extensions = heic, webp

# Draw a progress bar on interactive terminals (true/false)
progress_bar = true
"#
    .to_string()
}

/// Display the current configuration in a user-friendly format
pub fn dump_config(config: &Config, config_path: &Path) -> Result<()> {
    println!("picbak Configuration");
    println!("====================");
    println!();

    if config_path.exists() {
        println!("Config file: {} (found)", config_path.display());
    } else {
        println!(
            "Config file: {} (not found, using defaults)",
            config_path.display()
        );
    }
    println!();

    let sources = if config.sources.is_empty() {
        "(none)".to_string()
    } else {
        std::env::join_paths(&config.sources)
            .map(|joined| joined.to_string_lossy().into_owned())
            .map_err(|e| PicbakError::config(format!("Invalid source path: {e}")))?
    };

    println!("Current Settings:");
    println!("----------------");
    println!(
        "destination                 = {}",
        config
            .destination
            .as_ref()
            .map(|d| d.display().to_string())
            .unwrap_or_else(|| "(none)".to_string())
    );
    println!("sources                     = {sources}");
    println!(
        "case_insensitive_extensions = {}",
        config.case_insensitive_extensions
    );
    println!(
        "extra_extensions            = {}",
        config.extra_extensions.join(", ")
    );
    println!("progress_bar                = {}", config.progress_bar);
    println!();

    println!("Backed up extensions:");
    println!("--------------------");
    println!("{}", DEFAULT_EXTENSIONS.join(" "));
    if !config.extra_extensions.is_empty() {
        println!("{}", config.extra_extensions.join(" "));
    }
    println!();

    if !config_path.exists() {
        println!("Sample configuration file:");
        println!("-------------------------");
        print!("{}", create_sample_config());
    }

    Ok(())
}
