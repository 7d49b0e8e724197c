use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub shell: ShellConfig,
    pub backend: BackendConfig,
    /// Chat module definitions; empty means the built-in demo pair.
    pub modules: Vec<ModuleConfig>,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ShellConfig {
    /// Header line shown above the modules.
    pub title: String,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            title: "EDGE demo showcase".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct BackendConfig {
    /// Agent endpoint queries are submitted to.
    pub server_url: String,
    /// Path of the configuration endpoint, joined onto `server_url`.
    pub config_path: String,
    /// Overall request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:10002".to_string(),
            config_path: "/config".to_string(),
            request_timeout_secs: 120,
        }
    }
}

impl BackendConfig {
    /// Resolve the configuration endpoint URL.
    pub fn config_url(&self) -> String {
        format!(
            "{}{}",
            self.server_url.trim_end_matches('/'),
            self.config_path
        )
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModuleConfig {
    pub title: String,
    pub subtitle: Option<String>,
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            title: "Chat module".to_string(),
            subtitle: None,
        }
    }
}

impl Config {
    pub fn load_or_default() -> Self {
        let path = config_path();
        match std::fs::read_to_string(&path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                eprintln!("warning: failed to parse {}: {e}", path.display());
                Config::default()
            }),
            Err(_) => Config::default(),
        }
    }

    /// The chat modules to build, falling back to the demo pair.
    pub fn chat_modules(&self) -> Vec<ModuleConfig> {
        if self.modules.is_empty() {
            vec![
                ModuleConfig {
                    title: "Chat app container".to_string(),
                    subtitle: Some("App using LLM to chat".to_string()),
                },
                ModuleConfig {
                    title: "Sample application for A2UI".to_string(),
                    subtitle: None,
                },
            ]
        } else {
            self.modules.clone()
        }
    }
}

fn config_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("edgeshell").join("config.toml")
}
