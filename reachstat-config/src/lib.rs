//! Loader for reachstat configuration with YAML + environment overlays.
//!
//! Sources, lowest precedence first:
//!
//! 1. YAML/TOML/JSON files and inline snippets, in the order they were added
//! 2. `REACHSTAT_`-prefixed variables, `__` between nesting levels
//!    (`REACHSTAT_METRIKA__COUNTER_ID`, `REACHSTAT_VK__PACING__DELAY_MS`)
//! 3. the flat variables the tools have always read: `API_TOKEN`,
//!    `COUNTER_ID`, `VK_ACCESS_TOKEN`
//!
//! Environment values are taken verbatim as strings; numeric settings accept
//! either a number or a numeric string.
//!
//! A local `.env` file can be loaded into the process environment first with
//! [`ReachConfigLoader::with_dotenv`]. `${VAR}` placeholders in string values are
//! expanded after merging.
use config::{Config, ConfigError, Environment, File};
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

const LEGACY_ENV: &[(&str, &str)] = &[
    ("API_TOKEN", "metrika.api_token"),
    ("COUNTER_ID", "metrika.counter_id"),
    ("VK_ACCESS_TOKEN", "vk.access_token"),
];

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ReachConfig {
    #[serde(default)]
    pub metrika: MetrikaSettings,
    #[serde(default)]
    pub vk: VkSettings,
    #[serde(default)]
    pub http: HttpSettings,
}

/// Raw Metrika settings. Nothing is validated here; the report tool checks
/// that a token and a numeric counter id are present before it does anything.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetrikaSettings {
    #[serde(default, deserialize_with = "lenient_string")]
    pub api_token: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub counter_id: Option<String>,
    #[serde(default = "default_metrika_base_url")]
    pub base_url: String,
}

impl Default for MetrikaSettings {
    fn default() -> Self {
        Self {
            api_token: None,
            counter_id: None,
            base_url: default_metrika_base_url(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VkSettings {
    #[serde(default, deserialize_with = "lenient_string")]
    pub access_token: Option<String>,
    #[serde(default = "default_vk_api_version", deserialize_with = "required_lenient_string")]
    pub api_version: String,
    #[serde(default = "default_vk_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub pacing: PacingSettings,
}

impl Default for VkSettings {
    fn default() -> Self {
        Self {
            access_token: None,
            api_version: default_vk_api_version(),
            base_url: default_vk_base_url(),
            pacing: PacingSettings::default(),
        }
    }
}

/// Client-side pacing between consecutive VK requests.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PacingSettings {
    /// Sleep a fixed delay between requests.
    Fixed {
        #[serde(default = "default_delay_ms", deserialize_with = "lenient_number")]
        delay_ms: u64,
    },
    /// Token bucket: `qps` steady rate, `burst` bucket capacity.
    TokenBucket {
        #[serde(deserialize_with = "lenient_number")]
        qps: f64,
        #[serde(deserialize_with = "lenient_number")]
        burst: u32,
    },
}

impl Default for PacingSettings {
    fn default() -> Self {
        PacingSettings::Fixed {
            delay_ms: default_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct HttpSettings {
    /// Per-request timeout. Unset means requests may block indefinitely.
    #[serde(default, deserialize_with = "lenient_optional_number")]
    pub timeout_secs: Option<u64>,
}

fn default_metrika_base_url() -> String {
    "https://api-metrika.yandex.net/".into()
}
fn default_vk_base_url() -> String {
    "https://api.vk.com/".into()
}
fn default_vk_api_version() -> String {
    "5.199".into()
}
fn default_delay_ms() -> u64 {
    100
}

/// Accepts strings and bare numbers, so `counter_id: 105562414` in YAML and
/// `COUNTER_ID=105562414` in the environment end up the same.
fn lenient_string<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(de)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a string or number, got {other}"
        ))),
    }
}

fn required_lenient_string<'de, D>(de: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_string(de)?.ok_or_else(|| serde::de::Error::custom("value must not be null"))
}

/// Numbers as-is, strings parsed. Environment variables always arrive as strings.
fn lenient_number<'de, D, T>(de: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + DeserializeOwned,
    T::Err: Display,
{
    number_from_value(Value::deserialize(de)?).map_err(D::Error::custom)
}

fn lenient_optional_number<'de, D, T>(de: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + DeserializeOwned,
    T::Err: Display,
{
    match Option::<Value>::deserialize(de)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(v) => number_from_value(v).map(Some).map_err(D::Error::custom),
    }
}

fn number_from_value<T>(v: Value) -> Result<T, String>
where
    T: FromStr + DeserializeOwned,
    T::Err: Display,
{
    match v {
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|e| format!("invalid number '{s}': {e}")),
        other => serde_json::from_value(other).map_err(|e| e.to_string()),
    }
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hides the `config` crate wiring.
pub struct ReachConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
    legacy_env: bool,
}

impl Default for ReachConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ReachConfigLoader {
    /// Empty loader. [`load`](Self::load) layers the `REACHSTAT_` variables and
    /// the legacy flat variables over every file added before it.
    ///
    /// ```
    /// use reachstat_config::ReachConfigLoader;
    ///
    /// let config = ReachConfigLoader::new()
    ///     .without_legacy_env()
    ///     .with_yaml_str("metrika:\n  counter_id: 42")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.metrika.counter_id.as_deref(), Some("42"));
    /// assert_eq!(config.vk.api_version, "5.199");
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
            legacy_env: true,
        }
    }

    /// Load `.env` from the current directory (or a parent) into the process
    /// environment. A missing file is not an error.
    pub fn with_dotenv(self) -> Self {
        let _ = dotenv::dotenv();
        self
    }

    /// Attach a required YAML/TOML/JSON file; the `config` crate infers format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that is silently skipped when it does not exist.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Merge an inline YAML snippet.
    ///
    /// ```
    /// use reachstat_config::{PacingSettings, ReachConfigLoader};
    ///
    /// let cfg = ReachConfigLoader::new()
    ///     .without_legacy_env()
    ///     .with_yaml_str(
    ///         r#"
    /// vk:
    ///   pacing:
    ///     kind: token_bucket
    ///     qps: 3.0
    ///     burst: 1
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(cfg.vk.pacing, PacingSettings::TokenBucket { qps: 3.0, burst: 1 });
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Ignore `API_TOKEN`, `COUNTER_ID` and `VK_ACCESS_TOKEN`.
    pub fn without_legacy_env(mut self) -> Self {
        self.legacy_env = false;
        self
    }

    /// Consume the builder and deserialize the merged sources.
    pub fn load(self) -> Result<ReachConfig, ConfigError> {
        let mut builder = self.builder.add_source(
            Environment::with_prefix("REACHSTAT")
                .prefix_separator("_")
                .separator("__"),
        );
        if self.legacy_env {
            for (var, key) in LEGACY_ENV {
                let value = std::env::var(var).ok().filter(|v| !v.trim().is_empty());
                builder = builder.set_override_option(*key, value)?;
            }
        }
        let cfg = builder.build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))
    }
}
