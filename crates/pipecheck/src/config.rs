//! Build-time configuration: the scoped lookup table components query while
//! they are built, and the run settings loaded from TOML or the command line.

use crate::HashMap;
use crate::error::ConfigError;
use crate::sequence::SequenceSpec;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Names the bus a component attaches to. The simulation owns the bus itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusBinding {
    pub name: String,
}

impl BusBinding {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Fails unless this binding names `available`.
    pub fn check(&self, available: &str) -> Result<(), ConfigError> {
        if self.name == available {
            Ok(())
        } else {
            Err(ConfigError::UnknownBus {
                requested: self.name.clone(),
                available: available.to_string(),
            })
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValue {
    Bool(bool),
    Int(i64),
    Text(String),
    Bus(BusBinding),
}

impl ConfigValue {
    fn type_name(&self) -> &'static str {
        match self {
            ConfigValue::Bool(_) => "bool",
            ConfigValue::Int(_) => "int",
            ConfigValue::Text(_) => "text",
            ConfigValue::Bus(_) => "bus",
        }
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        ConfigValue::Bool(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        ConfigValue::Int(value)
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::Text(value.to_string())
    }
}

impl From<BusBinding> for ConfigValue {
    fn from(value: BusBinding) -> Self {
        ConfigValue::Bus(value)
    }
}

#[derive(Debug, Clone)]
struct Entry {
    scope: String,
    value: ConfigValue,
}

/// Values keyed by `(scope, field)`.
///
/// A scope pattern ending in `*` matches every scope with that prefix, so
/// `"env.*"` reaches `"env.agent"` and `"env.monitor"`. When several
/// entries match, the one set last wins.
#[derive(Debug, Clone, Default)]
pub struct ConfigDb {
    entries: HashMap<String, Vec<Entry>>,
}

fn scope_matches(pattern: &str, scope: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => scope.starts_with(prefix),
        None => pattern == scope,
    }
}

impl ConfigDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, scope: &str, field: &str, value: impl Into<ConfigValue>) {
        self.entries.entry(field.to_string()).or_default().push(Entry {
            scope: scope.to_string(),
            value: value.into(),
        });
    }

    pub fn lookup(&self, scope: &str, field: &str) -> Option<&ConfigValue> {
        self.entries
            .get(field)?
            .iter()
            .rev()
            .find(|entry| scope_matches(&entry.scope, scope))
            .map(|entry| &entry.value)
    }

    fn require(&self, scope: &str, field: &str) -> Result<&ConfigValue, ConfigError> {
        self.lookup(scope, field).ok_or_else(|| ConfigError::MissingKey {
            scope: scope.to_string(),
            field: field.to_string(),
        })
    }

    fn mismatch(scope: &str, field: &str, expected: &'static str, found: &ConfigValue) -> ConfigError {
        ConfigError::TypeMismatch {
            scope: scope.to_string(),
            field: field.to_string(),
            expected,
            found: found.type_name(),
        }
    }

    pub fn get_bool(&self, scope: &str, field: &str) -> Result<bool, ConfigError> {
        match self.require(scope, field)? {
            ConfigValue::Bool(value) => Ok(*value),
            other => Err(Self::mismatch(scope, field, "bool", other)),
        }
    }

    pub fn get_int(&self, scope: &str, field: &str) -> Result<i64, ConfigError> {
        match self.require(scope, field)? {
            ConfigValue::Int(value) => Ok(*value),
            other => Err(Self::mismatch(scope, field, "int", other)),
        }
    }

    pub fn get_text(&self, scope: &str, field: &str) -> Result<&str, ConfigError> {
        match self.require(scope, field)? {
            ConfigValue::Text(value) => Ok(value),
            other => Err(Self::mismatch(scope, field, "text", other)),
        }
    }

    pub fn get_bus(&self, scope: &str, field: &str) -> Result<&BusBinding, ConfigError> {
        match self.require(scope, field)? {
            ConfigValue::Bus(value) => Ok(value),
            other => Err(Self::mismatch(scope, field, "bus", other)),
        }
    }

    /// Like [`ConfigDb::get_bool`], but `default` when nothing matches.
    pub fn get_bool_or(&self, scope: &str, field: &str, default: bool) -> Result<bool, ConfigError> {
        match self.lookup(scope, field) {
            None => Ok(default),
            Some(_) => self.get_bool(scope, field),
        }
    }
}

pub const DEFAULT_SEED: u64 = 0x5eed_c0ffee;
/// 1 ns.
pub const DEFAULT_CLOCK_PERIOD_PS: u64 = 1_000;
/// 1 ms.
pub const DEFAULT_TIMEOUT_PS: u64 = 1_000_000_000;

/// Settings for one test run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Written in TOML as an integer, or as a decimal or `0x` hex string for
    /// values above `i64::MAX`.
    #[serde(with = "seed")]
    pub seed: u64,
    pub clock_period_ps: u64,
    pub initial_delay_ps: u64,
    pub timeout_ps: u64,
    pub vcd: Option<PathBuf>,
    pub progress: bool,
    pub sequences: Vec<SequenceSpec>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            clock_period_ps: DEFAULT_CLOCK_PERIOD_PS,
            initial_delay_ps: 0,
            timeout_ps: DEFAULT_TIMEOUT_PS,
            vcd: None,
            progress: false,
            sequences: SequenceSpec::default_list(),
        }
    }
}

mod seed {
    use serde::{Deserialize, Deserializer, Serializer, de};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Seed {
        Int(u64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(seed: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        match i64::try_from(*seed) {
            Ok(value) => serializer.serialize_i64(value),
            Err(_) => serializer.serialize_str(&format!("{seed:#x}")),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        match Seed::deserialize(deserializer)? {
            Seed::Int(value) => Ok(value),
            Seed::Text(text) => {
                let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
                    Some(hex) => u64::from_str_radix(&hex.replace('_', ""), 16),
                    None => text.replace('_', "").parse(),
                };
                parsed.map_err(|e| de::Error::custom(format!("seed `{text}`: {e}")))
            }
        }
    }
}

impl RunConfig {
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: RunConfig =
            toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            kind: e.kind(),
            message: e.to_string(),
        })?;
        Self::from_toml(&text)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.clock_period_ps < 2 {
            return Err(ConfigError::Invalid(format!(
                "clock period of {}ps cannot be split into two phases",
                self.clock_period_ps
            )));
        }
        if self.timeout_ps <= self.initial_delay_ps {
            return Err(ConfigError::Invalid(format!(
                "timeout {}ps expires before the first clock edge at {}ps",
                self.timeout_ps, self.initial_delay_ps
            )));
        }
        if let Some(spec) = self.sequences.iter().find(|s| s.count == Some(0)) {
            return Err(ConfigError::Invalid(format!(
                "sequence {:?} has a count of 0",
                spec.kind
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::SequenceKind;

    #[test]
    fn wildcard_scope_reaches_children() {
        let mut db = ConfigDb::new();
        db.set("env.*", "is_active", true);
        db.set("env.agent", "vif", BusBinding::new("vif"));
        assert!(db.get_bool("env.agent", "is_active").unwrap());
        assert!(db.get_bool("env.monitor", "is_active").unwrap());
        assert_eq!(db.get_bus("env.agent", "vif").unwrap().name, "vif");
        assert_eq!(
            db.get_bus("env.monitor", "vif"),
            Err(ConfigError::MissingKey {
                scope: "env.monitor".to_string(),
                field: "vif".to_string()
            })
        );
    }

    #[test]
    fn latest_setting_wins() {
        let mut db = ConfigDb::new();
        db.set("*", "is_active", true);
        db.set("env.agent", "is_active", false);
        assert!(!db.get_bool("env.agent", "is_active").unwrap());
        db.set("*", "is_active", true);
        assert!(db.get_bool("env.agent", "is_active").unwrap());
    }

    #[test]
    fn wrong_type_is_reported() {
        let mut db = ConfigDb::new();
        db.set("*", "vif", "not a bus");
        assert_eq!(
            db.get_bus("env", "vif"),
            Err(ConfigError::TypeMismatch {
                scope: "env".to_string(),
                field: "vif".to_string(),
                expected: "bus",
                found: "text",
            })
        );
        assert_eq!(db.get_text("env", "vif").unwrap(), "not a bus");
        assert!(db.get_int("env", "vif").is_err());
    }

    #[test]
    fn bus_binding_must_name_the_bus() {
        assert!(BusBinding::new("vif").check("vif").is_ok());
        assert!(matches!(
            BusBinding::new("other").check("vif"),
            Err(ConfigError::UnknownBus { .. })
        ));
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = RunConfig::from_toml(
            r#"
            seed = 7
            sequences = [{ kind = "random_loop", count = 50 }, { kind = "repeat" }]
            "#,
        )
        .unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.clock_period_ps, DEFAULT_CLOCK_PERIOD_PS);
        assert_eq!(
            config.sequences,
            [
                SequenceSpec::with_count(SequenceKind::RandomLoop, 50),
                SequenceSpec::new(SequenceKind::Repeat)
            ]
        );
    }

    #[test]
    fn invalid_settings_are_rejected() {
        assert!(matches!(
            RunConfig::from_toml("clock_period_ps = 1"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            RunConfig::from_toml("seeds = 1"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            RunConfig::from_toml("sequences = [{ kind = \"repeat\", count = 0 }]"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn full_width_seeds_survive_toml() {
        let config = RunConfig::from_toml(r#"seed = "0xe255da1f41566654""#).unwrap();
        assert_eq!(config.seed, 0xe255_da1f_4156_6654);
        assert_eq!(RunConfig::from_toml(&config.to_toml().unwrap()).unwrap(), config);

        assert_eq!(RunConfig::from_toml(r#"seed = "42""#).unwrap().seed, 42);
        assert!(matches!(
            RunConfig::from_toml("seed = -1"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            RunConfig::from_toml(r#"seed = "0xfeed_beef_cafe_f00d_1""#),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn unreadable_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");
        let err = RunConfig::load(&path).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Io { ref path, kind: std::io::ErrorKind::NotFound, .. }
                if path.ends_with("missing.toml")
        ));
    }
}
