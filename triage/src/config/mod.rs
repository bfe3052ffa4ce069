use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use thread_classifier::{ClassifierRules, Direction, ThreadClassifier};

use crate::error::{Result, TriageError};

// Ten years, in the unit of each duration field.
const MAX_WINDOW_HOURS: i64 = 24 * 365 * 10;
const MAX_STALENESS_DAYS: i64 = 365 * 10;
const MAX_DEFER_HOURS: i64 = 24 * 365 * 10;

/// Engine configuration, loaded from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TriageConfig {
    /// Default classification window for `run` (hours)
    pub classification_window_hours: i64,

    /// Inbox threads older than this are archived remotely (days)
    pub staleness_days: i64,

    /// Default postponement for `defer` (hours)
    pub defer_hours: i64,

    /// Timeout applied to every mailbox call (seconds)
    pub remote_timeout_secs: u64,

    /// Upper bound on concurrent thread fetches within one run
    pub max_concurrent_fetches: usize,

    /// Display limit for subject lines in flagged items
    pub subject_max_chars: usize,

    /// Deep link into the provider UI; `{thread_id}` is substituted
    pub deep_link_template: String,

    /// Label marking messages sent by the account owner
    pub sent_label: String,

    /// Senders excluded at query level (the classifier filters them again)
    pub sender_denylist: Vec<String>,

    /// Suppression store location; defaults to the platform data dir
    pub database_path: Option<PathBuf>,

    pub classifier: ClassifierConfig,
}

/// Additions to the built-in classifier rules.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Replace the built-in lists with a JSON rules file
    pub rules_file: Option<PathBuf>,

    pub extra_ignored_senders: Vec<String>,
    pub extra_automated_phrases: Vec<String>,
    pub extra_inbound_keywords: Vec<String>,
    pub extra_outbound_keywords: Vec<String>,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            classification_window_hours: 72,
            staleness_days: 7,
            defer_hours: 6,
            remote_timeout_secs: 20,
            max_concurrent_fetches: 4,
            subject_max_chars: 60,
            deep_link_template: "https://mail.google.com/mail/u/0/#inbox/{thread_id}".to_string(),
            sent_label: thread_classifier::DEFAULT_SENT_LABEL.to_string(),
            sender_denylist: Vec::new(),
            database_path: None,
            classifier: ClassifierConfig::default(),
        }
    }
}

impl TriageConfig {
    pub fn classification_window(&self) -> Result<Duration> {
        Duration::try_hours(self.classification_window_hours)
            .ok_or_else(|| out_of_range("classification_window_hours"))
    }

    pub fn staleness(&self) -> Result<Duration> {
        Duration::try_days(self.staleness_days).ok_or_else(|| out_of_range("staleness_days"))
    }

    pub fn defer_duration(&self) -> Result<Duration> {
        Duration::try_hours(self.defer_hours).ok_or_else(|| out_of_range("defer_hours"))
    }

    pub fn remote_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.remote_timeout_secs)
    }

    pub fn deep_link(&self, thread_id: &str) -> String {
        self.deep_link_template.replace("{thread_id}", thread_id)
    }

    pub fn database_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.database_path {
            return Ok(path.clone());
        }
        dirs::data_local_dir()
            .map(|dir| dir.join("mail-triage").join("state.sqlite"))
            .ok_or_else(|| TriageError::Config("Could not determine data directory".to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        check_range(
            "classification_window_hours",
            self.classification_window_hours,
            MAX_WINDOW_HOURS,
        )?;
        check_range("staleness_days", self.staleness_days, MAX_STALENESS_DAYS)?;
        check_range("defer_hours", self.defer_hours, MAX_DEFER_HOURS)?;
        if self.max_concurrent_fetches == 0 {
            return Err(TriageError::Config(
                "max_concurrent_fetches must be at least 1".to_string(),
            ));
        }
        if self.remote_timeout_secs == 0 {
            return Err(TriageError::Config(
                "remote_timeout_secs must be at least 1".to_string(),
            ));
        }
        if !self.deep_link_template.contains("{thread_id}") {
            return Err(TriageError::Config(
                "deep_link_template must contain {thread_id}".to_string(),
            ));
        }
        Ok(())
    }

    /// Built-in rules (or the rules file) plus configured extras.
    pub fn classifier_rules(&self) -> Result<ClassifierRules> {
        let mut rules = match &self.classifier.rules_file {
            Some(path) => {
                let json = fs::read_to_string(path).map_err(|e| {
                    TriageError::Config(format!("Failed to read rules file {:?}: {}", path, e))
                })?;
                ClassifierRules::from_json(&json)?
            }
            None => ClassifierRules::default(),
        };

        for sender in self
            .classifier
            .extra_ignored_senders
            .iter()
            .chain(self.sender_denylist.iter())
        {
            rules.ignore_sender(sender);
        }
        for phrase in &self.classifier.extra_automated_phrases {
            rules.ignore_phrase(phrase);
        }
        for keyword in &self.classifier.extra_inbound_keywords {
            rules.add_keyword(Direction::Inbound, keyword);
        }
        for keyword in &self.classifier.extra_outbound_keywords {
            rules.add_keyword(Direction::Outbound, keyword);
        }
        Ok(rules)
    }

    pub fn build_classifier(&self) -> Result<ThreadClassifier> {
        let rules = self.classifier_rules()?;
        Ok(ThreadClassifier::new(&rules).with_sent_label(self.sent_label.clone()))
    }
}

fn check_range(field: &str, value: i64, max: i64) -> Result<()> {
    if value <= 0 || value > max {
        return Err(TriageError::Config(format!(
            "{} must be between 1 and {}, got {}",
            field, max, value
        )));
    }
    Ok(())
}

fn out_of_range(field: &str) -> TriageError {
    TriageError::Config(format!("{} is out of range", field))
}

/// Get default config paths
pub fn default_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("mail-triage").join("config.toml"));
    }

    if let Some(home_dir) = dirs::home_dir() {
        paths.push(
            home_dir
                .join(".config")
                .join("mail-triage")
                .join("config.toml"),
        );
    }

    paths
}

/// Load configuration from an explicit path, the default paths, or defaults.
pub fn load_config(explicit: Option<&Path>) -> Result<TriageConfig> {
    if let Some(path) = explicit {
        return load_config_from_path(path);
    }

    for path in default_config_paths() {
        if path.exists() {
            info!("Found config at: {:?}", path);
            return load_config_from_path(&path);
        }
    }

    info!("No config file found, using defaults");
    Ok(TriageConfig::default())
}

pub fn load_config_from_path(path: &Path) -> Result<TriageConfig> {
    info!("Loading configuration from: {:?}", path);

    let content = fs::read_to_string(path)
        .map_err(|e| TriageError::Config(format!("Failed to read config: {}", e)))?;

    parse_config(&content)
}

pub fn parse_config(content: &str) -> Result<TriageConfig> {
    let config: TriageConfig = toml::from_str(content)
        .map_err(|e| TriageError::Config(format!("Failed to parse config: {}", e)))?;
    config.validate()?;
    Ok(config)
}
