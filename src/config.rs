//! Defines the configuration settings for the seo-scan service.
//!
//! Settings merge in three layers: built-in defaults, then a TOML config
//! file, then CLI/environment overrides. The resulting [`Config`] is injected
//! into the components that need it; business logic never reads the process
//! environment directly.

use anyhow::Context;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Configuration-related command line arguments, flattened into the CLI.
#[derive(clap::Args, Debug)]
pub(crate) struct ConfigArgs {
    /// Path to configuration file (TOML format)
    #[arg(long, env = "SEO_SCAN_CONFIG")]
    pub config_file: Option<String>,

    /// Ranking provider API login
    #[arg(long, env = "SEO_SCAN_PROVIDER_LOGIN")]
    pub provider_login: Option<String>,

    /// Ranking provider API password
    #[arg(long, env = "SEO_SCAN_PROVIDER_PASSWORD")]
    pub provider_password: Option<String>,

    /// Ranking provider base URL
    #[arg(long, env = "SEO_SCAN_PROVIDER_BASE_URL")]
    pub provider_base_url: Option<String>,

    /// Page fetch timeout in seconds
    #[arg(long, env = "SEO_SCAN_REQUEST_TIMEOUT")]
    pub request_timeout: Option<u64>,

    /// Ranking provider timeout in seconds
    #[arg(long, env = "SEO_SCAN_PROVIDER_TIMEOUT")]
    pub provider_timeout: Option<u64>,

    /// User agent string for the page fetch
    #[arg(long, env = "SEO_SCAN_USER_AGENT")]
    pub user_agent: Option<String>,

    /// SMTP relay host for lead notifications
    #[arg(long, env = "SEO_SCAN_SMTP_HOST")]
    pub smtp_host: Option<String>,

    /// SMTP relay port
    #[arg(long, env = "SEO_SCAN_SMTP_PORT")]
    pub smtp_port: Option<u16>,

    /// SMTP username
    #[arg(long, env = "SEO_SCAN_SMTP_USERNAME")]
    pub smtp_username: Option<String>,

    /// SMTP password
    #[arg(long, env = "SEO_SCAN_SMTP_PASSWORD")]
    pub smtp_password: Option<String>,

    /// Comma-separated list of lead notification recipients
    #[arg(long, env = "SEO_SCAN_LEAD_RECIPIENTS")]
    pub lead_recipients: Option<String>,

    /// Sender mailbox for lead notifications
    #[arg(long, env = "SEO_SCAN_LEAD_SENDER")]
    pub lead_sender: Option<String>,
}

/// TOML configuration file structure.
#[derive(Deserialize, Debug, Default)]
struct ConfigFile {
    network: Option<NetworkConfig>,
    provider: Option<ProviderConfig>,
    smtp: Option<SmtpConfig>,
    leads: Option<LeadsConfig>,
}

#[derive(Deserialize, Debug, Default)]
struct NetworkConfig {
    request_timeout: Option<u64>,
    provider_timeout: Option<u64>,
    user_agent: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
struct ProviderConfig {
    base_url: Option<String>,
    login: Option<String>,
    password: Option<String>,
    location_code: Option<u32>,
    language_code: Option<String>,
    ranked_keywords_limit: Option<u32>,
    competitors_limit: Option<u32>,
    suggestions_limit: Option<u32>,
}

#[derive(Deserialize, Debug, Default)]
struct SmtpConfig {
    host: Option<String>,
    port: Option<u16>,
    username: Option<String>,
    password: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
struct LeadsConfig {
    sender: Option<String>,
    recipients: Option<Vec<String>>,
}

/// Application configuration settings.
#[derive(Debug, Clone)]
pub(crate) struct Config {
    /// Timeout for the on-page audit fetch.
    pub request_timeout: Duration,
    /// Timeout for each ranking provider call.
    pub provider_timeout: Duration,
    /// User agent string announced during the page fetch.
    pub user_agent: String,
    /// Base URL of the ranking provider API.
    pub provider_base_url: String,
    /// HTTP Basic credentials for the ranking provider.
    pub provider_login: String,
    pub provider_password: String,
    /// Provider market scope. The funnel targets France / French only.
    pub location_code: u32,
    pub language_code: String,
    /// Result limits per provider endpoint.
    pub ranked_keywords_limit: u32,
    pub competitors_limit: u32,
    pub suggestions_limit: u32,
    /// SMTP relay for lead notifications. Empty host disables sending.
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    /// Sender mailbox, e.g. `AgaiGency <noreply@agaigency.com>`.
    pub lead_sender: String,
    /// Internal distribution list receiving lead summaries.
    pub lead_recipients: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            request_timeout: Duration::from_secs(8),
            provider_timeout: Duration::from_secs(12),
            user_agent: "AgaiGencyBot/1.0 (+https://agaigency.com/seo-audit)".to_string(),
            provider_base_url: "https://api.dataforseo.com".to_string(),
            provider_login: String::new(),
            provider_password: String::new(),
            location_code: 2250,
            language_code: "fr".to_string(),
            ranked_keywords_limit: 30,
            competitors_limit: 10,
            suggestions_limit: 20,
            smtp_host: String::new(),
            smtp_port: 587,
            smtp_username: String::new(),
            smtp_password: String::new(),
            lead_sender: "AgaiGency <noreply@agaigency.com>".to_string(),
            lead_recipients: vec!["contact@agaigency.com".to_string()],
        }
    }
}

/// Load configuration from a TOML file.
fn load_config_file(file_path: &str) -> anyhow::Result<ConfigFile> {
    let path = Path::new(file_path);
    if !path.exists() {
        tracing::warn!("Configuration file {} not found, using defaults", file_path);
        return Ok(ConfigFile::default());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file: {}", file_path))?;

    let config: ConfigFile = toml::from_str(&content)
        .with_context(|| format!("Failed to parse TOML configuration from {}", file_path))?;

    tracing::info!("Loaded configuration from {}", file_path);
    Ok(config)
}

fn apply_file_config(config: &mut Config, file_config: &ConfigFile) {
    if let Some(network) = &file_config.network {
        if let Some(timeout) = network.request_timeout {
            config.request_timeout = Duration::from_secs(timeout);
        }
        if let Some(timeout) = network.provider_timeout {
            config.provider_timeout = Duration::from_secs(timeout);
        }
        if let Some(user_agent) = &network.user_agent {
            config.user_agent = user_agent.clone();
        }
    }

    if let Some(provider) = &file_config.provider {
        if let Some(base_url) = &provider.base_url {
            config.provider_base_url = base_url.clone();
        }
        if let Some(login) = &provider.login {
            config.provider_login = login.clone();
        }
        if let Some(password) = &provider.password {
            config.provider_password = password.clone();
        }
        if let Some(location) = provider.location_code {
            config.location_code = location;
        }
        if let Some(language) = &provider.language_code {
            config.language_code = language.clone();
        }
        if let Some(limit) = provider.ranked_keywords_limit {
            config.ranked_keywords_limit = limit;
        }
        if let Some(limit) = provider.competitors_limit {
            config.competitors_limit = limit;
        }
        if let Some(limit) = provider.suggestions_limit {
            config.suggestions_limit = limit;
        }
    }

    if let Some(smtp) = &file_config.smtp {
        if let Some(host) = &smtp.host {
            config.smtp_host = host.clone();
        }
        if let Some(port) = smtp.port {
            config.smtp_port = port;
        }
        if let Some(username) = &smtp.username {
            config.smtp_username = username.clone();
        }
        if let Some(password) = &smtp.password {
            config.smtp_password = password.clone();
        }
    }

    if let Some(leads) = &file_config.leads {
        if let Some(sender) = &leads.sender {
            config.lead_sender = sender.clone();
        }
        if let Some(recipients) = &leads.recipients {
            config.lead_recipients = recipients.clone();
        }
    }
}

/// Apply command line / environment overrides to the Config instance.
fn apply_cli_args(config: &mut Config, args: &ConfigArgs) {
    if let Some(ref login) = args.provider_login {
        config.provider_login = login.clone();
    }
    if let Some(ref password) = args.provider_password {
        config.provider_password = password.clone();
    }
    if let Some(ref base_url) = args.provider_base_url {
        config.provider_base_url = base_url.clone();
    }
    if let Some(timeout) = args.request_timeout {
        config.request_timeout = Duration::from_secs(timeout);
    }
    if let Some(timeout) = args.provider_timeout {
        config.provider_timeout = Duration::from_secs(timeout);
    }
    if let Some(ref agent) = args.user_agent {
        config.user_agent = agent.clone();
    }
    if let Some(ref host) = args.smtp_host {
        config.smtp_host = host.clone();
    }
    if let Some(port) = args.smtp_port {
        config.smtp_port = port;
    }
    if let Some(ref username) = args.smtp_username {
        config.smtp_username = username.clone();
    }
    if let Some(ref password) = args.smtp_password {
        config.smtp_password = password.clone();
    }
    if let Some(ref recipients) = args.lead_recipients {
        config.lead_recipients = recipients
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }
    if let Some(ref sender) = args.lead_sender {
        config.lead_sender = sender.clone();
    }
}

fn validate_config(config: &mut Config) -> anyhow::Result<()> {
    if config.provider_login.is_empty() || config.provider_password.is_empty() {
        tracing::warn!(
            "Ranking provider credentials are not set. Positioning scans will use fallback data."
        );
    }

    if config.smtp_host.is_empty() {
        tracing::warn!("SMTP host is not set. Lead notifications are disabled.");
    }

    if config.lead_recipients.is_empty() {
        config.lead_recipients = vec!["contact@agaigency.com".to_string()];
        tracing::warn!("Lead recipient list was empty. Restored the default inbox.");
    }

    if config.ranked_keywords_limit == 0 {
        config.ranked_keywords_limit = 1;
        tracing::warn!("Ranked keywords limit was 0. Setting to 1.");
    }

    if config.suggestions_limit == 0 {
        config.suggestions_limit = 1;
        tracing::warn!("Suggestions limit was 0. Setting to 1.");
    }

    Ok(())
}

pub(crate) fn build_config(args: &ConfigArgs) -> anyhow::Result<Config> {
    let mut config = Config::default();

    if let Some(ref file_path) = args.config_file {
        let file_config = load_config_file(file_path)?;
        apply_file_config(&mut config, &file_config);
    } else {
        for path in ["./seo-scan.toml", "./config.toml"] {
            if Path::new(path).exists() {
                match load_config_file(path) {
                    Ok(file_config) => {
                        apply_file_config(&mut config, &file_config);
                        break;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load configuration from {}: {}", path, e);
                    }
                }
            }
        }
    }

    apply_cli_args(&mut config, args);

    validate_config(&mut config)?;

    tracing::debug!(
        "Final configuration: provider={}, location={}, language={}, smtp={}",
        config.provider_base_url,
        config.location_code,
        config.language_code,
        if config.smtp_host.is_empty() {
            "disabled"
        } else {
            &config.smtp_host
        }
    );

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_target_french_market() {
        let config = Config::default();
        assert_eq!(config.location_code, 2250);
        assert_eq!(config.language_code, "fr");
        assert_eq!(config.request_timeout, Duration::from_secs(8));
    }

    #[test]
    fn test_file_config_overrides_defaults() {
        let file_config: ConfigFile = toml::from_str(
            r#"
            [network]
            request_timeout = 4

            [provider]
            login = "agency"
            password = "s3cret"

            [leads]
            recipients = ["leads@agaigency.com", "sales@agaigency.com"]
            "#,
        )
        .unwrap();

        let mut config = Config::default();
        apply_file_config(&mut config, &file_config);

        assert_eq!(config.request_timeout, Duration::from_secs(4));
        assert_eq!(config.provider_login, "agency");
        assert_eq!(config.provider_password, "s3cret");
        assert_eq!(config.lead_recipients.len(), 2);
        // Untouched sections keep their defaults.
        assert_eq!(config.provider_base_url, "https://api.dataforseo.com");
    }

    #[test]
    fn test_validate_restores_empty_recipient_list() {
        let mut config = Config::default();
        config.lead_recipients.clear();
        validate_config(&mut config).unwrap();
        assert_eq!(config.lead_recipients, vec!["contact@agaigency.com"]);
    }
}
