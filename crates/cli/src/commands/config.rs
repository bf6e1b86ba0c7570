use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use procura_core::config::{AppConfig, LoadOptions};
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let doc = config_file_doc.as_ref();
    let path = config_file_path.as_deref();

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    lines.push(render_line(
        "database.url",
        &config.database.url,
        field_source("database.url", "PROCURA_DATABASE_URL", doc, path),
    ));
    lines.push(render_line(
        "database.max_connections",
        &config.database.max_connections.to_string(),
        field_source("database.max_connections", "PROCURA_DATABASE_MAX_CONNECTIONS", doc, path),
    ));
    lines.push(render_line(
        "database.timeout_secs",
        &config.database.timeout_secs.to_string(),
        field_source("database.timeout_secs", "PROCURA_DATABASE_TIMEOUT_SECS", doc, path),
    ));

    lines.push(render_line(
        "server.bind_address",
        &config.server.bind_address,
        field_source("server.bind_address", "PROCURA_SERVER_BIND_ADDRESS", doc, path),
    ));
    lines.push(render_line(
        "server.port",
        &config.server.port.to_string(),
        field_source("server.port", "PROCURA_SERVER_PORT", doc, path),
    ));
    lines.push(render_line(
        "server.graceful_shutdown_secs",
        &config.server.graceful_shutdown_secs.to_string(),
        field_source(
            "server.graceful_shutdown_secs",
            "PROCURA_SERVER_GRACEFUL_SHUTDOWN_SECS",
            doc,
            path,
        ),
    ));

    lines.push(render_line(
        "approvals.token_ttl_days",
        &config.approvals.token_ttl_days.to_string(),
        field_source("approvals.token_ttl_days", "PROCURA_APPROVALS_TOKEN_TTL_DAYS", doc, path),
    ));
    lines.push(render_line(
        "approvals.default_page_size",
        &config.approvals.default_page_size.to_string(),
        field_source(
            "approvals.default_page_size",
            "PROCURA_APPROVALS_DEFAULT_PAGE_SIZE",
            doc,
            path,
        ),
    ));
    lines.push(render_line(
        "approvals.max_page_size",
        &config.approvals.max_page_size.to_string(),
        field_source("approvals.max_page_size", "PROCURA_APPROVALS_MAX_PAGE_SIZE", doc, path),
    ));

    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        field_source("logging.level", "PROCURA_LOGGING_LEVEL", doc, path),
    ));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format),
        field_source("logging.format", "PROCURA_LOGGING_FORMAT", doc, path),
    ));

    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    let root = PathBuf::from("procura.toml");
    if root.exists() {
        return Some(root);
    }

    let nested = PathBuf::from("config/procura.toml");
    if nested.exists() {
        return Some(nested);
    }

    None
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_key: &str,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if env::var_os(env_key).is_some() {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
