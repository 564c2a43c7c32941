//! Runtime configuration for the server binary.
//!
//! Resolution order: built-in defaults, then environment variables, then
//! command-line flags (flags win).

use std::path::PathBuf;

use crate::registry::{DEFAULT_REGISTRY_FILE, DEFAULT_STORAGE_PREFIX};
use crate::search::DEFAULT_THRESHOLD;

pub const DEFAULT_HTTP_PORT: u16 = 7878;
pub const DEFAULT_DATA_DIR: &str = "planilhas";

pub const ENV_HTTP_PORT: &str = "ROUTELISTS_HTTP_PORT";
pub const ENV_DATA_DIR: &str = "ROUTELISTS_DATA_DIR";
pub const ENV_SEARCH_THRESHOLD: &str = "ROUTELISTS_SEARCH_THRESHOLD";

pub const USAGE: &str = "routelists\n\nUSAGE:\n  routelists [--http-port N] [--data-dir PATH]\n\nOPTIONS:\n  --http-port N       HTTP API port (env: ROUTELISTS_HTTP_PORT, default 7878)\n  --data-dir PATH     Folder holding routes.json and the route files (env: ROUTELISTS_DATA_DIR, default planilhas)\n\nENVIRONMENT:\n  ROUTELISTS_SEARCH_THRESHOLD  Minimum fuzzy score 0-100 for a search match (default 70)\n  RUST_LOG                     Log filter (default info)\n";

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub http_port: u16,
    pub data_root: PathBuf,
    pub registry_file: String,
    pub storage_prefix: String,
    pub search_threshold: f64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_port: DEFAULT_HTTP_PORT,
            data_root: PathBuf::from(DEFAULT_DATA_DIR),
            registry_file: DEFAULT_REGISTRY_FILE.to_string(),
            storage_prefix: DEFAULT_STORAGE_PREFIX.to_string(),
            search_threshold: DEFAULT_THRESHOLD,
        }
    }
}

fn parse_port(val: &str) -> Option<u16> {
    val.trim().parse::<u16>().ok()
}

fn parse_threshold(val: &str) -> Option<f64> {
    val.trim().parse::<f64>().ok().filter(|t| (0.0..=100.0).contains(t))
}

fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    let mut i = 0;
    while i < args.len() {
        if args[i] == flag && i + 1 < args.len() {
            return Some(args[i + 1].as_str());
        }
        i += 1;
    }
    None
}

pub fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

impl ServerConfig {
    /// Resolve against an environment lookup and the argument list.
    /// Unparseable values are ignored and the next source down is used.
    pub fn resolve<E>(env: E, args: &[String]) -> Self
    where
        E: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let env_http = env(ENV_HTTP_PORT).as_deref().and_then(parse_port);
        let env_root = env(ENV_DATA_DIR).filter(|s| !s.trim().is_empty());
        let env_threshold = env(ENV_SEARCH_THRESHOLD).as_deref().and_then(parse_threshold);

        let arg_http = arg_value(args, "--http-port").and_then(parse_port);
        let arg_root = arg_value(args, "--data-dir").map(str::to_string);

        Self {
            http_port: arg_http.or(env_http).unwrap_or(defaults.http_port),
            data_root: arg_root.or(env_root).map(PathBuf::from).unwrap_or(defaults.data_root),
            search_threshold: env_threshold.unwrap_or(defaults.search_threshold),
            ..defaults
        }
    }

    /// Resolve from the process environment.
    pub fn from_env_and_args(args: &[String]) -> Self {
        Self::resolve(|name| std::env::var(name).ok(), args)
    }
}
