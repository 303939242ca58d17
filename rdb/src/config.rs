use anyhow::{anyhow, Context, Result};
use rdb_core::DEFAULT_LABEL;
use record_store::{StoreConfig, DEFAULT_MAX_CONNECTIONS};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub connection_string: String,
    pub max_connections: u32,
    pub default_program: String,
    pub default_platform: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            connection_string: String::new(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            default_program: DEFAULT_LABEL.into(),
            default_platform: DEFAULT_LABEL.into(),
        }
    }
}

impl Config {
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig::new(self.connection_string.clone()).with_max_connections(self.max_connections)
    }
}

/// `$RDB_CONFIG`, else `$XDG_CONFIG_HOME/rdb/config.yaml`, else `~/.config/rdb/config.yaml`.
pub fn default_path() -> Result<PathBuf> {
    path_from_env(|k| std::env::var(k).ok())
}

fn path_from_env(var: impl Fn(&str) -> Option<String>) -> Result<PathBuf> {
    let var = |k: &str| var(k).filter(|v| !v.is_empty());
    if let Some(p) = var("RDB_CONFIG") {
        return Ok(PathBuf::from(p));
    }
    let base = match var("XDG_CONFIG_HOME") {
        Some(x) => PathBuf::from(x),
        None => {
            let home = var("HOME").ok_or_else(|| anyhow!("cannot locate config: HOME is not set"))?;
            Path::new(&home).join(".config")
        }
    };
    Ok(base.join("rdb").join("config.yaml"))
}

/// Missing file means defaults; an unreadable or malformed one is an error.
pub fn load(path: &Path) -> Result<Config> {
    let s = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Config::default()),
        Err(e) => return Err(e).with_context(|| format!("failed to read {}", path.display())),
    };
    if s.trim().is_empty() {
        return Ok(Config::default());
    }
    serde_yaml::from_str(&s).with_context(|| format!("failed to parse {}", path.display()))
}

pub fn save(path: &Path, cfg: &Config) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
    }
    let s = serde_yaml::to_string(cfg)?;
    fs::write(path, s).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

pub fn mask_connection_string(s: &str) -> String {
    let n = s.chars().count();
    if n == 0 {
        return "(not set)".into();
    }
    if n > 20 {
        let head: String = s.chars().take(10).collect();
        let tail: String = s.chars().skip(n - 10).collect();
        return format!("{head}...{tail}");
    }
    "***".into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load(&dir.path().join("nope.yaml")).unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.max_connections, 10);
        assert_eq!(cfg.default_program, "default");
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");
        let cfg = Config {
            connection_string: "sqlite:///var/lib/rdb.sqlite".into(),
            max_connections: 4,
            default_program: "acme".into(),
            ..Default::default()
        };
        save(&path, &cfg).unwrap();
        assert_eq!(load(&path).unwrap(), cfg);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "connection_string: rdb.sqlite\n").unwrap();
        let cfg = load(&path).unwrap();
        assert_eq!(cfg.connection_string, "rdb.sqlite");
        assert_eq!(cfg.max_connections, DEFAULT_MAX_CONNECTIONS);
        assert_eq!(cfg.default_platform, "default");
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "max_connections: [oops").unwrap();
        assert!(load(&path).is_err());
    }

    #[test]
    fn path_resolution_order() {
        let env = |pairs: &'static [(&'static str, &'static str)]| {
            move |k: &str| pairs.iter().find(|(n, _)| *n == k).map(|(_, v)| v.to_string())
        };
        let p = path_from_env(env(&[("RDB_CONFIG", "/etc/rdb.yaml"), ("HOME", "/home/u")])).unwrap();
        assert_eq!(p, PathBuf::from("/etc/rdb.yaml"));
        let p = path_from_env(env(&[("XDG_CONFIG_HOME", "/xdg"), ("HOME", "/home/u")])).unwrap();
        assert_eq!(p, PathBuf::from("/xdg/rdb/config.yaml"));
        let p = path_from_env(env(&[("HOME", "/home/u")])).unwrap();
        assert_eq!(p, PathBuf::from("/home/u/.config/rdb/config.yaml"));
        assert!(path_from_env(env(&[])).is_err());
    }

    #[test]
    fn masking() {
        assert_eq!(mask_connection_string(""), "(not set)");
        assert_eq!(mask_connection_string("rdb.sqlite"), "***");
        assert_eq!(
            mask_connection_string("sqlite:///home/user/recon/rdb.sqlite"),
            "sqlite:///...rdb.sqlite"
        );
    }
}
