use crate::error::Error;
use crate::package_manager::{Resource, DEFAULT_PKG_PATH};
use crate::rest;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub pkg_path: PathBuf,
    /// 单条 pkg 命令的超时秒数，0 表示不限
    pub command_timeout_secs: u64,
    pub dry_run: bool,
    pub report_dir: PathBuf,
    /// 远程清单地址，内容与本地 [[package]] 合并
    pub manifest_url: Option<String>,
    pub http: HttpConfig,
    #[serde(rename = "package")]
    pub packages: Vec<Resource>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
    pub user_agent: String,
    pub ca_cert: Option<PathBuf>,
    pub client_cert: Option<PathBuf>,
    pub client_key: Option<PathBuf>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 120,
            read_timeout_secs: 600,
            user_agent: format!("lian-pkgng/{}", env!("CARGO_PKG_VERSION")),
            ca_cert: None,
            client_cert: None,
            client_key: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        Self {
            pkg_path: PathBuf::from(DEFAULT_PKG_PATH),
            command_timeout_secs: 600,
            dry_run: false,
            report_dir: PathBuf::from(home).join(".lian/pkgng"),
            manifest_url: None,
            http: HttpConfig::default(),
            packages: Vec::new(),
        }
    }
}

impl Config {
    /// 配置路径：LIAN_PKGNG_CONFIG > ~/.config/lian-pkgng/config.toml
    pub fn path() -> PathBuf {
        if let Ok(path) = std::env::var("LIAN_PKGNG_CONFIG") {
            return PathBuf::from(path);
        }
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(".config/lian-pkgng/config.toml")
    }

    pub fn load_or_default() -> Result<Self> {
        Self::load_from(&Self::path())
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = fs::read_to_string(config_path)
                .with_context(|| format!("读取配置失败: {}", config_path.display()))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("配置格式错误: {}", config_path.display()))?;
            Ok(config)
        } else {
            log::info!("{} 不存在，使用默认配置", config_path.display());
            Ok(Self::default())
        }
    }

    pub fn command_timeout(&self) -> Option<Duration> {
        if self.command_timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.command_timeout_secs))
        }
    }
}

/// 远程清单，格式与配置中的 [[package]] 相同，可以是 TOML 或 JSON
#[derive(Debug, Default, Deserialize)]
pub struct Manifest {
    #[serde(rename = "package", default)]
    pub packages: Vec<Resource>,
}

impl Manifest {
    pub fn from_response(response: &rest::Response) -> crate::error::Result<Self> {
        if !response.is_success() {
            return Err(Error::Manifest(format!(
                "服务器返回 {}: {}",
                response.status,
                response.body.trim()
            )));
        }
        if response.is_json() || response.body.trim_start().starts_with('{') {
            response.json()
        } else {
            toml::from_str(&response.body).map_err(|e| Error::Manifest(e.to_string()))
        }
    }

    pub async fn fetch(url: &str, http: &HttpConfig) -> crate::error::Result<Self> {
        let client = rest::Client::new(url, http)?;
        let response = client.get("", None, None).await?;
        let manifest = Self::from_response(&response)?;
        log::info!("从 {} 获取到 {} 个资源", url, manifest.packages.len());
        Ok(manifest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package_manager::Ensure;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config.pkg_path, PathBuf::from("/usr/local/sbin/pkg"));
        assert_eq!(config.command_timeout(), Some(Duration::from_secs(600)));
        assert!(config.packages.is_empty());
        assert!(!config.dry_run);
    }

    #[test]
    fn test_load_packages() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
dry_run = true
command_timeout_secs = 0
manifest_url = "https://config.example.com/hosts/web01.toml"

[http]
read_timeout_secs = 30

[[package]]
name = "curl"
ensure = "7.77.0"

[[package]]
name = "www/nginx"
ensure = "latest"
source = "urn:freebsd:repo:FreeBSD"

[[package]]
name = "vim"
ensure = false
"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert!(config.dry_run);
        assert_eq!(config.command_timeout(), None);
        assert_eq!(config.http.read_timeout_secs, 30);
        assert_eq!(config.http.connect_timeout_secs, 120);
        assert_eq!(config.packages.len(), 3);
        assert_eq!(config.packages[0].ensure, Ensure::Version("7.77.0".to_string()));
        assert_eq!(config.packages[1].ensure, Ensure::Latest);
        assert_eq!(
            config.packages[1].source.as_deref(),
            Some("urn:freebsd:repo:FreeBSD")
        );
        assert_eq!(config.packages[2].ensure, Ensure::Absent);
    }

    #[test]
    fn test_invalid_config_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[[package]]\nensure = \"latest\"\n").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    fn response(status: u16, content_type: Option<&str>, body: &str) -> rest::Response {
        rest::Response {
            status,
            content_type: content_type.map(str::to_string),
            body: body.to_string(),
        }
    }

    #[test]
    fn test_manifest_toml_and_json() {
        let manifest = Manifest::from_response(&response(
            200,
            Some("text/plain"),
            "[[package]]\nname = \"tmux\"\nensure = \"latest\"\n",
        ))
        .unwrap();
        assert_eq!(manifest.packages.len(), 1);
        assert_eq!(manifest.packages[0].ensure, Ensure::Latest);

        let manifest = Manifest::from_response(&response(
            200,
            Some("application/json"),
            r#"{"package": [{"name": "curl", "ensure": true, "source": "urn:freebsd:repo:FreeBSD"}]}"#,
        ))
        .unwrap();
        assert_eq!(manifest.packages[0].name, "curl");
        assert_eq!(manifest.packages[0].ensure, Ensure::Present);
    }

    #[test]
    fn test_manifest_http_error() {
        let err = Manifest::from_response(&response(404, None, "not found")).unwrap_err();
        assert!(err.to_string().contains("404"));
    }
}
