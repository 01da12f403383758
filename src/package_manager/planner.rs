//! 安装参数构造
//!
//! 根据期望状态和来源生成 pkg 的参数列表，不执行任何命令。

use super::types::{Ensure, Source};
use crate::error::{Error, Result};
use reqwest::Url;

const REPO_URN_PREFIX: &str = "urn:freebsd:repo:";

/// 从 `urn:freebsd:repo:<tag>` 中取出仓库标签
///
/// 前缀不区分大小写，标签保持原样。
pub fn repo_tag_from_urn(urn: &str) -> Result<&str> {
    let tag = urn
        .get(..REPO_URN_PREFIX.len())
        .filter(|prefix| prefix.eq_ignore_ascii_case(REPO_URN_PREFIX))
        .map(|_| &urn[REPO_URN_PREFIX.len()..]);
    match tag {
        Some(tag) if !tag.is_empty() => Ok(tag),
        _ => Err(Error::MalformedSource(urn.to_string())),
    }
}

impl Source {
    /// scheme 为 urn 的按仓库标签处理，其余（URL、本地路径）按包文件处理
    pub fn parse(raw: &str) -> Result<Self> {
        match Url::parse(raw) {
            // scheme 已被规范化为小写，用 as_str() 匹配前缀
            Ok(url) if url.scheme() == "urn" => {
                let tag = repo_tag_from_urn(url.as_str())
                    .map_err(|_| Error::MalformedSource(raw.to_string()))?;
                Ok(Source::Repository(tag.to_string()))
            }
            _ => Ok(Source::Artifact(raw.to_string())),
        }
    }
}

/// 传给 `pkg install` 的包名
///
/// 指定版本时拼成 `name-version`。pkg 不接受 `www/curl-1.2.3`，
/// 所以 origin 形式的名字只保留最后一段。
pub fn install_name(identifier: &str, ensure: &Ensure) -> String {
    match ensure {
        Ensure::Absent | Ensure::Present | Ensure::Latest => identifier.to_string(),
        Ensure::Version(version) => {
            let base = identifier.rsplit('/').next().unwrap_or(identifier);
            format!("{}-{}", base, version)
        }
    }
}

pub fn install_args(identifier: &str, ensure: &Ensure, source: Option<&str>) -> Result<Vec<String>> {
    let source = source.map(Source::parse).transpose()?;

    let args = match source {
        None => vec![
            "install".to_string(),
            "-qy".to_string(),
            install_name(identifier, ensure),
        ],
        Some(Source::Repository(tag)) => vec![
            "install".to_string(),
            "-qy".to_string(),
            "-r".to_string(),
            tag,
            install_name(identifier, ensure),
        ],
        Some(Source::Artifact(location)) => vec!["add".to_string(), "-q".to_string(), location],
    };
    Ok(args)
}

/// 卸载始终使用配置中的原始名字
pub fn uninstall_args(name: &str) -> Vec<String> {
    vec!["remove".to_string(), "-qy".to_string(), name.to_string()]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn version(v: &str) -> Ensure {
        Ensure::Version(v.to_string())
    }

    #[test]
    fn test_version_pin() {
        assert_eq!(
            install_args("curl", &version("7.77.0"), None).unwrap(),
            ["install", "-qy", "curl-7.77.0"]
        );
    }

    #[test]
    fn test_version_pin_strips_category() {
        assert_eq!(
            install_args("www/curl", &version("7.77.0"), None).unwrap(),
            ["install", "-qy", "curl-7.77.0"]
        );
    }

    #[test]
    fn test_present_uses_raw_identifier() {
        assert_eq!(
            install_args("curl", &Ensure::Present, None).unwrap(),
            ["install", "-qy", "curl"]
        );
        assert_eq!(
            install_args("www/curl", &Ensure::Latest, None).unwrap(),
            ["install", "-qy", "www/curl"]
        );
        assert_eq!(install_name("curl", &Ensure::Absent), "curl");
    }

    #[test]
    fn test_repository_urn() {
        assert_eq!(
            install_args("curl", &Ensure::Present, Some("urn:freebsd:repo:FreeBSD")).unwrap(),
            ["install", "-qy", "-r", "FreeBSD", "curl"]
        );
        assert_eq!(
            install_args("www/curl", &version("7.77.0"), Some("urn:freebsd:repo:local")).unwrap(),
            ["install", "-qy", "-r", "local", "curl-7.77.0"]
        );
    }

    #[test]
    fn test_urn_prefix_is_case_insensitive() {
        assert_eq!(
            Source::parse("URN:freebsd:repo:FreeBSD").unwrap(),
            Source::Repository("FreeBSD".to_string())
        );
        assert_eq!(
            install_args("curl", &Ensure::Present, Some("urn:FreeBSD:Repo:local")).unwrap(),
            ["install", "-qy", "-r", "local", "curl"]
        );

        let err = Source::parse("URN:freebsd:repo:").unwrap_err();
        assert!(matches!(err, Error::MalformedSource(ref s) if s == "URN:freebsd:repo:"));
    }

    #[test]
    fn test_artifact_source() {
        assert_eq!(
            install_args("curl", &Ensure::Present, Some("https://example.com/curl.pkg")).unwrap(),
            ["add", "-q", "https://example.com/curl.pkg"]
        );
        assert_eq!(
            install_args("curl", &version("7.77.0"), Some("/var/cache/curl-7.77.0.pkg")).unwrap(),
            ["add", "-q", "/var/cache/curl-7.77.0.pkg"]
        );
    }

    #[test]
    fn test_malformed_urn() {
        let err = install_args("curl", &Ensure::Present, Some("urn:notfreebsd:x")).unwrap_err();
        assert!(matches!(err, Error::MalformedSource(ref s) if s == "urn:notfreebsd:x"));

        let err = install_args("curl", &Ensure::Present, Some("urn:freebsd:repo:")).unwrap_err();
        assert!(matches!(err, Error::MalformedSource(_)));
    }

    #[test]
    fn test_uninstall_args() {
        assert_eq!(uninstall_args("curl"), ["remove", "-qy", "curl"]);
        assert_eq!(uninstall_args("www/curl"), ["remove", "-qy", "www/curl"]);
    }
}
