//! 引擎错误类型

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// pkg 进程无法启动（二进制不存在、无执行权限等）
    #[error("无法启动 {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// 进程以非零状态退出，output 为捕获到的 stdout + stderr
    #[error("命令执行失败 `{command}` (exit={code:?}):\n{output}")]
    Execution {
        command: String,
        code: Option<i32>,
        output: String,
    },

    #[error("命令执行超时 `{command}` (超过 {secs} 秒)")]
    Timeout { command: String, secs: u64 },

    /// source 是 urn 但不符合 urn:freebsd:repo:<tag>
    #[error("无效的仓库 URN: {0:?}")]
    MalformedSource(String),

    #[error("未找到包管理器: {0}")]
    MissingBinary(String),

    #[error("HTTP 请求失败: {0}")]
    Http(#[from] reqwest::Error),

    #[error("无效的 URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("读取证书失败 {path}: {source}")]
    Certificate {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("清单解析失败: {0}")]
    Manifest(String),
}

impl Error {
    /// 是否属于子进程执行层面的失败（启动失败、非零退出、超时）
    pub fn is_execution_failure(&self) -> bool {
        matches!(
            self,
            Error::Launch { .. } | Error::Execution { .. } | Error::Timeout { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execution_failure_classification() {
        let exec = Error::Execution {
            command: "pkg remove -qy curl".to_string(),
            code: Some(1),
            output: "pkg: No packages matched".to_string(),
        };
        assert!(exec.is_execution_failure());
        assert!(exec.to_string().contains("No packages matched"));

        let malformed = Error::MalformedSource("urn:notfreebsd:x".to_string());
        assert!(!malformed.is_execution_failure());
    }
}
