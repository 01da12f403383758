//! pkg 子进程执行

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{Duration, Instant};

pub const DEFAULT_PKG_PATH: &str = "/usr/local/sbin/pkg";

/// 执行包管理器命令的外部协作者
///
/// 成功时返回 stdout；非零退出或无法启动时返回错误。
pub trait Executor {
    fn execute(&self, args: &[&str]) -> Result<String>;
}

impl<E: Executor + ?Sized> Executor for &E {
    fn execute(&self, args: &[&str]) -> Result<String> {
        (**self).execute(args)
    }
}

/// 基于 duct 的真实 pkg 调用
#[derive(Debug, Clone)]
pub struct PkgCommand {
    pub program: PathBuf,
    pub timeout: Option<Duration>,
}

impl PkgCommand {
    pub fn new(program: impl Into<PathBuf>, timeout: Option<Duration>) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    /// 优先使用配置的路径，否则在 PATH 中查找 pkg
    pub fn detect(configured: &Path, timeout: Option<Duration>) -> Result<Self> {
        if configured.is_file() {
            return Ok(Self::new(configured, timeout));
        }

        let found = Command::new("which")
            .arg("pkg")
            .output()
            .ok()
            .filter(|o| o.status.success())
            .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
            .filter(|s| !s.is_empty());

        match found {
            Some(path) => {
                log::info!("{} 不存在，使用 PATH 中的 {}", configured.display(), path);
                Ok(Self::new(path, timeout))
            }
            None => Err(Error::MissingBinary(configured.display().to_string())),
        }
    }

    fn command_line(&self, args: &[&str]) -> String {
        let mut line = self.program.display().to_string();
        for arg in args {
            line.push(' ');
            if arg.contains(' ') {
                line.push_str(&format!("'{}'", arg));
            } else {
                line.push_str(arg);
            }
        }
        line
    }
}

impl Executor for PkgCommand {
    fn execute(&self, args: &[&str]) -> Result<String> {
        let command = self.command_line(args);
        log::debug!("执行: {}", command);

        let launch_err = |source| Error::Launch {
            program: self.program.display().to_string(),
            source,
        };

        let handle = duct::cmd(&self.program, args.iter().copied())
            .stdout_capture()
            .stderr_capture()
            .unchecked()
            .start()
            .map_err(launch_err)?;

        let output = match self.timeout {
            None => handle.wait().map_err(launch_err)?,
            Some(timeout) => {
                let deadline = Instant::now() + timeout;
                loop {
                    if handle.try_wait().map_err(launch_err)?.is_some() {
                        break handle.wait().map_err(launch_err)?;
                    }
                    if Instant::now() >= deadline {
                        if let Err(e) = handle.kill() {
                            log::warn!("终止超时进程失败: {}", e);
                        }
                        return Err(Error::Timeout {
                            command,
                            secs: timeout.as_secs(),
                        });
                    }
                    std::thread::sleep(Duration::from_millis(50));
                }
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        if output.status.success() {
            return Ok(stdout);
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(Error::Execution {
            command,
            code: output.status.code(),
            output: format!("{}{}", stdout, stderr).trim_end().to_string(),
        })
    }
}
