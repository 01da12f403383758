use std::process::Command;

/// pkg(8) 支持的系统
const SUPPORTED_SYSTEMS: [&str; 2] = ["FreeBSD", "DragonFly"];

/// 主机信息，用于运行前检查和报告标题
#[derive(Debug, Clone)]
pub struct SystemInfo {
    pub os: String,
    pub release: String,
    pub hostname: String,
}

impl SystemInfo {
    pub fn detect() -> Self {
        Self {
            os: Self::run_cmd("uname", &["-s"]),
            release: Self::run_cmd("uname", &["-r"]),
            hostname: Self::run_cmd("uname", &["-n"]),
        }
    }

    pub fn is_supported(&self) -> bool {
        SUPPORTED_SYSTEMS.contains(&self.os.as_str())
    }

    pub fn describe(&self) -> String {
        format!("{} ({} {})", self.hostname, self.os, self.release)
    }

    fn run_cmd(cmd: &str, args: &[&str]) -> String {
        Command::new(cmd)
            .args(args)
            .output()
            .ok()
            .and_then(|o| {
                if o.status.success() {
                    Some(String::from_utf8_lossy(&o.stdout).trim().to_string())
                } else {
                    None
                }
            })
            .unwrap_or_else(|| "未知".to_string())
    }
}
