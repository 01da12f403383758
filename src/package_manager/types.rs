//! PkgNg 相关数据类型定义

use serde::Deserialize;
use std::fmt;

/// `pkg query '%n %v %o'` 的一行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryEntry {
    pub name: String,
    pub version: String,
    pub origin: String,
}

/// 已安装包信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRecord {
    pub name: String,
    /// 形如 `www/curl`，更新查询只能用它做键
    pub origin: String,
    pub version: String,
    /// 远程可用版本；没有已知更新时等于 version
    pub latest: String,
}

impl PackageRecord {
    pub fn from_entry(entry: InventoryEntry, latest: Option<String>) -> Self {
        let latest = latest.unwrap_or_else(|| entry.version.clone());
        Self {
            name: entry.name,
            origin: entry.origin,
            version: entry.version,
            latest,
        }
    }

    /// 当前观测状态，与 version 一致
    pub fn ensure(&self) -> &str {
        &self.version
    }

    pub fn has_update(&self) -> bool {
        self.latest != self.version
    }
}

/// 单个资源的观测结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observed {
    Installed(PackageRecord),
    Absent { name: String },
}

impl Observed {
    pub fn absent(name: &str) -> Self {
        Observed::Absent {
            name: name.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Observed::Installed(record) => &record.name,
            Observed::Absent { name } => name,
        }
    }

    pub fn ensure(&self) -> &str {
        match self {
            Observed::Installed(record) => record.ensure(),
            Observed::Absent { .. } => "absent",
        }
    }

    pub fn status(&self) -> &'static str {
        match self {
            Observed::Installed(_) => "installed",
            Observed::Absent { .. } => "missing",
        }
    }

    #[cfg(test)]
    pub fn record(&self) -> Option<&PackageRecord> {
        match self {
            Observed::Installed(record) => Some(record),
            Observed::Absent { .. } => None,
        }
    }
}

/// 期望状态
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "EnsureValue")]
pub enum Ensure {
    Absent,
    #[default]
    Present,
    Latest,
    Version(String),
}

impl Ensure {
    /// 空字符串不是合法的版本号，返回 None
    pub fn parse(value: &str) -> Option<Self> {
        let ensure = match value.trim() {
            "" => return None,
            "absent" | "false" => Ensure::Absent,
            "present" | "installed" | "true" => Ensure::Present,
            "latest" => Ensure::Latest,
            v => Ensure::Version(v.to_string()),
        };
        Some(ensure)
    }
}

impl fmt::Display for Ensure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ensure::Absent => write!(f, "absent"),
            Ensure::Present => write!(f, "present"),
            Ensure::Latest => write!(f, "latest"),
            Ensure::Version(v) => write!(f, "{}", v),
        }
    }
}

/// 配置文件里 ensure 可以写成布尔值或字符串
#[derive(Deserialize)]
#[serde(untagged)]
enum EnsureValue {
    Flag(bool),
    Text(String),
}

impl TryFrom<EnsureValue> for Ensure {
    type Error = String;

    fn try_from(value: EnsureValue) -> Result<Self, Self::Error> {
        match value {
            EnsureValue::Flag(true) => Ok(Ensure::Present),
            EnsureValue::Flag(false) => Ok(Ensure::Absent),
            EnsureValue::Text(s) => {
                Ensure::parse(&s).ok_or_else(|| "ensure 不能为空字符串".to_string())
            }
        }
    }
}

/// 安装来源；`None` 表示默认仓库
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// `urn:freebsd:repo:<tag>`
    Repository(String),
    /// 本地路径或 URL，直接 `pkg add`
    Artifact(String),
}

/// 受管资源（配置中的一个 `[[package]]`）
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Resource {
    pub name: String,
    #[serde(default)]
    pub ensure: Ensure,
    #[serde(default)]
    pub source: Option<String>,
}
