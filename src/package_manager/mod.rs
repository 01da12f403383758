//! 包管理器模块 — 对 FreeBSD / DragonFly pkg(8) 的封装

pub mod executor;
pub mod parser;
pub mod planner;
pub mod types;
pub mod updates;

// 重新导出常用类型和函数
pub use executor::{Executor, PkgCommand, DEFAULT_PKG_PATH};
pub use types::{Ensure, Observed, PackageRecord, Resource};
pub use updates::UpdateCache;

use crate::error::Result;
use parser::parse_inventory_line;
use std::collections::HashMap;

pub const LIST_ARGS: [&str; 3] = ["query", "-a", "%n %v %o"];
pub const QUERY_FORMAT: &str = "%n %v %o";

/// 一次收敛运行使用的 pkg 引擎，更新缓存随实例创建和销毁
#[derive(Debug)]
pub struct PkgNg<E: Executor> {
    exec: E,
    updates: UpdateCache,
}

impl<E: Executor> PkgNg<E> {
    pub fn new(exec: E) -> Self {
        Self {
            exec,
            updates: UpdateCache::new(),
        }
    }

    #[cfg(test)]
    pub fn executor(&self) -> &E {
        &self.exec
    }

    #[cfg(test)]
    pub fn update_cache(&self) -> &UpdateCache {
        &self.updates
    }

    /// 解析一行查询输出，并通过 origin 补上 latest
    pub fn parse_line(&self, line: &str) -> Option<PackageRecord> {
        let Some(entry) = parse_inventory_line(line) else {
            if !line.trim().is_empty() {
                log::debug!("跳过无法解析的行: {:?}", line);
            }
            return None;
        };
        let latest = self
            .updates
            .latest_version(&self.exec, &entry.origin)
            .map(str::to_string);
        Some(PackageRecord::from_entry(entry, latest))
    }

    // ===== 查询 =====

    /// 全部已安装包 (pkg query -a)；pkg 不可用时返回空列表
    pub fn instances(&self) -> Vec<PackageRecord> {
        match self.exec.execute(&LIST_ARGS) {
            Ok(output) => {
                let packages: Vec<PackageRecord> =
                    output.lines().filter_map(|line| self.parse_line(line)).collect();
                log::debug!("找到 {} 个已安装包", packages.len());
                packages
            }
            Err(e) => {
                log::warn!("获取已安装包列表失败，按空列表处理: {}", e);
                Vec::new()
            }
        }
    }

    /// 一次批量查询，为每个资源名找到对应的已安装包
    pub fn prefetch(&self, names: &[&str]) -> HashMap<String, Option<PackageRecord>> {
        let packages = self.instances();
        names
            .iter()
            .map(|name| (name.to_string(), find_record(&packages, name).cloned()))
            .collect()
    }

    /// 单包查询 (pkg query '%n %v %o' <name>)；未安装时返回 Absent
    pub fn query(&self, name: &str) -> Observed {
        let output = match self.exec.execute(&["query", QUERY_FORMAT, name]) {
            Ok(output) => output,
            Err(e) if e.is_execution_failure() => {
                log::debug!("{} 未安装: {}", name, e);
                return Observed::absent(name);
            }
            Err(e) => {
                log::warn!("查询 {} 失败，按未安装处理: {}", name, e);
                return Observed::absent(name);
            }
        };

        match output.lines().find_map(|line| self.parse_line(line)) {
            Some(record) => Observed::Installed(record),
            None => {
                log::warn!("pkg query {} 输出无法解析: {:?}", name, output);
                Observed::absent(name)
            }
        }
    }

    // ===== 变更 =====

    pub fn install(&self, name: &str, ensure: &Ensure, source: Option<&str>) -> Result<String> {
        let args = planner::install_args(name, ensure, source)?;
        log::info!("安装 {}: pkg {}", name, args.join(" "));
        let arg_refs: Vec<&str> = args.iter().map(|s| s.as_str()).collect();
        self.exec.execute(&arg_refs)
    }

    /// 升级由 pkg 自己决定版本，参数与安装相同
    pub fn update(&self, name: &str, ensure: &Ensure, source: Option<&str>) -> Result<String> {
        self.install(name, ensure, source)
    }

    pub fn uninstall(&self, name: &str) -> Result<String> {
        let args = planner::uninstall_args(name);
        log::info!("卸载 {}: pkg {}", name, args.join(" "));
        let arg_refs: Vec<&str> = args.iter().map(|s| s.as_str()).collect();
        self.exec.execute(&arg_refs)
    }
}

/// 先按短名匹配，再按 origin 匹配；同类匹配中列表靠前者优先
pub fn find_record<'a>(packages: &'a [PackageRecord], identifier: &str) -> Option<&'a PackageRecord> {
    packages
        .iter()
        .find(|p| p.name == identifier)
        .or_else(|| packages.iter().find(|p| p.origin == identifier))
}
