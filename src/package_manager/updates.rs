//! 远程更新缓存
//!
//! 第一次查询时执行一次 `pkg version -voRUL=`，之后只读。
//! 生命周期跟随持有它的 [`PkgNg`](super::PkgNg)，不跨进程保存。

use super::executor::Executor;
use super::parser::parse_update_output;
use std::collections::HashMap;
use std::sync::OnceLock;

pub const UPDATE_CHECK_ARGS: [&str; 2] = ["version", "-voRUL="];

#[derive(Debug, Default)]
pub struct UpdateCache {
    updates: OnceLock<HashMap<String, String>>,
}

impl UpdateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// origin 对应的远程版本；没有可用更新时返回 None
    pub fn latest_version<E: Executor + ?Sized>(&self, exec: &E, origin: &str) -> Option<&str> {
        self.updates(exec).get(origin).map(String::as_str)
    }

    /// 全部可更新包，首次调用时填充
    pub fn updates<E: Executor + ?Sized>(&self, exec: &E) -> &HashMap<String, String> {
        self.updates.get_or_init(|| {
            log::debug!("列出有可用更新的包");
            match exec.execute(&UPDATE_CHECK_ARGS) {
                Ok(output) => parse_update_output(&output),
                Err(e) => {
                    log::warn!("更新检查失败，视为没有可用更新: {}", e);
                    HashMap::new()
                }
            }
        })
    }

    #[cfg(test)]
    pub fn is_loaded(&self) -> bool {
        self.updates.get().is_some()
    }
}
