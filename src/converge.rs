//! 收敛运行：比较期望状态与观测状态，逐个执行 install / update / remove

use crate::package_manager::{Ensure, Executor, Observed, PkgNg, Resource};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    None,
    Install,
    Update,
    Remove,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Action::None => "无需变更",
            Action::Install => "安装",
            Action::Update => "升级",
            Action::Remove => "卸载",
        };
        write!(f, "{}", s)
    }
}

pub fn plan_action(observed: &Observed, desired: &Ensure) -> Action {
    match (desired, observed) {
        (Ensure::Absent, Observed::Installed(_)) => Action::Remove,
        (Ensure::Absent, Observed::Absent { .. }) => Action::None,
        (Ensure::Present | Ensure::Latest | Ensure::Version(_), Observed::Absent { .. }) => {
            Action::Install
        }
        (Ensure::Present, Observed::Installed(_)) => Action::None,
        (Ensure::Latest, Observed::Installed(record)) => {
            if record.has_update() {
                Action::Update
            } else {
                Action::None
            }
        }
        (Ensure::Version(version), Observed::Installed(record)) => {
            if record.version == *version {
                Action::None
            } else {
                Action::Install
            }
        }
    }
}

/// 单个资源的处理结果
#[derive(Debug, Clone)]
pub struct Outcome {
    pub name: String,
    pub desired: Ensure,
    /// 执行前观测到的状态 (版本号或 "absent")
    pub before: String,
    pub action: Action,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Summary {
    pub dry_run: bool,
    pub outcomes: Vec<Outcome>,
}

impl Summary {
    /// 需要动作的资源数（dry-run 下即计划变更数）
    pub fn planned(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.action != Action::None && o.error.is_none())
            .count()
    }

    /// 实际执行成功的变更数，dry-run 下始终为 0
    pub fn changed(&self) -> usize {
        if self.dry_run {
            0
        } else {
            self.planned()
        }
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.error.is_some()).count()
    }

    /// 纯文本报告
    pub fn render(&self) -> String {
        let mut out = String::new();
        if self.dry_run {
            out.push_str("(dry-run，未执行任何变更)\n\n");
        }
        for o in &self.outcomes {
            out.push_str(&format!(
                "- {}: {} -> {} [{}]",
                o.name, o.before, o.desired, o.action
            ));
            if let Some(err) = &o.error {
                out.push_str(&format!("\n    失败: {}", err.replace('\n', "\n    ")));
            }
            out.push('\n');
        }
        if self.dry_run {
            out.push_str(&format!(
                "\n共 {} 个资源，计划变更 {} 个，失败 {} 个\n",
                self.outcomes.len(),
                self.planned(),
                self.failed()
            ));
        } else {
            out.push_str(&format!(
                "\n共 {} 个资源，变更 {} 个，失败 {} 个\n",
                self.outcomes.len(),
                self.changed(),
                self.failed()
            ));
        }
        out
    }
}

/// 对所有资源执行一次收敛
///
/// 先做一次批量预取，预取未命中的资源再单独查询。
/// 某个资源失败不会中断其他资源，失败记录在 Summary 中。
pub fn run<E: Executor>(pkg: &PkgNg<E>, resources: &[Resource], dry_run: bool) -> Summary {
    let names: Vec<&str> = resources.iter().map(|r| r.name.as_str()).collect();
    let prefetched = pkg.prefetch(&names);

    let mut summary = Summary {
        dry_run,
        outcomes: Vec::with_capacity(resources.len()),
    };

    for resource in resources {
        let observed = match prefetched.get(&resource.name).cloned().flatten() {
            Some(record) => Observed::Installed(record),
            None => pkg.query(&resource.name),
        };
        let action = plan_action(&observed, &resource.ensure);
        log::debug!(
            "{}: 当前 {} ({}), 期望 {}, 动作 {:?}",
            resource.name,
            observed.ensure(),
            observed.status(),
            resource.ensure,
            action
        );

        let error = if dry_run || action == Action::None {
            None
        } else {
            apply(pkg, resource, &observed, action).err()
        };
        if let Some(err) = &error {
            log::error!("{} {}失败: {}", resource.name, action, err);
        }

        summary.outcomes.push(Outcome {
            name: resource.name.clone(),
            desired: resource.ensure.clone(),
            before: observed.ensure().to_string(),
            action,
            error,
        });
    }

    summary
}

fn apply<E: Executor>(
    pkg: &PkgNg<E>,
    resource: &Resource,
    observed: &Observed,
    action: Action,
) -> Result<(), String> {
    let source = resource.source.as_deref();
    let result = match action {
        Action::None => return Ok(()),
        Action::Install => pkg.install(&resource.name, &resource.ensure, source),
        Action::Update => pkg.update(&resource.name, &resource.ensure, source),
        Action::Remove => {
            if observed.name() != resource.name {
                log::warn!(
                    "{} 是通过 origin 匹配到的 {}，卸载仍使用配置中的名字",
                    resource.name,
                    observed.name()
                );
            }
            pkg.uninstall(&resource.name)
        }
    };
    result.map(|_| ()).map_err(|e| e.to_string())
}
