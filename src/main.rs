mod config;
mod converge;
mod error;
mod package_manager;
mod report;
mod rest;
mod sysinfo;

use anyhow::Result;
use config::{Config, Manifest};
use package_manager::{PkgCommand, PkgNg};
use report::ReportSaver;
use sysinfo::SystemInfo;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let config = Config::load_or_default()?;

    let system = SystemInfo::detect();
    if !system.is_supported() {
        log::warn!("pkg(8) 只支持 FreeBSD / DragonFly，当前系统: {}", system.os);
    }

    let mut resources = config.packages.clone();
    if let Some(url) = &config.manifest_url {
        let manifest = Manifest::fetch(url, &config.http).await?;
        resources.extend(manifest.packages);
    }
    if resources.is_empty() {
        log::info!("没有需要管理的包");
        return Ok(());
    }

    let pkg_command = PkgCommand::detect(&config.pkg_path, config.command_timeout())?;

    // pkg install / remove 需要 root
    let is_root = unsafe { libc::geteuid() } == 0;
    if !config.dry_run && !is_root {
        log::warn!("当前不是 root 用户，安装和卸载可能失败");
    }

    let dry_run = config.dry_run;
    let summary = tokio::task::spawn_blocking(move || {
        let pkg = PkgNg::new(pkg_command);
        converge::run(&pkg, &resources, dry_run)
    })
    .await?;

    let text = summary.render();
    print!("{}", text);

    match ReportSaver::new(config.report_dir.clone()).save(&text, &system.describe()) {
        Ok(path) => log::info!("报告已保存: {}", path.display()),
        Err(e) => log::warn!("保存报告失败: {}", e),
    }

    if summary.failed() > 0 {
        anyhow::bail!("{} 个资源收敛失败", summary.failed());
    }

    Ok(())
}
