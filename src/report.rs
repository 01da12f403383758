use anyhow::Result;
use chrono::Local;
use std::fs;
use std::path::PathBuf;

pub struct ReportSaver {
    base_dir: PathBuf,
}

impl ReportSaver {
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn save(&self, content: &str, host: &str) -> Result<PathBuf> {
        let now = Local::now();

        // 目录结构: YYYY/MM/DD/
        let dir = self
            .base_dir
            .join(now.format("%Y").to_string())
            .join(now.format("%m").to_string())
            .join(now.format("%d").to_string());
        fs::create_dir_all(&dir)?;

        // 文件名: HH-mm.md
        let filepath = dir.join(now.format("%H-%M.md").to_string());

        let mut full_content = String::new();
        full_content.push_str(&format!(
            "{} 收敛报告\n生成时间: {}\n\n",
            host,
            now.format("%Y-%m-%d %H:%M:%S")
        ));
        full_content.push_str(content);

        fs::write(&filepath, full_content)?;

        Ok(filepath)
    }
}
