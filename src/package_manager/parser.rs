//! 输出解析函数
//!
//! pkg 的文本输出格式只在这里解析，格式变化时只需改动本文件。

use super::types::InventoryEntry;
use std::collections::HashMap;

/// 解析 `pkg query '%n %v %o'` 的一行：`name version origin`
///
/// origin 是前两个字段之后的剩余部分，允许包含空格，原样保留。
/// 字段不足三个时返回 None，由调用方跳过。
pub fn parse_inventory_line(line: &str) -> Option<InventoryEntry> {
    let line = line.trim_end_matches(['\n', '\r']);

    let (name, rest) = line.trim_start().split_once(char::is_whitespace)?;
    let (version, origin) = rest.trim_start().split_once(char::is_whitespace)?;
    let origin = origin.trim_start();

    if name.is_empty() || version.is_empty() || origin.is_empty() {
        return None;
    }

    Some(InventoryEntry {
        name: name.to_string(),
        version: version.to_string(),
        origin: origin.to_string(),
    })
}

/// 解析 `pkg version -voRUL=` 的一行，返回 (origin, 远程版本)
///
/// 典型输出：
///   `www/curl                           <   needs updating (remote has 7.78.0)`
pub fn parse_update_line(line: &str) -> Option<(String, String)> {
    if line.starts_with(char::is_whitespace) {
        return None;
    }
    let (origin, rest) = line.split_once(char::is_whitespace)?;
    if origin.is_empty() {
        return None;
    }

    // 同一行出现多次时取最后一个完整的 "(remote has X)"
    const MARKER: &str = "(remote has ";
    let version = rest.rmatch_indices(MARKER).find_map(|(pos, _)| {
        let tail = &rest[pos + MARKER.len()..];
        let end = tail.find(')')?;
        let version = &tail[..end];
        if version.is_empty() {
            None
        } else {
            Some(version)
        }
    })?;

    Some((origin.to_string(), version.to_string()))
}

/// 解析整段更新检查输出，无法识别的行直接忽略
pub fn parse_update_output(output: &str) -> HashMap<String, String> {
    let mut updates = HashMap::new();
    for line in output.lines() {
        if let Some((origin, version)) = parse_update_line(line) {
            log::debug!("{} 可更新到 {}", origin, version);
            updates.insert(origin, version);
        }
    }
    updates
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_inventory_line() {
        let entry = parse_inventory_line("curl 7.77.0 ftp/curl\n").unwrap();
        assert_eq!(entry.name, "curl");
        assert_eq!(entry.version, "7.77.0");
        assert_eq!(entry.origin, "ftp/curl");
    }

    #[test]
    fn test_parse_inventory_line_origin_with_spaces() {
        let entry = parse_inventory_line("py39-foo 1.0_1 devel/py-foo with flavor").unwrap();
        assert_eq!(entry.name, "py39-foo");
        assert_eq!(entry.version, "1.0_1");
        assert_eq!(entry.origin, "devel/py-foo with flavor");
    }

    #[test]
    fn test_parse_inventory_line_malformed() {
        assert_eq!(parse_inventory_line(""), None);
        assert_eq!(parse_inventory_line("\n"), None);
        assert_eq!(parse_inventory_line("curl"), None);
        assert_eq!(parse_inventory_line("curl 7.77.0"), None);
        assert_eq!(parse_inventory_line("curl 7.77.0 "), None);
    }

    #[test]
    fn test_parse_update_line() {
        let line = "www/curl                           <   needs updating (remote has 7.78.0)";
        assert_eq!(
            parse_update_line(line),
            Some(("www/curl".to_string(), "7.78.0".to_string()))
        );
        assert_eq!(
            parse_update_line("sysutils/pkg < (remote has 1.17.5_1)\n"),
            Some(("sysutils/pkg".to_string(), "1.17.5_1".to_string()))
        );
    }

    #[test]
    fn test_parse_update_line_ignores_noise() {
        assert_eq!(parse_update_line("Updating FreeBSD repository catalogue..."), None);
        assert_eq!(parse_update_line("www/curl = up-to-date with remote"), None);
        assert_eq!(parse_update_line("   www/curl < (remote has 7.78.0)"), None);
        assert_eq!(parse_update_line("www/curl < (remote has )"), None);
        assert_eq!(parse_update_line("www/curl < (remote has 7.78.0"), None);
        assert_eq!(parse_update_line("www/curl"), None);
    }

    #[test]
    fn test_parse_update_output() {
        let output = "\
Updating FreeBSD repository catalogue...
FreeBSD repository is up to date.
www/curl                           <   needs updating (remote has 7.78.0)
security/openssl                   <   needs updating (remote has 1.1.1k,1)
";
        let updates = parse_update_output(output);
        assert_eq!(updates.len(), 2);
        assert_eq!(updates.get("www/curl").map(String::as_str), Some("7.78.0"));
        assert_eq!(
            updates.get("security/openssl").map(String::as_str),
            Some("1.1.1k,1")
        );
    }
}
