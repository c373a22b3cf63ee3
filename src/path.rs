//! Path processing utility functions / 路径处理工具函数
//!
//! Paths handed to the filesystem are normalized into backend keys:
//! slash-delimited, no leading or trailing `/`, root is the empty string.

use crate::error::{FsError, FsResult};

/// Characters that can never appear in a path / 路径中禁止的字符
pub fn is_invalid_char(c: char) -> bool {
    (c as u32) < 0x20 || c == '\\' || c == '\u{7f}'
}

/// Normalize a path into a backend key / 规范化路径
/// 1. Reject control characters, backslash and DEL / 拒绝控制字符、反斜杠和DEL
/// 2. Drop empty and interior `.` segments, resolve `..` / 清理 . 和 ..
/// 3. Reject a trailing lone `.` / 拒绝以单独的 . 结尾
pub fn normalize(path: &str) -> FsResult<String> {
    if path.chars().any(is_invalid_char) {
        return Err(FsError::InvalidPath(path.to_string()));
    }

    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() || trimmed == "." {
        return Ok(String::new());
    }

    let segments: Vec<&str> = trimmed.split('/').filter(|s| !s.is_empty()).collect();
    let last = segments.len() - 1;
    let mut parts: Vec<&str> = Vec::with_capacity(segments.len());

    for (i, part) in segments.into_iter().enumerate() {
        match part {
            "." if i == last => return Err(FsError::InvalidPath(path.to_string())),
            "." => continue,
            ".." => {
                if parts.pop().is_none() {
                    return Err(FsError::InvalidPath(path.to_string()));
                }
            }
            _ => parts.push(part),
        }
    }

    Ok(parts.join("/"))
}

pub fn is_root(path: &str) -> bool {
    path.is_empty()
}

/// Join two normalized paths / 拼接路径
pub fn join(base: &str, name: &str) -> String {
    let name = name.trim_matches('/');
    match (base.is_empty(), name.is_empty()) {
        (true, _) => name.to_string(),
        (false, true) => base.to_string(),
        (false, false) => format!("{}/{}", base, name),
    }
}

/// Parent of a normalized path; the root's parent is the root / 父路径
pub fn dirname(path: &str) -> &str {
    match path.rfind('/') {
        Some(pos) => &path[..pos],
        None => "",
    }
}

/// Final segment of a normalized path / 文件名
pub fn basename(path: &str) -> &str {
    match path.rfind('/') {
        Some(pos) => &path[pos + 1..],
        None => path,
    }
}

/// Prefix under which every descendant of `path` is stored / 目录前缀
pub fn dir_prefix(path: &str) -> String {
    if path.is_empty() {
        String::new()
    } else {
        format!("{}/", path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("").unwrap(), "");
        assert_eq!(normalize(".").unwrap(), "");
        assert_eq!(normalize("/").unwrap(), "");
        assert_eq!(normalize("/./").unwrap(), "");
        assert_eq!(normalize("a/b/c").unwrap(), "a/b/c");
        assert_eq!(normalize("/a/b/c/").unwrap(), "a/b/c");
        assert_eq!(normalize("/a//b///c").unwrap(), "a/b/c");
        assert_eq!(normalize("a/./b/../c").unwrap(), "a/c");
        assert_eq!(normalize("file.").unwrap(), "file.");
        assert_eq!(normalize(".hidden").unwrap(), ".hidden");
    }

    #[test]
    fn test_normalize_rejects() {
        for bad in ["a\\b", "a\u{7f}", "a\nb", "\u{0}", "a/.", "a/b/./", "..", "a/../.."] {
            assert_eq!(
                normalize(bad),
                Err(FsError::InvalidPath(bad.to_string())),
                "{:?} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_normalize_idempotent() {
        for p in ["", ".", "/a/b/", "a//b/./c", "x/../y", "deep/er/../../z", "file.", "a/b.txt"] {
            let once = normalize(p).unwrap();
            assert_eq!(normalize(&once).unwrap(), once);
        }
    }

    #[test]
    fn test_join_dirname_basename() {
        assert_eq!(join("", "a"), "a");
        assert_eq!(join("a", "b"), "a/b");
        assert_eq!(join("a", ""), "a");
        assert_eq!(dirname("a/b/c"), "a/b");
        assert_eq!(dirname("a"), "");
        assert_eq!(dirname(""), "");
        assert_eq!(basename("a/b/c"), "c");
        assert_eq!(basename("a"), "a");
        assert_eq!(dir_prefix(""), "");
        assert_eq!(dir_prefix("a/b"), "a/b/");
    }
}
