//! Remote path utility functions / 远程路径工具函数

/// Clean and normalize path / 清理和规范化路径
/// 1. Replace backslashes with forward slashes / 将反斜杠替换为正斜杠
/// 2. Ensure path starts with / / 确保路径以 / 开头
/// 3. Clean . and .. in path / 清理路径中的 . 和 ..
pub fn fix_and_clean_path(path: &str) -> String {
    let path = path.replace('\\', "/");
    let mut parts: Vec<&str> = Vec::new();

    for part in path.split('/') {
        match part {
            "" | "." => continue,
            ".." => {
                parts.pop();
            }
            _ => parts.push(part),
        }
    }

    if parts.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", parts.join("/"))
    }
}

/// Join a remote directory and a relative item path / 拼接远程目录与相对路径
pub fn join_path(dir: &str, path: &str) -> String {
    fix_and_clean_path(&format!("{}/{}", dir, path))
}

/// Path relative to the remote root, without leading slash / 去掉开头斜杠的相对路径
pub fn relative_path(path: &str) -> String {
    fix_and_clean_path(path).trim_start_matches('/').to_string()
}

/// Parent of a relative path ("" for top level) / 父路径
pub fn parent_path(path: &str) -> &str {
    match path.trim_end_matches('/').rfind('/') {
        Some(pos) => &path[..pos],
        None => "",
    }
}

/// Last path component / 最后一级名称
pub fn base_name(path: &str) -> &str {
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(path)
}
