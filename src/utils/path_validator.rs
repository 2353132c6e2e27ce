use crate::models::{JinnError, JinnResult};
use std::path::Path;

/// 驗證 SSH config 檔名，去除目錄部分並防止路徑遍歷
pub fn sanitize_config_filename(input: &str) -> JinnResult<String> {
    let name = Path::new(input.trim())
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("")
        .to_string();

    // 檢查空值
    if name.is_empty() {
        return Err(JinnError::InvalidPath {
            message: "File name cannot be empty".to_string(),
        });
    }

    // 檢查特殊路徑名稱
    if name == "." || name == ".." {
        return Err(JinnError::InvalidPath {
            message: format!("Invalid file name: {}", name),
        });
    }

    // 只允許字母、數字、點、連字符、下劃線
    let is_valid = name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.');
    if !is_valid {
        return Err(JinnError::InvalidPath {
            message: "File name may only contain letters, numbers, dots, hyphens and underscores"
                .to_string(),
        });
    }

    // 檢查長度限制
    if name.len() > 255 {
        return Err(JinnError::InvalidPath {
            message: "File name too long (max 255 characters)".to_string(),
        });
    }

    Ok(name)
}

/// 驗證主機名，防止命令注入
pub fn validate_hostname(hostname: &str) -> JinnResult<()> {
    let invalid = || JinnError::InvalidHostname {
        hostname: hostname.to_string(),
    };

    if hostname.is_empty() || hostname.len() > 255 || hostname.starts_with('-') {
        return Err(invalid());
    }

    // 只允許安全字符：字母、數字、點、連字符、下劃線、冒號（IPv6）、方括號（IPv6）
    let is_valid = hostname.chars().all(|c| {
        c.is_ascii_alphanumeric()
            || c == '.'
            || c == '-'
            || c == '_'
            || c == ':'
            || c == '['
            || c == ']'
    });

    if !is_valid {
        return Err(invalid());
    }

    Ok(())
}

/// 驗證 SSH 使用者名稱
pub fn validate_ssh_user(user: &str) -> JinnResult<()> {
    let is_valid = !user.is_empty()
        && user.len() <= 64
        && !user.starts_with('-')
        && user
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_');

    if !is_valid {
        return Err(JinnError::InvalidHostname {
            hostname: format!("{}@", user),
        });
    }
    Ok(())
}
