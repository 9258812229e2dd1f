use crate::error::{AppError, AppResult};
use regex::Regex;
use std::sync::OnceLock;

fn phone_regex() -> &'static Regex {
    static PHONE_REGEX: OnceLock<Regex> = OnceLock::new();
    PHONE_REGEX.get_or_init(|| Regex::new(r"^1[3-9]\d{9}$").expect("valid phone regex"))
}

/// 校验手机号格式（11 位大陆手机号）
pub fn validate_phone(phone: &str) -> AppResult<()> {
    if !phone_regex().is_match(phone) {
        return Err(AppError::ValidationError(
            "Invalid phone number format".to_string(),
        ));
    }

    Ok(())
}

/// 规范化手机号：去掉首尾空白与 +86 前缀
pub fn normalize_phone(phone: &str) -> String {
    let trimmed = phone.trim();
    trimmed
        .strip_prefix("+86")
        .map(str::trim)
        .unwrap_or(trimmed)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("13812345678").is_ok());
        assert!(validate_phone("19912345678").is_ok());
        assert!(validate_phone("12812345678").is_err());
        assert!(validate_phone("1381234567").is_err());
        assert!(validate_phone("abc").is_err());
    }

    #[test]
    fn test_normalize_phone() {
        assert_eq!(normalize_phone(" 13812345678 "), "13812345678");
        assert_eq!(normalize_phone("+86 13812345678"), "13812345678");
        assert_eq!(normalize_phone("+8613812345678"), "13812345678");
    }
}
