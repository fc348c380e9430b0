//! Service order numbers
//!
//! 外部报表工具依赖 `SO-` + 6 位补零格式，不可更改。

/// `SO-001001`
pub fn format_service_order(number: i64) -> String {
    format!("SO-{:06}", number)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_padded() {
        assert_eq!(format_service_order(1001), "SO-001001");
        assert_eq!(format_service_order(7), "SO-000007");
    }

    #[test]
    fn test_wide_numbers_are_not_truncated() {
        assert_eq!(format_service_order(1_234_567), "SO-1234567");
    }
}
