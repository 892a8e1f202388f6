//! CRC32 校验和计算
//!
//! 为 journal commit block 的完整性字段提供校验和计算功能

/// 计算 CRC32 校验和
///
/// # 参数
/// * `data` - 要计算校验和的数据
///
/// # 返回
/// CRC32 值
#[inline]
pub fn crc32(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc32_basic() {
        // IEEE CRC32 标准测试向量
        assert_eq!(crc32(b"123456789"), 0xCBF4_3926);
        assert_ne!(crc32(b"hello world"), crc32(b"hello worle"));
    }
}
