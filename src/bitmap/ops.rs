//! Bitmap 操作实现

use crate::error::{Error, ErrorKind, Result};

/// 测试位图中某一位是否被设置
///
/// # 参数
///
/// * `bitmap` - 位图数据
/// * `index` - 位索引（从 0 开始）
///
/// # 返回
///
/// 如果位被设置返回 true；索引越界视为未设置
pub fn test_bit(bitmap: &[u8], index: u32) -> bool {
    let byte_index = (index / 8) as usize;
    let bit_offset = (index % 8) as u8;

    if byte_index >= bitmap.len() {
        return false;
    }

    (bitmap[byte_index] & (1 << bit_offset)) != 0
}

/// 设置位图中的某一位
pub fn set_bit(bitmap: &mut [u8], index: u32) -> Result<()> {
    let byte_index = (index / 8) as usize;
    let bit_offset = (index % 8) as u8;

    if byte_index >= bitmap.len() {
        return Err(Error::new(ErrorKind::InvalidInput, "Bitmap index out of range"));
    }

    bitmap[byte_index] |= 1 << bit_offset;
    Ok(())
}

/// 清除位图中的某一位
pub fn clear_bit(bitmap: &mut [u8], index: u32) -> Result<()> {
    let byte_index = (index / 8) as usize;
    let bit_offset = (index % 8) as u8;

    if byte_index >= bitmap.len() {
        return Err(Error::new(ErrorKind::InvalidInput, "Bitmap index out of range"));
    }

    bitmap[byte_index] &= !(1 << bit_offset);
    Ok(())
}

/// 在 `[start, end)` 中查找第一个空闲位（值为 0）
pub fn find_first_zero(bitmap: &[u8], start: u32, end: u32) -> Option<u32> {
    let end = end.min((bitmap.len() * 8) as u32);
    (start..end).find(|&i| !test_bit(bitmap, i))
}

/// 统计 `[start, end)` 中空闲的位数
pub fn count_zeros(bitmap: &[u8], start: u32, end: u32) -> u32 {
    let end = end.min((bitmap.len() * 8) as u32);
    if start >= end {
        return 0;
    }
    (start..end).filter(|&i| !test_bit(bitmap, i)).count() as u32
}

/// 批量设置 `[start, start + count)`
pub fn set_bits(bitmap: &mut [u8], start: u32, count: u32) -> Result<()> {
    for i in start..start.saturating_add(count) {
        set_bit(bitmap, i)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_clear_bit() {
        let mut bitmap = [0u8; 4];

        set_bit(&mut bitmap, 0).unwrap();
        set_bit(&mut bitmap, 9).unwrap();
        assert_eq!(bitmap[0], 0x01);
        assert_eq!(bitmap[1], 0x02);
        assert!(test_bit(&bitmap, 9));

        clear_bit(&mut bitmap, 9).unwrap();
        assert!(!test_bit(&bitmap, 9));
    }

    #[test]
    fn test_out_of_range() {
        let mut bitmap = [0u8; 2];
        assert!(set_bit(&mut bitmap, 16).is_err());
        assert!(clear_bit(&mut bitmap, 100).is_err());
        assert!(!test_bit(&bitmap, 100));
    }

    #[test]
    fn test_find_and_count() {
        let mut bitmap = [0u8; 2];
        set_bits(&mut bitmap, 0, 5).unwrap();

        assert_eq!(find_first_zero(&bitmap, 0, 16), Some(5));
        assert_eq!(find_first_zero(&bitmap, 0, 5), None);
        assert_eq!(count_zeros(&bitmap, 0, 16), 11);
        assert_eq!(count_zeros(&bitmap, 3, 8), 3);
    }
}
