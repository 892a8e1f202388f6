//! 目录写操作
//!
//! 两个操作都只改写内存中的目录块，由调用者放回事务并更新目录 inode 的大小。

use super::entry::{find_entry, write_entry};
use crate::{
    consts::*,
    error::{Error, ErrorKind, Result},
};

/// 从目录块中删除目录项
///
/// 把目录项之后的有效字节整体左移覆盖它。块的分配大小不变，
/// 新有效末尾之后的字节保持原样（内容无意义）。
///
/// # 参数
///
/// * `block` - 目录块数据
/// * `live_len` - 目录有效长度
/// * `name` - 要删除的名称
///
/// # 返回
///
/// 被删除目录项的 `entry_len`；名称不存在时返回 `NotFound`
pub fn remove_entry(block: &mut [u8], live_len: usize, name: &str) -> Result<u16> {
    let live_len = live_len.min(block.len());
    let entry = find_entry(block, live_len, name)?
        .ok_or(Error::new(ErrorKind::NotFound, "Directory entry not found"))?;

    let start = entry.offset;
    let end = start + entry.entry_len as usize;
    block.copy_within(end..live_len, start);

    log::trace!(
        "[DIR] removed '{}' at offset {} ({} bytes), live length now {}",
        name,
        start,
        entry.entry_len,
        live_len - entry.entry_len as usize
    );
    Ok(entry.entry_len)
}

/// 在有效末尾追加目录项
///
/// # 参数
///
/// * `block` - 目录块数据
/// * `live_len` - 目录有效长度
/// * `name` - 名称（1..=255 字节，不含 `/`）
/// * `inode` - 子 inode 编号
/// * `file_type` - 目录项类型
///
/// # 返回
///
/// 新目录项的 `entry_len`；块内放不下时返回 `NoSpace`
pub fn append_entry(block: &mut [u8], live_len: usize, name: &str, inode: u32, file_type: u8) -> Result<u16> {
    if name.is_empty() || name.len() > MAX_FILENAME_LEN || name.contains('/') {
        return Err(Error::new(ErrorKind::InvalidInput, "Invalid directory entry name"));
    }

    let entry_len = DIR_ENTRY_HEADER_LEN + name.len();
    if live_len + entry_len > block.len() {
        return Err(Error::new(ErrorKind::NoSpace, "Directory block is full"));
    }

    write_entry(block, live_len, entry_len as u16, name, inode, file_type);
    Ok(entry_len as u16)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dir::read_entries;
    use alloc::vec;

    /// a(20) b(24) c(18)，总有效长度 62
    fn abc_block() -> alloc::vec::Vec<u8> {
        let mut block = vec![0u8; JFS_BLOCK_SIZE];
        write_entry(&mut block, 0, 20, "a", 10, DT_FILE);
        write_entry(&mut block, 20, 24, "b", 11, DT_FILE);
        write_entry(&mut block, 44, 18, "c", 12, DT_DIRECTORY);
        block
    }

    #[test]
    fn test_remove_middle_entry() {
        let mut block = abc_block();
        let before = block.clone();

        let removed = remove_entry(&mut block, 62, "b").unwrap();
        assert_eq!(removed, 24);

        let entries = read_entries(&block, 38).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!((entries[0].name.as_str(), entries[0].offset, entries[0].inode), ("a", 0, 10));
        assert_eq!((entries[1].name.as_str(), entries[1].offset, entries[1].inode), ("c", 20, 12));
        assert!(entries[1].is_dir());

        // a 原样保留，c 左移 24 字节
        assert_eq!(&block[..20], &before[..20]);
        assert_eq!(&block[20..38], &before[44..62]);
    }

    #[test]
    fn test_remove_first_and_last() {
        let mut block = abc_block();
        assert_eq!(remove_entry(&mut block, 62, "c").unwrap(), 18);
        assert_eq!(remove_entry(&mut block, 44, "a").unwrap(), 20);

        let entries = read_entries(&block, 24).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "b");
        assert_eq!(entries[0].offset, 0);
    }

    #[test]
    fn test_remove_missing_is_not_found() {
        let mut block = abc_block();
        let err = remove_entry(&mut block, 62, "zzz").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_stale_tail_not_matched() {
        let mut block = abc_block();
        remove_entry(&mut block, 62, "c").unwrap();
        // c 的字节仍在块里，但已经在有效长度之外
        let err = remove_entry(&mut block, 44, "c").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_append_entry() {
        let mut block = abc_block();
        let len = append_entry(&mut block, 62, "hello", 13, DT_FILE).unwrap();
        assert_eq!(len, 13);

        let entries = read_entries(&block, 75).unwrap();
        assert_eq!(entries[3].name, "hello");
        assert_eq!(entries[3].offset, 62);
    }

    #[test]
    fn test_append_rejects_bad_names_and_full_block() {
        let mut block = vec![0u8; JFS_BLOCK_SIZE];
        assert_eq!(
            append_entry(&mut block, 0, "a/b", 3, DT_FILE).unwrap_err().kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(
            append_entry(&mut block, 0, "", 3, DT_FILE).unwrap_err().kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(
            append_entry(&mut block, 500, "abcdefgh", 3, DT_FILE).unwrap_err().kind(),
            ErrorKind::NoSpace
        );
    }
}
