//! Inode 分配

use crate::{
    bitmap::*,
    block::BlockDevice,
    error::{Error, ErrorKind, Result},
    journal::JournalTrans,
};

/// 分配一个空闲 inode
///
/// 只修改 inode 位图；调用者负责写入 inode 记录。
///
/// # 返回
///
/// 分配的 inode 编号；没有空闲 inode 时返回 `NoSpace`
pub fn alloc_inode<D: BlockDevice>(trans: &mut JournalTrans<'_, D>) -> Result<u32> {
    let sb = *trans.superblock();
    let bitmap_lba = sb.inode_bitmap() as u64;
    let mut bitmap = trans.read_block(bitmap_lba)?;

    let ino = find_first_zero(&bitmap, 1, sb.inode_count())
        .ok_or(Error::new(ErrorKind::NoSpace, "No free inodes"))?;
    set_bit(&mut bitmap, ino)?;
    trans.write_block(bitmap_lba, &bitmap)?;

    log::trace!("[IALLOC] allocated inode {}", ino);
    Ok(ino)
}

/// 统计空闲 inode 数
pub fn free_inodes_count(bitmap: &[u8], inode_count: u32) -> u32 {
    count_zeros(bitmap, 1, inode_count)
}
