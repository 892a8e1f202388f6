//! 块分配功能

use crate::{
    bitmap::*,
    block::BlockDevice,
    error::{Error, ErrorKind, Result},
    journal::JournalTrans,
};

/// 从空闲块池中取出一个块
///
/// 从第一个数据块开始找第一个空闲位。不清零块内容。
///
/// # 返回
///
/// 分配的块号；没有空闲块时返回 `NoSpace`
pub fn alloc_block<D: BlockDevice>(trans: &mut JournalTrans<'_, D>) -> Result<u32> {
    let sb = *trans.superblock();
    let bitmap_lba = sb.block_bitmap() as u64;
    let mut bitmap = trans.read_block(bitmap_lba)?;

    let block = find_first_zero(&bitmap, sb.first_data_block(), sb.total_blocks())
        .ok_or(Error::new(ErrorKind::NoSpace, "No free blocks"))?;
    set_bit(&mut bitmap, block)?;
    trans.write_block(bitmap_lba, &bitmap)?;

    log::trace!("[BALLOC] allocated block {}", block);
    Ok(block)
}

/// 统计空闲块数
pub fn free_blocks_count(bitmap: &[u8], first_data_block: u32, total_blocks: u32) -> u32 {
    count_zeros(bitmap, first_data_block, total_blocks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{BlockDev, MemDevice};
    use crate::fs::{FsConfig, JfsFileSystem};
    use alloc::vec;
    use alloc::vec::Vec;

    #[test]
    fn test_alloc_until_exhausted() {
        let config = FsConfig { inode_count: 16, ..FsConfig::default() };
        let fs = JfsFileSystem::format_with(MemDevice::new(24), config).unwrap();
        let sb = *fs.superblock();
        let mut bdev = BlockDev::new(fs.unmount().unwrap()).unwrap();

        // 16 个 inode 占 2 块：数据区从 5 开始，根目录 1 块，journal 14 块
        let mut trans = JournalTrans::begin(&mut bdev, &sb).unwrap();
        let mut allocated = Vec::new();
        loop {
            match alloc_block(&mut trans) {
                Ok(block) => allocated.push(block),
                Err(e) => {
                    assert_eq!(e.kind(), ErrorKind::NoSpace);
                    break;
                }
            }
        }
        assert_eq!(allocated, vec![20, 21, 22, 23]);
    }
}
