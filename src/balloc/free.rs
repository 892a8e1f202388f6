//! 块回收功能

use crate::{
    bitmap::*,
    block::BlockDevice,
    consts::NO_BLOCK,
    error::{Error, ErrorKind, Result},
    journal::JournalTrans,
};

/// 把一组块放回空闲块池
///
/// 只清除位图中的位，不清零块内容。
///
/// # 参数
///
/// * `trans` - 当前事务
/// * `blocks` - 要回收的块号
///
/// # 错误
///
/// 块号为哨兵、属于元数据区、越界或已经空闲时返回 `Corrupted`，
/// 此时位图不做任何修改。
pub fn reclaim_blocks<D: BlockDevice>(trans: &mut JournalTrans<'_, D>, blocks: &[u32]) -> Result<()> {
    if blocks.is_empty() {
        return Ok(());
    }

    let sb = *trans.superblock();
    let bitmap_lba = sb.block_bitmap() as u64;
    let mut bitmap = trans.read_block(bitmap_lba)?;

    for &block in blocks {
        if block == NO_BLOCK || sb.is_metadata_block(block) || block >= sb.total_blocks() {
            log::warn!("[BALLOC] refusing to reclaim block {}", block);
            return Err(Error::new(ErrorKind::Corrupted, "Reclaimed block number is invalid"));
        }
        if !test_bit(&bitmap, block) {
            log::warn!("[BALLOC] block {} is already free", block);
            return Err(Error::new(ErrorKind::Corrupted, "Block is already free"));
        }
        clear_bit(&mut bitmap, block)?;
    }

    trans.write_block(bitmap_lba, &bitmap)?;
    log::trace!("[BALLOC] reclaimed {} blocks", blocks.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::balloc::alloc_block;
    use crate::block::{BlockDev, MemDevice};
    use crate::fs::JfsFileSystem;

    fn formatted() -> (BlockDev<MemDevice>, crate::superblock::Superblock) {
        let fs = JfsFileSystem::format(MemDevice::new(128)).unwrap();
        let sb = *fs.superblock();
        (BlockDev::new(fs.unmount().unwrap()).unwrap(), sb)
    }

    #[test]
    fn test_reclaim_after_alloc() {
        let (mut bdev, sb) = formatted();

        let mut trans = JournalTrans::begin(&mut bdev, &sb).unwrap();
        let a = alloc_block(&mut trans).unwrap();
        let b = alloc_block(&mut trans).unwrap();
        trans.commit().unwrap();

        let mut trans = JournalTrans::begin(&mut bdev, &sb).unwrap();
        reclaim_blocks(&mut trans, &[a, b]).unwrap();
        let bitmap = trans.read_block(sb.block_bitmap() as u64).unwrap();
        assert!(!test_bit(&bitmap, a));
        assert!(!test_bit(&bitmap, b));
    }

    #[test]
    fn test_double_reclaim_rejected() {
        let (mut bdev, sb) = formatted();
        let mut trans = JournalTrans::begin(&mut bdev, &sb).unwrap();
        let a = alloc_block(&mut trans).unwrap();

        let err = reclaim_blocks(&mut trans, &[a, a]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Corrupted);
    }

    #[test]
    fn test_reclaim_metadata_rejected() {
        let (mut bdev, sb) = formatted();
        let mut trans = JournalTrans::begin(&mut bdev, &sb).unwrap();

        for block in [0, sb.block_bitmap(), NO_BLOCK, sb.total_blocks()] {
            let err = reclaim_blocks(&mut trans, &[block]).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Corrupted);
        }
    }
}
