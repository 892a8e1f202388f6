//! Inode 回收

use crate::{
    bitmap::*,
    block::BlockDevice,
    consts::JFS_NULL_INODE,
    error::{Error, ErrorKind, Result},
    inode::{store_inode, Inode},
    journal::JournalTrans,
};

/// 把 inode 放回空闲 inode 池
///
/// 同时把 inode 记录重置为空（类型空闲、大小 0、指针全为哨兵），
/// 两处修改在同一个事务中提交。
///
/// # 参数
///
/// * `trans` - 当前事务
/// * `ino` - 要回收的 inode 编号
///
/// # 错误
///
/// inode 编号无效、是根目录或已经空闲时返回 `Corrupted`
pub fn reclaim_inode<D: BlockDevice>(trans: &mut JournalTrans<'_, D>, ino: u32) -> Result<()> {
    let sb = *trans.superblock();
    if ino == JFS_NULL_INODE || ino == sb.root_inode() || ino >= sb.inode_count() {
        log::warn!("[IALLOC] refusing to reclaim inode {}", ino);
        return Err(Error::new(ErrorKind::Corrupted, "Reclaimed inode number is invalid"));
    }

    let bitmap_lba = sb.inode_bitmap() as u64;
    let was_used = trans.modify_block(bitmap_lba, |bitmap| -> Result<bool> {
        let used = test_bit(bitmap, ino);
        if used {
            clear_bit(bitmap, ino)?;
        }
        Ok(used)
    })??;
    if !was_used {
        log::warn!("[IALLOC] inode {} is already free", ino);
        return Err(Error::new(ErrorKind::Corrupted, "Inode is already free"));
    }

    store_inode(trans, ino, &Inode::empty())?;
    log::trace!("[IALLOC] reclaimed inode {}", ino);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{BlockDev, MemDevice};
    use crate::fs::JfsFileSystem;
    use crate::ialloc::alloc_inode;
    use crate::inode::{load_inode, InodeType};

    #[test]
    fn test_reclaim_resets_inode() {
        let fs = JfsFileSystem::format(MemDevice::new(128)).unwrap();
        let sb = *fs.superblock();
        let mut bdev = BlockDev::new(fs.unmount().unwrap()).unwrap();

        let mut trans = JournalTrans::begin(&mut bdev, &sb).unwrap();
        let ino = alloc_inode(&mut trans).unwrap();
        let mut inode = Inode::empty();
        inode.itype = InodeType::File;
        inode.size = 10;
        inode.blockptrs[0] = 40;
        store_inode(&mut trans, ino, &inode).unwrap();

        reclaim_inode(&mut trans, ino).unwrap();
        assert_eq!(load_inode(&mut trans, ino).unwrap(), Inode::empty());

        let bitmap = trans.read_block(sb.inode_bitmap() as u64).unwrap();
        assert!(!test_bit(&bitmap, ino));

        let err = reclaim_inode(&mut trans, ino).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Corrupted);
    }

    #[test]
    fn test_reclaim_root_rejected() {
        let fs = JfsFileSystem::format(MemDevice::new(128)).unwrap();
        let sb = *fs.superblock();
        let mut bdev = BlockDev::new(fs.unmount().unwrap()).unwrap();
        let mut trans = JournalTrans::begin(&mut bdev, &sb).unwrap();

        for ino in [0, sb.root_inode(), sb.inode_count()] {
            assert_eq!(reclaim_inode(&mut trans, ino).unwrap_err().kind(), ErrorKind::Corrupted);
        }
    }
}
