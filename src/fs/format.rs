//! 格式化
//!
//! 新卷的布局：
//!
//! ```text
//! | 0: superblock | 1: 块位图 | 2: inode 位图 | 3..: inode 表 | 根目录块 | journal 块 x14 | 数据块 ... |
//! ```
//!
//! 格式化使用原始块写入（不经过 journal），最后 flush 一次。

use super::{filesystem::JfsFileSystem, types::FsConfig};
use crate::{
    bitmap::set_bits,
    block::{Block, BlockDev, BlockDevice},
    consts::*,
    dir::append_entry,
    error::{Error, ErrorKind, Result},
    inode::{inode_to_block, Inode, InodeType},
    superblock::Superblock,
};
use alloc::vec;

/// 根目录之后的第一个 inode 留给 journal 文件
const JOURNAL_INODE: u32 = JFS_ROOT_INODE + 1;

impl<D: BlockDevice> JfsFileSystem<D> {
    /// 使用默认配置格式化设备并挂载
    pub fn format(device: D) -> Result<Self> {
        Self::format_with(device, FsConfig::default())
    }

    /// 格式化设备并挂载
    ///
    /// 写入 superblock、两个位图、inode 表、只包含 `.log` 的根目录，
    /// 以及 journal 文件的全部块。
    ///
    /// # 错误
    ///
    /// - `InvalidInput` - 设备块大小不是 512，或者 inode 数量不合法
    /// - `NoSpace` - 设备放不下元数据、根目录和 journal
    pub fn format_with(device: D, config: FsConfig) -> Result<Self> {
        let mut bdev = BlockDev::new_with_cache(device, config.cache_blocks)?;
        if bdev.block_size() as usize != JFS_BLOCK_SIZE {
            return Err(Error::new(ErrorKind::InvalidInput, "Device block size must be 512"));
        }

        let total_blocks = bdev.total_blocks().min(JFS_BITMAP_BITS as u64) as u32;
        let sb = Superblock::new(total_blocks, config.inode_count)?;

        let root_block = sb.first_data_block();
        let journal_first = root_block + 1;
        let reserved_end = journal_first + INODE_BLOCK_PTRS as u32;
        if reserved_end > total_blocks {
            return Err(Error::new(ErrorKind::NoSpace, "Volume too small for root directory and journal"));
        }

        sb.write(&mut bdev)?;
        write_block_bitmap(&mut bdev, &sb, reserved_end)?;
        write_inode_bitmap(&mut bdev, &sb)?;

        let zero = vec![0u8; JFS_BLOCK_SIZE];
        for i in 0..sb.inode_table_blocks() {
            bdev.write_block((sb.inode_table() + i) as u64, &zero)?;
        }

        let mut journal = Inode::empty();
        journal.itype = InodeType::File;
        journal.size = (INODE_BLOCK_PTRS * JFS_BLOCK_SIZE) as u32;
        for (i, ptr) in journal.blockptrs.iter_mut().enumerate() {
            *ptr = journal_first + i as u32;
        }
        for &block in journal.blockptrs.iter() {
            // 全零块不带魔数，恢复时视为普通块
            bdev.write_block(block as u64, &zero)?;
        }

        let mut root_dir = Block::get_noread(&mut bdev, root_block as u64)?;
        let root_len = root_dir.with_data_mut(|data| {
            append_entry(data, 0, JFS_JOURNAL_NAME, JOURNAL_INODE, DT_FILE)
        })??;
        root_dir.release()?;

        let mut root = Inode::empty();
        root.itype = InodeType::Directory;
        root.size = root_len as u32;
        root.blockptrs[0] = root_block;

        write_inode_raw(&mut bdev, &sb, sb.root_inode(), &root)?;
        write_inode_raw(&mut bdev, &sb, JOURNAL_INODE, &journal)?;

        bdev.flush()?;
        log::info!(
            "[FS] formatted volume: {} blocks, {} inodes, journal at blocks {}..{}",
            total_blocks,
            sb.inode_count(),
            journal_first,
            reserved_end
        );

        Ok(Self {
            bdev,
            sb,
            journal_ino: JOURNAL_INODE,
            recovered: true,
        })
    }
}

/// 元数据、根目录块和 journal 块标记为已用；超出卷的位也置位，永远不会被分配
fn write_block_bitmap<D: BlockDevice>(bdev: &mut BlockDev<D>, sb: &Superblock, reserved_end: u32) -> Result<()> {
    let mut block = Block::get_noread(bdev, sb.block_bitmap() as u64)?;
    block.with_data_mut(|bitmap| {
        set_bits(bitmap, 0, reserved_end)?;
        set_bits(bitmap, sb.total_blocks(), JFS_BITMAP_BITS - sb.total_blocks())
    })??;
    block.release()
}

/// inode 0（保留）、根目录和 journal 标记为已用
fn write_inode_bitmap<D: BlockDevice>(bdev: &mut BlockDev<D>, sb: &Superblock) -> Result<()> {
    let mut block = Block::get_noread(bdev, sb.inode_bitmap() as u64)?;
    block.with_data_mut(|bitmap| {
        set_bits(bitmap, 0, JOURNAL_INODE + 1)?;
        set_bits(bitmap, sb.inode_count(), JFS_BITMAP_BITS - sb.inode_count())
    })??;
    block.release()
}

fn write_inode_raw<D: BlockDevice>(bdev: &mut BlockDev<D>, sb: &Superblock, ino: u32, inode: &Inode) -> Result<()> {
    let (lba, offset) = inode_to_block(sb, ino)?;
    let mut block = Block::get(bdev, lba)?;
    block.with_data_mut(|data| inode.encode(&mut data[offset..offset + INODE_SIZE]))?;
    block.release()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::MemDevice;
    use crate::journal::JournalFile;

    #[test]
    fn test_format_layout() {
        let mut fs = JfsFileSystem::format(MemDevice::new(128)).unwrap();
        let sb = *fs.superblock();
        assert!(fs.is_recovered());
        assert_eq!(sb.first_data_block(), 11);

        let journal = JournalFile::locate(&mut fs.bdev, &sb).unwrap();
        assert_eq!(journal.ino(), JOURNAL_INODE);
        assert_eq!(journal.capacity(), INODE_BLOCK_PTRS);
        assert_eq!(journal.slots()[0], 12);
        assert_eq!(journal.slots()[13], 25);

        for block in 0..26 {
            assert!(!fs.is_block_free(block).unwrap());
        }
        assert!(fs.is_block_free(26).unwrap());
        assert!(!fs.is_inode_free(0).unwrap());
        assert!(!fs.is_inode_free(JOURNAL_INODE).unwrap());
        assert!(fs.is_inode_free(JOURNAL_INODE + 1).unwrap());

        let root = fs.stat("/").unwrap();
        assert_eq!(root.size as usize, DIR_ENTRY_HEADER_LEN + JFS_JOURNAL_NAME.len());
        assert_eq!(root.blocks, vec![11]);
    }

    #[test]
    fn test_format_too_small() {
        let err = JfsFileSystem::format(MemDevice::new(20)).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::NoSpace);
    }

    #[test]
    fn test_format_is_durable() {
        let fs = JfsFileSystem::format(MemDevice::new(64)).unwrap();
        // 即使不卸载，格式化的内容也已经写到设备上
        let device = fs.into_device();
        let mut fs = JfsFileSystem::mount(device).unwrap();
        assert_eq!(fs.read_dir("/").unwrap().len(), 1);
    }
}
