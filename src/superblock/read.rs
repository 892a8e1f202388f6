//! Superblock 读取和验证

use crate::{
    block::{BlockDev, BlockDevice},
    consts::*,
    error::{Error, ErrorKind, Result},
};
use byteorder::{ByteOrder, LittleEndian};

/// Superblock 编码长度
pub const SUPERBLOCK_ENCODED_LEN: usize = 40;

/// jfs superblock
///
/// 磁盘布局（块 0，小端）：
///
/// | 偏移 | 字段 |
/// |------|------|
/// | 0  | magic |
/// | 4  | block_size |
/// | 8  | total_blocks |
/// | 12 | inode_count |
/// | 16 | block_bitmap |
/// | 20 | inode_bitmap |
/// | 24 | inode_table |
/// | 28 | inode_table_blocks |
/// | 32 | first_data_block |
/// | 36 | root_inode |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Superblock {
    pub(super) magic: u32,
    pub(super) block_size: u32,
    pub(super) total_blocks: u32,
    pub(super) inode_count: u32,
    pub(super) block_bitmap: u32,
    pub(super) inode_bitmap: u32,
    pub(super) inode_table: u32,
    pub(super) inode_table_blocks: u32,
    pub(super) first_data_block: u32,
    pub(super) root_inode: u32,
}

impl Superblock {
    /// 从块数据解码（不做验证）
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < SUPERBLOCK_ENCODED_LEN {
            return Err(Error::new(ErrorKind::InvalidInput, "superblock buffer too small"));
        }
        let field = |idx: usize| LittleEndian::read_u32(&buf[idx * 4..idx * 4 + 4]);

        Ok(Self {
            magic: field(0),
            block_size: field(1),
            total_blocks: field(2),
            inode_count: field(3),
            block_bitmap: field(4),
            inode_bitmap: field(5),
            inode_table: field(6),
            inode_table_blocks: field(7),
            first_data_block: field(8),
            root_inode: field(9),
        })
    }

    /// 从块设备加载并验证 superblock
    pub fn load<D: BlockDevice>(bdev: &mut BlockDev<D>) -> Result<Self> {
        let buf = bdev.read_block_vec(JFS_SUPERBLOCK_LBA)?;
        let sb = Self::decode(&buf)?;
        sb.check()?;

        if sb.total_blocks as u64 > bdev.total_blocks() {
            return Err(Error::new(ErrorKind::Corrupted, "Superblock describes more blocks than the device has"));
        }

        log::debug!(
            "[SB] loaded: blocks={} inodes={} first_data_block={}",
            sb.total_blocks,
            sb.inode_count,
            sb.first_data_block
        );
        Ok(sb)
    }

    /// 获取块大小
    pub fn block_size(&self) -> u32 {
        self.block_size
    }

    /// 获取总块数
    pub fn total_blocks(&self) -> u32 {
        self.total_blocks
    }

    /// 获取 inode 总数（包括保留的 0 号）
    pub fn inode_count(&self) -> u32 {
        self.inode_count
    }

    /// 块位图所在块
    pub fn block_bitmap(&self) -> u32 {
        self.block_bitmap
    }

    /// inode 位图所在块
    pub fn inode_bitmap(&self) -> u32 {
        self.inode_bitmap
    }

    /// inode 表起始块
    pub fn inode_table(&self) -> u32 {
        self.inode_table
    }

    /// inode 表占用块数
    pub fn inode_table_blocks(&self) -> u32 {
        self.inode_table_blocks
    }

    /// 第一个数据块（之前全部是元数据）
    pub fn first_data_block(&self) -> u32 {
        self.first_data_block
    }

    /// 根目录 inode 号
    pub fn root_inode(&self) -> u32 {
        self.root_inode
    }

    /// 块号是否属于固定元数据区（superblock、位图、inode 表）
    pub fn is_metadata_block(&self, block: u32) -> bool {
        block < self.first_data_block
    }

    /// 完整的 superblock 验证
    ///
    /// 检查魔数、块大小以及各区域的布局是否自洽。
    pub fn check(&self) -> Result<()> {
        if self.magic != JFS_SUPERBLOCK_MAGIC {
            return Err(Error::new(ErrorKind::Corrupted, "Invalid jfs superblock magic number"));
        }

        if self.block_size as usize != JFS_BLOCK_SIZE {
            return Err(Error::new(ErrorKind::Corrupted, "Unsupported block size"));
        }

        if self.total_blocks == 0 || self.total_blocks > JFS_BITMAP_BITS {
            return Err(Error::new(ErrorKind::Corrupted, "Superblock total_blocks out of range"));
        }

        // 0 号保留，1 号为根目录，至少还要放下 journal 文件
        if self.inode_count < 3 || self.inode_count > JFS_BITMAP_BITS {
            return Err(Error::new(ErrorKind::Corrupted, "Superblock inode_count out of range"));
        }

        if self.block_bitmap != JFS_BLOCK_BITMAP_LBA
            || self.inode_bitmap != JFS_INODE_BITMAP_LBA
            || self.inode_table != JFS_INODE_TABLE_LBA
        {
            return Err(Error::new(ErrorKind::Corrupted, "Unexpected metadata layout"));
        }

        let table_blocks = Self::table_blocks_for(self.inode_count);
        if self.inode_table_blocks != table_blocks
            || self.first_data_block != self.inode_table + table_blocks
            || self.first_data_block >= self.total_blocks
        {
            return Err(Error::new(ErrorKind::Corrupted, "Inode table layout inconsistent"));
        }

        if self.root_inode != JFS_ROOT_INODE {
            return Err(Error::new(ErrorKind::Corrupted, "Unexpected root inode number"));
        }

        Ok(())
    }

    /// 容纳 `inode_count` 个 inode 所需的 inode 表块数
    pub(crate) fn table_blocks_for(inode_count: u32) -> u32 {
        inode_count.div_ceil(INODES_PER_BLOCK as u32)
    }
}
