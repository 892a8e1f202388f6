//! Superblock 创建和写入

use super::read::SUPERBLOCK_ENCODED_LEN;
use crate::{
    block::{Block, BlockDev, BlockDevice},
    consts::*,
    error::{Error, ErrorKind, Result},
};
use byteorder::{ByteOrder, LittleEndian};

impl super::Superblock {
    /// 为新卷计算布局
    ///
    /// # 参数
    ///
    /// * `total_blocks` - 卷的总块数
    /// * `inode_count` - inode 数量（包括保留的 0 号）
    pub fn new(total_blocks: u32, inode_count: u32) -> Result<Self> {
        if total_blocks > JFS_BITMAP_BITS || inode_count > JFS_BITMAP_BITS {
            return Err(Error::new(ErrorKind::InvalidInput, "Volume too large for a single bitmap block"));
        }
        if inode_count < 3 {
            return Err(Error::new(ErrorKind::InvalidInput, "At least 3 inodes are required"));
        }

        let inode_table_blocks = Self::table_blocks_for(inode_count);
        let first_data_block = JFS_INODE_TABLE_LBA + inode_table_blocks;
        if first_data_block >= total_blocks {
            return Err(Error::new(ErrorKind::NoSpace, "Volume too small for metadata"));
        }

        Ok(Self {
            magic: JFS_SUPERBLOCK_MAGIC,
            block_size: JFS_BLOCK_SIZE as u32,
            total_blocks,
            inode_count,
            block_bitmap: JFS_BLOCK_BITMAP_LBA,
            inode_bitmap: JFS_INODE_BITMAP_LBA,
            inode_table: JFS_INODE_TABLE_LBA,
            inode_table_blocks,
            first_data_block,
            root_inode: JFS_ROOT_INODE,
        })
    }

    /// 编码到块缓冲区前部
    pub fn encode(&self, buf: &mut [u8]) {
        let fields = [
            self.magic,
            self.block_size,
            self.total_blocks,
            self.inode_count,
            self.block_bitmap,
            self.inode_bitmap,
            self.inode_table,
            self.inode_table_blocks,
            self.first_data_block,
            self.root_inode,
        ];
        LittleEndian::write_u32_into(&fields, &mut buf[..SUPERBLOCK_ENCODED_LEN]);
    }

    /// 将 superblock 写回块设备（不经过 journal）
    pub fn write<D: BlockDevice>(&self, bdev: &mut BlockDev<D>) -> Result<()> {
        let mut block = Block::get_noread(bdev, JFS_SUPERBLOCK_LBA)?;
        block.with_data_mut(|data| self.encode(data))?;
        block.release()
    }
}
