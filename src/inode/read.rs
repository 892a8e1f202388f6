//! Inode 读取

use crate::{
    block::{BlockDev, BlockDevice},
    consts::*,
    error::{Error, ErrorKind, Result},
    superblock::Superblock,
};
use byteorder::{ByteOrder, LittleEndian};

/// inode 类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum InodeType {
    /// 空闲
    Free = 0,
    /// 普通文件
    File = 1,
    /// 目录
    Directory = 2,
}

impl InodeType {
    /// 从磁盘值解析
    pub fn from_raw(raw: u16) -> Result<Self> {
        match raw {
            0 => Ok(Self::Free),
            1 => Ok(Self::File),
            2 => Ok(Self::Directory),
            _ => Err(Error::new(ErrorKind::Corrupted, "Unknown inode type")),
        }
    }

    /// 对应的目录项类型
    pub fn dir_entry_type(self) -> u8 {
        match self {
            Self::Directory => DT_DIRECTORY,
            _ => DT_FILE,
        }
    }
}

/// 磁盘 inode
///
/// 64 字节：`type:u16`，填充 `u16`，`size:u32`，`blockptrs:[u32; 14]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inode {
    /// 类型
    pub itype: InodeType,
    /// 逻辑字节大小
    pub size: u32,
    /// 块指针，未使用的槽为 `NO_BLOCK`
    pub blockptrs: [u32; INODE_BLOCK_PTRS],
}

impl Inode {
    /// 空 inode（空闲、大小为 0、全部指针为哨兵）
    pub fn empty() -> Self {
        Self {
            itype: InodeType::Free,
            size: 0,
            blockptrs: [NO_BLOCK; INODE_BLOCK_PTRS],
        }
    }

    /// 从 64 字节记录解码
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < INODE_SIZE {
            return Err(Error::new(ErrorKind::InvalidInput, "inode buffer too small"));
        }
        let itype = InodeType::from_raw(LittleEndian::read_u16(&buf[0..2]))?;
        let size = LittleEndian::read_u32(&buf[4..8]);
        let mut blockptrs = [NO_BLOCK; INODE_BLOCK_PTRS];
        LittleEndian::read_u32_into(&buf[8..INODE_SIZE], &mut blockptrs);

        Ok(Self { itype, size, blockptrs })
    }

    /// 是否为目录
    pub fn is_dir(&self) -> bool {
        self.itype == InodeType::Directory
    }

    /// 是否为普通文件
    pub fn is_file(&self) -> bool {
        self.itype == InodeType::File
    }

    /// 文件内容占用的块数：`ceil(size / block_size)`
    pub fn blocks_in_use(&self) -> usize {
        (self.size as usize).div_ceil(JFS_BLOCK_SIZE)
    }

    /// 目录的有效长度（逻辑大小，不超过一个块）
    pub fn live_len(&self) -> usize {
        (self.size as usize).min(JFS_BLOCK_SIZE)
    }

    /// 内容占用的块号
    ///
    /// 块数超过指针槽数，或者有效范围内出现哨兵时，返回 `Corrupted`
    pub fn data_blocks(&self) -> Result<&[u32]> {
        let count = self.blocks_in_use();
        if count > INODE_BLOCK_PTRS {
            return Err(Error::new(ErrorKind::Corrupted, "inode size exceeds block pointers"));
        }
        let blocks = &self.blockptrs[..count];
        if blocks.contains(&NO_BLOCK) {
            return Err(Error::new(ErrorKind::Corrupted, "inode size covers an unused block pointer"));
        }
        Ok(blocks)
    }
}

/// 定位 inode 所在的块及块内偏移
///
/// # 参数
///
/// * `sb` - superblock
/// * `ino` - inode 编号
///
/// # 返回
///
/// `(块号, 块内字节偏移)`
pub fn inode_to_block(sb: &Superblock, ino: u32) -> Result<(u64, usize)> {
    if ino == JFS_NULL_INODE || ino >= sb.inode_count() {
        return Err(Error::new(ErrorKind::InvalidInput, "Inode number out of range"));
    }
    let ino = ino as usize;
    let lba = sb.inode_table() as u64 + (ino / INODES_PER_BLOCK) as u64;
    let offset = (ino % INODES_PER_BLOCK) * INODE_SIZE;
    Ok((lba, offset))
}

/// 直接从块设备读取 inode（不经过事务）
pub fn read_inode<D: BlockDevice>(bdev: &mut BlockDev<D>, sb: &Superblock, ino: u32) -> Result<Inode> {
    let (lba, offset) = inode_to_block(sb, ino)?;
    let buf = bdev.read_block_vec(lba)?;
    Inode::decode(&buf[offset..offset + INODE_SIZE])
}
