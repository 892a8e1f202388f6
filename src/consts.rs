//! jfs 文件系统常量定义
//!
//! 这个模块包含了 jfs 磁盘格式的所有常量定义，包括：
//! - 磁盘布局相关常量
//! - inode 和目录项格式
//! - journal commit block 格式

//=============================================================================
// 基础常量
//=============================================================================

/// 文件系统块大小（字节）
pub const JFS_BLOCK_SIZE: usize = 512;

/// 默认扇区大小（字节）
pub const JFS_DEFAULT_SECTOR_SIZE: u32 = 512;

/// 空块指针（磁盘上的 -1）
pub const NO_BLOCK: u32 = u32::MAX;

//=============================================================================
// Superblock 相关
//=============================================================================

/// Superblock 所在块号
pub const JFS_SUPERBLOCK_LBA: u64 = 0;

/// Superblock 魔数 ("JFS1")
pub const JFS_SUPERBLOCK_MAGIC: u32 = 0x4A46_5331;

/// 块位图所在块号
pub const JFS_BLOCK_BITMAP_LBA: u32 = 1;

/// inode 位图所在块号
pub const JFS_INODE_BITMAP_LBA: u32 = 2;

/// inode 表起始块号
pub const JFS_INODE_TABLE_LBA: u32 = 3;

/// 单个位图块能描述的最大条目数
pub const JFS_BITMAP_BITS: u32 = (JFS_BLOCK_SIZE * 8) as u32;

/// 默认 inode 数量
pub const JFS_DEFAULT_INODE_COUNT: u32 = 64;

//=============================================================================
// Inode 相关
//=============================================================================

/// inode 中的块指针数
pub const INODE_BLOCK_PTRS: usize = 14;

/// 磁盘 inode 大小（字节）
pub const INODE_SIZE: usize = 64;

/// 每块 inode 数
pub const INODES_PER_BLOCK: usize = JFS_BLOCK_SIZE / INODE_SIZE;

/// 保留的空 inode 编号
pub const JFS_NULL_INODE: u32 = 0;

/// 根目录 inode 编号
pub const JFS_ROOT_INODE: u32 = 1;

/// 单个文件的最大字节数
pub const JFS_MAX_FILE_SIZE: usize = INODE_BLOCK_PTRS * JFS_BLOCK_SIZE;

//=============================================================================
// 目录项
//=============================================================================

/// 目录项头部长度：entry_len(2) + namelen(1) + file_type(1) + inode(4)
pub const DIR_ENTRY_HEADER_LEN: usize = 8;

/// 文件名最大长度
pub const MAX_FILENAME_LEN: usize = 255;

/// 目录项类型：普通文件
pub const DT_FILE: u8 = 1;

/// 目录项类型：目录
pub const DT_DIRECTORY: u8 = 2;

//=============================================================================
// Journal
//=============================================================================

/// journal 文件名（位于根目录）
pub const JFS_JOURNAL_NAME: &str = ".log";

/// commit block 魔数
pub const JFS_COMMIT_MAGIC: u32 = 0x89AB_CDEF;

/// commit block 编码长度：magic + pending + sum + blocknums
pub const JFS_COMMIT_BLOCK_LEN: usize = 12 + INODE_BLOCK_PTRS * 4;
