//! 文件系统配置和查询结果类型

use crate::{cache::DEFAULT_CACHE_SIZE, consts::*, inode::InodeType};
use alloc::vec::Vec;

/// 文件系统配置
#[derive(Debug, Clone, Copy)]
pub struct FsConfig {
    /// 块缓存大小（块数，0 表示不启用缓存）
    pub cache_blocks: usize,
    /// 格式化时的 inode 数量（包括保留的 0 号）
    pub inode_count: u32,
}

impl Default for FsConfig {
    fn default() -> Self {
        Self {
            cache_blocks: DEFAULT_CACHE_SIZE,
            inode_count: JFS_DEFAULT_INODE_COUNT,
        }
    }
}

/// 文件系统统计信息
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatFs {
    /// 块大小（字节）
    pub block_size: u32,
    /// 总块数
    pub blocks_count: u32,
    /// 空闲块数
    pub free_blocks_count: u32,
    /// 总 inode 数
    pub inodes_count: u32,
    /// 空闲 inode 数
    pub free_inodes_count: u32,
}

/// 单个文件或目录的元数据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStat {
    /// inode 编号
    pub ino: u32,
    /// 类型
    pub itype: InodeType,
    /// 逻辑字节大小
    pub size: u32,
    /// 占用的块
    pub blocks: Vec<u32>,
}

impl FileStat {
    /// 是否为目录
    pub fn is_dir(&self) -> bool {
        self.itype == InodeType::Directory
    }

    /// 是否为普通文件
    pub fn is_file(&self) -> bool {
        self.itype == InodeType::File
    }
}
