//! jfs_core: 小型日志文件系统的崩溃一致性核心
//!
//! 这是一个纯 Rust 实现的 jfs 文件系统库，提供：
//! - **预写日志**：多块修改先暂存到 journal 文件，再原地应用
//! - **崩溃恢复**：挂载时重放被中断的事务，提交与恢复共用同一算法
//! - **空闲块/空闲 inode 回收与分配**
//! - **目录项原地压缩**
//! - **原子删除**：删除文件涉及的所有元数据块在同一个事务中提交
//!
//! # 示例
//!
//! ```rust,ignore
//! use jfs_core::{JfsFileSystem, MemDevice, Result};
//!
//! fn main() -> Result<()> {
//!     let mut fs = JfsFileSystem::format(MemDevice::new(256))?;
//!     fs.mkdir("/docs")?;
//!     fs.create_file("/docs/readme", b"hello")?;
//!     fs.remove_file("/docs/readme")?;
//!
//!     let device = fs.unmount()?;
//!     let mut fs = JfsFileSystem::mount(device)?;
//!     assert!(fs.read_dir("/docs")?.is_empty());
//!     Ok(())
//! }
//! ```
//!
//! # 模块结构
//!
//! - [`error`] - 错误类型定义
//! - [`block`] - 块设备抽象和 I/O 操作
//! - [`cache`] - 写回式块缓存
//! - [`superblock`] - Superblock 操作
//! - [`inode`] - inode 表访问
//! - [`dir`] - 目录项与路径解析
//! - [`balloc`] / [`ialloc`] - 空闲块池与空闲 inode 池
//! - [`journal`] - journal 记录、提交协议与崩溃恢复
//! - [`fs`] - 文件系统会话

#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

// ===== 核心模块 =====

/// 错误处理
pub mod error;

/// 块设备抽象
pub mod block;

/// 常量定义
pub mod consts;

/// Superblock 操作
pub mod superblock;

/// Inode 操作
pub mod inode;

/// 目录操作
pub mod dir;

/// 文件系统高级 API
pub mod fs;

/// 块缓存
pub mod cache;

/// 位图操作
pub mod bitmap;

/// Inode 分配
pub mod ialloc;

/// 块分配
pub mod balloc;

/// Journal 系统
pub mod journal;

/// CRC32 校验和计算
pub(crate) mod crc;

// ===== 公共导出 =====

// 错误处理
pub use error::{Error, ErrorKind, Result};

// 块设备
pub use block::{Block, BlockDev, BlockDevice, MemDevice};
#[cfg(feature = "std")]
pub use block::FileDevice;

// Superblock
pub use superblock::Superblock;

// Inode
pub use inode::{read_inode, Inode, InodeType};

// Dir
pub use dir::{DirEntry, PathLookup};

// FileSystem
pub use fs::{FileStat, FsConfig, JfsFileSystem, StatFs};

// Cache
pub use cache::{BlockCache, CacheBuffer, CacheFlags, CacheStats, DEFAULT_CACHE_SIZE};

// Journal
pub use journal::{CommitBlock, JournalError, JournalTrans, JournalWriter};
