//! Inode 分配和释放模块
//!
//! 空闲 inode 池是 superblock 指定的 inode 位图块，位 `i` 对应 inode `i`。
//! inode 0 保留，根目录 inode 永远不会被回收。

mod alloc;
mod free;

pub use self::alloc::*;
pub use self::free::*;
