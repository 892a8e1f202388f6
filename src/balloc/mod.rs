//! 物理块分配模块
//!
//! 空闲块池是 superblock 指定的单个位图块。所有修改都通过 journal 事务，
//! 与引用这些块的 inode、目录块修改一起原子提交。

pub mod free;
pub mod alloc;

pub use self::free::*;
pub use self::alloc::*;
