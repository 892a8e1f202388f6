//! 位图操作
//!
//! 空闲块池和空闲 inode 池都是单块位图，位为 1 表示已占用。

mod ops;

pub use ops::*;
