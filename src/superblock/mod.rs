//! Superblock 操作模块
//!
//! 这个模块提供 jfs superblock 的读取、验证、写入和布局计算功能。
//!
//! superblock 只在格式化时写入，之后只读；它不参与 journal。

mod read;
mod write;

pub use read::*;
