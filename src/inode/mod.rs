//! Inode 操作模块
//!
//! inode 表访问：按编号定位、解码、编码。
//! 读操作直接访问块设备；修改 inode 只能通过 journal 事务。

mod read;
mod write;

pub use read::*;
pub use write::*;
