//! 文件系统高级 API
//!
//! [`JfsFileSystem`] 是显式传递的文件系统会话：它拥有块设备和 superblock，
//! 所有操作都通过它进行。
//!
//! 挂载分两步：`open` 只读取 superblock 并定位 journal 文件，
//! `recover` 重放 pending 事务。恢复完成之前，所有修改操作都返回
//! `InvalidState`。`mount` 把两步合在一起。

mod filesystem;
mod format;
mod remove;
mod write;
mod types;

pub use filesystem::JfsFileSystem;
pub use types::{FileStat, FsConfig, StatFs};
