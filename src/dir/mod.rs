//! 目录操作模块
//!
//! 每个目录只有一个数据块（`blockptrs[0]`），目录项在块内从偏移 0 开始紧密排列，
//! 目录 inode 的逻辑大小等于所有有效目录项 `entry_len` 之和。
//!
//! ## 模块结构
//!
//! - `entry` - 目录项解码与扫描
//! - `write` - 目录项删除（原地压缩）与追加
//! - `path_lookup` - 路径拆分与解析

pub mod entry;
pub mod write;
pub mod path_lookup;

pub use entry::{find_entry, read_entries, DirEntry};
pub use write::{append_entry, remove_entry};
pub use path_lookup::{find_root, lookup_entry, resolve_path, split_path, PathLookup};
