//! 块缓存模块
//!
//! 写回式块缓存，使用 `lru` crate 提供 LRU 驱逐。
//!
//! # 主要组件
//!
//! - [`CacheBuffer`] - 单个缓存块，包含数据和状态标志
//! - [`BlockCache`] - 块缓存管理器
//! - [`CacheFlags`] - 缓存块状态标志
//! - [`CacheStats`] - 缓存统计信息
//!
//! # 与 journal 协议的关系
//!
//! 脏块只在两种情况下写回设备：
//!
//! 1. 调用 [`BlockDev::flush`](crate::block::BlockDev::flush)（journal 协议的写屏障）
//! 2. 缓存已满且全部为脏块，写路径先写回一部分腾出空间
//!
//! 第二种情况只会写回当前阶段已经产生的块，因此不会把后一阶段的写入
//! 提前到前一阶段的屏障之前。驱逐只针对干净块，脏块绝不会被静默丢弃。
//!
//! # 使用示例
//!
//! ```rust,ignore
//! use jfs_core::cache::BlockCache;
//!
//! let mut cache = BlockCache::new(16, 512).unwrap();
//! let (buf, _is_new) = cache.alloc(100)?;
//! buf.data[0] = 42;
//! buf.mark_uptodate();
//! cache.mark_dirty(100);
//!
//! cache.flush_all(&mut device, 1)?;
//! ```

mod buffer;
mod block_cache;

pub use buffer::{CacheBuffer, CacheFlags};
pub use block_cache::{BlockCache, CacheStats, DEFAULT_CACHE_SIZE};
