//! 块缓存实现
//!
//! 核心是 `LruCache<u64, CacheBuffer>`，另用一个有序集合追踪脏块。
//! 驱逐只发生在干净块上。

use crate::{
    block::BlockDevice,
    error::{Error, ErrorKind, Result},
};

use super::buffer::CacheBuffer;
use alloc::collections::BTreeSet;
use alloc::vec::Vec;
use core::num::NonZeroUsize;
use lru::LruCache;

/// 默认缓存块数量
pub const DEFAULT_CACHE_SIZE: usize = 64;

/// 缓存统计信息
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// 总访问次数
    pub total_accesses: u64,
    /// 缓存命中次数
    pub hits: u64,
    /// 缓存未命中次数
    pub misses: u64,
    /// 脏块写回次数
    pub writebacks: u64,
    /// 当前脏块数量
    pub dirty_blocks: usize,
}

impl CacheStats {
    /// 计算命中率
    pub fn hit_rate(&self) -> f64 {
        if self.total_accesses == 0 {
            0.0
        } else {
            self.hits as f64 / self.total_accesses as f64
        }
    }
}

/// 块缓存
pub struct BlockCache {
    /// LRU 缓存核心
    cache: LruCache<u64, CacheBuffer>,

    /// 脏块集合（按 LBA 有序）
    dirty_set: BTreeSet<u64>,

    /// 块大小（字节）
    block_size: usize,

    /// 统计信息
    stats: CacheStats,
}

impl BlockCache {
    /// 创建新的块缓存
    ///
    /// # 参数
    ///
    /// * `capacity` - 缓存容量（块数量）
    /// * `block_size` - 块大小（字节）
    ///
    /// # 返回
    ///
    /// `capacity` 为 0 时返回 `None`，表示不启用缓存
    pub fn new(capacity: usize, block_size: usize) -> Option<Self> {
        let capacity = NonZeroUsize::new(capacity)?;
        Some(Self {
            cache: LruCache::new(capacity),
            dirty_set: BTreeSet::new(),
            block_size,
            stats: CacheStats::default(),
        })
    }

    /// 分配缓存块
    ///
    /// # 返回
    ///
    /// `(块的可变引用, 是否是新分配)`
    /// - 块已存在：返回 `(块, false)` 并更新 LRU
    /// - 块不存在：分配新块返回 `(块, true)`，满时驱逐最旧的干净块
    /// - 缓存满且全部为脏块：返回 `NoSpace`，调用者应先写回部分脏块
    pub fn alloc(&mut self, lba: u64) -> Result<(&mut CacheBuffer, bool)> {
        self.stats.total_accesses += 1;

        if self.cache.contains(&lba) {
            self.stats.hits += 1;
            let buf = self
                .cache
                .get_mut(&lba)
                .ok_or(Error::new(ErrorKind::Corrupted, "cache index out of sync"))?;
            log::trace!("[CACHE] alloc LBA={:#x} HIT (dirty={})", lba, buf.is_dirty());
            return Ok((buf, false));
        }

        self.stats.misses += 1;
        log::trace!(
            "[CACHE] alloc LBA={:#x} MISS, cache={}/{}",
            lba,
            self.cache.len(),
            self.cache.cap().get()
        );

        if self.cache.len() >= self.cache.cap().get() {
            self.evict_for_new_block()?;
        }

        self.cache.put(lba, CacheBuffer::new(lba, self.block_size));
        let buf = self
            .cache
            .get_mut(&lba)
            .ok_or(Error::new(ErrorKind::Corrupted, "cache index out of sync"))?;
        Ok((buf, true))
    }

    /// 驱逐一个干净块
    ///
    /// 从 LRU 端开始查找第一个非脏块。所有块都脏时返回 `NoSpace`。
    fn evict_for_new_block(&mut self) -> Result<()> {
        // lru 的 iter() 从 MRU 到 LRU，反向遍历从最旧的开始
        let victim = self
            .cache
            .iter()
            .rev()
            .map(|(lba, _)| *lba)
            .find(|lba| !self.dirty_set.contains(lba));

        match victim {
            Some(lba) => {
                self.cache.pop(&lba);
                log::trace!("[CACHE] Evicted clean block LBA={:#x}", lba);
                Ok(())
            }
            None => {
                log::debug!("[CACHE] Cannot evict: all {} blocks are dirty", self.cache.len());
                Err(Error::new(
                    ErrorKind::NoSpace,
                    "All cache blocks are dirty, flush before alloc",
                ))
            }
        }
    }

    /// 块是否在缓存中（不更新 LRU）
    pub fn contains(&self, lba: u64) -> bool {
        self.cache.contains(&lba)
    }

    /// 缓存是否已满且全部为脏块
    pub fn is_full_of_dirty(&self) -> bool {
        self.cache.len() >= self.cache.cap().get() && self.dirty_set.len() >= self.cache.len()
    }

    /// 标记块为脏
    pub fn mark_dirty(&mut self, lba: u64) {
        if let Some(buf) = self.cache.peek_mut(&lba) {
            buf.mark_dirty();
            if self.dirty_set.insert(lba) {
                log::trace!("[CACHE] mark_dirty LBA={:#x}, total_dirty={}", lba, self.dirty_set.len());
            }
        }
    }

    /// 读取缓存块数据
    ///
    /// 命中时更新 LRU 顺序并返回数据切片，未命中返回 `None`
    pub fn read_block(&mut self, lba: u64) -> Option<&[u8]> {
        self.stats.total_accesses += 1;
        match self.cache.get(&lba) {
            Some(buf) if buf.is_uptodate() => {
                self.stats.hits += 1;
                Some(&buf.data)
            }
            _ => {
                self.stats.misses += 1;
                None
            }
        }
    }

    /// 按 LBA 顺序列出最多 `limit` 个脏块
    pub fn dirty_lbas(&self, limit: usize) -> Vec<u64> {
        self.dirty_set.iter().copied().take(limit).collect()
    }

    /// 把单个脏块写回设备
    ///
    /// # 参数
    ///
    /// * `lba` - 逻辑块地址
    /// * `device` - 块设备
    /// * `sectors_per_block` - 每块扇区数
    ///
    /// # 返回
    ///
    /// 实际发生写回时返回 `true`
    pub fn flush_lba<D: BlockDevice>(
        &mut self,
        lba: u64,
        device: &mut D,
        sectors_per_block: u32,
    ) -> Result<bool> {
        let Some(buf) = self.cache.peek_mut(&lba) else {
            self.dirty_set.remove(&lba);
            return Ok(false);
        };
        if !buf.is_dirty() {
            self.dirty_set.remove(&lba);
            return Ok(false);
        }

        let pba = lba * sectors_per_block as u64;
        device.write_blocks(pba, sectors_per_block, &buf.data)?;

        buf.mark_clean();
        self.dirty_set.remove(&lba);
        self.stats.writebacks += 1;
        log::trace!("[CACHE] flushed LBA={:#x}", lba);
        Ok(true)
    }

    /// 刷新所有脏块到磁盘
    ///
    /// 中途失败时，已写回的块标记为干净，其余块保持脏状态。
    ///
    /// # 返回
    ///
    /// 写回的块数
    pub fn flush_all<D: BlockDevice>(&mut self, device: &mut D, sectors_per_block: u32) -> Result<usize> {
        let dirty: Vec<u64> = self.dirty_set.iter().copied().collect();
        if !dirty.is_empty() {
            log::debug!("[CACHE] Flushing {} dirty blocks", dirty.len());
        }

        let mut written = 0;
        for lba in dirty {
            if self.flush_lba(lba, device, sectors_per_block)? {
                written += 1;
            }
        }
        Ok(written)
    }

    /// 使块无效（从缓存中移除，丢弃脏数据）
    pub fn invalidate_buffer(&mut self, lba: u64) {
        self.cache.pop(&lba);
        self.dirty_set.remove(&lba);
    }

    /// 获取缓存统计信息
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.dirty_blocks = self.dirty_set.len();
        stats
    }

    /// 获取缓存容量
    pub fn capacity(&self) -> usize {
        self.cache.cap().get()
    }

    /// 获取当前缓存块数量
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// 检查缓存是否为空
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// 获取脏块数量
    pub fn dirty_count(&self) -> usize {
        self.dirty_set.len()
    }
}

impl core::fmt::Debug for BlockCache {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BlockCache")
            .field("capacity", &self.cache.cap())
            .field("len", &self.cache.len())
            .field("dirty_count", &self.dirty_set.len())
            .field("block_size", &self.block_size)
            .field("stats", &self.stats)
            .finish()
    }
}
