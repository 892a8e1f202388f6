//! 块设备核心类型

use crate::cache::{BlockCache, CacheStats};
use crate::error::{Error, ErrorKind, Result};

/// 块设备接口
///
/// 实现此 trait 以提供底层块设备访问。
///
/// # 示例
///
/// ```rust,ignore
/// use jfs_core::{BlockDevice, Result};
///
/// struct MyDevice {
///     // ...
/// }
///
/// impl BlockDevice for MyDevice {
///     fn block_size(&self) -> u32 {
///         512
///     }
///
///     fn sector_size(&self) -> u32 {
///         512
///     }
///
///     fn total_blocks(&self) -> u64 {
///         4096
///     }
///
///     fn read_blocks(&mut self, lba: u64, count: u32, buf: &mut [u8]) -> Result<usize> {
///         // 实现扇区读取
///         Ok(count as usize * self.sector_size() as usize)
///     }
///
///     fn write_blocks(&mut self, lba: u64, count: u32, buf: &[u8]) -> Result<usize> {
///         // 实现扇区写入
///         Ok(count as usize * self.sector_size() as usize)
///     }
/// }
/// ```
pub trait BlockDevice {
    /// 逻辑块大小（jfs 要求 512）
    fn block_size(&self) -> u32;

    /// 物理扇区大小（通常 512）
    fn sector_size(&self) -> u32;

    /// 总块数
    fn total_blocks(&self) -> u64;

    /// 读取扇区
    ///
    /// # 参数
    ///
    /// * `lba` - 逻辑块地址（以扇区为单位）
    /// * `count` - 要读取的扇区数
    /// * `buf` - 目标缓冲区（大小至少为 count * sector_size）
    ///
    /// # 返回
    ///
    /// 成功返回实际读取的字节数
    fn read_blocks(&mut self, lba: u64, count: u32, buf: &mut [u8]) -> Result<usize>;

    /// 写入扇区
    ///
    /// # 参数
    ///
    /// * `lba` - 逻辑块地址（以扇区为单位）
    /// * `count` - 要写入的扇区数
    /// * `buf` - 源缓冲区（大小至少为 count * sector_size）
    ///
    /// # 返回
    ///
    /// 成功返回实际写入的字节数
    fn write_blocks(&mut self, lba: u64, count: u32, buf: &[u8]) -> Result<usize>;

    /// 刷新设备缓存
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// 块设备包装器
///
/// 为 jfs 文件系统提供块级访问，包含统计信息和可选的写回缓存。
///
/// BlockDev 本身不包含内部锁。文件系统是单线程同步模型，
/// 同一时刻只有一个操作持有 `&mut BlockDev`。
pub struct BlockDev<D> {
    /// 底层设备
    device: D,
    /// 逻辑读取次数（包括缓存命中）
    read_count: u64,
    /// 逻辑写入次数（包括缓存写入）
    write_count: u64,
    /// 物理读取次数（实际设备操作）
    physical_read_count: u64,
    /// 物理写入次数（实际设备操作）
    physical_write_count: u64,
    /// 块缓存（可选）
    pub(super) bcache: Option<BlockCache>,
}

impl<D: BlockDevice> BlockDev<D> {
    /// 创建新的块设备包装器（无缓存）
    pub fn new(device: D) -> Result<Self> {
        let block_size = device.block_size();
        let sector_size = device.sector_size();

        // 验证块大小是扇区大小的整数倍
        if sector_size == 0 || block_size % sector_size != 0 {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Block size must be a multiple of sector size",
            ));
        }

        Ok(Self {
            device,
            read_count: 0,
            write_count: 0,
            physical_read_count: 0,
            physical_write_count: 0,
            bcache: None,
        })
    }

    /// 创建带缓存的块设备包装器
    ///
    /// # 参数
    ///
    /// * `device` - 底层块设备
    /// * `cache_blocks` - 缓存块数量（0 表示不启用缓存）
    pub fn new_with_cache(device: D, cache_blocks: usize) -> Result<Self> {
        let mut bd = Self::new(device)?;
        let block_size = bd.block_size() as usize;
        bd.bcache = BlockCache::new(cache_blocks, block_size);
        Ok(bd)
    }

    /// 获取底层设备的引用
    pub fn device(&self) -> &D {
        &self.device
    }

    /// 获取底层设备的可变引用
    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// 取回底层设备，**不刷新**缓存中的脏块
    ///
    /// 缓存中尚未写回的数据会被丢弃，效果等同于进程在此刻被终止。
    pub fn into_device(self) -> D {
        self.device
    }

    /// 获取逻辑块大小
    pub fn block_size(&self) -> u32 {
        self.device.block_size()
    }

    /// 获取物理扇区大小
    pub fn sector_size(&self) -> u32 {
        self.device.sector_size()
    }

    /// 获取总块数
    pub fn total_blocks(&self) -> u64 {
        self.device.total_blocks()
    }

    /// 获取逻辑读取次数（包括缓存命中）
    pub fn read_count(&self) -> u64 {
        self.read_count
    }

    /// 获取逻辑写入次数（包括缓存写入）
    pub fn write_count(&self) -> u64 {
        self.write_count
    }

    /// 获取物理读取次数
    pub fn physical_read_count(&self) -> u64 {
        self.physical_read_count
    }

    /// 获取物理写入次数
    pub fn physical_write_count(&self) -> u64 {
        self.physical_write_count
    }

    /// 获取缓存统计信息
    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.bcache.as_ref().map(|cache| cache.stats())
    }

    /// 每个逻辑块包含的扇区数
    pub(crate) fn sectors_per_block(&self) -> u32 {
        self.block_size() / self.sector_size()
    }

    /// 逻辑块地址转换为扇区地址
    pub(crate) fn logical_to_physical(&self, lba: u64) -> u64 {
        lba * self.sectors_per_block() as u64
    }

    pub(crate) fn inc_read_count(&mut self) {
        self.read_count += 1;
    }

    pub(crate) fn inc_write_count(&mut self) {
        self.write_count += 1;
    }

    pub(crate) fn inc_physical_read_count(&mut self) {
        self.physical_read_count += 1;
    }

    pub(crate) fn inc_physical_write_count(&mut self) {
        self.physical_write_count += 1;
    }

    pub(crate) fn add_physical_writes(&mut self, count: u64) {
        self.physical_write_count += count;
    }

    /// 检查块号是否在设备范围内
    pub(crate) fn check_lba(&self, lba: u64) -> Result<()> {
        if lba >= self.total_blocks() {
            return Err(Error::new(ErrorKind::InvalidInput, "Block number out of range"));
        }
        Ok(())
    }

    /// 刷新部分脏块，为缓存腾出空间
    ///
    /// 缓存满且所有块都脏时由写路径调用。只写回当前阶段已产生的脏块，
    /// 不会越过 journal 协议的写屏障。
    pub(crate) fn flush_some_dirty_blocks(&mut self, count: usize) -> Result<usize> {
        let sectors = self.sectors_per_block();

        // 临时取出缓存以避免借用冲突
        let Some(mut cache) = self.bcache.take() else {
            return Ok(0);
        };

        let mut flushed = 0;
        let mut result = Ok(());
        for lba in cache.dirty_lbas(count) {
            match cache.flush_lba(lba, &mut self.device, sectors) {
                Ok(true) => {
                    flushed += 1;
                    self.physical_write_count += 1;
                }
                Ok(false) => {}
                Err(e) => {
                    result = Err(e);
                    break;
                }
            }
        }

        // 恢复缓存
        self.bcache = Some(cache);
        result.map(|_| flushed)
    }
}
