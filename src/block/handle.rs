//! 块句柄 - RAII 风格的块访问
//!
//! 用于未经 journal 的原始读改写，例如格式化和 superblock 加载。
//! journal 保护的修改应该走 [`JournalTrans`](crate::journal::JournalTrans)。

use crate::block::{BlockDev, BlockDevice};
use crate::error::Result;
use alloc::vec::Vec;

/// 块句柄
///
/// - 获取时读出整块数据（缓存命中则不访问设备）
/// - 通过闭包读写数据，修改时标记为脏
/// - `release` 或 drop 时把脏数据写回 `BlockDev`
/// - 持有 `&mut BlockDev`，同一时刻只能有一个句柄
///
/// # 示例
///
/// ```rust,ignore
/// let mut block = Block::get(&mut block_dev, 1)?;
/// block.with_data_mut(|data| {
///     data[0] = 0x42;
/// })?;
/// block.release()?;
/// ```
pub struct Block<'a, D: BlockDevice> {
    /// 块设备引用
    block_dev: &'a mut BlockDev<D>,
    /// 逻辑块地址
    lba: u64,
    /// 块数据
    data: Vec<u8>,
    /// 是否被修改
    dirty: bool,
}

impl<'a, D: BlockDevice> Block<'a, D> {
    /// 获取块（读取数据）
    ///
    /// # 参数
    ///
    /// * `block_dev` - 块设备
    /// * `lba` - 逻辑块地址
    pub fn get(block_dev: &'a mut BlockDev<D>, lba: u64) -> Result<Self> {
        let data = block_dev.read_block_vec(lba)?;
        Ok(Self {
            block_dev,
            lba,
            data,
            dirty: false,
        })
    }

    /// 获取块（不读取数据）
    ///
    /// 调用者准备覆盖整个块时使用，初始内容全零。
    pub fn get_noread(block_dev: &'a mut BlockDev<D>, lba: u64) -> Result<Self> {
        block_dev.check_lba(lba)?;
        let data = alloc::vec![0u8; block_dev.block_size() as usize];
        Ok(Self {
            block_dev,
            lba,
            data,
            dirty: false,
        })
    }

    /// 获取逻辑块地址
    pub fn lba(&self) -> u64 {
        self.lba
    }

    /// 只读访问块数据
    pub fn with_data<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&[u8]) -> R,
    {
        Ok(f(&self.data))
    }

    /// 可变访问块数据，并标记为脏
    pub fn with_data_mut<F, R>(&mut self, f: F) -> Result<R>
    where
        F: FnOnce(&mut [u8]) -> R,
    {
        self.dirty = true;
        Ok(f(&mut self.data))
    }

    /// 释放块，把修改写回
    ///
    /// 与 drop 相比，可以拿到写回的错误。
    pub fn release(mut self) -> Result<()> {
        self.write_back()
    }

    fn write_back(&mut self) -> Result<()> {
        if self.dirty {
            self.block_dev.write_block(self.lba, &self.data)?;
            self.dirty = false;
        }
        Ok(())
    }
}

impl<'a, D: BlockDevice> Drop for Block<'a, D> {
    fn drop(&mut self) {
        if let Err(e) = self.write_back() {
            log::error!("[BLOCK] Failed to write back block {}: {:?}", self.lba, e);
        }
    }
}
