//! 块 I/O 操作实现
//!
//! 这里的读写都是原始的、未经 journal 的块 I/O。

use super::{BlockDev, BlockDevice};
use crate::error::{Error, ErrorKind, Result};
use alloc::vec;
use alloc::vec::Vec;

impl<D: BlockDevice> BlockDev<D> {
    /// 读取单个逻辑块
    ///
    /// 从指定逻辑块地址读取一个完整的块到缓冲区。
    /// 如果启用了缓存，优先从缓存读取；缓存未命中则从设备读取并填充缓存。
    ///
    /// # 参数
    ///
    /// * `lba` - 逻辑块地址
    /// * `buf` - 目标缓冲区（大小至少为 block_size）
    ///
    /// # 返回
    ///
    /// 成功返回读取的字节数
    pub fn read_block(&mut self, lba: u64, buf: &mut [u8]) -> Result<usize> {
        let block_size = self.block_size() as usize;

        if buf.len() < block_size {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "buffer too small for block",
            ));
        }
        self.check_lba(lba)?;

        self.inc_read_count();

        // 缓存命中
        if let Some(cache) = &mut self.bcache {
            if let Some(data) = cache.read_block(lba) {
                buf[..block_size].copy_from_slice(data);
                return Ok(block_size);
            }
        }

        // 缓存未命中或无缓存 - 从设备读取到用户缓冲区
        let pba = self.logical_to_physical(lba);
        let count = self.sectors_per_block();
        self.inc_physical_read_count();
        self.device_mut().read_blocks(pba, count, &mut buf[..block_size])?;

        // 将数据填充到缓存（干净块）
        self.cache_fill(lba, &buf[..block_size], false)?;

        Ok(block_size)
    }

    /// 读取单个逻辑块到新分配的缓冲区
    pub fn read_block_vec(&mut self, lba: u64) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; self.block_size() as usize];
        self.read_block(lba, &mut buf)?;
        Ok(buf)
    }

    /// 写入单个逻辑块
    ///
    /// 将缓冲区数据写入指定逻辑块地址。
    /// 如果启用了缓存，写入缓存并标记为脏（在下一次 `flush` 时落盘）；
    /// 否则直接写入设备。
    ///
    /// # 参数
    ///
    /// * `lba` - 逻辑块地址
    /// * `buf` - 源数据缓冲区（大小至少为 block_size）
    ///
    /// # 返回
    ///
    /// 成功返回写入的字节数
    pub fn write_block(&mut self, lba: u64, buf: &[u8]) -> Result<usize> {
        let block_size = self.block_size() as usize;

        if buf.len() < block_size {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "buffer too small for block",
            ));
        }
        self.check_lba(lba)?;

        self.inc_write_count();

        if self.bcache.is_some() {
            self.cache_fill(lba, &buf[..block_size], true)?;
            return Ok(block_size);
        }

        // 无缓存 - 直接写入设备
        let pba = self.logical_to_physical(lba);
        let count = self.sectors_per_block();
        self.inc_physical_write_count();
        self.device_mut().write_blocks(pba, count, &buf[..block_size])
    }

    /// 刷新所有缓存
    ///
    /// 如果启用了缓存，先刷新所有脏块到设备，然后调用设备的 flush。
    /// 这是两层刷新：缓存层和硬件层。journal 协议把它当作写屏障使用。
    pub fn flush(&mut self) -> Result<()> {
        // 第一层：刷新缓存中的脏块
        let sectors = self.sectors_per_block();

        // 临时取出缓存以避免借用冲突
        if let Some(mut cache) = self.bcache.take() {
            let result = cache.flush_all(self.device_mut(), sectors);
            // 恢复缓存
            self.bcache = Some(cache);
            let written = result?;
            self.add_physical_writes(written as u64);
        }

        // 第二层：调用设备的硬件刷新（如 fsync）
        self.device_mut().flush()
    }

    /// 把一个块的数据放入缓存
    ///
    /// 缓存满且全部是脏块时，先写回一部分脏块再重试。
    fn cache_fill(&mut self, lba: u64, data: &[u8], dirty: bool) -> Result<()> {
        let needs_room = match &self.bcache {
            Some(cache) => !cache.contains(lba) && cache.is_full_of_dirty(),
            None => return Ok(()),
        };

        if needs_room {
            let flush_count = self.bcache.as_ref().map_or(1, |c| (c.capacity() / 4).max(1));
            log::warn!("[BLOCK] Cache full with dirty blocks, flushing {} blocks", flush_count);
            self.flush_some_dirty_blocks(flush_count)?;
        }

        if let Some(cache) = &mut self.bcache {
            let (cache_buf, _is_new) = cache.alloc(lba)?;
            cache_buf.data.copy_from_slice(data);
            cache_buf.mark_uptodate();
            if dirty {
                cache.mark_dirty(lba);
            }
        }
        Ok(())
    }
}
