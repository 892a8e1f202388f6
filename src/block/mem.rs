//! 内存块设备
//!
//! 整个卷保存在一个 `Vec<u8>` 中。支持写入故障注入：
//! 设定写入预算后，预算耗尽的那次写入及之后的所有写入都返回 I/O 错误，
//! 设备内容停留在预算耗尽前的状态，用来模拟任意时刻的崩溃。

use super::BlockDevice;
use crate::consts::JFS_BLOCK_SIZE;
use crate::error::{Error, ErrorKind, Result};
use alloc::vec;
use alloc::vec::Vec;

/// 内存镜像块设备
#[derive(Debug, Clone)]
pub struct MemDevice {
    storage: Vec<u8>,
    /// 剩余可成功写入次数，`None` 表示不限制
    write_budget: Option<usize>,
    /// 成功写入次数
    writes: u64,
}

impl MemDevice {
    /// 创建全零的内存设备
    ///
    /// # 参数
    ///
    /// * `total_blocks` - 块数（每块 512 字节）
    pub fn new(total_blocks: u64) -> Self {
        Self::from_image(vec![0u8; total_blocks as usize * JFS_BLOCK_SIZE])
    }

    /// 从已有镜像创建设备
    ///
    /// 镜像长度不是块大小整数倍时，末尾不足一块的部分不可访问。
    pub fn from_image(image: Vec<u8>) -> Self {
        Self {
            storage: image,
            write_budget: None,
            writes: 0,
        }
    }

    /// 获取某一块的内容
    ///
    /// 越界时 panic，仅用于检查设备内容。
    pub fn block(&self, lba: u64) -> &[u8] {
        let start = lba as usize * JFS_BLOCK_SIZE;
        &self.storage[start..start + JFS_BLOCK_SIZE]
    }

    /// 获取整个镜像
    pub fn image(&self) -> &[u8] {
        &self.storage
    }

    /// 取出整个镜像
    pub fn into_image(self) -> Vec<u8> {
        self.storage
    }

    /// 设定写入预算：再成功写入 `n` 次后，之后的写入全部失败
    pub fn fail_after(&mut self, n: usize) {
        self.write_budget = Some(n);
    }

    /// 取消写入预算
    pub fn heal(&mut self) {
        self.write_budget = None;
    }

    /// 成功写入次数
    pub fn write_ops(&self) -> u64 {
        self.writes
    }

    fn range(&self, lba: u64, count: u32, buf_len: usize) -> Result<(usize, usize)> {
        let start = lba as usize * JFS_BLOCK_SIZE;
        let len = count as usize * JFS_BLOCK_SIZE;
        if buf_len < len || start + len > self.storage.len() {
            return Err(Error::new(ErrorKind::InvalidInput, "sector range out of device"));
        }
        Ok((start, len))
    }
}

impl BlockDevice for MemDevice {
    fn block_size(&self) -> u32 {
        JFS_BLOCK_SIZE as u32
    }

    fn sector_size(&self) -> u32 {
        JFS_BLOCK_SIZE as u32
    }

    fn total_blocks(&self) -> u64 {
        (self.storage.len() / JFS_BLOCK_SIZE) as u64
    }

    fn read_blocks(&mut self, lba: u64, count: u32, buf: &mut [u8]) -> Result<usize> {
        let (start, len) = self.range(lba, count, buf.len())?;
        buf[..len].copy_from_slice(&self.storage[start..start + len]);
        Ok(len)
    }

    fn write_blocks(&mut self, lba: u64, count: u32, buf: &[u8]) -> Result<usize> {
        let (start, len) = self.range(lba, count, buf.len())?;

        if let Some(budget) = self.write_budget.as_mut() {
            if *budget == 0 {
                return Err(Error::new(ErrorKind::Io, "injected write failure"));
            }
            *budget -= 1;
        }

        self.storage[start..start + len].copy_from_slice(&buf[..len]);
        self.writes += 1;
        Ok(len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_write() {
        let mut dev = MemDevice::new(4);
        assert_eq!(dev.total_blocks(), 4);

        dev.write_blocks(2, 1, &[0xCDu8; 512]).unwrap();
        let mut buf = [0u8; 512];
        dev.read_blocks(2, 1, &mut buf).unwrap();
        assert_eq!(buf[511], 0xCD);
        assert_eq!(dev.block(2)[0], 0xCD);
    }

    #[test]
    fn test_fail_after() {
        let mut dev = MemDevice::new(4);
        dev.fail_after(1);

        dev.write_blocks(0, 1, &[1u8; 512]).unwrap();
        let err = dev.write_blocks(1, 1, &[2u8; 512]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert_eq!(dev.block(1)[0], 0);

        dev.heal();
        dev.write_blocks(1, 1, &[2u8; 512]).unwrap();
        assert_eq!(dev.block(1)[0], 2);
        assert_eq!(dev.write_ops(), 2);
    }

    #[test]
    fn test_out_of_range() {
        let mut dev = MemDevice::new(2);
        let mut buf = [0u8; 512];
        assert!(dev.read_blocks(2, 1, &mut buf).is_err());
    }
}
