//! 事务：journal 保护的块修改
//!
//! ## 工作原理
//!
//! 1. **记录修改**: 修改过的块保存在事务自己的覆盖层中，不写入 `BlockDev`
//! 2. **读己之写**: 事务内的读取优先返回覆盖层中的内容
//! 3. **提交**: 覆盖层中的每个块经 [`JournalWriter`] 暂存、标记 pending、提交
//! 4. **回滚**: 丢弃覆盖层即可，磁盘上什么都没有发生
//!
//! 新分配块上的文件内容通过 [`JournalTrans::write_ordered`] 直接写入原位置：
//! 这些块在事务提交前不被任何 inode 引用，崩溃后也只是未使用块里的残留数据。
//! commit block 写入前的 flush 保证它们先于元数据落盘。

use super::{JournalError, JournalWriter};
use crate::{
    block::{BlockDev, BlockDevice},
    error::{Error, ErrorKind, Result},
    superblock::Superblock,
};
use alloc::collections::BTreeMap;
use alloc::vec::Vec;

/// 事务状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    /// 事务活跃，可以进行修改
    Active,
    /// 事务已提交
    Committed,
    /// 事务已回滚
    Aborted,
}

/// journal 事务
///
/// 持有 `&mut BlockDev`，同一时刻只能有一个事务。
///
/// ```rust,ignore
/// let mut trans = JournalTrans::begin(&mut bdev, &sb)?;
/// trans.modify_block(lba, |data| data[0] = 0x42)?;
/// trans.commit()?;
/// ```
pub struct JournalTrans<'a, D: BlockDevice> {
    /// 块设备引用
    bdev: &'a mut BlockDev<D>,
    /// 文件系统 superblock
    sb: Superblock,
    /// 块号 → 新内容
    writes: BTreeMap<u64, Vec<u8>>,
    /// 事务状态
    state: TransactionState,
}

impl<'a, D: BlockDevice> JournalTrans<'a, D> {
    /// 开始新事务
    pub fn begin(bdev: &'a mut BlockDev<D>, sb: &Superblock) -> Result<Self> {
        Ok(Self {
            bdev,
            sb: *sb,
            writes: BTreeMap::new(),
            state: TransactionState::Active,
        })
    }

    /// 文件系统 superblock
    pub fn superblock(&self) -> &Superblock {
        &self.sb
    }

    /// 事务状态
    pub fn state(&self) -> TransactionState {
        self.state
    }

    /// 已修改的块数
    pub fn dirty_count(&self) -> usize {
        self.writes.len()
    }

    /// 读取块（能看到本事务之前的修改）
    pub fn read_block(&mut self, lba: u64) -> Result<Vec<u8>> {
        self.check_active()?;
        match self.writes.get(&lba) {
            Some(data) => Ok(data.clone()),
            None => self.bdev.read_block_vec(lba),
        }
    }

    /// 在事务中写入整块
    pub fn write_block(&mut self, lba: u64, data: &[u8]) -> Result<()> {
        self.check_active()?;
        let block_size = self.bdev.block_size() as usize;
        if data.len() != block_size {
            return Err(Error::new(ErrorKind::InvalidInput, "Transaction write must be exactly one block"));
        }
        self.bdev.check_lba(lba)?;
        self.writes.insert(lba, data.to_vec());
        Ok(())
    }

    /// 读改写一个块
    pub fn modify_block<F, R>(&mut self, lba: u64, f: F) -> Result<R>
    where
        F: FnOnce(&mut [u8]) -> R,
    {
        let mut data = self.read_block(lba)?;
        let result = f(&mut data);
        self.write_block(lba, &data)?;
        Ok(result)
    }

    /// 直接写入新分配块的内容（不经过 journal）
    ///
    /// 只能用于本事务新分配、尚未被任何 inode 引用的块。
    pub fn write_ordered(&mut self, lba: u64, data: &[u8]) -> Result<()> {
        self.check_active()?;
        self.bdev.write_block(lba, data)?;
        Ok(())
    }

    /// 提交事务
    ///
    /// # 返回
    ///
    /// 提交的块数
    ///
    /// # 错误
    ///
    /// - `InvalidState`: 事务不活跃，或者 journal 中还有 pending 记录
    /// - `NoSpace`: 修改的块数超过 journal 容量
    /// - I/O 错误：事务可能已经 pending，下次挂载时由恢复完成
    pub fn commit(mut self) -> Result<usize> {
        self.check_active()?;
        self.state = TransactionState::Committed;

        let writes = core::mem::take(&mut self.writes);
        if writes.is_empty() {
            self.bdev.flush()?;
            return Ok(0);
        }

        let mut writer = JournalWriter::begin(self.bdev, &self.sb)?;
        if writes.len() > writer.max_staged() {
            log::warn!(
                "[JOURNAL] transaction touches {} blocks, journal holds {}",
                writes.len(),
                writer.max_staged()
            );
            return Err(JournalError::NoSpace.into());
        }

        let mut mapping = Vec::with_capacity(writes.len());
        for (&lba, data) in writes.iter() {
            let index = writer.stage(self.bdev, data)?;
            mapping.push((index, lba as u32));
        }

        writer.mark_pending(self.bdev, &mapping)?;
        writer.commit(self.bdev)?;
        Ok(writes.len())
    }

    /// 回滚事务
    pub fn abort(mut self) {
        self.abort_internal();
    }

    fn abort_internal(&mut self) {
        if self.state == TransactionState::Active {
            if !self.writes.is_empty() {
                log::debug!("[JOURNAL] discarding {} uncommitted blocks", self.writes.len());
            }
            self.state = TransactionState::Aborted;
            self.writes.clear();
        }
    }

    /// 检查事务是否活跃
    fn check_active(&self) -> Result<()> {
        if self.state != TransactionState::Active {
            return Err(Error::new(ErrorKind::InvalidState, "Transaction is not active"));
        }
        Ok(())
    }
}

impl<'a, D: BlockDevice> Drop for JournalTrans<'a, D> {
    /// 自动回滚未提交的事务
    fn drop(&mut self) {
        self.abort_internal();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::MemDevice;
    use crate::consts::JFS_BLOCK_SIZE;
    use crate::fs::JfsFileSystem;

    fn formatted() -> (BlockDev<MemDevice>, Superblock) {
        let fs = JfsFileSystem::format(MemDevice::new(128)).unwrap();
        let sb = *fs.superblock();
        let dev = fs.unmount().unwrap();
        (BlockDev::new(dev).unwrap(), sb)
    }

    #[test]
    fn test_read_your_writes() {
        let (mut bdev, sb) = formatted();
        let mut trans = JournalTrans::begin(&mut bdev, &sb).unwrap();

        trans.modify_block(100, |data| data[0] = 7).unwrap();
        trans.modify_block(100, |data| data[1] = 8).unwrap();
        let data = trans.read_block(100).unwrap();
        assert_eq!(&data[..2], &[7, 8]);
        assert_eq!(trans.dirty_count(), 1);

        assert_eq!(trans.commit().unwrap(), 1);
        assert_eq!(&bdev.device().block(100)[..2], &[7, 8]);
    }

    #[test]
    fn test_drop_discards_writes() {
        let (mut bdev, sb) = formatted();
        let before = bdev.device().image().to_vec();
        {
            let mut trans = JournalTrans::begin(&mut bdev, &sb).unwrap();
            trans.write_block(100, &[0xAAu8; JFS_BLOCK_SIZE]).unwrap();
        }
        assert_eq!(bdev.device().image(), &before[..]);
    }

    #[test]
    fn test_too_many_blocks() {
        let (mut bdev, sb) = formatted();
        let mut trans = JournalTrans::begin(&mut bdev, &sb).unwrap();
        for lba in 100..114 {
            trans.write_block(lba, &[1u8; JFS_BLOCK_SIZE]).unwrap();
        }
        let err = trans.commit().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoSpace);
        assert_eq!(bdev.device().block(100)[0], 0);
    }

    #[test]
    fn test_partial_block_write_rejected() {
        let (mut bdev, sb) = formatted();
        let mut trans = JournalTrans::begin(&mut bdev, &sb).unwrap();
        let err = trans.write_block(100, &[1u8; 10]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }
}
