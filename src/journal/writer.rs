//! Journal 写入端：暂存、标记 pending、提交

use super::{apply_record, pending_slots, CommitBlock, JournalError, JournalFile, JournalLayout};
use crate::{
    block::{BlockDev, BlockDevice},
    consts::*,
    error::{Error, ErrorKind, Result},
    superblock::Superblock,
};
use alloc::vec;

/// 写入端状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriterState {
    /// 正在暂存数据块
    Staging,
    /// commit block 已写入，等待应用
    Pending,
}

/// Journal 写入端
///
/// 一次只处理一个事务：
///
/// ```rust,ignore
/// let mut writer = JournalWriter::begin(&mut bdev, &sb)?;
/// let idx = writer.stage(&mut bdev, &new_bitmap)?;
/// writer.mark_pending(&mut bdev, &[(idx, sb.block_bitmap())])?;
/// writer.commit(&mut bdev)?;
/// ```
#[derive(Debug)]
pub struct JournalWriter {
    journal: JournalFile,
    total_blocks: u32,
    staged: usize,
    state: WriterState,
}

impl JournalWriter {
    /// 开始一个事务
    ///
    /// journal 中已有 pending 记录时返回 `PendingTransaction`：
    /// 同一时刻最多只能有一个 pending 事务，调用者应先执行恢复。
    pub fn begin<D: BlockDevice>(bdev: &mut BlockDev<D>, sb: &Superblock) -> Result<Self> {
        let journal = JournalFile::locate(bdev, sb)?;

        if !pending_slots(bdev, &journal)?.is_empty() {
            log::warn!("[JOURNAL] refusing to begin: a pending record must be recovered first");
            return Err(JournalError::PendingTransaction.into());
        }

        log::trace!("[JOURNAL] begin transaction, {} slots available", journal.max_staged());
        Ok(Self {
            journal,
            total_blocks: sb.total_blocks(),
            staged: 0,
            state: WriterState::Staging,
        })
    }

    /// 已暂存的块数
    pub fn staged_count(&self) -> usize {
        self.staged
    }

    /// 单个事务最多能暂存的块数
    pub fn max_staged(&self) -> usize {
        self.journal.max_staged()
    }

    /// 当前事务的布局（commit block 紧跟最后一个暂存块）
    pub fn layout(&self) -> JournalLayout {
        self.journal.layout(self.staged)
    }

    /// 暂存一个数据块
    ///
    /// # 参数
    ///
    /// * `payload` - 目标块的新内容
    ///
    /// # 返回
    ///
    /// 暂存索引；槽位用尽时返回 `NoSpace`
    pub fn stage<D: BlockDevice>(&mut self, bdev: &mut BlockDev<D>, payload: &[u8]) -> Result<usize> {
        if self.state != WriterState::Staging {
            return Err(JournalError::PendingTransaction.into());
        }
        if self.staged >= self.journal.max_staged() {
            return Err(JournalError::NoSpace.into());
        }

        let index = self.staged;
        let slot = self.journal.slots()[index];
        bdev.write_block(slot as u64, payload)?;
        self.staged += 1;

        log::trace!("[JOURNAL] staged index {} into journal block {}", index, slot);
        Ok(index)
    }

    /// 写入 pending commit block
    ///
    /// `mapping` 必须恰好覆盖每个暂存索引一次，目标块必须在卷内且不属于 journal。
    /// 先 flush 暂存块，再写 commit block 并 flush。
    pub fn mark_pending<D: BlockDevice>(&mut self, bdev: &mut BlockDev<D>, mapping: &[(usize, u32)]) -> Result<()> {
        if self.state != WriterState::Staging {
            return Err(JournalError::PendingTransaction.into());
        }

        let mut dests = vec![NO_BLOCK; self.staged];
        for &(index, dest) in mapping {
            if index >= self.staged || dests[index] != NO_BLOCK {
                return Err(JournalError::BadMapping.into());
            }
            if dest == NO_BLOCK || dest >= self.total_blocks || self.journal.contains(dest) {
                return Err(JournalError::BadMapping.into());
            }
            dests[index] = dest;
        }
        if dests.contains(&NO_BLOCK) {
            return Err(JournalError::BadMapping.into());
        }

        // 暂存块必须先于 commit block 落盘
        bdev.flush()?;

        let record = CommitBlock::pending(&dests);
        let record_slot = self.journal.slots()[self.staged];
        let mut buf = vec![0u8; JFS_BLOCK_SIZE];
        record.encode(&mut buf);
        bdev.write_block(record_slot as u64, &buf)?;
        bdev.flush()?;

        self.state = WriterState::Pending;
        log::debug!(
            "[JOURNAL] transaction pending: {} blocks, record in journal block {}",
            self.staged,
            record_slot
        );
        Ok(())
    }

    /// 提交事务
    ///
    /// 重新读出刚写入的 commit block，走与恢复完全相同的
    /// [`apply_record`] 流程：复制暂存块到目标位置，然后原地清除记录。
    pub fn commit<D: BlockDevice>(self, bdev: &mut BlockDev<D>) -> Result<()> {
        if self.state != WriterState::Pending {
            return Err(JournalError::NotPending.into());
        }

        let layout = self.layout();
        let buf = bdev.read_block_vec(layout.record_slot as u64)?;
        let record = CommitBlock::probe(&buf)
            .filter(|r| r.pending)
            .ok_or(Error::new(ErrorKind::Corrupted, "Pending journal record vanished"))?;

        let applied = apply_record(bdev, &layout, &record)?;
        log::debug!("[JOURNAL] committed {} blocks", applied);
        Ok(())
    }
}
