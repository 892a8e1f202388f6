//! journal 文件定位

use super::{JournalError, JournalLayout};
use crate::{
    block::{BlockDev, BlockDevice},
    consts::*,
    dir::lookup_entry,
    error::Result,
    inode::read_inode,
    superblock::Superblock,
};
use alloc::vec::Vec;

/// journal 文件（根目录下的 `.log`）
///
/// `slots` 是 journal inode 开头连续的有效块指针。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalFile {
    ino: u32,
    slots: Vec<u32>,
}

impl JournalFile {
    /// 在根目录中查找 journal 文件
    ///
    /// 找不到 `.log` 是致命错误（`NoJournalInode`）。
    /// 块指针在第一个哨兵或非法块号处截断；可用槽位少于 2 个时返回 `TooSmall`。
    pub fn locate<D: BlockDevice>(bdev: &mut BlockDev<D>, sb: &Superblock) -> Result<Self> {
        let entry = lookup_entry(bdev, sb, sb.root_inode(), JFS_JOURNAL_NAME)?
            .ok_or(JournalError::NoJournalInode)?;
        let inode = read_inode(bdev, sb, entry.inode)?;
        if !inode.is_file() {
            return Err(JournalError::NoJournalInode.into());
        }

        let mut slots = Vec::with_capacity(INODE_BLOCK_PTRS);
        for &ptr in inode.blockptrs.iter() {
            if ptr == NO_BLOCK {
                break;
            }
            if sb.is_metadata_block(ptr) || ptr >= sb.total_blocks() {
                log::warn!("[JOURNAL] journal pointer {} is invalid, truncating at slot {}", ptr, slots.len());
                break;
            }
            slots.push(ptr);
        }

        if slots.len() < 2 {
            return Err(JournalError::TooSmall.into());
        }

        log::trace!("[JOURNAL] journal inode {} with {} slots", entry.inode, slots.len());
        Ok(Self { ino: entry.inode, slots })
    }

    /// journal inode 编号
    pub fn ino(&self) -> u32 {
        self.ino
    }

    /// 全部槽位对应的块号
    pub fn slots(&self) -> &[u32] {
        &self.slots
    }

    /// 槽位数量
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// 单个事务最多能暂存的块数（留一个槽位给 commit block）
    pub fn max_staged(&self) -> usize {
        self.slots.len() - 1
    }

    /// 块号是否属于 journal
    pub fn contains(&self, block: u32) -> bool {
        self.slots.contains(&block)
    }

    /// commit block 位于第 `record_index` 个槽位时的事务布局
    pub fn layout(&self, record_index: usize) -> JournalLayout {
        JournalLayout {
            staged_payload: self.slots[..record_index].to_vec(),
            record_slot: self.slots[record_index],
        }
    }
}
