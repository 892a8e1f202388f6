//! 文件删除
//!
//! 删除涉及块位图、inode 位图、inode 表、父目录块四类元数据块，
//! 全部放在同一个 journal 事务中：崩溃后要么文件完整存在，
//! 要么恢复程序把删除补完，不会出现只改了一部分的状态。

use super::filesystem::JfsFileSystem;
use crate::{
    balloc::reclaim_blocks,
    block::BlockDevice,
    consts::*,
    dir::{find_root, remove_entry, resolve_path, split_path},
    error::{Error, ErrorKind, Result},
    ialloc::reclaim_inode,
    inode::{load_inode, store_inode, InodeType},
    journal::JournalTrans,
};
use alloc::vec::Vec;

impl<D: BlockDevice> JfsFileSystem<D> {
    /// 删除普通文件
    ///
    /// # 参数
    ///
    /// * `path` - 文件路径（从根目录开始，开头的 `/` 可省略）
    ///
    /// # 错误
    ///
    /// - `InvalidState` - 尚未执行 journal 恢复
    /// - `IllegalOperation` - 目标是 journal 文件
    /// - `NotFound` - 路径不存在，或者不是普通文件
    /// - I/O 错误 - 事务可能已经 pending，下次挂载时完成
    ///
    /// 合法性检查全部在事务开始之前完成，失败时磁盘不会有任何修改。
    pub fn remove_file(&mut self, path: &str) -> Result<()> {
        self.require_recovered()?;

        let (parent_path, leaf) = split_path(path);
        if leaf.is_empty() {
            return Err(Error::new(ErrorKind::NotFound, "Empty file name"));
        }

        let root = find_root(&self.sb);
        let ino = resolve_path(&mut self.bdev, &self.sb, path, root, InodeType::File)?;
        if leaf == JFS_JOURNAL_NAME || ino == self.journal_ino {
            log::warn!("[RM] refusing to remove journal file {}", path);
            return Err(Error::new(ErrorKind::IllegalOperation, "Cannot remove the journal file"));
        }
        let parent_ino = resolve_path(&mut self.bdev, &self.sb, parent_path, root, InodeType::Directory)?;

        let mut trans = JournalTrans::begin(&mut self.bdev, &self.sb)?;

        let inode = load_inode(&mut trans, ino)?;
        let blocks: Vec<u32> = inode.data_blocks()?.to_vec();
        reclaim_blocks(&mut trans, &blocks)?;
        reclaim_inode(&mut trans, ino)?;

        let mut parent = load_inode(&mut trans, parent_ino)?;
        let dir_block = parent.blockptrs[0];
        if dir_block == NO_BLOCK {
            return Err(Error::new(ErrorKind::Corrupted, "Parent directory has no data block"));
        }
        let live_len = parent.live_len();
        let removed = trans.modify_block(dir_block as u64, |data| remove_entry(data, live_len, leaf))??;
        parent.size = parent.size.saturating_sub(removed as u32);
        store_inode(&mut trans, parent_ino, &parent)?;

        let committed = trans.commit()?;
        log::info!(
            "[RM] removed {} (inode {}, {} data blocks, {} metadata blocks journaled)",
            path,
            ino,
            blocks.len(),
            committed
        );
        Ok(())
    }
}
