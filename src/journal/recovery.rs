//! Journal 恢复逻辑
//!
//! 挂载时无条件执行：扫描 journal 文件的每个槽位，重放并清除 pending 记录。
//! 重放与正常提交使用同一个 [`apply_record`]，所以恢复可以重复执行，
//! 第二次执行不会再应用任何记录。

use super::{CommitBlock, JournalFile, JournalLayout};
use crate::{
    block::{BlockDev, BlockDevice},
    consts::*,
    error::Result,
    superblock::Superblock,
};
use alloc::vec;
use alloc::vec::Vec;

/// 执行 journal 恢复
///
/// # 参数
///
/// * `bdev` - 块设备引用
/// * `sb` - 文件系统 superblock
///
/// # 返回
///
/// 完成的事务数
///
/// # 恢复流程
///
/// 对第 `i` 个槽位：
/// 1. 魔数不符：普通数据块，跳过
/// 2. 不是 pending：事务已经完成，跳过
/// 3. 完整性字段不符：记录被撕裂或损坏，不重放，清除记录并告警
/// 4. 否则把第 `0..i` 个槽位的暂存块复制到记录中的目标块，再清除记录
///
/// journal 文件不存在是致命错误；单个损坏的槽位不会让整个恢复失败。
pub fn recover<D: BlockDevice>(bdev: &mut BlockDev<D>, sb: &Superblock) -> Result<usize> {
    let journal = JournalFile::locate(bdev, sb)?;
    let mut completed = 0;

    for index in 0..journal.capacity() {
        let slot = journal.slots()[index];
        let buf = bdev.read_block_vec(slot as u64)?;

        let Some(record) = CommitBlock::probe(&buf) else {
            continue;
        };
        if !record.pending {
            continue;
        }
        if !record.verify() {
            // 没有通过校验的记录从未到达提交点，目标块还没被改动过
            log::warn!(
                "[RECOVERY] journal slot {} (block {}) has a pending record with a bad checksum, discarding",
                index,
                slot
            );
            discard_record(bdev, slot)?;
            continue;
        }

        let layout = journal.layout(index);
        log::info!(
            "[RECOVERY] replaying pending record in slot {} ({} staged blocks)",
            index,
            layout.staged_payload.len()
        );
        apply_record(bdev, &layout, &record)?;
        completed += 1;
    }

    if completed > 0 {
        log::info!("[RECOVERY] completed {} pending transactions", completed);
    } else {
        log::debug!("[RECOVERY] journal clean");
    }
    Ok(completed)
}

/// 重放一条记录并原地清除它
///
/// 提交和恢复共用的算法：
///
/// 1. 对每个暂存索引 `j`，把 `staged_payload[j]` 的内容复制到 `blocknums[j]`；
///    遇到哨兵或越界的目标块时停止（只重放有效前缀）
/// 2. flush
/// 3. 把清除后的记录写回 `record_slot`，flush
///
/// # 返回
///
/// 实际复制的块数
pub fn apply_record<D: BlockDevice>(
    bdev: &mut BlockDev<D>,
    layout: &JournalLayout,
    record: &CommitBlock,
) -> Result<usize> {
    let total_blocks = bdev.total_blocks();
    let mut applied = 0;

    for (index, &source) in layout.staged_payload.iter().enumerate() {
        let Some(&dest) = record.blocknums.get(index) else {
            break;
        };
        if dest == NO_BLOCK {
            log::debug!("[RECOVERY] mapping ends early at index {}", index);
            break;
        }
        if dest as u64 >= total_blocks {
            log::warn!("[RECOVERY] destination block {} out of range, truncating replay", dest);
            break;
        }

        let payload = bdev.read_block_vec(source as u64)?;
        bdev.write_block(dest as u64, &payload)?;
        applied += 1;
    }
    bdev.flush()?;

    let mut buf = vec![0u8; bdev.block_size() as usize];
    CommitBlock::cleared().encode(&mut buf);
    bdev.write_block(layout.record_slot as u64, &buf)?;
    bdev.flush()?;

    Ok(applied)
}

/// 不重放，直接把槽位改写为已清除的记录
fn discard_record<D: BlockDevice>(bdev: &mut BlockDev<D>, slot: u32) -> Result<()> {
    let mut buf = vec![0u8; bdev.block_size() as usize];
    CommitBlock::cleared().encode(&mut buf);
    bdev.write_block(slot as u64, &buf)?;
    bdev.flush()
}

/// 列出所有 pending 记录所在的槽位（不检查完整性字段）
pub fn pending_slots<D: BlockDevice>(bdev: &mut BlockDev<D>, journal: &JournalFile) -> Result<Vec<usize>> {
    let mut pending = Vec::new();
    for (index, &slot) in journal.slots().iter().enumerate() {
        let buf = bdev.read_block_vec(slot as u64)?;
        if CommitBlock::probe(&buf).is_some_and(|r| r.pending) {
            pending.push(index);
        }
    }
    Ok(pending)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::MemDevice;
    use crate::error::ErrorKind;
    use crate::fs::JfsFileSystem;
    use crate::journal::JournalWriter;

    fn formatted() -> (BlockDev<MemDevice>, Superblock) {
        let fs = JfsFileSystem::format(MemDevice::new(128)).unwrap();
        let sb = *fs.superblock();
        let dev = fs.unmount().unwrap();
        (BlockDev::new(dev).unwrap(), sb)
    }

    /// 暂存并标记 pending，但不提交（模拟在 mark_pending 之后崩溃）
    fn leave_pending(bdev: &mut BlockDev<MemDevice>, sb: &Superblock, writes: &[(u32, u8)]) -> JournalLayout {
        let mut writer = JournalWriter::begin(bdev, sb).unwrap();
        let mut mapping = Vec::new();
        for &(dest, fill) in writes {
            let idx = writer.stage(bdev, &[fill; JFS_BLOCK_SIZE]).unwrap();
            mapping.push((idx, dest));
        }
        writer.mark_pending(bdev, &mapping).unwrap();
        writer.layout()
    }

    #[test]
    fn test_recover_clean_journal() {
        let (mut bdev, sb) = formatted();
        let before = bdev.device().image().to_vec();

        assert_eq!(recover(&mut bdev, &sb).unwrap(), 0);
        assert_eq!(bdev.device().image(), &before[..]);
    }

    #[test]
    fn test_recover_replays_pending() {
        let (mut bdev, sb) = formatted();
        let layout = leave_pending(&mut bdev, &sb, &[(100, 0x11), (101, 0x22)]);
        assert_eq!(bdev.device().block(100)[0], 0);

        assert_eq!(recover(&mut bdev, &sb).unwrap(), 1);
        assert_eq!(bdev.device().block(100)[0], 0x11);
        assert_eq!(bdev.device().block(101)[0], 0x22);

        let record = CommitBlock::probe(bdev.device().block(layout.record_slot as u64)).unwrap();
        assert_eq!(record, CommitBlock::cleared());
    }

    #[test]
    fn test_recover_is_idempotent() {
        let (mut bdev, sb) = formatted();
        leave_pending(&mut bdev, &sb, &[(100, 0x11), (sb.block_bitmap(), 0xFF)]);

        assert_eq!(recover(&mut bdev, &sb).unwrap(), 1);
        let after_first = bdev.device().image().to_vec();

        // 第一次恢复之后改动目标块，第二次恢复不能把旧记录再应用一遍
        bdev.write_block(100, &[0x99u8; JFS_BLOCK_SIZE]).unwrap();
        assert_eq!(recover(&mut bdev, &sb).unwrap(), 0);
        assert_eq!(bdev.device().block(100)[0], 0x99);

        bdev.write_block(100, &after_first[100 * JFS_BLOCK_SIZE..101 * JFS_BLOCK_SIZE]).unwrap();
        assert_eq!(bdev.device().image(), &after_first[..]);
    }

    #[test]
    fn test_commit_equals_recovery() {
        let (mut committed, sb) = formatted();
        let mut crashed = BlockDev::new(committed.device().clone()).unwrap();
        let writes = [(100u32, 0x31u8), (sb.inode_table(), 0x32), (102, 0x33)];

        // 正常提交
        let mut writer = JournalWriter::begin(&mut committed, &sb).unwrap();
        let mut mapping = Vec::new();
        for &(dest, fill) in &writes {
            mapping.push((writer.stage(&mut committed, &[fill; JFS_BLOCK_SIZE]).unwrap(), dest));
        }
        writer.mark_pending(&mut committed, &mapping).unwrap();
        writer.commit(&mut committed).unwrap();

        // mark_pending 之后崩溃，再恢复
        leave_pending(&mut crashed, &sb, &writes);
        let crashed_dev = crashed.into_device();
        let mut crashed = BlockDev::new(crashed_dev).unwrap();
        assert_eq!(recover(&mut crashed, &sb).unwrap(), 1);

        assert_eq!(committed.device().image(), crashed.device().image());
    }

    #[test]
    fn test_bad_checksum_discarded() {
        let (mut bdev, sb) = formatted();
        let layout = leave_pending(&mut bdev, &sb, &[(100, 0x11)]);

        // 撕裂的记录：映射被改写但完整性字段没有更新
        let mut buf = bdev.read_block_vec(layout.record_slot as u64).unwrap();
        let mut record = CommitBlock::probe(&buf).unwrap();
        record.blocknums[0] = 101;
        record.encode(&mut buf);
        bdev.write_block(layout.record_slot as u64, &buf).unwrap();

        assert_eq!(recover(&mut bdev, &sb).unwrap(), 0);
        assert_eq!(bdev.device().block(100)[0], 0);
        assert_eq!(bdev.device().block(101)[0], 0);

        // 损坏的记录被清除，之后可以开始新的事务
        let journal = JournalFile::locate(&mut bdev, &sb).unwrap();
        assert!(pending_slots(&mut bdev, &journal).unwrap().is_empty());
        assert!(JournalWriter::begin(&mut bdev, &sb).is_ok());
    }

    #[test]
    fn test_mount_after_torn_record_is_writable() {
        let (mut bdev, sb) = formatted();
        let layout = leave_pending(&mut bdev, &sb, &[(100, 0x11)]);

        let mut buf = bdev.read_block_vec(layout.record_slot as u64).unwrap();
        let mut record = CommitBlock::probe(&buf).unwrap();
        record.blocknums[0] = 101;
        record.encode(&mut buf);
        bdev.write_block(layout.record_slot as u64, &buf).unwrap();

        let mut fs = JfsFileSystem::mount(bdev.into_device()).unwrap();
        assert_eq!(fs.pending_records().unwrap(), 0);
        fs.create_file("after", b"ok").unwrap();
        assert_eq!(fs.read_file("after").unwrap(), b"ok");
    }

    #[test]
    fn test_replay_bounded_by_record_slot() {
        let (mut bdev, sb) = formatted();
        let journal = JournalFile::locate(&mut bdev, &sb).unwrap();

        // 记录位于槽位 1，只有槽位 0 是它的暂存块；槽位 2 属于别的数据
        bdev.write_block(journal.slots()[0] as u64, &[0x51u8; JFS_BLOCK_SIZE]).unwrap();
        bdev.write_block(journal.slots()[2] as u64, &[0x53u8; JFS_BLOCK_SIZE]).unwrap();
        let record = CommitBlock::pending(&[100, 101, 102]);
        let mut buf = vec![0u8; JFS_BLOCK_SIZE];
        record.encode(&mut buf);
        bdev.write_block(journal.slots()[1] as u64, &buf).unwrap();

        assert_eq!(recover(&mut bdev, &sb).unwrap(), 1);
        assert_eq!(bdev.device().block(100)[0], 0x51);
        assert_eq!(bdev.device().block(101)[0], 0);
        assert_eq!(bdev.device().block(102)[0], 0);
        assert!(pending_slots(&mut bdev, &journal).unwrap().is_empty());
    }

    #[test]
    fn test_early_sentinel_truncates_replay() {
        let (mut bdev, sb) = formatted();
        let journal = JournalFile::locate(&mut bdev, &sb).unwrap();

        // 三个暂存块，但记录在索引 1 处就出现哨兵
        for (index, fill) in [0x41u8, 0x42, 0x43].into_iter().enumerate() {
            bdev.write_block(journal.slots()[index] as u64, &[fill; JFS_BLOCK_SIZE]).unwrap();
        }
        let record = CommitBlock::pending(&[100, NO_BLOCK, 102]);
        let mut buf = vec![0u8; JFS_BLOCK_SIZE];
        record.encode(&mut buf);
        bdev.write_block(journal.slots()[3] as u64, &buf).unwrap();

        assert_eq!(recover(&mut bdev, &sb).unwrap(), 1);
        assert_eq!(bdev.device().block(100)[0], 0x41);
        assert_eq!(bdev.device().block(102)[0], 0);
        assert!(pending_slots(&mut bdev, &journal).unwrap().is_empty());
    }

    #[test]
    fn test_stray_magic_in_payload_ignored() {
        let (mut bdev, sb) = formatted();
        let journal = JournalFile::locate(&mut bdev, &sb).unwrap();

        // 非 pending 的旧记录和普通数据块都被当作普通块
        let mut buf = vec![0u8; JFS_BLOCK_SIZE];
        CommitBlock::cleared().encode(&mut buf);
        bdev.write_block(journal.slots()[2] as u64, &buf).unwrap();
        bdev.write_block(journal.slots()[3] as u64, &[0xEFu8; JFS_BLOCK_SIZE]).unwrap();

        assert_eq!(recover(&mut bdev, &sb).unwrap(), 0);
    }

    #[test]
    fn test_missing_journal_is_fatal() {
        let (mut bdev, sb) = formatted();
        let root = crate::inode::read_inode(&mut bdev, &sb, sb.root_inode()).unwrap();
        let dir_block = root.blockptrs[0] as u64;

        // 把根目录中的 ".log" 改名为 ".lgg"
        let mut buf = bdev.read_block_vec(dir_block).unwrap();
        let entry = crate::dir::find_entry(&buf, root.live_len(), JFS_JOURNAL_NAME).unwrap().unwrap();
        buf[entry.offset + DIR_ENTRY_HEADER_LEN + 2] = b'g';
        bdev.write_block(dir_block, &buf).unwrap();

        let err = recover(&mut bdev, &sb).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
