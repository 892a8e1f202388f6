//! Journal 磁盘格式
//!
//! commit block 布局（小端）：
//!
//! | 偏移 | 字段 |
//! |------|------|
//! | 0  | magic (`0x89ABCDEF`) |
//! | 4  | pending (0 / 1) |
//! | 8  | sum（CRC32，计算时该字段为 0） |
//! | 12 | blocknums[14]，哨兵为 `NO_BLOCK` |

use crate::consts::*;
use crate::crc::crc32;
use alloc::vec::Vec;
use byteorder::{ByteOrder, LittleEndian};

/// commit block（Journal Record）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitBlock {
    /// 是否已暂存但尚未应用
    pub pending: bool,
    /// 完整性字段
    pub sum: u32,
    /// 暂存索引 → 目标块号
    pub blocknums: [u32; INODE_BLOCK_PTRS],
}

impl CommitBlock {
    /// 已清除的记录
    pub fn cleared() -> Self {
        Self {
            pending: false,
            sum: 0,
            blocknums: [NO_BLOCK; INODE_BLOCK_PTRS],
        }
    }

    /// 构造 pending 记录，`dests[j]` 为第 `j` 个暂存块的目标
    ///
    /// 超出 `INODE_BLOCK_PTRS` 的部分被忽略，调用者负责限制长度。
    pub fn pending(dests: &[u32]) -> Self {
        let mut record = Self::cleared();
        for (slot, &dest) in record.blocknums.iter_mut().zip(dests) {
            *slot = dest;
        }
        record.pending = true;
        record.sum = record.compute_sum();
        record
    }

    /// 尝试把块解释为 commit block
    ///
    /// 魔数不符说明这是普通数据块，返回 `None`（不是错误）。
    pub fn probe(buf: &[u8]) -> Option<Self> {
        if buf.len() < JFS_COMMIT_BLOCK_LEN || LittleEndian::read_u32(&buf[0..4]) != JFS_COMMIT_MAGIC {
            return None;
        }

        let mut blocknums = [NO_BLOCK; INODE_BLOCK_PTRS];
        LittleEndian::read_u32_into(&buf[12..JFS_COMMIT_BLOCK_LEN], &mut blocknums);
        Some(Self {
            pending: LittleEndian::read_u32(&buf[4..8]) != 0,
            sum: LittleEndian::read_u32(&buf[8..12]),
            blocknums,
        })
    }

    /// 编码到块缓冲区前部，块的其余部分不变
    pub fn encode(&self, buf: &mut [u8]) {
        LittleEndian::write_u32(&mut buf[0..4], JFS_COMMIT_MAGIC);
        LittleEndian::write_u32(&mut buf[4..8], self.pending as u32);
        LittleEndian::write_u32(&mut buf[8..12], self.sum);
        LittleEndian::write_u32_into(&self.blocknums, &mut buf[12..JFS_COMMIT_BLOCK_LEN]);
    }

    /// 计算完整性字段（sum 置 0 后对编码结果做 CRC32）
    pub fn compute_sum(&self) -> u32 {
        let mut buf = [0u8; JFS_COMMIT_BLOCK_LEN];
        let unsealed = Self { sum: 0, ..self.clone() };
        unsealed.encode(&mut buf);
        crc32(&buf)
    }

    /// 完整性字段是否匹配
    pub fn verify(&self) -> bool {
        self.sum == self.compute_sum()
    }

    /// 第一个哨兵之前的映射数量
    pub fn mapped_prefix(&self) -> usize {
        self.blocknums.iter().take_while(|&&b| b != NO_BLOCK).count()
    }
}

/// 一个事务在 journal 文件中的位置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalLayout {
    /// 暂存数据块，按暂存索引排列
    pub staged_payload: Vec<u32>,
    /// commit block 所在块
    pub record_slot: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_probe() {
        let record = CommitBlock::pending(&[40, 41, 7]);
        let mut buf = [0u8; JFS_BLOCK_SIZE];
        record.encode(&mut buf);

        assert_eq!(LittleEndian::read_u32(&buf[0..4]), 0x89AB_CDEF);
        let decoded = CommitBlock::probe(&buf).unwrap();
        assert_eq!(decoded, record);
        assert!(decoded.pending);
        assert!(decoded.verify());
        assert_eq!(decoded.mapped_prefix(), 3);
        assert_eq!(decoded.blocknums[3], NO_BLOCK);
    }

    #[test]
    fn test_probe_ordinary_block() {
        let buf = [0x5Au8; JFS_BLOCK_SIZE];
        assert!(CommitBlock::probe(&buf).is_none());
    }

    #[test]
    fn test_checksum_detects_corruption() {
        let mut record = CommitBlock::pending(&[40, 41]);
        record.blocknums[1] = 99;
        assert!(!record.verify());
    }

    #[test]
    fn test_cleared() {
        let record = CommitBlock::cleared();
        assert!(!record.pending);
        assert_eq!(record.sum, 0);
        assert_eq!(record.mapped_prefix(), 0);
    }
}
