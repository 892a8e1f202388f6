//! jfs Journal 实现
//!
//! 这个模块提供崩溃一致性：多块修改先写入 journal 文件（`/.log`），
//! 再原地应用。
//!
//! # 架构概述
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │         文件操作（remove_file / create_file / mkdir）       │
//! └───────────────────────┬──────────────────────────────────┘
//!                         ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │  JournalTrans：事务内的块覆盖层（读己之写），commit 时提交   │
//! └───────────────────────┬──────────────────────────────────┘
//!                         ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │  JournalWriter：begin → stage → mark_pending → commit      │
//! │  recovery：扫描 journal，重放 pending 记录                  │
//! │  两者共用 apply_record                                      │
//! └───────────────────────┬──────────────────────────────────┘
//!                         ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │                BlockDev（flush 作为写屏障）                 │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! # 磁盘格式
//!
//! journal 文件的块指针数组既是暂存数据块的有序列表，又在其中一个槽位
//! 存放 commit block：暂存了 `k` 个块时，commit block 写在第 `k` 个槽位。
//! 内存中用 [`JournalLayout`] 的两个字段分别表示这两种用途。
//!
//! # 提交顺序
//!
//! 1. 暂存数据块写入 journal 槽位，flush
//! 2. 写入 `pending = true` 的 commit block，flush
//! 3. 把暂存块复制到目标位置，flush
//! 4. 原地清除 commit block，flush
//!
//! 在 2 之前崩溃：没有 pending 记录，原地数据未被修改。
//! 在 2 之后崩溃：挂载时 recovery 执行与 3、4 相同的步骤。

mod types;
mod journal_file;
mod writer;
mod recovery;
mod trans;

pub use types::{CommitBlock, JournalLayout};
pub use journal_file::JournalFile;
pub use writer::JournalWriter;
pub use recovery::{apply_record, pending_slots, recover};
pub use trans::{JournalTrans, TransactionState};

/// Journal 错误
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JournalError {
    /// 根目录中没有 `.log`
    NoJournalInode,
    /// journal 文件的可用块太少
    TooSmall,
    /// journal 槽位不足以容纳事务
    NoSpace,
    /// 已有 pending 记录，不能开始新事务
    PendingTransaction,
    /// 暂存映射无效（索引未暂存、重复或目标块非法）
    BadMapping,
    /// 事务还没有标记为 pending
    NotPending,
}

impl core::fmt::Display for JournalError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            JournalError::NoJournalInode => write!(f, "Journal file not found"),
            JournalError::TooSmall => write!(f, "Journal file too small"),
            JournalError::NoSpace => write!(f, "Journal has no space"),
            JournalError::PendingTransaction => write!(f, "A journal transaction is pending"),
            JournalError::BadMapping => write!(f, "Invalid staged block mapping"),
            JournalError::NotPending => write!(f, "Transaction is not pending"),
        }
    }
}
