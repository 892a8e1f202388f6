//! 错误类型定义
//!
//! 提供 jfs 文件系统操作的错误类型。

use core::fmt;

/// jfs 操作错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    kind: ErrorKind,
    message: &'static str,
}

/// 错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// I/O 错误
    Io,
    /// 无效参数
    InvalidInput,
    /// 文件系统损坏
    Corrupted,
    /// 文件不存在
    NotFound,
    /// 已存在
    AlreadyExists,
    /// 空间不足（空闲块/空闲 inode/journal 槽位耗尽）
    NoSpace,
    /// 非法操作（例如删除 journal 文件）
    IllegalOperation,
    /// 无效状态
    InvalidState,
}

impl Error {
    /// 创建新错误
    pub const fn new(kind: ErrorKind, message: &'static str) -> Self {
        Self { kind, message }
    }

    /// 创建带原因的错误（简化版，忽略 cause）
    ///
    /// 注意：在 no_std 环境下，cause 参数会被忽略
    pub fn with_cause(kind: ErrorKind, message: &'static str, _cause: impl core::fmt::Debug) -> Self {
        Self { kind, message }
    }

    /// 获取错误类型
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// 获取错误消息
    pub const fn message(&self) -> &'static str {
        self.message
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

// Journal error conversion
impl From<crate::journal::JournalError> for Error {
    fn from(err: crate::journal::JournalError) -> Self {
        use crate::journal::JournalError;
        match err {
            JournalError::NoJournalInode => Error::new(ErrorKind::NotFound, "Journal file .log not found"),
            JournalError::TooSmall => Error::new(ErrorKind::Corrupted, "Journal file has too few blocks"),
            JournalError::NoSpace => Error::new(ErrorKind::NoSpace, "Journal has no free slot"),
            JournalError::PendingTransaction => {
                Error::new(ErrorKind::InvalidState, "A journal transaction is still pending")
            }
            JournalError::BadMapping => Error::new(ErrorKind::InvalidInput, "Invalid staged block mapping"),
            JournalError::NotPending => Error::new(ErrorKind::InvalidState, "Transaction is not pending"),
        }
    }
}

/// Result 类型别名
pub type Result<T> = core::result::Result<T, Error>;
