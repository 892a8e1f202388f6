//! 路径查找
//!
//! 路径以 `/` 分隔，开头的 `/` 会被去掉，空的路径分量被忽略。
//! 路径解析只读，不经过事务。

use super::entry::{find_entry, read_entries, DirEntry};
use crate::{
    block::{BlockDev, BlockDevice},
    consts::NO_BLOCK,
    error::{Error, ErrorKind, Result},
    inode::{read_inode, Inode, InodeType},
    superblock::Superblock,
};
use alloc::vec::Vec;

/// 把路径拆成 `(父目录路径, 最后一个分量)`
///
/// 开头的 `/` 被去掉；没有父目录分量时父目录路径为空（即根目录）。
///
/// ```rust,ignore
/// assert_eq!(split_path("/a/b/c"), ("a/b", "c"));
/// assert_eq!(split_path("file"), ("", "file"));
/// ```
pub fn split_path(path: &str) -> (&str, &str) {
    let path = path.trim_start_matches('/');
    match path.rsplit_once('/') {
        Some((parent, leaf)) => (parent, leaf),
        None => ("", path),
    }
}

/// 根目录 inode 编号
pub fn find_root(sb: &Superblock) -> u32 {
    sb.root_inode()
}

/// 路径查找器
///
/// 用于根据路径字符串查找 inode
pub struct PathLookup<'a, D: BlockDevice> {
    bdev: &'a mut BlockDev<D>,
    sb: &'a Superblock,
}

impl<'a, D: BlockDevice> PathLookup<'a, D> {
    /// 创建新的路径查找器
    pub fn new(bdev: &'a mut BlockDev<D>, sb: &'a Superblock) -> Self {
        Self { bdev, sb }
    }

    /// 读取目录块及其有效长度
    ///
    /// 目录没有数据块时返回 `None`
    fn dir_block(&mut self, dir: &Inode) -> Result<Option<(Vec<u8>, usize)>> {
        if !dir.is_dir() {
            return Err(Error::new(ErrorKind::NotFound, "Not a directory"));
        }
        let lba = dir.blockptrs[0];
        if lba == NO_BLOCK || dir.size == 0 {
            return Ok(None);
        }
        if lba >= self.sb.total_blocks() {
            return Err(Error::new(ErrorKind::Corrupted, "Directory block out of range"));
        }
        let block = self.bdev.read_block_vec(lba as u64)?;
        Ok(Some((block, dir.live_len())))
    }

    /// 在目录中按名称查找
    ///
    /// # 参数
    ///
    /// * `dir_ino` - 目录 inode 编号
    /// * `name` - 名称
    pub fn lookup(&mut self, dir_ino: u32, name: &str) -> Result<Option<DirEntry>> {
        let dir = read_inode(self.bdev, self.sb, dir_ino)?;
        match self.dir_block(&dir)? {
            Some((block, live_len)) => find_entry(&block, live_len, name),
            None => Ok(None),
        }
    }

    /// 列出目录内容
    pub fn list(&mut self, dir_ino: u32) -> Result<Vec<DirEntry>> {
        let dir = read_inode(self.bdev, self.sb, dir_ino)?;
        match self.dir_block(&dir)? {
            Some((block, live_len)) => read_entries(&block, live_len),
            None => Ok(Vec::new()),
        }
    }

    /// 根据路径查找 inode
    ///
    /// # 参数
    ///
    /// * `path` - 相对 `start` 的路径
    /// * `start` - 起始目录 inode
    /// * `expected` - 期望的目标类型
    ///
    /// # 返回
    ///
    /// 目标 inode 编号。任何分量不存在、中间分量不是目录、
    /// 或者目标类型与 `expected` 不符，都返回 `NotFound`
    pub fn find_inode(&mut self, path: &str, start: u32, expected: InodeType) -> Result<u32> {
        let mut current = start;

        for component in path.split('/').filter(|c| !c.is_empty()) {
            let entry = self
                .lookup(current, component)?
                .ok_or(Error::new(ErrorKind::NotFound, "Path component not found"))?;
            current = entry.inode;
        }

        let inode = read_inode(self.bdev, self.sb, current)?;
        if inode.itype != expected {
            return Err(Error::new(ErrorKind::NotFound, "Path resolves to an unexpected type"));
        }
        Ok(current)
    }
}

/// 便捷函数：解析路径
pub fn resolve_path<D: BlockDevice>(
    bdev: &mut BlockDev<D>,
    sb: &Superblock,
    path: &str,
    start: u32,
    expected: InodeType,
) -> Result<u32> {
    PathLookup::new(bdev, sb).find_inode(path, start, expected)
}

/// 便捷函数：在目录中按名称查找
pub fn lookup_entry<D: BlockDevice>(
    bdev: &mut BlockDev<D>,
    sb: &Superblock,
    dir_ino: u32,
    name: &str,
) -> Result<Option<DirEntry>> {
    PathLookup::new(bdev, sb).lookup(dir_ino, name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_path() {
        assert_eq!(split_path("/a/b/c"), ("a/b", "c"));
        assert_eq!(split_path("a/b"), ("a", "b"));
        assert_eq!(split_path("/file"), ("", "file"));
        assert_eq!(split_path("file"), ("", "file"));
        assert_eq!(split_path("//x"), ("", "x"));
        assert_eq!(split_path("/"), ("", ""));
    }
}
