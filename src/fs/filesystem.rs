//! jfs 文件系统核心结构

use super::types::{FileStat, FsConfig, StatFs};
use crate::{
    balloc::free_blocks_count,
    bitmap::test_bit,
    block::{BlockDev, BlockDevice},
    consts::*,
    dir::{find_root, lookup_entry, resolve_path, split_path, DirEntry, PathLookup},
    error::{Error, ErrorKind, Result},
    ialloc::free_inodes_count,
    inode::{read_inode, InodeType},
    journal::{self, pending_slots, JournalFile},
    superblock::Superblock,
};
use alloc::vec::Vec;

/// jfs 文件系统
///
/// 文件系统会话：拥有块设备和 superblock，由调用者显式持有并传递。
///
/// # 示例
///
/// ```rust,ignore
/// use jfs_core::{JfsFileSystem, MemDevice};
///
/// let mut fs = JfsFileSystem::format(MemDevice::new(128))?;
/// fs.create_file("/notes", b"hello")?;
/// fs.remove_file("/notes")?;
/// let device = fs.unmount()?;
///
/// // 下次挂载时自动完成被中断的事务
/// let mut fs = JfsFileSystem::mount(device)?;
/// for entry in fs.read_dir("/")? {
///     println!("{}", entry.name);
/// }
/// ```
pub struct JfsFileSystem<D: BlockDevice> {
    pub(crate) bdev: BlockDev<D>,
    pub(crate) sb: Superblock,
    pub(crate) journal_ino: u32,
    pub(crate) recovered: bool,
}

impl<D: BlockDevice> JfsFileSystem<D> {
    /// 打开文件系统但不执行恢复
    ///
    /// 只读取 superblock 并定位 journal 文件。此时只允许查询操作，
    /// 修改操作在 [`recover`](Self::recover) 之前返回 `InvalidState`。
    ///
    /// # 错误
    ///
    /// - `InvalidInput` - 设备块大小不是 512
    /// - `Corrupted` - superblock 无效，或 journal 文件块数不足
    /// - `NotFound` - 根目录中没有 journal 文件
    pub fn open(device: D) -> Result<Self> {
        Self::open_with(device, FsConfig::default())
    }

    /// 使用指定配置打开文件系统但不执行恢复
    pub fn open_with(device: D, config: FsConfig) -> Result<Self> {
        let mut bdev = BlockDev::new_with_cache(device, config.cache_blocks)?;
        if bdev.block_size() as usize != JFS_BLOCK_SIZE {
            return Err(Error::new(ErrorKind::InvalidInput, "Device block size must be 512"));
        }

        let sb = Superblock::load(&mut bdev)?;
        let journal = JournalFile::locate(&mut bdev, &sb)?;
        log::debug!(
            "[FS] opened volume: {} blocks, {} inodes, journal inode {} with {} slots",
            sb.total_blocks(),
            sb.inode_count(),
            journal.ino(),
            journal.capacity()
        );

        Ok(Self {
            bdev,
            sb,
            journal_ino: journal.ino(),
            recovered: false,
        })
    }

    /// 挂载文件系统
    ///
    /// 打开并无条件执行 journal 恢复。返回后文件系统中没有 pending 事务。
    pub fn mount(device: D) -> Result<Self> {
        Self::mount_with(device, FsConfig::default())
    }

    /// 使用指定配置挂载文件系统
    pub fn mount_with(device: D, config: FsConfig) -> Result<Self> {
        let mut fs = Self::open_with(device, config)?;
        fs.recover()?;
        Ok(fs)
    }

    /// 执行 journal 恢复
    ///
    /// 可以重复调用；没有 pending 记录时不写任何块。
    ///
    /// # 返回
    ///
    /// 完成的事务数
    pub fn recover(&mut self) -> Result<usize> {
        let completed = journal::recover(&mut self.bdev, &self.sb)?;
        self.recovered = true;
        Ok(completed)
    }

    /// 是否已经执行过恢复
    pub fn is_recovered(&self) -> bool {
        self.recovered
    }

    /// 卸载文件系统
    ///
    /// 写回缓存中的所有块，返回底层设备。
    pub fn unmount(mut self) -> Result<D> {
        self.bdev.flush()?;
        log::debug!("[FS] unmounted");
        Ok(self.bdev.into_device())
    }

    /// 直接取回底层设备，不写回缓存
    ///
    /// 效果等同于进程在此刻被终止。
    pub fn into_device(self) -> D {
        self.bdev.into_device()
    }

    /// 获取 superblock 引用
    pub fn superblock(&self) -> &Superblock {
        &self.sb
    }

    /// 获取块设备引用
    pub fn bdev(&self) -> &BlockDev<D> {
        &self.bdev
    }

    /// 获取底层设备的可变引用
    pub fn device_mut(&mut self) -> &mut D {
        self.bdev.device_mut()
    }

    /// 根目录 inode 编号
    pub fn root_inode(&self) -> u32 {
        find_root(&self.sb)
    }

    /// journal 文件的 inode 编号
    pub fn journal_inode(&self) -> u32 {
        self.journal_ino
    }

    /// 修改操作的前置检查
    pub(crate) fn require_recovered(&self) -> Result<()> {
        if !self.recovered {
            return Err(Error::new(
                ErrorKind::InvalidState,
                "Journal must be recovered before modifying the filesystem",
            ));
        }
        Ok(())
    }

    /// 按期望类型解析路径
    ///
    /// 路径总是从根目录开始；类型不符视为不存在。
    pub fn resolve_path(&mut self, path: &str, expected: InodeType) -> Result<u32> {
        let root = find_root(&self.sb);
        resolve_path(&mut self.bdev, &self.sb, path, root, expected)
    }

    /// 解析路径到任意类型的 inode
    pub fn lookup(&mut self, path: &str) -> Result<u32> {
        let (parent, leaf) = split_path(path);
        let root = find_root(&self.sb);
        if leaf.is_empty() {
            return if parent.is_empty() {
                Ok(root)
            } else {
                Err(Error::new(ErrorKind::NotFound, "Empty path component"))
            };
        }

        let parent_ino = resolve_path(&mut self.bdev, &self.sb, parent, root, InodeType::Directory)?;
        lookup_entry(&mut self.bdev, &self.sb, parent_ino, leaf)?
            .map(|entry| entry.inode)
            .ok_or(Error::new(ErrorKind::NotFound, "No such file or directory"))
    }

    /// 获取文件或目录的元数据
    pub fn stat(&mut self, path: &str) -> Result<FileStat> {
        let ino = self.lookup(path)?;
        let inode = read_inode(&mut self.bdev, &self.sb, ino)?;
        let blocks = inode.blockptrs.iter().copied().filter(|&b| b != NO_BLOCK).collect();

        Ok(FileStat {
            ino,
            itype: inode.itype,
            size: inode.size,
            blocks,
        })
    }

    /// 列出目录内容
    pub fn read_dir(&mut self, path: &str) -> Result<Vec<DirEntry>> {
        let ino = self.resolve_path(path, InodeType::Directory)?;
        PathLookup::new(&mut self.bdev, &self.sb).list(ino)
    }

    /// 读取整个文件
    pub fn read_file(&mut self, path: &str) -> Result<Vec<u8>> {
        let ino = self.resolve_path(path, InodeType::File)?;
        let inode = read_inode(&mut self.bdev, &self.sb, ino)?;

        let mut content = Vec::with_capacity(inode.size as usize);
        for &block in inode.data_blocks()? {
            if block >= self.sb.total_blocks() {
                return Err(Error::new(ErrorKind::Corrupted, "File block out of range"));
            }
            content.extend_from_slice(&self.bdev.read_block_vec(block as u64)?);
        }
        content.truncate(inode.size as usize);
        Ok(content)
    }

    /// 文件系统统计信息
    pub fn statfs(&mut self) -> Result<StatFs> {
        let block_bitmap = self.bdev.read_block_vec(self.sb.block_bitmap() as u64)?;
        let inode_bitmap = self.bdev.read_block_vec(self.sb.inode_bitmap() as u64)?;

        Ok(StatFs {
            block_size: self.sb.block_size(),
            blocks_count: self.sb.total_blocks(),
            free_blocks_count: free_blocks_count(
                &block_bitmap,
                self.sb.first_data_block(),
                self.sb.total_blocks(),
            ),
            inodes_count: self.sb.inode_count(),
            free_inodes_count: free_inodes_count(&inode_bitmap, self.sb.inode_count()),
        })
    }

    /// 块是否在空闲块池中
    pub fn is_block_free(&mut self, block: u32) -> Result<bool> {
        if block >= self.sb.total_blocks() {
            return Err(Error::new(ErrorKind::InvalidInput, "Block number out of range"));
        }
        let bitmap = self.bdev.read_block_vec(self.sb.block_bitmap() as u64)?;
        Ok(!test_bit(&bitmap, block))
    }

    /// inode 是否在空闲 inode 池中
    pub fn is_inode_free(&mut self, ino: u32) -> Result<bool> {
        if ino >= self.sb.inode_count() {
            return Err(Error::new(ErrorKind::InvalidInput, "Inode number out of range"));
        }
        let bitmap = self.bdev.read_block_vec(self.sb.inode_bitmap() as u64)?;
        Ok(!test_bit(&bitmap, ino))
    }

    /// journal 中处于 pending 状态的记录数
    pub fn pending_records(&mut self) -> Result<usize> {
        let journal = JournalFile::locate(&mut self.bdev, &self.sb)?;
        Ok(pending_slots(&mut self.bdev, &journal)?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::MemDevice;

    #[test]
    fn test_format_then_mount() {
        let fs = JfsFileSystem::format(MemDevice::new(128)).unwrap();
        let device = fs.unmount().unwrap();

        let mut fs = JfsFileSystem::mount(device).unwrap();
        assert!(fs.is_recovered());
        assert_eq!(fs.pending_records().unwrap(), 0);

        let entries = fs.read_dir("/").unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, JFS_JOURNAL_NAME);
        assert_eq!(entries[0].inode, fs.journal_inode());
    }

    #[test]
    fn test_open_refuses_mutation() {
        let device = JfsFileSystem::format(MemDevice::new(128)).unwrap().unmount().unwrap();

        let mut fs = JfsFileSystem::open(device).unwrap();
        assert!(!fs.is_recovered());
        assert_eq!(fs.create_file("a", b"x").unwrap_err().kind(), ErrorKind::InvalidState);
        assert_eq!(fs.mkdir("d").unwrap_err().kind(), ErrorKind::InvalidState);
        assert_eq!(fs.remove_file("a").unwrap_err().kind(), ErrorKind::InvalidState);

        // 查询不受影响
        assert_eq!(fs.read_dir("/").unwrap().len(), 1);

        assert_eq!(fs.recover().unwrap(), 0);
        fs.create_file("a", b"x").unwrap();
    }

    #[test]
    fn test_open_unformatted() {
        let err = JfsFileSystem::open(MemDevice::new(64)).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Corrupted);
    }

    #[test]
    fn test_statfs_and_stat() {
        let mut fs = JfsFileSystem::format(MemDevice::new(128)).unwrap();
        let before = fs.statfs().unwrap();
        assert_eq!(before.blocks_count, 128);
        assert_eq!(before.inodes_count, JFS_DEFAULT_INODE_COUNT);
        // 根目录 1 块，journal 14 块
        assert_eq!(before.free_blocks_count, 128 - 11 - 1 - 14);
        // 0 保留，不计入；根目录和 journal 已占用
        assert_eq!(before.free_inodes_count, JFS_DEFAULT_INODE_COUNT - 3);

        let data = [7u8; 700];
        let ino = fs.create_file("/f", &data).unwrap();
        let stat = fs.stat("f").unwrap();
        assert_eq!(stat.ino, ino);
        assert!(stat.is_file());
        assert_eq!(stat.size, 700);
        assert_eq!(stat.blocks.len(), 2);

        let after = fs.statfs().unwrap();
        assert_eq!(after.free_blocks_count, before.free_blocks_count - 2);
        assert_eq!(after.free_inodes_count, before.free_inodes_count - 1);
        for block in stat.blocks {
            assert!(!fs.is_block_free(block).unwrap());
        }
        assert!(!fs.is_inode_free(ino).unwrap());

        assert!(fs.stat("/").unwrap().is_dir());
        assert_eq!(fs.stat("missing").unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_resolve_type_mismatch() {
        let mut fs = JfsFileSystem::format(MemDevice::new(128)).unwrap();
        fs.mkdir("d").unwrap();
        fs.create_file("d/f", b"abc").unwrap();

        assert!(fs.resolve_path("d", InodeType::Directory).is_ok());
        let err = fs.resolve_path("d", InodeType::File).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        let err = fs.resolve_path("d/f/g", InodeType::File).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(fs.read_file("/d/f").unwrap(), b"abc");
    }
}
