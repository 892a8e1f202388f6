//! 块设备抽象
//!
//! 提供块设备接口和块级 I/O 操作。
//! block/device.rs 定义设备 trait 和 BlockDev 包装器, 也提供了一些cache管理接口

//! block/io.rs 提供未经 journal 的原始块读写：读写都先操作cache, 若没有对应块的cache则调用设备接口, 没有启用cache则直接读写磁盘
//! flush 是 journal 协议中各阶段之间的写屏障

//! block/handle 提供对某块数据的 RAII 访问
//! block/mem 和 block/file 是两种具体设备：内存镜像（带故障注入）和磁盘镜像文件

mod device;
mod io;
mod handle;
mod mem;
#[cfg(feature = "std")]
mod file;

pub use device::{BlockDevice, BlockDev};
pub use handle::Block;
pub use mem::MemDevice;
#[cfg(feature = "std")]
pub use file::FileDevice;
