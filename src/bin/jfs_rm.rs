//! jfs_rm - 从 jfs 卷镜像中删除文件
//!
//! 用法：
//!   jfs_rm disk.img /docs/readme
//!
//! 挂载时会先完成上次被中断的事务。

use clap::Parser;
use jfs_core::{FileDevice, FsConfig, JfsFileSystem};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "jfs_rm")]
#[command(about = "Remove a file from a jfs volume image")]
struct Args {
    /// Volume image file
    volume: PathBuf,

    /// Path of the file to remove
    path: String,

    /// Block cache size in blocks (0 disables the cache)
    #[arg(long, default_value_t = FsConfig::default().cache_blocks)]
    cache_blocks: usize,
}

fn run(args: &Args) -> jfs_core::Result<()> {
    let device = FileDevice::open(&args.volume)?;
    let config = FsConfig {
        cache_blocks: args.cache_blocks,
        ..FsConfig::default()
    };

    let mut fs = JfsFileSystem::mount_with(device, config)?;
    fs.remove_file(&args.path)?;
    fs.unmount()?;
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("jfs_rm: {}: {}", args.path, e);
            ExitCode::FAILURE
        }
    }
}
