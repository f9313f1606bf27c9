use clap::{Parser, Subcommand};
use std::path::PathBuf;
use worthit3d::domain::types::{ExportFormat, MergeStrategy};

#[derive(Parser, Debug)]
#[command(name = "worthit3d", version, about = "3D 打印成本计算器")]
pub struct Cli {
    /// 数据库路径（缺省: WORTHIT3D_DB_PATH 或用户数据目录）
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// 以 JSON 格式输出日志
    #[arg(long, global = true)]
    pub log_json: bool,

    /// 输出 info 级别日志
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// 计算参数文件的成本明细（不保存）
    Calc {
        /// 参数集 JSON 文件（缺失字段取默认值）
        params: PathBuf,
    },

    /// 列出计算历史（置顶优先，时间降序）
    List {
        /// 输出完整 JSON
        #[arg(long)]
        json: bool,
    },

    /// 导出计算历史
    Export {
        /// 导出格式: json | csv
        #[arg(short, long, default_value = "json")]
        format: ExportFormat,

        /// 输出目录（缺省为配置的导出目录）
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// 导入计算历史（.json / .csv）
    Import {
        file: PathBuf,

        /// 合并策略: replace | skip | update
        #[arg(short, long, default_value = "skip")]
        strategy: MergeStrategy,

        /// 只显示预览，不写入
        #[arg(long)]
        dry_run: bool,
    },

    /// 清空历史（保留置顶记录）
    Clear,

    /// 切换置顶
    Pin { id: String },

    /// 删除记录
    Delete { id: String },

    /// 当前表单草稿
    Draft {
        #[command(subcommand)]
        action: DraftCommands,
    },

    /// 配置管理
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum DraftCommands {
    /// 显示当前草稿与实时计算结果
    Show,

    /// 用参数文件更新草稿，并在自动保存延迟后写入历史
    Set {
        params: PathBuf,

        #[arg(long)]
        model_name: Option<String>,

        #[arg(long)]
        model_link: Option<String>,

        #[arg(long)]
        note: Option<String>,
    },

    /// 保存草稿到历史
    Save {
        /// 保存后新建空白草稿
        #[arg(long)]
        new: bool,
    },

    /// 载入历史记录进入编辑模式
    Edit { id: String },

    /// 清空草稿并退出编辑模式
    Clear,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommands {
    /// 显示当前配置（含默认值）
    Show,

    /// 写入配置项
    Set { key: String, value: String },
}
