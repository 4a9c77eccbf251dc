use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rt-profile-selector")]
#[command(about = "RawTherapee用 Exifルールによるプロファイル選択・合成ツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// RawTherapeeから渡されるキーファイル（`select` と同じ）
    pub keyfile: Option<PathBuf>,

    /// 詳細ログを標準エラーにも出力
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// 設定・ルール・部分プロファイルのフォルダ（デフォルト: 実行ファイルのフォルダ）
    #[arg(long, global = true)]
    pub base_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// キーファイルからプロファイルを生成
    Select {
        /// RawTherapeeのキーファイル
        #[arg(required = true)]
        keyfile: PathBuf,
    },

    /// 画像のフィールドを key=value で表示（ルール作成用）
    Fields {
        /// 画像ファイル
        #[arg(required = true)]
        image: PathBuf,
    },

    /// 照合と集約の結果を表示（ファイルは書き込まない）
    Explain {
        /// 画像ファイル
        #[arg(required = true)]
        image: PathBuf,

        /// 完全ルールが一致しない場合のプロファイル
        #[arg(short, long)]
        default_profile: Option<PathBuf>,

        /// JSONで出力
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    /// 実行するコマンド（サブコマンドがなくキーファイルだけなら `select`）
    pub fn into_command(self) -> Option<Commands> {
        match self.command {
            Some(command) => Some(command),
            None => self.keyfile.map(|keyfile| Commands::Select { keyfile }),
        }
    }
}
