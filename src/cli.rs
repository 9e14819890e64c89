use crate::defines::{define_type, DefineValue};
use clap::Parser;
use std::path::PathBuf;

/// Command-line interface for the config header generator
#[derive(Parser, Debug, Default)]
#[command(
    name = "cmake-define",
    about = "Turn a #cmakedefine/#undef template header into a config header",
    version = env!("CARGO_PKG_VERSION")
)]
pub struct Cli {
    /// Template header to process
    #[arg(help = "Input define file")]
    pub input: PathBuf,

    /// Extra defines not set at configure time
    #[arg(
        short = 'D',
        value_name = "NAME[=VALUE]",
        help = "Additional defines not set at configure time"
    )]
    pub defines: Vec<String>,

    /// Configuration environment file
    #[arg(short, long, help = "Path to the configuration environment (YAML or JSON)")]
    pub config: Option<PathBuf>,

    /// Output file
    #[arg(short, long, help = "Write the header here instead of stdout")]
    pub output: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl Cli {
    /// Parse `-D` arguments into overrides, in command-line order
    pub fn get_overrides(&self) -> Vec<(String, DefineValue)> {
        self.defines.iter().map(|spec| define_type(spec)).collect()
    }
}
