use std::path::PathBuf;

use clap::Args;

#[derive(Args, Debug, Clone)]
pub struct ExportArgs {
    /// Diretório de destino (substitui export.output_dir)
    #[arg(long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ImportArgs {
    /// Arquivo JSON exportado anteriormente; substitui todo o catálogo
    #[arg(value_name = "ARQUIVO")]
    pub file: PathBuf,
}
