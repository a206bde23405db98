mod input;
mod render;
mod runtime;
mod ui;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use tally_core::tracing_setup::init_tracing;
use tally_core::CoreConfig;

use crate::runtime::run_app;
use crate::ui::App;

#[derive(Parser, Debug)]
#[command(name = "tally", about = "Terminal list keeper with a conversational assistant")]
struct Cli {
    /// Directory for list, chat, and preference files
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Model identifier passed to the chat endpoint
    #[arg(long)]
    model: Option<String>,

    /// Append logs to this file instead of discarding them
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.log_file.as_deref());

    // Restore the terminal before showing any panic.
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = ui::restore();
        original_hook(panic_info);
    }));

    let data_dir = cli
        .data_dir
        .unwrap_or_else(CoreConfig::default_data_dir);
    std::fs::create_dir_all(&data_dir)?;

    let mut config = CoreConfig::new(&data_dir);
    if let Some(model) = cli.model {
        config.llm_model = model;
    }

    let mut app = App::new(config);
    let mut terminal = ui::init()?;

    let result = run_app(&mut terminal, &mut app).await;

    ui::restore()?;
    result
}
