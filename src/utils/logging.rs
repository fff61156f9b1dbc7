use std::fs;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Initializes the tracing subscriber. `RUST_LOG` overrides the default
/// `info` level.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// Starts the plain-text session log.
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let header = format!(
        "{}\nNotas da EscolaWeb - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, header)?;
    Ok(())
}

pub fn log_startup(store_path: &str) {
    info!("{}", "=".repeat(60));
    info!("📚 Notas da EscolaWeb");
    info!("🗄️ Banco de notas: {}", store_path);
    info!("{}", "=".repeat(60));
}

pub fn log_import_summary(subjects: usize) {
    if subjects == 0 {
        info!("⚠️ Nenhuma matéria identificada no texto colado");
    } else {
        info!("✓ {} matérias atualizadas com sucesso", subjects);
    }
}

/// Shortens pasted text for log display.
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
