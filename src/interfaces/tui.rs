// src/interfaces/tui.rs
use crate::app::App;
use crate::types::{AppError, AppResult};
use anyhow::{Context, Result as AnyhowResult};
use crossterm::{
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::backend::CrosstermBackend;
use std::io::stdout;
use std::sync::Arc;

fn setup_terminal() -> AnyhowResult<()> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    stdout()
        .execute(EnterAlternateScreen)
        .context("Failed to enter alternate screen")?;
    Ok(())
}

fn restore_terminal() -> AnyhowResult<()> {
    // Raw mode has to go before leaving the alternate screen.
    if crossterm::terminal::is_raw_mode_enabled()? {
        disable_raw_mode().context("Failed to disable raw mode")?;
    }
    stdout()
        .execute(LeaveAlternateScreen)
        .context("Failed to leave alternate screen")?;
    Ok(())
}

type PanicHook = dyn Fn(&std::panic::PanicHookInfo<'_>) + Send + Sync + 'static;

/// Restores the terminal on a main-thread panic while alive; puts the
/// previous hook back when dropped.
struct PanicHookGuard {
    previous: Arc<PanicHook>,
}

impl PanicHookGuard {
    fn install() -> Self {
        let previous: Arc<PanicHook> = Arc::from(std::panic::take_hook());
        let chained = previous.clone();

        std::panic::set_hook(Box::new(move |panic_info| {
            // Search task panics are caught and reported, the panel keeps running.
            if std::thread::current().name() == Some("main") {
                if let Err(e) = restore_terminal() {
                    eprintln!("Failed to restore terminal after panic: {:?}", e);
                }
                chained(panic_info);
            } else {
                tracing::error!(panic = %panic_info, "background task panicked");
            }
        }));

        Self { previous }
    }
}

impl Drop for PanicHookGuard {
    fn drop(&mut self) {
        let previous = self.previous.clone();
        std::panic::set_hook(Box::new(move |panic_info| previous(panic_info)));
    }
}

/// Run the panel in the terminal until the user exits or a sticker is sent.
pub async fn run_tui(app: &mut App) -> AppResult<()> {
    let _panic_hook = PanicHookGuard::install();

    setup_terminal().map_err(|e| AppError::Terminal(e.to_string()))?;

    let backend = CrosstermBackend::new(stdout());
    let mut terminal = match ratatui::Terminal::new(backend) {
        Ok(terminal) => terminal,
        Err(e) => {
            let _ = restore_terminal();
            return Err(AppError::Terminal(e.to_string()));
        }
    };

    let result = app.run(&mut terminal).await;

    restore_terminal().map_err(|e| AppError::Terminal(e.to_string()))?;

    result
}
