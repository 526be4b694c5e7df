use std::sync::Arc;
use std::time::Duration;

use cloudeck::adapters::ReqwestHttpClient;
use cloudeck::app::{App, AppMessage};
use cloudeck::config::AppConfig;
use cloudeck::registry::Registry;
use cloudeck::terminal::{install_panic_hook, TerminalSession};
use cloudeck::{logging, modules, ui};
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use crossterm::event::{Event, EventStream, KeyEventKind};
use futures::StreamExt;
use ratatui::backend::Backend;
use ratatui::Terminal;
use tokio::sync::mpsc;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Event-loop tick; drives toast expiry.
const TICK: Duration = Duration::from_millis(250);

fn main() -> Result<()> {
    if std::env::args().any(|arg| arg == "--version") {
        println!("cloudeck {}", VERSION);
        return Ok(());
    }

    color_eyre::install()?;

    let config = AppConfig::from_env();
    let log_path = logging::setup_logging(&config.log_level)?;

    let mut registry = Registry::new();
    modules::register_builtin(&mut registry).wrap_err("module registration failed")?;

    let http = ReqwestHttpClient::with_connect_timeout(config.request_timeout)
        .wrap_err("failed to build HTTP client")?;

    install_panic_hook();

    let runtime = tokio::runtime::Runtime::new()?;
    let result = runtime.block_on(async move {
        let mut app = App::new(config, registry, Arc::new(http));
        let mut session = TerminalSession::enter()?;
        let result = run_app(session.terminal(), &mut app).await;
        session.restore();
        result
    });

    if let Err(err) = &result {
        tracing::error!(error = %err, "exited with error");
        eprintln!("logs: {}", log_path.display());
    }
    result
}

async fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()>
where
    B::Error: Send + Sync + 'static,
{
    let mut event_stream = EventStream::new();
    let mut message_rx: Option<mpsc::UnboundedReceiver<AppMessage>> = app.message_rx.take();
    let mut ticker = tokio::time::interval(TICK);

    let size = terminal.size()?;
    app.handle_resize(size.width, size.height);
    app.refresh_home();

    loop {
        if app.needs_redraw {
            terminal.draw(|frame| ui::render(frame, app))?;
            app.needs_redraw = false;
        }

        tokio::select! {
            _ = ticker.tick() => app.tick(),

            event = event_stream.next() => match event {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => app.handle_key(key),
                Some(Ok(Event::Resize(width, height))) => app.handle_resize(width, height),
                Some(Ok(_)) => {}
                Some(Err(err)) => return Err(err).wrap_err("terminal event stream failed"),
                None => return Ok(()),
            },

            msg = async {
                match &mut message_rx {
                    Some(rx) => rx.recv().await,
                    None => std::future::pending().await,
                }
            } => {
                if let Some(msg) = msg {
                    app.handle_message(msg);
                }
            }
        }

        if app.should_quit {
            tracing::info!("quit requested");
            return Ok(());
        }
    }
}
