use anyhow::Result;
use crossterm::event::{Event, EventStream, KeyCode, KeyEventKind, KeyModifiers, MouseEventKind};
use futures::StreamExt;
use std::time::Duration;

use crate::input::handle_key;
use crate::render::render;
use crate::ui::{App, Focus, TaskResult, Tui};

pub(crate) async fn run_app(terminal: &mut Tui, app: &mut App) -> Result<()> {
    let mut event_stream = EventStream::new();

    // Regular redraws keep the undo countdown and status text honest.
    let mut tick_interval = tokio::time::interval(Duration::from_millis(100));

    let (task_tx, mut task_rx) = tokio::sync::mpsc::channel::<TaskResult>(16);
    app.set_task_tx(task_tx);

    while app.running {
        terminal.draw(|f| render(f, app))?;

        tokio::select! {
            maybe_event = event_stream.next() => {
                if let Some(Ok(event)) = maybe_event {
                    match event {
                        Event::Key(key) if key.kind == KeyEventKind::Press => {
                            if key.code == KeyCode::Char('c')
                                && key.modifiers.contains(KeyModifiers::CONTROL)
                            {
                                if app.pending_quit {
                                    app.quit();
                                } else {
                                    app.pending_quit = true;
                                }
                            } else {
                                app.pending_quit = false;
                                handle_key(app, key)?;
                            }
                        }
                        Event::Mouse(mouse) => {
                            if app.focus == Focus::Chat {
                                match mouse.kind {
                                    MouseEventKind::ScrollUp => app.chat_scroll += 3,
                                    MouseEventKind::ScrollDown => {
                                        app.chat_scroll = app.chat_scroll.saturating_sub(3);
                                    }
                                    _ => {}
                                }
                            }
                        }
                        Event::Paste(text) => {
                            for c in text.chars() {
                                if app.input_mode == crate::ui::InputMode::Editing {
                                    app.enter_char(c);
                                }
                            }
                        }
                        _ => {}
                    }
                }
            }
            Some(result) = task_rx.recv() => {
                app.handle_task_result(result);
            }
            _ = tick_interval.tick() => {
                app.tick();
            }
        }
    }

    Ok(())
}
