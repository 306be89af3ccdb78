// SPDX-License-Identifier: MIT
//
// n-box demo: a key viewer that exercises the whole session.
//
// Every decoded key is appended to a scrolling log; resizes are logged
// too. The header shows the input mode, which Tab toggles between Esc and
// Alt so the difference is easy to see with ESC-prefixed keys. Ctrl-Q quits.
//
// Usage:
//   cargo run -p n-box --example demo

use std::collections::VecDeque;

use n_box::buffer::CellBuffer;
use n_box::{Attribute, Cell, Color, Config, Event, InputError, InputMode, KeyCode, KeyEvent, Session, Size, Style};

/// Maximum number of lines kept in the log.
const MAX_LOG_ENTRIES: usize = 200;

struct Viewer {
    size: Size,
    log: VecDeque<String>,
    keys: u64,
}

impl Viewer {
    fn new(size: Size) -> Self {
        Self {
            size,
            log: VecDeque::with_capacity(MAX_LOG_ENTRIES),
            keys: 0,
        }
    }

    fn push_log(&mut self, msg: String) {
        if self.log.len() >= MAX_LOG_ENTRIES {
            self.log.pop_front();
        }
        self.log.push_back(msg);
    }

    fn paint(&self, buf: &mut CellBuffer, mode: InputMode) {
        let w = buf.width();
        let h = buf.height();
        if w < 10 || h < 3 {
            return;
        }

        // ── Header ───────────────────────────────────────────────
        let header_fg = Color::Black | Style::BOLD;
        let header_bg = Attribute::from(Color::Cyan);
        for x in 0..w {
            buf.set(x, 0, Cell::blank(header_fg, header_bg));
        }
        let title = format!(
            " n-box | {}x{} | mode {mode} | {} keys | Tab: mode  Ctrl-Q: quit ",
            self.size.cols, self.size.rows, self.keys
        );
        paint_str(buf, 0, 0, &title, header_fg, header_bg);

        // ── Log ──────────────────────────────────────────────────
        let rows = usize::from(h - 1);
        let skip = self.log.len().saturating_sub(rows);
        for (i, entry) in self.log.iter().skip(skip).enumerate() {
            #[allow(clippy::cast_possible_truncation)] // i < rows, which fits u16.
            let y = 1 + i as u16;
            let fg = entry_color(entry);
            paint_str(buf, 1, y, entry, fg.into(), Attribute::DEFAULT);
        }
    }
}

fn entry_color(entry: &str) -> Color {
    if entry.starts_with("Key:") {
        Color::Green
    } else if entry.starts_with("Resize:") {
        Color::Yellow
    } else {
        Color::Red
    }
}

fn describe(key: KeyEvent) -> String {
    let name = match key.code {
        KeyCode::Char(c) => format!("'{c}'"),
        KeyCode::F(n) => format!("F{n}"),
        KeyCode::Ctrl(c) => format!("Ctrl-{c}"),
        other => format!("{other:?}"),
    };
    if key.alt() {
        format!("Key: Alt+{name}")
    } else {
        format!("Key: {name}")
    }
}

fn paint_str(buf: &mut CellBuffer, x: u16, y: u16, text: &str, fg: Attribute, bg: Attribute) {
    for (col, ch) in (x..buf.width()).zip(text.chars()) {
        buf.set(col, y, Cell::styled(ch, fg, bg));
    }
}

fn main() -> n_box::Result<()> {
    let mut session = Session::open(Config::default())?;
    let mut viewer = Viewer::new(session.size());
    viewer.push_log("Press keys. ESC then a letter decodes differently per mode.".into());

    loop {
        session.clear(Attribute::DEFAULT, Attribute::DEFAULT);
        let mode = session.input_mode();
        viewer.paint(session.back_buffer_mut(), mode);
        session.flush()?;

        match session.poll_event() {
            Event::Key(key) if key.code == KeyCode::Ctrl('q') => break,
            Event::Key(key) if key.code == KeyCode::Tab => {
                let next = match mode {
                    InputMode::Esc => InputMode::Alt,
                    InputMode::Alt => InputMode::Esc,
                };
                session.set_input_mode(next);
                viewer.push_log(format!("Mode: {next}"));
            }
            Event::Key(key) => {
                viewer.keys += 1;
                viewer.push_log(describe(key));
            }
            Event::Resize(size) => {
                viewer.size = size;
                viewer.push_log(format!("Resize: {}x{}", size.cols, size.rows));
            }
            Event::Error(err) => {
                // The reader has stopped; no more keys will arrive.
                if matches!(err, InputError::Read { .. } | InputError::Disconnected) {
                    break;
                }
                viewer.push_log(format!("Error: {err}"));
            }
        }
    }

    session.close()
}
