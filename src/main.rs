use std::io::{self, BufRead, Write};

use sequence_transform::{
    Session, SimulatedOutput, config,
    config::Config,
    dictionary::{builtin_dictionary, load_dictionary},
    utils::tracing::init_tracing,
};
use sequence_transform_core::code;

/// Gap between replayed keys; below any sensible idle timeout.
const KEY_INTERVAL_MS: u64 = 50;

fn is_backspace(ch: char) -> bool {
    matches!(ch, '\u{8}' | '\u{7f}' | '⌫')
}

fn main() -> io::Result<()> {
    init_tracing();

    let cfg = match config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::warn!(error = %e, "config not loaded, using defaults");
            Config::default()
        }
    };

    let trie = match &cfg.dictionary_path {
        Some(path) => load_dictionary(path)?,
        None => builtin_dictionary().map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?,
    };

    let mut session = Session::new(cfg, trie, SimulatedOutput::new());
    let mut now_ms = 0u64;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    // Each line is replayed as a fresh typing run.
    for line in io::stdin().lock().lines() {
        let line = line?;
        session.reset();
        session.sink_mut().clear();

        for ch in line.chars() {
            now_ms += KEY_INTERVAL_MS;
            if is_backspace(ch) {
                session.backspace(now_ms);
                continue;
            }
            let Some(key) = code::from_char(ch) else {
                tracing::warn!(%ch, "character outside the key alphabet skipped");
                continue;
            };
            session.process_key(key, now_ms);
        }

        writeln!(out, "{}", session.sink().text())?;
        let fired_last = session
            .buffer()
            .at(0)
            .is_some_and(|key| key.action_taken.is_some());
        if !fired_last && let Some(missed) = session.find_missed_rule() {
            writeln!(
                out,
                "  hint: type {:?} for {:?}",
                missed.sequence, missed.completion
            )?;
        }
    }

    Ok(())
}
