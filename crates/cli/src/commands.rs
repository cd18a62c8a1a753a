//! Headless subcommands. Each one opens the same state file as the picker UI,
//! does its work and writes the state back.

use anyhow::{bail, Context, Result};
use heropick_core::{
    filter_catalog, Event, Millis, RevealPhase, Session, Toggled, MAX_SELECTION,
};
use heropick_cui::{JsonFileStore, LaunchOptions};
use heropick_data::{catalog_path, load_catalog};
use std::io::Write;
use tracing::debug;

fn open_session(options: &LaunchOptions) -> Result<Session<JsonFileStore>> {
    let store = JsonFileStore::open(options.resolved_state_path());
    let mut session = Session::open(options.picker_config(), store);
    let path = catalog_path(&options.assets_dir);
    let catalog = load_catalog(&path).with_context(|| format!("load {}", path.display()))?;
    session.finish_load(Ok(catalog));
    Ok(session)
}

pub fn list(options: &LaunchOptions, search: Option<&str>, out: &mut dyn Write) -> Result<()> {
    let session = open_session(options)?;
    let term = search.unwrap_or_else(|| session.search_term());
    let heroes = filter_catalog(session.catalog().entities(), term);
    if heroes.is_empty() {
        writeln!(out, "No heroes found")?;
    }
    for hero in &heroes {
        let marker = if session.selection().is_selected(hero) {
            "[x]"
        } else {
            "[ ]"
        };
        writeln!(out, "{marker} {}", hero.name)?;
    }
    session.shutdown();
    Ok(())
}

pub fn toggle(options: &LaunchOptions, name: &str, out: &mut dyn Write) -> Result<()> {
    let mut session = open_session(options)?;
    let hero = session
        .catalog()
        .entities()
        .iter()
        .find(|hero| hero.name.eq_ignore_ascii_case(name))
        .cloned();
    let Some(hero) = hero else {
        bail!("no hero named {name:?}");
    };
    let result = session.toggle_entity(&hero, 0);
    let len = session.selection().len();
    session.shutdown();
    match result? {
        Toggled::Added => writeln!(out, "selected {} ({len}/{MAX_SELECTION})", hero.name)?,
        Toggled::Removed => writeln!(out, "removed {} ({len}/{MAX_SELECTION})", hero.name)?,
    }
    Ok(())
}

pub fn clear(options: &LaunchOptions, out: &mut dyn Write) -> Result<()> {
    let mut session = open_session(options)?;
    let removed = session.selection().len();
    session.clear_selection();
    session.shutdown();
    writeln!(out, "cleared {removed} heroes")?;
    Ok(())
}

pub fn selected(options: &LaunchOptions, out: &mut dyn Write) -> Result<()> {
    let session = open_session(options)?;
    writeln!(
        out,
        "Selected: {}/{}",
        session.selection().len(),
        MAX_SELECTION
    )?;
    for (idx, hero) in session.selection().items().iter().enumerate() {
        writeln!(out, "{:>2}. {}", idx + 1, hero.name)?;
    }
    session.shutdown();
    Ok(())
}

/// Runs full reveals on a fast-forwarded clock and prints each winner.
pub fn pick(options: &LaunchOptions, rounds: u32, out: &mut dyn Write) -> Result<()> {
    let mut session = open_session(options)?;
    let mut now: Millis = 0;
    for round in 0..rounds.max(1) {
        if round == 0 {
            session.request_pick(now)?;
        } else {
            session.pick_again(now)?;
        }
        while session.reveal_phase() != RevealPhase::Revealed {
            let Some(next) = session.next_deadline() else {
                bail!("reveal stalled while {:?}", session.reveal_phase());
            };
            now = next;
            session.advance(now);
        }
        for event in session.drain_events() {
            match event {
                Event::PhaseEntered { phase } => debug!(?phase, now, "phase"),
                Event::WinnerRevealed { name, round } => {
                    writeln!(out, "round {round}: {name}")?;
                }
                _ => {}
            }
        }
    }
    session.shutdown();
    Ok(())
}
