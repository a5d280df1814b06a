use anyhow::{Context, Result};
use crossterm::event;
use ed_keys::config::Config;
use ed_keys::logging;
use ed_keys::terminal::{TerminalInput, TerminalSession};
use ed_keys::{keycode, Dispatcher, Handler, InputEvent, Keyboard};
use std::cell::Cell;
use std::io::{stdout, Write};
use std::rc::Rc;

const DEFAULT_BINDINGS: &[(&str, &str)] = &[
    ("super + s", "save"),
    ("super + shift + z", "redo"),
    ("shift + tab", "outdent"),
    ("g g", "top"),
    (",", "comma"),
];

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|arg| arg == "-h" || arg == "--help") {
        show_usage();
        return Ok(());
    }

    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Using default config: {:#}", e);
        Config::default()
    });
    logging::init_tracing_with_capacity(&config.logging.filter, config.logging.capacity)?;

    let bindings: Vec<(String, String)> = if !args.is_empty() {
        args.iter().map(|spec| (spec.clone(), spec.clone())).collect()
    } else if config.bindings.is_some() {
        config
            .binding_labels()
            .into_iter()
            .map(|(spec, label)| (spec.to_string(), label.to_string()))
            .collect()
    } else {
        DEFAULT_BINDINGS
            .iter()
            .map(|(spec, label)| (spec.to_string(), label.to_string()))
            .collect()
    };

    let keyboard = Keyboard::new(Dispatcher::from_config(&config.dispatcher));
    for (spec, label) in &bindings {
        let label = label.clone();
        keyboard.bind(
            spec,
            Handler::new(move |_| print!("  >>> {}\r\n", label)),
        );
    }

    let quit = Rc::new(Cell::new(false));
    let q = quit.clone();
    keyboard.bind("ctrl + c, escape escape", Handler::new(move |_| q.set(true)));

    let show_debug = Rc::new(Cell::new(false));
    let d = show_debug.clone();
    keyboard.bind("f1", Handler::new(move |_| d.set(true)));

    println!("ed-keys key tester");
    println!("Bound:");
    for (spec, label) in &bindings {
        println!("  {:<24} {}", spec, label);
    }
    println!("F1 shows dispatcher state, ctrl + c or escape escape quits.\n");

    // dropping the session restores the terminal on every exit path
    let mut session = TerminalSession::enter()?;
    if !session.is_enhanced() {
        print!("(no key release reporting in this terminal)\r\n");
    }

    let result = run(&keyboard, &quit, &show_debug);
    let restored = session.restore();

    result.context("Key tester failed")?;
    restored
}

fn run(keyboard: &Keyboard, quit: &Cell<bool>, show_debug: &Cell<bool>) -> Result<()> {
    let mut input = TerminalInput::new();
    let mut out = stdout();

    while !quit.get() {
        let event = event::read().context("Failed to read terminal event")?;
        for input_event in input.translate(&event) {
            print!("{}\r\n", format_event(&input_event));
            keyboard.handle(&input_event);
            if quit.get() {
                break;
            }
        }

        if show_debug.take() {
            for line in keyboard.format_debug_info().lines() {
                print!("{}\r\n", line);
            }
            if let Some(logs) = logging::get_log_buffer() {
                print!("\r\n========== LOGS ==========\r\n");
                for entry in logs.get_recent(10) {
                    print!("{}\r\n", entry.format_for_display());
                }
            }
        }
        out.flush()?;
    }

    Ok(())
}

fn format_event(event: &InputEvent) -> String {
    match event.as_key() {
        Some(key) => format!(
            "{:<8} {:<10} ({})",
            key.kind.to_string(),
            keycode::describe(key.code),
            key.code
        ),
        None => "focus".to_string(),
    }
}

fn show_usage() {
    println!("ed-keys key tester");
    println!();
    println!("Usage:");
    println!("  key_tester [SPEC...]");
    println!();
    println!("Each SPEC is a binding like \"ctrl + a\", \"shift + tab, enter\" or \"g g\".");
    println!("Without SPECs the [bindings] table of the config file is used.");
}
