use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};
use ed_keys::config::Config;
use ed_keys::terminal::TerminalInput;
use ed_keys::{
    Dispatcher, EventBus, Handler, InputEvent, KeyEventKind, Keyboard, KeyboardEvent, ManualClock,
    Platform,
};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

fn counter() -> (Handler, Rc<Cell<usize>>) {
    let count = Rc::new(Cell::new(0));
    let c = count.clone();
    (Handler::new(move |_| c.set(c.get() + 1)), count)
}

#[test]
fn test_two_keyboards_on_one_bus_are_independent() {
    let bus = EventBus::new();
    let left = Keyboard::attach(&bus, Dispatcher::with_platform(Platform::Linux));
    let right = Keyboard::attach(&bus, Dispatcher::with_platform(Platform::Linux));
    let (h_left, left_count) = counter();
    let (h_right, right_count) = counter();
    left.down("ctrl + b", h_left);
    right.down("b", h_right);

    bus.emit_all(&[InputEvent::key_down(17), InputEvent::key_down(66)]);
    assert_eq!(left_count.get(), 1);
    assert_eq!(right_count.get(), 1);

    left.detach(&bus);
    bus.emit(&InputEvent::key_down(66));
    assert_eq!(left_count.get(), 1);
    assert_eq!(right_count.get(), 2);
    assert_eq!(bus.listener_count(), 1);
}

#[test]
fn test_handler_unbinding_other_keys_mid_dispatch() {
    let bus = EventBus::new();
    let keyboard = Keyboard::attach(&bus, Dispatcher::with_platform(Platform::Linux));
    let (later, later_count) = counter();

    let kb = keyboard.clone();
    keyboard.down(
        "escape",
        Handler::new(move |_| {
            kb.unbind_all();
        }),
    );
    keyboard.down("escape, enter", later);

    // the second escape handler was already collected when the first ran
    bus.emit(&InputEvent::key_down(27));
    assert_eq!(later_count.get(), 1);
    assert_eq!(keyboard.binding_count(), 0);

    bus.emit(&InputEvent::key_down(13));
    assert_eq!(later_count.get(), 1);
}

#[test]
fn test_ignored_targets_from_config() {
    let config = Config::from_toml_str(
        r#"
[dispatcher]
platform = "linux"
ignored_targets = ["code"]
"#,
    )
    .unwrap();
    let keyboard = Keyboard::new(Dispatcher::from_config(&config.dispatcher));
    let (h, count) = counter();
    keyboard.down("a", h);

    keyboard.handle(&KeyboardEvent::down(65).with_target("CODE").into());
    keyboard.handle(&KeyboardEvent::down(65).with_target("textarea").into());
    assert_eq!(count.get(), 1);
}

#[test]
fn test_sequence_timeout_from_config() {
    let config = Config::from_toml_str("[dispatcher]\nsequence_timeout_ms = 100\n").unwrap();
    let clock = ManualClock::new();
    let dispatcher = Dispatcher::from_config(&config.dispatcher).with_clock(clock.clone());
    let keyboard = Keyboard::new(dispatcher);
    let (h, count) = counter();
    keyboard.down("g g", h);

    keyboard.handle(&InputEvent::key_down(71));
    clock.advance_millis(150);
    keyboard.handle(&InputEvent::key_down(71));
    assert_eq!(count.get(), 0);

    // the late key only cancelled the attempt
    keyboard.handle(&InputEvent::key_down(71));
    clock.advance_millis(100);
    keyboard.handle(&InputEvent::key_down(71));
    assert_eq!(count.get(), 1);
}

#[test]
fn test_terminal_events_drive_bindings() {
    let bus = EventBus::new();
    let keyboard = Keyboard::attach(&bus, Dispatcher::with_platform(Platform::Linux));
    let fired = Rc::new(RefCell::new(Vec::new()));
    for (spec, label) in [("super + s", "save"), ("shift + tab", "outdent"), ("s", "plain")] {
        let fired = fired.clone();
        keyboard.down(spec, Handler::new(move |_| fired.borrow_mut().push(label)));
    }

    let mut input = TerminalInput::new();
    let terminal_events = [
        Event::Key(KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL)),
        Event::Key(KeyEvent::new(KeyCode::BackTab, KeyModifiers::SHIFT)),
        Event::FocusGained,
        Event::Key(KeyEvent::new(KeyCode::Char('s'), KeyModifiers::NONE)),
    ];
    for event in &terminal_events {
        bus.emit_all(&input.translate(event));
    }

    assert_eq!(*fired.borrow(), vec!["save", "plain", "outdent", "plain"]);
}

#[test]
fn test_recorded_session_replays() {
    let json = r#"[
        {"Key": {"kind": "down", "code": 16}},
        {"Key": {"kind": "down", "code": 9}},
        {"Key": {"kind": "up", "code": 16}},
        {"Key": {"kind": "down", "code": 9, "target": "input"}},
        "Focus"
    ]"#;
    let events: Vec<InputEvent> = serde_json::from_str(json).unwrap();

    let keyboard = Keyboard::new(Dispatcher::with_platform(Platform::Linux));
    let (shift_tab, shift_tab_count) = counter();
    let (shift_up, shift_up_count) = counter();
    keyboard.down("shift + tab", shift_tab);
    keyboard.bind_event(KeyEventKind::Up, "shift", shift_up);

    let fired: usize = events.iter().map(|event| keyboard.handle(event)).sum();
    assert_eq!(fired, 2);
    assert_eq!(shift_tab_count.get(), 1);
    assert_eq!(shift_up_count.get(), 1);
}
