use ed_keys::keycode::{CTRL, ENTER, SHIFT, TAB};
use ed_keys::{
    parse_chords, Dispatcher, Handler, InputEvent, KeyEventKind, KeyboardEvent, ManualClock,
    Modifier, ModifierSet, Platform,
};
use std::cell::RefCell;
use std::rc::Rc;

const A: u32 = 65;
const B: u32 = 66;
const C: u32 = 67;
const X: u32 = 88;

/// Records every event a handler is called with
#[derive(Clone, Default)]
struct Recorder {
    events: Rc<RefCell<Vec<KeyboardEvent>>>,
}

impl Recorder {
    fn handler(&self) -> Handler {
        let events = self.events.clone();
        Handler::new(move |event| events.borrow_mut().push(event.clone()))
    }

    fn count(&self) -> usize {
        self.events.borrow().len()
    }
}

fn setup() -> (Dispatcher, ManualClock) {
    let clock = ManualClock::new();
    let dispatcher = Dispatcher::with_platform(Platform::Linux).with_clock(clock.clone());
    (dispatcher, clock)
}

fn press(dispatcher: &mut Dispatcher, code: u32) -> usize {
    dispatcher.handle(&InputEvent::key_down(code))
}

fn release(dispatcher: &mut Dispatcher, code: u32) -> usize {
    dispatcher.handle(&InputEvent::key_up(code))
}

#[test]
fn test_single_key_fires_exactly_once() {
    let (mut k, _) = setup();
    let letters: Vec<Recorder> = (0..26).map(|_| Recorder::default()).collect();
    for (i, recorder) in letters.iter().enumerate() {
        let key = ((b'a' + i as u8) as char).to_string();
        k.down(&key, recorder.handler());
    }

    press(&mut k, C);
    for (i, recorder) in letters.iter().enumerate() {
        let expected = usize::from(i == 2);
        assert_eq!(recorder.count(), expected, "letter {}", i);
    }
}

#[test]
fn test_modifier_chords_fire_iff_all_required_held() {
    let combos: [&[Modifier]; 4] = [
        &[Modifier::Ctrl],
        &[Modifier::Shift, Modifier::Alt],
        &[Modifier::Ctrl, Modifier::Shift, Modifier::Command],
        &[],
    ];

    for required in combos {
        let spec: Vec<&str> = required
            .iter()
            .map(|m| m.name())
            .chain(std::iter::once("x"))
            .collect();

        // every subset of all four modifiers as the held state
        for mask in 0u8..16 {
            let (mut k, _) = setup();
            let recorder = Recorder::default();
            k.down(&spec.join(" + "), recorder.handler());

            let held: Vec<Modifier> = Modifier::ALL
                .iter()
                .enumerate()
                .filter(|(bit, _)| mask & (1u8 << *bit) != 0)
                .map(|(_, m)| *m)
                .collect();
            for modifier in &held {
                press(&mut k, modifier.code());
            }
            press(&mut k, X);

            let satisfied = required.iter().all(|m| held.contains(m));
            assert_eq!(
                recorder.count(),
                usize::from(satisfied),
                "spec {:?} with held {:?}",
                spec,
                held
            );
        }
    }
}

#[test]
fn test_sequence_fires_on_final_step() {
    let (mut k, clock) = setup();
    let recorder = Recorder::default();
    k.down("a b c", recorder.handler());

    press(&mut k, A);
    clock.advance_millis(400);
    press(&mut k, B);
    assert_eq!(recorder.count(), 0);
    clock.advance_millis(400);
    press(&mut k, C);
    assert_eq!(recorder.count(), 1);

    // and again from the start
    for code in [A, B, C] {
        clock.advance_millis(10);
        press(&mut k, code);
    }
    assert_eq!(recorder.count(), 2);
}

#[test]
fn test_sequence_interrupted_by_wrong_key() {
    let (mut k, clock) = setup();
    let recorder = Recorder::default();
    k.down("a b c", recorder.handler());

    press(&mut k, A);
    press(&mut k, X);
    clock.advance_millis(10);
    press(&mut k, B);
    press(&mut k, C);
    assert_eq!(recorder.count(), 0);
}

#[test]
fn test_overlapping_sequences_progress_independently() {
    let (mut k, clock) = setup();
    let abc = Recorder::default();
    let bc = Recorder::default();
    k.down("a b c", abc.handler());
    k.down("b c", bc.handler());

    for code in [A, B, C] {
        clock.advance_millis(50);
        press(&mut k, code);
    }
    assert_eq!(abc.count(), 1);
    assert_eq!(bc.count(), 1);

    // a key that breaks one sequence leaves the other's progress alone
    let ab = Recorder::default();
    let ac = Recorder::default();
    k.down("a b", ab.handler());
    k.down("a c", ac.handler());

    press(&mut k, A);
    press(&mut k, B);
    assert_eq!((ab.count(), ac.count()), (1, 0));
    press(&mut k, A);
    press(&mut k, C);
    assert_eq!((ab.count(), ac.count()), (1, 1));
}

#[test]
fn test_wildcard_sequence_accepts_any_first_key() {
    let (mut k, _) = setup();
    let recorder = Recorder::default();
    k.down("* b c", recorder.handler());

    press(&mut k, X);
    press(&mut k, B);
    press(&mut k, C);
    assert_eq!(recorder.count(), 1);
}

#[test]
fn test_sequence_times_out() {
    let (mut k, clock) = setup();
    let recorder = Recorder::default();
    k.down("a b c", recorder.handler());

    press(&mut k, A);
    clock.advance_millis(501);
    press(&mut k, B);
    clock.advance_millis(10);
    press(&mut k, C);
    assert_eq!(recorder.count(), 0);
}

#[test]
fn test_sequence_requires_its_modifiers() {
    let (mut k, _) = setup();
    let recorder = Recorder::default();
    k.down("ctrl + g g", recorder.handler());

    press(&mut k, 71);
    press(&mut k, 71);
    assert_eq!(recorder.count(), 0);

    press(&mut k, CTRL);
    press(&mut k, 71);
    press(&mut k, 71);
    assert_eq!(recorder.count(), 1);
}

#[test]
fn test_unbind_removes_handler() {
    let (mut k, _) = setup();
    let recorder = Recorder::default();
    let h = recorder.handler();
    k.down("ctrl + a", h.clone());
    assert_eq!(k.unbind_handler("ctrl + a", &h), 1);
    assert_eq!(k.unbind_handler("ctrl + a", &h), 0);

    press(&mut k, CTRL);
    press(&mut k, A);
    assert_eq!(recorder.count(), 0);
}

#[test]
fn test_focus_clears_modifiers() {
    let (mut k, _) = setup();
    let recorder = Recorder::default();
    k.down("shift + a", recorder.handler());

    press(&mut k, SHIFT);
    k.handle(&InputEvent::Focus);
    press(&mut k, A);
    assert_eq!(recorder.count(), 0);
    assert!(!k.is_held(Modifier::Shift));
}

#[test]
fn test_parse_modifier_sets_on_linux() {
    let shift_tab = parse_chords("shift + tab", Platform::Linux.super_modifier());
    let super_a = parse_chords("super + a", Platform::Linux.super_modifier());
    assert_eq!(shift_tab[0].modifiers, ModifierSet::SHIFT);
    assert_eq!(shift_tab[0].code, TAB);
    assert_eq!(super_a[0].modifiers, ModifierSet::CTRL);
}

#[test]
fn test_super_binding_follows_platform() {
    let mut mac = Dispatcher::with_platform(Platform::Mac);
    let recorder = Recorder::default();
    mac.down("super + s", recorder.handler());

    press(&mut mac, CTRL);
    press(&mut mac, 83);
    assert_eq!(recorder.count(), 0);

    release(&mut mac, CTRL);
    press(&mut mac, 91);
    press(&mut mac, 83);
    assert_eq!(recorder.count(), 1);
    assert!(mac.modifiers().super_held());
}

#[test]
fn test_enter_and_shift_enter_both_fire() {
    let (mut k, _) = setup();
    let h1 = Recorder::default();
    let h2 = Recorder::default();

    k.down("enter", h1.handler());
    assert_eq!(press(&mut k, ENTER), 1);
    assert_eq!(h1.count(), 1);
    assert_eq!(h1.events.borrow()[0], KeyboardEvent::down(ENTER));

    k.down("shift + enter", h2.handler());
    press(&mut k, SHIFT);
    assert_eq!(press(&mut k, ENTER), 2);
    assert_eq!(h1.count(), 2);
    assert_eq!(h2.count(), 1);
}

#[test]
fn test_handlers_fire_in_binding_order() {
    let (mut k, _) = setup();
    let order = Rc::new(RefCell::new(Vec::new()));
    for name in ["first", "second", "third"] {
        let order = order.clone();
        k.down("tab", Handler::new(move |_| order.borrow_mut().push(name)));
    }

    press(&mut k, TAB);
    assert_eq!(*order.borrow(), vec!["first", "second", "third"]);
}

#[test]
fn test_keyup_bindings() {
    let (mut k, _) = setup();
    let recorder = Recorder::default();
    k.bind_event(KeyEventKind::Up, "ctrl + a", recorder.handler());

    press(&mut k, CTRL);
    press(&mut k, A);
    assert_eq!(recorder.count(), 0);
    release(&mut k, A);
    assert_eq!(recorder.count(), 1);
    assert_eq!(recorder.events.borrow()[0].kind, KeyEventKind::Up);
}

#[test]
fn test_unknown_modifier_never_fires() {
    let (mut k, _) = setup();
    let recorder = Recorder::default();
    k.down("hyper + a", recorder.handler());

    for modifier in Modifier::ALL {
        press(&mut k, modifier.code());
    }
    press(&mut k, A);
    assert_eq!(recorder.count(), 0);
    assert_eq!(k.bindings().len(), 1);
}

#[test]
fn test_comma_bindings() {
    let (mut k, _) = setup();
    let bare = Recorder::default();
    let chord = Recorder::default();
    k.down(",", bare.handler());
    k.down("ctrl + ,", chord.handler());

    press(&mut k, 188);
    assert_eq!((bare.count(), chord.count()), (1, 0));

    press(&mut k, CTRL);
    press(&mut k, 188);
    assert_eq!((bare.count(), chord.count()), (2, 1));
}
