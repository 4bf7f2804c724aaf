//! Report diffing
//!
//! Turns the previous [`KeyState`] and a new [`RawReport`] into the minimal
//! ordered list of [`KeyEvent`]s that moves the virtual keyboard from the old
//! state to the new one:
//!
//! 1. modifier changes, bit 0 through bit 7
//! 2. scancode releases, ascending
//! 3. scancode presses, ascending
//!
//! Releases go before presses so a slot that swaps one key for another never
//! shows both keys held at once.

use super::keymap::{scancode_to_keycode, KeyCode, MODIFIER_MAP};
use super::{KeyEvent, KeyState, RawReport};

/// Diff `report` against `previous`.
///
/// Scancodes without a keycode mapping are carried in the returned state but
/// produce no events.
pub fn translate(previous: &KeyState, report: &RawReport) -> (Vec<KeyEvent>, KeyState) {
    let next = KeyState::from_report(report);
    let mut events = Vec::new();

    for &(bit, key) in MODIFIER_MAP.iter() {
        let was = previous.modifier_held(bit);
        let now = next.modifier_held(bit);
        if was != now {
            events.push(KeyEvent::new(KeyCode::from(key), now));
        }
    }

    events.extend(
        previous
            .pressed()
            .difference(next.pressed())
            .filter_map(|&code| scancode_to_keycode(code))
            .map(KeyEvent::release),
    );

    events.extend(
        next.pressed()
            .difference(previous.pressed())
            .filter_map(|&code| scancode_to_keycode(code))
            .map(KeyEvent::press),
    );

    (events, next)
}

/// Release everything held in `state`.
///
/// Equivalent to translating an all-zero report: one release per held
/// modifier and per held mapped scancode, each exactly once.
pub fn release_all(state: &KeyState) -> (Vec<KeyEvent>, KeyState) {
    translate(state, &RawReport::EMPTY)
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY_A: KeyCode = KeyCode(30);
    const KEY_B: KeyCode = KeyCode(48);
    const KEY_W: KeyCode = KeyCode(17);
    const LEFT_CTRL: KeyCode = KeyCode(29);
    const LEFT_SHIFT: KeyCode = KeyCode(42);

    fn report(modifiers: u8, keys: &[u8]) -> RawReport {
        let mut data = [0u8; 8];
        data[0] = modifiers;
        data[2..2 + keys.len()].copy_from_slice(keys);
        RawReport::parse(&data).unwrap()
    }

    fn state(modifiers: u8, keys: &[u8]) -> KeyState {
        KeyState::from_report(&report(modifiers, keys))
    }

    #[test]
    fn ctrl_and_a_from_empty() {
        let (events, next) = translate(&KeyState::new(), &report(0x01, &[0x04]));
        assert_eq!(events, vec![KeyEvent::press(LEFT_CTRL), KeyEvent::press(KEY_A)]);
        assert_eq!(next, state(0x01, &[0x04]));
    }

    #[test]
    fn releasing_a() {
        let (events, next) = translate(&state(0, &[0x04]), &report(0, &[]));
        assert_eq!(events, vec![KeyEvent::release(KEY_A)]);
        assert!(next.pressed().is_empty());
    }

    #[test]
    fn slot_swap_releases_before_press() {
        let (events, _) = translate(&state(0, &[0x04]), &report(0, &[0x05]));
        assert_eq!(events, vec![KeyEvent::release(KEY_A), KeyEvent::press(KEY_B)]);
    }

    #[test]
    fn modifiers_come_first() {
        let (events, _) = translate(&state(0, &[0x04]), &report(0x02, &[0x05]));
        assert_eq!(
            events,
            vec![
                KeyEvent::press(LEFT_SHIFT),
                KeyEvent::release(KEY_A),
                KeyEvent::press(KEY_B),
            ]
        );
    }

    #[test]
    fn modifier_changes_follow_bit_order() {
        let (events, _) = translate(&state(0b1000_0001, &[]), &report(0b0000_0110, &[]));
        let codes: Vec<(u16, bool)> = events
            .iter()
            .map(|e| (e.keycode.as_u16(), e.pressed))
            .collect();
        assert_eq!(codes, vec![(29, false), (42, true), (56, true), (126, false)]);
    }

    #[test]
    fn identical_report_emits_nothing() {
        let prev = state(0x05, &[0x04, 0x1a]);
        let (events, next) = translate(&prev, &report(0x05, &[0x1a, 0x04]));
        assert!(events.is_empty());
        assert_eq!(next, prev);
    }

    #[test]
    fn unmapped_scancode_is_tracked_but_silent() {
        let (events, next) = translate(&KeyState::new(), &report(0, &[0x04, 0xe8]));
        assert_eq!(events, vec![KeyEvent::press(KEY_A)]);
        assert!(next.is_pressed(0xe8));

        let (events, next) = translate(&next, &report(0, &[]));
        assert_eq!(events, vec![KeyEvent::release(KEY_A)]);
        assert!(next.pressed().is_empty());
    }

    #[test]
    fn release_all_with_shift_and_w() {
        let (events, next) = release_all(&state(0x02, &[0x1a]));
        assert_eq!(events.len(), 2);
        assert!(events.contains(&KeyEvent::release(KEY_W)));
        assert!(events.contains(&KeyEvent::release(LEFT_SHIFT)));
        assert!(next.is_empty());
    }

    #[test]
    fn release_all_of_empty_state_is_silent() {
        let (events, next) = release_all(&KeyState::new());
        assert!(events.is_empty());
        assert!(next.is_empty());
    }

    #[test]
    fn release_all_skips_unmapped() {
        let (events, next) = release_all(&state(0, &[0xe8, 0x04]));
        assert_eq!(events, vec![KeyEvent::release(KEY_A)]);
        assert!(next.is_empty());
    }

    #[test]
    fn press_release_balance_over_sequence() {
        // Small LCG so the sequence is reproducible
        let mut seed: u32 = 0x1234_5678;
        let mut next_byte = move || {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            (seed >> 16) as u8
        };

        let mut held = KeyState::new();
        let mut balance = std::collections::HashMap::<u16, i32>::new();

        for _ in 0..500 {
            let mut data = [0u8; 8];
            data[0] = next_byte();
            for slot in data[2..].iter_mut() {
                // Mostly letters, occasionally empty or unmapped
                *slot = match next_byte() % 10 {
                    0 => 0,
                    1 => 0xe9,
                    n => 0x04 + n,
                };
            }
            let report = RawReport::parse(&data).unwrap();
            let (events, state) = translate(&held, &report);
            for event in &events {
                *balance.entry(event.keycode.as_u16()).or_default() +=
                    if event.pressed { 1 } else { -1 };
            }
            held = state;

            for scancode in 0x06..=0x0d {
                let code = scancode_to_keycode(scancode).unwrap().as_u16();
                let expected = i32::from(held.is_pressed(scancode));
                assert_eq!(balance.get(&code).copied().unwrap_or(0), expected);
            }
            for (bit, key) in MODIFIER_MAP.iter() {
                let expected = i32::from(held.modifier_held(*bit));
                let code = KeyCode::from(*key).as_u16();
                assert_eq!(balance.get(&code).copied().unwrap_or(0), expected);
            }
        }
    }
}
