//! Report translation: tables, key state and the diffing translator

mod event;
mod report;
mod state;
pub mod keymap;
pub mod translate;

pub use event::{KeyEvent, WireEvent, EV_KEY, EV_SYN, INPUT_EVENT_SIZE, SYN_REPORT};
pub use keymap::{advertised_keycodes, scancode_to_keycode, KeyCode, MODIFIER_MAP, SCANCODE_MAP};
pub use report::{RawReport, REPORT_LEN, SCANCODE_SLOTS};
pub use state::KeyState;
pub use translate::{release_all, translate};
