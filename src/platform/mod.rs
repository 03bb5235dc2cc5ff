//! Platform abstraction layer
//!
//! The simulation never talks to an engine directly. Everything it needs from
//! the outside world goes through these collaborators:
//! - Instantiation of render proxies (`Instantiator`)
//! - Audio playback (`AudioService`)
//! - HUD updates (`UiService`)
//! - Input events (`InputService`)
//!
//! `headless` provides logging implementations for the native binary.

pub mod headless;
pub mod input;
pub mod services;

pub use headless::{HeadlessAudio, HeadlessInstantiator, HeadlessUi};
pub use input::{InputEvent, InputService, MenuChoice, ScriptedInput};
pub use services::{AudioService, EntityHandle, Instantiator, Panel, Parent, Services, UiService};
