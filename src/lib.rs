//! Voice Pay - turns spoken mobile money instructions into confirmed intents.
//!
//! The pipeline runs one session at a time: capture a transcript, parse it
//! with an ordered command grammar, resolve contact names, read the intent
//! back and submit it only after an explicit confirmation.

pub mod config;
pub mod contacts;
pub mod intent;
pub mod session;
pub mod speech;
