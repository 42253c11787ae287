//! Musician presence — the multicast listener that fills the roster and the
//! expiry task that prunes it.

pub mod expiry;
pub mod listener;

pub use expiry::expiry_loop;
pub use listener::{bind_multicast, listener_loop};
