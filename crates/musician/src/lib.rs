//! musician — plays one instrument and announces it on the multicast group
//! until stopped.

use roster_core::{ConfigError, Instrument};

pub mod broadcast;

pub use broadcast::{broadcast_loop, make_multicast_socket, new_announcement};

/// Pick the instrument from the first positional argument.
pub fn instrument_from_args<I>(args: I) -> Result<Instrument, ConfigError>
where
    I: IntoIterator<Item = String>,
{
    args.into_iter()
        .next()
        .ok_or(ConfigError::MissingInstrument)?
        .parse()
}
