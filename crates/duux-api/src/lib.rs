// duux-api: Async Rust client for the Duux smart fan cloud API

pub mod auth;
pub mod client;
pub mod command;
pub mod error;
pub mod model;
pub mod transport;

pub use auth::{Credentials, DeviceId};
pub use client::{DEFAULT_API_URL, DuuxClient};
pub use command::{
    Command, CommandEncoding, Field, FieldSpec, NumericEncoding, Protocol, TextEncoding,
};
pub use error::Error;
pub use model::{
    DeviceState, MAX_SPEED, MIN_SPEED, percentage_to_speed, speed_to_percentage,
};
pub use transport::{TlsMode, TransportConfig};
