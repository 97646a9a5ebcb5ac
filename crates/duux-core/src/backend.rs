// Seam between the coordinator and the HTTP client, so the state machine
// can be driven by a scripted fake in tests.

use std::future::Future;

use duux_api::{Command, DeviceState, DuuxClient, Error};

/// The two calls the coordinator makes against a fan.
pub trait FanBackend: Send + Sync {
    fn fetch_status(&self) -> impl Future<Output = Result<DeviceState, Error>> + Send;

    fn send_commands(&self, commands: &[Command])
    -> impl Future<Output = Result<(), Error>> + Send;
}

impl FanBackend for DuuxClient {
    fn fetch_status(&self) -> impl Future<Output = Result<DeviceState, Error>> + Send {
        DuuxClient::fetch_status(self)
    }

    fn send_commands(
        &self,
        commands: &[Command],
    ) -> impl Future<Output = Result<(), Error>> + Send {
        DuuxClient::send_commands(self, commands)
    }
}
