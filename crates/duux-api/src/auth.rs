use std::fmt;
use std::str::FromStr;

use secrecy::SecretString;

use crate::error::Error;

/// Hardware address the vendor cloud uses to key a fan.
///
/// Always six colon-separated hex octets, stored lowercase. Dashes are
/// accepted on input and normalized to colons.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceId(String);

impl DeviceId {
    pub fn new(raw: impl AsRef<str>) -> Result<Self, Error> {
        let normalized = raw.as_ref().trim().to_lowercase().replace('-', ":");
        let octets: Vec<&str> = normalized.split(':').collect();
        let valid = octets.len() == 6
            && octets
                .iter()
                .all(|o| o.len() == 2 && o.chars().all(|c| c.is_ascii_hexdigit()));
        if valid {
            Ok(Self(normalized))
        } else {
            Err(Error::InvalidDeviceId(raw.as_ref().to_owned()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for DeviceId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Credentials for one fan on the vendor cloud.
///
/// The JWT is vendor-issued with an undisclosed expiry; it is presented as
/// a bearer token and never inspected. `Debug` output redacts it.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub device_id: DeviceId,
    pub jwt_token: SecretString,
}

impl Credentials {
    pub fn new(device_id: DeviceId, jwt_token: impl Into<String>) -> Self {
        Self {
            device_id,
            jwt_token: SecretString::from(jwt_token.into()),
        }
    }
}
