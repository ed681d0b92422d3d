use super::error::{Error, Result};
use super::settings::SourceSettings;
use log::{debug, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use std::time::Duration;

///
/// Something that can hand out one random byte at a time.
///
/// Every call is a fresh draw. Implementations must not cache or reuse bytes.
///
pub trait RandomByteSource {
    fn fetch_byte(&mut self) -> Result<u8>;
}

impl<S: RandomByteSource + ?Sized> RandomByteSource for Box<S> {
    fn fetch_byte(&mut self) -> Result<u8> {
        (**self).fetch_byte()
    }
}

impl<S: RandomByteSource + ?Sized> RandomByteSource for &mut S {
    fn fetch_byte(&mut self) -> Result<u8> {
        (**self).fetch_byte()
    }
}

#[derive(Debug, Deserialize)]
struct QrngResponse {
    data: Option<Vec<u8>>,
    success: Option<bool>,
}

///
/// Pulls bytes from the ANU quantum random numbers JSON API, one request per byte.
///
pub struct AnuSource {
    client: reqwest::blocking::Client,
    endpoint: String,
}

impl AnuSource {
    pub fn new(settings: &SourceSettings) -> Result<AnuSource> {
        let timeout = Duration::try_from_secs_f64(settings.timeout_secs).map_err(|_| {
            Error::InvalidArguments(format!("bad timeout {}", settings.timeout_secs))
        })?;
        let mut builder = reqwest::blocking::Client::builder().timeout(timeout);
        if !settings.system_proxy {
            builder = builder.no_proxy();
        }
        let client = builder.build()?;
        Ok(AnuSource {
            client,
            endpoint: settings.endpoint.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl RandomByteSource for AnuSource {
    fn fetch_byte(&mut self) -> Result<u8> {
        debug!("Requesting one uint8 from {}", self.endpoint);
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("length", "1"), ("type", "uint8")])
            .send()
            .and_then(|response| response.error_for_status())
            .map_err(|err| {
                warn!("Random byte request failed: {}", err);
                Error::SourceUnavailable(err)
            })?;
        let body = response.text()?;
        parse_response(&body)
    }
}

/// Extracts the single byte from a QRNG JSON body.
pub fn parse_response(body: &str) -> Result<u8> {
    let response: QrngResponse =
        serde_json::from_str(body).map_err(|err| Error::MalformedResponse(err.to_string()))?;
    if response.success == Some(false) {
        debug!("Provider flagged the response as unsuccessful");
    }
    match response.data.as_deref() {
        Some([byte]) => {
            debug!("Received byte {}", byte);
            Ok(*byte)
        }
        Some(data) => Err(Error::MalformedResponse(format!(
            "expected exactly one value in `data`, got {}",
            data.len()
        ))),
        None => Err(Error::MalformedResponse("missing `data` field".to_string())),
    }
}

///
/// Pseudorandom bytes from a local generator. Useful offline, and seedable for
/// reproducible runs.
///
pub struct LocalSource<R: Rng = StdRng> {
    rng: R,
}

impl LocalSource<StdRng> {
    pub fn from_entropy() -> Self {
        LocalSource {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        LocalSource {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl<R: Rng> LocalSource<R> {
    pub fn with_rng(rng: R) -> Self {
        LocalSource { rng }
    }
}

impl<R: Rng> RandomByteSource for LocalSource<R> {
    fn fetch_byte(&mut self) -> Result<u8> {
        Ok(self.rng.gen())
    }
}
