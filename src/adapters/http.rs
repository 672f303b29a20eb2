//! Outbound HTTP client adapter.
//!
//! Implements [`HttpPort`] for the telemetry dispatcher.
//!
//! - **`target_os = "espidf"`**: `EspHttpConnection` wrapped in the
//!   `embedded_svc` blocking client, one connection per request.
//! - **all other targets**: records each request and answers with a fixed
//!   status code.

use log::debug;

use crate::app::ports::HttpPort;
use crate::error::DispatchError;

#[cfg(target_os = "espidf")]
use embedded_svc::{http::client::Client, io::Write};
#[cfg(target_os = "espidf")]
use esp_idf_svc::http::client::{Configuration, EspHttpConnection};

/// Upper bound on one request, connect included.
#[cfg(target_os = "espidf")]
const REQUEST_TIMEOUT: core::time::Duration = core::time::Duration::from_secs(5);

/// A request as seen by the simulation backend.
#[cfg(not(target_os = "espidf"))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimRequest {
    pub url: String,
    pub content_type: String,
    pub body: Vec<u8>,
}

pub struct HttpAdapter {
    #[cfg(not(target_os = "espidf"))]
    sim_status: u16,
    #[cfg(not(target_os = "espidf"))]
    sim_requests: Vec<SimRequest>,
}

impl HttpAdapter {
    #[cfg(target_os = "espidf")]
    pub fn new() -> Self {
        Self {}
    }

    /// Simulation answers every request with `204 No Content`.
    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Self {
        Self {
            sim_status: 204,
            sim_requests: Vec::new(),
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn sim_set_status(&mut self, status: u16) {
        self.sim_status = status;
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn sim_requests(&self) -> &[SimRequest] {
        &self.sim_requests
    }
}

impl Default for HttpAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpPort for HttpAdapter {
    #[cfg(target_os = "espidf")]
    fn post(&mut self, url: &str, content_type: &str, body: &[u8]) -> Result<u16, DispatchError> {
        let conn = EspHttpConnection::new(&Configuration {
            timeout: Some(REQUEST_TIMEOUT),
            ..Default::default()
        })
        .map_err(|_| DispatchError::Connection)?;
        let mut client = Client::wrap(conn);

        let content_length = body.len().to_string();
        let headers = [("Content-Type", content_type), ("Content-Length", content_length.as_str())];

        let mut request = client.post(url, &headers).map_err(|_| DispatchError::Connection)?;
        request.write_all(body).map_err(|_| DispatchError::Connection)?;
        request.flush().map_err(|_| DispatchError::Connection)?;
        let response = request.submit().map_err(|_| DispatchError::Connection)?;

        let status = response.status();
        debug!("Http: POST {} -> {}", url, status);
        Ok(status)
    }

    #[cfg(not(target_os = "espidf"))]
    fn post(&mut self, url: &str, content_type: &str, body: &[u8]) -> Result<u16, DispatchError> {
        self.sim_requests.push(SimRequest {
            url: url.to_owned(),
            content_type: content_type.to_owned(),
            body: body.to_vec(),
        });
        debug!("Http(sim): POST {} ({} bytes) -> {}", url, body.len(), self.sim_status);
        Ok(self.sim_status)
    }
}
