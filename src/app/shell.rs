//! Transport-decoupled admin request handling.
//!
//! The HTTP server itself lives outside the core.  It parses a request into
//! a [`Request`] (method, path, decoded form fields, and the password the
//! client authenticated with) and hands it to [`handle`], which looks the
//! route up in [`route_table`] and calls a plain function with an explicit
//! `&mut Device`.  No handler captures state.
//!
//! | Method | Path        | Protected | Effect                                  |
//! |--------|-------------|-----------|-----------------------------------------|
//! | GET    | `/config`   | yes       | redacted config summary                 |
//! | GET    | `/sensors`  | no        | current reading                         |
//! | POST   | `/settings` | yes       | set backend/sampling fields, commit     |
//! | POST   | `/network`  | yes       | set hostname/WiFi, commit, reconnect    |
//! | POST   | `/reset`    | yes       | restore defaults                        |

use log::{info, warn};
use serde::Serialize;

use crate::app::ports::{Clock, HttpPort, SensorPort, StoragePort, WifiRadio};
use crate::app::service::Device;
use crate::config::ConfigField;
use crate::error::ConfigError;

const JSON: &str = "application/json";
const TEXT: &str = "text/plain";

/// Fields accepted by `POST /settings`, in the order they are applied.
const SETTINGS_FIELDS: [ConfigField; 9] = [
    ConfigField::BackendType,
    ConfigField::BackendHost,
    ConfigField::BackendPort,
    ConfigField::Database,
    ConfigField::Measurement,
    ConfigField::Location,
    ConfigField::SampleInterval,
    ConfigField::HttpPassword,
    ConfigField::TempOffset,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

#[derive(Debug, Clone, Copy)]
pub struct Request<'a> {
    pub method: Method,
    pub path: &'a str,
    /// Decoded form fields, in arrival order.
    pub form: &'a [(&'a str, &'a str)],
    /// Password presented by the client, if any.
    pub password: Option<&'a str>,
}

impl Request<'_> {
    /// First value submitted for `key`.
    pub fn arg(&self, key: &str) -> Option<&str> {
        self.form.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl Response {
    fn json(status: u16, body: String) -> Self {
        Self {
            status,
            content_type: JSON,
            body,
        }
    }

    fn text(status: u16, body: &str) -> Self {
        Self {
            status,
            content_type: TEXT,
            body: body.into(),
        }
    }

    fn ok() -> Self {
        Self::report(200, "ok", None)
    }

    fn report(code: u16, status: &str, error: Option<String>) -> Self {
        #[derive(Serialize)]
        struct Status<'a> {
            status: &'a str,
            #[serde(skip_serializing_if = "Option::is_none")]
            error: Option<String>,
        }
        match serde_json::to_string(&Status { status, error }) {
            Ok(body) => Self::json(code, body),
            Err(_) => Self::text(500, "serialisation failed"),
        }
    }

    fn rejected(e: ConfigError) -> Self {
        Self::report(400, "rejected", Some(e.to_string()))
    }
}

pub type Handler<D> = fn(&mut D, &Request<'_>) -> Response;

pub struct Route<D> {
    pub method: Method,
    pub path: &'static str,
    /// Requires the admin password when one is configured.
    pub protected: bool,
    pub handler: Handler<D>,
}

/// Every admin route.
pub fn route_table<S, R, P, H, C>() -> [Route<Device<S, R, P, H, C>>; 5]
where
    S: StoragePort,
    R: WifiRadio,
    P: SensorPort,
    H: HttpPort,
    C: Clock,
{
    [
        Route {
            method: Method::Get,
            path: "/config",
            protected: true,
            handler: get_config::<S, R, P, H, C>,
        },
        Route {
            method: Method::Get,
            path: "/sensors",
            protected: false,
            handler: get_sensors::<S, R, P, H, C>,
        },
        Route {
            method: Method::Post,
            path: "/settings",
            protected: true,
            handler: post_settings::<S, R, P, H, C>,
        },
        Route {
            method: Method::Post,
            path: "/network",
            protected: true,
            handler: post_network::<S, R, P, H, C>,
        },
        Route {
            method: Method::Post,
            path: "/reset",
            protected: true,
            handler: post_reset::<S, R, P, H, C>,
        },
    ]
}

/// Route `req` to its handler, enforcing the admin password.
pub fn handle<S, R, P, H, C>(dev: &mut Device<S, R, P, H, C>, req: &Request<'_>) -> Response
where
    S: StoragePort,
    R: WifiRadio,
    P: SensorPort,
    H: HttpPort,
    C: Clock,
{
    let table = route_table::<S, R, P, H, C>();
    let Some(route) = table.iter().find(|r| r.method == req.method && r.path == req.path) else {
        return Response::text(404, "Not Found");
    };

    if route.protected && !authorised(dev.live_config().http_pw.as_str(), req.password) {
        warn!("Shell: {} refused, bad credentials", req.path);
        return Response::text(401, "Unauthorized");
    }

    (route.handler)(dev, req)
}

/// An empty admin password leaves the shell open.
fn authorised(expected: &str, presented: Option<&str>) -> bool {
    expected.is_empty() || presented == Some(expected)
}

fn get_config<S, R, P, H, C>(dev: &mut Device<S, R, P, H, C>, _req: &Request<'_>) -> Response
where
    S: StoragePort,
    R: WifiRadio,
    P: SensorPort,
    H: HttpPort,
    C: Clock,
{
    match dev.config_summary().to_json() {
        Ok(body) => Response::json(200, body),
        Err(_) => Response::text(500, "serialisation failed"),
    }
}

fn get_sensors<S, R, P, H, C>(dev: &mut Device<S, R, P, H, C>, _req: &Request<'_>) -> Response
where
    S: StoragePort,
    R: WifiRadio,
    P: SensorPort,
    H: HttpPort,
    C: Clock,
{
    match dev.sensor_summary().to_json() {
        Ok(body) => Response::json(200, body),
        Err(_) => Response::text(500, "serialisation failed"),
    }
}

fn post_settings<S, R, P, H, C>(dev: &mut Device<S, R, P, H, C>, req: &Request<'_>) -> Response
where
    S: StoragePort,
    R: WifiRadio,
    P: SensorPort,
    H: HttpPort,
    C: Clock,
{
    let staged = SETTINGS_FIELDS
        .iter()
        .filter_map(|f| req.arg(f.key()).map(|v| (f.key(), v)))
        .try_for_each(|(key, value)| dev.set_config(key, value));

    apply_or_discard(dev, staged)
}

fn post_network<S, R, P, H, C>(dev: &mut Device<S, R, P, H, C>, req: &Request<'_>) -> Response
where
    S: StoragePort,
    R: WifiRadio,
    P: SensorPort,
    H: HttpPort,
    C: Clock,
{
    let (Some(ssid), Some(hostname)) = (req.arg("ssid"), req.arg("hostname")) else {
        return Response::text(400, "Missing Data");
    };

    let staged = stage_network(dev, ssid, hostname, req.arg("wifi_pw"));
    apply_or_discard(dev, staged)
}

fn post_reset<S, R, P, H, C>(dev: &mut Device<S, R, P, H, C>, _req: &Request<'_>) -> Response
where
    S: StoragePort,
    R: WifiRadio,
    P: SensorPort,
    H: HttpPort,
    C: Clock,
{
    info!("Shell: reset to defaults requested");
    match dev.reset_config() {
        Ok(()) => Response::ok(),
        Err(e) => Response::report(500, "failed", Some(e.to_string())),
    }
}

fn stage_network<S, R, P, H, C>(
    dev: &mut Device<S, R, P, H, C>,
    ssid: &str,
    hostname: &str,
    wifi_pw: Option<&str>,
) -> Result<(), ConfigError>
where
    S: StoragePort,
    R: WifiRadio,
    P: SensorPort,
    H: HttpPort,
    C: Clock,
{
    dev.set_config(ConfigField::Ssid.key(), ssid)?;
    dev.set_config(ConfigField::Hostname.key(), hostname)?;
    // A blank passphrase field keeps the stored one.
    match wifi_pw {
        Some(pw) if !pw.is_empty() => dev.set_config(ConfigField::WifiPassword.key(), pw),
        _ => Ok(()),
    }
}

/// Commit a fully staged form, or throw the whole form away.
fn apply_or_discard<S, R, P, H, C>(
    dev: &mut Device<S, R, P, H, C>,
    staged: Result<(), ConfigError>,
) -> Response
where
    S: StoragePort,
    R: WifiRadio,
    P: SensorPort,
    H: HttpPort,
    C: Clock,
{
    if let Err(e) = staged {
        if let Err(reload) = dev.discard_config() {
            warn!("Shell: could not discard staged changes: {}", reload);
        }
        return Response::rejected(e);
    }
    match dev.commit_config() {
        Ok(()) => Response::ok(),
        Err(e) => Response::report(500, "failed", Some(e.to_string())),
    }
}
