//! RPC invoker trait and the SOAP-over-HTTPS implementation.

use std::time::Duration;

use derive_more::{Display, Error, From};
use serde_json::Value;

use crate::rpc::envelope::{self, EnvelopeError};
use crate::rpc::protocol::{ArgMap, RpcMethod};

#[derive(Debug, Display, From, Error)]
pub enum RpcError {
    /// HTTP-level failure reaching the service.
    Http(reqwest::Error),
    /// The response was not a parseable envelope.
    Envelope(EnvelopeError),
    /// The service processed the call and reported a failure.
    #[display(fmt = "{} request failed [{}]: {}", method, code, message)]
    Fault {
        method: RpcMethod,
        code: String,
        message: String,
    },
    /// The response parsed but did not match the expected shape.
    Decode(serde_json::Error),
}

type Result<T> = std::result::Result<T, RpcError>;

/// Executes one named remote call.
///
/// The reconciliation core talks to the service exclusively through this
/// trait, so tests substitute a scripted stub and alternative transports
/// can be dropped in. Implementations must return `Err` for any
/// non-success response, including in-band application faults.
pub trait RpcInvoker {
    fn invoke(&self, method: RpcMethod, args: &ArgMap) -> Result<Value>;
}

/// Connection settings for [`SoapClient`].
#[derive(Debug, Clone)]
pub struct SoapConfig {
    /// URL the request envelopes are POSTed to.
    pub endpoint: String,
    /// Namespace the service dispatches methods under; also the base of
    /// the SOAPAction header.
    pub namespace: String,
    /// Accept self-signed certificates. Leave off unless the deployment
    /// actually runs with one.
    pub accept_invalid_certs: bool,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl SoapConfig {
    pub fn new(endpoint: &str, namespace: &str) -> SoapConfig {
        SoapConfig {
            endpoint: endpoint.to_string(),
            namespace: namespace.to_string(),
            accept_invalid_certs: false,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Blocking SOAP transport over HTTPS.
pub struct SoapClient {
    config: SoapConfig,
    http: reqwest::blocking::Client,
}

impl SoapClient {
    pub fn new(config: SoapConfig) -> Result<SoapClient> {
        let http = reqwest::blocking::Client::builder()
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .timeout(config.timeout)
            .build()?;
        Ok(SoapClient { config, http })
    }
}

impl RpcInvoker for SoapClient {
    fn invoke(&self, method: RpcMethod, args: &ArgMap) -> Result<Value> {
        // argument values stay out of the logs; login calls carry credentials
        log::debug!("invoking {} with {} arguments", method, args.len());

        let body = envelope::build_envelope(method.as_str(), &self.config.namespace, args);
        let action = format!("{}#{}", self.config.namespace, method.as_str());
        let response = self
            .http
            .post(&self.config.endpoint)
            .header("SOAPAction", action)
            .header(reqwest::header::CONTENT_TYPE, "text/xml")
            .body(body)
            .send()?
            .error_for_status()?;

        let text = response.text()?;
        let value = envelope::parse_response(&text)?;
        check_fault(method, &value)?;
        Ok(value)
    }
}

/// The service reports application failures in-band as `error_code` /
/// `error_msg` fields; anything other than 200 or 201 is a fault.
pub fn check_fault(method: RpcMethod, value: &Value) -> Result<()> {
    let code = match value.get("error_code") {
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) => s.clone(),
        _ => return Ok(()),
    };
    if code == "200" || code == "201" {
        return Ok(());
    }
    let message = value
        .get("error_msg")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();
    Err(RpcError::Fault {
        method,
        code,
        message,
    })
}
