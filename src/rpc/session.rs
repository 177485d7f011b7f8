//! Session token lifecycle for the zone service.
//!
//! The service hands out a session token at login and silently discards
//! it after a couple of minutes of inactivity. Rather than surfacing
//! that to every caller, the session manager watches the idle clock and
//! re-establishes the session before the call that would have failed.

use chrono::{DateTime, Duration, Local};
use serde_json::Value;

use crate::rpc::client::{RpcError, RpcInvoker};
use crate::rpc::protocol::{decode, ArgMap, LoginResponse, RpcMethod, RpcValue};

/// Idle time after which the service discards a session token.
pub const SESSION_IDLE_LIMIT_SECS: i64 = 120;

/// Owns the session token and the idle bookkeeping around it.
///
/// Single-threaded by design; every call goes through `&mut self`.
pub struct SessionManager<I: RpcInvoker> {
    invoker: I,
    username: String,
    password: String,
    token: Option<String>,
    last_activity: DateTime<Local>,
}

type Result<T> = std::result::Result<T, RpcError>;

impl<I: RpcInvoker> SessionManager<I> {
    pub fn new(invoker: I, username: &str, password: &str) -> SessionManager<I> {
        SessionManager {
            invoker,
            username: username.to_string(),
            password: password.to_string(),
            token: None,
            last_activity: Local::now(),
        }
    }

    /// Execute one remote call, re-establishing the session first when it
    /// has gone idle past the service's limit or no token exists yet.
    ///
    /// The idle stamp is refreshed on every attempt, so an actively used
    /// session only ever expires from true inactivity. A call that
    /// supplies its own `username` is a login in disguise and is passed
    /// through without forcing one first.
    pub fn call(&mut self, method: RpcMethod, mut args: ArgMap) -> Result<Value> {
        let idle = Local::now() - self.last_activity;
        self.last_activity = Local::now();
        if idle > Duration::seconds(SESSION_IDLE_LIMIT_SECS)
            || (self.token.is_none() && !args.contains_key("username"))
        {
            self.token = None;
            self.login()?;
        }
        if method != RpcMethod::Login {
            if let Some(token) = &self.token {
                args.insert(
                    "nt_user_session".to_string(),
                    RpcValue::from(token.as_str()),
                );
            }
        }
        self.invoker.invoke(method, &args)
    }

    /// One login round-trip; the returned token becomes the session.
    /// Login failures propagate untouched, there is no retry here.
    fn login(&mut self) -> Result<()> {
        log::debug!("establishing session for {}", self.username);
        let mut args = ArgMap::new();
        args.insert(
            "username".to_string(),
            RpcValue::from(self.username.as_str()),
        );
        args.insert(
            "password".to_string(),
            RpcValue::from(self.password.as_str()),
        );
        args.insert("nt_user_session".to_string(), RpcValue::from(""));
        let response = self.invoker.invoke(RpcMethod::Login, &args)?;
        let login: LoginResponse = decode(response)?;
        self.token = Some(login.nt_user_session);
        Ok(())
    }

    pub fn invoker(&self) -> &I {
        &self.invoker
    }
}
