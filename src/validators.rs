//! Built-in format checks and the field validators that wrap them.
//!
//! The field validators let absent values through; combine them with
//! `required()` to reject those.

use std::net::Ipv4Addr;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::field::Validator;

static EMAIL: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$").ok()
});

pub fn is_email(value: &str) -> bool {
    EMAIL.as_ref().map_or(false, |re| re.is_match(value))
}

/// Dotted-quad IPv4 address.
pub fn is_ipv4(value: &str) -> bool {
    value.parse::<Ipv4Addr>().is_ok()
}

fn string_check(check: fn(&str) -> bool, message: &'static str) -> Validator {
    Arc::new(move |value: &Value| match value {
        Value::Null => Ok(()),
        Value::String(s) if check(s) => Ok(()),
        _ => Err(message.to_string()),
    })
}

pub fn email() -> Validator {
    string_check(is_email, "not a valid email address")
}

pub fn ipv4() -> Validator {
    string_check(is_ipv4, "not a valid IPv4 address")
}
