//! Network builtins. The engine has no network; these delegate to the host.

use crate::engine::Engine;
use crate::error::{ShellError, ShellResult};
use crate::output::{Action, Output};
use crate::parser::Invocation;

const CURL_HELP: &str = "Usage: curl [options] <url>\n  -I, --head     Show headers only\n  -X <method>    HTTP method\n  -H <header>    Add header\n  -d <data>      POST data\n  -o <file>      Output to file";

/// Last argument that is not a flag.
fn last_operand(inv: &Invocation) -> Option<&str> {
    inv.args
        .iter()
        .rev()
        .map(String::as_str)
        .find(|a| !a.starts_with('-'))
}

pub(super) fn wget(_sh: &mut Engine, inv: &Invocation) -> ShellResult<Output> {
    let url = last_operand(inv).ok_or_else(|| ShellError::usage("wget: missing URL"))?;
    Ok(Action::Fetch(url.to_string()).into())
}

pub(super) fn curl(_sh: &mut Engine, inv: &Invocation) -> ShellResult<Output> {
    if inv.args.is_empty() {
        return Err(ShellError::usage(
            "curl: try 'curl --help' for more information",
        ));
    }
    let mut method = "GET".to_string();
    let mut show_headers = false;
    let mut url = None;
    let mut args = inv.args.iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--help" => return Ok(Output::text(CURL_HELP)),
            "-I" | "--head" => show_headers = true,
            "-X" | "--request" => {
                if let Some(m) = args.next() {
                    method = m.to_uppercase();
                }
            }
            "-H" | "--header" | "-d" | "--data" | "-o" | "-O" => {
                args.next();
            }
            other if !other.starts_with('-') => url = Some(other.to_string()),
            _ => {}
        }
    }
    let url = url.ok_or_else(|| ShellError::usage("curl: no URL specified"))?;
    Ok(Action::Curl {
        method,
        show_headers,
        url,
    }
    .into())
}

pub(super) fn ping(_sh: &mut Engine, inv: &Invocation) -> ShellResult<Output> {
    let host = last_operand(inv).ok_or_else(|| ShellError::usage("usage: ping <host>"))?;
    Ok(Action::Ping(host.to_string()).into())
}

/// `host`, `nslookup` and `dig`.
pub(super) fn dns(_sh: &mut Engine, inv: &Invocation) -> ShellResult<Output> {
    let name = inv
        .args
        .last()
        .ok_or_else(|| ShellError::usage(format!("Usage: {} <hostname>", inv.name)))?;
    Ok(Action::Dns(name.clone()).into())
}

pub(super) fn myip(_sh: &mut Engine, _inv: &Invocation) -> ShellResult<Output> {
    Ok(Action::MyIp.into())
}

pub(super) fn ifconfig(_sh: &mut Engine, _inv: &Invocation) -> ShellResult<Output> {
    Ok(Output::text(
        "eth0: flags=4163<UP,BROADCAST,RUNNING,MULTICAST>  mtu 1500\n        inet 10.0.2.15  netmask 255.255.255.0  broadcast 10.0.2.255\n        ether 52:54:00:12:34:56  txqueuelen 1000  (Ethernet)\n\nlo: flags=73<UP,LOOPBACK,RUNNING>  mtu 65536\n        inet 127.0.0.1  netmask 255.0.0.0\n        loop  txqueuelen 1000  (Local Loopback)",
    ))
}
