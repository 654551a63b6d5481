use std::fmt;

use serde::{Deserialize, Serialize};

/// Store connection metadata with secrets redacted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedactedConnection {
    pub scheme: Option<String>,
    pub user: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    /// Path component: a database name for MongoDB, a db index for Redis.
    pub database: Option<String>,
    pub redacted: String,
}

impl fmt::Display for RedactedConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted)
    }
}

/// Redact passwords from a store URI (`mongodb://`, `mongodb+srv://`,
/// `redis://`, `rediss://`) while keeping the parts worth logging.
pub fn redact_connection_string(conn: &str) -> RedactedConnection {
    let Some(scheme_end) = conn.find("://") else {
        return RedactedConnection {
            scheme: None,
            user: None,
            host: None,
            port: None,
            database: None,
            redacted: redact_query_params(conn),
        };
    };

    let scheme = &conn[..scheme_end];
    let rest = &conn[scheme_end + 3..];
    let (authority, tail) = match rest.find(['/', '?']) {
        Some(idx) => rest.split_at(idx),
        None => (rest, ""),
    };

    let (userinfo, hosts) = match authority.rfind('@') {
        Some(idx) => (Some(&authority[..idx]), &authority[idx + 1..]),
        None => (None, authority),
    };

    let mut user = None;
    let mut redacted_userinfo = String::new();
    if let Some(userinfo) = userinfo {
        match userinfo.split_once(':') {
            Some((name, _password)) => {
                if !name.is_empty() {
                    user = Some(name.to_string());
                }
                redacted_userinfo = format!("{name}:***@");
            }
            None => {
                user = Some(userinfo.to_string());
                redacted_userinfo = format!("{userinfo}@");
            }
        }
    }

    // Replica-set URIs list several hosts; only the first is reported.
    let first_host = hosts.split(',').next().unwrap_or("");
    let (host, port) = match first_host.rsplit_once(':') {
        Some((host, port)) => (host, port.parse::<u16>().ok()),
        None => (first_host, None),
    };

    let database = tail
        .strip_prefix('/')
        .and_then(|path| path.split('?').next())
        .filter(|db| !db.is_empty())
        .map(str::to_string);

    let redacted = redact_query_params(&format!("{scheme}://{redacted_userinfo}{hosts}{tail}"));

    RedactedConnection {
        scheme: Some(scheme.to_string()),
        user,
        host: (!host.is_empty()).then(|| host.to_string()),
        port,
        database,
        redacted,
    }
}

fn redact_query_params(conn: &str) -> String {
    let Some(query_start) = conn.find('?') else {
        return conn.to_string();
    };

    let (base, query) = conn.split_at(query_start + 1);
    let params: Vec<String> = query
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some((key, _)) if is_sensitive_key(key) => format!("{key}=***"),
            _ => pair.to_string(),
        })
        .collect();

    format!("{base}{}", params.join("&"))
}

fn is_sensitive_key(key: &str) -> bool {
    matches!(
        key.to_lowercase().as_str(),
        "password" | "pass" | "token" | "authmechanismproperties"
    )
}
