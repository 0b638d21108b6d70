//! Built-in matcher function library (§4.3): `keyMatch*`, `regexMatch`,
//! `globMatch`, `ipMatch*`, `keyGet*`, `timeMatch`.

use std::collections::HashMap;
use std::net::IpAddr;

use chrono::DateTime;
use regex::Regex;

use crate::error::EvalError;

pub fn key_match(key1: &str, key2: &str) -> bool {
    match key2.find('*') {
        None => key1 == key2,
        Some(i) => {
            if key1.len() > i {
                key1[..i] == key2[..i]
            } else {
                key1 == &key2[..i]
            }
        }
    }
}

/// `:param` placeholders match exactly one path segment; `*` matches the
/// remainder of the path.
pub fn key_match2(key1: &str, key2: &str) -> bool {
    let pattern = colon_params_to_regex(key2);
    Regex::new(&pattern)
        .map(|re| re.is_match(key1))
        .unwrap_or(false)
}

/// `{param}` placeholders match exactly one path segment.
pub fn key_match3(key1: &str, key2: &str) -> bool {
    let pattern = brace_params_to_regex(key2);
    Regex::new(&pattern)
        .map(|re| re.is_match(key1))
        .unwrap_or(false)
}

/// Like `keyMatch3`, but a parameter name repeated more than once in `key2`
/// must capture the same value on every occurrence.
pub fn key_match4(key1: &str, key2: &str) -> bool {
    let mut names = Vec::new();
    let pattern = brace_params_to_regex_capturing(key2, &mut names);
    let Ok(re) = Regex::new(&pattern) else {
        return false;
    };
    let Some(caps) = re.captures(key1) else {
        return false;
    };

    let mut seen: HashMap<&str, &str> = HashMap::new();
    for (idx, name) in names.iter().enumerate() {
        let Some(value) = caps.get(idx + 1).map(|m| m.as_str()) else {
            return false;
        };
        if let Some(prev) = seen.get(name.as_str()) {
            if *prev != value {
                return false;
            }
        } else {
            seen.insert(name.as_str(), value);
        }
    }
    true
}

/// Like `keyMatch2`, but query strings (everything from `?` onward) on
/// `key1` are ignored.
pub fn key_match5(key1: &str, key2: &str) -> bool {
    let path = key1.split('?').next().unwrap_or(key1);
    key_match2(path, key2)
}

pub fn regex_match(key1: &str, key2: &str) -> bool {
    Regex::new(key2).map(|re| re.is_match(key1)).unwrap_or(false)
}

pub fn glob_match(key1: &str, key2: &str) -> bool {
    let mut pattern = String::from("^");
    for c in key2.chars() {
        match c {
            '*' => pattern.push_str(".*"),
            '?' => pattern.push('.'),
            c if ".+()[]{}|^$\\".contains(c) => {
                pattern.push('\\');
                pattern.push(c);
            }
            c => pattern.push(c),
        }
    }
    pattern.push('$');
    Regex::new(&pattern).map(|re| re.is_match(key1)).unwrap_or(false)
}

/// `ip` must be a bare address; `cidr_or_ip` may be a single address or a
/// CIDR block, IPv4 or IPv6.
pub fn ip_match(ip: &str, cidr_or_ip: &str) -> Result<bool, EvalError> {
    let addr: IpAddr = ip
        .parse()
        .map_err(|_| EvalError::TypeError(format!("`{ip}` is not a valid IP address")))?;

    if let Some((network, prefix)) = cidr_or_ip.split_once('/') {
        let prefix_len: u8 = prefix
            .parse()
            .map_err(|_| EvalError::TypeError(format!("`{cidr_or_ip}` is not a valid CIDR")))?;
        let network: IpAddr = network
            .parse()
            .map_err(|_| EvalError::TypeError(format!("`{cidr_or_ip}` is not a valid CIDR")))?;
        match (network, addr) {
            (IpAddr::V4(n), IpAddr::V4(a)) => {
                let net = ipnet::Ipv4Net::new(n, prefix_len)
                    .map_err(|_| EvalError::TypeError(format!("invalid CIDR `{cidr_or_ip}`")))?;
                Ok(net.contains(&a))
            }
            (IpAddr::V6(n), IpAddr::V6(a)) => {
                let net = ipnet::Ipv6Net::new(n, prefix_len)
                    .map_err(|_| EvalError::TypeError(format!("invalid CIDR `{cidr_or_ip}`")))?;
                Ok(net.contains(&a))
            }
            _ => Ok(false),
        }
    } else {
        let other: IpAddr = cidr_or_ip
            .parse()
            .map_err(|_| EvalError::TypeError(format!("`{cidr_or_ip}` is not a valid IP address")))?;
        Ok(addr == other)
    }
}

pub fn key_get(key1: &str, key2: &str) -> String {
    match key2.find('*') {
        None => String::new(),
        Some(i) => {
            if key1.len() > i && key1[..i] == key2[..i] {
                key1[i..].to_string()
            } else {
                String::new()
            }
        }
    }
}

pub fn key_get2(key1: &str, key2: &str, path_var: &str) -> String {
    let seg2: Vec<&str> = key2.split('/').collect();
    let seg1: Vec<&str> = key1.split('/').collect();
    if seg1.len() != seg2.len() {
        return String::new();
    }
    for (s1, s2) in seg1.iter().zip(seg2.iter()) {
        if let Some(name) = s2.strip_prefix(':') {
            if name == path_var {
                return s1.to_string();
            }
        } else if s1 != s2 {
            return String::new();
        }
    }
    String::new()
}

pub fn key_get3(key1: &str, key2: &str, path_var: &str) -> String {
    let seg2: Vec<&str> = key2.split('/').collect();
    let seg1: Vec<&str> = key1.split('/').collect();
    if seg1.len() != seg2.len() {
        return String::new();
    }
    for (s1, s2) in seg1.iter().zip(seg2.iter()) {
        if s2.starts_with('{') && s2.ends_with('}') {
            let name = &s2[1..s2.len() - 1];
            if name == path_var {
                return s1.to_string();
            }
        } else if s1 != s2 {
            return String::new();
        }
    }
    String::new()
}

pub fn time_match(now: &str, start: &str, end: &str) -> Result<bool, EvalError> {
    let parse = |s: &str| {
        DateTime::parse_from_rfc3339(s)
            .map_err(|_| EvalError::TypeError(format!("`{s}` is not an RFC3339 timestamp")))
    };
    let now = parse(now)?;
    let start = parse(start)?;
    let end = parse(end)?;
    Ok(now >= start && now <= end)
}

fn colon_params_to_regex(pattern: &str) -> String {
    let mut out = String::from("^");
    for segment in pattern.split('/') {
        if !out.ends_with('^') {
            out.push('/');
        }
        if segment == "*" {
            out.push_str(".*");
        } else if let Some(_name) = segment.strip_prefix(':') {
            out.push_str("[^/]+");
        } else {
            out.push_str(&regex::escape(segment));
        }
    }
    out.push('$');
    out
}

fn brace_params_to_regex(pattern: &str) -> String {
    let mut names = Vec::new();
    brace_params_to_regex_capturing(pattern, &mut names)
}

fn brace_params_to_regex_capturing(pattern: &str, names: &mut Vec<String>) -> String {
    let mut out = String::from("^");
    for segment in pattern.split('/') {
        if !out.ends_with('^') {
            out.push('/');
        }
        if segment == "*" {
            out.push_str(".*");
        } else if segment.starts_with('{') && segment.ends_with('}') {
            names.push(segment[1..segment.len() - 1].to_string());
            out.push_str("([^/]+)");
        } else {
            out.push_str(&regex::escape(segment));
        }
    }
    out.push('$');
    out
}
