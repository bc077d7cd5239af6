use reqwest::Url;

pub fn parse_bool_flag(value: String) -> Option<bool> {
    parse_bool_str(value.as_str())
}

pub fn parse_bool_str(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

pub fn env_flag(name: &str) -> Option<bool> {
    std::env::var(name).ok().and_then(parse_bool_flag)
}

/// True for localhost, loopback IPv4/IPv6 and 0.0.0.0 hosts. Matches the
/// parsed host exactly, so `localhost.example.com` is remote.
pub fn is_local_endpoint_url(url: &str) -> bool {
    let parsed = match Url::parse(url.trim()) {
        Ok(parsed) => parsed,
        Err(_) => return false,
    };

    match parsed.host_str() {
        Some(host) => {
            let host = host.trim_start_matches('[').trim_end_matches(']');
            let normalized = host.to_ascii_lowercase();
            normalized == "localhost"
                || normalized == "::1"
                || normalized == "0.0.0.0"
                || normalized
                    .parse::<std::net::Ipv4Addr>()
                    .is_ok_and(|ip| ip.is_loopback())
        }
        None => false,
    }
}

/// Renders the extension context as the user turn of a completion request.
pub fn context_to_text(context: &serde_json::Value) -> String {
    match context {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(text) => text.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_bool_helpers() {
        assert_eq!(parse_bool_str("true"), Some(true));
        assert_eq!(parse_bool_str("0"), Some(false));
        assert_eq!(parse_bool_flag("YES".to_string()), Some(true));
        assert_eq!(parse_bool_flag("off".to_string()), Some(false));
        assert_eq!(parse_bool_str("maybe"), None);
    }

    #[test]
    fn test_is_local_endpoint_url_normalizes_case_and_space() {
        assert!(is_local_endpoint_url(" HTTP://LOCALHOST:8000/v1/messages "));
        assert!(is_local_endpoint_url("https://127.0.0.1/v1/messages"));
        assert!(is_local_endpoint_url("http://127.0.1.1:8080/v1/chat/completions"));
        assert!(is_local_endpoint_url("https://0.0.0.0/v1/messages"));
        assert!(is_local_endpoint_url("http://[::1]:8000/v1/messages"));
        assert!(!is_local_endpoint_url(
            "https://api.anthropic.com/v1/messages"
        ));
    }

    #[test]
    fn test_lookalike_hosts_are_remote() {
        assert!(!is_local_endpoint_url(
            "https://evil-localhost.com/v1/messages"
        ));
        assert!(!is_local_endpoint_url(
            "https://localhost.evil.com/v1/messages"
        ));
        assert!(!is_local_endpoint_url("http://127.0.0.1.attacker.io/v1"));
        assert!(!is_local_endpoint_url("not a url"));
    }

    #[test]
    fn test_context_to_text_shapes() {
        assert_eq!(context_to_text(&serde_json::Value::Null), "");
        assert_eq!(context_to_text(&json!("page text")), "page text");
        let rendered = context_to_text(&json!({"title": "Video"}));
        assert!(rendered.contains("\"title\": \"Video\""));
    }
}
