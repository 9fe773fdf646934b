use axum::http::{header, HeaderMap, HeaderValue};

pub const SESSION_COOKIE: &str = "token";

fn attributes(secure: bool, max_age: i64) -> String {
    let secure = if secure { " Secure;" } else { "" };
    format!("HttpOnly;{secure} SameSite=None; Path=/; Max-Age={max_age}")
}

/// `Set-Cookie` value carrying a freshly issued token.
pub fn session_cookie(
    token: &str,
    secure: bool,
    lifetime_secs: i64,
) -> Result<HeaderValue, header::InvalidHeaderValue> {
    HeaderValue::from_str(&format!(
        "{SESSION_COOKIE}={token}; {}",
        attributes(secure, lifetime_secs)
    ))
}

/// Must mirror the attributes of [`session_cookie`] or browsers keep the old cookie.
pub fn clear_session_cookie(secure: bool) -> HeaderValue {
    let value = format!("{SESSION_COOKIE}=; {}", attributes(secure, 0));
    HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static("token=; Max-Age=0"))
}

/// First value of cookie `name` across all `Cookie` headers.
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_cookie_carries_required_attributes() {
        let v = session_cookie("abc.def.ghi", true, 3600).unwrap();
        assert_eq!(
            v.to_str().unwrap(),
            "token=abc.def.ghi; HttpOnly; Secure; SameSite=None; Path=/; Max-Age=3600"
        );
    }

    #[test]
    fn secure_flag_is_optional() {
        let v = session_cookie("t", false, 60).unwrap();
        assert!(!v.to_str().unwrap().contains("Secure"));
    }

    #[test]
    fn clearing_cookie_matches_attributes() {
        let v = clear_session_cookie(true);
        assert_eq!(
            v.to_str().unwrap(),
            "token=; HttpOnly; Secure; SameSite=None; Path=/; Max-Age=0"
        );
    }

    #[test]
    fn finds_cookie_among_others() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("theme=dark"));
        headers.append(header::COOKIE, HeaderValue::from_static("a=1; token=xyz; b=2"));
        assert_eq!(cookie_value(&headers, "token"), Some("xyz"));
        assert_eq!(cookie_value(&headers, "missing"), None);
    }
}
