use base64::Engine;
use reqwest::header::{HeaderMap, HeaderValue, InvalidHeaderValue, AUTHORIZATION};

use crate::config::settings::Credentials;

// Header names are case-insensitive; the map requires the lowercase form
pub const API_KEY_HEADER: &str = "x-jfrog-art-api";

/// Builds the credential headers sent with every request. The map is built once
/// per client and never mutated afterwards.
pub fn get_auth_headers(credentials: &Credentials) -> Result<HeaderMap, InvalidHeaderValue> {
    let mut headers = HeaderMap::new();

    match credentials {
        Credentials::Anonymous => {}
        Credentials::Basic { user, apikey } => {
            let token =
                base64::engine::general_purpose::STANDARD.encode(format!("{}:{}", user, apikey));
            headers.insert(AUTHORIZATION, sensitive(&format!("Basic {}", token))?);
        }
        Credentials::ApiKey(apikey) => {
            headers.insert(API_KEY_HEADER, sensitive(apikey)?);
        }
        Credentials::Bearer(token) => {
            headers.insert(AUTHORIZATION, sensitive(&format!("Bearer {}", token))?);
        }
    }

    Ok(headers)
}

fn sensitive(value: &str) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut header = HeaderValue::from_str(value)?;
    header.set_sensitive(true);
    Ok(header)
}
