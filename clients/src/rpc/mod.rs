pub mod blockbook;
pub mod btc;
pub mod eth;
pub mod fiber;

use log::debug;
use reqwest::{Client, ClientBuilder};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::io::{Error, ErrorKind};
use std::time::Duration;

pub fn get_url(base: &str, request_uri: &str) -> String {
    format!(
        "{base}/{request_uri}",
        base = base.trim_end_matches('/'),
        request_uri = request_uri
    )
}

pub fn get_client(timeout: u64) -> Result<Client, Error> {
    // Local nodes commonly run with self-signed certificates.
    ClientBuilder::new()
        .danger_accept_invalid_certs(true)
        .timeout(Duration::from_secs(timeout))
        .build()
        .map_err(|e| Error::new(ErrorKind::Other, format!("{e:?}")))
}

pub async fn get<T>(client: &Client, url: &str, query: &[(String, String)]) -> Result<T, Error>
where
    T: DeserializeOwned,
{
    let request = if query.is_empty() {
        client.get(url)
    } else {
        client.get(url).query(query)
    };
    match request.send().await {
        Ok(resp) => match resp.status() {
            reqwest::StatusCode::OK => {
                let body = resp
                    .text()
                    .await
                    .map_err(|e| Error::new(ErrorKind::InvalidData, e.to_string()))?;
                serde_json::from_str(body.as_str()).map_err(|e| {
                    Error::new(
                        ErrorKind::InvalidData,
                        format!("Failed to Parse Json {body},\r\n {e}"),
                    )
                })
            }
            _ => Err(Error::new(
                ErrorKind::InvalidData,
                format!("Bad Status Code: {:?}, for URL {:?}", resp.status(), url),
            )),
        },
        Err(err) => Err(Error::new(ErrorKind::NotConnected, format!("{err:?}"))),
    }
}

pub async fn post<T>(client: &Client, url: &str, data: &Value) -> Result<T, Error>
where
    T: DeserializeOwned,
{
    match client.post(url).json(data).send().await {
        Ok(resp) => match resp.status() {
            reqwest::StatusCode::OK => {
                let body = resp
                    .text()
                    .await
                    .map_err(|e| Error::new(ErrorKind::InvalidData, e.to_string()))?;
                serde_json::from_str(body.as_str()).map_err(|e| {
                    Error::new(
                        ErrorKind::InvalidData,
                        format!("Failed to Parse Json {body},\r\n {e}"),
                    )
                })
            }
            _ => {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                Err(Error::new(
                    ErrorKind::InvalidData,
                    format!("Bad Status Code: {status:?}, for URL {url:?}: {body}"),
                ))
            }
        },
        Err(err) => Err(Error::new(ErrorKind::NotConnected, format!("{err:?}"))),
    }
}

#[derive(serde::Deserialize)]
struct JsonRpcResponse {
    result: Option<Value>,
    error: Option<Value>,
}

/// Issues a JSON-RPC 2.0 call and unwraps the result envelope.
pub async fn call_rpc_method(
    client: &Client,
    url: &str,
    method: &str,
    params: Value,
) -> Result<Value, Error> {
    debug!("rpc {method} -> {url}");
    let envelope = json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": method,
        "params": params,
    });
    let response: JsonRpcResponse = post(client, url, &envelope).await?;
    if let Some(error) = response.error {
        if !error.is_null() {
            return Err(Error::new(
                ErrorKind::InvalidData,
                format!("RPC Error for {method}: {error}"),
            ));
        }
    }
    response.result.ok_or_else(|| {
        Error::new(
            ErrorKind::InvalidData,
            format!("RPC response for {method} is missing a result"),
        )
    })
}

/// Parses a `0x`-prefixed hex quantity as returned by account-model nodes.
pub fn parse_hex_quantity(value: &Value) -> Result<u128, Error> {
    let text = value.as_str().ok_or_else(|| {
        Error::new(
            ErrorKind::InvalidData,
            format!("expected hex quantity, got {value}"),
        )
    })?;
    let trimmed = text.trim_start_matches("0x").trim_start_matches("0X");
    if trimmed.is_empty() {
        return Ok(0);
    }
    u128::from_str_radix(trimmed, 16)
        .map_err(|e| Error::new(ErrorKind::InvalidData, format!("invalid hex quantity: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_url() {
        assert_eq!(
            get_url("http://127.0.0.1:6420/", "api/v1/outputs"),
            "http://127.0.0.1:6420/api/v1/outputs"
        );
        assert_eq!(get_url("http://node", "status"), "http://node/status");
    }

    #[test]
    fn test_parse_hex_quantity() {
        assert_eq!(parse_hex_quantity(&json!("0x0")).unwrap(), 0);
        assert_eq!(parse_hex_quantity(&json!("0x4a817c800")).unwrap(), 20_000_000_000);
        assert_eq!(parse_hex_quantity(&json!("0x")).unwrap(), 0);
        assert!(parse_hex_quantity(&json!(12)).is_err());
        assert!(parse_hex_quantity(&json!("0xzz")).is_err());
    }
}
