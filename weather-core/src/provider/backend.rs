use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::{LookupError, WeatherSnapshot};

use super::WeatherProvider;

/// Talks to the local proxy backend (`GET /weather?city=...`).
#[derive(Debug, Clone)]
pub struct BackendProvider {
    endpoint: String,
    timeout: Duration,
    http: Client,
}

impl BackendProvider {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self::with_client(endpoint, timeout, Client::new())
    }

    pub fn with_client(endpoint: impl Into<String>, timeout: Duration, http: Client) -> Self {
        Self { endpoint: endpoint.into(), timeout, http }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.endpoint.trim_end_matches('/'))
    }

    async fn fetch_current(&self, location: &str) -> Result<WeatherSnapshot, LookupError> {
        let res = self
            .http
            .get(self.url("weather"))
            .query(&[("city", location)])
            .timeout(self.timeout)
            .send()
            .await
            .map_err(transport_error)?;

        let status = res.status();
        let body = res.text().await.map_err(transport_error)?;

        if !status.is_success() {
            tracing::warn!(%status, body = %truncate_body(&body), "weather lookup rejected");
            return Err(LookupError::NotFound { status: status.as_u16() });
        }

        parse_current(&body)
    }

    /// Check that the backend is up (`GET /health`).
    pub async fn health(&self) -> Result<()> {
        let res = self
            .http
            .get(self.url("health"))
            .timeout(self.timeout)
            .send()
            .await
            .with_context(|| format!("Failed to send health request to {}", self.endpoint))?;

        let status = res.status();
        let body = res.text().await.context("Failed to read health response body")?;

        if !status.is_success() {
            return Err(anyhow!(
                "Health check failed with status {}: {}",
                status,
                truncate_body(&body),
            ));
        }

        let parsed: BeHealth =
            serde_json::from_str(&body).context("Failed to parse health JSON")?;

        match parsed.status.as_deref() {
            Some("ok") => Ok(()),
            other => Err(anyhow!("Backend reported unexpected health status: {other:?}")),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BeMain {
    temp: Option<f64>,
    feels_like: Option<f64>,
    humidity: Option<f64>,
    pressure: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BeWeather {
    description: Option<String>,
    icon: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BeWind {
    speed: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BeSys {
    country: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BeCurrentResponse {
    name: Option<String>,
    sys: Option<BeSys>,
    main: Option<BeMain>,
    wind: Option<BeWind>,
    weather: Option<Vec<BeWeather>>,
}

#[derive(Debug, Deserialize)]
struct BeHealth {
    status: Option<String>,
}

fn parse_current(body: &str) -> Result<WeatherSnapshot, LookupError> {
    let parsed: BeCurrentResponse = serde_json::from_str(body).map_err(|e| {
        tracing::warn!(error = %e, body = %truncate_body(body), "malformed weather payload");
        LookupError::Transport(format!("malformed weather payload: {e}"))
    })?;

    let main = parsed.main.unwrap_or_default();
    let condition = parsed.weather.unwrap_or_default().into_iter().next().unwrap_or_default();

    Ok(WeatherSnapshot {
        location_name: parsed.name,
        country: parsed.sys.and_then(|s| s.country),
        temperature_c: main.temp,
        feels_like_c: main.feels_like,
        humidity_pct: main.humidity,
        wind_speed_mps: parsed.wind.and_then(|w| w.speed),
        pressure_hpa: main.pressure,
        condition: condition.description,
        icon: condition.icon,
    })
}

fn transport_error(err: reqwest::Error) -> LookupError {
    tracing::warn!(error = %err, "weather backend request failed");
    if err.is_timeout() {
        LookupError::Timeout
    } else {
        LookupError::Transport(err.to_string())
    }
}

#[async_trait]
impl WeatherProvider for BackendProvider {
    async fn lookup(&self, location: &str) -> Result<WeatherSnapshot, LookupError> {
        tracing::debug!(location, endpoint = %self.endpoint, "fetching current weather");
        self.fetch_current(location).await
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
        task::JoinHandle,
    };

    const PARIS: &str = r#"{"name":"Paris","sys":{"country":"FR"},"main":{"temp":18,"feels_like":17,"humidity":60,"pressure":1012},"wind":{"speed":3},"weather":[{"description":"clear sky","icon":"01d"}]}"#;

    /// Accept one connection, answer it with `status_line` and `body`, and hand
    /// back the raw request head.
    async fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 8192];
            let mut read = 0;
            loop {
                let n = socket.read(&mut buf[read..]).await.unwrap();
                read += n;
                if n == 0 || buf[..read].windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }

            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();

            String::from_utf8_lossy(&buf[..read]).into_owned()
        });

        (format!("http://{addr}"), handle)
    }

    fn provider(endpoint: String) -> BackendProvider {
        let http = Client::builder().no_proxy().build().unwrap();
        BackendProvider::with_client(endpoint, Duration::from_secs(5), http)
    }

    #[tokio::test]
    async fn lookup_parses_current_weather() {
        let (endpoint, server) = serve_once("200 OK", PARIS).await;

        let snapshot = provider(endpoint).lookup("Paris").await.unwrap();
        let request = server.await.unwrap();

        assert!(request.starts_with("GET /weather?city=Paris "));
        assert_eq!(snapshot.location_name.as_deref(), Some("Paris"));
        assert_eq!(snapshot.country.as_deref(), Some("FR"));
        assert_eq!(snapshot.temperature_c, Some(18.0));
        assert_eq!(snapshot.feels_like_c, Some(17.0));
        assert_eq!(snapshot.humidity_pct, Some(60.0));
        assert_eq!(snapshot.pressure_hpa, Some(1012.0));
        assert_eq!(snapshot.wind_speed_mps, Some(3.0));
        assert_eq!(snapshot.condition.as_deref(), Some("clear sky"));
        assert_eq!(snapshot.icon.as_deref(), Some("01d"));
    }

    #[tokio::test]
    async fn location_is_percent_encoded() {
        let (endpoint, server) = serve_once("200 OK", PARIS).await;

        provider(endpoint).lookup("São Paulo").await.unwrap();
        let request = server.await.unwrap();

        assert!(request.starts_with("GET /weather?city=S%C3%A3o+Paulo "), "{request}");
    }

    #[tokio::test]
    async fn non_success_status_is_not_found() {
        let (endpoint, _server) =
            serve_once("404 Not Found", r#"{"error":"upstream status: 404 Not Found"}"#).await;

        let err = provider(endpoint).lookup("Zzzzz").await.unwrap_err();
        assert_eq!(err, LookupError::NotFound { status: 404 });
        assert_eq!(err.user_message(), "City not found");
    }

    #[tokio::test]
    async fn unreachable_backend_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = provider(format!("http://{addr}")).lookup("Paris").await.unwrap_err();
        assert!(matches!(err, LookupError::Transport(_)), "{err:?}");
    }

    #[tokio::test]
    async fn silent_backend_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let _server = tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
        });

        let http = Client::builder().no_proxy().build().unwrap();
        let provider =
            BackendProvider::with_client(format!("http://{addr}"), Duration::from_millis(300), http);

        let err = provider.lookup("Paris").await.unwrap_err();
        assert_eq!(err, LookupError::Timeout);
        assert_eq!(err.user_message(), "Could not reach the weather service");
    }

    #[tokio::test]
    async fn health_ok() {
        let (endpoint, server) = serve_once("200 OK", r#"{"status":"ok"}"#).await;

        provider(endpoint).health().await.unwrap();
        assert!(server.await.unwrap().starts_with("GET /health "));
    }

    #[test]
    fn missing_fields_are_left_empty() {
        let snapshot = parse_current(r#"{"name":"Atlantis","weather":[]}"#).unwrap();

        assert_eq!(snapshot.location_name.as_deref(), Some("Atlantis"));
        assert_eq!(snapshot.temperature_c, None);
        assert_eq!(snapshot.country, None);
        assert_eq!(snapshot.icon, None);
    }

    #[test]
    fn null_fields_are_left_empty() {
        let snapshot = parse_current(r#"{"name":null,"main":{"temp":null,"humidity":40}}"#).unwrap();

        assert_eq!(snapshot.location_name, None);
        assert_eq!(snapshot.temperature_c, None);
        assert_eq!(snapshot.humidity_pct, Some(40.0));
    }

    #[test]
    fn malformed_payload_is_transport_error() {
        let err = parse_current("<html>bad gateway</html>").unwrap_err();
        assert!(matches!(err, LookupError::Transport(_)));
        assert_eq!(err.user_message(), "Could not reach the weather service");
    }

    #[test]
    fn truncate_long_body() {
        let body = "x".repeat(250);
        let out = truncate_body(&body);
        assert_eq!(out.len(), 203);
        assert!(out.ends_with("..."));
        assert_eq!(truncate_body("short"), "short");
    }
}
