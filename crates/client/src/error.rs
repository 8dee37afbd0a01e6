use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ClientError {
    #[snafu(display("chat API key must not be empty"))]
    EmptyApiKey { stage: &'static str },
    #[snafu(display("base URL '{url}' is not an http(s) endpoint"))]
    InvalidBaseUrl { stage: &'static str, url: String },
    #[snafu(display("http request failed on `{stage}`, {source}"))]
    Http {
        stage: &'static str,
        source: reqwest::Error,
    },
    #[snafu(display("chat backend returned status {status} on `{stage}`: {body}"))]
    BackendStatus {
        stage: &'static str,
        status: u16,
        body: String,
    },
    #[snafu(display("failed to decode backend payload on `{stage}`, {source}"))]
    DecodePayload {
        stage: &'static str,
        source: serde_json::Error,
    },
    #[snafu(display("websocket failed on `{stage}`, {source}"))]
    Socket {
        stage: &'static str,
        source: tokio_tungstenite::tungstenite::Error,
    },
    #[snafu(display("no user session established; call connect_user before `{stage}`"))]
    NotConnected { stage: &'static str },
}

pub type ClientResult<T> = Result<T, ClientError>;
