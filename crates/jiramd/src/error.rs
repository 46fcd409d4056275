#[derive(thiserror::Error, Debug, serde::Deserialize, serde::Serialize)]
pub enum Error {
    #[error("Generic {0}")]
    Generic(String),

    #[error("HTTP {status} for {url}\n{body}")]
    Api { status: u16, url: String, body: String },
}
