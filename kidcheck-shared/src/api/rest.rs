//! Minimal REST client helpers for programmatic consumers of the API.
//! Feature-gated by `rest-client` to keep reqwest out of the server binary.

use super::endpoints as ep;
use super::*;
use once_cell::sync::Lazy;
use std::time::Duration;

pub use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum RestError {
    #[error("http: {0}")]
    Http(String),
    #[error("status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("serde: {0}")]
    Serde(String),
}

static HTTP_CLIENT: Lazy<Result<reqwest::Client, String>> = Lazy::new(|| {
    reqwest::Client::builder()
        .pool_max_idle_per_host(4)
        .timeout(Duration::from_secs(30))
        .build()
        .map_err(|e| e.to_string())
});

fn mk_client() -> Result<reqwest::Client, RestError> {
    (*HTTP_CLIENT).clone().map_err(RestError::Http)
}

async fn status_error(res: reqwest::Response) -> RestError {
    let status = res.status().as_u16();
    let text = res.text().await.unwrap_or_default();
    // Prefer the server's `{ error }` message; fall back to the raw body.
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|b| b.error)
        .unwrap_or(text);
    RestError::Status { status, message }
}

async fn handle_json<T: for<'de> serde::Deserialize<'de>>(
    res: reqwest::Response,
) -> Result<T, RestError> {
    if !res.status().is_success() {
        return Err(status_error(res).await);
    }
    res.json::<T>()
        .await
        .map_err(|e| RestError::Serde(e.to_string()))
}

async fn handle_empty(res: reqwest::Response) -> Result<(), RestError> {
    if res.status().is_success() {
        Ok(())
    } else {
        Err(status_error(res).await)
    }
}

async fn send(req: reqwest::RequestBuilder) -> Result<reqwest::Response, RestError> {
    req.send().await.map_err(|e| RestError::Http(e.to_string()))
}

pub async fn health(base: &str) -> Result<HealthDto, RestError> {
    let client = mk_client()?;
    handle_json(send(client.get(ep::health(base))).await?).await
}

pub async fn list_criancas(base: &str) -> Result<Vec<CriancaDto>, RestError> {
    let client = mk_client()?;
    handle_json(send(client.get(ep::criancas(base))).await?).await
}

pub async fn search_criancas(base: &str, nome: &str) -> Result<Vec<CriancaDto>, RestError> {
    let client = mk_client()?;
    handle_json(send(client.get(ep::criancas_buscar(base, nome))).await?).await
}

pub async fn get_crianca(base: &str, id: i32) -> Result<CriancaDto, RestError> {
    let client = mk_client()?;
    handle_json(send(client.get(ep::crianca(base, id))).await?).await
}

pub async fn create_crianca(base: &str, body: &CriancaReq) -> Result<CriancaDto, RestError> {
    let client = mk_client()?;
    handle_json(send(client.post(ep::criancas(base)).json(body)).await?).await
}

pub async fn update_crianca(
    base: &str,
    id: i32,
    body: &CriancaReq,
) -> Result<CriancaDto, RestError> {
    let client = mk_client()?;
    handle_json(send(client.put(ep::crianca(base, id)).json(body)).await?).await
}

pub async fn delete_crianca(base: &str, id: i32) -> Result<(), RestError> {
    let client = mk_client()?;
    handle_empty(send(client.delete(ep::crianca(base, id))).await?).await
}

pub async fn list_cultos(base: &str) -> Result<Vec<CultoDto>, RestError> {
    let client = mk_client()?;
    handle_json(send(client.get(ep::cultos(base))).await?).await
}

pub async fn get_culto(base: &str, id: i32) -> Result<CultoDto, RestError> {
    let client = mk_client()?;
    handle_json(send(client.get(ep::culto(base, id))).await?).await
}

pub async fn create_culto(base: &str, body: &CultoReq) -> Result<CultoDto, RestError> {
    let client = mk_client()?;
    handle_json(send(client.post(ep::cultos(base)).json(body)).await?).await
}

pub async fn update_culto(base: &str, id: i32, body: &CultoReq) -> Result<CultoDto, RestError> {
    let client = mk_client()?;
    handle_json(send(client.put(ep::culto(base, id)).json(body)).await?).await
}

pub async fn delete_culto(base: &str, id: i32) -> Result<(), RestError> {
    let client = mk_client()?;
    handle_empty(send(client.delete(ep::culto(base, id))).await?).await
}

pub async fn add_crianca_to_culto(
    base: &str,
    culto_id: i32,
    crianca_id: i32,
) -> Result<PresencaDto, RestError> {
    let client = mk_client()?;
    let body = AddCriancaReq {
        culto_id: Some(culto_id),
        crianca_id: Some(crianca_id),
    };
    handle_json(send(client.post(ep::culto_criancas(base, culto_id)).json(&body)).await?).await
}

pub async fn remove_crianca_from_culto(
    base: &str,
    culto_id: i32,
    crianca_id: i32,
) -> Result<(), RestError> {
    let client = mk_client()?;
    handle_empty(send(client.delete(ep::culto_crianca(base, culto_id, crianca_id))).await?).await
}

pub async fn list_criancas_in_culto(
    base: &str,
    culto_id: i32,
) -> Result<Vec<CriancaNoCultoDto>, RestError> {
    let client = mk_client()?;
    handle_json(send(client.get(ep::culto_criancas(base, culto_id))).await?).await
}

pub async fn set_checkout(
    base: &str,
    culto_id: i32,
    crianca_id: i32,
    checked_out: bool,
) -> Result<PresencaDto, RestError> {
    let client = mk_client()?;
    let body = CheckoutReq {
        checked_out: Some(checked_out),
    };
    let url = ep::culto_crianca_checkout(base, culto_id, crianca_id);
    handle_json(send(client.put(url).json(&body)).await?).await
}

pub async fn estatisticas(base: &str) -> Result<EstatisticasDto, RestError> {
    let client = mk_client()?;
    handle_json(send(client.get(ep::estatisticas(base))).await?).await
}
