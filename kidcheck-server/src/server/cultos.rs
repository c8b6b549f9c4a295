use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    extract::{Path, State},
    http::StatusCode,
};
use kidcheck_shared::api::{CultoDto, CultoReq};
use kidcheck_shared::domain;

use super::{AppError, AppState, optional_text, required, rfc3339};
use crate::storage::models::{Culto, NewCulto};

const CAMPOS_OBRIGATORIOS: &str = "Nome, período e data são obrigatórios";

fn culto_dto(c: Culto) -> CultoDto {
    CultoDto {
        id: c.id,
        nome: c.nome,
        periodo: c.periodo,
        data: c.data,
        user_id: c.user_id,
        created_at: rfc3339(c.created_at),
        updated_at: rfc3339(c.updated_at),
    }
}

fn validate(req: CultoReq) -> Result<NewCulto, AppError> {
    let (Some(nome), Some(periodo), Some(data)) = (
        required("nome", req.nome),
        required("periodo", req.periodo),
        required("data", req.data),
    ) else {
        return Err(AppError::bad_request(CAMPOS_OBRIGATORIOS));
    };
    let data = domain::parse_date(&data)
        .map(domain::format_date)
        .map_err(|_| AppError::bad_request("Data do culto inválida, use AAAA-MM-DD"))?;
    Ok(NewCulto {
        nome,
        periodo,
        data,
        user_id: optional_text(req.user_id),
    })
}

pub async fn api_create_culto(
    State(state): State<AppState>,
    body: Result<Json<CultoReq>, JsonRejection>,
) -> Result<(StatusCode, Json<CultoDto>), AppError> {
    let Json(req) = body?;
    let novo = validate(req)?;
    let culto = state.store.create_culto(novo).await?;
    tracing::info!(culto_id = culto.id, data = %culto.data, "culto criado");
    Ok((StatusCode::CREATED, Json(culto_dto(culto))))
}

pub async fn api_list_cultos(
    State(state): State<AppState>,
) -> Result<Json<Vec<CultoDto>>, AppError> {
    let rows = state.store.list_cultos().await?;
    Ok(Json(rows.into_iter().map(culto_dto).collect()))
}

pub async fn api_get_culto(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Json<CultoDto>, AppError> {
    let Path(id) = path?;
    let culto = state
        .store
        .get_culto(id)
        .await?
        .ok_or_else(|| AppError::not_found("Culto não encontrado"))?;
    Ok(Json(culto_dto(culto)))
}

pub async fn api_update_culto(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
    body: Result<Json<CultoReq>, JsonRejection>,
) -> Result<Json<CultoDto>, AppError> {
    let Path(id) = path?;
    let Json(req) = body?;
    let changes = validate(req)?;
    let culto = state
        .store
        .update_culto(id, changes)
        .await?
        .ok_or_else(|| AppError::not_found("Culto não encontrado"))?;
    Ok(Json(culto_dto(culto)))
}

/// Attendance rows of the event go with it.
pub async fn api_delete_culto(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let Path(id) = path?;
    let deleted = state.store.delete_culto(id).await?;
    tracing::info!(culto_id = id, deleted, "culto removido");
    Ok(StatusCode::NO_CONTENT)
}
