use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    extract::{Path, State},
    http::StatusCode,
};
use kidcheck_shared::api::{AddCriancaReq, CheckoutReq, CriancaNoCultoDto, PresencaDto};
use kidcheck_shared::domain;

use super::criancas::crianca_dto;
use super::{AppError, AppState, rfc3339};
use crate::storage::models::Presenca;

fn presenca_dto(p: Presenca) -> PresencaDto {
    PresencaDto {
        id: p.id,
        crianca_id: p.crianca_id,
        culto_id: p.culto_id,
        codigo: p.codigo,
        checked_out: p.checked_out,
        created_at: rfc3339(p.created_at),
    }
}

/// The path id is authoritative; a body `cultoId` may only repeat it.
fn crianca_for_culto(culto_id: i32, req: &AddCriancaReq) -> Result<i32, AppError> {
    if let Some(body_culto) = req.culto_id
        && body_culto != culto_id
    {
        return Err(AppError::bad_request(
            "cultoId do corpo difere do culto da URL",
        ));
    }
    req.crianca_id
        .ok_or_else(|| AppError::bad_request("criancaId é obrigatório"))
}

pub async fn api_add_crianca_to_culto(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
    body: Result<Json<AddCriancaReq>, JsonRejection>,
) -> Result<(StatusCode, Json<PresencaDto>), AppError> {
    let Path(culto_id) = path?;
    let Json(req) = body?;
    let crianca_id = crianca_for_culto(culto_id, &req)?;
    let row = state.store.add_crianca_to_culto(culto_id, crianca_id).await?;
    Ok((StatusCode::CREATED, Json(presenca_dto(row))))
}

pub async fn api_remove_crianca_from_culto(
    State(state): State<AppState>,
    path: Result<Path<(i32, i32)>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let Path((culto_id, crianca_id)) = path?;
    state
        .store
        .remove_crianca_from_culto(culto_id, crianca_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn api_list_criancas_in_culto(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Json<Vec<CriancaNoCultoDto>>, AppError> {
    let Path(culto_id) = path?;
    let today = domain::today_utc();
    let rows = state.store.list_criancas_in_culto(culto_id).await?;
    let items = rows
        .into_iter()
        .map(|(crianca, presenca)| CriancaNoCultoDto {
            crianca: crianca_dto(crianca, today),
            presenca_data: rfc3339(presenca.created_at),
            checked_out: presenca.checked_out,
            codigo: presenca.codigo,
        })
        .collect();
    Ok(Json(items))
}

pub async fn api_set_checkout(
    State(state): State<AppState>,
    path: Result<Path<(i32, i32)>, PathRejection>,
    body: Result<Json<CheckoutReq>, JsonRejection>,
) -> Result<Json<PresencaDto>, AppError> {
    let Path((culto_id, crianca_id)) = path?;
    let Json(req) = body?;
    let checked_out = req
        .checked_out
        .ok_or_else(|| AppError::bad_request("checkedOut é obrigatório"))?;
    let row = state
        .store
        .set_checkout(culto_id, crianca_id, checked_out)
        .await?;
    let dto = presenca_dto(row);
    tracing::info!(
        culto_id,
        crianca_id,
        codigo = ?dto.codigo,
        state = ?dto.state(),
        "checkout atualizado"
    );
    Ok(Json(dto))
}
