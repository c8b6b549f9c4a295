use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    extract::{Path, Query, State},
    http::StatusCode,
};
use kidcheck_shared::api::{BuscaQuery, CriancaDto, CriancaReq};
use kidcheck_shared::domain::{self, age_from_text};
use time::Date;

use super::{AppError, AppState, optional_text, required, rfc3339};
use crate::storage::models::{Crianca, NewCrianca};

const CAMPOS_OBRIGATORIOS: &str =
    "Nome, data de nascimento, responsável e telefone são obrigatórios";

pub(super) fn crianca_dto(c: Crianca, today: Date) -> CriancaDto {
    CriancaDto {
        idade: age_from_text(&c.data_nascimento, today),
        id: c.id,
        nome: c.nome,
        data_nascimento: c.data_nascimento,
        responsavel: c.responsavel,
        telefone: c.telefone,
        restricao_alimentar: c.restricao_alimentar,
        descricao_restricao_alimentar: c.descricao_restricao_alimentar,
        necessidade_especial: c.necessidade_especial,
        descricao_necessidade_especial: c.descricao_necessidade_especial,
        autoriza_uso_imagem: c.autoriza_uso_imagem,
        autoriza_troca_fralda: c.autoriza_troca_fralda,
        created_at: rfc3339(c.created_at),
        updated_at: rfc3339(c.updated_at),
    }
}

/// Checks mandatory fields and normalises the body into a storable profile.
/// Descriptions survive only when their flag is set.
fn validate(req: CriancaReq, today: Date) -> Result<NewCrianca, AppError> {
    let nome = required("nome", req.nome);
    let data_nascimento = required("dataNascimento", req.data_nascimento);
    let responsavel = required("responsavel", req.responsavel);
    let telefone = required("telefone", req.telefone);
    let (Some(nome), Some(data_nascimento), Some(responsavel), Some(telefone)) =
        (nome, data_nascimento, responsavel, telefone)
    else {
        return Err(AppError::bad_request(CAMPOS_OBRIGATORIOS));
    };

    let nascimento = domain::parse_date(&data_nascimento)
        .map_err(|_| AppError::bad_request("Data de nascimento inválida, use AAAA-MM-DD"))?;
    if nascimento > today {
        return Err(AppError::bad_request(
            "Data de nascimento não pode estar no futuro",
        ));
    }

    Ok(NewCrianca {
        nome,
        data_nascimento: domain::format_date(nascimento),
        responsavel,
        telefone,
        restricao_alimentar: req.restricao_alimentar,
        descricao_restricao_alimentar: req
            .restricao_alimentar
            .then(|| optional_text(req.descricao_restricao_alimentar))
            .flatten(),
        necessidade_especial: req.necessidade_especial,
        descricao_necessidade_especial: req
            .necessidade_especial
            .then(|| optional_text(req.descricao_necessidade_especial))
            .flatten(),
        autoriza_uso_imagem: req.autoriza_uso_imagem,
        autoriza_troca_fralda: req.autoriza_troca_fralda,
    })
}

pub async fn api_create_crianca(
    State(state): State<AppState>,
    body: Result<Json<CriancaReq>, JsonRejection>,
) -> Result<(StatusCode, Json<CriancaDto>), AppError> {
    let Json(req) = body?;
    let today = domain::today_utc();
    let nova = validate(req, today)?;
    let crianca = state.store.create_crianca(nova).await?;
    tracing::info!(crianca_id = crianca.id, "crianca cadastrada");
    Ok((StatusCode::CREATED, Json(crianca_dto(crianca, today))))
}

pub async fn api_list_criancas(
    State(state): State<AppState>,
) -> Result<Json<Vec<CriancaDto>>, AppError> {
    let today = domain::today_utc();
    let rows = state.store.list_criancas().await?;
    Ok(Json(
        rows.into_iter().map(|c| crianca_dto(c, today)).collect(),
    ))
}

pub async fn api_search_criancas(
    State(state): State<AppState>,
    query: Result<Query<BuscaQuery>, QueryRejection>,
) -> Result<Json<Vec<CriancaDto>>, AppError> {
    let Query(q) = query?;
    let Some(nome) = optional_text(q.nome) else {
        return Err(AppError::bad_request("Informe o nome para a busca"));
    };
    let today = domain::today_utc();
    let rows = state.store.search_criancas(&nome).await?;
    Ok(Json(
        rows.into_iter().map(|c| crianca_dto(c, today)).collect(),
    ))
}

pub async fn api_get_crianca(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Json<CriancaDto>, AppError> {
    let Path(id) = path?;
    let crianca = state
        .store
        .get_crianca(id)
        .await?
        .ok_or_else(|| AppError::not_found("Criança não encontrada"))?;
    Ok(Json(crianca_dto(crianca, domain::today_utc())))
}

pub async fn api_update_crianca(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
    body: Result<Json<CriancaReq>, JsonRejection>,
) -> Result<Json<CriancaDto>, AppError> {
    let Path(id) = path?;
    let Json(req) = body?;
    let today = domain::today_utc();
    let changes = validate(req, today)?;
    let crianca = state
        .store
        .update_crianca(id, changes)
        .await?
        .ok_or_else(|| AppError::not_found("Criança não encontrada"))?;
    tracing::info!(crianca_id = id, "crianca atualizada");
    Ok(Json(crianca_dto(crianca, today)))
}

pub async fn api_delete_crianca(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let Path(id) = path?;
    let deleted = state.store.delete_crianca(id).await?;
    tracing::info!(crianca_id = id, deleted, "crianca removida");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn req() -> CriancaReq {
        CriancaReq {
            nome: " Ana Clara ".into(),
            data_nascimento: "2017-04-02".into(),
            responsavel: "Paula".into(),
            telefone: "11988887777".into(),
            ..Default::default()
        }
    }

    const TODAY: Date = date!(2024 - 06 - 01);

    #[test]
    fn accepts_complete_profile() {
        let nova = validate(req(), TODAY).unwrap();
        assert_eq!(nova.nome, "Ana Clara");
        assert_eq!(nova.data_nascimento, "2017-04-02");
        assert!(!nova.restricao_alimentar);
    }

    #[test]
    fn blank_fields_count_as_missing() {
        for blank in ["", "   "] {
            let mut r = req();
            r.telefone = blank.into();
            match validate(r, TODAY) {
                Err(AppError::BadRequest(m)) => assert_eq!(m, CAMPOS_OBRIGATORIOS),
                other => panic!("unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn rejects_bad_and_future_birth_dates() {
        let mut r = req();
        r.data_nascimento = "02/04/2017".into();
        assert!(matches!(validate(r, TODAY), Err(AppError::BadRequest(_))));

        let mut r = req();
        r.data_nascimento = "2024-06-02".into();
        assert!(matches!(validate(r, TODAY), Err(AppError::BadRequest(_))));

        let mut r = req();
        r.data_nascimento = "2024-06-01".into();
        assert!(validate(r, TODAY).is_ok());
    }

    #[test]
    fn descriptions_follow_their_flags() {
        let mut r = req();
        r.descricao_restricao_alimentar = Some("lactose".into());
        r.necessidade_especial = true;
        r.descricao_necessidade_especial = Some(" TEA ".into());
        let nova = validate(r, TODAY).unwrap();
        assert_eq!(nova.descricao_restricao_alimentar, None);
        assert_eq!(nova.descricao_necessidade_especial.as_deref(), Some("TEA"));
    }
}
