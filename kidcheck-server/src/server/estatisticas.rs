use axum::{Json, extract::State};
use kidcheck_shared::api::EstatisticasDto;

use super::{AppError, AppState};

/// Attendance rows per event, two decimals; 0 when there are no events.
pub fn average_attendance(presencas: i64, cultos: i64) -> f64 {
    if cultos <= 0 {
        return 0.0;
    }
    let media = presencas as f64 / cultos as f64;
    (media * 100.0).round() / 100.0
}

pub async fn api_estatisticas(
    State(state): State<AppState>,
) -> Result<Json<EstatisticasDto>, AppError> {
    let totals = state.store.totals().await?;
    tracing::debug!(?totals, "estatisticas");
    Ok(Json(EstatisticasDto {
        total_criancas: totals.criancas,
        total_cultos: totals.cultos,
        frequencia_media: average_attendance(totals.presencas, totals.cultos),
    }))
}
