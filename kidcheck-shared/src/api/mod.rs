use serde::{Deserialize, Serialize};

use crate::domain::CheckoutState;

pub mod endpoints;
#[cfg(feature = "rest-client")]
pub mod rest;

pub const API_PREFIX: &str = "/api";

// Children (criancas)

/// Create/update body for a child. Missing text fields deserialize as empty
/// strings so the server can answer with a single validation message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriancaReq {
    #[serde(default)]
    pub nome: String,
    #[serde(default)]
    pub data_nascimento: String,
    #[serde(default)]
    pub responsavel: String,
    #[serde(default)]
    pub telefone: String,
    #[serde(default)]
    pub restricao_alimentar: bool,
    #[serde(default)]
    pub descricao_restricao_alimentar: Option<String>,
    #[serde(default)]
    pub necessidade_especial: bool,
    #[serde(default)]
    pub descricao_necessidade_especial: Option<String>,
    #[serde(default)]
    pub autoriza_uso_imagem: bool,
    #[serde(default)]
    pub autoriza_troca_fralda: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriancaDto {
    pub id: i32,
    pub nome: String,
    pub data_nascimento: String,
    /// Whole years as of the day the response was produced.
    pub idade: Option<i32>,
    pub responsavel: String,
    pub telefone: String,
    pub restricao_alimentar: bool,
    pub descricao_restricao_alimentar: Option<String>,
    pub necessidade_especial: bool,
    pub descricao_necessidade_especial: Option<String>,
    pub autoriza_uso_imagem: bool,
    pub autoriza_troca_fralda: bool,
    pub created_at: String, // RFC3339 UTC
    pub updated_at: String, // RFC3339 UTC
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuscaQuery {
    pub nome: Option<String>,
}

// Events (cultos)

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CultoReq {
    #[serde(default)]
    pub nome: String,
    #[serde(default)]
    pub periodo: String,
    #[serde(default)]
    pub data: String,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CultoDto {
    pub id: i32,
    pub nome: String,
    pub periodo: String,
    pub data: String,
    pub user_id: Option<String>,
    pub created_at: String, // RFC3339 UTC
    pub updated_at: String, // RFC3339 UTC
}

// Attendance (presenca)

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCriancaReq {
    #[serde(default)]
    pub culto_id: Option<i32>,
    #[serde(default)]
    pub crianca_id: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresencaDto {
    pub id: i32,
    pub crianca_id: i32,
    pub culto_id: i32,
    pub codigo: Option<i32>,
    pub checked_out: bool,
    pub created_at: String, // RFC3339 UTC
}

impl PresencaDto {
    pub fn state(&self) -> CheckoutState {
        CheckoutState::from(self.checked_out)
    }
}

/// A child profile as listed for one event, with its attendance data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriancaNoCultoDto {
    #[serde(flatten)]
    pub crianca: CriancaDto,
    pub presenca_data: String, // RFC3339 UTC
    pub checked_out: bool,
    pub codigo: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutReq {
    #[serde(default)]
    pub checked_out: Option<bool>,
}

// Statistics

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstatisticasDto {
    pub total_criancas: i64,
    pub total_cultos: i64,
    pub frequencia_media: f64,
}

// Misc

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthDto {
    pub status: String,
    pub message: String,
}

/// Body of every non-2xx response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
