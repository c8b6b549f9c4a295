use crate::storage::schema::{criancas, cultos, presenca};
use chrono::NaiveDateTime;
use diesel::prelude::*;

#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = criancas)]
pub struct Crianca {
    pub id: i32,
    pub nome: String,
    pub data_nascimento: String,
    pub responsavel: String,
    pub telefone: String,
    pub restricao_alimentar: bool,
    pub descricao_restricao_alimentar: Option<String>,
    pub necessidade_especial: bool,
    pub descricao_necessidade_especial: Option<String>,
    pub autoriza_uso_imagem: bool,
    pub autoriza_troca_fralda: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Validated child profile, used for both insert and full update.
/// `None` descriptions are written as NULL on update too.
#[derive(Debug, Clone, PartialEq, Insertable, AsChangeset)]
#[diesel(table_name = criancas)]
#[diesel(treat_none_as_null = true)]
pub struct NewCrianca {
    pub nome: String,
    pub data_nascimento: String,
    pub responsavel: String,
    pub telefone: String,
    pub restricao_alimentar: bool,
    pub descricao_restricao_alimentar: Option<String>,
    pub necessidade_especial: bool,
    pub descricao_necessidade_especial: Option<String>,
    pub autoriza_uso_imagem: bool,
    pub autoriza_troca_fralda: bool,
}

#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = cultos)]
pub struct Culto {
    pub id: i32,
    pub nome: String,
    pub periodo: String,
    pub data: String,
    pub user_id: Option<String>,
    pub ultimo_codigo: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Insertable, AsChangeset)]
#[diesel(table_name = cultos)]
#[diesel(treat_none_as_null = true)]
pub struct NewCulto {
    pub nome: String,
    pub periodo: String,
    pub data: String,
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations, Selectable)]
#[diesel(table_name = presenca)]
#[diesel(belongs_to(Crianca, foreign_key = crianca_id))]
#[diesel(belongs_to(Culto, foreign_key = culto_id))]
pub struct Presenca {
    pub id: i32,
    pub crianca_id: i32,
    pub culto_id: i32,
    pub codigo: Option<i32>,
    pub checked_out: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = presenca)]
pub struct NewPresenca {
    pub crianca_id: i32,
    pub culto_id: i32,
    pub codigo: Option<i32>,
}

/// Row counts behind the statistics endpoint, read in one transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Totals {
    pub criancas: i64,
    pub cultos: i64,
    pub presencas: i64,
}
