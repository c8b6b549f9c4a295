use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};

use super::API_PREFIX;

fn base_join(base: &str, path: &str) -> String {
    let b = base.trim_end_matches('/');
    let p = path.trim_start_matches('/');
    format!("{}/{}", b, p)
}

fn enc(s: &str) -> String {
    utf8_percent_encode(s, NON_ALPHANUMERIC).to_string()
}

pub fn health(base: &str) -> String {
    base_join(base, &format!("{}/health", API_PREFIX))
}

pub fn criancas(base: &str) -> String {
    base_join(base, &format!("{}/criancas", API_PREFIX))
}
pub fn criancas_buscar(base: &str, nome: &str) -> String {
    base_join(
        base,
        &format!("{}/criancas/buscar?nome={}", API_PREFIX, enc(nome)),
    )
}
pub fn crianca(base: &str, id: i32) -> String {
    base_join(base, &format!("{}/criancas/{}", API_PREFIX, id))
}

pub fn cultos(base: &str) -> String {
    base_join(base, &format!("{}/cultos", API_PREFIX))
}
pub fn culto(base: &str, id: i32) -> String {
    base_join(base, &format!("{}/cultos/{}", API_PREFIX, id))
}
pub fn culto_criancas(base: &str, culto_id: i32) -> String {
    base_join(base, &format!("{}/cultos/{}/criancas", API_PREFIX, culto_id))
}
pub fn culto_crianca(base: &str, culto_id: i32, crianca_id: i32) -> String {
    base_join(
        base,
        &format!("{}/cultos/{}/criancas/{}", API_PREFIX, culto_id, crianca_id),
    )
}
pub fn culto_crianca_checkout(base: &str, culto_id: i32, crianca_id: i32) -> String {
    base_join(
        base,
        &format!(
            "{}/cultos/{}/criancas/{}/checkout",
            API_PREFIX, culto_id, crianca_id
        ),
    )
}

pub fn estatisticas(base: &str) -> String {
    base_join(base, &format!("{}/estatisticas", API_PREFIX))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_without_double_slashes() {
        assert_eq!(
            criancas("http://localhost:3001/"),
            "http://localhost:3001/api/criancas"
        );
        assert_eq!(
            culto_crianca_checkout("http://h", 2, 9),
            "http://h/api/cultos/2/criancas/9/checkout"
        );
    }

    #[test]
    fn search_term_is_percent_encoded() {
        assert_eq!(
            criancas_buscar("http://h", "João Silva"),
            "http://h/api/criancas/buscar?nome=Jo%C3%A3o%20Silva"
        );
    }
}
