//! Reject ledger accessor - paginated retrieval and operator export
//!
//! Available only for batches persisted through the primary path (a batch id
//! exists); degraded imports have no per-row reject detail to retrieve.

use std::sync::Arc;

use serde_json::{json, Value as JsonValue};

use crate::domain::result::Result;
use crate::ports::{BackendDataService, RejectPage};

/// Static code -> operator label table. Unknown codes pass through verbatim
/// rather than failing the render.
const REASON_LABELS: &[(&str, &str)] = &[
    ("empty-mandatory-field", "Campo obrigatório vazio"),
    ("invalid-value", "Valor inválido"),
    ("invalid-due-date", "Data de vencimento inválida"),
    ("invalid-installment-format", "Formato de parcela inválido"),
    ("duplicate-within-batch", "Duplicado no arquivo"),
    ("negative-value", "Valor negativo"),
    ("negative-updated-value", "Valor atualizado negativo"),
    ("due-before-issue", "Vencimento anterior à emissão"),
    ("structurally-invalid-row", "Linha estruturalmente inválida"),
];

/// Operator label for a rejection-reason code
pub fn reason_label(code: &str) -> String {
    REASON_LABELS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, label)| label.to_string())
        .unwrap_or_else(|| code.to_string())
}

/// Paginated access to a batch's reject ledger
pub struct RejectLedgerService {
    backend: Arc<dyn BackendDataService>,
    page_size: i64,
}

impl RejectLedgerService {
    pub fn new(backend: Arc<dyn BackendDataService>, page_size: i64) -> Self {
        Self { backend, page_size }
    }

    /// Fetch one page of rejects for a batch. `page` is 1-indexed.
    pub async fn fetch_page(&self, batch_id: &str, page: i64) -> Result<RejectPage> {
        self.backend
            .fetch_rejects(batch_id, page, self.page_size)
            .await
    }

    /// Walk every page of a batch and re-emit each raw row with its source
    /// line number and translated rejection reason, ready for re-export.
    pub async fn export_batch(&self, batch_id: &str) -> Result<Vec<JsonValue>> {
        let mut exported = Vec::new();
        let mut page = 1;

        loop {
            let result = self.fetch_page(batch_id, page).await?;
            for record in &result.rows {
                let mut row = match &record.raw {
                    JsonValue::Object(obj) => obj.clone(),
                    other => {
                        let mut map = serde_json::Map::new();
                        map.insert("conteudo".to_string(), other.clone());
                        map
                    }
                };
                row.insert("Linha".to_string(), json!(record.row_number));
                row.insert("Motivo".to_string(), json!(reason_label(&record.reason_code)));
                exported.push(JsonValue::Object(row));
            }

            let fetched = page * self.page_size;
            if fetched >= result.total_count || result.rows.is_empty() {
                break;
            }
            page += 1;
        }

        Ok(exported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes_translate() {
        assert_eq!(reason_label("empty-mandatory-field"), "Campo obrigatório vazio");
        assert_eq!(reason_label("duplicate-within-batch"), "Duplicado no arquivo");
    }

    #[test]
    fn test_unknown_codes_pass_through_verbatim() {
        assert_eq!(reason_label("some-new-backend-code"), "some-new-backend-code");
    }
}
