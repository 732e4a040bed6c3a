//! Column mapper - canonical field resolution over unknown headers
//!
//! Spreadsheets arrive with arbitrary header casing and naming. Each target
//! schema keeps an ordered alias table: canonical field name -> known header
//! spellings, tried in priority order (a sheet carrying both a canonical and
//! a legacy column resolves to the first alias that matches). Accepting a new
//! header spelling is a data change here, never a change to the resolution
//! logic.

use serde_json::{Map, Value as JsonValue};

/// Canonical receivable fields and their accepted header spellings
pub fn receivable_aliases() -> &'static [(&'static str, &'static [&'static str])] {
    &[
        ("customer", &["customer", "Cliente", "Razão Social", "Razao Social", "Sacado"]),
        ("invoice_number", &["invoice_number", "NF", "Nota Fiscal", "Nº Doc", "No Doc", "Documento", "Número", "Numero"]),
        ("installment", &["installment", "Parcela", "Parc"]),
        ("principal_value", &["principal_value", "Vlr Principal", "Valor Principal", "Vlr. Principal", "Valor"]),
        ("fine", &["fine", "Multa", "Vlr Multa"]),
        ("interest", &["interest", "Juros", "Vlr Juros"]),
        ("updated_value", &["updated_value", "Vlr Atualizado", "Valor Atualizado", "Vlr. Atualizado", "Total"]),
        ("issue_date", &["issue_date", "Dt. Emissão", "Dt. Emissao", "Data Emissão", "Data Emissao", "Emissão", "Emissao"]),
        ("due_date", &["due_date", "Dt. Vencimento", "Data Vencimento", "Vencimento", "Dt Vencimento"]),
        ("payment_prediction", &["payment_prediction", "Previsão", "Previsao", "Previsão Pagamento", "Previsao Pagamento"]),
        ("title_status", &["title_status", "Status", "Situação", "Situacao"]),
    ]
}

/// Canonical payable fields and their accepted header spellings
pub fn payable_aliases() -> &'static [(&'static str, &'static [&'static str])] {
    &[
        ("supplier", &["supplier", "Fornecedor", "Razão Social", "Razao Social", "Favorecido"]),
        ("document_number", &["document_number", "Documento", "Nº Doc", "No Doc", "NF", "Nota Fiscal", "Número", "Numero"]),
        ("description", &["description", "Descrição", "Descricao", "Histórico", "Historico"]),
        ("principal_value", &["principal_value", "Vlr Principal", "Valor Principal", "Vlr. Principal", "Valor"]),
        ("fine", &["fine", "Multa", "Vlr Multa"]),
        ("interest", &["interest", "Juros", "Vlr Juros"]),
        ("amount", &["amount", "Vlr Atualizado", "Valor Atualizado", "Valor Total", "Total"]),
        ("issue_date", &["issue_date", "Dt. Emissão", "Dt. Emissao", "Data Emissão", "Data Emissao", "Emissão", "Emissao"]),
        ("due_date", &["due_date", "Dt. Vencimento", "Data Vencimento", "Vencimento", "Dt Vencimento"]),
        ("status", &["status", "Status", "Situação", "Situacao"]),
    ]
}

/// Resolve one canonical field against a raw row.
///
/// Each alias is tried first as an exact key, then case-insensitively; the
/// first defined, non-null value wins.
pub fn resolve_field<'a>(row: &'a Map<String, JsonValue>, aliases: &[&str]) -> Option<&'a JsonValue> {
    for alias in aliases {
        if let Some(value) = row.get(*alias) {
            if !value.is_null() {
                return Some(value);
            }
        }
        let found = row
            .iter()
            .find(|(key, value)| key.eq_ignore_ascii_case(alias) && !value.is_null())
            .map(|(_, value)| value);
        if found.is_some() {
            return found;
        }
    }
    None
}

/// Like [`resolve_field`], with operator-maintained extra spellings tried
/// after the built-in table
pub fn resolve_field_with_extras<'a>(
    row: &'a Map<String, JsonValue>,
    aliases: &[&str],
    extras: &[String],
) -> Option<&'a JsonValue> {
    if let Some(value) = resolve_field(row, aliases) {
        return Some(value);
    }
    let extra_refs: Vec<&str> = extras.iter().map(String::as_str).collect();
    resolve_field(row, &extra_refs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: JsonValue) -> Map<String, JsonValue> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_exact_match_wins_over_case_insensitive() {
        let row = row(json!({"NF": "1001", "nf": "9999"}));
        let value = resolve_field(&row, &["NF"]).unwrap();
        assert_eq!(value, &json!("1001"));
    }

    #[test]
    fn test_case_insensitive_fallback() {
        let row = row(json!({"cliente": "Acme"}));
        let value = resolve_field(&row, &["Cliente"]).unwrap();
        assert_eq!(value, &json!("Acme"));
    }

    #[test]
    fn test_alias_priority_order() {
        // Sheet carries both the canonical and a legacy column; the earlier
        // alias in the table must win.
        let row = row(json!({"Vlr Principal": "10,00", "Valor": "99,00"}));
        let aliases = &["principal_value", "Vlr Principal", "Valor"];
        let value = resolve_field(&row, aliases).unwrap();
        assert_eq!(value, &json!("10,00"));
    }

    #[test]
    fn test_null_values_are_skipped() {
        let row = row(json!({"Cliente": null, "Sacado": "Acme"}));
        let value = resolve_field(&row, &["Cliente", "Sacado"]).unwrap();
        assert_eq!(value, &json!("Acme"));
    }

    #[test]
    fn test_missing_field_is_none() {
        let row = row(json!({"Outra": 1}));
        assert!(resolve_field(&row, &["Cliente", "Sacado"]).is_none());
    }

    #[test]
    fn test_extras_are_tried_after_builtin() {
        let row = row(json!({"Devedor": "Acme"}));
        let extras = vec!["Devedor".to_string()];
        let value = resolve_field_with_extras(&row, &["Cliente", "Sacado"], &extras).unwrap();
        assert_eq!(value, &json!("Acme"));
    }
}
