//! Semicolon-delimited export of ledger transactions.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::errors::{Error, Result};
use crate::ledger::Transaction;

pub const EXPORT_HEADER: [&str; 6] = [
    "Fecha",
    "Tipo",
    "Categoría",
    "Descripción",
    "Monto",
    "Tipo de Costo",
];

/// Header row plus one row per transaction, fields joined with `;`.
///
/// Fails with [`Error::EmptyExportInput`] when there is nothing to export.
pub fn export_to_delimited_text(records: &[Transaction]) -> Result<String> {
    if records.is_empty() {
        return Err(Error::EmptyExportInput);
    }

    let mut writer = csv::WriterBuilder::new()
        .delimiter(b';')
        .terminator(csv::Terminator::Any(b'\n'))
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(Vec::new());

    writer.write_record(EXPORT_HEADER).map_err(export_error)?;
    for transaction in records {
        let date = transaction.date.format("%Y-%m-%d").to_string();
        let amount = format_amount(transaction.amount);
        writer
            .write_record([
                date.as_str(),
                transaction.kind.display_label(),
                transaction.category.as_str(),
                transaction.description.as_str(),
                amount.as_str(),
                transaction.cost_type.as_str(),
            ])
            .map_err(export_error)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|err| Error::Export(err.to_string()))?;
    String::from_utf8(bytes).map_err(|err| Error::Export(err.to_string()))
}

/// Download name for an export produced on `date`.
pub fn export_file_name(date: NaiveDate) -> String {
    format!("transacciones_{}.csv", date.format("%Y-%m-%d"))
}

/// Exactly two decimal places.
fn format_amount(amount: Decimal) -> String {
    let mut rounded = amount.round_dp(2);
    rounded.rescale(2);
    rounded.to_string()
}

fn export_error(err: csv::Error) -> Error {
    Error::Export(err.to_string())
}
