use clap::ValueEnum;
use tallyscan_core::ParsedTransaction;
use tallyscan_ocr::ParseOutcome;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// The full parse outcome as JSON
    Json,
    /// One row per transaction
    Csv,
}

const CSV_HEADER: [&str; 6] = ["Date", "Description", "Reference", "Amount", "Bank", "Client"];

pub fn render(outcome: &ParseOutcome, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(outcome)?),
        OutputFormat::Csv => transactions_csv(&outcome.transactions),
    }
}

pub fn transactions_csv(transactions: &[ParsedTransaction]) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(CSV_HEADER)?;
    for tx in transactions {
        let amount = tx.amount.to_string();
        wtr.write_record([
            tx.transaction_date.as_str(),
            tx.description.as_str(),
            tx.reference_number.as_str(),
            amount.as_str(),
            tx.bank_name.as_str(),
            tx.client_name.as_str(),
        ])?;
    }
    let bytes = wtr.into_inner().map_err(|e| anyhow::anyhow!("flushing CSV: {}", e.error()))?;
    Ok(String::from_utf8(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tallyscan_core::{DocumentType, Money, ParserConfig, RawDocumentText};
    use tallyscan_ocr::StatementParser;

    fn tx(description: &str, cents: i64) -> ParsedTransaction {
        ParsedTransaction {
            transaction_date: "2025-03-04".to_string(),
            description: description.to_string(),
            amount: Money::from_cents(cents),
            bank_name: "ACME BANK".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn csv_has_header_and_rows() {
        let out = transactions_csv(&[tx("COFFEE", -450), tx("PAYROLL", 200_000)]).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "Date,Description,Reference,Amount,Bank,Client");
        assert_eq!(lines[1], "2025-03-04,COFFEE,,-4.50,ACME BANK,");
        assert_eq!(lines[2], "2025-03-04,PAYROLL,,2000.00,ACME BANK,");
    }

    #[test]
    fn csv_quotes_commas_and_quotes() {
        let out = transactions_csv(&[tx("SMITH, JONES \"LLP\"", 100)]).unwrap();
        assert!(out.contains("\"SMITH, JONES \"\"LLP\"\"\""));
    }

    #[test]
    fn empty_csv_is_just_the_header() {
        assert_eq!(transactions_csv(&[]).unwrap(), "Date,Description,Reference,Amount,Bank,Client\n");
    }

    #[test]
    fn json_renders_the_whole_outcome() {
        let parser = StatementParser::new(ParserConfig::default()).unwrap();
        let outcome = parser.parse(&RawDocumentText::new(""), DocumentType::Bank);
        let json: serde_json::Value = serde_json::from_str(&render(&outcome, OutputFormat::Json).unwrap()).unwrap();
        assert_eq!(json["notice"], "NO_TRANSACTIONS_FOUND");
        assert_eq!(json["transactions"], serde_json::json!([]));
    }
}
