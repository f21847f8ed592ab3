//! Form 5500 / Schedule A ingestion.
//!
//! Both extracts use the Department of Labor column names and arrive either
//! as the published CSV files or as JSON arrays of rows. Filings are left-joined to their Schedule A rows on `ACK_ID`;
//! a filing keeps its fee only when at least one Schedule A row reports a
//! non-negative premium amount.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use chrono::{Datelike, NaiveDate};
use serde::{de::DeserializeOwned, Deserialize};

use crate::benchmark::{BenchmarkRecord, Dimensions, Period, SourceError};

/// One Form 5500 filing row.
#[derive(Debug, Clone, Deserialize)]
pub struct Form5500Row {
    #[serde(rename = "ACK_ID")]
    pub ack_id: String,
    #[serde(rename = "SPONSOR_DFE_NAME", default)]
    pub sponsor_name: Option<String>,
    #[serde(rename = "SPONS_DFE_MAIL_US_CITY", default)]
    pub city: Option<String>,
    #[serde(rename = "SPONS_DFE_MAIL_US_STATE", default)]
    pub state: Option<String>,
    #[serde(rename = "BUSINESS_CODE", default)]
    pub business_code: Option<u64>,
    #[serde(rename = "PLAN_NAME", default)]
    pub plan_name: Option<String>,
    #[serde(rename = "TOT_ACTIVE_PARTCP_CNT", default)]
    pub active_participants: Option<u64>,
    #[serde(rename = "FORM_PLAN_YEAR_BEGIN_DATE", default)]
    pub plan_year_begin: Option<String>,
}

/// One Schedule A (insurance information) row.
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleARow {
    #[serde(rename = "ACK_ID")]
    pub ack_id: String,
    #[serde(rename = "INS_CARRIER_NAME", default)]
    pub carrier_name: Option<String>,
    #[serde(rename = "PENSION_PREM_PAID_TOT_AMT", default)]
    pub premium_paid: Option<f64>,
}

/// Counts reported after a join.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub filings: usize,
    pub joined: usize,
    pub missing_fee: usize,
    pub negative_fee: usize,
    pub missing_year: usize,
    pub duplicate: usize,
}

impl IngestSummary {
    pub fn dropped(&self) -> usize {
        self.missing_fee + self.negative_fee + self.missing_year + self.duplicate
    }
}

/// Read rows from `path`.
///
/// A `.csv` file is read by header name; any other file must hold a JSON
/// array. Columns the row type does not name are ignored and empty CSV
/// fields read as absent.
pub fn load_rows<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<Vec<T>, SourceError> {
    let path = path.as_ref();

    if is_csv(path) {
        let mut reader = csv::Reader::from_path(path).map_err(|err| format_error(path, err))?;
        return reader
            .deserialize()
            .collect::<Result<Vec<T>, csv::Error>>()
            .map_err(|err| format_error(path, err));
    }

    let raw = std::fs::read_to_string(path)?;
    serde_json::from_str(&raw).map_err(|err| format_error(path, err))
}

fn format_error(path: &Path, err: impl std::fmt::Display) -> SourceError {
    SourceError::format(format!("{}: {}", path.display(), err))
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

#[derive(Default)]
struct ScheduleTotals {
    fee: Option<f64>,
    negative: bool,
    carriers: Vec<String>,
}

/// Join filings to their Schedule A rows.
///
/// Several Schedule A rows for one filing are summed into a single fee and
/// their carrier names joined, so each filing yields at most one record.
/// `plan_year` stamps every record; without it the year comes from the
/// filing's plan-year begin date. A repeated `ACK_ID` keeps its first
/// filing and counts the rest as duplicates.
pub fn join_filings(
    filings: Vec<Form5500Row>,
    schedules: Vec<ScheduleARow>,
    plan_year: Option<i32>,
) -> (Vec<BenchmarkRecord>, IngestSummary) {
    let mut totals: HashMap<String, ScheduleTotals> = HashMap::new();
    for row in schedules {
        let entry = totals.entry(row.ack_id.trim().to_string()).or_default();
        if let Some(amount) = row.premium_paid.filter(|amount| amount.is_finite()) {
            if amount < 0.0 {
                entry.negative = true;
            }
            entry.fee = Some(entry.fee.unwrap_or(0.0) + amount);
        }
        if let Some(carrier) = row.carrier_name.map(|c| c.trim().to_string()) {
            if !carrier.is_empty() && !entry.carriers.contains(&carrier) {
                entry.carriers.push(carrier);
            }
        }
    }

    let mut summary = IngestSummary {
        filings: filings.len(),
        ..IngestSummary::default()
    };
    let mut records = Vec::with_capacity(filings.len());
    let mut seen = HashSet::new();

    for filing in filings {
        let ack_id = filing.ack_id.trim().to_string();
        if !seen.insert(ack_id.clone()) {
            tracing::debug!("Skipping duplicate filing '{}'", ack_id);
            summary.duplicate += 1;
            continue;
        }
        let schedule = totals.remove(&ack_id);

        let fee_amount = match schedule.as_ref() {
            Some(totals) if totals.negative => {
                summary.negative_fee += 1;
                continue;
            }
            Some(ScheduleTotals { fee: Some(fee), .. }) => *fee,
            _ => {
                summary.missing_fee += 1;
                continue;
            }
        };

        let year = match plan_year.or_else(|| begin_year(filing.plan_year_begin.as_deref())) {
            Some(year) => year,
            None => {
                summary.missing_year += 1;
                continue;
            }
        };

        let carrier_name = schedule
            .map(|s| s.carriers.join("; "))
            .filter(|joined| !joined.is_empty());

        let mut dimensions = Dimensions {
            state: filing.state,
            city: filing.city,
            business_type: filing.business_code.map(|code| code.to_string()),
            company_size: filing.active_participants.map(|count| count.to_string()),
        };
        dimensions.normalize();

        records.push(BenchmarkRecord {
            ack_id,
            sponsor_name: filing.sponsor_name,
            plan_name: filing.plan_name,
            carrier_name,
            dimensions,
            period: Period::year(year),
            fee_amount,
        });
        summary.joined += 1;
    }

    (records, summary)
}

/// Year of a `YYYY-MM-DD` (or `MM/DD/YYYY`) plan-year begin date.
fn begin_year(raw: Option<&str>) -> Option<i32> {
    let raw = raw?.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%m/%d/%Y"))
        .ok()
        .map(|date| date.year())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filing(ack_id: &str, begin: Option<&str>) -> Form5500Row {
        Form5500Row {
            ack_id: ack_id.to_string(),
            sponsor_name: Some(format!("Sponsor {}", ack_id)),
            city: Some("Dallas".to_string()),
            state: Some("TX".to_string()),
            business_code: Some(611000),
            plan_name: Some("401(k) Plan".to_string()),
            active_participants: Some(150),
            plan_year_begin: begin.map(str::to_string),
        }
    }

    fn schedule(ack_id: &str, carrier: &str, amount: Option<f64>) -> ScheduleARow {
        ScheduleARow {
            ack_id: ack_id.to_string(),
            carrier_name: Some(carrier.to_string()),
            premium_paid: amount,
        }
    }

    #[test]
    fn join_keeps_filings_with_fees() {
        let (records, summary) = join_filings(
            vec![filing("A1", None), filing("A2", None)],
            vec![schedule("A1", "Acme Life", Some(3200.0))],
            Some(2023),
        );

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].ack_id, "A1");
        assert_eq!(records[0].fee_amount, 3200.0);
        assert_eq!(records[0].period, Period::year(2023));
        assert_eq!(records[0].carrier_name.as_deref(), Some("Acme Life"));
        assert_eq!(records[0].dimensions.business_type.as_deref(), Some("611000"));
        assert_eq!(summary.joined, 1);
        assert_eq!(summary.missing_fee, 1);
    }

    #[test]
    fn negative_fee_drops_filing() {
        let (records, summary) = join_filings(
            vec![filing("A1", None)],
            vec![schedule("A1", "Acme Life", Some(-10.0))],
            Some(2023),
        );
        assert!(records.is_empty());
        assert_eq!(summary.negative_fee, 1);
        assert_eq!(summary.dropped(), 1);
    }

    #[test]
    fn multiple_schedules_are_summed() {
        let (records, _) = join_filings(
            vec![filing("A1", None)],
            vec![
                schedule("A1", "Acme Life", Some(1000.0)),
                schedule("A1", "Beta Mutual", Some(250.5)),
                schedule("A1", "Acme Life", None),
            ],
            Some(2023),
        );
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].fee_amount, 1250.5);
        assert_eq!(records[0].carrier_name.as_deref(), Some("Acme Life; Beta Mutual"));
    }

    #[test]
    fn year_falls_back_to_begin_date() {
        let (records, summary) = join_filings(
            vec![
                filing("A1", Some("2022-01-01")),
                filing("A2", Some("07/01/2021")),
                filing("A3", None),
            ],
            vec![
                schedule("A1", "Acme", Some(1.0)),
                schedule("A2", "Acme", Some(1.0)),
                schedule("A3", "Acme", Some(1.0)),
            ],
            None,
        );
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].period, Period::year(2022));
        assert_eq!(records[1].period, Period::year(2021));
        assert_eq!(summary.missing_year, 1);
    }

    #[test]
    fn load_rows_parses_dol_column_names() {
        let path = std::env::temp_dir().join("plan_fee_benchmark_sched_a.json");
        std::fs::write(
            &path,
            r#"[{"ACK_ID":"A1","INS_CARRIER_NAME":"Acme","PENSION_PREM_PAID_TOT_AMT":12.5}]"#,
        )
        .unwrap();

        let rows: Vec<ScheduleARow> = load_rows(&path).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].premium_paid, Some(12.5));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn load_rows_reads_dol_csv_extract() {
        let path = std::env::temp_dir().join("plan_fee_benchmark_f_5500.CSV");
        std::fs::write(
            &path,
            "ACK_ID,SPONSOR_DFE_NAME,SPONS_DFE_MAIL_US_CITY,SPONS_DFE_MAIL_US_STATE,\
BUSINESS_CODE,PLAN_NAME,TOT_ACTIVE_PARTCP_CNT,FORM_PLAN_YEAR_BEGIN_DATE,FORM_TAX_PRD\n\
A1,Acme Corp,Dallas,TX,611000,401(k) Plan,150,2023-01-01,2023-12-31\n\
A2,\"Beta, Inc\",Austin,TX,,Savings Plan,,07/01/2022,2023-06-30\n",
        )
        .unwrap();

        let rows: Vec<Form5500Row> = load_rows(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].ack_id, "A1");
        assert_eq!(rows[0].business_code, Some(611000));
        assert_eq!(rows[0].active_participants, Some(150));
        assert_eq!(rows[1].sponsor_name.as_deref(), Some("Beta, Inc"));
        assert_eq!(rows[1].business_code, None);
        assert_eq!(rows[1].active_participants, None);
        assert_eq!(begin_year(rows[1].plan_year_begin.as_deref()), Some(2022));
    }

    #[test]
    fn load_rows_rejects_malformed_csv_value() {
        let path = std::env::temp_dir().join("plan_fee_benchmark_sched_a_bad.csv");
        std::fs::write(
            &path,
            "ACK_ID,INS_CARRIER_NAME,PENSION_PREM_PAID_TOT_AMT\nA1,Acme,not-a-number\n",
        )
        .unwrap();

        let result: Result<Vec<ScheduleARow>, SourceError> = load_rows(&path);
        let _ = std::fs::remove_file(&path);

        assert!(matches!(result, Err(SourceError::Format { .. })));
    }

    #[test]
    fn duplicate_filing_is_counted_separately() {
        let mut repeat = filing("A1", None);
        repeat.sponsor_name = Some("Second Copy".to_string());

        let (records, summary) = join_filings(
            vec![filing("A1", None), repeat, filing(" A1 ", None)],
            vec![schedule("A1", "Acme Life", Some(500.0))],
            Some(2023),
        );

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].sponsor_name.as_deref(), Some("Sponsor A1"));
        assert_eq!(records[0].fee_amount, 500.0);
        assert_eq!(summary.joined, 1);
        assert_eq!(summary.duplicate, 2);
        assert_eq!(summary.missing_fee, 0);
        assert_eq!(summary.dropped(), 2);
    }
}
