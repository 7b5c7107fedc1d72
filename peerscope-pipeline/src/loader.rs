//! CSV input loaders.
//!
//! Parses the three input tables into typed records. Expected columns:
//!   branch months:  branch_id, month, revenue, profit,
//!                   beverage_revenue, food_revenue
//!   branch items:   branch_id, item_id, revenue, cost, units_sold
//!                   [, category]
//!   transactions:   branch_id, transaction_id, item_id  (one line item
//!                   per row; baskets are rebuilt by grouping)
//!
//! Numeric fields tolerate thousands separators, `%` signs and currency
//! symbols, since exports from spreadsheet tooling arrive dirty. Rows
//! whose branch id is a rollup ("total", "grand total", ...) are dropped.

use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;
use std::path::Path;

use peerscope_analytics::bundling::ItemSales;
use peerscope_analytics::features::BranchMonth;
use serde::Deserialize;

use crate::error::{PipelineError, PipelineResult};

/// A branch-month CSV record.
#[derive(Debug, Clone, Deserialize)]
pub struct BranchMonthRecord {
    pub branch_id: String,
    pub month: String,
    #[serde(deserialize_with = "deserialize_flexible_f64")]
    pub revenue: f64,
    #[serde(deserialize_with = "deserialize_flexible_f64")]
    pub profit: f64,
    #[serde(deserialize_with = "deserialize_flexible_f64")]
    pub beverage_revenue: f64,
    #[serde(deserialize_with = "deserialize_flexible_f64")]
    pub food_revenue: f64,
}

impl BranchMonthRecord {
    /// Convert to the analytics-side row.
    pub fn to_branch_month(&self) -> BranchMonth {
        BranchMonth {
            branch_id: self.branch_id.clone(),
            month: self.month.clone(),
            revenue: self.revenue,
            profit: self.profit,
            beverage_revenue: self.beverage_revenue,
            food_revenue: self.food_revenue,
        }
    }
}

/// A branch-item sales CSV record.
#[derive(Debug, Clone, Deserialize)]
pub struct BranchItemRecord {
    pub branch_id: String,
    pub item_id: String,
    #[serde(deserialize_with = "deserialize_flexible_f64")]
    pub revenue: f64,
    #[serde(deserialize_with = "deserialize_flexible_f64")]
    pub cost: f64,
    #[serde(deserialize_with = "deserialize_flexible_f64")]
    pub units_sold: f64,
    #[serde(default)]
    pub category: Option<String>,
}

impl BranchItemRecord {
    /// Convert to the analytics-side row (drops branch_id).
    pub fn to_item_sales(&self) -> ItemSales {
        ItemSales {
            item_id: self.item_id.clone(),
            revenue: self.revenue,
            cost: self.cost,
            units_sold: self.units_sold,
            category: self
                .category
                .as_ref()
                .map(|c| c.trim().to_lowercase())
                .filter(|c| !c.is_empty()),
        }
    }
}

/// One transaction line item.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionRecord {
    pub branch_id: String,
    pub transaction_id: String,
    pub item_id: String,
}

/// Rollup rows exported alongside real branches.
fn is_rollup_branch_id(branch_id: &str) -> bool {
    matches!(
        branch_id.trim().to_lowercase().as_str(),
        "" | "total" | "totals" | "grand total" | "all branches"
    )
}

fn read_csv<T, R>(reader: R) -> Result<Vec<T>, String>
where
    T: for<'de> Deserialize<'de>,
    R: Read,
{
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut records = Vec::new();
    for (line_num, result) in csv_reader.deserialize().enumerate() {
        let record: T =
            result.map_err(|e| format!("CSV parse error at line {}: {}", line_num + 2, e))?;
        records.push(record);
    }
    Ok(records)
}

/// Load branch-month records from a CSV reader.
pub fn load_branch_months<R: Read>(reader: R) -> Result<Vec<BranchMonthRecord>, String> {
    let mut records: Vec<BranchMonthRecord> = read_csv(reader)?;
    records.retain(|r| !is_rollup_branch_id(&r.branch_id));
    for r in &mut records {
        r.branch_id = r.branch_id.trim().to_string();
    }
    Ok(records)
}

/// Load branch-item records from a CSV reader.
pub fn load_branch_items<R: Read>(reader: R) -> Result<Vec<BranchItemRecord>, String> {
    let mut records: Vec<BranchItemRecord> = read_csv(reader)?;
    records.retain(|r| !is_rollup_branch_id(&r.branch_id));
    for r in &mut records {
        r.branch_id = r.branch_id.trim().to_string();
    }
    Ok(records)
}

/// Load transaction line items from a CSV reader.
pub fn load_transactions<R: Read>(reader: R) -> Result<Vec<TransactionRecord>, String> {
    let mut records: Vec<TransactionRecord> = read_csv(reader)?;
    records.retain(|r| !is_rollup_branch_id(&r.branch_id));
    for r in &mut records {
        r.branch_id = r.branch_id.trim().to_string();
    }
    Ok(records)
}

fn open_required(name: &'static str, path: &Path) -> PipelineResult<std::fs::File> {
    if !path.exists() {
        return Err(PipelineError::MissingInput {
            name,
            path: path.to_path_buf(),
        });
    }
    std::fs::File::open(path).map_err(|source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Load branch-month records from a CSV file path.
pub fn load_branch_months_file(path: &Path) -> PipelineResult<Vec<BranchMonthRecord>> {
    let file = open_required("branch monthly sales", path)?;
    load_branch_months(file).map_err(|message| PipelineError::Csv {
        path: path.to_path_buf(),
        message,
    })
}

/// Load branch-item records from a CSV file path.
pub fn load_branch_items_file(path: &Path) -> PipelineResult<Vec<BranchItemRecord>> {
    let file = open_required("branch item sales", path)?;
    load_branch_items(file).map_err(|message| PipelineError::Csv {
        path: path.to_path_buf(),
        message,
    })
}

/// Load transaction line items from a CSV file path.
pub fn load_transactions_file(path: &Path) -> PipelineResult<Vec<TransactionRecord>> {
    let file = open_required("transaction co-occurrence", path)?;
    load_transactions(file).map_err(|message| PipelineError::Csv {
        path: path.to_path_buf(),
        message,
    })
}

/// Group item records by branch, branch ids sorted.
pub fn group_items_by_branch(records: &[BranchItemRecord]) -> Vec<(String, Vec<ItemSales>)> {
    let mut groups: BTreeMap<String, Vec<ItemSales>> = BTreeMap::new();
    for record in records {
        groups
            .entry(record.branch_id.clone())
            .or_default()
            .push(record.to_item_sales());
    }
    groups.into_iter().collect()
}

/// Rebuild per-branch baskets from transaction line items. Items are
/// de-duplicated and sorted within each basket; baskets come back in
/// transaction-id order per branch.
pub fn build_baskets(records: &[TransactionRecord]) -> BTreeMap<String, Vec<Vec<String>>> {
    let mut grouped: BTreeMap<(String, String), BTreeSet<String>> = BTreeMap::new();
    for record in records {
        grouped
            .entry((record.branch_id.clone(), record.transaction_id.clone()))
            .or_default()
            .insert(record.item_id.clone());
    }

    let mut baskets: BTreeMap<String, Vec<Vec<String>>> = BTreeMap::new();
    for ((branch_id, _), items) in grouped {
        baskets
            .entry(branch_id)
            .or_default()
            .push(items.into_iter().collect());
    }
    baskets
}

/// Flexible f64 deserializer: tolerates thousands separators, `%`,
/// currency symbols and surrounding whitespace. An empty field is 0.
fn deserialize_flexible_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    let cleaned: String = s
        .trim()
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    if cleaned.is_empty() || cleaned == "-" || cleaned == "." || cleaned == "-." {
        return Ok(0.0);
    }
    cleaned.parse::<f64>().map_err(|_| {
        serde::de::Error::custom(format!("expected numeric value, got '{}'", s))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MONTHS_CSV: &str = "\
branch_id,month,revenue,profit,beverage_revenue,food_revenue
zalka,2025-01,\"42,000\",9000,25000,12000
zalka,2025-02,39000,8500,24000,11000
aley,2025-01,28000,4000,15000,9000
Grand Total,2025-01,109000,21500,64000,32000
";

    #[test]
    fn loads_months_and_drops_rollup_rows() {
        let records = load_branch_months(MONTHS_CSV.as_bytes()).unwrap();
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.branch_id != "Grand Total"));
        assert!((records[0].revenue - 42_000.0).abs() < 1e-9);
    }

    #[test]
    fn flexible_numbers_strip_separators_and_symbols() {
        let csv_data = "\
branch_id,month,revenue,profit,beverage_revenue,food_revenue
a,2025-01,\"$1,234.50\",10%,,3
";
        let records = load_branch_months(csv_data.as_bytes()).unwrap();
        assert!((records[0].revenue - 1234.50).abs() < 1e-9);
        assert!((records[0].profit - 10.0).abs() < 1e-9);
        assert_eq!(records[0].beverage_revenue, 0.0);
    }

    #[test]
    fn garbage_numeric_field_is_a_parse_error() {
        let csv_data = "\
branch_id,month,revenue,profit,beverage_revenue,food_revenue
a,2025-01,abc,1,1,1
";
        assert!(load_branch_months(csv_data.as_bytes()).is_err());
    }

    const ITEMS_CSV: &str = "\
branch_id,item_id,revenue,cost,units_sold,category
zalka,LATTE,17000,5000,300,beverages
zalka,SCONE,800,500,40,food
aley,LATTE,9000,3000,150,beverages
";

    #[test]
    fn loads_items_with_category() {
        let records = load_branch_items(ITEMS_CSV.as_bytes()).unwrap();
        assert_eq!(records.len(), 3);
        let item = records[0].to_item_sales();
        assert_eq!(item.category.as_deref(), Some("beverages"));
        assert!((item.unit_price() - 17000.0 / 300.0).abs() < 1e-9);
    }

    #[test]
    fn category_column_is_optional() {
        let csv_data = "\
branch_id,item_id,revenue,cost,units_sold
zalka,LATTE,17000,5000,300
";
        let records = load_branch_items(csv_data.as_bytes()).unwrap();
        assert!(records[0].category.is_none());
    }

    #[test]
    fn groups_items_by_branch_in_sorted_order() {
        let records = load_branch_items(ITEMS_CSV.as_bytes()).unwrap();
        let groups = group_items_by_branch(&records);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, "aley");
        assert_eq!(groups[1].0, "zalka");
        assert_eq!(groups[1].1.len(), 2);
    }

    const TXN_CSV: &str = "\
branch_id,transaction_id,item_id
zalka,t1,LATTE
zalka,t1,SCONE
zalka,t1,LATTE
zalka,t2,LATTE
aley,t9,MUFFIN
";

    #[test]
    fn baskets_dedupe_items_within_a_transaction() {
        let records = load_transactions(TXN_CSV.as_bytes()).unwrap();
        let baskets = build_baskets(&records);
        assert_eq!(baskets["zalka"].len(), 2);
        assert_eq!(baskets["zalka"][0], vec!["LATTE", "SCONE"]);
        assert_eq!(baskets["zalka"][1], vec!["LATTE"]);
        assert_eq!(baskets["aley"].len(), 1);
    }

    #[test]
    fn missing_required_file_names_the_input() {
        let err = load_branch_items_file(Path::new("/nonexistent/items.csv")).unwrap_err();
        let text = err.to_string();
        assert!(text.contains("branch item sales"), "got: {}", text);
    }
}
