use std::collections::BTreeMap;
use std::io::Write;

use crate::error::ScrapeError;
use crate::params::Value;

/// One scraped stage: parameters and metrics by column name.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    pub stage: String,
    pub done: bool,
    pub params: BTreeMap<String, Value>,
    pub metrics: BTreeMap<String, Value>,
}

/// Rows plus the column order they are written in.
#[derive(Debug, Clone, Default)]
pub struct ResultsTable {
    metric_columns: Vec<String>,
    rows: Vec<ResultRow>,
}

impl ResultsTable {
    pub fn new(metric_columns: Vec<String>) -> Self {
        Self {
            metric_columns,
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: ResultRow) {
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    pub fn sort_by_stage(&mut self) {
        self.rows.sort_by(|a, b| a.stage.cmp(&b.stage));
    }

    /// Parameter columns: the union of keys across rows, sorted.
    pub fn param_columns(&self) -> Vec<String> {
        let mut cols: Vec<String> = self
            .rows
            .iter()
            .flat_map(|r| r.params.keys().cloned())
            .collect();
        cols.sort();
        cols.dedup();
        cols
    }

    pub fn header(&self) -> Vec<String> {
        let mut h = vec!["stage".to_string(), "done".to_string()];
        h.extend(self.param_columns());
        h.extend(self.metric_columns.iter().cloned());
        h
    }

    pub fn write_tsv<W: Write>(&self, mut out: W) -> Result<(), ScrapeError> {
        let params = self.param_columns();
        writeln!(out, "{}", self.header().join("\t"))?;
        for row in &self.rows {
            let mut cells = vec![row.stage.clone(), row.done.to_string()];
            for col in &params {
                cells.push(cell(row.params.get(col)));
            }
            for col in &self.metric_columns {
                cells.push(cell(row.metrics.get(col)));
            }
            writeln!(out, "{}", cells.join("\t"))?;
        }
        Ok(())
    }

    pub fn write_jsonl<W: Write>(&self, mut out: W) -> Result<(), ScrapeError> {
        for row in &self.rows {
            let mut obj = serde_json::Map::new();
            obj.insert("stage".into(), serde_json::Value::from(row.stage.clone()));
            obj.insert("done".into(), serde_json::Value::from(row.done));
            for (k, v) in row.params.iter().chain(row.metrics.iter()) {
                obj.insert(k.clone(), serde_json::to_value(v)?);
            }
            for col in &self.metric_columns {
                obj.entry(col.clone()).or_insert(serde_json::Value::Null);
            }
            serde_json::to_writer(&mut out, &obj)?;
            writeln!(out)?;
        }
        Ok(())
    }
}

// Tabs and newlines would break the row.
fn cell(v: Option<&Value>) -> String {
    v.map(|v| v.to_string().replace(['\t', '\n'], " "))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn row(stage: &str, lr: f64, acc: Option<f64>) -> ResultRow {
        let mut params = BTreeMap::new();
        params.insert("lr".to_string(), Value::Number(lr));
        let mut metrics = BTreeMap::new();
        metrics.insert("acc".to_string(), Value::from(acc));
        ResultRow {
            stage: stage.to_string(),
            done: acc.is_some(),
            params,
            metrics,
        }
    }

    #[test]
    fn tsv_has_header_and_empty_missing_cells() {
        let mut t = ResultsTable::new(vec!["acc".into()]);
        t.push(row("b", 0.01, None));
        t.push(row("a", 0.1, Some(0.9)));
        t.sort_by_stage();

        let mut buf = Vec::new();
        t.write_tsv(&mut buf).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "stage\tdone\tlr\tacc\na\ttrue\t0.1\t0.9\nb\tfalse\t0.01\t\n"
        );
    }

    #[test]
    fn jsonl_rows_parse_back() {
        let mut t = ResultsTable::new(vec!["acc".into()]);
        t.push(row("a", 0.1, Some(0.9)));
        let mut buf = Vec::new();
        t.write_jsonl(&mut buf).unwrap();
        let v: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(v["stage"], "a");
        assert_eq!(v["acc"], 0.9);
        assert_eq!(v["done"], true);
    }
}
