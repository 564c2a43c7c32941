use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::StoreResult;
use crate::tprintln;

/// The four canonical record fields, in persisted column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Field {
    Company,
    Address,
    Complement,
    Phone,
}

impl Field {
    pub const ALL: [Field; 4] = [Field::Company, Field::Address, Field::Complement, Field::Phone];

    /// Column header used in route files.
    pub fn column(self) -> &'static str {
        match self {
            Field::Company => "Company",
            Field::Address => "Address",
            Field::Complement => "Complement",
            Field::Phone => "Phone",
        }
    }

    /// Headers written by older versions of the route files.
    fn legacy_aliases(self) -> &'static [&'static str] {
        match self {
            Field::Company => &["empresa"],
            Field::Address => &["endereço", "endereco"],
            Field::Complement => &["complemento"],
            Field::Phone => &["telefone"],
        }
    }

    /// Parse a field name case-insensitively, accepting legacy headers too.
    pub fn parse(name: &str) -> Option<Field> {
        let n = clean_header(name).to_lowercase();
        Field::ALL.into_iter().find(|f| f.column().to_lowercase() == n || f.legacy_aliases().contains(&n.as_str()))
    }
}

/// One company entry of a route. Every field is free text and defaults to empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Record {
    pub company: String,
    pub address: String,
    pub complement: String,
    pub phone: String,
}

impl Record {
    pub fn new(company: impl Into<String>, address: impl Into<String>, complement: impl Into<String>, phone: impl Into<String>) -> Self {
        Self { company: company.into(), address: address.into(), complement: complement.into(), phone: phone.into() }
    }

    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Company => &self.company,
            Field::Address => &self.address,
            Field::Complement => &self.complement,
            Field::Phone => &self.phone,
        }
    }

    fn slot(&mut self, field: Field) -> &mut String {
        match field {
            Field::Company => &mut self.company,
            Field::Address => &mut self.address,
            Field::Complement => &mut self.complement,
            Field::Phone => &mut self.phone,
        }
    }

    /// Overwrite the fields present in `patch`, keeping the others.
    pub fn apply(&mut self, patch: &RecordPatch) {
        for field in Field::ALL {
            if let Some(v) = patch.get(field) {
                *self.slot(field) = v.to_string();
            }
        }
    }
}

/// Partial update for a record; `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RecordPatch {
    pub company: Option<String>,
    pub address: Option<String>,
    pub complement: Option<String>,
    pub phone: Option<String>,
}

impl RecordPatch {
    pub fn get(&self, field: Field) -> Option<&str> {
        match field {
            Field::Company => self.company.as_deref(),
            Field::Address => self.address.as_deref(),
            Field::Complement => self.complement.as_deref(),
            Field::Phone => self.phone.as_deref(),
        }
    }
}

impl From<Record> for RecordPatch {
    fn from(r: Record) -> Self {
        Self { company: Some(r.company), address: Some(r.address), complement: Some(r.complement), phone: Some(r.phone) }
    }
}

/// Spreadsheet exports may prefix the first header with a byte-order mark.
fn clean_header(name: &str) -> &str {
    name.trim_start_matches('\u{feff}').trim()
}

/// Find the source column for a canonical field. Canonical headers win over legacy ones.
fn find_source<'a>(df: &'a DataFrame, field: Field) -> Option<&'a Column> {
    let cols = df.get_columns();
    cols.iter()
        .find(|c| clean_header(c.name().as_str()) == field.column())
        .or_else(|| cols.iter().find(|c| Field::parse(c.name().as_str()) == Some(field)))
}

fn string_cells(col: &Column) -> StoreResult<Vec<String>> {
    let s = col.as_materialized_series().cast(&DataType::String)?;
    let ca = s.str()?;
    Ok(ca.into_iter().map(|v| v.unwrap_or("").to_string()).collect())
}

/// Bring a raw table to the canonical schema.
///
/// Column names are trimmed and matched against canonical and legacy headers;
/// missing fields become columns of empty strings, every cell is a string and
/// nulls become "". Unknown columns are dropped. Normalizing a normalized frame
/// returns an equal frame.
pub fn normalize_frame(df: &DataFrame) -> StoreResult<DataFrame> {
    let height = df.height();
    let mut cols: Vec<Column> = Vec::with_capacity(Field::ALL.len());
    for field in Field::ALL {
        let values = match find_source(df, field) {
            Some(src) => string_cells(src)?,
            None => {
                tprintln!("[schema.normalize] synthesizing missing column '{}' rows={}", field.column(), height);
                vec![String::new(); height]
            }
        };
        cols.push(Series::new(field.column().into(), values).into());
    }
    Ok(DataFrame::new(cols)?)
}

/// Empty frame with the canonical header.
pub fn empty_frame() -> StoreResult<DataFrame> {
    let cols: Vec<Column> = Field::ALL
        .iter()
        .map(|f| Series::new(f.column().into(), Vec::<String>::new()).into())
        .collect();
    Ok(DataFrame::new(cols)?)
}

/// Convert any frame into records, normalizing it first.
pub fn records_from_frame(df: &DataFrame) -> StoreResult<Vec<Record>> {
    let norm = normalize_frame(df)?;
    let mut columns: Vec<Vec<String>> = Vec::with_capacity(Field::ALL.len());
    for field in Field::ALL {
        columns.push(string_cells(norm.column(field.column())?)?);
    }
    let mut out = Vec::with_capacity(norm.height());
    for i in 0..norm.height() {
        out.push(Record {
            company: std::mem::take(&mut columns[0][i]),
            address: std::mem::take(&mut columns[1][i]),
            complement: std::mem::take(&mut columns[2][i]),
            phone: std::mem::take(&mut columns[3][i]),
        });
    }
    Ok(out)
}

/// Build a canonical frame from records, preserving their order.
pub fn frame_from_records(records: &[Record]) -> StoreResult<DataFrame> {
    let cols: Vec<Column> = Field::ALL
        .iter()
        .map(|f| {
            let values: Vec<&str> = records.iter().map(|r| r.get(*f)).collect();
            Series::new(f.column().into(), values).into()
        })
        .collect();
    Ok(DataFrame::new(cols)?)
}
