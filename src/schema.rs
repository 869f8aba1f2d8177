//! Declared column kinds per data source and their resolution against a raw
//! dataset.
//!
//! Every source declares the columns whose meaning matters for cleaning
//! (area, dates, prices). Columns the declaration does not mention are
//! inferred once from the raw text: numeric when every present cell parses as
//! a number, text otherwise. Cleaning rules then dispatch on the resolved kind
//! and never inspect cell types again.

use std::fmt;

use log::debug;

use crate::{
    data::{Value, parse_number},
    dataset::TabularDataset,
    error::SourceError,
    source::DataSource,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    /// Free text, imputed with the most frequent value.
    Text,
    /// Numbers, imputed with the median or the mean depending on the source.
    Numeric,
    /// Currency strings such as `$1,234.50`, coerced to floats then imputed as numbers.
    Currency,
    /// Calendar values, parsed after imputation; unparseable cells become unknown.
    Date,
    /// Plain numeric amounts coerced after imputation; unparseable cells become unknown.
    Price,
}

impl ColumnKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnKind::Text => "text",
            ColumnKind::Numeric => "numeric",
            ColumnKind::Currency => "currency",
            ColumnKind::Date => "date",
            ColumnKind::Price => "price",
        }
    }

    /// Kinds whose cells may legitimately remain unknown after cleaning.
    pub fn tolerates_unknown(&self) -> bool {
        matches!(self, ColumnKind::Date | ColumnKind::Price)
    }

    /// Kinds imputed with a numeric statistic rather than a mode.
    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnKind::Numeric | ColumnKind::Currency)
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DeclaredColumn {
    pub name: &'static str,
    pub kind: ColumnKind,
    pub required: bool,
}

const fn required(name: &'static str, kind: ColumnKind) -> DeclaredColumn {
    DeclaredColumn {
        name,
        kind,
        required: true,
    }
}

const fn optional(name: &'static str, kind: ColumnKind) -> DeclaredColumn {
    DeclaredColumn {
        name,
        kind,
        required: false,
    }
}

pub const STORE_AREA_COLUMN: &str = "Square Meters";
pub const STORE_OPEN_DATE_COLUMN: &str = "Open Date";
pub const PRODUCT_PRICE_COLUMNS: [&str; 2] = ["Unit Price USD", "Unit Cost USD"];
pub const CUSTOMER_DATE_COLUMN: &str = "Birthday";
pub const CUSTOMER_PRICE_COLUMN: &str = "Price";

const STORES_COLUMNS: &[DeclaredColumn] = &[
    required(STORE_AREA_COLUMN, ColumnKind::Numeric),
    required(STORE_OPEN_DATE_COLUMN, ColumnKind::Date),
];

const SALES_COLUMNS: &[DeclaredColumn] = &[
    optional("Order Date", ColumnKind::Date),
    optional("Delivery Date", ColumnKind::Date),
    optional("Date", ColumnKind::Date),
    optional("Quantity", ColumnKind::Numeric),
];

const PRODUCTS_COLUMNS: &[DeclaredColumn] = &[
    optional(PRODUCT_PRICE_COLUMNS[0], ColumnKind::Currency),
    optional(PRODUCT_PRICE_COLUMNS[1], ColumnKind::Currency),
    optional("Date", ColumnKind::Date),
];

const EXCHANGE_RATES_COLUMNS: &[DeclaredColumn] = &[
    optional("Date", ColumnKind::Date),
    optional("Exchange", ColumnKind::Numeric),
];

const CUSTOMERS_COLUMNS: &[DeclaredColumn] = &[
    optional(CUSTOMER_DATE_COLUMN, ColumnKind::Date),
    optional(CUSTOMER_PRICE_COLUMN, ColumnKind::Price),
];

/// Column declarations for one data source.
#[derive(Debug, Clone, Copy)]
pub struct SourceSchema {
    pub source: DataSource,
    pub columns: &'static [DeclaredColumn],
}

impl SourceSchema {
    pub fn for_source(source: DataSource) -> Self {
        let columns = match source {
            DataSource::Stores => STORES_COLUMNS,
            DataSource::Sales => SALES_COLUMNS,
            DataSource::Products => PRODUCTS_COLUMNS,
            DataSource::ExchangeRates => EXCHANGE_RATES_COLUMNS,
            DataSource::Customers => CUSTOMERS_COLUMNS,
        };
        Self { source, columns }
    }

    pub fn declared(&self, name: &str) -> Option<&DeclaredColumn> {
        self.columns.iter().find(|column| column.name == name)
    }

    /// Resolves a kind for every column of `dataset`, failing when a required
    /// declared column is absent.
    pub fn resolve(&self, dataset: &TabularDataset) -> Result<ResolvedSchema, SourceError> {
        for declared in self.columns.iter().filter(|column| column.required) {
            if dataset.column(declared.name).is_none() {
                return Err(SourceError::MissingColumn {
                    source_id: self.source,
                    column: declared.name.to_string(),
                });
            }
        }
        let kinds = dataset
            .columns()
            .iter()
            .map(|column| {
                let kind = self
                    .declared(&column.name)
                    .map(|declared| declared.kind)
                    .unwrap_or_else(|| infer_kind(&column.cells));
                debug!(
                    "{} column '{}' resolved as {}",
                    self.source, column.name, kind
                );
                (column.name.clone(), kind)
            })
            .collect();
        Ok(ResolvedSchema {
            source: self.source,
            kinds,
        })
    }
}

/// Column kinds resolved for one concrete dataset, in column order.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSchema {
    pub source: DataSource,
    kinds: Vec<(String, ColumnKind)>,
}

impl ResolvedSchema {
    pub fn kind(&self, name: &str) -> Option<ColumnKind> {
        self.kinds
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, kind)| *kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, ColumnKind)> {
        self.kinds.iter().map(|(name, kind)| (name.as_str(), *kind))
    }

    /// Columns that must end up fully imputed; date and price columns may
    /// keep unknown cells.
    pub fn imputed_columns(&self) -> impl Iterator<Item = &str> {
        self.iter()
            .filter(|(_, kind)| !kind.tolerates_unknown())
            .map(|(name, _)| name)
    }

    /// Fails when any of `columns` needs imputation but has no present cell in
    /// `dataset`, since no statistic can be computed for it.
    pub fn ensure_imputable<'a, I>(
        &self,
        dataset: &TabularDataset,
        columns: I,
    ) -> Result<(), SourceError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        for name in columns {
            let Some(column) = dataset.column(name) else {
                continue;
            };
            if column.has_missing() && column.present().next().is_none() {
                return Err(SourceError::EmptyColumn {
                    source_id: self.source,
                    column: name.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Numeric when every present raw cell parses as a number and at least one is
/// present; text otherwise.
pub fn infer_kind(cells: &[Option<Value>]) -> ColumnKind {
    let mut observed = 0usize;
    for cell in cells.iter().flatten() {
        let numeric = match cell {
            Value::String(raw) => parse_number(raw).is_some(),
            other => other.is_numeric(),
        };
        if !numeric {
            return ColumnKind::Text;
        }
        observed += 1;
    }
    if observed > 0 {
        ColumnKind::Numeric
    } else {
        ColumnKind::Text
    }
}
