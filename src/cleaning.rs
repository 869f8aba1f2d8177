//! Per-source cleaning strategies.
//!
//! Each strategy takes a raw dataset (string cells, `None` for missing) and
//! returns a new cleaned dataset; the input is never modified. Column kinds
//! are resolved once through [`SourceSchema`] and every rule below dispatches
//! on that kind. Cells that cannot be coerced become unknown (`None`) instead
//! of failing the source.

use log::{debug, info, warn};

use crate::{
    data::{Value, parse_currency, parse_number, parse_temporal},
    dataset::{Column, TabularDataset},
    error::SourceError,
    schema::{ColumnKind, ResolvedSchema, STORE_AREA_COLUMN, SourceSchema},
    source::DataSource,
    stats,
};

/// Statistic used to impute missing numeric cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericFill {
    Median,
    Mean,
}

impl NumericFill {
    fn compute(&self, cells: &[Option<Value>]) -> Option<f64> {
        match self {
            NumericFill::Median => stats::median(cells),
            NumericFill::Mean => stats::mean(cells),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CleaningSummary {
    pub imputed: usize,
    pub unknown: usize,
}

impl CleaningSummary {
    fn absorb(&mut self, other: CleaningSummary) {
        self.imputed += other.imputed;
        self.unknown += other.unknown;
    }
}

/// Cleans `raw` with the strategy that belongs to `source`.
pub fn clean(source: DataSource, raw: &TabularDataset) -> Result<TabularDataset, SourceError> {
    let (cleaned, summary) = match source {
        DataSource::Stores => clean_stores(raw)?,
        DataSource::Sales | DataSource::Products | DataSource::ExchangeRates => {
            clean_column_wise(source, raw)?
        }
        DataSource::Customers => clean_customers(raw)?,
    };
    info!(
        "Cleaned {} data: {} row(s), {} cell(s) imputed, {} cell(s) coerced to unknown",
        source,
        cleaned.row_count(),
        summary.imputed,
        summary.unknown
    );
    Ok(cleaned)
}

/// Store area is imputed with its median; the open date is parsed.
fn clean_stores(raw: &TabularDataset) -> Result<(TabularDataset, CleaningSummary), SourceError> {
    let schema = SourceSchema::for_source(DataSource::Stores).resolve(raw)?;
    let mut dataset = raw.clone();
    let mut summary = coerce_numbers(&schema, &mut dataset);
    schema.ensure_imputable(&dataset, [STORE_AREA_COLUMN])?;
    if let Some(area) = dataset.column_mut(STORE_AREA_COLUMN) {
        summary.imputed += fill_numeric(area, NumericFill::Median);
    }
    summary.absorb(parse_late_columns(&schema, &mut dataset));
    Ok((dataset, summary))
}

/// Sales, Products and ExchangeRates: currency strings are stripped first,
/// then every numeric column takes its median and every other column its
/// most frequent value, then dates are parsed.
fn clean_column_wise(
    source: DataSource,
    raw: &TabularDataset,
) -> Result<(TabularDataset, CleaningSummary), SourceError> {
    let schema = SourceSchema::for_source(source).resolve(raw)?;
    let mut dataset = raw.clone();
    let mut summary = coerce_numbers(&schema, &mut dataset);
    schema.ensure_imputable(&dataset, schema.imputed_columns())?;
    for column in dataset.columns_mut() {
        let imputed = match schema.kind(&column.name) {
            Some(kind) if kind.is_numeric() => fill_numeric(column, NumericFill::Median),
            _ => fill_mode(column),
        };
        summary.imputed += imputed;
    }
    summary.absorb(parse_late_columns(&schema, &mut dataset));
    Ok((dataset, summary))
}

/// Customers: numeric columns take their mean, every remaining gap takes the
/// value from the mode row, then the optional date and price columns are
/// coerced.
fn clean_customers(
    raw: &TabularDataset,
) -> Result<(TabularDataset, CleaningSummary), SourceError> {
    // Mean here and median elsewhere is the established behavior for this
    // source and is kept as is.
    let schema = SourceSchema::for_source(DataSource::Customers).resolve(raw)?;
    let mut dataset = raw.clone();
    let mut summary = coerce_numbers(&schema, &mut dataset);
    schema.ensure_imputable(&dataset, schema.imputed_columns())?;
    for column in dataset.columns_mut() {
        if schema.kind(&column.name).is_some_and(|kind| kind.is_numeric()) {
            summary.imputed += fill_numeric(column, NumericFill::Mean);
        }
    }
    let reference = mode_row(&dataset);
    summary.imputed += fill_from_row(&mut dataset, &reference);
    summary.absorb(parse_late_columns(&schema, &mut dataset));
    Ok((dataset, summary))
}

/// Converts numeric and currency columns from raw text to numbers.
fn coerce_numbers(schema: &ResolvedSchema, dataset: &mut TabularDataset) -> CleaningSummary {
    let mut summary = CleaningSummary::default();
    for column in dataset.columns_mut() {
        let unknown = match schema.kind(&column.name) {
            Some(ColumnKind::Numeric) => coerce_numeric(column),
            Some(ColumnKind::Currency) => coerce_currency(column),
            _ => 0,
        };
        summary.unknown += unknown;
    }
    summary
}

/// Parses date columns and coerces price columns; both run after imputation.
fn parse_late_columns(schema: &ResolvedSchema, dataset: &mut TabularDataset) -> CleaningSummary {
    let mut summary = CleaningSummary::default();
    for column in dataset.columns_mut() {
        let unknown = match schema.kind(&column.name) {
            Some(ColumnKind::Date) => parse_dates(column),
            Some(ColumnKind::Price) => coerce_price(column),
            _ => 0,
        };
        summary.unknown += unknown;
    }
    summary
}

/// Parses every text cell as a number. Returns how many present cells could
/// not be parsed and became unknown.
pub fn coerce_numeric(column: &mut Column) -> usize {
    let unknown = coerce_cells(column, parse_number);
    normalize_numeric(column);
    unknown
}

/// Strips currency symbols and separators, then parses the remainder as a float.
pub fn coerce_currency(column: &mut Column) -> usize {
    coerce_cells(column, |raw| parse_currency(raw).map(Value::Float))
}

/// Parses every text cell as a date or datetime; failures become unknown.
pub fn parse_dates(column: &mut Column) -> usize {
    coerce_cells(column, parse_temporal)
}

/// Parses every text cell as a plain number; failures become unknown.
pub fn coerce_price(column: &mut Column) -> usize {
    let unknown = coerce_cells(column, parse_number);
    normalize_numeric(column);
    unknown
}

fn coerce_cells<F>(column: &mut Column, parse: F) -> usize
where
    F: Fn(&str) -> Option<Value>,
{
    let mut unknown = 0usize;
    for cell in column.cells.iter_mut() {
        let Some(Value::String(raw)) = cell.as_ref() else {
            continue;
        };
        let parsed = parse(raw);
        if parsed.is_none() {
            unknown += 1;
        }
        *cell = parsed;
    }
    if unknown > 0 {
        warn!(
            "Column '{}': {} value(s) could not be parsed and were set to unknown",
            column.name, unknown
        );
    }
    unknown
}

/// Widens integers to floats when the column already holds a float.
fn normalize_numeric(column: &mut Column) {
    if !column.present().any(|value| matches!(value, Value::Float(_))) {
        return;
    }
    for cell in column.cells.iter_mut() {
        if let Some(Value::Integer(i)) = cell {
            let widened = *i as f64;
            *cell = Some(Value::Float(widened));
        }
    }
}

/// Fills missing cells with the column's median or mean. Returns the number of
/// imputed cells.
pub fn fill_numeric(column: &mut Column, strategy: NumericFill) -> usize {
    if !column.has_missing() {
        return 0;
    }
    let Some(statistic) = strategy.compute(&column.cells) else {
        return 0;
    };
    let integral = column
        .present()
        .all(|value| matches!(value, Value::Integer(_)))
        && statistic.fract() == 0.0;
    let fill = if integral {
        Value::Integer(statistic as i64)
    } else {
        Value::Float(statistic)
    };
    debug!(
        "Column '{}': imputing {:?} value {}",
        column.name, strategy, fill
    );
    let imputed = fill_missing(column, &fill);
    normalize_numeric(column);
    imputed
}

/// Fills missing cells with the column's most frequent value.
pub fn fill_mode(column: &mut Column) -> usize {
    if !column.has_missing() {
        return 0;
    }
    let Some(fill) = stats::mode(&column.cells) else {
        return 0;
    };
    debug!("Column '{}': imputing mode value {}", column.name, fill);
    fill_missing(column, &fill)
}

fn fill_missing(column: &mut Column, fill: &Value) -> usize {
    let mut imputed = 0usize;
    for cell in column.cells.iter_mut().filter(|cell| cell.is_none()) {
        *cell = Some(fill.clone());
        imputed += 1;
    }
    imputed
}

/// The most frequent value of every column, in column order.
pub fn mode_row(dataset: &TabularDataset) -> Vec<Option<Value>> {
    dataset
        .columns()
        .iter()
        .map(|column| stats::mode(&column.cells))
        .collect()
}

/// Fills each missing cell from the same position of `reference`.
pub fn fill_from_row(dataset: &mut TabularDataset, reference: &[Option<Value>]) -> usize {
    let mut imputed = 0usize;
    for (column, fill) in dataset.columns_mut().iter_mut().zip(reference) {
        if let Some(fill) = fill {
            imputed += fill_missing(column, fill);
        }
    }
    imputed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(values: &[Option<&str>]) -> Vec<Option<Value>> {
        values
            .iter()
            .map(|v| v.map(|s| Value::String(s.to_string())))
            .collect()
    }

    fn dataset(columns: Vec<(&str, Vec<Option<Value>>)>) -> TabularDataset {
        TabularDataset::new(
            columns
                .into_iter()
                .map(|(name, cells)| Column::new(name, cells))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn median_fill_keeps_integers_when_statistic_is_integral() {
        let mut column = Column::new("n", text(&[Some("10"), None, Some("30")]));
        coerce_numeric(&mut column);
        assert_eq!(fill_numeric(&mut column, NumericFill::Median), 1);
        assert_eq!(
            column.cells,
            vec![
                Some(Value::Integer(10)),
                Some(Value::Integer(20)),
                Some(Value::Integer(30))
            ]
        );
    }

    #[test]
    fn mean_and_median_diverge_on_skewed_columns() {
        let raw = text(&[Some("1"), None, Some("1"), Some("100")]);
        let mut by_mean = Column::new("n", raw.clone());
        let mut by_median = Column::new("n", raw);
        coerce_numeric(&mut by_mean);
        coerce_numeric(&mut by_median);
        fill_numeric(&mut by_mean, NumericFill::Mean);
        fill_numeric(&mut by_median, NumericFill::Median);
        assert_eq!(by_mean.cells[1], Some(Value::Integer(34)));
        assert_eq!(by_median.cells[1], Some(Value::Integer(1)));
    }

    #[test]
    fn fractional_statistic_promotes_column_to_float() {
        let mut column = Column::new("n", text(&[Some("1"), None, Some("2")]));
        coerce_numeric(&mut column);
        fill_numeric(&mut column, NumericFill::Median);
        assert_eq!(
            column.cells,
            vec![
                Some(Value::Float(1.0)),
                Some(Value::Float(1.5)),
                Some(Value::Float(2.0))
            ]
        );
    }

    #[test]
    fn currency_strings_become_floats() {
        let mut column = Column::new("price", text(&[Some("$1,234.50"), Some("oops"), None]));
        assert_eq!(coerce_currency(&mut column), 1);
        assert_eq!(column.cells, vec![Some(Value::Float(1234.50)), None, None]);
    }

    #[test]
    fn unparseable_dates_become_unknown() {
        let mut column = Column::new("d", text(&[Some("1/15/2020"), Some("someday")]));
        assert_eq!(parse_dates(&mut column), 1);
        assert!(matches!(column.cells[0], Some(Value::Date(_))));
        assert_eq!(column.cells[1], None);
    }

    #[test]
    fn stores_only_impute_area() {
        let raw = dataset(vec![
            ("StoreKey", text(&[Some("1"), Some("2"), Some("3")])),
            ("State", text(&[Some("Ohio"), None, Some("Utah")])),
            (STORE_AREA_COLUMN, text(&[Some("100"), None, Some("300")])),
            ("Open Date", text(&[Some("1/1/2010"), Some("bad"), Some("3/5/2012")])),
        ]);
        let cleaned = clean(DataSource::Stores, &raw).unwrap();
        assert_eq!(
            cleaned.column(STORE_AREA_COLUMN).unwrap().cells[1],
            Some(Value::Integer(200))
        );
        assert_eq!(cleaned.column("State").unwrap().cells[1], None);
        assert_eq!(cleaned.column("Open Date").unwrap().cells[1], None);
        assert_eq!(raw.column(STORE_AREA_COLUMN).unwrap().cells[1], None);
    }

    #[test]
    fn column_wise_fill_leaves_no_gaps_outside_dates() {
        let raw = dataset(vec![
            ("Order Number", text(&[Some("1"), Some("2"), Some("3")])),
            ("Currency Code", text(&[Some("USD"), None, Some("USD")])),
            ("Quantity", text(&[Some("1"), Some("5"), None])),
            ("Order Date", text(&[Some("1/1/2016"), None, Some("garbage")])),
        ]);
        let cleaned = clean(DataSource::Sales, &raw).unwrap();
        assert_eq!(
            cleaned.column("Currency Code").unwrap().cells[1],
            Some(Value::String("USD".into()))
        );
        assert_eq!(cleaned.column("Quantity").unwrap().cells[2], Some(Value::Integer(3)));
        let dates = &cleaned.column("Order Date").unwrap().cells;
        assert!(matches!(dates[1], Some(Value::Date(_))));
        assert_eq!(dates[2], None);
    }

    #[test]
    fn customers_fill_numbers_with_mean_then_mode_row() {
        let raw = dataset(vec![
            ("CustomerKey", text(&[Some("1"), Some("2"), Some("3"), Some("4")])),
            ("Age", text(&[Some("1"), None, Some("1"), Some("100")])),
            ("Gender", text(&[Some("Female"), Some("Male"), None, Some("Male")])),
            ("Birthday", text(&[Some("7/3/1939"), None, Some("7/3/1939"), Some("not a date")])),
        ]);
        let cleaned = clean(DataSource::Customers, &raw).unwrap();
        assert_eq!(cleaned.column("Age").unwrap().cells[1], Some(Value::Integer(34)));
        assert_eq!(
            cleaned.column("Gender").unwrap().cells[2],
            Some(Value::String("Male".into()))
        );
        let birthdays = &cleaned.column("Birthday").unwrap().cells;
        assert_eq!(birthdays[1], birthdays[0]);
        assert_eq!(birthdays[3], None);
    }

    #[test]
    fn entirely_missing_column_fails_the_source() {
        let raw = dataset(vec![
            ("Currency", text(&[Some("EUR"), Some("GBP")])),
            ("Exchange", text(&[None, None])),
        ]);
        let err = clean(DataSource::ExchangeRates, &raw).unwrap_err();
        assert!(matches!(err, SourceError::EmptyColumn { ref column, .. } if column == "Exchange"));
    }

    #[test]
    fn entirely_missing_date_column_stays_unknown() {
        let raw = dataset(vec![
            ("Order Number", text(&[Some("1"), Some("2")])),
            ("Order Date", text(&[None, None])),
        ]);
        let cleaned = clean(DataSource::Sales, &raw).unwrap();
        assert_eq!(cleaned.column("Order Date").unwrap().cells, vec![None, None]);
    }
}
