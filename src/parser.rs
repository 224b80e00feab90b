//! Line parser for delimited dialogue scripts.

/// One parsed script line, split into its fields.
pub type Row = Vec<String>;

/// Splits `input` into lines, then each line on `delimiter`.
///
/// No quoting or escaping is recognised. Lines without the delimiter become
/// single-field rows; empty input yields no rows.
pub fn parse_rows(input: &str, delimiter: char) -> Vec<Row> {
    input
        .lines()
        .map(|line| line.split(delimiter).map(str::to_string).collect())
        .collect()
}
