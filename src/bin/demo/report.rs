use std::io::{self, Write};

use mysql_scoped::{
    MysqlScopedError, NativePreparedStatement, ResultSet, RowValues, StatementSource,
    execute_prepared_query, make_prepared_statement,
};
use tracing::info;

pub(crate) const SELECT_BY_ID: &str = "SELECT * FROM test WHERE id = ?";
pub(crate) const INSERT_NAME: &str =
    "INSERT INTO test (name, created_at, updated_at) VALUES (?, NOW(), NOW());";

/// Prepared select by id, printed as a `|`-separated table.
pub(crate) fn select_by_id<S, W>(conn: &S, id: i64, out: &mut W) -> Result<(), MysqlScopedError>
where
    S: StatementSource + ?Sized,
    W: Write,
{
    let mut statement = make_prepared_statement(conn, SELECT_BY_ID)?;
    statement.set_parameter(1, RowValues::Int(id))?;
    let mut rows = execute_prepared_query(&mut statement)?;
    info!(id, rows = rows.rows_count(), "select finished");
    write_table(&mut rows, out).map_err(|e| MysqlScopedError::Other(format!("write failed: {e}")))
}

/// Prepared insert of one name; returns affected rows.
pub(crate) fn insert_name<S>(conn: &S, name: &str) -> Result<usize, MysqlScopedError>
where
    S: StatementSource + ?Sized,
{
    let mut statement = make_prepared_statement(conn, INSERT_NAME)?;
    statement.set_parameter(1, RowValues::Text(name.to_string()))?;
    let affected = statement.execute()?;
    info!(name, affected, "insert finished");
    Ok(affected)
}

pub(crate) fn write_table<W: Write>(rows: &mut ResultSet, out: &mut W) -> io::Result<()> {
    if rows.rows_count() == 0 {
        writeln!(out, "Empty query")?;
    }

    for column in 1..=rows.column_count() {
        write!(out, "|\t{}", rows.column_label(column).unwrap_or_default())?;
    }
    writeln!(out)?;

    while rows.next() {
        for column in 1..=rows.column_count() {
            write!(out, "|\t{}", rows.get_string_at(column).unwrap_or_default())?;
        }
        writeln!(out)?;
    }
    Ok(())
}
