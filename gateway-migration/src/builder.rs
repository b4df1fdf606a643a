//! # Builder Module
//!
//! Accumulates column fragments, table-level constraints and index
//! statements, then emits the final `CREATE TABLE` / `ALTER TABLE ... ADD
//! COLUMN` statement followed by its index statements.
//!
//! Output order always follows declaration order so that generating the same
//! migration twice yields byte-identical SQL.

use crate::error::{Error, Result};

/// The rendered pieces of a single column: name, native type and inline
/// constraint fragments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnFragment {
    pub name: String,
    pub ty: String,
    pub constraints: Vec<String>,
    /// Keyword rendered right after `PRIMARY KEY`, whatever order the
    /// constraints were declared in (SQLite's `AUTOINCREMENT`).
    pub primary_key_suffix: Option<&'static str>,
}

impl ColumnFragment {
    pub fn add_constraint(&mut self, fragment: impl Into<String>) {
        self.constraints.push(fragment.into());
    }

    /// Replaces the rendered type, for dialects that realize a constraint
    /// through the column type (serial types, SQLite row-id aliases).
    pub fn set_type(&mut self, ty: impl Into<String>) {
        self.ty = ty.into();
    }

    pub fn has_constraint(&self, fragment: &str) -> bool {
        self.constraints.iter().any(|c| c == fragment)
    }

    pub fn render(&self) -> String {
        let mut def = format!("{} {}", self.name, self.ty);
        for constraint in &self.constraints {
            def.push(' ');
            def.push_str(constraint);
            if let Some(suffix) = self.primary_key_suffix.filter(|_| constraint == "PRIMARY KEY") {
                def.push(' ');
                def.push_str(suffix);
            }
        }
        def
    }
}

/// Statement builder for one table.
#[derive(Debug, Clone)]
pub struct TableBuilder {
    table: String,
    columns: Vec<ColumnFragment>,
    table_constraints: Vec<String>,
    indexes: Vec<String>,
}

impl TableBuilder {
    pub fn new(table: impl Into<String>) -> Self {
        Self { table: table.into(), columns: Vec::new(), table_constraints: Vec::new(), indexes: Vec::new() }
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    /// Starts a new column. Column names must be unique within the table.
    pub fn add_column(&mut self, name: &str, ty: String) -> Result<&mut ColumnFragment> {
        if self.columns.iter().any(|c| c.name == name) {
            return Err(Error::InvalidDefinition(format!(
                "column '{}' is declared twice in table '{}'",
                name, self.table
            )));
        }

        self.columns.push(ColumnFragment {
            name: name.to_string(),
            ty,
            constraints: Vec::new(),
            primary_key_suffix: None,
        });
        self.current_column()
    }

    /// The column currently receiving constraints.
    pub fn current_column(&mut self) -> Result<&mut ColumnFragment> {
        let table = &self.table;
        self.columns
            .last_mut()
            .ok_or_else(|| Error::InvalidDefinition(format!("no column declared yet in table '{}'", table)))
    }

    pub fn add_table_constraint(&mut self, fragment: impl Into<String>) {
        self.table_constraints.push(fragment.into());
    }

    pub fn add_index(&mut self, statement: impl Into<String>) {
        self.indexes.push(statement.into());
    }

    /// Registers a deterministically named unique index over `cols`.
    pub fn add_unique_index(&mut self, cols: &[String]) {
        let name = unique_index_name(&self.table, cols);
        let statement = format!("CREATE UNIQUE INDEX {} ON {} ({})", name, self.table, cols.join(", "));
        self.add_index(statement);
    }

    /// `CREATE TABLE` followed by the index statements.
    pub fn create_table(self) -> Result<Vec<String>> {
        if self.columns.is_empty() {
            return Err(Error::InvalidDefinition(format!("table '{}' has no columns", self.table)));
        }

        let mut defs: Vec<String> = self.columns.iter().map(ColumnFragment::render).collect();
        defs.extend(self.table_constraints);

        let mut statements = Vec::with_capacity(1 + self.indexes.len());
        statements.push(format!("CREATE TABLE {} ({})", self.table, defs.join(", ")));
        statements.extend(self.indexes);
        Ok(statements)
    }

    /// `ALTER TABLE ... ADD COLUMN` for the single declared column, followed
    /// by its index statements.
    pub fn add_column_statements(self) -> Result<Vec<String>> {
        let [column] = self.columns.as_slice() else {
            return Err(Error::InvalidDefinition(format!(
                "expected exactly one column to add to table '{}', got {}",
                self.table,
                self.columns.len()
            )));
        };

        if !self.table_constraints.is_empty() {
            return Err(Error::InvalidDefinition(format!(
                "table constraints cannot be added with a column on table '{}'",
                self.table
            )));
        }

        let mut statements = Vec::with_capacity(1 + self.indexes.len());
        statements.push(format!("ALTER TABLE {} ADD COLUMN {}", self.table, column.render()));
        statements.extend(self.indexes);
        Ok(statements)
    }
}

/// Name of the unique index covering `cols` on `table`.
pub fn unique_index_name(table: &str, cols: &[String]) -> String {
    format!("UQE_{}_{}", table, cols.join("_"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_table_keeps_declaration_order() {
        let mut builder = TableBuilder::new("users");
        builder.add_column("id", "INTEGER".to_string()).unwrap().add_constraint("PRIMARY KEY");
        builder.add_column("name", "TEXT".to_string()).unwrap().add_constraint("NOT NULL");
        builder.add_column("email", "TEXT".to_string()).unwrap();
        builder.add_unique_index(&["email".to_string()]);

        let statements = builder.create_table().unwrap();
        assert_eq!(
            statements,
            vec![
                "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL, email TEXT)".to_string(),
                "CREATE UNIQUE INDEX UQE_users_email ON users (email)".to_string(),
            ]
        );
    }

    #[test]
    fn table_constraints_follow_columns() {
        let mut builder = TableBuilder::new("rule_access");
        builder.add_column("rule_id", "BIGINT".to_string()).unwrap();
        builder.add_column("object_id", "BIGINT".to_string()).unwrap();
        builder.add_table_constraint("PRIMARY KEY (rule_id, object_id)");

        let statements = builder.create_table().unwrap();
        assert_eq!(
            statements[0],
            "CREATE TABLE rule_access (rule_id BIGINT, object_id BIGINT, PRIMARY KEY (rule_id, object_id))"
        );
    }

    #[test]
    fn duplicate_column_is_rejected() {
        let mut builder = TableBuilder::new("t");
        builder.add_column("a", "TEXT".to_string()).unwrap();
        let err = builder.add_column("a", "TEXT".to_string()).unwrap_err();
        assert!(matches!(err, Error::InvalidDefinition(_)));
    }

    #[test]
    fn empty_table_is_rejected() {
        let err = TableBuilder::new("t").create_table().unwrap_err();
        assert!(matches!(err, Error::InvalidDefinition(_)));
    }

    #[test]
    fn add_column_statement() {
        let mut builder = TableBuilder::new("t");
        builder.add_column("flag", "BOOL".to_string()).unwrap().add_constraint("NOT NULL");
        assert_eq!(builder.add_column_statements().unwrap(), vec!["ALTER TABLE t ADD COLUMN flag BOOL NOT NULL"]);
    }
}
