//! Migration classification: schema operation and destructive-op capture.
//!
//! Migrations are scanned line-by-line with a fixed pattern set; the AST is
//! not needed here because the schema-builder calls are syntactically rigid.

use regex::Regex;
use tracing::trace;

use crate::types::{DestructiveOp, Migration, MigrationOperation};

/// Line-oriented schema pattern matcher, compiled once.
pub struct MigrationScanner {
    create_table: Regex,
    alter_table: Regex,
    drop_table: Regex,
    drop_column: Regex,
    drop_columns: Regex,
    rename_table: Regex,
    rename_column: Regex,
}

impl Default for MigrationScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl MigrationScanner {
    pub fn new() -> Self {
        Self {
            create_table: Regex::new(r#"(?i)Schema::create\s*\(\s*['"](\w+)['"]"#).unwrap(),
            alter_table: Regex::new(r#"(?i)Schema::table\s*\(\s*['"](\w+)['"]"#).unwrap(),
            drop_table: Regex::new(r#"(?i)Schema::drop(?:IfExists)?\s*\(\s*['"](\w+)['"]"#)
                .unwrap(),
            // Covers both `$table->dropColumn('col')` and the two-argument
            // `Schema::dropColumn('table', 'col')` form.
            drop_column: Regex::new(
                r#"(?i)(?:Schema::|\$table->)\s*dropColumn\s*\(\s*['"](\w+)['"](?:\s*,\s*['"](\w+)['"])?"#,
            )
            .unwrap(),
            drop_columns: Regex::new(r#"(?i)\$table->dropColumn\s*\(\s*\[([^\]]+)\]"#).unwrap(),
            rename_table: Regex::new(r#"(?i)Schema::rename\s*\("#).unwrap(),
            rename_column: Regex::new(r#"(?i)\$table->renameColumn\s*\("#).unwrap(),
        }
    }

    /// Scans a migration file and classifies its dominant operation.
    ///
    /// Operation precedence (pinned): any table drop wins, then a create,
    /// then rename-only files, everything else is an alter.
    pub fn scan(&self, path: &str, content: &str) -> Migration {
        let mut destructive = Vec::new();
        let mut table_name = None;
        let mut has_create = false;
        let mut has_drop_table = false;

        for (idx, line) in content.lines().enumerate() {
            let line_no = idx as u32 + 1;

            if let Some(caps) = self.create_table.captures(line) {
                has_create = true;
                if table_name.is_none() {
                    table_name = Some(caps[1].to_string());
                }
            }
            if let Some(caps) = self.alter_table.captures(line) {
                if table_name.is_none() {
                    table_name = Some(caps[1].to_string());
                }
            }
            if let Some(caps) = self.drop_table.captures(line) {
                has_drop_table = true;
                if table_name.is_none() {
                    table_name = Some(caps[1].to_string());
                }
                destructive.push(DestructiveOp {
                    op: "DROP TABLE".to_string(),
                    target: Some(caps[1].to_string()),
                    line: line_no,
                });
            }
            if let Some(caps) = self.drop_columns.captures(line) {
                destructive.push(DestructiveOp {
                    op: "DROP COLUMNS".to_string(),
                    target: Some(caps[1].trim().to_string()),
                    line: line_no,
                });
            } else if let Some(caps) = self.drop_column.captures(line) {
                let target = caps
                    .get(2)
                    .or_else(|| caps.get(1))
                    .map(|m| m.as_str().to_string());
                destructive.push(DestructiveOp {
                    op: "DROP COLUMN".to_string(),
                    target,
                    line: line_no,
                });
            }
            if self.rename_table.is_match(line) {
                destructive.push(DestructiveOp {
                    op: "RENAME TABLE".to_string(),
                    target: None,
                    line: line_no,
                });
            }
            if self.rename_column.is_match(line) {
                destructive.push(DestructiveOp {
                    op: "RENAME COLUMN".to_string(),
                    target: None,
                    line: line_no,
                });
            }
        }

        let rename_only =
            !destructive.is_empty() && destructive.iter().all(|d| d.op.starts_with("RENAME"));
        let operation = if has_drop_table {
            MigrationOperation::Drop
        } else if has_create {
            MigrationOperation::Create
        } else if rename_only {
            MigrationOperation::Rename
        } else {
            MigrationOperation::Alter
        };

        trace!(
            file = path,
            ?operation,
            destructive = destructive.len(),
            "migration scanned"
        );

        Migration {
            file_path: path.to_string(),
            table_name,
            operation,
            is_destructive: !destructive.is_empty(),
            destructive_operations: destructive,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(content: &str) -> Migration {
        MigrationScanner::new().scan("database/migrations/2024_01_15_test.php", content)
    }

    #[test]
    fn create_table_is_not_destructive() {
        let m = scan(
            "<?php\nSchema::create('users', function (Blueprint $table) {\n    $table->id();\n});\n",
        );
        assert_eq!(m.operation, MigrationOperation::Create);
        assert_eq!(m.table_name.as_deref(), Some("users"));
        assert!(!m.is_destructive);
        assert!(m.destructive_operations.is_empty());
    }

    #[test]
    fn drop_table_dominates_create() {
        let m = scan("<?php\nSchema::create('tmp', fn ($t) => $t->id());\nSchema::dropIfExists('legacy');\n");
        assert_eq!(m.operation, MigrationOperation::Drop);
        let op = &m.destructive_operations[0];
        assert_eq!(op.op, "DROP TABLE");
        assert_eq!(op.target.as_deref(), Some("legacy"));
        assert_eq!(op.line, 3);
    }

    #[test]
    fn drop_column_in_alter_block() {
        let m = scan(
            "<?php\nSchema::table('orders', function (Blueprint $table) {\n    $table->dropColumn('legacy_id');\n});\n",
        );
        assert_eq!(m.operation, MigrationOperation::Alter);
        assert!(m.is_destructive);
        assert_eq!(m.destructive_operations[0].op, "DROP COLUMN");
        assert_eq!(
            m.destructive_operations[0].target.as_deref(),
            Some("legacy_id")
        );
    }

    #[test]
    fn schema_drop_column_two_argument_form() {
        let m = scan("<?php\nSchema::dropColumn('orders', 'legacy_id');\n");
        assert_eq!(m.destructive_operations[0].op, "DROP COLUMN");
        assert_eq!(
            m.destructive_operations[0].target.as_deref(),
            Some("legacy_id")
        );
    }

    #[test]
    fn drop_column_array_form() {
        let m = scan("<?php\n$table->dropColumn(['a', 'b']);\n");
        assert_eq!(m.destructive_operations[0].op, "DROP COLUMNS");
        assert_eq!(m.destructive_operations[0].target.as_deref(), Some("'a', 'b'"));
    }

    #[test]
    fn rename_only_is_classified_rename() {
        let m = scan(
            "<?php\nSchema::rename('old_users', 'users');\n",
        );
        assert_eq!(m.operation, MigrationOperation::Rename);
        assert!(m.is_destructive);
    }

    #[test]
    fn rename_column_inside_table_block_is_rename_only() {
        let m = scan(
            "<?php\nSchema::table('users', function (Blueprint $table) {\n    $table->renameColumn('name', 'full_name');\n});\n",
        );
        assert_eq!(m.operation, MigrationOperation::Rename);
    }

    #[test]
    fn plain_alter_without_destructive_ops() {
        let m = scan(
            "<?php\nSchema::table('users', function (Blueprint $table) {\n    $table->string('phone')->nullable();\n});\n",
        );
        assert_eq!(m.operation, MigrationOperation::Alter);
        assert!(!m.is_destructive);
    }
}
