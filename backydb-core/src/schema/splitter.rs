//! Splits a dump into individual statements, tolerating the `DELIMITER`
//! convention dump tools use around routines/triggers/events whose bodies
//! contain the default `;` terminator (spec §4.4).

/// Split `sql` into statements. A line of the exact form `DELIMITER <tok>`
/// switches the active terminator until the next such line; this lets a
/// `CREATE PROCEDURE ... BEGIN ... ; ... END` body survive intact inside a
/// `DELIMITER $$` block while the default `;` splitting still applies
/// everywhere else. Quoted strings (`'...'`, `"..."`) and `--` line
/// comments are skipped so a `;` inside either doesn't split early.
pub fn split_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut delimiter = ";".to_string();
    let mut current = String::new();

    for line in sql.lines() {
        if let Some(rest) = line.trim().strip_prefix("DELIMITER ") {
            if !current.trim().is_empty() {
                statements.push(current.trim().to_string());
                current.clear();
            }
            delimiter = rest.trim().to_string();
            continue;
        }

        current.push_str(line);
        current.push('\n');

        while let Some(pos) = find_unquoted(&current, &delimiter) {
            let statement = current[..pos].trim().to_string();
            if !statement.is_empty() {
                statements.push(statement);
            }
            current = current[pos + delimiter.len()..].to_string();
        }
    }

    if !current.trim().is_empty() {
        statements.push(current.trim().to_string());
    }
    statements
}

fn find_unquoted(haystack: &str, needle: &str) -> Option<usize> {
    let bytes = haystack.as_bytes();
    let mut in_single = false;
    let mut in_double = false;
    let mut in_comment = false;
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i] as char;
        if in_comment {
            if c == '\n' {
                in_comment = false;
            }
            i += 1;
            continue;
        }
        if in_single {
            if c == '\'' && bytes.get(i + 1) != Some(&b'\'') {
                in_single = false;
            } else if c == '\'' {
                i += 1;
            }
            i += 1;
            continue;
        }
        if in_double {
            if c == '"' {
                in_double = false;
            }
            i += 1;
            continue;
        }
        if c == '\'' {
            in_single = true;
            i += 1;
            continue;
        }
        if c == '"' {
            in_double = true;
            i += 1;
            continue;
        }
        if haystack[i..].starts_with("--") {
            in_comment = true;
            i += 2;
            continue;
        }
        if haystack[i..].starts_with(needle) {
            return Some(i);
        }
        i += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_semicolons() {
        let sql = "CREATE TABLE t (id INT);\nINSERT INTO t VALUES (1);";
        let statements = split_statements(sql);
        assert_eq!(statements, vec!["CREATE TABLE t (id INT)", "INSERT INTO t VALUES (1)"]);
    }

    #[test]
    fn semicolon_inside_string_literal_does_not_split() {
        let sql = "INSERT INTO t VALUES ('a;b');";
        let statements = split_statements(sql);
        assert_eq!(statements, vec!["INSERT INTO t VALUES ('a;b')"]);
    }

    #[test]
    fn delimiter_block_protects_routine_body() {
        let sql = "DELIMITER $$\nCREATE PROCEDURE p() BEGIN\nSELECT 1;\nSELECT 2;\nEND$$\nDELIMITER ;\nSELECT 3;";
        let statements = split_statements(sql);
        assert_eq!(statements.len(), 2);
        assert!(statements[0].contains("SELECT 1;"));
        assert!(statements[0].contains("SELECT 2;"));
        assert_eq!(statements[1], "SELECT 3");
    }
}
