//! An in-memory reference [`DatabaseAdapter`] used by the test suite and as
//! a worked example of the trait contract (spec §1 "Out of scope: ...
//! concrete dump/restore syntax for specific engines beyond the generic
//! object-category contract").

use std::collections::{BTreeMap, BTreeSet};

use super::adapter::DatabaseAdapter;
use crate::error::BackyError;
use crate::job::ObjectCategory;

#[derive(Clone, Debug)]
pub struct TableSeed {
    pub name: String,
    pub ddl: String,
    pub depends_on: Vec<String>,
    pub rows: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct ViewSeed {
    pub name: String,
    pub ddl: String,
    pub depends_on: Vec<String>,
}

/// A fixture database: tables, views, and stub functions/procedures/
/// triggers/events, tracked as they're created/dropped via `apply_statement`.
pub struct MockAdapter {
    engine_type: String,
    engine_version: String,
    tables: Vec<TableSeed>,
    views: Vec<ViewSeed>,
    routines: BTreeMap<ObjectCategory, Vec<String>>,

    existing: BTreeSet<String>,
    row_counts: BTreeMap<String, usize>,
    applied: Vec<String>,
}

impl MockAdapter {
    pub fn empty(engine_type: impl Into<String>, engine_version: impl Into<String>) -> Self {
        Self {
            engine_type: engine_type.into(),
            engine_version: engine_version.into(),
            tables: Vec::new(),
            views: Vec::new(),
            routines: BTreeMap::new(),
            existing: BTreeSet::new(),
            row_counts: BTreeMap::new(),
            applied: Vec::new(),
        }
    }

    /// The seed fixture used across spec §8's end-to-end scenarios:
    /// `departments`, `employees`, `projects`, 3 rows each, plus a view
    /// chain and one stub of each routine category.
    pub fn seed() -> Self {
        let mut adapter = Self::empty("mysql", "8.0.34");
        adapter.tables = vec![
            TableSeed {
                name: "departments".into(),
                ddl: "CREATE TABLE departments (id INT PRIMARY KEY, name TEXT)".into(),
                depends_on: vec![],
                rows: (1..=3).map(|i| format!("INSERT INTO departments (id, name) VALUES ({i}, 'dept{i}')")).collect(),
            },
            TableSeed {
                name: "employees".into(),
                ddl: "CREATE TABLE employees (id INT PRIMARY KEY, department_id INT REFERENCES departments(id))".into(),
                depends_on: vec!["departments".into()],
                rows: (1..=3).map(|i| format!("INSERT INTO employees (id, department_id) VALUES ({i}, {i})")).collect(),
            },
            TableSeed {
                name: "projects".into(),
                ddl: "CREATE TABLE projects (id INT PRIMARY KEY, lead_id INT REFERENCES employees(id))".into(),
                depends_on: vec!["employees".into()],
                rows: (1..=3).map(|i| format!("INSERT INTO projects (id, lead_id) VALUES ({i}, {i})")).collect(),
            },
        ];
        adapter.views = vec![
            ViewSeed {
                name: "view_employee_departments".into(),
                ddl: "CREATE VIEW view_employee_departments AS SELECT * FROM employees JOIN departments".into(),
                depends_on: vec!["employees".into(), "departments".into()],
            },
            ViewSeed {
                name: "view_project_employees".into(),
                ddl: "CREATE VIEW view_project_employees AS SELECT * FROM projects JOIN view_employee_departments"
                    .into(),
                depends_on: vec!["projects".into(), "view_employee_departments".into()],
            },
        ];
        adapter.routines.insert(ObjectCategory::Functions, vec!["CREATE FUNCTION fn_noop() RETURNS INT RETURN 0".into()]);
        adapter.routines.insert(
            ObjectCategory::Procedures,
            vec!["CREATE PROCEDURE proc_noop() BEGIN SELECT 1; END".into()],
        );
        adapter
            .routines
            .insert(ObjectCategory::Triggers, vec!["CREATE TRIGGER trg_noop BEFORE INSERT ON employees FOR EACH ROW BEGIN END".into()]);
        adapter
            .routines
            .insert(ObjectCategory::Events, vec!["CREATE EVENT evt_noop ON SCHEDULE EVERY 1 DAY DO BEGIN END".into()]);
        adapter
    }

    pub fn row_count(&self, table: &str) -> usize {
        *self.row_counts.get(table).unwrap_or(&0)
    }

    pub fn applied(&self) -> &[String] {
        &self.applied
    }

    pub fn table_exists(&self, name: &str) -> bool {
        self.existing.contains(name)
    }

    fn referenced_names(statement: &str) -> Vec<String> {
        let mut names = Vec::new();
        let tokens: Vec<&str> = statement.split_whitespace().collect();
        for (i, token) in tokens.iter().enumerate() {
            let upper = token.to_uppercase();
            if (upper == "FROM" || upper == "JOIN" || upper == "ON") && i + 1 < tokens.len() {
                names.push(tokens[i + 1].trim_matches(|c: char| !c.is_alphanumeric() && c != '_').to_string());
            }
            if upper.starts_with("REFERENCES") {
                if let Some(start) = token.find('(') {
                    let name = &token["REFERENCES".len()..start.min(token.len())];
                    names.push(name.trim_start_matches('(').trim().to_string());
                } else if i + 1 < tokens.len() {
                    continue;
                }
            }
        }
        names.into_iter().filter(|n| !n.is_empty()).collect()
    }
}

impl DatabaseAdapter for MockAdapter {
    fn engine_type(&self) -> &str {
        &self.engine_type
    }

    fn engine_version(&self) -> &str {
        &self.engine_version
    }

    fn extract_category(&self, category: ObjectCategory) -> Result<Vec<String>, BackyError> {
        match category {
            ObjectCategory::Tables => Ok(topo_sort_tables(&self.tables)?.into_iter().map(|t| format!("{};", t.ddl)).collect()),
            ObjectCategory::Data => Ok(topo_sort_tables(&self.tables)?
                .into_iter()
                .flat_map(|t| t.rows.into_iter().map(|r| format!("{r};")))
                .collect()),
            ObjectCategory::Views => Ok(topo_sort_views(&self.views)?.into_iter().map(|v| format!("{};", v.ddl)).collect()),
            other => Ok(self.routines.get(&other).cloned().unwrap_or_default().into_iter().map(|s| format!("{s};")).collect()),
        }
    }

    fn apply_statement(&mut self, statement: &str) -> Result<(), BackyError> {
        self.applied.push(statement.to_string());
        let upper = statement.to_uppercase();
        let words: Vec<&str> = statement.split_whitespace().collect();

        if upper.starts_with("CREATE TABLE") || upper.starts_with("CREATE VIEW") {
            let name = words.get(2).copied().unwrap_or_default().to_string();
            for referenced in Self::referenced_names(statement) {
                if referenced != name && !self.existing.contains(&referenced) {
                    return Err(BackyError::SyntaxError {
                        line: 0,
                        col: 0,
                        statement: statement.to_string(),
                    });
                }
            }
            self.existing.insert(name);
            Ok(())
        } else if upper.starts_with("CREATE FUNCTION")
            || upper.starts_with("CREATE PROCEDURE")
            || upper.starts_with("CREATE TRIGGER")
            || upper.starts_with("CREATE EVENT")
        {
            let name = words.get(2).copied().unwrap_or_default().to_string();
            self.existing.insert(name);
            Ok(())
        } else if upper.starts_with("DROP") {
            if let Some(name) = words.last() {
                self.existing.remove(*name);
            }
            Ok(())
        } else if upper.starts_with("INSERT INTO") {
            let table = words.get(2).copied().unwrap_or_default();
            if !self.existing.contains(table) {
                return Err(BackyError::ConstraintViolation {
                    object: table.to_string(),
                    reason: "table does not exist".into(),
                });
            }
            *self.row_counts.entry(table.to_string()).or_insert(0) += 1;
            Ok(())
        } else {
            Ok(())
        }
    }
}

/// Orders tables so that a table referenced via FK (`depends_on`) is
/// emitted before the table that references it (spec §4.4: "tables are
/// ordered by foreign-key topology (referenced before referencing)").
fn topo_sort_tables(tables: &[TableSeed]) -> Result<Vec<TableSeed>, BackyError> {
    let mut sorted = Vec::with_capacity(tables.len());
    let mut visited = BTreeSet::new();
    let mut in_progress = BTreeSet::new();
    let by_name: BTreeMap<&str, &TableSeed> = tables.iter().map(|t| (t.name.as_str(), t)).collect();

    fn visit<'a>(
        name: &'a str,
        by_name: &BTreeMap<&'a str, &'a TableSeed>,
        visited: &mut BTreeSet<String>,
        in_progress: &mut BTreeSet<String>,
        sorted: &mut Vec<TableSeed>,
    ) -> Result<(), BackyError> {
        if visited.contains(name) {
            return Ok(());
        }
        let Some(table) = by_name.get(name) else { return Ok(()) };
        if !in_progress.insert(name.to_string()) {
            return Err(BackyError::Internal(format!("cyclic foreign-key dependency detected at {name}")));
        }
        for dep in &table.depends_on {
            if by_name.contains_key(dep.as_str()) {
                visit(dep, by_name, visited, in_progress, sorted)?;
            }
        }
        in_progress.remove(name);
        visited.insert(name.to_string());
        sorted.push((*table).clone());
        Ok(())
    }

    for table in tables {
        visit(&table.name, &by_name, &mut visited, &mut in_progress, &mut sorted)?;
    }
    Ok(sorted)
}

fn topo_sort_views(views: &[ViewSeed]) -> Result<Vec<ViewSeed>, BackyError> {
    let mut sorted = Vec::with_capacity(views.len());
    let mut visited = BTreeSet::new();
    let mut in_progress = BTreeSet::new();
    let by_name: BTreeMap<&str, &ViewSeed> = views.iter().map(|v| (v.name.as_str(), v)).collect();

    fn visit<'a>(
        name: &'a str,
        by_name: &BTreeMap<&'a str, &'a ViewSeed>,
        visited: &mut BTreeSet<String>,
        in_progress: &mut BTreeSet<String>,
        sorted: &mut Vec<ViewSeed>,
    ) -> Result<(), BackyError> {
        if visited.contains(name) {
            return Ok(());
        }
        let Some(view) = by_name.get(name) else { return Ok(()) };
        if !in_progress.insert(name.to_string()) {
            return Err(BackyError::Internal(format!("cyclic view dependency detected at {name}")));
        }
        for dep in &view.depends_on {
            if by_name.contains_key(dep.as_str()) {
                visit(dep, by_name, visited, in_progress, sorted)?;
            }
        }
        in_progress.remove(name);
        visited.insert(name.to_string());
        sorted.push((*view).clone());
        Ok(())
    }

    for view in views {
        visit(&view.name, &by_name, &mut visited, &mut in_progress, &mut sorted)?;
    }
    Ok(sorted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_tables_then_data_round_trips_into_apply() {
        let seed = MockAdapter::seed();
        let mut target = MockAdapter::empty("mysql", "8.0.34");

        for statement in seed.extract_category(ObjectCategory::Tables).unwrap() {
            target.apply_statement(statement.trim_end_matches(';')).unwrap();
        }
        for statement in seed.extract_category(ObjectCategory::Data).unwrap() {
            target.apply_statement(statement.trim_end_matches(';')).unwrap();
        }

        assert_eq!(target.row_count("departments"), 3);
        assert_eq!(target.row_count("employees"), 3);
        assert_eq!(target.row_count("projects"), 3);
    }

    #[test]
    fn views_extract_in_dependency_order() {
        let seed = MockAdapter::seed();
        let statements = seed.extract_category(ObjectCategory::Views).unwrap();
        let first_pos = statements[0].find("view_employee_departments").unwrap();
        let second = statements.iter().find(|s| s.contains("view_project_employees")).unwrap();
        assert!(first_pos == 0 || statements.iter().position(|s| s.contains("view_employee_departments")).unwrap()
            < statements.iter().position(|s| s == second).unwrap());
    }

    #[test]
    fn applying_view_before_its_dependency_is_a_syntax_error() {
        let mut adapter = MockAdapter::empty("mysql", "8.0.34");
        let result = adapter.apply_statement("CREATE VIEW v AS SELECT * FROM missing_table");
        assert!(matches!(result, Err(BackyError::SyntaxError { .. })));
    }

    #[test]
    fn insert_into_missing_table_is_constraint_violation() {
        let mut adapter = MockAdapter::empty("mysql", "8.0.34");
        let result = adapter.apply_statement("INSERT INTO ghost VALUES (1)");
        assert!(matches!(result, Err(BackyError::ConstraintViolation { .. })));
    }
}
