//! Compound filter validation against capability descriptors.
//!
//! Before a filter is attached to an outbound request, its compound
//! expressions are checked against the DDLs of every data plugin they
//! reference. The walk is depth-first and left-to-right; the first
//! invalid leaf wins.

use fleetwire_types::{DdlRegistry, FilterExpr, FleetwireError, FleetwireResult, Fstatement};

/// Validate every compound expression in a filter tree.
pub fn validate_compound_filter(
    exprs: &[FilterExpr],
    ddls: &dyn DdlRegistry,
) -> FleetwireResult<()> {
    for expr in exprs {
        validate_expr(expr, ddls)?;
    }
    Ok(())
}

fn validate_expr(expr: &FilterExpr, ddls: &dyn DdlRegistry) -> FleetwireResult<()> {
    match expr {
        FilterExpr::And(children) | FilterExpr::Or(children) => {
            validate_compound_filter(children, ddls)
        }
        FilterExpr::Fstatement(stmt) => validate_statement(stmt, ddls),
    }
}

fn validate_statement(stmt: &Fstatement, ddls: &dyn DdlRegistry) -> FleetwireResult<()> {
    let ddl = ddls.data_ddl(&stmt.name)?;
    ddl.validate_input(stmt.params.as_deref())?;

    if !ddl.has_output(&stmt.value) {
        return Err(FleetwireError::DdlValidation(format!(
            "Data plugin '{}()' does not return a '{}' value",
            stmt.name, stmt.value
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleetwire_types::{DataDdl, DdlInput, StaticDdlRegistry};

    fn make_registry() -> StaticDdlRegistry {
        let mut registry = StaticDdlRegistry::new();
        registry.register(DataDdl {
            plugin: "rspec".to_string(),
            description: "test data plugin".to_string(),
            query: DdlInput::default(),
            outputs: vec!["present".to_string()],
        });
        registry
    }

    fn statement(name: &str, value: &str, params: Option<&str>) -> FilterExpr {
        FilterExpr::Fstatement(Fstatement {
            name: name.to_string(),
            value: value.to_string(),
            params: params.map(|p| p.to_string()),
        })
    }

    #[test]
    fn test_valid_statement_passes() {
        let registry = make_registry();
        let exprs = vec![statement("rspec", "present", Some("p"))];
        assert!(validate_compound_filter(&exprs, &registry).is_ok());
    }

    #[test]
    fn test_missing_output_names_plugin_and_value() {
        let registry = make_registry();
        let exprs = vec![statement("rspec", "rspec_value", Some("p"))];

        let err = validate_compound_filter(&exprs, &registry).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Data plugin 'rspec()' does not return a 'rspec_value' value"
        );
    }

    #[test]
    fn test_unknown_plugin_fails() {
        let registry = make_registry();
        let exprs = vec![statement("nope", "present", None)];

        let err = validate_compound_filter(&exprs, &registry).unwrap_err();
        assert!(err.to_string().contains("Unknown data plugin 'nope'"));
    }

    #[test]
    fn test_nested_groups_are_walked() {
        let registry = make_registry();
        let exprs = vec![FilterExpr::And(vec![
            statement("rspec", "present", None),
            FilterExpr::Or(vec![statement("rspec", "absent", None)]),
        ])];

        let err = validate_compound_filter(&exprs, &registry).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Data plugin 'rspec()' does not return a 'absent' value"
        );
    }

    #[test]
    fn test_first_invalid_leaf_wins() {
        let registry = make_registry();
        let exprs = vec![
            statement("rspec", "missing_one", None),
            statement("rspec", "missing_two", None),
        ];

        let err = validate_compound_filter(&exprs, &registry).unwrap_err();
        assert!(err.to_string().contains("missing_one"));
    }

    #[test]
    fn test_required_param_enforced() {
        let mut registry = make_registry();
        registry.register(DataDdl {
            plugin: "fstat".to_string(),
            description: String::new(),
            query: DdlInput {
                description: "file path".to_string(),
                optional: false,
                max_length: 0,
            },
            outputs: vec!["size".to_string()],
        });

        let exprs = vec![statement("fstat", "size", None)];
        let err = validate_compound_filter(&exprs, &registry).unwrap_err();
        assert!(err.to_string().contains("requires a query argument"));
    }
}
