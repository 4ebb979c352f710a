//! Statement families through `parse`

use pretty_assertions::assert_eq;
use rust_tsqlparser::ast::{
    CreateMode, ExecuteTarget, ExprKind, FunctionBody, FunctionReturns, IdentQuote,
    ProcedureBody, Statement, StatementKind, TableSource, TriggerTarget, TriggerTiming,
};
use rust_tsqlparser::{parse, parse_with_options, DiagnosticKind, ParseOptions, Severity};

fn parse_clean(sql: &str) -> Vec<Statement> {
    let output = parse(sql);
    assert!(output.diagnostics.is_empty(), "{sql}: {:?}", output.diagnostics);
    output.statements().cloned().collect()
}

fn only(sql: &str) -> StatementKind {
    let mut statements = parse_clean(sql);
    assert_eq!(statements.len(), 1, "{sql}");
    statements.remove(0).kind
}

#[test]
fn test_reserved_words_as_bracketed_names() {
    let StatementKind::CreateTable(table) =
        only("CREATE TABLE [SELECT] ([FROM] INT, [WHERE] VARCHAR(100))")
    else {
        panic!("expected CREATE TABLE");
    };
    assert_eq!(table.name.name().value, "SELECT");
    assert_eq!(table.name.name().quote, IdentQuote::Bracket);
    let columns: Vec<_> = table
        .elements
        .columns
        .iter()
        .map(|c| c.name.value.as_str())
        .collect();
    assert_eq!(columns, vec!["FROM", "WHERE"]);
    let types: Vec<_> = table
        .elements
        .columns
        .iter()
        .map(|c| c.data_type.as_ref().unwrap().base_name())
        .collect();
    assert_eq!(types, vec!["INT", "VARCHAR"]);
}

#[test]
fn test_create_table_with_constraints() {
    let StatementKind::CreateTable(table) = only(
        "CREATE TABLE dbo.Orders (
            Id INT IDENTITY(1, 1) NOT NULL CONSTRAINT PK_Orders PRIMARY KEY CLUSTERED,
            CustomerId INT NOT NULL REFERENCES dbo.Customers (Id),
            Total MONEY NULL DEFAULT (0),
            Taxed AS Total * 1.2 PERSISTED,
            CONSTRAINT CK_Total CHECK (Total >= 0),
            INDEX IX_Customer NONCLUSTERED (CustomerId)
        ) ON [PRIMARY]",
    ) else {
        panic!("expected CREATE TABLE");
    };
    assert_eq!(table.name.schema().map(|s| s.value.as_str()), Some("dbo"));
    assert_eq!(table.elements.columns.len(), 4);
    assert!(table.elements.columns[0].identity.is_some());
    assert!(table.elements.columns[3].computed.is_some());
    assert!(table.elements.columns[3].persisted);
    assert_eq!(table.elements.constraints.len(), 1);
    assert_eq!(table.elements.indexes.len(), 1);
    assert!(table.on.is_some());
}

#[test]
fn test_procedure_with_body_and_parameters() {
    let StatementKind::Procedure(procedure) = only(
        "CREATE OR ALTER PROCEDURE dbo.GetOrders
            @CustomerId INT,
            @Since DATETIME2 = NULL,
            @Count INT OUTPUT
         WITH RECOMPILE
         AS
         BEGIN
            SET NOCOUNT ON;
            SELECT * FROM dbo.Orders WHERE CustomerId = @CustomerId;
            SET @Count = @@ROWCOUNT;
         END",
    ) else {
        panic!("expected procedure");
    };
    assert_eq!(procedure.mode, CreateMode::CreateOrAlter);
    let names: Vec<_> = procedure.parameters.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["@CustomerId", "@Since", "@Count"]);
    assert!(procedure.parameters[1].default.is_some());
    assert!(procedure.parameters[2].output);
    let ProcedureBody::Statements(body) = &procedure.body else {
        panic!("expected statement body");
    };
    assert_eq!(body.len(), 1);
    assert!(matches!(&body[0].kind, StatementKind::Block(inner) if inner.len() == 3));
}

#[test]
fn test_function_forms() {
    let statements = parse_clean(
        "CREATE FUNCTION dbo.Twice (@x INT) RETURNS INT AS BEGIN RETURN @x * 2 END
         GO
         CREATE FUNCTION dbo.Recent (@days INT) RETURNS TABLE
         AS RETURN (SELECT Id FROM dbo.Orders WHERE Age < @days)
         GO
         CREATE FUNCTION dbo.Split (@s NVARCHAR(MAX))
         RETURNS @parts TABLE (Value NVARCHAR(100))
         AS BEGIN INSERT INTO @parts VALUES (@s); RETURN; END",
    );
    let functions: Vec<_> = statements
        .iter()
        .map(|s| match &s.kind {
            StatementKind::Function(f) => f,
            other => panic!("expected function, got {other:?}"),
        })
        .collect();
    assert_eq!(functions.len(), 3);
    assert!(matches!(functions[0].returns, FunctionReturns::Scalar(_)));
    assert!(matches!(functions[0].body, FunctionBody::Block(_)));
    assert!(matches!(functions[1].returns, FunctionReturns::Table));
    assert!(matches!(functions[1].body, FunctionBody::Return(_)));
    assert!(matches!(
        &functions[2].returns,
        FunctionReturns::TableVariable { variable, elements }
            if variable == "@parts" && elements.columns.len() == 1
    ));
}

#[test]
fn test_view_and_trigger() {
    let statements = parse_clean(
        "CREATE VIEW dbo.ActiveOrders WITH SCHEMABINDING AS
            SELECT o.Id, c.Name FROM dbo.Orders o
            INNER JOIN dbo.Customers c ON c.Id = o.CustomerId
            WHERE o.Active = 1
         WITH CHECK OPTION
         GO
         CREATE TRIGGER dbo.trOrders ON dbo.Orders AFTER INSERT, UPDATE AS
            IF UPDATE(Total) ROLLBACK TRANSACTION",
    );
    let StatementKind::View(view) = &statements[0].kind else {
        panic!("expected view");
    };
    assert!(view.with_check_option);
    let select = view.query.first_select().unwrap();
    assert!(matches!(select.from[0], TableSource::Join { .. }));

    let StatementKind::Trigger(trigger) = &statements[1].kind else {
        panic!("expected trigger");
    };
    assert!(matches!(&trigger.target, TriggerTarget::Object(name) if name.name().value == "Orders"));
    assert_eq!(trigger.timing, TriggerTiming::After);
    assert_eq!(trigger.events, vec!["INSERT".to_string(), "UPDATE".to_string()]);
}

#[test]
fn test_control_flow_nesting() {
    let statements = parse_clean(
        "DECLARE @i INT = 0;
         WHILE @i < 10
         BEGIN
            SET @i += 1;
            IF @i % 2 = 0 CONTINUE;
            ELSE IF @i = 7 BREAK;
         END
         BEGIN TRY
            THROW 50000, 'boom', 1;
         END TRY
         BEGIN CATCH
            PRINT ERROR_MESSAGE();
         END CATCH",
    );
    assert_eq!(statements.len(), 3);
    let StatementKind::While { body, .. } = &statements[1].kind else {
        panic!("expected WHILE");
    };
    let StatementKind::Block(inner) = &body.kind else {
        panic!("expected block body");
    };
    assert_eq!(inner.len(), 2);
    assert!(matches!(
        &inner[1].kind,
        StatementKind::If { else_branch: Some(else_branch), .. }
            if matches!(else_branch.kind, StatementKind::If { .. })
    ));
    assert!(matches!(
        &statements[2].kind,
        StatementKind::TryCatch { try_block, catch_block }
            if try_block.len() == 1 && catch_block.len() == 1
    ));
}

#[test]
fn test_dynamic_sql_stays_a_string() {
    let StatementKind::Execute(exec) =
        only("EXEC sp_executesql N'SELECT * FROM t WHERE id = @id', N'@id INT', @id = 5")
    else {
        panic!("expected EXEC");
    };
    let call = exec.as_sp_executesql().expect("sp_executesql call");
    assert!(matches!(call.statement.kind, ExprKind::Literal(_)));
    assert!(call.parameter_definitions.is_some());
    assert_eq!(call.arguments.len(), 1);

    let StatementKind::Execute(exec) = only("EXEC ('SELECT ' + @cols + ' FROM t')") else {
        panic!("expected EXEC");
    };
    assert!(matches!(&exec.target, ExecuteTarget::Dynamic(parts) if parts.len() == 1));
}

#[test]
fn test_security_statements() {
    let statements = parse_clean(
        "CREATE LOGIN app WITH PASSWORD = 'Secret1!', CHECK_POLICY = OFF;
         CREATE USER app FOR LOGIN app;
         ALTER ROLE db_datareader ADD MEMBER app;
         GRANT SELECT, INSERT ON SCHEMA::dbo TO app WITH GRANT OPTION;
         DENY DELETE ON dbo.Orders TO app;
         REVOKE EXECUTE ON OBJECT::dbo.GetOrders FROM app CASCADE;",
    );
    let kinds: Vec<_> = statements
        .iter()
        .map(|s| match s.kind {
            StatementKind::Login(_) => "login",
            StatementKind::User(_) => "user",
            StatementKind::Role(_) => "role",
            StatementKind::Permission(_) => "permission",
            _ => "other",
        })
        .collect();
    assert_eq!(
        kinds,
        vec!["login", "user", "role", "permission", "permission", "permission"]
    );
}

#[test]
fn test_merge_with_output() {
    let StatementKind::Merge(merge) = only(
        "MERGE INTO dbo.Target AS t
         USING dbo.Source AS s ON t.Id = s.Id
         WHEN MATCHED AND s.Deleted = 1 THEN DELETE
         WHEN MATCHED THEN UPDATE SET t.Name = s.Name
         WHEN NOT MATCHED BY TARGET THEN INSERT (Id, Name) VALUES (s.Id, s.Name)
         WHEN NOT MATCHED BY SOURCE THEN DELETE
         OUTPUT $action, inserted.Id;",
    ) else {
        panic!("expected MERGE");
    };
    assert_eq!(merge.clauses.len(), 4);
    assert_eq!(merge.output.len(), 1);
}

#[test]
fn test_opaque_statements_are_warnings() {
    let output = parse("BACKUP DATABASE Sales TO DISK = 'x.bak';\nCHECKPOINT;\nSELECT 1;");
    assert_eq!(output.statements().count(), 3);
    assert_eq!(output.diagnostics.len(), 2);
    assert!(output
        .diagnostics
        .iter()
        .all(|d| d.kind == DiagnosticKind::UnsupportedConstruct && d.severity == Severity::Warning));
    assert!(!output.has_errors());
}

#[test]
fn test_legacy_constructs_follow_strictness() {
    let sql = "SELECT a.x FROM a, b WHERE a.id *= b.id;
               SELECT x FROM t COMPUTE SUM(x) BY x;
               RAISERROR 50001 'legacy';";
    let lenient = parse(sql);
    assert!(lenient.diagnostics.is_empty(), "{:?}", lenient.diagnostics);
    assert_eq!(lenient.statements().count(), 3);

    let strict = parse_with_options(sql, &ParseOptions::strict());
    assert_eq!(strict.statements().count(), 3);
    assert_eq!(strict.diagnostics.len(), 3, "{:?}", strict.diagnostics);
    assert!(strict.diagnostics.iter().all(|d| d.severity == Severity::Error));
}
