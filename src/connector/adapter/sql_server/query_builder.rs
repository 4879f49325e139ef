use crate::domain::{
    CollectionDefinition, DistanceFunction, DomainError, IndexKind, PropertyType, RecordKey,
    VectorSearchOptions, VectorStoreField,
};

use super::command::{quote_identifier, SqlCommand, SqlParam};

pub const DEFAULT_SCHEMA: &str = "dbo";
pub const SCORE_COLUMN: &str = "_vector_distance_value";

/// Splits `schema.table` on the first dot; a bare name lives in `dbo`.
pub fn split_collection_name(name: &str) -> (String, String) {
    match name.split_once('.') {
        Some((schema, table)) => (schema.to_string(), table.to_string()),
        None => (DEFAULT_SCHEMA.to_string(), name.to_string()),
    }
}

pub fn sql_type(property_type: &PropertyType, is_key: bool) -> &'static str {
    match property_type {
        PropertyType::String if is_key => "nvarchar(255)",
        PropertyType::String => "nvarchar(max)",
        PropertyType::Int => "bigint",
        PropertyType::Float => "float",
        PropertyType::Bool => "bit",
        PropertyType::Json => "json",
        PropertyType::DateTime => "datetime2",
        PropertyType::Bytes => "varbinary(max)",
        PropertyType::List(_) => "nvarchar(max)",
    }
}

pub fn distance_name(function: DistanceFunction) -> Result<&'static str, DomainError> {
    match function {
        DistanceFunction::CosineDistance | DistanceFunction::Default => Ok("cosine"),
        DistanceFunction::EuclideanDistance => Ok("euclidean"),
        DistanceFunction::DotProduct => Ok("dot"),
        other => Err(DomainError::invalid_model(format!(
            "Distance function {other} is not supported by SQL Server"
        ))),
    }
}

fn check_index_kind(field: &VectorStoreField) -> Result<(), DomainError> {
    match field.index_kind() {
        IndexKind::Flat | IndexKind::Default => Ok(()),
        other => Err(DomainError::invalid_model(format!(
            "Index kind {other} is not supported for field '{}'",
            field.name()
        ))),
    }
}

fn column(field: &VectorStoreField) -> String {
    quote_identifier(field.storage_name())
}

/// Columns in key, data, vector order.
pub fn ordered_fields(definition: &CollectionDefinition) -> Vec<&VectorStoreField> {
    std::iter::once(definition.key_field())
        .chain(definition.data_fields())
        .chain(definition.vector_fields())
        .collect()
}

/// Select list that returns every column in a form the row mapper reads back:
/// vectors and JSON as text, timestamps as ISO 8601.
pub fn select_columns(definition: &CollectionDefinition, include_vectors: bool) -> Vec<String> {
    let mut columns = vec![column(definition.key_field())];
    for field in definition.data_fields() {
        let name = column(field);
        columns.push(match field.property_type() {
            PropertyType::Json => format!("CAST({name} AS NVARCHAR(MAX)) AS {name}"),
            PropertyType::DateTime => format!("CONVERT(NVARCHAR(33), {name}, 126) AS {name}"),
            _ => name,
        });
    }
    if include_vectors {
        for field in definition.vector_fields() {
            let name = column(field);
            columns.push(format!("CAST({name} AS NVARCHAR(MAX)) AS {name}"));
        }
    }
    columns
}

fn escape_literal(text: &str) -> String {
    text.replace('\'', "''")
}

pub fn build_create_table(
    schema: &str,
    table: &str,
    definition: &CollectionDefinition,
    if_not_exists: bool,
) -> Result<SqlCommand, DomainError> {
    for field in definition.vector_fields() {
        check_index_kind(field)?;
    }

    let key = definition.key_field();
    let mut lines = vec![format!(
        "{} {} NOT NULL,\n",
        column(key),
        sql_type(key.property_type(), true)
    )];
    for field in definition.data_fields() {
        lines.push(format!(
            "{} {} NULL,\n",
            column(field),
            sql_type(field.property_type(), false)
        ));
    }
    for field in definition.vector_fields() {
        lines.push(format!(
            "{} VECTOR({}) NULL,\n",
            column(field),
            field.dimensions().unwrap_or_default()
        ));
    }

    let mut command = SqlCommand::default();
    if if_not_exists {
        command.query.append(&format!(
            "IF OBJECT_ID(N'{}', N'U') IS NULL\n",
            escape_literal(&format!("{}.{}", quote_identifier(schema), quote_identifier(table)))
        ));
    }
    command.query.in_logical_group(|q| {
        q.append_table_name(schema, table, "CREATE TABLE", "", true);
        q.in_parenthesis("", ";", |q| {
            for line in &lines {
                q.append(line);
            }
            q.in_parenthesis("PRIMARY KEY", "\n", |q| {
                q.append(&column(key));
            });
        });
    });
    Ok(command)
}

pub fn build_drop_table(schema: &str, table: &str) -> SqlCommand {
    let mut command = SqlCommand::new("DROP TABLE IF EXISTS");
    command.query.append_table_name(schema, table, "", ";", false);
    command
}

pub fn build_table_exists(schema: &str, table: &str) -> Result<SqlCommand, DomainError> {
    let mut command = SqlCommand::new(
        "SELECT TABLE_NAME FROM INFORMATION_SCHEMA.TABLES WHERE TABLE_TYPE = 'BASE TABLE'",
    );
    let schema = command.add_parameter(SqlParam::String(schema.to_string()))?;
    let table = command.add_parameter(SqlParam::String(table.to_string()))?;
    command.query.append(&format!(
        " AND TABLE_SCHEMA = {schema} AND TABLE_NAME = {table};"
    ));
    Ok(command)
}

pub fn build_list_tables(schema: Option<&str>) -> Result<SqlCommand, DomainError> {
    let mut command = SqlCommand::new(
        "SELECT TABLE_NAME FROM INFORMATION_SCHEMA.TABLES WHERE TABLE_TYPE = 'BASE TABLE'",
    );
    if let Some(schema) = schema {
        let placeholder = command.add_parameter(SqlParam::String(schema.to_string()))?;
        command
            .query
            .append(&format!(" AND TABLE_SCHEMA = {placeholder}"));
    }
    command.query.append(";");
    Ok(command)
}

/// `MERGE` of a batch of rows. Each row holds one parameter per column in
/// [`ordered_fields`] order. The upserted keys are returned by a final `SELECT`.
pub fn build_merge(
    schema: &str,
    table: &str,
    definition: &CollectionDefinition,
    rows: Vec<Vec<SqlParam>>,
) -> Result<SqlCommand, DomainError> {
    let fields = ordered_fields(definition);
    let key = definition.key_field();
    let names: Vec<String> = fields.iter().map(|f| column(f)).collect();

    let mut command = SqlCommand::default();
    let mut value_rows = Vec::with_capacity(rows.len());
    for row in rows {
        if row.len() != fields.len() {
            return Err(DomainError::internal(format!(
                "row has {} values for {} columns",
                row.len(),
                fields.len()
            )));
        }
        let placeholders = command.add_parameters(row)?;
        value_rows.push(format!("({})", placeholders.join(", ")));
    }

    command.query.append(&format!(
        "DECLARE @UpsertedKeys TABLE (KeyColumn {});\n",
        sql_type(key.property_type(), true)
    ));
    command
        .query
        .append_table_name(schema, table, "MERGE INTO", "AS t", true);
    command.query.in_parenthesis("USING", " ", |q| {
        q.append("VALUES ");
        q.append_list(&value_rows, ",\n");
    });
    command.query.in_parenthesis("AS s", " ", |q| {
        q.append_list(&names, ", ");
    });
    command.query.in_parenthesis("ON", "\n", |q| {
        q.append(&format!("t.{0} = s.{0}", column(key)));
    });

    let updates: Vec<String> = fields
        .iter()
        .skip(1)
        .map(|f| format!("t.{0} = s.{0}", column(f)))
        .collect();
    if !updates.is_empty() {
        command.query.append("WHEN MATCHED THEN\nUPDATE SET ");
        command.query.append_list(&updates, ", ");
        command.query.append("\n");
    }

    let source: Vec<String> = names.iter().map(|n| format!("s.{n}")).collect();
    command.query.append("WHEN NOT MATCHED THEN\n");
    command.query.in_parenthesis("INSERT", " ", |q| {
        q.append_list(&names, ", ");
    });
    command.query.in_parenthesis("VALUES", "\n", |q| {
        q.append_list(&source, ", ");
    });
    command.query.append(&format!(
        "OUTPUT inserted.{} INTO @UpsertedKeys (KeyColumn);\n",
        column(key)
    ));
    command.query.append("SELECT KeyColumn FROM @UpsertedKeys;\n");
    Ok(command)
}

pub fn key_param(key: &RecordKey) -> SqlParam {
    match key {
        RecordKey::Int(i) => SqlParam::Int(*i),
        RecordKey::String(s) => SqlParam::String(s.clone()),
    }
}

pub fn build_select(
    schema: &str,
    table: &str,
    definition: &CollectionDefinition,
    keys: &[RecordKey],
    include_vectors: bool,
) -> Result<SqlCommand, DomainError> {
    let mut command = SqlCommand::new("SELECT ");
    let placeholders = command.add_parameters(keys.iter().map(key_param))?;
    command
        .query
        .append_list(&select_columns(definition, include_vectors), ", ");
    command.query.append_table_name(schema, table, " FROM", "", true);
    command
        .query
        .append(&format!("WHERE {} IN ", column(definition.key_field())));
    command.query.in_parenthesis("", ";", |q| {
        q.append_list(&placeholders, ", ");
    });
    Ok(command)
}

pub fn build_delete(
    schema: &str,
    table: &str,
    definition: &CollectionDefinition,
    keys: &[RecordKey],
) -> Result<SqlCommand, DomainError> {
    let mut command = SqlCommand::new("DELETE FROM");
    let placeholders = command.add_parameters(keys.iter().map(key_param))?;
    command.query.append_table_name(schema, table, "", "", false);
    command
        .query
        .append(&format!("WHERE {} IN ", column(definition.key_field())));
    command.query.in_parenthesis("", ";", |q| {
        q.append_list(&placeholders, ", ");
    });
    Ok(command)
}

/// Nearest-neighbour query. Filter parameters keep their numbers; the query
/// vector is added after them.
pub fn build_search(
    schema: &str,
    table: &str,
    definition: &CollectionDefinition,
    vector_field: &VectorStoreField,
    vector: &[f32],
    options: &VectorSearchOptions,
    filter: Option<SqlCommand>,
) -> Result<SqlCommand, DomainError> {
    let distance = distance_name(vector_field.distance_function())?;

    let mut command = SqlCommand::new("SELECT ");
    let where_clause = match filter {
        Some(filter) => {
            let (clause, parameters) = filter.into_parts();
            command.add_parameters(parameters)?;
            Some(clause)
        }
        None => None,
    };
    let vector_json = serde_json::to_string(vector)
        .map_err(|e| DomainError::mapping(format!("failed to encode the query vector: {e}")))?;
    let vector_param = command.add_parameter(SqlParam::String(vector_json))?;

    command
        .query
        .append_list(&select_columns(definition, options.include_vectors), ", ");
    command.query.append(&format!(
        ", VECTOR_DISTANCE('{distance}', {}, CAST({vector_param} AS VECTOR({}))) AS {SCORE_COLUMN}\n",
        column(vector_field),
        vector_field.dimensions().unwrap_or(vector.len())
    ));
    command.query.append_table_name(schema, table, " FROM", "", true);
    if let Some(clause) = where_clause {
        command.query.append(&format!("WHERE {clause}\n"));
    }
    // VECTOR_DISTANCE returns a distance for every metric (dot is negated),
    // so the closest rows always sort first.
    command
        .query
        .append(&format!("ORDER BY {SCORE_COLUMN} ASC\n"));
    command.query.append(&format!(
        "OFFSET {} ROWS FETCH NEXT {} ROWS ONLY;",
        options.skip, options.top
    ));
    Ok(command)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::FilterTranslator;
    use crate::connector::adapter::sql_server::SqlServerFilterTranslator;
    use crate::domain::FilterExpr;

    fn definition() -> CollectionDefinition {
        CollectionDefinition::new(vec![
            VectorStoreField::key("id", PropertyType::String),
            VectorStoreField::data("name", PropertyType::String),
            VectorStoreField::data("opened", PropertyType::DateTime),
            VectorStoreField::vector("embedding", 3),
        ])
        .unwrap()
    }

    #[test]
    fn collection_names_split_into_schema_and_table() {
        assert_eq!(split_collection_name("sales.hotels"), ("sales".into(), "hotels".into()));
        assert_eq!(split_collection_name("hotels"), ("dbo".into(), "hotels".into()));
        assert_eq!(split_collection_name("a.b.c"), ("a".into(), "b.c".into()));
    }

    #[test]
    fn create_table_with_guard() {
        let command = build_create_table("dbo", "hotels", &definition(), true).unwrap();
        assert_eq!(
            command.text(),
            "IF OBJECT_ID(N'[dbo].[hotels]', N'U') IS NULL\n\
             BEGIN\n\
             CREATE TABLE [dbo].[hotels] \n\
             ([id] nvarchar(255) NOT NULL,\n\
             [name] nvarchar(max) NULL,\n\
             [opened] datetime2 NULL,\n\
             [embedding] VECTOR(3) NULL,\n\
             PRIMARY KEY ([id])\n);\n\
             END\n"
        );
    }

    #[test]
    fn create_table_rejects_hnsw() {
        let definition = CollectionDefinition::new(vec![
            VectorStoreField::key("id", PropertyType::Int),
            VectorStoreField::vector("v", 3).with_index_kind(IndexKind::Hnsw),
        ])
        .unwrap();
        assert!(build_create_table("dbo", "t", &definition, false).is_err());
    }

    #[test]
    fn drop_and_exists_queries() {
        assert_eq!(
            build_drop_table("dbo", "hotels").text(),
            "DROP TABLE IF EXISTS [dbo].[hotels] ;"
        );
        let command = build_table_exists("dbo", "hotels").unwrap();
        assert!(command.text().ends_with("AND TABLE_SCHEMA = @P1 AND TABLE_NAME = @P2;"));
        assert_eq!(command.parameters().len(), 2);
        assert!(!build_list_tables(None).unwrap().text().contains("@P1"));
    }

    #[test]
    fn merge_outputs_upserted_keys() {
        let rows = vec![
            vec![
                SqlParam::String("a".into()),
                SqlParam::String("A".into()),
                SqlParam::Null,
                SqlParam::String("[1,0,0]".into()),
            ],
            vec![
                SqlParam::String("b".into()),
                SqlParam::Null,
                SqlParam::Null,
                SqlParam::Null,
            ],
        ];
        let command = build_merge("dbo", "hotels", &definition(), rows).unwrap();
        let text = command.text();

        assert!(text.starts_with(concat!(
            "DECLARE @UpsertedKeys TABLE (KeyColumn nvarchar(255));\n",
            "MERGE INTO [dbo].[hotels] AS t\n"
        )));
        assert!(text.contains(concat!(
            "USING (VALUES (@P1, @P2, @P3, @P4),\n(@P5, @P6, @P7, @P8)) ",
            "AS s ([id], [name], [opened], [embedding]) "
        )));
        assert!(text.contains("ON (t.[id] = s.[id])\n"));
        assert!(text.contains(concat!(
            "UPDATE SET t.[name] = s.[name], t.[opened] = s.[opened], ",
            "t.[embedding] = s.[embedding]\n"
        )));
        assert!(text.contains("OUTPUT inserted.[id] INTO @UpsertedKeys (KeyColumn);\n"));
        assert!(text.ends_with("SELECT KeyColumn FROM @UpsertedKeys;\n"));
        assert_eq!(command.parameters().len(), 8);
    }

    #[test]
    fn select_casts_vectors_and_dates() {
        let keys = vec![RecordKey::from("a"), RecordKey::from("b")];
        let command = build_select("dbo", "hotels", &definition(), &keys, true).unwrap();
        assert_eq!(
            command.text(),
            "SELECT [id], [name], CONVERT(NVARCHAR(33), [opened], 126) AS [opened], \
             CAST([embedding] AS NVARCHAR(MAX)) AS [embedding] FROM [dbo].[hotels] \n\
             WHERE [id] IN (@P1, @P2);"
        );
    }

    #[test]
    fn delete_by_keys() {
        let command =
            build_delete("dbo", "hotels", &definition(), &[RecordKey::from("a")]).unwrap();
        assert_eq!(command.text(), "DELETE FROM [dbo].[hotels] WHERE [id] IN (@P1);");
    }

    #[test]
    fn search_numbers_vector_after_filter_parameters() {
        let definition = definition();
        let field = definition.try_get_vector_field(None).unwrap().unwrap();
        let filter = SqlServerFilterTranslator
            .translate(&FilterExpr::eq("name", "A"), &definition)
            .unwrap();
        let options = VectorSearchOptions::default().with_top(5).with_skip(10);
        let command = build_search(
            "dbo",
            "hotels",
            &definition,
            field,
            &[1.0, 0.0, 0.5],
            &options,
            Some(filter),
        )
        .unwrap();

        let text = command.text();
        assert!(text.contains(
            ", VECTOR_DISTANCE('cosine', [embedding], CAST(@P2 AS VECTOR(3))) AS _vector_distance_value\n"
        ));
        assert!(text.contains("WHERE [name] = @P1\n"));
        assert!(text.contains("ORDER BY _vector_distance_value ASC\n"));
        assert!(text.ends_with("OFFSET 10 ROWS FETCH NEXT 5 ROWS ONLY;"));
        assert_eq!(command.parameters()[1], SqlParam::String("[1.0,0.0,0.5]".into()));
    }

    #[test]
    fn dot_product_search_still_sorts_ascending() {
        let definition = CollectionDefinition::new(vec![
            VectorStoreField::key("id", PropertyType::Int),
            VectorStoreField::vector("embedding", 2)
                .with_distance_function(DistanceFunction::DotProduct),
        ])
        .unwrap();
        let field = definition.try_get_vector_field(None).unwrap().unwrap();
        let command = build_search(
            "dbo",
            "hotels",
            &definition,
            field,
            &[0.5, 0.5],
            &VectorSearchOptions::default(),
            None,
        )
        .unwrap();

        let text = command.text();
        assert!(text.contains("VECTOR_DISTANCE('dot', [embedding], CAST(@P1 AS VECTOR(2)))"));
        assert!(text.contains("ORDER BY _vector_distance_value ASC\n"));
        assert!(!text.contains("DESC"));
    }
}
