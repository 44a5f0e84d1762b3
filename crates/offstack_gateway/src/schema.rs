//! Schema document loading.
//!
//! Validation here is structural only (the emulation engine owns real
//! GraphQL parsing): the document must exist, be readable, be non-empty,
//! have balanced braces, and define at least one type.

use std::path::Path;

use crate::error::ServerStartError;

/// A loaded, structurally checked schema document.
#[derive(Debug, Clone)]
pub struct SchemaDocument {
    source: String,
    type_count: usize,
}

impl SchemaDocument {
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn type_count(&self) -> usize {
        self.type_count
    }
}

/// Load the schema document at `path`.
pub fn load(path: &Path) -> Result<SchemaDocument, ServerStartError> {
    if !path.exists() {
        return Err(ServerStartError::SchemaMissing {
            path: path.to_path_buf(),
        });
    }
    let source = std::fs::read_to_string(path).map_err(|source| ServerStartError::SchemaRead {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&source).map_err(|reason| ServerStartError::SchemaParse {
        path: path.to_path_buf(),
        reason,
    })
}

fn parse(source: &str) -> Result<SchemaDocument, String> {
    if source.trim().is_empty() {
        return Err("document is empty".to_string());
    }

    let mut depth: i64 = 0;
    for (index, ch) in source.char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth < 0 {
                    return Err(format!("unmatched '}}' at byte {}", index));
                }
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(format!("{} unclosed '{{'", depth));
    }

    let type_count = source
        .lines()
        .map(str::trim_start)
        .filter(|line| {
            line.starts_with("type ")
                || line.starts_with("input ")
                || line.starts_with("interface ")
                || line.starts_with("enum ")
                || line.starts_with("schema ")
                || line.starts_with("schema{")
        })
        .count();
    if type_count == 0 {
        return Err("no type definitions found".to_string());
    }

    Ok(SchemaDocument {
        source: source.to_string(),
        type_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SCHEMA: &str = "\
type Query {
  getItem(id: ID!): Item
}

type Item {
  id: ID!
  name: String
}
";

    #[test]
    fn loads_a_valid_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.graphql");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(SCHEMA.as_bytes())
            .unwrap();

        let doc = load(&path).unwrap();
        assert_eq!(doc.type_count(), 2);
        assert!(doc.source().contains("getItem"));
    }

    #[test]
    fn missing_file_is_schema_missing() {
        let err = load(Path::new("/nonexistent/schema.graphql"));
        assert!(matches!(err, Err(ServerStartError::SchemaMissing { .. })));
    }

    #[test]
    fn empty_document_fails_parse() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.graphql");
        std::fs::write(&path, "  \n").unwrap();

        let err = load(&path);
        assert!(matches!(err, Err(ServerStartError::SchemaParse { .. })));
    }

    #[test]
    fn unbalanced_braces_fail_parse() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.graphql");
        std::fs::write(&path, "type Query {\n  field: String\n").unwrap();

        let err = load(&path);
        match err {
            Err(ServerStartError::SchemaParse { reason, .. }) => {
                assert!(reason.contains("unclosed"));
            }
            other => panic!("expected SchemaParse, got {:?}", other),
        }
    }

    #[test]
    fn document_without_types_fails_parse() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.graphql");
        std::fs::write(&path, "# just a comment\n").unwrap();

        let err = load(&path);
        assert!(matches!(err, Err(ServerStartError::SchemaParse { .. })));
    }
}
