//! Title and alias resolution
//!
//! Builds the [`TitleIndexes`] for one parse from the header titles and the
//! configured alias groups.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use super::address::{column_index_to_name, TitleIndexes};
use crate::config::ParseOptions;
use crate::error::{QueryError, QueryResult};
use crate::types::{AliasConfig, AliasGroup, CellValue};

/// Result of resolving a header row
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedTitles {
    /// Title text and aliases → 1-based column position
    pub indexes: TitleIndexes,
    /// Non-empty alias groups, in configuration order
    pub aliases: AliasConfig,
}

impl ResolvedTitles {
    /// 1-based index of the first alias group containing `alias`
    pub fn alias_group_index(&self, alias: &str) -> Option<usize> {
        self.aliases
            .groups
            .iter()
            .position(|group| group.iter().any(|name| name == alias))
            .map(|i| i + 1)
    }
}

/// Assign positions to `titles` and register every alias of each title.
///
/// Positions start at `1 + invalid_col_count` so they stay aligned with the
/// sheet's letter names. A title that appears twice keeps its first column.
/// When two groups mention the same alias, the group configured later wins.
pub fn resolve_titles(titles: &[String], options: &ParseOptions) -> ResolvedTitles {
    let mut aliases = AliasConfig::default();
    let mut alias_mapping: HashMap<&str, &AliasGroup> = HashMap::new();

    for group in options.aliases.groups.iter().filter(|g| !g.is_empty()) {
        aliases.groups.push(group.clone());
        for alias in group {
            alias_mapping.insert(alias.as_str(), group);
        }
    }

    let mut indexes = TitleIndexes::new();
    let mut seen: HashSet<&str> = HashSet::new();
    for (offset, title) in titles.iter().enumerate() {
        // A repeated title keeps its first column, matching the schema
        if title.is_empty() || !seen.insert(title.as_str()) {
            continue;
        }
        let position = options.invalid_col_count + 1 + offset;
        indexes.insert(title.clone(), position);

        if let Some(group) = alias_mapping.get(title.as_str()) {
            for alias in group.iter() {
                indexes.insert(alias.clone(), position);
            }
        }
    }

    debug!(
        titles = titles.len(),
        names = indexes.len(),
        alias_groups = aliases.len(),
        "resolved column titles"
    );

    ResolvedTitles { indexes, aliases }
}

/// Turn the header row's cells into titles, through the configured extractor
/// if there is one.
pub fn extract_titles(cells: &[CellValue], options: &ParseOptions) -> QueryResult<Vec<String>> {
    if let Some(extractor) = &options.title_extractor {
        return extractor(cells);
    }

    cells
        .iter()
        .enumerate()
        .map(|(offset, cell)| {
            cell.as_title().ok_or_else(|| QueryError::MalformedTitle {
                column: column_index_to_name(options.invalid_col_count + 1 + offset),
                message: format!("cannot use '{}' as a column title", cell.to_text()),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn titles(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_resolve_titles_with_alias_group() {
        let options = ParseOptions::default()
            .with_aliases(AliasConfig::from_slices(&[&["Student No", "studentNo", "学号"]]));
        let resolved = resolve_titles(&titles(&["Student No", "Name"]), &options);

        let expected: TitleIndexes = vec![
            ("Student No".to_string(), 1),
            ("studentNo".to_string(), 1),
            ("学号".to_string(), 1),
            ("Name".to_string(), 2),
        ]
        .into_iter()
        .collect();
        assert_eq!(resolved.indexes, expected);
    }

    #[test]
    fn test_every_alias_resolves_like_its_title() {
        let options = ParseOptions::default().with_aliases(AliasConfig::from_slices(&[
            &["Student No", "studentNo", "学号"],
            &["Class", "className", "班级"],
        ]));
        let resolved = resolve_titles(&titles(&["Name", "Class", "Student No"]), &options);

        for group in &resolved.aliases.groups {
            let title_pos = group.iter().find_map(|name| {
                ["Name", "Class", "Student No"]
                    .contains(&name.as_str())
                    .then(|| resolved.indexes.get(name))
                    .flatten()
            });
            for alias in group {
                assert_eq!(resolved.indexes.get(alias), title_pos, "alias {}", alias);
            }
        }
        assert_eq!(resolved.indexes.get("班级"), Some(2));
        assert_eq!(resolved.indexes.get("学号"), Some(3));
    }

    #[test]
    fn test_aliases_without_title_are_absent() {
        let options = ParseOptions::default()
            .with_aliases(AliasConfig::from_slices(&[&["Score", "score", "分数"]]));
        let resolved = resolve_titles(&titles(&["Name"]), &options);
        assert_eq!(resolved.indexes.get("score"), None);
        assert_eq!(resolved.indexes.get("分数"), None);
        assert_eq!(resolved.indexes.get("Name"), Some(1));
    }

    #[test]
    fn test_positions_shift_by_invalid_columns() {
        let options = ParseOptions {
            invalid_col_count: 2,
            ..Default::default()
        };
        let resolved = resolve_titles(&titles(&["Student No", "Name"]), &options);
        assert_eq!(resolved.indexes.get("Student No"), Some(3));
        assert_eq!(resolved.indexes.get("Name"), Some(4));
    }

    #[test]
    fn test_later_alias_group_wins() {
        let options = ParseOptions::default().with_aliases(AliasConfig::from_slices(&[
            &["Alpha", "shared"],
            &["Beta", "shared"],
        ]));
        let resolved = resolve_titles(&titles(&["shared"]), &options);
        assert_eq!(resolved.indexes.get("shared"), Some(1));
        assert_eq!(resolved.indexes.get("Beta"), Some(1));
        assert_eq!(resolved.indexes.get("Alpha"), None);

        let both = resolve_titles(&titles(&["Alpha", "Beta"]), &options);
        assert_eq!(both.indexes.get("shared"), Some(2));
    }

    #[test]
    fn test_repeated_title_keeps_first_column() {
        let options = ParseOptions::default()
            .with_aliases(AliasConfig::from_slices(&[&["Name", "name", "姓名"]]));
        let resolved = resolve_titles(&titles(&["Name", "Age", "Name"]), &options);
        assert_eq!(resolved.indexes.get("Name"), Some(1));
        assert_eq!(resolved.indexes.get("姓名"), Some(1));
        assert_eq!(resolved.indexes.get("Age"), Some(2));
    }

    #[test]
    fn test_empty_groups_are_not_active() {
        let options = ParseOptions::default().with_aliases(AliasConfig::new(vec![
            vec![],
            vec!["Name".to_string(), "name".to_string()],
        ]));
        let resolved = resolve_titles(&titles(&["Name"]), &options);
        assert_eq!(resolved.aliases.len(), 1);
        assert_eq!(resolved.alias_group_index("name"), Some(1));
        assert_eq!(resolved.alias_group_index("nope"), None);
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let options = ParseOptions::default()
            .with_aliases(AliasConfig::from_slices(&[&["Name", "name", "姓名"]]));
        let input = titles(&["Student No", "Name", ""]);
        assert_eq!(resolve_titles(&input, &options), resolve_titles(&input, &options));
    }

    #[test]
    fn test_extract_titles_default() {
        let cells = vec![
            CellValue::from("Student No"),
            CellValue::Int(2024),
            CellValue::Empty,
        ];
        let titles = extract_titles(&cells, &ParseOptions::default()).unwrap();
        assert_eq!(titles, vec!["Student No", "2024", ""]);
    }

    #[test]
    fn test_extract_titles_rejects_error_cell() {
        let options = ParseOptions {
            invalid_col_count: 1,
            ..Default::default()
        };
        let cells = vec![CellValue::from("Name"), CellValue::Error("#REF!".to_string())];
        match extract_titles(&cells, &options) {
            Err(QueryError::MalformedTitle { column, .. }) => assert_eq!(column, "C"),
            other => panic!("expected MalformedTitle, got {:?}", other),
        }
    }

    #[test]
    fn test_extract_titles_custom() {
        let options = ParseOptions::default().with_title_extractor(|cells| {
            Ok(cells
                .iter()
                .map(|c| c.to_text().lines().next().unwrap_or_default().to_string())
                .collect())
        });
        let cells = vec![CellValue::from("Student No\n学号"), CellValue::from("Name")];
        let titles = extract_titles(&cells, &options).unwrap();
        assert_eq!(titles, vec!["Student No", "Name"]);
    }
}
