//! Parser for the recipe CSV files.
//!
//! Handles the three input tables:
//! - recipes.csv: recipe_id, recipe_name, ingredients, cook_method, calories, diet_labels
//! - users.csv: user_id, calories_per_day
//! - ratings.csv: user_id, recipe_id, rating
//!
//! Columns are located by header name, so extra columns and reordering are fine.
//! Fields may be double-quoted (with `""` escapes) and contain commas; a quoted
//! field may not span lines.

use crate::error::{DataLoadError, Result};
use crate::types::*;
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

/// Read a whole file as UTF-8 and split it into lines
fn read_lines(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Err(DataLoadError::FileNotFound {
            path: path.display().to_string(),
        });
    }
    let content = std::fs::read_to_string(path)?;
    Ok(content.lines().map(|s| s.to_string()).collect())
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Split one CSV record into fields.
///
/// Supports quoted fields with embedded commas and doubled quotes.
pub(crate) fn split_csv_line(line: &str) -> std::result::Result<Vec<String>, String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            '"' if current.is_empty() => in_quotes = true,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }

    if in_quotes {
        return Err("Unterminated quoted field".to_string());
    }
    fields.push(current);
    Ok(fields)
}

/// Column name -> position map built from the header line
struct Header {
    file: String,
    columns: HashMap<String, usize>,
}

impl Header {
    fn parse(file: &str, line: &str) -> Result<Self> {
        let names = split_csv_line(line.trim_start_matches('\u{feff}')).map_err(|reason| {
            DataLoadError::ParseError {
                file: file.to_string(),
                line: 1,
                reason,
            }
        })?;
        let columns = names
            .into_iter()
            .enumerate()
            .map(|(idx, name)| (name.trim().to_ascii_lowercase(), idx))
            .collect();
        Ok(Self {
            file: file.to_string(),
            columns,
        })
    }

    fn require(&self, column: &str) -> Result<usize> {
        self.columns
            .get(column)
            .copied()
            .ok_or_else(|| DataLoadError::MissingColumn {
                file: self.file.clone(),
                column: column.to_string(),
            })
    }

    fn optional(&self, column: &str) -> Option<usize> {
        self.columns.get(column).copied()
    }
}

/// One data row with its line number, for error reporting
struct Row<'a> {
    file: &'a str,
    line: usize,
    fields: Vec<String>,
}

impl Row<'_> {
    fn field(&self, idx: usize, name: &str) -> Result<&str> {
        self.fields
            .get(idx)
            .map(|s| s.trim())
            .ok_or_else(|| DataLoadError::ParseError {
                file: self.file.to_string(),
                line: self.line,
                reason: format!("Missing {}", name),
            })
    }

    fn parse<T>(&self, idx: usize, name: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let raw = self.field(idx, name)?;
        raw.parse().map_err(|e| DataLoadError::ParseError {
            file: self.file.to_string(),
            line: self.line,
            reason: format!("Invalid {}: {}", name, e),
        })
    }
}

/// Walk the data rows of a CSV file, skipping the header and blank lines
fn parse_table<T>(
    path: &Path,
    mut parse_row: impl FnMut(&Header, &Row<'_>) -> Result<T>,
) -> Result<Vec<T>> {
    let file = file_label(path);
    let lines = read_lines(path)?;
    let mut lines = lines.iter().enumerate();

    let header = match lines.next() {
        Some((_, line)) => Header::parse(&file, line)?,
        None => return Ok(Vec::new()),
    };

    let mut out = Vec::new();
    for (idx, line) in lines {
        let line_no = idx + 1;
        if line.trim().is_empty() {
            continue; // Skip empty lines
        }
        let fields = split_csv_line(line).map_err(|reason| DataLoadError::ParseError {
            file: file.clone(),
            line: line_no,
            reason,
        })?;
        let row = Row {
            file: &file,
            line: line_no,
            fields,
        };
        out.push(parse_row(&header, &row)?);
    }
    Ok(out)
}

/// Split a space-separated diet tag string into lowercase tags, dropping duplicates
pub fn parse_diet_labels(s: &str) -> Vec<String> {
    let mut labels: Vec<String> = Vec::new();
    for tag in s.split_whitespace() {
        let tag = tag.to_ascii_lowercase();
        if !labels.contains(&tag) {
            labels.push(tag);
        }
    }
    labels
}

/// Parse the recipes.csv file
pub fn parse_recipes(path: &Path) -> Result<Vec<Recipe>> {
    let mut columns = None;
    parse_table(path, |header, row| {
        let (id, name, ingredients, cook_method, calories, diet_labels) = match columns {
            Some(c) => c,
            None => {
                let c = (
                    header.require("recipe_id")?,
                    header.require("recipe_name")?,
                    header.require("ingredients")?,
                    header.require("cook_method")?,
                    header.require("calories")?,
                    header.require("diet_labels")?,
                );
                columns = Some(c);
                c
            }
        };

        Ok(Recipe {
            id: row.parse(id, "recipe_id")?,
            name: row.field(name, "recipe_name")?.to_string(),
            ingredients: row.field(ingredients, "ingredients")?.to_string(),
            cook_method: row.field(cook_method, "cook_method")?.to_string(),
            calories: row.parse(calories, "calories")?,
            diet_labels: parse_diet_labels(row.field(diet_labels, "diet_labels")?),
        })
    })
}

/// Parse the users.csv file
///
/// `calories_per_day` may be missing entirely, empty, or `nan`; all mean "no budget".
pub fn parse_users(path: &Path) -> Result<Vec<User>> {
    parse_table(path, |header, row| {
        let id = header.require("user_id")?;
        let budget = match header.optional("calories_per_day") {
            Some(idx) => match row.fields.get(idx).map(|s| s.trim()) {
                None | Some("") => None,
                Some(raw) if raw.eq_ignore_ascii_case("nan") => None,
                Some(_) => Some(row.parse::<f64>(idx, "calories_per_day")?),
            },
            None => None,
        };

        Ok(User {
            id: row.parse(id, "user_id")?,
            calories_per_day: budget,
        })
    })
}

/// Parse the ratings.csv file
pub fn parse_interactions(path: &Path) -> Result<Vec<Interaction>> {
    parse_table(path, |header, row| {
        Ok(Interaction {
            user_id: row.parse(header.require("user_id")?, "user_id")?,
            recipe_id: row.parse(header.require("recipe_id")?, "recipe_id")?,
            rating: row.parse(header.require("rating")?, "rating")?,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_split_csv_line_handles_quotes() {
        let fields = split_csv_line(r#"1,"Soup, Hearty","say ""hi""",x"#).unwrap();
        assert_eq!(fields, vec!["1", "Soup, Hearty", "say \"hi\"", "x"]);
    }

    #[test]
    fn test_split_csv_line_unterminated_quote() {
        assert!(split_csv_line(r#"1,"open"#).is_err());
    }

    #[test]
    fn test_parse_diet_labels() {
        assert_eq!(
            parse_diet_labels("balanced  LowFat balanced"),
            vec!["balanced".to_string(), "lowfat".to_string()]
        );
        assert!(parse_diet_labels("   ").is_empty());
    }

    #[test]
    fn test_parse_recipes() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "recipes.csv",
            "recipe_id,recipe_name,ingredients,cook_method,calories,diet_labels,extra\n\
             1,Oat Bowl,\"oats, milk, honey\",stir,210.5,balanced lowfat,x\n\
             \n\
             2,Steak,beef salt,grill,640,highprotein lowcarb,y\n",
        );

        let recipes = parse_recipes(&path).unwrap();
        assert_eq!(recipes.len(), 2);
        assert_eq!(recipes[0].ingredients, "oats, milk, honey");
        assert_eq!(recipes[0].calories, 210.5);
        assert_eq!(recipes[0].diet_labels, vec!["balanced", "lowfat"]);
        assert_eq!(recipes[1].id, 2);
    }

    #[test]
    fn test_parse_recipes_missing_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "recipes.csv", "recipe_id,recipe_name\n1,x\n");

        let err = parse_recipes(&path).unwrap_err();
        assert!(matches!(err, DataLoadError::MissingColumn { .. }));
    }

    #[test]
    fn test_parse_users_optional_budget() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "users.csv",
            "user_id,weight,calories_per_day\n1,70,2100\n2,80,\n3,65,nan\n",
        );

        let users = parse_users(&path).unwrap();
        assert_eq!(users[0].calories_per_day, Some(2100.0));
        assert_eq!(users[1].calories_per_day, None);
        assert_eq!(users[2].calories_per_day, None);
    }

    #[test]
    fn test_parse_interactions_reports_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "ratings.csv",
            "user_id,recipe_id,rating\n1,10,5\n1,abc,4\n",
        );

        match parse_interactions(&path).unwrap_err() {
            DataLoadError::ParseError { file, line, .. } => {
                assert_eq!(file, "ratings.csv");
                assert_eq!(line, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_file() {
        let err = parse_users(Path::new("/definitely/not/here/users.csv")).unwrap_err();
        assert!(matches!(err, DataLoadError::FileNotFound { .. }));
    }
}
