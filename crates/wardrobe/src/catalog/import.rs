use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Deserializer};

use super::domain::{Category, ClothingItem, Formality, ItemId, Season, UnknownValue};
use super::matrix::CompatibilityMatrix;
use super::repository::{CatalogError, CatalogSnapshot};

#[derive(Debug)]
pub enum CatalogImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    Row { row: usize, reason: String },
}

impl std::fmt::Display for CatalogImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogImportError::Io(err) => write!(f, "failed to read wardrobe export: {}", err),
            CatalogImportError::Csv(err) => write!(f, "invalid wardrobe CSV data: {}", err),
            CatalogImportError::Row { row, reason } => {
                write!(f, "row {} of wardrobe CSV rejected: {}", row, reason)
            }
        }
    }
}

impl std::error::Error for CatalogImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CatalogImportError::Io(err) => Some(err),
            CatalogImportError::Csv(err) => Some(err),
            CatalogImportError::Row { .. } => None,
        }
    }
}

impl From<std::io::Error> for CatalogImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for CatalogImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Loads a catalog snapshot from CSV exports of the item and compatibility tables.
pub struct CatalogCsvImporter;

impl CatalogCsvImporter {
    pub fn from_path<P: AsRef<Path>>(
        items: P,
        compatibility: Option<P>,
    ) -> Result<CatalogSnapshot, CatalogImportError> {
        let items = Self::items_from_reader(std::fs::File::open(items)?)?;
        let scores = match compatibility {
            Some(path) => Self::scores_from_reader(std::fs::File::open(path)?)?,
            None => CompatibilityMatrix::new(),
        };
        Ok(CatalogSnapshot::new(items, scores))
    }

    pub fn items_from_reader<R: Read>(reader: R) -> Result<Vec<ClothingItem>, CatalogImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut items: Vec<ClothingItem> = Vec::new();

        for (index, record) in csv_reader.deserialize::<ItemRow>().enumerate() {
            let row = index + 2;
            let item = record?
                .into_item()
                .map_err(|reason| CatalogImportError::Row { row, reason })?;
            if items.iter().any(|existing| existing.id == item.id) {
                return Err(CatalogImportError::Row {
                    row,
                    reason: format!("duplicate id {}", item.id),
                });
            }
            items.push(item);
        }

        Ok(items)
    }

    pub fn scores_from_reader<R: Read>(
        reader: R,
    ) -> Result<CompatibilityMatrix, CatalogImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut matrix = CompatibilityMatrix::new();

        for (index, record) in csv_reader.deserialize::<ScoreRow>().enumerate() {
            let row = record?;
            matrix
                .insert(ItemId(row.item_a), ItemId(row.item_b), row.score)
                .map_err(|err| CatalogImportError::Row {
                    row: index + 2,
                    reason: match err {
                        CatalogError::InvalidRecord(reason) => reason,
                        other => other.to_string(),
                    },
                })?;
        }

        Ok(matrix)
    }
}

#[derive(Debug, Deserialize)]
struct ItemRow {
    id: String,
    name: String,
    category: String,
    color: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    formality: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    season: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    notes: Option<String>,
}

impl ItemRow {
    fn into_item(self) -> Result<ClothingItem, String> {
        for (field, value) in [("id", &self.id), ("name", &self.name), ("color", &self.color)] {
            if value.is_empty() {
                return Err(format!("missing required field {field}"));
            }
        }

        let parse = |err: UnknownValue| err.to_string();
        let category: Category = self.category.parse().map_err(parse)?;
        let formality = match self.formality.as_deref() {
            Some(raw) => raw.parse::<Formality>().map_err(parse)?,
            None => Formality::default(),
        };
        let season = match self.season.as_deref() {
            Some(raw) => raw.parse::<Season>().map_err(parse)?,
            None => Season::default(),
        };

        Ok(ClothingItem {
            id: ItemId(self.id),
            name: self.name,
            category,
            color: self.color,
            formality,
            season,
            notes: self.notes,
            created_at: None,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ScoreRow {
    item_a: String,
    item_b: String,
    score: f64,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.and_then(|raw| {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const ITEMS: &str = "id,name,category,color,formality,season,notes\n\
        t1,White shirt,top,white,casual,all,\n\
        b1,Blue jeans,Bottom,blue,,,slim fit\n\
        s1,Sneakers,shoes,white,athletic,summer,\n";

    #[test]
    fn items_parse_with_defaults_for_blank_columns() {
        let items = CatalogCsvImporter::items_from_reader(Cursor::new(ITEMS)).expect("items parse");

        assert_eq!(items.len(), 3);
        assert_eq!(items[1].category, Category::Bottom);
        assert_eq!(items[1].formality, Formality::Casual);
        assert_eq!(items[1].season, Season::All);
        assert_eq!(items[1].notes.as_deref(), Some("slim fit"));
        assert_eq!(items[2].season, Season::Summer);
        assert!(items[0].notes.is_none());
    }

    #[test]
    fn unknown_category_reports_row_number() {
        let csv = "id,name,category,color\nt1,Shirt,top,white\nc1,Cape,cape,red\n";
        let err = CatalogCsvImporter::items_from_reader(Cursor::new(csv)).unwrap_err();

        match err {
            CatalogImportError::Row { row, reason } => {
                assert_eq!(row, 3);
                assert!(reason.contains("category"));
            }
            other => panic!("expected row error, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let csv = "id,name,category,color\nt1,Shirt,top,white\nt1,Tee,top,black\n";
        let err = CatalogCsvImporter::items_from_reader(Cursor::new(csv)).unwrap_err();
        assert!(err.to_string().contains("duplicate id t1"));
    }

    #[test]
    fn scores_load_into_symmetric_matrix() {
        let csv = "item_a,item_b,score\nt1,b1,0\nb1,s1,0.5\n";
        let matrix = CatalogCsvImporter::scores_from_reader(Cursor::new(csv)).expect("scores");

        assert!(matrix.is_vetoed(&ItemId::from("b1"), &ItemId::from("t1")));
        assert_eq!(matrix.score(&ItemId::from("s1"), &ItemId::from("b1")), 0.5);
    }

    #[test]
    fn self_scored_rows_are_rejected() {
        let csv = "item_a,item_b,score\nt1,t1,0.2\n";
        let err = CatalogCsvImporter::scores_from_reader(Cursor::new(csv)).unwrap_err();
        assert!(matches!(err, CatalogImportError::Row { row: 2, .. }));
    }
}
