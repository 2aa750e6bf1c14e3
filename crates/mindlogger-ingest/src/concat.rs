use polars::prelude::{Column, DataFrame, DataType, PlSmallStr};

use crate::error::Result;

/// Stacks frames whose column sets differ.
///
/// The result has the union of all columns in first-seen order; columns a
/// frame lacks are null for that frame's rows. A column's type is taken from
/// the first frame that has it and later frames are cast to it.
pub fn concat_diagonal(frames: Vec<DataFrame>) -> Result<DataFrame> {
    let mut schema: Vec<(PlSmallStr, DataType)> = Vec::new();
    for frame in &frames {
        for column in frame.get_columns() {
            if !schema.iter().any(|(name, _)| name == column.name()) {
                schema.push((column.name().clone(), column.dtype().clone()));
            }
        }
    }

    let mut combined: Option<DataFrame> = None;
    for frame in frames {
        let height = frame.height();
        let mut columns = Vec::with_capacity(schema.len());
        for (name, dtype) in &schema {
            let column = match frame.column(name.as_str()) {
                Ok(existing) if existing.dtype() == dtype => existing.clone(),
                Ok(existing) => existing.cast(dtype)?,
                Err(_) => Column::full_null(name.clone(), height, dtype),
            };
            columns.push(column);
        }
        let aligned = DataFrame::new(columns)?;
        match combined.as_mut() {
            Some(acc) => {
                acc.vstack_mut(&aligned)?;
            }
            None => combined = Some(aligned),
        }
    }
    Ok(combined.unwrap_or_default())
}
