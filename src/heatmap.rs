//! Sparse top-K heatmap encoding
//!
//! A heatmap is a conceptual `rows x columns` grid of activity intensity. Only
//! the K highest-intensity cells are kept, as parallel arrays of linear index,
//! value and (optionally) observation count. Cells that are not listed were not
//! sampled; they are never read back as zero.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::warn;

use crate::error::AnalyticsError;

/// Compact top-K sample of an activity grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SparseHeatmap {
    pub rows: u32,
    pub columns: u32,
    /// Row-major linear cell indices
    pub indices: Vec<u64>,
    pub values: Vec<f64>,
    /// Observation count per listed cell, when the producer tracked it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counts: Option<Vec<u64>>,
}

impl SparseHeatmap {
    /// Expand the listed samples into grid cells
    pub fn cells(&self) -> Result<Vec<HeatmapCell>, AnalyticsError> {
        SparseHeatmapCodec::decode(
            self.rows,
            self.columns,
            &self.indices,
            &self.values,
            self.counts.as_deref(),
        )
    }

    /// Number of sampled cells
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// One sampled grid cell
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapCell {
    pub row: u32,
    pub column: u32,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
}

/// Codec between grid cells and the sparse parallel-array form
pub struct SparseHeatmapCodec;

impl SparseHeatmapCodec {
    /// Decode parallel arrays into cells, in the order they were listed
    pub fn decode(
        rows: u32,
        columns: u32,
        indices: &[u64],
        values: &[f64],
        counts: Option<&[u64]>,
    ) -> Result<Vec<HeatmapCell>, AnalyticsError> {
        let capacity = grid_capacity(rows, columns)?;

        if indices.len() != values.len() {
            return Err(malformed(format!(
                "{} indices but {} values",
                indices.len(),
                values.len()
            )));
        }
        if let Some(counts) = counts {
            if counts.len() != indices.len() {
                return Err(malformed(format!(
                    "{} indices but {} counts",
                    indices.len(),
                    counts.len()
                )));
            }
        }

        let columns_wide = u64::from(columns);
        indices
            .iter()
            .zip(values)
            .enumerate()
            .map(|(position, (&index, &value))| {
                if index >= capacity {
                    return Err(malformed(format!(
                        "index {index} at position {position} outside grid of {capacity} cells"
                    )));
                }
                // index < rows * columns, so both parts fit in u32
                Ok(HeatmapCell {
                    row: (index / columns_wide) as u32,
                    column: (index % columns_wide) as u32,
                    value,
                    count: counts.map(|c| c[position]),
                })
            })
            .collect()
    }

    /// Keep the `k` highest-value cells, sorted by descending value.
    ///
    /// Ties are broken by the lowest linear index. Counts are emitted only when
    /// every kept cell carries one.
    pub fn encode(
        cells: &[HeatmapCell],
        rows: u32,
        columns: u32,
        k: usize,
    ) -> Result<SparseHeatmap, AnalyticsError> {
        grid_capacity(rows, columns)?;

        let mut seen = HashSet::with_capacity(cells.len());
        let mut ranked = Vec::with_capacity(cells.len());
        for cell in cells {
            if cell.row >= rows || cell.column >= columns {
                return Err(malformed(format!(
                    "cell ({}, {}) outside {rows}x{columns} grid",
                    cell.row, cell.column
                )));
            }
            if !cell.value.is_finite() {
                return Err(malformed(format!(
                    "cell ({}, {}) has non-finite value",
                    cell.row, cell.column
                )));
            }
            let index = u64::from(cell.row) * u64::from(columns) + u64::from(cell.column);
            if !seen.insert(index) {
                return Err(malformed(format!("duplicate cell at index {index}")));
            }
            ranked.push((index, cell));
        }

        ranked.sort_by(|(ia, a), (ib, b)| b.value.total_cmp(&a.value).then(ia.cmp(ib)));
        ranked.truncate(k);

        let counts = ranked
            .iter()
            .map(|(_, cell)| cell.count)
            .collect::<Option<Vec<u64>>>()
            .filter(|c| !c.is_empty());

        Ok(SparseHeatmap {
            rows,
            columns,
            indices: ranked.iter().map(|(index, _)| *index).collect(),
            values: ranked.iter().map(|(_, cell)| cell.value).collect(),
            counts,
        })
    }
}

/// Total cell count of a grid, rejecting empty dimensions
fn grid_capacity(rows: u32, columns: u32) -> Result<u64, AnalyticsError> {
    if rows == 0 || columns == 0 {
        return Err(malformed(format!(
            "grid dimensions must be positive, got {rows}x{columns}"
        )));
    }
    Ok(u64::from(rows) * u64::from(columns))
}

fn malformed(message: String) -> AnalyticsError {
    warn!(%message, "rejecting malformed heatmap");
    AnalyticsError::MalformedHeatmap(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn cell(row: u32, column: u32, value: f64) -> HeatmapCell {
        HeatmapCell {
            row,
            column,
            value,
            count: None,
        }
    }

    #[test]
    fn test_decode_linear_index() {
        let cells = SparseHeatmapCodec::decode(137, 64, &[5401], &[0.9], None).unwrap();
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].row, 84);
        assert_eq!(cells[0].column, 25);
        assert_eq!(cells[0].count, None);
    }

    #[test]
    fn test_decode_with_counts() {
        let cells =
            SparseHeatmapCodec::decode(4, 4, &[0, 15], &[2.0, 1.0], Some(&[7, 3])).unwrap();
        assert_eq!(
            cells,
            vec![
                HeatmapCell {
                    row: 0,
                    column: 0,
                    value: 2.0,
                    count: Some(7),
                },
                HeatmapCell {
                    row: 3,
                    column: 3,
                    value: 1.0,
                    count: Some(3),
                },
            ]
        );
    }

    #[test]
    fn test_decode_rejects_malformed() {
        let out_of_range = SparseHeatmapCodec::decode(2, 2, &[4], &[1.0], None);
        assert!(matches!(out_of_range, Err(AnalyticsError::MalformedHeatmap(_))));

        let mismatched = SparseHeatmapCodec::decode(2, 2, &[0, 1], &[1.0], None);
        assert!(matches!(mismatched, Err(AnalyticsError::MalformedHeatmap(_))));

        let bad_counts = SparseHeatmapCodec::decode(2, 2, &[0], &[1.0], Some(&[1, 2]));
        assert!(matches!(bad_counts, Err(AnalyticsError::MalformedHeatmap(_))));

        let empty_grid = SparseHeatmapCodec::decode(0, 8, &[], &[], None);
        assert!(matches!(empty_grid, Err(AnalyticsError::MalformedHeatmap(_))));
    }

    #[test]
    fn test_decode_empty_sample() {
        let cells = SparseHeatmapCodec::decode(3, 3, &[], &[], None).unwrap();
        assert!(cells.is_empty());
    }

    #[test]
    fn test_encode_top_k_with_ties() {
        let cells = vec![
            cell(2, 1, 5.0),
            cell(0, 3, 9.0),
            cell(1, 0, 5.0),
            cell(0, 0, 1.0),
            cell(3, 3, 5.0),
        ];

        let heatmap = SparseHeatmapCodec::encode(&cells, 4, 4, 3).unwrap();
        assert_eq!(heatmap.indices, vec![3, 4, 9]);
        assert_eq!(heatmap.values, vec![9.0, 5.0, 5.0]);
        assert_eq!(heatmap.counts, None);
    }

    #[test]
    fn test_encode_decode_keeps_top_k() {
        let cells: Vec<HeatmapCell> = (0..6u32)
            .flat_map(|row| (0..5u32).map(move |column| (row, column)))
            .map(|(row, column)| HeatmapCell {
                row,
                column,
                value: f64::from((row * 7 + column * 3) % 11),
                count: Some(u64::from(row + column)),
            })
            .collect();

        let heatmap = SparseHeatmapCodec::encode(&cells, 6, 5, 8).unwrap();
        let decoded = heatmap.cells().unwrap();

        let mut expected = cells.clone();
        expected.sort_by(|a, b| {
            b.value
                .total_cmp(&a.value)
                .then((a.row * 5 + a.column).cmp(&(b.row * 5 + b.column)))
        });
        expected.truncate(8);

        assert_eq!(decoded, expected);
    }

    #[test]
    fn test_encode_partial_counts_dropped() {
        let mut with_count = cell(0, 0, 3.0);
        with_count.count = Some(2);
        let heatmap = SparseHeatmapCodec::encode(&[with_count, cell(0, 1, 1.0)], 1, 2, 2).unwrap();
        assert_eq!(heatmap.counts, None);

        let heatmap = SparseHeatmapCodec::encode(&[with_count, cell(0, 1, 1.0)], 1, 2, 1).unwrap();
        assert_eq!(heatmap.counts, Some(vec![2]));
    }

    #[test]
    fn test_encode_k_larger_than_input() {
        let heatmap = SparseHeatmapCodec::encode(&[cell(1, 1, 2.0)], 2, 2, 50).unwrap();
        assert_eq!(heatmap.len(), 1);

        let heatmap = SparseHeatmapCodec::encode(&[cell(1, 1, 2.0)], 2, 2, 0).unwrap();
        assert!(heatmap.is_empty());
    }

    #[test]
    fn test_encode_rejects_malformed() {
        assert!(SparseHeatmapCodec::encode(&[cell(2, 0, 1.0)], 2, 2, 1).is_err());
        assert!(SparseHeatmapCodec::encode(&[cell(0, 0, f64::NAN)], 2, 2, 1).is_err());
        assert!(SparseHeatmapCodec::encode(&[cell(0, 1, 1.0), cell(0, 1, 2.0)], 2, 2, 1).is_err());
        assert!(SparseHeatmapCodec::encode(&[], 2, 0, 1).is_err());
    }

    #[test]
    fn test_unlisted_cells_not_filled() {
        let heatmap = SparseHeatmap {
            rows: 10,
            columns: 10,
            indices: vec![42],
            values: vec![0.5],
            counts: None,
        };
        assert_eq!(heatmap.cells().unwrap().len(), 1);
    }
}
