use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Row has {got} cells but table has {expected} columns")]
    RowWidthMismatch { expected: usize, got: usize },

    #[error("Cannot combine tables: columns {left:?} do not match {right:?}")]
    ColumnMismatch {
        left: Vec<String>,
        right: Vec<String>,
    },
}
