/// Main error type for the library.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// Used when the user pass a logical invalid parameter to a function.
    #[error("Parameter error: {0}")]
    InvalidParameter(String),
    /// A point set (or face set) that must have rows is empty.
    #[error("Empty input: the {0} set has no rows")]
    EmptyPointSet(&'static str),
    /// A matrix does not have the expected number of columns.
    #[error("Shape error: {name} has shape ({rows}, {cols}), expected ({rows}, {expected_cols})")]
    InvalidShape {
        name: &'static str,
        rows: usize,
        cols: usize,
        expected_cols: usize,
    },
    /// Two paired inputs have different numbers of rows.
    #[error("Shape mismatch: {left} has {left_rows} rows but {right} has {right_rows} rows")]
    ShapeMismatch {
        left: &'static str,
        left_rows: usize,
        right: &'static str,
        right_rows: usize,
    },
    /// Not enough matched pairs to constrain a rigid motion.
    #[error("Insufficient correspondences: found {found}, at least {required} required")]
    InsufficientCorrespondences { found: usize, required: usize },
    /// A face references a vertex that does not exist.
    #[error("Face {face} references vertex {index}, but there are only {num_vertices} vertices")]
    FaceIndexOutOfRange {
        face: usize,
        index: usize,
        num_vertices: usize,
    },
    /// The numerical problem has no unique solution.
    #[error("Degenerate problem: {0}")]
    Degenerate(String),
}

impl Error {
    /// Create a error with the kind `InvalidParameter`.
    /// # Arguments
    /// * `msg` - The error message.
    pub fn invalid_parameter<T: ToString>(msg: T) -> Self {
        Error::InvalidParameter(msg.to_string())
    }

    /// Create a error with the kind `Degenerate`.
    pub fn degenerate<T: ToString>(msg: T) -> Self {
        Error::Degenerate(msg.to_string())
    }
}
