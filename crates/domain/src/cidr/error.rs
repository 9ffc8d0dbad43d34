use thiserror::Error;

#[derive(Debug, Error)]
pub enum CidrError {
    #[error("malformed CIDR at line {line}: '{content}'")]
    MalformedInput { line: usize, content: String },

    #[error("I/O error reading CIDR list: {0}")]
    Io(#[from] std::io::Error),
}
