use thiserror::Error;

#[derive(Error, Debug)]
pub enum MailEmitError {
    #[error("protocol violation: {0}")]
    ProtocolViolation(&'static str),
    #[error("unrepresentable value: {0}")]
    UnrepresentableValue(String),
    #[error("invalid input: {0}")]
    InputShape(String),
    #[error("error writing message: {0}")]
    Io(#[from] std::io::Error),
}
