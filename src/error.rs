use thiserror::Error;

pub type Result<T> = std::result::Result<T, HandleError>;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleError {
    #[error("dereferenced an empty SharedHandle")]
    NullDereference,

    #[error("cannot take ownership of a null pointer")]
    NullPointer,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            HandleError::NullDereference.to_string(),
            "dereferenced an empty SharedHandle"
        );
        assert_eq!(
            HandleError::NullPointer.to_string(),
            "cannot take ownership of a null pointer"
        );
    }
}
