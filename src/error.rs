use serde::{Deserialize, Serialize};

pub type Error = anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// Broad classification of a failure, attached to errors that leave a command handler so the user
/// can tell a bad input apart from a broken data directory.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// The home directory or `config.json` is missing or invalid.
    Config,
    /// Reading or writing one of the CSV files failed.
    Storage,
    /// The user supplied a value that did not pass validation.
    Validation,
    /// The requested transaction or budget does not exist.
    NotFound,
}

serde_plain::derive_display_from_serialize!(ErrorType);
serde_plain::derive_fromstr_from_deserialize!(ErrorType);

pub(crate) trait IntoResult<T> {
    /// Tags the error, if any, with `error_type` so that it is shown as e.g. `storage: ...`.
    fn pub_result(self, error_type: ErrorType) -> Result<T>;
}

impl<T, E> IntoResult<T> for std::result::Result<T, E>
where
    E: Into<Error>,
{
    fn pub_result(self, error_type: ErrorType) -> Result<T> {
        self.map_err(|e| {
            let e: Error = e.into();
            anyhow::anyhow!("{error_type}: {e:#}")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pub_result_prefixes_error_type() {
        let res: std::result::Result<(), Error> = Err(anyhow::anyhow!("file is gone"));
        let err = res.pub_result(ErrorType::Storage).unwrap_err();
        assert_eq!(err.to_string(), "storage: file is gone");
    }

    #[test]
    fn test_pub_result_passes_ok_through() {
        let res: std::result::Result<u8, Error> = Ok(7);
        assert_eq!(res.pub_result(ErrorType::Validation).unwrap(), 7);
    }

    #[test]
    fn test_error_type_display() {
        assert_eq!(ErrorType::NotFound.to_string(), "not_found");
    }
}
