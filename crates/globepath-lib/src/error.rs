use std::path::PathBuf;

use thiserror::Error;

use crate::geojson::Coordinate;

/// Convenient result alias for the globepath library.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level library error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Raised when a feature file could not be found at the resolved path.
    #[error("feature file not found at {path}")]
    InputNotFound { path: PathBuf },

    /// Raised when the document parses as JSON but is not a FeatureCollection.
    #[error("invalid feature collection: {message}")]
    InvalidFeatureCollection { message: String },

    /// Raised when a city name could not be found in the graph.
    #[error("unknown city name: {name}{}", format_suggestions(.suggestions))]
    UnknownCity {
        name: String,
        suggestions: Vec<String>,
    },

    /// Raised when an edge endpoint does not match any registered city.
    #[error("no city registered at coordinate [{}, {}]", .coordinate[0], .coordinate[1])]
    UnresolvedCoordinate { coordinate: Coordinate },

    /// Raised when an edge weight is negative or not a finite number.
    #[error("invalid edge weight {weight}")]
    InvalidWeight { weight: f64 },

    /// Raised when a path computation is requested with an unusable setup.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// Raised when the stepped computation task panicked or was aborted.
    #[error("stepped computation task failed: {message}")]
    StepTask { message: String },

    /// Wrapper for JSON parsing errors.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Wrapper for IO errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Reasons a path computation refuses to start.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("graph contains no cities")]
    EmptyGraph,

    #[error("start city is not set")]
    StartUnset,

    #[error("end city is not set")]
    EndUnset,

    /// `id` is a dense insertion index into the graph's city list.
    #[error("city id {id} is not part of the graph")]
    NotInGraph { id: usize },
}

fn format_suggestions(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else if suggestions.len() == 1 {
        format!(". Did you mean '{}'?", suggestions[0])
    } else {
        format!(
            ". Did you mean one of: {}?",
            suggestions
                .iter()
                .map(|s| format!("'{}'", s))
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_city_lists_suggestions() {
        let error = Error::UnknownCity {
            name: "Pari".to_string(),
            suggestions: vec!["Paris".to_string()],
        };
        assert_eq!(
            error.to_string(),
            "unknown city name: Pari. Did you mean 'Paris'?"
        );

        let error = Error::UnknownCity {
            name: "Lon".to_string(),
            suggestions: vec!["London".to_string(), "Lyon".to_string()],
        };
        assert!(error
            .to_string()
            .ends_with("Did you mean one of: 'London', 'Lyon'?"));
    }

    #[test]
    fn configuration_errors_are_transparent() {
        let error: Error = ConfigurationError::StartUnset.into();
        assert_eq!(error.to_string(), "start city is not set");
    }
}
