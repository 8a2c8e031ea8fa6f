//! JSON loading for resolved type graphs.

use super::types::TypeGraph;

/// Error while loading or storing a type graph.
#[derive(Debug)]
pub enum GraphError {
    Json(serde_json::Error),
    Binary(postcard::Error),
}

impl std::fmt::Display for GraphError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
            Self::Binary(e) => write!(f, "binary decode error: {e}"),
        }
    }
}

impl std::error::Error for GraphError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Json(e) => Some(e),
            Self::Binary(e) => Some(e),
        }
    }
}

impl TypeGraph {
    /// Parse a type graph from its JSON form.
    pub fn from_json(json: &str) -> Result<Self, GraphError> {
        serde_json::from_str(json).map_err(GraphError::Json)
    }

    /// Render the graph as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, GraphError> {
        serde_json::to_string_pretty(self).map_err(GraphError::Json)
    }
}
