#[derive(Debug, Clone, PartialEq)]
pub enum MatchError {
    InvalidRatio(f32),
    InvalidMaxDistance(f32),
}

impl std::fmt::Display for MatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchError::InvalidRatio(r) => {
                write!(f, "Invalid ratio: {} (must be in (0, 1])", r)
            }
            MatchError::InvalidMaxDistance(d) => {
                write!(f, "Invalid maximum distance: {} (must be finite and >= 0)", d)
            }
        }
    }
}

impl std::error::Error for MatchError {}

pub type MatchResult<T> = Result<T, MatchError>;
