//! Search configuration.

use std::time::Duration;

/// Configuration for a search run.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use u_rostering::search::SearchConfig;
///
/// let config = SearchConfig::default()
///     .with_max_solutions(5)
///     .with_deadline(Duration::from_secs(10));
/// assert_eq!(config.max_solutions, Some(5));
/// ```
#[derive(Debug, Clone, Default)]
pub struct SearchConfig {
    /// Stop after this many solutions. `None` enumerates exhaustively.
    ///
    /// Reaching the bound is reported as a cancelled run, since the
    /// tree is left partially explored.
    pub max_solutions: Option<usize>,

    /// Wall-clock budget, checked at every node. `None` = no deadline.
    pub deadline: Option<Duration>,
}

impl SearchConfig {
    pub fn with_max_solutions(mut self, n: usize) -> Self {
        self.max_solutions = Some(n);
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default_is_exhaustive() {
        let config = SearchConfig::default();
        assert_eq!(config.max_solutions, None);
        assert_eq!(config.deadline, None);
    }

    #[test]
    fn test_config_builders() {
        let config = SearchConfig::default()
            .with_max_solutions(1)
            .with_deadline(Duration::from_millis(250));
        assert_eq!(config.max_solutions, Some(1));
        assert_eq!(config.deadline, Some(Duration::from_millis(250)));
    }
}
