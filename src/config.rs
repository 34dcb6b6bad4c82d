use crate::implementations::config::AnalyzerConfig;
use crate::models::common::ClassificationStrategy;

/// Run-time choices that command-line flags may override
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    pub strategy: ClassificationStrategy,
    pub concurrency: usize,
}

impl PipelineOptions {
    /// Take the configured values, replacing any that were given explicitly
    pub fn resolve(
        config: &AnalyzerConfig,
        strategy: Option<ClassificationStrategy>,
        concurrency: Option<usize>
    ) -> Self {
        Self {
            strategy: strategy.unwrap_or(config.strategy),
            concurrency: concurrency.unwrap_or(config.concurrency).max(1),
        }
    }

    /// Write these options back into a configuration
    pub fn apply_to(&self, config: &mut AnalyzerConfig) {
        config.strategy = self.strategy;
        config.concurrency = self.concurrency;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config() {
        let mut config = AnalyzerConfig::default();
        config.concurrency = 3;

        let options = PipelineOptions::resolve(&config, Some(ClassificationStrategy::Batch), None);
        assert_eq!(options.strategy, ClassificationStrategy::Batch);
        assert_eq!(options.concurrency, 3);

        let zero = PipelineOptions::resolve(&config, None, Some(0));
        assert_eq!(zero.strategy, ClassificationStrategy::PerClause);
        assert_eq!(zero.concurrency, 1);

        zero.apply_to(&mut config);
        assert_eq!(config.concurrency, 1);
    }
}
