mod pipeline_tests;

use std::sync::Arc;

use crate::implementations::config::AnalyzerConfig;
use crate::testing::MockTextGenerator;
use crate::traits::text_generator::TextGenerator;

pub(crate) fn shared(mock: MockTextGenerator) -> (Arc<MockTextGenerator>, Arc<dyn TextGenerator>) {
    let mock = Arc::new(mock);
    let generator: Arc<dyn TextGenerator> = mock.clone();
    (mock, generator)
}

pub(crate) fn default_config() -> Arc<AnalyzerConfig> {
    Arc::new(AnalyzerConfig::default())
}

pub(crate) fn analysis_json(level: &str, explanation: &str, plain: &str) -> String {
    serde_json::json!({
        "risk_level": level,
        "risk_explanation": explanation,
        "plain_english": plain,
    }).to_string()
}
