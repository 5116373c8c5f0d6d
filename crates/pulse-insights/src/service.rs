//! Insight generation over a forecast store.

use std::sync::Arc;

use pulse_analytics::summarize;
use pulse_core::Result;
use pulse_forecast::ForecastStore;
use tracing::{info, warn};

use crate::prompt::{build_prompt, parse_insights};
use crate::providers::TextGenerator;
use crate::types::Insights;

/// Summarizes a store, asks the generator for insights and parses the reply.
#[derive(Clone)]
pub struct InsightService {
    generator: Arc<dyn TextGenerator>,
}

impl InsightService {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    pub fn generator(&self) -> &Arc<dyn TextGenerator> {
        &self.generator
    }

    /// Generate insights for `store`.
    ///
    /// An empty store is `NotFound`; generator failures are `Upstream` and
    /// unparseable replies are `InvalidUpstreamResponse`.
    pub async fn generate(&self, store: &ForecastStore) -> Result<Insights> {
        let summary = summarize(store)?;
        let prompt = build_prompt(&summary);

        let text = self.generator.generate(&prompt).await.map_err(|e| {
            warn!("Insight generation failed: {}", e);
            e
        })?;

        let insights = parse_insights(&text)?;
        info!(
            "Generated {} insight categories via {}",
            insights.categories.len(),
            self.generator.provider().unwrap_or_else(|| "unknown".into())
        );
        Ok(insights)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::BoxFuture;
    use pulse_core::Error;
    use pulse_forecast::time::{parse_timestamp, TimeAligner};
    use pulse_forecast::ForecastEntry;
    use std::sync::Mutex;

    /// Returns a fixed reply and records prompts.
    struct StubGenerator {
        reply: Result<String>,
        prompts: Mutex<Vec<String>>,
    }

    impl StubGenerator {
        fn replying(reply: Result<String>) -> Arc<Self> {
            Arc::new(Self {
                reply,
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    impl TextGenerator for StubGenerator {
        fn generate<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String>> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            let reply = match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(e) => Err(Error::Upstream(e.to_string())),
            };
            Box::pin(async move { reply })
        }

        fn provider(&self) -> Option<String> {
            Some("stub".into())
        }
    }

    fn store() -> ForecastStore {
        let boundary = parse_timestamp("2025-03-14 00:00:00").unwrap();
        let mut store = ForecastStore::new();
        for (building, base) in [("Library", 2.0), ("Canteen", 1.0)] {
            let points = TimeAligner::forecast_timestamps(boundary)
                .into_iter()
                .map(|ts| (ts, base))
                .collect();
            store.insert(building, ForecastEntry::new(points));
        }
        store
    }

    #[tokio::test]
    async fn test_generates_from_stub_reply() {
        let stub = StubGenerator::replying(Ok(
            "```json\n{\"summary\": \"ok\", \"categories\": []}\n```".into(),
        ));
        let service = InsightService::new(stub.clone());

        let insights = service.generate(&store()).await.unwrap();
        assert_eq!(insights.summary, "ok");

        let prompts = stub.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("campus with 2 buildings"));
    }

    #[tokio::test]
    async fn test_empty_store_never_calls_generator() {
        let stub = StubGenerator::replying(Ok("{}".into()));
        let service = InsightService::new(stub.clone());
        let result = service.generate(&ForecastStore::new()).await;
        assert!(matches!(result, Err(Error::NotFound(_))));
        assert!(stub.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_generator_failure_is_upstream() {
        let stub = StubGenerator::replying(Err(Error::Upstream("quota".into())));
        let result = InsightService::new(stub).generate(&store()).await;
        assert!(matches!(result, Err(Error::Upstream(_))));
    }

    #[tokio::test]
    async fn test_prose_reply_is_invalid_upstream() {
        let stub = StubGenerator::replying(Ok("I cannot help with that.".into()));
        let result = InsightService::new(stub).generate(&store()).await;
        assert!(matches!(result, Err(Error::InvalidUpstreamResponse(_))));
    }
}
