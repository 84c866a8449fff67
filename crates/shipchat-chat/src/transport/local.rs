//! Local tier: deterministic classifier, extractor table and response bank.
//!
//! Last line of defense. A panic anywhere in the local pipeline is caught
//! and turned into the capability overview, so this tier never fails.

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use shipchat_core::{EntityBag, Field, Intent};
use shipchat_nlu::{
    ExtractorTable, IntentClassifier, IntentRegistry, RandomSource, ResponseBank,
    CAPABILITY_OVERVIEW,
};

use crate::error::TransportError;
use crate::transport::{Analysis, AnalysisRequest, Analyzer, Tier};

pub struct LocalAnalyzer {
    classifier: IntentClassifier,
    extractors: &'static ExtractorTable,
    bank: ResponseBank,
    rng: Mutex<Box<dyn RandomSource>>,
}

impl LocalAnalyzer {
    pub fn new(registry: Arc<IntentRegistry>, rng: Box<dyn RandomSource>) -> Self {
        Self {
            classifier: IntentClassifier::new(Arc::clone(&registry)),
            extractors: ExtractorTable::standard(),
            bank: ResponseBank::new(registry),
            rng: Mutex::new(rng),
        }
    }

    /// The reply used when the local pipeline itself breaks.
    pub fn default_analysis() -> Analysis {
        Analysis {
            intent: Intent::Info,
            confidence: shipchat_nlu::intent::classifier::FALLBACK_CONFIDENCE,
            entities: EntityBag::new(),
            response: CAPABILITY_OVERVIEW.to_string(),
        }
    }

    fn run(&self, request: &AnalysisRequest) -> Analysis {
        let classification = self.classifier.classify(&request.message);
        let registry = self.classifier.registry();

        let mut fields: Vec<Field> = registry.extract_fields(classification.intent).to_vec();
        if let Some(active) = request.context.active_intent {
            for field in registry.extract_fields(active) {
                if !fields.contains(field) {
                    fields.push(*field);
                }
            }
        }
        let entities = self.extractors.extract(&request.message, &fields);

        let response = match self.rng.lock() {
            Ok(mut rng) => self.bank.base(classification.intent, rng.as_mut()),
            Err(_) => CAPABILITY_OVERVIEW.to_string(),
        };

        Analysis {
            intent: classification.intent,
            confidence: classification.confidence,
            entities,
            response,
        }
    }
}

#[async_trait]
impl Analyzer for LocalAnalyzer {
    fn tier(&self) -> Tier {
        Tier::Local
    }

    async fn analyze(&self, request: &AnalysisRequest) -> Result<Analysis, TransportError> {
        match panic::catch_unwind(AssertUnwindSafe(|| self.run(request))) {
            Ok(analysis) => Ok(analysis),
            Err(_) => {
                tracing::error!("Local analysis panicked; using default response");
                Ok(Self::default_analysis())
            }
        }
    }
}
